use serde::{ Serialize, Deserialize };

use crate::consts::{ AUTO_CHUNK_HEIGHT_THRESHOLD, AUTO_CHUNK_SIZE_SMALL,
    AUTO_CHUNK_SIZE_LARGE, CHUNK_BORDER_DIVISOR };

/// A rectangular region of the frame, the unit of work handed to a worker.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize,
    Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameChunk {
    pub x_start: u32,
    pub y_start: u32,
    pub width: u32,
    pub height: u32,
}

impl FrameChunk {
    pub fn new(x_start: u32, y_start: u32, width: u32, height: u32)
        -> FrameChunk {
        FrameChunk { x_start, y_start, width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Length of the packed RGB buffer that holds this chunk's pixels.
    pub fn buffer_len(&self) -> usize {
        self.pixel_count() * 3
    }

    pub fn x_end(&self) -> u32 {
        self.x_start + self.width
    }

    pub fn y_end(&self) -> u32 {
        self.y_start + self.height
    }

    /// Iterates over the frame coordinates covered by this chunk, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> {
        let chunk = *self;
        (chunk.y_start..chunk.y_end()).flat_map(move |y| {
            (chunk.x_start..chunk.x_end()).map(move |x| (x, y))
        })
    }
}

/// Picks the chunk size for a frame.
///
/// A non-zero `requested` size is used as-is. Otherwise short frames get
/// small chunks, so the image fills in visibly from the first moments of a
/// render, and taller frames get larger ones.
pub fn resolve_chunk_size(requested: u32, frame_height: u32) -> u32 {
    if requested > 0 {
        requested
    } else if frame_height <= AUTO_CHUNK_HEIGHT_THRESHOLD {
        AUTO_CHUNK_SIZE_SMALL
    } else {
        AUTO_CHUNK_SIZE_LARGE
    }
}

/// Width in pixels of the placeholder border drawn around a pending chunk.
pub fn border_width(chunk_size: u32) -> u32 {
    (chunk_size / CHUNK_BORDER_DIVISOR).max(1)
}

/// Tiles a frame with square chunks of `chunk_size`, in row-major order.
///
/// Chunks in the last column and row are cut short where the frame does not
/// divide evenly, so the tiling covers every pixel exactly once.
pub fn partition(width: u32, height: u32, chunk_size: u32) -> Vec<FrameChunk> {
    if chunk_size == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();

    for y in (0..height).step_by(chunk_size as usize) {
        for x in (0..width).step_by(chunk_size as usize) {
            chunks.push(FrameChunk::new(
                x,
                y,
                chunk_size.min(width - x),
                chunk_size.min(height - y),
            ));
        }
    }

    chunks
}

#[test]
fn partition_128_by_64() {
    let chunks = partition(128, 128, 64);

    assert_eq!(chunks, vec![
        FrameChunk::new(0, 0, 64, 64),
        FrameChunk::new(64, 0, 64, 64),
        FrameChunk::new(0, 64, 64, 64),
        FrameChunk::new(64, 64, 64, 64),
    ]);
}

#[test]
fn partition_trims_edge_chunks() {
    let chunks = partition(100, 50, 32);

    assert_eq!(chunks.len(), 8);
    assert_eq!(chunks[3], FrameChunk::new(96, 0, 4, 32));
    assert_eq!(chunks[7], FrameChunk::new(96, 32, 4, 18));
}

#[test]
fn partition_covers_frame_exactly_once() {
    let frames = [(1, 1), (7, 3), (64, 64), (65, 33), (200, 150), (3, 97)];
    let sizes = [1, 2, 5, 16, 64, 500];

    for &(w, h) in frames.iter() {
        for &size in sizes.iter() {
            let mut covered = vec![0u32; (w * h) as usize];

            for chunk in partition(w, h, size) {
                assert!(chunk.width > 0 && chunk.height > 0);
                assert!(chunk.x_end() <= w && chunk.y_end() <= h);

                for (x, y) in chunk.pixels() {
                    covered[(y * w + x) as usize] += 1;
                }
            }

            assert!(covered.iter().all(|&n| n == 1),
                "{}x{} with chunk size {}", w, h, size);
        }
    }
}

#[test]
fn zero_chunk_size_yields_nothing() {
    assert!(partition(10, 10, 0).is_empty());
}

#[test]
fn auto_chunk_size_tiers() {
    assert_eq!(resolve_chunk_size(0, 480), AUTO_CHUNK_SIZE_SMALL);
    assert_eq!(resolve_chunk_size(0, 720), AUTO_CHUNK_SIZE_SMALL);
    assert_eq!(resolve_chunk_size(0, 1080), AUTO_CHUNK_SIZE_LARGE);
    assert_eq!(resolve_chunk_size(20, 1080), 20);
}

#[test]
fn border_width_grows_with_chunk_size() {
    assert_eq!(border_width(1), 1);
    assert_eq!(border_width(32), 2);
    assert_eq!(border_width(64), 4);
}

#[test]
fn chunk_pixels_are_row_major() {
    let chunk = FrameChunk::new(10, 20, 2, 2);
    let pixels: Vec<(u32, u32)> = chunk.pixels().collect();

    assert_eq!(pixels, vec![(10, 20), (11, 20), (10, 21), (11, 21)]);
    assert_eq!(chunk.buffer_len(), 12);
}
