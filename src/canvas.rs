use std::io;
use std::io::Write;
use std::fs::File;
use std::path::Path;

/// A surface the dispatcher draws rendered chunks onto.
///
/// Writes may be buffered; `flush` makes everything written so far visible.
/// The dispatcher flushes after every chunk it writes and after every
/// placeholder it paints.
pub trait Framebuffer {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Sets one pixel. Out-of-bounds pixels are ignored.
    fn write_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]);

    fn flush(&mut self);
}

/// An in-memory framebuffer.
///
/// The canvas keeps the rendered pixels as packed RGB bytes. Once the render
/// finishes, the `Canvas` can be used to save the pixels to an image file.
///
/// For now, only PPM images are supported.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Canvas {
    /// The width of the canvas, in pixels.
    pub width: u32,

    /// The height of the canvas, in pixels.
    pub height: u32,

    /// The pixels of the canvas, three bytes each, row-major.
    pixels: Vec<u8>,

    flushes: usize,
}

impl Canvas {
    /// Creates a new, black canvas with specified width and height.
    pub fn new(width: u32, height: u32) -> Canvas {
        Canvas {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 3],
            flushes: 0,
        }
    }

    /// The raw RGB bytes of the canvas, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// How many times the canvas has been flushed.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Reads a color from a location on the `Canvas`.
    ///
    /// If the specified pixel location is out-of-bounds, `None` is returned
    /// by this function.
    pub fn read_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        // Return nothing if pixel is out-of-bounds
        if x >= self.width || y >= self.height {
            return None
        }

        let i = self.index(x, y);
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]])
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 3
    }

    /// Saves a canvas to a PPM file.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let mut out = io::BufWriter::new(File::create(path)?);
        self.write_ppm(&mut out)?;
        out.flush()
    }

    /// Writes the canvas as a plain (P3) PPM image.
    ///
    /// Lines in the PPM file are clamped to 70 columns. If some value
    /// exceeds the 70 column mark on a line, it is moved to the next line
    /// over.
    pub fn write_ppm<W: Write>(&self, out: &mut W) -> io::Result<()> {
        // Write PPM header, as well as metadata
        writeln!(out, "P3")?;
        writeln!(out, "{} {}", self.width, self.height)?;
        writeln!(out, "255")?; // Maximum color value

        let mut col = 0;
        for value in self.pixels.iter() {
            let s = value.to_string();

            if col > 0 && col + 1 + s.len() > 70 {
                writeln!(out)?;
                col = 0;
            }

            if col > 0 {
                write!(out, " ")?;
                col += 1;
            }

            write!(out, "{}", s)?;
            col += s.len();
        }

        // Terminate the PPM file with a newline
        writeln!(out)?;

        Ok(())
    }
}

impl Framebuffer for Canvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn write_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        // Silently ignore out-of-bounds pixels
        if x >= self.width || y >= self.height {
            return;
        }

        let i = self.index(x, y);
        self.pixels[i..i + 3].copy_from_slice(&rgb);
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}

#[test]
fn write_and_read_pixel() {
    let mut canvas = Canvas::new(8, 8);
    canvas.write_pixel(4, 2, [255, 0, 255]);

    assert_eq!(canvas.read_pixel(4, 2), Some([255, 0, 255]));
    assert_eq!(canvas.read_pixel(2, 4), Some([0, 0, 0]));
}

#[test]
fn out_of_bounds_pixels_are_ignored() {
    let mut canvas = Canvas::new(2, 2);
    canvas.write_pixel(2, 0, [1, 2, 3]);

    assert_eq!(canvas.read_pixel(2, 0), None);
    assert!(canvas.as_bytes().iter().all(|&b| b == 0));
}

#[test]
fn ppm_header_and_body() {
    let mut canvas = Canvas::new(2, 1);
    canvas.write_pixel(0, 0, [255, 0, 10]);

    let mut out = Vec::new();
    canvas.write_ppm(&mut out).unwrap();

    assert_eq!(String::from_utf8(out).unwrap(),
        "P3\n2 1\n255\n255 0 10 0 0 0\n");
}

#[test]
fn ppm_lines_stay_within_70_columns() {
    let mut canvas = Canvas::new(10, 2);
    for y in 0..2 {
        for x in 0..10 {
            canvas.write_pixel(x, y, [255, 204, 153]);
        }
    }

    let mut out = Vec::new();
    canvas.write_ppm(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.lines().all(|line| line.len() <= 70));
    assert!(text.ends_with('\n'));

    let values: Vec<&str> = text.lines().skip(3)
        .flat_map(|line| line.split_whitespace())
        .collect();
    assert_eq!(values.len(), 60);
}
