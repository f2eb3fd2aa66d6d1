use thiserror::Error;

/// Everything that can stop a render from producing an image.
///
/// Cancelling a render is not an error; see `RenderOutcome::Aborted`.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The render request cannot be satisfied. Raised before any worker is
    /// spawned.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("could not parse scene description: {0}")]
    SceneParse(String),

    #[error("could not encode scene snapshot: {0}")]
    SnapshotEncode(String),

    /// A worker could not rebuild the scene from its snapshot.
    #[error("could not decode scene snapshot: {0}")]
    SnapshotDecode(String),

    #[error("scene snapshot has version {found}, expected {expected}")]
    SnapshotVersion { expected: u32, found: u32 },

    /// Shading produced NaN or infinity for a pixel.
    #[error("pixel ({x}, {y}) has a non-finite color")]
    NonFinitePixel { x: u32, y: u32 },

    /// A worker went away without reporting a result.
    #[error("render worker {0} disconnected")]
    WorkerDisconnected(usize),

    /// A rendered chunk came back with the wrong number of bytes.
    #[error("chunk buffer has {found} bytes, expected {expected}")]
    BufferSize { expected: usize, found: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
