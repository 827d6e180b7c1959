//! Error types for StabKit.

use thiserror::Error;

/// Main error type for StabKit operations.
///
/// Construction-time errors (`Configuration`) are fatal to the pipeline
/// instance. Per-frame errors (`SingularTransform`, `Warp`) are scoped to
/// that frame's output; pipeline buffers stay consistent and later frames
/// can proceed. Protocol errors (`BufferFull`, `MissingSubmission`) are
/// recoverable by the caller.
#[derive(Error, Debug)]
pub enum StabError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("a submitted frame is already pending, retrieve output first")]
    BufferFull,

    #[error("no frame submitted since the last retrieve")]
    MissingSubmission,

    #[error("ring buffer offset {offset} out of range (capacity {capacity})")]
    OutOfRange { offset: usize, capacity: usize },

    #[error("singular transform: |det| = {determinant} below threshold")]
    SingularTransform { determinant: f32 },

    #[error("warp failed: {0}")]
    Warp(String),
}

/// Result type alias for StabKit operations.
pub type Result<T> = std::result::Result<T, StabError>;
