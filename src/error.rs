//! Error types for refract.
//!
//! The tracing core is total and never fails; only caller errors (bad image
//! sizes, malformed scene files, I/O) are reported here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Cannot render an empty image ({width}x{height})")]
    EmptyImage { width: usize, height: usize },

    #[error("Image of {width}x{height} pixels is too large to allocate")]
    ImageTooLarge { width: usize, height: usize },

    #[error("Sample count must be at least 1")]
    InvalidSamples,

    #[error("Preview scale must be a positive finite number, got {0}")]
    InvalidPreviewScale(f64),

    #[error("Scene error: {0}")]
    Scene(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scene description error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, RenderError>;
