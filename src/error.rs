//! Error types for the watermark-inpaint crate.

use std::path::PathBuf;

/// Errors that can occur while inpainting a watermark region.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An input image or model file does not exist.
    #[error("{what} not found: {}", path.display())]
    NotFound {
        /// What was being looked up ("input image", "model file").
        what: &'static str,
        /// The missing path.
        path: PathBuf,
    },

    /// The input image exists but could not be decoded.
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        /// Path of the undecodable file.
        path: PathBuf,
        /// Underlying codec error.
        source: image::ImageError,
    },

    /// A caller-supplied value is out of range (ratio, region, method name, radius).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The inference backend rejected the input or failed internally.
    #[error("inference failed: {0}")]
    Inference(String),

    /// A geometry invariant was violated. Indicates a bug, not bad input.
    #[error("internal error: {0}")]
    Internal(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The output format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred while encoding an image.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    pub(crate) fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
