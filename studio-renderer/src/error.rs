//! Renderer error types.

use studio_core::CoreError;
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// An image source could not be decoded.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// A target or decoded image has a zero dimension.
    #[error("Zero-sized image ({width}x{height})")]
    ZeroDimension {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },

    /// The drawing surface could not be allocated.
    #[error("Surface error: {0}")]
    Surface(String),

    /// Text could not be shaped with any available font.
    #[error("Font error: {0}")]
    Font(String),

    /// The finished surface could not be encoded.
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// Layer geometry could not be resolved.
    #[error(transparent)]
    Geometry(#[from] CoreError),
}
