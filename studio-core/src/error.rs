//! Error types for design operations.

use thiserror::Error;

use crate::LayerId;

/// Result type for design operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while editing a design.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Layer not found in the design.
    #[error("Layer not found: {0}")]
    LayerNotFound(LayerId),

    /// The operation does not apply to this kind of layer.
    #[error("Invalid operation on layer: {0}")]
    InvalidOperation(String),

    /// Geometry that cannot be converted (zero-sized surface, NaN values).
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// An image reports a zero width or height.
    #[error("Image has zero dimension ({width}x{height})")]
    ZeroDimension {
        /// Natural width in pixels.
        width: u32,
        /// Natural height in pixels.
        height: u32,
    },

    /// A pointer interaction is already in progress.
    #[error("Interaction already active on layer {0}")]
    InteractionBusy(LayerId),

    /// Malformed color string.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Malformed inline image data.
    #[error("Invalid image data: {0}")]
    InvalidImageData(String),

    /// Design serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
