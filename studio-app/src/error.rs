//! Application error types.

use studio_core::CoreError;
use studio_renderer::RenderError;
use studio_services::ServiceError;
use thiserror::Error;

use crate::session::Action;

/// Result type for studio actions.
pub type StudioResult<T> = Result<T, StudioError>;

/// Input rejected before any service call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The generation prompt is empty.
    #[error("prompt is empty")]
    EmptyPrompt,

    /// Image editing was requested without a reference image.
    #[error("image editing needs a reference image")]
    MissingReferenceImage,

    /// The design has no image and no visible text.
    #[error("design has no visible content")]
    EmptyDesign,

    /// The listing name is blank.
    #[error("product name is blank")]
    BlankName,

    /// The listing price is not a positive finite number.
    #[error("invalid price: {0}")]
    InvalidPrice(f64),

    /// The action needs an image layer and none was given or selected.
    #[error("no image layer selected")]
    NoImageSelected,

    /// The action is already running.
    #[error("{0} is already in progress")]
    ActionBusy(Action),
}

/// Errors surfaced by the studio.
#[derive(Debug, Error)]
pub enum StudioError {
    /// Input validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Design model error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Decoding or compositing failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// An external service failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// A background task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

impl StudioError {
    /// Short machine-readable reason.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Core(_) => "design",
            Self::Render(RenderError::Decode(_) | RenderError::ZeroDimension { .. }) => "decode",
            Self::Render(_) => "compositing",
            Self::Service(e) => e.reason(),
            Self::Task(_) => "task",
        }
    }

    /// Message suitable for showing to the person using the studio.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Service(ServiceError::ApiKeyRejected) => {
                "The image service API key is invalid. Check your settings.".to_string()
            }
            Self::Service(ServiceError::SafetyBlocked { .. }) => {
                "The request was blocked by the image service. Try a different prompt.".to_string()
            }
            Self::Service(ServiceError::NoImage { .. }) => {
                "No image was produced. Try a clearer or more detailed description.".to_string()
            }
            Self::Service(ServiceError::NotConfigured(setting)) => {
                format!("The studio is not configured: {setting} is missing.")
            }
            Self::Render(RenderError::Decode(_) | RenderError::ZeroDimension { .. }) => {
                "The image could not be read.".to_string()
            }
            other => other.to_string(),
        }
    }
}
