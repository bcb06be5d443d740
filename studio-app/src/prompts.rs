//! Prompt composition for image generation.

use serde::{Deserialize, Serialize};
use studio_core::{ImageRole, ImageSource};

use crate::error::ValidationError;

/// What the generation service is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// A print-ready graphic for the front of a shirt.
    #[default]
    Design,
    /// A logo or stylized lettering.
    Logo,
    /// An edit of a reference image.
    ImageEdit,
}

impl GenerationMode {
    /// Wrap the user's prompt in this mode's instruction.
    #[must_use]
    pub fn instruction(self, prompt: &str) -> String {
        match self {
            Self::Design => format!(
                "Create a professional, original graphic design to be printed on a t-shirt. \
                 The design must be eye-catching, high quality and suitable for printing. \
                 The main idea of the design is: \"{prompt}\". \
                 The design should be a single element with a transparent background if possible."
            ),
            Self::Logo => format!(
                "Create a professional logo or artistic lettering based on the following text: \
                 \"{prompt}\". The design must be a single clean element on a fully transparent \
                 background so it can be placed on clothing."
            ),
            Self::ImageEdit => format!(
                "Your task is to edit the attached image according to the following request: \
                 \"{prompt}\". The final result must be only the edited image, without any \
                 additional text or commentary."
            ),
        }
    }

    /// Role of the resulting layer.
    #[must_use]
    pub fn role(self) -> ImageRole {
        match self {
            Self::Logo => ImageRole::Logo,
            Self::Design | Self::ImageEdit => ImageRole::Generated,
        }
    }
}

/// A request to the generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Generation mode.
    pub mode: GenerationMode,
    /// The user's description.
    pub prompt: String,
    /// Reference image, required for [`GenerationMode::ImageEdit`].
    pub reference: Option<ImageSource>,
}

impl GenerationRequest {
    /// A text-only request.
    pub fn new(mode: GenerationMode, prompt: impl Into<String>) -> Self {
        Self {
            mode,
            prompt: prompt.into(),
            reference: None,
        }
    }

    /// An image-edit request.
    pub fn edit(reference: ImageSource, prompt: impl Into<String>) -> Self {
        Self {
            mode: GenerationMode::ImageEdit,
            prompt: prompt.into(),
            reference: Some(reference),
        }
    }

    /// Validate the request and compose the final instruction.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyPrompt`] for a blank prompt and
    /// [`ValidationError::MissingReferenceImage`] for an edit without a
    /// reference.
    pub fn compose(&self) -> Result<String, ValidationError> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(ValidationError::EmptyPrompt);
        }
        let has_reference = self.reference.as_ref().is_some_and(|r| !r.is_empty());
        if self.mode == GenerationMode::ImageEdit && !has_reference {
            return Err(ValidationError::MissingReferenceImage);
        }
        Ok(self.mode.instruction(prompt))
    }
}
