//! Gemini image client.
//!
//! Talks to the `models/{model}:generateContent` REST endpoint. Images travel
//! as base64 `inlineData` parts in both directions, and image output has to be
//! requested explicitly through `responseModalities`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use studio_core::ImageSource;
use url::Url;

use crate::error::{error_message, ServiceError, ServiceResult};
use crate::http;
use crate::traits::{BackgroundRemover, ImageGenerator};

/// Default REST base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
/// Default image-capable model.
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

const BACKGROUND_REMOVAL_INSTRUCTION: &str = "remove the background, make it transparent";
const API_KEY_REJECTED_MARKER: &str = "API key not valid";

/// Gemini client settings.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key. Calls fail with [`ServiceError::NotConfigured`] when absent.
    pub api_key: Option<String>,
    /// REST base URL.
    pub base_url: String,
    /// Model used for image generation and editing.
    pub image_model: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Gemini-backed [`ImageGenerator`] and [`BackgroundRemover`].
#[derive(Clone)]
pub struct GeminiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl GeminiClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidUrl`] for a malformed base URL and
    /// [`ServiceError::Http`] if the HTTP client fails to build.
    pub fn new(config: GeminiConfig) -> ServiceResult<Self> {
        let base = http::base_url(&config.base_url)?;
        let endpoint = http::join(&base, &format!("models/{}:generateContent", config.image_model))?;
        let api_key = config.api_key.filter(|key| !key.trim().is_empty());

        Ok(Self {
            inner: Arc::new(Inner {
                http: http::build_client(config.timeout)?,
                endpoint,
                api_key,
            }),
        })
    }

    /// Whether an API key is set.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner.api_key.is_some()
    }

    async fn generate(&self, parts: Vec<Part>) -> ServiceResult<ImageSource> {
        let api_key = self
            .inner
            .api_key
            .as_deref()
            .ok_or(ServiceError::NotConfigured("GEMINI_API_KEY"))?;

        let request = GenerateRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE", "TEXT"],
            },
        };

        let response = self
            .inner
            .http
            .post(self.inner.endpoint.clone())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = error_message(&body);
            if message.contains(API_KEY_REJECTED_MARKER) {
                return Err(ServiceError::ApiKeyRejected);
            }
            return Err(ServiceError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)?;
        let image = extract_image(parsed)?;
        tracing::info!(mime = %image.mime_type, bytes = image.len(), "image generated");
        Ok(image)
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("configured", &self.is_configured())
            .finish()
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate_from_text(&self, prompt: &str) -> ServiceResult<ImageSource> {
        self.generate(vec![Part::text(prompt)]).await
    }

    async fn generate_from_image(
        &self,
        image: &ImageSource,
        instruction: &str,
    ) -> ServiceResult<ImageSource> {
        self.generate(vec![Part::image(image), Part::text(instruction)])
            .await
    }
}

#[async_trait]
impl BackgroundRemover for GeminiClient {
    async fn remove_background(&self, image: &ImageSource) -> ServiceResult<ImageSource> {
        self.generate(vec![Part::image(image), Part::text(BACKGROUND_REMOVAL_INSTRUCTION)])
            .await
    }
}

fn extract_image(response: GenerateResponse) -> ServiceResult<ImageSource> {
    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Err(ServiceError::SafetyBlocked { reason });
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(ServiceError::NoImage { text: None });
    };

    let mut text = None;
    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        if let Some(inline) = part.inline_data {
            return ImageSource::from_base64(inline.mime_type, &inline.data)
                .map_err(|e| ServiceError::InvalidPayload(e.to_string()));
        }
        if let Some(t) = part.text {
            text.get_or_insert_with(String::new).push_str(&t);
        }
    }

    match candidate.finish_reason.as_deref() {
        Some(reason @ ("SAFETY" | "PROHIBITED_CONTENT" | "IMAGE_SAFETY" | "BLOCKLIST")) => {
            Err(ServiceError::SafetyBlocked {
                reason: reason.to_string(),
            })
        }
        _ => Err(ServiceError::NoImage { text }),
    }
}

// Wire types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    fn image(image: &ImageSource) -> Self {
        Self {
            inline_data: Some(InlineData {
                mime_type: image.mime_type.clone(),
                data: image.to_base64(),
            }),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}
