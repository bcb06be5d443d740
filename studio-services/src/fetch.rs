//! Plain HTTP image download.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use studio_core::{ImageFormat, ImageSource};

use crate::error::{ServiceError, ServiceResult};
use crate::http;
use crate::traits::ImageFetcher;

/// [`ImageFetcher`] over plain HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    http: Client,
}

impl HttpImageFetcher {
    /// Create a fetcher with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Http`] if the HTTP client fails to build.
    pub fn new(timeout: Duration) -> ServiceResult<Self> {
        Ok(Self {
            http: http::build_client(timeout)?,
        })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> ServiceResult<ImageSource> {
        let target =
            url::Url::parse(url).map_err(|e| ServiceError::InvalidUrl(format!("{url}: {e}")))?;
        let response = http::check(self.http.get(target.clone()).send().await?).await?;

        let declared = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase());
        let bytes = response.bytes().await?;

        let mime = match declared {
            Some(mime) if mime.starts_with("image/") => mime,
            Some(mime) if mime != "application/octet-stream" => {
                return Err(ServiceError::UnsupportedContentType(mime));
            }
            _ => ImageFormat::from_magic_bytes(&bytes)
                .mime_type()
                .ok_or_else(|| {
                    ServiceError::UnsupportedContentType("unrecognized image data".to_string())
                })?
                .to_string(),
        };

        tracing::debug!(url = %target, %mime, bytes = bytes.len(), "image fetched");
        Ok(ImageSource::new(mime, bytes.to_vec()))
    }
}
