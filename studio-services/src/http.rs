//! Shared HTTP plumbing for the adapters.

use std::time::Duration;

use reqwest::{Client, Response};
use url::Url;

use crate::error::{error_message, ServiceError, ServiceResult};

/// Build the HTTP client used by every adapter.
pub(crate) fn build_client(timeout: Duration) -> ServiceResult<Client> {
    Client::builder()
        .user_agent(concat!("garment-studio/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        // Disable proxy detection to avoid macOS system-configuration panic
        .no_proxy()
        .build()
        .map_err(ServiceError::from)
}

/// Parse a base URL, making sure relative joins append to its path.
pub(crate) fn base_url(raw: &str) -> ServiceResult<Url> {
    let mut url = Url::parse(raw.trim()).map_err(|e| ServiceError::InvalidUrl(format!("{raw}: {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Join a relative path onto a base URL.
pub(crate) fn join(base: &Url, path: &str) -> ServiceResult<Url> {
    base.join(path)
        .map_err(|e| ServiceError::InvalidUrl(format!("{base}{path}: {e}")))
}

/// Turn a non-success response into [`ServiceError::Status`].
pub(crate) async fn check(response: Response) -> ServiceResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        status: status.as_u16(),
        message: error_message(&body),
    })
}
