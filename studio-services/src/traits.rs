//! Service seams. The studio only talks to these traits, so tests and other
//! hosts can swap in their own implementations.

use async_trait::async_trait;
use studio_core::ImageSource;

use crate::catalog::{NewProduct, Product};
use crate::error::ServiceResult;

/// Generative image service.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate an image from a text prompt.
    async fn generate_from_text(&self, prompt: &str) -> ServiceResult<ImageSource>;

    /// Generate an image from a reference image and an instruction.
    async fn generate_from_image(
        &self,
        image: &ImageSource,
        instruction: &str,
    ) -> ServiceResult<ImageSource>;
}

/// Background removal service. The result has a transparent background.
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    /// Remove the background from an image.
    async fn remove_background(&self, image: &ImageSource) -> ServiceResult<ImageSource>;
}

/// Blob storage with public URLs.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store bytes under `path` and return their public URL.
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str)
        -> ServiceResult<String>;

    /// Delete the object at `path`.
    async fn remove(&self, path: &str) -> ServiceResult<()>;
}

/// Product listing store.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Insert a product and return the stored row.
    async fn create_product(&self, product: &NewProduct) -> ServiceResult<Product>;
}

/// Downloads images by URL (stock mockups).
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetch an image. Non-image responses are rejected.
    async fn fetch(&self, url: &str) -> ServiceResult<ImageSource>;
}
