//! Publishing a design as a storefront product.
//!
//! Publishing is validate → render → upload → create product. Validation runs
//! before any service is touched. If product creation fails after the upload
//! succeeded, the uploaded file is removed; a failed removal is logged as an
//! orphan and the original error is returned.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use studio_core::Design;
use studio_renderer::STOREFRONT_WIDTH;
use studio_services::{NewProduct, ObjectStorage, Product, ProductCatalog};
use uuid::Uuid;

use crate::error::{StudioResult, ValidationError};
use crate::renderer::{render_blocking, DesignRenderer};

/// Settings applied to every published product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Width of the listing image in pixels.
    pub export_width: u32,
    /// Storage folder for listing images.
    pub path_prefix: String,
    /// Catalog category.
    pub category: String,
    /// Initial stock.
    pub stock: i64,
    /// Initial rating.
    pub rating: f64,
    /// Initial review count.
    pub reviews: i64,
    /// Description used when the listing has none.
    pub default_description: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            export_width: STOREFRONT_WIDTH,
            path_prefix: "designs".to_string(),
            category: "User Designs".to_string(),
            stock: 999,
            rating: 5.0,
            reviews: 0,
            default_description: "A unique design created by one of our users.".to_string(),
        }
    }
}

/// What the seller enters when publishing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Product name.
    pub name: String,
    /// Selling price.
    pub price: f64,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

impl Listing {
    /// Create a listing without a description.
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
            description: None,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Check a design and listing before publishing.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyDesign`], [`ValidationError::BlankName`] or
/// [`ValidationError::InvalidPrice`].
pub fn validate(design: &Design, listing: &Listing) -> Result<(), ValidationError> {
    if !design.has_visible_content() {
        return Err(ValidationError::EmptyDesign);
    }
    if listing.name.trim().is_empty() {
        return Err(ValidationError::BlankName);
    }
    if !listing.price.is_finite() || listing.price <= 0.0 {
        return Err(ValidationError::InvalidPrice(listing.price));
    }
    Ok(())
}

/// Publishes designs through a renderer, a storage bucket and a catalog.
#[derive(Clone)]
pub struct PublishFlow {
    renderer: Arc<dyn DesignRenderer>,
    storage: Arc<dyn ObjectStorage>,
    catalog: Arc<dyn ProductCatalog>,
    config: PublishConfig,
}

impl PublishFlow {
    /// Create a publish flow.
    pub fn new(
        renderer: Arc<dyn DesignRenderer>,
        storage: Arc<dyn ObjectStorage>,
        catalog: Arc<dyn ProductCatalog>,
        config: PublishConfig,
    ) -> Self {
        Self {
            renderer,
            storage,
            catalog,
            config,
        }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    /// Publish a snapshot of a design.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any service call, or the first
    /// render, upload or catalog error.
    pub async fn publish(&self, design: Design, listing: &Listing) -> StudioResult<Product> {
        validate(&design, listing)?;

        let export = render_blocking(Arc::clone(&self.renderer), design, self.config.export_width)
            .await?;
        let path = format!("{}/{}.png", self.config.path_prefix, Uuid::new_v4());
        let image_url = self.storage.upload(&path, export.png, "image/png").await?;
        tracing::debug!(%path, %image_url, "listing image uploaded");

        let product = NewProduct {
            name: listing.name.trim().to_string(),
            price: listing.price,
            description: listing
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .unwrap_or(&self.config.default_description)
                .to_string(),
            image_url,
            category: self.config.category.clone(),
            stock: self.config.stock,
            rating: self.config.rating,
            reviews: self.config.reviews,
        };

        match self.catalog.create_product(&product).await {
            Ok(created) => {
                tracing::info!(id = created.id, name = %created.name, "design published");
                Ok(created)
            }
            Err(err) => {
                if let Err(cleanup) = self.storage.remove(&path).await {
                    tracing::warn!(
                        %path,
                        error = %cleanup,
                        "orphaned listing image after failed publish"
                    );
                }
                Err(err.into())
            }
        }
    }
}

impl std::fmt::Debug for PublishFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishFlow")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
