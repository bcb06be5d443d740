//! Supabase storage and catalog clients.
//!
//! Both talk to the same project with the anon key, sent as `apikey` and as a
//! bearer token. Storage objects live under `/storage/v1/object/{bucket}/..`
//! and are served publicly from `/storage/v1/object/public/{bucket}/..`;
//! products are rows of a PostgREST table under `/rest/v1/`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::json;
use url::Url;

use crate::catalog::{NewProduct, Product};
use crate::error::{ServiceError, ServiceResult};
use crate::http;
use crate::traits::{ObjectStorage, ProductCatalog};

/// Default storage bucket for product images.
pub const DEFAULT_BUCKET: &str = "product_images";
/// Default products table.
pub const DEFAULT_TABLE: &str = "products";

/// Supabase project settings.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: Option<String>,
    /// Anon (public) API key.
    pub anon_key: Option<String>,
    /// Storage bucket.
    pub bucket: String,
    /// Products table.
    pub table: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            bucket: DEFAULT_BUCKET.to_string(),
            table: DEFAULT_TABLE.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

struct Project {
    http: Client,
    base: Url,
    key: String,
}

impl Project {
    fn connect(config: &SupabaseConfig) -> ServiceResult<Arc<Self>> {
        let url = config
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or(ServiceError::NotConfigured("SUPABASE_URL"))?;
        let key = config
            .anon_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ServiceError::NotConfigured("SUPABASE_ANON_KEY"))?;

        Ok(Arc::new(Self {
            http: http::build_client(config.timeout)?,
            base: http::base_url(url)?,
            key: key.to_string(),
        }))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }
}

/// Supabase Storage implementation of [`ObjectStorage`].
#[derive(Clone)]
pub struct SupabaseStorage {
    project: Arc<Project>,
    bucket: String,
}

impl SupabaseStorage {
    /// Create a storage client.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotConfigured`] if the URL or key is missing,
    /// [`ServiceError::InvalidUrl`] for a malformed URL.
    pub fn new(config: &SupabaseConfig) -> ServiceResult<Self> {
        Ok(Self {
            project: Project::connect(config)?,
            bucket: config.bucket.clone(),
        })
    }

    /// Public URL of an object.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidUrl`] if the path cannot be joined.
    pub fn public_url(&self, path: &str) -> ServiceResult<Url> {
        http::join(
            &self.project.base,
            &format!("storage/v1/object/public/{}/{path}", self.bucket),
        )
    }

    fn object_url(&self, path: &str) -> ServiceResult<Url> {
        http::join(
            &self.project.base,
            &format!("storage/v1/object/{}/{path}", self.bucket),
        )
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> ServiceResult<String> {
        let size = bytes.len();
        let request = self
            .project
            .http
            .post(self.object_url(path)?)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes);
        http::check(self.project.authorized(request).send().await?).await?;

        let url = self.public_url(path)?;
        tracing::info!(path, size, "object uploaded");
        Ok(url.into())
    }

    async fn remove(&self, path: &str) -> ServiceResult<()> {
        let bucket_url = http::join(
            &self.project.base,
            &format!("storage/v1/object/{}", self.bucket),
        )?;
        let request = self
            .project
            .http
            .delete(bucket_url)
            .json(&json!({ "prefixes": [path] }));
        http::check(self.project.authorized(request).send().await?).await?;
        tracing::info!(path, "object removed");
        Ok(())
    }
}

/// Supabase PostgREST implementation of [`ProductCatalog`].
#[derive(Clone)]
pub struct SupabaseCatalog {
    project: Arc<Project>,
    table: String,
}

impl SupabaseCatalog {
    /// Create a catalog client.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotConfigured`] if the URL or key is missing,
    /// [`ServiceError::InvalidUrl`] for a malformed URL.
    pub fn new(config: &SupabaseConfig) -> ServiceResult<Self> {
        Ok(Self {
            project: Project::connect(config)?,
            table: config.table.clone(),
        })
    }
}

#[async_trait]
impl ProductCatalog for SupabaseCatalog {
    async fn create_product(&self, product: &NewProduct) -> ServiceResult<Product> {
        let url = http::join(&self.project.base, &format!("rest/v1/{}", self.table))?;
        let request = self
            .project
            .http
            .post(url)
            .header("Prefer", "return=representation")
            .json(product);
        let response = http::check(self.project.authorized(request).send().await?).await?;

        let rows: Vec<Product> = serde_json::from_str(&response.text().await?)?;
        let created = rows
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::InvalidPayload("insert returned no rows".to_string()))?;
        tracing::info!(id = created.id, name = %created.name, "product created");
        Ok(created)
    }
}
