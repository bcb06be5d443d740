//! # Garment Studio Services
//!
//! Adapters for the external services the studio depends on:
//!
//! - [`GeminiClient`]: image generation, image editing and background removal
//! - [`SupabaseStorage`]: object storage with public URLs
//! - [`SupabaseCatalog`]: product rows
//! - [`HttpImageFetcher`]: downloading stock mockups
//!
//! Each adapter implements one of the traits in [`traits`]; the studio only
//! depends on those traits.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod error;
pub mod fetch;
pub mod gemini;
mod http;
pub mod supabase;
pub mod traits;

pub use catalog::{NewProduct, Product};
pub use error::{ServiceError, ServiceResult};
pub use fetch::HttpImageFetcher;
pub use gemini::{GeminiClient, GeminiConfig};
pub use supabase::{SupabaseCatalog, SupabaseConfig, SupabaseStorage};
pub use traits::{BackgroundRemover, ImageFetcher, ImageGenerator, ObjectStorage, ProductCatalog};
