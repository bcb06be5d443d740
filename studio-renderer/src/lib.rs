//! # Garment Studio Renderer
//!
//! Software compositor that flattens a mockup photo and its design layers into
//! a PNG at any output width.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐   ┌─────┐
//! │ Design (%)   │──▶│ RenderPlan   │──▶│ tiny-skia Pixmap │──▶│ PNG │
//! │ mockup+layers│   │ (pixels)     │   │ image / resvg    │   │     │
//! └──────────────┘   └──────────────┘   └──────────────────┘   └─────┘
//! ```
//!
//! Geometry is resolved against the output surface, so the same design
//! renders proportionally identical at preview, storefront and print sizes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod compositor;
pub mod error;
pub mod filters;
pub mod image;

pub use compositor::{
    Compositor, CompositorConfig, DrawOp, ExportResult, ExportTarget, RenderPlan, PRINT_WIDTH,
    STOREFRONT_WIDTH,
};
pub use error::{RenderError, RenderResult};
