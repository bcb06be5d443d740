//! # Garment Studio Core
//!
//! Design model for composing artwork onto garment mockups.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 studio-core                 │
//! ├─────────────────────────────────────────────┤
//! │  Design          │  Interaction             │
//! │  - Canvas        │  - Pointer events        │
//! │  - Mockup        │  - Move / resize         │
//! │  - Layers        │  - Selection             │
//! ├─────────────────────────────────────────────┤
//! │  Coordinates: percentage space <-> pixels   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! All layer geometry lives in percentage space relative to the canvas, with
//! positions naming layer centers. Renderers convert to pixels against the
//! surface they draw on.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod color;
pub mod coords;
pub mod design;
pub mod error;
pub mod filter;
pub mod interaction;
pub mod layer;
pub mod selection;
pub mod source;

pub use color::Color;
pub use coords::{PercentPoint, PercentRect, PercentSize, PixelRect, SurfaceSize};
pub use design::{
    Canvas, ContentUpdate, Design, GeometryUpdate, Mockup, MockupSwap, MockupSwapPolicy,
    TextPatch,
};
pub use error::{CoreError, CoreResult};
pub use filter::{FilterKind, FilterStack, ImageFilter};
pub use interaction::{
    Handle, InteractionController, InteractionOutcome, InteractionState, Operation,
    PointerEvent, PointerPhase, PointerTarget,
};
pub use layer::{
    FontFamily, GroupLayer, ImageLayer, ImageRole, Layer, LayerId, LayerKind, TextLayer,
};
pub use selection::Selection;
pub use source::{ImageFormat, ImageSource};

/// Studio core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
