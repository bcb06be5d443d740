//! # Garment Studio Application
//!
//! Ties the design model, the compositor and the service adapters together:
//!
//! - [`DesignSession`]: the design, its selection, pointer handling and the
//!   busy/error state of each async action
//! - [`Studio`]: runs uploads, generation, background removal, mockup loading
//!   and publishing against the services
//! - [`PublishFlow`]: validate → render → upload → create product
//!
//! ## Example
//!
//! ```no_run
//! # async fn run(studio: studio_app::Studio) -> studio_app::StudioResult<()> {
//! use studio_app::{GenerationMode, GenerationRequest, Listing};
//!
//! studio
//!     .generate(GenerationRequest::new(GenerationMode::Logo, "Desert Bloom"))
//!     .await?;
//! let product = studio.publish(&Listing::new("Desert Bloom tee", 299.0)).await?;
//! println!("published {}", product.image_url);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod apparel;
pub mod error;
pub mod prompts;
pub mod publish;
pub mod renderer;
pub mod session;
pub mod studio;

pub use apparel::{suggest_listing, ApparelColor, ApparelPreset, Garment, PRESETS};
pub use error::{StudioError, StudioResult, ValidationError};
pub use prompts::{GenerationMode, GenerationRequest};
pub use publish::{validate, Listing, PublishConfig, PublishFlow};
pub use renderer::DesignRenderer;
pub use session::{Action, ActionError, Applied, DesignSession, Ticket};
pub use studio::{Studio, StudioServices};
