//! Rendering seam used by the studio.

use std::sync::Arc;

use studio_core::{Design, ImageSource};
use studio_renderer::image::decoded_dimensions;
use studio_renderer::{Compositor, ExportResult, RenderResult};

use crate::error::{StudioError, StudioResult};

/// Flattens a design into a PNG at a given width.
pub trait DesignRenderer: Send + Sync {
    /// Render `design` at `width` pixels wide.
    ///
    /// # Errors
    ///
    /// Returns the underlying render error.
    fn render(&self, design: &Design, width: u32) -> RenderResult<ExportResult>;
}

impl DesignRenderer for Compositor {
    fn render(&self, design: &Design, width: u32) -> RenderResult<ExportResult> {
        self.render_design(design, width)
    }
}

/// Render on the tokio blocking pool.
pub(crate) async fn render_blocking(
    renderer: Arc<dyn DesignRenderer>,
    design: Design,
    width: u32,
) -> StudioResult<ExportResult> {
    tokio::task::spawn_blocking(move || renderer.render(&design, width))
        .await
        .map_err(|e| StudioError::Task(e.to_string()))?
        .map_err(StudioError::from)
}

/// Decode an incoming image on the blocking pool and return it with its
/// natural dimensions.
pub(crate) async fn decode_blocking(
    source: ImageSource,
) -> StudioResult<(ImageSource, u32, u32)> {
    tokio::task::spawn_blocking(move || {
        decoded_dimensions(&source).map(|(width, height)| (source, width, height))
    })
    .await
    .map_err(|e| StudioError::Task(e.to_string()))?
    .map_err(StudioError::from)
}
