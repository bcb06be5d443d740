//! Async actions against the image, storage and catalog services.
//!
//! [`Studio`] shares its [`DesignSession`] behind a `tokio::sync::Mutex`.
//! Every action follows the same shape: lock, validate and take a ticket,
//! unlock, await the service, lock again and redeem the ticket. The lock is
//! never held across a service call, so the user can keep editing while an
//! action runs.

use std::sync::Arc;

use studio_core::{
    ContentUpdate, CoreError, Design, ImageLayer, ImageRole, ImageSource, Layer, LayerId, Mockup,
    MockupSwap, MockupSwapPolicy,
};
use studio_renderer::{ExportResult, ExportTarget};
use studio_services::{
    BackgroundRemover, ImageFetcher, ImageGenerator, ObjectStorage, Product, ProductCatalog,
};
use tokio::sync::{Mutex, MutexGuard};

use crate::apparel::ApparelPreset;
use crate::error::{StudioError, StudioResult};
use crate::prompts::GenerationRequest;
use crate::publish::{Listing, PublishConfig, PublishFlow};
use crate::renderer::{decode_blocking, render_blocking, DesignRenderer};
use crate::session::{Action, Applied, DesignSession, Ticket};

/// The services a studio talks to.
#[derive(Clone)]
pub struct StudioServices {
    /// Image generation.
    pub generator: Arc<dyn ImageGenerator>,
    /// Background removal.
    pub background: Arc<dyn BackgroundRemover>,
    /// Listing image storage.
    pub storage: Arc<dyn ObjectStorage>,
    /// Product catalog.
    pub catalog: Arc<dyn ProductCatalog>,
    /// Mockup downloads.
    pub fetcher: Arc<dyn ImageFetcher>,
    /// Compositor.
    pub renderer: Arc<dyn DesignRenderer>,
}

/// An editing session wired to its services.
#[derive(Clone)]
pub struct Studio {
    session: Arc<Mutex<DesignSession>>,
    services: StudioServices,
    publisher: PublishFlow,
}

impl Studio {
    /// Open a studio on a design.
    pub fn new(design: Design, services: StudioServices, config: PublishConfig) -> Self {
        let publisher = PublishFlow::new(
            Arc::clone(&services.renderer),
            Arc::clone(&services.storage),
            Arc::clone(&services.catalog),
            config,
        );
        Self {
            session: Arc::new(Mutex::new(DesignSession::new(design))),
            services,
            publisher,
        }
    }

    /// Lock the session for synchronous edits (selection, pointer, text).
    pub async fn session(&self) -> MutexGuard<'_, DesignSession> {
        self.session.lock().await
    }

    /// Add an image from the user's device as a new layer.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Validation`] if an upload is already running and
    /// [`StudioError::Render`] if the bytes are not a readable image.
    pub async fn upload_image(&self, source: ImageSource) -> StudioResult<LayerId> {
        let ticket = self.session.lock().await.begin(Action::UploadImage, None)?;
        match image_layer(source, ImageRole::Upload).await {
            Ok(layer) => {
                let id = self.session.lock().await.complete_with_layer(ticket, layer);
                tracing::info!(layer = %id, "image uploaded");
                Ok(id)
            }
            Err(err) => Err(self.fail(ticket, err).await),
        }
    }

    /// Generate an image and add it as a new layer.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank prompt or a missing reference
    /// image, a service error from the generator, or a decode error if the
    /// returned image is unreadable.
    pub async fn generate(&self, request: GenerationRequest) -> StudioResult<LayerId> {
        let (ticket, instruction) = {
            let mut session = self.session.lock().await;
            let instruction = request.compose()?;
            (session.begin(Action::Generate, None)?, instruction)
        };

        let result = match &request.reference {
            Some(reference) => {
                self.services
                    .generator
                    .generate_from_image(reference, &instruction)
                    .await
            }
            None => self.services.generator.generate_from_text(&instruction).await,
        };
        let layer = match result {
            Ok(image) => image_layer(image, request.mode.role()).await,
            Err(err) => Err(err.into()),
        };

        match layer {
            Ok(layer) => {
                let id = self.session.lock().await.complete_with_layer(ticket, layer);
                tracing::info!(layer = %id, mode = ?request.mode, "image generated");
                Ok(id)
            }
            Err(err) => Err(self.fail(ticket, err).await),
        }
    }

    /// Remove the background of an image layer. With `layer` unset, the
    /// primary selection is used.
    ///
    /// The result is discarded if the layer was removed or its content changed
    /// while the service ran.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ValidationError::NoImageSelected`] when there is no
    /// image layer to work on, or the service or decode error.
    pub async fn remove_background(&self, layer: Option<LayerId>) -> StudioResult<Applied<()>> {
        let (ticket, source) = {
            let mut session = self.session.lock().await;
            let target = session.image_target(layer)?;
            let source = session
                .image_source(target)
                .ok_or(CoreError::LayerNotFound(target))?;
            (session.begin(Action::RemoveBackground, Some(target))?, source)
        };

        let result = match self.services.background.remove_background(&source).await {
            Ok(image) => decode_blocking(image).await,
            Err(err) => Err(err.into()),
        };
        let result = result.map(|(source, natural_width, natural_height)| ContentUpdate::Bitmap {
            source,
            natural_width,
            natural_height,
            role: ImageRole::BackgroundRemoved,
        });

        match result {
            Ok(update) => {
                let applied = self
                    .session
                    .lock()
                    .await
                    .complete_with_content(ticket, update)?;
                if applied.is_applied() {
                    tracing::info!("background removed");
                }
                Ok(applied)
            }
            Err(err) => Err(self.fail(ticket, err).await),
        }
    }

    /// Download a mockup photo and make it the design's base.
    ///
    /// # Errors
    ///
    /// Returns the fetch error, or a decode error for unreadable images.
    pub async fn load_mockup(
        &self,
        url: &str,
        label: Option<&str>,
        policy: MockupSwapPolicy,
    ) -> StudioResult<MockupSwap> {
        let ticket = self.session.lock().await.begin(Action::LoadMockup, None)?;

        let mockup = match self.services.fetcher.fetch(url).await {
            Ok(source) => mockup_from(source, label).await,
            Err(err) => Err(err.into()),
        };
        match mockup {
            Ok(mockup) => {
                let swap = self
                    .session
                    .lock()
                    .await
                    .complete_with_mockup(ticket, mockup, policy);
                tracing::info!(%url, cleared = swap.cleared_layers, "mockup loaded");
                Ok(swap)
            }
            Err(err) => Err(self.fail(ticket, err).await),
        }
    }

    /// Load a stock garment in its default color.
    ///
    /// # Errors
    ///
    /// See [`Self::load_mockup`].
    pub async fn load_preset(
        &self,
        preset: &ApparelPreset,
        policy: MockupSwapPolicy,
    ) -> StudioResult<MockupSwap> {
        let color = preset.default_color();
        self.load_mockup(color.mockup_url, Some(preset.name), policy).await
    }

    /// Use a garment photo supplied by the user as the mockup. Shares the
    /// [`Action::LoadMockup`] slot with [`Self::load_mockup`].
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Validation`] if a mockup is already loading, or a
    /// decode error for unreadable images.
    pub async fn set_custom_mockup(
        &self,
        source: ImageSource,
        policy: MockupSwapPolicy,
    ) -> StudioResult<MockupSwap> {
        let ticket = self.session.lock().await.begin(Action::LoadMockup, None)?;
        match mockup_from(source, Some("Custom")).await {
            Ok(mockup) => {
                let swap = self
                    .session
                    .lock()
                    .await
                    .complete_with_mockup(ticket, mockup, policy);
                tracing::info!(cleared = swap.cleared_layers, "custom mockup set");
                Ok(swap)
            }
            Err(err) => Err(self.fail(ticket, err).await),
        }
    }

    /// Render the current design.
    ///
    /// # Errors
    ///
    /// Returns the render error.
    pub async fn export(&self, target: ExportTarget) -> StudioResult<ExportResult> {
        let design = self.session.lock().await.snapshot();
        let width = target.width(design.canvas.width);
        render_blocking(Arc::clone(&self.services.renderer), design, width).await
    }

    /// Publish the current design as a product.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any service call, or the first render,
    /// upload or catalog error.
    pub async fn publish(&self, listing: &Listing) -> StudioResult<Product> {
        let (ticket, design) = {
            let mut session = self.session.lock().await;
            (session.begin(Action::Publish, None)?, session.snapshot())
        };
        match self.publisher.publish(design, listing).await {
            Ok(product) => {
                self.session.lock().await.complete(ticket);
                Ok(product)
            }
            Err(err) => Err(self.fail(ticket, err).await),
        }
    }

    async fn fail(&self, ticket: Ticket, err: StudioError) -> StudioError {
        tracing::warn!(action = %ticket.action(), error = %err, "action failed");
        self.session.lock().await.fail(ticket, &err);
        err
    }
}

impl std::fmt::Debug for Studio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Studio")
            .field("publisher", &self.publisher)
            .finish_non_exhaustive()
    }
}

async fn image_layer(source: ImageSource, role: ImageRole) -> StudioResult<Layer> {
    let (source, width, height) = decode_blocking(source).await?;
    let image = ImageLayer::new(source, width, height)?.with_role(role);
    Ok(Layer::image(image))
}

async fn mockup_from(source: ImageSource, label: Option<&str>) -> StudioResult<Mockup> {
    let (source, width, height) = decode_blocking(source).await?;
    let mockup = Mockup::new(source, width, height)?;
    Ok(match label {
        Some(label) => mockup.with_label(label),
        None => mockup,
    })
}
