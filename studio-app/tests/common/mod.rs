//! In-memory services for studio integration tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use studio_app::{DesignRenderer, PublishConfig, Studio, StudioServices};
use studio_core::{Canvas, Design, ImageSource};
use studio_renderer::{ExportResult, RenderResult};
use studio_services::{
    BackgroundRemover, ImageFetcher, ImageGenerator, NewProduct, ObjectStorage, Product,
    ProductCatalog, ServiceError, ServiceResult,
};
use tokio::sync::Notify;

/// Encode a solid-color PNG.
pub fn png(width: u32, height: u32, rgba: [u8; 4]) -> ImageSource {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("encode png");
    ImageSource::new("image/png", bytes.into_inner())
}

/// Drop the tail of an encoded image. The header still parses but the pixel
/// data does not.
pub fn truncated(source: &ImageSource) -> ImageSource {
    let bytes = source.bytes();
    ImageSource::new(
        source.mime_type.clone(),
        bytes[..bytes.len() - 20].to_vec(),
    )
}

/// Records render calls and returns a fixed payload.
#[derive(Default)]
pub struct FakeRenderer {
    pub calls: AtomicUsize,
    pub widths: Mutex<Vec<u32>>,
}

impl DesignRenderer for FakeRenderer {
    fn render(&self, _design: &Design, width: u32) -> RenderResult<ExportResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.widths.lock().unwrap().push(width);
        Ok(ExportResult {
            png: b"PNGDATA".to_vec(),
            width,
            height: width,
        })
    }
}

/// Storage that keeps uploads in memory.
#[derive(Default)]
pub struct MemoryStorage {
    pub uploads: Mutex<Vec<(String, Vec<u8>, String)>>,
    pub removals: Mutex<Vec<String>>,
    pub fail_remove: bool,
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> ServiceResult<String> {
        self.uploads
            .lock()
            .unwrap()
            .push((path.to_string(), bytes, content_type.to_string()));
        Ok(format!("https://cdn.test/{path}"))
    }

    async fn remove(&self, path: &str) -> ServiceResult<()> {
        self.removals.lock().unwrap().push(path.to_string());
        if self.fail_remove {
            return Err(ServiceError::Status {
                status: 500,
                message: "storage unavailable".to_string(),
            });
        }
        Ok(())
    }
}

/// Catalog that stores rows in memory, or rejects every insert.
#[derive(Default)]
pub struct MemoryCatalog {
    pub created: Mutex<Vec<NewProduct>>,
    pub reject: bool,
}

#[async_trait]
impl ProductCatalog for MemoryCatalog {
    async fn create_product(&self, product: &NewProduct) -> ServiceResult<Product> {
        if self.reject {
            return Err(ServiceError::Status {
                status: 409,
                message: "duplicate key value".to_string(),
            });
        }
        let mut created = self.created.lock().unwrap();
        created.push(product.clone());
        Ok(Product {
            id: i64::try_from(created.len()).unwrap(),
            name: product.name.clone(),
            price: product.price,
            original_price: None,
            description: product.description.clone(),
            image_url: product.image_url.clone(),
            images: Vec::new(),
            stock: product.stock,
            category: product.category.clone(),
            rating: product.rating,
            reviews: product.reviews,
            created_at: None,
        })
    }
}

/// Image service returning fixed PNGs. Background removal can be held open
/// until the test releases it.
pub struct FakeImages {
    pub prompts: Mutex<Vec<String>>,
    pub generated: ImageSource,
    pub cutout: ImageSource,
    pub gate: Option<Gate>,
}

/// Lets a test pause a fake service mid-call.
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

impl FakeImages {
    pub fn new() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            generated: png(40, 20, [200, 30, 30, 255]),
            cutout: png(40, 20, [200, 30, 30, 0]),
            gate: None,
        }
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Gate {
                entered: Notify::new(),
                release: Notify::new(),
            }),
            ..Self::new()
        }
    }
}

#[async_trait]
impl ImageGenerator for FakeImages {
    async fn generate_from_text(&self, prompt: &str) -> ServiceResult<ImageSource> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.generated.clone())
    }

    async fn generate_from_image(
        &self,
        _image: &ImageSource,
        instruction: &str,
    ) -> ServiceResult<ImageSource> {
        self.prompts.lock().unwrap().push(instruction.to_string());
        Ok(self.generated.clone())
    }
}

#[async_trait]
impl BackgroundRemover for FakeImages {
    async fn remove_background(&self, _image: &ImageSource) -> ServiceResult<ImageSource> {
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        Ok(self.cutout.clone())
    }
}

/// Fetcher serving one fixed image for every URL.
pub struct FixedFetcher(pub ImageSource);

#[async_trait]
impl ImageFetcher for FixedFetcher {
    async fn fetch(&self, _url: &str) -> ServiceResult<ImageSource> {
        Ok(self.0.clone())
    }
}

/// Handles to the fakes behind a studio.
pub struct Harness {
    pub studio: Studio,
    pub images: Arc<FakeImages>,
    pub storage: Arc<MemoryStorage>,
    pub catalog: Arc<MemoryCatalog>,
    pub renderer: Arc<FakeRenderer>,
}

pub fn harness(images: FakeImages, storage: MemoryStorage, catalog: MemoryCatalog) -> Harness {
    build(images, storage, catalog, png(100, 120, [240, 240, 240, 255]))
}

/// A harness whose fetcher serves `mockup` for every URL.
pub fn harness_with_mockup(images: FakeImages, mockup: ImageSource) -> Harness {
    build(
        images,
        MemoryStorage::default(),
        MemoryCatalog::default(),
        mockup,
    )
}

fn build(
    images: FakeImages,
    storage: MemoryStorage,
    catalog: MemoryCatalog,
    mockup: ImageSource,
) -> Harness {
    let images = Arc::new(images);
    let storage = Arc::new(storage);
    let catalog = Arc::new(catalog);
    let renderer = Arc::new(FakeRenderer::default());
    let services = StudioServices {
        generator: images.clone(),
        background: images.clone(),
        storage: storage.clone(),
        catalog: catalog.clone(),
        fetcher: Arc::new(FixedFetcher(mockup)),
        renderer: renderer.clone(),
    };
    Harness {
        studio: Studio::new(
            Design::new(Canvas::default()),
            services,
            PublishConfig::default(),
        ),
        images,
        storage,
        catalog,
        renderer,
    }
}
