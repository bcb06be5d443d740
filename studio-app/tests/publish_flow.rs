//! Publish flow against in-memory services.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{FakeRenderer, MemoryCatalog, MemoryStorage};
use studio_app::{Listing, PublishConfig, PublishFlow, StudioError, ValidationError};
use studio_core::{Canvas, Design, Layer, TextLayer};
use studio_services::ServiceError;

fn sale_design() -> Design {
    let mut design = Design::new(Canvas::default());
    design.append(Layer::text(TextLayer::new("SALE")));
    design
}

fn flow(
    storage: &Arc<MemoryStorage>,
    catalog: &Arc<MemoryCatalog>,
    renderer: &Arc<FakeRenderer>,
) -> PublishFlow {
    PublishFlow::new(
        renderer.clone(),
        storage.clone(),
        catalog.clone(),
        PublishConfig::default(),
    )
}

#[tokio::test]
async fn publish_uploads_once_then_creates_product() {
    let storage = Arc::new(MemoryStorage::default());
    let catalog = Arc::new(MemoryCatalog::default());
    let renderer = Arc::new(FakeRenderer::default());

    let product = flow(&storage, &catalog, &renderer)
        .publish(sale_design(), &Listing::new("Test", 299.0))
        .await
        .expect("publish");

    let uploads = storage.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    let (path, bytes, content_type) = &uploads[0];
    assert!(path.starts_with("designs/") && path.ends_with(".png"), "{path}");
    assert_eq!(bytes, b"PNGDATA");
    assert_eq!(content_type, "image/png");

    let created = catalog.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].image_url, format!("https://cdn.test/{path}"));
    assert_eq!(created[0].name, "Test");
    assert!((created[0].price - 299.0).abs() < f64::EPSILON);
    assert_eq!(created[0].category, "User Designs");
    assert_eq!(created[0].stock, 999);
    assert_eq!(created[0].reviews, 0);

    assert_eq!(product.image_url, created[0].image_url);
    assert!(storage.removals.lock().unwrap().is_empty());
    assert_eq!(*renderer.widths.lock().unwrap(), vec![1200]);
}

#[tokio::test]
async fn failed_product_creation_removes_upload() {
    let storage = Arc::new(MemoryStorage::default());
    let catalog = Arc::new(MemoryCatalog {
        reject: true,
        ..MemoryCatalog::default()
    });
    let renderer = Arc::new(FakeRenderer::default());

    let err = flow(&storage, &catalog, &renderer)
        .publish(sale_design(), &Listing::new("Test", 299.0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StudioError::Service(ServiceError::Status { status: 409, .. })
    ));

    let uploaded = storage.uploads.lock().unwrap()[0].0.clone();
    assert_eq!(*storage.removals.lock().unwrap(), vec![uploaded]);
}

#[tokio::test]
async fn cleanup_failure_keeps_original_error() {
    let storage = Arc::new(MemoryStorage {
        fail_remove: true,
        ..MemoryStorage::default()
    });
    let catalog = Arc::new(MemoryCatalog {
        reject: true,
        ..MemoryCatalog::default()
    });
    let renderer = Arc::new(FakeRenderer::default());

    let err = flow(&storage, &catalog, &renderer)
        .publish(sale_design(), &Listing::new("Test", 299.0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StudioError::Service(ServiceError::Status { status: 409, .. })
    ));
    assert_eq!(storage.removals.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn empty_design_is_rejected_before_any_call() {
    let storage = Arc::new(MemoryStorage::default());
    let catalog = Arc::new(MemoryCatalog::default());
    let renderer = Arc::new(FakeRenderer::default());

    let mut design = Design::new(Canvas::default());
    design.append(Layer::text(TextLayer::new("   ")));

    let err = flow(&storage, &catalog, &renderer)
        .publish(design, &Listing::new("Test", 299.0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StudioError::Validation(ValidationError::EmptyDesign)
    ));
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
    assert!(storage.uploads.lock().unwrap().is_empty());
    assert!(catalog.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn default_description_fills_blank_one() {
    let storage = Arc::new(MemoryStorage::default());
    let catalog = Arc::new(MemoryCatalog::default());
    let renderer = Arc::new(FakeRenderer::default());

    flow(&storage, &catalog, &renderer)
        .publish(
            sale_design(),
            &Listing::new("  Test  ", 120.0).with_description(" "),
        )
        .await
        .expect("publish");

    let created = catalog.created.lock().unwrap();
    assert_eq!(created[0].name, "Test");
    assert_eq!(
        created[0].description,
        PublishConfig::default().default_description
    );
}
