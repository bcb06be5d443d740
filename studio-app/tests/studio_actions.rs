//! Async studio actions: busy slots, stale results and mockup swaps.

mod common;

use std::sync::atomic::Ordering;

use common::{
    harness, harness_with_mockup, png, truncated, FakeImages, MemoryCatalog, MemoryStorage,
};
use studio_app::{
    Action, Applied, GenerationMode, GenerationRequest, Listing, StudioError, ValidationError,
};
use studio_core::{
    ContentUpdate, GeometryUpdate, ImageFilter, ImageRole, Layer, MockupSwapPolicy, PercentPoint,
    TextLayer,
};
use studio_renderer::ExportTarget;

#[tokio::test]
async fn generated_logo_is_added_and_selected() {
    let h = harness(FakeImages::new(), MemoryStorage::default(), MemoryCatalog::default());

    let id = h
        .studio
        .generate(GenerationRequest::new(GenerationMode::Logo, "Desert Bloom"))
        .await
        .expect("generate");

    let session = h.studio.session().await;
    let layer = session.design().get(id).expect("layer");
    let image = layer.as_image().expect("image layer");
    assert_eq!(image.role, ImageRole::Logo);
    assert_eq!((image.natural_width, image.natural_height), (40, 20));
    assert_eq!(session.selection().primary(), Some(id));
    assert!(!session.is_busy(Action::Generate));

    let prompts = h.images.prompts.lock().unwrap();
    assert!(prompts[0].contains("\"Desert Bloom\""));
}

#[tokio::test]
async fn blank_prompt_never_reaches_the_service() {
    let h = harness(FakeImages::new(), MemoryStorage::default(), MemoryCatalog::default());

    let err = h
        .studio
        .generate(GenerationRequest::new(GenerationMode::Design, "  "))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StudioError::Validation(ValidationError::EmptyPrompt)
    ));
    assert!(h.images.prompts.lock().unwrap().is_empty());
    assert!(!h.studio.session().await.is_busy(Action::Generate));
}

#[tokio::test]
async fn undecodable_upload_fills_error_slot() {
    let h = harness(FakeImages::new(), MemoryStorage::default(), MemoryCatalog::default());

    let err = h
        .studio
        .upload_image(studio_core::ImageSource::new("image/png", b"not a png".to_vec()))
        .await
        .unwrap_err();
    assert_eq!(err.reason(), "decode");

    let session = h.studio.session().await;
    assert_eq!(
        session.error(Action::UploadImage).map(|e| e.reason),
        Some("decode")
    );
    assert!(session.error(Action::Generate).is_none());
    assert!(session.design().is_empty());
}

#[tokio::test]
async fn truncated_upload_adds_no_layer() {
    let h = harness(FakeImages::new(), MemoryStorage::default(), MemoryCatalog::default());

    let err = h
        .studio
        .upload_image(truncated(&png(40, 20, [200, 30, 30, 255])))
        .await
        .unwrap_err();
    assert_eq!(err.reason(), "decode");

    let session = h.studio.session().await;
    assert!(session.design().is_empty());
    assert_eq!(
        session.error(Action::UploadImage).map(|e| e.reason),
        Some("decode")
    );
}

#[tokio::test]
async fn truncated_generation_adds_no_layer() {
    let images = FakeImages {
        generated: truncated(&png(40, 20, [200, 30, 30, 255])),
        ..FakeImages::new()
    };
    let h = harness(images, MemoryStorage::default(), MemoryCatalog::default());

    let err = h
        .studio
        .generate(GenerationRequest::new(GenerationMode::Logo, "Desert Bloom"))
        .await
        .unwrap_err();
    assert_eq!(err.reason(), "decode");
    assert!(h.studio.session().await.design().is_empty());
}

#[tokio::test]
async fn truncated_cutout_keeps_original_bitmap() {
    let images = FakeImages {
        cutout: truncated(&png(40, 20, [200, 30, 30, 0])),
        ..FakeImages::new()
    };
    let h = harness(images, MemoryStorage::default(), MemoryCatalog::default());
    let original = png(40, 20, [10, 200, 10, 255]);
    let id = h
        .studio
        .upload_image(original.clone())
        .await
        .expect("upload");

    let err = h.studio.remove_background(Some(id)).await.unwrap_err();
    assert_eq!(err.reason(), "decode");

    let session = h.studio.session().await;
    let image = session
        .design()
        .get(id)
        .and_then(Layer::as_image)
        .expect("image layer");
    assert_eq!(image.role, ImageRole::Upload);
    assert_eq!(image.source.bytes(), original.bytes());
    assert_eq!(
        session.error(Action::RemoveBackground).map(|e| e.reason),
        Some("decode")
    );
    assert!(!session.is_busy(Action::RemoveBackground));
}

#[tokio::test]
async fn truncated_mockup_keeps_current_base() {
    let h = harness_with_mockup(
        FakeImages::new(),
        truncated(&png(100, 120, [240, 240, 240, 255])),
    );

    let err = h
        .studio
        .load_preset(studio_app::apparel::default_preset(), MockupSwapPolicy::default())
        .await
        .unwrap_err();
    assert_eq!(err.reason(), "decode");

    let session = h.studio.session().await;
    assert!(session.design().mockup().is_none());
    assert_eq!(
        session.error(Action::LoadMockup).map(|e| e.reason),
        Some("decode")
    );
}

#[tokio::test]
async fn custom_mockup_failure_uses_mockup_slot() {
    let h = harness(FakeImages::new(), MemoryStorage::default(), MemoryCatalog::default());

    let err = h
        .studio
        .set_custom_mockup(
            truncated(&png(300, 100, [255, 255, 255, 255])),
            MockupSwapPolicy::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.reason(), "decode");

    let session = h.studio.session().await;
    assert!(session.design().mockup().is_none());
    assert_eq!(
        session.error(Action::LoadMockup).map(|e| e.reason),
        Some("decode")
    );
    assert!(!session.is_busy(Action::LoadMockup));
}

#[tokio::test]
async fn background_removal_survives_a_drag() {
    let h = harness(FakeImages::gated(), MemoryStorage::default(), MemoryCatalog::default());
    let id = h
        .studio
        .upload_image(png(40, 20, [10, 200, 10, 255]))
        .await
        .expect("upload");

    let studio = h.studio.clone();
    let task = tokio::spawn(async move { studio.remove_background(None).await });
    let gate = h.images.gate.as_ref().expect("gate");
    gate.entered.notified().await;

    {
        let mut session = h.studio.session().await;
        assert!(session.is_busy(Action::RemoveBackground));
        session
            .update_geometry(
                id,
                GeometryUpdate {
                    position: Some(PercentPoint::new(30.0, 30.0)),
                    ..GeometryUpdate::default()
                },
            )
            .expect("drag");
    }

    // A second request for the same action is refused; other actions still run.
    let busy = h.studio.remove_background(Some(id)).await.unwrap_err();
    assert!(matches!(
        busy,
        StudioError::Validation(ValidationError::ActionBusy(Action::RemoveBackground))
    ));
    h.studio
        .generate(GenerationRequest::new(GenerationMode::Design, "stars"))
        .await
        .expect("generate while removing background");

    gate.release.notify_one();
    let applied = task.await.expect("join").expect("remove background");
    assert_eq!(applied, Applied::Applied(()));

    let session = h.studio.session().await;
    let layer = session.design().get(id).expect("layer");
    assert_eq!(layer.position, PercentPoint::new(30.0, 30.0));
    assert_eq!(
        layer.as_image().expect("image").role,
        ImageRole::BackgroundRemoved
    );
}

#[tokio::test]
async fn background_removal_is_discarded_after_edit() {
    let h = harness(FakeImages::gated(), MemoryStorage::default(), MemoryCatalog::default());
    let id = h
        .studio
        .upload_image(png(40, 20, [10, 200, 10, 255]))
        .await
        .expect("upload");

    let studio = h.studio.clone();
    let task = tokio::spawn(async move { studio.remove_background(Some(id)).await });
    let gate = h.images.gate.as_ref().expect("gate");
    gate.entered.notified().await;

    h.studio
        .session()
        .await
        .update_content(id, ContentUpdate::Filter(ImageFilter::Saturation { amount: 1.0 }))
        .expect("edit");
    gate.release.notify_one();

    let applied = task.await.expect("join").expect("remove background");
    assert_eq!(applied, Applied::Discarded);

    let session = h.studio.session().await;
    assert_eq!(
        session.design().get(id).unwrap().as_image().unwrap().role,
        ImageRole::Upload
    );
    assert!(!session.is_busy(Action::RemoveBackground));
}

#[tokio::test]
async fn background_removal_needs_an_image() {
    let h = harness(FakeImages::new(), MemoryStorage::default(), MemoryCatalog::default());
    h.studio
        .session()
        .await
        .add_layer(Layer::text(TextLayer::new("hello")));

    let err = h.studio.remove_background(None).await.unwrap_err();
    assert!(matches!(
        err,
        StudioError::Validation(ValidationError::NoImageSelected)
    ));
}

#[tokio::test]
async fn mockup_with_new_aspect_clears_layers() {
    let h = harness(FakeImages::new(), MemoryStorage::default(), MemoryCatalog::default());
    h.studio
        .upload_image(png(40, 20, [0, 0, 0, 255]))
        .await
        .expect("upload");

    // Canvas is 500x600; the fixture mockup is 100x120, same aspect.
    let swap = h
        .studio
        .load_preset(studio_app::apparel::default_preset(), MockupSwapPolicy::default())
        .await
        .expect("load mockup");
    assert!(!swap.aspect_changed);
    assert_eq!(h.studio.session().await.design().len(), 1);

    let swap = h
        .studio
        .set_custom_mockup(png(300, 100, [255, 255, 255, 255]), MockupSwapPolicy::default())
        .await
        .expect("custom mockup");
    assert!(swap.aspect_changed);
    assert_eq!(swap.cleared_layers, 1);

    let session = h.studio.session().await;
    assert!(session.design().is_empty());
    assert!(session.selection().is_empty());
    assert_eq!(
        session.design().mockup().and_then(|m| m.label.as_deref()),
        Some("Custom")
    );
}

#[tokio::test]
async fn publish_through_studio_renders_at_storefront_width() {
    let h = harness(FakeImages::new(), MemoryStorage::default(), MemoryCatalog::default());
    h.studio
        .session()
        .await
        .add_layer(Layer::text(TextLayer::new("SALE")));

    let product = h
        .studio
        .publish(&Listing::new("Test", 299.0))
        .await
        .expect("publish");
    assert_eq!(product.name, "Test");
    assert_eq!(*h.renderer.widths.lock().unwrap(), vec![1200]);

    h.studio
        .export(ExportTarget::Preview { multiplier: 2.0 })
        .await
        .expect("export");
    assert_eq!(h.renderer.calls.load(Ordering::SeqCst), 2);
    assert_eq!(h.renderer.widths.lock().unwrap()[1], 1000);
    assert!(!h.studio.session().await.is_busy(Action::Publish));
}

#[tokio::test]
async fn failed_publish_keeps_error_in_publish_slot() {
    let h = harness(
        FakeImages::new(),
        MemoryStorage::default(),
        MemoryCatalog {
            reject: true,
            ..MemoryCatalog::default()
        },
    );
    h.studio
        .session()
        .await
        .add_layer(Layer::text(TextLayer::new("SALE")));

    h.studio
        .publish(&Listing::new("Test", 299.0))
        .await
        .unwrap_err();

    let session = h.studio.session().await;
    assert_eq!(session.error(Action::Publish).map(|e| e.reason), Some("status"));
    assert_eq!(h.storage.removals.lock().unwrap().len(), 1);
}
