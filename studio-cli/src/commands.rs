//! Subcommand implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use studio_app::apparel::{self, Garment};
use studio_app::{GenerationRequest, Listing, PublishConfig, PublishFlow};
use studio_core::{Design, ImageLayer, ImageSource, Layer};
use studio_renderer::image::decoded_dimensions;
use studio_renderer::{Compositor, CompositorConfig};
use studio_services::{
    BackgroundRemover, GeminiClient, GeminiConfig, ImageGenerator, SupabaseCatalog,
    SupabaseConfig, SupabaseStorage,
};

use crate::{CliArgs, Command, GenerateArgs, PublishArgs, RenderArgs, ServiceArgs};

/// Run the selected subcommand.
///
/// # Errors
///
/// Returns any I/O, validation, render or service error.
pub async fn run(args: CliArgs) -> anyhow::Result<()> {
    match args.command {
        Command::Render(render_args) => render(&render_args).await,
        Command::Generate(generate_args) => generate(&args.services, generate_args).await,
        Command::Publish(publish_args) => publish(&args.services, &publish_args).await,
        Command::Presets => {
            presets();
            Ok(())
        }
    }
}

async fn load_design(path: &Path) -> anyhow::Result<Design> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading design {}", path.display()))?;
    Design::from_json(&json).with_context(|| format!("parsing design {}", path.display()))
}

async fn read_image(path: &Path) -> anyhow::Result<ImageSource> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading image {}", path.display()))?;
    Ok(ImageSource::sniffed(bytes, "application/octet-stream"))
}

fn compositor(fonts: Vec<PathBuf>, load_system_fonts: bool) -> anyhow::Result<Compositor> {
    Compositor::new(CompositorConfig {
        load_system_fonts,
        font_files: fonts,
        ..CompositorConfig::default()
    })
    .context("initializing compositor")
}

async fn render(args: &RenderArgs) -> anyhow::Result<()> {
    let design = load_design(&args.design).await?;
    let compositor = compositor(args.fonts.clone(), !args.no_system_fonts)?;
    let target = args.export_target();

    let export = tokio::task::spawn_blocking(move || compositor.export(&design, target))
        .await
        .context("render task")??;
    tokio::fs::write(&args.output, &export.png)
        .await
        .with_context(|| format!("writing {}", args.output.display()))?;

    tracing::info!(
        output = %args.output.display(),
        width = export.width,
        height = export.height,
        "design rendered"
    );
    Ok(())
}

async fn generate(services: &ServiceArgs, args: GenerateArgs) -> anyhow::Result<()> {
    let reference = match &args.reference {
        Some(path) => Some(read_image(path).await?),
        None => None,
    };
    let request = GenerationRequest {
        mode: args.mode.into(),
        prompt: args.prompt,
        reference,
    };
    let instruction = request.compose()?;

    let client = GeminiClient::new(GeminiConfig::from(services))?;
    let mut image = match &request.reference {
        Some(reference) => client.generate_from_image(reference, &instruction).await?,
        None => client.generate_from_text(&instruction).await?,
    };
    if args.remove_background {
        image = client.remove_background(&image).await?;
    }

    tokio::fs::write(&args.output, image.bytes())
        .await
        .with_context(|| format!("writing {}", args.output.display()))?;
    tracing::info!(output = %args.output.display(), mime = %image.mime_type, "image generated");

    if let Some(path) = &args.add_to {
        let mut design = load_design(path).await?;
        let (width, height) = decoded_dimensions(&image)?;
        let layer = ImageLayer::new(image, width, height)?.with_role(request.mode.role());
        let id = design.append(Layer::image(layer));
        tokio::fs::write(path, design.to_json()?)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(design = %path.display(), layer = %id, "layer added");
    }
    Ok(())
}

fn listing_for(args: &PublishArgs) -> anyhow::Result<Listing> {
    let garment = match args.garment.as_deref() {
        Some("custom") => Garment::Custom,
        Some(id) => match apparel::find(id) {
            Some(preset) => Garment::preset(preset),
            None => bail!("unknown garment {id:?}; run `presets` to list them"),
        },
        None => Garment::preset(apparel::default_preset()),
    };
    let mut listing = apparel::suggest_listing(garment, args.prompt.as_deref());
    if let Some(name) = &args.name {
        listing.name.clone_from(name);
    }
    if let Some(price) = args.price {
        listing.price = price;
    }
    if let Some(description) = &args.description {
        listing.description = Some(description.clone());
    }
    Ok(listing)
}

async fn publish(services: &ServiceArgs, args: &PublishArgs) -> anyhow::Result<()> {
    let design = load_design(&args.design).await?;
    let listing = listing_for(args)?;
    studio_app::validate(&design, &listing)?;

    let supabase = SupabaseConfig::from(services);
    let flow = PublishFlow::new(
        Arc::new(compositor(args.fonts.clone(), true)?),
        Arc::new(SupabaseStorage::new(&supabase)?),
        Arc::new(SupabaseCatalog::new(&supabase)?),
        PublishConfig::default(),
    );

    let product = flow.publish(design, &listing).await?;
    println!("{}", serde_json::to_string_pretty(&product)?);
    Ok(())
}

fn presets() {
    for preset in apparel::PRESETS {
        let color = preset.default_color();
        println!(
            "{:<26} {:<22} {:>6.0}  {} {}",
            preset.id, preset.name, preset.base_price, color.name, color.mockup_url
        );
    }
}
