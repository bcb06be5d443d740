//! # Garment Studio CLI
//!
//! Command-line host for the garment studio.
//!
//! ## Usage
//!
//! ```bash
//! # Render a saved design at print resolution
//! garment-studio render design.json -o print.png --target print
//!
//! # Generate a logo and add it to a design
//! GEMINI_API_KEY=... garment-studio generate --mode logo --prompt "Desert Bloom" \
//!     -o logo.png --add-to design.json
//!
//! # Publish a design to the storefront
//! SUPABASE_URL=... SUPABASE_ANON_KEY=... garment-studio publish design.json \
//!     --name "Desert Bloom tee" --price 299
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - command-line arguments parsed with clap
//! - `ServiceArgs` - service credentials, also read from the environment
//! - [`commands`] - one async function per subcommand

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod commands;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use studio_app::GenerationMode;
use studio_renderer::ExportTarget;
use studio_services::{GeminiConfig, SupabaseConfig};

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "garment-studio")]
#[command(about = "Compose, render and publish garment designs")]
#[command(version)]
pub struct CliArgs {
    /// Service credentials.
    #[command(flatten)]
    pub services: ServiceArgs,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Render a design file to PNG.
    Render(RenderArgs),
    /// Generate an image from a prompt.
    Generate(GenerateArgs),
    /// Publish a design as a storefront product.
    Publish(PublishArgs),
    /// List the stock garments.
    Presets,
}

/// Service settings, each also read from the environment.
#[derive(Debug, Clone, Default, Args)]
pub struct ServiceArgs {
    /// Supabase project URL.
    #[arg(long, env = "SUPABASE_URL", global = true)]
    pub supabase_url: Option<String>,

    /// Supabase anon key.
    #[arg(long, env = "SUPABASE_ANON_KEY", global = true, hide_env_values = true)]
    pub supabase_anon_key: Option<String>,

    /// Storage bucket for listing images.
    #[arg(long, env = "SUPABASE_BUCKET", global = true)]
    pub supabase_bucket: Option<String>,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", global = true, hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini REST base URL.
    #[arg(long, env = "GEMINI_BASE_URL", global = true)]
    pub gemini_base_url: Option<String>,

    /// Gemini image model.
    #[arg(long, env = "GEMINI_IMAGE_MODEL", global = true)]
    pub gemini_image_model: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,
}

impl From<&ServiceArgs> for SupabaseConfig {
    fn from(args: &ServiceArgs) -> Self {
        let mut config = Self {
            url: args.supabase_url.clone(),
            anon_key: args.supabase_anon_key.clone(),
            ..Self::default()
        };
        if let Some(bucket) = &args.supabase_bucket {
            config.bucket.clone_from(bucket);
        }
        if let Some(secs) = args.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }
}

impl From<&ServiceArgs> for GeminiConfig {
    fn from(args: &ServiceArgs) -> Self {
        let mut config = Self {
            api_key: args.gemini_api_key.clone(),
            ..Self::default()
        };
        if let Some(base_url) = &args.gemini_base_url {
            config.base_url.clone_from(base_url);
        }
        if let Some(model) = &args.gemini_image_model {
            config.image_model.clone_from(model);
        }
        if let Some(secs) = args.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }
}

/// Export resolution presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TargetArg {
    /// Canvas width times `--multiplier`.
    #[default]
    Preview,
    /// 1200 px listing image.
    Storefront,
    /// 4000 px print file.
    Print,
}

/// Arguments for `render`.
#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    /// Design JSON file.
    pub design: PathBuf,

    /// Output PNG.
    #[arg(short, long, default_value = "design.png")]
    pub output: PathBuf,

    /// Resolution preset.
    #[arg(long, value_enum, default_value_t)]
    pub target: TargetArg,

    /// Preview scale relative to the canvas width.
    #[arg(long, default_value = "1.0")]
    pub multiplier: f32,

    /// Explicit output width; overrides `--target`.
    #[arg(long)]
    pub width: Option<u32>,

    /// Extra font files (Cairo, Tajawal, Changa).
    #[arg(long = "font")]
    pub fonts: Vec<PathBuf>,

    /// Do not load system fonts.
    #[arg(long)]
    pub no_system_fonts: bool,
}

impl RenderArgs {
    /// The export target selected by the flags.
    #[must_use]
    pub fn export_target(&self) -> ExportTarget {
        match (self.width, self.target) {
            (Some(width), _) => ExportTarget::Width(width),
            (None, TargetArg::Preview) => ExportTarget::Preview {
                multiplier: self.multiplier,
            },
            (None, TargetArg::Storefront) => ExportTarget::Storefront,
            (None, TargetArg::Print) => ExportTarget::Print,
        }
    }
}

/// Generation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ModeArg {
    /// Print-ready t-shirt graphic.
    #[default]
    Design,
    /// Logo or lettering on a transparent background.
    Logo,
    /// Edit `--reference`.
    ImageEdit,
}

impl From<ModeArg> for GenerationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Design => Self::Design,
            ModeArg::Logo => Self::Logo,
            ModeArg::ImageEdit => Self::ImageEdit,
        }
    }
}

/// Arguments for `generate`.
#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// What to generate.
    #[arg(long, value_enum, default_value_t)]
    pub mode: ModeArg,

    /// Description of the image.
    #[arg(long)]
    pub prompt: String,

    /// Reference image for `image-edit`.
    #[arg(long)]
    pub reference: Option<PathBuf>,

    /// Also remove the background of the result.
    #[arg(long)]
    pub remove_background: bool,

    /// Output image.
    #[arg(short, long, default_value = "generated.png")]
    pub output: PathBuf,

    /// Add the result as a layer to this design file.
    #[arg(long)]
    pub add_to: Option<PathBuf>,
}

/// Arguments for `publish`.
#[derive(Debug, Clone, Args)]
pub struct PublishArgs {
    /// Design JSON file.
    pub design: PathBuf,

    /// Product name. Suggested from the garment when omitted.
    #[arg(long)]
    pub name: Option<String>,

    /// Price. Taken from the garment when omitted.
    #[arg(long)]
    pub price: Option<f64>,

    /// Product description.
    #[arg(long)]
    pub description: Option<String>,

    /// Stock garment id, or `custom` for a user photo.
    #[arg(long)]
    pub garment: Option<String>,

    /// Prompt the design was generated from, used for the suggested name.
    #[arg(long)]
    pub prompt: Option<String>,

    /// Extra font files.
    #[arg(long = "font")]
    pub fonts: Vec<PathBuf>,
}
