//! Flattening a design into a single PNG.
//!
//! Rendering happens in two steps. [`Compositor::plan`] resolves percentage
//! geometry against the output surface and produces a flat list of draw
//! operations; [`Compositor::render_plan`] rasterizes that list with tiny-skia.
//! Text goes through a one-element SVG so usvg handles shaping and font
//! fallback.

use std::fmt::Write;
use std::path::PathBuf;
use std::sync::Arc;

use studio_core::coords::{point_to_absolute, to_absolute};
use studio_core::{
    Color, CoreError, Design, FilterStack, FontFamily, ImageSource, Layer, LayerId, LayerKind, Mockup,
    PercentPoint, PixelRect, SurfaceSize,
};
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};

use crate::error::{RenderError, RenderResult};
use crate::{filters, image};

/// Output width of storefront listing images.
pub const STOREFRONT_WIDTH: u32 = 1200;
/// Output width of print-resolution exports.
pub const PRINT_WIDTH: u32 = 4000;

/// Which resolution to export at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExportTarget {
    /// On-screen preview: the canvas width times a multiplier.
    Preview {
        /// Scale applied to the canvas width.
        multiplier: f32,
    },
    /// Storefront listing image.
    Storefront,
    /// Print file.
    Print,
    /// Explicit width in pixels.
    Width(u32),
}

impl ExportTarget {
    /// Output width in pixels for a canvas of the given width.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn width(self, canvas_width: f32) -> u32 {
        match self {
            Self::Preview { multiplier } => (canvas_width * multiplier).round().max(1.0) as u32,
            Self::Storefront => STOREFRONT_WIDTH,
            Self::Print => PRINT_WIDTH,
            Self::Width(width) => width,
        }
    }
}

/// Configuration for the compositor.
#[derive(Debug, Clone)]
pub struct CompositorConfig {
    /// Fill drawn beneath a mockup passed to [`Compositor::render`].
    pub background: Color,
    /// Load the fonts installed on the system.
    pub load_system_fonts: bool,
    /// Additional font files, e.g. bundled Cairo/Tajawal/Changa.
    pub font_files: Vec<PathBuf>,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            background: Color::WHITE,
            load_system_fonts: true,
            font_files: Vec::new(),
        }
    }
}

/// A fully resolved draw operation in output pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Fill the whole surface.
    Fill(Color),
    /// Draw the mockup stretched over the whole surface.
    Mockup {
        /// Encoded mockup photo.
        source: ImageSource,
    },
    /// Draw a bitmap layer.
    Image {
        /// Originating layer.
        layer: LayerId,
        /// Encoded bitmap.
        source: ImageSource,
        /// Filters applied after decoding.
        filters: FilterStack,
        /// Destination rectangle before rotation.
        rect: PixelRect,
        /// Clockwise rotation in degrees about the rectangle center.
        rotation: f32,
    },
    /// Draw a text layer.
    Text {
        /// Originating layer.
        layer: LayerId,
        /// Text content.
        content: String,
        /// Fill color.
        color: Color,
        /// Font family.
        font: FontFamily,
        /// Font size in pixels.
        font_px: f32,
        /// Anchor (text center) in pixels.
        center: (f32, f32),
        /// Clockwise rotation in degrees about the anchor.
        rotation: f32,
    },
}

/// Geometry resolved for one output size.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Operations in draw order.
    pub ops: Vec<DrawOp>,
}

/// A rendered PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    /// PNG bytes.
    pub png: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ExportResult {
    /// Wrap the PNG as an image source.
    #[must_use]
    pub fn to_image_source(&self) -> ImageSource {
        ImageSource::new("image/png", self.png.clone())
    }
}

/// What sits beneath the layers.
enum Backdrop<'a> {
    Mockup { mockup: &'a Mockup, fill: Color },
    Plain { aspect_ratio: f32, fill: Color },
}

/// Rasterizes designs.
pub struct Compositor {
    config: CompositorConfig,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl Compositor {
    /// Create a compositor, loading the configured fonts.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Font`] if a configured font file cannot be read.
    pub fn new(config: CompositorConfig) -> RenderResult<Self> {
        let mut db = usvg::fontdb::Database::new();
        if config.load_system_fonts {
            db.load_system_fonts();
        }
        for path in &config.font_files {
            db.load_font_file(path)
                .map_err(|e| RenderError::Font(format!("{}: {e}", path.display())))?;
        }
        tracing::debug!(faces = db.len(), "font database loaded");

        Ok(Self {
            config,
            fontdb: Arc::new(db),
        })
    }

    /// Create a compositor with system fonts and a white background.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn with_defaults() -> RenderResult<Self> {
        Self::new(CompositorConfig::default())
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Resolve layers over a mockup at the given output width. The output
    /// height follows the mockup's aspect ratio.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero width or degenerate layer geometry.
    pub fn plan(&self, mockup: &Mockup, layers: &[Layer], width: u32) -> RenderResult<RenderPlan> {
        let backdrop = Backdrop::Mockup {
            mockup,
            fill: self.config.background,
        };
        build_plan(&backdrop, layers, width)
    }

    /// Resolve a whole design. Without a mockup the canvas aspect ratio and
    /// background are used.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero width or degenerate layer geometry.
    pub fn plan_design(&self, design: &Design, width: u32) -> RenderResult<RenderPlan> {
        let backdrop = match design.mockup() {
            Some(mockup) => Backdrop::Mockup {
                mockup,
                fill: design.canvas.background,
            },
            None => Backdrop::Plain {
                aspect_ratio: design.canvas.surface().validate()?.aspect_ratio(),
                fill: design.canvas.background,
            },
        };
        build_plan(&backdrop, design.layers(), width)
    }

    /// Render layers over a mockup to PNG.
    ///
    /// # Errors
    ///
    /// Any source failing to decode aborts the whole render.
    pub fn render(&self, mockup: &Mockup, layers: &[Layer], width: u32) -> RenderResult<ExportResult> {
        let plan = self.plan(mockup, layers, width)?;
        self.render_plan(&plan)
    }

    /// Render a design to PNG.
    ///
    /// # Errors
    ///
    /// Any source failing to decode aborts the whole render.
    pub fn render_design(&self, design: &Design, width: u32) -> RenderResult<ExportResult> {
        let plan = self.plan_design(design, width)?;
        self.render_plan(&plan)
    }

    /// Render a design at an export target.
    ///
    /// # Errors
    ///
    /// See [`Self::render_design`].
    pub fn export(&self, design: &Design, target: ExportTarget) -> RenderResult<ExportResult> {
        self.render_design(design, target.width(design.canvas.width))
    }

    /// Rasterize a plan and encode it as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if a source fails to decode, text has no usable font,
    /// or encoding fails.
    pub fn render_plan(&self, plan: &RenderPlan) -> RenderResult<ExportResult> {
        let mut pixmap = Pixmap::new(plan.width, plan.height).ok_or_else(|| {
            RenderError::Surface(format!(
                "cannot allocate {}x{} surface",
                plan.width, plan.height
            ))
        })?;

        for op in &plan.ops {
            match op {
                DrawOp::Fill(color) => pixmap.fill(to_skia_color(*color)),
                DrawOp::Mockup { source } => {
                    let decoded = image::decode(source)?;
                    #[allow(clippy::cast_precision_loss)]
                    let rect = PixelRect {
                        x: 0.0,
                        y: 0.0,
                        width: plan.width as f32,
                        height: plan.height as f32,
                    };
                    draw_bitmap(&mut pixmap, &image::to_pixmap(&decoded)?, rect, 0.0);
                }
                DrawOp::Image {
                    source,
                    filters: stack,
                    rect,
                    rotation,
                    ..
                } => {
                    let mut decoded = image::decode(source)?;
                    filters::apply(stack, &mut decoded);
                    draw_bitmap(&mut pixmap, &image::to_pixmap(&decoded)?, *rect, *rotation);
                }
                DrawOp::Text { .. } => self.draw_text(&mut pixmap, op)?,
            }
        }

        let png = pixmap
            .encode_png()
            .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))?;
        tracing::debug!(
            width = plan.width,
            height = plan.height,
            ops = plan.ops.len(),
            bytes = png.len(),
            "design rendered"
        );
        Ok(ExportResult {
            png,
            width: plan.width,
            height: plan.height,
        })
    }

    fn draw_text(&self, pixmap: &mut Pixmap, op: &DrawOp) -> RenderResult<()> {
        let DrawOp::Text {
            content,
            color,
            font,
            font_px,
            center: (cx, cy),
            rotation,
            ..
        } = op
        else {
            return Ok(());
        };
        if content.trim().is_empty() || color.a == 0 || *font_px <= 0.0 {
            return Ok(());
        }

        let (w, h) = (pixmap.width(), pixmap.height());
        let mut svg = String::with_capacity(256 + content.len());
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
        );
        let _ = write!(
            svg,
            "<text x=\"{cx}\" y=\"{cy}\" font-size=\"{font_px}\" font-family=\"{}\" fill=\"{}\" fill-opacity=\"{}\" text-anchor=\"middle\" dominant-baseline=\"central\" transform=\"rotate({rotation} {cx} {cy})\">{}</text>",
            escape_xml(&font.css_stack()),
            color.to_rgb_hex(),
            color.opacity(),
            escape_xml(content),
        );
        svg.push_str("</svg>");

        let mut options = usvg::Options::default();
        options.fontdb = Arc::clone(&self.fontdb);
        let tree = usvg::Tree::from_str(&svg, &options)
            .map_err(|e| RenderError::Font(format!("text could not be laid out: {e}")))?;
        if !tree.root().has_children() {
            return Err(RenderError::Font(format!(
                "no usable font for {:?}",
                font.family_name()
            )));
        }

        resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());
        Ok(())
    }
}

fn build_plan(backdrop: &Backdrop<'_>, layers: &[Layer], width: u32) -> RenderResult<RenderPlan> {
    let (aspect_ratio, fill) = match backdrop {
        Backdrop::Mockup { mockup, fill } => (mockup.aspect_ratio(), *fill),
        Backdrop::Plain { aspect_ratio, fill } => (*aspect_ratio, *fill),
    };
    let height = output_height(width, aspect_ratio);
    if width == 0 || height == 0 {
        return Err(RenderError::ZeroDimension { width, height });
    }
    #[allow(clippy::cast_precision_loss)]
    let surface = SurfaceSize::new(width as f32, height as f32);

    let mut ops = vec![DrawOp::Fill(fill)];
    if let Backdrop::Mockup { mockup, .. } = backdrop {
        ops.push(DrawOp::Mockup {
            source: mockup.source.clone(),
        });
    }
    for layer in layers {
        push_layer(&mut ops, layer, PercentPoint::default(), surface)?;
    }

    Ok(RenderPlan { width, height, ops })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn output_height(width: u32, aspect_ratio: f32) -> u32 {
    if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) {
        return 0;
    }
    (width as f32 / aspect_ratio).round() as u32
}

fn push_layer(
    ops: &mut Vec<DrawOp>,
    layer: &Layer,
    origin: PercentPoint,
    surface: SurfaceSize,
) -> RenderResult<()> {
    let position = origin.offset(layer.position.x, layer.position.y);
    match &layer.kind {
        LayerKind::Image(img) => {
            let size = img.size_on(surface)?;
            let rect = to_absolute(position, size, surface);
            if !(rect.x.is_finite()
                && rect.y.is_finite()
                && rect.width.is_finite()
                && rect.height.is_finite()
                && rect.width > 0.0
                && rect.height > 0.0)
            {
                return Err(invalid_geometry(layer, &format!("{rect:?}")));
            }
            ops.push(DrawOp::Image {
                layer: layer.id,
                source: img.source.clone(),
                filters: img.filters.clone(),
                rect,
                rotation: checked_rotation(layer)?,
            });
        }
        LayerKind::Text(text) => {
            let font_px = text.font_size / 100.0 * surface.width;
            let center = point_to_absolute(position, surface);
            if !(font_px.is_finite() && center.0.is_finite() && center.1.is_finite()) {
                return Err(invalid_geometry(
                    layer,
                    &format!("font {font_px}px at {center:?}"),
                ));
            }
            if text.is_visible() {
                ops.push(DrawOp::Text {
                    layer: layer.id,
                    content: text.content.clone(),
                    color: text.color,
                    font: text.font,
                    font_px,
                    center,
                    rotation: checked_rotation(layer)?,
                });
            }
        }
        LayerKind::Group(group) => {
            for member in &group.members {
                push_layer(ops, member, position, surface)?;
            }
        }
    }
    Ok(())
}

fn invalid_geometry(layer: &Layer, detail: &str) -> RenderError {
    RenderError::Geometry(CoreError::InvalidGeometry(format!(
        "layer {}: {detail}",
        layer.id
    )))
}

fn checked_rotation(layer: &Layer) -> RenderResult<f32> {
    if layer.rotation.is_finite() {
        Ok(layer.rotation)
    } else {
        Err(invalid_geometry(layer, &format!("rotation {}", layer.rotation)))
    }
}

#[allow(clippy::cast_precision_loss)]
fn draw_bitmap(target: &mut Pixmap, bitmap: &Pixmap, rect: PixelRect, rotation: f32) {
    let sx = rect.width / bitmap.width() as f32;
    let sy = rect.height / bitmap.height() as f32;
    let (cx, cy) = rect.center();
    let transform = Transform::from_rotate_at(rotation, cx, cy)
        .pre_concat(Transform::from_translate(rect.x, rect.y).pre_scale(sx, sy));
    let paint = PixmapPaint {
        quality: FilterQuality::Bicubic,
        ..PixmapPaint::default()
    };
    target.draw_pixmap(0, 0, bitmap.as_ref(), &paint, transform, None);
}

fn to_skia_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
