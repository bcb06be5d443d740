//! Design layers - the building blocks of a composition.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::coords::{aspect_height_percent, PercentPoint, PercentRect, PercentSize, SurfaceSize};
use crate::{Color, CoreError, CoreResult, FilterStack, ImageSource};

/// Default placement of a freshly added image: centered, slightly above middle.
pub const DEFAULT_IMAGE_POSITION: PercentPoint = PercentPoint { x: 50.0, y: 45.0 };
/// Default width of a freshly added image, percent of canvas width.
pub const DEFAULT_IMAGE_WIDTH: f32 = 30.0;
/// Default placement of freshly added text.
pub const DEFAULT_TEXT_POSITION: PercentPoint = PercentPoint { x: 50.0, y: 65.0 };
/// Default font size of freshly added text, percent of canvas width.
pub const DEFAULT_FONT_SIZE: f32 = 5.0;

/// Average glyph advance as a fraction of the font size. Only used for hit
/// testing; rendering measures real glyphs.
const TEXT_ADVANCE_RATIO: f32 = 0.6;

/// Unique identifier for a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(Uuid);

impl LayerId {
    /// Create a new unique layer ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Font families offered for text layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    /// Cairo.
    #[default]
    Cairo,
    /// Tajawal.
    Tajawal,
    /// Changa.
    Changa,
}

impl FontFamily {
    /// All selectable families, in menu order.
    pub const ALL: [Self; 3] = [Self::Cairo, Self::Tajawal, Self::Changa];

    /// Family name as it appears in font files.
    #[must_use]
    pub fn family_name(self) -> &'static str {
        match self {
            Self::Cairo => "Cairo",
            Self::Tajawal => "Tajawal",
            Self::Changa => "Changa",
        }
    }

    /// Font-family list with a generic fallback.
    #[must_use]
    pub fn css_stack(self) -> String {
        format!("{}, sans-serif", self.family_name())
    }
}

/// Where an image layer's bitmap came from. Presentation only; every role
/// renders the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageRole {
    /// Uploaded by the user.
    #[default]
    Upload,
    /// Produced by the image generation service.
    Generated,
    /// Produced by background removal.
    BackgroundRemoved,
    /// Shown to the user as a logo.
    Logo,
}

/// A bitmap placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageLayer {
    /// Encoded bitmap.
    pub source: ImageSource,
    /// Natural width of the bitmap in pixels.
    pub natural_width: u32,
    /// Natural height of the bitmap in pixels.
    pub natural_height: u32,
    /// Width as percent of the canvas width. Height follows the aspect ratio.
    pub width: f32,
    /// Adjustments applied at render time.
    #[serde(default)]
    pub filters: FilterStack,
    /// Origin of the bitmap.
    #[serde(default)]
    pub role: ImageRole,
}

impl ImageLayer {
    /// Create an image layer at the default width.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ZeroDimension`] if either natural dimension is zero.
    pub fn new(source: ImageSource, natural_width: u32, natural_height: u32) -> CoreResult<Self> {
        if natural_width == 0 || natural_height == 0 {
            return Err(CoreError::ZeroDimension {
                width: natural_width,
                height: natural_height,
            });
        }
        Ok(Self {
            source,
            natural_width,
            natural_height,
            width: DEFAULT_IMAGE_WIDTH,
            filters: FilterStack::new(),
            role: ImageRole::Upload,
        })
    }

    /// Set the role.
    #[must_use]
    pub fn with_role(mut self, role: ImageRole) -> Self {
        self.role = role;
        self
    }

    /// Set the width (percent of canvas width).
    #[must_use]
    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    /// Percentage size on the given surface.
    ///
    /// # Errors
    ///
    /// Returns an error for degenerate images or surfaces.
    pub fn size_on(&self, surface: SurfaceSize) -> CoreResult<PercentSize> {
        let height =
            aspect_height_percent(self.width, self.natural_width, self.natural_height, surface)?;
        Ok(PercentSize::new(self.width, height))
    }
}

/// A line of text placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLayer {
    /// Text content.
    pub content: String,
    /// Fill color.
    pub color: Color,
    /// Font family.
    #[serde(default)]
    pub font: FontFamily,
    /// Font size as percent of the canvas width.
    pub font_size: f32,
}

impl TextLayer {
    /// Create a text layer with the default style.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            color: Color::WHITE,
            font: FontFamily::default(),
            font_size: DEFAULT_FONT_SIZE,
        }
    }

    /// Whether the text would draw anything.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        !self.content.trim().is_empty() && self.font_size > 0.0 && self.color.a > 0
    }

    /// Rough extent for hit testing.
    fn estimated_size(&self, surface: SurfaceSize) -> PercentSize {
        #[allow(clippy::cast_precision_loss)]
        let chars = self.content.chars().count().max(1) as f32;
        let width = chars * self.font_size * TEXT_ADVANCE_RATIO;
        // font_size is relative to width; convert the line height to percent of height.
        let height = self.font_size * surface.aspect_ratio();
        PercentSize::new(width, height)
    }
}

/// Several layers moved and rendered as one.
///
/// Each member's `position` is an offset from the group's position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupLayer {
    /// Members in z-order, bottom first.
    pub members: Vec<Layer>,
}

/// The type of content a layer contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum LayerKind {
    /// A bitmap.
    Image(ImageLayer),
    /// A text label.
    Text(TextLayer),
    /// A group of layers.
    Group(GroupLayer),
}

/// A positioned element of a design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Unique identifier.
    pub id: LayerId,
    /// Center of the layer in percentage space (or offset from the group
    /// anchor, for group members).
    pub position: PercentPoint,
    /// Clockwise rotation in degrees about the layer center. Groups do not rotate.
    #[serde(default)]
    pub rotation: f32,
    /// Layer content.
    pub kind: LayerKind,
    /// Incremented on every content change.
    #[serde(default)]
    revision: u64,
}

impl Layer {
    /// Create a layer of the given kind at the given position.
    #[must_use]
    pub fn new(kind: LayerKind, position: PercentPoint) -> Self {
        Self {
            id: LayerId::new(),
            position,
            rotation: 0.0,
            kind,
            revision: 0,
        }
    }

    /// Create an image layer at the default image position.
    #[must_use]
    pub fn image(image: ImageLayer) -> Self {
        Self::new(LayerKind::Image(image), DEFAULT_IMAGE_POSITION)
    }

    /// Create a text layer at the default text position.
    #[must_use]
    pub fn text(text: TextLayer) -> Self {
        Self::new(LayerKind::Text(text), DEFAULT_TEXT_POSITION)
    }

    /// Set the position.
    #[must_use]
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = PercentPoint::new(x, y);
        self
    }

    /// Content revision counter.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn bump_revision(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// The image data, if this is an image layer.
    #[must_use]
    pub fn as_image(&self) -> Option<&ImageLayer> {
        match &self.kind {
            LayerKind::Image(image) => Some(image),
            _ => None,
        }
    }

    /// The text data, if this is a text layer.
    #[must_use]
    pub fn as_text(&self) -> Option<&TextLayer> {
        match &self.kind {
            LayerKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Whether this layer contributes visible content to a render.
    #[must_use]
    pub fn has_visible_content(&self) -> bool {
        match &self.kind {
            LayerKind::Image(_) => true,
            LayerKind::Text(text) => text.is_visible(),
            LayerKind::Group(group) => group.members.iter().any(Layer::has_visible_content),
        }
    }

    /// Bounding box in percentage space on the given surface, ignoring rotation.
    ///
    /// # Errors
    ///
    /// Returns an error for degenerate images or surfaces.
    pub fn bounds(&self, surface: SurfaceSize) -> CoreResult<PercentRect> {
        match &self.kind {
            LayerKind::Image(image) => Ok(PercentRect {
                center: self.position,
                size: image.size_on(surface)?,
            }),
            LayerKind::Text(text) => Ok(PercentRect {
                center: self.position,
                size: text.estimated_size(surface.validate()?),
            }),
            LayerKind::Group(group) => {
                let mut min = (f32::INFINITY, f32::INFINITY);
                let mut max = (f32::NEG_INFINITY, f32::NEG_INFINITY);
                for member in &group.members {
                    let b = member.bounds(surface)?;
                    let cx = self.position.x + b.center.x;
                    let cy = self.position.y + b.center.y;
                    min.0 = min.0.min(cx - b.size.width / 2.0);
                    min.1 = min.1.min(cy - b.size.height / 2.0);
                    max.0 = max.0.max(cx + b.size.width / 2.0);
                    max.1 = max.1.max(cy + b.size.height / 2.0);
                }
                if group.members.is_empty() {
                    return Ok(PercentRect {
                        center: self.position,
                        size: PercentSize::default(),
                    });
                }
                Ok(PercentRect {
                    center: PercentPoint::new((min.0 + max.0) / 2.0, (min.1 + max.1) / 2.0),
                    size: PercentSize::new(max.0 - min.0, max.1 - min.1),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_source() -> ImageSource {
        ImageSource::new("image/png", vec![0x89, 0x50, 0x4E, 0x47])
    }

    #[test]
    fn test_image_layer_rejects_zero_dimension() {
        assert!(matches!(
            ImageLayer::new(png_source(), 0, 10),
            Err(CoreError::ZeroDimension { .. })
        ));
    }

    #[test]
    fn test_image_bounds_preserve_aspect() {
        let layer = Layer::image(
            ImageLayer::new(png_source(), 400, 200)
                .expect("image")
                .with_width(30.0),
        );
        let surface = SurfaceSize::new(1000.0, 500.0);
        let bounds = layer.bounds(surface).expect("bounds");
        // 300x150 px on a 1000x500 surface
        assert!((bounds.size.width - 30.0).abs() < 1e-4);
        assert!((bounds.size.height - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_text_visibility() {
        assert!(!TextLayer::new("").is_visible());
        assert!(!TextLayer::new("   ").is_visible());
        assert!(TextLayer::new("SALE").is_visible());
        let mut clear = TextLayer::new("SALE");
        clear.color = Color::rgba(0, 0, 0, 0);
        assert!(!clear.is_visible());
    }

    #[test]
    fn test_group_visibility_follows_members() {
        let group = Layer::new(
            LayerKind::Group(GroupLayer {
                members: vec![Layer::text(TextLayer::new(""))],
            }),
            PercentPoint::new(50.0, 50.0),
        );
        assert!(!group.has_visible_content());
    }

    #[test]
    fn test_font_css_stack() {
        assert_eq!(FontFamily::Tajawal.css_stack(), "Tajawal, sans-serif");
    }

    #[test]
    fn test_layer_serde_tags_kind() {
        let layer = Layer::text(TextLayer::new("Hi"));
        let json = serde_json::to_value(&layer).expect("serialize");
        assert_eq!(json["kind"]["type"], "text");
        let back: Layer = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, layer);
    }
}
