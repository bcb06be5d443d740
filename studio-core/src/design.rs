//! The design document: canvas, base mockup and the ordered layer stack.

use serde::{Deserialize, Serialize};

use crate::coords::{PercentPoint, SurfaceSize};
use crate::layer::{GroupLayer, ImageRole, Layer, LayerId, LayerKind};
use crate::{Color, CoreError, CoreResult, FilterKind, FontFamily, ImageFilter, ImageSource};

/// Relative aspect-ratio difference above which a mockup swap counts as a
/// change of shape.
pub const ASPECT_TOLERANCE: f32 = 0.02;

/// The interactive design surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Fill behind the mockup (and the only base when there is no mockup).
    pub background: Color,
}

impl Canvas {
    /// Create a canvas with a white background.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            background: Color::WHITE,
        }
    }

    /// Resize the canvas. Layer geometry is percentage-based and stays as is.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidGeometry`] for non-positive dimensions.
    pub fn resize(&mut self, width: f32, height: f32) -> CoreResult<()> {
        SurfaceSize::new(width, height).validate()?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Canvas size as a surface.
    #[must_use]
    pub fn surface(&self) -> SurfaceSize {
        SurfaceSize::new(self.width, self.height)
    }
}

impl Default for Canvas {
    fn default() -> Self {
        // Portrait garment ratio used by the studio.
        Self::new(500.0, 600.0)
    }
}

/// The product photo layers are composited onto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mockup {
    /// Encoded photo.
    pub source: ImageSource,
    /// Natural width in pixels.
    pub natural_width: u32,
    /// Natural height in pixels.
    pub natural_height: u32,
    /// Optional display label, e.g. the garment name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Mockup {
    /// Create a mockup.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ZeroDimension`] if either dimension is zero.
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
            label: None,
        })
    }

    /// Set the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Width divided by height.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn aspect_ratio(&self) -> f32 {
        self.natural_width as f32 / self.natural_height as f32
    }
}

/// What happens to existing layers when the mockup changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockupSwapPolicy {
    /// Keep every layer where it is.
    KeepLayers,
    /// Remove every layer.
    ClearLayers,
    /// Remove layers only when the aspect ratio changes materially.
    #[default]
    ClearOnAspectChange,
}

/// Outcome of a mockup swap, for user feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockupSwap {
    /// Whether the base aspect ratio changed by more than [`ASPECT_TOLERANCE`].
    pub aspect_changed: bool,
    /// Number of layers removed by the swap.
    pub cleared_layers: usize,
}

/// A geometry change for one layer. `None` fields are left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeometryUpdate {
    /// New center position.
    pub position: Option<PercentPoint>,
    /// New width (image layers only), percent of canvas width.
    pub width: Option<f32>,
    /// New rotation in degrees (image and text layers only).
    pub rotation: Option<f32>,
}

/// Partial update of a text layer's content and style.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextPatch {
    /// New text.
    pub content: Option<String>,
    /// New fill color.
    pub color: Option<Color>,
    /// New font family.
    pub font: Option<FontFamily>,
    /// New font size, percent of canvas width.
    pub font_size: Option<f32>,
}

/// A content change for one layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentUpdate {
    /// Edit a text layer.
    Text(TextPatch),
    /// Replace an image layer's bitmap, keeping its geometry and filters.
    Bitmap {
        /// New encoded bitmap.
        source: ImageSource,
        /// Natural width of the new bitmap.
        natural_width: u32,
        /// Natural height of the new bitmap.
        natural_height: u32,
        /// Origin of the new bitmap.
        role: ImageRole,
    },
    /// Set (or replace) one image filter.
    Filter(ImageFilter),
    /// Remove one image filter.
    ClearFilter(FilterKind),
}

/// A garment design: canvas, optional mockup and layers in z-order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Design {
    /// The design surface.
    pub canvas: Canvas,
    /// Base product photo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mockup: Option<Mockup>,
    /// Layers, bottom first.
    #[serde(default)]
    layers: Vec<Layer>,
}

impl Design {
    /// Create an empty design on the given canvas.
    #[must_use]
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            mockup: None,
            layers: Vec::new(),
        }
    }

    /// The active mockup.
    #[must_use]
    pub fn mockup(&self) -> Option<&Mockup> {
        self.mockup.as_ref()
    }

    /// Aspect ratio of the base: the mockup if present, otherwise the canvas.
    #[must_use]
    pub fn base_aspect_ratio(&self) -> f32 {
        self.mockup
            .as_ref()
            .map_or_else(|| self.canvas.surface().aspect_ratio(), Mockup::aspect_ratio)
    }

    /// Replace (or remove) the mockup.
    pub fn set_mockup(&mut self, mockup: Option<Mockup>, policy: MockupSwapPolicy) -> MockupSwap {
        let old = self.base_aspect_ratio();
        self.mockup = mockup;
        let new = self.base_aspect_ratio();
        let aspect_changed = ((new - old) / old).abs() > ASPECT_TOLERANCE;

        let clear = match policy {
            MockupSwapPolicy::KeepLayers => false,
            MockupSwapPolicy::ClearLayers => true,
            MockupSwapPolicy::ClearOnAspectChange => aspect_changed,
        };
        let cleared_layers = if clear {
            let n = self.layers.len();
            self.layers.clear();
            n
        } else {
            0
        };

        tracing::debug!(aspect_changed, cleared_layers, "mockup swapped");
        MockupSwap {
            aspect_changed,
            cleared_layers,
        }
    }

    /// Add a layer on top of the stack.
    pub fn append(&mut self, layer: Layer) -> LayerId {
        let id = layer.id;
        self.layers.push(layer);
        id
    }

    /// Remove a layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is not found.
    pub fn remove(&mut self, id: LayerId) -> CoreResult<Layer> {
        let index = self.index_of(id)?;
        Ok(self.layers.remove(index))
    }

    /// Get a layer by ID.
    #[must_use]
    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Whether a layer with this ID exists at the top level.
    #[must_use]
    pub fn contains(&self, id: LayerId) -> bool {
        self.get(id).is_some()
    }

    /// Layers in z-order, bottom first.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Stack index of a layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is not found.
    pub fn index_of(&self, id: LayerId) -> CoreResult<usize> {
        self.layers
            .iter()
            .position(|l| l.id == id)
            .ok_or(CoreError::LayerNotFound(id))
    }

    fn get_mut(&mut self, id: LayerId) -> CoreResult<&mut Layer> {
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(CoreError::LayerNotFound(id))
    }

    /// Number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the design has no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Whether any layer would draw something: an image, or non-blank text.
    #[must_use]
    pub fn has_visible_content(&self) -> bool {
        self.layers.iter().any(Layer::has_visible_content)
    }

    /// Change one layer's geometry.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is missing, a value is not finite, or the
    /// field does not apply to the layer's kind.
    pub fn update_geometry(&mut self, id: LayerId, update: GeometryUpdate) -> CoreResult<()> {
        let layer = self.get_mut(id)?;

        if let Some(position) = update.position {
            if !(position.x.is_finite() && position.y.is_finite()) {
                return Err(CoreError::InvalidGeometry(format!(
                    "position must be finite, got {position:?}"
                )));
            }
        }
        if let Some(width) = update.width {
            if !(width.is_finite() && width > 0.0) {
                return Err(CoreError::InvalidGeometry(format!(
                    "width must be positive, got {width}"
                )));
            }
            if !matches!(layer.kind, LayerKind::Image(_)) {
                return Err(CoreError::InvalidOperation(
                    "only image layers have an independent width".to_string(),
                ));
            }
        }
        if let Some(rotation) = update.rotation {
            if !rotation.is_finite() {
                return Err(CoreError::InvalidGeometry(format!(
                    "rotation must be finite, got {rotation}"
                )));
            }
            if matches!(layer.kind, LayerKind::Group(_)) {
                return Err(CoreError::InvalidOperation(
                    "groups cannot be rotated".to_string(),
                ));
            }
        }

        if let Some(position) = update.position {
            layer.position = position;
        }
        if let (Some(width), LayerKind::Image(image)) = (update.width, &mut layer.kind) {
            image.width = width;
        }
        if let Some(rotation) = update.rotation {
            layer.rotation = rotation.rem_euclid(360.0);
        }
        Ok(())
    }

    /// Change one layer's content. Bumps the layer's revision.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is missing, the update does not match the
    /// layer's kind, or a value is invalid.
    pub fn update_content(&mut self, id: LayerId, update: ContentUpdate) -> CoreResult<()> {
        let layer = self.get_mut(id)?;
        match (update, &mut layer.kind) {
            (ContentUpdate::Text(patch), LayerKind::Text(text)) => {
                if let Some(size) = patch.font_size {
                    if !(size.is_finite() && size > 0.0) {
                        return Err(CoreError::InvalidGeometry(format!(
                            "font size must be positive, got {size}"
                        )));
                    }
                    text.font_size = size;
                }
                if let Some(content) = patch.content {
                    text.content = content;
                }
                if let Some(color) = patch.color {
                    text.color = color;
                }
                if let Some(font) = patch.font {
                    text.font = font;
                }
            }
            (
                ContentUpdate::Bitmap {
                    source,
                    natural_width,
                    natural_height,
                    role,
                },
                LayerKind::Image(image),
            ) => {
                if natural_width == 0 || natural_height == 0 {
                    return Err(CoreError::ZeroDimension {
                        width: natural_width,
                        height: natural_height,
                    });
                }
                image.source = source;
                image.natural_width = natural_width;
                image.natural_height = natural_height;
                image.role = role;
            }
            (ContentUpdate::Filter(filter), LayerKind::Image(image)) => image.filters.set(filter),
            (ContentUpdate::ClearFilter(kind), LayerKind::Image(image)) => {
                image.filters.clear(kind);
            }
            (update, _) => {
                return Err(CoreError::InvalidOperation(format!(
                    "{update:?} does not apply to layer {id}"
                )));
            }
        }
        layer.bump_revision();
        Ok(())
    }

    /// Move a layer to a stack index (clamped to the stack).
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is not found.
    pub fn move_to_index(&mut self, id: LayerId, index: usize) -> CoreResult<()> {
        let from = self.index_of(id)?;
        let layer = self.layers.remove(from);
        let to = index.min(self.layers.len());
        self.layers.insert(to, layer);
        Ok(())
    }

    /// Move a layer to the top of the stack.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is not found.
    pub fn bring_to_front(&mut self, id: LayerId) -> CoreResult<()> {
        self.move_to_index(id, usize::MAX)
    }

    /// Move a layer to the bottom of the stack.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is not found.
    pub fn send_to_back(&mut self, id: LayerId) -> CoreResult<()> {
        self.move_to_index(id, 0)
    }

    /// Topmost layer whose bounds contain the point.
    #[must_use]
    pub fn layer_at(&self, point: PercentPoint) -> Option<LayerId> {
        let surface = self.canvas.surface();
        self.layers
            .iter()
            .rev()
            .find(|l| l.bounds(surface).is_ok_and(|b| b.contains(point)))
            .map(|l| l.id)
    }

    /// Collapse a contiguous run of layers into one group.
    ///
    /// The group's anchor is the mean of the member centers; members keep
    /// their z-order and store their offset from the anchor.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than two distinct layers are given, any is
    /// missing, or they are not adjacent in the stack.
    pub fn group(&mut self, ids: &[LayerId]) -> CoreResult<LayerId> {
        let mut indices = ids
            .iter()
            .map(|id| self.index_of(*id))
            .collect::<CoreResult<Vec<_>>>()?;
        indices.sort_unstable();
        indices.dedup();
        if indices.len() < 2 {
            return Err(CoreError::InvalidOperation(
                "grouping needs at least two layers".to_string(),
            ));
        }
        let first = indices[0];
        let last = indices[indices.len() - 1];
        if last - first + 1 != indices.len() {
            return Err(CoreError::InvalidOperation(
                "grouped layers must be adjacent in the stack".to_string(),
            ));
        }

        let mut members: Vec<Layer> = self.layers.drain(first..=last).collect();
        #[allow(clippy::cast_precision_loss)]
        let n = members.len() as f32;
        let anchor = PercentPoint::new(
            members.iter().map(|m| m.position.x).sum::<f32>() / n,
            members.iter().map(|m| m.position.y).sum::<f32>() / n,
        );
        for member in &mut members {
            member.position = member.position.offset(-anchor.x, -anchor.y);
        }

        let group = Layer::new(LayerKind::Group(GroupLayer { members }), anchor);
        let id = group.id;
        self.layers.insert(first, group);
        tracing::debug!(%id, count = indices.len(), "layers grouped");
        Ok(id)
    }

    /// Expand a group back into its members, at the group's stack position.
    ///
    /// Returns the member IDs in z-order.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is missing or not a group.
    pub fn ungroup(&mut self, id: LayerId) -> CoreResult<Vec<LayerId>> {
        let index = self.index_of(id)?;
        let not_a_group = || CoreError::InvalidOperation(format!("layer {id} is not a group"));
        if !matches!(self.layers[index].kind, LayerKind::Group(_)) {
            return Err(not_a_group());
        }
        let group = self.layers.remove(index);
        let anchor = group.position;
        let LayerKind::Group(GroupLayer { members }) = group.kind else {
            return Err(not_a_group());
        };

        let ids = members.iter().map(|m| m.id).collect();
        for (offset, mut member) in members.into_iter().enumerate() {
            member.position = member.position.offset(anchor.x, anchor.y);
            self.layers.insert(index + offset, member);
        }
        Ok(ids)
    }

    /// Serialize the design to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string(self).map_err(CoreError::Serialization)
    }

    /// Deserialize a design from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        serde_json::from_str(json).map_err(CoreError::Serialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ImageLayer, TextLayer};

    fn source() -> ImageSource {
        ImageSource::new("image/png", vec![0x89, 0x50, 0x4E, 0x47])
    }

    fn image_at(x: f32, y: f32) -> Layer {
        Layer::image(ImageLayer::new(source(), 100, 100).expect("image")).at(x, y)
    }

    #[test]
    fn test_design_append_remove() {
        let mut design = Design::new(Canvas::new(800.0, 600.0));
        assert!(design.is_empty());

        let id = design.append(Layer::text(TextLayer::new("Hello")));
        assert_eq!(design.len(), 1);
        assert!(design.get(id).is_some());

        design.remove(id).expect("should remove");
        assert!(design.is_empty());
        assert!(matches!(design.remove(id), Err(CoreError::LayerNotFound(_))));
    }

    #[test]
    fn test_append_puts_layer_on_top() {
        let mut design = Design::default();
        let a = design.append(image_at(10.0, 10.0));
        let b = design.append(image_at(20.0, 20.0));
        let order: Vec<_> = design.layers().iter().map(|l| l.id).collect();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn test_update_geometry_rejects_width_on_text() {
        let mut design = Design::default();
        let id = design.append(Layer::text(TextLayer::new("x")));
        let err = design
            .update_geometry(
                id,
                GeometryUpdate {
                    width: Some(20.0),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidOperation(_)));
    }

    #[test]
    fn test_update_geometry_is_per_layer() {
        let mut design = Design::default();
        let a = design.append(image_at(10.0, 10.0));
        let b = design.append(image_at(20.0, 20.0));
        design
            .update_geometry(
                a,
                GeometryUpdate {
                    position: Some(PercentPoint::new(70.0, 80.0)),
                    width: Some(12.0),
                    rotation: Some(-90.0),
                },
            )
            .expect("update");

        let la = design.get(a).expect("a");
        assert_eq!(la.position, PercentPoint::new(70.0, 80.0));
        assert!((la.rotation - 270.0).abs() < f32::EPSILON);
        assert_eq!(la.as_image().expect("image").width, 12.0);
        assert_eq!(design.get(b).expect("b").position, PercentPoint::new(20.0, 20.0));
    }

    #[test]
    fn test_content_update_bumps_revision() {
        let mut design = Design::default();
        let id = design.append(Layer::text(TextLayer::new("old")));
        let before = design.get(id).expect("layer").revision();
        design
            .update_content(
                id,
                ContentUpdate::Text(TextPatch {
                    content: Some("new".to_string()),
                    color: Some(Color::BLACK),
                    ..Default::default()
                }),
            )
            .expect("update");
        let layer = design.get(id).expect("layer");
        assert_eq!(layer.revision(), before + 1);
        assert_eq!(layer.as_text().expect("text").content, "new");
        assert_eq!(layer.as_text().expect("text").color, Color::BLACK);
    }

    #[test]
    fn test_content_update_kind_mismatch() {
        let mut design = Design::default();
        let id = design.append(Layer::text(TextLayer::new("x")));
        let err = design
            .update_content(id, ContentUpdate::ClearFilter(FilterKind::Tint))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidOperation(_)));
    }

    #[test]
    fn test_visible_content() {
        let mut design = Design::default();
        assert!(!design.has_visible_content());
        design.append(Layer::text(TextLayer::new("")));
        assert!(!design.has_visible_content());
        design.append(image_at(50.0, 50.0));
        assert!(design.has_visible_content());
    }

    #[test]
    fn test_group_and_ungroup_preserve_positions() {
        let mut design = Design::default();
        let bottom = design.append(image_at(5.0, 5.0));
        let a = design.append(image_at(20.0, 30.0));
        let b = design.append(Layer::text(TextLayer::new("hi")).at(40.0, 50.0));
        let top = design.append(image_at(90.0, 90.0));

        let group = design.group(&[b, a]).expect("group");
        assert_eq!(design.len(), 3);
        assert_eq!(design.index_of(group).expect("index"), 1);
        assert_eq!(
            design.get(group).expect("group").position,
            PercentPoint::new(30.0, 40.0)
        );

        let members = design.ungroup(group).expect("ungroup");
        assert_eq!(members, vec![a, b]);
        let order: Vec<_> = design.layers().iter().map(|l| l.id).collect();
        assert_eq!(order, vec![bottom, a, b, top]);
        assert_eq!(design.get(a).expect("a").position, PercentPoint::new(20.0, 30.0));
        assert_eq!(design.get(b).expect("b").position, PercentPoint::new(40.0, 50.0));
    }

    #[test]
    fn test_group_requires_adjacent_layers() {
        let mut design = Design::default();
        let a = design.append(image_at(5.0, 5.0));
        design.append(image_at(10.0, 10.0));
        let c = design.append(image_at(15.0, 15.0));
        assert!(design.group(&[a, c]).is_err());
        assert!(design.group(&[a]).is_err());
        assert_eq!(design.len(), 3);
    }

    #[test]
    fn test_reorder() {
        let mut design = Design::default();
        let a = design.append(image_at(5.0, 5.0));
        let b = design.append(image_at(10.0, 10.0));
        let c = design.append(image_at(15.0, 15.0));
        design.send_to_back(c).expect("back");
        design.bring_to_front(a).expect("front");
        let order: Vec<_> = design.layers().iter().map(|l| l.id).collect();
        assert_eq!(order, vec![c, b, a]);
    }

    #[test]
    fn test_layer_at_returns_topmost() {
        let mut design = Design::new(Canvas::new(1000.0, 1000.0));
        let below = design.append(image_at(50.0, 50.0));
        let above = design.append(image_at(55.0, 55.0));
        assert_eq!(design.layer_at(PercentPoint::new(52.0, 52.0)), Some(above));
        assert_eq!(design.layer_at(PercentPoint::new(38.0, 38.0)), Some(below));
        assert_eq!(design.layer_at(PercentPoint::new(1.0, 99.0)), None);
    }

    #[test]
    fn test_mockup_swap_policy() {
        let mut design = Design::new(Canvas::new(500.0, 600.0));
        design.append(image_at(50.0, 50.0));

        let same_shape = Mockup::new(source(), 1000, 1200).expect("mockup");
        let swap = design.set_mockup(Some(same_shape), MockupSwapPolicy::default());
        assert!(!swap.aspect_changed);
        assert_eq!(swap.cleared_layers, 0);
        assert_eq!(design.len(), 1);

        let wide = Mockup::new(source(), 1600, 900).expect("mockup");
        let swap = design.set_mockup(Some(wide), MockupSwapPolicy::default());
        assert!(swap.aspect_changed);
        assert_eq!(swap.cleared_layers, 1);
        assert!(design.is_empty());
    }

    #[test]
    fn test_canvas_resize_keeps_layers() {
        let mut design = Design::new(Canvas::new(500.0, 600.0));
        let id = design.append(image_at(25.0, 75.0));
        design.canvas.resize(1000.0, 1200.0).expect("resize");
        assert_eq!(design.get(id).expect("layer").position, PercentPoint::new(25.0, 75.0));
        assert!(design.canvas.resize(0.0, 10.0).is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut design = Design::default();
        design.append(Layer::text(TextLayer::new("SALE")));
        design.append(image_at(10.0, 20.0));
        let json = design.to_json().expect("json");
        let back = Design::from_json(&json).expect("parse");
        assert_eq!(back, design);
    }
}
