//! Coordinate model: percentage space versus absolute pixels.
//!
//! Layer geometry is stored as percentages of the canvas (0-100), with the
//! position naming the layer's *center*. Conversion to pixels only happens at
//! render time or at interaction boundaries, against whatever surface is being
//! drawn, so the same layer list renders identically at preview size and at
//! print size.

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// Pixel dimensions of a drawing surface or pointer container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSize {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl SurfaceSize {
    /// Create a new surface size.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Ensure both dimensions are finite and strictly positive.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidGeometry`] otherwise.
    pub fn validate(self) -> CoreResult<Self> {
        if self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
        {
            Ok(self)
        } else {
            Err(CoreError::InvalidGeometry(format!(
                "surface must be positive, got {}x{}",
                self.width, self.height
            )))
        }
    }

    /// Width divided by height.
    #[must_use]
    pub fn aspect_ratio(self) -> f32 {
        self.width / self.height
    }
}

/// A point in percentage space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PercentPoint {
    /// Percent of surface width from the left edge.
    pub x: f32,
    /// Percent of surface height from the top edge.
    pub y: f32,
}

impl PercentPoint {
    /// Create a new percentage point.
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Component-wise sum.
    #[must_use]
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// A size in percentage space. Width is relative to the surface width and
/// height to the surface height.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PercentSize {
    /// Percent of surface width.
    pub width: f32,
    /// Percent of surface height.
    pub height: f32,
}

impl PercentSize {
    /// Create a new percentage size.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle in percentage space, described by its center.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PercentRect {
    /// Center of the rectangle.
    pub center: PercentPoint,
    /// Extent of the rectangle.
    pub size: PercentSize,
}

impl PercentRect {
    /// Check whether a point lies inside the rectangle (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: PercentPoint) -> bool {
        let half_w = self.size.width / 2.0;
        let half_h = self.size.height / 2.0;
        (point.x - self.center.x).abs() <= half_w && (point.y - self.center.y).abs() <= half_h
    }
}

/// An axis-aligned rectangle in absolute pixels, anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    /// Left edge in pixels.
    pub x: f32,
    /// Top edge in pixels.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl PixelRect {
    /// Center of the rectangle in pixels.
    #[must_use]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Convert a percentage placement to an absolute pixel rectangle.
#[must_use]
pub fn to_absolute(center: PercentPoint, size: PercentSize, surface: SurfaceSize) -> PixelRect {
    let width = surface.width * size.width / 100.0;
    let height = surface.height * size.height / 100.0;
    let (cx, cy) = point_to_absolute(center, surface);
    PixelRect {
        x: cx - width / 2.0,
        y: cy - height / 2.0,
        width,
        height,
    }
}

/// Convert an absolute pixel rectangle back to a percentage placement.
///
/// # Errors
///
/// Returns [`CoreError::InvalidGeometry`] if the surface has a zero dimension.
pub fn to_percent(rect: PixelRect, surface: SurfaceSize) -> CoreResult<PercentRect> {
    let surface = surface.validate()?;
    let (cx, cy) = rect.center();
    Ok(PercentRect {
        center: point_to_percent(cx, cy, surface)?,
        size: PercentSize::new(
            rect.width / surface.width * 100.0,
            rect.height / surface.height * 100.0,
        ),
    })
}

/// Convert a percentage point to pixels.
#[must_use]
pub fn point_to_absolute(point: PercentPoint, surface: SurfaceSize) -> (f32, f32) {
    (
        surface.width * point.x / 100.0,
        surface.height * point.y / 100.0,
    )
}

/// Convert a pixel point to percentage space.
///
/// # Errors
///
/// Returns [`CoreError::InvalidGeometry`] if the surface has a zero dimension.
pub fn point_to_percent(x: f32, y: f32, surface: SurfaceSize) -> CoreResult<PercentPoint> {
    let surface = surface.validate()?;
    Ok(PercentPoint::new(
        x / surface.width * 100.0,
        y / surface.height * 100.0,
    ))
}

/// Convert a pointer displacement in container pixels into a percentage delta.
///
/// The result does not depend on the container size: the same fraction of the
/// container always yields the same delta.
///
/// # Errors
///
/// Returns [`CoreError::InvalidGeometry`] if the container has a zero dimension.
pub fn delta_to_percent(dx: f32, dy: f32, container: SurfaceSize) -> CoreResult<(f32, f32)> {
    let container = container.validate()?;
    Ok((
        dx / container.width * 100.0,
        dy / container.height * 100.0,
    ))
}

/// Height, as percent of the surface height, of an image placed at
/// `width_percent` of the surface width while keeping its native aspect ratio.
///
/// # Errors
///
/// Returns [`CoreError::ZeroDimension`] for a degenerate source image and
/// [`CoreError::InvalidGeometry`] for a degenerate surface.
pub fn aspect_height_percent(
    width_percent: f32,
    natural_width: u32,
    natural_height: u32,
    surface: SurfaceSize,
) -> CoreResult<f32> {
    if natural_width == 0 || natural_height == 0 {
        return Err(CoreError::ZeroDimension {
            width: natural_width,
            height: natural_height,
        });
    }
    let surface = surface.validate()?;
    #[allow(clippy::cast_precision_loss)]
    let ratio = natural_height as f32 / natural_width as f32;
    Ok(width_percent * ratio * surface.aspect_ratio())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() <= 1e-3 * b.abs().max(1.0)
    }

    #[test]
    fn test_center_anchored_conversion() {
        let surface = SurfaceSize::new(1000.0, 1200.0);
        let rect = to_absolute(PercentPoint::new(50.0, 50.0), PercentSize::new(30.0, 10.0), surface);
        assert!(approx(rect.x, 350.0));
        assert!(approx(rect.y, 540.0));
        assert!(approx(rect.width, 300.0));
        assert!(approx(rect.height, 120.0));
    }

    #[test]
    fn test_aspect_height_for_wide_image() {
        // 400x200 at 30% of a 1000px canvas is 300x150 pixels.
        let surface = SurfaceSize::new(1000.0, 1200.0);
        let h = aspect_height_percent(30.0, 400, 200, surface).expect("height");
        let rect = to_absolute(PercentPoint::new(50.0, 50.0), PercentSize::new(30.0, h), surface);
        assert!(approx(rect.width, 300.0));
        assert!(approx(rect.height, 150.0));
    }

    #[test]
    fn test_zero_dimension_source_rejected() {
        let surface = SurfaceSize::new(100.0, 100.0);
        assert!(matches!(
            aspect_height_percent(30.0, 0, 200, surface),
            Err(CoreError::ZeroDimension { width: 0, height: 200 })
        ));
        assert!(aspect_height_percent(30.0, 10, 0, surface).is_err());
    }

    #[test]
    fn test_degenerate_surface_rejected() {
        let surface = SurfaceSize::new(0.0, 100.0);
        assert!(to_percent(PixelRect::default(), surface).is_err());
        assert!(delta_to_percent(1.0, 1.0, surface).is_err());
    }

    #[test]
    fn test_delta_is_container_independent() {
        let small = delta_to_percent(50.0, 30.0, SurfaceSize::new(500.0, 600.0)).expect("small");
        let large = delta_to_percent(100.0, 60.0, SurfaceSize::new(1000.0, 1200.0)).expect("large");
        assert!(approx(small.0, large.0));
        assert!(approx(small.1, large.1));
        assert!(approx(small.0, 10.0));
        assert!(approx(small.1, 5.0));
    }

    #[test]
    fn test_rect_contains() {
        let rect = PercentRect {
            center: PercentPoint::new(50.0, 50.0),
            size: PercentSize::new(20.0, 10.0),
        };
        assert!(rect.contains(PercentPoint::new(55.0, 52.0)));
        assert!(!rect.contains(PercentPoint::new(61.0, 50.0)));
    }
}
