//! Non-destructive image adjustments attached to image layers.
//!
//! Filters are parameters only; the renderer applies them to a fresh decode of
//! the layer's source on every render, in stack order.

use serde::{Deserialize, Serialize};

use crate::Color;

/// Discriminant of an [`ImageFilter`], used to replace or clear one adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    /// Brightness shift.
    Brightness,
    /// Contrast stretch.
    Contrast,
    /// Saturation change.
    Saturation,
    /// Color tint.
    Tint,
}

/// A single image adjustment.
///
/// Amounts are in `-1.0..=1.0`, where `0.0` is neutral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ImageFilter {
    /// Add `amount * 255` to each color channel.
    Brightness {
        /// Shift amount.
        amount: f32,
    },
    /// Stretch channels away from (or towards) mid-gray.
    Contrast {
        /// Stretch amount.
        amount: f32,
    },
    /// Push channels away from (or towards) the pixel's strongest channel.
    Saturation {
        /// Saturation amount.
        amount: f32,
    },
    /// Blend each pixel towards a color.
    Tint {
        /// Tint color.
        color: Color,
        /// Blend strength in `0.0..=1.0`.
        strength: f32,
    },
}

impl ImageFilter {
    /// The filter's kind.
    #[must_use]
    pub fn kind(&self) -> FilterKind {
        match self {
            Self::Brightness { .. } => FilterKind::Brightness,
            Self::Contrast { .. } => FilterKind::Contrast,
            Self::Saturation { .. } => FilterKind::Saturation,
            Self::Tint { .. } => FilterKind::Tint,
        }
    }

    /// Whether applying this filter leaves pixels unchanged.
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        match *self {
            Self::Brightness { amount }
            | Self::Contrast { amount }
            | Self::Saturation { amount } => amount == 0.0,
            Self::Tint { strength, .. } => strength == 0.0,
        }
    }

    /// Copy with amounts clamped into their valid ranges.
    #[must_use]
    pub fn clamped(self) -> Self {
        match self {
            Self::Brightness { amount } => Self::Brightness {
                amount: amount.clamp(-1.0, 1.0),
            },
            Self::Contrast { amount } => Self::Contrast {
                amount: amount.clamp(-1.0, 1.0),
            },
            Self::Saturation { amount } => Self::Saturation {
                amount: amount.clamp(-1.0, 1.0),
            },
            Self::Tint { color, strength } => Self::Tint {
                color,
                strength: strength.clamp(0.0, 1.0),
            },
        }
    }
}

/// Ordered list of adjustments; at most one filter per kind.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterStack(Vec<ImageFilter>);

impl FilterStack {
    /// An empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a filter. An existing filter of the same kind is replaced in place,
    /// keeping its position in the stack; a neutral value removes it.
    pub fn set(&mut self, filter: ImageFilter) {
        let filter = filter.clamped();
        let kind = filter.kind();
        if filter.is_neutral() {
            self.clear(kind);
            return;
        }
        match self.0.iter_mut().find(|f| f.kind() == kind) {
            Some(slot) => *slot = filter,
            None => self.0.push(filter),
        }
    }

    /// Remove the filter of the given kind, if present.
    pub fn clear(&mut self, kind: FilterKind) {
        self.0.retain(|f| f.kind() != kind);
    }

    /// Filter of the given kind, if present.
    #[must_use]
    pub fn get(&self, kind: FilterKind) -> Option<&ImageFilter> {
        self.0.iter().find(|f| f.kind() == kind)
    }

    /// Filters in application order.
    pub fn iter(&self) -> impl Iterator<Item = &ImageFilter> {
        self.0.iter()
    }

    /// Whether the stack has no filters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}
