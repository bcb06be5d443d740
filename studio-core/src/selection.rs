//! Layer selection, kept outside the layer list.

use serde::{Deserialize, Serialize};

use crate::design::Design;
use crate::layer::LayerId;

/// An ordered set of selected layers, in the order they were picked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection(Vec<LayerId>);

impl Selection {
    /// An empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection with a single layer.
    pub fn select_only(&mut self, id: LayerId) {
        self.0.clear();
        self.0.push(id);
    }

    /// Add a layer if not already selected.
    pub fn add(&mut self, id: LayerId) {
        if !self.contains(id) {
            self.0.push(id);
        }
    }

    /// Add the layer if unselected, remove it otherwise.
    pub fn toggle(&mut self, id: LayerId) {
        if self.contains(id) {
            self.remove(id);
        } else {
            self.0.push(id);
        }
    }

    /// Deselect a layer.
    pub fn remove(&mut self, id: LayerId) {
        self.0.retain(|selected| *selected != id);
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Whether the layer is selected.
    #[must_use]
    pub fn contains(&self, id: LayerId) -> bool {
        self.0.contains(&id)
    }

    /// The most recently picked layer.
    #[must_use]
    pub fn primary(&self) -> Option<LayerId> {
        self.0.last().copied()
    }

    /// Selected IDs in pick order.
    #[must_use]
    pub fn ids(&self) -> &[LayerId] {
        &self.0
    }

    /// Number of selected layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drop IDs that no longer exist in the design.
    pub fn prune(&mut self, design: &Design) {
        self.0.retain(|id| design.contains(*id));
    }
}
