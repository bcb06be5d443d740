//! Pointer interaction: dragging and resizing layers.
//!
//! The controller is a two-state machine. A pointer-down on a layer body starts
//! a move, a pointer-down on an image's resize handle starts a resize. Every
//! pointer-move while active rewrites exactly one layer's geometry from the
//! values captured at gesture start, so a gesture never accumulates rounding
//! drift. Pointer-up or cancel returns to idle.

use serde::{Deserialize, Serialize};

use crate::coords::{delta_to_percent, PercentPoint, SurfaceSize};
use crate::design::{Design, GeometryUpdate};
use crate::layer::{LayerId, LayerKind};
use crate::{CoreError, CoreResult};

/// Smallest width a resize gesture can produce, percent of canvas width.
pub const MIN_LAYER_WIDTH_PERCENT: f32 = 5.0;

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Button pressed.
    Down,
    /// Pointer moved.
    Move,
    /// Button released.
    Up,
    /// Pointer capture lost.
    Cancel,
}

/// Which part of a layer the pointer went down on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    /// The layer itself.
    #[default]
    Body,
    /// The resize handle (image layers only).
    Resize,
}

/// The layer (and handle) under a pointer-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerTarget {
    /// Target layer.
    pub layer: LayerId,
    /// Handle that was hit.
    #[serde(default)]
    pub handle: Handle,
}

/// A pointer event in container pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Event phase.
    pub phase: PointerPhase,
    /// X in container pixels.
    pub x: f32,
    /// Y in container pixels.
    pub y: f32,
    /// Size of the container the coordinates are measured in.
    pub container: SurfaceSize,
    /// Hit target, only meaningful on [`PointerPhase::Down`].
    #[serde(default)]
    pub target: Option<PointerTarget>,
}

impl PointerEvent {
    /// Pointer-down on a target.
    #[must_use]
    pub fn down(x: f32, y: f32, container: SurfaceSize, target: PointerTarget) -> Self {
        Self {
            phase: PointerPhase::Down,
            x,
            y,
            container,
            target: Some(target),
        }
    }

    /// Pointer-move.
    #[must_use]
    pub fn moved(x: f32, y: f32, container: SurfaceSize) -> Self {
        Self {
            phase: PointerPhase::Move,
            x,
            y,
            container,
            target: None,
        }
    }

    /// Pointer-up.
    #[must_use]
    pub fn up(x: f32, y: f32, container: SurfaceSize) -> Self {
        Self {
            phase: PointerPhase::Up,
            ..Self::moved(x, y, container)
        }
    }

    /// Pointer capture lost.
    #[must_use]
    pub fn cancel(container: SurfaceSize) -> Self {
        Self {
            phase: PointerPhase::Cancel,
            ..Self::moved(0.0, 0.0, container)
        }
    }
}

/// Kind of gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Drag the layer.
    Move,
    /// Change an image layer's width.
    Resize,
}

/// Values captured when a gesture starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveInteraction {
    /// Gesture kind.
    pub operation: Operation,
    /// Layer being manipulated.
    pub layer: LayerId,
    /// Pointer position at gesture start, container pixels.
    pub pointer_origin: (f32, f32),
    /// Layer position at gesture start.
    pub position_origin: PercentPoint,
    /// Image width at gesture start (zero for non-images).
    pub width_origin: f32,
}

/// Current state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum InteractionState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// A gesture is in progress.
    Active(ActiveInteraction),
}

/// What handling a pointer event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionOutcome {
    /// Nothing happened.
    Ignored,
    /// A gesture started on the layer.
    Started(Operation, LayerId),
    /// The layer's geometry changed.
    Updated(LayerId),
    /// The gesture finished normally.
    Finished(LayerId),
    /// The gesture was cancelled; geometry stays where the last move left it.
    Cancelled(LayerId),
    /// The target layer disappeared; the gesture was dropped.
    TargetLost(LayerId),
}

/// Turns pointer events into geometry updates on a [`Design`].
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    state: InteractionState,
}

impl InteractionController {
    /// Create an idle controller.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// Whether a gesture is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.state, InteractionState::Active(_))
    }

    /// Start a gesture.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InteractionBusy`] if a gesture is already active.
    /// - [`CoreError::LayerNotFound`] if the target does not exist.
    /// - [`CoreError::InvalidOperation`] when resizing a non-image layer.
    pub fn begin(
        &mut self,
        design: &Design,
        target: PointerTarget,
        pointer: (f32, f32),
    ) -> CoreResult<Operation> {
        if let InteractionState::Active(active) = self.state {
            return Err(CoreError::InteractionBusy(active.layer));
        }
        let layer = design
            .get(target.layer)
            .ok_or(CoreError::LayerNotFound(target.layer))?;

        let (operation, width_origin) = match (target.handle, &layer.kind) {
            (Handle::Body, LayerKind::Image(image)) => (Operation::Move, image.width),
            (Handle::Body, _) => (Operation::Move, 0.0),
            (Handle::Resize, LayerKind::Image(image)) => (Operation::Resize, image.width),
            (Handle::Resize, _) => {
                return Err(CoreError::InvalidOperation(
                    "only image layers can be resized".to_string(),
                ));
            }
        };

        self.state = InteractionState::Active(ActiveInteraction {
            operation,
            layer: target.layer,
            pointer_origin: pointer,
            position_origin: layer.position,
            width_origin,
        });
        tracing::debug!(layer = %target.layer, ?operation, "interaction started");
        Ok(operation)
    }

    /// Apply a pointer move to the active gesture.
    ///
    /// Returns `Ok(None)` when idle.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LayerNotFound`] (after returning to idle) if the
    /// target layer no longer exists, or [`CoreError::InvalidGeometry`] for a
    /// degenerate container.
    pub fn update(
        &mut self,
        design: &mut Design,
        pointer: (f32, f32),
        container: SurfaceSize,
    ) -> CoreResult<Option<LayerId>> {
        let InteractionState::Active(active) = self.state else {
            return Ok(None);
        };
        if !design.contains(active.layer) {
            self.state = InteractionState::Idle;
            tracing::debug!(layer = %active.layer, "interaction target removed");
            return Err(CoreError::LayerNotFound(active.layer));
        }

        let (dx, dy) = delta_to_percent(
            pointer.0 - active.pointer_origin.0,
            pointer.1 - active.pointer_origin.1,
            container,
        )?;
        let update = match active.operation {
            Operation::Move => GeometryUpdate {
                position: Some(active.position_origin.offset(dx, dy)),
                ..GeometryUpdate::default()
            },
            Operation::Resize => GeometryUpdate {
                width: Some((active.width_origin + dx).max(MIN_LAYER_WIDTH_PERCENT)),
                ..GeometryUpdate::default()
            },
        };
        design.update_geometry(active.layer, update)?;
        Ok(Some(active.layer))
    }

    /// Finish the active gesture, returning it.
    pub fn end(&mut self) -> Option<ActiveInteraction> {
        match std::mem::take(&mut self.state) {
            InteractionState::Active(active) => {
                tracing::debug!(layer = %active.layer, "interaction finished");
                Some(active)
            }
            InteractionState::Idle => None,
        }
    }

    /// Abandon the active gesture (lost pointer capture).
    pub fn cancel(&mut self) -> Option<ActiveInteraction> {
        let active = self.end();
        if let Some(active) = &active {
            tracing::debug!(layer = %active.layer, "interaction cancelled");
        }
        active
    }

    /// Dispatch one pointer event.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::begin`] and [`Self::update`], except that
    /// a vanished target is reported as [`InteractionOutcome::TargetLost`].
    pub fn handle(
        &mut self,
        design: &mut Design,
        event: &PointerEvent,
    ) -> CoreResult<InteractionOutcome> {
        let pointer = (event.x, event.y);
        match event.phase {
            PointerPhase::Down => match event.target {
                Some(target) => {
                    let operation = self.begin(design, target, pointer)?;
                    Ok(InteractionOutcome::Started(operation, target.layer))
                }
                None => {
                    if let InteractionState::Active(active) = self.state {
                        return Err(CoreError::InteractionBusy(active.layer));
                    }
                    Ok(InteractionOutcome::Ignored)
                }
            },
            PointerPhase::Move => match self.update(design, pointer, event.container) {
                Ok(Some(layer)) => Ok(InteractionOutcome::Updated(layer)),
                Ok(None) => Ok(InteractionOutcome::Ignored),
                Err(CoreError::LayerNotFound(layer)) => Ok(InteractionOutcome::TargetLost(layer)),
                Err(e) => Err(e),
            },
            PointerPhase::Up => Ok(self
                .end()
                .map_or(InteractionOutcome::Ignored, |a| {
                    InteractionOutcome::Finished(a.layer)
                })),
            PointerPhase::Cancel => Ok(self
                .cancel()
                .map_or(InteractionOutcome::Ignored, |a| {
                    InteractionOutcome::Cancelled(a.layer)
                })),
        }
    }
}
