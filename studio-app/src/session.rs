//! The editing session: one design, its selection, the pointer controller and
//! the state of each async action.
//!
//! Async work is started with [`DesignSession::begin`], which marks the action
//! busy and hands out a [`Ticket`]. The ticket records which layer the work
//! targets and that layer's content revision at the time. When the result
//! arrives the ticket is redeemed; if the layer was removed or its content
//! changed in the meantime, the result is discarded instead of overwriting
//! newer work. Geometry edits do not change the revision, so dragging a layer
//! while its background is being removed keeps the result.

use std::fmt;

use serde::{Deserialize, Serialize};
use studio_core::{
    ContentUpdate, CoreError, CoreResult, Design, GeometryUpdate, ImageSource, InteractionController,
    InteractionOutcome, InteractionState, Layer, LayerId, Mockup, MockupSwap, MockupSwapPolicy,
    PointerEvent, PointerPhase, Selection,
};

use crate::error::{StudioError, StudioResult, ValidationError};

/// Async actions that can be in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Adding a user image.
    UploadImage,
    /// Generating an image from a prompt.
    Generate,
    /// Removing an image layer's background.
    RemoveBackground,
    /// Publishing the design.
    Publish,
    /// Loading a mockup photo.
    LoadMockup,
}

impl Action {
    /// Every action.
    pub const ALL: [Self; 5] = [
        Self::UploadImage,
        Self::Generate,
        Self::RemoveBackground,
        Self::Publish,
        Self::LoadMockup,
    ];

    fn index(self) -> usize {
        match self {
            Self::UploadImage => 0,
            Self::Generate => 1,
            Self::RemoveBackground => 2,
            Self::Publish => 3,
            Self::LoadMockup => 4,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UploadImage => "image upload",
            Self::Generate => "generation",
            Self::RemoveBackground => "background removal",
            Self::Publish => "publish",
            Self::LoadMockup => "mockup loading",
        })
    }
}

/// The last failure of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionError {
    /// Machine-readable reason, see [`StudioError::reason`].
    pub reason: &'static str,
    /// Message for the user.
    pub message: String,
}

impl From<&StudioError> for ActionError {
    fn from(err: &StudioError) -> Self {
        Self {
            reason: err.reason(),
            message: err.user_message(),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ActionSlot {
    busy: bool,
    error: Option<ActionError>,
}

/// Proof that an action was started. Redeem it exactly once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a ticket must be completed or failed to release its action"]
pub struct Ticket {
    action: Action,
    layer: Option<LayerId>,
    revision: u64,
}

impl Ticket {
    /// The action this ticket belongs to.
    pub fn action(&self) -> Action {
        self.action
    }

    /// The targeted layer, if any.
    pub fn layer(&self) -> Option<LayerId> {
        self.layer
    }
}

/// Whether an async result made it into the design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied<T> {
    /// The result was applied.
    Applied(T),
    /// The target changed while the action ran; the result was dropped.
    Discarded,
}

impl<T> Applied<T> {
    /// Whether the result was applied.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// The applied value.
    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::Discarded => None,
        }
    }
}

/// Editing state for one design.
#[derive(Debug, Clone, Default)]
pub struct DesignSession {
    design: Design,
    selection: Selection,
    interaction: InteractionController,
    slots: [ActionSlot; 5],
}

impl DesignSession {
    /// Start a session on a design.
    #[must_use]
    pub fn new(design: Design) -> Self {
        Self {
            design,
            ..Self::default()
        }
    }

    /// The design.
    #[must_use]
    pub fn design(&self) -> &Design {
        &self.design
    }

    /// A copy of the design for rendering or publishing.
    #[must_use]
    pub fn snapshot(&self) -> Design {
        self.design.clone()
    }

    /// The selection.
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The pointer controller.
    #[must_use]
    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    // --- layers -----------------------------------------------------------

    /// Add a layer on top and select it.
    pub fn add_layer(&mut self, layer: Layer) -> LayerId {
        let id = self.design.append(layer);
        self.selection.select_only(id);
        id
    }

    /// Remove a layer.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LayerNotFound`] if the layer does not exist.
    pub fn remove_layer(&mut self, id: LayerId) -> CoreResult<Layer> {
        let layer = self.design.remove(id)?;
        self.after_removal();
        Ok(layer)
    }

    /// Remove every selected layer. Returns how many were removed.
    pub fn remove_selected(&mut self) -> usize {
        let ids = self.selection.ids().to_vec();
        let removed = ids
            .into_iter()
            .filter(|id| self.design.remove(*id).is_ok())
            .count();
        self.after_removal();
        removed
    }

    /// Change one layer's position, width or rotation.
    ///
    /// # Errors
    ///
    /// See [`Design::update_geometry`].
    pub fn update_geometry(&mut self, id: LayerId, update: GeometryUpdate) -> CoreResult<()> {
        self.design.update_geometry(id, update)
    }

    /// Change one layer's content.
    ///
    /// # Errors
    ///
    /// See [`Design::update_content`].
    pub fn update_content(&mut self, id: LayerId, update: ContentUpdate) -> CoreResult<()> {
        self.design.update_content(id, update)
    }

    /// Move a layer to the top of the stack.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LayerNotFound`] if the layer does not exist.
    pub fn bring_to_front(&mut self, id: LayerId) -> CoreResult<()> {
        self.design.bring_to_front(id)
    }

    /// Move a layer to the bottom of the stack.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LayerNotFound`] if the layer does not exist.
    pub fn send_to_back(&mut self, id: LayerId) -> CoreResult<()> {
        self.design.send_to_back(id)
    }

    /// Replace the mockup. Layers may be cleared according to `policy`.
    pub fn set_mockup(&mut self, mockup: Option<Mockup>, policy: MockupSwapPolicy) -> MockupSwap {
        let swap = self.design.set_mockup(mockup, policy);
        if swap.cleared_layers > 0 {
            self.after_removal();
        }
        swap
    }

    fn after_removal(&mut self) {
        self.selection.prune(&self.design);
        if let InteractionState::Active(active) = *self.interaction.state() {
            if !self.design.contains(active.layer) {
                self.interaction.cancel();
            }
        }
    }

    // --- selection --------------------------------------------------------

    /// Select exactly one layer.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LayerNotFound`] if the layer does not exist.
    pub fn select(&mut self, id: LayerId) -> CoreResult<()> {
        if !self.design.contains(id) {
            return Err(CoreError::LayerNotFound(id));
        }
        self.selection.select_only(id);
        Ok(())
    }

    /// Add or remove a layer from the selection.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LayerNotFound`] if the layer does not exist.
    pub fn toggle_selection(&mut self, id: LayerId) -> CoreResult<()> {
        if !self.design.contains(id) {
            return Err(CoreError::LayerNotFound(id));
        }
        self.selection.toggle(id);
        Ok(())
    }

    /// Deselect everything.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Group the selected layers and select the group.
    ///
    /// # Errors
    ///
    /// See [`Design::group`].
    pub fn group_selection(&mut self) -> CoreResult<LayerId> {
        let group = self.design.group(self.selection.ids())?;
        self.selection.select_only(group);
        Ok(group)
    }

    /// Ungroup a group and select its former members.
    ///
    /// # Errors
    ///
    /// See [`Design::ungroup`].
    pub fn ungroup(&mut self, id: LayerId) -> CoreResult<Vec<LayerId>> {
        let members = self.design.ungroup(id)?;
        self.selection.clear();
        for member in &members {
            self.selection.add(*member);
        }
        Ok(members)
    }

    // --- pointer ----------------------------------------------------------

    /// Feed one pointer event to the controller.
    ///
    /// Pressing on a layer selects it; pressing on empty canvas clears the
    /// selection.
    ///
    /// # Errors
    ///
    /// See [`InteractionController::handle`].
    pub fn pointer(&mut self, event: &PointerEvent) -> CoreResult<InteractionOutcome> {
        let outcome = self.interaction.handle(&mut self.design, event)?;
        match outcome {
            InteractionOutcome::Started(_, layer) => self.selection.select_only(layer),
            InteractionOutcome::Ignored if event.phase == PointerPhase::Down => {
                self.selection.clear();
            }
            InteractionOutcome::TargetLost(_) => self.selection.prune(&self.design),
            _ => {}
        }
        Ok(outcome)
    }

    // --- async actions ----------------------------------------------------

    /// Whether an action is running.
    #[must_use]
    pub fn is_busy(&self, action: Action) -> bool {
        self.slots[action.index()].busy
    }

    /// The last error of an action, cleared when the action starts again.
    #[must_use]
    pub fn error(&self, action: Action) -> Option<&ActionError> {
        self.slots[action.index()].error.as_ref()
    }

    /// Dismiss an action's error.
    pub fn clear_error(&mut self, action: Action) {
        self.slots[action.index()].error = None;
    }

    /// Resolve the image layer an action should target: `layer` if given,
    /// otherwise the primary selection.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoImageSelected`] if there is no such layer
    /// or it is not an image.
    pub fn image_target(&self, layer: Option<LayerId>) -> Result<LayerId, ValidationError> {
        layer
            .or_else(|| self.selection.primary())
            .filter(|id| self.design.get(*id).and_then(Layer::as_image).is_some())
            .ok_or(ValidationError::NoImageSelected)
    }

    /// The encoded bitmap of an image layer.
    #[must_use]
    pub fn image_source(&self, id: LayerId) -> Option<ImageSource> {
        self.design
            .get(id)
            .and_then(Layer::as_image)
            .map(|image| image.source.clone())
    }

    /// Mark an action busy and issue its ticket.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ActionBusy`] if the action is already
    /// running, or [`CoreError::LayerNotFound`] if `layer` does not exist.
    pub fn begin(&mut self, action: Action, layer: Option<LayerId>) -> StudioResult<Ticket> {
        if self.is_busy(action) {
            return Err(ValidationError::ActionBusy(action).into());
        }
        let revision = match layer {
            Some(id) => self
                .design
                .get(id)
                .ok_or(CoreError::LayerNotFound(id))?
                .revision(),
            None => 0,
        };

        let slot = &mut self.slots[action.index()];
        slot.busy = true;
        slot.error = None;
        tracing::debug!(%action, ?layer, revision, "action started");
        Ok(Ticket {
            action,
            layer,
            revision,
        })
    }

    /// Whether the ticket's target is unchanged.
    #[must_use]
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        match ticket.layer {
            Some(id) => self
                .design
                .get(id)
                .is_some_and(|layer| layer.revision() == ticket.revision),
            None => true,
        }
    }

    /// Finish an action that produced nothing to apply.
    pub fn complete(&mut self, ticket: Ticket) {
        self.slots[ticket.action.index()].busy = false;
        tracing::debug!(action = %ticket.action, "action finished");
    }

    /// Finish an action with an error, recording it in the action's slot.
    pub fn fail(&mut self, ticket: Ticket, err: &StudioError) {
        let slot = &mut self.slots[ticket.action.index()];
        slot.busy = false;
        slot.error = Some(ActionError::from(err));
        tracing::debug!(action = %ticket.action, reason = err.reason(), "action failed");
    }

    /// Finish an action whose result is a new layer. The layer is added on top
    /// and selected.
    pub fn complete_with_layer(&mut self, ticket: Ticket, layer: Layer) -> LayerId {
        self.complete(ticket);
        self.add_layer(layer)
    }

    /// Finish an action whose result replaces the target layer's content.
    ///
    /// # Errors
    ///
    /// Returns the error of [`Design::update_content`]; it is also recorded in
    /// the action's slot.
    pub fn complete_with_content(
        &mut self,
        ticket: Ticket,
        update: ContentUpdate,
    ) -> StudioResult<Applied<()>> {
        let (Some(layer), true) = (ticket.layer, self.is_current(&ticket)) else {
            tracing::warn!(
                action = %ticket.action,
                layer = ?ticket.layer,
                "discarding stale result"
            );
            self.complete(ticket);
            return Ok(Applied::Discarded);
        };
        match self.design.update_content(layer, update) {
            Ok(()) => {
                self.complete(ticket);
                Ok(Applied::Applied(()))
            }
            Err(e) => {
                let err = StudioError::from(e);
                self.fail(ticket, &err);
                Err(err)
            }
        }
    }

    /// Finish a mockup load.
    pub fn complete_with_mockup(
        &mut self,
        ticket: Ticket,
        mockup: Mockup,
        policy: MockupSwapPolicy,
    ) -> MockupSwap {
        self.complete(ticket);
        self.set_mockup(Some(mockup), policy)
    }
}
