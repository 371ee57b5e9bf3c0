//! Slot controller
//!
//! Glue between UI events and the core: pointer events go through the
//! [`DropTargetResolver`] and the [`DragState`] machine, and the resulting
//! effects are applied to the [`PageCollection`]. Every user action ends by
//! leaving a [`StatusMessage`] behind; failures never escape an action.

use crate::assembly::{AssembledDocument, AssemblyJob};
use crate::geometry::{Point, SlotLayout, hovered_slot};
use crate::model::{DocumentId, EntryId, PageCollection, SlotId};
use crate::options::EditorOptions;
use crate::resolver::{DropTarget, DropTargetResolver};
use crate::session::{DragEffect, DragEvent, DragSession, DragState};
use crate::types::*;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// Outcome of the latest user action, for the status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SlotController {
    pages: PageCollection,
    drag: DragState,
    resolver: DropTargetResolver,
    status: Option<StatusMessage>,
}

impl SlotController {
    pub fn new(options: &EditorOptions) -> Self {
        Self {
            pages: PageCollection::new(),
            drag: DragState::Idle,
            resolver: DropTargetResolver::new(options.drop_zones),
            status: None,
        }
    }

    pub fn pages(&self) -> &PageCollection {
        &self.pages
    }

    /// Switch to new settings; a drag in flight is abandoned
    pub fn apply_options(&mut self, options: &EditorOptions) {
        self.drag_end();
        self.resolver = DropTargetResolver::new(options.drop_zones);
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Install a freshly loaded document into a slot.
    ///
    /// A drag in flight is abandoned since its entry may no longer exist.
    pub fn load_document(
        &mut self,
        slot: SlotId,
        name: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
        page_count: usize,
    ) -> DocumentId {
        self.drag_end();
        let document = self.pages.load_slot(slot, name, bytes, page_count);
        log::info!("Loaded {} page(s) into the {} slot", page_count, slot);
        self.set_status(StatusMessage::success(format!(
            "PDF loaded ({page_count} pages) - {slot}"
        )));
        document
    }

    /// Record a failed load; the slot keeps its previous contents
    pub fn load_failed(&mut self, slot: SlotId, error: &ArrangeError) {
        log::error!("Failed to load PDF into {}: {}", slot, error);
        self.set_status(StatusMessage::error(format!("Failed to load PDF ({slot})")));
    }

    pub fn load_cancelled(&mut self, slot: SlotId) {
        log::info!("Loading into {} cancelled", slot);
        self.set_status(StatusMessage::info(format!("PDF loading cancelled ({slot})")));
    }

    // =========================================================================
    // Dragging
    // =========================================================================

    pub fn drag_start(&mut self, entry: EntryId) -> Result<()> {
        let (slot, rank) = self
            .pages
            .index_of(entry)
            .ok_or(InvariantViolation::EntryNotFound(entry))?;
        let page = self
            .pages
            .entry(entry)
            .ok_or(InvariantViolation::EntryNotFound(entry))?;

        let session = DragSession::begin(page, slot, rank);
        self.resolver.reset();
        self.apply(DragEvent::Start(session));
        Ok(())
    }

    /// Resolve the pointer against the current layout.
    ///
    /// While the pointer is between containers the last target is kept.
    pub fn drag_over(&mut self, layouts: &[SlotLayout], pointer: Point) -> Option<DropTarget> {
        if !self.drag.is_dragging() {
            return None;
        }

        let target = match hovered_slot(layouts, pointer) {
            Some(layout) => self.resolver.resolve(
                self.drag.session(),
                layout.slot,
                &layout.entries,
                pointer,
            ),
            None => self.resolver.current(),
        };
        self.apply(DragEvent::Over);
        target
    }

    /// Finish the drag at `pointer`, applying the effects to the model.
    ///
    /// Released outside both containers the drag simply ends.
    pub fn drop_dragged(&mut self, layouts: &[SlotLayout], pointer: Point) -> Vec<DragEffect> {
        if !self.drag.is_dragging() {
            return Vec::new();
        }

        let Some(over) = hovered_slot(layouts, pointer).map(|layout| layout.slot) else {
            self.drag_end();
            return Vec::new();
        };

        let target = self.resolver.current().filter(|t| t.slot == over);
        self.resolver.reset();
        let effects = self.apply(DragEvent::Drop { over, target });
        for effect in &effects {
            self.apply_effect(effect);
        }
        effects
    }

    /// Abandon the drag without touching the model; safe to call when idle
    pub fn drag_end(&mut self) {
        self.resolver.reset();
        self.apply(DragEvent::End);
    }

    pub fn dragging(&self) -> Option<&DragSession> {
        self.drag.session()
    }

    /// Target the insertion marker should show, if any
    pub fn drop_target(&self) -> Option<DropTarget> {
        if self.drag.is_dragging() {
            self.resolver.current()
        } else {
            None
        }
    }

    fn apply(&mut self, event: DragEvent) -> Vec<DragEffect> {
        let transition = std::mem::take(&mut self.drag).transition(event);
        self.drag = transition.state;
        transition.effects
    }

    fn apply_effect(&mut self, effect: &DragEffect) {
        let outcome = match effect {
            DragEffect::Move { entry, to_index } => self
                .pages
                .move_entry(*entry, *to_index)
                .map(|()| StatusMessage::success("Page moved")),
            DragEffect::Copy { entry, target } => self
                .pages
                .copy_into(*entry, target.slot, target.index)
                .map(|_| StatusMessage::success("Page copied (original page remains)")),
            DragEffect::ReturnedToOrigin => Ok(StatusMessage::info(
                "Returned to original position (no change)",
            )),
            DragEffect::Rejected(violation) => Err(violation.clone().into()),
        };

        let status = match outcome {
            Ok(status) => status,
            Err(ArrangeError::Invariant(InvariantViolation::CopyBack { slot })) => {
                log::warn!("Refused to return a copied page to {}", slot);
                StatusMessage::error("Cannot return copied page to original PDF")
            }
            Err(e) => {
                log::error!("Drop could not be applied: {}", e);
                StatusMessage::error(e.to_string())
            }
        };
        self.set_status(status);
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Delete a page, refusing to empty its slot
    pub fn delete(&mut self, entry: EntryId) -> Result<()> {
        if self.drag.session().is_some_and(|s| s.dragged() == entry) {
            self.drag_end();
        }

        match self.pages.remove(entry) {
            Ok(_) => {
                self.set_status(StatusMessage::success("Page deleted"));
                Ok(())
            }
            Err(e) => {
                let status = match &e {
                    ArrangeError::Invariant(InvariantViolation::LastPage) => {
                        StatusMessage::error("Cannot delete the last page")
                    }
                    other => {
                        log::error!("Delete failed: {}", other);
                        StatusMessage::error(other.to_string())
                    }
                };
                self.set_status(status);
                Err(e)
            }
        }
    }

    pub fn is_displaced(&self, entry: EntryId) -> bool {
        self.pages.is_displaced(entry)
    }

    // =========================================================================
    // Assembly
    // =========================================================================

    /// Snapshot a slot for the assembly pipeline
    pub fn assembly_job(&mut self, slot: SlotId) -> Result<AssemblyJob> {
        match AssemblyJob::from_collection(&self.pages, slot) {
            Ok(job) => {
                self.set_status(StatusMessage::info(format!("{slot} PDF generating...")));
                Ok(job)
            }
            Err(e) => {
                let text = match &e {
                    ArrangeError::NotLoaded(slot) => {
                        format!("{slot} PDF is not uploaded. Please upload a PDF first.")
                    }
                    other => other.to_string(),
                };
                self.set_status(StatusMessage::error(text));
                Err(e)
            }
        }
    }

    /// Record the outcome of an assembly run
    pub fn finish_assembly(&mut self, slot: SlotId, outcome: &Result<AssembledDocument>) {
        let status = match outcome {
            Ok(_) => StatusMessage::success(format!("{slot} PDF downloaded")),
            Err(ArrangeError::Cancelled) => {
                StatusMessage::info(format!("{slot} PDF generation cancelled"))
            }
            Err(e) => StatusMessage::error(format!("{slot} PDF generation failed: {e}")),
        };
        self.set_status(status);
    }

    // =========================================================================
    // Status
    // =========================================================================

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn take_status(&mut self) -> Option<StatusMessage> {
        self.status.take()
    }

    pub fn set_status(&mut self, status: StatusMessage) {
        log::debug!("Status: {}", status.text);
        self.status = Some(status);
    }
}
