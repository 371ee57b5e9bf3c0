//! Drag session state machine
//!
//! `Idle -> Dragging -> Idle`. Each transition is a pure function of the
//! current state and an event, returning the next state and the effects
//! the caller must apply to the model. Nothing in here mutates pages.

use crate::model::{EntryId, PageEntry, SlotId};
use crate::resolver::DropTarget;
use crate::types::InvariantViolation;

/// One in-flight drag, captured at drag start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    dragged: EntryId,
    origin_slot: SlotId,
    origin_index: usize,
    source_slot: SlotId,
    is_copy_provenance: bool,
}

impl DragSession {
    pub fn begin(entry: &PageEntry, origin_slot: SlotId, origin_index: usize) -> Self {
        Self {
            dragged: entry.id(),
            origin_slot,
            origin_index,
            source_slot: entry.source_slot(),
            is_copy_provenance: entry.is_copy(),
        }
    }

    pub fn dragged(&self) -> EntryId {
        self.dragged
    }

    pub fn origin_slot(&self) -> SlotId {
        self.origin_slot
    }

    pub fn origin_index(&self) -> usize {
        self.origin_index
    }

    /// Slot the dragged entry's bytes come from
    pub fn source_slot(&self) -> SlotId {
        self.source_slot
    }

    pub fn is_copy_provenance(&self) -> bool {
        self.is_copy_provenance
    }

    /// A copy may never land in the slot it was copied from.
    pub fn forbids(&self, slot: SlotId) -> bool {
        self.is_copy_provenance && slot == self.source_slot
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEvent {
    Start(DragSession),
    Over,
    /// Released over slot `over`, with the last resolved target (if any)
    Drop {
        over: SlotId,
        target: Option<DropTarget>,
    },
    End,
}

/// Model changes and notices produced by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEffect {
    /// Reorder within the origin slot
    Move { entry: EntryId, to_index: usize },
    /// Insert a copy into another slot
    Copy { entry: EntryId, target: DropTarget },
    /// Dropped where it started; nothing changes
    ReturnedToOrigin,
    /// The drop would break a model rule and was refused
    Rejected(InvariantViolation),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: DragState,
    pub effects: Vec<DragEffect>,
}

impl Transition {
    fn to(state: DragState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn idle_with(effect: DragEffect) -> Self {
        Self {
            state: DragState::Idle,
            effects: vec![effect],
        }
    }
}

impl DragState {
    pub fn session(&self) -> Option<&DragSession> {
        match self {
            DragState::Idle => None,
            DragState::Dragging(session) => Some(session),
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging(_))
    }

    pub fn transition(self, event: DragEvent) -> Transition {
        match (self, event) {
            (DragState::Idle, DragEvent::Start(session)) => {
                Transition::to(DragState::Dragging(session))
            }
            (DragState::Dragging(previous), DragEvent::Start(session)) => {
                log::warn!(
                    "Drag of {:?} started while {:?} was still in flight",
                    session.dragged,
                    previous.dragged
                );
                Transition::to(DragState::Dragging(session))
            }
            (dragging @ DragState::Dragging(_), DragEvent::Over) => Transition::to(dragging),
            (DragState::Dragging(session), DragEvent::Drop { over, target }) => {
                Transition::idle_with(drop_effect(&session, over, target))
            }
            (DragState::Dragging(_), DragEvent::End) => Transition::to(DragState::Idle),
            // Late or duplicate events after the session was consumed
            (DragState::Idle, _) => Transition::to(DragState::Idle),
        }
    }
}

fn drop_effect(session: &DragSession, over: SlotId, target: Option<DropTarget>) -> DragEffect {
    if session.forbids(over) {
        return DragEffect::Rejected(InvariantViolation::CopyBack { slot: over });
    }

    let Some(target) = target else {
        return DragEffect::ReturnedToOrigin;
    };

    if target.slot == session.origin_slot {
        if target.index == session.origin_index {
            DragEffect::ReturnedToOrigin
        } else {
            DragEffect::Move {
                entry: session.dragged,
                to_index: target.index,
            }
        }
    } else if session.forbids(target.slot) {
        DragEffect::Rejected(InvariantViolation::CopyBack { slot: target.slot })
    } else {
        DragEffect::Copy {
            entry: session.dragged,
            target,
        }
    }
}
