//! Drop target resolution
//!
//! Maps a continuous pointer position over a slot to a discrete insertion
//! index. The rules, in order:
//!
//! 1. A copied page can never be dropped into the slot it was copied from.
//! 2. An empty slot (ignoring the dragged page) only accepts index 0.
//! 3. The dragged page is left out of the geometry when it lives in the
//!    hovered slot, and its rank is remembered.
//! 4. Inside a page: the leading edge inserts before it, the trailing edge
//!    after it, and the middle keeps whatever was resolved before.
//! 5. Outside every page: above or left of the first page inserts at 0,
//!    below or right of the last page appends.
//! 6. Otherwise the index last resolved in this slot is kept, if any.
//! 7. Resolving back onto the dragged page's own rank yields no target.
//!
//! The middle dead zone and the previous-target memory stop the insertion
//! marker from flickering while the pointer wanders over one thumbnail.

use crate::geometry::{EntryBox, Point, Rect};
use crate::model::SlotId;
use crate::options::DropZoneThresholds;
use crate::session::DragSession;

/// Where a drop would insert: a position in the target slot's sequence
/// with the dragged entry taken out when it lives there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DropTarget {
    pub slot: SlotId,
    pub index: usize,
}

impl DropTarget {
    pub fn new(slot: SlotId, index: usize) -> Self {
        Self { slot, index }
    }
}

/// Resolve a single pointer position.
///
/// `layout` lists the hovered slot's entries in sequence order, including
/// the dragged entry if it belongs to this slot. `previous` is the last
/// target resolved during this drag; it only counts when it belongs to the
/// hovered slot.
pub fn resolve_drop_target(
    session: Option<&DragSession>,
    hovered: SlotId,
    layout: &[EntryBox],
    pointer: Point,
    previous: Option<DropTarget>,
    thresholds: &DropZoneThresholds,
) -> Option<DropTarget> {
    let previous_here = previous.filter(|t| t.slot == hovered).map(|t| t.index);
    match resolve_index(session?, hovered, layout, pointer, previous_here, thresholds) {
        Resolution::Index(index) => Some(DropTarget::new(hovered, index)),
        _ => None,
    }
}

/// Outcome of one hover, before it is turned into a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Index(usize),
    /// Nothing decided and nothing remembered
    Unresolved,
    /// A copy hovering the slot it was copied from
    CopyBack,
    /// Back on the dragged entry's own rank
    Origin,
}

fn resolve_index(
    session: &DragSession,
    hovered: SlotId,
    layout: &[EntryBox],
    pointer: Point,
    previous_here: Option<usize>,
    thresholds: &DropZoneThresholds,
) -> Resolution {
    if session.forbids(hovered) {
        return Resolution::CopyBack;
    }

    let origin_rank = layout.iter().position(|b| b.entry == session.dragged());
    let boxes: Vec<&Rect> = layout
        .iter()
        .filter(|b| b.entry != session.dragged())
        .map(|b| &b.rect)
        .collect();

    let candidate = if boxes.is_empty() {
        Some(0)
    } else {
        match hit_test(&boxes, pointer, thresholds) {
            Hit::Resolved(index) => Some(index),
            Hit::DeadZone => previous_here,
            Hit::Outside => boundary_index(&boxes, pointer, thresholds).or(previous_here),
        }
    };

    match candidate {
        None => Resolution::Unresolved,
        // Back where it started: not a move
        Some(index) if origin_rank == Some(index) => Resolution::Origin,
        Some(index) => Resolution::Index(index),
    }
}

enum Hit {
    Resolved(usize),
    DeadZone,
    Outside,
}

fn hit_test(boxes: &[&Rect], pointer: Point, thresholds: &DropZoneThresholds) -> Hit {
    let Some((rank, rect)) = boxes
        .iter()
        .enumerate()
        .find(|(_, rect)| rect.contains(pointer))
    else {
        return Hit::Outside;
    };

    let fraction = rect.fraction_x(pointer);
    if fraction < thresholds.leading {
        Hit::Resolved(rank)
    } else if fraction > thresholds.trailing {
        Hit::Resolved(rank + 1)
    } else {
        Hit::DeadZone
    }
}

/// Extended zones before the first page and after the last one
fn boundary_index(boxes: &[&Rect], pointer: Point, thresholds: &DropZoneThresholds) -> Option<usize> {
    let first = boxes.first()?;
    let last = boxes.last()?;

    let before_first = pointer.y < first.y
        || (pointer.y < first.bottom()
            && pointer.x < first.x + first.width * thresholds.first_extension);
    if before_first {
        return Some(0);
    }

    let after_last = pointer.y > last.bottom()
        || (pointer.y > last.y && pointer.x > last.x + last.width * thresholds.last_extension);
    if after_last {
        return Some(boxes.len());
    }

    None
}

/// Resolver with memory, for hysteresis across drag-over events of one
/// drag.
///
/// Each slot remembers the last index it resolved to. Hovering elsewhere
/// leaves that memory alone; only the copy-back guard and landing on the
/// origin rank clear it.
#[derive(Debug, Clone, Default)]
pub struct DropTargetResolver {
    thresholds: DropZoneThresholds,
    remembered: [Option<usize>; 2],
    last: Option<DropTarget>,
}

impl DropTargetResolver {
    pub fn new(thresholds: DropZoneThresholds) -> Self {
        Self {
            thresholds,
            remembered: [None; 2],
            last: None,
        }
    }

    pub fn resolve(
        &mut self,
        session: Option<&DragSession>,
        hovered: SlotId,
        layout: &[EntryBox],
        pointer: Point,
    ) -> Option<DropTarget> {
        let session = session?;
        let memory = &mut self.remembered[hovered.index()];

        self.last = match resolve_index(session, hovered, layout, pointer, *memory, &self.thresholds) {
            Resolution::Index(index) => {
                *memory = Some(index);
                Some(DropTarget::new(hovered, index))
            }
            Resolution::Unresolved => None,
            Resolution::CopyBack | Resolution::Origin => {
                *memory = None;
                None
            }
        };
        self.last
    }

    /// Target resolved by the most recent drag-over
    pub fn current(&self) -> Option<DropTarget> {
        self.last
    }

    /// Forget everything remembered; call when a drag starts or ends
    pub fn reset(&mut self) {
        self.remembered = [None; 2];
        self.last = None;
    }

    pub fn thresholds(&self) -> &DropZoneThresholds {
        &self.thresholds
    }
}
