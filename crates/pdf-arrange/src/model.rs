//! Page collection model
//!
//! Two slots, each holding an ordered sequence of [`PageEntry`]. A page's
//! rank is its position in the sequence and is never stored. Entries point
//! back at the [`SourceDocument`] their bytes come from, which may belong
//! to the other slot for copied pages.

use crate::constants::MAX_DISPLAY_NAME_CHARS;
use crate::types::*;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One of the two page containers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SlotId {
    Left,
    Right,
}

impl SlotId {
    pub const ALL: [SlotId; 2] = [SlotId::Left, SlotId::Right];

    pub fn index(self) -> usize {
        match self {
            SlotId::Left => 0,
            SlotId::Right => 1,
        }
    }

    pub fn other(self) -> SlotId {
        match self {
            SlotId::Left => SlotId::Right,
            SlotId::Right => SlotId::Left,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SlotId::Left => "Left",
            SlotId::Right => "Right",
        }
    }

    /// Single-letter tag used in page labels
    pub fn short_label(self) -> &'static str {
        match self {
            SlotId::Left => "L",
            SlotId::Right => "R",
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identity of a page entry, independent of its position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub u64);

/// Handle to a loaded source document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub u64);

/// How an entry came to occupy its slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provenance {
    /// Loaded directly into its current slot
    #[default]
    Original,
    /// Produced by a cross-slot copy
    Copy,
}

/// One page occupying a position in a slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    id: EntryId,
    source_slot: SlotId,
    source_page: u32,
    document: DocumentId,
    provenance: Provenance,
}

impl PageEntry {
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Slot the underlying bytes were originally loaded into
    pub fn source_slot(&self) -> SlotId {
        self.source_slot
    }

    /// 1-based page number within the source document
    pub fn source_page(&self) -> u32 {
        self.source_page
    }

    pub fn document(&self) -> DocumentId {
        self.document
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    pub fn is_copy(&self) -> bool {
        self.provenance == Provenance::Copy
    }

    /// Display label such as `L - P.3`
    pub fn label(&self) -> String {
        format!("{} - P.{}", self.source_slot.short_label(), self.source_page)
    }
}

/// Raw bytes of a loaded file plus what the rendering service reported
#[derive(Debug, Clone)]
pub struct SourceDocument {
    id: DocumentId,
    slot: SlotId,
    name: String,
    bytes: Arc<[u8]>,
    page_count: usize,
}

impl SourceDocument {
    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// File name shortened for slot headers
    pub fn display_name(&self) -> String {
        truncate_display_name(&self.name)
    }
}

pub(crate) fn truncate_display_name(name: &str) -> String {
    if name.chars().count() <= MAX_DISPLAY_NAME_CHARS {
        return name.to_string();
    }
    let kept: String = name.chars().take(MAX_DISPLAY_NAME_CHARS - 3).collect();
    format!("{kept}...")
}

/// A single container: its loaded document (if any) and its page order
#[derive(Debug, Clone, Default)]
pub struct Slot {
    source: Option<DocumentId>,
    entries: Vec<PageEntry>,
}

impl Slot {
    pub fn source(&self) -> Option<DocumentId> {
        self.source
    }

    pub fn entries(&self) -> &[PageEntry] {
        &self.entries
    }

    fn position(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }
}

/// Owns both slots and every source document still referenced by an entry
#[derive(Debug, Default)]
pub struct PageCollection {
    slots: [Slot; 2],
    documents: HashMap<DocumentId, SourceDocument>,
    next_entry_id: u64,
    next_document_id: u64,
}

impl PageCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a slot's contents with the pages of a freshly loaded document.
    ///
    /// Every page becomes an `Original` entry, in document order. Copies in
    /// the other slot keep referencing whatever document they were copied
    /// from.
    pub fn load_slot(
        &mut self,
        slot: SlotId,
        name: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
        page_count: usize,
    ) -> DocumentId {
        let document = DocumentId(self.next_document_id);
        self.next_document_id += 1;

        self.documents.insert(
            document,
            SourceDocument {
                id: document,
                slot,
                name: name.into(),
                bytes: bytes.into(),
                page_count,
            },
        );

        let entries = (1..=page_count as u32)
            .map(|page| self.new_entry(slot, page, document, Provenance::Original))
            .collect();

        self.slots[slot.index()] = Slot {
            source: Some(document),
            entries,
        };
        self.prune_sources();
        document
    }

    fn new_entry(
        &mut self,
        source_slot: SlotId,
        source_page: u32,
        document: DocumentId,
        provenance: Provenance,
    ) -> PageEntry {
        let id = EntryId(self.next_entry_id);
        self.next_entry_id += 1;
        PageEntry {
            id,
            source_slot,
            source_page,
            document,
            provenance,
        }
    }

    pub fn slot(&self, slot: SlotId) -> &Slot {
        &self.slots[slot.index()]
    }

    /// Current page order of a slot
    pub fn sequence(&self, slot: SlotId) -> &[PageEntry] {
        &self.slots[slot.index()].entries
    }

    pub fn is_loaded(&self, slot: SlotId) -> bool {
        self.slots[slot.index()].source.is_some()
    }

    /// Document currently loaded into a slot
    pub fn slot_source(&self, slot: SlotId) -> Option<&SourceDocument> {
        self.slots[slot.index()]
            .source
            .and_then(|id| self.documents.get(&id))
    }

    pub fn source(&self, document: DocumentId) -> Option<&SourceDocument> {
        self.documents.get(&document)
    }

    /// Slot and rank of an entry
    pub fn index_of(&self, id: EntryId) -> Option<(SlotId, usize)> {
        SlotId::ALL
            .into_iter()
            .find_map(|slot| self.slots[slot.index()].position(id).map(|rank| (slot, rank)))
    }

    pub fn entry(&self, id: EntryId) -> Option<&PageEntry> {
        self.index_of(id)
            .map(|(slot, rank)| &self.slots[slot.index()].entries[rank])
    }

    /// Remove an entry and reinsert it at `to_index` within the same slot.
    ///
    /// `to_index` is a position in the sequence with the entry already taken
    /// out, so it ranges over `0..=len - 1`.
    pub fn move_entry(&mut self, id: EntryId, to_index: usize) -> Result<()> {
        let (slot, from) = self
            .index_of(id)
            .ok_or(InvariantViolation::EntryNotFound(id))?;
        let entries = &mut self.slots[slot.index()].entries;

        let len_without = entries.len() - 1;
        if to_index > len_without {
            return Err(InvariantViolation::IndexOutOfRange {
                index: to_index,
                len: len_without,
            }
            .into());
        }

        let entry = entries.remove(from);
        entries.insert(to_index, entry);
        log::debug!("Moved {id:?} in {slot} from {from} to {to_index}");
        Ok(())
    }

    /// Insert a `Copy` of `source_id` into `target` at `at_index`.
    ///
    /// The new entry points at the same source bytes and page as the
    /// original; the source entry is untouched.
    pub fn copy_into(
        &mut self,
        source_id: EntryId,
        target: SlotId,
        at_index: usize,
    ) -> Result<EntryId> {
        let source = self
            .entry(source_id)
            .cloned()
            .ok_or(InvariantViolation::EntryNotFound(source_id))?;

        if source.is_copy() && source.source_slot == target {
            return Err(InvariantViolation::CopyBack { slot: target }.into());
        }

        let len = self.slots[target.index()].entries.len();
        if at_index > len {
            return Err(InvariantViolation::IndexOutOfRange {
                index: at_index,
                len,
            }
            .into());
        }

        let copy = self.new_entry(
            source.source_slot,
            source.source_page,
            source.document,
            Provenance::Copy,
        );
        let copy_id = copy.id;
        self.slots[target.index()].entries.insert(at_index, copy);
        log::debug!("Copied {source_id:?} into {target} at {at_index} as {copy_id:?}");
        Ok(copy_id)
    }

    /// Delete an entry, refusing to leave its slot empty.
    pub fn remove(&mut self, id: EntryId) -> Result<PageEntry> {
        let (slot, rank) = self
            .index_of(id)
            .ok_or(InvariantViolation::EntryNotFound(id))?;
        let entries = &mut self.slots[slot.index()].entries;

        if entries.len() <= 1 {
            return Err(InvariantViolation::LastPage.into());
        }

        let removed = entries.remove(rank);
        self.prune_sources();
        Ok(removed)
    }

    /// Whether an `Original` entry sits somewhere other than its page number
    /// in its own slot. Copies are never considered displaced.
    pub fn is_displaced(&self, id: EntryId) -> bool {
        match (self.entry(id), self.index_of(id)) {
            (Some(entry), Some((slot, rank))) => {
                entry.provenance == Provenance::Original
                    && (entry.source_slot != slot || entry.source_page as usize != rank + 1)
            }
            _ => false,
        }
    }

    /// Drop documents no slot or entry refers to any more.
    pub fn prune_sources(&mut self) {
        let slots = &self.slots;
        let before = self.documents.len();
        self.documents.retain(|id, _| {
            slots.iter().any(|slot| {
                slot.source == Some(*id) || slot.entries.iter().any(|e| e.document == *id)
            })
        });
        let pruned = before - self.documents.len();
        if pruned > 0 {
            log::debug!("Released {pruned} unreferenced source document(s)");
        }
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }
}
