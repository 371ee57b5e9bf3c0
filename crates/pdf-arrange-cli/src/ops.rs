//! Edit operations given on the command line
//!
//! Positions are 1-based, as printed by `pdfa info`:
//!
//! - `move:L:2:1`   move Left's 2nd page to position 1
//! - `copy:L:3:R:2` copy Left's 3rd page into Right at position 2
//! - `delete:R:1`   delete Right's 1st page

use anyhow::{Context, Result, anyhow};
use pdf_arrange::{EntryId, PageCollection, SlotId};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Move {
        slot: SlotId,
        from: usize,
        to: usize,
    },
    Copy {
        from_slot: SlotId,
        from: usize,
        to_slot: SlotId,
        to: usize,
    },
    Delete {
        slot: SlotId,
        at: usize,
    },
}

fn parse_slot(s: &str) -> Result<SlotId, String> {
    match s.to_ascii_uppercase().as_str() {
        "L" | "LEFT" => Ok(SlotId::Left),
        "R" | "RIGHT" => Ok(SlotId::Right),
        other => Err(format!("unknown slot '{other}', expected L or R")),
    }
}

fn parse_position(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) | Err(_) => Err(format!("invalid position '{s}', positions start at 1")),
        Ok(n) => Ok(n),
    }
}

impl FromStr for Op {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            ["move", slot, from, to] => Ok(Op::Move {
                slot: parse_slot(slot)?,
                from: parse_position(from)?,
                to: parse_position(to)?,
            }),
            ["copy", from_slot, from, to_slot, to] => Ok(Op::Copy {
                from_slot: parse_slot(from_slot)?,
                from: parse_position(from)?,
                to_slot: parse_slot(to_slot)?,
                to: parse_position(to)?,
            }),
            ["delete", slot, at] => Ok(Op::Delete {
                slot: parse_slot(slot)?,
                at: parse_position(at)?,
            }),
            _ => Err(format!(
                "cannot parse '{s}', expected move:S:FROM:TO, copy:S:FROM:S:TO or delete:S:AT"
            )),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Move { slot, from, to } => {
                write!(f, "move {} {} -> {}", slot.short_label(), from, to)
            }
            Op::Copy {
                from_slot,
                from,
                to_slot,
                to,
            } => write!(
                f,
                "copy {} {} -> {} {}",
                from_slot.short_label(),
                from,
                to_slot.short_label(),
                to
            ),
            Op::Delete { slot, at } => write!(f, "delete {} {}", slot.short_label(), at),
        }
    }
}

fn entry_at(pages: &PageCollection, slot: SlotId, position: usize) -> Result<EntryId> {
    pages
        .sequence(slot)
        .get(position - 1)
        .map(|e| e.id())
        .ok_or_else(|| {
            anyhow!(
                "{} has {} page(s), there is no position {}",
                slot,
                pages.sequence(slot).len(),
                position
            )
        })
}

impl Op {
    /// Apply to the collection, or leave it untouched on error
    pub fn apply(&self, pages: &mut PageCollection) -> Result<()> {
        match *self {
            Op::Move { slot, from, to } => {
                let entry = entry_at(pages, slot, from)?;
                pages.move_entry(entry, to - 1)?;
            }
            Op::Copy {
                from_slot,
                from,
                to_slot,
                to,
            } => {
                let entry = entry_at(pages, from_slot, from)?;
                pages
                    .copy_into(entry, to_slot, to - 1)
                    .with_context(|| format!("cannot {self}"))?;
            }
            Op::Delete { slot, at } => {
                let entry = entry_at(pages, slot, at)?;
                pages.remove(entry)?;
            }
        }
        Ok(())
    }
}
