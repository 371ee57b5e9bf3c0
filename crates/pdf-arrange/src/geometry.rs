//! Screen-space geometry for drop target resolution
//!
//! Coordinates follow the UI convention: `x` grows to the right and `y`
//! grows downwards, so `top` is the smaller y value.

use crate::model::{EntryId, SlotId};

/// Pointer position
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Inclusive on every edge
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Horizontal position of `p` as a fraction of this box's width
    pub fn fraction_x(&self, p: Point) -> f32 {
        if self.width <= 0.0 {
            return 0.0;
        }
        (p.x - self.x) / self.width
    }
}

/// Bounding box of one entry as currently laid out
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryBox {
    pub entry: EntryId,
    pub rect: Rect,
}

/// Layout of one slot: its container plus its entries in sequence order
#[derive(Debug, Clone, PartialEq)]
pub struct SlotLayout {
    pub slot: SlotId,
    pub container: Rect,
    pub entries: Vec<EntryBox>,
}

impl SlotLayout {
    pub fn new(slot: SlotId, container: Rect) -> Self {
        Self {
            slot,
            container,
            entries: Vec::new(),
        }
    }

    pub fn with_entry(mut self, entry: EntryId, rect: Rect) -> Self {
        self.entries.push(EntryBox { entry, rect });
        self
    }
}

/// Which slot container, if any, the pointer is over
pub fn hovered_slot(layouts: &[SlotLayout], pointer: Point) -> Option<&SlotLayout> {
    layouts.iter().find(|layout| layout.container.contains(pointer))
}
