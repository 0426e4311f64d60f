//! Core editor types: positions, selection, and screen geometry.
//!
//! These types are framework-agnostic. Positions address leaves (text blocks
//! and atoms) by their document-order index, so they stay meaningful for any
//! host that can map its own coordinates onto leaves.

use serde::{Deserialize, Serialize};

/// A location inside the document.
///
/// `leaf` is the document-order index of a text block or atom, `offset` is a
/// character offset within it (NOT a byte offset). Atoms have length 1:
/// offset 0 is before the atom, offset 1 after it.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Position {
    pub leaf: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(leaf: usize, offset: usize) -> Self {
        Self { leaf, offset }
    }
}

/// Selection with anchor and head positions.
///
/// The anchor is where the selection started, the head is where the cursor is now.
/// They may be in any order - use `start()` and `end()` for ordered bounds.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    /// Where selection started
    pub anchor: Position,
    /// Where cursor is now
    pub head: Position,
}

impl Default for Selection {
    fn default() -> Self {
        Self::collapsed(Position::default())
    }
}

impl Selection {
    /// Create a new selection.
    pub fn new(anchor: Position, head: Position) -> Self {
        Self { anchor, head }
    }

    /// Create a collapsed selection (cursor position).
    pub fn collapsed(at: Position) -> Self {
        Self {
            anchor: at,
            head: at,
        }
    }

    /// Selection spanning a whole atom leaf.
    pub fn node(leaf: usize) -> Self {
        Self {
            anchor: Position::new(leaf, 0),
            head: Position::new(leaf, 1),
        }
    }

    /// Get the start (lower bound) of the selection.
    pub fn start(&self) -> Position {
        self.anchor.min(self.head)
    }

    /// Get the end (upper bound) of the selection.
    pub fn end(&self) -> Position {
        self.anchor.max(self.head)
    }

    /// Check if the selection is collapsed (empty, cursor only).
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    /// Check if empty (same as is_collapsed).
    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }

    /// Check if a position is within the selection (end exclusive).
    pub fn contains(&self, pos: Position) -> bool {
        pos >= self.start() && pos < self.end()
    }

    /// Check if the selection is backwards (head before anchor).
    pub fn is_backwards(&self) -> bool {
        self.head < self.anchor
    }

    /// Leaf indices touched by this selection, in order.
    pub fn leaves(&self) -> std::ops::RangeInclusive<usize> {
        self.start().leaf..=self.end().leaf
    }
}

/// Axis-aligned rectangle in viewport pixels (`getBoundingClientRect` space).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        Rect {
            left,
            top,
            width: self.right().max(other.right()) - left,
            height: self.bottom().max(other.bottom()) - top,
        }
    }
}

/// Width/height pair in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(leaf: usize, offset: usize) -> Position {
        Position::new(leaf, offset)
    }

    #[test]
    fn test_selection_bounds() {
        // Forward selection
        let sel = Selection::new(pos(0, 5), pos(1, 2));
        assert_eq!(sel.start(), pos(0, 5));
        assert_eq!(sel.end(), pos(1, 2));
        assert!(!sel.is_backwards());

        // Backward selection
        let sel = Selection::new(pos(1, 2), pos(0, 5));
        assert_eq!(sel.start(), pos(0, 5));
        assert_eq!(sel.end(), pos(1, 2));
        assert!(sel.is_backwards());
    }

    #[test]
    fn test_selection_collapsed() {
        let sel = Selection::collapsed(pos(2, 7));
        assert!(sel.is_collapsed());
        assert!(sel.is_empty());
        assert_eq!(sel.start(), pos(2, 7));
        assert_eq!(sel.end(), pos(2, 7));
    }

    #[test]
    fn test_selection_contains() {
        let sel = Selection::new(pos(0, 5), pos(0, 10));
        assert!(!sel.contains(pos(0, 4)));
        assert!(sel.contains(pos(0, 5)));
        assert!(sel.contains(pos(0, 9)));
        assert!(!sel.contains(pos(0, 10))); // end is exclusive
    }

    #[test]
    fn test_position_ordering_is_leaf_major() {
        assert!(pos(0, 100) < pos(1, 0));
        assert!(pos(3, 1) > pos(3, 0));
    }

    #[test]
    fn test_node_selection() {
        let sel = Selection::node(4);
        assert_eq!(sel.leaves(), 4..=4);
        assert!(!sel.is_collapsed());
    }

    #[test]
    fn test_rect_union() {
        let a = Rect::new(10.0, 10.0, 20.0, 10.0);
        let b = Rect::new(0.0, 30.0, 5.0, 5.0);
        let u = a.union(&b);
        assert_eq!(u, Rect::new(0.0, 10.0, 30.0, 25.0));
    }
}
