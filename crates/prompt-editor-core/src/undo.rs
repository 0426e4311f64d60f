//! Undo/redo management for editor operations.
//!
//! Provides:
//! - `UndoManager` trait for abstracting undo implementations
//! - `UndoableDocument` - owns a `Document` plus selection and records
//!   snapshots around every edit

use std::time::Duration;

use web_time::Instant;

use crate::document::Document;
use crate::types::Selection;

/// Trait for managing undo/redo operations.
///
/// Implementations must actually perform the undo/redo, not just track state.
pub trait UndoManager {
    /// Check if undo is available.
    fn can_undo(&self) -> bool;

    /// Check if redo is available.
    fn can_redo(&self) -> bool;

    /// Perform undo. Returns true if successful.
    fn undo(&mut self) -> bool;

    /// Perform redo. Returns true if successful.
    fn redo(&mut self) -> bool;

    /// Clear all undo/redo history.
    fn clear_history(&mut self);
}

/// Edits that merge into one undo step when they follow each other quickly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditGroup {
    /// Consecutive typed text.
    Typing,
    /// Consecutive single-character deletions.
    Deleting,
    /// Live width updates while dragging one image's resize handle.
    Resize(usize),
}

/// Document state captured before an edit.
#[derive(Debug, Clone)]
struct Snapshot {
    doc: Document,
    selection: Selection,
}

/// A `Document` wrapper that records snapshots and provides undo/redo.
///
/// All mutations go through [`UndoableDocument::transact`], which captures the
/// state before the edit when the edit reports a change.
#[derive(Debug, Clone)]
pub struct UndoableDocument {
    doc: Document,
    selection: Selection,
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_steps: usize,
    group_window: Duration,
    last_group: Option<(EditGroup, Instant)>,
}

impl Default for UndoableDocument {
    fn default() -> Self {
        Self::new(Document::default(), 100, Duration::from_millis(500))
    }
}

impl UndoableDocument {
    pub fn new(doc: Document, max_steps: usize, group_window: Duration) -> Self {
        let selection = doc.normalize_selection(Selection::default());
        Self {
            doc,
            selection,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_steps: max_steps.max(1),
            group_window,
            last_group: None,
        }
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Move the selection without touching history. Returns whether it moved.
    pub fn set_selection(&mut self, selection: Selection) -> bool {
        let selection = self.doc.normalize_selection(selection);
        let moved = selection != self.selection;
        self.selection = selection;
        if moved {
            // Typing somewhere else starts a new undo step.
            self.last_group = None;
        }
        moved
    }

    /// Run an edit. `edit` returns whether it changed the document; when it
    /// did, the prior state becomes an undo step (or merges into the
    /// previous one for a continuing `group`).
    pub fn transact(
        &mut self,
        group: Option<EditGroup>,
        edit: impl FnOnce(&mut Document, &mut Selection) -> bool,
    ) -> bool {
        self.transact_at(Instant::now(), group, edit)
    }

    pub(crate) fn transact_at(
        &mut self,
        now: Instant,
        group: Option<EditGroup>,
        edit: impl FnOnce(&mut Document, &mut Selection) -> bool,
    ) -> bool {
        let before = Snapshot {
            doc: self.doc.clone(),
            selection: self.selection,
        };
        let changed = edit(&mut self.doc, &mut self.selection);
        self.doc.ensure_leaf();
        self.selection = self.doc.normalize_selection(self.selection);
        if !changed {
            return false;
        }

        let continues = match (group, self.last_group) {
            (Some(group), Some((last, at))) => {
                group == last && now.saturating_duration_since(at) <= self.group_window
            }
            _ => false,
        };
        if !continues {
            self.undo_stack.push(before);
            // Trim if over max
            while self.undo_stack.len() > self.max_steps {
                self.undo_stack.remove(0);
            }
        }
        self.redo_stack.clear();
        self.last_group = group.map(|g| (g, now));
        true
    }

    fn restore(&mut self, snapshot: Snapshot) -> Snapshot {
        let current = Snapshot {
            doc: std::mem::replace(&mut self.doc, snapshot.doc),
            selection: self.selection,
        };
        self.selection = self.doc.normalize_selection(snapshot.selection);
        self.last_group = None;
        current
    }
}

impl UndoManager for UndoableDocument {
    fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        let current = self.restore(snapshot);
        self.redo_stack.push(current);
        true
    }

    fn redo(&mut self) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        let current = self.restore(snapshot);
        self.undo_stack.push(current);
        true
    }

    fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.last_group = None;
    }
}
