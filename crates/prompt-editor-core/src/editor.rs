//! Core editor document trait and implementation.
//!
//! Defines the `EditorDocument` trait for abstracting editor state, so the
//! command and query logic can run against plain fields or a host's own
//! reactive storage.

use std::time::Duration;

use crate::config::EditorConfig;
use crate::document::Document;
use crate::error::Result;
use crate::html::{RenderOptions, parse_html, render_html, to_html};
use crate::marks::MarkSet;
use crate::types::Selection;
use crate::undo::{EditGroup, UndoManager, UndoableDocument};

/// Core trait for editor documents.
///
/// Implementors provide storage for the undoable document, the pending
/// (stored) marks and the configuration; everything else is provided.
pub trait EditorDocument {
    // === Required: state access ===

    fn buffer(&self) -> &UndoableDocument;

    fn buffer_mut(&mut self) -> &mut UndoableDocument;

    fn config(&self) -> &EditorConfig;

    /// Marks the next typed text will carry, set by toggling a mark with a
    /// collapsed selection.
    fn stored_marks(&self) -> Option<&MarkSet>;

    fn set_stored_marks(&mut self, marks: Option<MarkSet>);

    // === Provided: convenience accessors ===

    fn doc(&self) -> &Document {
        self.buffer().doc()
    }

    fn selection(&self) -> Selection {
        self.buffer().selection()
    }

    /// Move the selection. Pending marks only survive while the cursor stays
    /// put.
    fn set_selection(&mut self, selection: Selection) -> bool {
        let moved = self.buffer_mut().set_selection(selection);
        if moved {
            self.set_stored_marks(None);
        }
        moved
    }

    /// Run an edit through history. See [`UndoableDocument::transact`].
    fn transact(
        &mut self,
        group: Option<EditGroup>,
        edit: impl FnOnce(&mut Document, &mut Selection) -> bool,
    ) -> bool
    where
        Self: Sized,
    {
        self.buffer_mut().transact(group, edit)
    }

    fn content_html(&self) -> String {
        to_html(self.doc())
    }

    /// Markup for the live editing surface.
    fn editing_html(&self) -> String {
        let selected = self.doc().selected_node(&self.selection());
        render_html(self.doc(), RenderOptions::editing(selected))
    }

    // === Provided: Undo/Redo ===

    fn undo(&mut self) -> bool {
        self.set_stored_marks(None);
        self.buffer_mut().undo()
    }

    fn redo(&mut self) -> bool {
        self.set_stored_marks(None);
        self.buffer_mut().redo()
    }

    fn can_undo(&self) -> bool {
        self.buffer().can_undo()
    }

    fn can_redo(&self) -> bool {
        self.buffer().can_redo()
    }

    fn clear_history(&mut self) {
        self.buffer_mut().clear_history();
    }
}

/// Simple field-based implementation of `EditorDocument`.
#[derive(Debug, Clone)]
pub struct Editor {
    buffer: UndoableDocument,
    stored_marks: Option<MarkSet>,
    config: EditorConfig,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(Document::default(), EditorConfig::default())
    }
}

impl Editor {
    pub fn new(doc: Document, config: EditorConfig) -> Self {
        let buffer = UndoableDocument::new(
            doc,
            config.history_depth,
            Duration::from_millis(config.history_group_ms),
        );
        Self {
            buffer,
            stored_marks: None,
            config,
        }
    }

    /// Validate `config` and seed the document from `html` (which may be empty).
    pub fn from_html(html: &str, config: EditorConfig) -> Result<Self> {
        config.validate()?;
        let doc = parse_html(html, &config);
        Ok(Self::new(doc, config))
    }
}

impl EditorDocument for Editor {
    fn buffer(&self) -> &UndoableDocument {
        &self.buffer
    }

    fn buffer_mut(&mut self) -> &mut UndoableDocument {
        &mut self.buffer
    }

    fn config(&self) -> &EditorConfig {
        &self.config
    }

    fn stored_marks(&self) -> Option<&MarkSet> {
        self.stored_marks.as_ref()
    }

    fn set_stored_marks(&mut self, marks: Option<MarkSet>) {
        self.stored_marks = marks;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EditorError;
    use crate::types::Position;

    #[test]
    fn test_from_html_seeds_document() {
        let editor = Editor::from_html("<p>hi</p>", EditorConfig::default()).unwrap();
        assert_eq!(editor.content_html(), "<p>hi</p>");
        assert_eq!(editor.selection(), Selection::collapsed(Position::new(0, 0)));
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_from_html_rejects_bad_config() {
        let config = EditorConfig {
            heading_levels: vec![4],
            ..Default::default()
        };
        let err = Editor::from_html("", config).unwrap_err();
        assert_eq!(err, EditorError::InvalidHeadingLevel(4));
    }

    #[test]
    fn test_selection_change_drops_stored_marks() {
        let mut editor = Editor::from_html("<p>abc</p>", EditorConfig::default()).unwrap();
        editor.set_stored_marks(Some(MarkSet::default()));
        // Same place: marks stay.
        editor.set_selection(Selection::collapsed(Position::new(0, 0)));
        assert!(editor.stored_marks().is_some());

        editor.set_selection(Selection::collapsed(Position::new(0, 2)));
        assert!(editor.stored_marks().is_none());
    }
}
