//! The editor shell: one mounted editor, its change notifications, pending
//! image reads and resize drag.
//!
//! Hosts talk to the editor only through the shell. Every content change is
//! reported to the `on_change` callback as serialized HTML.

use bytes::Bytes;
use tracing::{debug, warn};

use crate::actions::EditorAction;
use crate::config::EditorConfig;
use crate::document::Block;
use crate::editor::{Editor, EditorDocument};
use crate::error::{IngestError, Result};
use crate::execute::execute_action;
use crate::image_view::ResizeDrag;
use crate::ingest::{FileMeta, IngestPipeline, IngestTicket};
use crate::query::ActiveState;
use crate::types::{Position, Selection};

pub struct EditorShell {
    editor: Editor,
    ingest: IngestPipeline,
    on_change: Box<dyn FnMut(&str)>,
    last_html: String,
    focus_requested: bool,
    resize: Option<ResizeDrag>,
}

impl std::fmt::Debug for EditorShell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorShell")
            .field("editor", &self.editor)
            .field("ingest", &self.ingest)
            .field("focus_requested", &self.focus_requested)
            .field("resize", &self.resize)
            .finish_non_exhaustive()
    }
}

impl EditorShell {
    /// Mount an editor, or `None` when the configuration is unusable. The
    /// reason is logged; callers treat a missing editor as not ready yet.
    pub fn mount(
        config: EditorConfig,
        initial_html: &str,
        on_change: impl FnMut(&str) + 'static,
    ) -> Option<Self> {
        match Self::try_mount(config, initial_html, on_change) {
            Ok(shell) => Some(shell),
            Err(err) => {
                warn!(%err, "editor failed to initialize");
                None
            }
        }
    }

    pub fn try_mount(
        config: EditorConfig,
        initial_html: &str,
        on_change: impl FnMut(&str) + 'static,
    ) -> Result<Self> {
        let ingest = IngestPipeline::new(config.ingest_order);
        let editor = Editor::from_html(initial_html, config)?;
        let last_html = editor.content_html();
        debug!(epoch = ingest.epoch(), "editor mounted");
        Ok(Self {
            editor,
            ingest,
            on_change: Box::new(on_change),
            last_html,
            focus_requested: false,
            resize: None,
        })
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn config(&self) -> &EditorConfig {
        self.editor.config()
    }

    pub fn selection(&self) -> Selection {
        self.editor.selection()
    }

    pub fn active_state(&self) -> ActiveState {
        ActiveState::query(&self.editor)
    }

    /// Execute an action. Commands (anything beyond moving the selection)
    /// ask for editing focus back.
    pub fn run(&mut self, action: &EditorAction) -> bool {
        let applied = execute_action(&mut self.editor, action);
        if !action.is_selection_only() {
            self.focus_requested = true;
        }
        if applied {
            self.emit_if_changed();
        }
        applied
    }

    fn emit_if_changed(&mut self) {
        let html = self.editor.content_html();
        if html != self.last_html {
            (self.on_change)(&html);
            self.last_html = html;
        }
    }

    /// Whether the host should focus the editing surface; resets the request.
    pub fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.focus_requested)
    }

    /// Serialized content, as last reported to `on_change`.
    pub fn html(&self) -> &str {
        &self.last_html
    }

    pub fn editing_html(&self) -> String {
        self.editor.editing_html()
    }

    // === Image ingestion ===

    /// Start reading a batch of files dropped at `target`, pasted or picked
    /// (`None`: insert at the selection).
    pub fn ingest_begin(&mut self, files: Vec<FileMeta>, target: Option<Position>) -> Vec<IngestTicket> {
        self.ingest.begin(files, target)
    }

    /// A read finished. Returns how many images went into the document.
    pub fn ingest_complete(
        &mut self,
        ticket: &IngestTicket,
        result: std::result::Result<Bytes, IngestError>,
    ) -> usize {
        let ready = self.ingest.complete(ticket, result);
        let mut inserted = 0;
        for image in ready {
            let action = EditorAction::InsertImage {
                src: image.src,
                width: None,
                at: image.at,
            };
            if execute_action(&mut self.editor, &action) {
                inserted += 1;
            }
        }
        if inserted > 0 {
            self.emit_if_changed();
        }
        inserted
    }

    // === Image resize ===

    /// Press the resize handle of the image at `leaf`, selecting it.
    pub fn begin_resize(&mut self, leaf: usize, rendered_width: f64, pointer_x: f64) -> bool {
        if !matches!(self.editor.doc().leaf(leaf), Some(Block::Image(_))) {
            return false;
        }
        self.editor.set_selection(Selection::node(leaf));
        self.resize = Some(ResizeDrag::begin(leaf, rendered_width, pointer_x));
        true
    }

    /// Pointer moved during a drag; the width applies immediately.
    pub fn update_resize(&mut self, pointer_x: f64) -> Option<u32> {
        let drag = self.resize.as_mut()?;
        let width = drag.update(pointer_x);
        let leaf = drag.leaf;
        self.run(&EditorAction::SetImageWidth { leaf, width });
        Some(width)
    }

    /// Pointer released: the last live width stands.
    pub fn end_resize(&mut self) -> Option<u32> {
        let drag = self.resize.take()?;
        Some(drag.end())
    }

    pub fn is_resizing(&self) -> bool {
        self.resize.is_some()
    }

    /// Tear the editor down. Reads still in flight are discarded when they
    /// complete.
    pub fn unmount(mut self) {
        self.ingest.cancel();
        debug!("editor unmounted");
    }
}
