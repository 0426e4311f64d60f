//! prompt-editor-core: Pure Rust rich-text editor logic without framework
//! dependencies.
//!
//! This crate provides:
//! - `Document` - block tree with marked text runs, addressed by leaf positions
//! - `parse_html` / `to_html` - the HTML codec (the only persisted format)
//! - `EditorAction` and `execute_action` - editing commands with undo history
//! - `ActiveState` - which marks and block styles apply at the selection
//! - `Toolbar`, `BubbleMenu`, `DropdownState` - UI models for hosts to render
//! - `IngestPipeline` - dropped, pasted or picked files into image nodes
//! - `EditorShell` - one mounted editor, reporting changes as HTML

pub mod actions;
pub mod bubble;
pub mod config;
pub mod document;
pub mod dropdown;
pub mod editor;
pub mod error;
pub mod execute;
pub mod html;
pub mod image_view;
pub mod ingest;
pub mod link;
pub mod marks;
pub mod platform;
pub mod query;
pub mod shell;
pub mod toolbar;
pub mod transform;
pub mod types;
pub mod undo;
pub mod video;

pub use actions::{
    BlockStyle, EditorAction, InputType, Key, KeyCombo, KeydownResult, Modifiers, keybinding,
};
pub use bubble::BubbleMenu;
pub use config::{EditorConfig, Extension, IngestOrder};
pub use document::{Block, Document, ImageNode, TextAlign};
pub use dropdown::{DropdownState, Placement, Side, place_centered, place_panel};
pub use editor::{Editor, EditorDocument};
pub use error::{EditorError, IngestError, PlatformError, Result};
pub use execute::execute_action;
pub use html::{RenderOptions, parse_html, render_html, to_html};
pub use image_view::{ImageView, MIN_IMAGE_WIDTH, ResizeDrag};
pub use ingest::{FileMeta, IngestPipeline, IngestTicket, ReadyImage, data_url};
pub use link::{LinkInput, normalize_link};
pub use marks::{FormatFlags, Highlight, MarkSet, SimpleMark};
pub use platform::{CursorPlatform, CursorSync, EditorPlatform, SurfacePlatform};
pub use query::ActiveState;
pub use shell::EditorShell;
pub use smol_str::SmolStr;
pub use toolbar::{Toolbar, ToolbarCommand, ToolbarControl, ToolbarItem, ToolbarOutcome};
pub use types::{Position, Rect, Selection, Size};
pub use undo::{EditGroup, UndoManager, UndoableDocument};
