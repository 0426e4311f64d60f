//! Browser DOM layer for the prompt editor.
//!
//! This crate binds an [`EditorShell`] to a contenteditable element: it maps
//! DOM selections to document positions, turns `beforeinput` and keyboard
//! events into editor actions, reads dropped and pasted files, and measures
//! dropdown panels and resize drags. It assumes a `wasm32-unknown-unknown`
//! target environment.
//!
//! # Architecture
//!
//! - `dom_sync`: DOM ↔ document position mapping and surface rendering
//! - `events`: beforeinput, composition and keydown handlers
//! - `files`: file lists from drops, pastes and pickers, and async reads
//! - `popover`: dropdown measurement, placement and outside-click dismissal
//! - `resize`: pointer tracking for image resize handles
//! - `platform`: Browser/OS detection for platform-specific behavior
//!
//! # Re-exports
//!
//! This crate re-exports `prompt-editor-core` for convenience, so consumers
//! only need to depend on `prompt-editor-browser`.

pub use prompt_editor_core;
pub use prompt_editor_core::*;

pub mod dom_sync;
pub mod events;
pub mod files;
pub mod platform;
pub mod popover;
pub mod resize;

pub use dom_sync::{BrowserSurface, dom_to_position, position_to_dom};
pub use events::{
    BeforeInputContext, BeforeInputResult, handle_beforeinput, handle_composition_end,
    handle_keydown, key_combo_from_event, parse_browser_input_type,
};
pub use files::{file_meta, files_from_data_transfer, files_from_list, pair_tickets, spawn_reads};
pub use platform::{Platform, platform};
pub use popover::{OutsideClick, apply_placement, measure, toggle_dropdown};
pub use resize::ResizeSession;
