//! Browser event handling for the editor.
//!
//! Provides browser-specific event extraction and input type parsing for
//! the `beforeinput` event and keyboard shortcuts. Every edit goes through
//! the shell; the browser's own DOM mutation is prevented and the surface is
//! re-rendered from the document.

use prompt_editor_core::{
    EditorAction, EditorShell, InputType, Key, KeyCombo, KeydownResult, Modifiers, Selection,
    keybinding,
};
use wasm_bindgen::prelude::*;

use crate::dom_sync::dom_to_position;
use crate::platform::Platform;

// === StaticRange binding ===
//
// Custom wasm_bindgen binding for StaticRange since web-sys doesn't expose it.
// StaticRange is returned by InputEvent.getTargetRanges() and represents
// a fixed range that doesn't update when the DOM changes.

#[wasm_bindgen]
extern "C" {
    /// The StaticRange interface represents a static range of text in the DOM.
    pub type StaticRange;

    #[wasm_bindgen(method, getter, structural)]
    pub fn startContainer(this: &StaticRange) -> web_sys::Node;

    #[wasm_bindgen(method, getter, structural)]
    pub fn startOffset(this: &StaticRange) -> u32;

    #[wasm_bindgen(method, getter, structural)]
    pub fn endContainer(this: &StaticRange) -> web_sys::Node;

    #[wasm_bindgen(method, getter, structural)]
    pub fn endOffset(this: &StaticRange) -> u32;
}

// === InputType browser parsing ===

/// Parse a browser inputType string to an InputType enum.
///
/// This handles the W3C Input Events inputType values as returned by
/// `InputEvent.inputType` in browsers.
pub fn parse_browser_input_type(s: &str) -> InputType {
    match s {
        // Insertion
        "insertText" => InputType::InsertText,
        "insertCompositionText" => InputType::InsertCompositionText,
        "insertLineBreak" => InputType::InsertLineBreak,
        "insertParagraph" => InputType::InsertParagraph,
        "insertFromPaste" => InputType::InsertFromPaste,
        "insertFromDrop" => InputType::InsertFromDrop,
        "insertReplacementText" => InputType::InsertReplacementText,

        // Deletion
        "deleteContentBackward" => InputType::DeleteContentBackward,
        "deleteContentForward" => InputType::DeleteContentForward,
        "deleteByCut" => InputType::DeleteByCut,
        "deleteByDrag" => InputType::DeleteByDrag,
        "deleteContent" => InputType::DeleteContent,

        // History
        "historyUndo" => InputType::HistoryUndo,
        "historyRedo" => InputType::HistoryRedo,

        // Formatting
        "formatBold" => InputType::FormatBold,
        "formatItalic" => InputType::FormatItalic,
        "formatUnderline" => InputType::FormatUnderline,
        "formatStrikeThrough" => InputType::FormatStrikethrough,

        // Unknown
        other => InputType::Unknown(other.to_string()),
    }
}

// === BeforeInput event handling ===

/// Result of handling a beforeinput event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeforeInputResult {
    /// Event was handled, prevent default browser behavior.
    Handled,
    /// Event should be handled by browser (e.g., during composition).
    PassThrough,
}

/// Context for beforeinput handling.
pub struct BeforeInputContext {
    /// The input type.
    pub input_type: InputType,
    /// The data (text to insert, if any).
    pub data: Option<String>,
    /// Target range from getTargetRanges(), if available.
    /// This is the range the browser wants to modify.
    pub target: Option<Selection>,
    /// Whether the event is part of an IME composition.
    pub is_composing: bool,
}

/// Extract the target range from a beforeinput event as document positions.
pub fn get_target_range_from_event(
    event: &web_sys::InputEvent,
    root: &web_sys::Element,
) -> Option<Selection> {
    use wasm_bindgen::JsCast;

    let ranges = event.get_target_ranges();
    if ranges.length() == 0 {
        return None;
    }
    let static_range: StaticRange = ranges.get(0).unchecked_into();

    let start = dom_to_position(
        root,
        &static_range.startContainer(),
        static_range.startOffset() as usize,
    )?;
    let end = dom_to_position(
        root,
        &static_range.endContainer(),
        static_range.endOffset() as usize,
    )?;
    Some(Selection::new(start, end))
}

/// Get data from a beforeinput event, handling different sources.
pub fn get_data_from_event(event: &web_sys::InputEvent) -> Option<String> {
    // First try the data property.
    if let Some(data) = event.data() {
        if !data.is_empty() {
            return Some(data);
        }
    }

    // For paste/drop, try dataTransfer.
    if let Some(data_transfer) = event.data_transfer() {
        if let Ok(text) = data_transfer.get_data("text/plain") {
            if !text.is_empty() {
                return Some(text);
            }
        }
    }

    None
}

/// Get input type from a beforeinput event.
pub fn get_input_type_from_event(event: &web_sys::InputEvent) -> InputType {
    parse_browser_input_type(&event.input_type())
}

/// Handle a beforeinput event, dispatching to the appropriate action.
///
/// Returns whether default should be prevented.
pub fn handle_beforeinput(shell: &mut EditorShell, ctx: &BeforeInputContext) -> BeforeInputResult {
    // During composition, let the browser handle most things; the composed
    // text arrives through `handle_composition_end`.
    if ctx.is_composing
        && !matches!(ctx.input_type, InputType::HistoryUndo | InputType::HistoryRedo)
    {
        return BeforeInputResult::PassThrough;
    }

    if let Some(target) = ctx.target {
        if target != shell.selection() {
            shell.run(&EditorAction::SetSelection(target));
        }
    }

    match &ctx.input_type {
        InputType::InsertText | InputType::InsertFromPaste | InputType::InsertReplacementText => {
            if let Some(text) = &ctx.data {
                shell.run(&EditorAction::InsertText(text.clone()));
            }
            BeforeInputResult::Handled
        }

        // File drops go through the drop handler; dragged text is not moved.
        InputType::InsertFromDrop => BeforeInputResult::Handled,

        InputType::InsertCompositionText => BeforeInputResult::PassThrough,

        InputType::DeleteByCut | InputType::DeleteByDrag | InputType::DeleteContent => {
            if !shell.selection().is_collapsed() {
                shell.run(&EditorAction::DeleteBackward);
            }
            BeforeInputResult::Handled
        }

        InputType::Unknown(name) => {
            tracing::debug!(input_type = %name, "unhandled beforeinput type");
            BeforeInputResult::PassThrough
        }

        other => {
            if let Some(action) = other.to_action() {
                shell.run(&action);
            }
            BeforeInputResult::Handled
        }
    }
}

/// Insert the text an IME composition produced.
pub fn handle_composition_end(shell: &mut EditorShell, data: Option<String>) -> bool {
    match data {
        Some(text) if !text.is_empty() => shell.run(&EditorAction::InsertText(text)),
        _ => false,
    }
}

// === Keyboard ===

/// Build a key combination from a keyboard event.
pub fn key_combo_from_event(event: &web_sys::KeyboardEvent) -> KeyCombo {
    KeyCombo::with_modifiers(
        Key::from_dom(&event.key()),
        Modifiers {
            ctrl: event.ctrl_key(),
            alt: event.alt_key(),
            shift: event.shift_key(),
            meta: event.meta_key(),
        },
    )
}

/// Run the shortcut bound to `combo`, if any.
pub fn handle_keydown(shell: &mut EditorShell, combo: &KeyCombo, platform: &Platform) -> KeydownResult {
    if let Some(action) = keybinding(combo, platform.mac) {
        tracing::trace!(?combo, ?action, "keybinding");
        shell.run(&action);
        return KeydownResult::Handled;
    }
    if combo.key.is_navigation() {
        KeydownResult::PassThrough
    } else {
        KeydownResult::NotHandled
    }
}
