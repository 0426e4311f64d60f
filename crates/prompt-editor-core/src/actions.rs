//! Editor actions, input types and keybindings.
//!
//! Platform-agnostic definitions for editor operations. The `EditorAction` enum
//! represents semantic editing operations, while `InputType` represents the
//! semantic intent from input events (browser beforeinput, native input methods, etc.).

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::document::TextAlign;
use crate::marks::SimpleMark;
use crate::types::{Position, Selection};

/// Block style shown in the block-style picker and reported as active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "level")]
pub enum BlockStyle {
    #[default]
    Paragraph,
    Heading(u8),
    Quote,
    Code,
}

/// Semantic input types from input events.
///
/// These represent the semantic intent of an input operation, abstracted from
/// the platform-specific event source. Based on the W3C Input Events
/// specification, trimmed to what a rich-text surface acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputType {
    // === Insertion ===
    /// Insert typed text.
    InsertText,
    /// Insert text from IME composition.
    InsertCompositionText,
    /// Insert a line break (`<br>`, Shift+Enter).
    InsertLineBreak,
    /// Insert a paragraph break (Enter).
    InsertParagraph,
    /// Insert from paste operation.
    InsertFromPaste,
    /// Insert from drop operation.
    InsertFromDrop,
    /// Insert replacement text (e.g., spell check correction).
    InsertReplacementText,

    // === Deletion ===
    /// Delete content backward (Backspace).
    DeleteContentBackward,
    /// Delete content forward (Delete key).
    DeleteContentForward,
    /// Delete by cut operation.
    DeleteByCut,
    /// Delete by drag operation.
    DeleteByDrag,
    /// Generic content deletion.
    DeleteContent,

    // === History ===
    HistoryUndo,
    HistoryRedo,

    // === Formatting ===
    FormatBold,
    FormatItalic,
    FormatUnderline,
    FormatStrikethrough,

    /// Unrecognized input type.
    Unknown(String),
}

impl InputType {
    /// The action this input maps to when it needs no payload beyond the
    /// current selection.
    pub fn to_action(&self) -> Option<EditorAction> {
        let action = match self {
            Self::InsertLineBreak => EditorAction::InsertHardBreak,
            Self::InsertParagraph => EditorAction::InsertParagraph,
            Self::DeleteContentBackward | Self::DeleteContent => EditorAction::DeleteBackward,
            Self::DeleteContentForward => EditorAction::DeleteForward,
            Self::DeleteByCut | Self::DeleteByDrag => EditorAction::DeleteBackward,
            Self::HistoryUndo => EditorAction::Undo,
            Self::HistoryRedo => EditorAction::Redo,
            Self::FormatBold => EditorAction::ToggleMark(SimpleMark::Bold),
            Self::FormatItalic => EditorAction::ToggleMark(SimpleMark::Italic),
            Self::FormatUnderline => EditorAction::ToggleMark(SimpleMark::Underline),
            Self::FormatStrikethrough => EditorAction::ToggleMark(SimpleMark::Strike),
            _ => return None,
        };
        Some(action)
    }
}

/// All possible editor actions.
///
/// These represent semantic operations on the document, decoupled from
/// how they're triggered (toolbar, bubble menu, keyboard, drop, etc.).
/// Actions act on the current selection unless they carry a position.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    // === Text input ===
    /// Insert text, replacing any selected content.
    InsertText(String),

    /// Split the current block (Enter).
    InsertParagraph,

    /// Insert a hard line break (Shift+Enter, `<br>`).
    InsertHardBreak,

    /// Delete content backward (Backspace).
    DeleteBackward,

    /// Delete content forward (Delete key).
    DeleteForward,

    // === History ===
    Undo,
    Redo,

    // === Selection ===
    SetSelection(Selection),
    SelectAll,
    /// Select an atom (image, rule, video) as a node.
    SelectNode(usize),

    // === Marks ===
    ToggleMark(SimpleMark),
    /// Set or (with `None`) remove the text color.
    SetColor(Option<SmolStr>),
    /// Set or (with `None`) remove the highlight.
    SetHighlight(Option<SmolStr>),
    /// Add the highlight unless the selection already has exactly it.
    ToggleHighlight(Option<SmolStr>),
    SetFontFamily(Option<SmolStr>),
    SetFontSize(Option<SmolStr>),
    /// Apply a link from raw user input. `None` means the prompt was
    /// cancelled; empty input removes the link.
    SetLink(Option<String>),
    UnsetLink,
    /// Remove every mark from the selection and reset blocks to paragraphs.
    ClearFormatting,

    // === Blocks ===
    SetBlockStyle(BlockStyle),
    SetTextAlign(Option<TextAlign>),
    ToggleBulletList,
    ToggleCodeBlock,
    InsertHorizontalRule,
    InsertTable {
        rows: usize,
        cols: usize,
        header: bool,
    },

    // === Embeds ===
    /// Insert an image at `at`, or replace the selection when `at` is `None`.
    InsertImage {
        src: SmolStr,
        width: Option<u32>,
        at: Option<Position>,
    },
    /// Resize the image at `leaf`; widths below the minimum are clamped.
    SetImageWidth { leaf: usize, width: u32 },
    /// Embed a YouTube video from a watch or share URL.
    InsertVideo(String),
}

impl EditorAction {
    /// Whether this action only moves the selection.
    pub fn is_selection_only(&self) -> bool {
        matches!(
            self,
            Self::SetSelection(_) | Self::SelectAll | Self::SelectNode(_)
        )
    }
}

/// Key values for keyboard input.
///
/// Platform-agnostic key representation. Platform-specific code converts
/// from native key events to this enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),

    /// Unknown/unidentified key.
    Unidentified,

    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,

    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,
}

impl Key {
    /// Create a character key.
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    /// Convert a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Backspace" => Self::Backspace,
            "Delete" => Self::Delete,
            "Enter" => Self::Enter,
            "Tab" => Self::Tab,
            "Escape" => Self::Escape,
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            "ArrowUp" => Self::ArrowUp,
            "ArrowDown" => Self::ArrowDown,
            "Home" => Self::Home,
            "End" => Self::End,
            "PageUp" => Self::PageUp,
            "PageDown" => Self::PageDown,
            s if s.chars().count() == 1 => Self::Character(SmolStr::new(s.to_lowercase())),
            _ => Self::Unidentified,
        }
    }

    /// Check if this is a navigation key.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::ArrowLeft
                | Self::ArrowRight
                | Self::ArrowUp
                | Self::ArrowDown
                | Self::Home
                | Self::End
                | Self::PageUp
                | Self::PageDown
        )
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        ctrl: false,
        alt: false,
        shift: true,
        meta: false,
    };

    /// Whether the platform's primary modifier (Cmd on Mac, Ctrl elsewhere)
    /// is held.
    pub fn primary(&self, is_mac: bool) -> bool {
        if is_mac { self.meta } else { self.ctrl }
    }
}

/// A key combination for triggering an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, PartialEq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not a keybinding, let platform handle it.
    NotHandled,
    /// Event should be passed through (navigation, etc.).
    PassThrough,
}

/// Map a key combination to the action bound to it.
///
/// Bindings use the primary modifier (`Mod`): bold `Mod-b`, italic `Mod-i`,
/// underline `Mod-u`, strike `Mod-Shift-s`, code `Mod-e`, highlight
/// `Mod-Shift-h`, alignment `Mod-Shift-l/e/r/j`, bullet list `Mod-Shift-8`,
/// blockquote `Mod-Shift-b`, code block `Mod-Alt-c`, paragraph and headings
/// `Mod-Alt-0..3`, undo `Mod-z`, redo `Mod-Shift-z` / `Mod-y`, select all
/// `Mod-a`, hard break `Shift-Enter`.
pub fn keybinding(combo: &KeyCombo, is_mac: bool) -> Option<EditorAction> {
    let m = combo.modifiers;
    if !m.primary(is_mac) {
        return match (&combo.key, m.shift, m.alt) {
            (Key::Enter, true, false) => Some(EditorAction::InsertHardBreak),
            _ => None,
        };
    }
    let Key::Character(c) = &combo.key else {
        return None;
    };
    let action = match (c.as_str(), m.shift, m.alt) {
        ("b", false, false) => EditorAction::ToggleMark(SimpleMark::Bold),
        ("i", false, false) => EditorAction::ToggleMark(SimpleMark::Italic),
        ("u", false, false) => EditorAction::ToggleMark(SimpleMark::Underline),
        ("s", true, false) => EditorAction::ToggleMark(SimpleMark::Strike),
        ("e", false, false) => EditorAction::ToggleMark(SimpleMark::Code),
        ("h", true, false) => EditorAction::ToggleHighlight(None),
        ("l", true, false) => EditorAction::SetTextAlign(Some(TextAlign::Left)),
        ("e", true, false) => EditorAction::SetTextAlign(Some(TextAlign::Center)),
        ("r", true, false) => EditorAction::SetTextAlign(Some(TextAlign::Right)),
        ("j", true, false) => EditorAction::SetTextAlign(Some(TextAlign::Justify)),
        // Shift-8 reports `*` on US layouts.
        ("8" | "*", true, false) => EditorAction::ToggleBulletList,
        ("b", true, false) => EditorAction::SetBlockStyle(BlockStyle::Quote),
        ("c", false, true) => EditorAction::ToggleCodeBlock,
        ("0", false, true) => EditorAction::SetBlockStyle(BlockStyle::Paragraph),
        ("1", false, true) => EditorAction::SetBlockStyle(BlockStyle::Heading(1)),
        ("2", false, true) => EditorAction::SetBlockStyle(BlockStyle::Heading(2)),
        ("3", false, true) => EditorAction::SetBlockStyle(BlockStyle::Heading(3)),
        ("z", false, false) => EditorAction::Undo,
        ("z", true, false) | ("y", false, false) => EditorAction::Redo,
        ("a", false, false) => EditorAction::SelectAll,
        _ => return None,
    };
    Some(action)
}
