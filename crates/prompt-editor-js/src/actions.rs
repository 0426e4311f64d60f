//! EditorAction conversion for JavaScript.

use prompt_editor_core::{
    BlockStyle, EditorAction, Position, Selection, SimpleMark, SmolStr, TextAlign,
};
use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

/// A document position as `{ leaf, offset }`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct JsPosition {
    pub leaf: usize,
    pub offset: usize,
}

impl From<JsPosition> for Position {
    fn from(p: JsPosition) -> Self {
        Position::new(p.leaf, p.offset)
    }
}

/// JavaScript-friendly editor action.
///
/// Mirrors EditorAction from core, tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum JsEditorAction {
    // Text
    InsertText { text: String },
    InsertParagraph,
    InsertHardBreak,
    DeleteBackward,
    DeleteForward,

    // History
    Undo,
    Redo,

    // Selection
    SetSelection { anchor: JsPosition, head: JsPosition },
    SelectAll,
    SelectNode { leaf: usize },

    // Marks
    ToggleMark {
        #[tsify(type = "\"bold\" | \"italic\" | \"underline\" | \"strike\" | \"code\"")]
        mark: SimpleMark,
    },
    SetColor { color: Option<String> },
    SetHighlight { color: Option<String> },
    ToggleHighlight { color: Option<String> },
    SetFontFamily { family: Option<String> },
    SetFontSize { size: Option<String> },
    SetLink { href: Option<String> },
    UnsetLink,
    ClearFormatting,

    // Blocks
    SetBlockStyle {
        #[tsify(type = "{ type: \"paragraph\" | \"heading\" | \"quote\" | \"code\"; level?: number }")]
        style: BlockStyle,
    },
    SetTextAlign {
        #[tsify(type = "\"left\" | \"center\" | \"right\" | \"justify\" | null")]
        align: Option<TextAlign>,
    },
    ToggleBulletList,
    ToggleCodeBlock,
    InsertHorizontalRule,
    InsertTable { rows: usize, cols: usize, header: bool },

    // Embeds
    InsertImage { src: String, width: Option<u32> },
    SetImageWidth { leaf: usize, width: u32 },
    InsertVideo { url: String },
}

impl From<JsEditorAction> for EditorAction {
    fn from(action: JsEditorAction) -> Self {
        let smol = |s: Option<String>| s.map(SmolStr::from);
        match action {
            JsEditorAction::InsertText { text } => EditorAction::InsertText(text),
            JsEditorAction::InsertParagraph => EditorAction::InsertParagraph,
            JsEditorAction::InsertHardBreak => EditorAction::InsertHardBreak,
            JsEditorAction::DeleteBackward => EditorAction::DeleteBackward,
            JsEditorAction::DeleteForward => EditorAction::DeleteForward,

            JsEditorAction::Undo => EditorAction::Undo,
            JsEditorAction::Redo => EditorAction::Redo,

            JsEditorAction::SetSelection { anchor, head } => {
                EditorAction::SetSelection(Selection::new(anchor.into(), head.into()))
            }
            JsEditorAction::SelectAll => EditorAction::SelectAll,
            JsEditorAction::SelectNode { leaf } => EditorAction::SelectNode(leaf),

            JsEditorAction::ToggleMark { mark } => EditorAction::ToggleMark(mark),
            JsEditorAction::SetColor { color } => EditorAction::SetColor(smol(color)),
            JsEditorAction::SetHighlight { color } => EditorAction::SetHighlight(smol(color)),
            JsEditorAction::ToggleHighlight { color } => {
                EditorAction::ToggleHighlight(smol(color))
            }
            JsEditorAction::SetFontFamily { family } => EditorAction::SetFontFamily(smol(family)),
            JsEditorAction::SetFontSize { size } => EditorAction::SetFontSize(smol(size)),
            JsEditorAction::SetLink { href } => EditorAction::SetLink(href),
            JsEditorAction::UnsetLink => EditorAction::UnsetLink,
            JsEditorAction::ClearFormatting => EditorAction::ClearFormatting,

            JsEditorAction::SetBlockStyle { style } => EditorAction::SetBlockStyle(style),
            JsEditorAction::SetTextAlign { align } => EditorAction::SetTextAlign(align),
            JsEditorAction::ToggleBulletList => EditorAction::ToggleBulletList,
            JsEditorAction::ToggleCodeBlock => EditorAction::ToggleCodeBlock,
            JsEditorAction::InsertHorizontalRule => EditorAction::InsertHorizontalRule,
            JsEditorAction::InsertTable { rows, cols, header } => {
                EditorAction::InsertTable { rows, cols, header }
            }

            JsEditorAction::InsertImage { src, width } => EditorAction::InsertImage {
                src: src.into(),
                width,
                at: None,
            },
            JsEditorAction::SetImageWidth { leaf, width } => {
                EditorAction::SetImageWidth { leaf, width }
            }
            JsEditorAction::InsertVideo { url } => EditorAction::InsertVideo(url),
        }
    }
}

/// Parse a JsValue into an EditorAction.
pub fn parse_action(value: JsValue) -> Result<EditorAction, JsError> {
    let action: JsEditorAction = serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsError::new(&format!("Invalid action: {}", e)))?;
    Ok(action.into())
}
