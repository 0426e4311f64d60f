//! Types exposed to JavaScript via wasm-bindgen.

use prompt_editor_core::{
    ActiveState, BlockStyle, BubbleMenu, Placement, SimpleMark, Side, SmolStr, TextAlign, toolbar,
};
use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

/// Formatting in effect at the selection, flattened for toolbar rendering.
#[derive(Debug, Clone, Serialize, Tsify)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct JsActiveState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub code: bool,
    #[tsify(type = "{ type: \"paragraph\" | \"heading\" | \"quote\" | \"code\"; level?: number }")]
    pub block: BlockStyle,
    /// Label the block-style picker shows ("Paragraph", "Heading 2", ...).
    pub block_label: String,
    #[tsify(type = "\"left\" | \"center\" | \"right\" | \"justify\" | null")]
    pub align: Option<TextAlign>,
    pub bullet_list: bool,
    pub code_block: bool,
    pub link: Option<String>,
    pub color: Option<String>,
    pub highlighted: bool,
    pub highlight_color: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<String>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub selected_image: Option<usize>,
    pub has_text_selection: bool,
}

impl From<&ActiveState> for JsActiveState {
    fn from(state: &ActiveState) -> Self {
        let owned = |s: &Option<SmolStr>| s.as_ref().map(|v| v.to_string());
        Self {
            bold: state.has(SimpleMark::Bold),
            italic: state.has(SimpleMark::Italic),
            underline: state.has(SimpleMark::Underline),
            strike: state.has(SimpleMark::Strike),
            code: state.has(SimpleMark::Code),
            block: state.block,
            block_label: toolbar::block_label(state.block).to_string(),
            align: state.align,
            bullet_list: state.bullet_list,
            code_block: state.code_block,
            link: owned(&state.link),
            color: owned(&state.color),
            highlighted: state.highlight.is_some(),
            highlight_color: state.highlight.as_ref().and_then(|h| owned(&h.color)),
            font_family: owned(&state.font_family),
            font_size: owned(&state.font_size),
            can_undo: state.can_undo,
            can_redo: state.can_redo,
            selected_image: state.selected_image,
            has_text_selection: state.has_text_selection,
        }
    }
}

/// Where to put a floating panel, in viewport pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct JsPlacement {
    pub top: f64,
    pub left: f64,
    pub max_height: f64,
    pub max_width: f64,
    pub min_width: f64,
    /// Whether the panel opened above its anchor.
    pub above: bool,
}

impl From<&Placement> for JsPlacement {
    fn from(p: &Placement) -> Self {
        Self {
            top: p.top,
            left: p.left,
            max_height: p.max_height,
            max_width: p.max_width,
            min_width: p.min_width,
            above: p.side == Side::Above,
        }
    }
}

/// Bubble menu mode.
#[derive(Debug, Clone, Serialize, Tsify)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct JsBubbleState {
    pub visible: bool,
    pub editing_link: bool,
    pub draft: Option<String>,
}

impl From<&BubbleMenu> for JsBubbleState {
    fn from(menu: &BubbleMenu) -> Self {
        Self {
            visible: menu.is_visible(),
            editing_link: menu.is_editing_link(),
            draft: menu.draft().map(str::to_string),
        }
    }
}

/// Serialize any value for return to JS.
pub(crate) fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}
