//! WASM bindings for the prompt editor.
//!
//! Provides an embeddable rich-text editor for JavaScript/TypeScript apps:
//! [`JsEditor`] mounts a contenteditable surface and reports content as
//! HTML, and [`JsDropdown`] drives the toolbar's picker panels.

mod actions;
mod dropdown;
mod editor;
mod events;
mod types;

pub use actions::*;
pub use dropdown::*;
pub use editor::*;
pub use types::*;

use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}
