//! Picker panels for the toolbar.

use std::cell::RefCell;
use std::rc::Rc;

use prompt_editor_browser::popover::{OutsideClick, toggle_dropdown};
use prompt_editor_core::DropdownState;
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlElement};

/// One dropdown: a trigger button and the panel it opens.
///
/// The panel is shown with fixed positioning next to the trigger and
/// hidden again on selection, on `close()`, or on a press outside both.
#[wasm_bindgen]
pub struct JsDropdown {
    state: Rc<RefCell<DropdownState<String>>>,
    trigger: Element,
    panel: HtmlElement,
    on_close: Option<js_sys::Function>,
    outside: Option<OutsideClick>,
}

#[wasm_bindgen]
impl JsDropdown {
    #[wasm_bindgen(constructor)]
    pub fn new(
        trigger: Element,
        panel: HtmlElement,
        value: Option<String>,
        on_close: Option<js_sys::Function>,
    ) -> Self {
        panel.set_hidden(true);
        Self {
            state: Rc::new(RefCell::new(DropdownState::new(value))),
            trigger,
            panel,
            on_close,
            outside: None,
        }
    }

    /// Open below (or above) the trigger, or close if open. Returns whether
    /// it is now open.
    #[wasm_bindgen]
    pub fn toggle(&mut self) -> bool {
        // Measure with the panel laid out but invisible.
        self.panel.set_hidden(false);
        toggle_dropdown(&mut *self.state.borrow_mut(), &self.trigger, &self.panel);
        let open = self.state.borrow().is_open();
        if open {
            self.watch_outside();
        } else {
            self.hide();
        }
        open
    }

    #[wasm_bindgen(js_name = isOpen)]
    pub fn is_open(&self) -> bool {
        self.state.borrow().is_open()
    }

    #[wasm_bindgen]
    pub fn value(&self) -> Option<String> {
        self.state.borrow().value().cloned()
    }

    /// Reflect the editor's current value, e.g. the font at the cursor.
    #[wasm_bindgen(js_name = setValue)]
    pub fn set_value(&mut self, value: Option<String>) {
        self.state.borrow_mut().set_value(value);
    }

    /// Pick an option. Closes the panel and returns the value to apply, or
    /// `undefined` when the dropdown was not open.
    #[wasm_bindgen]
    pub fn select(&mut self, value: String) -> Option<String> {
        let picked = self.state.borrow_mut().select(value, |v| v);
        if picked.is_some() {
            self.hide();
        }
        picked
    }

    #[wasm_bindgen]
    pub fn close(&mut self) {
        self.state.borrow_mut().close();
        self.hide();
    }
}

impl JsDropdown {
    fn hide(&mut self) {
        self.panel.set_hidden(true);
        self.outside = None;
    }

    fn watch_outside(&mut self) {
        let state = self.state.clone();
        let panel = self.panel.clone();
        let on_close = self.on_close.clone();
        self.outside = OutsideClick::new(self.trigger.clone(), self.panel.clone().into(), move || {
            if !state.borrow_mut().pointer_down(false) {
                return;
            }
            panel.set_hidden(true);
            if let Some(callback) = &on_close {
                if let Err(err) = callback.call0(&JsValue::NULL) {
                    tracing::warn!(?err, "dropdown onClose callback threw");
                }
            }
        });
    }
}
