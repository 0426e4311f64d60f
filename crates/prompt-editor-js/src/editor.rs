//! JsEditor - the main editor wrapper for JavaScript.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::EventListener;
use prompt_editor_browser::files::files_from_list;
use prompt_editor_browser::{BrowserSurface, Platform, ResizeSession, platform};
use prompt_editor_core::{
    BubbleMenu, CursorPlatform, CursorSync, EditorConfig, EditorPlatform, EditorShell, Size,
    SurfacePlatform, Toolbar, toolbar,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use crate::actions::parse_action;
use crate::events;
use crate::types::{JsActiveState, JsBubbleState, JsPlacement, to_js};

/// Class of the contenteditable element the editor creates.
pub const CONTENT_CLASS: &str = "prompt-editor-content";

/// Everything that only exists while the editor is mounted.
pub(crate) struct Mounted {
    pub(crate) shell: EditorShell,
    pub(crate) surface: BrowserSurface,
    pub(crate) bubble: BubbleMenu,
    pub(crate) platform: Platform,
    pub(crate) resize: Option<ResizeSession>,
    rendered: String,
}

impl Mounted {
    /// Bring the surface up to date with the document.
    fn refresh(&mut self) {
        let selection = self.shell.selection();
        let html = self.shell.editing_html();
        if html != self.rendered {
            self.surface.render(&html, selection);
            self.rendered = html;
        } else if let Some(dom) = self.surface.read_selection() {
            // Only while the DOM selection is ours; the bubble's URL field
            // keeps its own.
            if dom != selection {
                if let Err(err) = self.surface.restore_selection(selection) {
                    tracing::debug!(%err, "could not move the DOM selection");
                }
            }
        }
        if self.shell.take_focus_request() {
            if let Err(err) = self.surface.refocus(selection) {
                tracing::debug!(%err, "could not refocus editor");
            }
        }
        self.bubble.sync(&self.shell.active_state());
    }
}

/// Shared between the JS handle and the DOM listeners.
pub(crate) struct Host {
    mounted: RefCell<Option<Mounted>>,
    listeners: RefCell<Vec<EventListener>>,
    /// Filled by the shell's change callback, drained after every borrow.
    changed: Rc<RefCell<Option<String>>>,
    on_change: RefCell<Option<js_sys::Function>>,
    on_state_change: RefCell<Option<js_sys::Function>>,
}

impl Host {
    fn new() -> Self {
        Self {
            mounted: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
            changed: Rc::new(RefCell::new(None)),
            on_change: RefCell::new(None),
            on_state_change: RefCell::new(None),
        }
    }

    /// Run `f` against the mounted editor and re-render. JS callbacks fire
    /// after the editor is released, so they may call back in.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut Mounted) -> R) -> Option<R> {
        let (result, state) = {
            let Ok(mut guard) = self.mounted.try_borrow_mut() else {
                tracing::debug!("editor busy, dropping re-entrant call");
                return None;
            };
            let mounted = guard.as_mut()?;
            let result = f(mounted);
            mounted.refresh();
            let state = self
                .on_state_change
                .borrow()
                .is_some()
                .then(|| JsActiveState::from(&mounted.shell.active_state()));
            (result, state)
        };
        self.notify(state);
        Some(result)
    }

    /// Read the mounted editor without re-rendering.
    pub(crate) fn peek<R>(&self, f: impl FnOnce(&Mounted) -> R) -> Option<R> {
        let guard = self.mounted.try_borrow().ok()?;
        guard.as_ref().map(f)
    }

    fn notify(&self, state: Option<JsActiveState>) {
        let html = self.changed.borrow_mut().take();
        if let (Some(html), Some(callback)) = (html, self.on_change.borrow().as_ref()) {
            if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_str(&html)) {
                tracing::warn!(?err, "onChange callback threw");
            }
        }
        if let (Some(state), Some(callback)) = (state, self.on_state_change.borrow().as_ref()) {
            match to_js(&state) {
                Ok(value) => {
                    if let Err(err) = callback.call1(&JsValue::NULL, &value) {
                        tracing::warn!(?err, "onStateChange callback threw");
                    }
                }
                Err(_) => tracing::warn!("could not serialize active state"),
            }
        }
    }
}

/// The main editor instance exposed to JavaScript.
///
/// Mount it into a container; it creates its own contenteditable element,
/// handles input on it, and reports content changes as HTML strings.
#[wasm_bindgen]
pub struct JsEditor {
    host: Rc<Host>,
}

#[wasm_bindgen]
impl JsEditor {
    /// Create an unmounted editor.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            host: Rc::new(Host::new()),
        }
    }

    // === Mounting ===

    /// Mount the editor into a container element.
    ///
    /// `config` is an `EditorConfig` object (or undefined for defaults),
    /// `initialHtml` the starting content. `onChange` receives the
    /// serialized HTML after every edit that changed it.
    #[wasm_bindgen]
    pub fn mount(
        &mut self,
        container: &HtmlElement,
        config: JsValue,
        initial_html: &str,
        on_change: Option<js_sys::Function>,
    ) -> Result<(), JsError> {
        self.unmount();

        let config: EditorConfig = if config.is_undefined() || config.is_null() {
            EditorConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsError::new(&format!("Invalid config: {}", e)))?
        };

        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsError::new("No document"))?;
        let element: HtmlElement = document
            .create_element("div")
            .map_err(|e| JsError::new(&format!("Failed to create element: {:?}", e)))?
            .unchecked_into();
        element
            .set_attribute("contenteditable", "true")
            .map_err(|e| JsError::new(&format!("Failed to set contenteditable: {:?}", e)))?;
        element.set_class_name(CONTENT_CLASS);

        let changed = self.host.changed.clone();
        let shell = EditorShell::try_mount(config, initial_html, move |html: &str| {
            *changed.borrow_mut() = Some(html.to_string());
        })
        .map_err(|e| JsError::new(&e.to_string()))?;

        container
            .append_child(&element)
            .map_err(|e| JsError::new(&format!("Failed to append child: {:?}", e)))?;

        *self.host.on_change.borrow_mut() = on_change;
        *self.host.mounted.borrow_mut() = Some(Mounted {
            shell,
            surface: BrowserSurface::new(element.clone()),
            bubble: BubbleMenu::default(),
            platform: platform(),
            resize: None,
            rendered: String::new(),
        });
        *self.host.listeners.borrow_mut() = events::attach(&self.host, &element);

        // Initial render
        self.host.with(|_| ());
        Ok(())
    }

    /// Check if the editor is mounted.
    #[wasm_bindgen(js_name = isMounted)]
    pub fn is_mounted(&self) -> bool {
        self.host.peek(|_| ()).is_some()
    }

    /// Unmount the editor, removing its element. Image reads still in
    /// flight are discarded.
    #[wasm_bindgen]
    pub fn unmount(&mut self) {
        self.host.listeners.borrow_mut().clear();
        let mounted = self.host.mounted.borrow_mut().take();
        if let Some(mounted) = mounted {
            mounted.surface.root().remove();
            mounted.shell.unmount();
        }
        self.host.changed.borrow_mut().take();
        self.host.on_change.borrow_mut().take();
    }

    /// Be told about formatting changes at the selection, for toolbar
    /// highlighting.
    #[wasm_bindgen(js_name = setOnStateChange)]
    pub fn set_on_state_change(&mut self, callback: Option<js_sys::Function>) {
        *self.host.on_state_change.borrow_mut() = callback;
    }

    /// Focus the editing surface.
    #[wasm_bindgen]
    pub fn focus(&self) {
        self.host.peek(|m| {
            if let Err(err) = m.surface.refocus(m.shell.selection()) {
                tracing::debug!(%err, "focus failed");
            }
        });
    }

    // === Content ===

    /// Current content as HTML. Empty when not mounted.
    #[wasm_bindgen(js_name = getHtml)]
    pub fn get_html(&self) -> String {
        self.host
            .peek(|m| m.shell.html().to_string())
            .unwrap_or_default()
    }

    // === Actions ===

    /// Execute an editor action, e.g. `{ type: "toggleMark", mark: "bold" }`.
    ///
    /// Returns whether the document or selection changed.
    #[wasm_bindgen(js_name = executeAction)]
    pub fn execute_action(&mut self, action: JsValue) -> Result<bool, JsError> {
        let action = parse_action(action)?;
        Ok(self
            .host
            .with(|m| m.shell.run(&action))
            .unwrap_or(false))
    }

    /// Formatting at the selection. `null` when not mounted.
    #[wasm_bindgen(js_name = getActiveState)]
    pub fn get_active_state(&self) -> Result<JsValue, JsError> {
        match self.host.peek(|m| JsActiveState::from(&m.shell.active_state())) {
            Some(state) => to_js(&state),
            None => Ok(JsValue::NULL),
        }
    }

    /// Check if undo is available.
    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.host
            .peek(|m| m.shell.active_state().can_undo)
            .unwrap_or(false)
    }

    /// Check if redo is available.
    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.host
            .peek(|m| m.shell.active_state().can_redo)
            .unwrap_or(false)
    }

    // === Toolbar ===

    /// Toolbar buttons for the current selection, in display order.
    #[wasm_bindgen(js_name = toolbarItems)]
    pub fn toolbar_items(&self) -> Result<JsValue, JsError> {
        let items = self
            .host
            .peek(|m| Toolbar::items(&m.shell.active_state(), m.shell.config()))
            .unwrap_or_default();
        to_js(&items)
    }

    /// Apply a toolbar command, e.g. `{ type: "press", value: "bold" }` or
    /// `{ type: "fontSize", value: "18px" }`. Returns what the host should
    /// do next (open a picker, prompt for a link, pick files).
    #[wasm_bindgen(js_name = dispatchToolbar)]
    pub fn dispatch_toolbar(&mut self, command: JsValue) -> Result<JsValue, JsError> {
        let command = serde_wasm_bindgen::from_value(command)
            .map_err(|e| JsError::new(&format!("Invalid toolbar command: {}", e)))?;
        let outcome = self
            .host
            .with(|m| Toolbar::dispatch(&mut m.shell, command))
            .ok_or_else(|| JsError::new("Editor is not mounted"))?;
        to_js(&outcome)
    }

    /// Entries of the block-style picker.
    #[wasm_bindgen(js_name = blockStyles)]
    pub fn block_styles(&self, with_quote: bool) -> Result<JsValue, JsError> {
        let options = self
            .host
            .peek(|m| toolbar::block_styles(m.shell.config(), with_quote))
            .unwrap_or_default();
        to_js(&options)
    }

    /// `[label, family]` pairs of the font picker.
    #[wasm_bindgen(js_name = fontFamilies)]
    pub fn font_families() -> Result<JsValue, JsError> {
        to_js(&toolbar::FONT_FAMILIES)
    }

    #[wasm_bindgen(js_name = fontSizes)]
    pub fn font_sizes() -> Result<JsValue, JsError> {
        to_js(&toolbar::FONT_SIZES)
    }

    /// Text color swatches; `null` is the remove-color swatch.
    #[wasm_bindgen(js_name = textColors)]
    pub fn text_colors() -> Result<JsValue, JsError> {
        to_js(&toolbar::TEXT_COLORS)
    }

    /// Highlight swatches; `null` removes the highlight.
    #[wasm_bindgen(js_name = highlightColors)]
    pub fn highlight_colors() -> Result<JsValue, JsError> {
        to_js(&toolbar::HIGHLIGHT_COLORS)
    }

    // === Images ===

    /// Insert images chosen with a file picker at the selection. Returns
    /// how many of the files are images being read.
    #[wasm_bindgen(js_name = insertFiles)]
    pub fn insert_files(&mut self, files: &web_sys::FileList) -> usize {
        events::ingest(&self.host, files_from_list(files), None)
    }

    // === Bubble menu ===

    #[wasm_bindgen(js_name = bubbleState)]
    pub fn bubble_state(&self) -> Result<JsValue, JsError> {
        let state = self
            .host
            .peek(|m| JsBubbleState::from(&m.bubble))
            .unwrap_or_else(|| JsBubbleState::from(&BubbleMenu::Hidden));
        to_js(&state)
    }

    #[wasm_bindgen(js_name = bubbleItems)]
    pub fn bubble_items(&self) -> Result<JsValue, JsError> {
        let items = self
            .host
            .peek(|m| BubbleMenu::items(&m.shell.active_state(), m.shell.config()))
            .unwrap_or_default();
        to_js(&items)
    }

    /// Label of the bubble menu's block picker.
    #[wasm_bindgen(js_name = bubbleBlockLabel)]
    pub fn bubble_block_label(&self) -> String {
        self.host
            .peek(|m| BubbleMenu::block_label(&m.shell.active_state()).to_string())
            .unwrap_or_default()
    }

    /// Toggle between the format controls and the URL field.
    #[wasm_bindgen(js_name = bubblePressLink)]
    pub fn bubble_press_link(&mut self) {
        self.host.with(|m| {
            let state = m.shell.active_state();
            m.bubble.press_link(&state);
        });
    }

    #[wasm_bindgen(js_name = bubbleSetDraft)]
    pub fn bubble_set_draft(&mut self, text: &str) {
        self.host.with(|m| m.bubble.set_draft(text));
    }

    /// Enter in the URL field.
    #[wasm_bindgen(js_name = bubbleSubmitLink)]
    pub fn bubble_submit_link(&mut self) -> bool {
        self.host
            .with(|m| m.bubble.submit_link(&mut m.shell))
            .unwrap_or(false)
    }

    #[wasm_bindgen(js_name = bubbleRemoveLink)]
    pub fn bubble_remove_link(&mut self) -> bool {
        self.host
            .with(|m| m.bubble.remove_link(&mut m.shell))
            .unwrap_or(false)
    }

    #[wasm_bindgen(js_name = bubbleEscape)]
    pub fn bubble_escape(&mut self) {
        self.host.with(|m| m.bubble.escape());
    }

    /// Where to float a bubble panel of the given size, or `null` while the
    /// menu is hidden.
    #[wasm_bindgen(js_name = bubblePlacement)]
    pub fn bubble_placement(&self, panel_width: f64, panel_height: f64) -> Result<JsValue, JsError> {
        let placement = self.host.peek(|m| {
            let rect = m.surface.selection_rect(m.shell.selection())?;
            let viewport = m.surface.viewport();
            m.bubble
                .placement(rect, Size::new(panel_width, panel_height), viewport)
        });
        match placement.flatten() {
            Some(p) => to_js(&JsPlacement::from(&p)),
            None => Ok(JsValue::NULL),
        }
    }
}

impl Default for JsEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for JsEditor {
    fn drop(&mut self) {
        self.unmount();
    }
}
