//! WASM browser tests for prompt-editor-js.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

use std::cell::RefCell;
use std::rc::Rc;

use prompt_editor_js::{CONTENT_CLASS, JsEditor, JsEditorAction, JsPosition};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_test::*;
use web_sys::HtmlElement;

wasm_bindgen_test_configure!(run_in_browser);

fn container() -> HtmlElement {
    let document = web_sys::window().unwrap().document().unwrap();
    let div: HtmlElement = document.create_element("div").unwrap().unchecked_into();
    document.body().unwrap().append_child(&div).unwrap();
    div
}

fn ok<T>(result: Result<T, JsError>) -> T {
    result.map_err(JsValue::from).unwrap()
}

fn action(action: JsEditorAction) -> JsValue {
    serde_wasm_bindgen::to_value(&action).unwrap()
}

fn recorder() -> (js_sys::Function, Rc<RefCell<Vec<String>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let closure = Closure::<dyn FnMut(String)>::new(move |html: String| {
        sink.borrow_mut().push(html);
    });
    let function = closure.as_ref().unchecked_ref::<js_sys::Function>().clone();
    closure.forget();
    (function, seen)
}

#[wasm_bindgen_test]
fn mount_creates_surface_and_unmount_removes_it() {
    let host = container();
    let mut editor = JsEditor::new();
    ok(editor.mount(&host, JsValue::UNDEFINED, "<p>hello</p>", None));

    assert!(editor.is_mounted());
    let surface = host.first_element_child().unwrap();
    assert_eq!(surface.class_name(), CONTENT_CLASS);
    assert_eq!(surface.get_attribute("contenteditable").as_deref(), Some("true"));
    assert_eq!(editor.get_html(), "<p>hello</p>");

    editor.unmount();
    assert!(!editor.is_mounted());
    assert!(host.first_element_child().is_none());
}

#[wasm_bindgen_test]
fn actions_report_html_to_on_change() {
    let host = container();
    let (on_change, seen) = recorder();
    let mut editor = JsEditor::new();
    ok(editor.mount(&host, JsValue::UNDEFINED, "<p>hello</p>", Some(on_change)));

    let select = JsEditorAction::SetSelection {
        anchor: JsPosition { leaf: 0, offset: 0 },
        head: JsPosition { leaf: 0, offset: 5 },
    };
    assert!(ok(editor.execute_action(action(select))));
    assert!(seen.borrow().is_empty());

    let bold: JsValue = js_sys::JSON::parse(r#"{"type":"toggleMark","mark":"bold"}"#).unwrap();
    assert!(ok(editor.execute_action(bold)));
    assert_eq!(
        seen.borrow().last().map(String::as_str),
        Some("<p><strong>hello</strong></p>")
    );
    editor.unmount();
}

#[wasm_bindgen_test]
fn invalid_config_is_rejected() {
    let host = container();
    let mut editor = JsEditor::new();
    let config = js_sys::JSON::parse(r#"{"headingLevels":[9]}"#).unwrap();
    assert!(editor.mount(&host, config, "", None).is_err());
    assert!(!editor.is_mounted());
    assert!(host.first_element_child().is_none());
}

#[wasm_bindgen_test]
fn malformed_action_is_an_error() {
    let host = container();
    let mut editor = JsEditor::new();
    ok(editor.mount(&host, JsValue::UNDEFINED, "", None));
    let bogus = js_sys::JSON::parse(r#"{"type":"launchRockets"}"#).unwrap();
    assert!(editor.execute_action(bogus).is_err());
    editor.unmount();
}
