//! WASM browser tests for prompt-editor-browser.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

use prompt_editor_browser::dom_sync::{leaf_element, read_dom_selection, write_dom_selection};
use prompt_editor_browser::{
    BeforeInputContext, BeforeInputResult, EditorConfig, EditorShell, InputType, Key, KeyCombo,
    KeydownResult, Modifiers, Platform, Position, Selection, dom_to_position, handle_beforeinput,
    handle_keydown, parse_browser_input_type, platform, position_to_dom,
};
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement};

fn shell(html: &str) -> EditorShell {
    EditorShell::mount(EditorConfig::default(), html, |_| {}).expect("mount")
}

fn surface(shell: &EditorShell) -> HtmlElement {
    let document = web_sys::window().unwrap().document().unwrap();
    let root: HtmlElement = document.create_element("div").unwrap().unchecked_into();
    root.set_attribute("contenteditable", "true").unwrap();
    root.set_inner_html(&shell.editing_html());
    document.body().unwrap().append_child(&root).unwrap();
    root
}

fn ctx(input_type: InputType, data: Option<&str>) -> BeforeInputContext {
    BeforeInputContext {
        input_type,
        data: data.map(str::to_string),
        target: None,
        is_composing: false,
    }
}

// === InputType parsing ===

#[wasm_bindgen_test]
fn test_parse_delete_backward() {
    assert_eq!(
        parse_browser_input_type("deleteContentBackward"),
        InputType::DeleteContentBackward
    );
}

#[wasm_bindgen_test]
fn test_platform_detection() {
    // Values depend on the browser running the test.
    let plat = platform();
    assert!(!(plat.safari && plat.chrome));
}

// === DOM mapping ===

#[wasm_bindgen_test]
fn test_dom_to_position_in_second_paragraph() {
    let shell = shell("<p>hello</p><p>world</p>");
    let root = surface(&shell);
    let root: &Element = root.as_ref();

    let text = leaf_element(root, 1).unwrap().first_child().unwrap();
    assert_eq!(dom_to_position(root, &text, 2), Some(Position::new(1, 2)));
}

#[wasm_bindgen_test]
fn test_position_to_dom_lands_in_text() {
    let shell = shell("<p>hello</p>");
    let root = surface(&shell);
    let root: &Element = root.as_ref();

    let (node, offset) = position_to_dom(root, Position::new(0, 3)).unwrap();
    assert_eq!(node.text_content().as_deref(), Some("hello"));
    assert_eq!(offset, 3);
}

#[wasm_bindgen_test]
fn test_selection_survives_write_and_read() {
    let shell = shell("<p>hello</p><p>world</p>");
    let root = surface(&shell);
    root.focus().unwrap();
    let root: &Element = root.as_ref();

    let selection = Selection::new(Position::new(0, 1), Position::new(1, 4));
    write_dom_selection(root, selection).unwrap();
    assert_eq!(read_dom_selection(root), Some(selection));
}

#[wasm_bindgen_test]
fn test_image_maps_to_atom_position() {
    let shell = shell(r#"<p>a</p><img src="data:image/png;base64,AA=="><p>b</p>"#);
    let root = surface(&shell);
    let root: &Element = root.as_ref();

    let container = leaf_element(root, 1).unwrap();
    assert_eq!(container.get_attribute("contenteditable").as_deref(), Some("false"));
    let (parent, index) = position_to_dom(root, Position::new(1, 1)).unwrap();
    assert_eq!(dom_to_position(root, &parent, index as usize), Some(Position::new(1, 1)));
}

// === beforeinput ===

#[wasm_bindgen_test]
fn test_handle_insert_text() {
    let mut shell = shell("<p>hello</p>");
    shell.run(&prompt_editor_browser::EditorAction::SetSelection(
        Selection::collapsed(Position::new(0, 5)),
    ));
    let result = handle_beforeinput(&mut shell, &ctx(InputType::InsertText, Some(" world")));
    assert_eq!(result, BeforeInputResult::Handled);
    assert_eq!(shell.html(), "<p>hello world</p>");
}

#[wasm_bindgen_test]
fn test_handle_delete_backward_at_target() {
    let mut shell = shell("<p>hello</p>");
    let mut input = ctx(InputType::DeleteContentBackward, None);
    input.target = Some(Selection::collapsed(Position::new(0, 5)));

    let result = handle_beforeinput(&mut shell, &input);
    assert_eq!(result, BeforeInputResult::Handled);
    assert_eq!(shell.html(), "<p>hell</p>");
}

#[wasm_bindgen_test]
fn test_composition_passes_through() {
    let mut shell = shell("<p>hello</p>");
    let mut input = ctx(InputType::InsertText, Some("x"));
    input.is_composing = true;

    let result = handle_beforeinput(&mut shell, &input);
    assert_eq!(result, BeforeInputResult::PassThrough);
    assert_eq!(shell.html(), "<p>hello</p>");
}

#[wasm_bindgen_test]
fn test_unknown_input_passes_through() {
    let mut shell = shell("<p>hello</p>");
    let input = ctx(parse_browser_input_type("insertOrderedList"), None);
    assert_eq!(handle_beforeinput(&mut shell, &input), BeforeInputResult::PassThrough);
}

// === keydown ===

#[wasm_bindgen_test]
fn test_mod_b_toggles_bold() {
    let mut shell = shell("<p>hello</p>");
    shell.run(&prompt_editor_browser::EditorAction::SetSelection(Selection::new(
        Position::new(0, 0),
        Position::new(0, 5),
    )));
    let plat = Platform::default();
    let combo = KeyCombo::with_modifiers(
        Key::character("b"),
        Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        },
    );

    assert_eq!(handle_keydown(&mut shell, &combo, &plat), KeydownResult::Handled);
    assert_eq!(shell.html(), "<p><strong>hello</strong></p>");
}

#[wasm_bindgen_test]
fn test_arrow_keys_pass_through() {
    let mut shell = shell("<p>hello</p>");
    let plat = Platform::default();
    let combo = KeyCombo::new(Key::ArrowLeft);
    assert_eq!(handle_keydown(&mut shell, &combo, &plat), KeydownResult::PassThrough);
}
