//! Codec tests: canonical output, leniency, and round-trip stability.

use super::{RenderOptions, parse_html, render_html, to_html};
use crate::config::{EditorConfig, HighlightConfig, LinkConfig, TableConfig, ExtensionToggle};
use crate::document::{Block, Document, ImageNode, TextAlign, TextBlock};
use crate::actions::EditorAction;
use crate::editor::{Editor, EditorDocument};
use crate::execute::execute_action;
use crate::marks::SimpleMark;

fn parse(html: &str) -> Document {
    parse_html(html, &EditorConfig::default())
}

/// serialize(parse(serialize(parse(x)))) == serialize(parse(x))
fn assert_stable(html: &str) -> String {
    let first = to_html(&parse(html));
    let second = to_html(&parse(&first));
    assert_eq!(first, second, "round trip changed output for {html:?}");
    first
}

// === Canonical output ===

#[test]
fn test_empty_input_is_one_paragraph() {
    let doc = parse("");
    assert_eq!(doc.blocks, vec![Block::empty_paragraph()]);
    insta::assert_snapshot!(to_html(&doc), @"<p></p>");
}

#[test]
fn test_loose_text_wrapped_in_paragraph() {
    insta::assert_snapshot!(to_html(&parse("hello <b>there</b>")), @"<p>hello <strong>there</strong></p>");
}

#[test]
fn test_marks_nest_in_canonical_order() {
    // Input nests in the "wrong" order; output is canonical.
    let html = r#"<p><strong><a href="https://a.example/x">bold link</a></strong></p>"#;
    insta::assert_snapshot!(
        to_html(&parse(html)),
        @r#"<p><a target="_blank" rel="noopener noreferrer nofollow" href="https://a.example/x"><strong>bold link</strong></a></p>"#
    );
}

#[test]
fn test_text_style_and_highlight() {
    let html = r##"<p><span style="font-size: 18px; color: #c92a2a">red</span> <mark data-color="#fff9db">lit</mark></p>"##;
    insta::assert_snapshot!(
        to_html(&parse(html)),
        @r##"<p><span style="color: #c92a2a; font-size: 18px">red</span> <mark data-color="#fff9db" style="background-color: #fff9db; color: inherit">lit</mark></p>"##
    );
}

#[test]
fn test_adjacent_equal_runs_merge() {
    insta::assert_snapshot!(
        to_html(&parse("<p><em>a</em><em>b</em><i>c</i></p>")),
        @"<p><em>abc</em></p>"
    );
}

#[test]
fn test_overlapping_marks_share_open_elements() {
    insta::assert_snapshot!(
        to_html(&parse("<p><strong>a<em>b</em></strong><em>c</em></p>")),
        @"<p><strong>a<em>b</em></strong><em>c</em></p>"
    );
}

#[test]
fn test_block_vocabulary() {
    let html = concat!(
        "<h1>Title</h1>",
        "<h2 style=\"text-align: center\">Sub</h2>",
        "<blockquote><p>quoted</p></blockquote>",
        "<ul><li><p>one</p></li><li><p>two</p></li></ul>",
        "<pre><code class=\"language-rust\">fn main() {\n    a &lt; b\n}</code></pre>",
        "<hr>",
        "<p>line<br>break</p>",
    );
    let expected = concat!(
        "<h1>Title</h1>",
        "<h2 style=\"text-align: center\">Sub</h2>",
        "<blockquote><p>quoted</p></blockquote>",
        "<ul><li><p>one</p></li><li><p>two</p></li></ul>",
        "<pre><code class=\"language-rust\">fn main() {\n    a &lt; b\n}</code></pre>",
        "<hr>",
        "<p>line<br>break</p>",
    );
    assert_eq!(assert_stable(html), expected);
}

#[test]
fn test_table_with_header_row() {
    let html = "<table><tr><th>A</th><th>B</th></tr><tr><td>1</td><td></td></tr></table>";
    insta::assert_snapshot!(
        assert_stable(html),
        @"<table><tbody><tr><th><p>A</p></th><th><p>B</p></th></tr><tr><td><p>1</p></td><td><p></p></td></tr></tbody></table>"
    );
}

#[test]
fn test_image_and_video() {
    let html = r#"<img src="https://cdn.example/cat.png" width="240px" alt="cat"><div data-youtube-video><iframe src="https://www.youtube-nocookie.com/embed/abc123"></iframe></div>"#;
    let doc = parse(html);
    assert_eq!(doc.images()[0].width, Some(240));
    insta::assert_snapshot!(
        to_html(&doc),
        @r#"<img src="https://cdn.example/cat.png" alt="cat" width="240"><div data-youtube-video=""><iframe src="https://www.youtube-nocookie.com/embed/abc123" width="640" height="480" allowfullscreen="true" frameborder="0"></iframe></div>"#
    );
}

// === Leniency ===

#[test]
fn test_image_inside_paragraph_splits_it() {
    let doc = parse(r#"<p>before<img src="x.png">after</p>"#);
    assert_eq!(
        doc.blocks,
        vec![
            Block::Paragraph(TextBlock::plain("before")),
            Block::Image(ImageNode::new("x.png")),
            Block::Paragraph(TextBlock::plain("after")),
        ]
    );
}

#[test]
fn test_unsupported_heading_downgrades() {
    let doc = parse("<h4>deep</h4>");
    assert_eq!(doc.blocks, vec![Block::Paragraph(TextBlock::plain("deep"))]);

    let config = EditorConfig {
        heading_levels: vec![1],
        ..Default::default()
    };
    let doc = parse_html("<h2>two</h2>", &config);
    assert!(matches!(doc.blocks[0], Block::Paragraph(_)));
}

#[test]
fn test_disabled_extensions_keep_text() {
    let config = EditorConfig {
        underline: ExtensionToggle { enabled: false },
        link: LinkConfig {
            enabled: false,
            ..Default::default()
        },
        highlight: HighlightConfig {
            enabled: false,
            ..Default::default()
        },
        table: TableConfig {
            enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };
    let doc = parse_html(
        r#"<p><u>under</u> <a href="https://x.example">link</a> <mark>hi</mark></p><table><tr><td>cell</td></tr></table>"#,
        &config,
    );
    insta::assert_snapshot!(to_html(&doc), @"<p>under link hi</p><p>cell</p>");
}

#[test]
fn test_single_color_highlight() {
    let config = EditorConfig {
        highlight: HighlightConfig {
            multicolor: false,
            ..Default::default()
        },
        ..Default::default()
    };
    let doc = parse_html(r##"<p><mark data-color="#ffc9c9">x</mark></p>"##, &config);
    insta::assert_snapshot!(to_html(&doc), @"<p><mark>x</mark></p>");
}

#[test]
fn test_formatting_whitespace_dropped() {
    let doc = parse("<ul>\n  <li>\n    <p>item</p>\n  </li>\n</ul>\n<p>\n  spaced  out\n</p>");
    insta::assert_snapshot!(to_html(&doc), @"<ul><li><p>item</p></li></ul><p>spaced  out</p>");
}

#[test]
fn test_entities_round_trip() {
    let out = assert_stable("<p>Tom &amp; Jerry &lt;3 &quot;quoted&quot;</p>");
    insta::assert_snapshot!(out, @r#"<p>Tom &amp; Jerry &lt;3 "quoted"</p>"#);
}

#[test]
fn test_alignment_parsed() {
    let doc = parse(r#"<p style="text-align: right">r</p>"#);
    assert_eq!(doc.text_block(0).unwrap().align, Some(TextAlign::Right));
}

#[test]
fn test_inline_mark_aliases() {
    let doc = parse("<p><b>b</b><i>i</i><del>d</del><code>c</code></p>");
    let body = doc.text_block(0).unwrap();
    assert!(body.runs[0].marks.has(SimpleMark::Bold));
    assert!(body.runs[1].marks.has(SimpleMark::Italic));
    assert!(body.runs[2].marks.has(SimpleMark::Strike));
    assert!(body.runs[3].marks.has(SimpleMark::Code));
}

// === Round trip over everything at once ===

#[test]
fn test_round_trip_idempotent_kitchen_sink() {
    let html = concat!(
        "<h3>Prompt</h3>",
        "<p style=\"text-align: justify\">A <strong>bold</strong>, <em>italic</em>, <u>under</u>, ",
        "<s>struck</s>, <code>code</code> and ",
        "<a href=\"https://example.com/path?q=1\"><span style=\"color: #5f3dc4; font-family: Inter\">",
        "<mark data-color=\"#e3fafc\"><strong><em>everything</em></strong></mark></span></a> run.</p>",
        "<blockquote><ul><li><p>nested <span style=\"font-size: 24px\">big</span></p>",
        "<ul><li><p>deeper</p></li></ul></li></ul></blockquote>",
        "<table><tbody><tr><th><p>k</p></th><th><p>v</p></th></tr>",
        "<tr><td><p><em>a</em></p></td><td><img src=\"data:image/png;base64,iVBORw0KGgo=\" width=\"120\"></td></tr>",
        "</tbody></table>",
        "<pre><code>plain\n  code</code></pre>",
        "<p></p>",
    );
    let once = assert_stable(html);
    // A third pass changes nothing either.
    assert_eq!(to_html(&parse(&once)), once);
    assert_eq!(parse(&once), parse(&to_html(&parse(&once))));
}

/// Output of an edited document survives a parse and re-serialize.
fn assert_edited_stable(editor: &Editor) -> String {
    let first = editor.content_html();
    assert_eq!(to_html(&parse(&first)), first);
    first
}

#[test]
fn test_round_trip_after_pasting_windows_line_endings() {
    let mut ed = Editor::default();
    execute_action(&mut ed, &EditorAction::InsertText("line one\r\nline two\rthree".into()));
    let html = assert_edited_stable(&ed);
    insta::assert_snapshot!(html, @"<p>line one<br>line two<br>three</p>");
}

#[test]
fn test_round_trip_after_typing_tab() {
    let mut ed = Editor::default();
    execute_action(&mut ed, &EditorAction::InsertText("a".into()));
    execute_action(&mut ed, &EditorAction::InsertText("\tb".into()));
    let html = assert_edited_stable(&ed);
    insta::assert_snapshot!(html, @"<p>a b</p>");
}

#[test]
fn test_tab_kept_inside_code_block() {
    let mut ed = Editor::default();
    execute_action(&mut ed, &EditorAction::ToggleCodeBlock);
    execute_action(&mut ed, &EditorAction::InsertText("if x:\r\n\treturn".into()));
    let html = assert_edited_stable(&ed);
    assert!(html.contains("if x:\n\treturn"), "{html}");
}

// === Editing render ===

#[test]
fn test_editing_render_tags_leaves() {
    let doc = parse(r#"<p>a</p><img src="x.png"><p></p>"#);
    let html = render_html(&doc, RenderOptions::editing(Some(1)));
    insta::assert_snapshot!(
        html,
        @r#"<p data-leaf="0">a</p><div class="resizable-image-container selected" data-leaf="1" contenteditable="false"><img src="x.png" alt="" draggable="false" style="width: 100%"><div class="resize-handle" data-resize-handle="1"></div></div><p data-leaf="2"><br class="trailing-break"></p>"#
    );
}

#[test]
fn test_editing_render_unselected_image_has_no_handle() {
    let mut doc = parse(r#"<img src="x.png">"#);
    if let Block::Image(img) = &mut doc.blocks[0] {
        img.width = Some(80);
    }
    let html = render_html(&doc, RenderOptions::editing(None));
    assert!(html.contains("style=\"width: 80px\""));
    assert!(!html.contains("resize-handle"));
}
