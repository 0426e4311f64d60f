//! Convert a parsed HTML tree into a `Document`.
//!
//! Unknown elements are transparent: their children are converted in place.
//! Elements belonging to a disabled extension are dropped but their text is
//! kept, so switching an extension off never loses words.

use smol_str::SmolStr;

use super::dom::{Element, Node, parse_fragment};
use crate::config::{EditorConfig, Extension};
use crate::document::{
    Block, Document, ImageNode, ListItem, Table, TableCell, TableRow, TextAlign, TextBlock,
    TextRun, VideoNode,
};
use crate::marks::{Highlight, MarkSet, SimpleMark};

/// Parse an HTML string into a document.
///
/// Never fails: anything unrecognized degrades to paragraphs of text. Empty
/// input yields a single empty paragraph.
pub fn parse_html(html: &str, config: &EditorConfig) -> Document {
    let nodes = parse_fragment(html);
    let builder = Builder { config };
    Document::new(builder.blocks(&nodes))
}

/// Inline content interleaved with atoms that interrupt it.
enum Inline {
    Run(TextRun),
    Atom(Block),
}

struct Builder<'c> {
    config: &'c EditorConfig,
}

fn is_block_element(name: &str) -> bool {
    matches!(
        name,
        "p" | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "blockquote"
            | "ul"
            | "ol"
            | "li"
            | "pre"
            | "hr"
            | "table"
            | "thead"
            | "tbody"
            | "tfoot"
            | "tr"
            | "td"
            | "th"
            | "div"
            | "section"
            | "article"
            | "header"
            | "footer"
            | "main"
            | "aside"
            | "nav"
            | "figure"
            | "img"
            | "iframe"
            | "body"
            | "html"
    )
}

/// Whitespace-only text containing a line break is source formatting.
fn is_formatting_whitespace(text: &str) -> bool {
    text.chars().all(char::is_whitespace) && text.contains(['\n', '\r'])
}

fn trim_formatting_start(text: &str) -> &str {
    let trimmed = text.trim_start();
    let leading = &text[..text.len() - trimmed.len()];
    if leading.contains(['\n', '\r']) { trimmed } else { text }
}

fn trim_formatting_end(text: &str) -> &str {
    let trimmed = text.trim_end();
    let trailing = &text[trimmed.len()..];
    if trailing.contains(['\n', '\r']) { trimmed } else { text }
}

fn normalize_inline_whitespace(text: &str) -> String {
    text.replace(['\n', '\r', '\t'], " ")
}

impl Builder<'_> {
    /// Convert a node list in block context.
    fn blocks(&self, nodes: &[Node]) -> Vec<Block> {
        let mut out = Vec::new();
        let mut loose: Vec<Inline> = Vec::new();
        for node in nodes {
            match node {
                Node::Element(el) if is_block_element(&el.name) => {
                    self.flush_loose(&mut loose, &mut out);
                    out.extend(self.block(el));
                }
                node => self.inline(node, &MarkSet::default(), &mut loose),
            }
        }
        self.flush_loose(&mut loose, &mut out);
        out
    }

    /// Wrap stray inline content at block level into paragraphs.
    fn flush_loose(&self, loose: &mut Vec<Inline>, out: &mut Vec<Block>) {
        let has_content = loose.iter().any(|item| match item {
            Inline::Run(run) => !run.text.trim().is_empty() || run.text.contains('\n'),
            Inline::Atom(_) => true,
        });
        if has_content {
            out.extend(split_text_block(std::mem::take(loose), Block::Paragraph));
        }
        loose.clear();
    }

    fn block(&self, el: &Element) -> Vec<Block> {
        let name = el.name.as_str();
        match name {
            "p" => self.text_block(el, Block::Paragraph),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse::<u8>().unwrap_or(1);
                if self.config.heading_enabled(level) {
                    self.text_block(el, |body| Block::Heading { level, body })
                } else {
                    self.text_block(el, Block::Paragraph)
                }
            }
            "blockquote" => {
                let mut children = self.blocks(&el.children);
                if children.is_empty() {
                    children.push(Block::empty_paragraph());
                }
                vec![Block::Blockquote(children)]
            }
            "ul" | "ol" => {
                let items: Vec<ListItem> = el
                    .children
                    .iter()
                    .filter_map(|child| match child {
                        Node::Element(li) if li.name == "li" => Some(self.list_item(li)),
                        Node::Element(other) => Some(ListItem {
                            blocks: self.block(other),
                        })
                        .filter(|item| !item.blocks.is_empty()),
                        Node::Text(t) if !t.trim().is_empty() => Some(ListItem {
                            blocks: vec![Block::Paragraph(TextBlock::plain(t.trim()))],
                        }),
                        Node::Text(_) => None,
                    })
                    .collect();
                if items.is_empty() {
                    Vec::new()
                } else {
                    vec![Block::BulletList(items)]
                }
            }
            "li" => vec![Block::BulletList(vec![self.list_item(el)])],
            "pre" => {
                let language = el
                    .children
                    .iter()
                    .find_map(|c| match c {
                        Node::Element(code) if code.name == "code" => code.attr("class"),
                        _ => None,
                    })
                    .and_then(|class| {
                        class
                            .split_whitespace()
                            .find_map(|c| c.strip_prefix("language-"))
                    })
                    .map(SmolStr::new);
                vec![Block::CodeBlock {
                    language,
                    body: TextBlock::plain(&el.text_content()),
                }]
            }
            "hr" => vec![Block::HorizontalRule],
            "table" => self.table(el),
            "img" => self.image(el).into_iter().collect(),
            "iframe" => self.video(el).into_iter().collect(),
            // Table parts outside a table, and generic wrappers.
            _ => self.blocks(&el.children),
        }
    }

    fn list_item(&self, li: &Element) -> ListItem {
        let mut blocks = self.blocks(&li.children);
        if blocks.is_empty() {
            blocks.push(Block::empty_paragraph());
        }
        ListItem { blocks }
    }

    fn text_block(&self, el: &Element, make: impl Fn(TextBlock) -> Block) -> Vec<Block> {
        let align = el.style("text-align").and_then(TextAlign::from_css);
        let mut items = Vec::new();
        let last = el.children.len().saturating_sub(1);
        for (i, child) in el.children.iter().enumerate() {
            match child {
                // Source indentation at the block edges is not content.
                Node::Text(text) if i == 0 || i == last => {
                    let mut text = text.as_str();
                    if i == 0 {
                        text = trim_formatting_start(text);
                    }
                    if i == last {
                        text = trim_formatting_end(text);
                    }
                    self.inline(&Node::Text(text.to_string()), &MarkSet::default(), &mut items);
                }
                child => self.inline(child, &MarkSet::default(), &mut items),
            }
        }
        let mut blocks = split_text_block(items, make);
        for block in &mut blocks {
            if let Block::Paragraph(body) | Block::Heading { body, .. } = block {
                body.align = align;
            }
        }
        blocks
    }

    /// Collect inline content under `marks`.
    fn inline(&self, node: &Node, marks: &MarkSet, out: &mut Vec<Inline>) {
        let el = match node {
            Node::Text(text) => {
                if !is_formatting_whitespace(text) {
                    out.push(Inline::Run(TextRun::new(
                        normalize_inline_whitespace(text),
                        marks.clone(),
                    )));
                }
                return;
            }
            Node::Element(el) => el,
        };

        let mut marks = marks.clone();
        match el.name.as_str() {
            "br" => {
                out.push(Inline::Run(TextRun::new("\n", marks)));
                return;
            }
            "img" => {
                out.extend(self.image(el).map(Inline::Atom));
                return;
            }
            "iframe" => {
                out.extend(self.video(el).map(Inline::Atom));
                return;
            }
            "hr" => {
                out.push(Inline::Atom(Block::HorizontalRule));
                return;
            }
            "a" => {
                if self.config.has(Extension::Link) {
                    if let Some(href) = el.attr("href").filter(|h| !h.trim().is_empty()) {
                        marks.link = Some(SmolStr::new(href.trim()));
                    }
                }
            }
            "span" => {
                if let Some(color) = el.style("color") {
                    marks.color = Some(SmolStr::new(color));
                }
                if let Some(family) = el.style("font-family") {
                    marks.font_family = Some(SmolStr::new(family));
                }
                if let Some(size) = el.style("font-size") {
                    marks.font_size = Some(SmolStr::new(size));
                }
            }
            "mark" => {
                if self.config.has(Extension::Highlight) {
                    let color = if self.config.highlight.multicolor {
                        el.attr("data-color")
                            .or_else(|| el.style("background-color"))
                            .map(SmolStr::new)
                    } else {
                        None
                    };
                    marks.highlight = Some(Highlight { color });
                }
            }
            tag => {
                if let Some(mark) = SimpleMark::from_tag(tag) {
                    if mark != SimpleMark::Underline || self.config.has(Extension::Underline) {
                        marks.set(mark, true);
                    }
                }
            }
        }
        for child in &el.children {
            self.inline(child, &marks, out);
        }
    }

    fn image(&self, el: &Element) -> Option<Block> {
        let src = el.attr("src").map(str::trim).filter(|s| !s.is_empty())?;
        let width = el
            .attr("width")
            .or_else(|| el.style("width"))
            .and_then(parse_pixels);
        Some(Block::Image(ImageNode {
            src: SmolStr::new(src),
            width,
            alt: el.attr("alt").filter(|a| !a.is_empty()).map(str::to_string),
        }))
    }

    fn video(&self, el: &Element) -> Option<Block> {
        if !self.config.has(Extension::Video) {
            tracing::debug!("dropping video embed, extension disabled");
            return None;
        }
        let src = el.attr("src").map(str::trim).filter(|s| !s.is_empty())?;
        Some(Block::Video(VideoNode {
            src: SmolStr::new(src),
        }))
    }

    fn table(&self, el: &Element) -> Vec<Block> {
        let mut rows = Vec::new();
        collect_rows(el, &mut rows);

        if !self.config.has(Extension::Table) {
            // Keep cell content as plain blocks.
            return rows
                .iter()
                .flat_map(|row| cells_of(row))
                .flat_map(|cell| self.blocks(&cell.children))
                .collect();
        }

        let rows: Vec<TableRow> = rows
            .iter()
            .map(|row| TableRow {
                cells: cells_of(row)
                    .map(|cell| {
                        let mut blocks = self.blocks(&cell.children);
                        if blocks.is_empty() {
                            blocks.push(Block::empty_paragraph());
                        }
                        TableCell {
                            header: cell.name == "th",
                            blocks,
                        }
                    })
                    .collect(),
            })
            .filter(|row: &TableRow| !row.cells.is_empty())
            .collect();
        if rows.is_empty() {
            Vec::new()
        } else {
            vec![Block::Table(Table { rows })]
        }
    }
}

fn collect_rows<'e>(el: &'e Element, rows: &mut Vec<&'e Element>) {
    for child in &el.children {
        if let Node::Element(child) = child {
            match child.name.as_str() {
                "tr" => rows.push(child),
                "thead" | "tbody" | "tfoot" => collect_rows(child, rows),
                _ => {}
            }
        }
    }
}

fn cells_of(row: &Element) -> impl Iterator<Item = &Element> {
    row.children.iter().filter_map(|c| match c {
        Node::Element(cell) if cell.name == "td" || cell.name == "th" => Some(cell),
        _ => None,
    })
}

/// Parse `200`, `200px` or `199.6` into whole pixels.
fn parse_pixels(value: &str) -> Option<u32> {
    let value = value.trim().trim_end_matches("px").trim();
    let px = value.parse::<f64>().ok()?;
    (px.is_finite() && px > 0.0).then(|| px.round() as u32)
}

/// Split inline items at atoms: runs between atoms become text blocks built
/// with `make`, atoms become their own blocks.
fn split_text_block(items: Vec<Inline>, make: impl Fn(TextBlock) -> Block) -> Vec<Block> {
    let mut out = Vec::new();
    let mut runs = Vec::new();
    let mut saw_atom = false;
    for item in items {
        match item {
            Inline::Run(run) => runs.push(run),
            Inline::Atom(block) => {
                let body = TextBlock::new(std::mem::take(&mut runs));
                if !body.is_empty() {
                    out.push(make(body));
                }
                out.push(block);
                saw_atom = true;
            }
        }
    }
    let body = TextBlock::new(runs);
    if !body.is_empty() || !saw_atom {
        out.push(make(body));
    }
    out
}
