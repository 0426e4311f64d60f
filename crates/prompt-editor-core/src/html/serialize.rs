//! Document to HTML.
//!
//! Output is canonical: marks always nest in the same order and adjacent runs
//! with equal marks are already merged in the model, so serializing a parsed
//! document reproduces the same string.

use markdown_weaver_escape::{FmtWriter, StrWrite, escape_href, escape_html, escape_html_body_text};

use crate::document::{Block, Document, ImageNode, TextBlock, VideoNode};
use crate::image_view::ImageView;
use crate::marks::MarkLayer;

/// Extra markup for rendering into a live editing surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Tag every leaf with `data-leaf="N"` so the host can map DOM
    /// positions back to document positions.
    pub leaf_attrs: bool,
    /// Image leaf currently node-selected; it renders with a resize handle.
    pub selected_node: Option<usize>,
}

impl RenderOptions {
    pub fn editing(selected_node: Option<usize>) -> Self {
        Self {
            leaf_attrs: true,
            selected_node,
        }
    }
}

/// Serialize a document to its canonical HTML string.
pub fn to_html(doc: &Document) -> String {
    render_html(doc, RenderOptions::default())
}

pub fn render_html(doc: &Document, options: RenderOptions) -> String {
    let mut out = String::new();
    let writer = HtmlWriter::new(FmtWriter(&mut out), options);
    if writer.run(&doc.blocks).is_err() {
        tracing::warn!("html serialization hit a formatter error");
    }
    out
}

struct HtmlWriter<W> {
    writer: W,
    options: RenderOptions,
    /// Document-order index of the next leaf.
    leaf: usize,
    /// Mark layers currently open, outermost first.
    open: Vec<MarkLayer>,
}

impl<W> HtmlWriter<W>
where
    W: StrWrite,
{
    fn new(writer: W, options: RenderOptions) -> Self {
        Self {
            writer,
            options,
            leaf: 0,
            open: Vec::new(),
        }
    }

    #[inline]
    fn write(&mut self, s: &str) -> Result<(), W::Error> {
        self.writer.write_str(s)
    }

    fn run(mut self, blocks: &[Block]) -> Result<(), W::Error> {
        self.write_blocks(blocks)
    }

    fn leaf_attr(&mut self) -> Result<(), W::Error> {
        if self.options.leaf_attrs {
            write!(&mut self.writer, " data-leaf=\"{}\"", self.leaf)?;
        }
        Ok(())
    }

    fn write_blocks(&mut self, blocks: &[Block]) -> Result<(), W::Error> {
        for block in blocks {
            self.write_block(block)?;
        }
        Ok(())
    }

    fn write_block(&mut self, block: &Block) -> Result<(), W::Error> {
        match block {
            Block::Paragraph(body) => self.write_text_block("p", body),
            Block::Heading { level, body } => {
                let tag = match level {
                    1 => "h1",
                    2 => "h2",
                    _ => "h3",
                };
                self.write_text_block(tag, body)
            }
            Block::CodeBlock { language, body } => {
                self.write("<pre")?;
                self.leaf_attr()?;
                self.write("><code")?;
                if let Some(lang) = language {
                    self.write(" class=\"language-")?;
                    escape_html(&mut self.writer, lang)?;
                    self.write("\"")?;
                }
                self.write(">")?;
                let text = body.plain_text();
                escape_html_body_text(&mut self.writer, &text)?;
                if self.options.leaf_attrs && (text.is_empty() || text.ends_with('\n')) {
                    self.write("<br>")?;
                }
                self.leaf += 1;
                self.write("</code></pre>")
            }
            Block::Blockquote(children) => {
                self.write("<blockquote>")?;
                self.write_blocks(children)?;
                self.write("</blockquote>")
            }
            Block::BulletList(items) => {
                self.write("<ul>")?;
                for item in items {
                    self.write("<li>")?;
                    self.write_blocks(&item.blocks)?;
                    self.write("</li>")?;
                }
                self.write("</ul>")
            }
            Block::Table(table) => {
                self.write("<table><tbody>")?;
                for row in &table.rows {
                    self.write("<tr>")?;
                    for cell in &row.cells {
                        let tag = if cell.header { "th" } else { "td" };
                        write!(&mut self.writer, "<{tag}>")?;
                        self.write_blocks(&cell.blocks)?;
                        write!(&mut self.writer, "</{tag}>")?;
                    }
                    self.write("</tr>")?;
                }
                self.write("</tbody></table>")
            }
            Block::HorizontalRule => {
                self.write("<hr")?;
                if self.options.leaf_attrs {
                    self.leaf_attr()?;
                    self.write(" contenteditable=\"false\"")?;
                }
                self.leaf += 1;
                self.write(">")
            }
            Block::Image(image) => self.write_image(image),
            Block::Video(video) => self.write_video(video),
        }
    }

    fn write_text_block(&mut self, tag: &str, body: &TextBlock) -> Result<(), W::Error> {
        write!(&mut self.writer, "<{tag}")?;
        self.leaf_attr()?;
        if let Some(align) = body.align {
            write!(
                &mut self.writer,
                " style=\"text-align: {}\"",
                align.as_css()
            )?;
        }
        self.write(">")?;
        for run in &body.runs {
            self.sync_marks(run.marks.layers())?;
            self.write_text(&run.text)?;
        }
        self.sync_marks(Vec::new())?;
        if self.options.leaf_attrs {
            // Give empty lines and trailing breaks a caret box.
            let text_ends_in_break = body.runs.last().is_some_and(|r| r.text.ends_with('\n'));
            if body.is_empty() || text_ends_in_break {
                self.write("<br class=\"trailing-break\">")?;
            }
        }
        self.leaf += 1;
        write!(&mut self.writer, "</{tag}>")
    }

    fn write_text(&mut self, text: &str) -> Result<(), W::Error> {
        let mut lines = text.split('\n');
        if let Some(first) = lines.next() {
            escape_html_body_text(&mut self.writer, first)?;
        }
        for line in lines {
            self.write("<br>")?;
            escape_html_body_text(&mut self.writer, line)?;
        }
        Ok(())
    }

    /// Close and open mark elements so exactly `want` is open.
    fn sync_marks(&mut self, want: Vec<MarkLayer>) -> Result<(), W::Error> {
        let keep = self
            .open
            .iter()
            .zip(&want)
            .take_while(|(a, b)| a == b)
            .count();
        while self.open.len() > keep {
            if let Some(layer) = self.open.pop() {
                write!(&mut self.writer, "</{}>", layer.tag())?;
            }
        }
        for layer in want.into_iter().skip(keep) {
            self.open_layer(&layer)?;
            self.open.push(layer);
        }
        Ok(())
    }

    fn open_layer(&mut self, layer: &MarkLayer) -> Result<(), W::Error> {
        match layer {
            MarkLayer::Link(href) => {
                self.write("<a target=\"_blank\" rel=\"noopener noreferrer nofollow\" href=\"")?;
                escape_href(&mut self.writer, href)?;
                self.write("\">")
            }
            MarkLayer::TextStyle {
                color,
                font_family,
                font_size,
            } => {
                self.write("<span style=\"")?;
                let decls = [
                    ("color", color),
                    ("font-family", font_family),
                    ("font-size", font_size),
                ];
                let mut first = true;
                for (prop, value) in decls {
                    if let Some(value) = value {
                        if !first {
                            self.write("; ")?;
                        }
                        first = false;
                        write!(&mut self.writer, "{prop}: ")?;
                        escape_html(&mut self.writer, value)?;
                    }
                }
                self.write("\">")
            }
            MarkLayer::Highlight(Some(color)) => {
                self.write("<mark data-color=\"")?;
                escape_html(&mut self.writer, color)?;
                self.write("\" style=\"background-color: ")?;
                escape_html(&mut self.writer, color)?;
                self.write("; color: inherit\">")
            }
            MarkLayer::Highlight(None) => self.write("<mark>"),
            MarkLayer::Simple(mark) => write!(&mut self.writer, "<{}>", mark.tag()),
        }
    }

    fn write_image(&mut self, image: &ImageNode) -> Result<(), W::Error> {
        if !self.options.leaf_attrs {
            self.write("<img src=\"")?;
            escape_href(&mut self.writer, &image.src)?;
            self.write("\"")?;
            if let Some(alt) = &image.alt {
                self.write(" alt=\"")?;
                escape_html(&mut self.writer, alt)?;
                self.write("\"")?;
            }
            if let Some(width) = image.width {
                write!(&mut self.writer, " width=\"{width}\"")?;
            }
            self.leaf += 1;
            return self.write(">");
        }

        let view = ImageView::new(
            self.leaf,
            image,
            self.options.selected_node == Some(self.leaf),
        );
        write!(
            &mut self.writer,
            "<div class=\"{}\" data-leaf=\"{}\" contenteditable=\"false\"><img src=\"",
            view.class(),
            view.leaf
        )?;
        escape_href(&mut self.writer, &image.src)?;
        self.write("\" alt=\"")?;
        if let Some(alt) = &image.alt {
            escape_html(&mut self.writer, alt)?;
        }
        write!(
            &mut self.writer,
            "\" draggable=\"false\" style=\"width: {}\">",
            view.css_width()
        )?;
        if view.show_handle() {
            write!(
                &mut self.writer,
                "<div class=\"resize-handle\" data-resize-handle=\"{}\"></div>",
                view.leaf
            )?;
        }
        self.leaf += 1;
        self.write("</div>")
    }

    fn write_video(&mut self, video: &VideoNode) -> Result<(), W::Error> {
        self.write("<div data-youtube-video=\"\"")?;
        if self.options.leaf_attrs {
            self.leaf_attr()?;
            self.write(" contenteditable=\"false\"")?;
        }
        self.write("><iframe src=\"")?;
        escape_href(&mut self.writer, &video.src)?;
        self.write(
            "\" width=\"640\" height=\"480\" allowfullscreen=\"true\" frameborder=\"0\"></iframe></div>",
        )?;
        self.leaf += 1;
        Ok(())
    }
}
