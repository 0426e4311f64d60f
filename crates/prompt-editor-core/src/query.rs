//! Active-state queries: which marks and block styles apply at the
//! selection, for toolbar and bubble menu highlighting.

use smol_str::SmolStr;

use crate::actions::BlockStyle;
use crate::document::{Block, ContainerKind, LeafKind, TextAlign, TextBlock};
use crate::editor::EditorDocument;
use crate::marks::{FormatFlags, Highlight, MarkSet, SimpleMark};

/// Formatting in effect at the selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveState {
    /// Boolean marks present on every selected character, or carried by the
    /// cursor.
    pub marks: FormatFlags,
    pub block: BlockStyle,
    pub align: Option<TextAlign>,
    pub bullet_list: bool,
    pub code_block: bool,
    pub link: Option<SmolStr>,
    pub color: Option<SmolStr>,
    pub highlight: Option<Highlight>,
    pub font_family: Option<SmolStr>,
    pub font_size: Option<SmolStr>,
    pub can_undo: bool,
    pub can_redo: bool,
    /// Leaf of the node-selected image, if any.
    pub selected_image: Option<usize>,
    /// A non-empty range of text is selected.
    pub has_text_selection: bool,
}

impl ActiveState {
    /// Compute the active state for the editor's current selection.
    pub fn query<D: EditorDocument>(editor: &D) -> Self {
        active_state(editor)
    }

    pub fn has(&self, mark: SimpleMark) -> bool {
        self.marks.contains(mark.flag())
    }
}

fn active_state<D: EditorDocument>(editor: &D) -> ActiveState {
    let doc = editor.doc();
    let sel = editor.selection();
    let start = sel.start();

    let marks = if sel.is_collapsed() {
        cursor_marks(editor).unwrap_or_default()
    } else {
        common_marks(editor).unwrap_or_default()
    };

    let mut state = ActiveState {
        marks: marks.flags,
        link: marks.link,
        color: marks.color,
        highlight: marks.highlight,
        font_family: marks.font_family,
        font_size: marks.font_size,
        can_undo: editor.can_undo(),
        can_redo: editor.can_redo(),
        ..Default::default()
    };

    let Some(info) = doc.leaf_info(start.leaf) else {
        return state;
    };
    let block = doc.block_at(&info.path);
    state.align = block.and_then(Block::text_body).and_then(|body| body.align);
    state.code_block = matches!(block, Some(Block::CodeBlock { .. }));
    state.bullet_list = doc
        .enclosing(&info.path, ContainerKind::BulletList)
        .is_some();
    let quoted = doc.enclosing(&info.path, ContainerKind::Blockquote).is_some();
    state.block = match block {
        Some(Block::Heading { level, .. }) => BlockStyle::Heading(*level),
        _ if quoted => BlockStyle::Quote,
        Some(Block::CodeBlock { .. }) => BlockStyle::Code,
        _ => BlockStyle::Paragraph,
    };

    state.selected_image = doc
        .selected_node(&sel)
        .filter(|&leaf| matches!(doc.leaf(leaf), Some(Block::Image(_))));
    state.has_text_selection = !sel.is_collapsed()
        && doc.selected_node(&sel).is_none()
        // Block boundaries alone do not count as text.
        && doc.plain_text_in(sel.start(), sel.end()).chars().any(|c| c != '\n');
    state
}

/// Marks text typed at the cursor would carry: the stored marks, else
/// those of the neighbouring text. `None` where text cannot take marks.
pub(crate) fn cursor_marks<D: EditorDocument>(editor: &D) -> Option<MarkSet> {
    let pos = editor.selection().head;
    let doc = editor.doc();
    if doc.leaf_info(pos.leaf)?.kind != LeafKind::Text {
        return None;
    }
    if let Some(stored) = editor.stored_marks() {
        return Some(stored.clone());
    }
    Some(marks_around(doc.text_block(pos.leaf)?, pos.offset))
}

/// Marks inherited at `offset`: those of the char before, or after at the
/// start of the block. A link only continues when both sides share it.
pub(crate) fn marks_around(body: &TextBlock, offset: usize) -> MarkSet {
    let before = offset.checked_sub(1).and_then(|i| char_marks(body, i));
    let after = char_marks(body, offset);
    let Some(base) = before.or(after) else {
        return MarkSet::default();
    };
    let mut marks = base.inheritable();
    if let (Some(b), Some(a)) = (before, after) {
        if b.link.is_some() && b.link == a.link {
            marks.link = b.link.clone();
        }
    }
    marks
}

fn char_marks(body: &TextBlock, index: usize) -> Option<&MarkSet> {
    if index < body.len() {
        body.marks_at(index + 1)
    } else {
        None
    }
}

/// Marks shared by every selected character of paragraphs and headings.
/// Attribute marks only count when they are the same everywhere.
fn common_marks<D: EditorDocument>(editor: &D) -> Option<MarkSet> {
    let doc = editor.doc();
    let sel = editor.selection();
    let (start, end) = (sel.start(), sel.end());
    let mut common: Option<MarkSet> = None;

    for (leaf, info) in doc
        .leaves()
        .into_iter()
        .enumerate()
        .take(end.leaf + 1)
        .skip(start.leaf)
    {
        if info.kind != LeafKind::Text {
            continue;
        }
        let from = if leaf == start.leaf { start.offset } else { 0 };
        let to = if leaf == end.leaf { end.offset } else { info.len };
        let Some(body) = doc.text_block(leaf) else {
            continue;
        };
        body.for_each_in(from..to, |run, _| {
            common = Some(match common.take() {
                None => run.marks.clone(),
                Some(acc) => intersect(acc, &run.marks),
            });
        });
    }
    common
}

fn intersect(acc: MarkSet, other: &MarkSet) -> MarkSet {
    fn same(a: Option<SmolStr>, b: &Option<SmolStr>) -> Option<SmolStr> {
        a.filter(|a| b.as_ref() == Some(a))
    }
    MarkSet {
        flags: acc.flags & other.flags,
        link: same(acc.link, &other.link),
        color: same(acc.color, &other.color),
        font_family: same(acc.font_family, &other.font_family),
        font_size: same(acc.font_size, &other.font_size),
        highlight: acc.highlight.filter(|h| other.highlight.as_ref() == Some(h)),
    }
}
