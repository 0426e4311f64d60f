//! Action execution for editor documents.
//!
//! This module provides the `execute_action` function that applies `EditorAction`
//! operations to any type implementing `EditorDocument`. The logic is generic
//! and platform-agnostic.
//!
//! Every command returns whether it did anything: changed the document, the
//! selection or the stored marks. Commands that cannot apply (a disabled
//! extension, a cancelled link prompt, a URL that is not a video) are no-ops.

use std::ops::Range;

use smol_str::SmolStr;
use tracing::debug;

use crate::actions::{BlockStyle, EditorAction};
use crate::config::{EditorConfig, Extension};
use crate::document::{
    Block, ContainerKind, Document, ImageNode, LeafInfo, LeafKind, ListItem, Table, TextAlign,
    TextBlock, VideoNode,
};
use crate::editor::EditorDocument;
use crate::image_view::MIN_IMAGE_WIDTH;
use crate::link::{LinkInput, normalize_link};
use crate::marks::{Highlight, MarkSet, SimpleMark};
use crate::query::{cursor_marks, marks_around};
use crate::transform::{self, TextKind};
use crate::types::{Position, Selection};
use crate::undo::EditGroup;
use crate::video::embed_url;

/// Execute an editor action on a document.
///
/// This is the central dispatch point for all editor operations.
pub fn execute_action<D: EditorDocument>(editor: &mut D, action: &EditorAction) -> bool {
    match action {
        EditorAction::InsertText(text) => insert_text(editor, text, Some(EditGroup::Typing)),
        EditorAction::InsertParagraph => insert_paragraph(editor),
        EditorAction::InsertHardBreak => insert_text(editor, "\n", None),
        EditorAction::DeleteBackward => delete_backward(editor),
        EditorAction::DeleteForward => delete_forward(editor),
        EditorAction::Undo => editor.undo(),
        EditorAction::Redo => editor.redo(),
        EditorAction::SetSelection(sel) => editor.set_selection(*sel),
        EditorAction::SelectAll => {
            let end = editor.doc().end();
            editor.set_selection(Selection::new(Position::default(), end))
        }
        EditorAction::SelectNode(leaf) => select_node(editor, *leaf),
        EditorAction::ToggleMark(mark) => toggle_mark(editor, *mark),
        EditorAction::SetColor(color) => apply_marks(editor, |m| m.color = color.clone()),
        EditorAction::SetFontFamily(family) => {
            apply_marks(editor, |m| m.font_family = family.clone())
        }
        EditorAction::SetFontSize(size) => apply_marks(editor, |m| m.font_size = size.clone()),
        EditorAction::SetHighlight(color) => set_highlight(editor, color.as_ref()),
        EditorAction::ToggleHighlight(color) => toggle_highlight(editor, color.as_ref()),
        EditorAction::SetLink(input) => set_link(editor, input.as_deref()),
        EditorAction::UnsetLink => unset_link(editor),
        EditorAction::ClearFormatting => clear_formatting(editor),
        EditorAction::SetBlockStyle(style) => set_block_style(editor, *style),
        EditorAction::SetTextAlign(align) => set_text_align(editor, *align),
        EditorAction::ToggleBulletList => toggle_wrap(editor, ContainerKind::BulletList),
        EditorAction::ToggleCodeBlock => toggle_code_block(editor),
        EditorAction::InsertHorizontalRule => insert_block(editor, None, Block::HorizontalRule),
        EditorAction::InsertTable { rows, cols, header } => {
            if !enabled(editor, Extension::Table) {
                return false;
            }
            let table = Table::grid((*rows).max(1), (*cols).max(1), *header);
            insert_block(editor, None, Block::Table(table))
        }
        EditorAction::InsertImage { src, width, at } => {
            let mut image = ImageNode::new(src.clone());
            image.width = width.map(|w| w.max(MIN_IMAGE_WIDTH));
            insert_block(editor, *at, Block::Image(image))
        }
        EditorAction::SetImageWidth { leaf, width } => set_image_width(editor, *leaf, *width),
        EditorAction::InsertVideo(url) => insert_video(editor, url),
    }
}

fn enabled<D: EditorDocument>(editor: &D, extension: Extension) -> bool {
    match editor.config().require(extension) {
        Ok(()) => true,
        Err(err) => {
            debug!(%err, "command skipped");
            false
        }
    }
}

/// Run a document edit through history. Any change consumes stored marks.
fn edit<D: EditorDocument>(
    editor: &mut D,
    group: Option<EditGroup>,
    f: impl FnOnce(&mut Document, &mut Selection) -> bool,
) -> bool {
    let changed = editor.transact(group, f);
    if changed {
        editor.set_stored_marks(None);
    }
    changed
}

/// Delete the selected content, returning where the cursor lands.
fn delete_selection(doc: &mut Document, sel: &Selection) -> Position {
    if sel.is_collapsed() {
        doc.clamp(sel.head)
    } else {
        doc.delete_range(sel.start(), sel.end())
    }
}

/// A text position at `at`, creating a paragraph beside an atom.
fn text_position(doc: &mut Document, at: Position) -> Position {
    let at = doc.clamp(at);
    match doc.leaf_info(at.leaf) {
        Some(info) if info.kind == LeafKind::Atom => doc
            .insert_block_at(at, Block::empty_paragraph())
            .and_then(|path| doc.leaf_index_at_or_below(&path))
            .map(|leaf| Position::new(leaf, 0))
            .unwrap_or(at),
        _ => at,
    }
}

/// Leaves touched by the selection, with the char range selected in each.
fn selected_leaves(doc: &Document, sel: &Selection) -> Vec<(usize, LeafInfo, Range<usize>)> {
    let (start, end) = (sel.start(), sel.end());
    doc.leaves()
        .into_iter()
        .enumerate()
        .skip(start.leaf)
        .take(end.leaf.saturating_sub(start.leaf) + 1)
        .map(|(i, info)| {
            let from = if i == start.leaf {
                start.offset.min(info.len)
            } else {
                0
            };
            let to = if i == end.leaf {
                end.offset.min(info.len)
            } else {
                info.len
            };
            (i, info, from..to)
        })
        .collect()
}

/// Non-empty selected spans of paragraphs and headings. Code blocks carry
/// no marks.
fn markable_ranges(doc: &Document, sel: &Selection) -> Vec<(usize, Range<usize>)> {
    selected_leaves(doc, sel)
        .into_iter()
        .filter(|(_, info, range)| info.kind == LeafKind::Text && range.start < range.end)
        .map(|(leaf, _, range)| (leaf, range))
        .collect()
}

fn all_marked(
    doc: &Document,
    ranges: &[(usize, Range<usize>)],
    pred: impl Fn(&MarkSet) -> bool,
) -> bool {
    !ranges.is_empty()
        && ranges.iter().all(|(leaf, range)| {
            let mut all = true;
            if let Some(body) = doc.text_block(*leaf) {
                body.for_each_in(range.clone(), |run, _| all &= pred(&run.marks));
            }
            all
        })
}

// === Text input ===

fn insert_text<D: EditorDocument>(editor: &mut D, text: &str, group: Option<EditGroup>) -> bool {
    if text.is_empty() {
        return false;
    }
    let sel = editor.selection();
    let start = sel.start();
    let marks = match editor.stored_marks() {
        Some(stored) => stored.clone(),
        None => editor
            .doc()
            .text_block(start.leaf)
            .map(|body| marks_around(body, start.offset))
            .unwrap_or_default(),
    };
    let group = if sel.is_collapsed() { group } else { None };

    edit(editor, group, |doc, sel| {
        let deleted = !sel.is_collapsed();
        let at = delete_selection(doc, sel);
        let at = text_position(doc, at);
        let marks = match doc.leaf_info(at.leaf).map(|info| info.kind) {
            Some(LeafKind::Text) => marks,
            _ => MarkSet::default(),
        };
        let code = matches!(doc.leaf(at.leaf), Some(Block::CodeBlock { .. }));
        let text = normalize_input(text, code);
        let Some(body) = doc.text_block_mut(at.leaf) else {
            return deleted;
        };
        body.insert(at.offset, &text, marks);
        *sel = Selection::collapsed(Position::new(at.leaf, at.offset + text.chars().count()));
        true
    })
}

/// Line endings become `\n`; outside code blocks tabs become spaces.
fn normalize_input(text: &str, code: bool) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    if code { text } else { text.replace('\t', " ") }
}

fn insert_paragraph<D: EditorDocument>(editor: &mut D) -> bool {
    let start = editor.selection().start();
    // Marks carry over the split so typing continues in the same style.
    let keep = editor.stored_marks().cloned().or_else(|| {
        let doc = editor.doc();
        let info = doc.leaf_info(start.leaf)?;
        (info.kind == LeafKind::Text && start.offset > 0)
            .then(|| doc.text_block(start.leaf).map(|b| marks_around(b, start.offset)))
            .flatten()
    });

    let changed = edit(editor, None, split_block);
    if changed {
        if let Some(marks) = keep.filter(|m| !m.is_empty()) {
            editor.set_stored_marks(Some(marks));
        }
    }
    changed
}

fn split_block(doc: &mut Document, sel: &mut Selection) -> bool {
    let deleted = !sel.is_collapsed();
    let at = delete_selection(doc, sel);
    let Some(info) = doc.leaf_info(at.leaf) else {
        return deleted;
    };
    let cursor = match info.kind {
        LeafKind::Atom => doc
            .insert_block_at(Position::new(at.leaf, 1), Block::empty_paragraph())
            .and_then(|path| doc.leaf_index_at_or_below(&path))
            .map(|leaf| Position::new(leaf, 0)),
        LeafKind::Code => code_newline(doc, &info, at),
        LeafKind::Text => split_text(doc, &info, at),
    };
    match cursor {
        Some(cursor) => {
            *sel = Selection::collapsed(cursor);
            true
        }
        None => deleted,
    }
}

/// Enter inside a code block inserts a newline; the third Enter at the end
/// leaves the block.
fn code_newline(doc: &mut Document, info: &LeafInfo, at: Position) -> Option<Position> {
    let body = doc.block_at_mut(&info.path)?.text_body_mut()?;
    let len = body.len();
    if at.offset == len && body.plain_text().ends_with("\n\n") {
        body.delete(len - 2..len);
        let (&idx, prefix) = info.path.split_last()?;
        doc.list_at_mut(prefix)?
            .insert(idx + 1, Block::empty_paragraph());
        return Some(Position::new(at.leaf + 1, 0));
    }
    body.insert(at.offset, "\n", MarkSet::default());
    Some(Position::new(at.leaf, at.offset + 1))
}

fn split_text(doc: &mut Document, info: &LeafInfo, at: Position) -> Option<Position> {
    let levels = doc.ancestry(&info.path)?;
    let child = levels.last()?.index;
    let parent = levels.len().checked_sub(2).map(|i| levels[i].block_path());
    let parent_kind = parent
        .as_deref()
        .and_then(|path| doc.block_at(path))
        .and_then(Block::container_kind);

    match (parent, parent_kind) {
        (Some(list_path), Some(ContainerKind::BulletList)) => {
            let item = info.path[list_path.len()];
            let item_len = match doc.block_at(&list_path) {
                Some(Block::BulletList(items)) => items.get(item)?.blocks.len(),
                _ => return None,
            };
            if info.len == 0 && item_len == 1 {
                // Enter on an empty item leaves the list.
                return transform::lift(doc, &list_path, item..=item).then_some(at);
            }
            split_list_item(doc, &list_path, item, child, at)
        }
        (Some(quote_path), Some(ContainerKind::Blockquote)) if info.len == 0 => {
            transform::lift(doc, &quote_path, child..=child).then_some(at)
        }
        _ => {
            let (&idx, prefix) = info.path.split_last()?;
            let block = doc.block_at_mut(&info.path)?;
            let tail = block.text_body_mut()?.split_off(at.offset);
            let tail = continuation(block, tail);
            doc.list_at_mut(prefix)?.insert(idx + 1, tail);
            Some(Position::new(at.leaf + 1, 0))
        }
    }
}

/// Split a list item at `at`: the rest of the block and every block after
/// it in the item move to a new item.
fn split_list_item(
    doc: &mut Document,
    list_path: &[usize],
    item: usize,
    child: usize,
    at: Position,
) -> Option<Position> {
    let Some(Block::BulletList(items)) = doc.block_at_mut(list_path) else {
        return None;
    };
    let current = items.get_mut(item)?;
    let block = current.blocks.get_mut(child)?;
    let tail = block.text_body_mut()?.split_off(at.offset);
    let first = continuation(block, tail);
    let mut moved = current.blocks.split_off(child + 1);
    moved.insert(0, first);
    items.insert(item + 1, ListItem { blocks: moved });
    Some(Position::new(at.leaf + 1, 0))
}

/// Block for text split off the end of `block`. A heading split at its end
/// continues as a paragraph.
fn continuation(block: &Block, tail: TextBlock) -> Block {
    match block {
        Block::Heading { level, .. } if !tail.is_empty() => Block::Heading {
            level: *level,
            body: tail,
        },
        _ => Block::Paragraph(tail),
    }
}

// === Deletion ===

fn delete_selected<D: EditorDocument>(editor: &mut D) -> bool {
    edit(editor, None, |doc, sel| {
        let at = doc.delete_range(sel.start(), sel.end());
        *sel = Selection::collapsed(at);
        true
    })
}

fn delete_char<D: EditorDocument>(editor: &mut D, leaf: usize, range: Range<usize>) -> bool {
    edit(editor, Some(EditGroup::Deleting), |doc, sel| {
        let Some(body) = doc.text_block_mut(leaf) else {
            return false;
        };
        body.delete(range.clone());
        *sel = Selection::collapsed(Position::new(leaf, range.start));
        true
    })
}

/// What Backspace at the start of a block does.
enum JoinPlan {
    /// Turn a heading or code block into a paragraph.
    Retype,
    /// Move the block out of its list item or blockquote.
    Lift(Vec<usize>, usize),
    /// Node-select an atom, removing the empty block in front of it.
    SelectAtom { atom: usize, remove: Option<Vec<usize>> },
    /// Merge two text leaves.
    Join { from: Position, to: Position },
    /// Drop an empty block and put the cursor here.
    Remove { path: Vec<usize>, cursor: Position },
    Nothing,
}

fn backward_plan(doc: &Document, pos: Position, info: &LeafInfo) -> Option<JoinPlan> {
    let is_text_kind_change = match doc.block_at(&info.path)? {
        Block::Heading { .. } => pos.leaf == 0,
        Block::CodeBlock { .. } => pos.leaf == 0 || info.len == 0,
        _ => false,
    };
    if is_text_kind_change {
        return Some(JoinPlan::Retype);
    }

    let levels = doc.ancestry(&info.path)?;
    let child = levels.last()?.index;
    if let Some(parent) = levels.len().checked_sub(2).map(|i| levels[i].block_path()) {
        match doc.block_at(&parent).and_then(Block::container_kind) {
            Some(ContainerKind::BulletList) if child == 0 => {
                let item = info.path[parent.len()];
                return Some(JoinPlan::Lift(parent, item));
            }
            Some(ContainerKind::Blockquote) if child == 0 => {
                return Some(JoinPlan::Lift(parent, 0));
            }
            _ => {}
        }
    }

    let Some(prev) = pos.leaf.checked_sub(1) else {
        return Some(JoinPlan::Nothing);
    };
    let prev_info = doc.leaf_info(prev)?;
    let empty = info.len == 0;
    if prev_info.kind == LeafKind::Atom {
        return Some(JoinPlan::SelectAtom {
            atom: prev,
            remove: empty.then(|| info.path.clone()),
        });
    }
    if doc.cell_of(&prev_info.path) != doc.cell_of(&info.path) {
        return Some(JoinPlan::Nothing);
    }
    let prev_end = Position::new(prev, prev_info.len);
    if empty {
        return Some(JoinPlan::Remove {
            path: info.path.clone(),
            cursor: prev_end,
        });
    }
    Some(JoinPlan::Join {
        from: prev_end,
        to: pos,
    })
}

fn delete_backward<D: EditorDocument>(editor: &mut D) -> bool {
    let sel = editor.selection();
    if !sel.is_collapsed() {
        return delete_selected(editor);
    }
    let pos = sel.head;
    let Some(info) = editor.doc().leaf_info(pos.leaf) else {
        return false;
    };
    if info.kind == LeafKind::Atom {
        return false;
    }
    if pos.offset > 0 {
        return delete_char(editor, pos.leaf, pos.offset - 1..pos.offset);
    }
    let Some(plan) = backward_plan(editor.doc(), pos, &info) else {
        return false;
    };
    run_plan(editor, plan, &info)
}

fn delete_forward<D: EditorDocument>(editor: &mut D) -> bool {
    let sel = editor.selection();
    if !sel.is_collapsed() {
        return delete_selected(editor);
    }
    let pos = sel.head;
    let doc = editor.doc();
    let Some(info) = doc.leaf_info(pos.leaf) else {
        return false;
    };
    if info.kind == LeafKind::Atom {
        return false;
    }
    if pos.offset < info.len {
        return delete_char(editor, pos.leaf, pos.offset..pos.offset + 1);
    }
    let Some(next_info) = doc.leaf_info(pos.leaf + 1) else {
        return false;
    };
    let empty = info.len == 0;
    let plan = if next_info.kind == LeafKind::Atom {
        JoinPlan::SelectAtom {
            // Removing the empty block shifts the atom into its place.
            atom: if empty { pos.leaf } else { pos.leaf + 1 },
            remove: empty.then(|| info.path.clone()),
        }
    } else if doc.cell_of(&next_info.path) != doc.cell_of(&info.path) {
        JoinPlan::Nothing
    } else if empty {
        JoinPlan::Remove {
            path: info.path.clone(),
            cursor: pos,
        }
    } else {
        JoinPlan::Join {
            from: pos,
            to: Position::new(pos.leaf + 1, 0),
        }
    };
    run_plan(editor, plan, &info)
}

fn run_plan<D: EditorDocument>(editor: &mut D, plan: JoinPlan, info: &LeafInfo) -> bool {
    match plan {
        JoinPlan::Nothing => false,
        JoinPlan::Retype => edit(editor, None, |doc, _| {
            doc.block_at_mut(&info.path)
                .is_some_and(|block| transform::retype(block, TextKind::Paragraph))
        }),
        JoinPlan::Lift(container, index) => edit(editor, None, |doc, _| {
            transform::lift(doc, &container, index..=index)
        }),
        JoinPlan::SelectAtom {
            atom,
            remove: Some(path),
        } => edit(editor, None, |doc, sel| {
            doc.remove_block(&path);
            *sel = Selection::node(atom);
            true
        }),
        JoinPlan::SelectAtom { atom, remove: None } => editor.set_selection(Selection::node(atom)),
        JoinPlan::Join { from, to } => edit(editor, None, |doc, sel| {
            let at = doc.delete_range(from, to);
            *sel = Selection::collapsed(at);
            true
        }),
        JoinPlan::Remove { path, cursor } => edit(editor, None, |doc, sel| {
            doc.remove_block(&path);
            *sel = Selection::collapsed(cursor);
            true
        }),
    }
}

fn select_node<D: EditorDocument>(editor: &mut D, leaf: usize) -> bool {
    match editor.doc().leaf_info(leaf) {
        Some(info) if info.kind == LeafKind::Atom => editor.set_selection(Selection::node(leaf)),
        _ => false,
    }
}

// === Marks ===

/// Apply `f` to the marks of the selection, or to the stored marks when the
/// selection is collapsed.
fn apply_marks<D: EditorDocument>(editor: &mut D, f: impl Fn(&mut MarkSet)) -> bool {
    let sel = editor.selection();
    if sel.is_collapsed() {
        let Some(mut marks) = cursor_marks(editor) else {
            return false;
        };
        f(&mut marks);
        editor.set_stored_marks(Some(marks));
        return true;
    }
    apply_marks_in(editor, &sel, f)
}

fn apply_marks_in<D: EditorDocument>(
    editor: &mut D,
    sel: &Selection,
    f: impl Fn(&mut MarkSet),
) -> bool {
    let ranges = markable_ranges(editor.doc(), sel);
    if ranges.is_empty() {
        return false;
    }
    edit(editor, None, |doc, _| {
        let mut changed = false;
        for (leaf, range) in ranges {
            if let Some(body) = doc.text_block_mut(leaf) {
                let before = body.clone();
                body.update_marks(range, &f);
                changed |= *body != before;
            }
        }
        changed
    })
}

fn toggle_mark<D: EditorDocument>(editor: &mut D, mark: SimpleMark) -> bool {
    if mark == SimpleMark::Underline && !enabled(editor, Extension::Underline) {
        return false;
    }
    let sel = editor.selection();
    let on = if sel.is_collapsed() {
        match cursor_marks(editor) {
            Some(marks) => !marks.has(mark),
            None => return false,
        }
    } else {
        let ranges = markable_ranges(editor.doc(), &sel);
        !all_marked(editor.doc(), &ranges, |m| m.has(mark))
    };
    apply_marks(editor, |m| m.set(mark, on))
}

/// Highlight for a swatch; single-color highlighting ignores the color.
fn highlight_value(config: &EditorConfig, color: Option<&SmolStr>) -> Highlight {
    Highlight {
        color: color.filter(|_| config.highlight.multicolor).cloned(),
    }
}

fn set_highlight<D: EditorDocument>(editor: &mut D, color: Option<&SmolStr>) -> bool {
    if !enabled(editor, Extension::Highlight) {
        return false;
    }
    let value = color.map(|c| highlight_value(editor.config(), Some(c)));
    apply_marks(editor, |m| m.highlight = value.clone())
}

fn toggle_highlight<D: EditorDocument>(editor: &mut D, color: Option<&SmolStr>) -> bool {
    if !enabled(editor, Extension::Highlight) {
        return false;
    }
    let value = highlight_value(editor.config(), color);
    let sel = editor.selection();
    let on = if sel.is_collapsed() {
        match cursor_marks(editor) {
            Some(marks) => marks.highlight.as_ref() != Some(&value),
            None => return false,
        }
    } else {
        let ranges = markable_ranges(editor.doc(), &sel);
        !all_marked(editor.doc(), &ranges, |m| m.highlight.as_ref() == Some(&value))
    };
    apply_marks(editor, |m| m.highlight = on.then(|| value.clone()))
}

/// The link under a collapsed cursor.
fn link_at(doc: &Document, pos: Position) -> Option<(usize, Range<usize>)> {
    let info = doc.leaf_info(pos.leaf)?;
    if info.kind != LeafKind::Text {
        return None;
    }
    let (range, _) = doc.text_block(pos.leaf)?.link_range_at(pos.offset)?;
    Some((pos.leaf, range))
}

/// Grow a selection lying inside one link to cover the whole link.
fn extend_to_link(doc: &Document, sel: Selection) -> Selection {
    let (start, end) = (sel.start(), sel.end());
    if start.leaf != end.leaf {
        return sel;
    }
    match link_at(doc, start) {
        Some((leaf, range)) if range.start <= start.offset && range.end >= end.offset => {
            Selection::new(Position::new(leaf, range.start), Position::new(leaf, range.end))
        }
        _ => sel,
    }
}

fn set_link<D: EditorDocument>(editor: &mut D, input: Option<&str>) -> bool {
    let Some(input) = input else {
        return false;
    };
    if !enabled(editor, Extension::Link) {
        return false;
    }
    let href = match normalize_link(input) {
        LinkInput::Clear => return unset_link(editor),
        LinkInput::Href(href) => href,
    };
    let sel = editor.selection();
    if sel.is_collapsed() {
        return match link_at(editor.doc(), sel.head) {
            Some((leaf, range)) => {
                let span = Selection::new(Position::new(leaf, range.start), Position::new(leaf, range.end));
                apply_marks_in(editor, &span, |m| m.link = Some(href.clone()))
            }
            None => apply_marks(editor, |m| m.link = Some(href.clone())),
        };
    }
    let span = extend_to_link(editor.doc(), sel);
    apply_marks_in(editor, &span, |m| m.link = Some(href.clone()))
}

fn unset_link<D: EditorDocument>(editor: &mut D) -> bool {
    if !enabled(editor, Extension::Link) {
        return false;
    }
    let sel = editor.selection();
    if !sel.is_collapsed() {
        let span = extend_to_link(editor.doc(), sel);
        return apply_marks_in(editor, &span, |m| m.link = None);
    }
    if let Some((leaf, range)) = link_at(editor.doc(), sel.head) {
        let span = Selection::new(Position::new(leaf, range.start), Position::new(leaf, range.end));
        return apply_marks_in(editor, &span, |m| m.link = None);
    }
    match editor.stored_marks() {
        Some(stored) if stored.link.is_some() => {
            let marks = MarkSet {
                link: None,
                ..stored.clone()
            };
            editor.set_stored_marks(Some(marks));
            true
        }
        _ => false,
    }
}

fn clear_formatting<D: EditorDocument>(editor: &mut D) -> bool {
    let sel = editor.selection();
    let doc = editor.doc();
    let ranges = markable_ranges(doc, &sel);
    let blocks: Vec<Vec<usize>> = selected_leaves(doc, &sel)
        .into_iter()
        .filter(|(_, info, _)| info.kind != LeafKind::Atom)
        .map(|(_, info, _)| info.path)
        .collect();
    let pending = sel.is_collapsed() && cursor_marks(editor).is_some_and(|m| !m.is_empty());

    let changed = edit(editor, None, |doc, _| {
        let mut changed = false;
        for (leaf, range) in ranges {
            if let Some(body) = doc.text_block_mut(leaf) {
                let before = body.clone();
                body.update_marks(range, |m| *m = MarkSet::default());
                changed |= *body != before;
            }
        }
        for path in &blocks {
            if let Some(block) = doc.block_at_mut(path) {
                changed |= transform::retype(block, TextKind::Paragraph);
            }
        }
        changed
    });
    if pending {
        editor.set_stored_marks(Some(MarkSet::default()));
    }
    changed || pending
}

// === Blocks ===

/// Paths of the text blocks (paragraphs, headings and code) in the selection.
fn selected_text_blocks(doc: &Document, sel: &Selection) -> Vec<Vec<usize>> {
    selected_leaves(doc, sel)
        .into_iter()
        .filter(|(_, info, _)| info.kind != LeafKind::Atom)
        .map(|(_, info, _)| info.path)
        .collect()
}

fn retype_selected<D: EditorDocument>(editor: &mut D, kind: TextKind) -> bool {
    let paths = selected_text_blocks(editor.doc(), &editor.selection());
    edit(editor, None, |doc, _| {
        let mut changed = false;
        for path in &paths {
            if let Some(block) = doc.block_at_mut(path) {
                changed |= transform::retype(block, kind);
            }
        }
        changed
    })
}

/// Whether every selected text block already is `kind`.
fn all_kind(doc: &Document, sel: &Selection, kind: TextKind) -> bool {
    let paths = selected_text_blocks(doc, sel);
    !paths.is_empty()
        && paths
            .iter()
            .all(|path| doc.block_at(path).and_then(TextKind::of) == Some(kind))
}

fn set_block_style<D: EditorDocument>(editor: &mut D, style: BlockStyle) -> bool {
    match style {
        BlockStyle::Paragraph => retype_selected(editor, TextKind::Paragraph),
        BlockStyle::Heading(level) => {
            if !editor.config().heading_enabled(level) {
                debug!(level, "heading level not enabled");
                return false;
            }
            let heading = TextKind::Heading(level);
            let kind = if all_kind(editor.doc(), &editor.selection(), heading) {
                TextKind::Paragraph
            } else {
                heading
            };
            retype_selected(editor, kind)
        }
        BlockStyle::Quote => toggle_wrap(editor, ContainerKind::Blockquote),
        BlockStyle::Code => toggle_code_block(editor),
    }
}

fn toggle_code_block<D: EditorDocument>(editor: &mut D) -> bool {
    let kind = if all_kind(editor.doc(), &editor.selection(), TextKind::Code) {
        TextKind::Paragraph
    } else {
        TextKind::Code
    };
    retype_selected(editor, kind)
}

fn set_text_align<D: EditorDocument>(editor: &mut D, align: Option<TextAlign>) -> bool {
    let leaves: Vec<usize> = selected_leaves(editor.doc(), &editor.selection())
        .into_iter()
        .filter(|(_, info, _)| info.kind == LeafKind::Text)
        .map(|(leaf, _, _)| leaf)
        .collect();
    edit(editor, None, |doc, _| {
        let mut changed = false;
        for leaf in leaves {
            if let Some(body) = doc.text_block_mut(leaf) {
                changed |= body.align != align;
                body.align = align;
            }
        }
        changed
    })
}

enum WrapPlan {
    Lift(Vec<usize>, std::ops::RangeInclusive<usize>),
    Wrap(Vec<usize>, std::ops::RangeInclusive<usize>),
}

/// Toggle a blockquote or bullet list around the selected blocks. Inside
/// one already, the selected children are lifted out instead.
fn toggle_wrap<D: EditorDocument>(editor: &mut D, kind: ContainerKind) -> bool {
    let sel = editor.selection();
    let doc = editor.doc();
    let (Some(first), Some(last)) = (doc.leaf_info(sel.start().leaf), doc.leaf_info(sel.end().leaf))
    else {
        return false;
    };

    let plan = if let Some(level) = doc.enclosing(&first.path, kind) {
        let container = level.block_path();
        let depth = container.len();
        let count = match doc.block_at(&container) {
            Some(Block::Blockquote(children)) => children.len(),
            Some(Block::BulletList(items)) => items.len(),
            _ => return false,
        };
        let from = first.path[depth];
        let to = if last.path.len() > depth && last.path.starts_with(&container) {
            last.path[depth]
        } else {
            count - 1
        };
        WrapPlan::Lift(container, from..=to)
    } else {
        let Some((prefix, range)) = transform::common_level(doc, &first.path, &last.path) else {
            return false;
        };
        WrapPlan::Wrap(prefix, range)
    };

    edit(editor, None, |doc, _| match plan {
        WrapPlan::Lift(container, range) => transform::lift(doc, &container, range),
        WrapPlan::Wrap(prefix, range) => transform::wrap(doc, &prefix, range, kind),
    })
}

// === Embeds ===

/// Insert a block at `at`, or in place of the selection.
fn insert_block<D: EditorDocument>(editor: &mut D, at: Option<Position>, block: Block) -> bool {
    let is_table = matches!(block, Block::Table(_));
    edit(editor, None, |doc, sel| {
        let deleted = at.is_none() && !sel.is_collapsed();
        let pos = match at {
            Some(at) => doc.clamp(at),
            None => delete_selection(doc, sel),
        };
        let Some(path) = doc.insert_block_at(pos, block) else {
            return deleted;
        };
        if let Some(leaf) = doc.leaf_index_at_or_below(&path) {
            // After an atom; normalizing moves the cursor to the next text.
            let offset = if is_table { 0 } else { 1 };
            *sel = Selection::collapsed(Position::new(leaf, offset));
        }
        true
    })
}

fn set_image_width<D: EditorDocument>(editor: &mut D, leaf: usize, width: u32) -> bool {
    let width = width.max(MIN_IMAGE_WIDTH);
    edit(editor, Some(EditGroup::Resize(leaf)), |doc, _| match doc.leaf_mut(leaf) {
        Some(Block::Image(image)) if image.width != Some(width) => {
            image.width = Some(width);
            true
        }
        _ => false,
    })
}

fn insert_video<D: EditorDocument>(editor: &mut D, url: &str) -> bool {
    if !enabled(editor, Extension::Video) {
        return false;
    }
    let Some(src) = embed_url(url, editor.config().video.nocookie) else {
        debug!(url, "not a video link");
        return false;
    };
    insert_block(editor, None, Block::Video(VideoNode { src }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::Editor;

    fn editor(html: &str) -> Editor {
        Editor::from_html(html, EditorConfig::default()).unwrap()
    }

    fn at(leaf: usize, offset: usize) -> Selection {
        Selection::collapsed(Position::new(leaf, offset))
    }

    fn span(leaf_a: usize, a: usize, leaf_b: usize, b: usize) -> Selection {
        Selection::new(Position::new(leaf_a, a), Position::new(leaf_b, b))
    }

    fn run(editor: &mut Editor, action: EditorAction) -> bool {
        execute_action(editor, &action)
    }

    fn type_text(editor: &mut Editor, text: &str) {
        for c in text.chars() {
            run(editor, EditorAction::InsertText(c.to_string()));
        }
    }

    #[test]
    fn test_typing_into_empty_document() {
        let mut ed = Editor::default();
        type_text(&mut ed, "hello");
        assert_eq!(ed.content_html(), "<p>hello</p>");
        assert_eq!(ed.selection(), at(0, 5));
    }

    #[test]
    fn test_stored_bold_applies_to_next_typing() {
        let mut ed = editor("<p>x</p>");
        ed.set_selection(at(0, 1));
        assert!(run(&mut ed, EditorAction::ToggleMark(SimpleMark::Bold)));
        // Nothing typed yet, document untouched.
        assert_eq!(ed.content_html(), "<p>x</p>");
        type_text(&mut ed, "yz");
        assert_eq!(ed.content_html(), "<p>x<strong>yz</strong></p>");
    }

    #[test]
    fn test_toggling_stored_mark_twice_cancels_it() {
        let mut ed = editor("<p>x</p>");
        ed.set_selection(at(0, 1));
        run(&mut ed, EditorAction::ToggleMark(SimpleMark::Bold));
        run(&mut ed, EditorAction::ToggleMark(SimpleMark::Bold));
        type_text(&mut ed, "yz");
        assert_eq!(ed.content_html(), "<p>xyz</p>");
    }

    #[test]
    fn test_toggle_mark_over_partially_marked_range() {
        let mut ed = editor("<p>a<strong>b</strong>c</p>");
        ed.set_selection(span(0, 0, 0, 3));
        run(&mut ed, EditorAction::ToggleMark(SimpleMark::Bold));
        assert_eq!(ed.content_html(), "<p><strong>abc</strong></p>");
        run(&mut ed, EditorAction::ToggleMark(SimpleMark::Bold));
        assert_eq!(ed.content_html(), "<p>abc</p>");
    }

    #[test]
    fn test_underline_needs_extension() {
        let mut config = EditorConfig::default();
        config.underline.enabled = false;
        let mut ed = Editor::from_html("<p>abc</p>", config).unwrap();
        ed.set_selection(span(0, 0, 0, 3));
        assert!(!run(&mut ed, EditorAction::ToggleMark(SimpleMark::Underline)));
        assert_eq!(ed.content_html(), "<p>abc</p>");
    }

    #[test]
    fn test_set_link_normalizes_bare_host() {
        let mut ed = editor("<p>see example</p>");
        ed.set_selection(span(0, 4, 0, 11));
        assert!(run(&mut ed, EditorAction::SetLink(Some("example.com".into()))));
        assert_eq!(
            ed.content_html(),
            r#"<p>see <a target="_blank" rel="noopener noreferrer nofollow" href="https://example.com">example</a></p>"#
        );
    }

    #[test]
    fn test_empty_link_input_removes_link() {
        let mut ed = editor(r#"<p>go <a href="https://x.example">here</a> now</p>"#);
        ed.set_selection(span(0, 4, 0, 5));
        assert!(run(&mut ed, EditorAction::SetLink(Some("  ".into()))));
        assert_eq!(ed.content_html(), "<p>go here now</p>");
    }

    #[test]
    fn test_cancelled_link_prompt_is_noop() {
        let mut ed = editor("<p>abc</p>");
        ed.set_selection(span(0, 0, 0, 3));
        assert!(!run(&mut ed, EditorAction::SetLink(None)));
        assert!(!ed.can_undo());
    }

    #[test]
    fn test_typing_after_link_does_not_extend_it() {
        let mut ed = editor(r#"<p><a href="https://x.example">ab</a></p>"#);
        ed.set_selection(at(0, 2));
        type_text(&mut ed, "c");
        assert_eq!(
            ed.content_html(),
            r#"<p><a target="_blank" rel="noopener noreferrer nofollow" href="https://x.example">ab</a>c</p>"#
        );
    }

    #[test]
    fn test_enter_splits_paragraph() {
        let mut ed = editor("<p>abcd</p>");
        ed.set_selection(at(0, 2));
        run(&mut ed, EditorAction::InsertParagraph);
        assert_eq!(ed.content_html(), "<p>ab</p><p>cd</p>");
        assert_eq!(ed.selection(), at(1, 0));
    }

    #[test]
    fn test_enter_at_heading_end_starts_paragraph() {
        let mut ed = editor("<h2>Title</h2>");
        ed.set_selection(at(0, 5));
        run(&mut ed, EditorAction::InsertParagraph);
        type_text(&mut ed, "x");
        assert_eq!(ed.content_html(), "<h2>Title</h2><p>x</p>");
    }

    #[test]
    fn test_enter_keeps_marks_for_next_line() {
        let mut ed = editor("<p><em>a</em></p>");
        ed.set_selection(at(0, 1));
        run(&mut ed, EditorAction::InsertParagraph);
        type_text(&mut ed, "b");
        assert_eq!(ed.content_html(), "<p><em>a</em></p><p><em>b</em></p>");
    }

    #[test]
    fn test_enter_twice_leaves_list() {
        let mut ed = editor("<ul><li><p>a</p></li></ul>");
        ed.set_selection(at(0, 1));
        run(&mut ed, EditorAction::InsertParagraph);
        assert_eq!(
            ed.content_html(),
            "<ul><li><p>a</p></li><li><p></p></li></ul>"
        );
        run(&mut ed, EditorAction::InsertParagraph);
        assert_eq!(ed.content_html(), "<ul><li><p>a</p></li></ul><p></p>");
        assert_eq!(ed.selection(), at(1, 0));
    }

    #[test]
    fn test_triple_enter_exits_code_block() {
        let mut ed = editor("<pre><code>x</code></pre>");
        ed.set_selection(at(0, 1));
        run(&mut ed, EditorAction::InsertParagraph);
        run(&mut ed, EditorAction::InsertParagraph);
        assert_eq!(ed.doc().text_block(0).unwrap().plain_text(), "x\n\n");
        run(&mut ed, EditorAction::InsertParagraph);
        assert_eq!(ed.content_html(), "<pre><code>x</code></pre><p></p>");
        assert_eq!(ed.selection(), at(1, 0));
    }

    #[test]
    fn test_hard_break() {
        let mut ed = editor("<p>ab</p>");
        ed.set_selection(at(0, 1));
        run(&mut ed, EditorAction::InsertHardBreak);
        assert_eq!(ed.content_html(), "<p>a<br>b</p>");
    }

    #[test]
    fn test_backspace_joins_paragraphs() {
        let mut ed = editor("<p>ab</p><p>cd</p>");
        ed.set_selection(at(1, 0));
        run(&mut ed, EditorAction::DeleteBackward);
        assert_eq!(ed.content_html(), "<p>abcd</p>");
        assert_eq!(ed.selection(), at(0, 2));
    }

    #[test]
    fn test_backspace_selects_then_deletes_image() {
        let mut ed = editor(r#"<p>a</p><img src="x.png"><p>b</p>"#);
        ed.set_selection(at(2, 0));
        run(&mut ed, EditorAction::DeleteBackward);
        assert_eq!(ed.selection(), Selection::node(1));
        run(&mut ed, EditorAction::DeleteBackward);
        assert_eq!(ed.content_html(), "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_backspace_lifts_first_list_item() {
        let mut ed = editor("<ul><li><p>a</p></li><li><p>b</p></li></ul>");
        ed.set_selection(at(0, 0));
        run(&mut ed, EditorAction::DeleteBackward);
        assert_eq!(ed.content_html(), "<p>a</p><ul><li><p>b</p></li></ul>");
    }

    #[test]
    fn test_backspace_in_first_heading_makes_paragraph() {
        let mut ed = editor("<h1>T</h1>");
        run(&mut ed, EditorAction::DeleteBackward);
        assert_eq!(ed.content_html(), "<p>T</p>");
    }

    #[test]
    fn test_delete_forward_joins_next() {
        let mut ed = editor("<p>ab</p><p>cd</p>");
        ed.set_selection(at(0, 2));
        run(&mut ed, EditorAction::DeleteForward);
        assert_eq!(ed.content_html(), "<p>abcd</p>");
    }

    #[test]
    fn test_typing_replaces_cross_block_selection() {
        let mut ed = editor("<p>hello</p><p>world</p>");
        ed.set_selection(span(0, 2, 1, 3));
        run(&mut ed, EditorAction::InsertText("X".into()));
        assert_eq!(ed.content_html(), "<p>heXld</p>");
    }

    #[test]
    fn test_undo_restores_and_drops_stored_marks() {
        let mut ed = editor("<p>a</p>");
        ed.set_selection(at(0, 1));
        type_text(&mut ed, "bc");
        run(&mut ed, EditorAction::ToggleMark(SimpleMark::Bold));
        assert!(run(&mut ed, EditorAction::Undo));
        assert_eq!(ed.content_html(), "<p>a</p>");
        assert!(ed.stored_marks().is_none());
        assert!(run(&mut ed, EditorAction::Redo));
        assert_eq!(ed.content_html(), "<p>abc</p>");
    }

    #[test]
    fn test_insert_image_replaces_selection() {
        let mut ed = editor("<p>abcd</p>");
        ed.set_selection(span(0, 1, 0, 3));
        run(
            &mut ed,
            EditorAction::InsertImage {
                src: "x.png".into(),
                width: None,
                at: None,
            },
        );
        assert_eq!(ed.content_html(), r#"<p>a</p><img src="x.png"><p>d</p>"#);
        assert_eq!(ed.selection(), at(2, 0));
    }

    #[test]
    fn test_insert_image_at_drop_position() {
        let mut ed = editor("<p>ab</p><p>cd</p>");
        ed.set_selection(at(0, 0));
        run(
            &mut ed,
            EditorAction::InsertImage {
                src: "y.png".into(),
                width: Some(10),
                at: Some(Position::new(1, 2)),
            },
        );
        assert_eq!(
            ed.content_html(),
            r#"<p>ab</p><p>cd</p><img src="y.png" width="50"><p></p>"#
        );
    }

    #[test]
    fn test_image_resizes_clamp_and_merge() {
        let mut ed = editor(r#"<img src="x.png"><p></p>"#);
        run(&mut ed, EditorAction::SetImageWidth { leaf: 0, width: 300 });
        run(&mut ed, EditorAction::SetImageWidth { leaf: 0, width: 10 });
        assert_eq!(ed.content_html(), r#"<img src="x.png" width="50"><p></p>"#);
        run(&mut ed, EditorAction::Undo);
        assert_eq!(ed.content_html(), r#"<img src="x.png"><p></p>"#);
    }

    #[test]
    fn test_table_needs_extension() {
        let mut config = EditorConfig::default();
        config.table.enabled = false;
        let mut ed = Editor::from_html("<p></p>", config).unwrap();
        assert!(!run(
            &mut ed,
            EditorAction::InsertTable {
                rows: 3,
                cols: 3,
                header: true
            }
        ));
    }

    #[test]
    fn test_insert_table_moves_cursor_into_first_cell() {
        let mut ed = editor("<p></p>");
        run(
            &mut ed,
            EditorAction::InsertTable {
                rows: 2,
                cols: 2,
                header: true,
            },
        );
        assert_eq!(
            ed.content_html(),
            "<table><tbody><tr><th><p></p></th><th><p></p></th></tr><tr><td><p></p></td><td><p></p></td></tr></tbody></table><p></p>"
        );
        assert_eq!(ed.selection(), at(0, 0));
    }

    #[test]
    fn test_heading_style_toggles() {
        let mut ed = editor("<p>a</p>");
        run(&mut ed, EditorAction::SetBlockStyle(BlockStyle::Heading(2)));
        assert_eq!(ed.content_html(), "<h2>a</h2>");
        run(&mut ed, EditorAction::SetBlockStyle(BlockStyle::Heading(2)));
        assert_eq!(ed.content_html(), "<p>a</p>");
    }

    #[test]
    fn test_quote_wraps_and_unwraps() {
        let mut ed = editor("<p>a</p>");
        run(&mut ed, EditorAction::SetBlockStyle(BlockStyle::Quote));
        assert_eq!(ed.content_html(), "<blockquote><p>a</p></blockquote>");
        run(&mut ed, EditorAction::SetBlockStyle(BlockStyle::Quote));
        assert_eq!(ed.content_html(), "<p>a</p>");
    }

    #[test]
    fn test_bullet_list_toggle() {
        let mut ed = editor("<p>a</p><p>b</p>");
        run(&mut ed, EditorAction::SelectAll);
        run(&mut ed, EditorAction::ToggleBulletList);
        assert_eq!(
            ed.content_html(),
            "<ul><li><p>a</p></li><li><p>b</p></li></ul>"
        );
        run(&mut ed, EditorAction::ToggleBulletList);
        assert_eq!(ed.content_html(), "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_align_center() {
        let mut ed = editor("<p>a</p>");
        run(&mut ed, EditorAction::SetTextAlign(Some(TextAlign::Center)));
        assert_eq!(
            ed.content_html(),
            r#"<p style="text-align: center">a</p>"#
        );
    }

    #[test]
    fn test_toggle_highlight_twice_removes() {
        let mut ed = editor("<p>abc</p>");
        ed.set_selection(span(0, 0, 0, 3));
        let color = Some(SmolStr::new("#ffc9c9"));
        run(&mut ed, EditorAction::ToggleHighlight(color.clone()));
        assert!(ed.content_html().contains("<mark data-color=\"#ffc9c9\""));
        run(&mut ed, EditorAction::ToggleHighlight(color));
        assert_eq!(ed.content_html(), "<p>abc</p>");
    }

    #[test]
    fn test_clear_formatting() {
        let mut ed = editor("<h2><strong>a</strong></h2>");
        run(&mut ed, EditorAction::SelectAll);
        run(&mut ed, EditorAction::ClearFormatting);
        assert_eq!(ed.content_html(), "<p>a</p>");
    }

    #[test]
    fn test_video_insert_and_rejection() {
        let mut ed = editor("<p></p>");
        assert!(!run(&mut ed, EditorAction::InsertVideo("https://vimeo.com/1".into())));
        assert!(run(
            &mut ed,
            EditorAction::InsertVideo("https://youtu.be/abc123".into())
        ));
        assert!(
            ed.content_html()
                .contains("https://www.youtube-nocookie.com/embed/abc123")
        );
    }

    #[test]
    fn test_select_node_requires_atom() {
        let mut ed = editor(r#"<p>a</p><hr><p>b</p>"#);
        assert!(!run(&mut ed, EditorAction::SelectNode(0)));
        assert!(run(&mut ed, EditorAction::SelectNode(1)));
        assert_eq!(ed.selection(), Selection::node(1));
    }
}
