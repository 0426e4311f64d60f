//! The rich-text document tree.
//!
//! A document is a list of blocks. Containers (blockquote, bullet list,
//! table) hold further block lists; text blocks hold runs of marked text;
//! atoms (image, rule, video) hold attributes only.
//!
//! Text blocks and atoms are *leaves*. Leaves are numbered in document order
//! and addressed by a path of indices through the containers. A path step
//! into a blockquote consumes one index (the child), into a bullet list two
//! (item, child), into a table three (row, cell, child).

use std::ops::Range;

use smol_str::SmolStr;

use crate::marks::MarkSet;
use crate::types::{Position, Selection};

/// Horizontal alignment for paragraphs and headings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "justify",
        }
    }

    pub fn from_css(value: &str) -> Option<Self> {
        match value.trim() {
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            "justify" => Some(Self::Justify),
            _ => None,
        }
    }
}

/// A run of text sharing one mark set. Hard breaks are `'\n'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub marks: MarkSet,
}

impl TextRun {
    pub fn new(text: impl Into<String>, marks: MarkSet) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, MarkSet::default())
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Inline content of a paragraph, heading, or code block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBlock {
    pub runs: Vec<TextRun>,
    pub align: Option<TextAlign>,
}

impl TextBlock {
    pub fn new(runs: Vec<TextRun>) -> Self {
        let mut block = Self { runs, align: None };
        block.normalize();
        block
    }

    pub fn plain(text: &str) -> Self {
        Self::new(vec![TextRun::plain(text)])
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.runs.iter().map(TextRun::char_len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.is_empty())
    }

    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Drop empty runs and merge neighbours with identical marks.
    pub fn normalize(&mut self) {
        let mut merged: Vec<TextRun> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            if run.text.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.marks == run.marks => last.text.push_str(&run.text),
                _ => merged.push(run),
            }
        }
        self.runs = merged;
    }

    /// Split runs so that a run boundary falls at `offset`; returns the index
    /// of the first run starting at or after `offset`.
    fn split_runs_at(&mut self, offset: usize) -> usize {
        let mut pos = 0;
        for i in 0..self.runs.len() {
            let len = self.runs[i].char_len();
            if offset == pos {
                return i;
            }
            if offset < pos + len {
                let (head, tail) = split_at_char(&self.runs[i].text, offset - pos);
                let marks = self.runs[i].marks.clone();
                self.runs[i].text = head;
                self.runs.insert(i + 1, TextRun::new(tail, marks));
                return i + 1;
            }
            pos += len;
        }
        self.runs.len()
    }

    /// Marks in effect at `offset`: the character before it, or the one
    /// after when at the start of the block.
    pub fn marks_at(&self, offset: usize) -> Option<&MarkSet> {
        let probe = if offset > 0 { offset - 1 } else { 0 };
        let mut pos = 0;
        for run in &self.runs {
            let len = run.char_len();
            if probe < pos + len {
                return Some(&run.marks);
            }
            pos += len;
        }
        None
    }

    /// Visit each run fragment inside `range` with its char length.
    pub fn for_each_in(&self, range: Range<usize>, mut f: impl FnMut(&TextRun, usize)) {
        let mut pos = 0;
        for run in &self.runs {
            let len = run.char_len();
            let start = pos.max(range.start);
            let end = (pos + len).min(range.end);
            if start < end {
                f(run, end - start);
            }
            pos += len;
        }
    }

    /// Split runs at both ends of `range`; returns the run indices covering it.
    fn isolate(&mut self, range: Range<usize>) -> Range<usize> {
        let len = self.len();
        let end = range.end.min(len);
        let start = range.start.min(end);
        let start_idx = self.split_runs_at(start);
        let end_idx = self.split_runs_at(end);
        start_idx..end_idx
    }

    /// Apply `f` to the marks of every character in `range`.
    pub fn update_marks(&mut self, range: Range<usize>, mut f: impl FnMut(&mut MarkSet)) {
        if range.start >= range.end {
            return;
        }
        let runs = self.isolate(range);
        for run in &mut self.runs[runs] {
            f(&mut run.marks);
        }
        self.normalize();
    }

    /// Insert text with the given marks at `offset`.
    pub fn insert(&mut self, offset: usize, text: &str, marks: MarkSet) {
        let idx = self.split_runs_at(offset.min(self.len()));
        self.runs.insert(idx, TextRun::new(text, marks));
        self.normalize();
    }

    /// Delete a char range.
    pub fn delete(&mut self, range: Range<usize>) {
        if range.start >= range.end {
            return;
        }
        let runs = self.isolate(range);
        self.runs.drain(runs);
        self.normalize();
    }

    /// Split into `[0, offset)` (kept) and `[offset, len)` (returned).
    pub fn split_off(&mut self, offset: usize) -> TextBlock {
        let idx = self.split_runs_at(offset.min(self.len()));
        let tail = self.runs.split_off(idx);
        self.normalize();
        let mut after = TextBlock {
            runs: tail,
            align: self.align,
        };
        after.normalize();
        after
    }

    /// Append another block's runs.
    pub fn append(&mut self, other: TextBlock) {
        self.runs.extend(other.runs);
        self.normalize();
    }

    /// Char range of the contiguous run sequence around `offset` that shares
    /// the link `href` present there.
    pub fn link_range_at(&self, offset: usize) -> Option<(Range<usize>, SmolStr)> {
        let mut spans: Vec<(Range<usize>, Option<&SmolStr>)> = Vec::new();
        let mut pos = 0;
        for run in &self.runs {
            let len = run.char_len();
            spans.push((pos..pos + len, run.marks.link.as_ref()));
            pos += len;
        }
        // Prefer the run containing the char after the cursor, then before.
        let hit = spans
            .iter()
            .position(|(r, href)| href.is_some() && r.contains(&offset))
            .or_else(|| {
                spans.iter().position(|(r, href)| {
                    href.is_some() && offset > 0 && r.contains(&(offset - 1))
                })
            })?;
        let href = spans[hit].1?.clone();
        let mut start = spans[hit].0.start;
        let mut end = spans[hit].0.end;
        for (r, h) in spans[..hit].iter().rev() {
            if h.map(|h| h == &href).unwrap_or(false) {
                start = r.start;
            } else {
                break;
            }
        }
        for (r, h) in &spans[hit + 1..] {
            if h.map(|h| h == &href).unwrap_or(false) {
                end = r.end;
            } else {
                break;
            }
        }
        Some((start..end, href))
    }

    /// Drop all marks (used when text moves into a code block).
    pub fn strip_marks(&mut self) {
        for run in &mut self.runs {
            run.marks = MarkSet::default();
        }
        self.normalize();
    }
}

/// Split a string at a char index.
fn split_at_char(s: &str, chars: usize) -> (String, String) {
    let byte = s
        .char_indices()
        .nth(chars)
        .map(|(b, _)| b)
        .unwrap_or(s.len());
    (s[..byte].to_string(), s[byte..].to_string())
}

/// An embedded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageNode {
    /// Data URL for freshly ingested files, or a remote URL.
    pub src: SmolStr,
    /// Pixel width set by resizing; `None` renders at fill width.
    pub width: Option<u32>,
    pub alt: Option<String>,
}

impl ImageNode {
    pub fn new(src: impl Into<SmolStr>) -> Self {
        Self {
            src: src.into(),
            width: None,
            alt: None,
        }
    }
}

/// An embedded video iframe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoNode {
    pub src: SmolStr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    pub header: bool,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

impl Table {
    /// A `rows` x `cols` grid of empty cells; the first row is a header
    /// row when `header` is set.
    pub fn grid(rows: usize, cols: usize, header: bool) -> Self {
        let rows = (0..rows.max(1))
            .map(|r| TableRow {
                cells: (0..cols.max(1))
                    .map(|_| TableCell {
                        header: header && r == 0,
                        blocks: vec![Block::empty_paragraph()],
                    })
                    .collect(),
            })
            .collect();
        Self { rows }
    }
}

/// A block-level node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(TextBlock),
    Heading { level: u8, body: TextBlock },
    CodeBlock {
        language: Option<SmolStr>,
        body: TextBlock,
    },
    Blockquote(Vec<Block>),
    BulletList(Vec<ListItem>),
    Table(Table),
    HorizontalRule,
    Image(ImageNode),
    Video(VideoNode),
}

/// What a leaf holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    /// Paragraph or heading.
    Text,
    /// Code block: text without marks.
    Code,
    /// Image, horizontal rule, or video.
    Atom,
}

/// A leaf with its path and length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafInfo {
    pub path: Vec<usize>,
    pub kind: LeafKind,
    pub len: usize,
}

/// Kinds of container a leaf can sit inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Blockquote,
    BulletList,
    Table,
}

/// One level of a leaf's ancestry: the block list at `prefix` and the
/// index into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    pub prefix: Vec<usize>,
    pub index: usize,
}

impl Level {
    /// Path of the block at this level.
    pub fn block_path(&self) -> Vec<usize> {
        let mut path = self.prefix.clone();
        path.push(self.index);
        path
    }
}

impl Block {
    pub fn empty_paragraph() -> Self {
        Block::Paragraph(TextBlock::default())
    }

    pub fn text_body(&self) -> Option<&TextBlock> {
        match self {
            Block::Paragraph(body) | Block::Heading { body, .. } | Block::CodeBlock { body, .. } => {
                Some(body)
            }
            _ => None,
        }
    }

    pub fn text_body_mut(&mut self) -> Option<&mut TextBlock> {
        match self {
            Block::Paragraph(body) | Block::Heading { body, .. } | Block::CodeBlock { body, .. } => {
                Some(body)
            }
            _ => None,
        }
    }

    pub fn is_atom(&self) -> bool {
        matches!(
            self,
            Block::HorizontalRule | Block::Image(_) | Block::Video(_)
        )
    }

    pub fn container_kind(&self) -> Option<ContainerKind> {
        match self {
            Block::Blockquote(_) => Some(ContainerKind::Blockquote),
            Block::BulletList(_) => Some(ContainerKind::BulletList),
            Block::Table(_) => Some(ContainerKind::Table),
            _ => None,
        }
    }

    fn leaf_kind(&self) -> Option<LeafKind> {
        match self {
            Block::Paragraph(_) | Block::Heading { .. } => Some(LeafKind::Text),
            Block::CodeBlock { .. } => Some(LeafKind::Code),
            b if b.is_atom() => Some(LeafKind::Atom),
            _ => None,
        }
    }

    /// The child block list selected by the leading container steps of
    /// `steps`, and the steps left over.
    fn child_list<'a, 'p>(&'a self, steps: &'p [usize]) -> Option<(&'a Vec<Block>, &'p [usize])> {
        match self {
            Block::Blockquote(children) => Some((children, steps)),
            Block::BulletList(items) => {
                let (&item, rest) = steps.split_first()?;
                Some((&items.get(item)?.blocks, rest))
            }
            Block::Table(table) => {
                let (&row, rest) = steps.split_first()?;
                let (&cell, rest) = rest.split_first()?;
                Some((&table.rows.get(row)?.cells.get(cell)?.blocks, rest))
            }
            _ => None,
        }
    }

    fn child_list_mut<'a, 'p>(
        &'a mut self,
        steps: &'p [usize],
    ) -> Option<(&'a mut Vec<Block>, &'p [usize])> {
        match self {
            Block::Blockquote(children) => Some((children, steps)),
            Block::BulletList(items) => {
                let (&item, rest) = steps.split_first()?;
                Some((&mut items.get_mut(item)?.blocks, rest))
            }
            Block::Table(table) => {
                let (&row, rest) = steps.split_first()?;
                let (&cell, rest) = rest.split_first()?;
                Some((
                    &mut table.rows.get_mut(row)?.cells.get_mut(cell)?.blocks,
                    rest,
                ))
            }
            _ => None,
        }
    }
}

fn collect_leaves(blocks: &[Block], prefix: &mut Vec<usize>, out: &mut Vec<LeafInfo>) {
    for (i, block) in blocks.iter().enumerate() {
        prefix.push(i);
        match block {
            Block::Blockquote(children) => collect_leaves(children, prefix, out),
            Block::BulletList(items) => {
                for (j, item) in items.iter().enumerate() {
                    prefix.push(j);
                    collect_leaves(&item.blocks, prefix, out);
                    prefix.pop();
                }
            }
            Block::Table(table) => {
                for (r, row) in table.rows.iter().enumerate() {
                    for (c, cell) in row.cells.iter().enumerate() {
                        prefix.push(r);
                        prefix.push(c);
                        collect_leaves(&cell.blocks, prefix, out);
                        prefix.pop();
                        prefix.pop();
                    }
                }
            }
            leaf => {
                if let Some(kind) = leaf.leaf_kind() {
                    let len = leaf.text_body().map(TextBlock::len).unwrap_or(1);
                    out.push(LeafInfo {
                        path: prefix.clone(),
                        kind,
                        len,
                    });
                }
            }
        }
        prefix.pop();
    }
}

fn list_at<'a>(blocks: &'a Vec<Block>, prefix: &[usize]) -> Option<&'a Vec<Block>> {
    let Some((&idx, rest)) = prefix.split_first() else {
        return Some(blocks);
    };
    let (children, rest) = blocks.get(idx)?.child_list(rest)?;
    list_at(children, rest)
}

fn list_at_mut<'a>(blocks: &'a mut Vec<Block>, prefix: &[usize]) -> Option<&'a mut Vec<Block>> {
    let Some((&idx, rest)) = prefix.split_first() else {
        return Some(blocks);
    };
    let (children, rest) = blocks.get_mut(idx)?.child_list_mut(rest)?;
    list_at_mut(children, rest)
}

/// The document: an ordered block tree with at least one leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            blocks: vec![Block::empty_paragraph()],
        }
    }
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        let mut doc = Self { blocks };
        doc.ensure_leaf();
        doc
    }

    /// Guarantee the document has somewhere to put the cursor.
    pub fn ensure_leaf(&mut self) {
        if self.leaves().is_empty() {
            self.blocks.push(Block::empty_paragraph());
        }
    }

    /// All leaves in document order.
    pub fn leaves(&self) -> Vec<LeafInfo> {
        let mut out = Vec::new();
        collect_leaves(&self.blocks, &mut Vec::new(), &mut out);
        out
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().len()
    }

    pub fn leaf_info(&self, leaf: usize) -> Option<LeafInfo> {
        self.leaves().into_iter().nth(leaf)
    }

    pub fn block_at(&self, path: &[usize]) -> Option<&Block> {
        let (&idx, prefix) = path.split_last()?;
        list_at(&self.blocks, prefix)?.get(idx)
    }

    pub fn block_at_mut(&mut self, path: &[usize]) -> Option<&mut Block> {
        let (&idx, prefix) = path.split_last()?;
        list_at_mut(&mut self.blocks, prefix)?.get_mut(idx)
    }

    pub fn list_at_mut(&mut self, prefix: &[usize]) -> Option<&mut Vec<Block>> {
        list_at_mut(&mut self.blocks, prefix)
    }

    pub fn list_at(&self, prefix: &[usize]) -> Option<&Vec<Block>> {
        list_at(&self.blocks, prefix)
    }

    /// The leaf block at a document-order index.
    pub fn leaf(&self, leaf: usize) -> Option<&Block> {
        let info = self.leaf_info(leaf)?;
        self.block_at(&info.path)
    }

    pub fn leaf_mut(&mut self, leaf: usize) -> Option<&mut Block> {
        let info = self.leaf_info(leaf)?;
        self.block_at_mut(&info.path)
    }

    pub fn text_block(&self, leaf: usize) -> Option<&TextBlock> {
        self.leaf(leaf)?.text_body()
    }

    pub fn text_block_mut(&mut self, leaf: usize) -> Option<&mut TextBlock> {
        self.leaf_mut(leaf)?.text_body_mut()
    }

    /// Index of the first leaf at or below `path`.
    pub fn leaf_index_at_or_below(&self, path: &[usize]) -> Option<usize> {
        self.leaves().iter().position(|l| l.path.starts_with(path))
    }

    /// Every list level from the root down to the leaf at `path`.
    pub fn ancestry(&self, path: &[usize]) -> Option<Vec<Level>> {
        let mut levels = Vec::new();
        let mut blocks: &Vec<Block> = &self.blocks;
        let mut consumed = 0;
        loop {
            let idx = *path.get(consumed)?;
            levels.push(Level {
                prefix: path[..consumed].to_vec(),
                index: idx,
            });
            let rest = &path[consumed + 1..];
            if rest.is_empty() {
                return Some(levels);
            }
            let (children, remaining) = blocks.get(idx)?.child_list(rest)?;
            consumed = path.len() - remaining.len();
            blocks = children;
        }
    }

    /// Innermost container of `kind` enclosing the leaf at `path`.
    pub fn enclosing(&self, path: &[usize], kind: ContainerKind) -> Option<Level> {
        let levels = self.ancestry(path)?;
        levels.into_iter().rev().skip(1).find(|level| {
            self.block_at(&level.block_path())
                .and_then(Block::container_kind)
                == Some(kind)
        })
    }

    /// Path prefix of the innermost table cell holding the leaf at `path`.
    pub fn cell_of(&self, path: &[usize]) -> Option<Vec<usize>> {
        let table = self.enclosing(path, ContainerKind::Table)?;
        let depth = table.block_path().len() + 2;
        (path.len() > depth).then(|| path[..depth].to_vec())
    }

    /// Clamp a position into document bounds.
    pub fn clamp(&self, pos: Position) -> Position {
        let leaves = self.leaves();
        let Some(last) = leaves.len().checked_sub(1) else {
            return Position::default();
        };
        if pos.leaf > last {
            return Position::new(last, leaves[last].len);
        }
        Position::new(pos.leaf, pos.offset.min(leaves[pos.leaf].len))
    }

    /// Clamp a selection into bounds, turning a collapsed cursor on an
    /// atom into the nearest text position or a node selection.
    pub fn normalize_selection(&self, sel: Selection) -> Selection {
        let anchor = self.clamp(sel.anchor);
        let head = self.clamp(sel.head);
        if anchor != head {
            return Selection::new(anchor, head);
        }
        let leaves = self.leaves();
        let Some(info) = leaves.get(head.leaf) else {
            return Selection::collapsed(head);
        };
        if info.kind != LeafKind::Atom {
            return Selection::collapsed(head);
        }
        if head.offset >= 1 {
            if let Some(next) = (head.leaf + 1..leaves.len()).find(|&i| leaves[i].kind != LeafKind::Atom) {
                return Selection::collapsed(Position::new(next, 0));
            }
        } else if let Some(prev) = (0..head.leaf).rev().find(|&i| leaves[i].kind != LeafKind::Atom) {
            return Selection::collapsed(Position::new(prev, leaves[prev].len));
        }
        Selection::node(head.leaf)
    }

    /// The atom leaf covered by a node selection, if any.
    pub fn selected_node(&self, sel: &Selection) -> Option<usize> {
        let (start, end) = (sel.start(), sel.end());
        if start.leaf != end.leaf || start.offset != 0 || end.offset != 1 {
            return None;
        }
        let info = self.leaf_info(start.leaf)?;
        (info.kind == LeafKind::Atom).then_some(start.leaf)
    }

    /// End position of the whole document.
    pub fn end(&self) -> Position {
        let leaves = self.leaves();
        match leaves.last() {
            Some(info) => Position::new(leaves.len() - 1, info.len),
            None => Position::default(),
        }
    }

    /// Remove the block at `path`, pruning containers it leaves empty.
    ///
    /// Table cells are never left empty; they get a fresh paragraph.
    pub fn remove_block(&mut self, path: &[usize]) {
        let Some((&idx, prefix)) = path.split_last() else {
            return;
        };
        let Some(list) = self.list_at_mut(prefix) else {
            return;
        };
        if idx < list.len() {
            list.remove(idx);
        }
        if !list.is_empty() {
            return;
        }
        // The list is empty: decide what owns it.
        if prefix.is_empty() {
            self.blocks.push(Block::empty_paragraph());
            return;
        }
        let Some(levels) = self.container_of(prefix) else {
            return;
        };
        let container_path = levels.block_path();
        match self.block_at_mut(&container_path) {
            Some(Block::Table(_)) => {
                if let Some(list) = self.list_at_mut(prefix) {
                    list.push(Block::empty_paragraph());
                }
            }
            Some(Block::BulletList(items)) => {
                let item = prefix[container_path.len()];
                if item < items.len() {
                    items.remove(item);
                }
                if items.is_empty() {
                    self.remove_block(&container_path);
                }
            }
            Some(Block::Blockquote(_)) => self.remove_block(&container_path),
            _ => {}
        }
    }

    /// Level of the container block owning the list at `prefix`.
    fn container_of(&self, prefix: &[usize]) -> Option<Level> {
        // Walk down until the remaining steps are exactly the container's own.
        let mut blocks: &Vec<Block> = &self.blocks;
        let mut consumed = 0;
        loop {
            let idx = *prefix.get(consumed)?;
            let rest = &prefix[consumed + 1..];
            let block = blocks.get(idx)?;
            let (children, remaining) = block.child_list(rest)?;
            if remaining.is_empty() {
                return Some(Level {
                    prefix: prefix[..consumed].to_vec(),
                    index: idx,
                });
            }
            consumed = prefix.len() - remaining.len();
            blocks = children;
        }
    }

    /// Insert `block` at `pos`, splitting a text leaf when the position is
    /// inside it. Returns the path of the inserted block.
    ///
    /// An atom or table that ends up last in its list gets an empty
    /// paragraph after it so the cursor has somewhere to go.
    pub fn insert_block_at(&mut self, pos: Position, block: Block) -> Option<Vec<usize>> {
        let pos = self.clamp(pos);
        let info = self.leaf_info(pos.leaf)?;
        let (&idx, prefix) = info.path.split_last()?;
        let prefix = prefix.to_vec();

        let trailing = block.is_atom() || matches!(block, Block::Table(_));
        let empty_paragraph = matches!(
            self.block_at(&info.path),
            Some(Block::Paragraph(body)) if body.is_empty()
        );
        let insert_at = match info.kind {
            LeafKind::Atom => idx + pos.offset.min(1),
            // An empty paragraph is replaced outright.
            _ if empty_paragraph => {
                self.list_at_mut(&prefix)?.remove(idx);
                idx
            }
            _ if pos.offset == 0 => idx,
            _ if pos.offset >= info.len => idx + 1,
            _ => {
                let target = self.block_at_mut(&info.path)?;
                let tail = target.text_body_mut()?.split_off(pos.offset);
                let tail_block = match target {
                    Block::Heading { level, .. } => Block::Heading {
                        level: *level,
                        body: tail,
                    },
                    Block::CodeBlock { language, .. } => Block::CodeBlock {
                        language: language.clone(),
                        body: tail,
                    },
                    _ => Block::Paragraph(tail),
                };
                self.list_at_mut(&prefix)?.insert(idx + 1, tail_block);
                idx + 1
            }
        };

        let list = self.list_at_mut(&prefix)?;
        list.insert(insert_at, block);
        if trailing && insert_at + 1 == list.len() {
            list.push(Block::empty_paragraph());
        }
        let mut path = prefix;
        path.push(insert_at);
        Some(path)
    }

    /// Delete everything between two positions, joining the text leaves on
    /// either side. Returns where the cursor should land.
    pub fn delete_range(&mut self, start: Position, end: Position) -> Position {
        let (start, end) = (self.clamp(start.min(end)), self.clamp(start.max(end)));
        if start == end {
            return start;
        }
        let leaves = self.leaves();

        if start.leaf == end.leaf {
            let info = &leaves[start.leaf];
            if info.kind == LeafKind::Atom {
                self.remove_block(&info.path);
                return self.clamp(Position::new(start.leaf, 0));
            }
            if let Some(body) = self.text_block_mut(start.leaf) {
                body.delete(start.offset..end.offset);
            }
            return start;
        }

        let first = &leaves[start.leaf];
        let last = &leaves[end.leaf];
        // Text never flows between table cells or in and out of a table.
        let joinable = first.kind != LeafKind::Atom
            && last.kind != LeafKind::Atom
            && self.cell_of(&first.path) == self.cell_of(&last.path);

        // Work back to front so earlier paths stay valid.
        let mut tail = None;
        match last.kind {
            LeafKind::Atom => {
                if end.offset >= 1 {
                    self.remove_block(&last.path);
                }
            }
            _ => {
                if let Some(body) = self.block_at_mut(&last.path).and_then(Block::text_body_mut) {
                    body.delete(0..end.offset);
                    if joinable {
                        tail = Some(std::mem::take(body));
                    }
                }
                if joinable {
                    self.remove_block(&last.path);
                }
            }
        }
        for info in leaves[start.leaf + 1..end.leaf].iter().rev() {
            self.remove_block(&info.path);
        }
        match first.kind {
            LeafKind::Atom => {
                if start.offset == 0 {
                    self.remove_block(&first.path);
                }
                self.clamp(Position::new(start.leaf, 0))
            }
            _ => {
                if let Some(body) = self.block_at_mut(&first.path).and_then(Block::text_body_mut) {
                    let len = body.len();
                    body.delete(start.offset..len);
                    if let Some(mut tail) = tail {
                        if matches!(first.kind, LeafKind::Code) {
                            tail.strip_marks();
                        }
                        body.append(tail);
                    }
                }
                start
            }
        }
    }

    /// Plain text of all leaves, one per line.
    pub fn plain_text(&self) -> String {
        let mut out = Vec::new();
        for info in self.leaves() {
            if let Some(body) = self.block_at(&info.path).and_then(Block::text_body) {
                out.push(body.plain_text());
            }
        }
        out.join("\n")
    }

    /// Plain text between two positions, one line per leaf.
    pub fn plain_text_in(&self, start: Position, end: Position) -> String {
        let (start, end) = (self.clamp(start.min(end)), self.clamp(start.max(end)));
        let mut out = Vec::new();
        for (leaf, info) in self
            .leaves()
            .into_iter()
            .enumerate()
            .take(end.leaf + 1)
            .skip(start.leaf)
        {
            let Some(body) = self.block_at(&info.path).and_then(Block::text_body) else {
                continue;
            };
            let from = if leaf == start.leaf { start.offset } else { 0 };
            let to = if leaf == end.leaf { end.offset } else { info.len };
            let text: String = body
                .plain_text()
                .chars()
                .skip(from)
                .take(to.saturating_sub(from))
                .collect();
            out.push(text);
        }
        out.join("\n")
    }

    /// All images in document order.
    pub fn images(&self) -> Vec<&ImageNode> {
        self.leaves()
            .iter()
            .filter_map(|info| match self.block_at(&info.path) {
                Some(Block::Image(img)) => Some(img),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks::SimpleMark;

    fn bold() -> MarkSet {
        let mut m = MarkSet::default();
        m.set(SimpleMark::Bold, true);
        m
    }

    fn para(text: &str) -> Block {
        Block::Paragraph(TextBlock::plain(text))
    }

    #[test]
    fn test_normalize_merges_equal_runs() {
        let block = TextBlock::new(vec![
            TextRun::plain("ab"),
            TextRun::plain(""),
            TextRun::plain("cd"),
            TextRun::new("ef", bold()),
        ]);
        assert_eq!(block.runs.len(), 2);
        assert_eq!(block.runs[0].text, "abcd");
    }

    #[test]
    fn test_update_marks_middle() {
        let mut block = TextBlock::plain("hello world");
        block.update_marks(6..11, |m| m.set(SimpleMark::Bold, true));
        assert_eq!(block.runs.len(), 2);
        assert_eq!(block.runs[0].text, "hello ");
        assert_eq!(block.runs[1].text, "world");
        assert!(block.runs[1].marks.has(SimpleMark::Bold));
    }

    #[test]
    fn test_update_marks_inner_span() {
        let mut block = TextBlock::plain("abcdef");
        block.update_marks(2..4, |m| m.set(SimpleMark::Italic, true));
        let texts: Vec<_> = block.runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["ab", "cd", "ef"]);
        assert!(block.runs[1].marks.has(SimpleMark::Italic));
        assert!(!block.runs[2].marks.has(SimpleMark::Italic));
    }

    #[test]
    fn test_delete_across_runs() {
        let mut block = TextBlock::new(vec![TextRun::plain("abc"), TextRun::new("def", bold())]);
        block.delete(1..5);
        assert_eq!(block.plain_text(), "af");
        assert_eq!(block.runs.len(), 2);
    }

    #[test]
    fn test_insert_multibyte() {
        let mut block = TextBlock::plain("héllo");
        block.insert(2, "XY", MarkSet::default());
        assert_eq!(block.plain_text(), "héXYllo");
        assert_eq!(block.len(), 7);
    }

    #[test]
    fn test_split_off_keeps_align() {
        let mut block = TextBlock::plain("abcdef");
        block.align = Some(TextAlign::Center);
        let tail = block.split_off(2);
        assert_eq!(block.plain_text(), "ab");
        assert_eq!(tail.plain_text(), "cdef");
        assert_eq!(tail.align, Some(TextAlign::Center));
    }

    #[test]
    fn test_link_range_extends_over_runs() {
        let mut link = MarkSet {
            link: Some("https://x.example".into()),
            ..Default::default()
        };
        let plain_link = link.clone();
        link.set(SimpleMark::Bold, true);
        let block = TextBlock::new(vec![
            TextRun::plain("go "),
            TextRun::new("to", plain_link),
            TextRun::new("day", link),
            TextRun::plain("!"),
        ]);
        let (range, href) = block.link_range_at(4).unwrap();
        assert_eq!(range, 3..8);
        assert_eq!(href, "https://x.example");
        assert!(block.link_range_at(1).is_none());
    }

    #[test]
    fn test_leaves_walk_containers() {
        let doc = Document::new(vec![
            para("a"),
            Block::Blockquote(vec![para("b")]),
            Block::BulletList(vec![ListItem {
                blocks: vec![para("c")],
            }]),
            Block::Table(Table::grid(1, 2, true)),
            Block::HorizontalRule,
        ]);
        let paths: Vec<_> = doc.leaves().into_iter().map(|l| l.path).collect();
        assert_eq!(
            paths,
            vec![
                vec![0],
                vec![1, 0],
                vec![2, 0, 0],
                vec![3, 0, 0, 0],
                vec![3, 0, 1, 0],
                vec![4],
            ]
        );
        assert_eq!(doc.text_block(2).unwrap().plain_text(), "c");
    }

    #[test]
    fn test_enclosing_container() {
        let doc = Document::new(vec![Block::Blockquote(vec![Block::BulletList(vec![
            ListItem {
                blocks: vec![para("x")],
            },
        ])])]);
        let path = doc.leaf_info(0).unwrap().path;
        let list = doc.enclosing(&path, ContainerKind::BulletList).unwrap();
        assert_eq!(list.block_path(), vec![0, 0]);
        let quote = doc.enclosing(&path, ContainerKind::Blockquote).unwrap();
        assert_eq!(quote.block_path(), vec![0]);
        assert!(doc.enclosing(&path, ContainerKind::Table).is_none());
    }

    #[test]
    fn test_insert_block_splits_paragraph() {
        let mut doc = Document::new(vec![para("abcd")]);
        let path = doc
            .insert_block_at(Position::new(0, 2), Block::HorizontalRule)
            .unwrap();
        assert_eq!(path, vec![1]);
        assert_eq!(doc.blocks.len(), 3);
        assert_eq!(doc.text_block(0).unwrap().plain_text(), "ab");
        assert_eq!(doc.text_block(2).unwrap().plain_text(), "cd");
    }

    #[test]
    fn test_insert_block_at_end_adds_trailing_paragraph() {
        let mut doc = Document::new(vec![para("ab")]);
        doc.insert_block_at(Position::new(0, 2), Block::HorizontalRule);
        assert_eq!(
            doc.blocks,
            vec![para("ab"), Block::HorizontalRule, Block::empty_paragraph()]
        );
    }

    #[test]
    fn test_insert_block_replaces_empty_paragraph() {
        let mut doc = Document::new(vec![para("a"), Block::empty_paragraph(), para("b")]);
        let path = doc
            .insert_block_at(Position::new(1, 0), Block::Image(ImageNode::new("x.png")))
            .unwrap();
        assert_eq!(path, vec![1]);
        assert_eq!(
            doc.blocks,
            vec![para("a"), Block::Image(ImageNode::new("x.png")), para("b")]
        );
    }

    #[test]
    fn test_remove_prunes_empty_containers() {
        let mut doc = Document::new(vec![
            para("a"),
            Block::Blockquote(vec![Block::BulletList(vec![ListItem {
                blocks: vec![para("b")],
            }])]),
        ]);
        doc.remove_block(&[1, 0, 0, 0]);
        assert_eq!(doc.blocks, vec![para("a")]);
    }

    #[test]
    fn test_remove_keeps_table_cells_filled() {
        let mut doc = Document::new(vec![Block::Table(Table::grid(1, 1, false))]);
        doc.remove_block(&[0, 0, 0, 0]);
        assert_eq!(doc.leaf_count(), 1);
    }

    #[test]
    fn test_delete_range_joins_paragraphs() {
        let mut doc = Document::new(vec![para("hello"), para("middle"), para("world")]);
        let at = doc.delete_range(Position::new(0, 2), Position::new(2, 3));
        assert_eq!(at, Position::new(0, 2));
        assert_eq!(doc.blocks, vec![para("held")]);
    }

    #[test]
    fn test_delete_node_selection() {
        let mut doc = Document::new(vec![
            para("a"),
            Block::Image(ImageNode::new("x.png")),
            para("b"),
        ]);
        let at = doc.delete_range(Position::new(1, 0), Position::new(1, 1));
        assert_eq!(doc.blocks, vec![para("a"), para("b")]);
        assert_eq!(at, Position::new(1, 0));
    }

    #[test]
    fn test_normalize_selection_moves_off_atoms() {
        let doc = Document::new(vec![Block::Image(ImageNode::new("x.png")), para("after")]);
        let sel = doc.normalize_selection(Selection::collapsed(Position::new(0, 1)));
        assert_eq!(sel, Selection::collapsed(Position::new(1, 0)));

        let only_image = Document::new(vec![Block::Image(ImageNode::new("x.png"))]);
        let sel = only_image.normalize_selection(Selection::collapsed(Position::new(0, 0)));
        assert_eq!(only_image.selected_node(&sel), Some(0));
    }

    #[test]
    fn test_delete_range_keeps_table_cells_apart() {
        let mut table = Table::grid(1, 2, false);
        table.rows[0].cells[0].blocks = vec![para("left")];
        table.rows[0].cells[1].blocks = vec![para("right")];
        let mut doc = Document::new(vec![Block::Table(table)]);
        assert_eq!(doc.cell_of(&[0, 0, 1, 0]), Some(vec![0, 0, 1]));

        let at = doc.delete_range(Position::new(0, 2), Position::new(1, 2));
        assert_eq!(at, Position::new(0, 2));
        assert_eq!(doc.text_block(0).unwrap().plain_text(), "le");
        assert_eq!(doc.text_block(1).unwrap().plain_text(), "ght");
    }

    #[test]
    fn test_clamp_out_of_bounds() {
        let doc = Document::new(vec![para("abc")]);
        assert_eq!(doc.clamp(Position::new(5, 9)), Position::new(0, 3));
        assert_eq!(doc.clamp(Position::new(0, 9)), Position::new(0, 3));
    }
}
