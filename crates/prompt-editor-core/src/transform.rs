//! Structural edits: wrapping blocks in containers, lifting them back out,
//! and switching text block types.
//!
//! None of these add or remove leaves, so leaf-indexed positions stay valid
//! across them.

use std::ops::RangeInclusive;

use crate::document::{Block, ContainerKind, Document, ListItem};

/// Type a text leaf can be switched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Paragraph,
    Heading(u8),
    Code,
}

impl TextKind {
    pub fn of(block: &Block) -> Option<Self> {
        match block {
            Block::Paragraph(_) => Some(Self::Paragraph),
            Block::Heading { level, .. } => Some(Self::Heading(*level)),
            Block::CodeBlock { .. } => Some(Self::Code),
            _ => None,
        }
    }
}

/// Switch a text block's type in place, keeping its text. Code blocks drop
/// marks and alignment. Returns whether anything changed.
pub fn retype(block: &mut Block, kind: TextKind) -> bool {
    match TextKind::of(block) {
        None => return false,
        Some(current) if current == kind => return false,
        Some(_) => {}
    }
    let Some(mut body) = block.text_body_mut().map(std::mem::take) else {
        return false;
    };
    *block = match kind {
        TextKind::Paragraph => Block::Paragraph(body),
        TextKind::Heading(level) => Block::Heading { level, body },
        TextKind::Code => {
            body.strip_marks();
            body.align = None;
            Block::CodeBlock {
                language: None,
                body,
            }
        }
    };
    true
}

/// Deepest block list holding both leaves, with the index range of the
/// blocks in it that contain them.
pub fn common_level(
    doc: &Document,
    first: &[usize],
    last: &[usize],
) -> Option<(Vec<usize>, RangeInclusive<usize>)> {
    let a = doc.ancestry(first)?;
    let b = doc.ancestry(last)?;
    let mut found = None;
    for (la, lb) in a.iter().zip(&b) {
        if la.prefix != lb.prefix {
            break;
        }
        found = Some((
            la.prefix.clone(),
            la.index.min(lb.index)..=la.index.max(lb.index),
        ));
        if la.index != lb.index {
            break;
        }
    }
    found
}

/// Wrap blocks `range` of the list at `prefix` in a blockquote, or in a
/// bullet list with one item per block.
pub fn wrap(
    doc: &mut Document,
    prefix: &[usize],
    range: RangeInclusive<usize>,
    kind: ContainerKind,
) -> bool {
    let Some(list) = doc.list_at_mut(prefix) else {
        return false;
    };
    let (start, end) = (*range.start(), *range.end());
    if start > end || end >= list.len() || kind == ContainerKind::Table {
        return false;
    }
    let blocks: Vec<Block> = list.drain(start..=end).collect();
    let wrapper = match kind {
        ContainerKind::BulletList => Block::BulletList(
            blocks
                .into_iter()
                .map(|block| ListItem {
                    blocks: vec![block],
                })
                .collect(),
        ),
        _ => Block::Blockquote(blocks),
    };
    list.insert(start, wrapper);
    true
}

/// Move children `range` of the blockquote or bullet list at `container`
/// out into the surrounding list, splitting the container around them.
/// Lifted list items contribute all of their blocks.
pub fn lift(doc: &mut Document, container: &[usize], range: RangeInclusive<usize>) -> bool {
    let Some((&index, prefix)) = container.split_last() else {
        return false;
    };
    let Some(list) = doc.list_at_mut(prefix) else {
        return false;
    };
    let (start, end) = (*range.start(), *range.end());
    let len = match list.get(index) {
        Some(Block::Blockquote(children)) => children.len(),
        Some(Block::BulletList(items)) => items.len(),
        _ => return false,
    };
    if start > end || end >= len {
        return false;
    }

    let mut replacement = Vec::new();
    match list.remove(index) {
        Block::Blockquote(mut children) => {
            let after = children.split_off(end + 1);
            let lifted = children.split_off(start);
            if !children.is_empty() {
                replacement.push(Block::Blockquote(children));
            }
            replacement.extend(lifted);
            if !after.is_empty() {
                replacement.push(Block::Blockquote(after));
            }
        }
        Block::BulletList(mut items) => {
            let after = items.split_off(end + 1);
            let lifted = items.split_off(start);
            if !items.is_empty() {
                replacement.push(Block::BulletList(items));
            }
            replacement.extend(lifted.into_iter().flat_map(|item| item.blocks));
            if !after.is_empty() {
                replacement.push(Block::BulletList(after));
            }
        }
        other => replacement.push(other),
    }
    list.splice(index..index, replacement);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TextBlock;
    use crate::html::{parse_html, to_html};
    use crate::config::EditorConfig;

    fn doc(html: &str) -> Document {
        parse_html(html, &EditorConfig::default())
    }

    #[test]
    fn test_retype_to_code_strips_marks() {
        let mut d = doc(r#"<h2 style="text-align: center"><strong>x</strong></h2>"#);
        assert!(retype(&mut d.blocks[0], TextKind::Code));
        assert_eq!(to_html(&d), "<pre><code>x</code></pre>");
        assert!(!retype(&mut d.blocks[0], TextKind::Code));
    }

    #[test]
    fn test_wrap_then_lift_round_trips() {
        let mut d = doc("<p>a</p><p>b</p><p>c</p>");
        assert!(wrap(&mut d, &[], 0..=1, ContainerKind::Blockquote));
        assert_eq!(
            to_html(&d),
            "<blockquote><p>a</p><p>b</p></blockquote><p>c</p>"
        );
        assert!(lift(&mut d, &[0], 0..=1));
        assert_eq!(to_html(&d), "<p>a</p><p>b</p><p>c</p>");
    }

    #[test]
    fn test_wrap_in_list_makes_item_per_block() {
        let mut d = doc("<p>a</p><p>b</p>");
        assert!(wrap(&mut d, &[], 0..=1, ContainerKind::BulletList));
        assert_eq!(
            to_html(&d),
            "<ul><li><p>a</p></li><li><p>b</p></li></ul>"
        );
    }

    #[test]
    fn test_lift_middle_splits_container() {
        let mut d = doc("<ul><li><p>a</p></li><li><p>b</p></li><li><p>c</p></li></ul>");
        assert!(lift(&mut d, &[0], 1..=1));
        assert_eq!(
            to_html(&d),
            "<ul><li><p>a</p></li></ul><p>b</p><ul><li><p>c</p></li></ul>"
        );
        assert_eq!(d.text_block(1), Some(&TextBlock::plain("b")));
    }

    #[test]
    fn test_common_level() {
        let d = doc("<p>a</p><blockquote><p>b</p><p>c</p></blockquote>");
        let leaves = d.leaves();
        assert_eq!(
            common_level(&d, &leaves[1].path, &leaves[2].path),
            Some((vec![1], 0..=1))
        );
        assert_eq!(
            common_level(&d, &leaves[0].path, &leaves[2].path),
            Some((vec![], 0..=1))
        );
        assert_eq!(
            common_level(&d, &leaves[0].path, &leaves[0].path),
            Some((vec![], 0..=0))
        );
    }
}
