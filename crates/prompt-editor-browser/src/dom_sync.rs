//! DOM synchronization for the editing surface.
//!
//! The surface is rendered with `data-leaf="N"` on every leaf element, so
//! mapping a DOM boundary point to a [`Position`] is a walk up to the leaf
//! element and a count of the characters before the point. Text leaves count
//! their text nodes and `<br>` elements (one `'\n'` each); the caret-box
//! `<br class="trailing-break">` counts nothing. Atoms (images, rules,
//! videos) are `contenteditable="false"` and have length 1.

use prompt_editor_core::{
    CursorPlatform, CursorSync, PlatformError, Position, Rect, Selection, Size, SurfacePlatform,
};
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement, Node};

/// Attribute carrying the leaf index.
pub const LEAF_ATTR: &str = "data-leaf";

const TRAILING_BREAK: &str = "trailing-break";

/// The leaf element containing `node`, with its index. `None` for nodes
/// between leaves (list items, quotes, the root itself).
pub fn leaf_of(node: &Node, root: &Element) -> Option<(Element, usize)> {
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if let Some(element) = n.dyn_ref::<Element>() {
            if element == root {
                return None;
            }
            if let Some(leaf) = leaf_index(element) {
                return Some((element.clone(), leaf));
            }
        }
        current = n.parent_node();
    }
    None
}

fn leaf_index(element: &Element) -> Option<usize> {
    element.get_attribute(LEAF_ATTR)?.parse().ok()
}

/// Atoms (images, rules, embeds) are not editable inside.
pub fn is_atom(element: &Element) -> bool {
    element.get_attribute("contenteditable").as_deref() == Some("false")
}

/// Element of the leaf at `leaf`.
pub fn leaf_element(root: &Element, leaf: usize) -> Option<Element> {
    root.query_selector(&format!("[{LEAF_ATTR}=\"{leaf}\"]"))
        .ok()
        .flatten()
}

/// Characters a node contributes to its text leaf.
fn node_len(node: &Node, in_code: bool) -> usize {
    match node.node_type() {
        Node::TEXT_NODE => node.text_content().map_or(0, |t| t.chars().count()),
        Node::ELEMENT_NODE => {
            let Some(element) = node.dyn_ref::<Element>() else {
                return 0;
            };
            let counts = element.tag_name().eq_ignore_ascii_case("br")
                && !in_code
                && !element.class_list().contains(TRAILING_BREAK);
            usize::from(counts)
        }
        _ => 0,
    }
}

fn is_code(leaf: &Element) -> bool {
    leaf.tag_name().eq_ignore_ascii_case("pre")
}

fn walker(leaf: &Element) -> Option<web_sys::TreeWalker> {
    let document = leaf.owner_document()?;
    document
        .create_tree_walker_with_what_to_show(leaf, 0xFFFFFFFF)
        .ok()
}

/// Length of a leaf in characters.
pub fn leaf_len(leaf: &Element) -> usize {
    if is_atom(leaf) {
        return 1;
    }
    let in_code = is_code(leaf);
    let Some(walker) = walker(leaf) else {
        return 0;
    };
    let mut len = 0;
    while let Ok(Some(node)) = walker.next_node() {
        len += node_len(&node, in_code);
    }
    len
}

fn utf16_to_chars(text: &str, utf16: usize) -> usize {
    let mut units = 0;
    for (i, c) in text.chars().enumerate() {
        if units >= utf16 {
            return i;
        }
        units += c.len_utf16();
    }
    text.chars().count()
}

fn chars_to_utf16(text: &str, chars: usize) -> usize {
    text.chars().take(chars).map(char::len_utf16).sum()
}

/// Convert a DOM boundary point (node + offset) to a document position.
///
/// Text nodes take a UTF-16 offset; elements take a child index. Points
/// between leaves resolve to the start of the next leaf, or the end of the
/// previous one at the end of a container.
pub fn dom_to_position(root: &Element, node: &Node, offset: usize) -> Option<Position> {
    let Some((leaf, index)) = leaf_of(node, root) else {
        return between_leaves(root, node, offset);
    };
    if is_atom(&leaf) {
        return Some(Position::new(index, usize::from(offset > 0)));
    }

    let in_code = is_code(&leaf);
    let leaf_node: &Node = leaf.as_ref();
    let mut count = 0;

    if node.node_type() == Node::TEXT_NODE {
        let walker = walker(&leaf)?;
        while let Ok(Some(n)) = walker.next_node() {
            if &n == node {
                let text = n.text_content().unwrap_or_default();
                count += utf16_to_chars(&text, offset);
                break;
            }
            count += node_len(&n, in_code);
        }
    } else if node == leaf_node && offset >= leaf.child_nodes().length() as usize {
        count = leaf_len(&leaf);
    } else {
        // Boundary before child `offset` of an element (or after all of an
        // inner element's content).
        let stop = node.child_nodes().get(offset as u32);
        let walker = walker(&leaf)?;
        let mut inside = node == leaf_node;
        while let Ok(Some(n)) = walker.next_node() {
            if stop.as_ref() == Some(&n) {
                break;
            }
            if &n == node {
                inside = true;
            } else if inside && stop.is_none() && !node.contains(Some(&n)) {
                break;
            }
            count += node_len(&n, in_code);
        }
    }

    let len = leaf_len(&leaf);
    tracing::trace!(leaf = index, count, len, "dom position mapped");
    Some(Position::new(index, count.min(len)))
}

fn between_leaves(root: &Element, node: &Node, offset: usize) -> Option<Position> {
    let root_node: &Node = root.as_ref();
    if node != root_node && !root.contains(Some(node)) {
        return None;
    }
    let leaves = root.query_selector_all(&format!("[{LEAF_ATTR}]")).ok()?;
    let reference = node.child_nodes().get(offset as u32);

    let mut last_before: Option<Element> = None;
    for i in 0..leaves.length() {
        let Some(element) = leaves.get(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        let element_node: &Node = element.as_ref();
        let after = match &reference {
            Some(reference) => {
                reference == element_node
                    || reference.contains(Some(element_node))
                    || reference.compare_document_position(element_node)
                        & Node::DOCUMENT_POSITION_FOLLOWING
                        != 0
            }
            None => {
                !node.contains(Some(element_node))
                    && node.compare_document_position(element_node)
                        & Node::DOCUMENT_POSITION_FOLLOWING
                        != 0
            }
        };
        if after {
            return Some(Position::new(leaf_index(&element)?, 0));
        }
        last_before = Some(element);
    }
    let element = last_before?;
    Some(Position::new(leaf_index(&element)?, leaf_len(&element)))
}

/// Convert a document position to a DOM boundary point.
pub fn position_to_dom(root: &Element, pos: Position) -> Option<(Node, u32)> {
    let leaf = leaf_element(root, pos.leaf)?;
    if is_atom(&leaf) {
        let parent = leaf.parent_node()?;
        let index = child_index(&parent, leaf.as_ref())?;
        return Some((parent, index + u32::from(pos.offset > 0)));
    }

    let in_code = is_code(&leaf);
    let walker = walker(&leaf)?;
    let mut remaining = pos.offset;
    let mut trailing: Option<Node> = None;
    while let Ok(Some(n)) = walker.next_node() {
        if n.node_type() == Node::TEXT_NODE {
            let text = n.text_content().unwrap_or_default();
            let len = text.chars().count();
            if remaining <= len {
                let utf16 = chars_to_utf16(&text, remaining);
                return Some((n, utf16 as u32));
            }
            remaining -= len;
        } else if node_len(&n, in_code) == 1 {
            if remaining == 0 {
                let parent = n.parent_node()?;
                let index = child_index(&parent, &n)?;
                return Some((parent, index));
            }
            remaining -= 1;
        } else if n
            .dyn_ref::<Element>()
            .is_some_and(|e| e.tag_name().eq_ignore_ascii_case("br"))
        {
            trailing = Some(n);
        }
    }

    // Past the last text: before the caret-box break, else at the end.
    if let Some(br) = trailing {
        let parent = br.parent_node()?;
        let index = child_index(&parent, &br)?;
        return Some((parent, index));
    }
    let leaf_node: Node = leaf.into();
    let end = leaf_node.child_nodes().length();
    Some((leaf_node, end))
}

fn child_index(parent: &Node, child: &Node) -> Option<u32> {
    let children = parent.child_nodes();
    (0..children.length()).find(|&i| children.get(i).as_ref() == Some(child))
}

/// Read the window selection as document positions.
pub fn read_dom_selection(root: &Element) -> Option<Selection> {
    let selection = web_sys::window()?.get_selection().ok()??;
    let anchor_node = selection.anchor_node()?;
    let focus_node = selection.focus_node()?;
    let anchor = dom_to_position(root, &anchor_node, selection.anchor_offset() as usize)?;
    let head = dom_to_position(root, &focus_node, selection.focus_offset() as usize)?;
    Some(Selection::new(anchor, head))
}

/// Put the window selection at `selection`, keeping its direction.
pub fn write_dom_selection(root: &Element, selection: Selection) -> Result<(), PlatformError> {
    let (anchor_node, anchor_offset) =
        position_to_dom(root, selection.anchor).ok_or("anchor not rendered")?;
    let (focus_node, focus_offset) =
        position_to_dom(root, selection.head).ok_or("head not rendered")?;
    let dom_selection = web_sys::window()
        .ok_or("no window")?
        .get_selection()
        .map_err(|e| format!("get_selection failed: {e:?}"))?
        .ok_or("no selection object")?;
    dom_selection
        .set_base_and_extent(&anchor_node, anchor_offset, &focus_node, focus_offset)
        .map_err(|e| format!("set_base_and_extent failed: {e:?}"))?;
    Ok(())
}

/// Bounding rectangle of `selection` in viewport coordinates.
pub fn selection_rect(root: &Element, selection: Selection) -> Option<Rect> {
    let document = root.owner_document()?;
    let (start_node, start_offset) = position_to_dom(root, selection.start())?;
    let (end_node, end_offset) = position_to_dom(root, selection.end())?;
    let range = document.create_range().ok()?;
    range.set_start(&start_node, start_offset).ok()?;
    range.set_end(&end_node, end_offset).ok()?;
    let rect = range.get_bounding_client_rect();
    Some(Rect::new(rect.x(), rect.y(), rect.width(), rect.height()))
}

/// Document position under a viewport point, for drops. Dropping onto an
/// atom lands after it.
pub fn position_at_point(root: &Element, x: f64, y: f64) -> Option<Position> {
    let document = root.owner_document()?;
    if let Some(hit) = document.element_from_point(x as f32, y as f32) {
        if let Some((leaf, index)) = leaf_of(hit.as_ref(), root) {
            if is_atom(&leaf) {
                return Some(Position::new(index, 1));
            }
        }
    }
    let caret = document.caret_position_from_point(x as f32, y as f32)?;
    let node = caret.offset_node()?;
    dom_to_position(root, &node, caret.offset() as usize)
}

/// The viewport size.
pub fn viewport() -> Size {
    let Some(window) = web_sys::window() else {
        return Size::default();
    };
    let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    Size::new(width, height)
}

/// Replace the surface content with freshly rendered HTML.
pub fn render_into(root: &Element, html: &str) {
    root.set_inner_html(html);
}

/// Browser implementation of the platform traits over one editing surface.
pub struct BrowserSurface {
    root: HtmlElement,
}

impl BrowserSurface {
    pub fn new(root: HtmlElement) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &HtmlElement {
        &self.root
    }

    fn element(&self) -> &Element {
        self.root.as_ref()
    }

    /// Re-render and put the caret back.
    pub fn render(&self, html: &str, selection: Selection) {
        render_into(self.element(), html);
        if let Err(err) = write_dom_selection(self.element(), selection) {
            tracing::debug!(%err, "could not restore selection after render");
        }
    }
}

impl CursorPlatform for BrowserSurface {
    fn restore_selection(&self, selection: Selection) -> Result<(), PlatformError> {
        write_dom_selection(self.element(), selection)
    }

    fn selection_rect(&self, selection: Selection) -> Option<Rect> {
        selection_rect(self.element(), selection)
    }
}

impl CursorSync for BrowserSurface {
    fn read_selection(&self) -> Option<Selection> {
        read_dom_selection(self.element())
    }

    fn position_at_point(&self, x: f64, y: f64) -> Option<Position> {
        position_at_point(self.element(), x, y)
    }
}

impl SurfacePlatform for BrowserSurface {
    fn focus(&self) -> Result<(), PlatformError> {
        self.root
            .focus()
            .map_err(|e| PlatformError(format!("focus failed: {e:?}")))
    }

    fn viewport(&self) -> Size {
        viewport()
    }
}
