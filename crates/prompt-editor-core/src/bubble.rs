//! Floating bubble menu over a text selection.
//!
//! The menu is hidden until the selection is a non-empty text range. It
//! then shows its format controls; the link button swaps those for a URL
//! field, which Enter submits and Escape dismisses.

use smol_str::SmolStr;
use tracing::debug;

use crate::actions::{BlockStyle, EditorAction};
use crate::config::{EditorConfig, Extension};
use crate::dropdown::{Placement, place_centered};
use crate::query::ActiveState;
use crate::shell::EditorShell;
use crate::toolbar::{ToolbarControl, ToolbarItem, block_label, item};
use crate::types::{Rect, Size};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BubbleMenu {
    #[default]
    Hidden,
    /// Block style picker and inline formatting buttons.
    Format,
    /// The URL field, with what has been typed so far.
    LinkInput { draft: String },
}

impl BubbleMenu {
    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::Hidden)
    }

    pub fn is_editing_link(&self) -> bool {
        matches!(self, Self::LinkInput { .. })
    }

    /// Follow the editor's selection. Showing and hiding happen only here.
    pub fn sync(&mut self, state: &ActiveState) {
        match (state.has_text_selection, self.is_visible()) {
            (false, true) => *self = Self::Hidden,
            (true, false) => *self = Self::Format,
            _ => {}
        }
    }

    /// The link button toggles between the format controls and the URL
    /// field. The field starts out with the current link, if any.
    pub fn press_link(&mut self, state: &ActiveState) {
        *self = match self {
            Self::Hidden => return,
            Self::Format => Self::LinkInput {
                draft: state.link.as_deref().unwrap_or_default().to_string(),
            },
            Self::LinkInput { .. } => Self::Format,
        };
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        if let Self::LinkInput { draft } = self {
            *draft = text.into();
        }
    }

    pub fn draft(&self) -> Option<&str> {
        match self {
            Self::LinkInput { draft } => Some(draft),
            _ => None,
        }
    }

    /// Enter in the URL field: apply the draft to the selection (an empty
    /// draft removes the link) and go back to the format controls.
    pub fn submit_link(&mut self, shell: &mut EditorShell) -> bool {
        let Self::LinkInput { draft } = std::mem::replace(self, Self::Format) else {
            return false;
        };
        if shell.selection().is_collapsed() {
            debug!("link submitted without a selection");
            return false;
        }
        shell.run(&EditorAction::SetLink(Some(draft)))
    }

    /// Escape leaves the URL field, or hides the menu.
    pub fn escape(&mut self) {
        *self = match self {
            Self::LinkInput { .. } => Self::Format,
            _ => Self::Hidden,
        };
    }

    /// Remove the link under the selection and close the URL field.
    pub fn remove_link(&mut self, shell: &mut EditorShell) -> bool {
        if self.is_editing_link() {
            *self = Self::Format;
        }
        shell.run(&EditorAction::UnsetLink)
    }

    /// Format controls for `state`. The remove-link button only appears on
    /// a link.
    pub fn items(state: &ActiveState, config: &EditorConfig) -> Vec<ToolbarItem> {
        let mut controls = vec![
            ToolbarControl::BlockStyle,
            ToolbarControl::Bold,
            ToolbarControl::Italic,
        ];
        if config.has(Extension::Underline) {
            controls.push(ToolbarControl::Underline);
        }
        controls.extend([ToolbarControl::Strike, ToolbarControl::Code]);
        if config.has(Extension::Link) {
            controls.push(ToolbarControl::Link);
            if state.link.is_some() {
                controls.push(ToolbarControl::Unlink);
            }
        }
        controls
            .into_iter()
            .map(|control| item(control, 0, state))
            .collect()
    }

    /// Label of the block picker. Quotes and code blocks read as paragraphs
    /// here since the bubble picker only offers paragraph and headings.
    pub fn block_label(state: &ActiveState) -> SmolStr {
        match state.block {
            style @ BlockStyle::Heading(_) => SmolStr::new_static(block_label(style)),
            _ => SmolStr::new_static("Paragraph"),
        }
    }

    /// Where to float the menu, centered over the selection. `None` while
    /// hidden.
    pub fn placement(&self, selection: Rect, panel: Size, viewport: Size) -> Option<Placement> {
        self.is_visible()
            .then(|| place_centered(selection, panel, viewport))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dropdown::Side;
    use crate::editor::EditorDocument;
    use crate::types::{Position, Selection};

    fn shell(html: &str) -> EditorShell {
        EditorShell::mount(EditorConfig::default(), html, |_| {}).unwrap()
    }

    fn select(shell: &mut EditorShell, from: usize, to: usize) -> ActiveState {
        shell.run(&EditorAction::SetSelection(Selection::new(
            Position::new(0, from),
            Position::new(0, to),
        )));
        shell.active_state()
    }

    #[test]
    fn shows_only_for_text_ranges() {
        let mut shell = shell(r#"<p>hello</p><img src="x.png">"#);
        let mut menu = BubbleMenu::default();

        menu.sync(&shell.active_state());
        assert_eq!(menu, BubbleMenu::Hidden);

        let state = select(&mut shell, 0, 3);
        menu.sync(&state);
        assert_eq!(menu, BubbleMenu::Format);

        shell.run(&EditorAction::SelectNode(1));
        menu.sync(&shell.active_state());
        assert_eq!(menu, BubbleMenu::Hidden);
    }

    #[test]
    fn shows_for_whitespace_only_range() {
        let mut shell = shell("<p>a   b</p>");
        let mut menu = BubbleMenu::default();
        let state = select(&mut shell, 1, 4);
        assert!(state.has_text_selection);
        menu.sync(&state);
        assert_eq!(menu, BubbleMenu::Format);
    }

    #[test]
    fn hidden_for_range_spanning_only_a_block_boundary() {
        let mut shell = shell("<p>ab</p><p>cd</p>");
        shell.run(&EditorAction::SetSelection(Selection::new(
            Position::new(0, 2),
            Position::new(1, 0),
        )));
        let mut menu = BubbleMenu::default();
        menu.sync(&shell.active_state());
        assert_eq!(menu, BubbleMenu::Hidden);
    }

    #[test]
    fn link_flow_applies_normalized_href() {
        let mut shell = shell("<p>hello</p>");
        let mut menu = BubbleMenu::default();
        let state = select(&mut shell, 0, 5);
        menu.sync(&state);
        menu.press_link(&state);
        assert_eq!(menu.draft(), Some(""));

        // Selection updates while typing keep the field open.
        menu.sync(&state);
        assert!(menu.is_editing_link());

        menu.set_draft("example.com");
        assert!(menu.submit_link(&mut shell));
        assert_eq!(menu, BubbleMenu::Format);
        assert_eq!(
            shell.editor().content_html(),
            r#"<p><a target="_blank" rel="noopener noreferrer nofollow" href="https://example.com">hello</a></p>"#
        );

        let state = shell.active_state();
        menu.press_link(&state);
        assert_eq!(menu.draft(), Some("https://example.com"));
        menu.escape();
        assert_eq!(menu, BubbleMenu::Format);
        menu.escape();
        assert_eq!(menu, BubbleMenu::Hidden);
    }

    #[test]
    fn submit_without_range_is_a_no_op() {
        let mut shell = shell("<p>hello</p>");
        let mut menu = BubbleMenu::LinkInput {
            draft: "example.com".into(),
        };
        shell.run(&EditorAction::SetSelection(Selection::collapsed(Position::new(0, 2))));
        assert!(!menu.submit_link(&mut shell));
        assert_eq!(shell.editor().content_html(), "<p>hello</p>");
    }

    #[test]
    fn remove_link_button_only_on_links() {
        let mut shell = shell(r#"<p><a href="https://x.example">ab</a>cd</p>"#);
        let config = EditorConfig::default();

        let state = select(&mut shell, 0, 2);
        let items = BubbleMenu::items(&state, &config);
        assert_eq!(items.last().map(|i| i.control), Some(ToolbarControl::Unlink));

        let mut menu = BubbleMenu::LinkInput {
            draft: "https://x.example".into(),
        };
        assert!(menu.remove_link(&mut shell));
        assert_eq!(menu, BubbleMenu::Format);
        assert_eq!(shell.editor().content_html(), "<p>abcd</p>");

        let state = select(&mut shell, 2, 4);
        let items = BubbleMenu::items(&state, &config);
        assert_eq!(items.last().map(|i| i.control), Some(ToolbarControl::Link));
    }

    #[test]
    fn floats_above_selection() {
        let menu = BubbleMenu::Format;
        let viewport = Size::new(800.0, 600.0);
        let p = menu
            .placement(Rect::new(300.0, 200.0, 100.0, 18.0), Size::new(240.0, 36.0), viewport)
            .unwrap();
        assert_eq!(p.side, Side::Above);
        assert_eq!(p.left, 230.0);
        assert!(BubbleMenu::Hidden.placement(Rect::default(), Size::default(), viewport).is_none());
    }
}
