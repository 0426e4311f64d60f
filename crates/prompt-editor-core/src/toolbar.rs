//! The formatting toolbar as a model.
//!
//! [`Toolbar::items`] lays out the control strip for the current active
//! state; the host renders it and reports interactions back as
//! [`ToolbarCommand`]s through [`Toolbar::dispatch`]. Controls that open a
//! picker (block style, fonts, colors, link URL, image files) only tell the
//! host to open it; the picked value comes back as a second command.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::debug;

use crate::actions::{BlockStyle, EditorAction};
use crate::config::{EditorConfig, Extension};
use crate::document::TextAlign;
use crate::editor::EditorDocument;
use crate::marks::SimpleMark;
use crate::query::ActiveState;
use crate::shell::EditorShell;

/// Font family shown when the selection carries none.
pub const DEFAULT_FONT_FAMILY: &str = "Inter";

/// Font size shown when the selection carries none.
pub const DEFAULT_FONT_SIZE: &str = "16px";

/// Label and CSS `font-family` value.
pub const FONT_FAMILIES: [(&str, &str); 4] = [
    ("Inter", "Inter"),
    ("Nanum Gothic", "Nanum Gothic"),
    ("Malgun Gothic", "Malgun Gothic"),
    ("Dotum", "Dotum"),
];

pub const FONT_SIZES: [&str; 8] = ["12px", "14px", "16px", "18px", "20px", "24px", "30px", "36px"];

/// Text color swatches; the trailing `None` removes the color.
pub const TEXT_COLORS: [Option<&str>; 16] = [
    Some("#000000"),
    Some("#495057"),
    Some("#c2255c"),
    Some("#c92a2a"),
    Some("#a61e4d"),
    Some("#862e9c"),
    Some("#5f3dc4"),
    Some("#364fc7"),
    Some("#1864ab"),
    Some("#0b7285"),
    Some("#087f5b"),
    Some("#2b8a3e"),
    Some("#5c940d"),
    Some("#e67700"),
    Some("#d9480f"),
    None,
];

/// Highlight swatches; the trailing `None` removes the highlight.
pub const HIGHLIGHT_COLORS: [Option<&str>; 16] = [
    Some("#fff0f6"),
    Some("#f8f0fc"),
    Some("#f3f0ff"),
    Some("#f1f3f5"),
    Some("#e5f9ff"),
    Some("#e3fafc"),
    Some("#e6fcf5"),
    Some("#f4fce3"),
    Some("#fff9db"),
    Some("#fff4e6"),
    Some("#ffe8cc"),
    Some("#ffc9c9"),
    Some("#ffd8a8"),
    Some("#ffec99"),
    Some("#d8f5a2"),
    None,
];

/// Size of the grid the table control inserts.
pub const TABLE_ROWS: usize = 3;
pub const TABLE_COLS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolbarControl {
    Undo,
    Redo,
    BlockStyle,
    FontFamily,
    FontSize,
    Bold,
    Italic,
    Underline,
    Strike,
    /// Inline code; bubble menu only.
    Code,
    Link,
    /// Remove the link under the selection; bubble menu only.
    Unlink,
    AlignLeft,
    AlignCenter,
    AlignRight,
    BulletList,
    TextColor,
    Highlight,
    HorizontalRule,
    CodeBlock,
    Table,
    Image,
}

impl ToolbarControl {
    /// Tooltip text.
    pub fn title(self) -> &'static str {
        match self {
            Self::Undo => "Undo",
            Self::Redo => "Redo",
            Self::BlockStyle => "Text style",
            Self::FontFamily => "Font",
            Self::FontSize => "Font size",
            Self::Bold => "Bold",
            Self::Italic => "Italic",
            Self::Underline => "Underline",
            Self::Strike => "Strikethrough",
            Self::Code => "Code",
            Self::Link => "Link",
            Self::Unlink => "Remove link",
            Self::AlignLeft => "Align left",
            Self::AlignCenter => "Align center",
            Self::AlignRight => "Align right",
            Self::BulletList => "Bullet list",
            Self::TextColor => "Text color",
            Self::Highlight => "Highlight",
            Self::HorizontalRule => "Horizontal rule",
            Self::CodeBlock => "Code block",
            Self::Table => "Insert table",
            Self::Image => "Insert image",
        }
    }

    /// Controls that open a picker instead of running a command.
    pub fn is_picker(self) -> bool {
        matches!(
            self,
            Self::BlockStyle
                | Self::FontFamily
                | Self::FontSize
                | Self::TextColor
                | Self::Highlight
                | Self::Link
                | Self::Image
        )
    }

    fn mark(self) -> Option<SimpleMark> {
        match self {
            Self::Bold => Some(SimpleMark::Bold),
            Self::Italic => Some(SimpleMark::Italic),
            Self::Underline => Some(SimpleMark::Underline),
            Self::Strike => Some(SimpleMark::Strike),
            Self::Code => Some(SimpleMark::Code),
            _ => None,
        }
    }

    fn align(self) -> Option<TextAlign> {
        match self {
            Self::AlignLeft => Some(TextAlign::Left),
            Self::AlignCenter => Some(TextAlign::Center),
            Self::AlignRight => Some(TextAlign::Right),
            _ => None,
        }
    }

    fn extension(self) -> Option<Extension> {
        match self {
            Self::Underline => Some(Extension::Underline),
            Self::Link | Self::Unlink => Some(Extension::Link),
            Self::Highlight => Some(Extension::Highlight),
            Self::Table => Some(Extension::Table),
            _ => None,
        }
    }

    /// Whether this control lights up for `state`.
    pub fn is_active(self, state: &ActiveState) -> bool {
        if let Some(mark) = self.mark() {
            return state.has(mark);
        }
        if let Some(align) = self.align() {
            return state.align.unwrap_or(TextAlign::Left) == align;
        }
        match self {
            Self::Link => state.link.is_some(),
            Self::BulletList => state.bullet_list,
            Self::CodeBlock => state.code_block,
            Self::Highlight => state.highlight.is_some(),
            _ => false,
        }
    }
}

/// One rendered control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolbarItem {
    pub control: ToolbarControl,
    pub title: &'static str,
    /// Controls sharing a group render together, with a divider between
    /// groups.
    pub group: u8,
    pub active: bool,
    pub disabled: bool,
    /// Current value for pickers that show one (block style, font, size).
    pub label: Option<SmolStr>,
}

/// An entry of the block-style picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockOption {
    pub style: BlockStyle,
    pub label: &'static str,
}

/// Block styles offered for `config`, in picker order. The quote entry is
/// left out of the bubble menu's shorter list.
pub fn block_styles(config: &EditorConfig, with_quote: bool) -> Vec<BlockOption> {
    let mut options = vec![BlockOption {
        style: BlockStyle::Paragraph,
        label: "Paragraph",
    }];
    for (level, label) in [(1, "Heading 1"), (2, "Heading 2"), (3, "Heading 3")] {
        if config.heading_enabled(level) {
            options.push(BlockOption {
                style: BlockStyle::Heading(level),
                label,
            });
        }
    }
    if with_quote {
        options.push(BlockOption {
            style: BlockStyle::Quote,
            label: "Quote",
        });
    }
    options
}

/// Picker label for the active block style.
pub fn block_label(style: BlockStyle) -> &'static str {
    match style {
        BlockStyle::Paragraph => "Paragraph",
        BlockStyle::Heading(1) => "Heading 1",
        BlockStyle::Heading(2) => "Heading 2",
        BlockStyle::Heading(_) => "Heading 3",
        BlockStyle::Quote => "Quote",
        BlockStyle::Code => "Code",
    }
}

/// An interaction with the toolbar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum ToolbarCommand {
    /// A control was clicked.
    Press(ToolbarControl),
    BlockStyle(BlockStyle),
    FontFamily(SmolStr),
    FontSize(SmolStr),
    /// A text color swatch; `None` is the remove swatch.
    TextColor(Option<SmolStr>),
    /// A highlight swatch; `None` is the remove swatch.
    Highlight(Option<SmolStr>),
    /// Answer to the link prompt; `None` when it was cancelled.
    Link(Option<String>),
}

/// What the host should do after a dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ToolbarOutcome {
    /// A command ran; `changed` reports whether it did anything.
    Applied { changed: bool },
    /// Open the picker for this control.
    OpenPicker { control: ToolbarControl },
    /// Ask for a link URL, pre-filled with the current one.
    PromptLink { current: Option<SmolStr> },
    /// Open the file picker (images, multiple); pass the files to
    /// [`EditorShell::ingest_begin`] without a target.
    PickFiles,
    /// Nothing to do.
    Ignored,
}

pub struct Toolbar;

impl Toolbar {
    const LAYOUT: [(ToolbarControl, u8); 20] = [
        (ToolbarControl::Undo, 0),
        (ToolbarControl::Redo, 0),
        (ToolbarControl::BlockStyle, 1),
        (ToolbarControl::FontFamily, 1),
        (ToolbarControl::FontSize, 1),
        (ToolbarControl::Bold, 2),
        (ToolbarControl::Italic, 2),
        (ToolbarControl::Underline, 2),
        (ToolbarControl::Strike, 2),
        (ToolbarControl::Link, 2),
        (ToolbarControl::AlignLeft, 3),
        (ToolbarControl::AlignCenter, 3),
        (ToolbarControl::AlignRight, 3),
        (ToolbarControl::BulletList, 3),
        (ToolbarControl::TextColor, 4),
        (ToolbarControl::Highlight, 4),
        (ToolbarControl::HorizontalRule, 5),
        (ToolbarControl::CodeBlock, 5),
        (ToolbarControl::Table, 5),
        (ToolbarControl::Image, 5),
    ];

    /// The control strip for `state`. Controls of disabled extensions are
    /// left out.
    pub fn items(state: &ActiveState, config: &EditorConfig) -> Vec<ToolbarItem> {
        Self::LAYOUT
            .iter()
            .filter(|(control, _)| control.extension().is_none_or(|ext| config.has(ext)))
            .map(|&(control, group)| item(control, group, state))
            .collect()
    }

    /// The editor action a command maps to, if it maps to exactly one.
    pub fn action(command: &ToolbarCommand) -> Option<EditorAction> {
        let action = match command {
            ToolbarCommand::Press(control) => press_action(*control)?,
            ToolbarCommand::BlockStyle(style) => EditorAction::SetBlockStyle(*style),
            ToolbarCommand::FontFamily(family) => EditorAction::SetFontFamily(Some(family.clone())),
            ToolbarCommand::FontSize(size) => EditorAction::SetFontSize(Some(size.clone())),
            ToolbarCommand::TextColor(color) => EditorAction::SetColor(color.clone()),
            ToolbarCommand::Highlight(Some(color)) => {
                EditorAction::ToggleHighlight(Some(color.clone()))
            }
            ToolbarCommand::Highlight(None) => EditorAction::SetHighlight(None),
            ToolbarCommand::Link(None) => return None,
            ToolbarCommand::Link(Some(input)) => EditorAction::SetLink(Some(input.clone())),
        };
        Some(action)
    }

    /// Handle one interaction. At most one editor command runs, and running
    /// one asks the host to refocus the editing surface.
    pub fn dispatch(shell: &mut EditorShell, command: ToolbarCommand) -> ToolbarOutcome {
        if let ToolbarCommand::Press(control) = command {
            if control.extension().is_some_and(|ext| !shell.config().has(ext)) {
                debug!(?control, "control of a disabled extension");
                return ToolbarOutcome::Ignored;
            }
            match control {
                ToolbarControl::Link => {
                    return ToolbarOutcome::PromptLink {
                        current: shell.active_state().link,
                    };
                }
                ToolbarControl::Image => return ToolbarOutcome::PickFiles,
                ToolbarControl::Undo if !shell.editor().can_undo() => return ToolbarOutcome::Ignored,
                ToolbarControl::Redo if !shell.editor().can_redo() => return ToolbarOutcome::Ignored,
                c if c.is_picker() => return ToolbarOutcome::OpenPicker { control: c },
                _ => {}
            }
        }

        match Self::action(&command) {
            Some(action) => ToolbarOutcome::Applied {
                changed: shell.run(&action),
            },
            None => {
                debug!(?command, "toolbar command without an action");
                ToolbarOutcome::Ignored
            }
        }
    }
}

fn press_action(control: ToolbarControl) -> Option<EditorAction> {
    if let Some(mark) = control.mark() {
        return Some(EditorAction::ToggleMark(mark));
    }
    if let Some(align) = control.align() {
        return Some(EditorAction::SetTextAlign(Some(align)));
    }
    let action = match control {
        ToolbarControl::Undo => EditorAction::Undo,
        ToolbarControl::Redo => EditorAction::Redo,
        ToolbarControl::Unlink => EditorAction::UnsetLink,
        ToolbarControl::BulletList => EditorAction::ToggleBulletList,
        ToolbarControl::HorizontalRule => EditorAction::InsertHorizontalRule,
        ToolbarControl::CodeBlock => EditorAction::ToggleCodeBlock,
        ToolbarControl::Table => EditorAction::InsertTable {
            rows: TABLE_ROWS,
            cols: TABLE_COLS,
            header: true,
        },
        _ => return None,
    };
    Some(action)
}

pub(crate) fn item(control: ToolbarControl, group: u8, state: &ActiveState) -> ToolbarItem {
    let disabled = match control {
        ToolbarControl::Undo => !state.can_undo,
        ToolbarControl::Redo => !state.can_redo,
        _ => false,
    };
    let label = match control {
        ToolbarControl::BlockStyle => Some(SmolStr::new_static(block_label(state.block))),
        ToolbarControl::FontFamily => Some(
            state
                .font_family
                .clone()
                .unwrap_or(SmolStr::new_static(DEFAULT_FONT_FAMILY)),
        ),
        ToolbarControl::FontSize => Some(
            state
                .font_size
                .clone()
                .unwrap_or(SmolStr::new_static(DEFAULT_FONT_SIZE)),
        ),
        _ => None,
    };
    ToolbarItem {
        control,
        title: control.title(),
        group,
        active: control.is_active(state),
        disabled,
        label,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::types::{Position, Selection};

    fn shell(html: &str) -> (EditorShell, Rc<RefCell<Vec<String>>>) {
        shell_with(EditorConfig::default(), html)
    }

    fn shell_with(config: EditorConfig, html: &str) -> (EditorShell, Rc<RefCell<Vec<String>>>) {
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = changes.clone();
        let shell = EditorShell::mount(config, html, move |h| sink.borrow_mut().push(h.to_string()))
            .unwrap();
        (shell, changes)
    }

    fn select(shell: &mut EditorShell, from: usize, to: usize) {
        shell.run(&EditorAction::SetSelection(Selection::new(
            Position::new(0, from),
            Position::new(0, to),
        )));
    }

    #[test]
    fn strip_follows_layout() {
        let items = Toolbar::items(&ActiveState::default(), &EditorConfig::default());
        let controls: Vec<_> = items.iter().map(|i| i.control).collect();
        assert_eq!(controls.len(), 20);
        assert_eq!(controls[0], ToolbarControl::Undo);
        assert_eq!(controls[19], ToolbarControl::Image);
        assert!(items[0].disabled && items[1].disabled);
        assert_eq!(items[4].label.as_deref(), Some("16px"));
        assert_eq!(items[3].label.as_deref(), Some("Inter"));
        // Unaligned text counts as left aligned.
        let left = items.iter().find(|i| i.control == ToolbarControl::AlignLeft).unwrap();
        assert!(left.active);
    }

    #[test]
    fn disabled_extensions_drop_their_controls() {
        let mut config = EditorConfig::default();
        config.underline.enabled = false;
        config.table.enabled = false;
        let items = Toolbar::items(&ActiveState::default(), &config);
        assert!(items.iter().all(|i| i.control != ToolbarControl::Underline));
        assert!(items.iter().all(|i| i.control != ToolbarControl::Table));
        assert_eq!(items.len(), 18);
    }

    #[test]
    fn active_state_reflects_cursor() {
        let (mut shell, _) = shell("<p><strong>ab</strong>cd</p>");
        shell.run(&EditorAction::SetSelection(Selection::collapsed(Position::new(0, 1))));
        let items = Toolbar::items(&shell.active_state(), shell.config());
        let bold = items.iter().find(|i| i.control == ToolbarControl::Bold).unwrap();
        assert!(bold.active);

        shell.run(&EditorAction::SetSelection(Selection::collapsed(Position::new(0, 3))));
        let items = Toolbar::items(&shell.active_state(), shell.config());
        let bold = items.iter().find(|i| i.control == ToolbarControl::Bold).unwrap();
        assert!(!bold.active);
    }

    #[test]
    fn press_runs_one_command_and_requests_focus() {
        let (mut shell, changes) = shell("<p>word</p>");
        select(&mut shell, 0, 4);
        shell.take_focus_request();
        let outcome = Toolbar::dispatch(&mut shell, ToolbarCommand::Press(ToolbarControl::Italic));
        assert_eq!(outcome, ToolbarOutcome::Applied { changed: true });
        assert!(shell.take_focus_request());
        assert_eq!(*changes.borrow(), ["<p><em>word</em></p>"]);
    }

    #[test]
    fn pickers_open_instead_of_running() {
        let (mut shell, changes) = shell("<p>a</p>");
        assert_eq!(
            Toolbar::dispatch(&mut shell, ToolbarCommand::Press(ToolbarControl::FontSize)),
            ToolbarOutcome::OpenPicker {
                control: ToolbarControl::FontSize
            }
        );
        assert_eq!(
            Toolbar::dispatch(&mut shell, ToolbarCommand::Press(ToolbarControl::Image)),
            ToolbarOutcome::PickFiles
        );
        assert!(changes.borrow().is_empty());
        assert!(!shell.take_focus_request());
    }

    #[test]
    fn undo_is_ignored_without_history() {
        let (mut shell, _) = shell("<p>a</p>");
        assert_eq!(
            Toolbar::dispatch(&mut shell, ToolbarCommand::Press(ToolbarControl::Undo)),
            ToolbarOutcome::Ignored
        );
    }

    #[test]
    fn link_prompt_defaults_to_current_href() {
        let (mut shell, changes) = shell(r#"<p><a href="https://old.example">ab</a></p>"#);
        select(&mut shell, 0, 2);
        assert_eq!(
            Toolbar::dispatch(&mut shell, ToolbarCommand::Press(ToolbarControl::Link)),
            ToolbarOutcome::PromptLink {
                current: Some("https://old.example".into())
            }
        );

        shell.take_focus_request();
        assert_eq!(
            Toolbar::dispatch(&mut shell, ToolbarCommand::Link(None)),
            ToolbarOutcome::Ignored
        );
        assert!(!shell.take_focus_request());

        Toolbar::dispatch(&mut shell, ToolbarCommand::Link(Some("example.com".into())));
        assert_eq!(
            changes.borrow().last().map(String::as_str),
            Some(r#"<p><a target="_blank" rel="noopener noreferrer nofollow" href="https://example.com">ab</a></p>"#)
        );

        Toolbar::dispatch(&mut shell, ToolbarCommand::Link(Some(String::new())));
        assert_eq!(changes.borrow().last().map(String::as_str), Some("<p>ab</p>"));
    }

    #[test]
    fn table_control_inserts_three_by_three_with_header() {
        let (mut shell, _) = shell("<p>a</p>");
        Toolbar::dispatch(&mut shell, ToolbarCommand::Press(ToolbarControl::Table));
        let html = shell.html().to_string();
        assert_eq!(html.matches("<th>").count(), 3);
        assert_eq!(html.matches("<td>").count(), 6);
    }

    #[test]
    fn swatches_map_to_color_commands() {
        let (mut shell, changes) = shell("<p>ab</p>");
        select(&mut shell, 0, 2);
        Toolbar::dispatch(&mut shell, ToolbarCommand::TextColor(Some("#c92a2a".into())));
        assert_eq!(
            changes.borrow().last().map(String::as_str),
            Some(r#"<p><span style="color: #c92a2a">ab</span></p>"#)
        );
        Toolbar::dispatch(&mut shell, ToolbarCommand::TextColor(None));
        assert_eq!(changes.borrow().last().map(String::as_str), Some("<p>ab</p>"));

        Toolbar::dispatch(&mut shell, ToolbarCommand::Highlight(Some("#ffec99".into())));
        assert!(shell.active_state().highlight.is_some());
        Toolbar::dispatch(&mut shell, ToolbarCommand::Highlight(None));
        assert!(shell.active_state().highlight.is_none());
    }

    #[test]
    fn block_style_options_follow_config() {
        let config = EditorConfig {
            heading_levels: vec![1, 2],
            ..Default::default()
        };
        let styles: Vec<_> = block_styles(&config, true).iter().map(|o| o.style).collect();
        assert_eq!(
            styles,
            [
                BlockStyle::Paragraph,
                BlockStyle::Heading(1),
                BlockStyle::Heading(2),
                BlockStyle::Quote
            ]
        );
        assert_eq!(block_styles(&EditorConfig::default(), false).len(), 4);
    }

    #[test]
    fn swatch_tables() {
        assert_eq!(TEXT_COLORS.iter().flatten().count(), 15);
        assert_eq!(HIGHLIGHT_COLORS.iter().flatten().count(), 15);
        assert_eq!(TEXT_COLORS.last(), Some(&None));
    }

    #[test]
    fn heading_option_reports_active_label() {
        let (mut shell, _) = shell("<p>title</p>");
        Toolbar::dispatch(&mut shell, ToolbarCommand::BlockStyle(BlockStyle::Heading(2)));
        assert_eq!(shell.editor().content_html(), "<h2>title</h2>");
        let items = Toolbar::items(&shell.active_state(), shell.config());
        assert_eq!(items[2].label.as_deref(), Some("Heading 2"));
    }
}
