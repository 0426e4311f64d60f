//! Editor configuration supplied by the host.
//!
//! Every field has a default, so a host can pass `{}` and get the full
//! extension set: headings 1 to 3, underline, links, tables, video embeds
//! and multicolor highlights.

use serde::{Deserialize, Serialize};

use crate::error::EditorError;

/// Deepest heading level the editor supports.
pub const MAX_HEADING_LEVEL: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub heading_levels: Vec<u8>,
    pub underline: ExtensionToggle,
    pub link: LinkConfig,
    pub table: TableConfig,
    pub video: VideoConfig,
    pub highlight: HighlightConfig,
    /// Maximum number of undo steps kept.
    pub history_depth: usize,
    /// Consecutive typing within this window merges into one undo step.
    pub history_group_ms: u64,
    pub ingest_order: IngestOrder,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            heading_levels: vec![1, 2, 3],
            underline: ExtensionToggle::default(),
            link: LinkConfig::default(),
            table: TableConfig::default(),
            video: VideoConfig::default(),
            highlight: HighlightConfig::default(),
            history_depth: 100,
            history_group_ms: 500,
            ingest_order: IngestOrder::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionToggle {
    pub enabled: bool,
}

impl Default for ExtensionToggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkConfig {
    pub enabled: bool,
    /// Follow links on click while editing.
    pub open_on_click: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            open_on_click: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub enabled: bool,
    /// Columns can be resized by dragging borders.
    pub resizable: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            resizable: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub enabled: bool,
    /// Embed through youtube-nocookie.com.
    pub nocookie: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            nocookie: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub enabled: bool,
    /// Highlights carry a color; otherwise a single default highlight.
    pub multicolor: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            multicolor: true,
        }
    }
}

/// How completed file reads from one batch are inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IngestOrder {
    /// Insert each file as soon as its read completes.
    #[default]
    Concurrent,
    /// Hold completions until every earlier file in the batch is done.
    Sequential,
}

impl EditorConfig {
    /// Check heading levels and history settings.
    pub fn validate(&self) -> Result<(), EditorError> {
        if self.heading_levels.is_empty() {
            return Err(EditorError::InvalidConfig(
                "at least one heading level must be enabled".into(),
            ));
        }
        if let Some(&bad) = self
            .heading_levels
            .iter()
            .find(|&&l| l == 0 || l > MAX_HEADING_LEVEL)
        {
            return Err(EditorError::InvalidHeadingLevel(bad));
        }
        if self.history_depth == 0 {
            return Err(EditorError::InvalidConfig(
                "history depth must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn heading_enabled(&self, level: u8) -> bool {
        self.heading_levels.contains(&level)
    }

    /// Error for a command needing an extension that is switched off.
    pub fn require(&self, extension: Extension) -> Result<(), EditorError> {
        if self.has(extension) {
            Ok(())
        } else {
            Err(EditorError::MissingExtension(extension.name()))
        }
    }

    pub fn has(&self, extension: Extension) -> bool {
        match extension {
            Extension::Underline => self.underline.enabled,
            Extension::Link => self.link.enabled,
            Extension::Table => self.table.enabled,
            Extension::Video => self.video.enabled,
            Extension::Highlight => self.highlight.enabled,
        }
    }

    /// Parse from a JSON-like value handed over by a host.
    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        serde_json::from_str(json).map_err(|e| EditorError::InvalidConfig(e.to_string()))
    }
}

/// Optional extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    Underline,
    Link,
    Table,
    Video,
    Highlight,
}

impl Extension {
    pub fn name(self) -> &'static str {
        match self {
            Self::Underline => "underline",
            Self::Link => "link",
            Self::Table => "table",
            Self::Video => "video",
            Self::Highlight => "highlight",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = EditorConfig::from_json("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert!(config.validate().is_ok());
        assert!(config.video.nocookie);
        assert!(!config.link.open_on_click);
    }

    #[test]
    fn partial_override() {
        let config = EditorConfig::from_json(
            r#"{"headingLevels":[1,2],"table":{"enabled":false},"ingestOrder":"sequential"}"#,
        )
        .unwrap();
        assert!(!config.has(Extension::Table));
        assert!(config.table.resizable);
        assert!(config.has(Extension::Link));
        assert!(!config.heading_enabled(3));
        assert_eq!(config.ingest_order, IngestOrder::Sequential);
        assert_eq!(
            config.require(Extension::Table),
            Err(EditorError::MissingExtension("table"))
        );
    }

    #[test]
    fn rejects_bad_heading_levels() {
        let config = EditorConfig {
            heading_levels: vec![1, 4],
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(EditorError::InvalidHeadingLevel(4)));

        let config = EditorConfig {
            heading_levels: vec![],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EditorError::InvalidConfig(_))
        ));
    }
}
