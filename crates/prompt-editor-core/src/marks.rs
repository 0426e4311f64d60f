//! Inline marks carried by text runs.
//!
//! Boolean marks live in a `FormatFlags` set; attribute marks (link, text
//! style, highlight) are optional fields. `MarkSet::layers` yields the marks
//! in the fixed nesting order used for serialization.

use bitflags::bitflags;
use smol_str::SmolStr;

bitflags! {
    /// Boolean inline formatting.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    pub struct FormatFlags: u8 {
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
        const UNDERLINE = 1 << 2;
        const STRIKE = 1 << 3;
        const CODE = 1 << 4;
    }
}

/// A toggleable boolean mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SimpleMark {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
}

impl SimpleMark {
    pub fn flag(self) -> FormatFlags {
        match self {
            Self::Bold => FormatFlags::BOLD,
            Self::Italic => FormatFlags::ITALIC,
            Self::Underline => FormatFlags::UNDERLINE,
            Self::Strike => FormatFlags::STRIKE,
            Self::Code => FormatFlags::CODE,
        }
    }

    /// HTML element this mark serializes to.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Bold => "strong",
            Self::Italic => "em",
            Self::Underline => "u",
            Self::Strike => "s",
            Self::Code => "code",
        }
    }

    /// Recognize an inline element as a boolean mark.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "strong" | "b" => Some(Self::Bold),
            "em" | "i" => Some(Self::Italic),
            "u" => Some(Self::Underline),
            "s" | "strike" | "del" => Some(Self::Strike),
            "code" => Some(Self::Code),
            _ => None,
        }
    }

    pub const ALL: [SimpleMark; 5] = [
        Self::Bold,
        Self::Italic,
        Self::Underline,
        Self::Strike,
        Self::Code,
    ];
}

/// Highlight mark. `color` is `None` for a single-color highlight.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Highlight {
    pub color: Option<SmolStr>,
}

/// Full set of marks on a run of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MarkSet {
    pub flags: FormatFlags,
    pub link: Option<SmolStr>,
    pub color: Option<SmolStr>,
    pub font_family: Option<SmolStr>,
    pub font_size: Option<SmolStr>,
    pub highlight: Option<Highlight>,
}

impl MarkSet {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn has(&self, mark: SimpleMark) -> bool {
        self.flags.contains(mark.flag())
    }

    pub fn set(&mut self, mark: SimpleMark, on: bool) {
        self.flags.set(mark.flag(), on);
    }

    /// Whether any text-style attribute (color, font) is present.
    pub fn has_text_style(&self) -> bool {
        self.color.is_some() || self.font_family.is_some() || self.font_size.is_some()
    }

    /// Marks in canonical nesting order, outermost first.
    pub fn layers(&self) -> Vec<MarkLayer> {
        let mut out = Vec::new();
        if let Some(href) = &self.link {
            out.push(MarkLayer::Link(href.clone()));
        }
        if self.has_text_style() {
            out.push(MarkLayer::TextStyle {
                color: self.color.clone(),
                font_family: self.font_family.clone(),
                font_size: self.font_size.clone(),
            });
        }
        if let Some(h) = &self.highlight {
            out.push(MarkLayer::Highlight(h.color.clone()));
        }
        for mark in SimpleMark::ALL {
            if self.has(mark) {
                out.push(MarkLayer::Simple(mark));
            }
        }
        out
    }

    /// Marks that typing at the end of this run should continue with.
    ///
    /// Links do not extend past their end.
    pub fn inheritable(&self) -> MarkSet {
        MarkSet {
            link: None,
            ..self.clone()
        }
    }
}

/// One nesting level of serialized marks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkLayer {
    Link(SmolStr),
    TextStyle {
        color: Option<SmolStr>,
        font_family: Option<SmolStr>,
        font_size: Option<SmolStr>,
    },
    Highlight(Option<SmolStr>),
    Simple(SimpleMark),
}

impl MarkLayer {
    /// Closing tag name.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Link(_) => "a",
            Self::TextStyle { .. } => "span",
            Self::Highlight(_) => "mark",
            Self::Simple(mark) => mark.tag(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layers_follow_canonical_order() {
        let mut marks = MarkSet {
            link: Some("https://a.example".into()),
            color: Some("#c92a2a".into()),
            highlight: Some(Highlight { color: None }),
            ..Default::default()
        };
        marks.set(SimpleMark::Code, true);
        marks.set(SimpleMark::Bold, true);

        let tags: Vec<_> = marks.layers().iter().map(MarkLayer::tag).collect();
        assert_eq!(tags, ["a", "span", "mark", "strong", "code"]);
    }

    #[test]
    fn inheritable_drops_link_only() {
        let mut marks = MarkSet {
            link: Some("https://a.example".into()),
            font_size: Some("18px".into()),
            ..Default::default()
        };
        marks.set(SimpleMark::Italic, true);

        let inherited = marks.inheritable();
        assert!(inherited.link.is_none());
        assert!(inherited.has(SimpleMark::Italic));
        assert_eq!(inherited.font_size.as_deref(), Some("18px"));
    }

    #[test]
    fn tag_aliases() {
        assert_eq!(SimpleMark::from_tag("b"), Some(SimpleMark::Bold));
        assert_eq!(SimpleMark::from_tag("del"), Some(SimpleMark::Strike));
        assert_eq!(SimpleMark::from_tag("span"), None);
    }
}
