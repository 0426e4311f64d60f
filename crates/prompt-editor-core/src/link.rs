//! Link input normalization.

use smol_str::SmolStr;

/// Schemes kept as typed; anything else is treated as a bare host.
const KEPT_SCHEMES: [&str; 4] = ["http://", "https://", "mailto:", "tel:"];

/// What a link prompt's input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkInput {
    /// Empty input: remove the link.
    Clear,
    Href(SmolStr),
}

/// Normalize raw link input. `"example.com"` becomes
/// `"https://example.com"`; blank input clears.
pub fn normalize_link(input: &str) -> LinkInput {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return LinkInput::Clear;
    }
    let lower = trimmed.to_ascii_lowercase();
    if KEPT_SCHEMES.iter().any(|s| lower.starts_with(s)) {
        LinkInput::Href(SmolStr::new(trimmed))
    } else {
        LinkInput::Href(SmolStr::new(format!("https://{trimmed}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_host_gets_https() {
        assert_eq!(
            normalize_link("example.com"),
            LinkInput::Href("https://example.com".into())
        );
        assert_eq!(
            normalize_link("  example.com/a?b=c "),
            LinkInput::Href("https://example.com/a?b=c".into())
        );
    }

    #[test]
    fn test_known_schemes_kept() {
        for input in [
            "http://example.com",
            "HTTPS://example.com",
            "mailto:someone@example.com",
            "tel:+15550100",
        ] {
            assert_eq!(normalize_link(input), LinkInput::Href(input.into()));
        }
    }

    #[test]
    fn test_blank_clears() {
        assert_eq!(normalize_link(""), LinkInput::Clear);
        assert_eq!(normalize_link("   "), LinkInput::Clear);
    }
}
