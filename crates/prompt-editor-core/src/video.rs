//! YouTube embed URLs.

use smol_str::SmolStr;

const EMBED: &str = "https://www.youtube.com/embed/";
const EMBED_NOCOOKIE: &str = "https://www.youtube-nocookie.com/embed/";

/// Extract the video id from a watch, share, shorts or embed URL.
pub fn video_id(url: &str) -> Option<&str> {
    let url = url.trim();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    let rest = rest.strip_prefix("m.").unwrap_or(rest);

    let candidate = if let Some(tail) = rest.strip_prefix("youtu.be/") {
        tail
    } else if let Some(tail) = rest
        .strip_prefix("youtube.com/")
        .or_else(|| rest.strip_prefix("youtube-nocookie.com/"))
    {
        if let Some(query) = tail.strip_prefix("watch?") {
            query
                .split('&')
                .find_map(|pair| pair.strip_prefix("v="))?
        } else if let Some(id) = tail
            .strip_prefix("embed/")
            .or_else(|| tail.strip_prefix("shorts/"))
            .or_else(|| tail.strip_prefix("live/"))
        {
            id
        } else {
            return None;
        }
    } else {
        return None;
    };

    let id = candidate
        .split(['?', '&', '#', '/'])
        .next()
        .filter(|id| !id.is_empty())?;
    id.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        .then_some(id)
}

/// Embed URL for a YouTube link, or `None` when it is not one.
pub fn embed_url(url: &str, nocookie: bool) -> Option<SmolStr> {
    let id = video_id(url)?;
    let base = if nocookie { EMBED_NOCOOKIE } else { EMBED };
    Some(SmolStr::new(format!("{base}{id}")))
}
