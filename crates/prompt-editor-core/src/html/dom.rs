//! Lenient HTML tokenizer and tree builder.
//!
//! Handles the subset of HTML that rich-text editors and browsers' clipboard
//! produce: elements with quoted or bare attributes, void elements, entities,
//! comments. Malformed input never fails; stray end tags are ignored and
//! unclosed elements close at end of input.

use smol_str::SmolStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    pub name: SmolStr,
    pub attrs: Vec<(SmolStr, String)>,
    pub children: Vec<Node>,
}

impl Element {
    fn new(name: SmolStr, attrs: Vec<(SmolStr, String)>) -> Self {
        Self {
            name,
            attrs,
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// A property from the inline `style` attribute.
    pub fn style(&self, property: &str) -> Option<&str> {
        style_value(self.attr("style")?, property)
    }

    /// Concatenated text of all descendants, `<br>` as newline.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(el) if el.name == "br" => out.push('\n'),
            Node::Element(el) => collect_text(&el.children, out),
        }
    }
}

/// Look up one declaration in a CSS declaration list.
pub(crate) fn style_value<'s>(style: &'s str, property: &str) -> Option<&'s str> {
    style.split(';').find_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case(property)
            .then(|| value.trim())
            .filter(|v| !v.is_empty())
    })
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is skipped entirely.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "template", "title", "head"];

/// Start tags that implicitly close an open `<p>`.
const CLOSES_P: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "fieldset", "figure", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "main", "nav", "ol", "p", "pre",
    "section", "table", "ul",
];

#[derive(Debug, PartialEq)]
enum Token {
    Start {
        name: SmolStr,
        attrs: Vec<(SmolStr, String)>,
        self_closing: bool,
    },
    End(SmolStr),
    Text(String),
}

struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_past(&mut self, needle: &str) {
        match self.rest().find(needle) {
            Some(i) => self.pos += i + needle.len(),
            None => self.pos = self.src.len(),
        }
    }

    /// Skip the body of a raw-text element up to and including its end tag.
    fn skip_raw_text(&mut self, name: &str) {
        let closing = format!("</{name}");
        let lower = self.rest().to_ascii_lowercase();
        match lower.find(&closing) {
            Some(i) => {
                self.pos += i;
                self.skip_past(">");
            }
            None => self.pos = self.src.len(),
        }
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let end = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    fn read_tag(&mut self) -> Option<Token> {
        // At '<'.
        let after = &self.rest()[1..];
        if after.starts_with("!--") {
            self.skip_past("-->");
            return None;
        }
        if after.starts_with('!') || after.starts_with('?') {
            self.skip_past(">");
            return None;
        }
        if let Some(end) = after.strip_prefix('/') {
            if !end.starts_with(|c: char| c.is_ascii_alphabetic()) {
                self.skip_past(">");
                return None;
            }
            self.pos += 2;
            let name = self.take_while(is_name_char).to_ascii_lowercase();
            self.skip_past(">");
            return Some(Token::End(name.into()));
        }

        self.pos += 1;
        let name: SmolStr = self.take_while(is_name_char).to_ascii_lowercase().into();
        let mut attrs = Vec::new();
        let mut self_closing = false;
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                break;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break;
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                self_closing = true;
                break;
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }
            let key = self
                .take_while(|c| !c.is_whitespace() && !matches!(c, '=' | '>' | '/'))
                .to_ascii_lowercase();
            if key.is_empty() {
                // Garbage such as a lone quote; step over it.
                self.pos += self.rest().chars().next().map(char::len_utf8).unwrap_or(1);
                continue;
            }
            self.skip_whitespace();
            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                self.read_attr_value()
            } else {
                String::new()
            };
            attrs.push((SmolStr::from(key), value));
        }
        Some(Token::Start {
            name,
            attrs,
            self_closing,
        })
    }

    fn read_attr_value(&mut self) -> String {
        let rest = self.rest();
        let raw = match rest.chars().next() {
            Some(q @ ('"' | '\'')) => {
                let body = &rest[1..];
                let end = body.find(q).unwrap_or(body.len());
                self.pos += 1 + end + if end < body.len() { 1 } else { 0 };
                &body[..end]
            }
            _ => self.take_while(|c| !c.is_whitespace() && c != '>'),
        };
        decode_entities(raw)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == ':'
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            let rest = self.rest();
            if rest.is_empty() {
                return None;
            }
            let is_tag = rest.starts_with('<')
                && rest[1..].starts_with(|c: char| {
                    c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?')
                });
            if !is_tag {
                // Text up to the next plausible tag.
                let mut end = rest.len();
                for (i, _) in rest.match_indices('<').filter(|&(i, _)| i > 0) {
                    if rest[i + 1..].starts_with(|c: char| {
                        c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?')
                    }) {
                        end = i;
                        break;
                    }
                }
                self.pos += end;
                return Some(Token::Text(decode_entities(&rest[..end])));
            }
            if let Some(token) = self.read_tag() {
                if let Token::Start { name, .. } = &token {
                    if SKIPPED_ELEMENTS.contains(&name.as_str()) {
                        let name = name.clone();
                        self.skip_raw_text(&name);
                        continue;
                    }
                }
                return Some(token);
            }
        }
    }
}

/// Decode character references.
pub(crate) fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest[1..].find(';').filter(|&i| i <= 10).and_then(|semi| {
            let entity = &rest[1..1 + semi];
            decode_entity(entity).map(|c| (c, semi + 2))
        });
        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(num) = entity.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    Some(match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "hellip" => '\u{2026}',
        "copy" => '\u{a9}',
        _ => return None,
    })
}

/// Parse an HTML fragment into a node list.
pub(crate) fn parse_fragment(src: &str) -> Vec<Node> {
    let mut root = Element::new(SmolStr::new_static("#root"), Vec::new());
    let mut stack: Vec<Element> = Vec::new();

    fn close_top(stack: &mut Vec<Element>, root: &mut Element) {
        if let Some(el) = stack.pop() {
            match stack.last_mut() {
                Some(parent) => parent.children.push(Node::Element(el)),
                None => root.children.push(Node::Element(el)),
            }
        }
    }

    fn open_index(stack: &[Element], name: &str) -> Option<usize> {
        stack.iter().rposition(|el| el.name == name)
    }

    for token in Tokenizer::new(src) {
        match token {
            Token::Text(text) => {
                let target = match stack.last_mut() {
                    Some(el) => &mut el.children,
                    None => &mut root.children,
                };
                match target.last_mut() {
                    Some(Node::Text(prev)) => prev.push_str(&text),
                    _ => target.push(Node::Text(text)),
                }
            }
            Token::Start {
                name,
                attrs,
                self_closing,
            } => {
                if CLOSES_P.contains(&name.as_str()) {
                    if let Some(idx) = open_index(&stack, "p") {
                        while stack.len() > idx {
                            close_top(&mut stack, &mut root);
                        }
                    }
                }
                let sibling_closes: &[&str] = match name.as_str() {
                    "li" => &["li"],
                    "td" | "th" => &["td", "th"],
                    "tr" => &["tr", "td", "th"],
                    _ => &[],
                };
                // Only close within the nearest list/table scope.
                while let Some(top) = stack.last() {
                    if sibling_closes.contains(&top.name.as_str()) {
                        close_top(&mut stack, &mut root);
                    } else {
                        break;
                    }
                }
                let element = Element::new(name.clone(), attrs);
                if self_closing || VOID_ELEMENTS.contains(&name.as_str()) {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(Node::Element(element)),
                        None => root.children.push(Node::Element(element)),
                    }
                } else {
                    stack.push(element);
                }
            }
            Token::End(name) => {
                if let Some(idx) = open_index(&stack, &name) {
                    while stack.len() > idx {
                        close_top(&mut stack, &mut root);
                    }
                } else {
                    tracing::trace!(tag = %name, "ignoring unmatched end tag");
                }
            }
        }
    }
    while !stack.is_empty() {
        close_top(&mut stack, &mut root);
    }
    root.children
}
