//! Escaping and rich-text sanitizing for server-rendered markup.

use serde::Serialize;

/// Escape text for an HTML text or quoted attribute context.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a value for a double-quoted attribute.
pub fn escape_attr(s: &str) -> String {
    escape_html(s)
}

/// Serialize `value` as JSON that cannot terminate an enclosing `<script>`.
///
/// `<`, `>` and `&` become `\u003c`, `\u003e` and `\u0026`, and the JS
/// line separators U+2028/U+2029 are escaped. The result is still valid JSON and
/// parses to the same value.
pub fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    Ok(out)
}

/// Whether a link target is an absolute http(s) or mailto URL.
pub fn is_safe_link(url: &str) -> bool {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    (lower.starts_with("https://") || lower.starts_with("http://") || lower.starts_with("mailto:"))
        && !url.chars().any(|c| c.is_control() || c.is_whitespace())
}

/// Elements dropped together with everything inside them.
const OPAQUE_TAGS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "template", "noscript", "textarea", "title",
    "svg", "math",
];

/// Elements without a closing tag.
const VOID_TAGS: &[&str] = &["br", "hr"];

/// Rich-text sanitizer that keeps a restricted set of tags.
///
/// Disallowed tags are removed but their text is kept, except for opaque
/// elements such as `script` whose content is dropped. Attributes are
/// removed, except `href` on `a` when it is a safe link. Unclosed tags are
/// closed at the end and stray closing tags are dropped.
#[derive(Debug, Clone)]
pub struct TagAllowlist {
    tags: Vec<&'static str>,
}

impl TagAllowlist {
    /// Create an allowlist from tag names (lowercase).
    pub fn new(tags: &[&'static str]) -> Self {
        Self {
            tags: tags.to_vec(),
        }
    }

    /// Formatting tags a job description may use.
    pub fn rich_text() -> Self {
        Self::new(&[
            "p", "br", "hr", "ul", "ol", "li", "strong", "b", "em", "i", "u", "h2", "h3", "h4",
            "blockquote", "a",
        ])
    }

    /// Check whether a tag is allowed.
    pub fn allows(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Sanitize a rich-text fragment.
    pub fn sanitize(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut open: Vec<String> = Vec::new();
        let mut rest = input;

        while let Some(lt) = rest.find('<') {
            push_text(&mut out, &rest[..lt]);
            rest = &rest[lt..];

            match next_tag(rest) {
                Token::Text => {
                    out.push_str("&lt;");
                    rest = &rest[1..];
                }
                Token::Skip(len) => rest = &rest[len..],
                Token::Close { name, len } => {
                    rest = &rest[len..];
                    if let Some(pos) = open.iter().rposition(|t| *t == name) {
                        for tag in open.drain(pos..).rev() {
                            out.push_str(&format!("</{}>", tag));
                        }
                    }
                }
                Token::Open { name, attrs, len } => {
                    rest = &rest[len..];
                    if OPAQUE_TAGS.contains(&name.as_str()) {
                        rest = skip_opaque(rest, &name);
                    } else if self.allows(&name) {
                        out.push('<');
                        out.push_str(&name);
                        if name == "a" {
                            if let Some(href) = attr(attrs, "href").filter(|h| is_safe_link(h)) {
                                out.push_str(&format!(
                                    " href=\"{}\" rel=\"nofollow noopener\"",
                                    escape_attr(href.trim())
                                ));
                            }
                        }
                        out.push('>');
                        if !VOID_TAGS.contains(&name.as_str()) {
                            open.push(name);
                        }
                    }
                }
            }
        }
        push_text(&mut out, rest);

        for tag in open.iter().rev() {
            out.push_str(&format!("</{}>", tag));
        }
        out
    }
}

impl Default for TagAllowlist {
    fn default() -> Self {
        Self::rich_text()
    }
}

/// Text content of a fragment: tags and opaque elements removed, common
/// entities decoded and whitespace collapsed.
pub fn strip_tags(input: &str) -> String {
    let mut text = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(lt) = rest.find('<') {
        text.push_str(&rest[..lt]);
        rest = &rest[lt..];
        match next_tag(rest) {
            Token::Text => {
                text.push('<');
                rest = &rest[1..];
            }
            Token::Skip(len) | Token::Close { len, .. } => {
                text.push(' ');
                rest = &rest[len..];
            }
            Token::Open { name, len, .. } => {
                text.push(' ');
                rest = &rest[len..];
                if OPAQUE_TAGS.contains(&name.as_str()) {
                    rest = skip_opaque(rest, &name);
                }
            }
        }
    }
    text.push_str(rest);

    decode_entities(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

enum Token<'a> {
    /// A `<` that does not start a tag.
    Text,
    /// Comment, doctype or processing instruction of the given length.
    Skip(usize),
    Close {
        name: String,
        len: usize,
    },
    Open {
        name: String,
        attrs: &'a str,
        len: usize,
    },
}

/// Classify the markup starting at `s` (which begins with `<`).
fn next_tag(s: &str) -> Token<'_> {
    if let Some(body) = s.strip_prefix("<!--") {
        let len = body.find("-->").map(|i| 4 + i + 3).unwrap_or(s.len());
        return Token::Skip(len);
    }
    let Some(gt) = s.find('>') else {
        return Token::Text;
    };
    let inner = &s[1..gt];
    let len = gt + 1;

    if inner.starts_with('!') || inner.starts_with('?') {
        return Token::Skip(len);
    }

    let (closing, inner) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    let name_len = inner
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(inner.len());
    if name_len == 0 || !inner.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Token::Text;
    }
    let name = inner[..name_len].to_ascii_lowercase();

    if closing {
        Token::Close { name, len }
    } else {
        Token::Open {
            name,
            attrs: inner[name_len..].trim_end_matches('/'),
            len,
        }
    }
}

/// Skip past the closing tag of an opaque element.
fn skip_opaque<'a>(rest: &'a str, name: &str) -> &'a str {
    let lower = rest.to_ascii_lowercase();
    let needle = format!("</{}", name);
    match lower.find(&needle) {
        Some(start) => match rest[start..].find('>') {
            Some(end) => &rest[start + end + 1..],
            None => "",
        },
        None => "",
    }
}

/// Value of a named attribute in a raw attribute string.
fn attr<'a>(attrs: &'a str, wanted: &str) -> Option<&'a str> {
    let mut rest = attrs.trim_start();
    while !rest.is_empty() {
        let name_end = rest
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        rest = rest[name_end..].trim_start();

        let value = if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let (value, remaining) = match after_eq.chars().next() {
                Some(q @ ('"' | '\'')) => {
                    let body = &after_eq[1..];
                    match body.find(q) {
                        Some(end) => (&body[..end], &body[end + 1..]),
                        None => (body, ""),
                    }
                }
                _ => {
                    let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
                    (&after_eq[..end], &after_eq[end..])
                }
            };
            rest = remaining.trim_start();
            Some(value)
        } else {
            None
        };

        if name.eq_ignore_ascii_case(wanted) {
            return value;
        }
        if name.is_empty() {
            break;
        }
    }
    None
}

/// Escape text while leaving well-formed entities alone.
fn push_text(out: &mut String, text: &str) {
    let mut rest = text;
    while let Some(idx) = rest.find(|c| c == '&' || c == '>' || c == '"') {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];
        match tail.as_bytes()[0] {
            b'&' if entity_len(tail).is_some() => {
                let len = entity_len(tail).unwrap_or(1);
                out.push_str(&tail[..len]);
                rest = &tail[len..];
                continue;
            }
            b'&' => out.push_str("&amp;"),
            b'>' => out.push_str("&gt;"),
            _ => out.push_str("&quot;"),
        }
        rest = &tail[1..];
    }
    out.push_str(rest);
}

/// Length of an entity reference like `&amp;` or `&#8364;` at the start of `s`.
fn entity_len(s: &str) -> Option<usize> {
    let body = s.strip_prefix('&')?;
    let semi = body.find(';')?;
    let name = body[..semi].strip_prefix('#').unwrap_or(&body[..semi]);
    if semi == 0 || semi > 10 || name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(semi + 2)
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
