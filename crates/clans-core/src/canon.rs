//! Serialization and canonicalization of plan markup.
//!
//! The HTML parser recovers from errors generously, and its tree no longer
//! remembers how the server spelled things. Fragments pulled out of a parsed
//! page are therefore written back out with [`inner_html`] and passed through
//! [`canonicalize`], which restores the byte-level conventions of the Plans
//! server:
//!
//! - void tags are written `<br>` and `<hr>`, never self-closed
//! - anchors carry `href` before `class`
//! - `<`, `>`, `&` and `"` appearing in text are escaped
//!
//! [`normalize_newlines`] converts submitted text to CRLF line endings, which
//! is what the server stores and fingerprints.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Node};

static SELF_CLOSED_VOID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(br|hr)\s*/>").expect("valid regex"));

static CLASS_BEFORE_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a class="([^"]*)" href="([^"]*)""#).expect("valid regex")
});

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Applies the server's markup conventions to a fragment. Idempotent.
pub fn canonicalize(fragment: &str) -> String {
    let fragment = SELF_CLOSED_VOID.replace_all(fragment, "<$1>");
    let fragment = CLASS_BEFORE_HREF.replace_all(&fragment, r#"<a href="$2" class="$1""#);
    escape_text_runs(&fragment)
}

/// Converts LF, CR and CRLF line endings uniformly to CRLF.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\n', "\r\n")
}

/// Serializes the children of `element` in the server's dialect.
pub fn inner_html(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    write_children(element, &mut out, false);
    canonicalize(&out)
}

/// Like [`inner_html`], but drops a leading whitespace-only text node, which
/// the server emits as layout between a container and its content.
pub fn content_html(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    write_children(element, &mut out, true);
    canonicalize(&out)
}

fn write_children(element: ElementRef<'_>, out: &mut String, skip_leading_blank: bool) {
    for (i, child) in element.children().enumerate() {
        match child.value() {
            Node::Text(text) if i == 0 && skip_leading_blank && text.trim().is_empty() => {}
            Node::Text(text) => push_escaped_text(out, text),
            Node::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(comment);
                out.push_str("-->");
            }
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    write_element(child, out);
                }
            }
            _ => {}
        }
    }
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    let value = element.value();
    let name = value.name();

    let mut attrs: Vec<(&str, &str)> = value.attrs().collect();
    attrs.sort_by_key(|(key, _)| match *key {
        "href" => 0,
        "class" => 1,
        _ => 2,
    });

    out.push('<');
    out.push_str(name);
    for (key, val) in attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        push_escaped_attr(out, val);
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }
    write_children(element, out, false);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn push_escaped_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

fn push_escaped_attr(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

/// Escapes special characters found outside of tags, leaving tags, comments
/// and existing entity references untouched.
fn escape_text_runs(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut rest = fragment;

    while let Some(c) = rest.chars().next() {
        match c {
            '<' if rest.starts_with("<!--") => {
                let end = rest[4..].find("-->").map_or(rest.len(), |i| i + 7);
                out.push_str(&rest[..end]);
                rest = &rest[end..];
            }
            '<' if starts_tag(rest) => {
                let end = tag_end(rest);
                out.push_str(&rest[..end]);
                rest = &rest[end..];
            }
            '<' => {
                out.push_str("&lt;");
                rest = &rest[1..];
            }
            '>' => {
                out.push_str("&gt;");
                rest = &rest[1..];
            }
            '"' => {
                out.push_str("&quot;");
                rest = &rest[1..];
            }
            '&' => {
                let len = entity_len(rest);
                if len > 0 {
                    out.push_str(&rest[..len]);
                    rest = &rest[len..];
                } else {
                    out.push_str("&amp;");
                    rest = &rest[1..];
                }
            }
            c => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    out
}

fn starts_tag(s: &str) -> bool {
    let mut chars = s.chars().skip(1);
    match chars.next() {
        Some('/') => chars.next().is_some_and(|c| c.is_ascii_alphabetic()),
        Some(c) => c.is_ascii_alphabetic(),
        None => false,
    }
}

/// Byte length of the tag starting at `s`, honouring quoted attribute values.
fn tag_end(s: &str) -> usize {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return i + 1,
            _ => {}
        }
    }
    s.len()
}

/// Length of a well-formed character reference at the start of `s`, or zero.
fn entity_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 1;
    if bytes.get(i) == Some(&b'#') {
        i += 1;
        let hex = matches!(bytes.get(i), Some(b'x' | b'X'));
        if hex {
            i += 1;
        }
        let start = i;
        while bytes.get(i).is_some_and(|b| {
            if hex {
                b.is_ascii_hexdigit()
            } else {
                b.is_ascii_digit()
            }
        }) {
            i += 1;
        }
        if i == start {
            return 0;
        }
    } else {
        let start = i;
        while bytes.get(i).is_some_and(u8::is_ascii_alphanumeric) {
            i += 1;
        }
        if i == start {
            return 0;
        }
    }
    if bytes.get(i) == Some(&b';') {
        i + 1
    } else {
        0
    }
}
