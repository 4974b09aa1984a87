//! Byte-level tag extraction primitives.
//!
//! EDGAR filings interleave SGML section markers, form-specific XML, and
//! HTML. The parsers only ever need a fixed set of tag shapes, so this module
//! implements targeted extraction over opaque bytes: no schema validation, no
//! namespace handling, no well-formedness requirements.

use memchr::memmem;

/// Locate the inner content of the first `<tag>...</tag>` occurrence.
///
/// The opening tag may carry attributes (`<tag foo="1">`). Returns byte
/// offsets into `body` for the content span.
fn find_tag_span(body: &str, tag: &str) -> Option<(usize, usize)> {
    let bytes = body.as_bytes();
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);
    let mut at = 0;
    while let Some(rel) = memmem::find(&bytes[at..], open.as_bytes()) {
        let start = at + rel;
        let after = start + open.len();
        // Must be followed by '>' or whitespace-then-attributes, not a longer
        // tag name sharing the prefix.
        match bytes.get(after) {
            Some(b'>') => {
                let content_start = after + 1;
                let end = memmem::find(&bytes[content_start..], close.as_bytes())?;
                return Some((content_start, content_start + end));
            }
            Some(c) if c.is_ascii_whitespace() => {
                let gt = memmem::find(&bytes[after..], b">")?;
                let content_start = after + gt + 1;
                let end = memmem::find(&bytes[content_start..], close.as_bytes())?;
                return Some((content_start, content_start + end));
            }
            _ => {
                at = after;
            }
        }
    }
    None
}

/// First `<tag>...</tag>` content, trimmed and entity-decoded, unwrapping an
/// inner `<value>...</value>` when present.
pub fn first_tag_text(body: &str, tag: &str) -> Option<String> {
    let (start, end) = find_tag_span(body, tag)?;
    let raw = &body[start..end];
    let inner = match find_tag_span(raw, "value") {
        Some((s, e)) => &raw[s..e],
        None => raw,
    };
    let text = decode_entities(inner.trim());
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// First tag text across a list of candidate tag names (schema drift).
pub fn first_tag_text_any(body: &str, tags: &[&str]) -> Option<String> {
    tags.iter().find_map(|t| first_tag_text(body, t))
}

/// All `<tag>...</tag>` occurrences as raw inner sub-strings.
pub fn tag_blocks<'a>(body: &'a str, tag: &str) -> Vec<&'a str> {
    let mut blocks = Vec::new();
    let mut at = 0;
    while let Some((start, end)) = find_tag_span(&body[at..], tag) {
        blocks.push(&body[at + start..at + end]);
        at += end + tag.len() + 3; // past "</tag>"
    }
    blocks
}

/// First tag content coerced to a number. Strips `$`, commas, and
/// surrounding whitespace first.
pub fn tag_number(body: &str, tag: &str) -> Option<f64> {
    let text = first_tag_text(body, tag)?;
    parse_number(&text)
}

/// First tag content coerced to a boolean: `1` or `true` (any case) is true.
pub fn tag_bool(body: &str, tag: &str) -> bool {
    match first_tag_text(body, tag) {
        Some(text) => {
            let t = text.trim();
            t == "1" || t.eq_ignore_ascii_case("true")
        }
        None => false,
    }
}

/// Parse a number out of filing text, tolerating `$`, commas, and stray
/// whitespace.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// First `<XML>...</XML>` section inside `<TEXT>...</TEXT>`.
///
/// Ownership documents, Form D, and 13F information tables all live in these
/// embedded sections.
pub fn embedded_xml(body: &str) -> Option<&str> {
    let (tstart, tend) = find_tag_span(body, "TEXT")?;
    let text = &body[tstart..tend];
    let (xstart, xend) = find_tag_span(text, "XML")?;
    Some(&text[xstart..xend])
}

/// Best-effort embedded markup section: `<XBRL>`, else `<HTML>`, else
/// `<TEXT>`.
pub fn embedded_html(body: &str) -> Option<&str> {
    for tag in ["XBRL", "HTML", "TEXT"] {
        if let Some((start, end)) = find_tag_span(body, tag) {
            return Some(&body[start..end]);
        }
    }
    None
}

/// Decode the entity subset that occurs in filing text.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
}

/// Strip `<...>` tags and collapse whitespace runs to single spaces.
pub fn strip_html(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut in_tag = false;
    let mut last_space = true;
    for c in body.chars() {
        match c {
            '<' => {
                in_tag = true;
                // Tag boundaries separate words.
                if !last_space {
                    out.push(' ');
                    last_space = true;
                }
            }
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            c if c.is_whitespace() => {
                if !last_space {
                    out.push(' ');
                    last_space = true;
                }
            }
            c => {
                out.push(c);
                last_space = false;
            }
        }
    }
    decode_entities(out.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tag_text_plain() {
        let body = "<issuerName>Acme Corp</issuerName>";
        assert_eq!(first_tag_text(body, "issuerName").as_deref(), Some("Acme Corp"));
    }

    #[test]
    fn test_first_tag_text_unwraps_value() {
        let body = "<transactionShares><value>10000</value><footnoteId id=\"F1\"/></transactionShares>";
        assert_eq!(first_tag_text(body, "transactionShares").as_deref(), Some("10000"));
    }

    #[test]
    fn test_first_tag_text_with_attributes() {
        let body = "<periodOfReport schemaVersion=\"X0306\">2024-01-10</periodOfReport>";
        assert_eq!(first_tag_text(body, "periodOfReport").as_deref(), Some("2024-01-10"));
    }

    #[test]
    fn test_tag_name_prefix_not_confused() {
        // <issuer> must not match inside <issuerName>.
        let body = "<issuerName>Acme</issuerName><issuer><value>real</value></issuer>";
        assert_eq!(first_tag_text(body, "issuer").as_deref(), Some("real"));
    }

    #[test]
    fn test_tag_blocks() {
        let body = "<infoTable><value>1</value></infoTable><infoTable><value>2</value></infoTable>";
        let blocks = tag_blocks(body, "infoTable");
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].contains('1'));
        assert!(blocks[1].contains('2'));
    }

    #[test]
    fn test_tag_number_strips_currency() {
        let body = "<aggregateMarketValue>$1,250,000.50</aggregateMarketValue>";
        assert_eq!(tag_number(body, "aggregateMarketValue"), Some(1_250_000.50));
    }

    #[test]
    fn test_tag_bool() {
        assert!(tag_bool("<isDirector>1</isDirector>", "isDirector"));
        assert!(tag_bool("<isDirector>true</isDirector>", "isDirector"));
        assert!(!tag_bool("<isDirector>0</isDirector>", "isDirector"));
        assert!(!tag_bool("<other>1</other>", "isDirector"));
    }

    #[test]
    fn test_embedded_xml() {
        let body = "<SEC-DOCUMENT><TEXT>prefix<XML><ownershipDocument/></XML></TEXT></SEC-DOCUMENT>";
        assert_eq!(embedded_xml(body), Some("<ownershipDocument/>"));
    }

    #[test]
    fn test_embedded_html_prefers_xbrl() {
        let body = "<TEXT>text</TEXT><HTML>html</HTML><XBRL>xbrl</XBRL>";
        assert_eq!(embedded_html(body), Some("xbrl"));
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("Johnson &amp; Johnson"), "Johnson & Johnson");
        assert_eq!(decode_entities("&lt;b&gt;&#39;x&apos;&quot;"), "<b>'x'\"");
    }

    #[test]
    fn test_strip_html() {
        let html = "<p>Jane   Doe,</p><td>Chief&nbsp;Executive</td>";
        let text = strip_html(html);
        assert_eq!(text, "Jane Doe, Chief&nbsp;Executive");
    }
}
