//! Adaptive false-positive validator.
//!
//! Every automaton hit is classified by the ambiguity of its underlying
//! prospect attribute, then gated. Short names demand strict boundaries and
//! English-looking context; hits inside encoded blobs (uuencoded exhibits,
//! base64 attachments) are rejected outright. The adjacent-name-token gate
//! kills hits embedded inside a longer personal name.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::engine::PatternHit;

/// Context radius for the English-word gate, in bytes.
const ENGLISH_WINDOW: usize = 50;

/// Context radius for the encoded-region gate, in bytes.
const ENCODED_WINDOW: usize = 100;

/// Maximum fraction of out-of-class characters before a region counts as
/// encoded.
const ENCODED_MAX_FRAC: f64 = 0.30;

/// Reach of the adjacent-name-token gate on each side, in bytes.
const ADJACENT_REACH: usize = 25;

/// Minimum common-vocabulary hits required in a long encoded-gate window.
const MIN_VOCAB_HITS: usize = 2;

static ENGLISH_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-z]{4,}\b").expect("english word regex"));

/// Common function/business words used to confirm a window is prose.
const COMMON_VOCAB: &[&str] = &[
    "the", "and", "for", "are", "was", "were", "has", "have", "had", "this", "that", "with",
    "from", "will", "shall", "been", "their", "which", "such", "any", "all", "each", "other",
    "than", "into", "under", "upon", "herein", "thereof", "hereby", "may", "must", "not", "its",
    "per", "between", "including", "pursuant", "securities", "exchange", "commission", "act",
    "rule", "section", "shares", "stock", "common", "class", "form", "filing", "filed", "report",
    "statement", "company", "corporation", "issuer", "officer", "director", "owner", "person",
    "reporting", "beneficial", "ownership", "transaction", "date", "price", "amount", "value",
    "total", "number", "table", "item", "exhibit", "signature", "attorney", "fact", "power",
    "plan", "trust", "agreement", "certificate", "registrant", "undersigned", "behalf", "duly",
    "authorized", "executive", "president", "chief", "financial", "accounting", "counsel",
    "market", "board", "annual", "quarterly", "fiscal", "year", "held", "equity", "derivative",
];

/// Characters considered normal prose for the encoded-region density test.
fn is_prose_char(c: char) -> bool {
    matches!(c,
        'a'..='z' | '0'..='9' | ' ' | '.' | ',' | ';' | ':' | '!' | '?' | '(' | ')' | '-' | '\'' | '"')
}

/// Tokens allowed to sit directly next to a name hit without invalidating
/// it: honorifics, executive titles, and connective words.
const ALLOWED_NEIGHBORS: &[&str] = &[
    "mr", "ms", "mrs", "dr", "prof", "ceo", "cfo", "coo", "cto", "cio", "cmo", "cpo", "cso",
    "evp", "svp", "vp", "avp", "director", "president", "chairman", "chair", "executive",
    "officer", "manager", "partner", "founder", "chief", "senior", "junior", "managing",
    "general", "hon", "honorable", "judge", "justice", "by", "from", "to", "of", "and", "or",
    "the", "a", "an", "name", "signed", "filed", "reported", "pursuant",
];

/// Ambiguity class of a name pattern, from its first/last token lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameClass {
    /// Both tokens at most 2 chars ("Qi Li").
    VeryShort,
    /// Exactly one token at most 2 chars.
    Short,
    /// Both tokens exactly 3 chars.
    Medium,
    /// Both tokens at least 4 chars.
    Normal,
}

/// Ambiguity class of a company root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyClass {
    /// Root of 3 chars or fewer.
    VeryShort,
    /// Root of 4-5 chars.
    Short,
    /// Single-token root.
    SingleWord,
    /// Multi-token root.
    MultiWord,
}

pub fn classify_name(first: &str, last: &str) -> NameClass {
    let f = first.len();
    let l = last.len();
    if f <= 2 && l <= 2 {
        NameClass::VeryShort
    } else if f <= 2 || l <= 2 {
        NameClass::Short
    } else if f == 3 && l == 3 {
        NameClass::Medium
    } else {
        NameClass::Normal
    }
}

pub fn classify_company(root: &str) -> CompanyClass {
    if root.len() <= 3 {
        CompanyClass::VeryShort
    } else if root.len() <= 5 {
        CompanyClass::Short
    } else if !root.contains(' ') {
        CompanyClass::SingleWord
    } else {
        CompanyClass::MultiWord
    }
}

/// Validate a name hit against its class gates.
pub fn validate_name_hit(raw: &str, hit: &PatternHit, first: &str, last: &str) -> bool {
    match classify_name(first, last) {
        NameClass::VeryShort => {
            space_boundary(raw, hit)
                && english_context(raw, hit, 5)
                && encoded_region_ok(raw, hit)
                && adjacent_tokens_ok(raw, hit, false)
        }
        NameClass::Short => {
            space_boundary(raw, hit)
                && english_context(raw, hit, 3)
                && adjacent_tokens_ok(raw, hit, false)
        }
        NameClass::Medium => {
            space_boundary(raw, hit)
                && english_context(raw, hit, 2)
                && encoded_region_ok(raw, hit)
                && adjacent_tokens_ok(raw, hit, true)
        }
        NameClass::Normal => adjacent_tokens_ok(raw, hit, true),
    }
}

/// Validate a company hit against its class gates.
pub fn validate_company_hit(raw: &str, hit: &PatternHit, root: &str) -> bool {
    match classify_company(root) {
        CompanyClass::VeryShort => {
            space_boundary(raw, hit) && english_context(raw, hit, 3) && encoded_region_ok(raw, hit)
        }
        CompanyClass::Short => {
            space_boundary(raw, hit) && english_context(raw, hit, 2) && encoded_region_ok(raw, hit)
        }
        CompanyClass::SingleWord => space_boundary(raw, hit) && encoded_region_ok(raw, hit),
        CompanyClass::MultiWord => true,
    }
}

/// Strict space-boundary gate: the raw byte before the hit must be
/// whitespace (or document start); the byte after may also be a comma or
/// period.
fn space_boundary(raw: &str, hit: &PatternHit) -> bool {
    let bytes = raw.as_bytes();
    let before_ok = hit.raw_start == 0
        || matches!(bytes[hit.raw_start - 1], b' ' | b'\t' | b'\n' | b'\r');
    let after_ok = hit.raw_end >= bytes.len()
        || matches!(bytes[hit.raw_end], b' ' | b'\t' | b'\n' | b'\r' | b',' | b'.');
    before_ok && after_ok
}

/// Count long lowercase words in the surrounding window.
fn english_context(raw: &str, hit: &PatternHit, min_words: usize) -> bool {
    let window = context_window(raw, hit, ENGLISH_WINDOW).to_lowercase();
    ENGLISH_WORD_RE.find_iter(&window).count() >= min_words
}

/// Reject hits inside low-information or encoded regions.
fn encoded_region_ok(raw: &str, hit: &PatternHit) -> bool {
    let window = context_window(raw, hit, ENCODED_WINDOW);
    let lower = window.to_lowercase();
    let total = lower.chars().count();
    if total == 0 {
        return true;
    }
    let bad = lower.chars().filter(|c| !is_prose_char(*c)).count();
    if bad as f64 / total as f64 > ENCODED_MAX_FRAC {
        return false;
    }
    if window.len() > ENGLISH_WINDOW {
        let vocab_hits = lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| t.len() > 2)
            .filter(|t| COMMON_VOCAB.contains(t))
            .count();
        if vocab_hits < MIN_VOCAB_HITS {
            return false;
        }
    }
    true
}

/// Reject hits with a capitalized neighbor token touching the hit across
/// nothing but whitespace: the prospect name is likely embedded in a longer
/// name ("Gary Lee" inside "Ellis Gary Lee").
///
/// `allow_initial` exempts single-letter neighbors (a middle initial) for
/// the classes that tolerate one.
fn adjacent_tokens_ok(raw: &str, hit: &PatternHit, allow_initial: bool) -> bool {
    if let Some(token) = neighbor_token_left(raw, hit.raw_start) {
        if !neighbor_allowed(&token, allow_initial) {
            return false;
        }
    }
    if let Some(token) = neighbor_token_right(raw, hit.raw_end) {
        if !neighbor_allowed(&token, allow_initial) {
            return false;
        }
    }
    true
}

fn neighbor_allowed(token: &str, allow_initial: bool) -> bool {
    if !token.chars().next().map(|c| c.is_ascii_uppercase()).unwrap_or(false) {
        return true;
    }
    if token.len() == 1 || (token.len() == 2 && token.ends_with('.')) {
        return allow_initial;
    }
    let lower = token.trim_end_matches('.').to_lowercase();
    ALLOWED_NEIGHBORS.contains(&lower.as_str())
}

/// Capitalized alphabetic token ending directly before `start`, separated
/// from the hit only by whitespace. Punctuation in between clears the gate.
fn neighbor_token_left(raw: &str, start: usize) -> Option<String> {
    let from = floor_char_boundary(raw, start.saturating_sub(ADJACENT_REACH));
    let left = &raw[from..floor_char_boundary(raw, start)];
    let mut chars = left.chars().rev().peekable();
    // Skip the whitespace between hit and neighbor; any punctuation breaks
    // adjacency.
    let mut saw_space = false;
    while let Some(&c) = chars.peek() {
        if c == ' ' || c == '\t' || c == '\n' || c == '\r' {
            saw_space = true;
            chars.next();
        } else {
            break;
        }
    }
    if !saw_space {
        return None;
    }
    let mut token: Vec<char> = Vec::new();
    for c in chars {
        if c.is_ascii_alphabetic() || c == '.' {
            token.push(c);
        } else {
            break;
        }
    }
    if token.is_empty() {
        return None;
    }
    token.reverse();
    Some(token.into_iter().collect())
}

/// Capitalized alphabetic token starting directly after `end`.
fn neighbor_token_right(raw: &str, end: usize) -> Option<String> {
    let to = floor_char_boundary(raw, (end + ADJACENT_REACH).min(raw.len()));
    let right = &raw[floor_char_boundary(raw, end.min(raw.len()))..to];
    let mut chars = right.chars().peekable();
    let mut saw_space = false;
    while let Some(&c) = chars.peek() {
        if c == ' ' || c == '\t' || c == '\n' || c == '\r' {
            saw_space = true;
            chars.next();
        } else {
            break;
        }
    }
    if !saw_space {
        return None;
    }
    let mut token = String::new();
    for c in chars {
        if c.is_ascii_alphabetic() || c == '.' {
            token.push(c);
        } else {
            break;
        }
    }
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Raw-context measurements reused by the FP risk scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextMetrics {
    /// Fraction of non-ASCII characters in the window.
    pub non_ascii_frac: f64,
    /// Count of 4+ letter lowercase words.
    pub long_word_count: usize,
    /// Any run of 3+ consecutive uppercase letters.
    pub has_uppercase_run: bool,
}

pub fn context_metrics(raw: &str, raw_start: usize, raw_end: usize) -> ContextMetrics {
    let hit = PatternHit {
        pattern: 0,
        norm_start: 0,
        norm_end: 0,
        raw_start,
        raw_end,
    };
    let window = context_window(raw, &hit, ENCODED_WINDOW);
    let total = window.chars().count();
    let non_ascii = window.chars().filter(|c| !c.is_ascii()).count();
    let lower = window.to_lowercase();
    let long_words = ENGLISH_WORD_RE.find_iter(&lower).count();
    let mut run = 0usize;
    let mut has_run = false;
    for c in window.chars() {
        if c.is_ascii_uppercase() {
            run += 1;
            if run >= 3 {
                has_run = true;
                break;
            }
        } else {
            run = 0;
        }
    }
    ContextMetrics {
        non_ascii_frac: if total == 0 {
            0.0
        } else {
            non_ascii as f64 / total as f64
        },
        long_word_count: long_words,
        has_uppercase_run: has_run,
    }
}

fn context_window<'a>(raw: &'a str, hit: &PatternHit, radius: usize) -> &'a str {
    let from = floor_char_boundary(raw, hit.raw_start.saturating_sub(radius));
    let to = floor_char_boundary(raw, (hit.raw_end + radius).min(raw.len()));
    &raw[from..to.max(from)]
}

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    idx = idx.min(text.len());
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
