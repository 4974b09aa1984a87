//! Multi-pattern text engine.
//!
//! One Aho-Corasick automaton over every registered name and company
//! pattern; each filing body is scanned exactly once. The engine works on a
//! lowercased, whitespace-collapsed copy of the body and keeps a map from
//! normalized byte positions back to raw positions so distances and snippets
//! use raw coordinates.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};

use crate::index::PatternSet;

/// Bodies above this size are scanned in chunks.
const CHUNK_THRESHOLD: usize = 5 * 1024 * 1024;

/// Chunk size for oversized bodies.
const CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Extra overlap beyond the longest pattern, so no hit straddles a chunk
/// boundary unseen.
const CHUNK_OVERLAP_SLACK: usize = 2048;

/// Byte classes accepted immediately before/after a raw automaton hit.
const BOUNDARY_CHARS: &[u8] = b" \t\r\n.,;:!?-()[]{}\"'/\\|~`@#$%^&*+=<>";

/// Lowercased, whitespace-collapsed body plus the normalized-to-raw index
/// map. `raw_index[i]` is the raw byte offset that produced normalized byte
/// `i`.
pub struct NormalizedBody {
    pub text: String,
    raw_index: Vec<u32>,
}

impl NormalizedBody {
    pub fn new(raw: &str) -> Self {
        let bytes = raw.as_bytes();
        let mut text = Vec::with_capacity(bytes.len());
        let mut raw_index = Vec::with_capacity(bytes.len());
        let mut pending_space: Option<u32> = None;
        for (i, &b) in bytes.iter().enumerate() {
            if b.is_ascii_whitespace() {
                if pending_space.is_none() && !text.is_empty() {
                    pending_space = Some(i as u32);
                }
                continue;
            }
            if let Some(at) = pending_space.take() {
                text.push(b' ');
                raw_index.push(at);
            }
            text.push(b.to_ascii_lowercase());
            raw_index.push(i as u32);
        }
        NormalizedBody {
            // Lowercasing ASCII bytes keeps the text valid UTF-8.
            text: String::from_utf8(text).expect("byte-wise normalization preserves UTF-8"),
            raw_index,
        }
    }

    /// Raw offset of a normalized byte position. Clamped to the raw end for
    /// the one-past-the-end position.
    pub fn raw_offset(&self, norm: usize, raw_len: usize) -> usize {
        self.raw_index
            .get(norm)
            .map(|&i| i as usize)
            .unwrap_or(raw_len)
    }
}

/// One accepted automaton hit, in both coordinate systems.
#[derive(Debug, Clone)]
pub struct PatternHit {
    /// Index into the pattern set.
    pub pattern: usize,
    pub norm_start: usize,
    pub norm_end: usize,
    pub raw_start: usize,
    /// One past the last raw byte of the hit.
    pub raw_end: usize,
}

/// The compiled automaton, shared immutable across scan workers.
pub struct PatternEngine {
    automaton: AhoCorasick,
    max_pattern_len: usize,
}

impl PatternEngine {
    pub fn new(patterns: &PatternSet) -> Self {
        let texts: Vec<&str> = patterns.patterns.iter().map(|p| p.text.as_str()).collect();
        let automaton = AhoCorasickBuilder::new()
            .build(&texts)
            .expect("pattern automaton build");
        PatternEngine {
            automaton,
            max_pattern_len: patterns.max_pattern_len(),
        }
    }

    /// All boundary-accepted hits over a filing body, single pass.
    pub fn scan(&self, raw: &str, body: &NormalizedBody) -> Vec<PatternHit> {
        if body.text.len() > CHUNK_THRESHOLD {
            self.scan_chunked(raw, body)
        } else {
            self.scan_range(raw, body, 0, body.text.len())
        }
    }

    fn scan_range(
        &self,
        raw: &str,
        body: &NormalizedBody,
        from: usize,
        to: usize,
    ) -> Vec<PatternHit> {
        let slice = &body.text[from..to];
        let mut hits = Vec::new();
        for m in self.automaton.find_overlapping_iter(slice) {
            let norm_start = from + m.start();
            let norm_end = from + m.end();
            if !self.boundary_ok(&body.text, norm_start, norm_end) {
                continue;
            }
            let raw_start = body.raw_offset(norm_start, raw.len());
            let raw_end = if norm_end > norm_start {
                body.raw_offset(norm_end - 1, raw.len()) + 1
            } else {
                raw_start
            };
            hits.push(PatternHit {
                pattern: m.pattern().as_usize(),
                norm_start,
                norm_end,
                raw_start,
                raw_end,
            });
        }
        hits
    }

    /// Chunked scan for very large bodies: fixed-size windows with an
    /// overlap of longest-pattern + slack, duplicates from the overlap
    /// removed by position.
    fn scan_chunked(&self, raw: &str, body: &NormalizedBody) -> Vec<PatternHit> {
        use std::collections::HashSet;

        let overlap = self.max_pattern_len + CHUNK_OVERLAP_SLACK;
        let len = body.text.len();
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let mut hits = Vec::new();
        let mut from = 0;
        loop {
            let to = floor_char_boundary(&body.text, (from + CHUNK_SIZE).min(len));
            for hit in self.scan_range(raw, body, from, to) {
                if seen.insert((hit.pattern, hit.norm_start)) {
                    hits.push(hit);
                }
            }
            if to >= len {
                break;
            }
            from = floor_char_boundary(&body.text, to.saturating_sub(overlap));
        }
        hits
    }

    fn boundary_ok(&self, text: &str, start: usize, end: usize) -> bool {
        let bytes = text.as_bytes();
        let before_ok = start == 0 || BOUNDARY_CHARS.contains(&bytes[start - 1]);
        let after_ok = end >= bytes.len() || BOUNDARY_CHARS.contains(&bytes[end]);
        before_ok && after_ok
    }
}

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx > 0 && idx < text.len() && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx.min(text.len())
}
