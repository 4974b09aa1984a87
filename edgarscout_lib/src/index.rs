//! Prospect index and pattern registration.
//!
//! Built once per run, then shared immutable across scan workers. Two
//! structures come out of the build: the variant lookup used by structured
//! matching, and the pattern set handed to the text engine.

use std::collections::HashMap;

use crate::normalize::{company_root, name_variants, normalize, reversed, tokens_subset};
use crate::prospect::Prospect;

/// Minimum token length for the first/last pair of a registered name
/// pattern.
const MIN_NAME_TOKEN_LEN: usize = 2;

/// What a registered pattern means for one owning prospect.
#[derive(Debug, Clone)]
pub enum PatternVariation {
    Name {
        prospect: usize,
        first: String,
        last: String,
    },
    Company {
        prospect: usize,
        root: String,
    },
}

impl PatternVariation {
    pub fn prospect(&self) -> usize {
        match self {
            PatternVariation::Name { prospect, .. } => *prospect,
            PatternVariation::Company { prospect, .. } => *prospect,
        }
    }
}

/// One unique pattern string with every variation that registered it.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub text: String,
    pub variations: Vec<PatternVariation>,
}

/// The deduplicated pattern table fed to the automaton. Pattern order is
/// stable: automaton pattern ids index straight back into `patterns`.
#[derive(Debug, Default)]
pub struct PatternSet {
    pub patterns: Vec<Pattern>,
    by_text: HashMap<String, usize>,
}

impl PatternSet {
    fn register(&mut self, text: String, variation: PatternVariation) {
        match self.by_text.get(&text) {
            Some(&idx) => self.patterns[idx].variations.push(variation),
            None => {
                self.by_text.insert(text.clone(), self.patterns.len());
                self.patterns.push(Pattern {
                    text,
                    variations: vec![variation],
                });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Length of the longest pattern, in bytes. Zero when empty.
    pub fn max_pattern_len(&self) -> usize {
        self.patterns.iter().map(|p| p.text.len()).max().unwrap_or(0)
    }
}

/// Immutable prospect lookup built once per run.
#[derive(Debug)]
pub struct ProspectIndex {
    prospects: Vec<Prospect>,
    by_id: HashMap<String, usize>,
    by_variant: HashMap<String, Vec<usize>>,
    /// Normalized company root per prospect (None when no employer or the
    /// root is too short to be useful).
    company_roots: Vec<Option<String>>,
    /// True when the company root's tokens are a subset of the prospect's
    /// own name tokens: text evidence for the company is then meaningless
    /// ("Gary Lee Enterprises" owned by Gary Lee).
    company_text_guard: Vec<bool>,
    patterns: PatternSet,
}

impl ProspectIndex {
    pub fn build(prospects: Vec<Prospect>) -> Self {
        let mut by_id = HashMap::new();
        let mut by_variant: HashMap<String, Vec<usize>> = HashMap::new();
        let mut company_roots = Vec::with_capacity(prospects.len());
        let mut company_text_guard = Vec::with_capacity(prospects.len());
        let mut patterns = PatternSet::default();

        for (idx, prospect) in prospects.iter().enumerate() {
            if by_id.insert(prospect.id.clone(), idx).is_some() {
                tracing::warn!(id = %prospect.id, "duplicate prospect id in index build");
            }

            let variants = name_variants(&prospect.name);
            let mut name_pairs: Vec<(String, String)> = Vec::new();
            for variant in &variants {
                register_variant(&mut by_variant, variant, idx);
                if let Some(rev) = reversed(variant) {
                    register_variant(&mut by_variant, &rev, idx);
                }

                let tokens: Vec<&str> = variant.split(' ').collect();
                if tokens.len() >= 2 {
                    let first = tokens[0];
                    let last = tokens[tokens.len() - 1];
                    if first.len() >= MIN_NAME_TOKEN_LEN && last.len() >= MIN_NAME_TOKEN_LEN {
                        let pair = (first.to_string(), last.to_string());
                        if !name_pairs.contains(&pair) {
                            name_pairs.push(pair);
                        }
                    }
                }
            }
            for (first, last) in name_pairs {
                patterns.register(
                    format!("{} {}", first, last),
                    PatternVariation::Name {
                        prospect: idx,
                        first,
                        last,
                    },
                );
            }

            let root = prospect.company.as_deref().and_then(company_root);
            let guard = match &root {
                Some(root) => tokens_subset(root, &normalize(&prospect.name)),
                None => false,
            };
            if let Some(root) = &root {
                patterns.register(
                    root.clone(),
                    PatternVariation::Company {
                        prospect: idx,
                        root: root.clone(),
                    },
                );
            }
            company_roots.push(root);
            company_text_guard.push(guard);
        }

        tracing::debug!(
            prospects = prospects.len(),
            variants = by_variant.len(),
            patterns = patterns.len(),
            "prospect index built"
        );

        ProspectIndex {
            prospects,
            by_id,
            by_variant,
            company_roots,
            company_text_guard,
            patterns,
        }
    }

    pub fn prospects(&self) -> &[Prospect] {
        &self.prospects
    }

    pub fn prospect(&self, idx: usize) -> &Prospect {
        &self.prospects[idx]
    }

    pub fn by_id(&self, id: &str) -> Option<&Prospect> {
        self.by_id.get(id).map(|&i| &self.prospects[i])
    }

    /// Prospects registered under a normalized variant key.
    pub fn lookup_variant(&self, key: &str) -> &[usize] {
        self.by_variant.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn company_root(&self, idx: usize) -> Option<&str> {
        self.company_roots[idx].as_deref()
    }

    /// True when text evidence may verify this prospect's company.
    pub fn company_text_allowed(&self, idx: usize) -> bool {
        !self.company_text_guard[idx]
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }
}

fn register_variant(by_variant: &mut HashMap<String, Vec<usize>>, key: &str, idx: usize) {
    let entry = by_variant.entry(key.to_string()).or_default();
    if !entry.contains(&idx) {
        entry.push(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prospect(id: &str, name: &str, company: Option<&str>) -> Prospect {
        Prospect {
            id: id.to_string(),
            name: name.to_string(),
            company: company.map(|c| c.to_string()),
            team: None,
        }
    }

    #[test]
    fn test_variant_lookup_forward_and_reversed() {
        let index = ProspectIndex::build(vec![prospect("P1", "Jane Anne Doe", None)]);
        assert_eq!(index.lookup_variant("jane anne doe"), &[0]);
        assert_eq!(index.lookup_variant("doe jane anne"), &[0]);
        assert_eq!(index.lookup_variant("jane doe"), &[0]);
        assert_eq!(index.lookup_variant("doe jane"), &[0]);
        assert!(index.lookup_variant("john doe").is_empty());
    }

    #[test]
    fn test_name_patterns_unique_pairs() {
        let index = ProspectIndex::build(vec![prospect("P1", "William Henry Gates", None)]);
        let texts: Vec<&str> = index
            .patterns()
            .patterns
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        assert!(texts.contains(&"william gates"));
        assert!(texts.contains(&"bill gates"));
        // No duplicate registrations for the same pair.
        let count = texts.iter().filter(|t| **t == "william gates").count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_company_pattern_registered() {
        let index = ProspectIndex::build(vec![prospect("P1", "Jane Doe", Some("Acme Corp"))]);
        assert_eq!(index.company_root(0), Some("acme"));
        assert!(index.company_text_allowed(0));
        assert!(index
            .patterns()
            .patterns
            .iter()
            .any(|p| p.text == "acme"
                && p.variations
                    .iter()
                    .any(|v| matches!(v, PatternVariation::Company { .. }))));
    }

    #[test]
    fn test_company_guardrail() {
        let index =
            ProspectIndex::build(vec![prospect("P1", "Gary Lee", Some("Gary Lee Enterprises"))]);
        assert_eq!(index.company_root(0), Some("gary lee"));
        assert!(!index.company_text_allowed(0));
    }

    #[test]
    fn test_shared_pattern_multiple_prospects() {
        let index = ProspectIndex::build(vec![
            prospect("P1", "Jane Doe", None),
            prospect("P2", "Jane Doe", None),
        ]);
        let pattern = index
            .patterns()
            .patterns
            .iter()
            .find(|p| p.text == "jane doe")
            .expect("shared pattern");
        assert_eq!(pattern.variations.len(), 2);
        assert_eq!(index.lookup_variant("jane doe"), &[0, 1]);
    }

    #[test]
    fn test_short_first_token_not_registered_as_pattern() {
        // "j doe" pair fails the 2-char minimum for the first token.
        let index = ProspectIndex::build(vec![prospect("P1", "J Doe", None)]);
        assert!(index
            .patterns()
            .patterns
            .iter()
            .all(|p| !p.text.starts_with("j ")));
    }
}
