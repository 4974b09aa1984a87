//! Name and company normalization plus prospect variant generation.
//!
//! Normalization is the shared currency of the whole matcher: every name in
//! the prospect index, every pattern in the automaton, and every filing
//! person probe goes through [`normalize`] first. Variant generation expands
//! a prospect name into the full set of plausible normalized forms (suffix
//! stripped, middle dropped, nickname substituted).

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Trailing personal suffixes stripped from names.
const PERSONAL_SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv", "md", "phd", "esq"];

/// Trailing legal suffixes stripped from company names during root
/// extraction. Single tokens, post-normalization ("l.p." normalizes to two
/// tokens and is handled separately).
const COMPANY_SUFFIXES: &[&str] = &[
    "inc",
    "incorporated",
    "corp",
    "corporation",
    "company",
    "co",
    "llc",
    "ltd",
    "limited",
    "plc",
    "lp",
    "group",
    "holdings",
    "enterprise",
    "enterprises",
    "partner",
    "partners",
    "partnership",
];

/// Minimum length for a generated name variant.
const MIN_VARIANT_LEN: usize = 4;

/// Minimum length for a registered company root.
pub const MIN_COMPANY_ROOT_LEN: usize = 3;

#[derive(Deserialize)]
struct NicknameSeed {
    group: Vec<NicknameGroup>,
}

#[derive(Deserialize)]
struct NicknameGroup {
    names: Vec<String>,
}

/// Nickname equivalence lookup: each name maps to every member of its group.
static NICKNAMES: Lazy<HashMap<String, Vec<String>>> = Lazy::new(|| {
    let seed: NicknameSeed = toml::from_str(include_str!("../../seed_data/nicknames.toml"))
        .expect("embedded nickname seed data is valid TOML");
    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    for group in seed.group {
        for name in &group.names {
            map.insert(name.clone(), group.names.clone());
        }
    }
    map
});

/// Lowercase, fold diacritics (canonical decomposition, combining marks
/// dropped), replace non-alphanumeric characters with spaces, collapse
/// whitespace runs, trim. Idempotent.
pub fn normalize(input: &str) -> String {
    let folded: String = input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(|c| c.to_lowercase())
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip trailing personal suffixes ("jr", "iii", "phd", ...) from a
/// normalized name. Repeats so "john smith jr md" reduces fully.
pub fn strip_personal_suffixes(normalized: &str) -> String {
    let mut tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
    while tokens.len() > 1 {
        let last = tokens[tokens.len() - 1];
        if PERSONAL_SUFFIXES.contains(&last) {
            tokens.pop();
        } else {
            break;
        }
    }
    tokens.join(" ")
}

/// Normalized company root: legal suffixes stripped from the tail.
///
/// Returns `None` when the remaining root is shorter than
/// [`MIN_COMPANY_ROOT_LEN`].
pub fn company_root(company: &str) -> Option<String> {
    let normalized = normalize(company);
    let mut tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
    while tokens.len() > 1 {
        let last = tokens[tokens.len() - 1];
        if COMPANY_SUFFIXES.contains(&last) {
            tokens.pop();
            continue;
        }
        // "l.p." normalizes to the token pair "l p".
        if tokens.len() > 2 && last == "p" && tokens[tokens.len() - 2] == "l" {
            tokens.pop();
            tokens.pop();
            continue;
        }
        break;
    }
    let root = tokens.join(" ");
    if root.len() >= MIN_COMPANY_ROOT_LEN {
        Some(root)
    } else {
        None
    }
}

/// Generate the full normalized variant set for a prospect name.
///
/// Applies, in order: base normalization, personal-suffix stripping,
/// middle-name dropping (3+ token forms), and nickname expansion on the
/// first token. Variants shorter than four characters are discarded. The
/// result preserves first-seen order and contains no duplicates.
pub fn name_variants(name: &str) -> Vec<String> {
    let mut variants: Vec<String> = Vec::new();

    let base = normalize(name);
    if base.is_empty() {
        return variants;
    }
    push_unique(&mut variants, base.clone());

    // Later steps work on the suffix-stripped form so a trailing "jr" never
    // masquerades as a last name.
    let work = strip_personal_suffixes(&base);
    push_unique(&mut variants, work.clone());

    let work_tokens: Vec<&str> = work.split(' ').collect();
    if work_tokens.len() >= 3 {
        push_unique(
            &mut variants,
            format!("{} {}", work_tokens[0], work_tokens[work_tokens.len() - 1]),
        );
    }

    // Nickname expansion: substitute every group-equivalent first name, in
    // both full and first+last shapes.
    if work_tokens.len() >= 2 {
        if let Some(group) = NICKNAMES.get(work_tokens[0]) {
            for equivalent in group {
                if equivalent == work_tokens[0] {
                    continue;
                }
                let mut full = vec![equivalent.as_str()];
                full.extend(&work_tokens[1..]);
                push_unique(&mut variants, full.join(" "));
                push_unique(
                    &mut variants,
                    format!("{} {}", equivalent, work_tokens[work_tokens.len() - 1]),
                );
            }
        }
    }

    variants.retain(|v| v.len() >= MIN_VARIANT_LEN);
    variants
}

/// Reversed registration key for a variant: "first ... last" becomes
/// "last first ...".
pub fn reversed(variant: &str) -> Option<String> {
    let tokens: Vec<&str> = variant.split(' ').collect();
    if tokens.len() < 2 {
        return None;
    }
    let mut out = vec![tokens[tokens.len() - 1]];
    out.extend(&tokens[..tokens.len() - 1]);
    Some(out.join(" "))
}

/// True when every token of `inner` appears among `outer`'s tokens.
pub fn tokens_subset(inner: &str, outer: &str) -> bool {
    let outer_tokens: Vec<&str> = outer.split(' ').collect();
    inner
        .split(' ')
        .filter(|t| !t.is_empty())
        .all(|t| outer_tokens.contains(&t))
}

fn push_unique(variants: &mut Vec<String>, candidate: String) {
    if !candidate.is_empty() && !variants.contains(&candidate) {
        variants.push(candidate);
    }
}
