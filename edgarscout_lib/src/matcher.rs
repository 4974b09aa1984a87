//! Unified matcher: structured-name probing, company cross-check, text
//! evidence grouping, and fusion into match records.
//!
//! Structured evidence (persons extracted by a form parser) always beats
//! text evidence for the same prospect. Every emitted record carries its
//! full evidence trail: submethod, verification source, distance, contexts,
//! risk breakdown, and verdict.

use std::collections::HashMap;

use edgarscout_filings::{FilingPerson, ParsedFiling};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::engine::{NormalizedBody, PatternEngine, PatternHit};
use crate::index::{PatternVariation, ProspectIndex};
use crate::normalize::{company_root, normalize, strip_personal_suffixes};
use crate::prospect::Prospect;
use crate::record::{
    CompanyCheck, DistanceCategory, MatchMethod, MatchRecord, MatchType, StructuredMatchType,
    Verdict,
};
use crate::risk::{self, RiskInputs};
use crate::signal::{self, same_day_exercise_sale};
use crate::validate::{self, context_metrics};

/// Positions retained per prospect per evidence kind.
const MAX_POSITIONS: usize = 3;

/// Snippet radius around a hit, in raw bytes.
const SNIPPET_RADIUS: usize = 60;

/// Distance thresholds for name-to-company proximity.
const DISTANCE_HIGH: usize = 4_000;
const DISTANCE_MEDIUM: usize = 8_000;
const DISTANCE_LOW: usize = 50_000;

/// Filing filename shape `CIK-YY-SEQ.txt`.
static FILENAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{10})-(\d{2})-(\d{6})\.txt$").expect("filename regex"));

/// Synthesize the EDGAR archive URL from a `CIK-YY-SEQ.txt` filename.
pub fn edgar_url_from_filename(filename: &str) -> Option<String> {
    let caps = FILENAME_RE.captures(filename)?;
    let cik = &caps[1];
    let cik_int: u64 = cik.parse().ok()?;
    Some(format!(
        "https://www.sec.gov/Archives/edgar/data/{}/{}{}{}.txt",
        cik_int, cik, &caps[2], &caps[3]
    ))
}

/// Text evidence accumulated for one prospect across a filing body.
#[derive(Debug, Default, Clone)]
struct TextEvidence {
    name_spans: Vec<(usize, usize)>,
    company_spans: Vec<(usize, usize)>,
    first: String,
    last: String,
}

impl TextEvidence {
    fn name_hit(&self) -> bool {
        !self.name_spans.is_empty()
    }
    fn company_hit(&self) -> bool {
        !self.company_spans.is_empty()
    }
}

/// One structured match before fusion.
#[derive(Debug, Clone)]
struct StructuredHit {
    submethod: StructuredMatchType,
    uncertain: bool,
    uncertain_reason: Option<String>,
    person: FilingPerson,
}

/// The shared immutable matching state: index + automaton. Built once,
/// then used concurrently by every scan worker.
pub struct MatchEngine {
    index: ProspectIndex,
    engine: PatternEngine,
}

impl MatchEngine {
    pub fn new(prospects: Vec<Prospect>) -> Self {
        let index = ProspectIndex::build(prospects);
        let engine = PatternEngine::new(index.patterns());
        MatchEngine { index, engine }
    }

    pub fn index(&self) -> &ProspectIndex {
        &self.index
    }

    /// Match one parsed filing against every prospect. Returns at most one
    /// record per prospect.
    pub fn match_filing(
        &self,
        filing: &ParsedFiling,
        raw: &str,
        filename: &str,
    ) -> Vec<MatchRecord> {
        let structured = self.structured_matches(&filing.persons);
        let text = self.text_matches(raw);

        // Company-check step 4 needs the tag-stripped body; build it lazily.
        let mut stripped_lower: Option<String> = None;

        let signal = signal::classify(filing);

        let mut prospects: Vec<usize> = structured.keys().copied().collect();
        for idx in text.keys() {
            if !prospects.contains(idx) {
                prospects.push(*idx);
            }
        }
        prospects.sort_unstable();

        let mut records = Vec::new();
        for pidx in prospects {
            let evidence = text.get(&pidx);
            let record = match structured.get(&pidx) {
                Some(hit) => {
                    if stripped_lower.is_none()
                        && self.index.company_root(pidx).is_some()
                        && self.index.company_text_allowed(pidx)
                    {
                        stripped_lower =
                            Some(edgarscout_filings::tags::strip_html(raw).to_lowercase());
                    }
                    self.structured_record(
                        pidx,
                        hit,
                        evidence,
                        filing,
                        raw,
                        filename,
                        &signal,
                        stripped_lower.as_deref(),
                    )
                }
                None => {
                    let evidence = evidence.expect("prospect came from text evidence");
                    if !evidence.name_hit() {
                        // Company-only evidence is intentionally not emitted.
                        continue;
                    }
                    self.text_record(pidx, evidence, filing, raw, filename, &signal)
                }
            };
            records.push(record);
        }
        records
    }

    // -- Structured matching --

    fn structured_matches(&self, persons: &[FilingPerson]) -> HashMap<usize, StructuredHit> {
        let mut matches: HashMap<usize, StructuredHit> = HashMap::new();
        for person in persons {
            for (pidx, submethod, uncertain) in self.probe(&person.name) {
                matches.entry(pidx).or_insert_with(|| StructuredHit {
                    submethod,
                    uncertain,
                    uncertain_reason: if uncertain {
                        Some(
                            "Matched First+Middle only; filing last name differs from prospect last name"
                                .to_string(),
                        )
                    } else {
                        None
                    },
                    person: person.clone(),
                });
            }
        }
        matches
    }

    /// Probe the index for one filing person name. Candidates come back in
    /// probe order; the caller keeps the first hit per prospect.
    fn probe(&self, person_name: &str) -> Vec<(usize, StructuredMatchType, bool)> {
        let normalized = normalize(person_name);
        if normalized.is_empty() {
            return Vec::new();
        }

        let mut out = Vec::new();
        for (key, submethod, uncertain) in probe_keys(&normalized) {
            for &pidx in self.index.lookup_variant(&key) {
                out.push((pidx, submethod, uncertain));
            }
        }

        // Suffix-stripped re-probe, labeled as such.
        let stripped = strip_personal_suffixes(&normalized);
        if stripped != normalized {
            for (key, submethod, uncertain) in probe_keys(&stripped) {
                if uncertain || submethod == StructuredMatchType::FirstMiddleOnly {
                    continue;
                }
                for &pidx in self.index.lookup_variant(&key) {
                    out.push((pidx, StructuredMatchType::SuffixRemoved, false));
                }
            }
        }
        out
    }

    // -- Company cross-check --

    fn company_check(
        &self,
        pidx: usize,
        filing: &ParsedFiling,
        stripped_lower: Option<&str>,
    ) -> CompanyCheck {
        let root = match self.index.company_root(pidx) {
            Some(root) => root,
            None => return CompanyCheck::NoCompanyOnProspect,
        };
        if !self.index.company_text_allowed(pidx) {
            return CompanyCheck::RootOverlapsProspectName;
        }

        let header = &filing.header;
        for entity in [&header.issuer, &header.filer, &header.subject_company]
            .into_iter()
            .flatten()
        {
            if let Some(name) = &entity.name {
                let filing_root = company_root(name).unwrap_or_else(|| normalize(name));
                if !filing_root.is_empty()
                    && (filing_root.contains(root) || root.contains(filing_root.as_str()))
                {
                    return CompanyCheck::StructuredIssuerMatch;
                }
            }
        }

        if let Some(text) = stripped_lower {
            if text.contains(root) {
                return CompanyCheck::TextCompanyFound;
            }
        }
        CompanyCheck::CompanyNotFound
    }

    // -- Text matching --

    fn text_matches(&self, raw: &str) -> HashMap<usize, TextEvidence> {
        let body = NormalizedBody::new(raw);
        let hits = self.engine.scan(raw, &body);
        let mut evidence: HashMap<usize, TextEvidence> = HashMap::new();

        for hit in &hits {
            let pattern = &self.index.patterns().patterns[hit.pattern];
            for variation in &pattern.variations {
                match variation {
                    PatternVariation::Name { prospect, first, last } => {
                        if !validate::validate_name_hit(raw, hit, first, last) {
                            continue;
                        }
                        let entry = evidence.entry(*prospect).or_default();
                        if entry.first.is_empty() {
                            entry.first = first.clone();
                            entry.last = last.clone();
                        }
                        push_span(&mut entry.name_spans, hit);
                    }
                    PatternVariation::Company { prospect, root } => {
                        // A company hit that is just the prospect's own name
                        // again proves nothing.
                        if !self.index.company_text_allowed(*prospect) {
                            continue;
                        }
                        if !validate::validate_company_hit(raw, hit, root) {
                            continue;
                        }
                        let entry = evidence.entry(*prospect).or_default();
                        push_span(&mut entry.company_spans, hit);
                    }
                }
            }
        }

        evidence.retain(|_, e| e.name_hit() || e.company_hit());
        evidence
    }

    // -- Record assembly --

    #[allow(clippy::too_many_arguments)]
    fn structured_record(
        &self,
        pidx: usize,
        hit: &StructuredHit,
        evidence: Option<&TextEvidence>,
        filing: &ParsedFiling,
        raw: &str,
        filename: &str,
        signal: &signal::SignalProfile,
        stripped_lower: Option<&str>,
    ) -> MatchRecord {
        let prospect = self.index.prospect(pidx);
        let check = self.company_check(pidx, filing, stripped_lower);
        let verified = check.verified();
        let confidence = structured_confidence(hit.submethod, verified);

        let match_type = if verified {
            MatchType::NameAndCompany
        } else {
            MatchType::NameOnly
        };

        // First/last ambiguity of the prospect name itself still matters
        // for risk, even without text evidence.
        let norm_name = strip_personal_suffixes(&normalize(&prospect.name));
        let tokens: Vec<&str> = norm_name.split(' ').collect();
        let (first, last) = if tokens.len() >= 2 {
            (tokens[0], tokens[tokens.len() - 1])
        } else {
            (norm_name.as_str(), norm_name.as_str())
        };

        let assessment = risk::assess(&RiskInputs {
            match_method: Some(MatchMethod::Structured),
            match_type: Some(match_type),
            structured_match_type: Some(hit.submethod),
            uncertain_match: hit.uncertain,
            company_verified: verified,
            first: Some(first),
            last: Some(last),
            company_root: self.index.company_root(pidx),
            context: None,
            confidence,
        });
        let (verdict, verdict_reason) = risk::verdict(
            Some(hit.submethod),
            hit.uncertain,
            verified,
            check,
            MatchMethod::Structured,
            confidence,
            assessment.level,
        );

        let (name_context, company_context) = contexts_from_evidence(raw, evidence);
        let remarks = format!(
            "Structured {} match on filing person \"{}\"; company check: {}",
            hit.submethod, hit.person.name, check
        );

        self.build_record(
            prospect,
            filing,
            filename,
            signal.clone(),
            RecordEvidence {
                match_method: MatchMethod::Structured,
                match_type,
                structured_match_type: Some(hit.submethod),
                uncertain_match: hit.uncertain,
                uncertain_reason: hit.uncertain_reason.clone(),
                company_verified: verified,
                company_check_method: check,
                distance: None,
                distance_category: None,
                confidence,
                match_remarks: remarks,
                name_context,
                company_context,
                filing_person_name: Some(hit.person.name.clone()),
                filing_person_role: hit.person.role.clone(),
                verdict,
                verdict_reason,
                fp_risk_score: assessment.score,
                fp_risk_level: assessment.level,
                fp_reasons: assessment.reasons,
            },
        )
    }

    fn text_record(
        &self,
        pidx: usize,
        evidence: &TextEvidence,
        filing: &ParsedFiling,
        raw: &str,
        filename: &str,
        signal: &signal::SignalProfile,
    ) -> MatchRecord {
        let prospect = self.index.prospect(pidx);

        let (distance, category, closest) = if evidence.company_hit() {
            let (d, n, c) = min_distance(&evidence.name_spans, &evidence.company_spans);
            (Some(d), Some(distance_category(d)), Some((n, c)))
        } else {
            (None, None, None)
        };

        let (match_type, confidence, check) = match category {
            Some(DistanceCategory::High) => (MatchType::NameAndCompany, 95, CompanyCheck::TextCompanyFound),
            Some(DistanceCategory::Medium) => (MatchType::NameAndCompany, 85, CompanyCheck::TextCompanyFound),
            Some(DistanceCategory::Low) => (MatchType::NameAndCompany, 70, CompanyCheck::TextCompanyFound),
            // Company too far away to corroborate: fall back to name-only.
            Some(DistanceCategory::TooFar) => (MatchType::NameOnly, 75, CompanyCheck::CompanyNotFound),
            None => {
                let check = match self.index.company_root(pidx) {
                    None => CompanyCheck::NoCompanyOnProspect,
                    Some(_) if !self.index.company_text_allowed(pidx) => {
                        CompanyCheck::RootOverlapsProspectName
                    }
                    Some(_) => CompanyCheck::CompanyNotFound,
                };
                (MatchType::NameOnly, 75, check)
            }
        };
        let verified = check.verified();

        let (name_span, company_span) = match closest {
            Some((n, c)) => (Some(n), Some(c)),
            None => (evidence.name_spans.first().copied(), None),
        };
        let name_context = name_span.map(|s| snippet(raw, s));
        let company_context = company_span.map(|s| snippet(raw, s));

        let ctx_metrics = name_span.map(|(s, e)| context_metrics(raw, s, e));

        let assessment = risk::assess(&RiskInputs {
            match_method: Some(MatchMethod::Text),
            match_type: Some(match_type),
            structured_match_type: None,
            uncertain_match: false,
            company_verified: verified,
            first: Some(&evidence.first),
            last: Some(&evidence.last),
            company_root: self.index.company_root(pidx),
            context: ctx_metrics,
            confidence,
        });
        let (verdict, verdict_reason) = risk::verdict(
            None,
            false,
            verified,
            check,
            MatchMethod::Text,
            confidence,
            assessment.level,
        );

        let remarks = match distance {
            Some(d) => format!(
                "Text match: name and company found {} bytes apart ({} name / {} company positions)",
                d,
                evidence.name_spans.len(),
                evidence.company_spans.len()
            ),
            None => format!(
                "Text match: name found at {} position(s), no company evidence",
                evidence.name_spans.len()
            ),
        };

        self.build_record(
            prospect,
            filing,
            filename,
            signal.clone(),
            RecordEvidence {
                match_method: MatchMethod::Text,
                match_type,
                structured_match_type: None,
                uncertain_match: false,
                uncertain_reason: None,
                company_verified: verified,
                company_check_method: check,
                distance,
                distance_category: category,
                confidence,
                match_remarks: remarks,
                name_context,
                company_context,
                filing_person_name: None,
                filing_person_role: None,
                verdict,
                verdict_reason,
                fp_risk_score: assessment.score,
                fp_risk_level: assessment.level,
                fp_reasons: assessment.reasons,
            },
        )
    }

    fn build_record(
        &self,
        prospect: &Prospect,
        filing: &ParsedFiling,
        filename: &str,
        signal: signal::SignalProfile,
        evidence: RecordEvidence,
    ) -> MatchRecord {
        let header = &filing.header;
        let issuer = header.primary_company();
        let codes = filing.transaction_codes();
        let has_gift = codes.iter().any(|c| c == "G");

        MatchRecord {
            prospect_id: prospect.id.clone(),
            prospect_name: prospect.name.clone(),
            prospect_company: prospect.company.clone(),
            team_name: prospect.team.clone(),
            filename: filename.to_string(),
            accession_number: header.accession_number.clone(),
            form_type: header.form_type.clone(),
            form_class: header.form_class.to_string(),
            issuer_name: issuer.and_then(|i| i.name.clone()),
            ticker: issuer.and_then(|i| i.ticker.clone()),
            filed_date: header.filed_date,
            edgar_url: edgar_url_from_filename(filename),
            match_method: evidence.match_method,
            match_type: evidence.match_type,
            structured_match_type: evidence.structured_match_type,
            uncertain_match: evidence.uncertain_match,
            uncertain_reason: evidence.uncertain_reason,
            company_verified: evidence.company_verified,
            company_check_method: evidence.company_check_method,
            distance: evidence.distance,
            distance_category: evidence.distance_category,
            confidence: evidence.confidence,
            match_remarks: evidence.match_remarks,
            name_context: evidence.name_context,
            company_context: evidence.company_context,
            filing_person_name: evidence.filing_person_name,
            filing_person_role: evidence.filing_person_role,
            transaction_summary: transaction_summary(filing, &codes),
            transaction_codes: codes,
            total_value: filing.total_value(),
            has_10b5_1_plan: filing.has_10b5_1_plan,
            has_gift,
            has_same_day_sale: same_day_exercise_sale(filing),
            alerts: filing
                .alerts
                .iter()
                .map(|a| format!("[{}] {}: {}", a.severity, a.kind, a.message))
                .collect(),
            signal,
            fp_risk_score: evidence.fp_risk_score,
            fp_risk_level: evidence.fp_risk_level,
            fp_reasons: evidence.fp_reasons,
            verdict: evidence.verdict,
            verdict_reason: evidence.verdict_reason,
        }
    }
}

/// Per-record evidence bundle threaded into [`MatchEngine::build_record`].
struct RecordEvidence {
    match_method: MatchMethod,
    match_type: MatchType,
    structured_match_type: Option<StructuredMatchType>,
    uncertain_match: bool,
    uncertain_reason: Option<String>,
    company_verified: bool,
    company_check_method: CompanyCheck,
    distance: Option<usize>,
    distance_category: Option<DistanceCategory>,
    confidence: u8,
    match_remarks: String,
    name_context: Option<String>,
    company_context: Option<String>,
    filing_person_name: Option<String>,
    filing_person_role: Option<String>,
    verdict: Verdict,
    verdict_reason: String,
    fp_risk_score: u8,
    fp_risk_level: crate::record::FpRiskLevel,
    fp_reasons: Vec<String>,
}

/// Candidate lookup keys for a normalized filing name, in probe order.
fn probe_keys(normalized: &str) -> Vec<(String, StructuredMatchType, bool)> {
    let tokens: Vec<&str> = normalized.split(' ').collect();
    let n = tokens.len();
    let mut keys = vec![(normalized.to_string(), StructuredMatchType::Exact, false)];

    if n >= 3 {
        // SEC-style "Last First Middle" rotated back to "First Middle Last".
        let mut rotated = vec![tokens[n - 1]];
        rotated.extend(&tokens[..n - 1]);
        keys.push((rotated.join(" "), StructuredMatchType::NameReorder, false));
    }
    if n == 2 {
        keys.push((
            format!("{} {}", tokens[1], tokens[0]),
            StructuredMatchType::NameSwap,
            false,
        ));
    }
    if n == 3 {
        keys.push((
            format!("{} {}", tokens[1], tokens[0]),
            StructuredMatchType::NameReorderDropMiddle,
            false,
        ));
        keys.push((
            format!("{} {}", tokens[1], tokens[2]),
            StructuredMatchType::FirstMiddleOnly,
            true,
        ));
    }
    keys
}

/// Confidence matrix: submethod x company verification.
pub fn structured_confidence(submethod: StructuredMatchType, verified: bool) -> u8 {
    use StructuredMatchType::*;
    match (submethod, verified) {
        (Exact | NameSwap, true) => 98,
        (Exact | NameSwap, false) => 60,
        (NameReorder, true) => 95,
        (NameReorder, false) => 50,
        (NameReorderDropMiddle | SuffixRemoved, true) => 90,
        (NameReorderDropMiddle | SuffixRemoved, false) => 40,
        (FirstMiddleOnly, _) => 20,
    }
}

fn distance_category(distance: usize) -> DistanceCategory {
    if distance <= DISTANCE_HIGH {
        DistanceCategory::High
    } else if distance <= DISTANCE_MEDIUM {
        DistanceCategory::Medium
    } else if distance <= DISTANCE_LOW {
        DistanceCategory::Low
    } else {
        DistanceCategory::TooFar
    }
}

/// Minimum |name - company| distance over the stored raw positions, plus
/// the closest span pair.
fn min_distance(
    names: &[(usize, usize)],
    companies: &[(usize, usize)],
) -> (usize, (usize, usize), (usize, usize)) {
    let mut best = usize::MAX;
    let mut best_pair = (names[0], companies[0]);
    for &n in names {
        for &c in companies {
            let d = n.0.abs_diff(c.0);
            if d < best {
                best = d;
                best_pair = (n, c);
            }
        }
    }
    (best, best_pair.0, best_pair.1)
}

fn push_span(spans: &mut Vec<(usize, usize)>, hit: &PatternHit) {
    if spans.len() < MAX_POSITIONS && !spans.contains(&(hit.raw_start, hit.raw_end)) {
        spans.push((hit.raw_start, hit.raw_end));
    }
}

/// Whitespace-normalized raw snippet around a span, with ellipses when
/// truncated.
fn snippet(raw: &str, span: (usize, usize)) -> String {
    let from = floor_char_boundary(raw, span.0.saturating_sub(SNIPPET_RADIUS));
    let to = floor_char_boundary(raw, (span.1 + SNIPPET_RADIUS).min(raw.len()));
    let core: String = raw[from..to].split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out = String::new();
    if from > 0 {
        out.push_str("...");
    }
    out.push_str(&core);
    if to < raw.len() {
        out.push_str("...");
    }
    out
}

fn contexts_from_evidence(
    raw: &str,
    evidence: Option<&TextEvidence>,
) -> (Option<String>, Option<String>) {
    match evidence {
        Some(e) => (
            e.name_spans.first().map(|&s| snippet(raw, s)),
            e.company_spans.first().map(|&s| snippet(raw, s)),
        ),
        None => (None, None),
    }
}

fn transaction_summary(filing: &ParsedFiling, codes: &[String]) -> String {
    if filing.transactions.is_empty() {
        return String::new();
    }
    let labels: Vec<String> = if codes.is_empty() {
        filing
            .transactions
            .iter()
            .map(|t| t.code_label.clone())
            .filter(|l| !l.is_empty())
            .take(3)
            .collect()
    } else {
        codes
            .iter()
            .map(|c| edgarscout_filings::forms::ownership::code_label(c))
            .collect()
    };
    let n = filing.transactions.len();
    if labels.is_empty() {
        return format!("{} transaction{}", n, if n == 1 { "" } else { "s" });
    }
    format!(
        "{} ({} transaction{})",
        labels.join(" + "),
        n,
        if n == 1 { "" } else { "s" }
    )
}

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    idx = idx.min(text.len());
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
