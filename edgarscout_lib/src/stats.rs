//! Run-level statistics.
//!
//! Workers keep their own [`RunStats`] and the pipeline merges them at the
//! end of the run, so no shared mutable state exists during the scan phase.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::MatchRecord;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RunStats {
    pub files_processed: usize,
    pub parse_errors: usize,
    pub matches_found: usize,
    pub soft_budget_breaches: usize,
    pub by_tier: BTreeMap<u8, usize>,
    pub by_method: BTreeMap<String, usize>,
    pub by_verdict: BTreeMap<String, usize>,
    pub by_form: BTreeMap<String, usize>,
    pub by_confidence: BTreeMap<String, usize>,
    pub by_risk_level: BTreeMap<String, usize>,
    pub company_verified: usize,
    pub company_unverified: usize,
    pub uncertain_matches: usize,
}

impl RunStats {
    /// Account for one processed filing.
    pub fn note_filing(&mut self, form_class: &str, parse_error: bool) {
        self.files_processed += 1;
        if parse_error {
            self.parse_errors += 1;
        }
        *self.by_form.entry(form_class.to_string()).or_default() += 1;
    }

    /// Account for one emitted match record.
    pub fn note_record(&mut self, record: &MatchRecord) {
        self.matches_found += 1;
        *self.by_tier.entry(record.signal.tier).or_default() += 1;
        *self
            .by_method
            .entry(record.match_method.to_string())
            .or_default() += 1;
        *self
            .by_verdict
            .entry(record.verdict.to_string())
            .or_default() += 1;
        *self
            .by_confidence
            .entry(confidence_bucket(record.confidence).to_string())
            .or_default() += 1;
        *self
            .by_risk_level
            .entry(record.fp_risk_level.to_string())
            .or_default() += 1;
        if record.company_verified {
            self.company_verified += 1;
        } else {
            self.company_unverified += 1;
        }
        if record.uncertain_match {
            self.uncertain_matches += 1;
        }
    }

    /// Fold another worker's stats into this one.
    pub fn merge(&mut self, other: RunStats) {
        self.files_processed += other.files_processed;
        self.parse_errors += other.parse_errors;
        self.matches_found += other.matches_found;
        self.soft_budget_breaches += other.soft_budget_breaches;
        self.company_verified += other.company_verified;
        self.company_unverified += other.company_unverified;
        self.uncertain_matches += other.uncertain_matches;
        for (k, v) in other.by_tier {
            *self.by_tier.entry(k).or_default() += v;
        }
        for (k, v) in other.by_method {
            *self.by_method.entry(k).or_default() += v;
        }
        for (k, v) in other.by_verdict {
            *self.by_verdict.entry(k).or_default() += v;
        }
        for (k, v) in other.by_form {
            *self.by_form.entry(k).or_default() += v;
        }
        for (k, v) in other.by_confidence {
            *self.by_confidence.entry(k).or_default() += v;
        }
        for (k, v) in other.by_risk_level {
            *self.by_risk_level.entry(k).or_default() += v;
        }
    }
}

pub fn confidence_bucket(confidence: u8) -> &'static str {
    if confidence >= 90 {
        "90-100"
    } else if confidence >= 70 {
        "70-89"
    } else {
        "<70"
    }
}
