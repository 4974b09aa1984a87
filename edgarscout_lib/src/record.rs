//! The match record: one row per (prospect, filing) pair.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::signal::SignalProfile;

/// How the match was made.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    Structured,
    Text,
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MatchMethod::Structured => "structured",
            MatchMethod::Text => "text",
        };
        f.write_str(s)
    }
}

/// What kind of evidence backs the match.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    NameAndCompany,
    NameOnly,
    /// Modeled for completeness; company-only matches are never emitted.
    CompanyOnly,
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MatchType::NameAndCompany => "Name + Company",
            MatchType::NameOnly => "Name Only",
            MatchType::CompanyOnly => "Company Only",
        };
        f.write_str(s)
    }
}

/// Structured-match submethod, in probe order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuredMatchType {
    Exact,
    NameReorder,
    NameSwap,
    NameReorderDropMiddle,
    FirstMiddleOnly,
    SuffixRemoved,
}

impl std::fmt::Display for StructuredMatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StructuredMatchType::Exact => "exact",
            StructuredMatchType::NameReorder => "name_reorder",
            StructuredMatchType::NameSwap => "name_swap",
            StructuredMatchType::NameReorderDropMiddle => "name_reorder_drop_middle",
            StructuredMatchType::FirstMiddleOnly => "first_middle_only",
            StructuredMatchType::SuffixRemoved => "suffix_removed",
        };
        f.write_str(s)
    }
}

/// How (or why not) the prospect's company was verified.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyCheck {
    NoCompanyOnProspect,
    RootOverlapsProspectName,
    StructuredIssuerMatch,
    TextCompanyFound,
    CompanyNotFound,
}

impl CompanyCheck {
    pub fn verified(&self) -> bool {
        matches!(
            self,
            CompanyCheck::StructuredIssuerMatch | CompanyCheck::TextCompanyFound
        )
    }
}

impl std::fmt::Display for CompanyCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CompanyCheck::NoCompanyOnProspect => "no_company_on_prospect",
            CompanyCheck::RootOverlapsProspectName => "company_root_overlaps_prospect_name",
            CompanyCheck::StructuredIssuerMatch => "structured_issuer_match",
            CompanyCheck::TextCompanyFound => "text_company_found",
            CompanyCheck::CompanyNotFound => "company_not_found",
        };
        f.write_str(s)
    }
}

/// Name-to-company distance bucket for text matches.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceCategory {
    High,
    Medium,
    Low,
    TooFar,
}

impl std::fmt::Display for DistanceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DistanceCategory::High => "HIGH",
            DistanceCategory::Medium => "MEDIUM",
            DistanceCategory::Low => "LOW",
            DistanceCategory::TooFar => "TOO_FAR",
        };
        f.write_str(s)
    }
}

/// FP-risk bucket from the additive score.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FpRiskLevel {
    LikelyValid,
    LowRisk,
    MediumRisk,
    HighRisk,
}

impl std::fmt::Display for FpRiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FpRiskLevel::LikelyValid => "LIKELY_VALID",
            FpRiskLevel::LowRisk => "LOW_RISK",
            FpRiskLevel::MediumRisk => "MEDIUM_RISK",
            FpRiskLevel::HighRisk => "HIGH_RISK",
        };
        f.write_str(s)
    }
}

/// Fused decision for the operator.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    LikelyValid,
    NeedsReview,
    LikelyFalsePositive,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Verdict::LikelyValid => "LIKELY_VALID",
            Verdict::NeedsReview => "NEEDS_REVIEW",
            Verdict::LikelyFalsePositive => "LIKELY_FALSE_POSITIVE",
        };
        f.write_str(s)
    }
}

/// One emitted match. At most one per (prospect_id, accession_number);
/// LIKELY_FALSE_POSITIVE records are emitted like any other, never dropped.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MatchRecord {
    // Prospect identity.
    pub prospect_id: String,
    pub prospect_name: String,
    pub prospect_company: Option<String>,
    pub team_name: Option<String>,

    // Filing identity.
    pub filename: String,
    pub accession_number: Option<String>,
    pub form_type: Option<String>,
    pub form_class: String,
    pub issuer_name: Option<String>,
    pub ticker: Option<String>,
    pub filed_date: Option<NaiveDate>,
    pub edgar_url: Option<String>,

    // Match evidence.
    pub match_method: MatchMethod,
    pub match_type: MatchType,
    pub structured_match_type: Option<StructuredMatchType>,
    pub uncertain_match: bool,
    pub uncertain_reason: Option<String>,
    pub company_verified: bool,
    pub company_check_method: CompanyCheck,
    pub distance: Option<usize>,
    pub distance_category: Option<DistanceCategory>,
    pub confidence: u8,
    pub match_remarks: String,
    pub name_context: Option<String>,
    pub company_context: Option<String>,
    pub filing_person_name: Option<String>,
    pub filing_person_role: Option<String>,

    // Filing substance.
    pub transaction_codes: Vec<String>,
    pub transaction_summary: String,
    pub total_value: f64,
    pub has_10b5_1_plan: bool,
    pub has_gift: bool,
    pub has_same_day_sale: bool,
    pub alerts: Vec<String>,

    // Annotations.
    pub signal: SignalProfile,
    pub fp_risk_score: u8,
    pub fp_risk_level: FpRiskLevel,
    pub fp_reasons: Vec<String>,
    pub verdict: Verdict,
    pub verdict_reason: String,
}

impl MatchRecord {
    /// Collision tie-break ordering: higher confidence first, then
    /// structured method, then verified company, then Name + Company.
    pub fn beats(&self, other: &MatchRecord) -> bool {
        if self.confidence != other.confidence {
            return self.confidence > other.confidence;
        }
        let structured = |r: &MatchRecord| r.match_method == MatchMethod::Structured;
        if structured(self) != structured(other) {
            return structured(self);
        }
        if self.company_verified != other.company_verified {
            return self.company_verified;
        }
        let full = |r: &MatchRecord| r.match_type == MatchType::NameAndCompany;
        full(self) && !full(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{Dimension, SignalProfile, Urgency};

    fn record(confidence: u8, method: MatchMethod, verified: bool, mt: MatchType) -> MatchRecord {
        MatchRecord {
            prospect_id: "P1".into(),
            prospect_name: "Jane Doe".into(),
            prospect_company: None,
            team_name: None,
            filename: "f.txt".into(),
            accession_number: None,
            form_type: None,
            form_class: "OTHER".into(),
            issuer_name: None,
            ticker: None,
            filed_date: None,
            edgar_url: None,
            match_method: method,
            match_type: mt,
            structured_match_type: None,
            uncertain_match: false,
            uncertain_reason: None,
            company_verified: verified,
            company_check_method: CompanyCheck::CompanyNotFound,
            distance: None,
            distance_category: None,
            confidence,
            match_remarks: String::new(),
            name_context: None,
            company_context: None,
            filing_person_name: None,
            filing_person_role: None,
            transaction_codes: vec![],
            transaction_summary: String::new(),
            total_value: 0.0,
            has_10b5_1_plan: false,
            has_gift: false,
            has_same_day_sale: false,
            alerts: vec![],
            signal: SignalProfile {
                tier: 3,
                label: "CONTEXT".into(),
                dimensions: vec![Dimension::Context],
                urgency: Urgency::Low,
                action: String::new(),
                summary: String::new(),
            },
            fp_risk_score: 0,
            fp_risk_level: FpRiskLevel::LikelyValid,
            fp_reasons: vec![],
            verdict: Verdict::LikelyValid,
            verdict_reason: String::new(),
        }
    }

    #[test]
    fn test_beats_confidence_first() {
        let a = record(95, MatchMethod::Text, false, MatchType::NameOnly);
        let b = record(60, MatchMethod::Structured, true, MatchType::NameAndCompany);
        assert!(a.beats(&b));
    }

    #[test]
    fn test_beats_structured_on_tie() {
        let a = record(75, MatchMethod::Structured, false, MatchType::NameOnly);
        let b = record(75, MatchMethod::Text, false, MatchType::NameOnly);
        assert!(a.beats(&b));
        assert!(!b.beats(&a));
    }

    #[test]
    fn test_beats_verified_then_match_type() {
        let a = record(75, MatchMethod::Text, true, MatchType::NameOnly);
        let b = record(75, MatchMethod::Text, false, MatchType::NameAndCompany);
        assert!(a.beats(&b));

        let c = record(75, MatchMethod::Text, false, MatchType::NameAndCompany);
        let d = record(75, MatchMethod::Text, false, MatchType::NameOnly);
        assert!(c.beats(&d));
    }
}
