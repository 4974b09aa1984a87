//! False-positive risk scoring and the fused verdict.
//!
//! A fixed additive rule set, capped at 100. The weights are deliberately
//! not learned: operators need the score to be explainable row by row, so
//! every contribution lands in `fp_reasons` alongside the number.

use crate::record::{
    CompanyCheck, FpRiskLevel, MatchMethod, MatchType, StructuredMatchType, Verdict,
};
use crate::validate::ContextMetrics;

/// Inputs the scorer needs about one candidate match.
#[derive(Debug, Clone, Default)]
pub struct RiskInputs<'a> {
    pub match_method: Option<MatchMethod>,
    pub match_type: Option<MatchType>,
    pub structured_match_type: Option<StructuredMatchType>,
    pub uncertain_match: bool,
    pub company_verified: bool,
    /// First/last token of the matched name pattern, when text evidence
    /// exists.
    pub first: Option<&'a str>,
    pub last: Option<&'a str>,
    pub company_root: Option<&'a str>,
    /// Context around the name hit (text matches only).
    pub context: Option<ContextMetrics>,
    pub confidence: u8,
}

/// Score thresholds for the risk buckets.
const HIGH_RISK_MIN: u32 = 70;
const MEDIUM_RISK_MIN: u32 = 50;
const LOW_RISK_MIN: u32 = 30;

pub struct RiskAssessment {
    pub score: u8,
    pub level: FpRiskLevel,
    pub reasons: Vec<String>,
}

pub fn assess(inputs: &RiskInputs) -> RiskAssessment {
    fn add(score: &mut u32, reasons: &mut Vec<String>, pts: u32, reason: &str) {
        *score += pts;
        reasons.push(format!("{} (+{})", reason, pts));
    }

    let mut score: u32 = 0;
    let mut reasons: Vec<String> = Vec::new();

    if inputs.structured_match_type == Some(StructuredMatchType::FirstMiddleOnly) {
        add(&mut score, &mut reasons, 80, "first+middle-only structured match");
    } else if inputs.uncertain_match {
        add(&mut score, &mut reasons, 40, "uncertain match");
    }

    if inputs.match_method == Some(MatchMethod::Structured) && !inputs.company_verified {
        add(&mut score, &mut reasons, 20, "structured match without company verification");
    }

    if let (Some(first), Some(last)) = (inputs.first, inputs.last) {
        if first.len() == 1 || last.len() == 1 {
            add(&mut score, &mut reasons, 50, "single-character name token");
        } else if first.len() <= 2 && last.len() <= 2 {
            add(&mut score, &mut reasons, 40, "first and last name both very short");
        } else if first.len() <= 2 || last.len() <= 2 {
            add(&mut score, &mut reasons, 20, "short name token");
        }
    }

    if let Some(root) = inputs.company_root {
        if root.len() <= 3 {
            add(&mut score, &mut reasons, 35, "very short company root");
        } else if root.len() <= 5 {
            add(&mut score, &mut reasons, 15, "short company root");
        }
    }

    if let Some(ctx) = &inputs.context {
        if ctx.non_ascii_frac > 0.30 {
            add(&mut score, &mut reasons, 30, "context is mostly non-ASCII");
        }
        if ctx.long_word_count < 3 {
            add(&mut score, &mut reasons, 20, "little English context around match");
        }
        if ctx.has_uppercase_run {
            add(&mut score, &mut reasons, 15, "uppercase run in context");
        }
    }

    match inputs.match_type {
        Some(MatchType::CompanyOnly) => {
            add(&mut score, &mut reasons, 10, "company-only match");
        }
        Some(MatchType::NameAndCompany) => {
            if inputs.company_root.map(|r| r.len() <= 4).unwrap_or(false) {
                add(&mut score, &mut reasons, 15, "name+company match on a tiny company root");
            }
        }
        _ => {}
    }

    if inputs.confidence < 70 {
        add(&mut score, &mut reasons, 10, "low confidence");
    }

    let score = score.min(100);
    let level = if score >= HIGH_RISK_MIN {
        FpRiskLevel::HighRisk
    } else if score >= MEDIUM_RISK_MIN {
        FpRiskLevel::MediumRisk
    } else if score >= LOW_RISK_MIN {
        FpRiskLevel::LowRisk
    } else {
        FpRiskLevel::LikelyValid
    };

    RiskAssessment {
        score: score as u8,
        level,
        reasons,
    }
}

/// Fused verdict, applied in precedence order.
pub fn verdict(
    structured_match_type: Option<StructuredMatchType>,
    uncertain_match: bool,
    company_verified: bool,
    company_check: CompanyCheck,
    match_method: MatchMethod,
    confidence: u8,
    risk_level: FpRiskLevel,
) -> (Verdict, String) {
    if structured_match_type == Some(StructuredMatchType::FirstMiddleOnly) {
        return (
            Verdict::LikelyFalsePositive,
            "first+middle-only match; filing last name differs".to_string(),
        );
    }
    if risk_level == FpRiskLevel::HighRisk {
        return (
            Verdict::LikelyFalsePositive,
            "high false-positive risk score".to_string(),
        );
    }
    if uncertain_match {
        return (Verdict::NeedsReview, "uncertain match".to_string());
    }
    if company_verified && confidence >= 85 {
        return (
            Verdict::LikelyValid,
            format!("company verified ({})", company_check),
        );
    }
    if match_method == MatchMethod::Structured && !company_verified {
        return (
            Verdict::NeedsReview,
            format!("structured match but company not verified ({})", company_check),
        );
    }
    if risk_level == FpRiskLevel::MediumRisk {
        return (Verdict::NeedsReview, "medium false-positive risk".to_string());
    }
    if confidence < 70 {
        return (Verdict::NeedsReview, "low confidence".to_string());
    }
    (Verdict::LikelyValid, "clean match".to_string())
}
