//! Signal tier classifier.
//!
//! Deterministic mapping from (form class, transaction codes, flags) to a
//! fundraising signal: tier 1 is act-now (liquidity and philanthropy
//! events), tier 2 is capacity intelligence, tier 3 is background context.

use edgarscout_filings::{format_usd, FormClass, ParsedFiling};
use serde::{Deserialize, Serialize};

/// Wealth-signal dimensions a filing can speak to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Liquidity,
    Capacity,
    Propensity,
    Context,
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Dimension::Liquidity => "liquidity",
            Dimension::Capacity => "capacity",
            Dimension::Propensity => "propensity",
            Dimension::Context => "context",
        };
        f.write_str(s)
    }
}

/// Outreach urgency.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Urgency::Low => "LOW",
            Urgency::Medium => "MEDIUM",
            Urgency::High => "HIGH",
        };
        f.write_str(s)
    }
}

/// Classified signal attached to every match record from the same filing.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SignalProfile {
    pub tier: u8,
    pub label: String,
    pub dimensions: Vec<Dimension>,
    pub urgency: Urgency,
    /// Suggested gift-officer action.
    pub action: String,
    pub summary: String,
}

/// Classify a parsed filing. Pure and total: every filing gets a profile.
pub fn classify(filing: &ParsedFiling) -> SignalProfile {
    let codes = filing.transaction_codes();
    let has = |c: &str| codes.iter().any(|x| x == c);

    let (tier, label, dimensions, urgency, action): (u8, &str, Vec<Dimension>, Urgency, &str) =
        match filing.header.form_class {
            FormClass::Form4 => {
                if has("G") {
                    (
                        1,
                        "PHILANTHROPY",
                        vec![Dimension::Propensity],
                        Urgency::High,
                        "Stock gift executed; discuss gift vehicles and timing now",
                    )
                } else if same_day_exercise_sale(filing) {
                    (
                        1,
                        "SAME_DAY_SALE",
                        vec![Dimension::Liquidity],
                        Urgency::High,
                        "Cashless exercise completed; fresh liquidity to discuss",
                    )
                } else if has("S") {
                    (
                        1,
                        "LIQUIDITY",
                        vec![Dimension::Liquidity],
                        Urgency::High,
                        "Insider sale completed; follow up within the week",
                    )
                } else if !codes.is_empty() && codes.iter().all(|c| c == "A" || c == "F") {
                    (
                        2,
                        "COMPENSATION",
                        vec![Dimension::Capacity],
                        Urgency::Low,
                        "Equity compensation event; update capacity estimate",
                    )
                } else {
                    (
                        2,
                        "OWNERSHIP_CHANGE",
                        vec![Dimension::Capacity],
                        Urgency::Low,
                        "Ownership change on file; refresh the research profile",
                    )
                }
            }
            FormClass::Form144 => (
                1,
                "UPCOMING_LIQUIDITY",
                vec![Dimension::Liquidity],
                Urgency::High,
                "Sale not yet executed; reach out before the liquidity lands",
            ),
            FormClass::Form3 => (
                2,
                "NEW_INSIDER",
                vec![Dimension::Capacity],
                Urgency::Medium,
                "New insider role; qualify equity position and relationship",
            ),
            FormClass::Form5 => (
                2,
                "OWNERSHIP_CHANGE",
                vec![Dimension::Capacity],
                Urgency::Low,
                "Annual ownership statement; refresh the research profile",
            ),
            FormClass::Def14A => (
                2,
                "COMPENSATION_DISCLOSURE",
                vec![Dimension::Capacity],
                Urgency::Low,
                "Proxy compensation data available; update capacity estimate",
            ),
            FormClass::Sc13D | FormClass::Sc13G => (
                2,
                "MAJOR_OWNERSHIP",
                vec![Dimension::Capacity],
                Urgency::Medium,
                "5%+ position disclosed; significant concentrated holding",
            ),
            FormClass::ThirteenF => (
                2,
                "FUND_MANAGER",
                vec![Dimension::Capacity],
                Urgency::Low,
                "Institutional AUM, not personal wealth; qualify carefully",
            ),
            FormClass::EightK if filing.is_personnel_event => (
                1,
                "EXECUTIVE_TRANSITION",
                vec![Dimension::Liquidity, Dimension::Capacity],
                Urgency::High,
                "Executive transition; equity acceleration likely in play",
            ),
            FormClass::EightK if filing.is_ma_event => (
                1,
                "MA_EVENT",
                vec![Dimension::Liquidity],
                Urgency::High,
                "M&A event; change-of-control payouts possible",
            ),
            FormClass::FormD => (
                3,
                "PRIVATE_RAISE",
                vec![Dimension::Capacity],
                Urgency::Low,
                "Private raise on file; founder wealth still illiquid",
            ),
            FormClass::Registration => (
                1,
                "IPO_OR_OFFERING",
                vec![Dimension::Liquidity],
                Urgency::High,
                "Registration filed; upcoming liquidity window for insiders",
            ),
            FormClass::Tender => (
                1,
                "TENDER_OFFER",
                vec![Dimension::Liquidity],
                Urgency::High,
                "Tender offer / going-private; near-term cash-out likely",
            ),
            _ => (
                3,
                "CONTEXT",
                vec![Dimension::Context],
                Urgency::Low,
                "Background filing; file for context",
            ),
        };

    SignalProfile {
        tier,
        label: label.to_string(),
        dimensions,
        urgency,
        action: action.to_string(),
        summary: summary_line(filing),
    }
}

/// True when an exercise (M) and a sale (S) share any transaction date.
pub fn same_day_exercise_sale(filing: &ParsedFiling) -> bool {
    let exercise_dates: Vec<&str> = filing
        .transactions
        .iter()
        .filter(|t| t.code.as_deref() == Some("M"))
        .filter_map(|t| t.date.as_deref())
        .collect();
    filing
        .transactions
        .iter()
        .filter(|t| t.code.as_deref() == Some("S"))
        .filter_map(|t| t.date.as_deref())
        .any(|d| exercise_dates.contains(&d))
}

/// `[formType] issuer | codeLabel: $value | first-HIGH-alert-message`.
fn summary_line(filing: &ParsedFiling) -> String {
    let form = filing
        .header
        .form_type
        .clone()
        .unwrap_or_else(|| filing.header.form_class.to_string());
    let issuer = filing
        .header
        .primary_company()
        .and_then(|c| c.name.clone())
        .unwrap_or_else(|| "Unknown issuer".to_string());

    let mut parts = vec![format!("[{}] {}", form, issuer)];
    if let Some(tx) = filing.transactions.iter().find(|t| t.value.is_some()) {
        parts.push(format!(
            "{}: {}",
            tx.code_label,
            format_usd(filing.total_value())
        ));
    }
    if let Some(alert) = filing.first_high_alert() {
        parts.push(alert.to_string());
    }
    parts.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgarscout_filings::{
        AlertKind, AlertSeverity, FilingAlert, FilingHeader, FilingTransaction,
    };

    fn filing_with(class: FormClass, codes: &[(&str, &str)]) -> ParsedFiling {
        let mut header = FilingHeader::default();
        header.form_class = class;
        header.form_type = Some(class.to_string());
        let mut filing = ParsedFiling::from_header(header);
        for (code, date) in codes {
            filing.transactions.push(FilingTransaction {
                code: Some(code.to_string()),
                code_label: code.to_string(),
                date: Some(date.to_string()),
                value: Some(1000.0),
                ..Default::default()
            });
        }
        filing
    }

    #[test]
    fn test_gift_beats_sale() {
        let filing = filing_with(FormClass::Form4, &[("G", "2024-01-10"), ("S", "2024-01-10")]);
        let profile = classify(&filing);
        assert_eq!(profile.tier, 1);
        assert_eq!(profile.label, "PHILANTHROPY");
        assert_eq!(profile.urgency, Urgency::High);
        assert_eq!(profile.dimensions, vec![Dimension::Propensity]);
    }

    #[test]
    fn test_same_day_exercise_sale() {
        let filing = filing_with(FormClass::Form4, &[("M", "2024-01-10"), ("S", "2024-01-10")]);
        let profile = classify(&filing);
        assert_eq!(profile.label, "SAME_DAY_SALE");
        assert_eq!(profile.tier, 1);
    }

    #[test]
    fn test_different_day_exercise_sale_is_liquidity() {
        let filing = filing_with(FormClass::Form4, &[("M", "2024-01-09"), ("S", "2024-01-10")]);
        let profile = classify(&filing);
        assert_eq!(profile.label, "LIQUIDITY");
    }

    #[test]
    fn test_award_only_is_tier2_low() {
        let filing = filing_with(FormClass::Form4, &[("A", "2024-01-10")]);
        let profile = classify(&filing);
        assert_eq!(profile.tier, 2);
        assert_eq!(profile.urgency, Urgency::Low);
        assert_eq!(profile.dimensions, vec![Dimension::Capacity]);
    }

    #[test]
    fn test_form144_tier1_high() {
        let filing = filing_with(FormClass::Form144, &[]);
        let profile = classify(&filing);
        assert_eq!(profile.tier, 1);
        assert_eq!(profile.urgency, Urgency::High);
        assert_eq!(profile.label, "UPCOMING_LIQUIDITY");
    }

    #[test]
    fn test_8k_personnel_tier1() {
        let mut filing = filing_with(FormClass::EightK, &[]);
        filing.is_personnel_event = true;
        let profile = classify(&filing);
        assert_eq!(profile.tier, 1);
        assert_eq!(
            profile.dimensions,
            vec![Dimension::Liquidity, Dimension::Capacity]
        );
    }

    #[test]
    fn test_default_tier3() {
        let filing = filing_with(FormClass::Other, &[]);
        let profile = classify(&filing);
        assert_eq!(profile.tier, 3);
        assert_eq!(profile.dimensions, vec![Dimension::Context]);
        assert_eq!(profile.urgency, Urgency::Low);
    }

    #[test]
    fn test_summary_composition() {
        let mut filing = filing_with(FormClass::Form4, &[("S", "2024-01-10")]);
        filing.header.form_type = Some("4".to_string());
        let mut issuer = edgarscout_filings::EntityIdentity::default();
        issuer.name = Some("Acme Corp".to_string());
        filing.header.issuer = Some(issuer);
        filing.alerts.push(FilingAlert::new(
            AlertKind::LargeSale,
            AlertSeverity::High,
            "Insider sale totaling $1,000",
        ));
        let summary = classify(&filing).summary;
        assert!(summary.starts_with("[4] Acme Corp"), "{}", summary);
        assert!(summary.contains("S: $1,000"), "{}", summary);
        assert!(summary.contains("Insider sale totaling"), "{}", summary);
    }
}
