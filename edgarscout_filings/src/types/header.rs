//! Envelope header types: filing identity and the normalized form class.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Normalized form family used for routing and signal classification.
///
/// Raw EDGAR submission types (including amendments) collapse into one of
/// these classes; anything unrecognized lands in [`FormClass::Other`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormClass {
    /// Form 3 — initial statement of beneficial ownership.
    Form3,
    /// Form 4 (or 4/A) — changes in beneficial ownership.
    Form4,
    /// Form 5 — annual statement of beneficial ownership.
    Form5,
    /// Form 144 — notice of proposed sale of restricted securities.
    Form144,
    /// Form 8-K — current report on material events.
    EightK,
    /// Schedule 13D — active 5%+ beneficial ownership.
    Sc13D,
    /// Schedule 13G — passive 5%+ beneficial ownership.
    Sc13G,
    /// Form 13F-HR / 13F-NT — institutional manager holdings.
    ThirteenF,
    /// DEF 14A and the definitive/preliminary proxy variants.
    Def14A,
    /// Form D — notice of exempt private offering.
    FormD,
    /// Registration statements: S-1, F-1, S-4, F-4, 424B prospectuses.
    Registration,
    /// Periodic reports: 10-K, 10-Q.
    Periodic,
    /// Foreign private issuer reports: 20-F, 6-K, 40-F.
    Foreign,
    /// Tender offers and going-private filings: SC TO*, SC 13E*.
    Tender,
    /// Everything else.
    Other,
}

impl FormClass {
    /// Map a raw conformed submission type to its normalized class.
    ///
    /// The mapping is closed: amendments (`/A` suffixes) classify with their
    /// base form, and unknown types return [`FormClass::Other`].
    pub fn classify(raw: &str) -> FormClass {
        let t = raw.trim().to_ascii_uppercase();
        let base = t.strip_suffix("/A").unwrap_or(&t).trim_end();
        match base {
            "4" => FormClass::Form4,
            "3" => FormClass::Form3,
            "5" => FormClass::Form5,
            "144" => FormClass::Form144,
            "D" => FormClass::FormD,
            "10-K" | "10-Q" => FormClass::Periodic,
            "20-F" | "6-K" | "40-F" => FormClass::Foreign,
            "S-1" | "F-1" | "S-4" | "F-4" => FormClass::Registration,
            "DEF 14A" | "DEFA14A" | "DEFC14A" | "DEFM14A" | "PRE 14A" | "PRE14A" | "PREM14A" => {
                FormClass::Def14A
            }
            _ => {
                if base.starts_with("8-K") {
                    FormClass::EightK
                } else if base.starts_with("SC 13D") || base.starts_with("SC13D") {
                    FormClass::Sc13D
                } else if base.starts_with("SC 13G") || base.starts_with("SC13G") {
                    FormClass::Sc13G
                } else if base.starts_with("13F-HR") || base.starts_with("13F-NT") {
                    FormClass::ThirteenF
                } else if base.starts_with("424B") {
                    FormClass::Registration
                } else if base.starts_with("SC TO") || base.starts_with("SC 13E") {
                    FormClass::Tender
                } else {
                    FormClass::Other
                }
            }
        }
    }

    /// Short display label (used in summaries and output rows).
    pub fn label(&self) -> &'static str {
        match self {
            FormClass::Form3 => "FORM3",
            FormClass::Form4 => "FORM4",
            FormClass::Form5 => "FORM5",
            FormClass::Form144 => "FORM144",
            FormClass::EightK => "8K",
            FormClass::Sc13D => "SC13D",
            FormClass::Sc13G => "SC13G",
            FormClass::ThirteenF => "13F",
            FormClass::Def14A => "DEF14A",
            FormClass::FormD => "FORMD",
            FormClass::Registration => "REGISTRATION",
            FormClass::Periodic => "PERIODIC",
            FormClass::Foreign => "FOREIGN",
            FormClass::Tender => "TENDER",
            FormClass::Other => "OTHER",
        }
    }
}

impl Default for FormClass {
    fn default() -> Self {
        FormClass::Other
    }
}

impl std::fmt::Display for FormClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One identity block from the envelope (FILER, ISSUER, REPORTING-OWNER,
/// SUBJECT COMPANY). Fields absent from the envelope stay `None`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct EntityIdentity {
    pub name: Option<String>,
    pub cik: Option<String>,
    pub sic: Option<String>,
    pub state: Option<String>,
    pub ein: Option<String>,
    /// Trading symbol; never present in the envelope itself, filled in by
    /// form parsers that carry one (e.g. the ownership document).
    pub ticker: Option<String>,
}

/// Envelope metadata preceding every EDGAR filing body.
///
/// A filing without a recognizable `<SEC-HEADER>` yields the default value
/// (all fields empty) rather than an error.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct FilingHeader {
    pub accession_number: Option<String>,
    /// Raw conformed submission type as filed (e.g. `"4/A"`, `"SC 13D"`).
    pub form_type: Option<String>,
    /// Normalized form family derived from `form_type`.
    pub form_class: FormClass,
    pub filed_date: Option<NaiveDate>,
    pub period_of_report: Option<NaiveDate>,
    /// Raw acceptance datetime string (`yyyymmddhhmmss`).
    pub accepted_at: Option<String>,
    /// 8-K item texts from the envelope, zero or more.
    pub items: Vec<String>,
    pub filer: Option<EntityIdentity>,
    pub issuer: Option<EntityIdentity>,
    pub reporting_owner: Option<EntityIdentity>,
    pub subject_company: Option<EntityIdentity>,
}

impl FilingHeader {
    /// True when the raw form type carries an `/A` amendment suffix.
    pub fn is_amendment(&self) -> bool {
        self.form_type
            .as_deref()
            .map(|t| t.trim_end().ends_with("/A"))
            .unwrap_or(false)
    }

    /// Best available issuer-side identity: issuer, else subject company,
    /// else filer.
    pub fn primary_company(&self) -> Option<&EntityIdentity> {
        self.issuer
            .as_ref()
            .or(self.subject_company.as_ref())
            .or(self.filer.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_ownership_forms() {
        assert_eq!(FormClass::classify("4"), FormClass::Form4);
        assert_eq!(FormClass::classify("4/A"), FormClass::Form4);
        assert_eq!(FormClass::classify("3"), FormClass::Form3);
        assert_eq!(FormClass::classify("5"), FormClass::Form5);
    }

    #[test]
    fn test_classify_prefixed_forms() {
        assert_eq!(FormClass::classify("8-K"), FormClass::EightK);
        assert_eq!(FormClass::classify("8-K/A"), FormClass::EightK);
        assert_eq!(FormClass::classify("SC 13D/A"), FormClass::Sc13D);
        assert_eq!(FormClass::classify("SC 13G"), FormClass::Sc13G);
        assert_eq!(FormClass::classify("13F-HR"), FormClass::ThirteenF);
        assert_eq!(FormClass::classify("13F-NT"), FormClass::ThirteenF);
        assert_eq!(FormClass::classify("424B5"), FormClass::Registration);
        assert_eq!(FormClass::classify("SC TO-T"), FormClass::Tender);
        assert_eq!(FormClass::classify("SC 13E3"), FormClass::Tender);
    }

    #[test]
    fn test_classify_proxy_family() {
        for t in ["DEF 14A", "DEFA14A", "DEFC14A", "DEFM14A", "PRE 14A", "PREM14A"] {
            assert_eq!(FormClass::classify(t), FormClass::Def14A, "{}", t);
        }
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(FormClass::classify("N-CSR"), FormClass::Other);
        assert_eq!(FormClass::classify(""), FormClass::Other);
    }

    #[test]
    fn test_is_amendment() {
        let mut h = FilingHeader::default();
        h.form_type = Some("4/A".to_string());
        assert!(h.is_amendment());
        h.form_type = Some("4".to_string());
        assert!(!h.is_amendment());
    }
}
