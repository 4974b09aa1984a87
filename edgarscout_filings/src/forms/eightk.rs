//! Form 8-K parser: current reports on material events.
//!
//! Items from the envelope are classified into a closed category set; for
//! personnel events the body text is searched with a fixed pattern set for
//! the people involved, plus a nearby role title.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::tags::strip_html;
use crate::types::{
    AlertKind, AlertSeverity, FilingAlert, FilingHeader, FilingPerson, ParsedFiling, ParserUsed,
};

use super::FormParseError;

/// Item categories, keyed by keyword probes over the envelope item text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemCategory {
    Agreement,
    MergersAndAcquisitions,
    Earnings,
    Debt,
    Personnel,
    Governance,
    Disclosure,
    Exhibits,
    Other,
}

/// Keyword probes applied in order; first hit wins.
const ITEM_PROBES: &[(&str, ItemCategory)] = &[
    ("departure of directors", ItemCategory::Personnel),
    ("election of directors", ItemCategory::Personnel),
    ("appointment of certain officers", ItemCategory::Personnel),
    ("compensatory arrangements", ItemCategory::Personnel),
    ("completion of acquisition", ItemCategory::MergersAndAcquisitions),
    ("merger", ItemCategory::MergersAndAcquisitions),
    ("acquisition or disposition", ItemCategory::MergersAndAcquisitions),
    ("results of operations", ItemCategory::Earnings),
    ("financial condition", ItemCategory::Earnings),
    ("creation of a direct financial obligation", ItemCategory::Debt),
    ("off-balance sheet", ItemCategory::Debt),
    ("material definitive agreement", ItemCategory::Agreement),
    ("amendments to articles", ItemCategory::Governance),
    ("amendments to the registrant", ItemCategory::Governance),
    ("submission of matters to a vote", ItemCategory::Governance),
    ("change in shell company status", ItemCategory::Governance),
    ("regulation fd", ItemCategory::Disclosure),
    ("other events", ItemCategory::Disclosure),
    ("financial statements and exhibits", ItemCategory::Exhibits),
];

/// "appointed Jane Doe", "named Jane Q. Doe", ...
static APPOINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:appointed|hired|named|elected|promoted)\s+([A-Z][a-z'\-]+(?:\s+[A-Z]\.?)?\s+[A-Z][a-z'\-]+)",
    )
    .expect("appoint regex")
});

/// "resignation of Jane Doe", "departure of John Smith", ...
static DEPART_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:departure|resignation|retirement|termination)\s+of\s+([A-Z][a-z'\-]+(?:\s+[A-Z]\.?)?\s+[A-Z][a-z'\-]+)",
    )
    .expect("depart regex")
});

/// "Mr. Doe", "Dr. Jane Doe".
static HONORIFIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:Mr\.|Ms\.|Mrs\.|Dr\.)\s+([A-Z][a-z'\-]+(?:\s+[A-Z][a-z'\-]+)?)")
        .expect("honorific regex")
});

/// Role titles searched in the window around a harvested name.
static ROLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(chief executive officer|chief financial officer|chief operating officer|president|chairman|chairwoman|chair|director|executive vice president|senior vice president|vice president|general counsel|treasurer|secretary|ceo|cfo|coo|cto)\b",
    )
    .expect("role regex")
});

/// Window searched around a name for a role title, in chars.
const ROLE_WINDOW: usize = 300;

const MAX_PERSONS: usize = 20;

pub fn parse(header: &FilingHeader, raw: &str) -> Result<ParsedFiling, FormParseError> {
    let mut filing = ParsedFiling::from_header(header.clone());
    filing.parser_used = ParserUsed::EightK;

    let categories: Vec<ItemCategory> = header.items.iter().map(|i| classify_item(i)).collect();
    filing.is_personnel_event = categories.contains(&ItemCategory::Personnel);
    filing.is_ma_event = categories.contains(&ItemCategory::MergersAndAcquisitions);
    filing.is_earnings_event = categories.contains(&ItemCategory::Earnings);

    if filing.is_personnel_event {
        let text = strip_html(raw);
        harvest_personnel(&mut filing, &text);

        let issuer = header
            .filer
            .as_ref()
            .and_then(|f| f.name.as_deref())
            .unwrap_or("registrant");
        let detail = filing
            .persons
            .first()
            .map(|p| format!(": {}", p.name))
            .unwrap_or_default();
        filing.alerts.push(FilingAlert::new(
            AlertKind::PersonnelChange,
            AlertSeverity::High,
            format!("Officer/director change at {}{}", issuer, detail),
        ));
    }

    if filing.is_ma_event {
        filing.alerts.push(FilingAlert::new(
            AlertKind::MaEvent,
            AlertSeverity::High,
            "Merger or acquisition event reported".to_string(),
        ));
    }

    Ok(filing)
}

/// Classify one envelope item text.
pub fn classify_item(item: &str) -> ItemCategory {
    let lower = item.to_lowercase();
    for &(probe, category) in ITEM_PROBES {
        if lower.contains(probe) {
            return category;
        }
    }
    ItemCategory::Other
}

fn harvest_personnel(filing: &mut ParsedFiling, text: &str) {
    let mut seen: Vec<String> = Vec::new();
    for re in [&*APPOINT_RE, &*DEPART_RE, &*HONORIFIC_RE] {
        for caps in re.captures_iter(text) {
            if filing.persons.len() >= MAX_PERSONS {
                return;
            }
            let m = caps.get(1).expect("capture group");
            let name = m.as_str().trim().to_string();
            let key = name.to_lowercase();
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            let role = find_nearby_role(text, m.start(), m.end());
            filing.persons.push(FilingPerson {
                name,
                role,
                cik: None,
            });
        }
    }
}

/// Search the surrounding window for a role title.
fn find_nearby_role(text: &str, start: usize, end: usize) -> Option<String> {
    let from = floor_char_boundary(text, start.saturating_sub(ROLE_WINDOW));
    let to = floor_char_boundary(text, (end + ROLE_WINDOW).min(text.len()));
    ROLE_RE
        .find(&text[from..to])
        .map(|m| m.as_str().to_string())
}

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::extract_header;

    fn eightk_raw(items: &[&str], body: &str) -> String {
        let item_lines: String = items
            .iter()
            .map(|i| format!("ITEM INFORMATION:\t\t{}\n", i))
            .collect();
        format!(
            "<SEC-HEADER>\nCONFORMED SUBMISSION TYPE: 8-K\n{}\
             FILER:\n\tCOMPANY CONFORMED NAME: ACME CORP\n</SEC-HEADER>\n\
             <DOCUMENT><TEXT>{}</TEXT></DOCUMENT>",
            item_lines, body
        )
    }

    #[test]
    fn test_item_classification() {
        assert_eq!(
            classify_item("Departure of Directors or Certain Officers; Election of Directors"),
            ItemCategory::Personnel
        );
        assert_eq!(
            classify_item("Completion of Acquisition or Disposition of Assets"),
            ItemCategory::MergersAndAcquisitions
        );
        assert_eq!(
            classify_item("Results of Operations and Financial Condition"),
            ItemCategory::Earnings
        );
        assert_eq!(
            classify_item("Entry into a Material Definitive Agreement"),
            ItemCategory::Agreement
        );
        assert_eq!(
            classify_item("Regulation FD Disclosure"),
            ItemCategory::Disclosure
        );
        assert_eq!(
            classify_item("Financial Statements and Exhibits"),
            ItemCategory::Exhibits
        );
        assert_eq!(classify_item("Something novel"), ItemCategory::Other);
    }

    #[test]
    fn test_personnel_names_and_roles_harvested() {
        let raw = eightk_raw(
            &["Departure of Directors or Certain Officers"],
            "<p>On March 4, 2024, the Board appointed Sarah Chen as Chief Financial Officer, \
             effective immediately. The appointment follows the resignation of David Park.</p>",
        );
        let header = extract_header(&raw);
        let filing = parse(&header, &raw).unwrap();

        assert!(filing.is_personnel_event);
        let names: Vec<&str> = filing.persons.iter().map(|p| p.name.as_str()).collect();
        assert!(names.contains(&"Sarah Chen"), "{:?}", names);
        assert!(names.contains(&"David Park"), "{:?}", names);

        let chen = filing.persons.iter().find(|p| p.name == "Sarah Chen").unwrap();
        assert_eq!(
            chen.role.as_deref().map(|r| r.to_lowercase()),
            Some("chief financial officer".to_string())
        );

        assert!(filing
            .alerts
            .iter()
            .any(|a| a.kind == AlertKind::PersonnelChange && a.severity == AlertSeverity::High));
    }

    #[test]
    fn test_ma_event_flag_and_alert() {
        let raw = eightk_raw(
            &["Completion of Acquisition or Disposition of Assets"],
            "<p>Acme completed its merger with Target.</p>",
        );
        let header = extract_header(&raw);
        let filing = parse(&header, &raw).unwrap();
        assert!(filing.is_ma_event);
        assert!(!filing.is_personnel_event);
        assert!(filing.alerts.iter().any(|a| a.kind == AlertKind::MaEvent));
    }

    #[test]
    fn test_earnings_item_sets_flag_without_alert() {
        let raw = eightk_raw(
            &["Results of Operations and Financial Condition"],
            "<p>Quarterly results attached.</p>",
        );
        let header = extract_header(&raw);
        let filing = parse(&header, &raw).unwrap();
        assert!(filing.is_earnings_event);
        assert!(filing.alerts.is_empty());
    }
}
