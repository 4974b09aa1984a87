//! Schedule 13D/13G parser: 5%+ beneficial ownership.
//!
//! Identity comes from the envelope (subject company + filing person); the
//! ownership percentage and share count are harvested from the first
//! plausible occurrence in the body text.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::tags::strip_html;
use crate::types::{
    AlertKind, AlertSeverity, FilingAlert, FilingHeader, FilingPerson, FilingTransaction,
    FormClass, ParsedFiling, ParserUsed,
};

use super::FormParseError;

static PERCENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*%").expect("percent regex"));
static SHARES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,3}(?:,\d{3})+)\s*[Ss]hares").expect("shares regex"));

pub fn parse(header: &FilingHeader, raw: &str) -> Result<ParsedFiling, FormParseError> {
    let mut filing = ParsedFiling::from_header(header.clone());
    filing.parser_used = ParserUsed::Schedule13;

    if let Some(filer) = header.filer.as_ref().or(header.reporting_owner.as_ref()) {
        if let Some(name) = &filer.name {
            filing.persons.push(FilingPerson {
                name: name.clone(),
                role: Some("Beneficial Owner".to_string()),
                cik: filer.cik.clone(),
            });
        }
    }

    let text = strip_html(raw);
    let percent = PERCENT_RE
        .captures_iter(&text)
        .filter_map(|c| c[1].parse::<f64>().ok())
        .find(|p| *p > 0.0 && *p <= 100.0);
    let shares = SHARES_RE
        .captures_iter(&text)
        .filter_map(|c| c[1].replace(',', "").parse::<f64>().ok())
        .next();

    if percent.is_some() || shares.is_some() {
        filing.transactions.push(FilingTransaction {
            code_label: match percent {
                Some(p) => format!("Beneficial Ownership {:.1}%", p),
                None => "Beneficial Ownership".to_string(),
            },
            shares,
            acquired: Some(true),
            security_title: filing
                .header
                .subject_company
                .as_ref()
                .and_then(|c| c.name.clone()),
            ..Default::default()
        });
    }

    if header.form_class == FormClass::Sc13D {
        let subject = header
            .subject_company
            .as_ref()
            .and_then(|c| c.name.as_deref())
            .unwrap_or("subject company");
        filing.alerts.push(FilingAlert::new(
            AlertKind::ActivistOwnership,
            AlertSeverity::High,
            match percent {
                Some(p) => format!("Active {:.1}% ownership position in {}", p, subject),
                None => format!("Active ownership position in {}", subject),
            },
        ));
    }

    Ok(filing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::extract_header;

    fn sc13d_raw(body: &str) -> String {
        format!(
            "<SEC-HEADER>\nCONFORMED SUBMISSION TYPE: SC 13D\n\
             SUBJECT COMPANY:\n\tCOMPANY CONFORMED NAME: TARGET INC\n\tCENTRAL INDEX KEY: 0005555555\n\
             FILED BY:\n\tCOMPANY CONFORMED NAME: CARSON HOLDINGS LP\n\tCENTRAL INDEX KEY: 0006666666\n\
             </SEC-HEADER>\n<DOCUMENT><TEXT>{}</TEXT></DOCUMENT>",
            body
        )
    }

    #[test]
    fn test_percent_and_shares_harvested() {
        let raw = sc13d_raw("The Reporting Person beneficially owns 7.2% of the class, representing 1,250,000 shares of Common Stock.");
        let header = extract_header(&raw);
        let filing = parse(&header, &raw).unwrap();

        assert_eq!(filing.persons[0].name, "CARSON HOLDINGS LP");
        let tx = &filing.transactions[0];
        assert_eq!(tx.shares, Some(1_250_000.0));
        assert!(tx.code_label.contains("7.2%"));

        let alert = &filing.alerts[0];
        assert_eq!(alert.kind, AlertKind::ActivistOwnership);
        assert!(alert.message.contains("TARGET INC"));
    }

    #[test]
    fn test_implausible_percent_skipped() {
        let raw = sc13d_raw("Rule 240.13d-1 requires 110% compliance; holder owns 5.5% of shares outstanding.");
        let header = extract_header(&raw);
        let filing = parse(&header, &raw).unwrap();
        assert!(filing.transactions[0].code_label.contains("5.5%"));
    }

    #[test]
    fn test_13g_emits_no_activist_alert() {
        let raw = sc13d_raw("owns 6.0% passive stake").replace("SC 13D", "SC 13G");
        let header = extract_header(&raw);
        let filing = parse(&header, &raw).unwrap();
        assert!(filing.alerts.is_empty());
    }
}
