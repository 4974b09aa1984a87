//! 13F-HR / 13F-NT parser: institutional manager holdings.
//!
//! Sums the information-table values, keeps the top-10 positions, and records
//! the filer as an institutional manager. The AUM figure is fund capital,
//! never an individual's wealth; the record is permanently flagged to keep
//! downstream consumers from attributing it.

use crate::format_usd_compact;
use crate::tags::{first_tag_text, tag_blocks, tag_number};
use crate::types::{
    AlertKind, AlertSeverity, FilingAlert, FilingHeader, FilingPerson, Holding13F, ParsedFiling,
    ParserUsed,
};

use super::FormParseError;

const TOP_HOLDINGS: usize = 10;

pub fn parse(header: &FilingHeader, raw: &str) -> Result<ParsedFiling, FormParseError> {
    let mut filing = ParsedFiling::from_header(header.clone());
    filing.parser_used = ParserUsed::ThirteenF;
    filing.aum_not_personal_wealth = true;

    let manager = header
        .filer
        .as_ref()
        .and_then(|f| f.name.clone())
        .unwrap_or_else(|| "Unknown manager".to_string());

    if header.filer.is_some() {
        filing.persons.push(FilingPerson {
            name: manager.clone(),
            role: Some("Institutional Manager".to_string()),
            cik: header.filer.as_ref().and_then(|f| f.cik.clone()),
        });
    }

    let mut holdings: Vec<Holding13F> = Vec::new();
    let mut total_value = 0.0;
    for block in tag_blocks(raw, "infoTable") {
        let value = match tag_number(block, "value") {
            Some(v) => v,
            None => continue,
        };
        total_value += value;
        holdings.push(Holding13F {
            issuer: first_tag_text(block, "nameOfIssuer").unwrap_or_default(),
            class_title: first_tag_text(block, "titleOfClass"),
            value,
            shares: tag_number(block, "sshPrnamt"),
        });
    }

    holdings.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
    holdings.truncate(TOP_HOLDINGS);
    filing.top_holdings = holdings;

    filing.alerts.push(FilingAlert::new(
        AlertKind::FundManager,
        AlertSeverity::Info,
        format!(
            "Institutional manager {} reports {} AUM (AUM \u{2260} personal wealth)",
            manager,
            format_usd_compact(total_value)
        ),
    ));

    Ok(filing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::extract_header;

    fn info_table(issuer: &str, value: u64) -> String {
        format!(
            "<infoTable><nameOfIssuer>{}</nameOfIssuer><titleOfClass>COM</titleOfClass>\
             <value>{}</value><shrsOrPrnAmt><sshPrnamt>100</sshPrnamt></shrsOrPrnAmt></infoTable>",
            issuer, value
        )
    }

    fn raw_13f(tables: &str) -> String {
        format!(
            "<SEC-HEADER>\nCONFORMED SUBMISSION TYPE: 13F-HR\n\
             FILER:\n\tCOMPANY CONFORMED NAME: Example Advisors LLC\n\tCENTRAL INDEX KEY: 0007777777\n\
             </SEC-HEADER>\n<DOCUMENT><TEXT><XML><informationTable>{}</informationTable></XML></TEXT></DOCUMENT>",
            tables
        )
    }

    #[test]
    fn test_aum_summed_and_flagged() {
        let tables = format!(
            "{}{}",
            info_table("BIG TECH INC", 1_500_000_000),
            info_table("SMALL CAP CO", 500_000_000)
        );
        let raw = raw_13f(&tables);
        let header = extract_header(&raw);
        let filing = parse(&header, &raw).unwrap();

        assert!(filing.aum_not_personal_wealth);
        assert_eq!(filing.top_holdings.len(), 2);
        assert_eq!(filing.top_holdings[0].issuer, "BIG TECH INC");

        let alert = &filing.alerts[0];
        assert_eq!(alert.kind, AlertKind::FundManager);
        assert_eq!(alert.severity, AlertSeverity::Info);
        assert!(alert.message.contains("$2.0B"), "{}", alert.message);
        assert!(alert.message.contains("personal wealth"));
    }

    #[test]
    fn test_top_holdings_capped_at_ten() {
        let tables: String = (0..15)
            .map(|i| info_table(&format!("ISSUER {}", i), 1_000_000 + i))
            .collect();
        let raw = raw_13f(&tables);
        let header = extract_header(&raw);
        let filing = parse(&header, &raw).unwrap();
        assert_eq!(filing.top_holdings.len(), 10);
        // Sorted descending by value.
        assert_eq!(filing.top_holdings[0].issuer, "ISSUER 14");
    }

    #[test]
    fn test_manager_recorded_as_person() {
        let raw = raw_13f(&info_table("X", 1));
        let header = extract_header(&raw);
        let filing = parse(&header, &raw).unwrap();
        assert_eq!(filing.persons.len(), 1);
        assert_eq!(filing.persons[0].name, "Example Advisors LLC");
        assert_eq!(filing.persons[0].role.as_deref(), Some("Institutional Manager"));
    }
}
