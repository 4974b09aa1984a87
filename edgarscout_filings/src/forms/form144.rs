//! Form 144 parser: notice of proposed sale of restricted securities.
//!
//! Modern 144s carry an embedded XML document; older ones are free text. The
//! parser pulls the proposed share count, aggregate market value, broker, and
//! acquisition details, and emits one synthetic sale transaction so the
//! signal layer sees the upcoming liquidity.

use crate::format_usd;
use crate::tags::{self, first_tag_text_any, parse_number};
use crate::types::{
    AlertKind, AlertSeverity, FilingAlert, FilingHeader, FilingPerson, FilingTransaction,
    ParsedFiling, ParserUsed,
};

use super::FormParseError;

pub fn parse(header: &FilingHeader, raw: &str) -> Result<ParsedFiling, FormParseError> {
    let mut filing = ParsedFiling::from_header(header.clone());
    filing.parser_used = ParserUsed::Form144;

    // Prefer the embedded XML; fall back to scanning the whole body so
    // legacy text 144s still yield the dollar figure.
    let scope = tags::embedded_xml(raw).unwrap_or(raw);

    let shares = first_tag_text_any(
        scope,
        &["noUnitsSold", "sharesToBeSold", "amountOfSecuritiesToBeSold"],
    )
    .and_then(|t| parse_number(&t));
    let market_value = first_tag_text_any(
        scope,
        &["marketValue", "aggregateMarketValue", "aggregateMarketValueOfSecuritiesToBeSold"],
    )
    .and_then(|t| parse_number(&t));
    let broker = first_tag_text_any(scope, &["brokerName", "nameOfBroker", "brokerOrMarketmakerDetails"]);
    let acquired_date = first_tag_text_any(scope, &["acquiredDate", "dateOfAcquisition"]);
    let nature = first_tag_text_any(scope, &["natureOfAcquisitionTransaction", "natureOfAcquisition"]);

    let seller = first_tag_text_any(
        scope,
        &["nameOfPersonForWhoseAccountTheSecuritiesAreToBeSold", "issuerName"],
    )
    .or_else(|| {
        header
            .reporting_owner
            .as_ref()
            .or(header.filer.as_ref())
            .and_then(|e| e.name.clone())
    });

    if let Some(name) = seller {
        filing.persons.push(FilingPerson {
            name,
            role: Some("Selling Security Holder".to_string()),
            cik: header.reporting_owner.as_ref().and_then(|e| e.cik.clone()),
        });
    }

    let mut remarks = Vec::new();
    if let Some(b) = &broker {
        remarks.push(format!("via {}", b));
    }
    if let Some(d) = &acquired_date {
        remarks.push(format!("acquired {}", d));
    }
    if let Some(n) = &nature {
        remarks.push(n.clone());
    }

    filing.transactions.push(FilingTransaction {
        code: Some("S".to_string()),
        code_label: "Proposed Sale (Form 144)".to_string(),
        shares,
        value: market_value,
        date: header.filed_date.map(|d| d.to_string()),
        acquired: Some(false),
        security_title: if remarks.is_empty() {
            None
        } else {
            Some(remarks.join("; "))
        },
        ..Default::default()
    });

    filing.alerts.push(FilingAlert::new(
        AlertKind::UpcomingSale,
        AlertSeverity::High,
        match market_value {
            Some(v) => format!("Proposed insider sale of {}", format_usd(v)),
            None => "Proposed insider sale filed".to_string(),
        },
    ));

    Ok(filing)
}
