//! Ownership-document parser: Forms 3, 4, and 5.
//!
//! All three forms share the embedded `ownershipDocument` XML schema. Form 3
//! reports initial holdings, Form 4 reports changes, Form 5 is the annual
//! catch-up; holdings dominate on Form 3 while transactions appear on 4/5.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::tags::{first_tag_text, tag_blocks, tag_bool, tag_number};
use crate::types::{
    AlertKind, AlertSeverity, FilingAlert, FilingHeader, FilingPerson, FilingTransaction,
    FormClass, ParsedFiling, ParserUsed,
};
use crate::{format_usd, tags};

use super::FormParseError;

/// Fixed transaction-code label table.
const CODE_LABELS: &[(&str, &str)] = &[
    ("S", "Sale"),
    ("P", "Purchase"),
    ("M", "Option Exercise"),
    ("G", "Gift"),
    ("A", "Award"),
    ("F", "Tax Withholding"),
    ("C", "Conversion"),
    ("D", "Disposition to Issuer"),
    ("J", "Other (J)"),
    ("I", "Discretionary (I)"),
    ("W", "Will/Inheritance"),
    ("Z", "Voting Trust"),
];

static CODE_LABEL_MAP: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| CODE_LABELS.iter().copied().collect());

/// Human label for a transaction code; unknown codes echo the code itself.
pub fn code_label(code: &str) -> String {
    CODE_LABEL_MAP
        .get(code)
        .map(|l| l.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Sale-proceeds alert thresholds.
const LARGE_SALE_HIGH: f64 = 1_000_000.0;
const LARGE_SALE_MEDIUM: f64 = 100_000.0;

pub fn parse(header: &FilingHeader, raw: &str) -> Result<ParsedFiling, FormParseError> {
    let xml = tags::embedded_xml(raw).ok_or(FormParseError::MissingXml)?;

    let mut filing = ParsedFiling::from_header(header.clone());
    filing.parser_used = ParserUsed::Ownership;

    // Issuer identity from the document beats the envelope: it carries the
    // trading symbol.
    if let Some(issuer_block) = tag_blocks(xml, "issuer").first() {
        let mut issuer = header.issuer.clone().unwrap_or_default();
        if let Some(name) = first_tag_text(issuer_block, "issuerName") {
            issuer.name = Some(name);
        }
        if let Some(cik) = first_tag_text(issuer_block, "issuerCik") {
            issuer.cik = Some(cik);
        }
        issuer.ticker = first_tag_text(issuer_block, "issuerTradingSymbol");
        filing.header.issuer = Some(issuer);
    }

    for owner_block in tag_blocks(xml, "reportingOwner") {
        if let Some(person) = parse_owner(owner_block) {
            filing.persons.push(person);
        }
    }

    filing.has_10b5_1_plan = tag_bool(xml, "aff10b5One");

    for block in tag_blocks(xml, "nonDerivativeTransaction") {
        filing.transactions.push(parse_transaction(block, false));
    }
    for block in tag_blocks(xml, "derivativeTransaction") {
        filing.transactions.push(parse_transaction(block, true));
    }
    for block in tag_blocks(xml, "nonDerivativeHolding") {
        filing.transactions.push(parse_holding(block, false));
    }
    for block in tag_blocks(xml, "derivativeHolding") {
        filing.transactions.push(parse_holding(block, true));
    }

    generate_alerts(&mut filing);
    Ok(filing)
}

fn parse_owner(block: &str) -> Option<FilingPerson> {
    let name = first_tag_text(block, "rptOwnerName")?;
    let cik = first_tag_text(block, "rptOwnerCik");

    let is_director = tag_bool(block, "isDirector");
    let is_officer = tag_bool(block, "isOfficer");
    let is_ten_pct = tag_bool(block, "isTenPercentOwner");
    let is_other = tag_bool(block, "isOther");
    let officer_title = first_tag_text(block, "officerTitle");
    let other_text = first_tag_text(block, "otherText");

    let mut roles = Vec::new();
    if is_director {
        roles.push("Director".to_string());
    }
    if is_officer {
        match &officer_title {
            Some(title) => roles.push(format!("Officer: {}", title)),
            None => roles.push("Officer".to_string()),
        }
    }
    if is_ten_pct {
        roles.push("10% Owner".to_string());
    }
    if is_other {
        match &other_text {
            Some(text) => roles.push(format!("Other: {}", text)),
            None => roles.push("Other".to_string()),
        }
    }

    Some(FilingPerson {
        name,
        role: if roles.is_empty() {
            None
        } else {
            Some(roles.join(", "))
        },
        cik,
    })
}

fn parse_transaction(block: &str, derivative: bool) -> FilingTransaction {
    let code = first_tag_text(block, "transactionCode");
    let shares = tag_number(block, "transactionShares");
    let price = tag_number(block, "transactionPricePerShare");
    let acquired = first_tag_text(block, "transactionAcquiredDisposedCode")
        .map(|c| c.eq_ignore_ascii_case("A"));

    let mut tx = FilingTransaction {
        code_label: code.as_deref().map(code_label).unwrap_or_default(),
        code,
        shares,
        price,
        value: match (shares, price) {
            (Some(s), Some(p)) => Some(s * p),
            _ => None,
        },
        date: first_tag_text(block, "transactionDate"),
        acquired,
        security_title: first_tag_text(block, "securityTitle"),
        post_shares: tag_number(block, "sharesOwnedFollowingTransaction"),
        ownership: first_tag_text(block, "directOrIndirectOwnership"),
        derivative,
        ..Default::default()
    };

    if derivative {
        tx.underlying_title = first_tag_text(block, "underlyingSecurityTitle");
        tx.underlying_shares = tag_number(block, "underlyingSecurityShares");
        tx.exercise_price = tag_number(block, "conversionOrExercisePrice");
        tx.exercise_date = first_tag_text(block, "exerciseDate");
        tx.expiration_date = first_tag_text(block, "expirationDate");
    }
    tx
}

/// Holdings carry no transaction code or price; only the position.
fn parse_holding(block: &str, derivative: bool) -> FilingTransaction {
    FilingTransaction {
        security_title: first_tag_text(block, "securityTitle"),
        post_shares: tag_number(block, "sharesOwnedFollowingTransaction"),
        ownership: first_tag_text(block, "directOrIndirectOwnership"),
        derivative,
        underlying_title: if derivative {
            first_tag_text(block, "underlyingSecurityTitle")
        } else {
            None
        },
        ..Default::default()
    }
}

fn generate_alerts(filing: &mut ParsedFiling) {
    let mut alerts = Vec::new();

    let gift_total: f64 = filing
        .transactions
        .iter()
        .filter(|t| t.code.as_deref() == Some("G"))
        .filter_map(|t| t.shares.map(|s| s * t.price.unwrap_or(0.0)))
        .sum();
    let has_gift = filing
        .transactions
        .iter()
        .any(|t| t.code.as_deref() == Some("G"));
    if has_gift {
        alerts.push(FilingAlert::new(
            AlertKind::PhilanthropySignal,
            AlertSeverity::High,
            format!("Stock gift detected totaling {}", format_usd(gift_total)),
        ));
    }

    // Exercise and sale sharing any transaction date.
    let exercise_dates: Vec<&str> = filing
        .transactions
        .iter()
        .filter(|t| t.code.as_deref() == Some("M"))
        .filter_map(|t| t.date.as_deref())
        .collect();
    let same_day_sale = filing
        .transactions
        .iter()
        .filter(|t| t.code.as_deref() == Some("S"))
        .filter_map(|t| t.date.as_deref())
        .any(|d| exercise_dates.contains(&d));
    if same_day_sale {
        alerts.push(FilingAlert::new(
            AlertKind::SameDaySale,
            AlertSeverity::High,
            format!(
                "Same-day exercise and sale totaling {}",
                format_usd(filing.sale_total())
            ),
        ));
    }

    let sale_total = filing.sale_total();
    if sale_total > LARGE_SALE_HIGH {
        alerts.push(FilingAlert::new(
            AlertKind::LargeSale,
            AlertSeverity::High,
            format!("Insider sale totaling {}", format_usd(sale_total)),
        ));
    } else if sale_total > LARGE_SALE_MEDIUM {
        alerts.push(FilingAlert::new(
            AlertKind::LargeSale,
            AlertSeverity::Medium,
            format!("Insider sale totaling {}", format_usd(sale_total)),
        ));
    }

    if filing.header.form_class == FormClass::Form3 {
        let issuer = filing
            .header
            .issuer
            .as_ref()
            .and_then(|i| i.name.as_deref())
            .unwrap_or("issuer");
        alerts.push(FilingAlert::new(
            AlertKind::NewInsider,
            AlertSeverity::Info,
            format!("New insider position reported at {}", issuer),
        ));
    }

    filing.alerts = alerts;
}
