//! Envelope header extraction.
//!
//! Every EDGAR filing opens with a line-oriented `<SEC-HEADER>` envelope of
//! `FIELD: value` pairs plus indented identity blocks (`FILER:`, `ISSUER:`,
//! `REPORTING-OWNER:`, `SUBJECT COMPANY:`). A filing without a recognizable
//! envelope produces an empty header, never an error.

use chrono::NaiveDate;
use memchr::memmem;

use crate::types::{EntityIdentity, FilingHeader, FormClass};

/// Identity block labels, matched against whole header lines.
const BLOCK_LABELS: &[(&str, Block)] = &[
    ("FILER:", Block::Filer),
    ("FILED BY:", Block::Filer),
    ("ISSUER:", Block::Issuer),
    ("REPORTING-OWNER:", Block::ReportingOwner),
    ("SUBJECT COMPANY:", Block::SubjectCompany),
];

#[derive(Clone, Copy, PartialEq)]
enum Block {
    None,
    Filer,
    Issuer,
    ReportingOwner,
    SubjectCompany,
}

/// Extract envelope metadata from a raw filing.
pub fn extract_header(raw: &str) -> FilingHeader {
    let envelope = match envelope_span(raw) {
        Some(span) => span,
        None => return FilingHeader::default(),
    };

    let mut header = FilingHeader::default();
    let mut block = Block::None;
    let mut filer = EntityIdentity::default();
    let mut issuer = EntityIdentity::default();
    let mut owner = EntityIdentity::default();
    let mut subject = EntityIdentity::default();

    for line in envelope.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(&(_, b)) = BLOCK_LABELS.iter().find(|(label, _)| trimmed == *label) {
            block = b;
            continue;
        }

        // Acceptance datetime appears in tag form rather than FIELD: value.
        if let Some(rest) = trimmed.strip_prefix("<ACCEPTANCE-DATETIME>") {
            header.accepted_at = non_empty(rest);
            continue;
        }

        let (field, value) = match trimmed.split_once(':') {
            Some((f, v)) => (f.trim(), v.trim()),
            None => continue,
        };
        if value.is_empty() && field != "ITEM INFORMATION" {
            continue;
        }

        match block {
            Block::None => apply_top_level(&mut header, field, value),
            Block::Filer => apply_identity(&mut filer, field, value),
            Block::Issuer => apply_identity(&mut issuer, field, value),
            Block::ReportingOwner => apply_identity(&mut owner, field, value),
            Block::SubjectCompany => apply_identity(&mut subject, field, value),
        }
    }

    header.filer = some_if_populated(filer);
    header.issuer = some_if_populated(issuer);
    header.reporting_owner = some_if_populated(owner);
    header.subject_company = some_if_populated(subject);
    header
}

/// The `<SEC-HEADER>` section, or the document prefix up to the first
/// `<DOCUMENT>` when the closing tag is missing.
fn envelope_span(raw: &str) -> Option<&str> {
    let bytes = raw.as_bytes();
    let start = memmem::find(bytes, b"<SEC-HEADER>")? + "<SEC-HEADER>".len();
    let rest = &raw[start..];
    match memmem::find(rest.as_bytes(), b"</SEC-HEADER>") {
        Some(end) => Some(&rest[..end]),
        None => match memmem::find(rest.as_bytes(), b"<DOCUMENT>") {
            Some(end) => Some(&rest[..end]),
            None => Some(rest),
        },
    }
}

fn apply_top_level(header: &mut FilingHeader, field: &str, value: &str) {
    match field {
        "ACCESSION NUMBER" => header.accession_number = non_empty(value),
        "CONFORMED SUBMISSION TYPE" => {
            header.form_type = non_empty(value);
            header.form_class = FormClass::classify(value);
        }
        "FILED AS OF DATE" => header.filed_date = parse_date(value),
        "CONFORMED PERIOD OF REPORT" => header.period_of_report = parse_date(value),
        "ACCEPTANCE-DATETIME" => header.accepted_at = non_empty(value),
        "ITEM INFORMATION" => {
            if !value.is_empty() {
                header.items.push(value.to_string());
            }
        }
        _ => {}
    }
}

fn apply_identity(entity: &mut EntityIdentity, field: &str, value: &str) {
    match field {
        "COMPANY CONFORMED NAME" | "CONFORMED NAME" => {
            if entity.name.is_none() {
                entity.name = non_empty(value);
            }
        }
        "CENTRAL INDEX KEY" => {
            if entity.cik.is_none() {
                entity.cik = non_empty(value);
            }
        }
        "STANDARD INDUSTRIAL CLASSIFICATION" => entity.sic = non_empty(value),
        "STATE OF INCORPORATION" => entity.state = non_empty(value),
        "IRS NUMBER" => entity.ein = non_empty(value),
        _ => {}
    }
}

/// Lenient envelope date parsing: `yyyymmdd` as filed, `yyyy-mm-dd` as a
/// fallback. Unparseable values stay `None`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let v = value.trim();
    NaiveDate::parse_from_str(v, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(v, "%Y-%m-%d"))
        .ok()
}

fn non_empty(value: &str) -> Option<String> {
    let v = value.trim();
    if v.is_empty() {
        None
    } else {
        Some(v.to_string())
    }
}

fn some_if_populated(entity: EntityIdentity) -> Option<EntityIdentity> {
    if entity.name.is_some() || entity.cik.is_some() {
        Some(entity)
    } else {
        None
    }
}
