//! Form-type router: dispatch a raw filing to its parser.
//!
//! Parser failures never abort a run. A parser that returns an error falls
//! through to the generic parser with `parse_error` recorded, matching the
//! envelope-only behavior for unknown forms.

use thiserror::Error;

use crate::header::extract_header;
use crate::types::{FormClass, ParsedFiling};

pub mod eightk;
pub mod form144;
pub mod formd;
pub mod generic;
pub mod ownership;
pub mod proxy;
pub mod schedule13;
pub mod thirteenf;

/// Errors surfaced by individual form parsers. All are recoverable: the
/// router downgrades them to a generic parse with `parse_error` set.
#[derive(Error, Debug)]
pub enum FormParseError {
    #[error("no embedded XML document found")]
    MissingXml,
    #[error("required tag missing: {0}")]
    MissingTag(&'static str),
}

/// Parse a raw filing into the canonical record.
pub fn parse_filing(raw: &str) -> ParsedFiling {
    let header = extract_header(raw);

    let result = match header.form_class {
        FormClass::Form3 | FormClass::Form4 | FormClass::Form5 => ownership::parse(&header, raw),
        FormClass::Form144 => form144::parse(&header, raw),
        FormClass::FormD => formd::parse(&header, raw),
        FormClass::EightK => eightk::parse(&header, raw),
        FormClass::Sc13D | FormClass::Sc13G => schedule13::parse(&header, raw),
        FormClass::ThirteenF => thirteenf::parse(&header, raw),
        FormClass::Def14A => proxy::parse(&header, raw),
        _ => return generic::parse(header),
    };

    match result {
        Ok(filing) => filing,
        Err(e) => {
            tracing::warn!(
                accession = header.accession_number.as_deref().unwrap_or("?"),
                form = %header.form_class,
                "form parser failed, falling back to generic: {}",
                e
            );
            let mut filing = generic::parse(header);
            filing.parse_error = Some(e.to_string());
            filing
        }
    }
}
