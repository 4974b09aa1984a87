//! Generic parser: envelope only.
//!
//! Used for unrecognized forms and as the fallback when a form parser fails.
//! Persons stay empty; the text-matching engine supplies all identity
//! evidence for these filings.

use crate::types::{FilingHeader, ParsedFiling, ParserUsed};

pub fn parse(header: FilingHeader) -> ParsedFiling {
    let mut filing = ParsedFiling::from_header(header);
    filing.parser_used = ParserUsed::Generic;
    filing
}
