//! Canonical filing types shared by the parsers and the matching engine.

mod filing;
mod header;

pub use filing::{
    AlertKind, AlertSeverity, FilingAlert, FilingPerson, FilingTransaction, Holding13F,
    ParsedFiling, ParserUsed,
};
pub use header::{EntityIdentity, FilingHeader, FormClass};
