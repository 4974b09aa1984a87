//! Library layer for EdgarScout: prospect-to-filing matching over SEC EDGAR.
//!
//! Builds an immutable prospect index and multi-pattern automaton once, then
//! scans filings in parallel: form-aware structured matching fused with
//! adaptive-validated text matching, risk-scored and signal-classified into
//! match records.

pub mod checkpoint;
pub mod engine;
pub mod index;
pub mod matcher;
pub mod normalize;
pub mod pipeline;
pub mod prospect;
pub mod record;
pub mod risk;
pub mod signal;
pub mod stats;
pub mod validate;

pub use edgarscout_filings;
pub use edgarscout_filings::{
    AlertKind, AlertSeverity, FilingHeader, FormClass, ParsedFiling, ParserUsed,
};

pub use checkpoint::{Checkpoint, CheckpointError, CHECKPOINT_FILE};
pub use engine::{NormalizedBody, PatternEngine, PatternHit};
pub use index::{Pattern, PatternSet, PatternVariation, ProspectIndex};
pub use matcher::{edgar_url_from_filename, structured_confidence, MatchEngine};
pub use normalize::{company_root, name_variants, normalize, strip_personal_suffixes};
pub use pipeline::{
    run_pipeline, CancelFlag, PipelineConfig, PipelineError, PipelineReport, ProgressFn,
    DEFAULT_CHECKPOINT_EVERY, DEFAULT_SOFT_BUDGET,
};
pub use prospect::{load_prospects, ColumnMap, Prospect, ProspectError, ProspectRow};
pub use record::{
    CompanyCheck, DistanceCategory, FpRiskLevel, MatchMethod, MatchRecord, MatchType,
    StructuredMatchType, Verdict,
};
pub use risk::{assess, RiskAssessment, RiskInputs};
pub use signal::{classify, Dimension, SignalProfile, Urgency};
pub use stats::{confidence_bucket, RunStats};
pub use validate::{classify_company, classify_name, CompanyClass, ContextMetrics, NameClass};
