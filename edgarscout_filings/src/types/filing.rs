//! The canonical parsed-filing record produced by every form parser.

use serde::{Deserialize, Serialize};

use super::FilingHeader;

/// Alert severity, ordered from informational to urgent.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AlertSeverity {
    Info,
    Medium,
    High,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AlertSeverity::Info => "INFO",
            AlertSeverity::Medium => "MEDIUM",
            AlertSeverity::High => "HIGH",
        };
        f.write_str(s)
    }
}

/// Closed alert vocabulary emitted by the form parsers.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// Form 4 transaction code G (stock gift).
    PhilanthropySignal,
    /// Form 4 exercise (M) and sale (S) sharing a transaction date.
    SameDaySale,
    /// Form 4 sale proceeds above the $100k / $1M thresholds.
    LargeSale,
    /// Form 144 proposed sale.
    UpcomingSale,
    /// Schedule 13D active ownership position.
    ActivistOwnership,
    /// 13F institutional manager (AUM, not personal wealth).
    FundManager,
    /// 8-K officer/director appointment or departure.
    PersonnelChange,
    /// 8-K merger or acquisition event.
    MaEvent,
    /// Form 3 initial insider statement.
    NewInsider,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AlertKind::PhilanthropySignal => "PHILANTHROPY_SIGNAL",
            AlertKind::SameDaySale => "SAME_DAY_SALE",
            AlertKind::LargeSale => "LARGE_SALE",
            AlertKind::UpcomingSale => "UPCOMING_SALE",
            AlertKind::ActivistOwnership => "ACTIVIST_OWNERSHIP",
            AlertKind::FundManager => "FUND_MANAGER",
            AlertKind::PersonnelChange => "PERSONNEL_CHANGE",
            AlertKind::MaEvent => "MA_EVENT",
            AlertKind::NewInsider => "NEW_INSIDER",
        };
        f.write_str(s)
    }
}

/// A single alert attached to a parsed filing.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FilingAlert {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
}

impl FilingAlert {
    pub fn new(kind: AlertKind, severity: AlertSeverity, message: impl Into<String>) -> Self {
        FilingAlert {
            kind,
            severity,
            message: message.into(),
        }
    }
}

/// A person extracted from the filing with whatever role the form exposes.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct FilingPerson {
    pub name: String,
    pub role: Option<String>,
    pub cik: Option<String>,
}

/// One transaction row, real (ownership forms) or synthetic (144 and other
/// non-ownership forms that still imply a transaction).
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct FilingTransaction {
    /// One-letter EDGAR transaction code (S, P, M, G, ...).
    pub code: Option<String>,
    /// Human label for the code, from the fixed code table.
    pub code_label: String,
    pub shares: Option<f64>,
    pub price: Option<f64>,
    /// Dollar value; shares x price when both are present.
    pub value: Option<f64>,
    /// Transaction date as reported (`yyyy-mm-dd`).
    pub date: Option<String>,
    /// True for acquired (A), false for disposed (D), `None` when absent.
    pub acquired: Option<bool>,
    pub security_title: Option<String>,
    /// Shares owned following the transaction, when reported.
    pub post_shares: Option<f64>,
    /// Direct/indirect ownership marker (D or I).
    pub ownership: Option<String>,
    pub derivative: bool,
    /// Underlying security title (derivative rows only).
    pub underlying_title: Option<String>,
    pub underlying_shares: Option<f64>,
    pub exercise_price: Option<f64>,
    pub exercise_date: Option<String>,
    pub expiration_date: Option<String>,
}

/// Which parser produced a [`ParsedFiling`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserUsed {
    Ownership,
    Form144,
    FormD,
    EightK,
    Schedule13,
    ThirteenF,
    Proxy,
    #[default]
    Generic,
}

impl std::fmt::Display for ParserUsed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ParserUsed::Ownership => "ownership",
            ParserUsed::Form144 => "form144",
            ParserUsed::FormD => "formd",
            ParserUsed::EightK => "8k",
            ParserUsed::Schedule13 => "schedule13",
            ParserUsed::ThirteenF => "13f",
            ParserUsed::Proxy => "proxy",
            ParserUsed::Generic => "generic",
        };
        f.write_str(s)
    }
}

/// A 13F information-table position, retained for the top-10 ranking.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Holding13F {
    pub issuer: String,
    pub class_title: Option<String>,
    pub value: f64,
    pub shares: Option<f64>,
}

/// Canonical record produced by any form parser.
///
/// Transient: built per filing, consumed by the matcher, then dropped.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ParsedFiling {
    pub header: FilingHeader,
    /// Persons in document order.
    pub persons: Vec<FilingPerson>,
    /// Transactions in document order.
    pub transactions: Vec<FilingTransaction>,
    pub alerts: Vec<FilingAlert>,
    /// Trading under a pre-arranged 10b5-1 plan.
    pub has_10b5_1_plan: bool,
    pub is_personnel_event: bool,
    pub is_ma_event: bool,
    pub is_earnings_event: bool,
    /// Top holdings by value (13F only).
    pub top_holdings: Vec<Holding13F>,
    /// Institutional AUM figure; never attributable to an individual.
    pub aum_not_personal_wealth: bool,
    /// Education mentions harvested from proxy statements (DEF 14A only).
    pub education_mentions: Vec<String>,
    /// Which parser produced this record.
    pub parser_used: ParserUsed,
    /// Error message when a form parser failed and the generic parser ran.
    pub parse_error: Option<String>,
}

impl ParsedFiling {
    /// New record carrying only envelope metadata.
    pub fn from_header(header: FilingHeader) -> Self {
        ParsedFiling {
            header,
            ..Default::default()
        }
    }

    /// Distinct transaction codes present, in first-seen order.
    pub fn transaction_codes(&self) -> Vec<String> {
        let mut codes = Vec::new();
        for t in &self.transactions {
            if let Some(code) = &t.code {
                if !codes.contains(code) {
                    codes.push(code.clone());
                }
            }
        }
        codes
    }

    /// Total dollar value across sale (code S) transactions.
    pub fn sale_total(&self) -> f64 {
        self.transactions
            .iter()
            .filter(|t| t.code.as_deref() == Some("S"))
            .filter_map(|t| t.value)
            .sum()
    }

    /// Total dollar value across all transactions carrying one.
    pub fn total_value(&self) -> f64 {
        self.transactions.iter().filter_map(|t| t.value).sum()
    }

    /// First HIGH-severity alert message, if any.
    pub fn first_high_alert(&self) -> Option<&str> {
        self.alerts
            .iter()
            .find(|a| a.severity == AlertSeverity::High)
            .map(|a| a.message.as_str())
    }
}
