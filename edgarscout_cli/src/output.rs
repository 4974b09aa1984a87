//! Output writers: the debug CSV (full evidence trail), the client CSV
//! (curated columns for fundraising operators), and the run summary table.
//!
//! Records are first mapped to flat row structs, then rendered.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use edgarscout_lib::edgarscout_filings::format_usd;
use edgarscout_lib::{AlertSeverity, MatchRecord, RunStats, Verdict};

pub const DEBUG_CSV: &str = "matches_debug.csv";
pub const CLIENT_CSV: &str = "matches_client.csv";

/// Full-width debug row: one column per piece of evidence.
#[derive(Serialize)]
struct DebugRow {
    signal_tier: u8,
    urgency: String,
    prospect_id: String,
    prospect_name: String,
    prospect_company: String,
    team_name: String,
    confidence: u8,
    uncertain_match: bool,
    uncertain_reason: String,
    match_verdict: String,
    verdict_reason: String,
    company_verified: bool,
    company_check_method: String,
    distance: String,
    distance_category: String,
    match_remarks: String,
    name_context: String,
    company_context: String,
    structured_match_type: String,
    match_method: String,
    match_type: String,
    form_type: String,
    issuer_name: String,
    ticker: String,
    filed_date: String,
    filing_person_name: String,
    filing_person_role: String,
    transaction_codes: String,
    transaction_summary: String,
    total_value: String,
    plan_10b5_1: bool,
    philanthropy: bool,
    same_day_sale: bool,
    signal_label: String,
    signal_dimensions: String,
    gift_officer_action: String,
    signal_summary: String,
    alerts: String,
    fp_risk_score: u8,
    fp_risk_level: String,
    fp_reasons: String,
    edgar_url: String,
    filename: String,
    accession_number: String,
}

/// Curated client row.
#[derive(Serialize)]
struct ClientRow {
    signal_tier: u8,
    confidence: u8,
    match_quality: String,
    prospect_name: String,
    prospect_company: String,
    team_name: String,
    prospect_id: String,
    signal: String,
    form_type: String,
    issuer_name: String,
    ticker: String,
    filed_date: String,
    filer_role: String,
    transaction: String,
    value: String,
    action: String,
    notes: String,
    accession_number: String,
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn debug_row(r: &MatchRecord) -> DebugRow {
    DebugRow {
        signal_tier: r.signal.tier,
        urgency: r.signal.urgency.to_string(),
        prospect_id: r.prospect_id.clone(),
        prospect_name: r.prospect_name.clone(),
        prospect_company: opt(&r.prospect_company),
        team_name: opt(&r.team_name),
        confidence: r.confidence,
        uncertain_match: r.uncertain_match,
        uncertain_reason: opt(&r.uncertain_reason),
        match_verdict: r.verdict.to_string(),
        verdict_reason: r.verdict_reason.clone(),
        company_verified: r.company_verified,
        company_check_method: r.company_check_method.to_string(),
        distance: r.distance.map(|d| d.to_string()).unwrap_or_default(),
        distance_category: r
            .distance_category
            .map(|c| c.to_string())
            .unwrap_or_default(),
        match_remarks: r.match_remarks.clone(),
        name_context: opt(&r.name_context),
        company_context: opt(&r.company_context),
        structured_match_type: r
            .structured_match_type
            .map(|t| t.to_string())
            .unwrap_or_default(),
        match_method: r.match_method.to_string(),
        match_type: r.match_type.to_string(),
        form_type: opt(&r.form_type),
        issuer_name: opt(&r.issuer_name),
        ticker: opt(&r.ticker),
        filed_date: r.filed_date.map(|d| d.to_string()).unwrap_or_default(),
        filing_person_name: opt(&r.filing_person_name),
        filing_person_role: opt(&r.filing_person_role),
        transaction_codes: r.transaction_codes.join(","),
        transaction_summary: r.transaction_summary.clone(),
        total_value: if r.total_value > 0.0 {
            format!("{:.2}", r.total_value)
        } else {
            String::new()
        },
        plan_10b5_1: r.has_10b5_1_plan,
        philanthropy: r.has_gift,
        same_day_sale: r.has_same_day_sale,
        signal_label: format!("Tier {} - {}", r.signal.tier, r.signal.label),
        signal_dimensions: r
            .signal
            .dimensions
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(","),
        gift_officer_action: r.signal.action.clone(),
        signal_summary: r.signal.summary.clone(),
        alerts: r.alerts.join(" | "),
        fp_risk_score: r.fp_risk_score,
        fp_risk_level: r.fp_risk_level.to_string(),
        fp_reasons: r.fp_reasons.join("; "),
        edgar_url: opt(&r.edgar_url),
        filename: r.filename.clone(),
        accession_number: opt(&r.accession_number),
    }
}

/// Human-readable fusion of verdict and company verification.
fn match_quality(r: &MatchRecord) -> String {
    match (r.verdict, r.company_verified) {
        (Verdict::LikelyValid, true) => "Strong - Employer Verified".to_string(),
        (Verdict::LikelyValid, false) => "Strong".to_string(),
        (Verdict::NeedsReview, true) => "Review - Employer Verified".to_string(),
        (Verdict::NeedsReview, false) => "Needs Review".to_string(),
        (Verdict::LikelyFalsePositive, _) => "Likely False Positive".to_string(),
    }
}

/// Transaction summary plus flag tags for the client sheet.
fn client_transaction(r: &MatchRecord) -> String {
    let mut out = r.transaction_summary.clone();
    if r.has_10b5_1_plan {
        out.push_str(" [10b5-1]");
    }
    if r.has_gift {
        out.push_str(" [Gift]");
    }
    if r.has_same_day_sale {
        out.push_str(" [Same-Day Sale]");
    }
    out.trim().to_string()
}

/// INFO alerts always; MEDIUM/HIGH alerts when present.
fn client_notes(r: &MatchRecord) -> String {
    let mut notes: Vec<&str> = Vec::new();
    for alert in &r.alerts {
        let high = alert.starts_with(&format!("[{}]", AlertSeverity::High));
        let info = alert.starts_with(&format!("[{}]", AlertSeverity::Info));
        if info || high {
            notes.push(alert);
        }
    }
    if notes.is_empty() {
        for alert in &r.alerts {
            if alert.starts_with(&format!("[{}]", AlertSeverity::Medium)) {
                notes.push(alert);
            }
        }
    }
    notes.join(" | ")
}

fn client_row(r: &MatchRecord) -> ClientRow {
    ClientRow {
        signal_tier: r.signal.tier,
        confidence: r.confidence,
        match_quality: match_quality(r),
        prospect_name: r.prospect_name.clone(),
        prospect_company: opt(&r.prospect_company),
        team_name: opt(&r.team_name),
        prospect_id: r.prospect_id.clone(),
        signal: r.signal.label.clone(),
        form_type: opt(&r.form_type),
        issuer_name: opt(&r.issuer_name),
        ticker: opt(&r.ticker),
        filed_date: r.filed_date.map(|d| d.to_string()).unwrap_or_default(),
        filer_role: opt(&r.filing_person_role),
        transaction: client_transaction(r),
        value: if r.total_value > 0.0 {
            format_usd(r.total_value)
        } else {
            String::new()
        },
        action: r.signal.action.clone(),
        notes: client_notes(r),
        accession_number: opt(&r.accession_number),
    }
}

/// Write both CSVs under the output directory.
pub fn write_outputs(out_dir: &Path, records: &[MatchRecord]) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let debug_path = out_dir.join(DEBUG_CSV);
    let mut debug = csv::Writer::from_writer(
        File::create(&debug_path)
            .with_context(|| format!("creating {}", debug_path.display()))?,
    );
    for record in records {
        debug.serialize(debug_row(record))?;
    }
    debug.flush()?;

    let client_path = out_dir.join(CLIENT_CSV);
    let mut client = csv::Writer::from_writer(
        File::create(&client_path)
            .with_context(|| format!("creating {}", client_path.display()))?,
    );
    for record in records {
        client.serialize(client_row(record))?;
    }
    client.flush()?;

    Ok(())
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Count")]
    count: String,
}

/// Render the end-of-run summary table.
pub fn summary_table(stats: &RunStats) -> String {
    let mut rows = vec![
        SummaryRow {
            metric: "Filings processed".to_string(),
            count: stats.files_processed.to_string(),
        },
        SummaryRow {
            metric: "Parse errors".to_string(),
            count: stats.parse_errors.to_string(),
        },
        SummaryRow {
            metric: "Matches found".to_string(),
            count: stats.matches_found.to_string(),
        },
        SummaryRow {
            metric: "Company verified / unverified".to_string(),
            count: format!("{} / {}", stats.company_verified, stats.company_unverified),
        },
        SummaryRow {
            metric: "Uncertain matches".to_string(),
            count: stats.uncertain_matches.to_string(),
        },
    ];
    for (tier, n) in &stats.by_tier {
        rows.push(SummaryRow {
            metric: format!("Tier {} matches", tier),
            count: n.to_string(),
        });
    }
    for (method, n) in &stats.by_method {
        rows.push(SummaryRow {
            metric: format!("Method: {}", method),
            count: n.to_string(),
        });
    }
    for (verdict, n) in &stats.by_verdict {
        rows.push(SummaryRow {
            metric: format!("Verdict: {}", verdict),
            count: n.to_string(),
        });
    }
    for (bucket, n) in &stats.by_confidence {
        rows.push(SummaryRow {
            metric: format!("Confidence {}", bucket),
            count: n.to_string(),
        });
    }
    for (level, n) in &stats.by_risk_level {
        rows.push(SummaryRow {
            metric: format!("FP risk: {}", level),
            count: n.to_string(),
        });
    }
    for (form, n) in &stats.by_form {
        rows.push(SummaryRow {
            metric: format!("Form {}", form),
            count: n.to_string(),
        });
    }
    Table::new(rows).with(Style::sharp()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgarscout_lib::{
        CompanyCheck, Dimension, FpRiskLevel, MatchMethod, MatchType, SignalProfile, Urgency,
    };

    fn sample_record() -> MatchRecord {
        MatchRecord {
            prospect_id: "P1".into(),
            prospect_name: "Jane Doe".into(),
            prospect_company: Some("Acme Corp".into()),
            team_name: Some("Major Gifts".into()),
            filename: "0001234567-24-000001.txt".into(),
            accession_number: Some("0001234567-24-000001".into()),
            form_type: Some("4".into()),
            form_class: "FORM4".into(),
            issuer_name: Some("Acme Corp".into()),
            ticker: Some("ACME".into()),
            filed_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 15),
            edgar_url: None,
            match_method: MatchMethod::Structured,
            match_type: MatchType::NameAndCompany,
            structured_match_type: None,
            uncertain_match: false,
            uncertain_reason: None,
            company_verified: true,
            company_check_method: CompanyCheck::StructuredIssuerMatch,
            distance: None,
            distance_category: None,
            confidence: 90,
            match_remarks: String::new(),
            name_context: None,
            company_context: None,
            filing_person_name: Some("Doe Jane A".into()),
            filing_person_role: Some("Officer: CFO".into()),
            transaction_codes: vec!["G".into()],
            transaction_summary: "Gift (1 transaction)".into(),
            total_value: 500_000.0,
            has_10b5_1_plan: false,
            has_gift: true,
            has_same_day_sale: false,
            alerts: vec!["[HIGH] PHILANTHROPY_SIGNAL: Stock gift detected totaling $500,000".into()],
            signal: SignalProfile {
                tier: 1,
                label: "PHILANTHROPY".into(),
                dimensions: vec![Dimension::Propensity],
                urgency: Urgency::High,
                action: "Discuss gift vehicles".into(),
                summary: "[4] Acme Corp".into(),
            },
            fp_risk_score: 0,
            fp_risk_level: FpRiskLevel::LikelyValid,
            fp_reasons: vec![],
            verdict: Verdict::LikelyValid,
            verdict_reason: "company verified".into(),
        }
    }

    #[test]
    fn test_debug_csv_has_44_columns() {
        let dir = std::env::temp_dir().join(format!("edgarscout-out-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        write_outputs(&dir, &[sample_record()]).unwrap();

        let content = std::fs::read_to_string(dir.join(DEBUG_CSV)).unwrap();
        let header = content.lines().next().unwrap();
        assert_eq!(header.split(',').count(), 44);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_client_csv_has_18_columns() {
        let dir = std::env::temp_dir().join(format!("edgarscout-client-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        write_outputs(&dir, &[sample_record()]).unwrap();

        let content = std::fs::read_to_string(dir.join(CLIENT_CSV)).unwrap();
        let mut lines = content.lines();
        let header = lines.next().unwrap();
        assert_eq!(header.split(',').count(), 18);
        let row = lines.next().unwrap();
        assert!(row.contains("Strong - Employer Verified"));
        assert!(row.contains("PHILANTHROPY"));
        assert!(row.contains("[Gift]"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_match_quality_strings() {
        let mut r = sample_record();
        assert_eq!(match_quality(&r), "Strong - Employer Verified");
        r.verdict = Verdict::NeedsReview;
        r.company_verified = false;
        assert_eq!(match_quality(&r), "Needs Review");
        r.verdict = Verdict::LikelyFalsePositive;
        assert_eq!(match_quality(&r), "Likely False Positive");
    }

    #[test]
    fn test_client_transaction_tags() {
        let mut r = sample_record();
        r.has_10b5_1_plan = true;
        let tx = client_transaction(&r);
        assert!(tx.contains("[10b5-1]"));
        assert!(tx.contains("[Gift]"));
    }

    #[test]
    fn test_summary_table_renders() {
        let mut stats = RunStats::default();
        stats.note_filing("FORM4", false);
        stats.note_record(&sample_record());
        let table = summary_table(&stats);
        assert!(table.contains("Filings processed"));
        assert!(table.contains("Tier 1 matches"));
    }
}
