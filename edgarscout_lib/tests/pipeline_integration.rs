//! End-to-end pipeline tests over synthetic filings, exercising the match
//! invariants the way an operator-facing run would.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use edgarscout_lib::{
    run_pipeline, CancelFlag, MatchEngine, MatchMethod, MatchType, PipelineConfig, Prospect,
    StructuredMatchType, Verdict,
};

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "edgarscout-integration-{}-{}",
        tag,
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_filing(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).unwrap();
}

fn prospect(id: &str, name: &str, company: Option<&str>) -> Prospect {
    Prospect {
        id: id.to_string(),
        name: name.to_string(),
        company: company.map(|c| c.to_string()),
        team: Some("Major Gifts".to_string()),
    }
}

fn form4_gift(owner: &str, issuer: &str) -> String {
    format!(
        "<SEC-HEADER>\nACCESSION NUMBER: 0001234567-24-000001\nCONFORMED SUBMISSION TYPE: 4\nFILED AS OF DATE: 20240115\n\
         ISSUER:\n\tCOMPANY CONFORMED NAME: {issuer}\n\tCENTRAL INDEX KEY: 0002222222\n</SEC-HEADER>\n\
         <DOCUMENT><TEXT><XML>\n<ownershipDocument>\n\
         <issuer><issuerCik>0002222222</issuerCik><issuerName>{issuer}</issuerName><issuerTradingSymbol>ACME</issuerTradingSymbol></issuer>\n\
         <reportingOwner><reportingOwnerId><rptOwnerCik>0001111111</rptOwnerCik><rptOwnerName>{owner}</rptOwnerName></reportingOwnerId>\n\
         <reportingOwnerRelationship><isOfficer>1</isOfficer><officerTitle>Chief Financial Officer</officerTitle></reportingOwnerRelationship></reportingOwner>\n\
         <nonDerivativeTransaction>\n\
         <securityTitle><value>Common Stock</value></securityTitle>\n\
         <transactionDate><value>2024-01-10</value></transactionDate>\n\
         <transactionCoding><transactionCode>G</transactionCode></transactionCoding>\n\
         <transactionAmounts><transactionShares><value>10000</value></transactionShares>\n\
         <transactionPricePerShare><value>50</value></transactionPricePerShare>\n\
         <transactionAcquiredDisposedCode><value>D</value></transactionAcquiredDisposedCode></transactionAmounts>\n\
         </nonDerivativeTransaction>\n\
         </ownershipDocument>\n</XML></TEXT></DOCUMENT>"
    )
}

fn thirteen_f(filer: &str) -> String {
    format!(
        "<SEC-HEADER>\nACCESSION NUMBER: 0001234567-24-000009\nCONFORMED SUBMISSION TYPE: 13F-HR\n\
         FILER:\n\tCOMPANY CONFORMED NAME: {filer}\n\tCENTRAL INDEX KEY: 0007777777\n</SEC-HEADER>\n\
         <DOCUMENT><TEXT><XML><informationTable>\n\
         <infoTable><nameOfIssuer>BIG TECH INC</nameOfIssuer><value>1500000000</value></infoTable>\n\
         <infoTable><nameOfIssuer>SMALL CAP CO</nameOfIssuer><value>500000000</value></infoTable>\n\
         </informationTable></XML></TEXT></DOCUMENT>"
    )
}

#[tokio::test]
async fn gift_scenario_produces_tier1_valid_match() {
    let filings = temp_dir("gift-filings");
    let out = temp_dir("gift-out");
    write_filing(
        &filings,
        "0001234567-24-000001.txt",
        &form4_gift("Doe Jane A", "ACME CORP"),
    );

    let engine = Arc::new(MatchEngine::new(vec![prospect(
        "P1",
        "Jane Doe",
        Some("Acme Corp"),
    )]));
    let report = run_pipeline(
        engine,
        PipelineConfig::new(&filings, &out),
        CancelFlag::new(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(report.records.len(), 1);
    let r = &report.records[0];
    assert_eq!(r.match_method, MatchMethod::Structured);
    assert_eq!(
        r.structured_match_type,
        Some(StructuredMatchType::NameReorderDropMiddle)
    );
    assert_eq!(r.confidence, 90);
    assert!(r.company_verified);
    assert_eq!(r.signal.tier, 1);
    assert_eq!(r.verdict, Verdict::LikelyValid);
    assert!(r.alerts.iter().any(|a| a.contains("$500,000")));
    assert_eq!(r.team_name.as_deref(), Some("Major Gifts"));
    assert_eq!(
        r.edgar_url.as_deref(),
        Some("https://www.sec.gov/Archives/edgar/data/1234567/000123456724000001.txt")
    );

    let _ = fs::remove_dir_all(&filings);
    let _ = fs::remove_dir_all(&out);
}

#[tokio::test]
async fn at_most_one_record_per_prospect_and_filing() {
    let filings = temp_dir("unique-filings");
    let out = temp_dir("unique-out");
    // The prospect appears structurally and three times in body text.
    let raw = form4_gift("Doe Jane A", "ACME CORP")
        + "\nJane Doe spoke. Jane Doe signed. Jane Doe of Acme attended.";
    write_filing(&filings, "0001234567-24-000001.txt", &raw);

    let engine = Arc::new(MatchEngine::new(vec![prospect(
        "P1",
        "Jane Doe",
        Some("Acme Corp"),
    )]));
    let report = run_pipeline(
        engine,
        PipelineConfig::new(&filings, &out),
        CancelFlag::new(),
        None,
    )
    .await
    .unwrap();

    let p1_records: Vec<_> = report
        .records
        .iter()
        .filter(|r| r.prospect_id == "P1")
        .collect();
    assert_eq!(p1_records.len(), 1);
    assert_eq!(p1_records[0].match_method, MatchMethod::Structured);

    let _ = fs::remove_dir_all(&filings);
    let _ = fs::remove_dir_all(&out);
}

#[tokio::test]
async fn first_middle_only_emits_false_positive_record() {
    let filings = temp_dir("fmo-filings");
    let out = temp_dir("fmo-out");
    write_filing(
        &filings,
        "0001234567-24-000002.txt",
        &form4_gift("Ellis Gary Lee", "OTHER CORP"),
    );

    let engine = Arc::new(MatchEngine::new(vec![prospect(
        "P1",
        "Gary Lee",
        Some("Alpha Inc"),
    )]));
    let report = run_pipeline(
        engine,
        PipelineConfig::new(&filings, &out),
        CancelFlag::new(),
        None,
    )
    .await
    .unwrap();

    // The record is emitted, never silently dropped.
    assert_eq!(report.records.len(), 1);
    let r = &report.records[0];
    assert_eq!(
        r.structured_match_type,
        Some(StructuredMatchType::FirstMiddleOnly)
    );
    assert!(r.uncertain_match);
    assert_eq!(r.confidence, 20);
    assert!(r.fp_risk_score >= 80);
    assert_eq!(r.verdict, Verdict::LikelyFalsePositive);

    let _ = fs::remove_dir_all(&filings);
    let _ = fs::remove_dir_all(&out);
}

#[tokio::test]
async fn text_only_match_with_proximity() {
    let filings = temp_dir("text-filings");
    let out = temp_dir("text-out");
    let body = format!(
        "<SEC-HEADER>\nACCESSION NUMBER: 0009999999-24-000001\nCONFORMED SUBMISSION TYPE: N-CSR\n</SEC-HEADER>\n\
         The trustees acknowledge Jane Doe for her years of board service. {}\
         Acme continues to sponsor the community fund for local schools.",
        "More narrative text in between keeps the two mentions apart. ".repeat(4)
    );
    write_filing(&filings, "0009999999-24-000001.txt", &body);

    let engine = Arc::new(MatchEngine::new(vec![prospect(
        "P1",
        "Jane Doe",
        Some("Acme Corp"),
    )]));
    let report = run_pipeline(
        engine,
        PipelineConfig::new(&filings, &out),
        CancelFlag::new(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(report.records.len(), 1);
    let r = &report.records[0];
    assert_eq!(r.match_method, MatchMethod::Text);
    assert_eq!(r.match_type, MatchType::NameAndCompany);
    assert_eq!(r.confidence, 95);
    let d = r.distance.expect("distance recorded");
    assert!(d > 0 && d <= 4000);
    assert!(!r.name_context.as_deref().unwrap().is_empty());
    assert!(!r.company_context.as_deref().unwrap().is_empty());

    let _ = fs::remove_dir_all(&filings);
    let _ = fs::remove_dir_all(&out);
}

#[tokio::test]
async fn encoded_region_short_name_rejected() {
    let filings = temp_dir("encoded-filings");
    let out = temp_dir("encoded-out");
    // "qi li" sits inside a dense block of non-prose bytes.
    let noise = "M%9F#@$!X^&*Z+=|~\\]}{[<>?".repeat(8);
    let body = format!(
        "<SEC-HEADER>\nACCESSION NUMBER: 0008888888-24-000001\nCONFORMED SUBMISSION TYPE: N-CSR\n</SEC-HEADER>\n\
         {noise} qi li {noise}"
    );
    write_filing(&filings, "0008888888-24-000001.txt", &body);

    let engine = Arc::new(MatchEngine::new(vec![prospect("P1", "Qi Li", None)]));
    let report = run_pipeline(
        engine,
        PipelineConfig::new(&filings, &out),
        CancelFlag::new(),
        None,
    )
    .await
    .unwrap();

    assert!(report.records.is_empty());

    let _ = fs::remove_dir_all(&filings);
    let _ = fs::remove_dir_all(&out);
}

#[tokio::test]
async fn thirteen_f_aum_warning_not_personal_wealth() {
    let filings = temp_dir("13f-filings");
    let out = temp_dir("13f-out");
    write_filing(
        &filings,
        "0007777777-24-000001.txt",
        &thirteen_f("Example Advisors LLC"),
    );

    let engine = Arc::new(MatchEngine::new(vec![prospect(
        "P1",
        "Example Advisors",
        None,
    )]));
    let report = run_pipeline(
        engine,
        PipelineConfig::new(&filings, &out),
        CancelFlag::new(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(report.records.len(), 1);
    let r = &report.records[0];
    assert_eq!(r.signal.tier, 2);
    assert!(r
        .alerts
        .iter()
        .any(|a| a.contains("FUND_MANAGER") && a.contains("$2.0B") && a.contains("personal wealth")));
    // No dollar figure is attributed to the prospect itself.
    assert_eq!(r.total_value, 0.0);

    let _ = fs::remove_dir_all(&filings);
    let _ = fs::remove_dir_all(&out);
}
