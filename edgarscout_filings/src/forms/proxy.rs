//! DEF 14A (proxy statement) parser.
//!
//! Proxies are HTML. After stripping tags the parser harvests named
//! executive officers, directors, and education mentions with a closed set
//! of patterns. Deep compensation-table parsing is delegated to downstream
//! augmentation and is out of scope here.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::tags::{embedded_html, strip_html};
use crate::types::{FilingHeader, FilingPerson, ParsedFiling, ParserUsed};

use super::FormParseError;

const NAME: &str = r"[A-Z][A-Za-z'.\-]+(?:\s+[A-Z][A-Za-z'.\-]*\.?){1,3}";

const TITLES: &str = "Chief Executive Officer|Chief Financial Officer|Chief Operating Officer|\
Chief Technology Officer|Chief Legal Officer|Chief Accounting Officer|\
Executive Vice President|Senior Vice President|Vice President|President|Chairman|Chair|\
Treasurer|Secretary|General Counsel|CEO|CFO|COO|CTO|CLO|CAO|EVP|SVP|VP";

/// "Jane Doe, Chief Executive Officer" / "Jane Doe, CEO".
static NAME_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"({}),\s*(?:our\s+)?({})", NAME, TITLES)).expect("name-title regex"));

/// "Chief Executive Officer Jane Doe".
static TITLE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?:{})\s+({})", TITLES, NAME)).expect("title-name regex"));

/// "Jane Doe, Director".
static DIRECTOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"({}),\s*(?:a\s+)?Director", NAME)).expect("director regex"));

/// Institutions: "Stanford University", "Dartmouth College", ...
static EDUCATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b((?:[A-Z][A-Za-z'&.\-]+\s+){0,4}(?:University|College|Institute|School|Academy)(?:\s+of\s+(?:[A-Z][A-Za-z'&.\-]+\s*){1,3})?)")
        .expect("education regex")
});

const MAX_PERSONS: usize = 50;
const MAX_EDUCATION: usize = 25;

pub fn parse(header: &FilingHeader, raw: &str) -> Result<ParsedFiling, FormParseError> {
    let mut filing = ParsedFiling::from_header(header.clone());
    filing.parser_used = ParserUsed::Proxy;

    let html = embedded_html(raw).unwrap_or(raw);
    let text = strip_html(html);

    let mut seen = Vec::new();
    for caps in NAME_TITLE_RE.captures_iter(&text) {
        push_person(&mut filing, &mut seen, &caps[1], Some(caps[2].to_string()));
    }
    for caps in TITLE_NAME_RE.captures_iter(&text) {
        push_person(
            &mut filing,
            &mut seen,
            &caps[1],
            Some("Named Executive Officer".to_string()),
        );
    }
    for caps in DIRECTOR_RE.captures_iter(&text) {
        push_person(&mut filing, &mut seen, &caps[1], Some("Director".to_string()));
    }

    for caps in EDUCATION_RE.captures_iter(&text) {
        let mention = caps[1].trim().to_string();
        if !filing.education_mentions.contains(&mention) {
            filing.education_mentions.push(mention);
        }
        if filing.education_mentions.len() >= MAX_EDUCATION {
            break;
        }
    }

    Ok(filing)
}

fn push_person(
    filing: &mut ParsedFiling,
    seen: &mut Vec<String>,
    name: &str,
    role: Option<String>,
) {
    if filing.persons.len() >= MAX_PERSONS {
        return;
    }
    let name = name.trim().trim_end_matches(',').to_string();
    let key = name.to_lowercase();
    if seen.contains(&key) {
        return;
    }
    seen.push(key);
    filing.persons.push(FilingPerson {
        name,
        role,
        cik: None,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::extract_header;

    fn proxy_raw(body: &str) -> String {
        format!(
            "<SEC-HEADER>\nCONFORMED SUBMISSION TYPE: DEF 14A\n\
             FILER:\n\tCOMPANY CONFORMED NAME: ACME CORP\n</SEC-HEADER>\n\
             <DOCUMENT><TEXT><HTML><body>{}</body></HTML></TEXT></DOCUMENT>",
            body
        )
    }

    #[test]
    fn test_neo_by_name_comma_title() {
        let raw = proxy_raw("<p>Compensation of Maria Alvarez, Chief Executive Officer and of Tom Wu, CFO is shown below.</p>");
        let header = extract_header(&raw);
        let filing = parse(&header, &raw).unwrap();

        let names: Vec<&str> = filing.persons.iter().map(|p| p.name.as_str()).collect();
        assert!(names.contains(&"Maria Alvarez"), "{:?}", names);
        assert!(names.contains(&"Tom Wu"), "{:?}", names);
        assert_eq!(
            filing.persons[0].role.as_deref(),
            Some("Chief Executive Officer")
        );
    }

    #[test]
    fn test_director_pattern() {
        let raw = proxy_raw("<p>Jordan Ellis Baker, Director, has served since 2015.</p>");
        let header = extract_header(&raw);
        let filing = parse(&header, &raw).unwrap();
        assert!(filing
            .persons
            .iter()
            .any(|p| p.name == "Jordan Ellis Baker" && p.role.as_deref() == Some("Director")));
    }

    #[test]
    fn test_education_mentions() {
        let raw = proxy_raw(
            "<p>Ms. Alvarez holds an M.B.A. from Harvard Business School and a B.S. from \
             Stanford University. Mr. Wu attended the University of Michigan.</p>",
        );
        let header = extract_header(&raw);
        let filing = parse(&header, &raw).unwrap();
        assert!(filing
            .education_mentions
            .iter()
            .any(|m| m.contains("Harvard Business School")));
        assert!(filing
            .education_mentions
            .iter()
            .any(|m| m.contains("Stanford University")));
        assert!(filing
            .education_mentions
            .iter()
            .any(|m| m.contains("University of Michigan")));
    }

    #[test]
    fn test_duplicate_names_collapsed() {
        let raw = proxy_raw("<p>Maria Alvarez, CEO. Later: Maria Alvarez, Chief Executive Officer.</p>");
        let header = extract_header(&raw);
        let filing = parse(&header, &raw).unwrap();
        let count = filing
            .persons
            .iter()
            .filter(|p| p.name == "Maria Alvarez")
            .count();
        assert_eq!(count, 1);
    }
}
