//! Form D parser: notice of exempt private offering.
//!
//! Reads the `formDDocument` XML for issuer identity, offering totals,
//! claimed exemptions, and the related-persons roster (executive officers,
//! directors, promoters).

use crate::tags::{self, first_tag_text, tag_blocks, tag_number};
use crate::types::{FilingHeader, FilingPerson, ParsedFiling, ParserUsed};

use super::FormParseError;

pub fn parse(header: &FilingHeader, raw: &str) -> Result<ParsedFiling, FormParseError> {
    let xml = tags::embedded_xml(raw).ok_or(FormParseError::MissingXml)?;

    let mut filing = ParsedFiling::from_header(header.clone());
    filing.parser_used = ParserUsed::FormD;

    if let Some(primary) = tag_blocks(xml, "primaryIssuer").first() {
        let mut issuer = header.issuer.clone().unwrap_or_default();
        if let Some(name) = first_tag_text(primary, "entityName") {
            issuer.name = Some(name);
        }
        if let Some(cik) = first_tag_text(primary, "cik") {
            issuer.cik = Some(cik);
        }
        if let Some(state) = first_tag_text(primary, "jurisdictionOfInc") {
            issuer.state = Some(state);
        }
        filing.header.issuer = Some(issuer);
    }
    if let Some(industry) = first_tag_text(xml, "industryGroupType") {
        if let Some(issuer) = filing.header.issuer.as_mut() {
            if issuer.sic.is_none() {
                issuer.sic = Some(industry);
            }
        }
    }

    for person_block in tag_blocks(xml, "relatedPersonInfo") {
        let first = first_tag_text(person_block, "firstName").unwrap_or_default();
        let middle = first_tag_text(person_block, "middleName");
        let last = first_tag_text(person_block, "lastName").unwrap_or_default();
        if first.is_empty() && last.is_empty() {
            continue;
        }
        let name = match middle {
            Some(m) => format!("{} {} {}", first, m, last),
            None => format!("{} {}", first, last),
        };

        let relationships: Vec<String> = tag_blocks(person_block, "relationship")
            .iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();

        filing.persons.push(FilingPerson {
            name: name.trim().to_string(),
            role: if relationships.is_empty() {
                None
            } else {
                Some(relationships.join(", "))
            },
            cik: None,
        });
    }

    // Offering totals become a synthetic capacity marker, not a transaction:
    // no shares change hands on a Form D.
    let total = tag_number(xml, "totalOfferingAmount");
    let sold = tag_number(xml, "totalAmountSold");
    let remaining = tag_number(xml, "totalRemaining");
    let exemptions: Vec<String> = tag_blocks(xml, "federalExemptionsExclusions")
        .first()
        .map(|block| {
            tag_blocks(block, "item")
                .iter()
                .map(|i| i.trim().to_string())
                .filter(|i| !i.is_empty())
                .collect()
        })
        .unwrap_or_default();
    if total.is_some() || sold.is_some() {
        let mut detail = Vec::new();
        if !exemptions.is_empty() {
            detail.push(exemptions.join(", "));
        }
        if let Some(r) = remaining {
            detail.push(format!("remaining {}", crate::format_usd(r)));
        }
        filing.transactions.push(crate::types::FilingTransaction {
            code_label: "Exempt Offering".to_string(),
            value: sold.or(total),
            date: first_tag_text(xml, "dateOfFirstSale")
                .or_else(|| header.filed_date.map(|d| d.to_string())),
            security_title: if detail.is_empty() {
                None
            } else {
                Some(detail.join("; "))
            },
            ..Default::default()
        });
    }

    Ok(filing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::extract_header;

    const FORM_D: &str = "<SEC-HEADER>\nCONFORMED SUBMISSION TYPE: D\nFILED AS OF DATE: 20240401\n</SEC-HEADER>\n\
        <DOCUMENT><TEXT><XML>\n<edgarSubmission><formDDocument>\n\
        <primaryIssuer><cik>0004444444</cik><entityName>Venture Labs Inc</entityName><jurisdictionOfInc>DELAWARE</jurisdictionOfInc></primaryIssuer>\n\
        <relatedPersonsList>\n\
        <relatedPersonInfo><relatedPersonName><firstName>Alice</firstName><lastName>Nguyen</lastName></relatedPersonName>\n\
        <relatedPersonRelationshipList><relationship>Executive Officer</relationship><relationship>Director</relationship></relatedPersonRelationshipList></relatedPersonInfo>\n\
        <relatedPersonInfo><relatedPersonName><firstName>Bob</firstName><middleName>Q</middleName><lastName>Stone</lastName></relatedPersonName>\n\
        <relatedPersonRelationshipList><relationship>Promoter</relationship></relatedPersonRelationshipList></relatedPersonInfo>\n\
        </relatedPersonsList>\n\
        <offeringData><federalExemptionsExclusions><item>06b</item><item>3C.1</item></federalExemptionsExclusions>\n\
        <offeringSalesAmounts><totalOfferingAmount>5000000</totalOfferingAmount>\n\
        <totalAmountSold>2500000</totalAmountSold><totalRemaining>2500000</totalRemaining></offeringSalesAmounts></offeringData>\n\
        </formDDocument></edgarSubmission>\n</XML></TEXT></DOCUMENT>";

    #[test]
    fn test_parses_issuer_and_related_persons() {
        let header = extract_header(FORM_D);
        let filing = parse(&header, FORM_D).unwrap();

        assert_eq!(filing.parser_used, ParserUsed::FormD);
        assert_eq!(
            filing.header.issuer.as_ref().and_then(|i| i.name.as_deref()),
            Some("Venture Labs Inc")
        );
        assert_eq!(filing.persons.len(), 2);
        assert_eq!(filing.persons[0].name, "Alice Nguyen");
        assert_eq!(
            filing.persons[0].role.as_deref(),
            Some("Executive Officer, Director")
        );
        assert_eq!(filing.persons[1].name, "Bob Q Stone");
        assert_eq!(filing.persons[1].role.as_deref(), Some("Promoter"));
    }

    #[test]
    fn test_offering_totals_and_exemptions() {
        let header = extract_header(FORM_D);
        let filing = parse(&header, FORM_D).unwrap();
        assert_eq!(filing.transactions.len(), 1);
        let tx = &filing.transactions[0];
        assert_eq!(tx.value, Some(2_500_000.0));
        let detail = tx.security_title.as_deref().unwrap();
        assert!(detail.contains("06b"), "{}", detail);
        assert!(detail.contains("remaining $2,500,000"), "{}", detail);
    }

    #[test]
    fn test_missing_xml_is_error() {
        let raw = "<SEC-HEADER>\nCONFORMED SUBMISSION TYPE: D\n</SEC-HEADER>\nno xml";
        let header = extract_header(raw);
        assert!(parse(&header, raw).is_err());
    }
}
