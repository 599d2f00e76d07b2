//! Requirement records from requirements.md

use serde::Serialize;

use crate::core::grammar::Grammar;
use crate::entities::numbered_lines;

/// A numbered requirement statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    /// Identifier, e.g. "R3"
    pub id: String,

    /// The numeric part of the identifier
    pub number: u32,

    /// Statement text with any `(inferred)` marker removed
    pub text: String,

    /// Name of the enclosing `## Feature:` heading
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,

    /// Spec file this requirement was derived from, relative to the project root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Derived rather than stated by a source document
    pub inferred: bool,

    /// Line of origin
    pub line: usize,
}

/// Extract requirements in document order
///
/// A `## Feature:` heading resets the current source; a `**Source:**` line
/// sets it for the requirements that follow. Duplicates and gaps in the
/// numbering are left for validation to report.
pub fn parse_requirements(content: &str, grammar: &Grammar) -> Vec<Requirement> {
    let mut requirements = Vec::new();
    let mut feature: Option<String> = None;
    let mut source: Option<String> = None;

    for (line_no, line) in numbered_lines(content) {
        if let Some(caps) = grammar.feature.captures(line) {
            feature = Some(caps[1].trim().to_string());
            source = None;
            continue;
        }

        if let Some(caps) = grammar.source.captures(line) {
            source = Some(caps[1].trim().to_string());
            continue;
        }

        if let Some(caps) = grammar.requirement.captures(line) {
            let Ok(number) = caps[1].parse::<u32>() else {
                continue;
            };
            let raw = caps[2].trim();
            let (text, inferred) = match grammar.inferred.find(raw) {
                Some(marker) => (raw[marker.end()..].to_string(), true),
                None => (raw.to_string(), false),
            };

            requirements.push(Requirement {
                id: format!("R{}", &caps[1]),
                number,
                text,
                feature: feature.clone(),
                source: source.clone(),
                inferred,
                line: line_no,
            });
        }
    }

    requirements
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIREMENTS: &str = "\
# Requirements

## Feature: Contacts
**Source:** specs/contacts.md

- **R1:** The user can add a contact
- **R2:** (inferred) Contacts are sorted by name

Some prose that is not a requirement.

## Feature: Search

- **R3:** The user can search contacts
";

    #[test]
    fn test_parse_requirements_document_order() {
        let reqs = parse_requirements(REQUIREMENTS, &Grammar::markdown());
        let ids: Vec<_> = reqs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["R1", "R2", "R3"]);
        assert_eq!(reqs[0].line, 6);
        assert_eq!(reqs[2].text, "The user can search contacts");
    }

    #[test]
    fn test_source_is_scoped_to_feature() {
        let reqs = parse_requirements(REQUIREMENTS, &Grammar::markdown());
        assert_eq!(reqs[0].source.as_deref(), Some("specs/contacts.md"));
        assert_eq!(reqs[1].source.as_deref(), Some("specs/contacts.md"));
        assert_eq!(reqs[2].source, None);
        assert_eq!(reqs[2].feature.as_deref(), Some("Search"));
    }

    #[test]
    fn test_inferred_marker_is_stripped() {
        let reqs = parse_requirements(REQUIREMENTS, &Grammar::markdown());
        assert!(!reqs[0].inferred);
        assert!(reqs[1].inferred);
        assert_eq!(reqs[1].text, "Contacts are sorted by name");
    }

    #[test]
    fn test_duplicates_are_kept() {
        let content = "- **R1:** a\n- **R1:** b\n";
        let reqs = parse_requirements(content, &Grammar::markdown());
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[1].text, "b");
    }

    #[test]
    fn test_crlf_input() {
        let content = "## Feature: X\r\n- **R1:** first\r\n- **R2:** second\r\n";
        let reqs = parse_requirements(content, &Grammar::markdown());
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[1].text, "second");
        assert_eq!(reqs[1].line, 3);
    }
}
