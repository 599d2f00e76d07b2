//! Gap records from the `## Gaps` section of design.md

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::core::grammar::Grammar;
use crate::entities::section_lines;

/// Heading of the design ledger section holding gaps
pub const GAPS_SECTION: &str = "Gaps";

/// Gap categories, written as a one-letter prefix of the gap id
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, clap::ValueEnum,
)]
pub enum GapKind {
    #[serde(rename = "S")]
    #[value(name = "S", alias = "scope")]
    Scope,
    #[serde(rename = "R")]
    #[value(name = "R", alias = "requirements")]
    Requirements,
    #[serde(rename = "D")]
    #[value(name = "D", alias = "design")]
    Design,
    #[serde(rename = "C")]
    #[value(name = "C", alias = "code")]
    Code,
    #[serde(rename = "O")]
    #[value(name = "O", alias = "other")]
    Other,
}

impl GapKind {
    pub fn all() -> &'static [GapKind] {
        &[
            GapKind::Scope,
            GapKind::Requirements,
            GapKind::Design,
            GapKind::Code,
            GapKind::Other,
        ]
    }

    pub fn letter(self) -> char {
        match self {
            GapKind::Scope => 'S',
            GapKind::Requirements => 'R',
            GapKind::Design => 'D',
            GapKind::Code => 'C',
            GapKind::Other => 'O',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|k| k.letter() == letter.to_ascii_uppercase())
    }
}

impl fmt::Display for GapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GapKind::Scope => write!(f, "scope"),
            GapKind::Requirements => write!(f, "requirements"),
            GapKind::Design => write!(f, "design"),
            GapKind::Code => write!(f, "code"),
            GapKind::Other => write!(f, "other"),
        }
    }
}

impl FromStr for GapKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(kind) = Self::from_letter(c) {
                return Ok(kind);
            }
        }
        Self::all()
            .iter()
            .copied()
            .find(|k| k.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("invalid gap type '{}': expected one of S, R, D, C, O", s))
    }
}

/// A tracked open issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gap {
    /// Letter and number as written, e.g. "D3"
    pub id: String,
    pub kind: GapKind,
    pub number: u32,
    pub description: String,
    pub resolved: bool,
    pub line: usize,
}

/// Extract gaps from the `## Gaps` section in document order
pub fn parse_gaps(content: &str, grammar: &Grammar) -> Vec<Gap> {
    section_lines(content, grammar, GAPS_SECTION)
        .into_iter()
        .filter_map(|(line_no, line)| {
            let caps = grammar.gap.captures(line)?;
            let kind = caps[2].chars().next().and_then(GapKind::from_letter)?;
            let number = caps[3].parse().ok()?;
            Some(Gap {
                id: format!("{}{}", &caps[2], &caps[3]),
                kind,
                number,
                description: caps[4].trim().to_string(),
                resolved: &caps[1] == "x",
                line: line_no,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gaps() {
        let content = "\
## Artifacts
- [ ] D9: not a gap, wrong section

## Gaps
- [ ] S1: Scope is unclear
- [x] D2: Missing sequence for search
Some note
- [ ] X1: unknown type letter

## Notes
";
        let gaps = parse_gaps(content, &Grammar::markdown());
        assert_eq!(gaps.len(), 2);
        assert_eq!(gaps[0].id, "S1");
        assert_eq!(gaps[0].kind, GapKind::Scope);
        assert!(!gaps[0].resolved);
        assert_eq!(gaps[1].id, "D2");
        assert_eq!(gaps[1].number, 2);
        assert!(gaps[1].resolved);
        assert_eq!(gaps[1].description, "Missing sequence for search");
        assert_eq!(gaps[1].line, 6);
    }

    #[test]
    fn test_gap_kind_from_str() {
        assert_eq!("d".parse::<GapKind>().unwrap(), GapKind::Design);
        assert_eq!("C".parse::<GapKind>().unwrap(), GapKind::Code);
        assert_eq!("scope".parse::<GapKind>().unwrap(), GapKind::Scope);
        assert!("X".parse::<GapKind>().is_err());
        assert!("DD".parse::<GapKind>().is_err());
    }

    #[test]
    fn test_gap_kind_cli_values() {
        use clap::ValueEnum;

        let names: Vec<_> = GapKind::value_variants()
            .iter()
            .filter_map(|k| k.to_possible_value())
            .map(|v| v.get_name().to_string())
            .collect();
        assert_eq!(names, vec!["S", "R", "D", "C", "O"]);
        assert_eq!(<GapKind as ValueEnum>::from_str("design", true).unwrap(), GapKind::Design);
        assert_eq!(<GapKind as ValueEnum>::from_str("o", true).unwrap(), GapKind::Other);
    }
}
