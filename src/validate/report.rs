//! Validation findings and their text rendering

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::entities::Gap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequirementsFindings {
    /// Requirement ids in document order
    pub found: Vec<String>,

    /// Source path to the ids declared under it
    pub sources: BTreeMap<String, Vec<String>>,

    pub inferred: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoverageFindings {
    pub covered: Vec<String>,
    pub uncovered: Vec<String>,
}

/// A code file listed in Artifacts, as found on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeFileFinding {
    pub path: String,
    pub checked: bool,
    pub exists: bool,
    pub crc_refs: Vec<String>,
    pub seq_refs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactFinding {
    pub design_file: String,
    pub code_files: Vec<CodeFileFinding>,
}

/// Outcome of a full validation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub requirements: RequirementsFindings,

    /// Card file name to the requirement ids it declares
    pub crc_cards: BTreeMap<String, Vec<String>>,

    pub coverage: CoverageFindings,
    pub artifacts: Vec<ArtifactFinding>,
    pub gaps: Vec<Gap>,
    pub issues: Vec<String>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Comma-joined list, or `(none)` when empty
pub(crate) fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}

/// First and last id of a run, e.g. `R1-R4`
pub(crate) fn id_range(ids: &[String]) -> String {
    match ids {
        [] => "(none)".to_string(),
        [only] => only.clone(),
        [first, .., last] => format!("{}-{}", first, last),
    }
}

pub(crate) fn mark(checked: bool) -> char {
    if checked {
        'x'
    } else {
        ' '
    }
}

pub(crate) fn write_sources(
    f: &mut fmt::Formatter<'_>,
    sources: &BTreeMap<String, Vec<String>>,
) -> fmt::Result {
    for (source, ids) in sources {
        writeln!(f, "  source {}: {}", source, id_range(ids))?;
    }
    Ok(())
}

pub(crate) fn write_cards(
    f: &mut fmt::Formatter<'_>,
    cards: &BTreeMap<String, Vec<String>>,
) -> fmt::Result {
    for (card, ids) in cards {
        if ids.is_empty() {
            writeln!(f, "  {}: (no Requirements field)", card)?;
        } else {
            writeln!(f, "  {}: {}", card, ids.join(", "))?;
        }
    }
    Ok(())
}

pub(crate) fn write_code_file(
    f: &mut fmt::Formatter<'_>,
    indent: &str,
    code_file: &CodeFileFinding,
) -> fmt::Result {
    let suffix = if code_file.exists { "" } else { " (missing)" };
    writeln!(
        f,
        "{}[{}] {}{}",
        indent,
        mark(code_file.checked),
        code_file.path,
        suffix
    )
}

pub(crate) fn write_issues(f: &mut fmt::Formatter<'_>, issues: &[String]) -> fmt::Result {
    if issues.is_empty() {
        return Ok(());
    }
    writeln!(f)?;
    writeln!(f, "issues:")?;
    for issue in issues {
        writeln!(f, "  - {}", issue)?;
    }
    Ok(())
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "requirements.md:")?;
        writeln!(f, "  found: {}", join_or_none(&self.requirements.found))?;
        if !self.requirements.inferred.is_empty() {
            writeln!(f, "  inferred: {}", self.requirements.inferred.join(", "))?;
        }
        write_sources(f, &self.requirements.sources)?;

        writeln!(f)?;
        writeln!(f, "design files:")?;
        write_cards(f, &self.crc_cards)?;

        writeln!(f)?;
        writeln!(f, "coverage:")?;
        writeln!(f, "  covered: {}", join_or_none(&self.coverage.covered))?;
        if !self.coverage.uncovered.is_empty() {
            writeln!(f, "  uncovered: {}", self.coverage.uncovered.join(", "))?;
        }

        writeln!(f)?;
        writeln!(f, "artifacts:")?;
        for artifact in &self.artifacts {
            writeln!(f, "  {}:", artifact.design_file)?;
            for code_file in &artifact.code_files {
                write_code_file(f, "    ", code_file)?;
            }
        }

        if !self.gaps.is_empty() {
            writeln!(f)?;
            writeln!(f, "gaps:")?;
            for gap in &self.gaps {
                writeln!(f, "  [{}] {}: {}", mark(gap.resolved), gap.id, gap.description)?;
            }
        }

        write_issues(f, &self.issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::GapKind;

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_id_range() {
        assert_eq!(id_range(&[]), "(none)");
        assert_eq!(id_range(&ids(&["R4"])), "R4");
        assert_eq!(id_range(&ids(&["R1", "R2", "R3"])), "R1-R3");
    }

    #[test]
    fn test_report_text() {
        let report = ValidationReport {
            requirements: RequirementsFindings {
                found: ids(&["R1", "R2"]),
                sources: BTreeMap::from([("specs/app.md".to_string(), ids(&["R1", "R2"]))]),
                inferred: ids(&["R2"]),
            },
            crc_cards: BTreeMap::from([
                ("crc-Idle.md".to_string(), Vec::new()),
                ("crc-Store.md".to_string(), ids(&["R1"])),
            ]),
            coverage: CoverageFindings {
                covered: ids(&["R1"]),
                uncovered: ids(&["R2"]),
            },
            artifacts: vec![ArtifactFinding {
                design_file: "crc-Store.md".to_string(),
                code_files: vec![CodeFileFinding {
                    path: "src/store.ts".to_string(),
                    checked: true,
                    exists: false,
                    crc_refs: Vec::new(),
                    seq_refs: Vec::new(),
                }],
            }],
            gaps: vec![Gap {
                id: "D1".to_string(),
                kind: GapKind::Design,
                number: 1,
                description: "Missing sequence".to_string(),
                resolved: false,
                line: 9,
            }],
            issues: ids(&[
                "crc-Idle.md: no Requirements field",
                "uncovered requirements: R2",
            ]),
        };

        assert!(!report.passed());
        insta::assert_snapshot!(report.to_string(), @r###"
        requirements.md:
          found: R1, R2
          inferred: R2
          source specs/app.md: R1-R2

        design files:
          crc-Idle.md: (no Requirements field)
          crc-Store.md: R1

        coverage:
          covered: R1
          uncovered: R2

        artifacts:
          crc-Store.md:
            [x] src/store.ts (missing)

        gaps:
          [ ] D1: Missing sequence

        issues:
          - crc-Idle.md: no Requirements field
          - uncovered requirements: R2
        "###);
    }
}
