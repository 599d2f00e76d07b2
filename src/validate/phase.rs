//! Per-phase validation subsets

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::validate::report::{
    id_range, join_or_none, write_cards, write_code_file, write_issues, CodeFileFinding,
    RequirementsFindings,
};

/// Stage of the spec → requirements → design → implementation workflow
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Source specs exist and are non-empty
    Spec,
    /// requirements.md numbering and sources
    Requirements,
    /// CRC cards, coverage and the Artifacts listing
    Design,
    /// Code files and their traceability comments
    Implementation,
    /// Gap ids in design.md
    Gaps,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Spec => write!(f, "spec"),
            Phase::Requirements => write!(f, "requirements"),
            Phase::Design => write!(f, "design"),
            Phase::Implementation => write!(f, "implementation"),
            Phase::Gaps => write!(f, "gaps"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpecFindings {
    pub specs_found: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DesignFindings {
    pub crc_cards: BTreeMap<String, Vec<String>>,
    pub covered: Vec<String>,
    pub uncovered: Vec<String>,

    /// Number of tracked design files in the design directory
    pub design_files: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImplementationFindings {
    pub code_files: Vec<CodeFileFinding>,

    /// Code files under the source directory no artifact lists
    pub unlisted: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GapsFindings {
    pub open: Vec<String>,
    pub resolved: Vec<String>,
    pub total: usize,
}

/// Findings specific to one phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PhaseFindings {
    Spec(SpecFindings),
    Requirements(RequirementsFindings),
    Design(DesignFindings),
    Implementation(ImplementationFindings),
    Gaps(GapsFindings),
}

impl PhaseFindings {
    /// Empty findings for a phase, used when its inputs cannot be loaded
    pub fn empty(phase: Phase) -> Self {
        match phase {
            Phase::Spec => PhaseFindings::Spec(SpecFindings::default()),
            Phase::Requirements => PhaseFindings::Requirements(RequirementsFindings::default()),
            Phase::Design => PhaseFindings::Design(DesignFindings::default()),
            Phase::Implementation => {
                PhaseFindings::Implementation(ImplementationFindings::default())
            }
            Phase::Gaps => PhaseFindings::Gaps(GapsFindings::default()),
        }
    }
}

/// Outcome of one phase check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseResult {
    pub phase: Phase,
    pub passed: bool,
    pub findings: PhaseFindings,
    pub issues: Vec<String>,
}

impl PhaseResult {
    pub fn new(phase: Phase, findings: PhaseFindings, issues: Vec<String>) -> Self {
        Self {
            phase,
            passed: issues.is_empty(),
            findings,
            issues,
        }
    }
}

impl fmt::Display for PhaseFindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseFindings::Spec(s) => {
                writeln!(f, "specs_found: {}", join_or_none(&s.specs_found))
            }
            PhaseFindings::Requirements(r) => {
                writeln!(f, "found: {}", join_or_none(&r.found))?;
                writeln!(f, "inferred: {}", join_or_none(&r.inferred))?;
                writeln!(f, "sources:")?;
                for (source, ids) in &r.sources {
                    writeln!(f, "  {}: {}", source, id_range(ids))?;
                }
                Ok(())
            }
            PhaseFindings::Design(d) => {
                writeln!(f, "crc_cards:")?;
                write_cards(f, &d.crc_cards)?;
                writeln!(f, "covered: {}", join_or_none(&d.covered))?;
                writeln!(f, "uncovered: {}", join_or_none(&d.uncovered))?;
                writeln!(f, "design_files: {}", d.design_files)
            }
            PhaseFindings::Implementation(i) => {
                writeln!(f, "code_files:")?;
                for code_file in &i.code_files {
                    write_code_file(f, "  ", code_file)?;
                }
                if !i.unlisted.is_empty() {
                    writeln!(f, "unlisted:")?;
                    for path in &i.unlisted {
                        writeln!(f, "  {}", path)?;
                    }
                }
                Ok(())
            }
            PhaseFindings::Gaps(g) => {
                writeln!(f, "open: {}", join_or_none(&g.open))?;
                writeln!(f, "resolved: {}", join_or_none(&g.resolved))?;
                writeln!(f, "total: {}", g.total)
            }
        }
    }
}

impl fmt::Display for PhaseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.findings)?;
        write_issues(f, &self.issues)?;
        writeln!(f)?;
        let status = if self.passed { "OK" } else { "FAILED" };
        writeln!(f, "phase: {} {}", self.phase, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaps_phase_text() {
        let result = PhaseResult::new(
            Phase::Gaps,
            PhaseFindings::Gaps(GapsFindings {
                open: vec!["D1".to_string()],
                resolved: Vec::new(),
                total: 2,
            }),
            vec!["duplicate gap ID: D1".to_string()],
        );

        assert!(!result.passed);
        insta::assert_snapshot!(result.to_string(), @r###"
        open: D1
        resolved: (none)
        total: 2

        issues:
          - duplicate gap ID: D1

        phase: gaps FAILED
        "###);
    }

    #[test]
    fn test_phase_json_is_flat() {
        let result = PhaseResult::new(
            Phase::Spec,
            PhaseFindings::Spec(SpecFindings {
                specs_found: vec!["app.md".to_string()],
            }),
            Vec::new(),
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["phase"], "spec");
        assert_eq!(json["passed"], true);
        assert_eq!(json["findings"]["specs_found"][0], "app.md");
    }
}
