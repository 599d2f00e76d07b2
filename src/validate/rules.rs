//! Integrity rules
//!
//! Each rule appends human-readable issues and returns the findings it
//! gathered along the way. Rules never fail: a broken link is an issue, not
//! an error.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use crate::core::project::Project;
use crate::core::query::{Coverage, Query, QueryError};
use crate::entities::{Artifact, CrcCard, Gap, Requirement};
use crate::validate::report::{
    ArtifactFinding, CodeFileFinding, CoverageFindings, RequirementsFindings,
};

/// Requirement numbers must run R1, R2, ... in document order
///
/// After each entry the expectation resets to its number plus one, so a single
/// gap yields a single issue.
pub fn check_numbering(requirements: &[Requirement], issues: &mut Vec<String>) {
    let mut expected = 1;
    for req in requirements {
        if req.number != expected {
            issues.push(format!(
                "non-sequential: expected R{}, found {}",
                expected, req.id
            ));
        }
        expected = req.number.saturating_add(1);
    }
}

/// Every `**Source:**` path must exist relative to the project root
pub fn check_sources(
    project: &Project,
    requirements: &[Requirement],
    issues: &mut Vec<String>,
) -> RequirementsFindings {
    let mut findings = RequirementsFindings::default();
    let mut checked = HashSet::new();

    for req in requirements {
        findings.found.push(req.id.clone());
        if req.inferred {
            findings.inferred.push(req.id.clone());
        }
        let Some(source) = &req.source else {
            continue;
        };
        findings
            .sources
            .entry(source.clone())
            .or_default()
            .push(req.id.clone());

        if checked.insert(source.as_str()) && !project.root_path(source).exists() {
            issues.push(format!("{}: referenced as Source but file missing", source));
        }
    }

    findings
}

/// Cards must declare requirements, and only known ones
pub fn check_card_references(
    cards: &[CrcCard],
    requirements: &[Requirement],
    issues: &mut Vec<String>,
) -> BTreeMap<String, Vec<String>> {
    let known: HashSet<&str> = requirements.iter().map(|r| r.id.as_str()).collect();
    let mut declared = BTreeMap::new();

    for card in cards {
        let name = card.file_name();
        if card.requirements.is_empty() {
            issues.push(format!("{}: no Requirements field", name));
        }
        for id in &card.requirements {
            if !known.contains(id.as_str()) {
                issues.push(format!("{}: references unknown {}", name, id));
            }
        }
        declared.insert(name, card.requirements.clone());
    }

    declared
}

/// Every requirement must be referenced by at least one card
pub fn check_coverage(coverage: &Coverage, issues: &mut Vec<String>) -> CoverageFindings {
    let findings = CoverageFindings {
        covered: coverage.covered(),
        uncovered: coverage.uncovered(),
    };
    if !findings.uncovered.is_empty() {
        issues.push(format!(
            "uncovered requirements: {}",
            findings.uncovered.join(", ")
        ));
    }
    findings
}

/// Every tracked design file must be named by some artifact
///
/// Returns the number of tracked design files found.
pub fn check_completeness(
    project: &Project,
    artifacts: &[Artifact],
    issues: &mut Vec<String>,
) -> usize {
    let listed: HashSet<&str> = artifacts.iter().map(|a| a.design_file.as_str()).collect();
    let design_files = project.tracked_design_files();

    for file in &design_files {
        if !listed.contains(file.as_str()) {
            issues.push(format!("{}: not listed in Artifacts", file));
        }
    }

    design_files.len()
}

/// Listed code files must exist when checked and carry resolvable traceability
pub fn check_code_files(
    project: &Project,
    artifacts: &[Artifact],
    issues: &mut Vec<String>,
) -> Vec<ArtifactFinding> {
    let query = Query::new(project);

    artifacts
        .iter()
        .map(|artifact| ArtifactFinding {
            design_file: artifact.design_file.clone(),
            code_files: artifact
                .code_files
                .iter()
                .map(|code_file| {
                    let exists = project.root_path(&code_file.path).exists();
                    let mut finding = CodeFileFinding {
                        path: code_file.path.clone(),
                        checked: code_file.checked,
                        exists,
                        crc_refs: Vec::new(),
                        seq_refs: Vec::new(),
                    };

                    if !exists {
                        if code_file.checked {
                            issues.push(format!("{}: checked but file missing", code_file.path));
                        }
                        return finding;
                    }

                    let trace = match query.traceability(Path::new(&code_file.path)) {
                        Ok(trace) => trace,
                        Err(QueryError::Read { error, .. }) => {
                            issues.push(format!("{}: cannot read: {}", code_file.path, error));
                            return finding;
                        }
                    };
                    if trace.crc_refs.is_empty() {
                        issues.push(format!("{}: missing traceability comment", code_file.path));
                    }
                    for reference in trace.all_refs() {
                        if !project.design_path(reference).exists() {
                            issues.push(format!(
                                "{}: references {} which does not exist",
                                code_file.path, reference
                            ));
                        }
                    }

                    finding.crc_refs = trace.crc_refs;
                    finding.seq_refs = trace.seq_refs;
                    finding
                })
                .collect(),
        })
        .collect()
}

/// Sequences listed on a card must exist in the design directory
pub fn check_card_sequences(project: &Project, cards: &[CrcCard], issues: &mut Vec<String>) {
    for card in cards {
        for seq in &card.sequences {
            if !project.design_path(seq).exists() {
                issues.push(format!(
                    "{} Sequences: {} does not exist",
                    card.file_name(),
                    seq
                ));
            }
        }
    }
}

/// Gap ids must be unique; each repeat is reported
pub fn check_gap_ids(gaps: &[Gap], issues: &mut Vec<String>) {
    let mut seen = HashSet::new();
    for gap in gaps {
        if !seen.insert(gap.id.as_str()) {
            issues.push(format!("duplicate gap ID: {}", gap.id));
        }
    }
}

/// Code files under the source directory that no artifact lists
pub fn unlisted_code_files(project: &Project, artifacts: &[Artifact]) -> Vec<String> {
    let listed: BTreeSet<String> = artifacts
        .iter()
        .flat_map(|a| a.code_files.iter())
        .map(|cf| normalize_path(&cf.path))
        .collect();

    project
        .iter_code_files()
        .filter_map(|path| {
            let relative = path.strip_prefix(project.root()).ok()?;
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            (!listed.contains(&relative)).then_some(relative)
        })
        .collect()
}

fn normalize_path(path: &str) -> String {
    path.trim().trim_start_matches("./").replace('\\', "/")
}
