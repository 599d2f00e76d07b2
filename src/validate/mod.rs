//! Structural validation of the traceability graph
//!
//! [`Validator::run`] executes every integrity rule in a fixed order and
//! collects the findings into a [`ValidationReport`]. [`Validator::run_phase`]
//! runs the subset belonging to one workflow phase.

pub mod phase;
pub mod report;
pub mod rules;

pub use phase::{Phase, PhaseFindings, PhaseResult};
pub use report::{
    ArtifactFinding, CodeFileFinding, CoverageFindings, RequirementsFindings, ValidationReport,
};

use std::fs;
use tracing::debug;

use crate::core::loader::read_file;
use crate::core::project::{Project, DESIGN_LEDGER_FILE, REQUIREMENTS_FILE};
use crate::core::query::{Coverage, Query};
use crate::entities::{parse_artifacts, parse_gaps, Artifact, Gap, Requirement};
use phase::{DesignFindings, GapsFindings, ImplementationFindings, SpecFindings};

/// Runs validation rules against a project
pub struct Validator<'p> {
    project: &'p Project,
}

impl<'p> Validator<'p> {
    pub fn new(project: &'p Project) -> Self {
        Self { project }
    }

    /// Run every rule and collect a full report
    ///
    /// A file that cannot be loaded becomes an issue, and the rules that need
    /// it are skipped.
    pub fn run(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        let issues = &mut report.issues;

        let requirements = self.load_requirements(issues);
        let cards = Query::new(self.project).crc_cards();
        let ledger = self.load_ledger(issues);

        if let Some(reqs) = &requirements {
            rules::check_numbering(reqs, issues);
            report.requirements = rules::check_sources(self.project, reqs, issues);
            report.crc_cards = rules::check_card_references(&cards, reqs, issues);
            let coverage = Coverage::build(reqs, &cards);
            report.coverage = rules::check_coverage(&coverage, issues);
        }

        if let Some((artifacts, _)) = &ledger {
            rules::check_completeness(self.project, artifacts, issues);
            report.artifacts = rules::check_code_files(self.project, artifacts, issues);
        }

        rules::check_card_sequences(self.project, &cards, issues);

        if let Some((_, gaps)) = ledger {
            rules::check_gap_ids(&gaps, issues);
            report.gaps = gaps;
        }

        debug!("validation finished with {} issue(s)", report.issues.len());
        report
    }

    /// Run the checks belonging to one phase
    pub fn run_phase(&self, phase: Phase) -> PhaseResult {
        let mut issues = Vec::new();
        let findings = match phase {
            Phase::Spec => self.spec_phase(&mut issues),
            Phase::Requirements => self.requirements_phase(&mut issues),
            Phase::Design => self.design_phase(&mut issues),
            Phase::Implementation => self.implementation_phase(&mut issues),
            Phase::Gaps => self.gaps_phase(&mut issues),
        }
        .unwrap_or_else(|| PhaseFindings::empty(phase));

        debug!("phase {} finished with {} issue(s)", phase, issues.len());
        PhaseResult::new(phase, findings, issues)
    }

    fn spec_phase(&self, issues: &mut Vec<String>) -> Option<PhaseFindings> {
        let specs_dir = &self.project.config().specs_dir;
        let paths = match self.project.spec_files() {
            Ok(paths) => paths,
            Err(e) => {
                issues.push(format!("{}/ directory: {}", specs_dir, e));
                return None;
            }
        };

        let specs: Vec<(String, u64)> = paths
            .iter()
            .filter_map(|path| {
                let len = fs::metadata(path).ok()?.len();
                let name = path.file_name()?.to_string_lossy().into_owned();
                Some((name, len))
            })
            .collect();

        for (name, len) in &specs {
            if *len == 0 {
                issues.push(format!("{}: empty file", name));
            }
        }
        if specs.is_empty() {
            issues.push(format!("no spec files found in {}/", specs_dir));
        }

        Some(PhaseFindings::Spec(SpecFindings {
            specs_found: specs.into_iter().map(|(name, _)| name).collect(),
        }))
    }

    fn requirements_phase(&self, issues: &mut Vec<String>) -> Option<PhaseFindings> {
        let reqs = self.load_requirements(issues)?;
        if reqs.is_empty() {
            issues.push("no requirements found".to_string());
            return None;
        }

        rules::check_numbering(&reqs, issues);
        let findings = rules::check_sources(self.project, &reqs, issues);
        Some(PhaseFindings::Requirements(findings))
    }

    fn design_phase(&self, issues: &mut Vec<String>) -> Option<PhaseFindings> {
        let reqs = self.load_requirements(issues)?;
        let (artifacts, _) = self.load_ledger(issues)?;
        let cards = Query::new(self.project).crc_cards();

        let crc_cards = rules::check_card_references(&cards, &reqs, issues);
        let coverage = rules::check_coverage(&Coverage::build(&reqs, &cards), issues);
        let design_files = rules::check_completeness(self.project, &artifacts, issues);
        rules::check_card_sequences(self.project, &cards, issues);

        Some(PhaseFindings::Design(DesignFindings {
            crc_cards,
            covered: coverage.covered,
            uncovered: coverage.uncovered,
            design_files,
        }))
    }

    fn implementation_phase(&self, issues: &mut Vec<String>) -> Option<PhaseFindings> {
        let (artifacts, _) = self.load_ledger(issues)?;

        let code_files = rules::check_code_files(self.project, &artifacts, issues)
            .into_iter()
            .flat_map(|artifact| artifact.code_files)
            .collect();
        let unlisted = rules::unlisted_code_files(self.project, &artifacts);

        Some(PhaseFindings::Implementation(ImplementationFindings {
            code_files,
            unlisted,
        }))
    }

    fn gaps_phase(&self, issues: &mut Vec<String>) -> Option<PhaseFindings> {
        let (_, gaps) = self.load_ledger(issues)?;
        rules::check_gap_ids(&gaps, issues);

        let (resolved, open): (Vec<&Gap>, Vec<&Gap>) = gaps.iter().partition(|g| g.resolved);
        Some(PhaseFindings::Gaps(GapsFindings {
            open: open.iter().map(|g| g.id.clone()).collect(),
            resolved: resolved.iter().map(|g| g.id.clone()).collect(),
            total: gaps.len(),
        }))
    }

    fn load_requirements(&self, issues: &mut Vec<String>) -> Option<Vec<Requirement>> {
        Query::new(self.project)
            .requirements()
            .map_err(|e| issues.push(format!("{}: {}", REQUIREMENTS_FILE, e)))
            .ok()
    }

    /// Artifacts and gaps from one read of design.md
    fn load_ledger(&self, issues: &mut Vec<String>) -> Option<(Vec<Artifact>, Vec<Gap>)> {
        let content = read_file(&self.project.design_ledger_path())
            .map_err(|e| issues.push(format!("{}: {}", DESIGN_LEDGER_FILE, e)))
            .ok()?;
        let grammar = self.project.grammar();
        Some((
            parse_artifacts(&content, grammar),
            parse_gaps(&content, grammar),
        ))
    }
}
