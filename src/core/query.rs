//! Read-only queries over the traceability graph
//!
//! Every call rebuilds its projection from disk, so results always reflect the
//! current state of the markdown files.

use miette::Diagnostic;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::loader::{load_crc_cards, read_code_file, read_file};
use crate::core::project::Project;
use crate::entities::{
    parse_artifacts, parse_gaps, parse_requirements, parse_traceability, Artifact, CrcCard, Gap,
    Requirement, Traceability,
};

/// Cards covering one requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementCoverage {
    pub id: String,
    pub cards: Vec<String>,
}

/// Requirement coverage in both directions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Coverage {
    /// Every known requirement in document order, with the cards referencing it
    pub requirements: Vec<RequirementCoverage>,

    /// Card file name to the requirement ids it references, known or not
    pub cards: BTreeMap<String, Vec<String>>,
}

impl Coverage {
    pub fn build(requirements: &[Requirement], cards: &[CrcCard]) -> Self {
        let mut coverage = Coverage::default();

        for req in requirements {
            if coverage.requirements.iter().any(|rc| rc.id == req.id) {
                continue;
            }
            let covering = cards
                .iter()
                .filter(|card| card.references(&req.id))
                .map(CrcCard::file_name)
                .collect();
            coverage.requirements.push(RequirementCoverage {
                id: req.id.clone(),
                cards: covering,
            });
        }

        for card in cards {
            coverage
                .cards
                .insert(card.file_name(), card.requirements.clone());
        }

        coverage
    }

    pub fn covered(&self) -> Vec<String> {
        self.requirements
            .iter()
            .filter(|rc| !rc.cards.is_empty())
            .map(|rc| rc.id.clone())
            .collect()
    }

    pub fn uncovered(&self) -> Vec<String> {
        self.requirements
            .iter()
            .filter(|rc| rc.cards.is_empty())
            .map(|rc| rc.id.clone())
            .collect()
    }
}

/// Query entry point bound to a project
pub struct Query<'p> {
    project: &'p Project,
}

impl<'p> Query<'p> {
    pub fn new(project: &'p Project) -> Self {
        Self { project }
    }

    pub fn requirements(&self) -> Result<Vec<Requirement>, QueryError> {
        let content = read_file(&self.project.requirements_path())?;
        let reqs = parse_requirements(&content, self.project.grammar());
        debug!("parsed {} requirement(s)", reqs.len());
        Ok(reqs)
    }

    /// All CRC cards in the design directory, sorted by file name
    pub fn crc_cards(&self) -> Vec<CrcCard> {
        load_crc_cards(&self.project.crc_card_paths(), self.project.grammar())
    }

    pub fn coverage(&self) -> Result<Coverage, QueryError> {
        let reqs = self.requirements()?;
        Ok(Coverage::build(&reqs, &self.crc_cards()))
    }

    /// Requirement ids no card references, in document order
    pub fn uncovered(&self) -> Result<Vec<String>, QueryError> {
        Ok(self.coverage()?.uncovered())
    }

    /// File names of cards that reference no requirement
    pub fn orphan_designs(&self) -> Vec<String> {
        self.crc_cards()
            .iter()
            .filter(|card| card.is_orphan())
            .map(CrcCard::file_name)
            .collect()
    }

    pub fn artifacts(&self) -> Result<Vec<Artifact>, QueryError> {
        let content = read_file(&self.project.design_ledger_path())?;
        Ok(parse_artifacts(&content, self.project.grammar()))
    }

    pub fn gaps(&self) -> Result<Vec<Gap>, QueryError> {
        let content = read_file(&self.project.design_ledger_path())?;
        Ok(parse_gaps(&content, self.project.grammar()))
    }

    /// Traceability comments of one file, relative paths resolved against the root
    pub fn traceability(&self, path: &Path) -> Result<Traceability, QueryError> {
        let full = self.project.root_path(path);
        let content = read_code_file(&full)?;
        Ok(parse_traceability(
            &content,
            self.project.grammar().trace_for(path),
        ))
    }

    /// Traceability of every code file listed in Artifacts
    ///
    /// Unreadable files map to an empty result.
    pub fn traceability_all(&self) -> Result<BTreeMap<String, Traceability>, QueryError> {
        let mut all = BTreeMap::new();

        for artifact in self.artifacts()? {
            for code_file in &artifact.code_files {
                if all.contains_key(&code_file.path) {
                    continue;
                }
                let trace = self
                    .traceability(Path::new(&code_file.path))
                    .unwrap_or_else(|e| {
                        warn!("{}", e);
                        Traceability::default()
                    });
                all.insert(code_file.path.clone(), trace);
            }
        }

        Ok(all)
    }

    /// Effective extension to comment-prefix map
    pub fn comment_patterns(&self) -> &BTreeMap<String, String> {
        &self.project.config().comment_patterns
    }
}

/// Errors raised by queries
#[derive(Debug, Error, Diagnostic)]
pub enum QueryError {
    #[error("cannot read {}: {error}", path.display())]
    #[diagnostic(code(minispec::query::read))]
    Read {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn project_with(files: &[(&str, &str)]) -> (TempDir, Project) {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("design")).unwrap();
        for (path, content) in files {
            let full = tmp.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        let project = Project::with_config(tmp.path(), Config::default()).unwrap();
        (tmp, project)
    }

    const REQS: &str = "\
# Requirements

## Feature: Contacts
**Source:** specs/contacts.md

- **R1:** Store contacts
- **R2:** Search contacts
- **R3:** (inferred) Export contacts
";

    #[test]
    fn test_coverage_partitions_requirements() {
        let (_tmp, project) = project_with(&[
            ("design/requirements.md", REQS),
            ("design/crc-Store.md", "# Store\n**Requirements:** R1, R9\n"),
            ("design/crc-Search.md", "# Search\n**Requirements:** R1, R2\n"),
            ("design/crc-Idle.md", "# Idle\n**Requirements:**\n"),
        ]);
        let query = Query::new(&project);

        let coverage = query.coverage().unwrap();
        let ids: Vec<_> = coverage.requirements.iter().map(|rc| rc.id.as_str()).collect();
        assert_eq!(ids, vec!["R1", "R2", "R3"]);
        assert_eq!(
            coverage.requirements[0].cards,
            vec!["crc-Search.md", "crc-Store.md"]
        );
        assert_eq!(coverage.covered(), vec!["R1", "R2"]);
        assert_eq!(coverage.uncovered(), vec!["R3"]);
        // Unknown ids only show up in the reverse map
        assert_eq!(coverage.cards["crc-Store.md"], vec!["R1", "R9"]);
        assert!(!ids.contains(&"R9"));

        for req in query.requirements().unwrap() {
            let covered = coverage.covered().contains(&req.id);
            let uncovered = coverage.uncovered().contains(&req.id);
            assert!(covered ^ uncovered, "{} must be in exactly one set", req.id);
        }

        assert_eq!(query.orphan_designs(), vec!["crc-Idle.md"]);
    }

    #[test]
    fn test_requirements_missing_file_is_error() {
        let (_tmp, project) = project_with(&[]);
        let err = Query::new(&project).requirements().unwrap_err();
        assert!(matches!(err, QueryError::Read { .. }));
    }

    #[test]
    fn test_traceability_all_substitutes_empty_for_missing() {
        let (_tmp, project) = project_with(&[
            (
                "design/design.md",
                "## Artifacts\n- [x] crc-Store.md → src/store.ts, src/gone.ts\n",
            ),
            ("src/store.ts", "// CRC: crc-Store.md | Seq: seq-save.md\n"),
        ]);

        let all = Query::new(&project).traceability_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["src/store.ts"].crc_refs, vec!["crc-Store.md"]);
        assert_eq!(all["src/store.ts"].seq_refs, vec!["seq-save.md"]);
        assert!(all["src/gone.ts"].is_empty());
    }

    #[test]
    fn test_traceability_uses_extension_pattern() {
        let (_tmp, project) = project_with(&[
            ("src/tool.py", "# CRC: crc-Tool.md\n// CRC: crc-Wrong.md\n"),
            ("src/view.html", "<!-- CRC: crc-View.md -->\n"),
        ]);
        let query = Query::new(&project);

        let py = query.traceability(Path::new("src/tool.py")).unwrap();
        assert_eq!(py.crc_refs, vec!["crc-Tool.md"]);

        let html = query.traceability(Path::new("src/view.html")).unwrap();
        assert_eq!(html.crc_refs, vec!["crc-View.md"]);

        assert!(query.traceability(Path::new("src/none.ts")).is_err());
    }
}
