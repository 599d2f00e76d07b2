//! Artifact records from the `## Artifacts` section of design.md
//!
//! Two encodings are accepted and produce the same logical record:
//!
//! ```text
//! - [x] crc-Store.md → src/store.ts, src/store.test.ts
//!
//! - crc-Store.md
//!   - [x] src/store.ts
//!   - [x] src/store.test.ts
//! ```

use serde::Serialize;

use crate::core::grammar::Grammar;
use crate::entities::section_lines;

/// Heading of the design ledger section holding artifacts
pub const ARTIFACTS_SECTION: &str = "Artifacts";

/// Which textual encoding an artifact was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactForm {
    Inline,
    Legacy,
}

/// An implementation file mapped to a design file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeFile {
    /// Path relative to the project root
    pub path: String,

    /// The implementer has verified this mapping
    pub checked: bool,

    /// Line carrying the checkbox
    pub line: usize,
}

/// A design file and the code files that realize it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub design_file: String,
    pub code_files: Vec<CodeFile>,
    pub line: usize,
    pub form: ArtifactForm,
}

impl Artifact {
    pub fn code_paths(&self) -> Vec<&str> {
        self.code_files.iter().map(|cf| cf.path.as_str()).collect()
    }
}

/// One recognized line of the Artifacts section
enum ArtifactLine {
    Inline(Artifact),
    LegacyHeader { design_file: String, line: usize },
    LegacyCode(CodeFile),
}

type Matcher = fn(&Grammar, usize, &str) -> Option<ArtifactLine>;

// Order matters: an inline line also looks like a legacy header.
const MATCHERS: [Matcher; 3] = [match_inline, match_legacy_header, match_legacy_code];

fn match_inline(grammar: &Grammar, line_no: usize, line: &str) -> Option<ArtifactLine> {
    let caps = grammar.inline_artifact.captures(line)?;
    let checked = &caps[1] == "x";
    let code_files = caps
        .get(3)
        .map(|list| {
            list.as_str()
                .split(',')
                .map(|cf| cf.trim().trim_matches('`').trim())
                .filter(|cf| !cf.is_empty())
                .map(|cf| CodeFile {
                    path: cf.to_string(),
                    checked,
                    line: line_no,
                })
                .collect()
        })
        .unwrap_or_default();

    Some(ArtifactLine::Inline(Artifact {
        design_file: caps[2].to_string(),
        code_files,
        line: line_no,
        form: ArtifactForm::Inline,
    }))
}

fn match_legacy_header(grammar: &Grammar, line_no: usize, line: &str) -> Option<ArtifactLine> {
    let caps = grammar.markdown_item.captures(line)?;
    Some(ArtifactLine::LegacyHeader {
        design_file: caps[1].to_string(),
        line: line_no,
    })
}

fn match_legacy_code(grammar: &Grammar, line_no: usize, line: &str) -> Option<ArtifactLine> {
    let caps = grammar.legacy_code_file.captures(line)?;
    Some(ArtifactLine::LegacyCode(CodeFile {
        path: caps[2].trim().to_string(),
        checked: &caps[1] == "x",
        line: line_no,
    }))
}

/// Extract artifacts from the `## Artifacts` section in document order
pub fn parse_artifacts(content: &str, grammar: &Grammar) -> Vec<Artifact> {
    let mut artifacts = Vec::new();
    let mut pending: Option<Artifact> = None;

    for (line_no, line) in section_lines(content, grammar, ARTIFACTS_SECTION) {
        if grammar.subsection.is_match(line) {
            continue;
        }

        let Some(matched) = MATCHERS.iter().find_map(|m| m(grammar, line_no, line)) else {
            continue;
        };

        match matched {
            ArtifactLine::Inline(artifact) => {
                artifacts.extend(pending.take());
                artifacts.push(artifact);
            }
            ArtifactLine::LegacyHeader { design_file, line } => {
                artifacts.extend(pending.take());
                pending = Some(Artifact {
                    design_file,
                    code_files: Vec::new(),
                    line,
                    form: ArtifactForm::Legacy,
                });
            }
            ArtifactLine::LegacyCode(code_file) => {
                if let Some(artifact) = pending.as_mut() {
                    artifact.code_files.push(code_file);
                }
            }
        }
    }

    artifacts.extend(pending);
    artifacts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Vec<Artifact> {
        parse_artifacts(content, &Grammar::markdown())
    }

    #[test]
    fn test_inline_and_legacy_are_equivalent() {
        let inline = parse("## Artifacts\n- [x] crc-Foo.md → a.ts, b.ts\n");
        let legacy = parse("## Artifacts\n- crc-Foo.md\n  - [x] a.ts\n  - [x] b.ts\n");

        assert_eq!(inline.len(), 1);
        assert_eq!(legacy.len(), 1);
        assert_eq!(inline[0].design_file, legacy[0].design_file);
        assert_eq!(inline[0].code_paths(), legacy[0].code_paths());
        assert_eq!(inline[0].code_paths(), vec!["a.ts", "b.ts"]);
        assert!(inline[0].code_files.iter().all(|cf| cf.checked));
        assert!(legacy[0].code_files.iter().all(|cf| cf.checked));
        assert_eq!(inline[0].form, ArtifactForm::Inline);
        assert_eq!(legacy[0].form, ArtifactForm::Legacy);
    }

    #[test]
    fn test_mixed_forms_flush_pending_legacy() {
        let content = "\
# Design

## Artifacts

### CRC Cards
- crc-A.md
  - [ ] src/a.ts
- [ ] crc-B.md → `src/b.ts`
- crc-C.md
  - [x] src/c.ts
  - [ ] src/c2.ts
- [x] seq-flow.md

## Gaps
- crc-Ignored.md
";
        let artifacts = parse(content);
        let names: Vec<_> = artifacts.iter().map(|a| a.design_file.as_str()).collect();
        assert_eq!(names, vec!["crc-A.md", "crc-B.md", "crc-C.md", "seq-flow.md"]);

        assert_eq!(artifacts[0].code_paths(), vec!["src/a.ts"]);
        assert_eq!(artifacts[1].code_paths(), vec!["src/b.ts"]);
        assert_eq!(artifacts[2].code_files.len(), 2);
        assert!(artifacts[2].code_files[0].checked);
        assert!(!artifacts[2].code_files[1].checked);
        assert_eq!(artifacts[2].code_files[1].line, 11);
        assert!(artifacts[3].code_files.is_empty());
    }

    #[test]
    fn test_code_line_without_header_is_ignored() {
        let artifacts = parse("## Artifacts\n  - [x] orphan.ts\n- crc-A.md\n");
        assert_eq!(artifacts.len(), 1);
        assert!(artifacts[0].code_files.is_empty());
    }

    #[test]
    fn test_no_artifacts_section() {
        assert!(parse("# Design\n- crc-A.md\n").is_empty());
    }

    #[test]
    fn test_duplicate_design_file_yields_two_records() {
        let artifacts = parse("## Artifacts\n- [x] crc-A.md → a.ts\n- crc-A.md\n  - [ ] b.ts\n");
        assert_eq!(artifacts.len(), 2);
        assert!(artifacts.iter().all(|a| a.design_file == "crc-A.md"));
    }
}
