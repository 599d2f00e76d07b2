//! Records extracted from requirements, CRC cards, the design ledger and source files
//!
//! Each extractor is a pure function of one file's text. Lines that match no
//! known grammar are skipped: markdown mixes prose with structured sections.

pub mod artifact;
pub mod crc;
pub mod gap;
pub mod requirement;
pub mod traceability;

pub use artifact::{parse_artifacts, Artifact, ArtifactForm, CodeFile};
pub use crc::{parse_crc_card, CrcCard};
pub use gap::{parse_gaps, Gap, GapKind};
pub use requirement::{parse_requirements, Requirement};
pub use traceability::{parse_traceability, Traceability};

use crate::core::grammar::Grammar;

/// 1-based line numbers paired with lines stripped of trailing whitespace
pub(crate) fn numbered_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end()))
}

/// Lines inside the `## <name>` section, excluding the heading itself
///
/// The section runs until the next `## ` heading or end of file.
pub(crate) fn section_lines<'a>(
    content: &'a str,
    grammar: &Grammar,
    name: &str,
) -> Vec<(usize, &'a str)> {
    let mut lines = Vec::new();
    let mut inside = false;

    for (line_no, line) in numbered_lines(content) {
        if grammar.section.is_match(line) {
            if inside {
                break;
            }
            inside = grammar.is_section(line, name);
            continue;
        }
        if inside {
            lines.push((line_no, line));
        }
    }

    lines
}

/// Split a comma-separated list, trimming entries and dropping empties
pub(crate) fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
