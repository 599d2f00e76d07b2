//! CRC card records from crc-*.md files

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::core::grammar::Grammar;
use crate::entities::{numbered_lines, split_list};

/// A parsed CRC card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrcCard {
    /// Text of the first `# ` heading
    pub name: String,

    /// Requirement ids the card claims to satisfy
    pub requirements: Vec<String>,

    /// Sequence files listed under `## Sequences`, in order
    pub sequences: Vec<String>,

    /// File the card was parsed from
    pub path: PathBuf,

    /// Line of the `**Requirements:**` declaration, used as the edit anchor
    pub requirements_line: Option<usize>,
}

impl CrcCard {
    /// A card with no requirement references
    pub fn is_orphan(&self) -> bool {
        self.requirements.is_empty()
    }

    /// File name of the card, as referenced from other design files
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }

    pub fn references(&self, requirement_id: &str) -> bool {
        self.requirements.iter().any(|r| r == requirement_id)
    }
}

/// Extract a CRC card in a single pass
///
/// Only the first `**Requirements:**` line counts. `## Sequences` switches on
/// sequence collection until the next `## ` heading.
pub fn parse_crc_card(path: &Path, content: &str, grammar: &Grammar) -> CrcCard {
    let mut card = CrcCard {
        name: String::new(),
        requirements: Vec::new(),
        sequences: Vec::new(),
        path: path.to_path_buf(),
        requirements_line: None,
    };
    let mut in_sequences = false;

    for (line_no, line) in numbered_lines(content) {
        if card.name.is_empty() {
            if let Some(caps) = grammar.card_name.captures(line) {
                card.name = caps[1].trim().to_string();
                continue;
            }
        }

        if let Some(caps) = grammar.card_requirements.captures(line) {
            if card.requirements_line.is_none() {
                card.requirements_line = Some(line_no);
                card.requirements = split_list(&caps[1]);
            }
            continue;
        }

        if grammar.card_sequences.is_match(line) {
            in_sequences = true;
            continue;
        }

        if line.starts_with("## ") {
            in_sequences = false;
            continue;
        }

        if in_sequences {
            if let Some(caps) = grammar.markdown_item.captures(line) {
                card.sequences.push(caps[1].trim().to_string());
            }
        }
    }

    card
}
