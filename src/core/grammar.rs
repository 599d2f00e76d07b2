//! Compiled line grammars for the markdown and source-file extractors
//!
//! Every extractor receives a [`Grammar`] explicitly instead of reaching for
//! global pattern tables, so tests can run against custom comment syntaxes.

use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

use crate::core::config::{normalize_extension, Config, ConfigError};

/// Comment prefix used for extensions without a configured pattern
pub const DEFAULT_COMMENT_PATTERN: &str = r"(?://|--|#)\s*";

/// Line patterns for every structured shape minispec recognizes
#[derive(Debug, Clone)]
pub struct Grammar {
    /// `## <section>` heading
    pub section: Regex,
    /// `### <subsection>` heading
    pub subsection: Regex,

    /// `## Feature: <name>`
    pub feature: Regex,
    /// `**Source:** <path>`
    pub source: Regex,
    /// `- **R<n>:** <text>`
    pub requirement: Regex,
    /// `(inferred)` marker at the start of a requirement text
    pub inferred: Regex,

    /// `# <name>`
    pub card_name: Regex,
    /// `**Requirements:** <comma-list>`
    pub card_requirements: Regex,
    /// `## Sequences`
    pub card_sequences: Regex,
    /// `- <file>.md`
    pub markdown_item: Regex,

    /// `- [ |x] <design>.md → <code>, <code>`
    pub inline_artifact: Regex,
    /// `  - [ |x] <code-file>` under a legacy design file line
    pub legacy_code_file: Regex,
    /// `- [ |x] <S|R|D|C|O><n>: <description>`
    pub gap: Regex,

    trace_default: TraceGrammar,
    trace_by_extension: HashMap<String, TraceGrammar>,
}

impl Grammar {
    /// Markdown grammars plus the default traceability comment syntax
    pub fn markdown() -> Self {
        Self {
            section: compile(r"^## (.+)"),
            subsection: compile(r"^### .+"),
            feature: compile(r"^## Feature:\s*(.+)"),
            source: compile(r"^\*\*Source:\*\*\s*(.+)"),
            requirement: compile(r"^- \*\*R(\d+):\*\*\s*(.+)"),
            inferred: compile(r"^\(inferred\)\s*"),
            card_name: compile(r"^# (.+)"),
            card_requirements: compile(r"^\*\*Requirements:\*\*\s*(.*)"),
            card_sequences: compile(r"^## Sequences"),
            markdown_item: compile(r"^- (.+\.md)"),
            inline_artifact: compile(r"^- \[([ x])\] ([^\s→]+\.md)(?:\s*→\s*(.+))?$"),
            legacy_code_file: compile(r"^  - \[([ x])\] (.+)"),
            gap: compile(r"^- \[([ x])\] ([SRDCO])(\d+):\s*(.+)"),
            trace_default: TraceGrammar::default(),
            trace_by_extension: HashMap::new(),
        }
    }

    /// Markdown grammars plus one traceability grammar per configured extension
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut grammar = Self::markdown();

        for (ext, pattern) in &config.comment_patterns {
            let ext = normalize_extension(ext);
            let closer = config.comment_closers.get(&ext).map(String::as_str);
            let trace = TraceGrammar::new(pattern, closer).map_err(|e| {
                ConfigError::InvalidPattern {
                    extension: ext.clone(),
                    pattern: pattern.clone(),
                    message: e.to_string(),
                }
            })?;
            grammar.trace_by_extension.insert(ext, trace);
        }

        // A closer without a pattern still applies on top of the default prefix
        for (ext, closer) in &config.comment_closers {
            let ext = normalize_extension(ext);
            if !grammar.trace_by_extension.contains_key(&ext) {
                let trace = TraceGrammar::new(DEFAULT_COMMENT_PATTERN, Some(closer)).map_err(
                    |e| ConfigError::InvalidPattern {
                        extension: ext.clone(),
                        pattern: DEFAULT_COMMENT_PATTERN.to_string(),
                        message: e.to_string(),
                    },
                )?;
                grammar.trace_by_extension.insert(ext, trace);
            }
        }

        Ok(grammar)
    }

    /// Traceability grammar for a file, chosen by its extension
    pub fn trace_for(&self, path: &Path) -> &TraceGrammar {
        path.extension()
            .map(|ext| normalize_extension(&ext.to_string_lossy()))
            .and_then(|ext| self.trace_by_extension.get(&ext))
            .unwrap_or(&self.trace_default)
    }

    /// Whether `line` is the `## <name>` heading
    pub fn is_section(&self, line: &str, name: &str) -> bool {
        self.section
            .captures(line)
            .is_some_and(|caps| caps[1].trim() == name)
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::markdown()
    }
}

/// Traceability comment syntax for one language
#[derive(Debug, Clone)]
pub struct TraceGrammar {
    line: Regex,
    closer: Option<String>,
}

impl TraceGrammar {
    /// Build from a comment prefix regex and an optional literal closer
    pub fn new(comment_pattern: &str, closer: Option<&str>) -> Result<Self, regex::Error> {
        let pattern = if comment_pattern.is_empty() {
            DEFAULT_COMMENT_PATTERN
        } else {
            comment_pattern
        };
        let line = Regex::new(&format!(
            r"{}CRC:\s*([^|]+)(?:\|\s*Seq:\s*(.+))?",
            pattern
        ))?;
        let closer = closer
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        Ok(Self { line, closer })
    }

    /// The compiled `<prefix>CRC: ... | Seq: ...` line pattern
    pub fn line_pattern(&self) -> &Regex {
        &self.line
    }

    /// Split a comma-separated reference list, dropping the closer and empties
    pub fn split_refs(&self, list: &str) -> Vec<String> {
        list.split(',')
            .map(|r| {
                let r = r.trim();
                let r = match &self.closer {
                    Some(closer) => r.strip_suffix(closer.as_str()).unwrap_or(r),
                    None => r,
                };
                r.trim().to_string()
            })
            .filter(|r| !r.is_empty())
            .collect()
    }
}

impl Default for TraceGrammar {
    fn default() -> Self {
        Self {
            line: compile(&format!(
                r"{}CRC:\s*([^|]+)(?:\|\s*Seq:\s*(.+))?",
                DEFAULT_COMMENT_PATTERN
            )),
            closer: None,
        }
    }
}

// Built-in patterns are literals; a failure here is a programming error.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_grammar_by_extension() {
        let grammar = Grammar::from_config(&Config::default()).unwrap();
        let py = grammar.trace_for(Path::new("src/app.py"));
        assert!(py.line_pattern().is_match("# CRC: crc-App.md"));
        assert!(!py.line_pattern().is_match("// CRC: crc-App.md"));

        // Unknown extension falls back to //, -- or #
        let other = grammar.trace_for(Path::new("src/app.zig"));
        assert!(other.line_pattern().is_match("// CRC: crc-App.md"));
        assert!(other.line_pattern().is_match("-- CRC: crc-App.md"));
    }

    #[test]
    fn test_invalid_comment_pattern() {
        let mut config = Config::default();
        config
            .comment_patterns
            .insert(".bad".to_string(), "(unclosed".to_string());
        let err = Grammar::from_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { ref extension, .. } if extension == ".bad"));
    }

    #[test]
    fn test_split_refs_strips_closer() {
        let trace = TraceGrammar::new(r"\{\s*", Some("}")).unwrap();
        assert_eq!(
            trace.split_refs(" crc-A.md, , crc-B.md }"),
            vec!["crc-A.md", "crc-B.md"]
        );
    }

    #[test]
    fn test_is_section() {
        let grammar = Grammar::markdown();
        assert!(grammar.is_section("## Gaps", "Gaps"));
        assert!(grammar.is_section("## Gaps  ", "Gaps"));
        assert!(!grammar.is_section("### Gaps", "Gaps"));
        assert!(!grammar.is_section("## Artifacts", "Gaps"));
    }
}
