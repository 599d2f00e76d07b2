//! Traceability comments in implementation files

use serde::Serialize;

use crate::core::grammar::TraceGrammar;

/// Design files a source file declares it implements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Traceability {
    pub crc_refs: Vec<String>,
    pub seq_refs: Vec<String>,
}

impl Traceability {
    pub fn is_empty(&self) -> bool {
        self.crc_refs.is_empty() && self.seq_refs.is_empty()
    }

    /// CRC references followed by sequence references
    pub fn all_refs(&self) -> impl Iterator<Item = &str> {
        self.crc_refs
            .iter()
            .chain(self.seq_refs.iter())
            .map(String::as_str)
    }
}

/// Collect `CRC: ... | Seq: ...` references from every matching line
pub fn parse_traceability(content: &str, trace: &TraceGrammar) -> Traceability {
    let mut result = Traceability::default();

    for line in content.lines() {
        if let Some(caps) = trace.line_pattern().captures(line) {
            result.crc_refs.extend(trace.split_refs(&caps[1]));
            if let Some(seq) = caps.get(2) {
                result.seq_refs.extend(trace.split_refs(seq.as_str()));
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc_and_seq_refs() {
        let content = "// CRC: crc-Foo.md | Seq: seq-bar.md\npackage foo\n";
        let trace = parse_traceability(content, &TraceGrammar::default());
        assert_eq!(trace.crc_refs, vec!["crc-Foo.md"]);
        assert_eq!(trace.seq_refs, vec!["seq-bar.md"]);
    }

    #[test]
    fn test_multiple_refs_and_lines() {
        let content = "\
# CRC: crc-A.md, crc-B.md
import os
# CRC: crc-C.md | Seq: seq-1.md, seq-2.md
";
        let trace = parse_traceability(content, &TraceGrammar::new(r"#\s*", None).unwrap());
        assert_eq!(trace.crc_refs, vec!["crc-A.md", "crc-B.md", "crc-C.md"]);
        assert_eq!(trace.seq_refs, vec!["seq-1.md", "seq-2.md"]);
    }

    #[test]
    fn test_block_comment_closer() {
        let content = "<!-- CRC: crc-View.md | Seq: seq-render.md -->\n<div></div>\n";
        let grammar = TraceGrammar::new(r"<!--\s*", Some("-->")).unwrap();
        let trace = parse_traceability(content, &grammar);
        assert_eq!(trace.crc_refs, vec!["crc-View.md"]);
        assert_eq!(trace.seq_refs, vec!["seq-render.md"]);

        let content = "<!-- CRC: crc-View.md -->\n";
        let trace = parse_traceability(content, &grammar);
        assert_eq!(trace.crc_refs, vec!["crc-View.md"]);
        assert!(trace.seq_refs.is_empty());
    }

    #[test]
    fn test_no_comment() {
        let trace = parse_traceability("fn main() {}\n", &TraceGrammar::default());
        assert!(trace.is_empty());
    }

    #[test]
    fn test_prefix_must_match_language() {
        let python = TraceGrammar::new(r"#\s*", None).unwrap();
        let trace = parse_traceability("// CRC: crc-Foo.md\n", &python);
        assert!(trace.is_empty());
    }
}
