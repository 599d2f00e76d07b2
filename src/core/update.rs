//! Text edits on design files
//!
//! Each edit is a pure function from old text to new text. [`Updater`] wraps
//! them with a whole-file read and write. Lines keep their original endings,
//! and inserted lines follow the file's `\r\n` convention.

use miette::Diagnostic;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::grammar::Grammar;
use crate::core::loader::read_file;
use crate::core::project::{Project, DESIGN_LEDGER_FILE};
use crate::core::query::QueryError;
use crate::entities::gap::GAPS_SECTION;
use crate::entities::{parse_crc_card, parse_gaps, GapKind};

/// Set the checkbox of the first list item naming `item`
///
/// An item followed by `→` or `:` is matched first, then a bare item at end of
/// line. Only the mark character changes.
pub fn set_checkbox(content: &str, item: &str, checked: bool) -> Result<String, EditError> {
    let item_re = regex::escape(item);
    let patterns = [
        Regex::new(&format!(r"^(\s*-\s*)\[([ x])\](\s*{}\s*[→:].*)$", item_re))?,
        Regex::new(&format!(r"^(\s*-\s*)\[([ x])\](\s*{}\s*)$", item_re))?,
    ];
    let mark = if checked { "x" } else { " " };

    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let body = line_body(line);
        let mark_at = patterns
            .iter()
            .find_map(|re| re.captures(body))
            .and_then(|caps| caps.get(2))
            .map(|m| offset + m.start());

        if let Some(at) = mark_at {
            let mut updated = String::with_capacity(content.len());
            updated.push_str(&content[..at]);
            updated.push_str(mark);
            updated.push_str(&content[at + 1..]);
            return Ok(updated);
        }
        offset += line.len();
    }

    Err(EditError::ItemNotFound {
        item: item.to_string(),
    })
}

/// Add a requirement id to a card's `**Requirements:**` line
///
/// Adding an id the card already lists returns the text unchanged.
pub fn add_requirement_ref(content: &str, grammar: &Grammar, id: &str) -> Result<String, EditError> {
    let card = parse_crc_card(Path::new(""), content, grammar);
    let Some(anchor) = card.requirements_line else {
        return Err(EditError::NoRequirementsLine);
    };
    if card.references(id) {
        return Ok(content.to_string());
    }

    let mut refs = card.requirements;
    refs.push(id.to_string());
    Ok(rewrite_requirements(content, grammar, anchor, &refs))
}

/// Remove a requirement id from a card's `**Requirements:**` line
///
/// The remaining ids keep their order. Removing an absent id is a no-op.
pub fn remove_requirement_ref(content: &str, grammar: &Grammar, id: &str) -> String {
    let card = parse_crc_card(Path::new(""), content, grammar);
    let Some(anchor) = card.requirements_line else {
        return content.to_string();
    };
    if !card.references(id) {
        return content.to_string();
    }

    let refs: Vec<String> = card.requirements.into_iter().filter(|r| r != id).collect();
    rewrite_requirements(content, grammar, anchor, &refs)
}

/// Rebuild the ids of a `**Requirements:**` line
///
/// Ids are rejoined with ", ". Trailing whitespace after the list is kept, and
/// an emptied list leaves no dangling space after the label.
fn rewrite_requirements(content: &str, grammar: &Grammar, anchor: usize, refs: &[String]) -> String {
    replace_line(content, anchor, |body| {
        let trimmed = body.trim_end();
        let trailing = &body[trimmed.len()..];
        let prefix = grammar
            .card_requirements
            .captures(trimmed)
            .and_then(|caps| caps.get(1))
            .map_or(trimmed, |list| &trimmed[..list.start()]);

        if refs.is_empty() {
            return format!("{}{}", prefix.trim_end(), trailing);
        }
        let mut line = prefix.to_string();
        if !prefix.ends_with(char::is_whitespace) {
            line.push(' ');
        }
        line.push_str(&refs.join(", "));
        line.push_str(trailing);
        line
    })
}

/// Append a new open gap to the `## Gaps` section
///
/// The id is one past the highest existing number of that kind. Returns the
/// new text and the new id.
pub fn add_gap(
    content: &str,
    grammar: &Grammar,
    kind: GapKind,
    description: &str,
) -> Result<(String, String), EditError> {
    let next = parse_gaps(content, grammar)
        .iter()
        .filter(|g| g.kind == kind)
        .map(|g| g.number)
        .max()
        .unwrap_or(0)
        + 1;
    let id = format!("{}{}", kind.letter(), next);

    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let heading = lines
        .iter()
        .position(|line| grammar.is_section(line_body(line).trim_end(), GAPS_SECTION))
        .ok_or(EditError::NoGapsSection)?;

    let mut insert_after = heading;
    for (i, line) in lines.iter().enumerate().skip(heading + 1) {
        let body = line_body(line).trim_end();
        if grammar.section.is_match(body) {
            break;
        }
        if !body.is_empty() {
            insert_after = i;
        }
    }

    let eol = if lines[heading].ends_with("\r\n") {
        "\r\n"
    } else {
        "\n"
    };
    let new_line = format!("- [ ] {}: {}", id, description.trim());

    let mut updated = String::with_capacity(content.len() + new_line.len() + 2);
    for (i, line) in lines.iter().enumerate() {
        updated.push_str(line);
        if i == insert_after {
            if !line.ends_with('\n') {
                updated.push_str(eol);
            }
            updated.push_str(&new_line);
            updated.push_str(eol);
        }
    }

    Ok((updated, id))
}

/// A line without its `\n` or `\r\n` terminator
fn line_body(line: &str) -> &str {
    line.trim_end_matches(|c| c == '\n' || c == '\r')
}

/// Replace the body of 1-based line `line_no`, keeping its terminator
fn replace_line(content: &str, line_no: usize, f: impl FnOnce(&str) -> String) -> String {
    let mut updated = String::with_capacity(content.len() + 16);
    let mut f = Some(f);

    for (i, line) in content.split_inclusive('\n').enumerate() {
        match (i + 1 == line_no, f.take()) {
            (true, Some(f)) => {
                let body = line_body(line);
                updated.push_str(&f(body));
                updated.push_str(&line[body.len()..]);
            }
            (_, rest) => {
                f = rest;
                updated.push_str(line);
            }
        }
    }

    updated
}

/// Applies edits to files on disk
pub struct Updater<'p> {
    project: &'p Project,
}

impl<'p> Updater<'p> {
    pub fn new(project: &'p Project) -> Self {
        Self { project }
    }

    /// Check an item in a design-directory file
    pub fn check(&self, file: &str, item: &str) -> Result<bool, UpdateError> {
        self.rewrite(file, |content| set_checkbox(content, item, true))
    }

    /// Uncheck an item in a design-directory file
    pub fn uncheck(&self, file: &str, item: &str) -> Result<bool, UpdateError> {
        self.rewrite(file, |content| set_checkbox(content, item, false))
    }

    pub fn add_ref(&self, card: &str, id: &str) -> Result<bool, UpdateError> {
        let grammar = self.project.grammar();
        self.rewrite(card, |content| add_requirement_ref(content, grammar, id))
    }

    pub fn remove_ref(&self, card: &str, id: &str) -> Result<bool, UpdateError> {
        let grammar = self.project.grammar();
        self.rewrite(card, |content| {
            Ok(remove_requirement_ref(content, grammar, id))
        })
    }

    /// Append a gap to design.md and return its new id
    pub fn add_gap(&self, kind: GapKind, description: &str) -> Result<String, UpdateError> {
        let grammar = self.project.grammar();
        let mut new_id = String::new();
        self.rewrite(DESIGN_LEDGER_FILE, |content| {
            let (updated, id) = add_gap(content, grammar, kind, description)?;
            new_id = id;
            Ok(updated)
        })?;
        Ok(new_id)
    }

    /// Mark a gap in design.md as resolved
    pub fn resolve_gap(&self, id: &str) -> Result<bool, UpdateError> {
        self.check(DESIGN_LEDGER_FILE, id)
    }

    /// Read, edit and write back a design file; writes only if the text changed
    fn rewrite(
        &self,
        file: &str,
        edit: impl FnOnce(&str) -> Result<String, EditError>,
    ) -> Result<bool, UpdateError> {
        let path = self.project.design_path(file);
        let content = read_file(&path)?;

        let updated = edit(&content).map_err(|error| UpdateError::Edit {
            file: file.to_string(),
            error,
        })?;

        if updated == content {
            debug!("{} unchanged", path.display());
            return Ok(false);
        }

        fs::write(&path, updated).map_err(|error| UpdateError::Write {
            path: path.clone(),
            error,
        })?;
        info!("updated {}", path.display());
        Ok(true)
    }
}

/// Failures of a pure text edit
#[derive(Debug, Error, Diagnostic)]
pub enum EditError {
    #[error("item '{item}' not found")]
    #[diagnostic(code(minispec::update::item_not_found))]
    ItemNotFound { item: String },

    #[error("no **Requirements:** line")]
    #[diagnostic(
        code(minispec::update::no_requirements_line),
        help("add a `**Requirements:**` line to the card")
    )]
    NoRequirementsLine,

    #[error("no ## Gaps section")]
    #[diagnostic(
        code(minispec::update::no_gaps_section),
        help("add a `## Gaps` heading to design.md")
    )]
    NoGapsSection,

    #[error("invalid item pattern: {0}")]
    #[diagnostic(code(minispec::update::invalid_item))]
    InvalidItem(#[from] regex::Error),
}

/// Failures of an on-disk update
#[derive(Debug, Error, Diagnostic)]
pub enum UpdateError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Read(#[from] QueryError),

    #[error("cannot write {}: {error}", path.display())]
    #[diagnostic(code(minispec::update::write))]
    Write {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("{file}: {error}")]
    #[diagnostic(code(minispec::update::edit))]
    Edit {
        file: String,
        #[source]
        error: EditError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use tempfile::tempdir;

    fn grammar() -> Grammar {
        Grammar::markdown()
    }

    const DESIGN: &str = "\
# Design

## Artifacts
- [ ] crc-Store.md → src/store.ts
- crc-Search.md
  - [ ] src/search.ts
- [ ] seq-save.md

## Gaps
- [ ] D1: First design gap
- [x] D3: Resolved design gap
- [ ] C1: Code gap

## Notes
Free text.
";

    #[test]
    fn test_check_inline_artifact() {
        let updated = set_checkbox(DESIGN, "crc-Store.md", true).unwrap();
        assert!(updated.contains("- [x] crc-Store.md → src/store.ts\n"));
        assert_eq!(updated.len(), DESIGN.len());
    }

    #[test]
    fn test_check_legacy_code_file_and_bare_item() {
        let updated = set_checkbox(DESIGN, "src/search.ts", true).unwrap();
        assert!(updated.contains("  - [x] src/search.ts\n"));

        let updated = set_checkbox(DESIGN, "seq-save.md", true).unwrap();
        assert!(updated.contains("- [x] seq-save.md\n"));
    }

    #[test]
    fn test_uncheck_gap_by_id() {
        let updated = set_checkbox(DESIGN, "D3", false).unwrap();
        assert!(updated.contains("- [ ] D3: Resolved design gap\n"));
    }

    #[test]
    fn test_checkbox_item_not_found() {
        let err = set_checkbox(DESIGN, "D2", true).unwrap_err();
        assert!(matches!(err, EditError::ItemNotFound { ref item } if item == "D2"));
        // "D1" must not match a prefix of another id
        assert!(set_checkbox("- [ ] D10: x\n", "D1", true).is_err());
    }

    #[test]
    fn test_checkbox_item_is_literal() {
        let content = "- [ ] a.b.md\n- [ ] a+b.md\n";
        let updated = set_checkbox(content, "a+b.md", true).unwrap();
        assert_eq!(updated, "- [ ] a.b.md\n- [x] a+b.md\n");
    }

    #[test]
    fn test_checkbox_preserves_crlf() {
        let content = "## Gaps\r\n- [ ] S1: scope\r\n";
        let updated = set_checkbox(content, "S1", true).unwrap();
        assert_eq!(updated, "## Gaps\r\n- [x] S1: scope\r\n");
    }

    #[test]
    fn test_add_ref_appends_and_is_idempotent() {
        let card = "# Store\n\n**Requirements:** R1, R3\n\n## Knows\n";
        let updated = add_requirement_ref(card, &grammar(), "R2").unwrap();
        assert_eq!(updated, "# Store\n\n**Requirements:** R1, R3, R2\n\n## Knows\n");

        let again = add_requirement_ref(&updated, &grammar(), "R2").unwrap();
        assert_eq!(again, updated);
    }

    #[test]
    fn test_add_ref_to_empty_list() {
        let updated = add_requirement_ref("# A\n**Requirements:**\n", &grammar(), "R7").unwrap();
        assert_eq!(updated, "# A\n**Requirements:** R7\n");
    }

    #[test]
    fn test_add_ref_requires_anchor() {
        let err = add_requirement_ref("# A\n\nprose\n", &grammar(), "R1").unwrap_err();
        assert!(matches!(err, EditError::NoRequirementsLine));
    }

    #[test]
    fn test_remove_ref_keeps_order() {
        let card = "# A\r\n**Requirements:** R1, R2, R3\r\n";
        let updated = remove_requirement_ref(card, &grammar(), "R2");
        assert_eq!(updated, "# A\r\n**Requirements:** R1, R3\r\n");

        assert_eq!(remove_requirement_ref(card, &grammar(), "R9"), card);
    }

    #[test]
    fn test_remove_ref_undoes_add_ref() {
        let cards = [
            "# A\n**Requirements:**\n",
            "# A\n**Requirements:** \n",
            "# A\r\n**Requirements:**\r\n\n## Knows\r\n",
            "# Store\r\n\r\n**Requirements:** R1, R3\r\n",
            "# Store\n**Requirements:** R1  \n",
        ];
        for card in cards {
            let added = add_requirement_ref(card, &grammar(), "R7").unwrap();
            assert_ne!(added, card);
            assert_eq!(remove_requirement_ref(&added, &grammar(), "R7"), card);
        }
    }

    #[test]
    fn test_remove_last_ref_leaves_bare_label() {
        let updated = remove_requirement_ref("# A\n**Requirements:** R1\n", &grammar(), "R1");
        assert_eq!(updated, "# A\n**Requirements:**\n");
    }

    #[test]
    fn test_uncheck_undoes_check() {
        let crlf = DESIGN.replace('\n', "\r\n");
        for content in [DESIGN, crlf.as_str()] {
            for item in ["crc-Store.md", "src/search.ts", "seq-save.md", "D1", "C1"] {
                let checked = set_checkbox(content, item, true).unwrap();
                assert_ne!(checked, content);
                assert_eq!(set_checkbox(&checked, item, false).unwrap(), content);
            }
        }
    }

    #[test]
    fn test_add_gap_numbers_per_kind() {
        let (updated, id) = add_gap(DESIGN, &grammar(), GapKind::Design, "New gap").unwrap();
        assert_eq!(id, "D4");
        assert!(updated.contains("- [ ] C1: Code gap\n- [ ] D4: New gap\n\n## Notes\n"));

        let (_, id) = add_gap(DESIGN, &grammar(), GapKind::Scope, "Scope gap").unwrap();
        assert_eq!(id, "S1");
    }

    #[test]
    fn test_add_gap_to_empty_section() {
        let content = "## Gaps\n\n## Notes\n";
        let (updated, id) = add_gap(content, &grammar(), GapKind::Other, "misc").unwrap();
        assert_eq!(id, "O1");
        assert_eq!(updated, "## Gaps\n- [ ] O1: misc\n\n## Notes\n");
    }

    #[test]
    fn test_add_gap_at_end_of_file_without_newline() {
        let content = "## Gaps\r\n- [ ] R1: one";
        let (updated, id) = add_gap(content, &grammar(), GapKind::Requirements, "two").unwrap();
        assert_eq!(id, "R2");
        assert_eq!(updated, "## Gaps\r\n- [ ] R1: one\r\n- [ ] R2: two\r\n");
    }

    #[test]
    fn test_add_gap_requires_section() {
        let err = add_gap("# Design\n", &grammar(), GapKind::Code, "x").unwrap_err();
        assert!(matches!(err, EditError::NoGapsSection));
    }

    #[test]
    fn test_updater_writes_only_on_change() {
        let tmp = tempdir().unwrap();
        let design = tmp.path().join("design");
        fs::create_dir_all(&design).unwrap();
        fs::write(design.join("design.md"), DESIGN).unwrap();
        fs::write(design.join("crc-Store.md"), "# Store\n**Requirements:** R1\n").unwrap();

        let project = Project::with_config(tmp.path(), Config::default()).unwrap();
        let updater = Updater::new(&project);

        assert!(updater.resolve_gap("D1").unwrap());
        assert!(!updater.resolve_gap("D1").unwrap());
        assert!(!updater.add_ref("crc-Store.md", "R1").unwrap());
        assert!(updater.add_ref("crc-Store.md", "R2").unwrap());

        let id = updater.add_gap(GapKind::Code, "Missing test").unwrap();
        assert_eq!(id, "C2");

        let ledger = fs::read_to_string(design.join("design.md")).unwrap();
        assert!(ledger.contains("- [x] D1: First design gap"));
        assert!(ledger.contains("- [ ] C2: Missing test"));
        let card = fs::read_to_string(design.join("crc-Store.md")).unwrap();
        assert!(card.contains("**Requirements:** R1, R2"));

        let err = updater.check("design.md", "nothing-here").unwrap_err();
        assert!(matches!(err, UpdateError::Edit { .. }));
        let err = updater.check("missing.md", "x").unwrap_err();
        assert!(matches!(err, UpdateError::Read(_)));
    }
}
