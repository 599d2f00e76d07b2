//! File loading utilities
//!
//! Shared by the query, validation and update layers so every caller reads
//! design files the same way.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::grammar::Grammar;
use crate::core::query::QueryError;
use crate::entities::crc::{parse_crc_card, CrcCard};

/// Read a whole file as UTF-8 text
pub fn read_file(path: &Path) -> Result<String, QueryError> {
    fs::read_to_string(path).map_err(|error| QueryError::Read {
        path: path.to_path_buf(),
        error,
    })
}

/// Read a source file, replacing invalid UTF-8 so legacy encodings still scan
pub fn read_code_file(path: &Path) -> Result<String, QueryError> {
    let bytes = fs::read(path).map_err(|error| QueryError::Read {
        path: path.to_path_buf(),
        error,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Parse every card in `paths`
///
/// Cards that cannot be read are logged and skipped.
pub fn load_crc_cards(paths: &[PathBuf], grammar: &Grammar) -> Vec<CrcCard> {
    let mut cards = Vec::with_capacity(paths.len());

    for path in paths {
        match fs::read_to_string(path) {
            Ok(content) => cards.push(parse_crc_card(path, &content, grammar)),
            Err(e) => warn!("skipping unreadable card {}: {}", path.display(), e),
        }
    }

    debug!("loaded {} CRC card(s)", cards.len());
    cards
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_file_missing_carries_path() {
        let err = read_file(Path::new("/nonexistent/requirements.md")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/requirements.md"));
    }

    #[test]
    fn test_read_code_file_is_lossy() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("legacy.c");
        fs::write(&path, b"/* CRC: crc-A.md */ caf\xe9\n").unwrap();

        let content = read_code_file(&path).unwrap();
        assert!(content.starts_with("/* CRC: crc-A.md */ caf"));
        assert!(read_file(&path).is_err());
    }

    #[test]
    fn test_load_crc_cards_skips_unreadable() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("crc-Good.md");
        fs::write(&good, "# Good\n**Requirements:** R1\n").unwrap();
        let missing = dir.path().join("crc-Gone.md");

        let cards = load_crc_cards(&[good, missing], &Grammar::markdown());
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].name, "Good");
    }
}
