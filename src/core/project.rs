//! Project discovery and structure

use globset::{Glob, GlobSet, GlobSetBuilder};
use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::core::config::{Config, ConfigError, PROJECT_CONFIG_FILE};
use crate::core::grammar::Grammar;

/// Requirements file inside the design directory
pub const REQUIREMENTS_FILE: &str = "requirements.md";

/// Design ledger (Artifacts and Gaps) inside the design directory
pub const DESIGN_LEDGER_FILE: &str = "design.md";

/// Design files that must be listed in the Artifacts section
pub const TRACKED_DESIGN_PATTERNS: [&str; 5] =
    ["crc-*.md", "seq-*.md", "ui-*.md", "test-*.md", "manifest-*.md"];

const CRC_CARD_PATTERN: &str = "crc-*.md";

/// Directory whose presence marks a project root during discovery
const DESIGN_MARKER: &str = "design";

/// Represents a minispec project
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of design/)
    root: PathBuf,
    design_dir: PathBuf,
    src_dir: PathBuf,
    specs_dir: PathBuf,
    config: Config,
    grammar: Grammar,
    tracked_design: GlobSet,
    crc_cards: GlobSet,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|error| ProjectError::Io {
            path: PathBuf::from("."),
            error,
        })?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    ///
    /// A directory qualifies if it contains `design/` or a `.minispec.yaml`.
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start.canonicalize().map_err(|error| ProjectError::Io {
            path: start.to_path_buf(),
            error,
        })?;

        loop {
            if current.join(DESIGN_MARKER).is_dir() || current.join(PROJECT_CONFIG_FILE).is_file()
            {
                debug!("project root: {}", current.display());
                return Self::open(&current);
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Open a project at a known root with fully layered configuration
    pub fn open(root: &Path) -> Result<Self, ProjectError> {
        let config = Config::load(root)?;
        Self::with_config(root, config)
    }

    /// Open a project at a known root with an explicit configuration
    pub fn with_config(root: &Path, config: Config) -> Result<Self, ProjectError> {
        let grammar = Grammar::from_config(&config)?;
        let root = root.to_path_buf();

        Ok(Self {
            design_dir: root.join(&config.design_dir),
            src_dir: root.join(&config.src_dir),
            specs_dir: root.join(&config.specs_dir),
            tracked_design: glob_set(&TRACKED_DESIGN_PATTERNS)?,
            crc_cards: glob_set(&[CRC_CARD_PATTERN])?,
            root,
            config,
            grammar,
        })
    }

    /// Override the design directory (relative paths resolve against the root)
    pub fn set_design_dir(&mut self, dir: &Path) {
        self.design_dir = self.root_path(dir);
    }

    /// Override the source directory (relative paths resolve against the root)
    pub fn set_src_dir(&mut self, dir: &Path) {
        self.src_dir = self.root_path(dir);
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn design_dir(&self) -> &Path {
        &self.design_dir
    }

    pub fn src_dir(&self) -> &Path {
        &self.src_dir
    }

    pub fn specs_dir(&self) -> &Path {
        &self.specs_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Resolve a file name within the design directory
    pub fn design_path(&self, name: impl AsRef<Path>) -> PathBuf {
        self.design_dir.join(name)
    }

    /// Resolve a path against the project root unless it is already absolute
    pub fn root_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn requirements_path(&self) -> PathBuf {
        self.design_path(REQUIREMENTS_FILE)
    }

    pub fn design_ledger_path(&self) -> PathBuf {
        self.design_path(DESIGN_LEDGER_FILE)
    }

    /// All CRC card files in the design directory, sorted by name
    pub fn crc_card_paths(&self) -> Vec<PathBuf> {
        self.iter_design_files()
            .filter(|path| self.crc_cards.is_match(file_name(path)))
            .collect()
    }

    /// File names of all design files that must appear in Artifacts, sorted
    pub fn tracked_design_files(&self) -> Vec<String> {
        self.iter_design_files()
            .map(|path| file_name(&path).to_string())
            .filter(|name| self.tracked_design.is_match(name))
            .collect()
    }

    /// Iterate the files directly inside the design directory, sorted by name
    fn iter_design_files(&self) -> impl Iterator<Item = PathBuf> {
        walkdir::WalkDir::new(&self.design_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
    }

    /// Markdown files directly inside the specs directory, sorted by name
    ///
    /// Fails when the specs directory itself cannot be read.
    pub fn spec_files(&self) -> Result<Vec<PathBuf>, walkdir::Error> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(&self.specs_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            if entry.file_type().is_file() && file_name(entry.path()).ends_with(".md") {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Iterate implementation files under the source directory with a tracked extension
    pub fn iter_code_files(&self) -> impl Iterator<Item = PathBuf> + '_ {
        walkdir::WalkDir::new(&self.src_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .is_some_and(|ext| self.config.is_code_extension(&ext.to_string_lossy()))
            })
            .map(|e| e.path().to_path_buf())
    }
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

fn glob_set(patterns: &[&str]) -> Result<GlobSet, ProjectError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Errors that can occur during project operations
#[derive(Debug, Error, Diagnostic)]
pub enum ProjectError {
    #[error("not a minispec project (searched from {searched_from:?}): no design/ directory found")]
    #[diagnostic(
        code(minispec::project::not_found),
        help("run from inside a project, or pass --project <DIR>")
    )]
    NotFound { searched_from: PathBuf },

    #[error("IO error on {}: {error}", path.display())]
    #[diagnostic(code(minispec::project::io))]
    Io { path: PathBuf, error: std::io::Error },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid design file pattern: {0}")]
    #[diagnostic(code(minispec::project::glob))]
    Glob(#[from] globset::Error),
}
