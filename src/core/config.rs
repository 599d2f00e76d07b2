//! Configuration management with layered hierarchy

use miette::Diagnostic;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Project configuration file, looked up at the project root
pub const PROJECT_CONFIG_FILE: &str = ".minispec.yaml";

/// Effective minispec configuration after all layers are merged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding requirements.md, design.md and the design artifacts
    pub design_dir: String,

    /// Directory holding implementation files
    pub src_dir: String,

    /// Directory holding the source specs requirements are derived from
    pub specs_dir: String,

    /// Extensions (with leading dot) that count as implementation files
    pub code_extensions: Vec<String>,

    /// Comment prefix regex per extension, placed before `CRC:`
    pub comment_patterns: BTreeMap<String, String>,

    /// Literal block-comment closer per extension, stripped from references
    pub comment_closers: BTreeMap<String, String>,
}

/// A single configuration layer as written in YAML
///
/// Unset fields leave the lower layers alone. The two maps merge key by key.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    pub design_dir: Option<String>,
    pub src_dir: Option<String>,
    pub specs_dir: Option<String>,
    pub code_extensions: Option<Vec<String>>,
    pub comment_patterns: BTreeMap<String, String>,
    pub comment_closers: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            design_dir: "design".to_string(),
            src_dir: "src".to_string(),
            specs_dir: "specs".to_string(),
            code_extensions: [
                ".go", ".ts", ".js", ".lua", ".py", ".c", ".h", ".cpp", ".sh", ".rs",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            comment_patterns: default_comment_patterns(),
            comment_closers: default_comment_closers(),
        }
    }
}

fn default_comment_patterns() -> BTreeMap<String, String> {
    let slashes = r"//\s*";
    let hash = r"#\s*";
    let dashes = r"--\s*";
    let html = r"<!--\s*";

    [
        (".go", slashes),
        (".js", slashes),
        (".ts", slashes),
        (".c", slashes),
        (".h", slashes),
        (".cpp", slashes),
        (".rs", slashes),
        (".java", slashes),
        (".py", hash),
        (".sh", hash),
        (".bash", hash),
        (".rb", hash),
        (".yaml", hash),
        (".lua", dashes),
        (".sql", dashes),
        (".html", html),
        (".md", html),
        (".css", r"/\*\s*"),
    ]
    .into_iter()
    .map(|(ext, pattern)| (ext.to_string(), pattern.to_string()))
    .collect()
}

fn default_comment_closers() -> BTreeMap<String, String> {
    [(".html", "-->"), (".md", "-->"), (".css", "*/")]
        .into_iter()
        .map(|(ext, closer)| (ext.to_string(), closer.to_string()))
        .collect()
}

/// Normalize an extension key to lowercase with a leading dot
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/minispec/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                match Self::read_layer(&global_path) {
                    Ok(layer) => config.merge(layer),
                    Err(e) => warn!("ignoring global config: {}", e),
                }
            }
        }

        // 3. Project config (.minispec.yaml)
        config.merge_project(root)?;

        // 4. Environment variables
        if let Ok(dir) = std::env::var("MINISPEC_DESIGN_DIR") {
            config.design_dir = dir;
        }
        if let Ok(dir) = std::env::var("MINISPEC_SRC_DIR") {
            config.src_dir = dir;
        }

        Ok(config)
    }

    /// Built-in defaults plus the project file only, ignoring user and environment layers
    pub fn load_project(root: &Path) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.merge_project(root)?;
        Ok(config)
    }

    fn merge_project(&mut self, root: &Path) -> Result<(), ConfigError> {
        let path = root.join(PROJECT_CONFIG_FILE);
        if path.exists() {
            let layer = Self::read_layer(&path)?;
            debug!("merging project config from {}", path.display());
            self.merge(layer);
        }
        Ok(())
    }

    /// Parse a configuration layer from a YAML file
    pub fn read_layer(path: &Path) -> Result<ConfigLayer, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|error| ConfigError::Read {
            path: path.to_path_buf(),
            error,
        })?;
        // An empty file is a valid "no overrides" layer
        if contents.trim().is_empty() {
            return Ok(ConfigLayer::default());
        }
        serde_yml::from_str(&contents).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            message: error.to_string(),
        })
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "minispec")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another layer into this one (other takes precedence)
    pub fn merge(&mut self, other: ConfigLayer) {
        if let Some(dir) = other.design_dir.filter(|d| !d.is_empty()) {
            self.design_dir = dir;
        }
        if let Some(dir) = other.src_dir.filter(|d| !d.is_empty()) {
            self.src_dir = dir;
        }
        if let Some(dir) = other.specs_dir.filter(|d| !d.is_empty()) {
            self.specs_dir = dir;
        }
        if let Some(exts) = other.code_extensions.filter(|e| !e.is_empty()) {
            self.code_extensions = exts.iter().map(|e| normalize_extension(e)).collect();
        }
        for (ext, pattern) in other.comment_patterns {
            self.comment_patterns.insert(normalize_extension(&ext), pattern);
        }
        for (ext, closer) in other.comment_closers {
            self.comment_closers.insert(normalize_extension(&ext), closer);
        }
    }

    /// Whether files with this extension are tracked as implementation files
    pub fn is_code_extension(&self, ext: &str) -> bool {
        let ext = normalize_extension(ext);
        self.code_extensions.iter().any(|e| *e == ext)
    }
}

/// Errors raised while loading configuration
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("cannot read config {}: {error}", path.display())]
    #[diagnostic(code(minispec::config::read))]
    Read { path: PathBuf, error: std::io::Error },

    #[error("invalid config {}: {message}", path.display())]
    #[diagnostic(
        code(minispec::config::parse),
        help("expected keys: design_dir, src_dir, specs_dir, code_extensions, comment_patterns, comment_closers")
    )]
    Parse { path: PathBuf, message: String },

    #[error("invalid comment pattern {pattern:?} for {extension}: {message}")]
    #[diagnostic(
        code(minispec::config::comment_pattern),
        help("comment_patterns values are regular expressions matched right before `CRC:`")
    )]
    InvalidPattern {
        extension: String,
        pattern: String,
        message: String,
    },
}
