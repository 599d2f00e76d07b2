//! Shared helper functions for CLI commands

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::GlobalOpts;
use crate::core::project::Project;

/// Open the project named by `--project`, or discover it from the current directory
///
/// `--design-dir` and `--src-dir` override the layered configuration.
pub fn open_project(global: &GlobalOpts) -> Result<Project> {
    let mut project = match &global.project {
        Some(root) => Project::open(root)?,
        None => Project::discover()?,
    };

    if let Some(dir) = &global.design_dir {
        project.set_design_dir(dir);
    }
    if let Some(dir) = &global.src_dir {
        project.set_src_dir(dir);
    }

    Ok(project)
}

/// Pretty-print a value as JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{}", json);
    Ok(())
}

/// Print one item per line, or a dimmed placeholder when there are none
pub fn print_list(items: &[String], empty: &str) {
    if items.is_empty() {
        println!("{}", style(empty).dim());
    }
    for item in items {
        println!("{}", item);
    }
}

/// Confirmation line for a mutation, suppressed by `--quiet`
pub fn print_done(global: &GlobalOpts, changed: bool, message: &str) {
    if global.quiet {
        return;
    }
    if changed {
        println!("{} {}", style("✓").green(), message);
    } else {
        println!("{} {} (unchanged)", style("·").dim(), message);
    }
}

/// Text mark for a checkbox
pub fn checkbox(checked: bool) -> String {
    if checked {
        style("[x]").green().to_string()
    } else {
        style("[ ]").yellow().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use std::fs;
    use tempfile::tempdir;

    fn global(project: Option<&std::path::Path>) -> GlobalOpts {
        GlobalOpts {
            format: OutputFormat::Auto,
            quiet: false,
            verbose: false,
            project: project.map(|p| p.to_path_buf()),
            design_dir: Some("docs/design".into()),
            src_dir: None,
        }
    }

    #[test]
    fn test_open_project_applies_overrides() {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("docs/design")).unwrap();

        let project = open_project(&global(Some(tmp.path()))).unwrap();
        assert_eq!(project.design_dir(), tmp.path().join("docs/design"));
        assert_eq!(project.src_dir(), tmp.path().join("src"));
    }

    #[test]
    fn test_checkbox_marks() {
        console::set_colors_enabled(false);
        assert_eq!(checkbox(true), "[x]");
        assert_eq!(checkbox(false), "[ ]");
    }
}
