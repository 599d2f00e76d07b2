//! `minispec validate` command - Run every integrity check

use console::style;
use miette::Result;

use crate::cli::helpers::{open_project, print_json};
use crate::cli::GlobalOpts;
use crate::validate::Validator;

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Print only the issues, not the full report
    #[arg(long)]
    pub summary: bool,
}

pub fn run(args: ValidateArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let report = Validator::new(&project).run();

    if global.is_json() {
        print_json(&report)?;
    } else if args.summary {
        for issue in &report.issues {
            println!("{} {}", style("✗").red(), issue);
        }
    } else {
        print!("{}", report);
    }

    if report.passed() {
        if !global.quiet && !global.is_json() {
            println!("\n{} validation passed", style("✓").green().bold());
        }
        Ok(())
    } else {
        Err(miette::miette!(
            "validation failed with {} issue(s)",
            report.issues.len()
        ))
    }
}
