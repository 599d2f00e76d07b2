//! `minispec phase` command - Run the checks of one workflow phase

use miette::Result;

use crate::cli::helpers::{open_project, print_json};
use crate::cli::GlobalOpts;
use crate::validate::{Phase, Validator};

#[derive(clap::Args, Debug)]
pub struct PhaseArgs {
    /// Phase to check
    #[arg(value_enum)]
    pub phase: Phase,
}

pub fn run(args: PhaseArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let result = Validator::new(&project).run_phase(args.phase);

    if global.is_json() {
        print_json(&result)?;
    } else {
        print!("{}", result);
    }

    if result.passed {
        Ok(())
    } else {
        Err(miette::miette!(
            "phase {} failed with {} issue(s)",
            result.phase,
            result.issues.len()
        ))
    }
}
