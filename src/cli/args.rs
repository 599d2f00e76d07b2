//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, phase::PhaseArgs, query::QueryCommands,
    update::UpdateCommands, validate::ValidateArgs,
};

#[derive(Parser)]
#[command(name = "minispec")]
#[command(author, version, about = "Traceability between requirements, design and code")]
#[command(long_about = "Keeps requirements.md, CRC cards, the design.md ledger and source-file traceability comments consistent with each other. The markdown files are the database.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding design/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    /// Design directory, relative to the project root
    #[arg(long, global = true)]
    pub design_dir: Option<PathBuf>,

    /// Source directory, relative to the project root
    #[arg(long, global = true)]
    pub src_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read-only queries over requirements, designs and code
    #[command(subcommand)]
    Query(QueryCommands),

    /// Edit checkboxes, card requirement references and gaps
    #[command(subcommand)]
    Update(UpdateCommands),

    /// Run every integrity check
    Validate(ValidateArgs),

    /// Run the checks of one workflow phase
    Phase(PhaseArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Auto,
    /// Human-readable text
    Text,
    /// JSON format (for programming)
    Json,
}

impl GlobalOpts {
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}
