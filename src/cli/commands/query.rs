//! `minispec query` command - Read-only views of the traceability graph

use clap::ArgGroup;
use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{checkbox, open_project, print_json, print_list};
use crate::cli::GlobalOpts;
use crate::core::query::Query;
use crate::entities::Traceability;

#[derive(clap::Subcommand, Debug)]
pub enum QueryCommands {
    /// List requirements in document order
    Requirements,

    /// List CRC cards with their requirements and sequences
    CrcCards,

    /// Show which CRC cards cover each requirement
    Coverage,

    /// List requirements no CRC card references
    Uncovered,

    /// List CRC cards that reference no requirement
    OrphanDesigns,

    /// List design files and their code files from design.md
    Artifacts,

    /// List gaps from design.md
    Gaps,

    /// Show the traceability comments of a code file
    Traceability(TraceabilityArgs),

    /// Show the comment prefix pattern used for each extension
    CommentPatterns,
}

#[derive(clap::Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["file", "all"])))]
pub struct TraceabilityArgs {
    /// Code file, relative to the project root
    pub file: Option<PathBuf>,

    /// Every code file listed in Artifacts
    #[arg(long)]
    pub all: bool,
}

pub fn run(cmd: QueryCommands, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let query = Query::new(&project);

    match cmd {
        QueryCommands::Requirements => {
            let reqs = query.requirements()?;
            if global.is_json() {
                return print_json(&reqs);
            }
            for req in &reqs {
                let inferred = if req.inferred {
                    format!(" {}", style("(inferred)").dim())
                } else {
                    String::new()
                };
                println!("{}: {}{}", style(&req.id).cyan(), req.text, inferred);
            }
        }
        QueryCommands::CrcCards => {
            let cards = query.crc_cards();
            if global.is_json() {
                return print_json(&cards);
            }
            for card in &cards {
                let refs = if card.requirements.is_empty() {
                    style("(no requirements)".to_string()).red()
                } else {
                    style(card.requirements.join(", ")).cyan()
                };
                println!("{} [{}]: {}", style(card.file_name()).bold(), card.name, refs);
                for seq in &card.sequences {
                    println!("  {}", seq);
                }
            }
        }
        QueryCommands::Coverage => {
            let coverage = query.coverage()?;
            if global.is_json() {
                return print_json(&coverage);
            }
            for entry in &coverage.requirements {
                if entry.cards.is_empty() {
                    println!("{}: {}", style(&entry.id).cyan(), style("(uncovered)").red());
                } else {
                    println!("{}: {}", style(&entry.id).cyan(), entry.cards.join(", "));
                }
            }
        }
        QueryCommands::Uncovered => {
            let uncovered = query.uncovered()?;
            if global.is_json() {
                return print_json(&uncovered);
            }
            print_list(&uncovered, "all requirements covered");
        }
        QueryCommands::OrphanDesigns => {
            let orphans = query.orphan_designs();
            if global.is_json() {
                return print_json(&orphans);
            }
            print_list(&orphans, "no orphan designs");
        }
        QueryCommands::Artifacts => {
            let artifacts = query.artifacts()?;
            if global.is_json() {
                return print_json(&artifacts);
            }
            for artifact in &artifacts {
                println!("{}", style(&artifact.design_file).bold());
                for code_file in &artifact.code_files {
                    println!("  {} {}", checkbox(code_file.checked), code_file.path);
                }
            }
        }
        QueryCommands::Gaps => {
            let gaps = query.gaps()?;
            if global.is_json() {
                return print_json(&gaps);
            }
            for gap in &gaps {
                println!("{} {}: {}", checkbox(gap.resolved), gap.id, gap.description);
            }
        }
        QueryCommands::Traceability(args) => match args.file {
            Some(file) => {
                let trace = query.traceability(&file)?;
                if global.is_json() {
                    return print_json(&trace);
                }
                print_traceability(&trace, "");
            }
            None => {
                let all = query.traceability_all()?;
                if global.is_json() {
                    return print_json(&all);
                }
                for (path, trace) in &all {
                    println!("{}", style(path).bold());
                    print_traceability(trace, "  ");
                }
            }
        },
        QueryCommands::CommentPatterns => {
            let patterns = query.comment_patterns();
            if global.is_json() {
                return print_json(patterns);
            }
            for (ext, pattern) in patterns {
                println!("{}\t{}", ext, pattern);
            }
        }
    }

    Ok(())
}

fn print_traceability(trace: &Traceability, indent: &str) {
    if trace.is_empty() {
        println!("{}{}", indent, style("(no traceability comment)").dim());
        return;
    }
    println!("{}CRC: {}", indent, trace.crc_refs.join(", "));
    if !trace.seq_refs.is_empty() {
        println!("{}Seq: {}", indent, trace.seq_refs.join(", "));
    }
}
