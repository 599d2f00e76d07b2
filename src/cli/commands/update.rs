//! `minispec update` command - Edit design files in place

use miette::Result;

use crate::cli::helpers::{open_project, print_done};
use crate::cli::GlobalOpts;
use crate::core::update::Updater;
use crate::entities::GapKind;

#[derive(clap::Subcommand, Debug)]
pub enum UpdateCommands {
    /// Check a checkbox item in a design file
    Check {
        /// File in the design directory, e.g. design.md
        file: String,
        /// Item text following the checkbox
        item: String,
    },

    /// Uncheck a checkbox item in a design file
    Uncheck {
        /// File in the design directory, e.g. design.md
        file: String,
        /// Item text following the checkbox
        item: String,
    },

    /// Add a requirement reference to a CRC card
    AddRef {
        /// CRC card file, e.g. crc-Store.md
        card: String,
        /// Requirement id, e.g. R3
        id: String,
    },

    /// Remove a requirement reference from a CRC card
    RemoveRef {
        /// CRC card file, e.g. crc-Store.md
        card: String,
        /// Requirement id, e.g. R3
        id: String,
    },

    /// Add an open gap to design.md
    AddGap {
        /// Gap type: S(cope), R(equirements), D(esign), C(ode) or O(ther)
        #[arg(value_enum, ignore_case = true)]
        kind: GapKind,
        /// Description of the gap
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,
    },

    /// Mark a gap in design.md as resolved
    ResolveGap {
        /// Gap id, e.g. D2
        id: String,
    },
}

pub fn run(cmd: UpdateCommands, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let updater = Updater::new(&project);

    match cmd {
        UpdateCommands::Check { file, item } => {
            let changed = updater.check(&file, &item)?;
            print_done(global, changed, &format!("checked {} in {}", item, file));
        }
        UpdateCommands::Uncheck { file, item } => {
            let changed = updater.uncheck(&file, &item)?;
            print_done(global, changed, &format!("unchecked {} in {}", item, file));
        }
        UpdateCommands::AddRef { card, id } => {
            let changed = updater.add_ref(&card, &id)?;
            print_done(global, changed, &format!("added {} to {}", id, card));
        }
        UpdateCommands::RemoveRef { card, id } => {
            let changed = updater.remove_ref(&card, &id)?;
            print_done(global, changed, &format!("removed {} from {}", id, card));
        }
        UpdateCommands::AddGap { kind, description } => {
            let id = updater.add_gap(kind, &description.join(" "))?;
            if global.quiet {
                println!("{}", id);
            } else {
                print_done(global, true, &format!("added gap {}", id));
            }
        }
        UpdateCommands::ResolveGap { id } => {
            let changed = updater.resolve_gap(&id)?;
            print_done(global, changed, &format!("resolved gap {}", id));
        }
    }

    Ok(())
}
