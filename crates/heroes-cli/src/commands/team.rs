//! Team commands
//!
//! Usage: heroes team <create|get|list|update|delete> ...

use super::{print_json, CliResult, Context};
use clap::{Args, Subcommand};
use heroes_core::model::{Patch, TeamCreate, TeamUpdate};
use heroes_engine::Page;

#[derive(Debug, Args)]
pub struct TeamArgs {
    #[command(subcommand)]
    pub command: TeamCommand,
}

#[derive(Debug, Subcommand)]
pub enum TeamCommand {
    /// Create a team
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        headquarters: String,
    },
    /// Show one team
    Get {
        id: i64,
        /// Include the team's heroes
        #[arg(long)]
        with_heroes: bool,
    },
    /// List teams in id order
    List {
        #[arg(long, default_value_t = 0)]
        offset: u32,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Rename or move a team
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        headquarters: Option<String>,
    },
    /// Delete a team; fails while heroes belong to it
    Delete { id: i64 },
}

pub fn execute(ctx: &Context, args: TeamArgs) -> CliResult {
    let teams = ctx.teams();
    match args.command {
        TeamCommand::Create { name, headquarters } => {
            print_json(&teams.create(TeamCreate::new(name, headquarters))?)
        }
        TeamCommand::Get {
            id,
            with_heroes: true,
        } => print_json(&teams.read_one_with_heroes(id)?),
        TeamCommand::Get { id, .. } => print_json(&teams.read_one(id)?),
        TeamCommand::List { offset, limit } => {
            print_json(&teams.read_many(Page::new(offset, limit))?)
        }
        TeamCommand::Update {
            id,
            name,
            headquarters,
        } => {
            let patch = TeamUpdate {
                name: name.map_or(Patch::Absent, Patch::Value),
                headquarters: headquarters.map_or(Patch::Absent, Patch::Value),
            };
            print_json(&teams.update(id, patch)?)
        }
        TeamCommand::Delete { id } => {
            teams.delete(id)?;
            print_json(&serde_json::json!({ "ok": true }))
        }
    }
}
