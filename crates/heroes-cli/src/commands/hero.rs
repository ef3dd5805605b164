//! Hero commands
//!
//! Usage: heroes hero <create|get|list|update|delete> ...

use super::{print_json, CliResult, Context};
use clap::{Args, Subcommand};
use heroes_core::model::{HeroCreate, HeroUpdate, Patch};
use heroes_core_types::Sensitive;
use heroes_engine::Page;

#[derive(Debug, Args)]
pub struct HeroArgs {
    #[command(subcommand)]
    pub command: HeroCommand,
}

#[derive(Debug, Subcommand)]
pub enum HeroCommand {
    /// Create a hero
    Create(CreateArgs),
    /// Show one hero
    Get(GetArgs),
    /// List heroes in id order
    List(ListArgs),
    /// Change some fields of a hero
    Update(UpdateArgs),
    /// Delete a hero
    Delete {
        id: i64,
    },
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub secret_name: String,

    #[arg(long)]
    pub age: Option<i64>,

    #[arg(long)]
    pub team_id: Option<i64>,

    /// Stored only as a hash
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    pub id: i64,

    /// Include the hero's team
    #[arg(long)]
    pub with_team: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long, default_value_t = 0)]
    pub offset: u32,

    /// Defaults to the configured page size; capped at the configured maximum
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    pub id: i64,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub secret_name: Option<String>,

    #[arg(long, conflicts_with = "clear_age")]
    pub age: Option<i64>,

    /// Set the age to null
    #[arg(long)]
    pub clear_age: bool,

    #[arg(long, conflicts_with = "clear_team")]
    pub team_id: Option<i64>,

    /// Remove the hero from its team
    #[arg(long)]
    pub clear_team: bool,

    #[arg(long)]
    pub password: Option<String>,
}

impl UpdateArgs {
    fn into_patch(self) -> HeroUpdate {
        HeroUpdate {
            name: nullable(self.name, false),
            secret_name: nullable(self.secret_name, false),
            age: nullable(self.age, self.clear_age),
            team_id: nullable(self.team_id, self.clear_team),
            password: nullable(self.password.map(Sensitive::new), false),
        }
    }
}

fn nullable<T>(value: Option<T>, clear: bool) -> Patch<T> {
    match (value, clear) {
        (Some(v), _) => Patch::Value(v),
        (None, true) => Patch::Null,
        (None, false) => Patch::Absent,
    }
}

pub fn execute(ctx: &Context, args: HeroArgs) -> CliResult {
    let heroes = ctx.heroes();
    match args.command {
        HeroCommand::Create(create) => {
            let mut payload = HeroCreate::new(create.name, create.secret_name);
            payload.base.age = create.age;
            payload.base.team_id = create.team_id;
            payload.password = create.password.map(Sensitive::new);
            print_json(&heroes.create(payload)?)
        }
        HeroCommand::Get(get) if get.with_team => print_json(&heroes.read_one_with_team(get.id)?),
        HeroCommand::Get(get) => print_json(&heroes.read_one(get.id)?),
        HeroCommand::List(list) => {
            print_json(&heroes.read_many(Page::new(list.offset, list.limit))?)
        }
        HeroCommand::Update(update) => {
            let id = update.id;
            print_json(&heroes.update(id, update.into_patch())?)
        }
        HeroCommand::Delete { id } => {
            heroes.delete(id)?;
            print_json(&serde_json::json!({ "ok": true }))
        }
    }
}
