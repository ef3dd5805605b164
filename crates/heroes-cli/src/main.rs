//! Heroes CLI
//!
//! Command-line request layer over the hero and team services

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "heroes")]
#[command(about = "Heroes - hero and team records on SQLite", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file (overrides config and HEROES_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the database schema if missing
    Init,
    /// Hero operations
    Hero(commands::hero::HeroArgs),
    /// Team operations
    Team(commands::team::TeamArgs),
    /// Seed the demo teams and heroes, then run the sample queries
    Demo,
}

fn main() {
    let cli = Cli::parse();

    let result = commands::Context::load(cli.config.as_deref(), cli.db).and_then(|ctx| {
        match cli.command {
            Commands::Init => commands::init::execute(&ctx),
            Commands::Hero(args) => commands::hero::execute(&ctx, args),
            Commands::Team(args) => commands::team::execute(&ctx, args),
            Commands::Demo => commands::demo::execute(&ctx),
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
