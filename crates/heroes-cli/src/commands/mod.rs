//! Subcommand handlers
//!
//! Handlers return `CliResult` and print their output as pretty JSON on
//! stdout; `main` prints errors and sets the exit code.

pub mod demo;
pub mod hero;
pub mod init;
pub mod team;

use heroes_core::logging_facility;
use heroes_engine::{Config, HeroService, TeamService};
use heroes_store::Engine;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Resolved configuration plus the opened engine
pub struct Context {
    pub config: Config,
    pub engine: Engine,
}

impl Context {
    /// Load configuration, start logging and open the database
    pub fn load(
        config_path: Option<&Path>,
        db: Option<PathBuf>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = Config::load(config_path)?;
        if let Some(db) = db {
            config.database.path = db;
            config.validate()?;
        }
        logging_facility::init(config.log_profile()?);

        let engine = config.open_engine()?;
        Ok(Self { config, engine })
    }

    pub fn heroes(&self) -> HeroService<'_> {
        HeroService::new(&self.engine, self.config.pagination)
    }

    pub fn teams(&self) -> TeamService<'_> {
        TeamService::new(&self.engine, self.config.pagination)
    }
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
