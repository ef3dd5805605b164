//! Heroes Engine - Service layer
//!
//! Provides the create/read/update/delete contract for heroes and teams on
//! top of the store, plus the configuration that wires an engine together.

pub mod config;
pub mod services;

pub use config::{Config, DatabaseConfig, LoggingConfig, PaginationConfig};
pub use services::{HeroService, Page, TeamService};
