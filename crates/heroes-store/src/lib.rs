//! Heroes Store - SQLite persistence for heroes and teams
//!
//! Provides:
//! - `Engine`: one configured connection plus idempotent schema bootstrap
//! - `Session`: unit of work with staged writes and explicit refresh
//! - `Select`: typed query builder with filtering, pagination and a join
//! - `Record`: table metadata for the core entities

pub mod db;
pub mod errors;
pub mod migrations;
pub mod query;
pub mod record;
pub mod session;

// Re-export key types
pub use db::{Engine, EngineOptions};
pub use errors::Result;
pub use query::{Condition, JoinKind, JoinSelect, Order, Predicate, Select};
pub use record::{Column, Entity, Record, Related};
pub use session::{Handle, Session};
