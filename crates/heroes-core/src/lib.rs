//! Heroes Core - entity model, validation, error and logging facilities
//!
//! This crate provides:
//! - Hero and Team entities with composed per-operation payload shapes
//! - Tri-state `Patch<T>` for partial updates
//! - Payload validation and the password hashing stub
//! - The structured error facility (`ExError`, `ExErrorKind`, `HeroesError`)
//! - The structured logging facility (`log_op_start!` and friends)

pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod password;
pub mod rules;

#[doc(hidden)]
pub use heroes_core_types as __core_types;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, HeroesError, Result};
pub use model::{
    Hero, HeroCreate, HeroPublic, HeroPublicWithTeam, HeroUpdate, Patch, Team, TeamCreate,
    TeamPublic, TeamPublicWithHeroes, TeamUpdate,
};
