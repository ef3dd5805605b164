//! Entity model
//!
//! Each entity has a table-backed struct plus one composed struct per
//! operation (create, update, public output). Storage metadata for the
//! table-backed structs lives in `heroes-store`.

pub mod hero;
pub mod patch;
pub mod team;

pub use hero::{Hero, HeroBase, HeroCreate, HeroPublic, HeroPublicWithTeam, HeroUpdate};
pub use patch::Patch;
pub use team::{Team, TeamBase, TeamCreate, TeamPublic, TeamPublicWithHeroes, TeamUpdate};
