//! Schema bootstrap
//!
//! Usage: heroes init

use super::{print_json, CliResult, Context};

/// The schema is ensured when the context opens the engine; report where
pub fn execute(ctx: &Context) -> CliResult {
    print_json(&serde_json::json!({
        "database": ctx.engine.location(),
        "schema": "ready",
    }))
}
