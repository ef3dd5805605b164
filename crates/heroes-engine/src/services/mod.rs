//! CRUD services
//!
//! ## Logging Ownership
//!
//! The service layer owns lifecycle logging for every operation:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! Each event carries the operation's `request_id`, which is also stamped
//! on the session it opens. Lower layers (store, core) use only
//! `tracing::debug!()` for internal details.

#![allow(clippy::result_large_err)]

pub mod hero_service;
pub mod team_service;

pub use hero_service::HeroService;
pub use team_service::TeamService;

use heroes_core::{log_op_end, log_op_error, log_op_start};
use heroes_core_types::RequestContext;
use heroes_store::errors::Result;
use std::time::Instant;

/// Requested slice of a read-many listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Page {
    pub offset: u32,
    /// `None` means the configured default
    pub limit: Option<u32>,
}

impl Page {
    pub fn new(offset: u32, limit: Option<u32>) -> Self {
        Self { offset, limit }
    }
}

/// Bracket `f` with start/end or end_error events
fn run_op<T, F>(op: &'static str, f: F) -> Result<T>
where
    F: FnOnce(&RequestContext) -> Result<T>,
{
    let ctx = RequestContext::new();
    log_op_start!(op, request_id = %ctx.request_id);
    let start = Instant::now();

    let result = f(&ctx).map_err(|e| {
        log_op_error!(
            op,
            e,
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = %ctx.request_id
        );
        e.with_request_id(ctx.request_id.clone())
    })?;

    log_op_end!(
        op,
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = %ctx.request_id
    );
    Ok(result)
}
