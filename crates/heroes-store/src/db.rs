//! Storage engine
//!
//! Owns the single long-lived SQLite connection. Sessions borrow it
//! exclusively for their lifetime through `Engine::session`.

#![allow(clippy::result_large_err)]

use crate::errors::{acquire_timeout, from_rusqlite, storage_unavailable, Result};
use crate::migrations::apply_migrations;
use crate::session::Session;
use heroes_core_types::RequestContext;
use rusqlite::Connection;
use parking_lot::{Mutex, MutexGuard};
use std::path::Path;
use std::time::{Duration, Instant};

/// Tunables for an `Engine`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Upper bound on waiting for the connection
    pub acquire_timeout: Duration,
    /// SQLite busy timeout for locks held by other processes
    pub busy_timeout: Duration,
    /// Log every statement at debug level
    pub echo: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            echo: false,
        }
    }
}

/// Storage engine over one SQLite connection
pub struct Engine {
    conn: Mutex<Connection>,
    options: EngineOptions,
    location: String,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("location", &self.location)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Open (or create) a SQLite database file
    pub fn open<P: AsRef<Path>>(path: P, options: EngineOptions) -> Result<Self> {
        let location = path.as_ref().display().to_string();
        let conn =
            Connection::open(path.as_ref()).map_err(|e| storage_unavailable(&location, e))?;
        configure(&conn, &options, true).map_err(|e| e.with_op("open"))?;
        tracing::info!(
            component = module_path!(),
            op = "open",
            location = %location,
            "storage engine opened"
        );
        Ok(Self {
            conn: Mutex::new(conn),
            options,
            location,
        })
    }

    /// Open a private in-memory database (tests, demos)
    pub fn open_in_memory(options: EngineOptions) -> Result<Self> {
        let location = ":memory:".to_string();
        let conn = Connection::open_in_memory().map_err(|e| storage_unavailable(&location, e))?;
        configure(&conn, &options, false).map_err(|e| e.with_op("open"))?;
        Ok(Self {
            conn: Mutex::new(conn),
            options,
            location,
        })
    }

    /// Create tables and indexes if absent; a no-op otherwise
    ///
    /// Runs under the connection lock, so concurrent callers never interleave
    /// schema changes. Any failure here means the process cannot serve.
    pub fn ensure_schema(&self) -> Result<()> {
        let mut conn = self.acquire()?;
        apply_migrations(&mut conn)
    }

    /// Open a unit of work
    pub fn session(&self) -> Result<Session<'_>> {
        self.session_for(&RequestContext::new())
    }

    /// Open a unit of work whose log events carry the caller's request id
    pub fn session_for(&self, ctx: &RequestContext) -> Result<Session<'_>> {
        let conn = self
            .acquire()
            .map_err(|e| e.with_request_id(ctx.request_id.clone()))?;
        Ok(Session::new(
            conn,
            self.options.echo,
            ctx.request_id.clone(),
        ))
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Take the connection, waiting at most `acquire_timeout`
    fn acquire(&self) -> Result<MutexGuard<'_, Connection>> {
        let started = Instant::now();
        self.conn
            .try_lock_for(self.options.acquire_timeout)
            .ok_or_else(|| acquire_timeout(started.elapsed()))
    }
}

/// Per-connection settings
fn configure(conn: &Connection, options: &EngineOptions, file_backed: bool) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON")
        .map_err(from_rusqlite)?;
    conn.busy_timeout(options.busy_timeout)
        .map_err(from_rusqlite)?;

    if file_backed {
        let _mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .map_err(from_rusqlite)?;
    }

    Ok(())
}
