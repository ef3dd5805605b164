//! Unit of work
//!
//! A `Session` holds the engine's connection for its whole lifetime and
//! tracks every entity it was handed. Writes are staged in memory and go to
//! storage in one immediate transaction on `commit`. After a successful
//! commit every tracked entity is stale: reads through the session fail
//! until `refresh` reloads the row.
//!
//! ## Lifecycle of a tracked entity
//!
//! ```text
//! transient --add--> pending --commit--> persistent (stale) --refresh--> persistent
//!                                           |
//!                                        delete + commit --> gone (refresh: NotFound)
//! ```

#![allow(clippy::result_large_err)]

use crate::errors::{domain, sqlite_op, Result};
use crate::query::Select;
use crate::record::{delete_sql, insert_sql, select_by_id_sql, update_sql, Entity, Record};
use heroes_core::errors::HeroesError;
use heroes_core::model::{Hero, Team};
use heroes_core_types::RequestId;
use parking_lot::MutexGuard;
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::time::Instant;

/// Typed reference to an entity tracked by one session
pub struct Handle<E> {
    index: usize,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Handle<E> {
    fn new(index: usize) -> Self {
        Self {
            index,
            _entity: PhantomData,
        }
    }
}

impl<E> Clone for Handle<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Handle<E> {}

impl<E> PartialEq for Handle<E> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<E> Eq for Handle<E> {}

impl<E> std::fmt::Debug for Handle<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle({})", self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Save,
    Delete,
}

#[derive(Debug)]
struct Tracked {
    entity: Entity,
    stale: bool,
    pending: Option<Pending>,
    /// Team entry whose id becomes this hero's `team_id` at flush
    team_link: Option<usize>,
}

/// Outcome of a flushed transaction, applied to tracked entities only
/// after the commit succeeds
#[derive(Default)]
struct Flushed {
    assigned: HashMap<usize, i64>,
    links: Vec<(usize, i64)>,
    saved: usize,
    deleted: usize,
}

pub struct Session<'e> {
    conn: MutexGuard<'e, Connection>,
    echo: bool,
    request_id: RequestId,
    entries: Vec<Tracked>,
}

impl std::fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("request_id", &self.request_id)
            .field("tracked", &self.entries.len())
            .field("staged", &self.staged_count())
            .finish_non_exhaustive()
    }
}

impl<'e> Session<'e> {
    pub(crate) fn new(conn: MutexGuard<'e, Connection>, echo: bool, request_id: RequestId) -> Self {
        Self {
            conn,
            echo,
            request_id,
            entries: Vec::new(),
        }
    }

    /// Correlates this session's log events
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn log_sql(&self, sql: &str) {
        echo_sql(self.echo, &self.request_id, sql);
    }

    /// Number of entities with a write staged for the next commit
    pub fn staged_count(&self) -> usize {
        self.entries.iter().filter(|t| t.pending.is_some()).count()
    }

    /// Stage an entity for insert (no id) or update (has id)
    ///
    /// Adding an entity whose id is already tracked replaces the tracked
    /// value and returns the existing handle.
    pub fn add<E: Record>(&mut self, entity: E) -> Handle<E> {
        if let Some(index) = entity.id().and_then(|id| self.find::<E>(id)) {
            let tracked = &mut self.entries[index];
            tracked.entity = entity.into_entity();
            tracked.stale = false;
            tracked.pending = Some(Pending::Save);
            return Handle::new(index);
        }

        self.entries.push(Tracked {
            entity: entity.into_entity(),
            stale: false,
            pending: Some(Pending::Save),
            team_link: None,
        });
        Handle::new(self.entries.len() - 1)
    }

    /// Read a fresh entity; fails with `StaleEntity` after a commit until
    /// the entity is refreshed
    pub fn entity<E: Record>(&self, handle: &Handle<E>) -> Result<&E> {
        let tracked = self.tracked(handle)?;
        if tracked.stale {
            return Err(stale::<E>(&tracked.entity));
        }
        downcast(&tracked.entity)
    }

    /// Mutate a fresh entity; the change is written on the next commit
    pub fn entity_mut<E: Record>(&mut self, handle: &Handle<E>) -> Result<&mut E> {
        let tracked = self.tracked_mut(handle)?;
        if tracked.stale {
            return Err(stale::<E>(&tracked.entity));
        }
        if tracked.pending.is_none() {
            tracked.pending = Some(Pending::Save);
        }
        E::from_entity_mut(&mut tracked.entity).ok_or_else(|| wrong_type::<E>())
    }

    /// The in-memory value regardless of staleness
    pub fn peek<E: Record>(&self, handle: &Handle<E>) -> Result<&E> {
        downcast(&self.tracked(handle)?.entity)
    }

    pub fn is_stale<E: Record>(&self, handle: &Handle<E>) -> bool {
        self.entries
            .get(handle.index)
            .is_some_and(|tracked| tracked.stale)
    }

    /// Reload the row (and loaded collections) from storage
    pub fn refresh<E: Record>(&mut self, handle: &Handle<E>) -> Result<()> {
        let current = self.peek(handle)?;
        let id = current
            .id()
            .ok_or_else(|| domain(HeroesError::NotPersisted { entity: E::TABLE }))?;

        let loaded = self
            .load::<E>(id)?
            .ok_or_else(|| domain(HeroesError::NoSuchRow { table: E::TABLE, id }))
            .map_err(|e| e.with_op("refresh"))?;

        let tracked = &mut self.entries[handle.index];
        tracked.entity = loaded.into_entity();
        tracked.stale = false;
        tracked.team_link = None;
        Ok(())
    }

    /// Point lookup by primary key
    ///
    /// A fresh tracked entity is returned as is; otherwise the row is read
    /// and replaces the tracked value. An entity staged for deletion is
    /// reported as absent.
    pub fn get<E: Record>(&mut self, id: i64) -> Result<Option<Handle<E>>> {
        let existing = self.find::<E>(id);
        if let Some(index) = existing {
            if self.entries[index].pending == Some(Pending::Delete) {
                return Ok(None);
            }
            if !self.entries[index].stale {
                return Ok(Some(Handle::new(index)));
            }
        }

        let Some(loaded) = self.load::<E>(id)? else {
            return Ok(None);
        };

        let index = match existing {
            Some(index) => {
                let tracked = &mut self.entries[index];
                tracked.entity = loaded.into_entity();
                tracked.stale = false;
                index
            }
            None => {
                self.entries.push(Tracked {
                    entity: loaded.into_entity(),
                    stale: false,
                    pending: None,
                    team_link: None,
                });
                self.entries.len() - 1
            }
        };
        Ok(Some(Handle::new(index)))
    }

    /// Stage a removal; an entity that was never persisted is just unstaged
    pub fn delete<E: Record>(&mut self, handle: &Handle<E>) -> Result<()> {
        let tracked = self.tracked_mut(handle)?;
        let persisted = downcast::<E>(&tracked.entity)?.id().is_some();
        tracked.pending = if persisted {
            Some(Pending::Delete)
        } else {
            None
        };
        tracked.team_link = None;
        Ok(())
    }

    /// Link a hero to a team, or unlink it with `None`
    ///
    /// The team may still be pending; its id is resolved when the commit
    /// flushes it.
    pub fn assign_team(&mut self, hero: &Handle<Hero>, team: Option<&Handle<Team>>) -> Result<()> {
        let (team_id, link) = match team {
            None => (None, None),
            Some(team_handle) => {
                let tracked = self.tracked(team_handle)?;
                let team_entity = downcast::<Team>(&tracked.entity)?;
                match team_entity.id {
                    Some(id) => (Some(id), None),
                    None if tracked.pending == Some(Pending::Save) => {
                        (None, Some(team_handle.index))
                    }
                    None => return Err(domain(HeroesError::NotPersisted { entity: "team" })),
                }
            }
        };

        let hero_entity = self.entity_mut(hero)?;
        hero_entity.team_id = team_id;
        self.entries[hero.index].team_link = link;
        Ok(())
    }

    /// Run a query on this session's connection
    pub fn exec<E: Record>(&self, select: &Select<E>) -> Result<Vec<E>> {
        select.all(self)
    }

    /// Write all staged changes in one transaction
    ///
    /// On success ids are assigned and every tracked entity becomes stale.
    /// On failure nothing is written, no id is assigned and the staged set
    /// is cleared.
    pub fn commit(&mut self) -> Result<()> {
        let started = Instant::now();
        let outcome = self.flush();

        for tracked in &mut self.entries {
            tracked.pending = None;
        }

        let flushed = match outcome {
            Ok(flushed) => flushed,
            Err(err) => {
                for tracked in &mut self.entries {
                    tracked.team_link = None;
                }
                tracing::debug!(
                    component = module_path!(),
                    op = "commit",
                    request_id = %self.request_id,
                    err.kind = ?err.kind(),
                    "commit rolled back"
                );
                return Err(err.with_request_id(self.request_id.clone()));
            }
        };

        for (index, id) in &flushed.assigned {
            set_entity_id(&mut self.entries[*index].entity, *id);
        }
        for (index, team_id) in &flushed.links {
            if let Entity::Hero(hero) = &mut self.entries[*index].entity {
                hero.team_id = Some(*team_id);
            }
        }
        for tracked in &mut self.entries {
            tracked.stale = true;
            tracked.team_link = None;
        }

        tracing::debug!(
            component = module_path!(),
            op = "commit",
            request_id = %self.request_id,
            saved = flushed.saved,
            deleted = flushed.deleted,
            duration_ms = started.elapsed().as_millis() as u64,
            "session committed"
        );
        Ok(())
    }

    /// Discard staged work
    pub fn rollback(&mut self) {
        let discarded = self.staged_count();
        for tracked in &mut self.entries {
            tracked.pending = None;
            tracked.team_link = None;
        }
        tracing::debug!(
            component = module_path!(),
            op = "rollback",
            request_id = %self.request_id,
            discarded,
            "staged changes discarded"
        );
    }

    fn flush(&mut self) -> Result<Flushed> {
        let echo = self.echo;
        let request_id = &self.request_id;
        let entries = &self.entries;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(sqlite_op("begin"))?;
        let mut flushed = Flushed::default();

        // Teams first so pending links resolve
        for (index, tracked) in entries.iter().enumerate() {
            if let (Some(Pending::Save), Entity::Team(team)) = (tracked.pending, &tracked.entity) {
                let id = save_row(&tx, team, echo, request_id)?;
                if team.id.is_none() {
                    flushed.assigned.insert(index, id);
                }
                flushed.saved += 1;
            }
        }

        for (index, tracked) in entries.iter().enumerate() {
            if let (Some(Pending::Save), Entity::Hero(hero)) = (tracked.pending, &tracked.entity) {
                let id = match tracked.team_link {
                    Some(team_index) => {
                        let team_id = flushed
                            .assigned
                            .get(&team_index)
                            .copied()
                            .or_else(|| match &entries[team_index].entity {
                                Entity::Team(team) => team.id,
                                Entity::Hero(_) => None,
                            })
                            .ok_or_else(|| domain(HeroesError::NotPersisted { entity: "team" }))?;
                        flushed.links.push((index, team_id));
                        let mut linked = hero.clone();
                        linked.team_id = Some(team_id);
                        save_row(&tx, &linked, echo, request_id)?
                    }
                    None => save_row(&tx, hero, echo, request_id)?,
                };
                if hero.id.is_none() {
                    flushed.assigned.insert(index, id);
                }
                flushed.saved += 1;
            }
        }

        // Heroes before teams so a team emptied in this commit can go
        for tracked in entries.iter() {
            if let (Some(Pending::Delete), Entity::Hero(hero)) = (tracked.pending, &tracked.entity) {
                delete_row(&tx, hero, echo, request_id)?;
                flushed.deleted += 1;
            }
        }
        for tracked in entries.iter() {
            if let (Some(Pending::Delete), Entity::Team(team)) = (tracked.pending, &tracked.entity) {
                delete_row(&tx, team, echo, request_id)?;
                flushed.deleted += 1;
            }
        }

        tx.commit().map_err(sqlite_op("commit"))?;
        Ok(flushed)
    }

    fn load<E: Record>(&self, id: i64) -> Result<Option<E>> {
        let sql = select_by_id_sql::<E>();
        self.log_sql(&sql);
        let row = self
            .conn
            .query_row(&sql, [id], |row| E::from_row(row, 0))
            .optional()
            .map_err(sqlite_op("load"))?;
        match row {
            Some(mut entity) => {
                entity
                    .load_related(&self.conn)
                    .map_err(sqlite_op("load_related"))?;
                Ok(Some(entity))
            }
            None => Ok(None),
        }
    }

    fn find<E: Record>(&self, id: i64) -> Option<usize> {
        self.entries.iter().position(|tracked| {
            E::from_entity(&tracked.entity).is_some_and(|e| e.id() == Some(id))
        })
    }

    fn tracked<E: Record>(&self, handle: &Handle<E>) -> Result<&Tracked> {
        self.entries
            .get(handle.index)
            .ok_or_else(|| foreign_handle::<E>())
    }

    fn tracked_mut<E: Record>(&mut self, handle: &Handle<E>) -> Result<&mut Tracked> {
        self.entries
            .get_mut(handle.index)
            .ok_or_else(|| foreign_handle::<E>())
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        let discarded = self.staged_count();
        if discarded > 0 {
            tracing::debug!(
                component = module_path!(),
                op = "close",
                request_id = %self.request_id,
                discarded,
                "session closed with uncommitted changes; discarded"
            );
        }
    }
}

fn echo_sql(echo: bool, request_id: &RequestId, sql: &str) {
    if echo {
        tracing::debug!(
            component = module_path!(),
            request_id = %request_id,
            sql = %sql,
            "sql"
        );
    }
}

/// Insert or update one row, returning its id
fn save_row<E: Record>(
    tx: &Transaction<'_>,
    entity: &E,
    echo: bool,
    request_id: &RequestId,
) -> Result<i64> {
    let mut values = entity.values();
    match entity.id() {
        Some(id) => {
            let sql = update_sql::<E>();
            echo_sql(echo, request_id, &sql);
            values.push(rusqlite::types::Value::Integer(id));
            let changed = tx
                .execute(&sql, rusqlite::params_from_iter(values.iter()))
                .map_err(sqlite_op("update"))?;
            if changed == 0 {
                return Err(domain(HeroesError::NoSuchRow { table: E::TABLE, id }).with_op("update"));
            }
            Ok(id)
        }
        None => {
            let sql = insert_sql::<E>();
            echo_sql(echo, request_id, &sql);
            tx.execute(&sql, rusqlite::params_from_iter(values.iter()))
                .map_err(sqlite_op("insert"))?;
            Ok(tx.last_insert_rowid())
        }
    }
}

fn delete_row<E: Record>(
    tx: &Transaction<'_>,
    entity: &E,
    echo: bool,
    request_id: &RequestId,
) -> Result<()> {
    let id = entity
        .id()
        .ok_or_else(|| domain(HeroesError::NotPersisted { entity: E::TABLE }))?;
    let sql = delete_sql::<E>();
    echo_sql(echo, request_id, &sql);
    let changed = tx.execute(&sql, [id]).map_err(sqlite_op("delete"))?;
    if changed == 0 {
        return Err(domain(HeroesError::NoSuchRow { table: E::TABLE, id }).with_op("delete"));
    }
    Ok(())
}

fn set_entity_id(entity: &mut Entity, id: i64) {
    match entity {
        Entity::Hero(hero) => hero.set_id(id),
        Entity::Team(team) => team.set_id(id),
    }
}

fn downcast<E: Record>(entity: &Entity) -> Result<&E> {
    E::from_entity(entity).ok_or_else(|| wrong_type::<E>())
}

fn stale<E: Record>(entity: &Entity) -> heroes_core::ExError {
    let id = E::from_entity(entity).and_then(Record::id);
    domain(HeroesError::StaleEntity {
        entity: E::TABLE,
        id,
    })
}

fn wrong_type<E: Record>() -> heroes_core::ExError {
    domain(HeroesError::Internal {
        message: format!("handle does not refer to a {}", E::TABLE),
    })
}

fn foreign_handle<E: Record>() -> heroes_core::ExError {
    domain(HeroesError::Internal {
        message: format!("{} handle belongs to another session", E::TABLE),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Engine, EngineOptions};
    use heroes_core::ExErrorKind;

    fn engine() -> Engine {
        let engine = Engine::open_in_memory(EngineOptions::default()).unwrap();
        engine.ensure_schema().unwrap();
        engine
    }

    #[test]
    fn test_add_does_not_assign_id() {
        let engine = engine();
        let mut session = engine.session().unwrap();
        let h = session.add(Hero::new("Deadpond", "Dive Wilson"));
        assert_eq!(session.entity(&h).unwrap().id, None);
        assert_eq!(session.staged_count(), 1);
    }

    #[test]
    fn test_commit_assigns_ids_and_marks_stale() {
        let engine = engine();
        let mut session = engine.session().unwrap();
        let a = session.add(Hero::new("Deadpond", "Dive Wilson"));
        let b = session.add(Hero::new("Spider-Boy", "Pedro Parqueador"));
        session.commit().unwrap();

        assert!(session.is_stale(&a));
        let err = session.entity(&a).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::StaleEntity);

        let id_a = session.peek(&a).unwrap().id.unwrap();
        let id_b = session.peek(&b).unwrap().id.unwrap();
        assert_ne!(id_a, id_b);

        session.refresh(&a).unwrap();
        assert_eq!(session.entity(&a).unwrap().name, "Deadpond");
    }

    #[test]
    fn test_pending_team_link_resolves_at_flush() {
        let engine = engine();
        let mut session = engine.session().unwrap();
        let team = session.add(Team::new("Preventers", "Sharp Tower"));
        let hero = session.add(Hero::new("Rusty-Man", "Tommy Sharp").with_age(48));
        session.assign_team(&hero, Some(&team)).unwrap();
        session.commit().unwrap();

        session.refresh(&team).unwrap();
        session.refresh(&hero).unwrap();
        let team_id = session.entity(&team).unwrap().id;
        assert_eq!(session.entity(&hero).unwrap().team_id, team_id);
        assert_eq!(session.entity(&team).unwrap().hero_names(), vec!["Rusty-Man"]);
    }

    #[test]
    fn test_get_returns_none_for_missing_row() {
        let engine = engine();
        let mut session = engine.session().unwrap();
        assert!(session.get::<Hero>(42).unwrap().is_none());
    }

    #[test]
    fn test_rollback_clears_staged() {
        let engine = engine();
        let mut session = engine.session().unwrap();
        session.add(Team::new("Z-Force", "Sister Margaret's Bar"));
        session.rollback();
        assert_eq!(session.staged_count(), 0);
        session.commit().unwrap();
        drop(session);

        let mut session = engine.session().unwrap();
        assert!(session.get::<Team>(1).unwrap().is_none());
    }

    #[test]
    fn test_delete_unpersisted_just_unstages() {
        let engine = engine();
        let mut session = engine.session().unwrap();
        let h = session.add(Hero::new("Tarantula", "Natalia Roman-on"));
        session.delete(&h).unwrap();
        assert_eq!(session.staged_count(), 0);
    }
}
