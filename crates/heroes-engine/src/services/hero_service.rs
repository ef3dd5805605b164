//! Hero CRUD
//!
//! Every call opens its own session and releases it before returning.

#![allow(clippy::result_large_err)]

use super::{run_op, Page};
use crate::config::PaginationConfig;
use heroes_core::errors::HeroesError;
use heroes_core::model::{Hero, HeroCreate, HeroPublic, HeroPublicWithTeam, HeroUpdate, Team};
use heroes_store::errors::{domain, Result};
use heroes_store::query::{JoinKind, Order, Select};
use heroes_store::record::hero;
use heroes_store::{Engine, Handle, Session};

pub struct HeroService<'e> {
    engine: &'e Engine,
    pagination: PaginationConfig,
}

impl<'e> HeroService<'e> {
    pub fn new(engine: &'e Engine, pagination: PaginationConfig) -> Self {
        Self { engine, pagination }
    }

    /// Validate, hash the password if given, persist and return with its id
    ///
    /// ## Errors
    ///
    /// - `InvalidInput`: payload failed validation
    /// - `ConstraintViolation`: `team_id` names no team
    pub fn create(&self, payload: HeroCreate) -> Result<HeroPublic> {
        run_op("hero_create", |ctx| {
            let hero = Hero::from_create(payload).map_err(domain)?;
            let mut session = self.engine.session_for(ctx)?;
            let handle = session.add(hero);
            session.commit()?;
            session.refresh(&handle)?;
            public(&session, &handle)
        })
    }

    pub fn read_one(&self, hero_id: i64) -> Result<HeroPublic> {
        run_op("hero_read_one", |ctx| {
            let mut session = self.engine.session_for(ctx)?;
            let handle = find(&mut session, hero_id)?;
            public(&session, &handle)
        })
    }

    /// The hero and its team in one joined read
    pub fn read_one_with_team(&self, hero_id: i64) -> Result<HeroPublicWithTeam> {
        run_op("hero_read_one_with_team", |ctx| {
            let session = self.engine.session_for(ctx)?;
            let (hero, team) = Select::<Hero>::new()
                .filter(hero::ID.eq(hero_id))
                .join::<Team>(JoinKind::LeftOuter)
                .first(&session)?
                .ok_or_else(|| domain(HeroesError::HeroNotFound { hero_id }))?;
            Ok(HeroPublicWithTeam {
                hero: hero.to_public().map_err(domain)?,
                team: team.map(|t| t.to_public().map_err(domain)).transpose()?,
            })
        })
    }

    /// Heroes in id order; the limit is clamped to the configured maximum
    pub fn read_many(&self, page: Page) -> Result<Vec<HeroPublic>> {
        run_op("hero_read_many", |ctx| {
            let session = self.engine.session_for(ctx)?;
            let heroes = Select::<Hero>::new()
                .order_by(hero::ID, Order::Asc)
                .offset(page.offset)
                .limit(self.pagination.effective_limit(page.limit))
                .all(&session)?;
            to_public_all(&heroes)
        })
    }

    /// First hero with exactly this name, by id
    pub fn find_by_name(&self, name: &str) -> Result<Option<HeroPublic>> {
        run_op("hero_find_by_name", |ctx| {
            let session = self.engine.session_for(ctx)?;
            Select::<Hero>::new()
                .filter(hero::NAME.eq(name))
                .order_by(hero::ID, Order::Asc)
                .first(&session)?
                .map(|h| h.to_public().map_err(domain))
                .transpose()
        })
    }

    /// Heroes with `min_age <= age < max_age`; heroes without an age never match
    pub fn list_by_age_range(&self, min_age: i64, max_age: i64) -> Result<Vec<HeroPublic>> {
        run_op("hero_list_by_age_range", |ctx| {
            let session = self.engine.session_for(ctx)?;
            let heroes = Select::<Hero>::new()
                .filter(hero::AGE.in_range(min_age..max_age))
                .order_by(hero::ID, Order::Asc)
                .all(&session)?;
            to_public_all(&heroes)
        })
    }

    /// Apply the present fields of `patch`
    ///
    /// An empty patch writes nothing and returns the hero as stored.
    pub fn update(&self, hero_id: i64, patch: HeroUpdate) -> Result<HeroPublic> {
        run_op("hero_update", |ctx| {
            let mut session = self.engine.session_for(ctx)?;
            let handle = find(&mut session, hero_id)?;
            if patch.is_empty() {
                return public(&session, &handle);
            }
            session
                .entity_mut(&handle)?
                .apply_update(patch)
                .map_err(domain)?;
            session.commit()?;
            session.refresh(&handle)?;
            public(&session, &handle)
        })
    }

    pub fn delete(&self, hero_id: i64) -> Result<()> {
        run_op("hero_delete", |ctx| {
            let mut session = self.engine.session_for(ctx)?;
            let handle = find(&mut session, hero_id)?;
            session.delete(&handle)?;
            session.commit()
        })
    }
}

fn find(session: &mut Session<'_>, hero_id: i64) -> Result<Handle<Hero>> {
    session
        .get::<Hero>(hero_id)?
        .ok_or_else(|| domain(HeroesError::HeroNotFound { hero_id }))
}

fn public(session: &Session<'_>, handle: &Handle<Hero>) -> Result<HeroPublic> {
    session.entity(handle)?.to_public().map_err(domain)
}

fn to_public_all(heroes: &[Hero]) -> Result<Vec<HeroPublic>> {
    heroes
        .iter()
        .map(|h| h.to_public().map_err(domain))
        .collect()
}
