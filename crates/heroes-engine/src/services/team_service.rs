//! Team CRUD

#![allow(clippy::result_large_err)]

use super::{run_op, Page};
use crate::config::PaginationConfig;
use heroes_core::errors::HeroesError;
use heroes_core::model::{Team, TeamCreate, TeamPublic, TeamPublicWithHeroes, TeamUpdate};
use heroes_store::errors::{domain, Result};
use heroes_store::query::{Order, Select};
use heroes_store::record::team;
use heroes_store::{Engine, Handle, Session};

pub struct TeamService<'e> {
    engine: &'e Engine,
    pagination: PaginationConfig,
}

impl<'e> TeamService<'e> {
    pub fn new(engine: &'e Engine, pagination: PaginationConfig) -> Self {
        Self { engine, pagination }
    }

    pub fn create(&self, payload: TeamCreate) -> Result<TeamPublic> {
        run_op("team_create", |ctx| {
            let team = Team::from_create(payload).map_err(domain)?;
            let mut session = self.engine.session_for(ctx)?;
            let handle = session.add(team);
            session.commit()?;
            session.refresh(&handle)?;
            public(&session, &handle)
        })
    }

    pub fn read_one(&self, team_id: i64) -> Result<TeamPublic> {
        run_op("team_read_one", |ctx| {
            let mut session = self.engine.session_for(ctx)?;
            let handle = find(&mut session, team_id)?;
            public(&session, &handle)
        })
    }

    pub fn read_one_with_heroes(&self, team_id: i64) -> Result<TeamPublicWithHeroes> {
        run_op("team_read_one_with_heroes", |ctx| {
            let mut session = self.engine.session_for(ctx)?;
            let handle = find(&mut session, team_id)?;
            session
                .entity(&handle)?
                .to_public_with_heroes()
                .map_err(domain)
        })
    }

    pub fn read_many(&self, page: Page) -> Result<Vec<TeamPublic>> {
        run_op("team_read_many", |ctx| {
            let session = self.engine.session_for(ctx)?;
            Select::<Team>::new()
                .order_by(team::ID, Order::Asc)
                .offset(page.offset)
                .limit(self.pagination.effective_limit(page.limit))
                .all(&session)?
                .iter()
                .map(|t| t.to_public().map_err(domain))
                .collect()
        })
    }

    pub fn update(&self, team_id: i64, patch: TeamUpdate) -> Result<TeamPublic> {
        run_op("team_update", |ctx| {
            let mut session = self.engine.session_for(ctx)?;
            let handle = find(&mut session, team_id)?;
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

    /// Delete a team that no hero references
    ///
    /// ## Errors
    ///
    /// - `NotFound`: no such team
    /// - `ConstraintViolation`: heroes still belong to the team
    pub fn delete(&self, team_id: i64) -> Result<()> {
        run_op("team_delete", |ctx| {
            let mut session = self.engine.session_for(ctx)?;
            let handle = find(&mut session, team_id)?;
            let hero_count = session.entity(&handle)?.heroes.len();
            if hero_count > 0 {
                return Err(domain(HeroesError::TeamHasHeroes {
                    team_id,
                    hero_count,
                }));
            }
            session.delete(&handle)?;
            session.commit()
        })
    }
}

fn find(session: &mut Session<'_>, team_id: i64) -> Result<Handle<Team>> {
    session
        .get::<Team>(team_id)?
        .ok_or_else(|| domain(HeroesError::TeamNotFound { team_id }))
}

fn public(session: &Session<'_>, handle: &Handle<Team>) -> Result<TeamPublic> {
    session.entity(handle)?.to_public().map_err(domain)
}
