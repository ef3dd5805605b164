//! Demo data set
//!
//! Usage: heroes demo
//!
//! Seeds three teams and seven heroes through one session, moves a few
//! heroes between teams, then prints every team with its heroes and the
//! heroes aged 35 to 39.

use super::{print_json, CliResult, Context};
use heroes_core::model::{Hero, HeroPublic, Team, TeamPublicWithHeroes};
use heroes_engine::Page;
use heroes_store::query::{Order, Select};
use heroes_store::record::hero;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct DemoReport {
    teams: Vec<TeamPublicWithHeroes>,
    aged_35_to_39: Vec<HeroPublic>,
    first_aged_35_to_39: Option<HeroPublic>,
}

pub fn execute(ctx: &Context) -> CliResult {
    seed(ctx)?;

    let session = ctx.engine.session()?;
    let in_range = Select::<Hero>::new()
        .filter(hero::AGE.in_range(35..40))
        .order_by(hero::ID, Order::Asc);
    let aged = in_range
        .all(&session)?
        .iter()
        .map(Hero::to_public)
        .collect::<Result<Vec<_>, _>>()?;
    let first = in_range.first(&session)?.map(|h| h.to_public()).transpose()?;
    drop(session);

    let teams = ctx
        .teams()
        .read_many(Page::default())?
        .into_iter()
        .map(|t| ctx.teams().read_one_with_heroes(t.id))
        .collect::<Result<Vec<_>, _>>()?;

    print_json(&DemoReport {
        teams,
        aged_35_to_39: aged,
        first_aged_35_to_39: first,
    })
}

fn seed(ctx: &Context) -> CliResult {
    let mut session = ctx.engine.session()?;

    let preventers = session.add(Team::new("Preventers", "Sharp Tower"));
    let z_force = session.add(Team::new("Z-Force", "Sister Margaret's Bar"));

    let deadpond = session.add(Hero::new("Deadpond", "Dive Wilson"));
    session.assign_team(&deadpond, Some(&z_force))?;
    let spider_boy = session.add(Hero::new("Spider-Boy", "Pedro Parqueador"));
    let rusty_man = session.add(Hero::new("Rusty-Man", "Tommy Sharp").with_age(48));
    session.assign_team(&rusty_man, Some(&preventers))?;
    let tarantula = session.add(Hero::new("Tarantula", "Natalia Roman-on").with_age(32));
    session.add(Hero::new("Black Lion", "Trevor Challa").with_age(35));
    let dr_weird = session.add(Hero::new("Dr. Weird", "Steve Weird").with_age(36));
    let captain = session.add(Hero::new("Captain North America", "Esteban Rogelios").with_age(93));
    session.commit()?;

    // Spider-Boy joins the Preventers
    session.refresh(&spider_boy)?;
    session.assign_team(&spider_boy, Some(&preventers))?;
    session.commit()?;

    // A new team picks up two existing heroes in the same commit
    let amerisquad = session.add(Team::new("Amerisquad", "DC"));
    for member in [&dr_weird, &captain] {
        session.refresh(member)?;
        session.assign_team(member, Some(&amerisquad))?;
    }
    session.refresh(&tarantula)?;
    session.assign_team(&tarantula, Some(&preventers))?;
    session.commit()?;

    Ok(())
}
