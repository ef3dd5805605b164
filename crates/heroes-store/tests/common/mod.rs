use heroes_core::model::{Hero, Team};
use heroes_store::{Engine, EngineOptions};

/// In-memory engine with the schema in place
#[allow(dead_code)]
pub fn engine() -> Engine {
    let engine = Engine::open_in_memory(EngineOptions::default()).expect("open in-memory engine");
    engine.ensure_schema().expect("ensure schema");
    engine
}

/// Team ids of the seeded fixture
#[allow(dead_code)]
pub struct Fixture {
    pub preventers: i64,
    pub z_force: i64,
}

/// Seed the tutorial data set: two teams and seven heroes
///
/// Deadpond is in Z-Force, Rusty-Man in Preventers; the rest have no team.
#[allow(dead_code)]
pub fn seed(engine: &Engine) -> Fixture {
    let mut session = engine.session().unwrap();
    let preventers = session.add(Team::new("Preventers", "Sharp Tower"));
    let z_force = session.add(Team::new("Z-Force", "Sister Margaret's Bar"));

    let deadpond = session.add(Hero::new("Deadpond", "Dive Wilson"));
    session.assign_team(&deadpond, Some(&z_force)).unwrap();
    session.add(Hero::new("Spider-Boy", "Pedro Parqueador"));
    let rusty = session.add(Hero::new("Rusty-Man", "Tommy Sharp").with_age(48));
    session.assign_team(&rusty, Some(&preventers)).unwrap();
    session.add(Hero::new("Tarantula", "Natalia Roman-on").with_age(32));
    session.add(Hero::new("Black Lion", "Trevor Challa").with_age(35));
    session.add(Hero::new("Dr. Weird", "Steve Weird").with_age(36));
    session.add(Hero::new("Captain North America", "Esteban Rogelios").with_age(93));
    session.commit().unwrap();

    Fixture {
        preventers: session.peek(&preventers).unwrap().id.unwrap(),
        z_force: session.peek(&z_force).unwrap().id.unwrap(),
    }
}
