// Integration tests for the team CRUD contract and the delete policy

mod common;

use heroes_core::model::{HeroCreate, HeroUpdate, TeamCreate, TeamUpdate};
use heroes_core::ExErrorKind;
use heroes_engine::{HeroService, Page, TeamService};

#[test]
fn test_create_read_update() {
    let engine = common::engine();
    let teams = TeamService::new(&engine, common::pagination());

    let created = teams.create(TeamCreate::new("Amerisquad", "DC")).unwrap();
    assert_eq!(teams.read_one(created.id).unwrap(), created);

    let updated = teams
        .update(
            created.id,
            TeamUpdate::from_json(r#"{"headquarters": "Brooklyn"}"#).unwrap(),
        )
        .unwrap();
    assert_eq!(updated.name, "Amerisquad");
    assert_eq!(updated.headquarters, "Brooklyn");
}

#[test]
fn test_update_null_name_rejected() {
    let engine = common::engine();
    let teams = TeamService::new(&engine, common::pagination());
    let created = teams.create(TeamCreate::new("Z-Force", "Sister Margaret's Bar")).unwrap();

    let err = teams
        .update(created.id, TeamUpdate::from_json(r#"{"name": null}"#).unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    assert_eq!(teams.read_one(created.id).unwrap(), created);
}

#[test]
fn test_read_one_with_heroes_follows_assignment() {
    let engine = common::engine();
    let teams = TeamService::new(&engine, common::pagination());
    let heroes = HeroService::new(&engine, common::pagination());

    let preventers = teams.create(TeamCreate::new("Preventers", "Sharp Tower")).unwrap();
    let spider_boy = heroes
        .create(HeroCreate::new("Spider-Boy", "Pedro Parqueador"))
        .unwrap();
    assert!(teams.read_one_with_heroes(preventers.id).unwrap().heroes.is_empty());

    heroes
        .update(
            spider_boy.id,
            HeroUpdate::from_json(&format!(r#"{{"team_id": {}}}"#, preventers.id)).unwrap(),
        )
        .unwrap();
    let loaded = teams.read_one_with_heroes(preventers.id).unwrap();
    assert_eq!(loaded.heroes.len(), 1);
    assert_eq!(loaded.heroes[0].name, "Spider-Boy");

    heroes
        .update(spider_boy.id, HeroUpdate::from_json(r#"{"team_id": null}"#).unwrap())
        .unwrap();
    assert!(teams.read_one_with_heroes(preventers.id).unwrap().heroes.is_empty());
}

#[test]
fn test_delete_restricted_while_heroes_remain() {
    let engine = common::engine();
    let teams = TeamService::new(&engine, common::pagination());
    let heroes = HeroService::new(&engine, common::pagination());

    let z_force = teams
        .create(TeamCreate::new("Z-Force", "Sister Margaret's Bar"))
        .unwrap();
    let deadpond = heroes
        .create(HeroCreate::new("Deadpond", "Dive Wilson").with_team_id(z_force.id))
        .unwrap();

    let err = teams.delete(z_force.id).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::ConstraintViolation);
    assert!(err.message().contains("1 heroes"));

    heroes.delete(deadpond.id).unwrap();
    teams.delete(z_force.id).unwrap();
    assert_eq!(
        teams.read_one(z_force.id).unwrap_err().kind(),
        ExErrorKind::NotFound
    );
}

#[test]
fn test_read_many_in_id_order() {
    let engine = common::engine();
    let teams = TeamService::new(&engine, common::pagination());
    for (name, hq) in [
        ("Preventers", "Sharp Tower"),
        ("Z-Force", "Sister Margaret's Bar"),
        ("Amerisquad", "DC"),
    ] {
        teams.create(TeamCreate::new(name, hq)).unwrap();
    }

    let listed = teams.read_many(Page::new(1, None)).unwrap();
    let names = listed.iter().map(|t| t.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["Z-Force", "Amerisquad"]);
}
