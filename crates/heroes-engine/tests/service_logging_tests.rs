// Boundary logging for service operations

mod common;

use heroes_core::logging_facility::init_test_capture;
use heroes_core::model::HeroCreate;
use heroes_engine::{HeroService, TeamService};

#[test]
fn test_create_emits_start_and_end_with_one_request_id() {
    let capture = init_test_capture();
    let engine = common::engine();
    let heroes = HeroService::new(&engine, common::pagination());

    heroes
        .create(HeroCreate::new("Captain North America", "Esteban Rogelios").with_password("s3cr3t-pw"))
        .unwrap();

    capture.assert_event_exists("hero_create", "start");
    capture.assert_event_exists("hero_create", "end");

    let events = capture.events_for_op("hero_create");
    let start = events
        .iter()
        .find(|e| e.event.as_deref() == Some("start"))
        .unwrap();
    let request_id = start.request_id.clone().unwrap();
    assert!(events
        .iter()
        .any(|e| e.event.as_deref() == Some("end") && e.request_id.as_deref() == Some(&request_id)));
    assert!(events
        .iter()
        .filter(|e| e.event.as_deref() == Some("end"))
        .all(|e| e.field("duration_ms").is_some()));

    let leaked = capture.count_events(|e| e.fields.values().any(|v| v.contains("s3cr3t-pw")));
    assert_eq!(leaked, 0);
}

#[test]
fn test_failure_emits_end_error_with_code() {
    let capture = init_test_capture();
    let engine = common::engine();
    let teams = TeamService::new(&engine, common::pagination());

    let err = teams.read_one_with_heroes(404).unwrap_err();
    assert!(err.request_id().is_some());

    let errors = capture
        .events_for_op("team_read_one_with_heroes")
        .into_iter()
        .filter(|e| e.event.as_deref() == Some("end_error"))
        .collect::<Vec<_>>();
    assert!(!errors.is_empty());
    assert!(errors
        .iter()
        .any(|e| e.field("err.code") == Some("ERR_NOT_FOUND")));
}

#[test]
fn test_read_one_with_team_issues_one_joined_statement() {
    let capture = init_test_capture();
    let engine = heroes_store::Engine::open_in_memory(heroes_store::EngineOptions {
        echo: true,
        ..heroes_store::EngineOptions::default()
    })
    .unwrap();
    engine.ensure_schema().unwrap();
    let teams = TeamService::new(&engine, common::pagination());
    let heroes = HeroService::new(&engine, common::pagination());

    let z_force = teams
        .create(heroes_core::model::TeamCreate::new("Z-Force", "Sister Margaret's Bar"))
        .unwrap();
    let deadpond = heroes
        .create(HeroCreate::new("Deadpond", "Dive Wilson").with_team_id(z_force.id))
        .unwrap();
    heroes
        .create(HeroCreate::new("Spider-Boy", "Pedro Parqueador").with_team_id(z_force.id))
        .unwrap();

    let read = heroes.read_one_with_team(deadpond.id).unwrap();
    assert_eq!(read.team, Some(z_force));

    let request_id = capture
        .events_for_op("hero_read_one_with_team")
        .into_iter()
        .find(|e| e.event.as_deref() == Some("start"))
        .and_then(|e| e.request_id)
        .unwrap();
    let statements = capture
        .events()
        .into_iter()
        .filter(|e| e.request_id.as_deref() == Some(request_id.as_str()))
        .filter_map(|e| e.field("sql").map(str::to_string))
        .collect::<Vec<_>>();
    assert_eq!(statements.len(), 1);
    assert!(statements[0].contains("LEFT OUTER JOIN"));
}
