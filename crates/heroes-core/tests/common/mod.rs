use heroes_core::model::{HeroCreate, TeamCreate};

/// The seven heroes of the demo data set, without team links
#[allow(dead_code)]
pub fn tutorial_heroes() -> Vec<HeroCreate> {
    vec![
        HeroCreate::new("Deadpond", "Dive Wilson"),
        HeroCreate::new("Spider-Boy", "Pedro Parqueador"),
        HeroCreate::new("Rusty-Man", "Tommy Sharp").with_age(48),
        HeroCreate::new("Tarantula", "Natalia Roman-on").with_age(32),
        HeroCreate::new("Black Lion", "Trevor Challa").with_age(35),
        HeroCreate::new("Dr. Weird", "Steve Weird").with_age(36),
        HeroCreate::new("Captain North America", "Esteban Rogelios").with_age(93),
    ]
}

#[allow(dead_code)]
pub fn tutorial_teams() -> Vec<TeamCreate> {
    vec![
        TeamCreate::new("Preventers", "Sharp Tower"),
        TeamCreate::new("Z-Force", "Sister Margaret's Bar"),
        TeamCreate::new("Amerisquad", "DC"),
    ]
}
