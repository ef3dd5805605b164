use serde::{Deserialize, Serialize};

use super::hero::{Hero, HeroPublic};
use super::patch::Patch;
use crate::errors::{HeroesError, Result};
use crate::rules::validation;

/// Fields shared by every team payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamBase {
    pub name: String,
    pub headquarters: String,
}

/// Creating a team needs exactly the base fields
pub type TeamCreate = TeamBase;

impl TeamBase {
    pub fn new(name: impl Into<String>, headquarters: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            headquarters: headquarters.into(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct TeamUpdate {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub headquarters: Patch<String>,
}

impl TeamUpdate {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_absent() && self.headquarters.is_absent()
    }
}

/// Table-backed team
///
/// `heroes` is the loaded side of the hero→team relationship. It is never
/// written; storage fills it on refresh from the heroes whose `team_id`
/// points here.
#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub id: Option<i64>,
    pub name: String,
    pub headquarters: String,
    pub heroes: Vec<Hero>,
}

impl Team {
    pub fn new(name: impl Into<String>, headquarters: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            headquarters: headquarters.into(),
            heroes: Vec::new(),
        }
    }

    pub fn from_create(payload: TeamCreate) -> Result<Self> {
        validation::validate_team_create(&payload)?;
        Ok(Self::new(payload.name, payload.headquarters))
    }

    pub fn apply_update(&mut self, patch: TeamUpdate) -> Result<()> {
        validation::validate_team_update(&patch)?;
        if let Patch::Value(name) = patch.name {
            self.name = name;
        }
        if let Patch::Value(headquarters) = patch.headquarters {
            self.headquarters = headquarters;
        }
        Ok(())
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Names of the loaded heroes, in load order
    pub fn hero_names(&self) -> Vec<&str> {
        self.heroes.iter().map(|h| h.name.as_str()).collect()
    }

    pub fn to_public(&self) -> Result<TeamPublic> {
        let id = self
            .id
            .ok_or(HeroesError::NotPersisted { entity: "team" })?;
        Ok(TeamPublic {
            id,
            name: self.name.clone(),
            headquarters: self.headquarters.clone(),
        })
    }

    pub fn to_public_with_heroes(&self) -> Result<TeamPublicWithHeroes> {
        Ok(TeamPublicWithHeroes {
            team: self.to_public()?,
            heroes: self
                .heroes
                .iter()
                .map(Hero::to_public)
                .collect::<Result<Vec<_>>>()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamPublic {
    pub id: i64,
    pub name: String,
    pub headquarters: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamPublicWithHeroes {
    #[serde(flatten)]
    pub team: TeamPublic,
    pub heroes: Vec<HeroPublic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_team_is_transient() {
        let team = Team::new("Preventers", "Sharp Tower");
        assert!(!team.is_persisted());
        assert!(team.heroes.is_empty());
    }

    #[test]
    fn test_from_create_rejects_blank_headquarters() {
        let err = Team::from_create(TeamCreate::new("Z-Force", "  ")).unwrap_err();
        assert!(matches!(
            err,
            HeroesError::InvalidField {
                field: "headquarters",
                ..
            }
        ));
    }

    #[test]
    fn test_apply_update_headquarters_only() {
        let mut team = Team::new("Amerisquad", "DC");
        team.apply_update(TeamUpdate::from_json(r#"{"headquarters": "Brooklyn"}"#).unwrap())
            .unwrap();
        assert_eq!(team.name, "Amerisquad");
        assert_eq!(team.headquarters, "Brooklyn");
    }

    #[test]
    fn test_public_with_heroes() {
        let mut team = Team::new("Preventers", "Sharp Tower");
        team.id = Some(1);
        let mut hero = Hero::new("Rusty-Man", "Tommy Sharp").with_age(48);
        hero.id = Some(3);
        hero.team_id = Some(1);
        team.heroes.push(hero);

        let public = team.to_public_with_heroes().unwrap();
        assert_eq!(public.team.id, 1);
        assert_eq!(public.heroes.len(), 1);
        assert_eq!(public.heroes[0].team_id, Some(1));
    }
}
