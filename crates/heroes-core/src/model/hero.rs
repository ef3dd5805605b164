use heroes_core_types::Sensitive;
use serde::{Deserialize, Serialize};

use super::patch::Patch;
use super::team::TeamPublic;
use crate::errors::{HeroesError, Result};
use crate::password::hash_password;
use crate::rules::validation;

/// Fields shared by every hero payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroBase {
    pub name: String,
    pub secret_name: String,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub team_id: Option<i64>,
}

/// Create payload: the base shape plus an optional clear-text password
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HeroCreate {
    #[serde(flatten)]
    pub base: HeroBase,
    #[serde(default)]
    pub password: Option<Sensitive<String>>,
}

impl HeroCreate {
    pub fn new(name: impl Into<String>, secret_name: impl Into<String>) -> Self {
        Self {
            base: HeroBase {
                name: name.into(),
                secret_name: secret_name.into(),
                age: None,
                team_id: None,
            },
            password: None,
        }
    }

    pub fn with_age(mut self, age: i64) -> Self {
        self.base.age = Some(age);
        self
    }

    pub fn with_team_id(mut self, team_id: i64) -> Self {
        self.base.team_id = Some(team_id);
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(Sensitive::new(password.into()));
        self
    }

    /// Decode a JSON payload; missing or mistyped fields are validation errors
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Partial update payload; only present fields are applied
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct HeroUpdate {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub secret_name: Patch<String>,
    #[serde(default)]
    pub age: Patch<i64>,
    #[serde(default)]
    pub team_id: Patch<i64>,
    #[serde(default)]
    pub password: Patch<Sensitive<String>>,
}

impl HeroUpdate {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// True when no field is present
    pub fn is_empty(&self) -> bool {
        self.name.is_absent()
            && self.secret_name.is_absent()
            && self.age.is_absent()
            && self.team_id.is_absent()
            && self.password.is_absent()
    }
}

/// Table-backed hero: the base shape plus identity and storage-only fields
///
/// `id` is `None` until the first successful commit assigns it.
#[derive(Debug, Clone, PartialEq)]
pub struct Hero {
    pub id: Option<i64>,
    pub name: String,
    pub secret_name: String,
    pub age: Option<i64>,
    pub team_id: Option<i64>,
    pub hashed_password: Option<Sensitive<String>>,
}

impl Hero {
    pub fn new(name: impl Into<String>, secret_name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            secret_name: secret_name.into(),
            age: None,
            team_id: None,
            hashed_password: None,
        }
    }

    pub fn with_age(mut self, age: i64) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_team_id(mut self, team_id: i64) -> Self {
        self.team_id = Some(team_id);
        self
    }

    /// Build a transient hero from a validated create payload, hashing the
    /// password if one was supplied
    pub fn from_create(payload: HeroCreate) -> Result<Self> {
        validation::validate_hero_create(&payload)?;
        let HeroCreate { base, password } = payload;
        Ok(Self {
            id: None,
            name: base.name,
            secret_name: base.secret_name,
            age: base.age,
            team_id: base.team_id,
            hashed_password: password.as_ref().map(hash_password),
        })
    }

    /// Apply the present fields of a patch
    ///
    /// Validates the whole patch before touching any field, so a rejected
    /// patch leaves the hero unchanged.
    pub fn apply_update(&mut self, patch: HeroUpdate) -> Result<()> {
        validation::validate_hero_update(&patch)?;

        if let Patch::Value(name) = patch.name {
            self.name = name;
        }
        if let Patch::Value(secret_name) = patch.secret_name {
            self.secret_name = secret_name;
        }
        if let Some(age) = patch.age.into_option() {
            self.age = age;
        }
        if let Some(team_id) = patch.team_id.into_option() {
            self.team_id = team_id;
        }
        if let Some(password) = patch.password.into_option() {
            self.hashed_password = password.as_ref().map(hash_password);
        }
        Ok(())
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Client-visible shape; the password hash is never included
    pub fn to_public(&self) -> Result<HeroPublic> {
        let id = self
            .id
            .ok_or(HeroesError::NotPersisted { entity: "hero" })?;
        Ok(HeroPublic {
            id,
            name: self.name.clone(),
            secret_name: self.secret_name.clone(),
            age: self.age,
            team_id: self.team_id,
        })
    }
}

/// Read/create response shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroPublic {
    pub id: i64,
    pub name: String,
    pub secret_name: String,
    pub age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<i64>,
}

/// Hero response with its team expanded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroPublicWithTeam {
    #[serde(flatten)]
    pub hero: HeroPublic,
    pub team: Option<TeamPublic>,
}
