//! Payload validation
//!
//! Runs before anything touches storage; every failure is an
//! `InvalidInput`-class error naming the offending field.

use heroes_core_types::Sensitive;

use crate::errors::{HeroesError, Result};
use crate::model::{HeroCreate, HeroUpdate, Patch, TeamCreate, TeamUpdate};

/// Reject empty or whitespace-only text
pub fn validate_text(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(HeroesError::InvalidField {
            field,
            reason: "cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Ages are optional but never negative
pub fn validate_age(age: Option<i64>) -> Result<()> {
    match age {
        Some(a) if a < 0 => Err(HeroesError::InvalidField {
            field: "age",
            reason: format!("must be zero or greater, got {}", a),
        }),
        _ => Ok(()),
    }
}

pub fn validate_password(password: &Sensitive<String>) -> Result<()> {
    if password.expose().is_empty() {
        return Err(HeroesError::InvalidField {
            field: "password",
            reason: "cannot be empty".to_string(),
        });
    }
    Ok(())
}

/// A patch on a NOT NULL column may be absent or a value, never null
fn validate_required_patch<'a>(
    field: &'static str,
    patch: Patch<&'a String>,
) -> Result<Option<&'a String>> {
    match patch {
        Patch::Absent => Ok(None),
        Patch::Null => Err(HeroesError::NullNotAllowed { field }),
        Patch::Value(v) => {
            validate_text(field, v)?;
            Ok(Some(v))
        }
    }
}

pub fn validate_hero_create(payload: &HeroCreate) -> Result<()> {
    validate_text("name", &payload.base.name)?;
    validate_text("secret_name", &payload.base.secret_name)?;
    validate_age(payload.base.age)?;
    if let Some(password) = &payload.password {
        validate_password(password)?;
    }
    Ok(())
}

pub fn validate_hero_update(patch: &HeroUpdate) -> Result<()> {
    validate_required_patch("name", patch.name.as_ref())?;
    validate_required_patch("secret_name", patch.secret_name.as_ref())?;
    if let Patch::Value(age) = patch.age {
        validate_age(Some(age))?;
    }
    if let Patch::Value(password) = &patch.password {
        validate_password(password)?;
    }
    Ok(())
}

pub fn validate_team_create(payload: &TeamCreate) -> Result<()> {
    validate_text("name", &payload.name)?;
    validate_text("headquarters", &payload.headquarters)
}

pub fn validate_team_update(patch: &TeamUpdate) -> Result<()> {
    validate_required_patch("name", patch.name.as_ref())?;
    validate_required_patch("headquarters", patch.headquarters.as_ref())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_text_rejected() {
        assert!(validate_text("name", "Deadpond").is_ok());
        assert!(matches!(
            validate_text("name", " \t"),
            Err(HeroesError::InvalidField { field: "name", .. })
        ));
    }

    #[test]
    fn test_negative_age_rejected() {
        assert!(validate_age(None).is_ok());
        assert!(validate_age(Some(0)).is_ok());
        assert!(validate_age(Some(-1)).is_err());
    }

    #[test]
    fn test_null_name_patch_rejected() {
        let patch = HeroUpdate {
            name: Patch::Null,
            ..HeroUpdate::default()
        };
        assert_eq!(
            validate_hero_update(&patch),
            Err(HeroesError::NullNotAllowed { field: "name" })
        );
    }

    #[test]
    fn test_null_age_patch_allowed() {
        let patch = HeroUpdate {
            age: Patch::Null,
            ..HeroUpdate::default()
        };
        assert!(validate_hero_update(&patch).is_ok());
    }

    #[test]
    fn test_empty_password_rejected() {
        let patch = HeroUpdate {
            password: Patch::Value(Sensitive::new(String::new())),
            ..HeroUpdate::default()
        };
        assert!(matches!(
            validate_hero_update(&patch),
            Err(HeroesError::InvalidField {
                field: "password",
                ..
            })
        ));
    }
}
