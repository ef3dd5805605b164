use heroes_core_types::RequestId;
use thiserror::Error;

/// Result type alias using HeroesError
pub type Result<T> = std::result::Result<T, HeroesError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure that leaves the persistence layer is classified by exactly
/// one kind. Each kind maps to a stable error code that callers (the CLI, an
/// HTTP layer) can translate into their own transport-specific response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    /// Payload missing a required field or carrying a malformed value
    InvalidInput,
    /// Point lookup by identity found no row
    NotFound,
    /// Storage-level constraint failure (unique, foreign key, restrict)
    ConstraintViolation,
    /// Connection or schema bootstrap failure
    StorageUnavailable,
    /// In-memory entity read after commit without a refresh
    StaleEntity,
    /// Connection acquisition exceeded the configured bound
    Timeout,
    /// Any other storage error
    Persistence,
    Serialization,
    Config,
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::StorageUnavailable => "ERR_STORAGE_UNAVAILABLE",
            ExErrorKind::StaleEntity => "ERR_STALE_ENTITY",
            ExErrorKind::Timeout => "ERR_TIMEOUT",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether the failure is caused by the caller rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ExErrorKind::InvalidInput | ExErrorKind::NotFound | ExErrorKind::ConstraintViolation
        )
    }
}

/// Canonical structured error type
///
/// Carries the classification plus optional context (operation, entity,
/// field) for debugging and for mapping onto a transport response.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity: Option<&'static str>,
    entity_id: Option<i64>,
    field: Option<String>,
    request_id: Option<RequestId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity: None,
            entity_id: None,
            field: None,
            request_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity type context (table name)
    pub fn with_entity(mut self, entity: &'static str) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: i64) -> Self {
        self.entity_id = Some(id);
        self
    }

    /// Add payload field context
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity type context, if any
    pub fn entity(&self) -> Option<&'static str> {
        self.entity
    }

    /// Get the entity ID context, if any
    pub fn entity_id(&self) -> Option<i64> {
        self.entity_id
    }

    /// Get the payload field context, if any
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Get the request ID context, if any
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        match (self.entity, self.entity_id) {
            (Some(entity), Some(id)) => write!(f, " ({} id: {})", entity, id)?,
            (Some(entity), None) => write!(f, " ({})", entity)?,
            (None, Some(id)) => write!(f, " (id: {})", id)?,
            (None, None) => {}
        }
        if let Some(field) = &self.field {
            write!(f, " (field: {})", field)?;
        }
        if let Some(source) = &self.source {
            write!(f, "; caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain failures raised by the model, validation and service layers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HeroesError {
    // ===== Lookup Errors =====
    /// Hero not found in storage
    #[error("Hero not found: {hero_id}")]
    HeroNotFound { hero_id: i64 },

    /// Team not found in storage
    #[error("Team not found: {team_id}")]
    TeamNotFound { team_id: i64 },

    /// Row vanished between load and refresh
    #[error("No such row in {table}: {id}")]
    NoSuchRow { table: &'static str, id: i64 },

    // ===== Validation Errors =====
    /// Field value failed validation
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// A non-nullable field was explicitly set to null
    #[error("Field {field} cannot be null")]
    NullNotAllowed { field: &'static str },

    /// Payload could not be decoded into the expected shape
    #[error("Malformed payload: {reason}")]
    MalformedPayload { reason: String },

    /// Entity has never been persisted, so it has no identity to act on
    #[error("{entity} has not been persisted yet")]
    NotPersisted { entity: &'static str },

    // ===== Lifecycle Errors =====
    /// In-memory entity was expired by a commit and must be refreshed
    #[error("{entity} {id:?} is stale; refresh it before reading")]
    StaleEntity {
        entity: &'static str,
        id: Option<i64>,
    },

    // ===== Relationship Errors =====
    /// Team delete refused while heroes still reference it
    #[error("Cannot delete team {team_id}: {hero_count} heroes still reference it")]
    TeamHasHeroes { team_id: i64, hero_count: usize },

    // ===== Generic Errors =====
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<HeroesError> for ExError {
    fn from(err: HeroesError) -> Self {
        let message = err.to_string();
        match err {
            HeroesError::HeroNotFound { hero_id } => ExError::new(ExErrorKind::NotFound)
                .with_entity("hero")
                .with_entity_id(hero_id)
                .with_message(message),

            HeroesError::TeamNotFound { team_id } => ExError::new(ExErrorKind::NotFound)
                .with_entity("team")
                .with_entity_id(team_id)
                .with_message(message),

            HeroesError::NoSuchRow { table, id } => ExError::new(ExErrorKind::NotFound)
                .with_entity(table)
                .with_entity_id(id)
                .with_op("refresh")
                .with_message(message),

            HeroesError::InvalidField { field, .. } | HeroesError::NullNotAllowed { field } => {
                ExError::new(ExErrorKind::InvalidInput)
                    .with_field(field)
                    .with_message(message)
            }

            HeroesError::MalformedPayload { .. } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(message)
            }

            HeroesError::NotPersisted { entity } => ExError::new(ExErrorKind::InvalidInput)
                .with_entity(entity)
                .with_message(message),

            HeroesError::StaleEntity { entity, id } => {
                let err = ExError::new(ExErrorKind::StaleEntity)
                    .with_entity(entity)
                    .with_message(message);
                match id {
                    Some(id) => err.with_entity_id(id),
                    None => err,
                }
            }

            HeroesError::TeamHasHeroes { team_id, .. } => {
                ExError::new(ExErrorKind::ConstraintViolation)
                    .with_entity("team")
                    .with_entity_id(team_id)
                    .with_op("delete_team")
                    .with_message(message)
            }

            HeroesError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            HeroesError::Internal { .. } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for HeroesError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            HeroesError::MalformedPayload {
                reason: err.to_string(),
            }
        } else {
            HeroesError::Serialization {
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let kinds = [
            ExErrorKind::InvalidInput,
            ExErrorKind::NotFound,
            ExErrorKind::ConstraintViolation,
            ExErrorKind::StorageUnavailable,
            ExErrorKind::StaleEntity,
            ExErrorKind::Timeout,
            ExErrorKind::Persistence,
            ExErrorKind::Serialization,
            ExErrorKind::Config,
            ExErrorKind::Internal,
        ];
        let mut codes: Vec<_> = kinds.iter().map(|k| k.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn test_display_includes_context() {
        let err = ExError::new(ExErrorKind::NotFound)
            .with_op("read_hero")
            .with_entity("hero")
            .with_entity_id(7)
            .with_message("Hero not found");
        let text = err.to_string();
        assert!(text.starts_with("[ERR_NOT_FOUND]"));
        assert!(text.contains("read_hero"));
        assert!(text.contains("hero id: 7"));
    }

    #[test]
    fn test_team_has_heroes_is_constraint_violation() {
        let ex: ExError = HeroesError::TeamHasHeroes {
            team_id: 1,
            hero_count: 2,
        }
        .into();
        assert_eq!(ex.kind(), ExErrorKind::ConstraintViolation);
        assert_eq!(ex.entity_id(), Some(1));
    }

    #[test]
    fn test_null_not_allowed_carries_field() {
        let ex: ExError = HeroesError::NullNotAllowed { field: "name" }.into();
        assert_eq!(ex.kind(), ExErrorKind::InvalidInput);
        assert_eq!(ex.field(), Some("name"));
    }

    #[test]
    fn test_client_error_classification() {
        assert!(ExErrorKind::NotFound.is_client_error());
        assert!(!ExErrorKind::StorageUnavailable.is_client_error());
    }
}
