use thiserror::Error;

/// Boxed driver error carried by the storage-class variants
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by the store core
///
/// Every variant maps to exactly one HTTP outcome (see
/// [`crate::api::errors::ApiError`]), so callers can branch on the kind
/// without inspecting messages.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A field-level business rule was violated
    #[error("invalid {entity}: {reason}")]
    InvalidData { entity: &'static str, reason: String },

    /// A required part of an aggregate was missing
    #[error("{0} is required")]
    NilModel(&'static str),

    /// An identifier that must be set was zero
    #[error("{0} id must not be zero")]
    ZeroId(&'static str),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The row exists but its version no longer matches the caller's
    #[error("{entity} {id} was modified concurrently (expected version {expected})")]
    VersionConflict {
        entity: &'static str,
        id: i64,
        expected: i64,
    },

    #[error("failed to create {entity}: {source}")]
    Create {
        entity: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("failed to update {entity}: {source}")]
    Update {
        entity: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("failed to delete {entity}: {source}")]
    Delete {
        entity: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("failed to query {entity}: {source}")]
    Query {
        entity: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("transaction error: {0}")]
    Transaction(#[source] BoxError),

    #[error("failed to hash password: {0}")]
    PasswordHash(String),

    /// A failure whose rollback failed too; both are kept
    #[error("{cause}; rollback failed: {rollback}")]
    RolledBack {
        cause: Box<StoreError>,
        rollback: Box<StoreError>,
    },
}

impl StoreError {
    pub fn invalid(entity: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidData {
            entity,
            reason: reason.into(),
        }
    }

    pub fn create(entity: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Create {
            entity,
            source: source.into(),
        }
    }

    pub fn update(entity: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Update {
            entity,
            source: source.into(),
        }
    }

    pub fn delete(entity: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Delete {
            entity,
            source: source.into(),
        }
    }

    pub fn query(entity: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Query {
            entity,
            source: source.into(),
        }
    }

    pub fn transaction(source: impl Into<BoxError>) -> Self {
        Self::Transaction(source.into())
    }

    /// Joins a failure with the outcome of the rollback it triggered.
    ///
    /// A successful rollback leaves the original error untouched.
    pub fn with_rollback(self, rollback: Result<(), StoreError>) -> Self {
        match rollback {
            Ok(()) => self,
            Err(rollback) => Self::RolledBack {
                cause: Box::new(self),
                rollback: Box::new(rollback),
            },
        }
    }

    /// The error that started a failure chain
    pub fn root_cause(&self) -> &StoreError {
        match self {
            Self::RolledBack { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root_cause(), Self::NotFound { .. })
    }

    pub fn is_version_conflict(&self) -> bool {
        matches!(self.root_cause(), Self::VersionConflict { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
