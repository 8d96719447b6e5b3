//! Error types shared by every [`crate::DataStore`] implementation.

use thiserror::Error;
use uuid::Uuid;

/// A write payload failed validation before it reached the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    #[error("{field} must not be blank")]
    Blank { field: &'static str },

    #[error("a person needs at least a first name, last name or alias")]
    AnonymousPerson,

    #[error("{0}")]
    Invalid(String),
}

/// Errors returned by store reads and writes.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Invalid(#[from] WriteError),

    #[error("data store error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        StoreError::NotFound { entity, id }
    }

    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Backend(Box::new(err))
    }
}
