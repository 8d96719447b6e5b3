//! # API errors and their GraphQL shape
//!
//! Resolvers work with [`ApiError`] internally and convert at the boundary with
//! [`ErrorExtensions::extend`], which keeps the display message as the
//! user-facing text and adds a stable `extensions.code`:
//!
//! | Variant | Code |
//! |---------|------|
//! | `DuplicateUser` | `DUPLICATE_USER` |
//! | `AuthenticationFailed` | `AUTHENTICATION_FAILED` |
//! | `NotAuthenticated` | `UNAUTHENTICATED` |
//! | `Forbidden` | `FORBIDDEN` |
//! | `Validation`, `Store(Invalid)` | `BAD_USER_INPUT` |
//! | `UploadFailed` | `UPLOAD_FAILED` |
//! | `Store(NotFound)` | `NOT_FOUND` |
//! | `Store(Conflict)` | `CONFLICT` |
//! | everything else | `INTERNAL` |

use async_graphql::ErrorExtensions;
use store::{StoreError, WriteError};
use thiserror::Error;

use crate::media::UploadError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("An account with this email already exists")]
    DuplicateUser,

    #[error("Invalid email or password")]
    AuthenticationFailed,

    #[error("You must be signed in to do that")]
    NotAuthenticated,

    #[error("You do not have permission to do that")]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error("Failed to upload file: {0}")]
    UploadFailed(String),

    #[error("password hashing failed: {0}")]
    Password(String),

    #[error("session token error: {0}")]
    Token(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::DuplicateUser => "DUPLICATE_USER",
            ApiError::AuthenticationFailed => "AUTHENTICATION_FAILED",
            ApiError::NotAuthenticated => "UNAUTHENTICATED",
            ApiError::Forbidden => "FORBIDDEN",
            ApiError::Validation(_) | ApiError::Store(StoreError::Invalid(_)) => "BAD_USER_INPUT",
            ApiError::UploadFailed(_) => "UPLOAD_FAILED",
            ApiError::Store(StoreError::NotFound { .. }) => "NOT_FOUND",
            ApiError::Store(StoreError::Conflict(_)) => "CONFLICT",
            ApiError::Password(_) | ApiError::Token(_) | ApiError::Store(StoreError::Backend(_)) => {
                "INTERNAL"
            }
        }
    }
}

impl From<WriteError> for ApiError {
    fn from(err: WriteError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        ApiError::UploadFailed(err.to_string())
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.code();
        if code == "INTERNAL" {
            tracing::error!(error = %self, "request failed");
        }
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", code))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
