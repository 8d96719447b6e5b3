//! # Per-request context
//!
//! [`ContextBuilder::build`] runs before any resolver and produces the
//! [`RequestContext`] that every resolver reads:
//!
//! 1. Pull the session token out of the `Cookie` headers. None → anonymous.
//! 2. Verify signature and expiry. Failure → anonymous (logged at `debug`).
//! 3. Load the user by the id in the token. Missing row or failed lookup →
//!    anonymous.
//!
//! A context therefore only ever carries a user that both verified and exists.
//! Resolvers cannot tell an invalid token from an absent one.
//!
//! The [`ResponseHandle`] collects cookies set by resolvers (sign-in, sign-out);
//! the HTTP layer copies them onto the response once execution finishes.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::http::{header::SET_COOKIE, HeaderMap, HeaderValue};
use cookie::Cookie;
use store::{DataStore, Role};
use uuid::Uuid;

use crate::auth::SessionCookies;
use crate::error::{ApiError, ApiResult};

/// The authenticated caller, resolved from the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Cookies to add to the HTTP response of the current request.
#[derive(Debug, Clone, Default)]
pub struct ResponseHandle {
    cookies: Arc<Mutex<Vec<Cookie<'static>>>>,
}

impl ResponseHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Cookie<'static>>> {
        self.cookies.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A later cookie with the same name replaces an earlier one.
    pub fn set_cookie(&self, cookie: Cookie<'static>) {
        let mut cookies = self.lock();
        cookies.retain(|c| c.name() != cookie.name());
        cookies.push(cookie);
    }

    pub fn cookies(&self) -> Vec<Cookie<'static>> {
        self.lock().clone()
    }

    /// Moves the collected cookies onto `headers` as `Set-Cookie` values.
    pub fn apply(&self, headers: &mut HeaderMap) {
        for cookie in self.lock().drain(..) {
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    headers.append(SET_COOKIE, value);
                }
                Err(e) => tracing::error!(cookie = cookie.name(), "cookie is not a valid header: {e}"),
            }
        }
    }
}

/// Dependencies handed to every resolver of one request.
#[derive(Clone)]
pub struct RequestContext {
    pub store: Arc<dyn DataStore>,
    pub response: ResponseHandle,
    pub user: Option<CurrentUser>,
}

impl RequestContext {
    pub fn anonymous(store: Arc<dyn DataStore>) -> Self {
        Self {
            store,
            response: ResponseHandle::new(),
            user: None,
        }
    }

    pub fn with_user(mut self, user: CurrentUser) -> Self {
        self.user = Some(user);
        self
    }

    pub fn require_user(&self) -> ApiResult<&CurrentUser> {
        self.user.as_ref().ok_or(ApiError::NotAuthenticated)
    }

    pub fn require_admin(&self) -> ApiResult<&CurrentUser> {
        let user = self.require_user()?;
        if user.is_admin() {
            Ok(user)
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

/// Builds a [`RequestContext`] from request headers.
///
/// The store handle is injected once at startup and shared by every context.
#[derive(Clone)]
pub struct ContextBuilder {
    store: Arc<dyn DataStore>,
    sessions: SessionCookies,
}

impl ContextBuilder {
    pub fn new(store: Arc<dyn DataStore>, sessions: SessionCookies) -> Self {
        Self { store, sessions }
    }

    pub fn store(&self) -> Arc<dyn DataStore> {
        Arc::clone(&self.store)
    }

    pub async fn build(&self, headers: &HeaderMap) -> RequestContext {
        let context = RequestContext::anonymous(self.store());
        match self.resolve_user(headers).await {
            Some(user) => context.with_user(user),
            None => context,
        }
    }

    async fn resolve_user(&self, headers: &HeaderMap) -> Option<CurrentUser> {
        let token = self.sessions.token_from(headers)?;

        let claims = match self.sessions.signer().verify(&token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!("ignoring invalid session token: {e}");
                return None;
            }
        };

        match self.store.user_by_id(claims.user_id).await {
            Ok(Some(user)) => Some(CurrentUser {
                id: user.id,
                role: user.role,
            }),
            Ok(None) => {
                tracing::debug!(user_id = %claims.user_id, "session token for unknown user");
                None
            }
            Err(e) => {
                tracing::error!(user_id = %claims.user_id, "failed to load session user: {e}");
                None
            }
        }
    }
}
