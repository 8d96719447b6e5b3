//! Session cookie issuance and extraction.

use axum::http::{header::COOKIE, HeaderMap};
use cookie::{Cookie, SameSite};
use uuid::Uuid;

use super::config::SessionConfig;
use super::token::TokenSigner;
use crate::error::ApiResult;

/// Signs session tokens and wraps them in the session cookie.
#[derive(Debug, Clone)]
pub struct SessionCookies {
    signer: TokenSigner,
    cookie_name: String,
    max_age: chrono::Duration,
    secure: bool,
}

impl SessionCookies {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            signer: TokenSigner::new(&config.secret, config.max_age),
            cookie_name: config.cookie_name,
            max_age: config.max_age,
            secure: config.secure,
        }
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Session cookie carrying a fresh token for `user_id`.
    pub fn issue(&self, user_id: Uuid) -> ApiResult<Cookie<'static>> {
        let token = self.signer.issue(user_id)?;
        Ok(Cookie::build((self.cookie_name.clone(), token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(cookie::time::Duration::seconds(self.max_age.num_seconds()))
            .build())
    }

    /// Cookie that clears the session on the client.
    pub fn removal(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build((self.cookie_name.clone(), String::new()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .build();
        cookie.make_removal();
        cookie
    }

    /// Raw session token from the request's `Cookie` headers, if present and non-empty.
    pub fn token_from(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == self.cookie_name)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
    }
}
