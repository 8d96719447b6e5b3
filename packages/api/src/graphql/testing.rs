use std::sync::Arc;

use async_graphql::{Request, Response, Value};
use axum::http::{header::COOKIE, HeaderMap, HeaderValue};
use store::write::UserWrite;
use store::{DataStore, MemoryStore, Role, User};

use super::{build_schema, execute, ApiSchema};
use crate::auth::{hash_password, SessionConfig, SessionCookies};
use crate::context::{ContextBuilder, ResponseHandle};
use crate::media::testing::RecordingHost;
use crate::media::MediaUploader;

pub const PASSWORD: &str = "correct horse battery";

/// Schema wired to a [`MemoryStore`] and a [`RecordingHost`].
pub struct Harness {
    pub store: MemoryStore,
    pub host: Arc<RecordingHost>,
    pub sessions: SessionCookies,
    schema: ApiSchema,
    contexts: ContextBuilder,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_host(RecordingHost::new())
    }

    pub fn with_host(host: RecordingHost) -> Self {
        let store = MemoryStore::new();
        let host = Arc::new(host);
        let sessions = SessionCookies::new(SessionConfig::new("graphql-test-secret"));
        let uploader = MediaUploader::new(host.clone(), vec!["heritage".into()]);
        Self {
            schema: build_schema(sessions.clone(), uploader),
            contexts: ContextBuilder::new(Arc::new(store.clone()), sessions.clone()),
            store,
            host,
            sessions,
        }
    }

    /// Stores a user whose password is [`PASSWORD`].
    pub async fn user(&self, email: &str, role: Role) -> User {
        let hash = hash_password(PASSWORD).unwrap();
        self.store
            .create_user(UserWrite::new("Test", "User", email, hash).with_role(role))
            .await
            .unwrap()
    }

    pub fn cookie_for(&self, user: &User) -> HeaderMap {
        let cookie = self.sessions.issue(user.id).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{}={}", cookie.name(), cookie.value())).unwrap(),
        );
        headers
    }

    pub async fn run(&self, headers: &HeaderMap, request: impl Into<Request>) -> (Response, ResponseHandle) {
        execute(&self.schema, &self.contexts, headers, request.into()).await
    }

    pub async fn anonymous(&self, request: impl Into<Request>) -> (Response, ResponseHandle) {
        self.run(&HeaderMap::new(), request).await
    }

    pub async fn signed_in(&self, user: &User, request: impl Into<Request>) -> (Response, ResponseHandle) {
        self.run(&self.cookie_for(user), request).await
    }

    /// `extensions.code` of the first error.
    pub fn error_code(&self, response: &Response) -> Option<String> {
        let error = response.errors.first()?;
        match error.extensions.as_ref()?.get("code")? {
            Value::String(code) => Some(code.clone()),
            _ => None,
        }
    }
}
