use std::sync::Arc;

use anyhow::Context as _;
use api::auth::SessionCookies;
use api::db::{self, PgStore};
use api::{build_schema, ContextBuilder};
use axum::Router;
use store::DataStore;

use crate::routes::{self, AppState};
use crate::settings::{Settings, DEFAULT_SECRET};

/// Connects to the database, runs migrations and serves until shutdown.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let pool = db::connect(&settings.database.url, settings.database.max_connections)
        .await
        .context("Failed to connect to database")?;
    db::migrate(&pool).await.context("Failed to run migrations")?;

    let store: Arc<dyn DataStore> = Arc::new(PgStore::new(pool));
    let router = build(store, &settings)?;

    let addr = settings.server.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router.into_make_service())
        .await
        .context("Server error")
}

/// Wires the schema, session handling and media uploads around `store`.
pub fn build(store: Arc<dyn DataStore>, settings: &Settings) -> anyhow::Result<Router> {
    if settings.auth.secret == DEFAULT_SECRET {
        tracing::warn!("auth.secret is the built-in default; set HERITAGE_AUTH__SECRET");
    }
    if !settings.media.is_configured() {
        tracing::warn!("media provider credentials missing, uploads are disabled");
    }

    let sessions = SessionCookies::new(settings.auth.session_config());
    let state = AppState {
        schema: build_schema(sessions.clone(), settings.media.uploader()),
        contexts: ContextBuilder::new(store, sessions),
    };
    let cors = routes::cors(&settings.server.allowed_origin)?;
    Ok(routes::router(state, cors))
}
