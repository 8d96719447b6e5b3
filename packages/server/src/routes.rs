use api::{ApiSchema, ContextBuilder};
use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub schema: ApiSchema,
    pub contexts: ContextBuilder,
}

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/graphql", get(graphiql).post(graphql))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Credentialed CORS for the single frontend origin.
pub fn cors(allowed_origin: &str) -> anyhow::Result<CorsLayer> {
    let origin = HeaderValue::from_str(allowed_origin)?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true))
}

async fn graphql(State(state): State<AppState>, headers: HeaderMap, request: GraphQLRequest) -> Response {
    let (response, cookies) =
        api::execute(&state.schema, &state.contexts, &headers, request.into_inner()).await;
    let mut http = GraphQLResponse::from(response).into_response();
    cookies.apply(http.headers_mut());
    http
}

async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

async fn health() -> &'static str {
    "ok"
}
