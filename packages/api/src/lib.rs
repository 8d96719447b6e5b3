//! # API crate: GraphQL backend of the Heritage knowledge base
//!
//! Everything the server binary mounts lives here: authentication, the
//! per-request context, PostgreSQL persistence, media uploads and the GraphQL
//! schema that ties them together.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | Argon2 password hashing, signed session tokens, the session cookie |
//! | [`context`] | Builds the [`RequestContext`] (store handle, response handle, resolved user) for each request |
//! | [`db`] | PostgreSQL pool, migrations and [`db::PgStore`], the production [`store::DataStore`] |
//! | [`error`] | [`ApiError`] and its mapping to GraphQL `extensions.code` |
//! | [`graphql`] | Query and mutation roots, input objects, [`graphql::build_schema`] |
//! | [`media`] | Upload classification and forwarding to the media host |
//!
//! ## Request flow
//!
//! 1. The HTTP layer calls [`graphql::execute`] with the request headers.
//! 2. [`ContextBuilder::build`] resolves the session cookie to a user, or
//!    leaves the context anonymous.
//! 3. Resolvers read the context, validate their inputs into `store` write
//!    payloads, upload any files, and issue one store call per mutation.
//! 4. Cookies set by resolvers (sign-in, sign-out) are returned in the
//!    [`ResponseHandle`] for the HTTP layer to apply.

pub mod auth;
pub mod context;
pub mod db;
pub mod error;
pub mod graphql;
pub mod media;

pub use context::{ContextBuilder, CurrentUser, RequestContext, ResponseHandle};
pub use error::{ApiError, ApiResult};
pub use graphql::{build_schema, execute, ApiSchema};
