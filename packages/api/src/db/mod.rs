//! # Database module: PostgreSQL persistence
//!
//! - [`connect`] opens the pool and [`migrate`] applies `migrations/`. The pool
//!   is created once at start-up and passed into [`PgStore`]; nothing here is a
//!   process-wide singleton.
//! - [`PgStore`] implements [`store::DataStore`] on top of the pool.
//! - `rows` holds the [`sqlx::FromRow`] structs the queries load.

mod pool;
mod postgres;
mod rows;

pub use pool::{connect, migrate, DEFAULT_MAX_CONNECTIONS};
pub use postgres::PgStore;
