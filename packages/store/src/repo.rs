//! # DataStore: the persistence seam of the knowledge base
//!
//! Every resolver reaches the database through this trait, held as an
//! `Arc<dyn DataStore>` in the request context. Implementations:
//!
//! | Implementation | Crate | Use |
//! |----------------|-------|-----|
//! | [`crate::MemoryStore`] | `store` | tests and local experiments |
//! | `PgStore` | `api` | production, PostgreSQL through sqlx |
//!
//! ## Contract
//!
//! - Reads return fully populated records (relations embedded).
//! - Each `create_*` call is one atomic write: the payload is validated, every
//!   connected id is checked, then all rows (the record, inline related
//!   records, join rows and the contribution when a contributor is set) are
//!   written together. If anything fails nothing is written.
//! - An unknown connected id yields [`StoreError::NotFound`].
//! - A second user with the same (lowercased) email yields
//!   [`StoreError::Conflict`].

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Contribution, Event, Fact, Media, Organization, Person, User};
use crate::write::{EventWrite, FactWrite, MediaWrite, OrganizationWrite, PersonWrite, UserWrite};

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DataStore: Send + Sync {
    async fn people(&self) -> StoreResult<Vec<Person>>;
    async fn users(&self) -> StoreResult<Vec<User>>;
    async fn facts(&self) -> StoreResult<Vec<Fact>>;
    async fn events(&self) -> StoreResult<Vec<Event>>;
    async fn organizations(&self) -> StoreResult<Vec<Organization>>;
    async fn media(&self) -> StoreResult<Vec<Media>>;

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    /// `email` is matched case-insensitively.
    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn contributions_by(&self, user_id: Uuid) -> StoreResult<Vec<Contribution>>;

    async fn create_user(&self, write: UserWrite) -> StoreResult<User>;
    async fn create_person(&self, write: PersonWrite) -> StoreResult<Person>;
    async fn create_fact(&self, write: FactWrite) -> StoreResult<Fact>;
    async fn create_event(&self, write: EventWrite) -> StoreResult<Event>;
    async fn create_organization(&self, write: OrganizationWrite) -> StoreResult<Organization>;
    async fn create_media(&self, write: MediaWrite) -> StoreResult<Media>;
}
