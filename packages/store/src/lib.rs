//! Domain records, nested write payloads and the [`DataStore`] trait shared by
//! the API and its tests.

pub mod error;
pub mod models;
pub mod repo;
pub mod write;

mod memory;
pub use memory::MemoryStore;

pub use error::{StoreError, WriteError};
pub use models::{
    Address, Contribution, ContributionKind, Event, Fact, Location, Media, MediaKind,
    Organization, Person, Role, User,
};
pub use repo::{DataStore, StoreResult};
