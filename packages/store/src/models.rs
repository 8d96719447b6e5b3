//! # Domain records for the knowledge base
//!
//! These are the values a [`crate::DataStore`] hands back after a read or a write.
//! Related records are always embedded (a [`Fact`] carries its people, locations
//! and media), so a record is complete once it leaves the store.
//!
//! With the `graphql` feature enabled every record derives
//! `async_graphql::SimpleObject`, which lets the `api` crate expose them as
//! output types without a parallel set of wrapper structs. Field names become
//! camelCase in the schema (`first_name` → `firstName`).
//!
//! | Record | Notes |
//! |--------|-------|
//! | [`User`] | `password_hash` is skipped from the schema. |
//! | [`Person`] | All name parts optional; at least one is required on write. |
//! | [`Location`] / [`Address`] | A location optionally owns one address. |
//! | [`Media`] | Exposed as `type` in the schema. |
//! | [`Fact`] / [`Event`] | Many-to-many with people, locations and media. |
//! | [`Organization`] | Optional headquarters location. |
//! | [`Contribution`] | Attribution of a created record to a user. |

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access level of a user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(async_graphql::Enum))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Coarse kind of a hosted media file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(async_graphql::Enum))]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            other => Err(format!("unknown media kind: {other}")),
        }
    }
}

/// Which kind of record a [`Contribution`] points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(async_graphql::Enum))]
#[serde(rename_all = "lowercase")]
pub enum ContributionKind {
    Person,
    Fact,
    Event,
    Organization,
    Media,
}

impl ContributionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContributionKind::Person => "person",
            ContributionKind::Fact => "fact",
            ContributionKind::Event => "event",
            ContributionKind::Organization => "organization",
            ContributionKind::Media => "media",
        }
    }
}

impl FromStr for ContributionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "person" => Ok(ContributionKind::Person),
            "fact" => Ok(ContributionKind::Fact),
            "event" => Ok(ContributionKind::Event),
            "organization" => Ok(ContributionKind::Organization),
            "media" => Ok(ContributionKind::Media),
            other => Err(format!("unknown contribution kind: {other}")),
        }
    }
}

/// A registered account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(async_graphql::SimpleObject))]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    /// Always stored lowercased.
    pub email: String,
    #[serde(skip_serializing)]
    #[cfg_attr(feature = "graphql", graphql(skip))]
    pub password_hash: String,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub gender: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(async_graphql::SimpleObject))]
pub struct Person {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub alias: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(async_graphql::SimpleObject))]
pub struct Address {
    pub id: Uuid,
    pub first_line: String,
    pub second_line: Option<String>,
    pub city: String,
    pub country: String,
    pub postal_code: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(async_graphql::SimpleObject))]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    /// Free-form "lat,lng" pair.
    pub coordinates: Option<String>,
    pub address: Option<Address>,
}

/// A file hosted by the media provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(async_graphql::SimpleObject))]
pub struct Media {
    pub id: Uuid,
    #[cfg_attr(feature = "graphql", graphql(name = "type"))]
    pub kind: MediaKind,
    pub caption: Option<String>,
    pub url: String,
    pub public_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(async_graphql::SimpleObject))]
pub struct Fact {
    pub id: Uuid,
    pub text: String,
    pub sources: Vec<String>,
    pub people: Vec<Person>,
    pub locations: Vec<Location>,
    pub media: Vec<Media>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(async_graphql::SimpleObject))]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub people: Vec<Person>,
    pub locations: Vec<Location>,
    pub media: Vec<Media>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(async_graphql::SimpleObject))]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub head_quarters: Option<Location>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(async_graphql::SimpleObject))]
pub struct Contribution {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: ContributionKind,
    pub entity_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip_through_str() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::User.to_string(), "user");
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_media_kind_defaults_to_image() {
        assert_eq!(MediaKind::default(), MediaKind::Image);
        assert_eq!("video".parse::<MediaKind>().unwrap(), MediaKind::Video);
    }
}
