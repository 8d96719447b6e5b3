//! # Row types for the PostgreSQL tables
//!
//! Each struct derives [`sqlx::FromRow`] and mirrors the columns a query
//! selects. Rows are converted into the `store` records with `into_*`
//! methods; enum columns (`role`, `kind`) are stored as lowercase text and
//! parsed on the way out, so a value the schema's `CHECK` constraints would
//! reject surfaces as a backend error rather than a panic.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use store::{
    Address, Contribution, ContributionKind, Location, Media, MediaKind, Person, Role, StoreError,
    User,
};
use uuid::Uuid;

fn corrupt(column: &str, value: &str) -> StoreError {
    StoreError::Backend(format!("unexpected {column} value {value:?}").into())
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub gender: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub fn into_user(self) -> Result<User, StoreError> {
        let role: Role = self.role.parse().map_err(|_| corrupt("role", &self.role))?;
        Ok(User {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password_hash: self.password_hash,
            profile_picture: self.profile_picture,
            bio: self.bio,
            gender: self.gender,
            role,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PersonRow {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub alias: Option<String>,
}

impl From<PersonRow> for Person {
    fn from(row: PersonRow) -> Self {
        Person {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            alias: row.alias,
        }
    }
}

/// A location joined with its optional address (`LEFT JOIN addresses`).
#[derive(Debug, Clone, FromRow)]
pub struct LocationRow {
    pub id: Uuid,
    pub name: String,
    pub coordinates: Option<String>,
    pub address_id: Option<Uuid>,
    pub first_line: Option<String>,
    pub second_line: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        let address = row.address_id.map(|id| Address {
            id,
            first_line: row.first_line.unwrap_or_default(),
            second_line: row.second_line,
            city: row.city.unwrap_or_default(),
            country: row.country.unwrap_or_default(),
            postal_code: row.postal_code.unwrap_or_default(),
        });
        Location {
            id: row.id,
            name: row.name,
            coordinates: row.coordinates,
            address,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct MediaRow {
    pub id: Uuid,
    pub kind: String,
    pub caption: Option<String>,
    pub url: String,
    pub public_id: String,
}

impl MediaRow {
    pub fn into_media(self) -> Result<Media, StoreError> {
        let kind: MediaKind = self.kind.parse().map_err(|_| corrupt("media kind", &self.kind))?;
        Ok(Media {
            id: self.id,
            kind,
            caption: self.caption,
            url: self.url,
            public_id: self.public_id,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct FactRow {
    pub id: Uuid,
    pub text: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, FromRow)]
pub struct OrganizationRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub head_quarters_id: Option<Uuid>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ContributionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub entity_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl ContributionRow {
    pub fn into_contribution(self) -> Result<Contribution, StoreError> {
        let kind: ContributionKind = self
            .kind
            .parse()
            .map_err(|_| corrupt("contribution kind", &self.kind))?;
        Ok(Contribution {
            id: self.id,
            user_id: self.user_id,
            kind,
            entity_id: self.entity_id,
            created_at: self.created_at,
        })
    }
}

/// A related row tagged with the id of the record that owns the link.
#[derive(Debug, Clone, FromRow)]
pub struct Linked<T> {
    pub owner_id: Uuid,
    #[sqlx(flatten)]
    pub row: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_without_address() {
        let location: Location = LocationRow {
            id: Uuid::new_v4(),
            name: "Selma".into(),
            coordinates: None,
            address_id: None,
            first_line: None,
            second_line: None,
            city: None,
            country: None,
            postal_code: None,
        }
        .into();
        assert!(location.address.is_none());
    }

    #[test]
    fn test_location_with_address() {
        let address_id = Uuid::new_v4();
        let location: Location = LocationRow {
            id: Uuid::new_v4(),
            name: "Woolworth's".into(),
            coordinates: Some("36.0726,-79.7920".into()),
            address_id: Some(address_id),
            first_line: Some("132 S Elm St".into()),
            second_line: None,
            city: Some("Greensboro".into()),
            country: Some("USA".into()),
            postal_code: Some("27401".into()),
        }
        .into();
        let address = location.address.unwrap();
        assert_eq!(address.id, address_id);
        assert_eq!(address.city, "Greensboro");
    }

    #[test]
    fn test_unknown_role_is_backend_error() {
        let row = UserRow {
            id: Uuid::new_v4(),
            first_name: "A".into(),
            last_name: "B".into(),
            email: "a@b.c".into(),
            password_hash: "h".into(),
            profile_picture: None,
            bio: None,
            gender: None,
            role: "owner".into(),
            created_at: Utc::now(),
        };
        assert!(matches!(row.into_user(), Err(StoreError::Backend(_))));
    }

    #[test]
    fn test_media_kind_parses() {
        let media = MediaRow {
            id: Uuid::new_v4(),
            kind: "video".into(),
            caption: None,
            url: "https://media.example/v.mp4".into(),
            public_id: "uploads/media/videos/v".into(),
        }
        .into_media()
        .unwrap();
        assert_eq!(media.kind, MediaKind::Video);
    }
}
