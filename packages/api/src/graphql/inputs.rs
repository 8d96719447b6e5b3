//! GraphQL input objects and their conversion into `store` write payloads.
//!
//! Relation inputs have the shape `{ connect: [ID!], create: [XInput!] }`;
//! both lists are optional. Media inputs may carry a file upload, which is
//! resolved by the mutation before the payload is built (see
//! [`super::mutation`]), so [`MediaInput`] has no direct conversion.

use async_graphql::{InputObject, OneofObject, Upload, ID};
use store::write::{
    normalize, NewAddress, NewLocation, NewPerson, PersonWrite, Relation, UserWrite,
};
use store::{MediaKind, Role};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

pub(crate) fn parse_id(id: &ID) -> ApiResult<Uuid> {
    Uuid::parse_str(id.as_str()).map_err(|_| ApiError::validation(format!("Invalid id: {}", id.as_str())))
}

pub(crate) fn parse_ids(ids: Option<Vec<ID>>) -> ApiResult<Vec<Uuid>> {
    ids.unwrap_or_default().iter().map(parse_id).collect()
}

#[derive(InputObject)]
pub struct UserInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[graphql(secret)]
    pub password: String,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub gender: Option<String>,
    pub role: Option<Role>,
}

impl UserInput {
    pub fn into_write(self, password_hash: String) -> UserWrite {
        UserWrite::new(self.first_name, self.last_name, self.email, password_hash)
            .with_profile(self.profile_picture, self.bio, self.gender)
            .with_role(self.role.unwrap_or(Role::User))
    }
}

#[derive(Debug, Clone, InputObject)]
pub struct PersonInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub alias: Option<String>,
}

impl From<PersonInput> for NewPerson {
    fn from(input: PersonInput) -> Self {
        NewPerson {
            first_name: normalize(input.first_name),
            last_name: normalize(input.last_name),
            alias: normalize(input.alias),
        }
    }
}

impl PersonInput {
    pub fn into_write(self, contributor: Uuid) -> PersonWrite {
        PersonWrite::new(self.into()).contributed_by(Some(contributor))
    }
}

#[derive(Debug, Clone, InputObject)]
pub struct AddressInput {
    pub first_line: String,
    pub second_line: Option<String>,
    pub city: String,
    pub country: String,
    pub postal_code: String,
}

impl From<AddressInput> for NewAddress {
    fn from(input: AddressInput) -> Self {
        NewAddress {
            first_line: input.first_line,
            second_line: normalize(input.second_line),
            city: input.city,
            country: input.country,
            postal_code: input.postal_code,
        }
    }
}

#[derive(Debug, Clone, InputObject)]
pub struct LocationInput {
    pub name: String,
    pub coordinates: Option<String>,
    pub address: Option<AddressInput>,
}

impl From<LocationInput> for NewLocation {
    fn from(input: LocationInput) -> Self {
        NewLocation {
            name: input.name,
            coordinates: normalize(input.coordinates),
            address: input.address.map(NewAddress::from),
        }
    }
}

/// A media record to create: either a `file` to upload or an already hosted
/// `url` with its `publicId`.
#[derive(InputObject)]
pub struct MediaInput {
    /// Ignored when a file is uploaded; the file's MIME type decides.
    #[graphql(name = "type")]
    pub kind: Option<MediaKind>,
    pub caption: Option<String>,
    pub file: Option<Upload>,
    pub url: Option<String>,
    pub public_id: Option<String>,
}

#[derive(Debug, Default, InputObject)]
pub struct PeopleRelationInput {
    pub connect: Option<Vec<ID>>,
    pub create: Option<Vec<PersonInput>>,
}

impl PeopleRelationInput {
    pub fn into_relation(self) -> ApiResult<Relation<NewPerson>> {
        Ok(Relation::new()
            .connect_all(parse_ids(self.connect)?)
            .create_all(self.create.unwrap_or_default().into_iter().map(NewPerson::from)))
    }
}

#[derive(Debug, Default, InputObject)]
pub struct LocationsRelationInput {
    pub connect: Option<Vec<ID>>,
    pub create: Option<Vec<LocationInput>>,
}

impl LocationsRelationInput {
    pub fn into_relation(self) -> ApiResult<Relation<NewLocation>> {
        Ok(Relation::new()
            .connect_all(parse_ids(self.connect)?)
            .create_all(self.create.unwrap_or_default().into_iter().map(NewLocation::from)))
    }
}

#[derive(Default, InputObject)]
pub struct MediaRelationInput {
    pub connect: Option<Vec<ID>>,
    pub create: Option<Vec<MediaInput>>,
}

/// Organization headquarters: exactly one of `connect` or `create`.
#[derive(Debug, OneofObject)]
pub enum HeadQuartersInput {
    Connect(ID),
    Create(LocationInput),
}

#[derive(InputObject)]
pub struct FactInput {
    pub text: String,
    pub sources: Option<Vec<String>>,
    pub people: Option<PeopleRelationInput>,
    pub locations: Option<LocationsRelationInput>,
    pub media: Option<MediaRelationInput>,
}

#[derive(InputObject)]
pub struct EventInput {
    pub name: String,
    pub description: Option<String>,
    pub date: Option<chrono::NaiveDate>,
    pub people: Option<PeopleRelationInput>,
    pub locations: Option<LocationsRelationInput>,
    pub media: Option<MediaRelationInput>,
}

#[derive(Debug, InputObject)]
pub struct OrganizationInput {
    pub name: String,
    pub description: Option<String>,
    pub head_quarters: Option<HeadQuartersInput>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_people_relation_collects_connects_and_creates() {
        let id = Uuid::new_v4();
        let relation = PeopleRelationInput {
            connect: Some(vec![ID::from(id.to_string()), ID::from(id.to_string())]),
            create: Some(vec![PersonInput {
                first_name: Some(" Rosa ".into()),
                last_name: Some("Parks".into()),
                alias: Some("  ".into()),
            }]),
        }
        .into_relation()
        .unwrap();

        assert_eq!(relation.connected(), &[id]);
        assert_eq!(relation.created()[0].first_name.as_deref(), Some("Rosa"));
        assert_eq!(relation.created()[0].alias, None);
    }

    #[test]
    fn test_malformed_id_is_rejected() {
        let err = LocationsRelationInput {
            connect: Some(vec![ID::from("not-a-uuid")]),
            create: None,
        }
        .into_relation()
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref m) if m == "Invalid id: not-a-uuid"));
    }

    #[test]
    fn test_user_input_defaults_to_user_role() {
        let write = UserInput {
            first_name: "Medgar".into(),
            last_name: "Evers".into(),
            email: "Medgar@Example.com".into(),
            password: "irrelevant".into(),
            profile_picture: None,
            bio: Some(" ".into()),
            gender: None,
            role: None,
        }
        .into_write("$argon2id$hash".into());

        assert_eq!(write.role, Role::User);
        assert_eq!(write.email, "medgar@example.com");
        assert_eq!(write.bio, None);
    }
}
