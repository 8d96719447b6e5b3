//! # Write payloads: nested create/connect requests
//!
//! A mutation that creates a [`crate::models::Fact`] may at the same time attach
//! people that already exist and create new ones inline. Rather than issuing one
//! store call per related record, callers assemble a single payload here and hand
//! it to the store, which applies it as one atomic write.
//!
//! ## Building blocks
//!
//! - [`Relation`]: a to-many relation holding ids to **connect** plus new records to
//!   **create**. Connecting the same id twice collapses to one association.
//! - [`Link`]: a to-one relation with exactly one of connect or create.
//! - `New*` structs: the inline records that can be created through a relation.
//!
//! ## Payloads
//!
//! [`PersonWrite`], [`UserWrite`], [`FactWrite`], [`EventWrite`],
//! [`OrganizationWrite`] and [`MediaWrite`] are built with chained methods and
//! checked with [`Validate::validate`] before dispatch. Stores call `validate`
//! again on entry so an unchecked payload never reaches a table.
//!
//! ```
//! use store::write::{FactWrite, NewPerson, Relation};
//! use uuid::Uuid;
//!
//! let existing = Uuid::new_v4();
//! let write = FactWrite::new("The first sit-in took place in 1960.")
//!     .source("https://example.org/sit-ins")
//!     .people(
//!         Relation::new()
//!             .connect(existing)
//!             .create(NewPerson::named("Ezell", "Blair Jr.")),
//!     );
//! assert!(store::write::Validate::validate(&write).is_ok());
//! ```

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::WriteError;
use crate::models::{MediaKind, Role};

/// Checked before a payload is applied.
pub trait Validate {
    fn validate(&self) -> Result<(), WriteError>;
}

fn non_blank(field: &'static str, value: &str) -> Result<(), WriteError> {
    if value.trim().is_empty() {
        return Err(WriteError::Blank { field });
    }
    Ok(())
}

/// Trim an optional string, mapping blank values to `None`.
pub fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// To-many relation: existing ids to connect plus inline records to create.
#[derive(Clone, Debug, PartialEq)]
pub struct Relation<T> {
    connect: Vec<Uuid>,
    create: Vec<T>,
}

impl<T> Default for Relation<T> {
    fn default() -> Self {
        Self {
            connect: Vec::new(),
            create: Vec::new(),
        }
    }
}

impl<T> Relation<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(mut self, id: Uuid) -> Self {
        if !self.connect.contains(&id) {
            self.connect.push(id);
        }
        self
    }

    pub fn connect_all(self, ids: impl IntoIterator<Item = Uuid>) -> Self {
        ids.into_iter().fold(self, Relation::connect)
    }

    pub fn create(mut self, record: T) -> Self {
        self.create.push(record);
        self
    }

    pub fn create_all(mut self, records: impl IntoIterator<Item = T>) -> Self {
        self.create.extend(records);
        self
    }

    pub fn connected(&self) -> &[Uuid] {
        &self.connect
    }

    pub fn created(&self) -> &[T] {
        &self.create
    }

    pub fn is_empty(&self) -> bool {
        self.connect.is_empty() && self.create.is_empty()
    }
}

impl<T: Validate> Validate for Relation<T> {
    fn validate(&self) -> Result<(), WriteError> {
        self.create.iter().try_for_each(Validate::validate)
    }
}

/// To-one relation.
#[derive(Clone, Debug, PartialEq)]
pub enum Link<T> {
    Connect(Uuid),
    Create(T),
}

impl<T: Validate> Validate for Link<T> {
    fn validate(&self) -> Result<(), WriteError> {
        match self {
            Link::Connect(_) => Ok(()),
            Link::Create(record) => record.validate(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewPerson {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub alias: Option<String>,
}

impl NewPerson {
    pub fn named(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

impl Validate for NewPerson {
    fn validate(&self) -> Result<(), WriteError> {
        let named = [&self.first_name, &self.last_name, &self.alias]
            .iter()
            .any(|part| part.as_deref().is_some_and(|p| !p.trim().is_empty()));
        if named {
            Ok(())
        } else {
            Err(WriteError::AnonymousPerson)
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewAddress {
    pub first_line: String,
    pub second_line: Option<String>,
    pub city: String,
    pub country: String,
    pub postal_code: String,
}

impl Validate for NewAddress {
    fn validate(&self) -> Result<(), WriteError> {
        non_blank("address.firstLine", &self.first_line)?;
        non_blank("address.city", &self.city)?;
        non_blank("address.country", &self.country)?;
        non_blank("address.postalCode", &self.postal_code)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewLocation {
    pub name: String,
    pub coordinates: Option<String>,
    pub address: Option<NewAddress>,
}

impl NewLocation {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_address(mut self, address: NewAddress) -> Self {
        self.address = Some(address);
        self
    }
}

impl Validate for NewLocation {
    fn validate(&self) -> Result<(), WriteError> {
        non_blank("location.name", &self.name)?;
        match &self.address {
            Some(address) => address.validate(),
            None => Ok(()),
        }
    }
}

/// A file that already lives at the media provider.
#[derive(Clone, Debug, PartialEq)]
pub struct NewMedia {
    pub kind: MediaKind,
    pub caption: Option<String>,
    pub url: String,
    pub public_id: String,
}

impl NewMedia {
    pub fn hosted(kind: MediaKind, url: impl Into<String>, public_id: impl Into<String>) -> Self {
        Self {
            kind,
            caption: None,
            url: url.into(),
            public_id: public_id.into(),
        }
    }

    pub fn with_caption(mut self, caption: Option<String>) -> Self {
        self.caption = normalize(caption);
        self
    }
}

impl Validate for NewMedia {
    fn validate(&self) -> Result<(), WriteError> {
        non_blank("media.url", &self.url)?;
        non_blank("media.publicId", &self.public_id)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PersonWrite {
    pub person: NewPerson,
    pub contributor: Option<Uuid>,
}

impl PersonWrite {
    pub fn new(person: NewPerson) -> Self {
        Self {
            person,
            contributor: None,
        }
    }

    pub fn contributed_by(mut self, user_id: Option<Uuid>) -> Self {
        self.contributor = user_id;
        self
    }
}

impl Validate for PersonWrite {
    fn validate(&self) -> Result<(), WriteError> {
        self.person.validate()
    }
}

/// A new account. The password is already hashed by the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct UserWrite {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub gender: Option<String>,
    pub role: Role,
}

impl UserWrite {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into().trim().to_string(),
            last_name: last_name.into().trim().to_string(),
            email: email.into().trim().to_lowercase(),
            password_hash: password_hash.into(),
            profile_picture: None,
            bio: None,
            gender: None,
            role: Role::User,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_profile(
        mut self,
        profile_picture: Option<String>,
        bio: Option<String>,
        gender: Option<String>,
    ) -> Self {
        self.profile_picture = normalize(profile_picture);
        self.bio = normalize(bio);
        self.gender = normalize(gender);
        self
    }
}

impl Validate for UserWrite {
    fn validate(&self) -> Result<(), WriteError> {
        non_blank("user.firstName", &self.first_name)?;
        non_blank("user.lastName", &self.last_name)?;
        if !self.email.contains('@') {
            return Err(WriteError::Invalid("Invalid email address".to_string()));
        }
        non_blank("user.passwordHash", &self.password_hash)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FactWrite {
    pub text: String,
    pub sources: Vec<String>,
    pub people: Relation<NewPerson>,
    pub locations: Relation<NewLocation>,
    pub media: Relation<NewMedia>,
    pub contributor: Option<Uuid>,
}

impl FactWrite {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into().trim().to_string(),
            sources: Vec::new(),
            people: Relation::new(),
            locations: Relation::new(),
            media: Relation::new(),
            contributor: None,
        }
    }

    /// Blank sources are dropped.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        let source = source.into().trim().to_string();
        if !source.is_empty() {
            self.sources.push(source);
        }
        self
    }

    pub fn sources(self, sources: impl IntoIterator<Item = String>) -> Self {
        sources.into_iter().fold(self, |write, s| write.source(s))
    }

    pub fn people(mut self, people: Relation<NewPerson>) -> Self {
        self.people = people;
        self
    }

    pub fn locations(mut self, locations: Relation<NewLocation>) -> Self {
        self.locations = locations;
        self
    }

    pub fn media(mut self, media: Relation<NewMedia>) -> Self {
        self.media = media;
        self
    }

    pub fn contributed_by(mut self, user_id: Option<Uuid>) -> Self {
        self.contributor = user_id;
        self
    }
}

impl Validate for FactWrite {
    fn validate(&self) -> Result<(), WriteError> {
        non_blank("fact.text", &self.text)?;
        self.people.validate()?;
        self.locations.validate()?;
        self.media.validate()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EventWrite {
    pub name: String,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub people: Relation<NewPerson>,
    pub locations: Relation<NewLocation>,
    pub media: Relation<NewMedia>,
    pub contributor: Option<Uuid>,
}

impl EventWrite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            description: None,
            date: None,
            people: Relation::new(),
            locations: Relation::new(),
            media: Relation::new(),
            contributor: None,
        }
    }

    pub fn described(mut self, description: Option<String>) -> Self {
        self.description = normalize(description);
        self
    }

    pub fn on(mut self, date: Option<NaiveDate>) -> Self {
        self.date = date;
        self
    }

    pub fn people(mut self, people: Relation<NewPerson>) -> Self {
        self.people = people;
        self
    }

    pub fn locations(mut self, locations: Relation<NewLocation>) -> Self {
        self.locations = locations;
        self
    }

    pub fn media(mut self, media: Relation<NewMedia>) -> Self {
        self.media = media;
        self
    }

    pub fn contributed_by(mut self, user_id: Option<Uuid>) -> Self {
        self.contributor = user_id;
        self
    }
}

impl Validate for EventWrite {
    fn validate(&self) -> Result<(), WriteError> {
        non_blank("event.name", &self.name)?;
        self.people.validate()?;
        self.locations.validate()?;
        self.media.validate()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrganizationWrite {
    pub name: String,
    pub description: Option<String>,
    pub head_quarters: Option<Link<NewLocation>>,
    pub contributor: Option<Uuid>,
}

impl OrganizationWrite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            description: None,
            head_quarters: None,
            contributor: None,
        }
    }

    pub fn described(mut self, description: Option<String>) -> Self {
        self.description = normalize(description);
        self
    }

    pub fn head_quarters(mut self, location: Link<NewLocation>) -> Self {
        self.head_quarters = Some(location);
        self
    }

    pub fn contributed_by(mut self, user_id: Option<Uuid>) -> Self {
        self.contributor = user_id;
        self
    }
}

impl Validate for OrganizationWrite {
    fn validate(&self) -> Result<(), WriteError> {
        non_blank("organization.name", &self.name)?;
        match &self.head_quarters {
            Some(link) => link.validate(),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MediaWrite {
    pub media: NewMedia,
    pub contributor: Option<Uuid>,
}

impl MediaWrite {
    pub fn new(media: NewMedia) -> Self {
        Self {
            media,
            contributor: None,
        }
    }

    pub fn contributed_by(mut self, user_id: Option<Uuid>) -> Self {
        self.contributor = user_id;
        self
    }
}

impl Validate for MediaWrite {
    fn validate(&self) -> Result<(), WriteError> {
        self.media.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_collapses_duplicate_connects() {
        let id = Uuid::new_v4();
        let relation: Relation<NewPerson> = Relation::new().connect(id).connect(id);
        assert_eq!(relation.connected(), &[id]);
        assert!(relation.created().is_empty());
        assert!(!relation.is_empty());
    }

    #[test]
    fn test_fact_requires_text() {
        let err = FactWrite::new("   ").validate().unwrap_err();
        assert_eq!(err, WriteError::Blank { field: "fact.text" });
    }

    #[test]
    fn test_fact_validates_nested_creates() {
        let write = FactWrite::new("A fact")
            .people(Relation::new().create(NewPerson::default()));
        assert_eq!(write.validate().unwrap_err(), WriteError::AnonymousPerson);

        let write = FactWrite::new("A fact").locations(
            Relation::new().create(NewLocation::named("Greensboro").with_address(NewAddress {
                first_line: "132 S Elm St".into(),
                city: "".into(),
                country: "USA".into(),
                postal_code: "27401".into(),
                ..NewAddress::default()
            })),
        );
        assert_eq!(
            write.validate().unwrap_err(),
            WriteError::Blank { field: "address.city" }
        );
    }

    #[test]
    fn test_fact_drops_blank_sources() {
        let write = FactWrite::new("A fact").sources(vec![
            "https://a.example".to_string(),
            "  ".to_string(),
            " https://b.example ".to_string(),
        ]);
        assert_eq!(write.sources, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn test_person_with_only_alias_is_valid() {
        let person = NewPerson::default().with_alias("Malcolm X");
        assert!(person.validate().is_ok());
    }

    #[test]
    fn test_user_write_normalizes_email() {
        let write = UserWrite::new("Ida", "Wells", "  Ida@Example.COM ", "$argon2id$hash");
        assert_eq!(write.email, "ida@example.com");
        assert!(write.validate().is_ok());

        let bad = UserWrite::new("Ida", "Wells", "not-an-email", "$argon2id$hash");
        assert!(matches!(bad.validate(), Err(WriteError::Invalid(_))));
    }

    #[test]
    fn test_organization_connect_headquarters_needs_no_fields() {
        let write = OrganizationWrite::new("NAACP").head_quarters(Link::Connect(Uuid::new_v4()));
        assert!(write.validate().is_ok());

        let write = OrganizationWrite::new("NAACP").head_quarters(Link::Create(NewLocation::default()));
        assert!(write.validate().is_err());
    }
}
