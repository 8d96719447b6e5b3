use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    Address, Contribution, ContributionKind, Event, Fact, Location, Media, Organization, Person,
    User,
};
use crate::repo::{DataStore, StoreResult};
use crate::write::{
    normalize, EventWrite, FactWrite, Link, MediaWrite, NewLocation, NewMedia, NewPerson,
    OrganizationWrite, PersonWrite, Relation, UserWrite, Validate,
};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    people: Vec<Person>,
    locations: Vec<Location>,
    media: Vec<Media>,
    facts: Vec<Fact>,
    events: Vec<Event>,
    organizations: Vec<Organization>,
    contributions: Vec<Contribution>,
    writes: usize,
}

/// In-memory DataStore for tests and local runs.
///
/// Each write takes the table lock once, checks every connected id, and only
/// then inserts, so a failed write leaves the tables untouched.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes applied so far.
    pub fn write_count(&self) -> usize {
        self.tables().writes
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn lookup<T: Clone>(
    rows: &[T],
    id_of: impl Fn(&T) -> Uuid,
    ids: &[Uuid],
    entity: &'static str,
) -> StoreResult<Vec<T>> {
    ids.iter()
        .map(|id| {
            rows.iter()
                .find(|row| id_of(row) == *id)
                .cloned()
                .ok_or_else(|| StoreError::not_found(entity, *id))
        })
        .collect()
}

fn person_from(new: &NewPerson) -> Person {
    Person {
        id: Uuid::new_v4(),
        first_name: normalize(new.first_name.clone()),
        last_name: normalize(new.last_name.clone()),
        alias: normalize(new.alias.clone()),
    }
}

fn location_from(new: &NewLocation) -> Location {
    Location {
        id: Uuid::new_v4(),
        name: new.name.trim().to_string(),
        coordinates: normalize(new.coordinates.clone()),
        address: new.address.as_ref().map(|a| Address {
            id: Uuid::new_v4(),
            first_line: a.first_line.trim().to_string(),
            second_line: normalize(a.second_line.clone()),
            city: a.city.trim().to_string(),
            country: a.country.trim().to_string(),
            postal_code: a.postal_code.trim().to_string(),
        }),
    }
}

fn media_from(new: &NewMedia) -> Media {
    Media {
        id: Uuid::new_v4(),
        kind: new.kind,
        caption: normalize(new.caption.clone()),
        url: new.url.clone(),
        public_id: new.public_id.clone(),
    }
}

/// Rows staged by a write, inserted only once every lookup succeeded.
#[derive(Default)]
struct Staged {
    people: Vec<Person>,
    locations: Vec<Location>,
    media: Vec<Media>,
}

impl Tables {
    fn stage_people(&self, rel: &Relation<NewPerson>, staged: &mut Staged) -> StoreResult<Vec<Person>> {
        let mut people = lookup(&self.people, |p| p.id, rel.connected(), "person")?;
        let created: Vec<Person> = rel.created().iter().map(person_from).collect();
        staged.people.extend(created.iter().cloned());
        people.extend(created);
        Ok(people)
    }

    fn stage_locations(
        &self,
        rel: &Relation<NewLocation>,
        staged: &mut Staged,
    ) -> StoreResult<Vec<Location>> {
        let mut locations = lookup(&self.locations, |l| l.id, rel.connected(), "location")?;
        let created: Vec<Location> = rel.created().iter().map(location_from).collect();
        staged.locations.extend(created.iter().cloned());
        locations.extend(created);
        Ok(locations)
    }

    fn stage_media(&self, rel: &Relation<NewMedia>, staged: &mut Staged) -> StoreResult<Vec<Media>> {
        let mut media = lookup(&self.media, |m| m.id, rel.connected(), "media")?;
        let created: Vec<Media> = rel.created().iter().map(media_from).collect();
        staged.media.extend(created.iter().cloned());
        media.extend(created);
        Ok(media)
    }

    fn commit(&mut self, staged: Staged, contribution: Option<(Uuid, ContributionKind, Uuid)>) {
        self.people.extend(staged.people);
        self.locations.extend(staged.locations);
        self.media.extend(staged.media);
        if let Some((user_id, kind, entity_id)) = contribution {
            self.contributions.push(Contribution {
                id: Uuid::new_v4(),
                user_id,
                kind,
                entity_id,
                created_at: Utc::now(),
            });
        }
        self.writes += 1;
    }

    fn check_contributor(&self, contributor: Option<Uuid>) -> StoreResult<()> {
        match contributor {
            Some(id) if !self.users.iter().any(|u| u.id == id) => {
                Err(StoreError::not_found("user", id))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn people(&self) -> StoreResult<Vec<Person>> {
        Ok(self.tables().people.clone())
    }

    async fn users(&self) -> StoreResult<Vec<User>> {
        Ok(self.tables().users.clone())
    }

    async fn facts(&self) -> StoreResult<Vec<Fact>> {
        Ok(self.tables().facts.clone())
    }

    async fn events(&self) -> StoreResult<Vec<Event>> {
        Ok(self.tables().events.clone())
    }

    async fn organizations(&self) -> StoreResult<Vec<Organization>> {
        Ok(self.tables().organizations.clone())
    }

    async fn media(&self) -> StoreResult<Vec<Media>> {
        Ok(self.tables().media.clone())
    }

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables().users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = email.trim().to_lowercase();
        Ok(self.tables().users.iter().find(|u| u.email == email).cloned())
    }

    async fn contributions_by(&self, user_id: Uuid) -> StoreResult<Vec<Contribution>> {
        Ok(self
            .tables()
            .contributions
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create_user(&self, write: UserWrite) -> StoreResult<User> {
        write.validate()?;
        let mut tables = self.tables();
        if tables.users.iter().any(|u| u.email == write.email) {
            return Err(StoreError::Conflict(format!(
                "a user with email {} already exists",
                write.email
            )));
        }
        let user = User {
            id: Uuid::new_v4(),
            first_name: write.first_name,
            last_name: write.last_name,
            email: write.email,
            password_hash: write.password_hash,
            profile_picture: write.profile_picture,
            bio: write.bio,
            gender: write.gender,
            role: write.role,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        tables.writes += 1;
        Ok(user)
    }

    async fn create_person(&self, write: PersonWrite) -> StoreResult<Person> {
        write.validate()?;
        let mut tables = self.tables();
        tables.check_contributor(write.contributor)?;
        let person = person_from(&write.person);
        let staged = Staged {
            people: vec![person.clone()],
            ..Staged::default()
        };
        let contribution = write
            .contributor
            .map(|user| (user, ContributionKind::Person, person.id));
        tables.commit(staged, contribution);
        Ok(person)
    }

    async fn create_fact(&self, write: FactWrite) -> StoreResult<Fact> {
        write.validate()?;
        let mut tables = self.tables();
        tables.check_contributor(write.contributor)?;
        let mut staged = Staged::default();
        let people = tables.stage_people(&write.people, &mut staged)?;
        let locations = tables.stage_locations(&write.locations, &mut staged)?;
        let media = tables.stage_media(&write.media, &mut staged)?;

        let fact = Fact {
            id: Uuid::new_v4(),
            text: write.text,
            sources: write.sources,
            people,
            locations,
            media,
        };
        tables.facts.push(fact.clone());
        let contribution = write
            .contributor
            .map(|user| (user, ContributionKind::Fact, fact.id));
        tables.commit(staged, contribution);
        Ok(fact)
    }

    async fn create_event(&self, write: EventWrite) -> StoreResult<Event> {
        write.validate()?;
        let mut tables = self.tables();
        tables.check_contributor(write.contributor)?;
        let mut staged = Staged::default();
        let people = tables.stage_people(&write.people, &mut staged)?;
        let locations = tables.stage_locations(&write.locations, &mut staged)?;
        let media = tables.stage_media(&write.media, &mut staged)?;

        let event = Event {
            id: Uuid::new_v4(),
            name: write.name,
            description: write.description,
            date: write.date,
            people,
            locations,
            media,
        };
        tables.events.push(event.clone());
        let contribution = write
            .contributor
            .map(|user| (user, ContributionKind::Event, event.id));
        tables.commit(staged, contribution);
        Ok(event)
    }

    async fn create_organization(&self, write: OrganizationWrite) -> StoreResult<Organization> {
        write.validate()?;
        let mut tables = self.tables();
        tables.check_contributor(write.contributor)?;
        let mut staged = Staged::default();
        let head_quarters = match &write.head_quarters {
            Some(Link::Connect(id)) => {
                lookup(&tables.locations, |l| l.id, &[*id], "location")?.pop()
            }
            Some(Link::Create(new)) => {
                let location = location_from(new);
                staged.locations.push(location.clone());
                Some(location)
            }
            None => None,
        };

        let organization = Organization {
            id: Uuid::new_v4(),
            name: write.name,
            description: write.description,
            head_quarters,
        };
        tables.organizations.push(organization.clone());
        let contribution = write
            .contributor
            .map(|user| (user, ContributionKind::Organization, organization.id));
        tables.commit(staged, contribution);
        Ok(organization)
    }

    async fn create_media(&self, write: MediaWrite) -> StoreResult<Media> {
        write.validate()?;
        let mut tables = self.tables();
        tables.check_contributor(write.contributor)?;
        let media = media_from(&write.media);
        let staged = Staged {
            media: vec![media.clone()],
            ..Staged::default()
        };
        let contribution = write
            .contributor
            .map(|user| (user, ContributionKind::Media, media.id));
        tables.commit(staged, contribution);
        Ok(media)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaKind;
    use crate::write::NewAddress;

    async fn seeded_user(store: &MemoryStore) -> User {
        store
            .create_user(UserWrite::new("Rosa", "Parks", "rosa@example.com", "$argon2id$x"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_fact_connects_and_creates_in_one_write() {
        let store = MemoryStore::new();
        let user = seeded_user(&store).await;
        let existing = store
            .create_person(PersonWrite::new(NewPerson::named("Claudette", "Colvin")))
            .await
            .unwrap();
        let writes_before = store.write_count();

        let fact = store
            .create_fact(
                FactWrite::new("Arrested for refusing to give up her seat.")
                    .people(
                        Relation::new()
                            .connect(existing.id)
                            .create(NewPerson::named("Rosa", "Parks")),
                    )
                    .locations(Relation::new().create(
                        NewLocation::named("Montgomery").with_address(NewAddress {
                            first_line: "Montgomery St".into(),
                            city: "Montgomery".into(),
                            country: "USA".into(),
                            postal_code: "36104".into(),
                            ..NewAddress::default()
                        }),
                    ))
                    .media(Relation::new().create(NewMedia::hosted(
                        MediaKind::Image,
                        "https://cdn.example/bus.jpg",
                        "uploads/media/images/bus",
                    )))
                    .contributed_by(Some(user.id)),
            )
            .await
            .unwrap();

        assert_eq!(store.write_count(), writes_before + 1);
        assert_eq!(fact.people.len(), 2);
        assert_eq!(fact.people[0].id, existing.id);
        assert_eq!(fact.people[1].first_name.as_deref(), Some("Rosa"));
        assert_eq!(fact.locations[0].address.as_ref().unwrap().city, "Montgomery");
        assert_eq!(fact.media.len(), 1);

        assert_eq!(store.people().await.unwrap().len(), 2);
        assert_eq!(store.media().await.unwrap().len(), 1);

        let contributions = store.contributions_by(user.id).await.unwrap();
        assert_eq!(contributions.len(), 1);
        assert_eq!(contributions[0].kind, ContributionKind::Fact);
        assert_eq!(contributions[0].entity_id, fact.id);
    }

    #[tokio::test]
    async fn test_unknown_connect_writes_nothing() {
        let store = MemoryStore::new();
        let missing = Uuid::new_v4();

        let err = store
            .create_fact(
                FactWrite::new("Some fact").people(
                    Relation::new()
                        .create(NewPerson::named("New", "Person"))
                        .connect(missing),
                ),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::NotFound { entity: "person", id } if id == missing));
        assert_eq!(store.write_count(), 0);
        assert!(store.people().await.unwrap().is_empty());
        assert!(store.facts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        seeded_user(&store).await;

        let err = store
            .create_user(UserWrite::new("Rosa", "Parks", "ROSA@example.com", "$argon2id$y"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_user_by_email_is_case_insensitive() {
        let store = MemoryStore::new();
        let user = seeded_user(&store).await;
        let found = store.user_by_email(" Rosa@Example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn test_organization_connects_existing_headquarters() {
        let store = MemoryStore::new();
        let first = store
            .create_organization(
                OrganizationWrite::new("SCLC")
                    .head_quarters(Link::Create(NewLocation::named("Atlanta"))),
            )
            .await
            .unwrap();
        let hq = first.head_quarters.clone().unwrap();

        let second = store
            .create_organization(OrganizationWrite::new("SNCC").head_quarters(Link::Connect(hq.id)))
            .await
            .unwrap();

        assert_eq!(second.head_quarters.unwrap().id, hq.id);
        assert_eq!(store.organizations().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_contributor_is_rejected() {
        let store = MemoryStore::new();
        let err = store
            .create_person(
                PersonWrite::new(NewPerson::named("Medgar", "Evers"))
                    .contributed_by(Some(Uuid::new_v4())),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "user", .. }));
        assert!(store.people().await.unwrap().is_empty());
    }
}
