//! # PgStore: PostgreSQL implementation of [`DataStore`]
//!
//! Every `create_*` call runs inside one transaction: connected ids are
//! checked first (`NotFound` aborts before anything is inserted), then the
//! inline records, the record itself, the join rows and the contribution are
//! written and the transaction commits. Dropping the transaction on an early
//! return rolls everything back.
//!
//! Join tables carry a `position` column so relations read back in write
//! order: connected ids first, then the records created inline.
//!
//! Each store operation is timed and logged at `debug` with its name and the
//! elapsed milliseconds.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::time::Instant;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use store::write::{
    normalize, EventWrite, FactWrite, Link, MediaWrite, NewLocation, NewMedia, NewPerson,
    OrganizationWrite, PersonWrite, Relation, UserWrite, Validate,
};
use store::{
    Contribution, ContributionKind, DataStore, Event, Fact, Location, Media, Organization, Person,
    StoreError, StoreResult, User,
};
use uuid::Uuid;

use super::rows::{
    ContributionRow, EventRow, FactRow, Linked, LocationRow, MediaRow, OrganizationRow, PersonRow,
    UserRow,
};

const USER_COLUMNS: &str = "id, first_name, last_name, email, password_hash, profile_picture, \
                            bio, gender, role, created_at";

const LOCATION_COLUMNS: &str = "l.id, l.name, l.coordinates, a.id AS address_id, a.first_line, \
                                a.second_line, a.city, a.country, a.postal_code";

/// Join tables of a record type that links people, locations and media.
struct JoinTables {
    owner_column: &'static str,
    people: &'static str,
    locations: &'static str,
    media: &'static str,
}

const FACT_JOINS: JoinTables = JoinTables {
    owner_column: "fact_id",
    people: "fact_people",
    locations: "fact_locations",
    media: "fact_media",
};

const EVENT_JOINS: JoinTables = JoinTables {
    owner_column: "event_id",
    people: "event_people",
    locations: "event_locations",
    media: "event_media",
};

fn db(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(e) = &err {
        if e.is_unique_violation() {
            return StoreError::Conflict(e.message().to_string());
        }
    }
    StoreError::backend(err)
}

async fn timed<T>(op: &'static str, fut: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
    let started = Instant::now();
    let result = fut.await;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => tracing::debug!(op, elapsed_ms, "store operation finished"),
        Err(e) => tracing::debug!(op, elapsed_ms, "store operation failed: {e}"),
    }
    result
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn ensure_exist(
    conn: &mut PgConnection,
    table: &'static str,
    entity: &'static str,
    ids: &[Uuid],
) -> StoreResult<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let found: Vec<(Uuid,)> = sqlx::query_as(&format!("SELECT id FROM {table} WHERE id = ANY($1)"))
        .bind(ids)
        .fetch_all(&mut *conn)
        .await
        .map_err(db)?;
    let found: HashSet<Uuid> = found.into_iter().map(|(id,)| id).collect();
    match ids.iter().find(|id| !found.contains(id)) {
        Some(missing) => Err(StoreError::not_found(entity, *missing)),
        None => Ok(()),
    }
}

async fn ensure_contributor(conn: &mut PgConnection, contributor: Option<Uuid>) -> StoreResult<()> {
    match contributor {
        Some(id) => ensure_exist(conn, "users", "user", &[id]).await,
        None => Ok(()),
    }
}

async fn insert_person(conn: &mut PgConnection, new: &NewPerson) -> StoreResult<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO people (id, first_name, last_name, alias) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(normalize(new.first_name.clone()))
        .bind(normalize(new.last_name.clone()))
        .bind(normalize(new.alias.clone()))
        .execute(&mut *conn)
        .await
        .map_err(db)?;
    Ok(id)
}

async fn insert_location(conn: &mut PgConnection, new: &NewLocation) -> StoreResult<Uuid> {
    let address_id = match &new.address {
        Some(address) => {
            let id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO addresses (id, first_line, second_line, city, country, postal_code) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(id)
            .bind(address.first_line.trim())
            .bind(normalize(address.second_line.clone()))
            .bind(address.city.trim())
            .bind(address.country.trim())
            .bind(address.postal_code.trim())
            .execute(&mut *conn)
            .await
            .map_err(db)?;
            Some(id)
        }
        None => None,
    };

    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO locations (id, name, coordinates, address_id) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(new.name.trim())
        .bind(normalize(new.coordinates.clone()))
        .bind(address_id)
        .execute(&mut *conn)
        .await
        .map_err(db)?;
    Ok(id)
}

async fn insert_media(conn: &mut PgConnection, new: &NewMedia) -> StoreResult<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO media (id, kind, caption, url, public_id) VALUES ($1, $2, $3, $4, $5)")
        .bind(id)
        .bind(new.kind.as_str())
        .bind(normalize(new.caption.clone()))
        .bind(&new.url)
        .bind(&new.public_id)
        .execute(&mut *conn)
        .await
        .map_err(db)?;
    Ok(id)
}

/// Inserts the inline people and returns every id in relation order. Connected
/// ids must already be checked.
async fn stage_people(conn: &mut PgConnection, rel: &Relation<NewPerson>) -> StoreResult<Vec<Uuid>> {
    let mut ids = rel.connected().to_vec();
    for person in rel.created() {
        ids.push(insert_person(conn, person).await?);
    }
    Ok(ids)
}

async fn stage_locations(
    conn: &mut PgConnection,
    rel: &Relation<NewLocation>,
) -> StoreResult<Vec<Uuid>> {
    let mut ids = rel.connected().to_vec();
    for location in rel.created() {
        ids.push(insert_location(conn, location).await?);
    }
    Ok(ids)
}

async fn stage_media(conn: &mut PgConnection, rel: &Relation<NewMedia>) -> StoreResult<Vec<Uuid>> {
    let mut ids = rel.connected().to_vec();
    for media in rel.created() {
        ids.push(insert_media(conn, media).await?);
    }
    Ok(ids)
}

/// Connected ids are checked before any inline record is inserted.
async fn check_connects(
    conn: &mut PgConnection,
    people: &Relation<NewPerson>,
    locations: &Relation<NewLocation>,
    media: &Relation<NewMedia>,
) -> StoreResult<()> {
    ensure_exist(conn, "people", "person", people.connected()).await?;
    ensure_exist(conn, "locations", "location", locations.connected()).await?;
    ensure_exist(conn, "media", "media", media.connected()).await
}

async fn link(
    conn: &mut PgConnection,
    table: &'static str,
    owner_column: &'static str,
    target_column: &'static str,
    owner: Uuid,
    targets: &[Uuid],
) -> StoreResult<()> {
    if targets.is_empty() {
        return Ok(());
    }
    let sql = format!(
        "INSERT INTO {table} ({owner_column}, {target_column}, position) \
         SELECT $1, t.id, (t.ord - 1)::INTEGER FROM UNNEST($2::UUID[]) WITH ORDINALITY AS t(id, ord)"
    );
    sqlx::query(&sql)
        .bind(owner)
        .bind(targets)
        .execute(&mut *conn)
        .await
        .map_err(db)?;
    Ok(())
}

async fn link_all(
    conn: &mut PgConnection,
    joins: &JoinTables,
    owner: Uuid,
    people: &[Uuid],
    locations: &[Uuid],
    media: &[Uuid],
) -> StoreResult<()> {
    link(conn, joins.people, joins.owner_column, "person_id", owner, people).await?;
    link(conn, joins.locations, joins.owner_column, "location_id", owner, locations).await?;
    link(conn, joins.media, joins.owner_column, "media_id", owner, media).await
}

async fn record_contribution(
    conn: &mut PgConnection,
    contributor: Option<Uuid>,
    kind: ContributionKind,
    entity_id: Uuid,
) -> StoreResult<()> {
    let Some(user_id) = contributor else {
        return Ok(());
    };
    sqlx::query("INSERT INTO contributions (id, user_id, kind, entity_id) VALUES ($1, $2, $3, $4)")
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(kind.as_str())
        .bind(entity_id)
        .execute(&mut *conn)
        .await
        .map_err(db)?;
    Ok(())
}

fn group<T>(linked: Vec<Linked<T>>) -> HashMap<Uuid, Vec<T>> {
    let mut grouped: HashMap<Uuid, Vec<T>> = HashMap::new();
    for Linked { owner_id, row } in linked {
        grouped.entry(owner_id).or_default().push(row);
    }
    grouped
}

async fn linked_people(
    conn: &mut PgConnection,
    joins: &JoinTables,
    owners: &[Uuid],
) -> StoreResult<HashMap<Uuid, Vec<Person>>> {
    let sql = format!(
        "SELECT j.{owner} AS owner_id, p.id, p.first_name, p.last_name, p.alias \
         FROM {table} j JOIN people p ON p.id = j.person_id \
         WHERE j.{owner} = ANY($1) ORDER BY j.position",
        owner = joins.owner_column,
        table = joins.people,
    );
    let rows: Vec<Linked<PersonRow>> = sqlx::query_as(&sql)
        .bind(owners)
        .fetch_all(&mut *conn)
        .await
        .map_err(db)?;
    Ok(group(rows)
        .into_iter()
        .map(|(owner, rows)| (owner, rows.into_iter().map(Person::from).collect()))
        .collect())
}

async fn linked_locations(
    conn: &mut PgConnection,
    joins: &JoinTables,
    owners: &[Uuid],
) -> StoreResult<HashMap<Uuid, Vec<Location>>> {
    let sql = format!(
        "SELECT j.{owner} AS owner_id, {LOCATION_COLUMNS} \
         FROM {table} j JOIN locations l ON l.id = j.location_id \
         LEFT JOIN addresses a ON a.id = l.address_id \
         WHERE j.{owner} = ANY($1) ORDER BY j.position",
        owner = joins.owner_column,
        table = joins.locations,
    );
    let rows: Vec<Linked<LocationRow>> = sqlx::query_as(&sql)
        .bind(owners)
        .fetch_all(&mut *conn)
        .await
        .map_err(db)?;
    Ok(group(rows)
        .into_iter()
        .map(|(owner, rows)| (owner, rows.into_iter().map(Location::from).collect()))
        .collect())
}

async fn linked_media(
    conn: &mut PgConnection,
    joins: &JoinTables,
    owners: &[Uuid],
) -> StoreResult<HashMap<Uuid, Vec<Media>>> {
    let sql = format!(
        "SELECT j.{owner} AS owner_id, m.id, m.kind, m.caption, m.url, m.public_id \
         FROM {table} j JOIN media m ON m.id = j.media_id \
         WHERE j.{owner} = ANY($1) ORDER BY j.position",
        owner = joins.owner_column,
        table = joins.media,
    );
    let rows: Vec<Linked<MediaRow>> = sqlx::query_as(&sql)
        .bind(owners)
        .fetch_all(&mut *conn)
        .await
        .map_err(db)?;
    group(rows)
        .into_iter()
        .map(|(owner, rows)| {
            let media = rows
                .into_iter()
                .map(MediaRow::into_media)
                .collect::<StoreResult<Vec<_>>>()?;
            Ok((owner, media))
        })
        .collect()
}

async fn locations_by_id(conn: &mut PgConnection, ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Location>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let sql = format!(
        "SELECT {LOCATION_COLUMNS} FROM locations l \
         LEFT JOIN addresses a ON a.id = l.address_id WHERE l.id = ANY($1)"
    );
    let rows: Vec<LocationRow> = sqlx::query_as(&sql)
        .bind(ids)
        .fetch_all(&mut *conn)
        .await
        .map_err(db)?;
    Ok(rows.into_iter().map(|r| (r.id, Location::from(r))).collect())
}

async fn assemble_facts(conn: &mut PgConnection, rows: Vec<FactRow>) -> StoreResult<Vec<Fact>> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut people = linked_people(conn, &FACT_JOINS, &ids).await?;
    let mut locations = linked_locations(conn, &FACT_JOINS, &ids).await?;
    let mut media = linked_media(conn, &FACT_JOINS, &ids).await?;
    Ok(rows
        .into_iter()
        .map(|row| Fact {
            people: people.remove(&row.id).unwrap_or_default(),
            locations: locations.remove(&row.id).unwrap_or_default(),
            media: media.remove(&row.id).unwrap_or_default(),
            id: row.id,
            text: row.text,
            sources: row.sources,
        })
        .collect())
}

async fn assemble_events(conn: &mut PgConnection, rows: Vec<EventRow>) -> StoreResult<Vec<Event>> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut people = linked_people(conn, &EVENT_JOINS, &ids).await?;
    let mut locations = linked_locations(conn, &EVENT_JOINS, &ids).await?;
    let mut media = linked_media(conn, &EVENT_JOINS, &ids).await?;
    Ok(rows
        .into_iter()
        .map(|row| Event {
            people: people.remove(&row.id).unwrap_or_default(),
            locations: locations.remove(&row.id).unwrap_or_default(),
            media: media.remove(&row.id).unwrap_or_default(),
            id: row.id,
            name: row.name,
            description: row.description,
            date: row.date,
        })
        .collect())
}

async fn assemble_organizations(
    conn: &mut PgConnection,
    rows: Vec<OrganizationRow>,
) -> StoreResult<Vec<Organization>> {
    let hq_ids: Vec<Uuid> = rows.iter().filter_map(|r| r.head_quarters_id).collect();
    let locations = locations_by_id(conn, &hq_ids).await?;
    Ok(rows
        .into_iter()
        .map(|row| Organization {
            head_quarters: row.head_quarters_id.and_then(|id| locations.get(&id).cloned()),
            id: row.id,
            name: row.name,
            description: row.description,
        })
        .collect())
}

fn single<T>(mut records: Vec<T>, entity: &'static str, id: Uuid) -> StoreResult<T> {
    records.pop().ok_or_else(|| StoreError::not_found(entity, id))
}

#[async_trait]
impl DataStore for PgStore {
    async fn people(&self) -> StoreResult<Vec<Person>> {
        timed("person.find_many", async {
            let rows: Vec<PersonRow> = sqlx::query_as(
                "SELECT id, first_name, last_name, alias FROM people ORDER BY created_at, id",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;
            Ok(rows.into_iter().map(Person::from).collect())
        })
        .await
    }

    async fn users(&self) -> StoreResult<Vec<User>> {
        timed("user.find_many", async {
            let rows: Vec<UserRow> =
                sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(db)?;
            rows.into_iter().map(UserRow::into_user).collect()
        })
        .await
    }

    async fn facts(&self) -> StoreResult<Vec<Fact>> {
        timed("fact.find_many", async {
            let mut conn = self.pool.acquire().await.map_err(db)?;
            let rows: Vec<FactRow> =
                sqlx::query_as("SELECT id, text, sources FROM facts ORDER BY created_at, id")
                    .fetch_all(&mut *conn)
                    .await
                    .map_err(db)?;
            assemble_facts(&mut conn, rows).await
        })
        .await
    }

    async fn events(&self) -> StoreResult<Vec<Event>> {
        timed("event.find_many", async {
            let mut conn = self.pool.acquire().await.map_err(db)?;
            let rows: Vec<EventRow> = sqlx::query_as(
                "SELECT id, name, description, date FROM events ORDER BY created_at, id",
            )
            .fetch_all(&mut *conn)
            .await
            .map_err(db)?;
            assemble_events(&mut conn, rows).await
        })
        .await
    }

    async fn organizations(&self) -> StoreResult<Vec<Organization>> {
        timed("organization.find_many", async {
            let mut conn = self.pool.acquire().await.map_err(db)?;
            let rows: Vec<OrganizationRow> = sqlx::query_as(
                "SELECT id, name, description, head_quarters_id FROM organizations \
                 ORDER BY created_at, id",
            )
            .fetch_all(&mut *conn)
            .await
            .map_err(db)?;
            assemble_organizations(&mut conn, rows).await
        })
        .await
    }

    async fn media(&self) -> StoreResult<Vec<Media>> {
        timed("media.find_many", async {
            let rows: Vec<MediaRow> = sqlx::query_as(
                "SELECT id, kind, caption, url, public_id FROM media ORDER BY created_at, id",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;
            rows.into_iter().map(MediaRow::into_media).collect()
        })
        .await
    }

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        timed("user.find_unique", async {
            let row: Option<UserRow> =
                sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(db)?;
            row.map(UserRow::into_user).transpose()
        })
        .await
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        timed("user.find_by_email", async {
            let row: Option<UserRow> = sqlx::query_as(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
            ))
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?;
            row.map(UserRow::into_user).transpose()
        })
        .await
    }

    async fn contributions_by(&self, user_id: Uuid) -> StoreResult<Vec<Contribution>> {
        timed("contribution.find_many", async {
            let rows: Vec<ContributionRow> = sqlx::query_as(
                "SELECT id, user_id, kind, entity_id, created_at FROM contributions \
                 WHERE user_id = $1 ORDER BY created_at, id",
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db)?;
            rows.into_iter().map(ContributionRow::into_contribution).collect()
        })
        .await
    }

    async fn create_user(&self, write: UserWrite) -> StoreResult<User> {
        write.validate()?;
        timed("user.create", async {
            let row: UserRow = sqlx::query_as(&format!(
                "INSERT INTO users (id, first_name, last_name, email, password_hash, \
                 profile_picture, bio, gender, role) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {USER_COLUMNS}"
            ))
            .bind(Uuid::new_v4())
            .bind(&write.first_name)
            .bind(&write.last_name)
            .bind(&write.email)
            .bind(&write.password_hash)
            .bind(&write.profile_picture)
            .bind(&write.bio)
            .bind(&write.gender)
            .bind(write.role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match db(e) {
                StoreError::Conflict(_) => {
                    StoreError::Conflict(format!("a user with email {} already exists", write.email))
                }
                other => other,
            })?;
            row.into_user()
        })
        .await
    }

    async fn create_person(&self, write: PersonWrite) -> StoreResult<Person> {
        write.validate()?;
        timed("person.create", async {
            let mut tx = self.pool.begin().await.map_err(db)?;
            ensure_contributor(&mut tx, write.contributor).await?;
            let id = insert_person(&mut tx, &write.person).await?;
            record_contribution(&mut tx, write.contributor, ContributionKind::Person, id).await?;
            tx.commit().await.map_err(db)?;
            Ok(Person {
                id,
                first_name: normalize(write.person.first_name),
                last_name: normalize(write.person.last_name),
                alias: normalize(write.person.alias),
            })
        })
        .await
    }

    async fn create_fact(&self, write: FactWrite) -> StoreResult<Fact> {
        write.validate()?;
        timed("fact.create", async {
            let mut tx = self.pool.begin().await.map_err(db)?;
            ensure_contributor(&mut tx, write.contributor).await?;
            check_connects(&mut tx, &write.people, &write.locations, &write.media).await?;

            let people = stage_people(&mut tx, &write.people).await?;
            let locations = stage_locations(&mut tx, &write.locations).await?;
            let media = stage_media(&mut tx, &write.media).await?;

            let id = Uuid::new_v4();
            sqlx::query("INSERT INTO facts (id, text, sources) VALUES ($1, $2, $3)")
                .bind(id)
                .bind(&write.text)
                .bind(&write.sources)
                .execute(&mut *tx)
                .await
                .map_err(db)?;
            link_all(&mut tx, &FACT_JOINS, id, &people, &locations, &media).await?;
            record_contribution(&mut tx, write.contributor, ContributionKind::Fact, id).await?;

            let row = FactRow {
                id,
                text: write.text,
                sources: write.sources,
            };
            let fact = single(assemble_facts(&mut tx, vec![row]).await?, "fact", id)?;
            tx.commit().await.map_err(db)?;
            Ok(fact)
        })
        .await
    }

    async fn create_event(&self, write: EventWrite) -> StoreResult<Event> {
        write.validate()?;
        timed("event.create", async {
            let mut tx = self.pool.begin().await.map_err(db)?;
            ensure_contributor(&mut tx, write.contributor).await?;
            check_connects(&mut tx, &write.people, &write.locations, &write.media).await?;

            let people = stage_people(&mut tx, &write.people).await?;
            let locations = stage_locations(&mut tx, &write.locations).await?;
            let media = stage_media(&mut tx, &write.media).await?;

            let id = Uuid::new_v4();
            sqlx::query("INSERT INTO events (id, name, description, date) VALUES ($1, $2, $3, $4)")
                .bind(id)
                .bind(&write.name)
                .bind(&write.description)
                .bind(write.date)
                .execute(&mut *tx)
                .await
                .map_err(db)?;
            link_all(&mut tx, &EVENT_JOINS, id, &people, &locations, &media).await?;
            record_contribution(&mut tx, write.contributor, ContributionKind::Event, id).await?;

            let row = EventRow {
                id,
                name: write.name,
                description: write.description,
                date: write.date,
            };
            let event = single(assemble_events(&mut tx, vec![row]).await?, "event", id)?;
            tx.commit().await.map_err(db)?;
            Ok(event)
        })
        .await
    }

    async fn create_organization(&self, write: OrganizationWrite) -> StoreResult<Organization> {
        write.validate()?;
        timed("organization.create", async {
            let mut tx = self.pool.begin().await.map_err(db)?;
            ensure_contributor(&mut tx, write.contributor).await?;

            let head_quarters_id = match &write.head_quarters {
                Some(Link::Connect(id)) => {
                    ensure_exist(&mut tx, "locations", "location", &[*id]).await?;
                    Some(*id)
                }
                Some(Link::Create(location)) => Some(insert_location(&mut tx, location).await?),
                None => None,
            };

            let id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO organizations (id, name, description, head_quarters_id) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(id)
            .bind(&write.name)
            .bind(&write.description)
            .bind(head_quarters_id)
            .execute(&mut *tx)
            .await
            .map_err(db)?;
            record_contribution(&mut tx, write.contributor, ContributionKind::Organization, id)
                .await?;

            let row = OrganizationRow {
                id,
                name: write.name,
                description: write.description,
                head_quarters_id,
            };
            let organization = single(
                assemble_organizations(&mut tx, vec![row]).await?,
                "organization",
                id,
            )?;
            tx.commit().await.map_err(db)?;
            Ok(organization)
        })
        .await
    }

    async fn create_media(&self, write: MediaWrite) -> StoreResult<Media> {
        write.validate()?;
        timed("media.create", async {
            let mut tx = self.pool.begin().await.map_err(db)?;
            ensure_contributor(&mut tx, write.contributor).await?;
            let id = insert_media(&mut tx, &write.media).await?;
            record_contribution(&mut tx, write.contributor, ContributionKind::Media, id).await?;
            tx.commit().await.map_err(db)?;
            Ok(Media {
                id,
                kind: write.media.kind,
                caption: normalize(write.media.caption),
                url: write.media.url,
                public_id: write.media.public_id,
            })
        })
        .await
    }
}
