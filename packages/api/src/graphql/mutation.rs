//! Mutation resolvers.
//!
//! Resolvers stay thin: they pull the request context and services out of
//! the GraphQL context and delegate to a helper returning [`ApiResult`],
//! converting its error with `extend()` so clients get `extensions.code`.
//!
//! Creating a fact, event or media record requires a signed-in user, who is
//! recorded as the contributor. Inline media files are uploaded only after
//! the rest of the payload, including every media entry, validated. The store
//! write follows the uploads as one atomic call.

use async_graphql::{Context, Object, Result, ResultExt, Upload};
use store::write::{
    EventWrite, FactWrite, Link, MediaWrite, NewLocation, NewMedia, NewPerson, OrganizationWrite,
    Relation, Validate,
};
use store::{Event, Fact, Media, Organization, Person, Role, StoreError, User};

use super::inputs::{
    parse_id, parse_ids, EventInput, FactInput, HeadQuartersInput, LocationsRelationInput,
    MediaInput, MediaRelationInput, OrganizationInput, PeopleRelationInput, PersonInput, UserInput,
};
use super::{request_context, stored};
use crate::auth::{hash_password, verify_password, SessionCookies};
use crate::context::RequestContext;
use crate::error::{ApiError, ApiResult};
use crate::media::{MediaUploader, UploadDescriptor};

#[derive(Debug, Default)]
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Registers an account. Anonymous callers are signed in as the new user.
    async fn create_user(&self, ctx: &Context<'_>, user: UserInput) -> Result<User> {
        let sessions = ctx.data::<SessionCookies>()?;
        register(request_context(ctx)?, sessions, user).await.extend()
    }

    async fn sign_in(&self, ctx: &Context<'_>, email: String, #[graphql(secret)] password: String) -> Result<User> {
        let sessions = ctx.data::<SessionCookies>()?;
        login_password(request_context(ctx)?, sessions, &email, &password)
            .await
            .extend()
    }

    async fn sign_out(&self, ctx: &Context<'_>) -> Result<bool> {
        let sessions = ctx.data::<SessionCookies>()?;
        request_context(ctx)?.response.set_cookie(sessions.removal());
        Ok(true)
    }

    async fn create_person(&self, ctx: &Context<'_>, person: PersonInput) -> Result<Person> {
        let context = request_context(ctx)?;
        let user = context.require_user().extend()?;
        stored(context.store.create_person(person.into_write(user.id)).await)
    }

    async fn create_fact(&self, ctx: &Context<'_>, fact: FactInput) -> Result<Fact> {
        let uploader = ctx.data::<MediaUploader>()?;
        add_fact(ctx, request_context(ctx)?, uploader, fact).await.extend()
    }

    async fn create_event(&self, ctx: &Context<'_>, event: EventInput) -> Result<Event> {
        let uploader = ctx.data::<MediaUploader>()?;
        add_event(ctx, request_context(ctx)?, uploader, event).await.extend()
    }

    async fn create_organization(
        &self,
        ctx: &Context<'_>,
        organization: OrganizationInput,
    ) -> Result<Organization> {
        add_organization(request_context(ctx)?, organization).await.extend()
    }

    async fn create_media(&self, ctx: &Context<'_>, media: MediaInput) -> Result<Media> {
        let uploader = ctx.data::<MediaUploader>()?;
        add_media(ctx, request_context(ctx)?, uploader, media).await.extend()
    }
}

async fn register(
    context: &RequestContext,
    sessions: &SessionCookies,
    input: UserInput,
) -> ApiResult<User> {
    let caller = context.user;
    if input.role == Some(Role::Admin) && !caller.is_some_and(|u| u.is_admin()) {
        return Err(ApiError::Forbidden);
    }
    if context.store.user_by_email(&input.email).await?.is_some() {
        return Err(ApiError::DuplicateUser);
    }

    let password_hash = hash_password(&input.password)?;
    let write = input.into_write(password_hash);
    write.validate()?;

    let user = context.store.create_user(write).await.map_err(|e| match e {
        StoreError::Conflict(_) => ApiError::DuplicateUser,
        other => ApiError::Store(other),
    })?;
    tracing::info!(user_id = %user.id, "user registered");

    if caller.is_none() {
        context.response.set_cookie(sessions.issue(user.id)?);
    }
    Ok(user)
}

async fn login_password(
    context: &RequestContext,
    sessions: &SessionCookies,
    email: &str,
    password: &str,
) -> ApiResult<User> {
    let Some(user) = context.store.user_by_email(email).await? else {
        tracing::debug!("sign-in for unknown email");
        return Err(ApiError::AuthenticationFailed);
    };
    if !verify_password(password, &user.password_hash) {
        tracing::debug!(user_id = %user.id, "sign-in with wrong password");
        return Err(ApiError::AuthenticationFailed);
    }

    context.response.set_cookie(sessions.issue(user.id)?);
    tracing::info!(user_id = %user.id, "user signed in");
    Ok(user)
}

async fn add_fact(
    ctx: &Context<'_>,
    context: &RequestContext,
    uploader: &MediaUploader,
    input: FactInput,
) -> ApiResult<Fact> {
    let user = context.require_user()?;
    let write = FactWrite::new(input.text)
        .sources(input.sources.unwrap_or_default())
        .people(people_relation(input.people)?)
        .locations(locations_relation(input.locations)?)
        .contributed_by(Some(user.id));
    write.validate()?;

    let media = media_relation(ctx, uploader, input.media, "fact").await?;
    Ok(context.store.create_fact(write.media(media)).await?)
}

async fn add_event(
    ctx: &Context<'_>,
    context: &RequestContext,
    uploader: &MediaUploader,
    input: EventInput,
) -> ApiResult<Event> {
    let user = context.require_user()?;
    let write = EventWrite::new(input.name)
        .described(input.description)
        .on(input.date)
        .people(people_relation(input.people)?)
        .locations(locations_relation(input.locations)?)
        .contributed_by(Some(user.id));
    write.validate()?;

    let media = media_relation(ctx, uploader, input.media, "event").await?;
    Ok(context.store.create_event(write.media(media)).await?)
}

async fn add_organization(context: &RequestContext, input: OrganizationInput) -> ApiResult<Organization> {
    let user = context.require_user()?;
    let mut write = OrganizationWrite::new(input.name)
        .described(input.description)
        .contributed_by(Some(user.id));
    match input.head_quarters {
        Some(HeadQuartersInput::Connect(id)) => {
            write = write.head_quarters(Link::Connect(parse_id(&id)?));
        }
        Some(HeadQuartersInput::Create(location)) => {
            write = write.head_quarters(Link::Create(location.into()));
        }
        None => {}
    }
    Ok(context.store.create_organization(write).await?)
}

async fn add_media(
    ctx: &Context<'_>,
    context: &RequestContext,
    uploader: &MediaUploader,
    input: MediaInput,
) -> ApiResult<Media> {
    let user = context.require_user()?;
    let media = new_media(ctx, uploader, input, "media").await?;
    let write = MediaWrite::new(media).contributed_by(Some(user.id));
    Ok(context.store.create_media(write).await?)
}

fn people_relation(input: Option<PeopleRelationInput>) -> ApiResult<Relation<NewPerson>> {
    Ok(input
        .map(PeopleRelationInput::into_relation)
        .transpose()?
        .unwrap_or_default())
}

fn locations_relation(
    input: Option<LocationsRelationInput>,
) -> ApiResult<Relation<NewLocation>> {
    Ok(input
        .map(LocationsRelationInput::into_relation)
        .transpose()?
        .unwrap_or_default())
}

/// A media input that passed validation but may still need its file uploaded.
enum PendingMedia {
    Inline { file: Upload, caption: Option<String> },
    Hosted(NewMedia),
}

impl PendingMedia {
    /// Rejects an input carrying both or neither of a file and a hosted url.
    fn check(input: MediaInput) -> ApiResult<Self> {
        match (input.file, input.url, input.public_id) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(ApiError::validation(
                "Media takes either a file or a url and publicId, not both",
            )),
            (Some(file), None, None) => Ok(Self::Inline {
                file,
                caption: input.caption,
            }),
            (None, Some(url), Some(public_id)) => {
                let media = NewMedia::hosted(input.kind.unwrap_or_default(), url, public_id)
                    .with_caption(input.caption);
                media.validate()?;
                Ok(Self::Hosted(media))
            }
            _ => Err(ApiError::validation(
                "Media needs either a file or a url and publicId",
            )),
        }
    }

    async fn resolve(self, ctx: &Context<'_>, uploader: &MediaUploader, tag: &str) -> ApiResult<NewMedia> {
        match self {
            Self::Inline { file, caption } => {
                let descriptor = upload_descriptor(ctx, &file)?;
                let (kind, stored) = uploader.process(descriptor, &[tag]).await?;
                Ok(NewMedia::hosted(kind, stored.secure_url, stored.public_id).with_caption(caption))
            }
            Self::Hosted(media) => Ok(media),
        }
    }
}

/// Checks every entry, then uploads inline files in input order.
async fn media_relation(
    ctx: &Context<'_>,
    uploader: &MediaUploader,
    input: Option<MediaRelationInput>,
    tag: &str,
) -> ApiResult<Relation<NewMedia>> {
    let Some(input) = input else {
        return Ok(Relation::new());
    };
    let mut relation = Relation::new().connect_all(parse_ids(input.connect)?);
    let pending = input
        .create
        .unwrap_or_default()
        .into_iter()
        .map(PendingMedia::check)
        .collect::<ApiResult<Vec<_>>>()?;
    for media in pending {
        relation = relation.create(media.resolve(ctx, uploader, tag).await?);
    }
    Ok(relation)
}

async fn new_media(
    ctx: &Context<'_>,
    uploader: &MediaUploader,
    input: MediaInput,
    tag: &str,
) -> ApiResult<NewMedia> {
    PendingMedia::check(input)?.resolve(ctx, uploader, tag).await
}

fn upload_descriptor(ctx: &Context<'_>, upload: &Upload) -> ApiResult<UploadDescriptor> {
    let value = upload
        .value(ctx)
        .map_err(|e| ApiError::UploadFailed(e.to_string()))?;
    let len = value.size().ok();
    let mime_type = value.content_type.clone().unwrap_or_default();
    let content = tokio::fs::File::from_std(value.content);
    let descriptor = UploadDescriptor::new(value.filename, mime_type, content);
    Ok(match len {
        Some(len) => descriptor.with_len(len),
        None => descriptor,
    })
}
