use async_graphql::{Context, Object, Result, ResultExt};
use store::{Contribution, Event, Fact, Media, Organization, Person, User};

use super::{request_context, stored};

#[derive(Debug, Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn people(&self, ctx: &Context<'_>) -> Result<Vec<Person>> {
        stored(request_context(ctx)?.store.people().await)
    }

    /// Admin only.
    async fn users(&self, ctx: &Context<'_>) -> Result<Vec<User>> {
        let context = request_context(ctx)?;
        context.require_admin().extend()?;
        stored(context.store.users().await)
    }

    async fn facts(&self, ctx: &Context<'_>) -> Result<Vec<Fact>> {
        stored(request_context(ctx)?.store.facts().await)
    }

    async fn events(&self, ctx: &Context<'_>) -> Result<Vec<Event>> {
        stored(request_context(ctx)?.store.events().await)
    }

    async fn organizations(&self, ctx: &Context<'_>) -> Result<Vec<Organization>> {
        stored(request_context(ctx)?.store.organizations().await)
    }

    async fn media(&self, ctx: &Context<'_>) -> Result<Vec<Media>> {
        stored(request_context(ctx)?.store.media().await)
    }

    /// The signed-in user, or null.
    async fn me(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let context = request_context(ctx)?;
        match context.user {
            Some(user) => stored(context.store.user_by_id(user.id).await),
            None => Ok(None),
        }
    }

    async fn my_contributions(&self, ctx: &Context<'_>) -> Result<Vec<Contribution>> {
        let context = request_context(ctx)?;
        let user = context.require_user().extend()?;
        stored(context.store.contributions_by(user.id).await)
    }
}
