//! # GraphQL schema
//!
//! [`build_schema`] assembles the query and mutation roots with the
//! process-wide services (session cookies, media uploader) as schema data.
//! Per-request state travels as a [`RequestContext`] attached to each
//! [`Request`]; [`execute`] builds that context from the request headers,
//! runs the request and hands back the [`ResponseHandle`] so the HTTP layer
//! can copy any cookies set by resolvers onto the response.

mod inputs;
mod mutation;
mod query;

#[cfg(test)]
pub(crate) mod testing;

use async_graphql::{Context, EmptySubscription, Request, Response, ResultExt, Schema};
use axum::http::HeaderMap;
use store::StoreResult;

use crate::auth::SessionCookies;
use crate::context::{ContextBuilder, RequestContext, ResponseHandle};
use crate::error::ApiError;
use crate::media::MediaUploader;

pub use inputs::{
    AddressInput, EventInput, FactInput, HeadQuartersInput, LocationInput, LocationsRelationInput,
    MediaInput, MediaRelationInput, OrganizationInput, PeopleRelationInput, PersonInput, UserInput,
};
pub use mutation::MutationRoot;
pub use query::QueryRoot;

pub type ApiSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(sessions: SessionCookies, uploader: MediaUploader) -> ApiSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(sessions)
        .data(uploader)
        .finish()
}

/// Runs `request` with a context built from `headers`.
pub async fn execute(
    schema: &ApiSchema,
    contexts: &ContextBuilder,
    headers: &HeaderMap,
    request: Request,
) -> (Response, ResponseHandle) {
    let context = contexts.build(headers).await;
    let response_handle = context.response.clone();
    let response = schema.execute(request.data(context)).await;
    (response, response_handle)
}

pub(crate) fn request_context<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a RequestContext> {
    ctx.data::<RequestContext>()
}

/// Store errors reach clients through [`ApiError`] so they carry a code.
pub(crate) fn stored<T>(result: StoreResult<T>) -> async_graphql::Result<T> {
    result.map_err(ApiError::from).extend()
}
