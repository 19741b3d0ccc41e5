//! Paginated post listings.

use chrono::Utc;

use inkwell_core::DomainError;
use inkwell_core::domain::{Page, PageRequest, Post, PostFilter};
use inkwell_core::policy::{Action, Actor};

use crate::state::AppState;

/// The home page: published posts plus the featured and trending sidebars.
#[derive(Debug)]
pub struct HomePage {
    pub posts: Page<Post>,
    pub featured: Vec<Post>,
    pub trending: Vec<Post>,
}

/// First few posts of a listing.
pub(crate) async fn sidebar(state: &AppState, filter: PostFilter) -> Result<Vec<Post>, DomainError> {
    let page = PageRequest::first(state.settings.sidebar_size);
    Ok(state.posts.list(&filter, &page).await?.items)
}

#[tracing::instrument(skip(state))]
pub async fn home(state: &AppState, page: PageRequest) -> Result<HomePage, DomainError> {
    let as_of = Utc::now();
    let posts = state.posts.list(&PostFilter::Published { as_of }, &page).await?;

    Ok(HomePage {
        posts,
        featured: sidebar(state, PostFilter::Featured { as_of }).await?,
        trending: sidebar(state, PostFilter::Trending { as_of }).await?,
    })
}

#[tracing::instrument(skip(state))]
pub async fn featured(state: &AppState, page: PageRequest) -> Result<Page<Post>, DomainError> {
    let filter = PostFilter::Featured { as_of: Utc::now() };
    Ok(state.posts.list(&filter, &page).await?)
}

#[tracing::instrument(skip(state))]
pub async fn trending(state: &AppState, page: PageRequest) -> Result<Page<Post>, DomainError> {
    let filter = PostFilter::Trending { as_of: Utc::now() };
    Ok(state.posts.list(&filter, &page).await?)
}

/// The actor's own unpublished posts.
#[tracing::instrument(skip(state))]
pub async fn drafts(
    state: &AppState,
    actor: Option<&Actor>,
    page: PageRequest,
) -> Result<Page<Post>, DomainError> {
    state.policy.authorize(actor, &Action::ViewDrafts)?;
    let author_id = actor.map(|a| a.user_id).ok_or(DomainError::Unauthenticated)?;

    Ok(state
        .posts
        .list(&PostFilter::Drafts { author_id }, &page)
        .await?)
}
