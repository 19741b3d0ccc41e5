//! Comment moderation: submit, approve, delete.

use uuid::Uuid;

use inkwell_core::DomainError;
use inkwell_core::domain::{Comment, Post};
use inkwell_core::policy::{Action, Actor};
use inkwell_shared::dto::CommentForm;

use crate::services::posts;
use crate::state::AppState;

/// Display name used when the form leaves it out.
fn default_author(actor: &Actor) -> String {
    actor
        .email
        .split_once('@')
        .map_or(actor.email.as_str(), |(local, _)| local)
        .to_string()
}

async fn load(state: &AppState, id: Uuid) -> Result<(Comment, Post), DomainError> {
    let comment = state
        .comments
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("comment", id))?;
    let post = posts::load(state, comment.post_id).await?;
    Ok((comment, post))
}

/// New comments start out pending.
#[tracing::instrument(skip(state))]
pub async fn create(
    state: &AppState,
    actor: Option<&Actor>,
    post_id: Uuid,
    form: &CommentForm,
) -> Result<Comment, DomainError> {
    let post = posts::load_visible(state, post_id, actor).await?;
    state.policy.authorize(actor, &Action::CreateComment(&post))?;
    let actor = actor.ok_or(DomainError::Unauthenticated)?;

    let author = form
        .author
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map_or_else(|| default_author(actor), str::to_string);

    let comment = state
        .comments
        .save(Comment::new(post.id, author, form.body.trim().to_string()))
        .await?;
    tracing::info!(comment_id = %comment.id, post_id = %post.id, "Comment submitted");
    Ok(comment)
}

/// Pending -> Approved. Approving twice changes nothing.
#[tracing::instrument(skip(state))]
pub async fn approve(state: &AppState, actor: Option<&Actor>, id: Uuid) -> Result<Comment, DomainError> {
    let (mut comment, post) = load(state, id).await?;
    state.policy.authorize(
        actor,
        &Action::ModerateComment {
            comment: &comment,
            post: &post,
        },
    )?;

    if !comment.approve() {
        return Ok(comment);
    }
    let comment = state.comments.save(comment).await?;
    tracing::info!(comment_id = %comment.id, "Comment approved");
    Ok(comment)
}

/// Remove a comment for good. Returns the post it belonged to.
#[tracing::instrument(skip(state))]
pub async fn delete(state: &AppState, actor: Option<&Actor>, id: Uuid) -> Result<Uuid, DomainError> {
    let (comment, post) = load(state, id).await?;
    state.policy.authorize(
        actor,
        &Action::ModerateComment {
            comment: &comment,
            post: &post,
        },
    )?;

    state.comments.delete(comment.id).await?;
    tracing::info!(comment_id = %comment.id, "Comment deleted");
    Ok(post.id)
}
