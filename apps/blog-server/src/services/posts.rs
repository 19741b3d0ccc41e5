//! Post lifecycle: create, edit, delete, publish and the detail view.

use chrono::Utc;
use uuid::Uuid;

use inkwell_core::DomainError;
use inkwell_core::domain::{
    Category, CategoryTree, Comment, Post, PostFilter, SearchDocument, slugify_title,
};
use inkwell_core::policy::{Action, Actor};
use inkwell_shared::dto::PostForm;

use crate::services::listing::sidebar;
use crate::state::AppState;

/// Give up looking for a free `-N` suffix after this many tries.
const MAX_SLUG_ATTEMPTS: u32 = 1000;

#[derive(Debug)]
pub struct PostDetail {
    pub post: Post,
    pub comments: Vec<Comment>,
    pub recent: Vec<Post>,
    pub featured: Vec<Post>,
}

/// Categories to choose from, with their paths, and the post being edited.
#[derive(Debug)]
pub struct FormContext {
    pub categories: Vec<(Category, String)>,
    pub post: Option<Post>,
}

/// Result of a publish attempt. A failure leaves the stored post untouched.
#[derive(Debug)]
pub enum PublishOutcome {
    Published(Post),
    Rejected(Post),
}

pub(crate) async fn load(state: &AppState, id: Uuid) -> Result<Post, DomainError> {
    state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("post", id))
}

/// Load a post the actor may look at. Hidden posts are reported as missing.
pub(crate) async fn load_visible(
    state: &AppState,
    id: Uuid,
    actor: Option<&Actor>,
) -> Result<Post, DomainError> {
    let post = load(state, id).await?;
    if post.visible_to(actor.map(|a| a.user_id), Utc::now()) {
        Ok(post)
    } else {
        Err(DomainError::not_found("post", id))
    }
}

/// Mirror the post's current state into the search index.
///
/// The store stays authoritative: index failures are logged, not returned.
pub(crate) async fn sync_index(state: &AppState, post: &Post) {
    let result = if post.is_published_at(Utc::now()) {
        state.search.index(SearchDocument::from(post)).await
    } else {
        state.search.remove(post.id).await
    };

    if let Err(e) = result {
        tracing::error!(post_id = %post.id, error = %e, "Failed to update search index");
    }
}

async fn unique_slug(state: &AppState, base: &str, except: Option<Uuid>) -> Result<String, DomainError> {
    for n in 1..=MAX_SLUG_ATTEMPTS {
        let candidate = if n == 1 {
            base.to_string()
        } else {
            format!("{base}-{n}")
        };
        match state.posts.find_by_slug(&candidate).await? {
            Some(existing) if Some(existing.id) != except => continue,
            _ => return Ok(candidate),
        }
    }
    Err(DomainError::Internal(format!("no free slug for {base}")))
}

/// An explicit slug must be free. A generated one gets a numeric suffix.
async fn choose_slug(
    state: &AppState,
    requested: Option<&str>,
    title: &str,
    except: Option<Uuid>,
) -> Result<String, DomainError> {
    match requested {
        Some(slug) => match state.posts.find_by_slug(slug).await? {
            Some(existing) if Some(existing.id) != except => Err(DomainError::Duplicate(format!(
                "slug '{slug}' is already in use"
            ))),
            _ => Ok(slug.to_string()),
        },
        None => unique_slug(state, &slugify_title(title), except).await,
    }
}

async fn check_category(state: &AppState, category_id: Option<Uuid>) -> Result<(), DomainError> {
    if let Some(id) = category_id
        && state.categories.find_by_id(id).await?.is_none()
    {
        return Err(DomainError::Validation(format!("category {id} does not exist")));
    }
    Ok(())
}

#[tracing::instrument(skip(state))]
pub async fn detail(state: &AppState, id: Uuid, actor: Option<&Actor>) -> Result<PostDetail, DomainError> {
    let post = load_visible(state, id, actor).await?;
    detail_of(state, post, actor).await
}

/// Detail view around a post the caller already holds. No visibility check.
pub async fn detail_of(
    state: &AppState,
    post: Post,
    actor: Option<&Actor>,
) -> Result<PostDetail, DomainError> {
    let comments = state.comments.for_post(post.id, actor.is_some()).await?;
    let as_of = Utc::now();

    Ok(PostDetail {
        post,
        comments,
        recent: sidebar(state, PostFilter::Published { as_of }).await?,
        featured: sidebar(state, PostFilter::Featured { as_of }).await?,
    })
}

/// Context for the create form (`id = None`) or the edit form.
#[tracing::instrument(skip(state))]
pub async fn form_context(
    state: &AppState,
    actor: Option<&Actor>,
    id: Option<Uuid>,
) -> Result<FormContext, DomainError> {
    let post = match id {
        Some(id) => {
            let post = load(state, id).await?;
            state.policy.authorize(actor, &Action::EditPost(&post))?;
            Some(post)
        }
        None => {
            state.policy.authorize(actor, &Action::CreatePost)?;
            None
        }
    };

    let all = state.categories.all().await?;
    let tree = CategoryTree::new(all.clone());
    let mut categories: Vec<(Category, String)> = all
        .into_iter()
        .map(|category| {
            let path = tree.path_of(category.id);
            (category, path)
        })
        .collect();
    categories.sort_by(|a, b| a.1.cmp(&b.1));

    Ok(FormContext { categories, post })
}

#[tracing::instrument(skip(state))]
pub async fn create(state: &AppState, actor: Option<&Actor>, form: &PostForm) -> Result<Post, DomainError> {
    state.policy.authorize(actor, &Action::CreatePost)?;
    let author = actor.ok_or(DomainError::Unauthenticated)?;
    check_category(state, form.category_id).await?;

    let slug = choose_slug(state, form.slug.as_deref(), &form.title, None).await?;
    let mut post = Post::new(
        author.user_id,
        slug,
        form.title.trim().to_string(),
        form.body.clone(),
    );
    post.category_id = form.category_id;
    post.featured = form.featured;
    post.trending = form.trending;

    let post = state.posts.save(post).await?;
    tracing::info!(post_id = %post.id, slug = %post.slug, "Draft created");
    Ok(post)
}

/// Edit a post. The slug only changes when a new one is supplied.
#[tracing::instrument(skip(state))]
pub async fn update(
    state: &AppState,
    actor: Option<&Actor>,
    id: Uuid,
    form: &PostForm,
) -> Result<Post, DomainError> {
    let mut post = load(state, id).await?;
    state.policy.authorize(actor, &Action::EditPost(&post))?;
    check_category(state, form.category_id).await?;

    if let Some(slug) = form.slug.as_deref()
        && slug != post.slug
    {
        post.slug = choose_slug(state, Some(slug), &form.title, Some(post.id)).await?;
    }
    post.title = form.title.trim().to_string();
    post.body = form.body.clone();
    post.category_id = form.category_id;
    post.featured = form.featured;
    post.trending = form.trending;
    post.updated_at = Utc::now();

    let post = state.posts.save(post).await?;
    sync_index(state, &post).await;
    Ok(post)
}

#[tracing::instrument(skip(state))]
pub async fn delete(state: &AppState, actor: Option<&Actor>, id: Uuid) -> Result<(), DomainError> {
    let post = load(state, id).await?;
    state.policy.authorize(actor, &Action::DeletePost(&post))?;

    for comment in state.comments.for_post(post.id, true).await? {
        state.comments.delete(comment.id).await?;
    }
    state.posts.delete(post.id).await?;

    if let Err(e) = state.search.remove(post.id).await {
        tracing::error!(post_id = %post.id, error = %e, "Failed to remove post from search index");
    }
    tracing::info!(post_id = %post.id, "Post deleted");
    Ok(())
}

/// Draft -> Published.
///
/// Authorization and lookup errors are returned as errors; a post that cannot
/// be published, or a failed save, yields [`PublishOutcome::Rejected`].
#[tracing::instrument(skip(state))]
pub async fn publish(
    state: &AppState,
    actor: Option<&Actor>,
    id: Uuid,
) -> Result<PublishOutcome, DomainError> {
    let post = load(state, id).await?;
    state.policy.authorize(actor, &Action::PublishPost(&post))?;

    let mut published = post.clone();
    if let Err(e) = published.publish(Utc::now()) {
        tracing::warn!(post_id = %post.id, error = %e, "Publish rejected");
        return Ok(PublishOutcome::Rejected(post));
    }

    match state.posts.save(published).await {
        Ok(saved) => {
            sync_index(state, &saved).await;
            tracing::info!(post_id = %saved.id, "Post published");
            Ok(PublishOutcome::Published(saved))
        }
        Err(e) => {
            tracing::error!(post_id = %post.id, error = %e, "Failed to save published post");
            Ok(PublishOutcome::Rejected(post))
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::services::testing::{actor, save_category, save_post, state};
    use inkwell_core::domain::{PageRequest, SearchQuery};
    use inkwell_core::policy::ADMIN_ROLE;

    fn form(title: &str) -> PostForm {
        PostForm {
            title: title.to_string(),
            body: "Some body".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_generates_unique_slugs() {
        let state = state();
        let author = actor();

        let first = create(&state, Some(&author), &form("Hello World")).await.unwrap();
        let second = create(&state, Some(&author), &form("Hello, World!")).await.unwrap();
        let third = create(&state, Some(&author), &form("hello world")).await.unwrap();

        assert_eq!(first.slug, "hello-world");
        assert_eq!(second.slug, "hello-world-2");
        assert_eq!(third.slug, "hello-world-3");
        assert!(first.is_draft());
        assert_eq!(first.author_id, author.user_id);
    }

    #[tokio::test]
    async fn create_rejects_taken_explicit_slug_and_unknown_category() {
        let state = state();
        let author = actor();
        save_post(&state, author.user_id, "taken", None).await;

        let mut taken = form("Anything");
        taken.slug = Some("taken".to_string());
        assert!(matches!(
            create(&state, Some(&author), &taken).await,
            Err(DomainError::Duplicate(_))
        ));

        let mut orphan = form("Anything");
        orphan.category_id = Some(Uuid::new_v4());
        assert!(matches!(
            create(&state, Some(&author), &orphan).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn anonymous_cannot_create() {
        let state = state();
        assert!(matches!(
            create(&state, None, &form("Hi")).await,
            Err(DomainError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn only_owner_or_admin_may_edit() {
        let state = state();
        let author = actor();
        let post = save_post(&state, author.user_id, "mine", None).await;

        let stranger = actor();
        assert!(matches!(
            update(&state, Some(&stranger), post.id, &form("Stolen")).await,
            Err(DomainError::Forbidden)
        ));

        let mut admin = actor();
        admin.roles.push(ADMIN_ROLE.to_string());
        let edited = update(&state, Some(&admin), post.id, &form("Fixed")).await.unwrap();
        assert_eq!(edited.title, "Fixed");
        assert_eq!(edited.slug, "mine");
    }

    #[tokio::test]
    async fn publish_twice_is_rejected_without_changes() {
        let state = state();
        let author = actor();
        let post = save_post(&state, author.user_id, "launch", None).await;

        let published = match publish(&state, Some(&author), post.id).await.unwrap() {
            PublishOutcome::Published(post) => post,
            other => panic!("expected publish, got {other:?}"),
        };
        assert!(published.published_at.is_some());

        match publish(&state, Some(&author), post.id).await.unwrap() {
            PublishOutcome::Rejected(post) => assert_eq!(post, published),
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(load(&state, post.id).await.unwrap(), published);
    }

    #[tokio::test]
    async fn publishing_indexes_and_deleting_unindexes() {
        let state = state();
        let author = actor();
        let post = save_post(&state, author.user_id, "searchable-thing", None).await;
        let query = SearchQuery {
            text: "searchable".to_string(),
            selected: Vec::new(),
        };

        publish(&state, Some(&author), post.id).await.unwrap();
        let hits = state
            .search
            .faceted_search(&query, &PageRequest::first(3))
            .await
            .unwrap();
        assert_eq!(hits.page.total, 1);

        delete(&state, Some(&author), post.id).await.unwrap();
        let hits = state
            .search
            .faceted_search(&query, &PageRequest::first(3))
            .await
            .unwrap();
        assert_eq!(hits.page.total, 0);
        assert!(load(&state, post.id).await.is_err());
    }

    #[tokio::test]
    async fn drafts_are_hidden_from_other_viewers() {
        let state = state();
        let author = actor();
        let draft = save_post(&state, author.user_id, "secret", None).await;

        assert!(matches!(
            detail(&state, draft.id, None).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(detail(&state, draft.id, Some(&actor())).await.is_err());
        assert!(detail(&state, draft.id, Some(&author)).await.is_ok());
    }

    #[tokio::test]
    async fn detail_shows_pending_comments_to_signed_in_viewers() {
        let state = state();
        let author = actor();
        let post = save_post(
            &state,
            author.user_id,
            "open",
            Some(Utc::now() - Duration::hours(1)),
        )
        .await;
        let mut approved = Comment::new(post.id, "ann".into(), "Great".into());
        approved.approve();
        state.comments.save(approved).await.unwrap();
        state
            .comments
            .save(Comment::new(post.id, "bob".into(), "Hmm".into()))
            .await
            .unwrap();

        assert_eq!(detail(&state, post.id, None).await.unwrap().comments.len(), 1);
        let signed_in = detail(&state, post.id, Some(&actor())).await.unwrap();
        assert_eq!(signed_in.comments.len(), 2);
        assert_eq!(signed_in.recent.len(), 1);
    }

    #[tokio::test]
    async fn form_context_lists_category_paths() {
        let state = state();
        let tech = save_category(&state, "Tech", "tech", None).await;
        save_category(&state, "Python", "python", Some(&tech)).await;

        let context = form_context(&state, Some(&actor()), None).await.unwrap();
        let paths: Vec<&str> = context.categories.iter().map(|(_, p)| p.as_str()).collect();
        assert_eq!(paths, vec!["tech", "tech/python"]);
        assert!(context.post.is_none());

        assert!(matches!(
            form_context(&state, None, None).await,
            Err(DomainError::Unauthenticated)
        ));
    }
}
