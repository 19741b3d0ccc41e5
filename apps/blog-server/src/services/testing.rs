use chrono::{DateTime, Utc};
use uuid::Uuid;

use inkwell_core::domain::{Category, Post};
use inkwell_core::policy::Actor;

use crate::config::BlogSettings;
use crate::state::AppState;

pub(crate) fn state() -> AppState {
    AppState::in_memory(BlogSettings::default())
}

pub(crate) fn actor() -> Actor {
    let user_id = Uuid::new_v4();
    Actor {
        user_id,
        email: format!("{}@example.com", user_id.simple()),
        roles: vec!["user".to_string()],
    }
}

pub(crate) async fn save_post(
    state: &AppState,
    author_id: Uuid,
    slug: &str,
    published_at: Option<DateTime<Utc>>,
) -> Post {
    let mut post = Post::new(
        author_id,
        slug.to_string(),
        slug.replace('-', " "),
        format!("Body of {slug}"),
    );
    post.published_at = published_at;
    state.posts.save(post).await.unwrap()
}

pub(crate) async fn save_category(
    state: &AppState,
    name: &str,
    slug: &str,
    parent: Option<&Category>,
) -> Category {
    let category = Category::new(name, slug, parent.map(|p| p.id));
    state.categories.save(category).await.unwrap()
}
