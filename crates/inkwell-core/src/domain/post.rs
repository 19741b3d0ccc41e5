use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Post entity - a blog post, draft until it carries a publish date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub category_id: Option<Uuid>,
    pub slug: String,
    pub title: String,
    pub body: String,
    pub featured: bool,
    pub trending: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle state of a post at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    /// Carries a publish date that has not arrived yet.
    Scheduled,
    Published,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("post was already published at {0}")]
    AlreadyPublished(DateTime<Utc>),
    #[error("post is scheduled for {0}")]
    Scheduled(DateTime<Utc>),
}

impl Post {
    /// Create a new draft.
    pub fn new(author_id: Uuid, slug: String, title: String, body: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            category_id: None,
            slug,
            title,
            body,
            featured: false,
            trending: false,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> PostStatus {
        match self.published_at {
            None => PostStatus::Draft,
            Some(at) if at <= now => PostStatus::Published,
            Some(_) => PostStatus::Scheduled,
        }
    }

    pub fn is_published_at(&self, now: DateTime<Utc>) -> bool {
        self.status_at(now) == PostStatus::Published
    }

    pub fn is_draft(&self) -> bool {
        self.published_at.is_none()
    }

    /// Draft -> Published. Leaves the post untouched on error.
    pub fn publish(&mut self, now: DateTime<Utc>) -> Result<(), PublishError> {
        match self.published_at {
            None => {
                self.published_at = Some(now);
                self.updated_at = now;
                Ok(())
            }
            Some(at) if at <= now => Err(PublishError::AlreadyPublished(at)),
            Some(at) => Err(PublishError::Scheduled(at)),
        }
    }

    /// Published posts are public; anything else is visible to its author only.
    pub fn visible_to(&self, viewer: Option<Uuid>, now: DateTime<Utc>) -> bool {
        self.is_published_at(now) || viewer == Some(self.author_id)
    }
}

/// Turn a title into a URL slug, falling back to `post` for titles without
/// any sluggable characters.
pub fn slugify_title(title: &str) -> String {
    let slug = slug::slugify(title);
    if slug.is_empty() {
        "post".to_string()
    } else {
        slug
    }
}

/// Which posts a listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    /// `published_at <= as_of`, newest publication first.
    Published { as_of: DateTime<Utc> },
    /// Unpublished posts of one author, newest first.
    Drafts { author_id: Uuid },
    /// Featured published posts, newest created first.
    Featured { as_of: DateTime<Utc> },
    /// Trending published posts, newest publication first.
    Trending { as_of: DateTime<Utc> },
}

/// Sort order of a listing. Ties fall back to creation date then id so that
/// repeated queries page identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOrdering {
    PublishedDesc,
    CreatedDesc,
}

impl PostFilter {
    pub fn published_now() -> Self {
        Self::Published { as_of: Utc::now() }
    }

    pub fn matches(&self, post: &Post) -> bool {
        match *self {
            PostFilter::Published { as_of } => post.is_published_at(as_of),
            PostFilter::Drafts { author_id } => post.is_draft() && post.author_id == author_id,
            PostFilter::Featured { as_of } => post.featured && post.is_published_at(as_of),
            PostFilter::Trending { as_of } => post.trending && post.is_published_at(as_of),
        }
    }

    pub fn ordering(&self) -> PostOrdering {
        match self {
            PostFilter::Published { .. } | PostFilter::Trending { .. } => {
                PostOrdering::PublishedDesc
            }
            PostFilter::Drafts { .. } | PostFilter::Featured { .. } => PostOrdering::CreatedDesc,
        }
    }
}

impl PostOrdering {
    pub fn compare(&self, a: &Post, b: &Post) -> Ordering {
        let primary = match self {
            PostOrdering::PublishedDesc => b.published_at.cmp(&a.published_at),
            PostOrdering::CreatedDesc => Ordering::Equal,
        };
        primary
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id))
    }
}
