use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Category, Comment, Page, PageRequest, Post, PostFilter, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
}

/// Category repository. Categories are read as a whole to build the tree.
#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, Uuid> {
    async fn all(&self) -> Result<Vec<Category>, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    /// One clamped page of the posts selected by `filter`, in the filter's order.
    async fn list(&self, filter: &PostFilter, page: &PageRequest) -> Result<Page<Post>, RepoError>;

    /// Posts filed directly under `category_id` (`None` = uncategorized) that
    /// are published as of `as_of`, newest first.
    async fn published_in_category(
        &self,
        category_id: Option<Uuid>,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<Post>, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments of a post, oldest first. Pending ones only when asked for.
    async fn for_post(&self, post_id: Uuid, include_pending: bool)
    -> Result<Vec<Comment>, RepoError>;
}
