use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use inkwell_core::domain::{
    Category, Comment, Page, PageRequest, Post, PostFilter, PostOrdering, User,
};
use inkwell_core::error::RepoError;
use inkwell_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, PostRepository, UserRepository,
};

/// Row stored by [`InMemoryRepository`].
pub trait Row: Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;

    /// Value that must be unique across rows, mirroring the table's unique index.
    fn unique_key(&self) -> Option<String> {
        None
    }
}

impl Row for User {
    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.email.to_lowercase())
    }
}

impl Row for Category {
    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_key(&self) -> Option<String> {
        let parent = self.parent_id.map(|id| id.to_string()).unwrap_or_default();
        Some(format!("{parent}/{}", self.slug))
    }
}

impl Row for Post {
    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.slug.clone())
    }
}

impl Row for Comment {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Generic in-memory table behind an async `RwLock`.
pub struct InMemoryRepository<T: Row> {
    rows: RwLock<HashMap<Uuid, T>>,
}

pub type InMemoryUserRepository = InMemoryRepository<User>;
pub type InMemoryCategoryRepository = InMemoryRepository<Category>;
pub type InMemoryPostRepository = InMemoryRepository<Post>;
pub type InMemoryCommentRepository = InMemoryRepository<Comment>;

impl<T: Row> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    async fn select(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        let rows = self.rows.read().await;
        rows.values().filter(|row| predicate(row)).cloned().collect()
    }
}

impl<T: Row> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Row> BaseRepository<T, Uuid> for InMemoryRepository<T> {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, RepoError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: T) -> Result<T, RepoError> {
        let mut rows = self.rows.write().await;

        if let Some(key) = entity.unique_key() {
            let taken = rows
                .values()
                .any(|row| row.id() != entity.id() && row.unique_key().as_ref() == Some(&key));
            if taken {
                return Err(RepoError::Constraint(format!("duplicate key: {key}")));
            }
        }

        rows.insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        match self.rows.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let email = email.to_lowercase();
        Ok(self
            .select(|user| user.email.to_lowercase() == email)
            .await
            .into_iter()
            .next())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn all(&self) -> Result<Vec<Category>, RepoError> {
        let mut categories = self.select(|_| true).await;
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }
}

fn sorted(mut posts: Vec<Post>, ordering: PostOrdering) -> Vec<Post> {
    posts.sort_by(|a, b| ordering.compare(a, b));
    posts
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        Ok(self.select(|post| post.slug == slug).await.into_iter().next())
    }

    async fn list(&self, filter: &PostFilter, page: &PageRequest) -> Result<Page<Post>, RepoError> {
        let matching = self.select(|post| filter.matches(post)).await;
        Ok(page.paginate(sorted(matching, filter.ordering())))
    }

    async fn published_in_category(
        &self,
        category_id: Option<Uuid>,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<Post>, RepoError> {
        let matching = self
            .select(|post| post.category_id == category_id && post.is_published_at(as_of))
            .await;
        Ok(sorted(matching, PostOrdering::PublishedDesc))
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn for_post(
        &self,
        post_id: Uuid,
        include_pending: bool,
    ) -> Result<Vec<Comment>, RepoError> {
        let mut comments = self
            .select(|c| c.post_id == post_id && (include_pending || c.approved))
            .await;
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }
}
