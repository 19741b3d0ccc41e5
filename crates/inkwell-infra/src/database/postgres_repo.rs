//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Select,
};
use uuid::Uuid;

use inkwell_core::domain::{
    Category, Comment, Page, PageRequest, Post, PostFilter, PostOrdering, User,
};
use inkwell_core::error::RepoError;
use inkwell_core::ports::{CategoryRepository, CommentRepository, PostRepository, UserRepository};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, repo_error};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<CategoryEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        // Mask email for logging to avoid PII in logs
        let masked = if let Some(at_pos) = email.find('@') {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = match local.chars().next() {
                Some(first) if local.len() > 1 => format!("{first}***"),
                _ => "***".to_string(),
            };
            format!("{}{}", masked_local, domain)
        } else {
            "***".to_string()
        };
        tracing::debug!(user_email = %masked, "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(repo_error)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn all(&self) -> Result<Vec<Category>, RepoError> {
        let result = CategoryEntity::find()
            .order_by_asc(category::Column::Name)
            .all(&self.db)
            .await
            .map_err(repo_error)?;

        tracing::debug!(count = result.len(), "Loaded category tree");
        Ok(result.into_iter().map(Into::into).collect())
    }
}

fn published_as_of(as_of: DateTime<Utc>) -> Condition {
    Condition::all()
        .add(post::Column::PublishedAt.is_not_null())
        .add(post::Column::PublishedAt.lte(as_of))
}

fn filter_condition(filter: &PostFilter) -> Condition {
    match *filter {
        PostFilter::Published { as_of } => published_as_of(as_of),
        PostFilter::Drafts { author_id } => Condition::all()
            .add(post::Column::PublishedAt.is_null())
            .add(post::Column::AuthorId.eq(author_id)),
        PostFilter::Featured { as_of } => {
            published_as_of(as_of).add(post::Column::Featured.eq(true))
        }
        PostFilter::Trending { as_of } => {
            published_as_of(as_of).add(post::Column::Trending.eq(true))
        }
    }
}

/// Apply the listing order, including the created/id tie-breakers.
fn ordered(select: Select<PostEntity>, ordering: PostOrdering) -> Select<PostEntity> {
    let select = match ordering {
        PostOrdering::PublishedDesc => select.order_by_desc(post::Column::PublishedAt),
        PostOrdering::CreatedDesc => select,
    };
    select
        .order_by_desc(post::Column::CreatedAt)
        .order_by_asc(post::Column::Id)
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(repo_error)?;

        Ok(result.map(Into::into))
    }

    async fn list(&self, filter: &PostFilter, page: &PageRequest) -> Result<Page<Post>, RepoError> {
        let select = ordered(
            PostEntity::find().filter(filter_condition(filter)),
            filter.ordering(),
        );
        let paginator = select.paginate(&self.db, page.page_size());

        let total = paginator.num_items().await.map_err(repo_error)?;
        let window = page.window(total);
        // Paginator pages are 0-based.
        let items = paginator
            .fetch_page(window.number - 1)
            .await
            .map_err(repo_error)?;

        tracing::debug!(?filter, page = window.number, total, "Listed posts");
        Ok(Page::new(
            items.into_iter().map(Into::into).collect(),
            window,
            total,
        ))
    }

    async fn published_in_category(
        &self,
        category_id: Option<Uuid>,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<Post>, RepoError> {
        let in_category = match category_id {
            Some(id) => post::Column::CategoryId.eq(id),
            None => post::Column::CategoryId.is_null(),
        };
        let result = ordered(
            PostEntity::find()
                .filter(in_category)
                .filter(published_as_of(as_of)),
            PostOrdering::PublishedDesc,
        )
        .all(&self.db)
        .await
        .map_err(repo_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn for_post(
        &self,
        post_id: Uuid,
        include_pending: bool,
    ) -> Result<Vec<Comment>, RepoError> {
        let mut select = CommentEntity::find().filter(comment::Column::PostId.eq(post_id));
        if !include_pending {
            select = select.filter(comment::Column::Approved.eq(true));
        }

        let result = select
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(&self.db)
            .await
            .map_err(repo_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}
