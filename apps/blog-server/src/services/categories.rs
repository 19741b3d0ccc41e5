//! Category path resolution.

use chrono::Utc;

use inkwell_core::DomainError;
use inkwell_core::domain::{Breadcrumb, Category, CategoryTree, Post, Resolution, ResolveError};
use inkwell_core::policy::Actor;

use crate::state::AppState;

#[derive(Debug)]
pub enum CategoryPage {
    /// A category (or the root when `category` is `None`) with its children
    /// and published posts.
    Listing {
        category: Option<(Category, String)>,
        breadcrumbs: Vec<Breadcrumb>,
        children: Vec<(Category, String)>,
        posts: Vec<Post>,
    },
    /// The path ended in a post slug.
    Post {
        post: Post,
        breadcrumbs: Vec<Breadcrumb>,
    },
}

fn with_path(tree: &CategoryTree, category: &Category) -> (Category, String) {
    (category.clone(), tree.path_of(category.id))
}

#[tracing::instrument(skip(state))]
pub async fn resolve(
    state: &AppState,
    path: &str,
    actor: Option<&Actor>,
) -> Result<CategoryPage, DomainError> {
    let tree = CategoryTree::new(state.categories.all().await?);
    let now = Utc::now();

    let resolution = tree
        .resolve(path, state.settings.slug_matching)
        .map_err(|e| match e {
            ResolveError::NotUnderParent { slug, .. } => DomainError::not_found("category", slug),
        })?;

    match resolution {
        Resolution::Post { slug } => {
            let post = state
                .posts
                .find_by_slug(&slug)
                .await?
                .filter(|post| post.visible_to(actor.map(|a| a.user_id), now))
                .ok_or_else(|| DomainError::not_found("post", &slug))?;
            let breadcrumbs = tree.breadcrumbs(post.category_id);
            Ok(CategoryPage::Post { post, breadcrumbs })
        }
        Resolution::Listing(category) => {
            let id = category.as_ref().map(|c| c.id);
            let posts = state.posts.published_in_category(id, now).await?;
            Ok(CategoryPage::Listing {
                breadcrumbs: tree.breadcrumbs(id),
                children: tree
                    .children(id)
                    .into_iter()
                    .map(|child| with_path(&tree, child))
                    .collect(),
                category: category.as_ref().map(|c| with_path(&tree, c)),
                posts,
            })
        }
    }
}
