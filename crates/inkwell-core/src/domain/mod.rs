//! Domain entities - the core business objects.

mod category;
mod comment;
mod page;
mod post;
mod search;
mod tree;
mod user;

pub use category::{Breadcrumb, Category};
pub use comment::{Comment, CommentState};
pub use page::{Page, PageRequest, PageWindow};
pub use post::{Post, PostFilter, PostOrdering, PostStatus, PublishError, slugify_title};
pub use search::{
    FacetCount, FacetField, FacetSelection, Facets, SearchDocument, SearchHit, SearchQuery,
    SearchResults, Suggestion,
};
pub use tree::{CategoryTree, Resolution, ResolveError, SlugMatching};
pub use user::User;
