//! Data Transfer Objects - request/response types for the API.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "must be 8 to 128 characters"))]
    pub password: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

/// Response containing a user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

// ---------------------------------------------------------------------------
// Forms
// ---------------------------------------------------------------------------

fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let well_formed = !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::new("slug")
            .with_message("may only contain lowercase letters, digits and inner hyphens".into()))
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank").with_message("may not be blank".into()))
    } else {
        Ok(())
    }
}

/// Create/update payload for a post. A missing slug is generated from the title.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PostForm {
    #[validate(
        length(max = 200, message = "must be at most 200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub body: String,
    #[validate(
        length(max = 100, message = "must be at most 100 characters"),
        custom(function = "validate_slug")
    )]
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub trending: bool,
}

/// Comment payload. The author defaults to the submitter's email local part.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CommentForm {
    #[validate(length(min = 1, max = 100, message = "must be 1 to 100 characters"))]
    #[serde(default)]
    pub author: Option<String>,
    #[validate(
        length(max = 5000, message = "must be at most 5000 characters"),
        custom(function = "validate_not_blank")
    )]
    pub body: String,
}

/// `?page=` of listing endpoints. Kept as raw text: non-numeric values are
/// not an error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutocompleteQuery {
    #[serde(default)]
    pub query: String,
}

/// Faceted search parameters, from a JSON body or a query string where
/// `selected_facets` may repeat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub selected_facets: Vec<String>,
    #[serde(default)]
    pub page: Option<String>,
}

impl SearchForm {
    /// Build from decoded query-string pairs. Unknown keys are ignored.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut form = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "q" => form.q = value,
                "selected_facets" => form.selected_facets.push(value),
                "page" => form.page = Some(value),
                _ => {}
            }
        }
        form
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub body: String,
    pub author_id: Uuid,
    pub category_id: Option<Uuid>,
    pub featured: bool,
    pub trending: bool,
    /// `draft`, `scheduled` or `published`.
    pub status: String,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author: String,
    pub body: String,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub num_pages: u64,
    pub page_size: u64,
    pub total: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeResponse {
    pub posts: PageResponse<PostResponse>,
    pub featured_posts: Vec<PostResponse>,
    pub trending_posts: Vec<PostResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetailResponse {
    pub post: PostResponse,
    pub comments: Vec<CommentResponse>,
    pub recent_posts: Vec<PostResponse>,
    pub featured_posts: Vec<PostResponse>,
    /// Set when a publish attempt on this post failed.
    #[serde(default)]
    pub publish_error: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreadcrumbResponse {
    pub path: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    /// Slash-separated slug path from the root.
    pub path: String,
}

/// Outcome of resolving a category path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CategoryPageResponse {
    Listing {
        /// `None` for the root listing.
        category: Option<CategoryResponse>,
        breadcrumbs: Vec<BreadcrumbResponse>,
        children: Vec<CategoryResponse>,
        posts: Vec<PostResponse>,
    },
    Post {
        post: PostResponse,
        breadcrumbs: Vec<BreadcrumbResponse>,
    },
}

/// Data needed to render a create or edit form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostFormContext {
    pub categories: Vec<CategoryResponse>,
    pub post: Option<PostResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionResponse {
    pub value: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutocompleteResponse {
    pub suggestions: Vec<SuggestionResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHitResponse {
    pub post_id: Uuid,
    pub slug: String,
    pub title: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetCountResponse {
    pub value: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub selected_facets: Vec<String>,
    pub results: PageResponse<SearchHitResponse>,
    /// Facet counts keyed by field name.
    pub facets: BTreeMap<String, Vec<FacetCountResponse>>,
}
