//! Search index port - abstraction over full-text backends.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{PageRequest, SearchDocument, SearchQuery, SearchResults, Suggestion};

/// Full-text index over published posts.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Insert or replace a document.
    async fn index(&self, document: SearchDocument) -> Result<(), SearchError>;

    /// Remove a post from the index. Removing an unknown post is not an error.
    async fn remove(&self, post_id: Uuid) -> Result<(), SearchError>;

    /// Replace the whole index content.
    async fn rebuild(&self, documents: Vec<SearchDocument>) -> Result<(), SearchError>;

    /// Ranked suggestions whose words start with the query's tokens.
    async fn autocomplete(&self, prefix: &str, limit: usize)
    -> Result<Vec<Suggestion>, SearchError>;

    /// Matching posts plus facet counts.
    async fn faceted_search(
        &self,
        query: &SearchQuery,
        page: &PageRequest,
    ) -> Result<SearchResults, SearchError>;
}

/// Search backend errors.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Index error: {0}")]
    Index(String),

    #[error("Query error: {0}")]
    Query(String),
}
