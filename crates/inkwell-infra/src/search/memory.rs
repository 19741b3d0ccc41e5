//! In-memory search index - the default backend.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use inkwell_core::domain::{PageRequest, SearchDocument, SearchQuery, SearchResults, Suggestion};
use inkwell_core::ports::{SearchError, SearchIndex};

use super::matching;

/// Scans every document per query. Suitable for small blogs and tests.
#[derive(Default)]
pub struct InMemorySearchIndex {
    documents: RwLock<HashMap<Uuid, SearchDocument>>,
}

impl InMemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SearchIndex for InMemorySearchIndex {
    async fn index(&self, document: SearchDocument) -> Result<(), SearchError> {
        self.documents
            .write()
            .await
            .insert(document.post_id, document);
        Ok(())
    }

    async fn remove(&self, post_id: Uuid) -> Result<(), SearchError> {
        self.documents.write().await.remove(&post_id);
        Ok(())
    }

    async fn rebuild(&self, documents: Vec<SearchDocument>) -> Result<(), SearchError> {
        let mut store = self.documents.write().await;
        *store = documents.into_iter().map(|d| (d.post_id, d)).collect();
        tracing::info!(documents = store.len(), "Rebuilt in-memory search index");
        Ok(())
    }

    async fn autocomplete(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<Suggestion>, SearchError> {
        let documents = self.documents.read().await;
        Ok(matching::autocomplete(documents.values(), prefix, limit))
    }

    async fn faceted_search(
        &self,
        query: &SearchQuery,
        page: &PageRequest,
    ) -> Result<SearchResults, SearchError> {
        let documents = self.documents.read().await;
        Ok(matching::faceted_search(documents.values(), query, page))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn doc(title: &str, text: &str) -> SearchDocument {
        SearchDocument {
            post_id: Uuid::new_v4(),
            slug: title.to_lowercase().replace(' ', "-"),
            title: title.into(),
            text: text.into(),
            published_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn removed_documents_stop_matching() {
        let index = InMemorySearchIndex::new();
        let django = doc("Django Tips", "orm");
        index.index(django.clone()).await.unwrap();
        index.index(doc("Java Basics", "jvm")).await.unwrap();

        assert_eq!(index.autocomplete("dja", 5).await.unwrap().len(), 1);

        index.remove(django.post_id).await.unwrap();
        assert!(index.autocomplete("dja", 5).await.unwrap().is_empty());
        index.remove(django.post_id).await.unwrap();
    }

    #[tokio::test]
    async fn reindexing_replaces_the_document() {
        let index = InMemorySearchIndex::new();
        let mut post = doc("Old Title", "body");
        index.index(post.clone()).await.unwrap();
        post.title = "New Title".into();
        index.index(post).await.unwrap();

        let query = SearchQuery {
            text: "title".into(),
            selected: vec![],
        };
        let results = index
            .faceted_search(&query, &PageRequest::first(3))
            .await
            .unwrap();
        assert_eq!(results.page.total, 1);
        assert_eq!(results.page.items[0].title, "New Title");
    }

    #[tokio::test]
    async fn rebuild_drops_previous_content() {
        let index = InMemorySearchIndex::new();
        index.index(doc("Stale", "gone")).await.unwrap();
        index.rebuild(vec![doc("Fresh", "here")]).await.unwrap();

        assert!(index.autocomplete("sta", 5).await.unwrap().is_empty());
        assert_eq!(index.autocomplete("fre", 5).await.unwrap().len(), 1);
    }
}
