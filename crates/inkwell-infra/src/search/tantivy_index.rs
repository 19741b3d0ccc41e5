//! Tantivy-backed search index, in RAM or in a directory.
//!
//! Tantivy selects candidate documents; ranking and facet counting then run
//! through [`super::matching`] on the stored fields.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, FuzzyTermQuery, Occur, Query, TermQuery};
use tantivy::schema::{
    Field, IndexRecordOption, OwnedValue, STORED, STRING, Schema, TantivyDocument,
    TextFieldIndexing, TextOptions,
};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, TextAnalyzer};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyError, Term, doc};
use tokio::sync::Mutex;
use uuid::Uuid;

use inkwell_core::domain::{PageRequest, SearchDocument, SearchQuery, SearchResults, Suggestion};
use inkwell_core::ports::{SearchError, SearchIndex};

use super::matching;

const TOKENIZER: &str = "inkwell_words";
const WRITER_MEMORY_BYTES: usize = 50_000_000;

fn index_error(err: TantivyError) -> SearchError {
    SearchError::Index(err.to_string())
}

#[derive(Clone, Copy)]
struct Fields {
    post_id: Field,
    slug: Field,
    title: Field,
    text: Field,
    published_at: Field,
}

pub struct TantivySearchIndex {
    reader: IndexReader,
    writer: Arc<Mutex<IndexWriter>>,
    fields: Fields,
}

impl TantivySearchIndex {
    /// Volatile index, rebuilt from the post store at startup.
    pub fn in_ram() -> Result<Self, SearchError> {
        Self::from_index(Index::create_in_ram(Self::build_schema()))
    }

    /// Open the index in `dir`, creating it when absent.
    pub fn open_in_dir(dir: impl AsRef<Path>) -> Result<Self, SearchError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| SearchError::Index(e.to_string()))?;

        let index = if dir.join("meta.json").exists() {
            Index::open_in_dir(dir).map_err(index_error)?
        } else {
            Index::create_in_dir(dir, Self::build_schema()).map_err(index_error)?
        };
        tracing::info!(path = %dir.display(), "Opened tantivy search index");
        Self::from_index(index)
    }

    fn build_schema() -> Schema {
        let mut builder = Schema::builder();
        let words = TextFieldIndexing::default()
            .set_tokenizer(TOKENIZER)
            .set_index_option(IndexRecordOption::WithFreqsAndPositions);
        let stored_words = TextOptions::default()
            .set_indexing_options(words)
            .set_stored();

        builder.add_text_field("post_id", STRING | STORED);
        builder.add_text_field("slug", STORED);
        builder.add_text_field("title", stored_words.clone());
        builder.add_text_field("text", stored_words);
        builder.add_i64_field("published_at", STORED);
        builder.build()
    }

    fn from_index(index: Index) -> Result<Self, SearchError> {
        // Same word boundaries as `matching::tokenize`.
        let analyzer = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(LowerCaser)
            .build();
        index.tokenizers().register(TOKENIZER, analyzer);

        let schema = index.schema();
        let field = |name: &str| schema.get_field(name).map_err(index_error);
        let fields = Fields {
            post_id: field("post_id")?,
            slug: field("slug")?,
            title: field("title")?,
            text: field("text")?,
            published_at: field("published_at")?,
        };

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(index_error)?;
        let writer = index.writer(WRITER_MEMORY_BYTES).map_err(index_error)?;

        Ok(Self {
            reader,
            writer: Arc::new(Mutex::new(writer)),
            fields,
        })
    }

    fn to_tantivy(&self, document: &SearchDocument) -> TantivyDocument {
        let mut doc = doc!(
            self.fields.post_id => document.post_id.to_string(),
            self.fields.slug => document.slug.clone(),
            self.fields.title => document.title.clone(),
            self.fields.text => document.text.clone(),
        );
        if let Some(published_at) = document.published_at {
            doc.add_i64(self.fields.published_at, published_at.timestamp_millis());
        }
        doc
    }

    fn from_tantivy(&self, doc: &TantivyDocument) -> Option<SearchDocument> {
        let stored = |field: Field| -> Option<OwnedValue> {
            let value = doc.get_first(field)?;
            Some(value.into())
        };
        let text = |field: Field| match stored(field) {
            Some(OwnedValue::Str(value)) => Some(value),
            _ => None,
        };
        let published_at = match stored(self.fields.published_at) {
            Some(OwnedValue::I64(millis)) => DateTime::<Utc>::from_timestamp_millis(millis),
            _ => None,
        };

        Some(SearchDocument {
            post_id: text(self.fields.post_id)?.parse().ok()?,
            slug: text(self.fields.slug)?,
            title: text(self.fields.title).unwrap_or_default(),
            text: text(self.fields.text).unwrap_or_default(),
            published_at,
        })
    }

    fn id_term(&self, post_id: Uuid) -> Term {
        Term::from_field_text(self.fields.post_id, &post_id.to_string())
    }

    /// Every token must hit the title or the body; `prefix` relaxes term
    /// equality to a word-prefix match.
    fn token_query(&self, tokens: &[String], prefix: bool) -> BooleanQuery {
        let clauses = tokens
            .iter()
            .map(|token| {
                let either: Vec<(Occur, Box<dyn Query>)> = [self.fields.title, self.fields.text]
                    .into_iter()
                    .map(|field| {
                        let term = Term::from_field_text(field, token);
                        let query: Box<dyn Query> = if prefix {
                            Box::new(FuzzyTermQuery::new_prefix(term, 0, false))
                        } else {
                            Box::new(TermQuery::new(term, IndexRecordOption::Basic))
                        };
                        (Occur::Should, query)
                    })
                    .collect();
                let clause: Box<dyn Query> = Box::new(BooleanQuery::new(either));
                (Occur::Must, clause)
            })
            .collect();
        BooleanQuery::new(clauses)
    }

    fn candidates(&self, query: &dyn Query) -> Result<Vec<SearchDocument>, SearchError> {
        let searcher = self.reader.searcher();
        let limit = usize::try_from(searcher.num_docs()).unwrap_or(usize::MAX).max(1);
        let top_docs = searcher
            .search(query, &TopDocs::with_limit(limit))
            .map_err(|e| SearchError::Query(e.to_string()))?;

        let mut documents = Vec::with_capacity(top_docs.len());
        for (_score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address).map_err(index_error)?;
            match self.from_tantivy(&doc) {
                Some(document) => documents.push(document),
                None => tracing::warn!(?address, "Skipping search document without an id"),
            }
        }
        Ok(documents)
    }

    /// Apply `op` and commit on the blocking pool. The writer lock is held
    /// until the reader sees the commit.
    async fn write<F>(&self, op: F) -> Result<(), SearchError>
    where
        F: FnOnce(&mut IndexWriter) -> Result<(), SearchError> + Send + 'static,
    {
        let mut writer = Arc::clone(&self.writer).lock_owned().await;
        let reader = self.reader.clone();

        tokio::task::spawn_blocking(move || {
            op(&mut *writer)?;
            writer.commit().map_err(index_error)?;
            reader.reload().map_err(index_error)
        })
        .await
        .map_err(|e| SearchError::Index(format!("index writer task failed: {e}")))?
    }
}

#[async_trait]
impl SearchIndex for TantivySearchIndex {
    async fn index(&self, document: SearchDocument) -> Result<(), SearchError> {
        let term = self.id_term(document.post_id);
        let doc = self.to_tantivy(&document);
        self.write(move |writer| {
            writer.delete_term(term);
            writer.add_document(doc).map_err(index_error)?;
            Ok(())
        })
        .await
    }

    async fn remove(&self, post_id: Uuid) -> Result<(), SearchError> {
        let term = self.id_term(post_id);
        self.write(move |writer| {
            writer.delete_term(term);
            Ok(())
        })
        .await
    }

    async fn rebuild(&self, documents: Vec<SearchDocument>) -> Result<(), SearchError> {
        let count = documents.len();
        let docs: Vec<TantivyDocument> = documents.iter().map(|d| self.to_tantivy(d)).collect();
        self.write(move |writer| {
            writer.delete_all_documents().map_err(index_error)?;
            for doc in docs {
                writer.add_document(doc).map_err(index_error)?;
            }
            Ok(())
        })
        .await?;
        tracing::info!(documents = count, "Rebuilt tantivy search index");
        Ok(())
    }

    async fn autocomplete(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<Suggestion>, SearchError> {
        let tokens = matching::tokenize(prefix);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let candidates = self.candidates(&self.token_query(&tokens, true))?;
        Ok(matching::autocomplete(&candidates, prefix, limit))
    }

    async fn faceted_search(
        &self,
        query: &SearchQuery,
        page: &PageRequest,
    ) -> Result<SearchResults, SearchError> {
        let tokens = matching::tokenize(&query.text);
        if tokens.is_empty() {
            return Ok(matching::faceted_search(std::iter::empty(), query, page));
        }

        let candidates = self.candidates(&self.token_query(&tokens, false))?;
        Ok(matching::faceted_search(&candidates, query, page))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn doc(title: &str, text: &str) -> SearchDocument {
        SearchDocument {
            post_id: Uuid::new_v4(),
            slug: title.to_lowercase().replace(' ', "-"),
            title: title.into(),
            text: text.into(),
            published_at: Some(Utc::now() - Duration::minutes(5)),
        }
    }

    #[tokio::test]
    async fn autocomplete_by_title_prefix() {
        let index = TantivySearchIndex::in_ram().unwrap();
        index
            .rebuild(vec![
                doc("Django Tips", "views"),
                doc("Java Basics", "classes"),
            ])
            .await
            .unwrap();

        let suggestions = index.autocomplete("dja", 5).await.unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].title, "Django Tips");
        assert_eq!(suggestions[0].slug, "django-tips");
    }

    #[tokio::test]
    async fn search_requires_every_token() {
        let index = TantivySearchIndex::in_ram().unwrap();
        index.index(doc("Rust Async", "tokio runtime")).await.unwrap();
        index.index(doc("Rust Macros", "syntax")).await.unwrap();

        let query = SearchQuery {
            text: "rust tokio".into(),
            selected: vec![],
        };
        let results = index
            .faceted_search(&query, &PageRequest::first(3))
            .await
            .unwrap();

        assert_eq!(results.page.total, 1);
        assert_eq!(results.page.items[0].title, "Rust Async");
        assert_eq!(results.page.items[0].score, 3.0);
    }

    #[tokio::test]
    async fn directory_index_survives_reopen() {
        let dir = std::env::temp_dir().join(format!("inkwell-index-{}", Uuid::new_v4()));
        {
            let index = TantivySearchIndex::open_in_dir(&dir).unwrap();
            index.rebuild(vec![doc("Durable Notes", "on disk")]).await.unwrap();
        }

        let reopened = TantivySearchIndex::open_in_dir(&dir).unwrap();
        let suggestions = reopened.autocomplete("dur", 5).await.unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].title, "Durable Notes");

        drop(reopened);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn removed_post_is_not_found() {
        let index = TantivySearchIndex::in_ram().unwrap();
        let post = doc("Ephemeral", "soon gone");
        index.index(post.clone()).await.unwrap();
        index.remove(post.post_id).await.unwrap();

        assert!(index.autocomplete("eph", 5).await.unwrap().is_empty());
    }
}
