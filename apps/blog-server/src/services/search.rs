//! Search gateway: autocomplete, faceted search and index rebuilds.

use chrono::Utc;

use inkwell_core::DomainError;
use inkwell_core::domain::{
    FacetSelection, PageRequest, PostFilter, SearchDocument, SearchQuery, SearchResults,
    Suggestion,
};
use inkwell_shared::dto::SearchForm;

use crate::state::AppState;

/// Page size used while walking the post store for a rebuild.
const REINDEX_BATCH: u64 = 200;

#[tracing::instrument(skip(state))]
pub async fn autocomplete(state: &AppState, query: &str) -> Result<Vec<Suggestion>, DomainError> {
    Ok(state
        .search
        .autocomplete(query, state.settings.autocomplete_limit)
        .await?)
}

/// Malformed `selected_facets` entries are dropped.
fn selections(raw: &[String]) -> Vec<FacetSelection> {
    raw.iter()
        .filter_map(|entry| match entry.parse::<FacetSelection>() {
            Ok(selection) => Some(selection),
            Err(reason) => {
                tracing::debug!(facet = %entry, %reason, "Ignoring facet selection");
                None
            }
        })
        .collect()
}

#[tracing::instrument(skip(state))]
pub async fn faceted(state: &AppState, form: &SearchForm) -> Result<SearchResults, DomainError> {
    let query = SearchQuery {
        text: form.q.clone(),
        selected: selections(&form.selected_facets),
    };
    let page = PageRequest::parse(form.page.as_deref(), state.settings.search_page_size);
    Ok(state.search.faceted_search(&query, &page).await?)
}

/// Replace the index contents with every published post.
#[tracing::instrument(skip(state))]
pub async fn reindex(state: &AppState) -> Result<usize, DomainError> {
    let filter = PostFilter::Published { as_of: Utc::now() };
    let mut documents = Vec::new();
    let mut number = 1;

    loop {
        let page = state
            .posts
            .list(&filter, &PageRequest::number(number, REINDEX_BATCH))
            .await?;
        documents.extend(page.items.iter().map(SearchDocument::from));
        if !page.has_next() {
            break;
        }
        number += 1;
    }

    let count = documents.len();
    state.search.rebuild(documents).await?;
    tracing::info!(documents = count, "Search index rebuilt");
    Ok(count)
}
