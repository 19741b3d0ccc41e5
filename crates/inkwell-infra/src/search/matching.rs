//! Matching, ranking and facet counting shared by every index backend, so
//! that results do not depend on which backend is configured.

use std::cmp::Ordering;
use std::collections::HashMap;

use unicode_segmentation::UnicodeSegmentation;

use inkwell_core::domain::{
    FacetCount, FacetField, Facets, PageRequest, SearchDocument, SearchHit, SearchQuery,
    SearchResults, Suggestion,
};

/// Facet values reported per field.
pub const MAX_FACET_VALUES: usize = 10;

/// Lowercased words. Word boundaries follow Unicode segmentation, with any
/// remaining non-alphanumeric characters treated as separators too.
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words()
        .flat_map(|word| word.split(|c: char| !c.is_alphanumeric()))
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn newer_first(a: &SearchDocument, b: &SearchDocument) -> Ordering {
    b.published_at
        .cmp(&a.published_at)
        .then_with(|| a.post_id.cmp(&b.post_id))
}

/// Up to `limit` suggestions whose words start with every query token.
/// Title matches rank above body-only matches.
pub fn autocomplete<'a>(
    documents: impl IntoIterator<Item = &'a SearchDocument>,
    prefix: &str,
    limit: usize,
) -> Vec<Suggestion> {
    let tokens = tokenize(prefix);
    if tokens.is_empty() || limit == 0 {
        return Vec::new();
    }

    let covers = |words: &[String]| {
        tokens
            .iter()
            .all(|token| words.iter().any(|word| word.starts_with(token.as_str())))
    };

    let mut matches: Vec<(bool, &SearchDocument)> = documents
        .into_iter()
        .filter_map(|doc| {
            let title = tokenize(&doc.title);
            if covers(&title) {
                return Some((true, doc));
            }
            let mut words = title;
            words.extend(tokenize(&doc.text));
            covers(&words).then_some((false, doc))
        })
        .collect();

    matches.sort_by(|(a_title, a), (b_title, b)| {
        b_title.cmp(a_title).then_with(|| newer_first(a, b))
    });

    matches
        .into_iter()
        .take(limit)
        .map(|(_, doc)| Suggestion {
            title: doc.title.clone(),
            slug: doc.slug.clone(),
        })
        .collect()
}

/// Twice the title occurrences plus the body occurrences of every token, or
/// `None` when some token occurs in neither.
fn score(tokens: &[String], document: &SearchDocument) -> Option<f32> {
    let title = tokenize(&document.title);
    let text = tokenize(&document.text);

    let mut total = 0usize;
    for token in tokens {
        let in_title = title.iter().filter(|w| *w == token).count();
        let in_text = text.iter().filter(|w| *w == token).count();
        if in_title + in_text == 0 {
            return None;
        }
        total += 2 * in_title + in_text;
    }
    Some(total as f32)
}

fn count_facets<'a>(hits: impl Iterator<Item = &'a SearchDocument> + Clone) -> Facets {
    let mut facets = Facets::default();
    for field in FacetField::ALL {
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for doc in hits.clone() {
            let value = match field {
                FacetField::Text => doc.text.as_str(),
                FacetField::Title => doc.title.as_str(),
            };
            *counts.entry(value).or_default() += 1;
        }

        let mut counts: Vec<FacetCount> = counts
            .into_iter()
            .map(|(value, count)| FacetCount {
                value: value.to_string(),
                count,
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
        counts.truncate(MAX_FACET_VALUES);
        *facets.field_mut(field) = counts;
    }
    facets
}

/// Rank `documents` against `query`, narrow by the selected facets, count
/// facets over what is left and cut out the requested page.
pub fn faceted_search<'a>(
    documents: impl IntoIterator<Item = &'a SearchDocument>,
    query: &SearchQuery,
    page: &PageRequest,
) -> SearchResults {
    if query.is_blank() {
        return SearchResults {
            page: page.paginate(Vec::new()),
            facets: Facets::default(),
        };
    }

    let tokens = tokenize(&query.text);
    let mut hits: Vec<(f32, &SearchDocument)> = documents
        .into_iter()
        .filter(|doc| query.selected.iter().all(|selection| selection.matches(doc)))
        .filter_map(|doc| score(&tokens, doc).map(|s| (s, doc)))
        .collect();

    hits.sort_by(|(a_score, a), (b_score, b)| {
        b_score
            .partial_cmp(a_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| newer_first(a, b))
    });

    let facets = count_facets(hits.iter().map(|(_, doc)| *doc));
    let hits = hits
        .into_iter()
        .map(|(score, doc)| SearchHit {
            post_id: doc.post_id,
            slug: doc.slug.clone(),
            title: doc.title.clone(),
            score,
        })
        .collect();

    SearchResults {
        page: page.paginate(hits),
        facets,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use inkwell_core::domain::FacetSelection;

    use super::*;

    fn doc(title: &str, text: &str, age_hours: i64) -> SearchDocument {
        SearchDocument {
            post_id: Uuid::new_v4(),
            slug: inkwell_core::domain::slugify_title(title),
            title: title.to_string(),
            text: text.to_string(),
            published_at: Some(Utc::now() - Duration::hours(age_hours)),
        }
    }

    #[test]
    fn tokenize_lowercases_and_splits_punctuation() {
        assert_eq!(
            tokenize("Django's ORM, fast-paths!"),
            vec!["django", "s", "orm", "fast", "paths"]
        );
        assert!(tokenize("  ... ").is_empty());
    }

    #[test]
    fn autocomplete_matches_word_prefixes_only() {
        let docs = vec![
            doc("Django Tips", "views and models", 1),
            doc("Java Basics", "classes", 2),
        ];

        let suggestions = autocomplete(&docs, "dja", 5);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].title, "Django Tips");
        assert_eq!(suggestions[0].slug, "django-tips");

        assert!(autocomplete(&docs, "   ", 5).is_empty());
    }

    #[test]
    fn autocomplete_prefers_title_matches_and_caps() {
        let mut docs = vec![doc("Cooking", "rust pans", 0)];
        for i in 0..6 {
            docs.push(doc(&format!("Rust {i}"), "", i + 1));
        }

        let suggestions = autocomplete(&docs, "rus", 5);
        assert_eq!(suggestions.len(), 5);
        assert!(suggestions.iter().all(|s| s.title.starts_with("Rust")));
        assert_eq!(suggestions[0].title, "Rust 0");
    }

    #[test]
    fn search_scores_title_hits_double() {
        let docs = vec![
            doc("Other", "rust rust rust", 1),
            doc("Rust Rust", "nothing", 2),
            doc("Unrelated", "nothing", 3),
        ];
        let query = SearchQuery {
            text: "rust".into(),
            selected: vec![],
        };

        let results = faceted_search(&docs, &query, &PageRequest::first(3));
        assert_eq!(results.page.total, 2);
        assert_eq!(results.page.items[0].title, "Rust Rust");
        assert_eq!(results.page.items[0].score, 4.0);
        assert_eq!(results.page.items[1].score, 3.0);
    }

    #[test]
    fn selected_facet_narrows_hits_and_counts() {
        let docs = vec![
            doc("Tips", "python one", 1),
            doc("Tips", "python two", 2),
            doc("Guide", "python three", 3),
        ];
        let query = SearchQuery {
            text: "python".into(),
            selected: vec![FacetSelection {
                field: FacetField::Title,
                value: "Tips".into(),
            }],
        };

        let results = faceted_search(&docs, &query, &PageRequest::first(3));
        assert_eq!(results.page.total, 2);
        assert_eq!(
            results.facets.title,
            vec![FacetCount {
                value: "Tips".into(),
                count: 2
            }]
        );
        assert_eq!(results.facets.text.len(), 2);
    }

    #[test]
    fn blank_query_is_one_empty_page() {
        let docs = vec![doc("Anything", "at all", 1)];
        let results = faceted_search(&docs, &SearchQuery::default(), &PageRequest::first(3));
        assert!(results.page.items.is_empty());
        assert_eq!(results.page.num_pages, 1);
        assert_eq!(results.facets, Facets::default());
    }
}
