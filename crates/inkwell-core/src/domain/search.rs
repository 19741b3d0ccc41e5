use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::page::Page;
use super::post::Post;

/// What the search index stores for a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDocument {
    pub post_id: Uuid,
    pub slug: String,
    pub title: String,
    pub text: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<&Post> for SearchDocument {
    fn from(post: &Post) -> Self {
        Self {
            post_id: post.id,
            slug: post.slug.clone(),
            title: post.title.clone(),
            text: post.body.clone(),
            published_at: post.published_at,
        }
    }
}

/// Autocomplete entry: a display title and the slug it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub title: String,
    pub slug: String,
}

/// Fields search results can be faceted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetField {
    Text,
    Title,
}

impl FacetField {
    pub const ALL: [FacetField; 2] = [FacetField::Text, FacetField::Title];

    pub fn as_str(&self) -> &'static str {
        match self {
            FacetField::Text => "text",
            FacetField::Title => "title",
        }
    }
}

impl fmt::Display for FacetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FacetField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let name = value.trim().trim_end_matches("_exact");
        match name {
            "text" => Ok(FacetField::Text),
            "title" => Ok(FacetField::Title),
            other => Err(format!("unknown facet field: {other}")),
        }
    }
}

/// A `field:value` narrowing chosen by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetSelection {
    pub field: FacetField,
    pub value: String,
}

impl FacetSelection {
    pub fn matches(&self, document: &SearchDocument) -> bool {
        match self.field {
            FacetField::Text => document.text == self.value,
            FacetField::Title => document.title == self.value,
        }
    }
}

impl FromStr for FacetSelection {
    type Err = String;

    /// Accepts `title:Value` and `title_exact:Value`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (field, value) = raw
            .split_once(':')
            .ok_or_else(|| format!("facet selection must look like field:value, got {raw}"))?;
        Ok(Self {
            field: field.parse()?,
            value: value.to_string(),
        })
    }
}

/// A faceted search request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub selected: Vec<FacetSelection>,
}

impl SearchQuery {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub post_id: Uuid,
    pub slug: String,
    pub title: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetCount {
    pub value: String,
    pub count: u64,
}

/// Per-field facet counts, largest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Facets {
    pub text: Vec<FacetCount>,
    pub title: Vec<FacetCount>,
}

impl Facets {
    pub fn field_mut(&mut self, field: FacetField) -> &mut Vec<FacetCount> {
        match field {
            FacetField::Text => &mut self.text,
            FacetField::Title => &mut self.title,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub page: Page<SearchHit>,
    pub facets: Facets,
}
