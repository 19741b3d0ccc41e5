use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category entity - a node in the category hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    /// `None` for top-level categories.
    pub parent_id: Option<Uuid>,
    pub name: String,
    /// Unique among the children of `parent_id`.
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Create a new category.
    pub fn new(name: impl Into<String>, slug: impl Into<String>, parent_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            parent_id,
            name: name.into(),
            slug: slug.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// One step of the trail from the root to a post's category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    /// Slug path from the root, e.g. `tech/python`.
    pub path: String,
    /// Last path segment with dashes turned into spaces.
    pub name: String,
}

impl Breadcrumb {
    pub fn from_path(path: String) -> Self {
        let name = path
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .split('-')
            .collect::<Vec<_>>()
            .join(" ");
        Self { path, name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breadcrumb_name_is_humanized_last_segment() {
        let crumb = Breadcrumb::from_path("tech/machine-learning".to_string());
        assert_eq!(crumb.path, "tech/machine-learning");
        assert_eq!(crumb.name, "machine learning");
    }
}
