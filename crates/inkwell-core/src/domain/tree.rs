//! Explicit category tree with a `(parent, slug)` index.
//!
//! The tree is built once from a flat list of categories and resolves
//! slash-separated slug paths in O(depth) without further store lookups.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

use super::category::{Breadcrumb, Category};

/// How a path segment is recognised as a category while resolving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SlugMatching {
    /// A segment is a category only if it names a direct child of the current parent.
    #[default]
    Scoped,
    /// A segment is a category if any category anywhere carries that slug; a slug
    /// that exists elsewhere but not under the current parent is not found.
    Global,
}

impl FromStr for SlugMatching {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "scoped" => Ok(Self::Scoped),
            "global" => Ok(Self::Global),
            other => Err(format!("unknown slug matching mode: {other}")),
        }
    }
}

/// Outcome of resolving a category path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Every segment named a category; `None` is the root.
    Listing(Option<Category>),
    /// A segment did not name a category; the final segment is a post slug.
    Post { slug: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("category '{slug}' does not exist under the requested parent")]
    NotUnderParent { slug: String, parent: Option<Uuid> },
}

/// In-memory category hierarchy.
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    nodes: HashMap<Uuid, Category>,
    children: HashMap<Option<Uuid>, Vec<Uuid>>,
    by_parent_slug: HashMap<(Option<Uuid>, String), Uuid>,
    slugs: HashSet<String>,
}

impl CategoryTree {
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        let mut tree = Self::default();
        for category in categories {
            let key = (category.parent_id, category.slug.clone());
            if tree.by_parent_slug.contains_key(&key) {
                continue;
            }
            tree.by_parent_slug.insert(key, category.id);
            tree.slugs.insert(category.slug.clone());
            tree.children
                .entry(category.parent_id)
                .or_default()
                .push(category.id);
            tree.nodes.insert(category.id, category);
        }

        for ids in tree.children.values_mut() {
            ids.sort_by(|a, b| tree.nodes[a].name.cmp(&tree.nodes[b].name));
        }

        tree
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Category> {
        self.nodes.get(&id)
    }

    /// Direct child of `parent` carrying `slug`.
    pub fn child(&self, parent: Option<Uuid>, slug: &str) -> Option<&Category> {
        self.by_parent_slug
            .get(&(parent, slug.to_string()))
            .and_then(|id| self.nodes.get(id))
    }

    /// Direct children of `parent`, ordered by name.
    pub fn children(&self, parent: Option<Uuid>) -> Vec<&Category> {
        self.children
            .get(&parent)
            .map(|ids| ids.iter().filter_map(|id| self.nodes.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn contains_slug(&self, slug: &str) -> bool {
        self.slugs.contains(slug)
    }

    /// Chain from the root down to `id`, inclusive. Stops early on a broken
    /// parent link or a cycle.
    pub fn ancestors(&self, id: Uuid) -> Vec<&Category> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.nodes.get(&id);

        while let Some(category) = current {
            if !seen.insert(category.id) {
                break;
            }
            chain.push(category);
            current = category.parent_id.and_then(|parent| self.nodes.get(&parent));
        }

        chain.reverse();
        chain
    }

    /// Slug path of a category, e.g. `tech/python`.
    pub fn path_of(&self, id: Uuid) -> String {
        self.ancestors(id)
            .iter()
            .map(|category| category.slug.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Breadcrumb trail for an entity filed under `category_id`, root first.
    pub fn breadcrumbs(&self, category_id: Option<Uuid>) -> Vec<Breadcrumb> {
        let Some(id) = category_id else {
            return Vec::new();
        };

        let mut path = String::new();
        self.ancestors(id)
            .into_iter()
            .map(|category| {
                if !path.is_empty() {
                    path.push('/');
                }
                path.push_str(&category.slug);
                Breadcrumb::from_path(path.clone())
            })
            .collect()
    }

    /// Resolve a slash-separated slug path.
    ///
    /// Segments descend the tree from the root. The first segment that is not
    /// a category turns the whole request into a post lookup by the path's
    /// final segment. Empty segments are ignored.
    pub fn resolve(&self, path: &str, matching: SlugMatching) -> Result<Resolution, ResolveError> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut parent: Option<&Category> = None;

        for segment in &segments {
            let parent_id = parent.map(|category| category.id);
            let is_category = match matching {
                SlugMatching::Scoped => self.child(parent_id, segment).is_some(),
                SlugMatching::Global => self.contains_slug(segment),
            };

            if !is_category {
                let slug = segments.last().copied().unwrap_or(*segment);
                return Ok(Resolution::Post {
                    slug: slug.to_string(),
                });
            }

            match self.child(parent_id, segment) {
                Some(category) => parent = Some(category),
                None => {
                    return Err(ResolveError::NotUnderParent {
                        slug: segment.to_string(),
                        parent: parent_id,
                    });
                }
            }
        }

        Ok(Resolution::Listing(parent.cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        tree: CategoryTree,
        tech: Category,
        python: Category,
        news: Category,
    }

    fn fixture() -> Fixture {
        let tech = Category::new("Tech", "tech", None);
        let python = Category::new("Python", "python", Some(tech.id));
        let web = Category::new("Web", "web", Some(python.id));
        let news = Category::new("News", "news", None);
        // Same slug under a different parent.
        let news_python = Category::new("Python News", "python", Some(news.id));

        let tree = CategoryTree::new(vec![
            tech.clone(),
            python.clone(),
            web,
            news.clone(),
            news_python,
        ]);

        Fixture {
            tree,
            tech,
            python,
            news,
        }
    }

    fn listing_id(resolution: Resolution) -> Option<Uuid> {
        match resolution {
            Resolution::Listing(category) => category.map(|c| c.id),
            other => panic!("expected listing, got {other:?}"),
        }
    }

    #[test]
    fn resolves_nested_category() {
        let f = fixture();
        let resolved = f.tree.resolve("tech/python", SlugMatching::Scoped).unwrap();
        assert_eq!(listing_id(resolved), Some(f.python.id));
    }

    #[test]
    fn empty_path_is_root() {
        let f = fixture();
        assert_eq!(
            f.tree.resolve("", SlugMatching::Scoped).unwrap(),
            Resolution::Listing(None)
        );
        assert_eq!(
            f.tree.resolve("/", SlugMatching::Global).unwrap(),
            Resolution::Listing(None)
        );
    }

    #[test]
    fn trailing_and_double_slashes_are_ignored() {
        let f = fixture();
        let resolved = f.tree.resolve("/tech//python/", SlugMatching::Scoped).unwrap();
        assert_eq!(listing_id(resolved), Some(f.python.id));
    }

    #[test]
    fn unknown_segment_falls_through_to_final_post_slug() {
        let f = fixture();
        let resolved = f
            .tree
            .resolve("tech/python/my-post", SlugMatching::Scoped)
            .unwrap();
        assert_eq!(
            resolved,
            Resolution::Post {
                slug: "my-post".to_string()
            }
        );

        let resolved = f
            .tree
            .resolve("tech/unknown/my-post", SlugMatching::Scoped)
            .unwrap();
        assert_eq!(
            resolved,
            Resolution::Post {
                slug: "my-post".to_string()
            }
        );
    }

    #[test]
    fn resolving_a_path_matches_resolving_its_prefixes() {
        let f = fixture();
        let path = ["tech", "python", "web"];

        for mode in [SlugMatching::Scoped, SlugMatching::Global] {
            let mut parent: Option<Uuid> = None;
            for depth in 1..=path.len() {
                let prefix = path[..depth].join("/");
                let resolved = listing_id(f.tree.resolve(&prefix, mode).unwrap());
                let stepped = f.tree.child(parent, path[depth - 1]).map(|c| c.id);
                assert_eq!(resolved, stepped, "prefix {prefix} in {mode:?}");
                parent = stepped;
            }
        }
    }

    #[test]
    fn scoped_matching_treats_foreign_slug_as_post() {
        let f = fixture();
        // `web` only exists under tech/python.
        let resolved = f.tree.resolve("news/web", SlugMatching::Scoped).unwrap();
        assert_eq!(
            resolved,
            Resolution::Post {
                slug: "web".to_string()
            }
        );
    }

    #[test]
    fn global_matching_rejects_slug_under_wrong_parent() {
        let f = fixture();
        let err = f.tree.resolve("news/web", SlugMatching::Global).unwrap_err();
        assert_eq!(
            err,
            ResolveError::NotUnderParent {
                slug: "web".to_string(),
                parent: Some(f.news.id),
            }
        );
    }

    #[test]
    fn duplicate_slugs_resolve_by_parent() {
        let f = fixture();
        let under_news = listing_id(f.tree.resolve("news/python", SlugMatching::Scoped).unwrap());
        let under_tech = listing_id(f.tree.resolve("tech/python", SlugMatching::Scoped).unwrap());
        assert_ne!(under_news, under_tech);
        assert_eq!(under_tech, Some(f.python.id));
    }

    #[test]
    fn breadcrumbs_walk_from_root() {
        let f = fixture();
        let crumbs = f.tree.breadcrumbs(Some(f.python.id));
        let paths: Vec<&str> = crumbs.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["tech", "tech/python"]);
        assert_eq!(f.tree.path_of(f.python.id), "tech/python");
        assert!(f.tree.breadcrumbs(None).is_empty());
    }

    #[test]
    fn children_are_sorted_by_name() {
        let f = fixture();
        let roots: Vec<&str> = f.tree.children(None).iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(roots, vec!["news", "tech"]);
        assert_eq!(f.tree.children(Some(f.tech.id)).len(), 1);
    }

    #[test]
    fn ancestors_stop_on_cycle() {
        let mut a = Category::new("A", "a", None);
        let b = Category::new("B", "b", Some(a.id));
        a.parent_id = Some(b.id);
        let tree = CategoryTree::new(vec![a.clone(), b]);
        assert_eq!(tree.ancestors(a.id).len(), 2);
    }
}
