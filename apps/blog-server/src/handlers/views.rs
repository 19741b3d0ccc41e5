//! Domain -> DTO conversions.

use std::collections::BTreeMap;

use chrono::Utc;

use inkwell_core::domain::{
    Breadcrumb, Category, Comment, FacetCount, Facets, Page, Post, PostStatus, SearchHit,
    Suggestion,
};
use inkwell_shared::dto::{
    BreadcrumbResponse, CategoryResponse, CommentResponse, FacetCountResponse, PageResponse,
    PostDetailResponse, PostResponse, SearchHitResponse, SuggestionResponse,
};

use crate::services::posts::PostDetail;

pub fn post(post: &Post) -> PostResponse {
    let status = match post.status_at(Utc::now()) {
        PostStatus::Draft => "draft",
        PostStatus::Scheduled => "scheduled",
        PostStatus::Published => "published",
    };

    PostResponse {
        id: post.id,
        slug: post.slug.clone(),
        title: post.title.clone(),
        body: post.body.clone(),
        author_id: post.author_id,
        category_id: post.category_id,
        featured: post.featured,
        trending: post.trending,
        status: status.to_string(),
        published_at: post.published_at,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

pub fn posts(posts: &[Post]) -> Vec<PostResponse> {
    posts.iter().map(post).collect()
}

pub fn comment(comment: &Comment) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        post_id: comment.post_id,
        author: comment.author.clone(),
        body: comment.body.clone(),
        approved: comment.approved,
        created_at: comment.created_at,
    }
}

pub fn category(category: &Category, path: String) -> CategoryResponse {
    CategoryResponse {
        id: category.id,
        parent_id: category.parent_id,
        name: category.name.clone(),
        slug: category.slug.clone(),
        path,
    }
}

pub fn categories(categories: Vec<(Category, String)>) -> Vec<CategoryResponse> {
    categories
        .into_iter()
        .map(|(c, path)| category(&c, path))
        .collect()
}

pub fn breadcrumbs(crumbs: Vec<Breadcrumb>) -> Vec<BreadcrumbResponse> {
    crumbs
        .into_iter()
        .map(|b| BreadcrumbResponse {
            path: b.path,
            name: b.name,
        })
        .collect()
}

pub fn page<T, U>(page: Page<T>, f: impl FnMut(T) -> U) -> PageResponse<U> {
    let has_next = page.has_next();
    let has_previous = page.has_previous();
    let page = page.map(f);

    PageResponse {
        items: page.items,
        page: page.number,
        num_pages: page.num_pages,
        page_size: page.page_size,
        total: page.total,
        has_next,
        has_previous,
    }
}

pub fn detail(detail: &PostDetail, publish_error: bool) -> PostDetailResponse {
    PostDetailResponse {
        post: post(&detail.post),
        comments: detail.comments.iter().map(comment).collect(),
        recent_posts: posts(&detail.recent),
        featured_posts: posts(&detail.featured),
        publish_error,
    }
}

pub fn suggestion(suggestion: Suggestion) -> SuggestionResponse {
    SuggestionResponse {
        value: suggestion.title,
        data: suggestion.slug,
    }
}

pub fn hit(hit: SearchHit) -> SearchHitResponse {
    SearchHitResponse {
        post_id: hit.post_id,
        slug: hit.slug,
        title: hit.title,
        score: hit.score,
    }
}

fn counts(counts: Vec<FacetCount>) -> Vec<FacetCountResponse> {
    counts
        .into_iter()
        .map(|c| FacetCountResponse {
            value: c.value,
            count: c.count,
        })
        .collect()
}

pub fn facets(facets: Facets) -> BTreeMap<String, Vec<FacetCountResponse>> {
    [
        ("text".to_string(), counts(facets.text)),
        ("title".to_string(), counts(facets.title)),
    ]
    .into_iter()
    .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use inkwell_core::domain::PageRequest;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn post_status_reflects_publish_date() {
        let mut p = Post::new(Uuid::new_v4(), "s".into(), "T".into(), "B".into());
        assert_eq!(post(&p).status, "draft");
        p.published_at = Some(Utc::now() + Duration::days(1));
        assert_eq!(post(&p).status, "scheduled");
        p.published_at = Some(Utc::now() - Duration::days(1));
        assert_eq!(post(&p).status, "published");
    }

    #[test]
    fn page_keeps_navigation_flags() {
        let listing = PageRequest::parse(Some("2"), 2).paginate(vec![1, 2, 3, 4, 5]);
        let response = page(listing, |n| n * 10);
        assert_eq!(response.items, vec![30, 40]);
        assert_eq!(response.page, 2);
        assert!(response.has_next);
        assert!(response.has_previous);
    }
}
