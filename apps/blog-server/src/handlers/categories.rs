//! Category path handler.

use actix_web::{HttpResponse, web};

use inkwell_shared::dto::CategoryPageResponse;

use crate::handlers::views;
use crate::middleware::auth::Viewer;
use crate::middleware::error::AppResult;
use crate::services::categories::{self, CategoryPage};
use crate::state::AppState;

/// GET /api/category/{path:.*}
pub async fn show(
    state: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let page = categories::resolve(&state, &path, viewer.actor()).await?;

    let response = match page {
        CategoryPage::Listing {
            category,
            breadcrumbs,
            children,
            posts,
        } => CategoryPageResponse::Listing {
            category: category.map(|(c, path)| views::category(&c, path)),
            breadcrumbs: views::breadcrumbs(breadcrumbs),
            children: views::categories(children),
            posts: views::posts(&posts),
        },
        CategoryPage::Post { post, breadcrumbs } => CategoryPageResponse::Post {
            post: views::post(&post),
            breadcrumbs: views::breadcrumbs(breadcrumbs),
        },
    };

    Ok(HttpResponse::Ok().json(response))
}
