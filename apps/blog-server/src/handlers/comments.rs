//! Comment handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;
use validator::Validate;

use inkwell_shared::dto::CommentForm;

use crate::handlers::views;
use crate::middleware::auth::Viewer;
use crate::middleware::error::AppResult;
use crate::services::comments;
use crate::state::AppState;

/// POST /api/posts/{id}/comments
pub async fn create(
    state: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<Uuid>,
    body: web::Json<CommentForm>,
) -> AppResult<HttpResponse> {
    viewer.require_login()?;
    let form = body.into_inner();
    form.validate()?;

    let comment = comments::create(&state, viewer.actor(), path.into_inner(), &form)
        .await
        .map_err(|e| viewer.reject(e))?;
    Ok(HttpResponse::Created().json(views::comment(&comment)))
}

/// POST /api/comments/{id}/approve
pub async fn approve(
    state: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    viewer.require_login()?;
    let comment = comments::approve(&state, viewer.actor(), path.into_inner())
        .await
        .map_err(|e| viewer.reject(e))?;
    Ok(HttpResponse::Ok().json(views::comment(&comment)))
}

/// POST /api/comments/{id}/delete
pub async fn delete(
    state: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    viewer.require_login()?;
    comments::delete(&state, viewer.actor(), path.into_inner())
        .await
        .map_err(|e| viewer.reject(e))?;
    Ok(HttpResponse::NoContent().finish())
}
