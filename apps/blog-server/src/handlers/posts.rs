//! Post handlers: listings, detail, create/edit/delete and publish.

use actix_web::{HttpResponse, web};
use uuid::Uuid;
use validator::Validate;

use inkwell_core::domain::PageRequest;
use inkwell_shared::dto::{HomeResponse, PageQuery, PostForm, PostFormContext};

use crate::handlers::views;
use crate::middleware::auth::Viewer;
use crate::middleware::error::{AppError, AppResult};
use crate::services::{listing, posts};
use crate::state::AppState;

fn page_request(state: &AppState, query: &PageQuery) -> PageRequest {
    PageRequest::parse(query.page.as_deref(), state.settings.posts_page_size)
}

/// GET /api/posts
pub async fn home(state: web::Data<AppState>, query: web::Query<PageQuery>) -> AppResult<HttpResponse> {
    let home = listing::home(&state, page_request(&state, &query)).await?;

    Ok(HttpResponse::Ok().json(HomeResponse {
        posts: views::page(home.posts, |p| views::post(&p)),
        featured_posts: views::posts(&home.featured),
        trending_posts: views::posts(&home.trending),
    }))
}

/// GET /api/posts/featured
pub async fn featured(state: web::Data<AppState>, query: web::Query<PageQuery>) -> AppResult<HttpResponse> {
    let page = listing::featured(&state, page_request(&state, &query)).await?;
    Ok(HttpResponse::Ok().json(views::page(page, |p| views::post(&p))))
}

/// GET /api/posts/trending
pub async fn trending(state: web::Data<AppState>, query: web::Query<PageQuery>) -> AppResult<HttpResponse> {
    let page = listing::trending(&state, page_request(&state, &query)).await?;
    Ok(HttpResponse::Ok().json(views::page(page, |p| views::post(&p))))
}

/// GET /api/posts/drafts
pub async fn drafts(
    state: web::Data<AppState>,
    viewer: Viewer,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    viewer.require_login()?;
    let page = listing::drafts(&state, viewer.actor(), page_request(&state, &query))
        .await
        .map_err(|e| viewer.reject(e))?;
    Ok(HttpResponse::Ok().json(views::page(page, |p| views::post(&p))))
}

async fn form_context(state: &AppState, viewer: &Viewer, id: Option<Uuid>) -> AppResult<HttpResponse> {
    viewer.require_login()?;
    let context = posts::form_context(state, viewer.actor(), id)
        .await
        .map_err(|e| viewer.reject(e))?;

    Ok(HttpResponse::Ok().json(PostFormContext {
        categories: views::categories(context.categories),
        post: context.post.as_ref().map(views::post),
    }))
}

/// GET /api/posts/new
pub async fn new_form(state: web::Data<AppState>, viewer: Viewer) -> AppResult<HttpResponse> {
    form_context(&state, &viewer, None).await
}

/// GET /api/posts/{id}/edit
pub async fn edit_form(
    state: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    form_context(&state, &viewer, Some(path.into_inner())).await
}

/// POST /api/posts
pub async fn create(
    state: web::Data<AppState>,
    viewer: Viewer,
    body: web::Json<PostForm>,
) -> AppResult<HttpResponse> {
    viewer.require_login()?;
    let form = body.into_inner();
    form.validate()?;

    let post = posts::create(&state, viewer.actor(), &form)
        .await
        .map_err(|e| viewer.reject(e))?;
    Ok(HttpResponse::Created().json(views::post(&post)))
}

/// GET /api/posts/{id}
pub async fn detail(
    state: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let detail = posts::detail(&state, path.into_inner(), viewer.actor()).await?;
    Ok(HttpResponse::Ok().json(views::detail(&detail, false)))
}

/// POST /api/posts/{id}/edit
pub async fn update(
    state: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<Uuid>,
    body: web::Json<PostForm>,
) -> AppResult<HttpResponse> {
    viewer.require_login()?;
    let form = body.into_inner();
    form.validate()?;

    let post = posts::update(&state, viewer.actor(), path.into_inner(), &form)
        .await
        .map_err(|e| viewer.reject(e))?;
    Ok(HttpResponse::Ok().json(views::post(&post)))
}

/// POST /api/posts/{id}/delete
pub async fn delete(
    state: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    viewer.require_login()?;
    posts::delete(&state, viewer.actor(), path.into_inner())
        .await
        .map_err(|e| viewer.reject(e))?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/posts/{id}/publish
///
/// A post that cannot be published comes back as a 409 carrying the detail
/// view with `publish_error` set.
pub async fn publish(
    state: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    viewer.require_login()?;
    let outcome = posts::publish(&state, viewer.actor(), path.into_inner())
        .await
        .map_err(|e| viewer.reject(e))?;
    let (post, publish_error) = match outcome {
        posts::PublishOutcome::Published(post) => (post, false),
        posts::PublishOutcome::Rejected(post) => (post, true),
    };

    let detail = posts::detail_of(&state, post, viewer.actor()).await?;
    let body = views::detail(&detail, publish_error);
    if publish_error {
        Err(AppError::PublishConflict(Box::new(body)))
    } else {
        Ok(HttpResponse::Ok().json(body))
    }
}
