//! Search handlers.

use actix_web::{HttpResponse, web};

use inkwell_shared::dto::{AutocompleteQuery, AutocompleteResponse, SearchForm, SearchResponse};

use crate::handlers::views;
use crate::middleware::error::AppResult;
use crate::services::search;
use crate::state::AppState;

/// GET /api/search/autocomplete?query=
pub async fn autocomplete(
    state: web::Data<AppState>,
    query: web::Query<AutocompleteQuery>,
) -> AppResult<HttpResponse> {
    let suggestions = search::autocomplete(&state, &query.query).await?;

    Ok(HttpResponse::Ok().json(AutocompleteResponse {
        suggestions: suggestions.into_iter().map(views::suggestion).collect(),
    }))
}

async fn respond(state: &AppState, form: SearchForm) -> AppResult<HttpResponse> {
    let results = search::faceted(state, &form).await?;

    Ok(HttpResponse::Ok().json(SearchResponse {
        query: form.q,
        selected_facets: form.selected_facets,
        results: views::page(results.page, views::hit),
        facets: views::facets(results.facets),
    }))
}

/// GET /api/search?q=&selected_facets=field:value&page=
///
/// `selected_facets` may repeat.
pub async fn search_get(
    state: web::Data<AppState>,
    query: web::Query<Vec<(String, String)>>,
) -> AppResult<HttpResponse> {
    respond(&state, SearchForm::from_pairs(query.into_inner())).await
}

/// POST /api/search
pub async fn search_post(
    state: web::Data<AppState>,
    body: web::Json<SearchForm>,
) -> AppResult<HttpResponse> {
    respond(&state, body.into_inner()).await
}
