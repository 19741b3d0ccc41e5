//! HTTP handlers and route configuration.

mod auth;
mod categories;
mod comments;
mod health;
mod posts;
mod search;
mod views;

use actix_web::web;

use crate::middleware::error::AppError;

/// Malformed JSON bodies become problem documents too.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(json_config())
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            // Fixed segments go before `{id}`.
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::home))
                    .route("", web::post().to(posts::create))
                    .route("/featured", web::get().to(posts::featured))
                    .route("/trending", web::get().to(posts::trending))
                    .route("/drafts", web::get().to(posts::drafts))
                    .route("/new", web::get().to(posts::new_form))
                    .route("/{id}", web::get().to(posts::detail))
                    .route("/{id}/edit", web::get().to(posts::edit_form))
                    .route("/{id}/edit", web::post().to(posts::update))
                    .route("/{id}/delete", web::post().to(posts::delete))
                    .route("/{id}/publish", web::post().to(posts::publish))
                    .route("/{id}/comments", web::post().to(comments::create)),
            )
            .service(
                web::scope("/comments")
                    .route("/{id}/approve", web::post().to(comments::approve))
                    .route("/{id}/delete", web::post().to(comments::delete)),
            )
            .route("/category/{path:.*}", web::get().to(categories::show))
            .service(
                web::scope("/search")
                    .route("", web::get().to(search::search_get))
                    .route("", web::post().to(search::search_post))
                    .route("/autocomplete", web::get().to(search::autocomplete)),
            ),
    );
}

#[cfg(test)]
mod tests;
