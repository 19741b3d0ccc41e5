use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

use inkwell_core::domain::{Category, Post};

use super::configure_routes;
use crate::config::BlogSettings;
use crate::services;
use crate::state::AppState;

fn state() -> AppState {
    AppState::in_memory(BlogSettings::default())
}

fn bearer(state: &AppState, user_id: Uuid) -> (header::HeaderName, String) {
    let token = state
        .tokens
        .generate_token(user_id, "writer@example.com", vec!["user".to_string()])
        .unwrap();
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

async fn published_post(state: &AppState, slug: &str, title: &str) -> Post {
    let mut post = Post::new(
        Uuid::new_v4(),
        slug.to_string(),
        title.to_string(),
        format!("All about {title}"),
    );
    post.published_at = Some(Utc::now() - Duration::hours(1));
    state.posts.save(post).await.unwrap()
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn health_reports_ok() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "in-memory");
}

#[actix_web::test]
async fn register_login_and_me() {
    let state = state();
    let app = app!(state);
    let credentials = json!({"email": "Ann@Example.com", "password": "correct horse"});

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&credentials)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&credentials)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"email": "ann@example.com", "password": "wrong password"}))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"email": "ann@example.com", "password": "correct horse"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["email"], "ann@example.com");
}

#[actix_web::test]
async fn register_rejects_invalid_fields() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({"email": "not-an-email", "password": "short"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(res).await;
    assert!(body["errors"]["email"].is_array());
    assert!(body["errors"]["password"].is_array());
}

#[actix_web::test]
async fn anonymous_create_redirects_to_login() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .set_json(json!({"title": "Hi", "body": "There"}))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        res.headers().get(header::LOCATION).unwrap(),
        "/api/auth/login?next=%2Fapi%2Fposts"
    );
}

#[actix_web::test]
async fn anonymous_mutations_redirect_before_lookup() {
    let state = state();
    let app = app!(state);

    let routes = [
        "comments/{id}/approve",
        "comments/{id}/delete",
        "posts/{id}/publish",
        "posts/{id}/delete",
    ];
    for route in routes {
        let id = Uuid::new_v4();
        let uri = format!("/api/{}", route.replace("{id}", &id.to_string()));
        let req = test::TestRequest::post().uri(&uri).to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{uri}");
        let location = res.headers().get(header::LOCATION).unwrap().to_str().unwrap();
        assert!(location.starts_with("/api/auth/login?next=%2Fapi%2F"), "{location}");
        assert!(location.contains(&id.to_string()), "{location}");
    }
}

#[actix_web::test]
async fn create_validates_before_saving() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(bearer(&state, Uuid::new_v4()))
        .set_json(json!({"title": "  ", "body": "There", "slug": "Bad Slug"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(res).await;
    assert!(body["errors"]["title"].is_array());
    assert!(body["errors"]["slug"].is_array());
}

#[actix_web::test]
async fn publish_twice_conflicts_with_detail() {
    let state = state();
    let app = app!(state);
    let auth = bearer(&state, Uuid::new_v4());

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(auth.clone())
        .set_json(json!({"title": "Launch Day", "body": "We shipped"}))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(created["slug"], "launch-day");
    assert_eq!(created["status"], "draft");
    let id = created["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{id}/publish"))
        .insert_header(auth.clone())
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["post"]["status"], "published");
    assert_eq!(detail["publish_error"], false);

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{id}/publish"))
        .insert_header(auth)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["publish_error"], true);
    assert_eq!(body["post"]["id"], id.as_str());
}

#[actix_web::test]
async fn publishing_someone_elses_scheduled_post_conflicts() {
    let state = state();
    let app = app!(state);
    let mut post = Post::new(
        Uuid::new_v4(),
        "coming-soon".to_string(),
        "Coming Soon".to_string(),
        "Not yet".to_string(),
    );
    post.published_at = Some(Utc::now() + Duration::days(1));
    let post = state.posts.save(post).await.unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{}/publish", post.id))
        .insert_header(bearer(&state, Uuid::new_v4()))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["publish_error"], true);
    assert_eq!(body["post"]["status"], "scheduled");
}

#[actix_web::test]
async fn strangers_cannot_delete() {
    let state = state();
    let app = app!(state);
    let post = published_post(&state, "keep-me", "Keep Me").await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{}/delete", post.id))
        .insert_header(bearer(&state, Uuid::new_v4()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{}/delete", post.id))
        .insert_header(bearer(&state, post.author_id))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn page_beyond_last_returns_last() {
    let state = state();
    let app = app!(state);
    for n in 0..7 {
        published_post(&state, &format!("post-{n}"), &format!("Post {n}")).await;
    }

    let req = test::TestRequest::get().uri("/api/posts?page=99").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["posts"]["page"], 2);
    assert_eq!(body["posts"]["num_pages"], 2);
    assert_eq!(body["posts"]["items"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::get().uri("/api/posts?page=abc").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["posts"]["page"], 1);
}

#[actix_web::test]
async fn category_path_resolves_post_with_breadcrumbs() {
    let state = state();
    let app = app!(state);
    let tech = state
        .categories
        .save(Category::new("Tech", "tech", None))
        .await
        .unwrap();
    let python = state
        .categories
        .save(Category::new("Python", "python", Some(tech.id)))
        .await
        .unwrap();
    let mut post = published_post(&state, "my-post", "My Post").await;
    post.category_id = Some(python.id);
    state.posts.save(post).await.unwrap();

    let req = test::TestRequest::get()
        .uri("/api/category/tech/python/my-post")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["kind"], "post");
    assert_eq!(body["post"]["slug"], "my-post");
    assert_eq!(body["breadcrumbs"][0]["path"], "tech");
    assert_eq!(body["breadcrumbs"][1]["path"], "tech/python");

    let req = test::TestRequest::get().uri("/api/category/tech").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["kind"], "listing");
    assert_eq!(body["children"][0]["path"], "tech/python");

    let req = test::TestRequest::get()
        .uri("/api/category/tech/missing")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn autocomplete_and_faceted_search() {
    let state = state();
    let app = app!(state);
    published_post(&state, "django-tips", "Django Tips").await;
    published_post(&state, "java-basics", "Java Basics").await;
    services::search::reindex(&state).await.unwrap();

    let req = test::TestRequest::get()
        .uri("/api/search/autocomplete?query=dja")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        body,
        json!({"suggestions": [{"value": "Django Tips", "data": "django-tips"}]})
    );

    let req = test::TestRequest::get()
        .uri("/api/search?q=about&selected_facets=title_exact:Java%20Basics&selected_facets=junk")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["results"]["total"], 1);
    assert_eq!(body["results"]["items"][0]["slug"], "java-basics");
    assert_eq!(body["facets"]["title"][0]["value"], "Java Basics");

    let req = test::TestRequest::post()
        .uri("/api/search")
        .set_json(json!({"q": "   "}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["results"]["total"], 0);
    assert_eq!(body["results"]["num_pages"], 1);
}

#[actix_web::test]
async fn comments_need_login_and_start_pending() {
    let state = state();
    let app = app!(state);
    let post = published_post(&state, "chatty", "Chatty").await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{}/comments", post.id))
        .set_json(json!({"body": "First!"}))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let auth = bearer(&state, Uuid::new_v4());
    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{}/comments", post.id))
        .insert_header(auth.clone())
        .set_json(json!({"body": "First!"}))
        .to_request();
    let comment: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(comment["author"], "writer");
    assert_eq!(comment["approved"], false);

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{}", post.id))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert!(detail["comments"].as_array().unwrap().is_empty());

    let req = test::TestRequest::post()
        .uri(&format!("/api/comments/{}/approve", comment["id"].as_str().unwrap()))
        .insert_header(auth)
        .to_request();
    let approved: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(approved["approved"], true);

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{}", post.id))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["comments"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn malformed_json_is_a_problem_document() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["status"], 400);
}
