//! Request lifecycle tests driving `Application::handle` directly.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use valkyrja::routing::MatchOutcome;
use valkyrja::AppConfig;

mod common;

#[tokio::test]
async fn test_static_and_dynamic_routes() {
    let app = common::app();

    let response = app.handle(common::request("GET", "/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_text(response).await, "Welcome");

    let response = app.handle(common::request("GET", "/article/hello-world")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["slug"], "hello-world");

    let response = app.handle(common::request("GET", "/items/7")).await;
    assert_eq!(common::body_json(response).await["id"], 7);
}

#[tokio::test]
async fn test_not_found_vs_method_not_allowed() {
    let app = common::app();

    let response = app.handle(common::request("GET", "/nothing/here")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["status"], 404);

    let response = app.handle(common::request("POST", "/version")).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "GET");

    // Pattern mismatch is a miss, not a handler error.
    let response = app.handle(common::request("GET", "/items/abc")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_head_and_trailing_slash() {
    let app = common::app();
    assert_eq!(app.handle(common::request("HEAD", "/version")).await.status(), StatusCode::OK);
    assert_eq!(app.handle(common::request("GET", "/version/")).await.status(), StatusCode::OK);
    assert_eq!(app.handle(common::request("GET", "//version")).await.status(), StatusCode::OK);

    let response = app.handle(common::request("GET", "/article//hello-world")).await;
    assert_eq!(common::body_json(response).await["slug"], "hello-world");
}

#[tokio::test]
async fn test_redirect_route() {
    let app = common::app();
    let response = app.handle(common::request("GET", "/home")).await;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn test_json_body() {
    let app = common::app();

    let request = Request::builder()
        .method("POST")
        .uri("/items")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name":"lamp"}"#))
        .unwrap();
    let response = app.handle(request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(common::body_json(response).await["name"], "lamp");

    let request = Request::builder()
        .method("POST")
        .uri("/items")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.handle(request).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_handler_error_respects_debug() {
    let app = common::app();
    let response = app.handle(common::request("GET", "/boom")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "Internal Server Error");
    assert!(body.get("causes").is_none());

    let mut config = AppConfig::default();
    config.app.debug = true;
    let app = common::builder(config).build().unwrap();
    let body = common::body_json(app.handle(common::request("GET", "/boom")).await).await;
    assert_eq!(body["error"], "connection refused");
    assert_eq!(body["causes"][0], "socket closed");
}

#[tokio::test]
async fn test_group_middleware() {
    let app = common::app();

    let response = app.handle(common::request("GET", "/admin/dashboard")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/admin/dashboard")
        .header(header::AUTHORIZATION, "Bearer token")
        .body(Body::empty())
        .unwrap();
    let response = app.handle(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_text(response).await, "dashboard");
}

#[tokio::test]
async fn test_global_middleware_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut config = AppConfig::default();
    config.routing.middleware = vec!["outer".into(), "inner".into()];

    let app = common::builder(config)
        .middleware("outer", common::recorder(log.clone(), "outer"))
        .middleware("inner", common::recorder(log.clone(), "inner"))
        .build()
        .unwrap();

    app.handle(common::request("GET", "/version")).await;
    assert_eq!(
        *log.lock().unwrap(),
        vec!["outer:before", "inner:before", "inner:after", "outer:after"]
    );

    // Global middleware also wraps requests that match nothing.
    log.lock().unwrap().clear();
    let response = app.handle(common::request("GET", "/missing")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(log.lock().unwrap().len(), 4);
}

#[test]
fn test_unknown_global_middleware_fails_boot() {
    let mut config = AppConfig::default();
    config.routing.middleware = vec!["cors".into()];
    assert!(common::builder(config).build().is_err());
}

#[tokio::test]
async fn test_custom_fallback() {
    let app = common::builder(AppConfig::default())
        .fallback(|_request: Request<Body>, outcome: MatchOutcome| async move {
            let kind = if outcome.is_method_not_allowed() { "wrong method" } else { "missing" };
            (StatusCode::IM_A_TEAPOT, kind).into_response()
        })
        .build()
        .unwrap();

    let response = app.handle(common::request("GET", "/missing")).await;
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(common::body_text(response).await, "missing");

    let response = app.handle(common::request("DELETE", "/version")).await;
    assert_eq!(common::body_text(response).await, "wrong method");
}

#[test]
fn test_url_generation() {
    let app = common::app();
    let urls = app.urls();
    assert_eq!(
        urls.path("article", [("slug", "hello-world")]).unwrap(),
        "/article/hello-world"
    );
    assert_eq!(
        urls.url("items.show", [("id", "12")], true).unwrap(),
        "http://localhost:8080/items/12"
    );
    assert_eq!(
        urls.path("admin.dashboard", [("", ""); 0]).unwrap(),
        "/admin/dashboard"
    );
}
