//! Router tests that never reach the database: the pool connects lazily
//! and every request here is answered before a query is made.

use std::path::Path;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use timber_store::{app, AppState};

fn test_app() -> Router {
    let db = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/timber_store_unused")
        .unwrap();
    app(AppState::new(db), Path::new("media"))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap()
}

#[tokio::test]
async fn test_static_pages_render() {
    for uri in ["/about/", "/contact/", "/make-order/thank_you/"] {
        let response = test_app().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
    }
}

#[tokio::test]
async fn test_health_reports_cache_stats() {
    let response = test_app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["cache"]["sidebar_cached"], false);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = test_app().oneshot(get("/no-such-page/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error_type"], "not_found");
}

#[tokio::test]
async fn test_unknown_product_kind_is_not_found() {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(post("/add-to-cart/plywood/birch-10mm/"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(get("/products/plywood/birch-10mm/"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_make_order_requires_account() {
    let response = test_app().oneshot(post("/make-order/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_identity_header_is_rejected() {
    let request = Request::builder()
        .uri("/cart/")
        .header("x-user-id", "admin")
        .body(Body::empty())
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_cart_without_identity_is_empty_and_not_stored() {
    // the pool points at no database, so any insert would fail the request
    let response = test_app().oneshot(get("/cart/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-session-key").is_none());

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["id"], serde_json::Value::Null);
    assert_eq!(json["total_products"], 0);
}

#[tokio::test]
async fn test_malformed_quantity_is_rejected() {
    let request = Request::builder()
        .method("POST")
        .uri("/add-to-cart/brus/pine-100/")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"quantity": "five"}"#))
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error_type"], "validation");
}
