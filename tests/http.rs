use std::{sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use sqlx::postgres::PgPoolOptions;
use storefront_api::{
    app::build_app, cache::CatalogCache, cart::InMemoryCartStore, config::CheckoutSettings,
    state::AppState,
};
use tower::ServiceExt;

// The pool never connects; these requests are answered before any query runs.
fn offline_state() -> AppState {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/storefront_unused")
        .expect("lazy pool");
    AppState::new(
        pool,
        Arc::new(InMemoryCartStore::new()),
        CatalogCache::new(Duration::from_secs(60)),
        CheckoutSettings::default(),
    )
}

#[tokio::test]
async fn health_is_served_with_request_id() {
    let app = build_app(offline_state());
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn unknown_paths_fall_back_to_not_found() {
    let app = build_app(offline_state());
    let response = app
        .oneshot(Request::get("/api/nowhere").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn commit_requires_bearer_token() {
    let app = build_app(offline_state());
    let request = Request::post("/api/orders/commit")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"address_id":"00000000-0000-0000-0000-000000000000","payment_method":"alipay","sku_ids":[]}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_bearer_scheme_is_rejected() {
    let app = build_app(offline_state());
    let request = Request::get("/api/cart")
        .header("authorization", "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
