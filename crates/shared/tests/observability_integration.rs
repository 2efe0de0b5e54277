//! 可观测性中间件集成测试
//!
//! 通过真实的 axum Router 验证请求 ID 注入与请求追踪中间件的组合行为。

use axum::{
    Router,
    body::Body,
    extract::Extension,
    http::{Request, StatusCode},
    middleware,
    routing::get,
};
use pollpeak_shared::observability::middleware::{RequestId, http_tracing, request_id};
use tower::ServiceExt;

fn app() -> Router {
    Router::new()
        .route(
            "/echo/{id}",
            get(|Extension(rid): Extension<RequestId>| async move { rid.0 }),
        )
        .layer(middleware::from_fn(http_tracing))
        .layer(middleware::from_fn(request_id))
}

#[tokio::test]
async fn test_request_id_is_generated_when_missing() {
    let response = app()
        .oneshot(Request::get("/echo/1").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let header = response
        .headers()
        .get("x-request-id")
        .expect("x-request-id header should be set")
        .to_str()
        .unwrap();
    assert_eq!(header.len(), 36, "generated id should be a UUID");
}

#[tokio::test]
async fn test_request_id_is_propagated_from_upstream() {
    let response = app()
        .oneshot(
            Request::get("/echo/2")
                .header("x-request-id", "upstream-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "upstream-42"
    );
}

#[tokio::test]
async fn test_unmatched_route_still_traced() {
    let response = app()
        .oneshot(Request::get("/missing").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().contains_key("x-request-id"));
}
