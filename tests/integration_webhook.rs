mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::util::ServiceExt;

use lectern::router::init_router;

fn webhook_payload() -> String {
    json!({
        "id": "evt_router_test",
        "object": "event",
        "type": "product.created",
        "created": chrono::Utc::now().timestamp(),
        "livemode": false,
        "data": { "object": {} }
    })
    .to_string()
}

#[tokio::test]
async fn test_webhook_without_signature_is_rejected() {
    let app = init_router(common::test_state());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/stripe/webhook")
                .header("content-type", "application/json")
                .body(Body::from(webhook_payload()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(
        body["detail"]
            .as_str()
            .unwrap()
            .contains("Missing Stripe-Signature")
    );
}

#[tokio::test]
async fn test_webhook_with_bad_signature_is_rejected() {
    let app = init_router(common::test_state());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/stripe/webhook")
                .header("content-type", "application/json")
                .header("stripe-signature", "t=0,v1=deadbeef")
                .body(Body::from(webhook_payload()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_verified_webhook_is_fast_acked() {
    let app = init_router(common::test_state());

    // An event type outside the dispatch table: accepted on the request
    // path, recorded as skipped by the consumer
    let payload = webhook_payload();
    let signature = common::stripe_signature_header(&payload, common::TEST_WEBHOOK_SECRET);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/stripe/webhook")
                .header("content-type", "application/json")
                .header("stripe-signature", signature)
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["event_id"], "evt_router_test");
}

#[tokio::test]
async fn test_webhook_config_diagnostic() {
    let app = init_router(common::test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/stripe/webhook-config")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["webhook_configured"], true);
    assert_eq!(body["publishable_key"], "pk_test_dummy");
}

#[tokio::test]
async fn test_health_check() {
    let app = init_router(common::test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health-check")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let app = init_router(common::test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/user/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_garbage_token() {
    let app = init_router(common::test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/user/me")
                .header("authorization", "Bearer not.a.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
