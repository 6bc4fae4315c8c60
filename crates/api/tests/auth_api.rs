//! Authentication, role-enforcement, and input-validation tests against
//! the real router.
//!
//! These requests are all rejected before any database query runs (the
//! pool is lazy), so the tests exercise the extractor and guard stack
//! without external services.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use common::{build_test_app, mint_token};

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let app = build_test_app();
    let response = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = build_test_app();
    let response = app
        .oneshot(get("/api/v1/applies/mine", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let app = build_test_app();
    let response = app
        .oneshot(get("/api/v1/applies/mine", Some("not-a-jwt")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn merchant_cannot_read_admin_review_queue() {
    let app = build_test_app();
    let token = mint_token(10, "MERCHANT", Some(7));
    let response = app
        .oneshot(get("/api/v1/applies/pending", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "FORBIDDEN");
}

#[tokio::test]
async fn admin_cannot_submit_applications() {
    // Roles are exact: reviewing and editing are different hats.
    let app = build_test_app();
    let token = mint_token(1, "ADMIN", None);
    let body = serde_json::json!({ "area_id": 1, "reason": "need retail space" });
    let response = app
        .oneshot(post_json("/api/v1/applies", Some(&token), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn plain_user_is_rejected_from_both_sides() {
    let app = build_test_app();
    let token = mint_token(99, "USER", None);

    let response = build_test_app()
        .oneshot(get("/api/v1/applies/pending", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = serde_json::json!({ "area_id": 1, "reason": "please" });
    let response = app
        .oneshot(post_json("/api/v1/applies", Some(&token), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn empty_application_reason_is_rejected() {
    let app = build_test_app();
    let token = mint_token(10, "MERCHANT", Some(7));
    let body = serde_json::json!({ "area_id": 1, "reason": "   " });
    let response = app
        .oneshot(post_json("/api/v1/applies", Some(&token), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn empty_rejection_reason_is_rejected() {
    let app = build_test_app();
    let token = mint_token(1, "ADMIN", None);
    let body = serde_json::json!({ "reason": "" });
    let response = app
        .oneshot(post_json("/api/v1/applies/1/reject", Some(&token), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_revoke_reason_is_rejected() {
    let app = build_test_app();
    let token = mint_token(1, "ADMIN", None);
    let body = serde_json::json!({ "reason": "" });
    let response = app
        .oneshot(post_json("/api/v1/permissions/1/revoke", Some(&token), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_proposal_changes_are_rejected() {
    let app = build_test_app();
    let token = mint_token(10, "MERCHANT", Some(7));
    let body = serde_json::json!({ "area_id": 1, "changes": {} });
    let response = app
        .oneshot(post_json("/api/v1/proposals", Some(&token), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_draft_proposal_list_is_rejected() {
    let app = build_test_app();
    let token = mint_token(1, "ADMIN", None);
    let body = serde_json::json!({ "proposal_ids": [] });
    let response = app
        .oneshot(post_json("/api/v1/malls/1/versions", Some(&token), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
