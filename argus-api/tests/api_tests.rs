/// HTTP-level tests that never reach the database
///
/// The router runs over a lazy pool pointing at a closed port, so anything
/// that does touch the database fails fast with a 500.

mod common;

use axum::{body::Body, http::StatusCode};
use common::{send, send_raw, test_config, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_anonymous_request_is_unauthorized() {
    let t = TestApp::new().await;
    let (status, body) = send(&t.app, "GET", "/v1/tasks", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "Unauthorized");
    assert_eq!(body["description"], "Authentication required");
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_invalid_token_is_treated_as_anonymous() {
    let t = TestApp::new().await;
    let (status, _) = send(&t.app, "GET", "/v1/users/1", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_role_is_forbidden_outside_its_grants() {
    let t = TestApp::new().await;
    let token = t.token(5, "user");

    let (status, body) = send(&t.app, "DELETE", "/v1/tasks/1", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], "Forbidden");
    assert_eq!(
        body["custom_message"],
        "You do not have permission to DELETE /v1/tasks/"
    );

    let (status, _) = send(&t.app, "GET", "/v1/salaries", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&t.app, "POST", "/v1/attendance", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_role_is_forbidden() {
    let t = TestApp::new().await;
    let token = t.token(5, "contractor");
    let (status, _) = send(&t.app, "GET", "/v1/tasks", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_token_in_query_string() {
    let t = TestApp::new().await;
    let token = t.token(1, "admin");
    let uri = format!("/v1/tasks/abc?token={}", token);
    let (status, body) = send(&t.app, "GET", &uri, None, None).await;

    // passes the guard, then fails on the id
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["custom_message"], "Invalid task ID format");
}

#[tokio::test]
async fn test_invalid_path_ids() {
    let t = TestApp::new().await;
    let token = t.token(1, "super_admin");

    for (uri, message) in [
        ("/v1/users/abc", "Invalid user ID format"),
        ("/v1/tasks/0", "Invalid task ID format"),
        ("/v1/attendance/-4", "Invalid attendance ID format"),
        ("/v1/salaries/1.5", "Invalid salary ID format"),
        ("/v1/bonuses/x", "Invalid bonus ID format"),
        ("/v1/files/%20", "Invalid file ID format"),
    ] {
        let (status, body) = send(&t.app, "GET", uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["custom_message"], message, "{}", uri);
    }
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let t = TestApp::new().await;
    let token = t.token(1, "admin");

    let (status, _, body) = send_raw(
        &t.app,
        "POST",
        "/v1/tasks",
        Some(&token),
        Some("application/json"),
        Body::from("{\"title\": "),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "Bad Request");
    assert_eq!(body["description"], "Invalid request data");
}

#[tokio::test]
async fn test_missing_required_fields_are_named() {
    let t = TestApp::new().await;
    let token = t.token(1, "admin");

    let (status, body) = send(
        &t.app,
        "POST",
        "/v1/tasks",
        Some(&token),
        Some(json!({"admin_id": 1, "status": "pending", "priority": "high"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["custom_message"], "Missing or invalid required fields: title");

    let (status, body) = send(&t.app, "POST", "/v1/tasks", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["custom_message"],
        "Missing or invalid required fields: admin_id, priority, status, title"
    );
}

#[tokio::test]
async fn test_user_contact_formats_checked_before_insert() {
    let t = TestApp::new().await;
    let token = t.token(1, "admin");
    let (status, body) = send(
        &t.app,
        "POST",
        "/v1/users",
        Some(&token),
        Some(json!({
            "first_name": "Ann",
            "last_name": "Lee",
            "role": "user",
            "email": "ann@example.com",
            "phone": "+1 555 0100",
            "password": "secret-pass",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["custom_message"],
        "Invalid phone number format, expected +998XXXXXXXXX"
    );
}

#[tokio::test]
async fn test_malformed_list_filters() {
    let t = TestApp::new().await;
    let token = t.token(1, "admin");

    let (status, body) =
        send(&t.app, "GET", "/v1/attendance?date=2025/01/01", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["custom_message"], "Invalid date format. Use YYYY-MM-DD");

    let (status, _) = send(&t.app, "GET", "/v1/tasks?status=done", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&t.app, "GET", "/v1/bonuses?user_id=me", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_auth_routes_are_public() {
    let t = TestApp::new().await;
    let (status, body) = send(
        &t.app,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({"email": "a@b.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["custom_message"], "Missing or invalid required fields: password");

    let (status, _) = send(
        &t.app,
        "POST",
        "/v1/auth/refresh",
        None,
        Some(json!({"refresh_token": "garbage"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rejects_access_tokens() {
    let t = TestApp::new().await;
    let access = t.token(1, "admin");
    let (status, body) = send(
        &t.app,
        "POST",
        "/v1/auth/refresh",
        None,
        Some(json!({"refresh_token": access})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["custom_message"], "Invalid or expired refresh token");
}

#[tokio::test]
async fn test_health_reports_database_down() {
    let t = TestApp::new().await;
    let (status, headers, body) =
        send_raw(&t.app, "GET", "/health", None, None, Body::empty()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["data"]["status"], "degraded");
    assert_eq!(body["data"]["database"], "disconnected");
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let t = TestApp::new().await;
    let response = {
        use tower::ServiceExt;
        t.app
            .clone()
            .oneshot(
                axum::http::Request::builder()
                    .uri("/v1/tasks")
                    .header("x-request-id", "req-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    };
    assert_eq!(response.headers()["x-request-id"], "req-123");
}

#[tokio::test]
async fn test_internal_error_details_follow_config() {
    let t = TestApp::new().await;
    let token = t.token(1, "admin");
    let (status, body) = send(&t.app, "GET", "/v1/tasks/7", Some(&token), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["custom_message"], "Internal server error");
    assert!(body["data"].is_string());

    let t = TestApp::with_config(test_config(&[("ENVIRONMENT", "production")])).await;
    let token = t.token(1, "admin");
    let (status, body) = send(&t.app, "GET", "/v1/tasks/7", Some(&token), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "Internal Server Error");
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let t = TestApp::new().await;
    let (status, _) = send(&t.app, "GET", "/v1/payroll", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
