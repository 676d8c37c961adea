mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;
use tower::ServiceExt;

use tapak_auth::PolicyTable;
use common::{app_with, body_json, identity, token_for};

fn me(authorization: Option<&str>, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri("/api/auth/me");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    if let Some(value) = cookie {
        builder = builder.header(header::COOKIE, value);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_missing_credentials_is_unauthorized() {
    let app = app_with(vec![], PolicyTable::with_defaults());

    let response = app.oneshot(me(None, None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["code"], 401);
    assert_eq!(body["message"], "Unauthorized");
}

#[tokio::test]
async fn test_malformed_authorization_header() {
    let user = identity(Some("user"), true);
    let token = token_for(&user);

    for value in [
        format!("Token {token}"),
        format!("Bearer {token} extra"),
        format!("bearer {token}"),
        "Bearer".to_string(),
    ] {
        let app = app_with(vec![user.clone()], PolicyTable::with_defaults());
        let response = app.oneshot(me(Some(&value), None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{value}");
        let body = body_json(response).await;
        assert_eq!(body["message"], "Invalid token format", "{value}");
    }
}

#[tokio::test]
async fn test_malformed_header_not_rescued_by_valid_cookie() {
    let user = identity(Some("user"), true);
    let token = token_for(&user);
    let cookie = format!("access_token={token}");

    for value in [
        "Token x".to_string(),
        "Bearer a b".to_string(),
        "Bearer".to_string(),
        format!("Basic {token}"),
    ] {
        let app = app_with(vec![user.clone()], PolicyTable::with_defaults());
        let response = app.oneshot(me(Some(&value), Some(&cookie))).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{value}");
        let body = body_json(response).await;
        assert_eq!(body["message"], "Invalid token format", "{value}");
    }
}

#[tokio::test]
async fn test_bearer_token_resolves_identity() {
    let user = identity(Some("manager"), true);
    let token = token_for(&user);
    let app = app_with(vec![user.clone()], PolicyTable::with_defaults());

    let request = Request::builder()
        .method("GET")
        .uri("/api/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header("x-request-id", "req-me-1")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["user_id"], user.id.to_string());
    assert_eq!(body["data"]["email"], user.email);
    assert_eq!(body["data"]["role"], "manager");
    assert_eq!(body["data"]["request_id"], "req-me-1");
}

#[tokio::test]
async fn test_cookie_used_when_header_absent() {
    let user = identity(Some("user"), true);
    let token = token_for(&user);
    let app = app_with(vec![user.clone()], PolicyTable::with_defaults());

    let cookie = format!("access_token={token}");
    let response = app.oneshot(me(None, Some(&cookie))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], user.email);
}

#[tokio::test]
async fn test_header_takes_precedence_over_cookie() {
    let user = identity(Some("user"), true);
    let token = token_for(&user);
    let cookie = format!("access_token={token}");

    // A bad header is never rescued by a good cookie.
    let app = app_with(vec![user.clone()], PolicyTable::with_defaults());
    let response = app
        .oneshot(me(Some("Bearer not-a-jwt"), Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let app = app_with(vec![user.clone()], PolicyTable::with_defaults());
    let response = app
        .oneshot(me(Some(&format!("Bearer {token}")), Some("access_token=garbage")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_inactive_and_unknown_users_are_rejected() {
    let inactive = identity(Some("admin"), false);
    let unknown = identity(Some("admin"), true);

    for user in [&inactive, &unknown] {
        let app = app_with(vec![inactive.clone()], PolicyTable::with_defaults());
        let bearer = format!("Bearer {}", token_for(user));
        let response = app.oneshot(me(Some(&bearer), None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Unauthorized");
    }
}

#[tokio::test]
async fn test_login_missing_password_reports_field() {
    let app = app_with(vec![], PolicyTable::with_defaults());

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "email": "budi@example.com" }).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Validasi gagal");
    assert_eq!(body["errors"][0]["field"], "password");
    assert_eq!(body["errors"][0]["message"], "password wajib diisi");
}

#[tokio::test]
async fn test_refresh_without_token_is_unauthorized() {
    let app = app_with(vec![], PolicyTable::with_defaults());

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/refresh")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Refresh token is required");
}

#[tokio::test]
async fn test_logout_clears_both_cookies() {
    let app = app_with(vec![], PolicyTable::with_defaults());

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .header(header::COOKIE, "access_token=a; refresh_token=b")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();

    for name in ["access_token=", "refresh_token="] {
        let cleared = cookies
            .iter()
            .find(|c| c.starts_with(name))
            .unwrap_or_else(|| panic!("{name} not cleared: {cookies:?}"));
        assert!(cleared.contains("Max-Age=0"), "{cleared}");
        assert!(cleared.contains("HttpOnly"), "{cleared}");
    }
}
