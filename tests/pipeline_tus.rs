mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use tapak_auth::PolicyTable;
use tapak_core::{Action, Resource, Role};
use tapak_models::UserIdentity;
use common::{TUS_VERSION, app_with, body_json, identity, token_for};

fn upload_request(method: &str, uri: &str, user: &UserIdentity) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(user)))
}

fn chunk_uri() -> String {
    format!("/api/uploads/{}", uuid::Uuid::new_v4())
}

#[tokio::test]
async fn test_options_advertises_capabilities() {
    let user = identity(Some("user"), true);

    for uri in ["/api/uploads".to_string(), chunk_uri()] {
        let app = app_with(vec![user.clone()], PolicyTable::with_defaults());
        let response = app
            .oneshot(upload_request("OPTIONS", &uri, &user).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT, "{uri}");
        let headers = response.headers();
        assert_eq!(headers["tus-resumable"], TUS_VERSION);
        assert_eq!(headers["tus-version"], TUS_VERSION);
        assert_eq!(headers["tus-extension"], "creation,termination");
        assert_eq!(headers["tus-max-size"], "1024");
    }
}

#[tokio::test]
async fn test_patch_without_version_header_is_precondition_failed() {
    let user = identity(Some("user"), true);
    let app = app_with(vec![user.clone()], PolicyTable::with_defaults());

    let request = upload_request("PATCH", &chunk_uri(), &user)
        .header(header::CONTENT_TYPE, "application/offset+octet-stream")
        .header("upload-offset", "0")
        .body(Body::from("hello"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    assert_eq!(response.headers()["tus-resumable"], TUS_VERSION);
    assert_eq!(response.headers()["tus-version"], TUS_VERSION);
    let body = body_json(response).await;
    assert_eq!(body["code"], 412);
}

#[tokio::test]
async fn test_unsupported_version_is_rejected_even_on_post() {
    let user = identity(Some("user"), true);
    let app = app_with(vec![user.clone()], PolicyTable::with_defaults());

    let request = upload_request("POST", "/api/uploads", &user)
        .header("tus-resumable", "0.2.2")
        .header("upload-length", "10")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn test_rbac_runs_before_tus() {
    let user = identity(Some("user"), true);
    let policy = PolicyTable::with_defaults().revoke(Role::User, Resource::Uploads, Action::Update);
    let app = app_with(vec![user.clone()], policy);

    // No Tus-Resumable either, but the permission check answers first.
    let request = upload_request("PATCH", &chunk_uri(), &user)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_auth_runs_before_tus() {
    let app = app_with(vec![], PolicyTable::with_defaults());

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/uploads")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_rejects_oversized_length() {
    let user = identity(Some("user"), true);
    let app = app_with(vec![user.clone()], PolicyTable::with_defaults());

    let request = upload_request("POST", "/api/uploads", &user)
        .header("tus-resumable", TUS_VERSION)
        .header("upload-length", "2048")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.headers()["tus-resumable"], TUS_VERSION);
}

#[tokio::test]
async fn test_create_requires_upload_length() {
    let user = identity(Some("user"), true);
    let app = app_with(vec![user.clone()], PolicyTable::with_defaults());

    let request = upload_request("POST", "/api/uploads", &user)
        .header("tus-resumable", TUS_VERSION)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_rejects_overlong_filename() {
    use base64::Engine;

    let user = identity(Some("user"), true);
    let app = app_with(vec![user.clone()], PolicyTable::with_defaults());

    let filename = base64::engine::general_purpose::STANDARD.encode("x".repeat(300));
    let request = upload_request("POST", "/api/uploads", &user)
        .header("tus-resumable", TUS_VERSION)
        .header("upload-length", "10")
        .header("upload-metadata", format!("filename {filename}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["message"],
        "Upload-Metadata value for 'filename' exceeds 255 characters"
    );
}

#[tokio::test]
async fn test_patch_requires_offset_content_type() {
    let user = identity(Some("user"), true);
    let app = app_with(vec![user.clone()], PolicyTable::with_defaults());

    let request = upload_request("PATCH", &chunk_uri(), &user)
        .header("tus-resumable", TUS_VERSION)
        .header(header::CONTENT_TYPE, "application/json")
        .header("upload-offset", "0")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}
