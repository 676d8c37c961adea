//! Resumable upload endpoints.
//!
//! Protocol-level checks (`Tus-Resumable`, `OPTIONS`) happen in the TUS
//! middleware before these handlers run. The handlers validate the
//! per-request headers and delegate to [`UploadService`].

use anyhow::anyhow;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use tapak_core::{ApiResponse, AppError, ErrorResponse, PaginationParams};
use tapak_models::{Upload, UploadId, UploadMetadata};

use crate::middleware::auth::AuthUser;
use crate::middleware::tus::{
    OFFSET_OCTET_STREAM, UPLOAD_LENGTH, UPLOAD_METADATA, UPLOAD_OFFSET, capabilities,
};
use crate::state::AppState;
use crate::validator::parse_id;

use super::service::UploadService;

/// A non-negative integer header. Missing or malformed values are 400.
fn required_number(headers: &HeaderMap, name: &header::HeaderName) -> Result<i64, AppError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|n| *n >= 0)
        .ok_or_else(|| AppError::bad_request(anyhow!("{} header must be a non-negative integer", name)))
}

fn is_offset_octet_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case(OFFSET_OCTET_STREAM))
}

fn offset_header(offset: i64) -> (header::HeaderName, HeaderValue) {
    (UPLOAD_OFFSET, HeaderValue::from(offset))
}

#[utoipa::path(
    post,
    path = "/api/uploads",
    params(
        ("Upload-Length" = u64, Header, description = "Total size of the upload in bytes"),
        ("Upload-Metadata" = Option<String>, Header, description = "Comma separated `key base64value` pairs")
    ),
    responses(
        (status = 201, description = "Session created; Location and Upload-Offset headers set", body = Upload),
        (status = 400, description = "Missing or invalid Upload-Length or Upload-Metadata", body = ErrorResponse),
        (status = 412, description = "Unsupported Tus-Resumable version", body = ErrorResponse),
        (status = 413, description = "Upload-Length exceeds Tus-Max-Size", body = ErrorResponse)
    ),
    tag = "Uploads",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, headers))]
pub async fn create_upload(
    State(state): State<AppState>,
    auth_user: AuthUser,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let length = required_number(&headers, &UPLOAD_LENGTH)?;
    if length as u64 > state.tus_config.max_size {
        return Err(AppError::payload_too_large(anyhow!(
            "Upload-Length exceeds the maximum of {} bytes",
            state.tus_config.max_size
        )));
    }

    let metadata = match headers.get(&UPLOAD_METADATA) {
        Some(raw) => {
            let raw = raw
                .to_str()
                .map_err(|_| AppError::bad_request(anyhow!("Upload-Metadata is not valid text")))?;
            UploadMetadata::parse(raw).map_err(AppError::bad_request)?
        }
        None => UploadMetadata::default(),
    };

    let upload = UploadService::create_upload(
        &state.db,
        state.storage.as_ref(),
        auth_user.user_id(),
        length,
        metadata,
    )
    .await?;

    let location = HeaderValue::from_str(&format!("/api/uploads/{}", upload.id))
        .map_err(|e| AppError::internal(anyhow!("Invalid Location header: {e}")))?;

    Ok((
        [(header::LOCATION, location), offset_header(0)],
        ApiResponse::created("Upload created", upload),
    )
        .into_response())
}

#[utoipa::path(
    head,
    path = "/api/uploads/{id}",
    params(("id" = String, Path, description = "Upload ID")),
    responses(
        (status = 200, description = "Upload-Offset and Upload-Length headers"),
        (status = 404, description = "Upload not found"),
        (status = 412, description = "Missing or unsupported Tus-Resumable")
    ),
    tag = "Uploads",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn upload_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id: UploadId = parse_id(&id, "upload")?;
    let upload = UploadService::get_upload(&state.db, auth_user.user_id(), id).await?;

    Ok((
        StatusCode::OK,
        [
            offset_header(upload.upload_offset),
            (UPLOAD_LENGTH, HeaderValue::from(upload.upload_length)),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
    )
        .into_response())
}

#[utoipa::path(
    patch,
    path = "/api/uploads/{id}",
    params(
        ("id" = String, Path, description = "Upload ID"),
        ("Upload-Offset" = u64, Header, description = "Offset the chunk starts at")
    ),
    request_body(content = Vec<u8>, content_type = "application/offset+octet-stream"),
    responses(
        (status = 204, description = "Chunk stored; new Upload-Offset header"),
        (status = 400, description = "Missing or invalid Upload-Offset", body = ErrorResponse),
        (status = 404, description = "Upload not found", body = ErrorResponse),
        (status = 409, description = "Upload-Offset does not match", body = ErrorResponse),
        (status = 413, description = "Chunk exceeds Upload-Length", body = ErrorResponse),
        (status = 415, description = "Wrong Content-Type", body = ErrorResponse)
    ),
    tag = "Uploads",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, headers, body), fields(chunk_len = body.len()))]
pub async fn upload_chunk(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    if !is_offset_octet_stream(&headers) {
        return Err(AppError::unsupported_media_type(anyhow!(
            "Content-Type must be {}",
            OFFSET_OCTET_STREAM
        )));
    }

    let id: UploadId = parse_id(&id, "upload")?;
    let offset = required_number(&headers, &UPLOAD_OFFSET)?;

    let new_offset = UploadService::append_chunk(
        &state.db,
        state.storage.as_ref(),
        auth_user.user_id(),
        id,
        offset,
        &body,
    )
    .await?;

    Ok((StatusCode::NO_CONTENT, [offset_header(new_offset)]).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/uploads/{id}",
    params(("id" = String, Path, description = "Upload ID")),
    responses(
        (status = 204, description = "Upload terminated"),
        (status = 404, description = "Upload not found", body = ErrorResponse),
        (status = 412, description = "Missing or unsupported Tus-Resumable", body = ErrorResponse)
    ),
    tag = "Uploads",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_upload(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: UploadId = parse_id(&id, "upload")?;
    UploadService::delete_upload(&state.db, state.storage.as_ref(), auth_user.user_id(), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/uploads",
    params(PaginationParams),
    responses(
        (status = 200, description = "The caller's upload sessions", body = [Upload]),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Uploads",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_uploads(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<ApiResponse<Vec<Upload>>, AppError> {
    let (uploads, meta) =
        UploadService::get_uploads(&state.db, auth_user.user_id(), pagination).await?;
    Ok(ApiResponse::paginated("Uploads retrieved successfully", uploads, meta))
}

/// Server capabilities. Normally answered by the TUS middleware first.
#[utoipa::path(
    options,
    path = "/api/uploads",
    responses(
        (status = 204, description = "Tus-Resumable, Tus-Version, Tus-Extension and Tus-Max-Size headers")
    ),
    tag = "Uploads",
    security(("bearer_auth" = []))
)]
pub async fn upload_options(State(state): State<AppState>) -> Response {
    capabilities(&state.tus_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_required_number() {
        assert_eq!(required_number(&headers(&[("upload-length", "42")]), &UPLOAD_LENGTH).unwrap(), 42);

        for bad in [&[][..], &[("upload-length", "abc")][..], &[("upload-length", "-1")][..]] {
            let err = required_number(&headers(bad), &UPLOAD_LENGTH).unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_content_type_check() {
        assert!(is_offset_octet_stream(&headers(&[(
            "content-type",
            "application/offset+octet-stream"
        )])));
        assert!(is_offset_octet_stream(&headers(&[(
            "content-type",
            "Application/Offset+Octet-Stream; charset=binary"
        )])));
        assert!(!is_offset_octet_stream(&headers(&[("content-type", "application/json")])));
        assert!(!is_offset_octet_stream(&HeaderMap::new()));
    }
}
