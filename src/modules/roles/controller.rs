use anyhow::anyhow;
use axum::extract::{Path, State};
use tracing::instrument;

use tapak_core::{Action, ApiResponse, AppError, ErrorResponse, Permission, Resource, Role};
use tapak_models::{GrantPermissionDto, RoleWithPermissions};

use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::RoleService;

fn parse_segment<T>(raw: &str) -> Result<T, AppError>
where
    T: std::str::FromStr<Err = tapak_core::permissions::ParseVocabularyError>,
{
    raw.parse().map_err(AppError::bad_request)
}

#[utoipa::path(
    get,
    path = "/api/roles",
    responses(
        (status = 200, description = "Roles with their permissions", body = [RoleWithPermissions]),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - requires roles:read", body = ErrorResponse)
    ),
    tag = "Roles",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_roles(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<RoleWithPermissions>>, AppError> {
    let roles = RoleService::list_roles(&state.db).await?;
    Ok(ApiResponse::ok("Roles retrieved successfully", roles))
}

#[utoipa::path(
    post,
    path = "/api/roles/{role}/permissions",
    params(("role" = String, Path, description = "Role name: admin, manager or user")),
    request_body = GrantPermissionDto,
    responses(
        (status = 200, description = "Permission granted", body = RoleWithPermissions),
        (status = 400, description = "Unknown role or invalid permission", body = ErrorResponse),
        (status = 403, description = "Forbidden - requires roles:update", body = ErrorResponse)
    ),
    tag = "Roles",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn grant_permission(
    State(state): State<AppState>,
    Path(role): Path<String>,
    ValidatedJson(dto): ValidatedJson<GrantPermissionDto>,
) -> Result<ApiResponse<RoleWithPermissions>, AppError> {
    let role: Role = parse_segment(&role)?;
    let permission = dto
        .permission()
        .ok_or_else(|| AppError::bad_request(anyhow!("Invalid permission")))?;

    let role = RoleService::grant(&state.db, role, permission).await?;
    Ok(ApiResponse::ok("Permission granted", role))
}

#[utoipa::path(
    delete,
    path = "/api/roles/{role}/permissions/{resource}/{action}",
    params(
        ("role" = String, Path, description = "Role name"),
        ("resource" = String, Path, description = "Resource name"),
        ("action" = String, Path, description = "Action name")
    ),
    responses(
        (status = 200, description = "Permission revoked", body = RoleWithPermissions),
        (status = 400, description = "Unknown role, resource or action", body = ErrorResponse),
        (status = 404, description = "Grant does not exist", body = ErrorResponse)
    ),
    tag = "Roles",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn revoke_permission(
    State(state): State<AppState>,
    Path((role, resource, action)): Path<(String, String, String)>,
) -> Result<ApiResponse<RoleWithPermissions>, AppError> {
    let role: Role = parse_segment(&role)?;
    let resource: Resource = parse_segment(&resource)?;
    let action: Action = parse_segment(&action)?;

    let role = RoleService::revoke(&state.db, role, Permission::new(resource, action)).await?;
    Ok(ApiResponse::ok("Permission revoked", role))
}
