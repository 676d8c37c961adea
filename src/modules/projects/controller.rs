use axum::extract::{Path, Query, State};
use tracing::instrument;

use tapak_core::{ApiResponse, AppError, ErrorResponse};
use tapak_models::{
    CreateProjectDto, Project, ProjectFilterParams, ProjectId, ProjectWithStats, UpdateProjectDto,
};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::{ValidatedJson, parse_id};

use super::service::ProjectService;

#[utoipa::path(
    get,
    path = "/api/projects",
    params(ProjectFilterParams),
    responses(
        (status = 200, description = "Paginated list of projects", body = [ProjectWithStats]),
        (status = 400, description = "Invalid status filter", body = ErrorResponse),
        (status = 403, description = "Forbidden - requires projects:read", body = ErrorResponse)
    ),
    tag = "Projects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_projects(
    State(state): State<AppState>,
    Query(filters): Query<ProjectFilterParams>,
) -> Result<ApiResponse<Vec<ProjectWithStats>>, AppError> {
    let (projects, meta) = ProjectService::get_projects(&state.db, filters).await?;
    Ok(ApiResponse::paginated("Projects retrieved successfully", projects, meta))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(("id" = String, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project with its module count", body = ProjectWithStats),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "Projects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<ProjectWithStats>, AppError> {
    let id: ProjectId = parse_id(&id, "project")?;
    let project = ProjectService::get_project(&state.db, id).await?;
    Ok(ApiResponse::ok("Project retrieved successfully", project))
}

#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = CreateProjectDto,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 409, description = "Project name already used", body = ErrorResponse)
    ),
    tag = "Projects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_project(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateProjectDto>,
) -> Result<ApiResponse<Project>, AppError> {
    let project = ProjectService::create_project(&state.db, auth_user.user_id(), dto).await?;
    Ok(ApiResponse::created("Project created successfully", project))
}

#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    params(("id" = String, Path, description = "Project ID")),
    request_body = UpdateProjectDto,
    responses(
        (status = 200, description = "Project updated", body = Project),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse),
        (status = 409, description = "Project name already used", body = ErrorResponse)
    ),
    tag = "Projects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(dto): ValidatedJson<UpdateProjectDto>,
) -> Result<ApiResponse<Project>, AppError> {
    let id: ProjectId = parse_id(&id, "project")?;
    let project = ProjectService::update_project(&state.db, id, dto).await?;
    Ok(ApiResponse::ok("Project updated successfully", project))
}

#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    params(("id" = String, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project and its modules deleted"),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "Projects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, AppError> {
    let id: ProjectId = parse_id(&id, "project")?;
    ProjectService::delete_project(&state.db, id).await?;
    Ok(ApiResponse::message("Project deleted successfully"))
}
