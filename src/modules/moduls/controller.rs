use axum::extract::{Path, Query, State};
use tracing::instrument;

use tapak_core::{ApiResponse, AppError, ErrorResponse, PaginationParams};
use tapak_models::{CreateModulDto, Modul, ModulId, ProjectId, UpdateModulDto};

use crate::state::AppState;
use crate::validator::{ValidatedJson, parse_id};

use super::service::ModulService;

fn parse_ids(project_id: &str, modul_id: &str) -> Result<(ProjectId, ModulId), AppError> {
    Ok((parse_id(project_id, "project")?, parse_id(modul_id, "modul")?))
}

#[utoipa::path(
    get,
    path = "/api/projects/{project_id}/moduls",
    params(("project_id" = String, Path, description = "Project ID"), PaginationParams),
    responses(
        (status = 200, description = "Paginated moduls of the project", body = [Modul]),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "Moduls",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_moduls(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Query(pagination): Query<PaginationParams>,
) -> Result<ApiResponse<Vec<Modul>>, AppError> {
    let project_id: ProjectId = parse_id(&project_id, "project")?;
    let (moduls, meta) = ModulService::get_moduls(&state.db, project_id, pagination).await?;
    Ok(ApiResponse::paginated("Moduls retrieved successfully", moduls, meta))
}

#[utoipa::path(
    get,
    path = "/api/projects/{project_id}/moduls/{id}",
    params(
        ("project_id" = String, Path, description = "Project ID"),
        ("id" = String, Path, description = "Modul ID")
    ),
    responses(
        (status = 200, description = "Modul details", body = Modul),
        (status = 404, description = "Modul not found", body = ErrorResponse)
    ),
    tag = "Moduls",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_modul(
    State(state): State<AppState>,
    Path((project_id, id)): Path<(String, String)>,
) -> Result<ApiResponse<Modul>, AppError> {
    let (project_id, id) = parse_ids(&project_id, &id)?;
    let modul = ModulService::get_modul(&state.db, project_id, id).await?;
    Ok(ApiResponse::ok("Modul retrieved successfully", modul))
}

#[utoipa::path(
    post,
    path = "/api/projects/{project_id}/moduls",
    params(("project_id" = String, Path, description = "Project ID")),
    request_body = CreateModulDto,
    responses(
        (status = 201, description = "Modul created", body = Modul),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse),
        (status = 409, description = "Modul name already used in this project", body = ErrorResponse)
    ),
    tag = "Moduls",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_modul(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    ValidatedJson(dto): ValidatedJson<CreateModulDto>,
) -> Result<ApiResponse<Modul>, AppError> {
    let project_id: ProjectId = parse_id(&project_id, "project")?;
    let modul = ModulService::create_modul(&state.db, project_id, dto).await?;
    Ok(ApiResponse::created("Modul created successfully", modul))
}

#[utoipa::path(
    put,
    path = "/api/projects/{project_id}/moduls/{id}",
    params(
        ("project_id" = String, Path, description = "Project ID"),
        ("id" = String, Path, description = "Modul ID")
    ),
    request_body = UpdateModulDto,
    responses(
        (status = 200, description = "Modul updated", body = Modul),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Modul not found", body = ErrorResponse),
        (status = 409, description = "Modul name already used in this project", body = ErrorResponse)
    ),
    tag = "Moduls",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_modul(
    State(state): State<AppState>,
    Path((project_id, id)): Path<(String, String)>,
    ValidatedJson(dto): ValidatedJson<UpdateModulDto>,
) -> Result<ApiResponse<Modul>, AppError> {
    let (project_id, id) = parse_ids(&project_id, &id)?;
    let modul = ModulService::update_modul(&state.db, project_id, id, dto).await?;
    Ok(ApiResponse::ok("Modul updated successfully", modul))
}

#[utoipa::path(
    delete,
    path = "/api/projects/{project_id}/moduls/{id}",
    params(
        ("project_id" = String, Path, description = "Project ID"),
        ("id" = String, Path, description = "Modul ID")
    ),
    responses(
        (status = 200, description = "Modul deleted"),
        (status = 404, description = "Modul not found", body = ErrorResponse)
    ),
    tag = "Moduls",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_modul(
    State(state): State<AppState>,
    Path((project_id, id)): Path<(String, String)>,
) -> Result<ApiResponse<()>, AppError> {
    let (project_id, id) = parse_ids(&project_id, &id)?;
    ModulService::delete_modul(&state.db, project_id, id).await?;
    Ok(ApiResponse::message("Modul deleted successfully"))
}
