use anyhow::{Context, anyhow};
use sqlx::PgPool;
use tracing::instrument;

use tapak_core::pagination::calculate_pagination;
use tapak_core::{AppError, PaginationMeta};
use tapak_models::projects::{DEFAULT_PROJECT_STATUS, PROJECT_STATUSES};
use tapak_models::{
    CreateProjectDto, Project, ProjectFilterParams, ProjectId, ProjectWithStats, UpdateProjectDto,
    UserId,
};

const PROJECT_COLUMNS: &str =
    "p.id, p.name, p.description, p.status, p.created_by, p.created_at, p.updated_at";

fn map_unique_name(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        return AppError::conflict(anyhow!("A project with this name already exists"));
    }
    AppError::from(e)
}

pub struct ProjectService;

impl ProjectService {
    #[instrument(skip(db))]
    pub async fn get_projects(
        db: &PgPool,
        filters: ProjectFilterParams,
    ) -> Result<(Vec<ProjectWithStats>, PaginationMeta), AppError> {
        if let Some(status) = &filters.status
            && !PROJECT_STATUSES.contains(&status.as_str())
        {
            return Err(AppError::bad_request(anyhow!(
                "status must be one of: {}",
                PROJECT_STATUSES.join(", ")
            )));
        }

        let pagination = filters.pagination();
        let (page, limit) = pagination.normalized();
        let search = filters.search.map(|s| format!("%{s}%"));

        let total: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM projects p
               WHERE ($1::text IS NULL OR p.name ILIKE $1)
                 AND ($2::text IS NULL OR p.status = $2)"#,
        )
        .bind(&search)
        .bind(&filters.status)
        .fetch_one(db)
        .await
        .context("Failed to count projects")?;

        let projects = sqlx::query_as::<_, ProjectWithStats>(&format!(
            r#"SELECT {PROJECT_COLUMNS}, COUNT(m.id) AS modul_count
               FROM projects p
               LEFT JOIN moduls m ON m.project_id = p.id
               WHERE ($1::text IS NULL OR p.name ILIKE $1)
                 AND ($2::text IS NULL OR p.status = $2)
               GROUP BY p.id
               ORDER BY p.created_at DESC, p.id
               LIMIT $3 OFFSET $4"#
        ))
        .bind(&search)
        .bind(&filters.status)
        .bind(limit)
        .bind(pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch projects")?;

        Ok((projects, calculate_pagination(page, limit, total)))
    }

    #[instrument(skip(db))]
    pub async fn get_project(db: &PgPool, id: ProjectId) -> Result<ProjectWithStats, AppError> {
        sqlx::query_as::<_, ProjectWithStats>(&format!(
            r#"SELECT {PROJECT_COLUMNS}, COUNT(m.id) AS modul_count
               FROM projects p
               LEFT JOIN moduls m ON m.project_id = p.id
               WHERE p.id = $1
               GROUP BY p.id"#
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch project")?
        .ok_or_else(|| AppError::not_found(anyhow!("Project not found")))
    }

    /// 404 unless the project exists.
    #[instrument(skip(db))]
    pub async fn ensure_exists(db: &PgPool, id: ProjectId) -> Result<(), AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1)")
            .bind(id)
            .fetch_one(db)
            .await
            .context("Failed to check project")?;

        if exists {
            Ok(())
        } else {
            Err(AppError::not_found(anyhow!("Project not found")))
        }
    }

    #[instrument(skip(db, dto))]
    pub async fn create_project(
        db: &PgPool,
        created_by: UserId,
        dto: CreateProjectDto,
    ) -> Result<Project, AppError> {
        let project = sqlx::query_as::<_, Project>(
            r#"INSERT INTO projects (name, description, status, created_by)
               VALUES ($1, $2, $3, $4)
               RETURNING id, name, description, status, created_by, created_at, updated_at"#,
        )
        .bind(dto.name.trim())
        .bind(&dto.description)
        .bind(dto.status.as_deref().unwrap_or(DEFAULT_PROJECT_STATUS))
        .bind(created_by)
        .fetch_one(db)
        .await
        .map_err(map_unique_name)?;

        crate::audit_event!("create", "projects", project_id = %project.id, user_id = %created_by, "Project created");
        Ok(project)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_project(
        db: &PgPool,
        id: ProjectId,
        dto: UpdateProjectDto,
    ) -> Result<Project, AppError> {
        let project = sqlx::query_as::<_, Project>(
            r#"UPDATE projects SET
                   name = COALESCE($2, name),
                   description = COALESCE($3, description),
                   status = COALESCE($4, status),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING id, name, description, status, created_by, created_at, updated_at"#,
        )
        .bind(id)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(&dto.description)
        .bind(&dto.status)
        .fetch_optional(db)
        .await
        .map_err(map_unique_name)?
        .ok_or_else(|| AppError::not_found(anyhow!("Project not found")))?;

        crate::audit_event!("update", "projects", project_id = %project.id, "Project updated");
        Ok(project)
    }

    /// Deleting a project cascades to its moduls.
    #[instrument(skip(db))]
    pub async fn delete_project(db: &PgPool, id: ProjectId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete project")?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Project not found")));
        }

        crate::audit_event!("delete", "projects", project_id = %id, "Project deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    async fn owner(pool: &PgPool) -> UserId {
        sqlx::query_scalar(
            "INSERT INTO users (name, email, password) VALUES ('Owner', 'owner@example.com', 'x') RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap()
    }

    fn dto(name: &str, status: Option<&str>) -> CreateProjectDto {
        CreateProjectDto {
            name: name.to_string(),
            description: None,
            status: status.map(str::to_string),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_defaults_to_draft(pool: PgPool) {
        let user = owner(&pool).await;
        let project = ProjectService::create_project(&pool, user, dto("Portal", None))
            .await
            .unwrap();
        assert_eq!(project.status, "draft");
        assert_eq!(project.created_by, Some(user));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_name_conflicts(pool: PgPool) {
        let user = owner(&pool).await;
        ProjectService::create_project(&pool, user, dto("Portal", None))
            .await
            .unwrap();
        let err = ProjectService::create_project(&pool, user, dto("Portal", None))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_filter_by_status_and_count_moduls(pool: PgPool) {
        let user = owner(&pool).await;
        let active = ProjectService::create_project(&pool, user, dto("Aktif", Some("active")))
            .await
            .unwrap();
        ProjectService::create_project(&pool, user, dto("Arsip", Some("archived")))
            .await
            .unwrap();
        sqlx::query("INSERT INTO moduls (project_id, name) VALUES ($1, 'Login'), ($1, 'Laporan')")
            .bind(active.id)
            .execute(&pool)
            .await
            .unwrap();

        let filters = ProjectFilterParams {
            status: Some("active".to_string()),
            ..Default::default()
        };
        let (projects, meta) = ProjectService::get_projects(&pool, filters).await.unwrap();
        assert_eq!(meta.total_items, 1);
        assert_eq!(projects[0].project.id, active.id);
        assert_eq!(projects[0].modul_count, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_unknown_status_filter(pool: PgPool) {
        let filters = ProjectFilterParams {
            status: Some("deleted".to_string()),
            ..Default::default()
        };
        let err = ProjectService::get_projects(&pool, filters).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_and_delete(pool: PgPool) {
        let user = owner(&pool).await;
        let project = ProjectService::create_project(&pool, user, dto("Portal", None))
            .await
            .unwrap();

        let updated = ProjectService::update_project(
            &pool,
            project.id,
            UpdateProjectDto {
                status: Some("active".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.status, "active");
        assert_eq!(updated.name, "Portal");

        ProjectService::delete_project(&pool, project.id).await.unwrap();
        let err = ProjectService::get_project(&pool, project.id).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
