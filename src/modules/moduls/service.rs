use anyhow::{Context, anyhow};
use sqlx::PgPool;
use tracing::instrument;

use tapak_core::pagination::calculate_pagination;
use tapak_core::{AppError, PaginationMeta, PaginationParams};
use tapak_models::{CreateModulDto, Modul, ModulId, ProjectId, UpdateModulDto};

use crate::modules::projects::service::ProjectService;

const MODUL_COLUMNS: &str = "id, project_id, name, description, position, created_at, updated_at";

fn map_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::conflict(anyhow!(
                "A modul with this name already exists in this project"
            ));
        }
        if db_err.is_foreign_key_violation() {
            return AppError::not_found(anyhow!("Project not found"));
        }
    }
    AppError::from(e)
}

fn modul_not_found() -> AppError {
    AppError::not_found(anyhow!("Modul not found"))
}

pub struct ModulService;

impl ModulService {
    #[instrument(skip(db))]
    pub async fn get_moduls(
        db: &PgPool,
        project_id: ProjectId,
        pagination: PaginationParams,
    ) -> Result<(Vec<Modul>, PaginationMeta), AppError> {
        ProjectService::ensure_exists(db, project_id).await?;

        let (page, limit) = pagination.normalized();

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM moduls WHERE project_id = $1")
            .bind(project_id)
            .fetch_one(db)
            .await
            .context("Failed to count moduls")?;

        let moduls = sqlx::query_as::<_, Modul>(&format!(
            r#"SELECT {MODUL_COLUMNS} FROM moduls
               WHERE project_id = $1
               ORDER BY position, created_at, id
               LIMIT $2 OFFSET $3"#
        ))
        .bind(project_id)
        .bind(limit)
        .bind(pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch moduls")?;

        Ok((moduls, calculate_pagination(page, limit, total)))
    }

    #[instrument(skip(db))]
    pub async fn get_modul(
        db: &PgPool,
        project_id: ProjectId,
        id: ModulId,
    ) -> Result<Modul, AppError> {
        sqlx::query_as::<_, Modul>(&format!(
            "SELECT {MODUL_COLUMNS} FROM moduls WHERE id = $1 AND project_id = $2"
        ))
        .bind(id)
        .bind(project_id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch modul")?
        .ok_or_else(modul_not_found)
    }

    #[instrument(skip(db, dto))]
    pub async fn create_modul(
        db: &PgPool,
        project_id: ProjectId,
        dto: CreateModulDto,
    ) -> Result<Modul, AppError> {
        ProjectService::ensure_exists(db, project_id).await?;

        let modul = sqlx::query_as::<_, Modul>(&format!(
            r#"INSERT INTO moduls (project_id, name, description, position)
               VALUES ($1, $2, $3, $4)
               RETURNING {MODUL_COLUMNS}"#
        ))
        .bind(project_id)
        .bind(dto.name.trim())
        .bind(&dto.description)
        .bind(dto.position.unwrap_or(0))
        .fetch_one(db)
        .await
        .map_err(map_write_error)?;

        crate::audit_event!("create", "moduls", modul_id = %modul.id, project_id = %project_id, "Modul created");
        Ok(modul)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_modul(
        db: &PgPool,
        project_id: ProjectId,
        id: ModulId,
        dto: UpdateModulDto,
    ) -> Result<Modul, AppError> {
        let modul = sqlx::query_as::<_, Modul>(&format!(
            r#"UPDATE moduls SET
                   name = COALESCE($3, name),
                   description = COALESCE($4, description),
                   position = COALESCE($5, position),
                   updated_at = NOW()
               WHERE id = $1 AND project_id = $2
               RETURNING {MODUL_COLUMNS}"#
        ))
        .bind(id)
        .bind(project_id)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(&dto.description)
        .bind(dto.position)
        .fetch_optional(db)
        .await
        .map_err(map_write_error)?
        .ok_or_else(modul_not_found)?;

        crate::audit_event!("update", "moduls", modul_id = %modul.id, "Modul updated");
        Ok(modul)
    }

    #[instrument(skip(db))]
    pub async fn delete_modul(db: &PgPool, project_id: ProjectId, id: ModulId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM moduls WHERE id = $1 AND project_id = $2")
            .bind(id)
            .bind(project_id)
            .execute(db)
            .await
            .context("Failed to delete modul")?;

        if result.rows_affected() == 0 {
            return Err(modul_not_found());
        }

        crate::audit_event!("delete", "moduls", modul_id = %id, "Modul deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    async fn project(pool: &PgPool, name: &str) -> ProjectId {
        sqlx::query_scalar("INSERT INTO projects (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    fn dto(name: &str, position: Option<i32>) -> CreateModulDto {
        CreateModulDto {
            name: name.to_string(),
            description: None,
            position,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_list_is_ordered_by_position(pool: PgPool) {
        let project_id = project(&pool, "Portal").await;
        ModulService::create_modul(&pool, project_id, dto("Laporan", Some(2)))
            .await
            .unwrap();
        ModulService::create_modul(&pool, project_id, dto("Login", Some(1)))
            .await
            .unwrap();

        let (moduls, meta) = ModulService::get_moduls(&pool, project_id, PaginationParams::default())
            .await
            .unwrap();
        assert_eq!(meta.total_items, 2);
        assert_eq!(moduls[0].name, "Login");
        assert_eq!(moduls[1].name, "Laporan");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_names_unique_per_project(pool: PgPool) {
        let first = project(&pool, "Portal").await;
        let second = project(&pool, "Gudang").await;

        ModulService::create_modul(&pool, first, dto("Login", None)).await.unwrap();
        ModulService::create_modul(&pool, second, dto("Login", None)).await.unwrap();

        let err = ModulService::create_modul(&pool, first, dto("Login", None))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_missing_project(pool: PgPool) {
        let err = ModulService::get_moduls(&pool, ProjectId::new(), PaginationParams::default())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_modul_scoped_to_project(pool: PgPool) {
        let first = project(&pool, "Portal").await;
        let second = project(&pool, "Gudang").await;
        let modul = ModulService::create_modul(&pool, first, dto("Login", None))
            .await
            .unwrap();

        let err = ModulService::get_modul(&pool, second, modul.id).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err = ModulService::delete_modul(&pool, second, modul.id).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_project_delete_cascades(pool: PgPool) {
        let project_id = project(&pool, "Portal").await;
        let modul = ModulService::create_modul(&pool, project_id, dto("Login", None))
            .await
            .unwrap();

        ProjectService::delete_project(&pool, project_id).await.unwrap();
        let err = ModulService::get_modul(&pool, project_id, modul.id).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
