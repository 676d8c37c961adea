use anyhow::{Context, anyhow};
use sqlx::PgPool;
use tracing::instrument;

use tapak_core::pagination::calculate_pagination;
use tapak_core::{AppError, PaginationMeta, PaginationParams};
use tapak_models::{Upload, UploadId, UploadMetadata, UserId};

use crate::metrics::track_upload_bytes;

use super::storage::UploadStore;

const UPLOAD_COLUMNS: &str = "id, owner_id, filename, filetype, upload_length, upload_offset, \
                              completed_at, created_at, updated_at";

fn upload_not_found() -> AppError {
    AppError::not_found(anyhow!("Upload not found"))
}

fn offset_conflict() -> AppError {
    AppError::conflict(anyhow!("Upload-Offset does not match the current offset"))
}

pub struct UploadService;

impl UploadService {
    /// Registers a session at offset 0 and creates its empty object.
    #[instrument(skip(db, store, metadata))]
    pub async fn create_upload(
        db: &PgPool,
        store: &dyn UploadStore,
        owner: UserId,
        upload_length: i64,
        metadata: UploadMetadata,
    ) -> Result<Upload, AppError> {
        let upload = sqlx::query_as::<_, Upload>(&format!(
            r#"INSERT INTO uploads (owner_id, filename, filetype, upload_length)
               VALUES ($1, $2, $3, $4)
               RETURNING {UPLOAD_COLUMNS}"#
        ))
        .bind(owner)
        .bind(metadata.filename())
        .bind(metadata.filetype())
        .bind(upload_length)
        .fetch_one(db)
        .await
        .context("Failed to create upload session")?;

        if let Err(e) = store.create(upload.id).await {
            sqlx::query("DELETE FROM uploads WHERE id = $1")
                .bind(upload.id)
                .execute(db)
                .await
                .context("Failed to roll back upload session")?;
            return Err(e.into());
        }

        crate::audit_event!("create", "uploads", upload_id = %upload.id, owner_id = %owner, "Upload session created");
        Ok(upload)
    }

    /// Another owner's session is reported as missing.
    #[instrument(skip(db))]
    pub async fn get_upload(db: &PgPool, owner: UserId, id: UploadId) -> Result<Upload, AppError> {
        sqlx::query_as::<_, Upload>(&format!(
            "SELECT {UPLOAD_COLUMNS} FROM uploads WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(db)
        .await
        .context("Failed to fetch upload")?
        .ok_or_else(upload_not_found)
    }

    #[instrument(skip(db))]
    pub async fn get_uploads(
        db: &PgPool,
        owner: UserId,
        pagination: PaginationParams,
    ) -> Result<(Vec<Upload>, PaginationMeta), AppError> {
        let (page, limit) = pagination.normalized();

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM uploads WHERE owner_id = $1")
            .bind(owner)
            .fetch_one(db)
            .await
            .context("Failed to count uploads")?;

        let uploads = sqlx::query_as::<_, Upload>(&format!(
            r#"SELECT {UPLOAD_COLUMNS} FROM uploads
               WHERE owner_id = $1
               ORDER BY created_at DESC, id
               LIMIT $2 OFFSET $3"#
        ))
        .bind(owner)
        .bind(limit)
        .bind(pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch uploads")?;

        Ok((uploads, calculate_pagination(page, limit, total)))
    }

    /// Appends `chunk` at `offset` and returns the new offset.
    ///
    /// The session row stays locked (`FOR UPDATE`) from the offset check
    /// until the new offset is committed, and the bytes are written before
    /// that commit. A concurrent request at the same offset waits for the
    /// lock and then sees the advanced offset (409). A failed write rolls
    /// the transaction back, leaving the stored offset where it was.
    #[instrument(skip(db, store, chunk), fields(chunk_len = chunk.len()))]
    pub async fn append_chunk(
        db: &PgPool,
        store: &dyn UploadStore,
        owner: UserId,
        id: UploadId,
        offset: i64,
        chunk: &[u8],
    ) -> Result<i64, AppError> {
        let mut tx = db.begin().await.context("Failed to begin upload transaction")?;

        let upload = sqlx::query_as::<_, Upload>(&format!(
            "SELECT {UPLOAD_COLUMNS} FROM uploads WHERE id = $1 AND owner_id = $2 FOR UPDATE"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to lock upload")?
        .ok_or_else(upload_not_found)?;

        if offset != upload.upload_offset {
            return Err(offset_conflict());
        }

        let chunk_len = i64::try_from(chunk.len())
            .map_err(|_| AppError::payload_too_large(anyhow!("Chunk exceeds Upload-Length")))?;
        let new_offset = offset
            .checked_add(chunk_len)
            .filter(|end| *end <= upload.upload_length)
            .ok_or_else(|| AppError::payload_too_large(anyhow!("Chunk exceeds Upload-Length")))?;

        if chunk.is_empty() {
            return Ok(offset);
        }

        // offset is non-negative here: it equals a stored offset
        if let Err(e) = store.append(id, offset as u64, chunk).await {
            tracing::error!(error = %e, upload_id = %id, offset, "Chunk write failed, offset unchanged");
            return Err(e.into());
        }

        sqlx::query(
            r#"UPDATE uploads SET
                   upload_offset = $2,
                   completed_at = CASE WHEN $2 >= upload_length THEN NOW() ELSE NULL END,
                   updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(new_offset)
        .execute(&mut *tx)
        .await
        .context("Failed to advance upload offset")?;

        tx.commit().await.context("Failed to commit upload offset")?;

        track_upload_bytes(chunk.len() as u64);
        if new_offset == upload.upload_length {
            tracing::info!(upload_id = %id, bytes = new_offset, "Upload completed");
        }

        Ok(new_offset)
    }

    /// Removes the session row and its bytes.
    #[instrument(skip(db, store))]
    pub async fn delete_upload(
        db: &PgPool,
        store: &dyn UploadStore,
        owner: UserId,
        id: UploadId,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM uploads WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner)
            .execute(db)
            .await
            .context("Failed to delete upload")?;

        if result.rows_affected() == 0 {
            return Err(upload_not_found());
        }

        store.remove(id).await?;
        crate::audit_event!("delete", "uploads", upload_id = %id, owner_id = %owner, "Upload terminated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::uploads::storage::{LocalUploadStore, StorageError};
    use async_trait::async_trait;
    use axum::http::StatusCode;

    /// Creates objects but refuses every write.
    struct FailingWrites;

    #[async_trait]
    impl UploadStore for FailingWrites {
        async fn create(&self, _id: UploadId) -> Result<(), StorageError> {
            Ok(())
        }

        async fn append(&self, _id: UploadId, _offset: u64, _chunk: &[u8]) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk full")))
        }

        async fn remove(&self, _id: UploadId) -> Result<(), StorageError> {
            Ok(())
        }
    }

    fn store() -> LocalUploadStore {
        LocalUploadStore::new(std::env::temp_dir().join(format!("tapak-uploads-{}", UploadId::new())))
    }

    async fn owner(pool: &PgPool, email: &str) -> UserId {
        sqlx::query_scalar("INSERT INTO users (name, email, password) VALUES ('Ani', $1, 'x') RETURNING id")
            .bind(email)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_chunks_complete_upload(pool: PgPool) {
        let store = store();
        let user = owner(&pool, "ani@example.com").await;
        let meta = UploadMetadata::parse("filename d29ybGQudHh0").unwrap();
        let upload = UploadService::create_upload(&pool, &store, user, 10, meta)
            .await
            .unwrap();
        assert_eq!(upload.filename.as_deref(), Some("world.txt"));

        let offset = UploadService::append_chunk(&pool, &store, user, upload.id, 0, b"halo ")
            .await
            .unwrap();
        assert_eq!(offset, 5);
        let offset = UploadService::append_chunk(&pool, &store, user, upload.id, 5, b"dunia")
            .await
            .unwrap();
        assert_eq!(offset, 10);

        let upload = UploadService::get_upload(&pool, user, upload.id).await.unwrap();
        assert!(upload.is_complete());
        assert!(upload.completed_at.is_some());
        assert_eq!(tokio::fs::read(store.path(upload.id)).await.unwrap(), b"halo dunia");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_offset_mismatch_conflicts(pool: PgPool) {
        let store = store();
        let user = owner(&pool, "ani@example.com").await;
        let upload = UploadService::create_upload(&pool, &store, user, 10, UploadMetadata::default())
            .await
            .unwrap();

        let err = UploadService::append_chunk(&pool, &store, user, upload.id, 3, b"abc")
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_overflow_is_too_large(pool: PgPool) {
        let store = store();
        let user = owner(&pool, "ani@example.com").await;
        let upload = UploadService::create_upload(&pool, &store, user, 4, UploadMetadata::default())
            .await
            .unwrap();

        let err = UploadService::append_chunk(&pool, &store, user, upload.id, 0, b"terlalu panjang")
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::PAYLOAD_TOO_LARGE);

        let upload = UploadService::get_upload(&pool, user, upload.id).await.unwrap();
        assert_eq!(upload.upload_offset, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_failed_write_keeps_offset(pool: PgPool) {
        let user = owner(&pool, "ani@example.com").await;
        let upload = UploadService::create_upload(&pool, &FailingWrites, user, 10, UploadMetadata::default())
            .await
            .unwrap();

        let err = UploadService::append_chunk(&pool, &FailingWrites, user, upload.id, 0, b"halo ")
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);

        let upload = UploadService::get_upload(&pool, user, upload.id).await.unwrap();
        assert_eq!(upload.upload_offset, 0);
        assert!(upload.completed_at.is_none());

        // The same range can be retried once storage recovers.
        let store = store();
        store.create(upload.id).await.unwrap();
        let offset = UploadService::append_chunk(&pool, &store, user, upload.id, 0, b"halo ")
            .await
            .unwrap();
        assert_eq!(offset, 5);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_concurrent_patches_single_winner(pool: PgPool) {
        let store = store();
        let user = owner(&pool, "ani@example.com").await;
        let upload = UploadService::create_upload(&pool, &store, user, 10, UploadMetadata::default())
            .await
            .unwrap();

        let (a, b) = tokio::join!(
            UploadService::append_chunk(&pool, &store, user, upload.id, 0, b"aaaaa"),
            UploadService::append_chunk(&pool, &store, user, upload.id, 0, b"bbbbb"),
        );
        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            outcomes
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| e.status == StatusCode::CONFLICT)
        );

        let upload = UploadService::get_upload(&pool, user, upload.id).await.unwrap();
        assert_eq!(upload.upload_offset, 5);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_sessions_scoped_to_owner(pool: PgPool) {
        let store = store();
        let ani = owner(&pool, "ani@example.com").await;
        let budi = owner(&pool, "budi@example.com").await;
        let upload = UploadService::create_upload(&pool, &store, ani, 10, UploadMetadata::default())
            .await
            .unwrap();

        let err = UploadService::get_upload(&pool, budi, upload.id).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        let err = UploadService::delete_upload(&pool, &store, budi, upload.id)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let (mine, meta) = UploadService::get_uploads(&pool, budi, PaginationParams::default())
            .await
            .unwrap();
        assert!(mine.is_empty());
        assert_eq!(meta.total_items, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_removes_bytes(pool: PgPool) {
        let store = store();
        let user = owner(&pool, "ani@example.com").await;
        let upload = UploadService::create_upload(&pool, &store, user, 10, UploadMetadata::default())
            .await
            .unwrap();
        assert!(store.path(upload.id).exists());

        UploadService::delete_upload(&pool, &store, user, upload.id).await.unwrap();
        assert!(!store.path(upload.id).exists());
    }
}
