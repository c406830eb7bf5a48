use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::stored_file::{NewStoredFile, StoredFile, StoredFileMeta};

/// Result of a conditional create. The store guarantees at most one file per
/// (category, quiz, filepath, filename) tuple; losing that race is a normal,
/// detectable outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Created,
    AlreadyExists,
}

#[allow(async_fn_in_trait)]
pub trait FileStore {
    async fn exists(
        &self,
        category: &str,
        quiz_id: Uuid,
        filepath: &str,
        filename: &str,
    ) -> Result<bool>;

    async fn store(&self, file: NewStoredFile) -> Result<StoreOutcome>;

    async fn list(&self, category: &str, quiz_id: Uuid) -> Result<Vec<StoredFileMeta>>;

    async fn get(
        &self,
        category: &str,
        quiz_id: Uuid,
        filepath: &str,
        filename: &str,
    ) -> Result<Option<StoredFile>>;
}

#[derive(Clone)]
pub struct PgFileStore {
    pool: PgPool,
}

impl PgFileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl FileStore for PgFileStore {
    async fn exists(
        &self,
        category: &str,
        quiz_id: Uuid,
        filepath: &str,
        filename: &str,
    ) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM stored_files
               WHERE category = $1 AND quiz_id = $2 AND filepath = $3 AND filename = $4"#,
        )
        .bind(category)
        .bind(quiz_id)
        .bind(filepath)
        .bind(filename)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn store(&self, file: NewStoredFile) -> Result<StoreOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO stored_files (id, category, quiz_id, filepath, filename, mimetype, content, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            ON CONFLICT (category, quiz_id, filepath, filename) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&file.category)
        .bind(file.quiz_id)
        .bind(&file.filepath)
        .bind(&file.filename)
        .bind(&file.mimetype)
        .bind(&file.content)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            Ok(StoreOutcome::Created)
        } else {
            Ok(StoreOutcome::AlreadyExists)
        }
    }

    async fn list(&self, category: &str, quiz_id: Uuid) -> Result<Vec<StoredFileMeta>> {
        let rows = sqlx::query_as::<_, StoredFileMeta>(
            r#"SELECT category, quiz_id, filepath, filename, mimetype, created_at
               FROM stored_files
               WHERE category = $1 AND quiz_id = $2
               ORDER BY filepath, filename"#,
        )
        .bind(category)
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get(
        &self,
        category: &str,
        quiz_id: Uuid,
        filepath: &str,
        filename: &str,
    ) -> Result<Option<StoredFile>> {
        let row = sqlx::query_as::<_, StoredFile>(
            r#"SELECT id, category, quiz_id, filepath, filename, mimetype, content, created_at
               FROM stored_files
               WHERE category = $1 AND quiz_id = $2 AND filepath = $3 AND filename = $4"#,
        )
        .bind(category)
        .bind(quiz_id)
        .bind(filepath)
        .bind(filename)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
