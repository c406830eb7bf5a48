use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::candidate::Candidate;

#[allow(async_fn_in_trait)]
pub trait UserDirectory {
    /// Suspend one candidate account. Returns false when the account could
    /// not be suspended; callers count failures instead of aborting.
    async fn suspend(&self, candidate_id: Uuid) -> Result<bool>;

    async fn enrolled_candidates(&self, course_id: Uuid) -> Result<Vec<Candidate>>;

    async fn attempted_candidates(&self, quiz_id: Uuid) -> Result<Vec<Candidate>>;
}

#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserDirectory for PgUserDirectory {
    async fn suspend(&self, candidate_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"UPDATE candidates SET suspended = TRUE, updated_at = NOW() WHERE id = $1"#,
        )
        .bind(candidate_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.rows_affected() > 0),
            Err(err) => {
                tracing::warn!(candidate_id = %candidate_id, error = ?err, "Suspension failed");
                Ok(false)
            }
        }
    }

    async fn enrolled_candidates(&self, course_id: Uuid) -> Result<Vec<Candidate>> {
        let rows = sqlx::query_as::<_, Candidate>(
            r#"SELECT c.* FROM candidates c
               JOIN enrolments e ON e.candidate_id = c.id
               WHERE e.course_id = $1
               ORDER BY c.lastname, c.firstname"#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn attempted_candidates(&self, quiz_id: Uuid) -> Result<Vec<Candidate>> {
        let rows = sqlx::query_as::<_, Candidate>(
            r#"SELECT DISTINCT c.* FROM candidates c
               JOIN quiz_attempts a ON a.candidate_id = c.id
               WHERE a.quiz_id = $1 AND a.preview = FALSE
               ORDER BY c.lastname, c.firstname"#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
