use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::course::Course;
use crate::models::quiz::Quiz;

#[derive(Debug, Clone)]
pub struct QuizRecord {
    pub quiz: Quiz,
    pub course: Course,
}

#[allow(async_fn_in_trait)]
pub trait QuizStore {
    async fn get(&self, quiz_id: Uuid) -> Result<QuizRecord>;

    /// Persist a new close time on the quiz record.
    async fn set_timeclose(&self, quiz_id: Uuid, when: DateTime<Utc>) -> Result<()>;
}

#[derive(Clone)]
pub struct PgQuizStore {
    pool: PgPool,
}

impl PgQuizStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl QuizStore for PgQuizStore {
    async fn get(&self, quiz_id: Uuid) -> Result<QuizRecord> {
        let quiz = sqlx::query_as::<_, Quiz>(
            r#"SELECT id, course_id, name, timeopen, timeclose, sumgrades, grade, attempts_allowed
               FROM quizzes WHERE id = $1"#,
        )
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await?;

        let course = sqlx::query_as::<_, Course>(
            r#"SELECT id, shortname, fullname, startdate FROM courses WHERE id = $1"#,
        )
        .bind(quiz.course_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(QuizRecord { quiz, course })
    }

    async fn set_timeclose(&self, quiz_id: Uuid, when: DateTime<Utc>) -> Result<()> {
        sqlx::query(r#"UPDATE quizzes SET timeclose = $1 WHERE id = $2"#)
            .bind(when)
            .bind(quiz_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
