use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::attempt::QuizAttempt;
use crate::models::candidate::Candidate;

/// One question of an attempt as shown in review documents. `number` is unset
/// for description slots, which carry no answer or marks.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QuestionReview {
    pub slot: i32,
    pub number: Option<i32>,
    pub question_summary: String,
    pub response_summary: Option<String>,
    pub mark: Option<Decimal>,
    pub max_mark: Decimal,
    pub needs_grading: bool,
}

#[derive(Debug, Clone)]
pub struct AttemptReview {
    pub attempt: QuizAttempt,
    pub candidate: Candidate,
    pub questions: Vec<QuestionReview>,
}

impl AttemptReview {
    pub fn is_finished(&self) -> bool {
        self.attempt.is_finished()
    }

    /// A finished attempt is fully graded once every question that needs
    /// manual grading carries a mark.
    pub fn is_fully_graded(&self) -> bool {
        self.is_finished()
            && self
                .questions
                .iter()
                .filter(|q| q.needs_grading)
                .all(|q| q.mark.is_some())
    }
}

#[allow(async_fn_in_trait)]
pub trait AttemptSource {
    /// All non-preview attempts of a quiz with their candidates and question
    /// reviews, ordered by candidate name.
    async fn attempts_for(&self, quiz_id: Uuid) -> Result<Vec<AttemptReview>>;

    async fn attempt_review(&self, attempt_id: Uuid) -> Result<AttemptReview>;

    /// Persist anonymized attempt timestamps. Irreversible by design.
    async fn save_times(
        &self,
        attempt_id: Uuid,
        timestart: Option<DateTime<Utc>>,
        timefinish: Option<DateTime<Utc>>,
    ) -> Result<()>;
}

#[derive(Clone)]
pub struct PgAttemptSource {
    pool: PgPool,
}

impl PgAttemptSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn questions_for(&self, attempt_id: Uuid) -> Result<Vec<QuestionReview>> {
        let rows = sqlx::query_as::<_, QuestionReview>(
            r#"SELECT slot, number, question_summary, response_summary, mark, max_mark, needs_grading
               FROM question_reviews
               WHERE attempt_id = $1
               ORDER BY slot"#,
        )
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

impl AttemptSource for PgAttemptSource {
    async fn attempts_for(&self, quiz_id: Uuid) -> Result<Vec<AttemptReview>> {
        let attempts = sqlx::query_as::<_, QuizAttempt>(
            r#"SELECT a.id, a.quiz_id, a.candidate_id, a.state, a.timestart, a.timefinish,
                      a.sumgrades, a.preview
               FROM quiz_attempts a
               JOIN candidates c ON c.id = a.candidate_id
               WHERE a.quiz_id = $1 AND a.preview = FALSE
               ORDER BY c.lastname, c.firstname, a.id"#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        let mut reviews = Vec::with_capacity(attempts.len());
        for attempt in attempts {
            let candidate = sqlx::query_as::<_, Candidate>(
                r#"SELECT * FROM candidates WHERE id = $1"#,
            )
            .bind(attempt.candidate_id)
            .fetch_one(&self.pool)
            .await?;
            let questions = self.questions_for(attempt.id).await?;
            reviews.push(AttemptReview {
                attempt,
                candidate,
                questions,
            });
        }
        Ok(reviews)
    }

    async fn attempt_review(&self, attempt_id: Uuid) -> Result<AttemptReview> {
        let attempt = sqlx::query_as::<_, QuizAttempt>(
            r#"SELECT id, quiz_id, candidate_id, state, timestart, timefinish, sumgrades, preview
               FROM quiz_attempts WHERE id = $1"#,
        )
        .bind(attempt_id)
        .fetch_one(&self.pool)
        .await?;

        let candidate =
            sqlx::query_as::<_, Candidate>(r#"SELECT * FROM candidates WHERE id = $1"#)
                .bind(attempt.candidate_id)
                .fetch_one(&self.pool)
                .await?;
        let questions = self.questions_for(attempt.id).await?;

        Ok(AttemptReview {
            attempt,
            candidate,
            questions,
        })
    }

    async fn save_times(
        &self,
        attempt_id: Uuid,
        timestart: Option<DateTime<Utc>>,
        timefinish: Option<DateTime<Utc>>,
    ) -> Result<()> {
        sqlx::query(
            r#"UPDATE quiz_attempts SET timestart = $1, timefinish = $2 WHERE id = $3"#,
        )
        .bind(timestart)
        .bind(timefinish)
        .bind(attempt_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
