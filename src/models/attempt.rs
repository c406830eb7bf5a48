use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const STATE_FINISHED: &str = "finished";
pub const STATE_IN_PROGRESS: &str = "inprogress";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuizAttempt {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub candidate_id: Uuid,
    pub state: String,
    pub timestart: Option<DateTime<Utc>>,
    pub timefinish: Option<DateTime<Utc>>,
    /// Total raw marks; null until every question needing grading is marked.
    pub sumgrades: Option<Decimal>,
    pub preview: bool,
}

impl QuizAttempt {
    pub fn is_finished(&self) -> bool {
        self.state == STATE_FINISHED
    }
}
