use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Quiz {
    pub id: Uuid,
    pub course_id: Uuid,
    pub name: String,
    pub timeopen: Option<DateTime<Utc>>,
    pub timeclose: Option<DateTime<Utc>>,
    /// Sum of the maximum marks of all questions.
    pub sumgrades: Decimal,
    /// Grade scale target the raw marks are rescaled to.
    pub grade: Decimal,
    /// 1 means one attempt per candidate; review filenames then omit the attempt id.
    pub attempts_allowed: i32,
}

impl Quiz {
    pub fn is_closed(&self, now: DateTime<Utc>) -> bool {
        matches!(self.timeclose, Some(timeclose) if timeclose <= now)
    }

    /// Rescale raw attempt marks onto the quiz grade scale.
    /// Returns `None` when the attempt is ungraded or the quiz has no marks.
    pub fn rescale(&self, sumgrades: Option<Decimal>) -> Option<Decimal> {
        let raw = sumgrades?;
        if self.sumgrades <= Decimal::ZERO {
            return None;
        }
        Some(raw * self.grade / self.sumgrades)
    }

    pub fn rescales_marks(&self) -> bool {
        self.grade != self.sumgrades
    }
}

pub fn format_grade(grade: Decimal) -> String {
    grade.round_dp(2).normalize().to_string()
}
