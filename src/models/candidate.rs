use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Candidate {
    pub id: Uuid,
    pub username: String,
    pub idnumber: String,
    pub firstname: String,
    pub lastname: String,
    pub suspended: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    pub fn fullname(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }

    /// Id number as it appears in filenames and report headers.
    pub fn padded_idnumber(&self) -> String {
        format!("{:0>6}", self.idnumber)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idnumber_is_zero_padded_to_six_digits() {
        let candidate = Candidate {
            id: Uuid::new_v4(),
            username: "mrossi".to_string(),
            idnumber: "123".to_string(),
            firstname: "Mario".to_string(),
            lastname: "Rossi".to_string(),
            suspended: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(candidate.padded_idnumber(), "000123");
        assert_eq!(candidate.fullname(), "Mario Rossi");
    }
}
