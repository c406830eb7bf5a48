use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// File area holding one review PDF per submitted attempt.
pub const REVIEW_AREA: &str = "quiz_reviews";
/// File area holding the frozen archive artifacts.
pub const FINALIZED_AREA: &str = "finalized";

/// Logical paths inside the finalized area, one per artifact kind.
pub const ATTEMPTS_ARCHIVE_PATH: &str = "/attemptsarchive/";
pub const GRADED_ATTEMPTS_PATH: &str = "/gradedattempts/";
pub const GRADEBOOK_PATH: &str = "/gradebook/";

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_ZIP: &str = "application/zip";
pub const MIME_XLSX: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StoredFile {
    pub id: Uuid,
    pub category: String,
    pub quiz_id: Uuid,
    pub filepath: String,
    pub filename: String,
    pub mimetype: String,
    pub content: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// Listing row without the content bytes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StoredFileMeta {
    pub category: String,
    pub quiz_id: Uuid,
    pub filepath: String,
    pub filename: String,
    pub mimetype: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStoredFile {
    pub category: String,
    pub quiz_id: Uuid,
    pub filepath: String,
    pub filename: String,
    pub mimetype: String,
    pub content: Vec<u8>,
}
