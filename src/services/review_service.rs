use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::models::settings::{AnonymizeDates, ArchiveSettings};
use crate::models::stored_file::{NewStoredFile, MIME_PDF, REVIEW_AREA};
use crate::services::attempt_source::AttemptSource;
use crate::services::file_store::{FileStore, StoreOutcome};
use crate::services::quiz_store::QuizStore;
use crate::services::review_pdf::{attempt_blocks, ReviewDocument, ReviewPdf};
use crate::utils::crypto::username_digest;
use crate::utils::filename::review_filename;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SnapshotOutcome {
    Stored { filename: String },
    AlreadyStored { filename: String },
    PreviewSkipped,
}

/// Handles the host engine's attempt-submitted event: anonymize the attempt
/// timestamps per policy, then freeze the attempt into its review PDF. The
/// snapshot is idempotent; the existing file always wins.
pub struct ReviewService<Q, F, A> {
    quizzes: Q,
    files: F,
    attempts: A,
    pdf: ReviewPdf,
}

impl<Q, F, A> ReviewService<Q, F, A>
where
    Q: QuizStore,
    F: FileStore,
    A: AttemptSource,
{
    pub fn new(quizzes: Q, files: F, attempts: A) -> Self {
        Self {
            quizzes,
            files,
            attempts,
            pdf: ReviewPdf::new(),
        }
    }

    pub async fn attempt_submitted(
        &self,
        attempt_id: Uuid,
        settings: &ArchiveSettings,
        cipher_key: &str,
    ) -> Result<SnapshotOutcome> {
        let review = self.attempts.attempt_review(attempt_id).await?;
        if review.attempt.preview {
            return Ok(SnapshotOutcome::PreviewSkipped);
        }

        let record = self.quizzes.get(review.attempt.quiz_id).await?;

        match settings.anonymize_dates {
            AnonymizeDates::Off => {}
            AnonymizeDates::Clear => {
                self.attempts.save_times(review.attempt.id, None, None).await?;
            }
            AnonymizeDates::QuizOpenDate => {
                self.attempts
                    .save_times(review.attempt.id, record.quiz.timeopen, record.quiz.timeopen)
                    .await?;
            }
        }

        let attempt_suffix = if record.quiz.attempts_allowed == 1 {
            None
        } else {
            Some(review.attempt.id)
        };
        let filename = review_filename(&review.candidate, attempt_suffix);

        if self
            .files
            .exists(REVIEW_AREA, record.quiz.id, "/", &filename)
            .await?
        {
            return Ok(SnapshotOutcome::AlreadyStored { filename });
        }

        let mut header = format!(
            "{} - Id number: {}",
            review.candidate.fullname(),
            review.candidate.padded_idnumber()
        );
        if settings.username_hash {
            header.push_str(&format!(
                " - {}",
                username_digest(cipher_key, &review.candidate.username)
            ));
        }

        let document = ReviewDocument {
            title: record.quiz.name.clone(),
            header,
            blocks: attempt_blocks(&review),
        };
        let bytes = self.pdf.render(&document);

        let outcome = self
            .files
            .store(NewStoredFile {
                category: REVIEW_AREA.to_string(),
                quiz_id: record.quiz.id,
                filepath: "/".to_string(),
                filename: filename.clone(),
                mimetype: MIME_PDF.to_string(),
                content: bytes,
            })
            .await?;

        match outcome {
            StoreOutcome::Created => {
                tracing::info!(
                    quiz_id = %record.quiz.id,
                    attempt_id = %attempt_id,
                    filename = %filename,
                    "Stored attempt review"
                );
                Ok(SnapshotOutcome::Stored { filename })
            }
            StoreOutcome::AlreadyExists => Ok(SnapshotOutcome::AlreadyStored { filename }),
        }
    }
}
