use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::middleware::auth::{Capability, ReportContext};
use crate::models::quiz::{format_grade, Quiz};
use crate::models::settings::{ArchiveSettings, SuspendMode};
use crate::models::stored_file::{
    NewStoredFile, StoredFile, StoredFileMeta, ATTEMPTS_ARCHIVE_PATH, FINALIZED_AREA,
    GRADEBOOK_PATH, GRADED_ATTEMPTS_PATH, MIME_PDF, MIME_XLSX, MIME_ZIP, REVIEW_AREA,
};
use crate::services::archive_state::{
    offered_actions, quiz_phase, scan_artifacts, ActionReport, ArchiveAction, Outcome, QuizPhase,
};
use crate::services::attempt_source::{AttemptReview, AttemptSource};
use crate::services::file_store::{FileStore, StoreOutcome};
use crate::services::gradebook::gradebook_xlsx;
use crate::services::quiz_store::{QuizRecord, QuizStore};
use crate::services::review_pdf::{attempt_blocks, ReviewBlock, ReviewDocument, ReviewPdf};
use crate::services::user_directory::UserDirectory;
use crate::services::zip_builder::zip_reviews;
use crate::utils::filename::{artifact_filename, finalized_base_name};

#[derive(Debug, Clone)]
pub struct ZipPasswords {
    pub password: String,
    pub confirm: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    pub quiz_id: Uuid,
    pub quiz_name: String,
    pub course_shortname: String,
    pub phase: QuizPhase,
    pub review_files: Vec<StoredFileMeta>,
    pub finalized_files: Vec<StoredFileMeta>,
    pub actions: Vec<ArchiveAction>,
}

/// Executes archive actions for a quiz. Holds no state of its own: the legal
/// next action is recomputed from the stored files on every call, and all
/// side effects go through the injected collaborators.
pub struct ArchiveService<Q, F, A, U> {
    quizzes: Q,
    files: F,
    attempts: A,
    users: U,
    pdf: ReviewPdf,
}

impl<Q, F, A, U> ArchiveService<Q, F, A, U>
where
    Q: QuizStore,
    F: FileStore,
    A: AttemptSource,
    U: UserDirectory,
{
    pub fn new(quizzes: Q, files: F, attempts: A, users: U) -> Self {
        Self {
            quizzes,
            files,
            attempts,
            users,
            pdf: ReviewPdf::new(),
        }
    }

    pub async fn report(
        &self,
        quiz_id: Uuid,
        ctx: &ReportContext,
        settings: &ArchiveSettings,
    ) -> Result<ReportView> {
        ctx.require(Capability::Grade)?;
        let record = self.quizzes.get(quiz_id).await?;

        let phase = quiz_phase(&record.quiz, Utc::now());
        let review_files = self.files.list(REVIEW_AREA, quiz_id).await?;
        let finalized_files = self.files.list(FINALIZED_AREA, quiz_id).await?;
        let presence = scan_artifacts(&finalized_files);
        let actions = offered_actions(phase, presence, settings, ctx, !review_files.is_empty());

        Ok(ReportView {
            quiz_id,
            quiz_name: record.quiz.name,
            course_shortname: record.course.shortname,
            phase,
            review_files,
            finalized_files,
            actions,
        })
    }

    pub async fn perform(
        &self,
        quiz_id: Uuid,
        action: ArchiveAction,
        ctx: &ReportContext,
        settings: &ArchiveSettings,
        passwords: Option<&ZipPasswords>,
    ) -> Result<ActionReport> {
        ctx.require(action.required_capability())?;
        let record = self.quizzes.get(quiz_id).await?;

        match action {
            ArchiveAction::CloseQuiz => self.close_quiz(&record).await,
            ArchiveAction::Zip => self.compress(&record, settings, passwords).await,
            ArchiveAction::Finalize | ArchiveAction::Refinalize => {
                self.finalize(&record, settings).await
            }
            ArchiveAction::DownloadGrades => Err(Error::BadRequest(
                "downloadgrades returns a file and cannot be performed as a mutation".to_string(),
            )),
        }
    }

    async fn close_quiz(&self, record: &QuizRecord) -> Result<ActionReport> {
        let now = Utc::now();
        if record.quiz.is_closed(now) {
            return Ok(ActionReport::refused(
                ArchiveAction::CloseQuiz,
                Outcome::AlreadyDone("Quiz is already closed".to_string()),
            ));
        }

        self.quizzes.set_timeclose(record.quiz.id, now).await?;
        tracing::info!(quiz_id = %record.quiz.id, "Quiz closed");
        Ok(ActionReport::done(ArchiveAction::CloseQuiz))
    }

    async fn compress(
        &self,
        record: &QuizRecord,
        settings: &ArchiveSettings,
        passwords: Option<&ZipPasswords>,
    ) -> Result<ActionReport> {
        if !record.quiz.is_closed(Utc::now()) {
            return Ok(ActionReport::refused(
                ArchiveAction::Zip,
                Outcome::NotReady("Quiz is not closed yet".to_string()),
            ));
        }

        let finalized_files = self.files.list(FINALIZED_AREA, record.quiz.id).await?;
        if scan_artifacts(&finalized_files).zipped {
            return Ok(ActionReport::refused(
                ArchiveAction::Zip,
                Outcome::AlreadyDone("Review files are already compressed".to_string()),
            ));
        }

        // The password guard runs before anything is gathered or written.
        let password = if settings.encrypt_zip_files {
            let Some(passwords) = passwords else {
                return Err(Error::BadRequest(
                    "An encryption password is required".to_string(),
                ));
            };
            if passwords.password.is_empty() {
                return Err(Error::BadRequest(
                    "The encryption password must not be empty".to_string(),
                ));
            }
            if passwords.password != passwords.confirm {
                return Err(Error::BadRequest("Passwords differ".to_string()));
            }
            Some(passwords.password.as_str())
        } else {
            None
        };

        let metas = self.files.list(REVIEW_AREA, record.quiz.id).await?;
        if metas.is_empty() {
            return Ok(ActionReport::refused(
                ArchiveAction::Zip,
                Outcome::NothingToArchive,
            ));
        }

        let mut reviews: Vec<StoredFile> = Vec::with_capacity(metas.len());
        for meta in &metas {
            if let Some(file) = self
                .files
                .get(REVIEW_AREA, record.quiz.id, &meta.filepath, &meta.filename)
                .await?
            {
                reviews.push(file);
            }
        }

        let bytes = zip_reviews(&reviews, password)?;
        let base = finalized_base_name(&record.course, &record.quiz);
        let filename = artifact_filename(&base, ".zip", None);

        let outcome = self
            .files
            .store(NewStoredFile {
                category: FINALIZED_AREA.to_string(),
                quiz_id: record.quiz.id,
                filepath: ATTEMPTS_ARCHIVE_PATH.to_string(),
                filename: filename.clone(),
                mimetype: MIME_ZIP.to_string(),
                content: bytes,
            })
            .await?;

        match outcome {
            StoreOutcome::Created => {
                tracing::info!(
                    quiz_id = %record.quiz.id,
                    filename = %filename,
                    files = reviews.len(),
                    encrypted = password.is_some(),
                    "Stored attempts archive"
                );
                Ok(ActionReport::done(ArchiveAction::Zip))
            }
            StoreOutcome::AlreadyExists => Ok(ActionReport::refused(
                ArchiveAction::Zip,
                Outcome::AlreadyDone(
                    "Review files were already compressed by a concurrent run".to_string(),
                ),
            )),
        }
    }

    async fn finalize(
        &self,
        record: &QuizRecord,
        settings: &ArchiveSettings,
    ) -> Result<ActionReport> {
        let now = Utc::now();
        if !record.quiz.is_closed(now) {
            return Ok(ActionReport::refused(
                ArchiveAction::Finalize,
                Outcome::NotReady("Quiz is not closed yet".to_string()),
            ));
        }

        let finalized_files = self.files.list(FINALIZED_AREA, record.quiz.id).await?;
        let presence = scan_artifacts(&finalized_files);
        if !presence.zipped {
            return Ok(ActionReport::refused(
                ArchiveAction::Finalize,
                Outcome::NotReady("Compress the review files first".to_string()),
            ));
        }

        let refinalizing = presence.finalized;
        let action = if refinalizing {
            ArchiveAction::Refinalize
        } else {
            ArchiveAction::Finalize
        };
        if refinalizing && !settings.allow_refinalize {
            return Ok(ActionReport::refused(
                action,
                Outcome::AlreadyDone("Quiz reports are already finalized".to_string()),
            ));
        }

        let attempts = self.attempts.attempts_for(record.quiz.id).await?;
        let finished: Vec<&AttemptReview> =
            attempts.iter().filter(|a| a.is_finished()).collect();
        if finished.iter().any(|a| !a.is_fully_graded()) {
            return Ok(ActionReport::refused(action, Outcome::NotAllGraded));
        }

        // Build both artifacts before persisting either one, so a failed run
        // leaves no artifact behind.
        let pdf_bytes = self.graded_attempts_pdf(record, &finished);
        let xlsx_bytes = gradebook_xlsx(&record.quiz, &attempts)?;

        let base = finalized_base_name(&record.course, &record.quiz);
        let suffix = refinalizing.then_some(now);
        let gradebook_name = artifact_filename(&base, ".xlsx", suffix);
        let graded_name = artifact_filename(&base, ".pdf", suffix);

        // The gradebook goes in first. The finalized flag is derived from the
        // graded-attempts path, so an interruption between the two stores
        // leaves the quiz not finalized and the next run completes the pair;
        // an existing gradebook is tolerated for the same reason.
        let _ = self
            .files
            .store(NewStoredFile {
                category: FINALIZED_AREA.to_string(),
                quiz_id: record.quiz.id,
                filepath: GRADEBOOK_PATH.to_string(),
                filename: gradebook_name.clone(),
                mimetype: MIME_XLSX.to_string(),
                content: xlsx_bytes,
            })
            .await?;

        let outcome = self
            .files
            .store(NewStoredFile {
                category: FINALIZED_AREA.to_string(),
                quiz_id: record.quiz.id,
                filepath: GRADED_ATTEMPTS_PATH.to_string(),
                filename: graded_name.clone(),
                mimetype: MIME_PDF.to_string(),
                content: pdf_bytes,
            })
            .await?;

        match outcome {
            StoreOutcome::Created => {
                tracing::info!(
                    quiz_id = %record.quiz.id,
                    gradebook = %gradebook_name,
                    graded_attempts = %graded_name,
                    refinalize = refinalizing,
                    "Finalized quiz reports"
                );
                let mut report = ActionReport::done(action);
                let (suspended, failures) = self.suspend_candidates(record, settings).await?;
                if suspended > 0 {
                    report = report
                        .with_notice(format!("Suspended {} candidate accounts", suspended));
                }
                if failures > 0 {
                    report = report
                        .with_notice(format!("{} account suspensions failed", failures));
                }
                Ok(report)
            }
            StoreOutcome::AlreadyExists => Ok(ActionReport::refused(
                action,
                Outcome::AlreadyDone(
                    "Quiz reports were already finalized by a concurrent run".to_string(),
                ),
            )),
        }
    }

    async fn suspend_candidates(
        &self,
        record: &QuizRecord,
        settings: &ArchiveSettings,
    ) -> Result<(usize, usize)> {
        let targets = match settings.suspend_mode {
            SuspendMode::Off => return Ok((0, 0)),
            SuspendMode::Enrolled => self.users.enrolled_candidates(record.course.id).await?,
            SuspendMode::Attempted => self.users.attempted_candidates(record.quiz.id).await?,
        };

        let mut suspended = 0;
        let mut failures = 0;
        for candidate in targets {
            if self.users.suspend(candidate.id).await? {
                suspended += 1;
            } else {
                failures += 1;
            }
        }
        if failures > 0 {
            tracing::warn!(
                quiz_id = %record.quiz.id,
                failures,
                "Some candidate suspensions failed"
            );
        }
        Ok((suspended, failures))
    }

    fn graded_attempts_pdf(&self, record: &QuizRecord, finished: &[&AttemptReview]) -> Vec<u8> {
        let mut blocks = Vec::new();
        for (idx, review) in finished.iter().enumerate() {
            blocks.push(ReviewBlock::Heading(format!(
                "Candidate: {}",
                review.candidate.fullname()
            )));
            blocks.push(ReviewBlock::Text(format!(
                "Username: {}",
                review.candidate.username
            )));
            blocks.push(ReviewBlock::Text(format!(
                "Id number: {}",
                review.candidate.padded_idnumber()
            )));
            blocks.extend(grade_blocks(&record.quiz, review));
            blocks.push(ReviewBlock::Rule);
            blocks.extend(attempt_blocks(review));
            if idx + 1 < finished.len() {
                blocks.push(ReviewBlock::PageBreak);
            }
        }

        let document = ReviewDocument {
            title: format!("Graded attempts - {}", record.quiz.name),
            header: format!("{} - {}", record.course.shortname, record.quiz.name),
            blocks,
        };
        self.pdf.render(&document)
    }

    /// Build a fresh grades spreadsheet for download. Available whenever the
    /// quiz is closed, independent of zip and finalize state; nothing is
    /// persisted.
    pub async fn grades_download(
        &self,
        quiz_id: Uuid,
        ctx: &ReportContext,
    ) -> Result<(String, Vec<u8>)> {
        ctx.require(Capability::Grade)?;
        let record = self.quizzes.get(quiz_id).await?;
        if !record.quiz.is_closed(Utc::now()) {
            return Err(Error::BadRequest("Quiz is not closed yet".to_string()));
        }

        let attempts = self.attempts.attempts_for(quiz_id).await?;
        let bytes = gradebook_xlsx(&record.quiz, &attempts)?;
        let base = finalized_base_name(&record.course, &record.quiz);
        Ok((artifact_filename(&base, ".xlsx", None), bytes))
    }

    pub async fn download(
        &self,
        quiz_id: Uuid,
        category: &str,
        filepath: &str,
        filename: &str,
        ctx: &ReportContext,
    ) -> Result<StoredFile> {
        ctx.require(Capability::DownloadReviews)?;
        if category != REVIEW_AREA && category != FINALIZED_AREA {
            return Err(Error::NotFound("Unknown file area".to_string()));
        }

        self.files
            .get(category, quiz_id, filepath, filename)
            .await?
            .ok_or_else(|| Error::NotFound("File not found".to_string()))
    }
}

fn grade_blocks(quiz: &Quiz, review: &AttemptReview) -> Vec<ReviewBlock> {
    let mut blocks = Vec::new();
    match quiz.rescale(review.attempt.sumgrades) {
        None => blocks.push(ReviewBlock::Text("Grade: not yet graded".to_string())),
        Some(grade) => {
            let raw = review.attempt.sumgrades.unwrap_or(Decimal::ZERO);
            if quiz.rescales_marks() {
                blocks.push(ReviewBlock::Text(format!(
                    "Marks: {} out of {}",
                    format_grade(raw),
                    format_grade(quiz.sumgrades)
                )));
            }
            if quiz.grade != Decimal::from(100) {
                let percent = if quiz.sumgrades > Decimal::ZERO {
                    (raw * Decimal::from(100) / quiz.sumgrades).round_dp(0)
                } else {
                    Decimal::ZERO
                };
                blocks.push(ReviewBlock::Text(format!(
                    "Grade: {} out of {} ({}%)",
                    format_grade(grade),
                    format_grade(quiz.grade),
                    percent
                )));
            } else {
                blocks.push(ReviewBlock::Text(format!(
                    "Grade: {} out of {}",
                    format_grade(grade),
                    format_grade(quiz.grade)
                )));
            }
        }
    }
    blocks
}
