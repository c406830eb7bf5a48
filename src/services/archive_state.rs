//! Derives, from the stored artifacts and the archive settings, which archive
//! action is legal next for a quiz. Nothing in here touches storage: callers
//! scan the finalized file area and pass the listing in, so the state is
//! recomputed from persisted files on every request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::auth::{Capability, ReportContext};
use crate::models::quiz::Quiz;
use crate::models::settings::ArchiveSettings;
use crate::models::stored_file::{
    StoredFileMeta, ATTEMPTS_ARCHIVE_PATH, GRADEBOOK_PATH, GRADED_ATTEMPTS_PATH,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizPhase {
    Open,
    Closed,
}

pub fn quiz_phase(quiz: &Quiz, now: DateTime<Utc>) -> QuizPhase {
    if quiz.is_closed(now) {
        QuizPhase::Closed
    } else {
        QuizPhase::Open
    }
}

/// Which finalized artifacts already exist. Detection matches the artifact
/// path category, not the filename; filename matching existed in earlier
/// deployments and is migration-only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactPresence {
    pub zipped: bool,
    pub finalized: bool,
    pub gradebook: bool,
}

pub fn scan_artifacts(finalized_files: &[StoredFileMeta]) -> ArtifactPresence {
    let mut presence = ArtifactPresence::default();
    for file in finalized_files {
        match file.filepath.as_str() {
            ATTEMPTS_ARCHIVE_PATH => presence.zipped = true,
            GRADED_ATTEMPTS_PATH => presence.finalized = true,
            GRADEBOOK_PATH => presence.gradebook = true,
            _ => {}
        }
    }
    presence
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveAction {
    CloseQuiz,
    Zip,
    Finalize,
    Refinalize,
    DownloadGrades,
}

impl ArchiveAction {
    /// Parse the wire action parameter: case-insensitive, alphabetic only.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        match raw.to_ascii_lowercase().as_str() {
            "closequiz" => Some(ArchiveAction::CloseQuiz),
            "zip" => Some(ArchiveAction::Zip),
            "finalize" => Some(ArchiveAction::Finalize),
            "downloadgrades" => Some(ArchiveAction::DownloadGrades),
            _ => None,
        }
    }

    pub fn required_capability(self) -> Capability {
        match self {
            ArchiveAction::CloseQuiz => Capability::Manage,
            ArchiveAction::Zip | ArchiveAction::Finalize | ArchiveAction::Refinalize => {
                Capability::ArchiveReviews
            }
            ArchiveAction::DownloadGrades => Capability::Grade,
        }
    }
}

/// The actions currently offered to a caller. Capability filtering happens
/// here: an action the caller may not take is simply not listed.
pub fn offered_actions(
    phase: QuizPhase,
    presence: ArtifactPresence,
    settings: &ArchiveSettings,
    ctx: &ReportContext,
    has_reviews: bool,
) -> Vec<ArchiveAction> {
    let mut actions = Vec::new();
    match phase {
        QuizPhase::Open => {
            if ctx.has(Capability::Manage) {
                actions.push(ArchiveAction::CloseQuiz);
            }
        }
        QuizPhase::Closed => {
            if ctx.has(Capability::ArchiveReviews) {
                if !presence.zipped && has_reviews {
                    actions.push(ArchiveAction::Zip);
                }
                if presence.zipped && !presence.finalized {
                    actions.push(ArchiveAction::Finalize);
                }
                if presence.finalized && settings.allow_refinalize {
                    actions.push(ArchiveAction::Refinalize);
                }
            }
            if ctx.has(Capability::Grade) {
                actions.push(ArchiveAction::DownloadGrades);
            }
        }
    }
    actions
}

/// How an invoked action ended. Out-of-order invocations report `NotReady`
/// rather than erroring: they indicate a stale client, not a fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    Done,
    AlreadyDone(String),
    NotReady(String),
    NotAllGraded,
    NothingToArchive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionReport {
    pub action: ArchiveAction,
    pub outcome: Outcome,
    /// Non-fatal observations, e.g. partial suspension failures.
    pub notices: Vec<String>,
}

impl ActionReport {
    pub fn done(action: ArchiveAction) -> Self {
        Self {
            action,
            outcome: Outcome::Done,
            notices: Vec::new(),
        }
    }

    pub fn refused(action: ArchiveAction, outcome: Outcome) -> Self {
        Self {
            action,
            outcome,
            notices: Vec::new(),
        }
    }

    pub fn with_notice(mut self, notice: String) -> Self {
        self.notices.push(notice);
        self
    }

    pub fn performed(&self) -> bool {
        self.outcome == Outcome::Done
    }
}
