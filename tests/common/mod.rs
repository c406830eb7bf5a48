#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use exam_archive_backend::error::{Error, Result};
use exam_archive_backend::models::attempt::{QuizAttempt, STATE_FINISHED};
use exam_archive_backend::models::candidate::Candidate;
use exam_archive_backend::models::course::Course;
use exam_archive_backend::models::quiz::Quiz;
use exam_archive_backend::models::stored_file::{NewStoredFile, StoredFile, StoredFileMeta};
use exam_archive_backend::services::attempt_source::{
    AttemptReview, AttemptSource, QuestionReview,
};
use exam_archive_backend::services::file_store::{FileStore, StoreOutcome};
use exam_archive_backend::services::quiz_store::{QuizRecord, QuizStore};
use exam_archive_backend::services::user_directory::UserDirectory;

// ---------------------------------------------------------------------------
// In-memory collaborators

#[derive(Clone, Default)]
pub struct InMemoryFileStore {
    files: Arc<Mutex<Vec<StoredFile>>>,
}

impl InMemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_path(&self, category: &str, filepath: &str) -> Vec<StoredFile> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.category == category && f.filepath == filepath)
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn seed(&self, file: NewStoredFile) {
        self.files.lock().unwrap().push(StoredFile {
            id: Uuid::new_v4(),
            category: file.category,
            quiz_id: file.quiz_id,
            filepath: file.filepath,
            filename: file.filename,
            mimetype: file.mimetype,
            content: file.content,
            created_at: Utc::now(),
        });
    }
}

impl FileStore for InMemoryFileStore {
    async fn exists(
        &self,
        category: &str,
        quiz_id: Uuid,
        filepath: &str,
        filename: &str,
    ) -> Result<bool> {
        Ok(self.files.lock().unwrap().iter().any(|f| {
            f.category == category
                && f.quiz_id == quiz_id
                && f.filepath == filepath
                && f.filename == filename
        }))
    }

    async fn store(&self, file: NewStoredFile) -> Result<StoreOutcome> {
        let mut files = self.files.lock().unwrap();
        let duplicate = files.iter().any(|f| {
            f.category == file.category
                && f.quiz_id == file.quiz_id
                && f.filepath == file.filepath
                && f.filename == file.filename
        });
        if duplicate {
            return Ok(StoreOutcome::AlreadyExists);
        }
        files.push(StoredFile {
            id: Uuid::new_v4(),
            category: file.category,
            quiz_id: file.quiz_id,
            filepath: file.filepath,
            filename: file.filename,
            mimetype: file.mimetype,
            content: file.content,
            created_at: Utc::now(),
        });
        Ok(StoreOutcome::Created)
    }

    async fn list(&self, category: &str, quiz_id: Uuid) -> Result<Vec<StoredFileMeta>> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.category == category && f.quiz_id == quiz_id)
            .map(|f| StoredFileMeta {
                category: f.category.clone(),
                quiz_id: f.quiz_id,
                filepath: f.filepath.clone(),
                filename: f.filename.clone(),
                mimetype: f.mimetype.clone(),
                created_at: f.created_at,
            })
            .collect())
    }

    async fn get(
        &self,
        category: &str,
        quiz_id: Uuid,
        filepath: &str,
        filename: &str,
    ) -> Result<Option<StoredFile>> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .iter()
            .find(|f| {
                f.category == category
                    && f.quiz_id == quiz_id
                    && f.filepath == filepath
                    && f.filename == filename
            })
            .cloned())
    }
}

#[derive(Clone)]
pub struct InMemoryQuizStore {
    record: Arc<Mutex<QuizRecord>>,
}

impl InMemoryQuizStore {
    pub fn new(record: QuizRecord) -> Self {
        Self {
            record: Arc::new(Mutex::new(record)),
        }
    }

    pub fn timeclose(&self) -> Option<DateTime<Utc>> {
        self.record.lock().unwrap().quiz.timeclose
    }
}

impl QuizStore for InMemoryQuizStore {
    async fn get(&self, quiz_id: Uuid) -> Result<QuizRecord> {
        let record = self.record.lock().unwrap();
        if record.quiz.id != quiz_id {
            return Err(Error::NotFound("Quiz not found".to_string()));
        }
        Ok(record.clone())
    }

    async fn set_timeclose(&self, quiz_id: Uuid, when: DateTime<Utc>) -> Result<()> {
        let mut record = self.record.lock().unwrap();
        if record.quiz.id != quiz_id {
            return Err(Error::NotFound("Quiz not found".to_string()));
        }
        record.quiz.timeclose = Some(when);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryAttemptSource {
    reviews: Arc<Mutex<Vec<AttemptReview>>>,
}

impl InMemoryAttemptSource {
    pub fn new(reviews: Vec<AttemptReview>) -> Self {
        Self {
            reviews: Arc::new(Mutex::new(reviews)),
        }
    }

    pub fn times(&self, attempt_id: Uuid) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let reviews = self.reviews.lock().unwrap();
        let review = reviews
            .iter()
            .find(|r| r.attempt.id == attempt_id)
            .expect("attempt exists");
        (review.attempt.timestart, review.attempt.timefinish)
    }
}

impl AttemptSource for InMemoryAttemptSource {
    async fn attempts_for(&self, quiz_id: Uuid) -> Result<Vec<AttemptReview>> {
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.attempt.quiz_id == quiz_id && !r.attempt.preview)
            .cloned()
            .collect())
    }

    async fn attempt_review(&self, attempt_id: Uuid) -> Result<AttemptReview> {
        self.reviews
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.attempt.id == attempt_id)
            .cloned()
            .ok_or_else(|| Error::NotFound("Attempt not found".to_string()))
    }

    async fn save_times(
        &self,
        attempt_id: Uuid,
        timestart: Option<DateTime<Utc>>,
        timefinish: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut reviews = self.reviews.lock().unwrap();
        let review = reviews
            .iter_mut()
            .find(|r| r.attempt.id == attempt_id)
            .ok_or_else(|| Error::NotFound("Attempt not found".to_string()))?;
        review.attempt.timestart = timestart;
        review.attempt.timefinish = timefinish;
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryUserDirectory {
    pub enrolled: Vec<Candidate>,
    pub attempted: Vec<Candidate>,
    pub failing: HashSet<Uuid>,
    suspended: Arc<Mutex<Vec<Uuid>>>,
}

impl InMemoryUserDirectory {
    pub fn new(enrolled: Vec<Candidate>, attempted: Vec<Candidate>) -> Self {
        Self {
            enrolled,
            attempted,
            failing: HashSet::new(),
            suspended: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_failing(mut self, candidate_id: Uuid) -> Self {
        self.failing.insert(candidate_id);
        self
    }

    pub fn suspended_ids(&self) -> Vec<Uuid> {
        self.suspended.lock().unwrap().clone()
    }
}

impl UserDirectory for InMemoryUserDirectory {
    async fn suspend(&self, candidate_id: Uuid) -> Result<bool> {
        if self.failing.contains(&candidate_id) {
            return Ok(false);
        }
        self.suspended.lock().unwrap().push(candidate_id);
        Ok(true)
    }

    async fn enrolled_candidates(&self, _course_id: Uuid) -> Result<Vec<Candidate>> {
        Ok(self.enrolled.clone())
    }

    async fn attempted_candidates(&self, _quiz_id: Uuid) -> Result<Vec<Candidate>> {
        Ok(self.attempted.clone())
    }
}

// ---------------------------------------------------------------------------
// Fixtures

pub fn course() -> Course {
    Course {
        id: Uuid::new_v4(),
        shortname: "INF01".to_string(),
        fullname: "Informatics".to_string(),
        startdate: Utc::now() - Duration::days(90),
    }
}

pub fn open_quiz(course: &Course) -> Quiz {
    Quiz {
        id: Uuid::new_v4(),
        course_id: course.id,
        name: "Final written exam".to_string(),
        timeopen: Some(Utc::now() - Duration::days(1)),
        timeclose: None,
        sumgrades: Decimal::from(2),
        grade: Decimal::from(100),
        attempts_allowed: 1,
    }
}

pub fn closed_quiz(course: &Course) -> Quiz {
    Quiz {
        timeclose: Some(Utc::now() - Duration::hours(1)),
        ..open_quiz(course)
    }
}

pub fn candidate(firstname: &str, lastname: &str, idnumber: &str) -> Candidate {
    Candidate {
        id: Uuid::new_v4(),
        username: format!("{}.{}", firstname, lastname).to_lowercase(),
        idnumber: idnumber.to_string(),
        firstname: firstname.to_string(),
        lastname: lastname.to_string(),
        suspended: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn graded_question(number: i32, mark: i64) -> QuestionReview {
    QuestionReview {
        slot: number,
        number: Some(number),
        question_summary: format!("Question {} text", number),
        response_summary: Some("a sensible answer".to_string()),
        mark: Some(Decimal::from(mark)),
        max_mark: Decimal::ONE,
        needs_grading: false,
    }
}

pub fn essay_question(number: i32, mark: Option<i64>) -> QuestionReview {
    QuestionReview {
        slot: number,
        number: Some(number),
        question_summary: format!("Essay {} text", number),
        response_summary: Some("a long essay".to_string()),
        mark: mark.map(Decimal::from),
        max_mark: Decimal::from(10),
        needs_grading: true,
    }
}

pub fn finished_attempt(
    quiz: &Quiz,
    candidate: &Candidate,
    questions: Vec<QuestionReview>,
) -> AttemptReview {
    let sumgrades: Option<Decimal> = questions
        .iter()
        .filter(|q| q.number.is_some())
        .map(|q| q.mark)
        .collect::<Option<Vec<_>>>()
        .map(|marks| marks.into_iter().sum());
    AttemptReview {
        attempt: QuizAttempt {
            id: Uuid::new_v4(),
            quiz_id: quiz.id,
            candidate_id: candidate.id,
            state: STATE_FINISHED.to_string(),
            timestart: Some(Utc::now() - Duration::hours(3)),
            timefinish: Some(Utc::now() - Duration::hours(2)),
            sumgrades,
            preview: false,
        },
        candidate: candidate.clone(),
        questions,
    }
}

pub fn review_file(quiz_id: Uuid, filename: &str) -> NewStoredFile {
    NewStoredFile {
        category: exam_archive_backend::models::stored_file::REVIEW_AREA.to_string(),
        quiz_id,
        filepath: "/".to_string(),
        filename: filename.to_string(),
        mimetype: exam_archive_backend::models::stored_file::MIME_PDF.to_string(),
        content: format!("%PDF-1.7 stub for {}", filename).into_bytes(),
    }
}
