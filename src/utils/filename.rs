use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::candidate::Candidate;
use crate::models::course::Course;
use crate::models::quiz::Quiz;

/// Strip characters that are unsafe in stored filenames. Whitespace collapses
/// to a single underscore; path separators and control characters are dropped.
pub fn clean_filename(name: &str) -> String {
    let mut cleaned = String::with_capacity(name.len());
    let mut last_was_space = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !last_was_space && !cleaned.is_empty() {
                cleaned.push('_');
            }
            last_was_space = true;
            continue;
        }
        last_was_space = false;
        if c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ',' | '(' | ')') {
            cleaned.push(c);
        }
    }
    cleaned.trim_matches('_').to_string()
}

/// Base name shared by all finalized artifacts of a quiz:
/// course short name, course start date, quiz name and quiz id.
pub fn finalized_base_name(course: &Course, quiz: &Quiz) -> String {
    let parts = [
        course.shortname.clone(),
        course.startdate.format("%d-%m-%Y").to_string(),
        quiz.name.clone(),
        quiz.id.to_string(),
    ];
    clean_filename(&parts.join("-"))
}

/// Artifact filename, optionally suffixed with the run timestamp so a
/// refinalize never collides with an earlier snapshot.
pub fn artifact_filename(
    base: &str,
    extension: &str,
    run_timestamp: Option<DateTime<Utc>>,
) -> String {
    match run_timestamp {
        Some(ts) => format!("{}-{}{}", base, ts.timestamp_millis(), extension),
        None => format!("{}{}", base, extension),
    }
}

/// Review PDF filename for a submitted attempt. With a single allowed attempt
/// per candidate the attempt id is omitted, one file per candidate.
pub fn review_filename(candidate: &Candidate, attempt_id: Option<Uuid>) -> String {
    let stem = match attempt_id {
        Some(id) => format!(
            "{}-{}-{}",
            candidate.fullname(),
            candidate.padded_idnumber(),
            id
        ),
        None => format!("{}-{}", candidate.fullname(), candidate.padded_idnumber()),
    };
    clean_filename(&format!("{}.pdf", stem))
}
