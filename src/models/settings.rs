use serde::{Deserialize, Serialize};

pub const KEY_ANONYMIZE_DATES: &str = "anonymizedates";
pub const KEY_USERNAME_HASH: &str = "usernamehash";
pub const KEY_ALLOW_REFINALIZE: &str = "allowrefinalize";
pub const KEY_ENCRYPT_ZIP_FILES: &str = "encryptzipfiles";
pub const KEY_SUSPEND_MODE: &str = "suspendmode";
pub const KEY_CRYPT_KEY: &str = "cryptkey";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnonymizeDates {
    #[default]
    Off,
    /// Clear both attempt timestamps.
    Clear,
    /// Set both attempt timestamps to the quiz opening time.
    QuizOpenDate,
}

impl AnonymizeDates {
    pub fn from_setting(value: &str) -> Self {
        match value {
            "1" => AnonymizeDates::Clear,
            "2" => AnonymizeDates::QuizOpenDate,
            _ => AnonymizeDates::Off,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SuspendMode {
    #[default]
    Off,
    /// Suspend every candidate enrolled in the course.
    Enrolled,
    /// Suspend only candidates with a recorded attempt.
    Attempted,
}

impl SuspendMode {
    pub fn from_setting(value: &str) -> Self {
        match value {
            "1" => SuspendMode::Enrolled,
            "2" => SuspendMode::Attempted,
            _ => SuspendMode::Off,
        }
    }
}

/// Archive policy settings, read from the settings store once per request and
/// passed explicitly from there on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveSettings {
    pub anonymize_dates: AnonymizeDates,
    pub username_hash: bool,
    pub allow_refinalize: bool,
    pub encrypt_zip_files: bool,
    pub suspend_mode: SuspendMode,
}

pub fn flag_from_setting(value: &str) -> bool {
    value == "1"
}
