use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ReportActionRequest {
    /// Wire action name: closequiz, zip, finalize or downloadgrades.
    #[validate(length(min = 1, max = 32))]
    pub action: String,
    /// Archive encryption password, required when encrypted zips are enabled.
    pub password: Option<String>,
    pub password_confirm: Option<String>,
}
