pub mod archive_service;
pub mod archive_state;
pub mod attempt_source;
pub mod file_store;
pub mod gradebook;
pub mod quiz_store;
pub mod review_pdf;
pub mod review_service;
pub mod settings_service;
pub mod user_directory;
pub mod zip_builder;
