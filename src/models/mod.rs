pub mod attempt;
pub mod candidate;
pub mod course;
pub mod quiz;
pub mod settings;
pub mod stored_file;
