pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod validation;

pub use error::{ServiceError, ServiceResult};
pub use models::{Flashcard, ReviewRecord, ReviewSchedule, StudySession};
