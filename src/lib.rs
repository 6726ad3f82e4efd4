pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;

pub use error::{AppError, Result, SchedulerError};
pub use models::{
    Grade, LearningSession, ReviewState, ReviewStateStore, Scheduler, SchedulerConfig,
    VocabularyItem, VocabularySet,
};
