pub mod direction;
pub mod grade;
pub mod learning_card;
pub mod learning_session;
pub mod phase;
pub mod review_state;
pub mod review_store;
pub mod scheduler;
pub mod session_stats;
pub mod vocabulary_item;
pub mod vocabulary_set;

pub use direction::Direction;
pub use grade::{grade_feedback_message, is_valid_grade, review_feedback, Grade};
pub use learning_card::LearningCard;
pub use learning_session::{plan_session, LearningSession};
pub use phase::LearningPhase;
pub use review_state::{ReviewState, Timestamp, DAY_MS};
pub use review_store::{ReviewStateStore, SharedReviewStateStore};
pub use scheduler::{
    classify, collection_stats, select_due_items, CollectionStats, ItemClass, Scheduler,
    SchedulerConfig,
};
pub use session_stats::{GradingEvent, SessionStats};
pub use vocabulary_item::{CefrLevel, UsageExample, VocabularyItem};
pub use vocabulary_set::{VocabularyFilter, VocabularySet};
