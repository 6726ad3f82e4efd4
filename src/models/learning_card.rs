//! Wrapper for vocabulary items that tracks progress within one practice session.
use super::{Grade, ItemClass, Timestamp, VocabularyItem};

#[derive(Clone, Debug)]
pub struct LearningCard {
    pub item: VocabularyItem,
    /// Classification at the time the session was planned.
    pub class: ItemClass,
    pub is_learned: bool,
    pub failed_once: bool,
    pub last_grade: Option<Grade>,
    pub last_learned_at: Option<Timestamp>,
}

impl LearningCard {
    pub fn new(item: VocabularyItem, class: ItemClass) -> Self {
        Self {
            item,
            class,
            is_learned: false,
            failed_once: false,
            last_grade: None,
            last_learned_at: None,
        }
    }

    pub fn record_grade(&mut self, grade: Grade, now: Timestamp) {
        self.last_grade = Some(grade);
        if grade.is_passing() {
            self.is_learned = true;
            self.last_learned_at = Some(now);
        } else {
            self.is_learned = false;
            self.failed_once = true;
        }
    }
}
