//! Display-only learning stage derived from an item's ease factor.
use super::scheduler::MIN_EASE_FACTOR;
use super::ReviewState;

/// Successful repetitions needed before an item can count as learned.
const LEARNED_MIN_REPETITIONS: u32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LearningPhase {
    New,
    Learning,
    Familiar,
    Known,
    Mastered,
    Expert,
    Learned,
}

impl LearningPhase {
    pub fn from_ease(ease_factor: f64, repetitions: u32) -> Self {
        let ef = ease_factor.max(MIN_EASE_FACTOR);
        if ef >= 3.0 && repetitions >= LEARNED_MIN_REPETITIONS {
            LearningPhase::Learned
        } else if ef < 2.0 {
            LearningPhase::New
        } else if ef < 2.2 {
            LearningPhase::Learning
        } else if ef < 2.4 {
            LearningPhase::Familiar
        } else if ef < 2.6 {
            LearningPhase::Known
        } else if ef < 2.8 {
            LearningPhase::Mastered
        } else {
            LearningPhase::Expert
        }
    }

    /// Never-reviewed items are always `New`, regardless of the default ease factor.
    pub fn of(state: Option<&ReviewState>) -> Self {
        match state {
            Some(state) if state.review_count > 0 => {
                Self::from_ease(state.ease_factor, state.repetitions)
            }
            _ => LearningPhase::New,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LearningPhase::New => "New",
            LearningPhase::Learning => "Learning",
            LearningPhase::Familiar => "Familiar",
            LearningPhase::Known => "Known",
            LearningPhase::Mastered => "Mastered",
            LearningPhase::Expert => "Expert",
            LearningPhase::Learned => "Learned",
        }
    }
}
