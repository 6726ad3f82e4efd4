use serde::{Deserialize, Serialize};

/// Epoch milliseconds. Every time-sensitive operation takes one of these as "now".
pub type Timestamp = i64;

pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Per-item spaced repetition record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    pub item_id: String,
    pub next_review: Timestamp,
    /// Days until the next review.
    pub interval: u32,
    pub ease_factor: f64,
    pub review_count: u32,
    #[serde(default)]
    pub last_review: Option<Timestamp>,
    /// Consecutive passing grades since the last failure.
    #[serde(default)]
    pub repetitions: u32,
    #[serde(default)]
    pub correct_count: u32,
}

impl ReviewState {
    /// State of an item that has never been graded.
    pub fn new(item_id: &str, ease_factor: f64, created_at: Timestamp) -> Self {
        Self {
            item_id: item_id.to_string(),
            next_review: created_at,
            interval: 0,
            ease_factor,
            review_count: 0,
            last_review: None,
            repetitions: 0,
            correct_count: 0,
        }
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        self.next_review <= now
    }

    /// Share of passing grades, 0-100. `None` before the first review.
    pub fn accuracy(&self) -> Option<f64> {
        (self.review_count > 0)
            .then(|| f64::from(self.correct_count) / f64::from(self.review_count) * 100.0)
    }
}
