//! Per-session aggregate of grading events. Never persisted.
use super::{Grade, ItemClass, Timestamp};
use serde::Serialize;

/// One grading event as seen by the session: the grade, and how the item was classified
/// right before it was graded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradingEvent {
    pub grade: Grade,
    pub class: ItemClass,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// Wall-clock epoch milliseconds, unrelated to the practice clock.
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub reviewed: usize,
    pub correct: usize,
    pub incorrect: usize,
    /// Events on items that had never been graded before.
    pub new_items: usize,
    /// Events on items that already had a schedule.
    pub review_items: usize,
    pub grades: Vec<u8>,
}

impl SessionStats {
    pub fn started_at(now: Timestamp) -> Self {
        Self {
            start_time: Some(now),
            ..Self::default()
        }
    }

    pub fn from_events<I>(events: I) -> Self
    where
        I: IntoIterator<Item = GradingEvent>,
    {
        let mut stats = Self::default();
        for event in events {
            stats.record(event);
        }
        stats
    }

    pub fn record(&mut self, event: GradingEvent) {
        self.reviewed += 1;
        if event.grade.is_passing() {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
        match event.class {
            ItemClass::New => self.new_items += 1,
            ItemClass::Due | ItemClass::Review => self.review_items += 1,
        }
        self.grades.push(event.grade.quality());
    }

    pub fn finish(&mut self, now: Timestamp) {
        self.end_time.get_or_insert(now);
    }

    /// Rounded share of passing grades in percent.
    pub fn accuracy(&self) -> u32 {
        if self.reviewed == 0 {
            return 0;
        }
        (self.correct as f64 / self.reviewed as f64 * 100.0).round() as u32
    }

    /// Whole minutes between start and end, if both are known.
    pub fn duration_minutes(&self) -> Option<i64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(((end - start).max(0) as f64 / 60_000.0).round() as i64),
            _ => None,
        }
    }

    pub fn has_mistakes(&self) -> bool {
        self.incorrect > 0
    }
}
