//! SM-2 style spaced repetition scheduler.
//!
//! Grades 0-2 are failures: the interval drops back to `failure_interval_days` and the ease
//! factor loses `failure_penalty`. Grades 3-5 are successes: the interval follows the SM-2
//! ladder (1 day, 6 days, then previous interval × ease factor) but always grows by at least
//! `min_step_days`, and the ease factor moves by the per-grade delta (Hard < 0, Good = 0,
//! Easy > 0). The ease factor never drops below `min_ease_factor`. From the third success on,
//! the ladder step is also scaled by the practice direction's multiplier (both at least 1.0).
//!
//! Nothing here reads the clock or touches storage: callers pass "now" in and persist the
//! returned state themselves.

use super::{Direction, Grade, ReviewState, Timestamp, DAY_MS};
use crate::error::{AppError, SchedulerError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Tunable policy table for the scheduler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub default_ease_factor: f64,
    pub min_ease_factor: f64,
    pub failure_interval_days: u32,
    pub failure_penalty: f64,
    pub first_interval_days: u32,
    pub second_interval_days: u32,
    pub min_step_days: u32,
    pub max_interval_days: u32,
    pub hard_ease_delta: f64,
    pub good_ease_delta: f64,
    pub easy_ease_delta: f64,
    pub bg_de_multiplier: f64,
    pub de_bg_multiplier: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_ease_factor: DEFAULT_EASE_FACTOR,
            min_ease_factor: MIN_EASE_FACTOR,
            failure_interval_days: 1,
            failure_penalty: 0.2,
            first_interval_days: 1,
            second_interval_days: 6,
            min_step_days: 1,
            max_interval_days: 36_500,
            // SM-2 ease update for q = 3, 4, 5
            hard_ease_delta: -0.14,
            good_ease_delta: 0.0,
            easy_ease_delta: 0.1,
            bg_de_multiplier: 1.1,
            de_bg_multiplier: 1.2,
        }
    }
}

impl SchedulerConfig {
    /// Rejects tables that would break the scheduler's invariants.
    pub fn validate(&self) -> Result<(), AppError> {
        let fail = |msg: &str| Err(AppError::InvalidConfig(msg.to_string()));

        if !self.min_ease_factor.is_finite() || self.min_ease_factor <= 0.0 {
            return fail("min_ease_factor must be a positive number");
        }
        if !self.default_ease_factor.is_finite() || self.default_ease_factor < self.min_ease_factor
        {
            return fail("default_ease_factor must not be below min_ease_factor");
        }
        if self.min_ease_factor < 1.0 {
            return fail("min_ease_factor below 1.0 would shrink intervals on success");
        }
        if !(self.failure_penalty >= 0.0) {
            return fail("failure_penalty must be >= 0");
        }
        if !(self.hard_ease_delta <= 0.0) {
            return fail("hard_ease_delta must be <= 0");
        }
        if self.good_ease_delta != 0.0 {
            return fail("good_ease_delta must be 0");
        }
        if !(self.easy_ease_delta >= 0.0) || !self.easy_ease_delta.is_finite() {
            return fail("easy_ease_delta must be >= 0");
        }
        if self.failure_interval_days == 0 || self.min_step_days == 0 {
            return fail("failure_interval_days and min_step_days must be at least 1");
        }
        if self.max_interval_days < self.second_interval_days.max(self.first_interval_days) {
            return fail("max_interval_days must cover the fixed learning steps");
        }
        for multiplier in [self.bg_de_multiplier, self.de_bg_multiplier] {
            if !multiplier.is_finite() || multiplier < 1.0 {
                return fail("direction multipliers must be finite and >= 1.0");
            }
        }
        Ok(())
    }

    pub fn direction_multiplier(&self, direction: Direction) -> f64 {
        match direction {
            Direction::BgToDe => self.bg_de_multiplier,
            Direction::DeToBg => self.de_bg_multiplier,
        }
    }

    fn ease_delta(&self, grade: Grade) -> f64 {
        match grade {
            Grade::Hard => self.hard_ease_delta,
            Grade::Good => self.good_ease_delta,
            Grade::Easy => self.easy_ease_delta,
            _ => -self.failure_penalty,
        }
    }
}

/// Where an item stands relative to "now".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemClass {
    /// Never graded.
    New,
    /// Scheduled and `next_review <= now`.
    Due,
    /// Scheduled for later.
    Review,
}

#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    config: SchedulerConfig,
    direction: Direction,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            direction: Direction::default(),
        }
    }

    /// Same policy, scheduling for practice in `direction`.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Fresh state used for an item graded for the first time.
    pub fn initial_state(&self, item_id: &str, now: Timestamp) -> ReviewState {
        ReviewState::new(item_id, self.config.default_ease_factor, now)
    }

    /// Applies one grading event and returns the item's next state.
    pub fn process_grade(
        &self,
        item_id: &str,
        current: Option<&ReviewState>,
        grade: Grade,
        now: Timestamp,
    ) -> ReviewState {
        let cfg = &self.config;
        let previous = match current {
            Some(state) => {
                debug_assert_eq!(state.item_id, item_id, "review state graded under another id");
                state.clone()
            }
            None => self.initial_state(item_id, now),
        };

        // A clock that went backwards is treated as no time having passed.
        let now = match previous.last_review {
            Some(last) if now < last => {
                log::warn!(
                    "Clock moved backwards for '{}' ({} < {}), using last review time",
                    item_id,
                    now,
                    last
                );
                last
            }
            _ => now,
        };

        let base_ease = previous.ease_factor.max(cfg.min_ease_factor);
        let ease_factor = (base_ease + cfg.ease_delta(grade)).max(cfg.min_ease_factor);

        let (interval, repetitions, correct_count) = if grade.is_passing() {
            let candidate = match previous.repetitions {
                0 => cfg.first_interval_days,
                1 => cfg.second_interval_days,
                // `as` saturates for out-of-range floats
                _ => (f64::from(previous.interval)
                    * ease_factor
                    * cfg.direction_multiplier(self.direction))
                .round() as u32,
            };
            let interval = candidate
                .max(previous.interval.saturating_add(cfg.min_step_days))
                .min(cfg.max_interval_days.max(previous.interval));
            (
                interval,
                previous.repetitions.saturating_add(1),
                previous.correct_count.saturating_add(1),
            )
        } else {
            (cfg.failure_interval_days, 0, previous.correct_count)
        };

        let next_review = now.saturating_add(i64::from(interval).saturating_mul(DAY_MS));

        log::debug!(
            "Graded '{}' {}: interval {} -> {} days, ease {:.2} -> {:.2}",
            item_id,
            grade,
            previous.interval,
            interval,
            previous.ease_factor,
            ease_factor
        );

        ReviewState {
            item_id: item_id.to_string(),
            next_review,
            interval,
            ease_factor,
            review_count: previous.review_count.saturating_add(1),
            last_review: Some(now),
            repetitions,
            correct_count,
        }
    }

    /// Validates a loosely typed grade before scheduling anything.
    pub fn process_raw_grade(
        &self,
        item_id: &str,
        current: Option<&ReviewState>,
        raw: &Value,
        now: Timestamp,
    ) -> Result<ReviewState, SchedulerError> {
        let grade = Grade::try_from(raw)?;
        Ok(self.process_grade(item_id, current, grade, now))
    }

    /// Interval (days) each grade would produce, indexed by quality.
    pub fn preview_intervals(
        &self,
        item_id: &str,
        current: Option<&ReviewState>,
        now: Timestamp,
    ) -> [u32; 6] {
        Grade::ALL.map(|grade| self.process_grade(item_id, current, grade, now).interval)
    }
}

/// All due states, earliest first, ties broken by item id.
pub fn select_due_items<'a, I>(states: I, now: Timestamp) -> Vec<ReviewState>
where
    I: IntoIterator<Item = &'a ReviewState>,
{
    let mut due: Vec<ReviewState> = states
        .into_iter()
        .filter(|state| state.is_due(now))
        .cloned()
        .collect();
    due.sort_by(|a, b| {
        a.next_review
            .cmp(&b.next_review)
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    due
}

pub fn classify(state: Option<&ReviewState>, now: Timestamp) -> ItemClass {
    match state {
        None => ItemClass::New,
        Some(state) if state.is_due(now) => ItemClass::Due,
        Some(_) => ItemClass::Review,
    }
}

/// Aggregate numbers over a whole review-state collection.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    pub total: usize,
    pub due: usize,
    /// Rounded to two decimals; the default ease factor when empty.
    pub avg_ease_factor: f64,
    /// Mean per-item accuracy in percent, over items with at least one review.
    pub avg_accuracy: u32,
}

pub fn collection_stats<'a, I>(states: I, now: Timestamp) -> CollectionStats
where
    I: IntoIterator<Item = &'a ReviewState>,
{
    let mut total: usize = 0;
    let mut due = 0;
    let mut ease_sum = 0.0;
    let mut accuracy_sum = 0.0;
    let mut reviewed: u32 = 0;

    for state in states {
        total += 1;
        ease_sum += state.ease_factor;
        if state.is_due(now) {
            due += 1;
        }
        if let Some(accuracy) = state.accuracy() {
            reviewed += 1;
            accuracy_sum += accuracy;
        }
    }

    let avg_ease_factor = if total > 0 {
        (ease_sum / total as f64 * 100.0).round() / 100.0
    } else {
        DEFAULT_EASE_FACTOR
    };
    let avg_accuracy = if reviewed > 0 {
        (accuracy_sum / f64::from(reviewed)).round() as u32
    } else {
        0
    };

    CollectionStats {
        total,
        due,
        avg_ease_factor,
        avg_accuracy,
    }
}

/// Human readable interval, e.g. "1 day", "3 weeks".
pub fn format_interval(days: u32) -> String {
    let round_div = |d: u32| (f64::from(days) / f64::from(d)).round() as u32;
    if days == 1 {
        "1 day".to_string()
    } else if days < 7 {
        format!("{} days", days)
    } else if days < 30 {
        format!("{} weeks", round_div(7))
    } else if days < 365 {
        format!("{} months", round_div(30))
    } else {
        format!("{} years", round_div(365))
    }
}
