//! Practice session management for spaced repetition.
//! Handles multi-round vocabulary review with the scheduler applied to every grade.

use super::grade::review_feedback;
use super::scheduler::{classify, select_due_items, Scheduler};
use super::{
    Direction, Grade, GradingEvent, ItemClass, LearningCard, ReviewState, ReviewStateStore,
    SessionStats, SharedReviewStateStore, Timestamp, VocabularyItem, VocabularySet,
};
use std::convert::Infallible;
use std::sync::Arc;

/// Real elapsed time for session statistics. Scheduling uses the practice clock instead.
fn wall_clock_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}

/// Picks the items for a session: due items first (earliest first), then never-reviewed items
/// in vocabulary order up to `new_limit`. At most `limit` items in total.
pub fn plan_session(
    vocabulary: &VocabularySet,
    store: &ReviewStateStore,
    now: Timestamp,
    limit: usize,
    new_limit: usize,
) -> Vec<(VocabularyItem, ItemClass)> {
    let due = select_due_items(store.all_states(), now);
    let mut planned: Vec<(VocabularyItem, ItemClass)> = due
        .iter()
        .filter_map(|state| vocabulary.get(&state.item_id))
        .map(|item| (item.clone(), ItemClass::Due))
        .take(limit)
        .collect();

    let room = limit.saturating_sub(planned.len()).min(new_limit);
    planned.extend(
        vocabulary
            .items
            .iter()
            .filter(|item| classify(store.get(&item.id), now) == ItemClass::New)
            .take(room)
            .map(|item| (item.clone(), ItemClass::New)),
    );
    planned
}

/// Manages a practice session with multiple rounds.
/// Cards graded below 3 are repeated in subsequent rounds.
pub struct LearningSession {
    pub title: String,
    pub all_cards: Vec<LearningCard>,
    pub current_round_cards: Vec<usize>,
    pub current_index: usize,
    pub show_answer: bool,
    pub round_number: usize,
    pub stats: SessionStats,
    pub last_feedback: Option<String>,
    store: Arc<SharedReviewStateStore>,
    scheduler: Scheduler,
    wall_clock: fn() -> Timestamp,
}

impl LearningSession {
    pub fn new(
        title: String,
        planned: Vec<(VocabularyItem, ItemClass)>,
        direction: Direction,
        store: Arc<SharedReviewStateStore>,
        scheduler: Scheduler,
    ) -> Self {
        let all_cards: Vec<_> = planned
            .into_iter()
            .map(|(item, class)| LearningCard::new(item, class))
            .collect();
        let indices: Vec<usize> = (0..all_cards.len()).collect();

        log::info!("Starting session '{}' with {} cards", title, all_cards.len());

        Self {
            title,
            all_cards,
            current_round_cards: indices,
            current_index: 0,
            show_answer: false,
            round_number: 1,
            stats: SessionStats::started_at(wall_clock_millis()),
            last_feedback: None,
            store,
            scheduler: scheduler.with_direction(direction),
            wall_clock: wall_clock_millis,
        }
    }

    /// Replaces the clock used for the session's start and end times. Restarts the timer.
    pub fn with_wall_clock(mut self, clock: fn() -> Timestamp) -> Self {
        self.wall_clock = clock;
        self.stats.start_time = Some(clock());
        self
    }

    pub fn direction(&self) -> Direction {
        self.scheduler.direction()
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.scheduler = self.scheduler.clone().with_direction(direction);
    }

    pub fn current_card(&self) -> Option<&LearningCard> {
        self.current_round_cards
            .get(self.current_index)
            .and_then(|&idx| self.all_cards.get(idx))
    }

    pub fn front_text(&self) -> Option<&str> {
        self.current_card().map(|card| match self.direction() {
            Direction::BgToDe => card.item.bulgarian.as_str(),
            Direction::DeToBg => card.item.german.as_str(),
        })
    }

    pub fn back_text(&self) -> Option<&str> {
        self.current_card().map(|card| match self.direction() {
            Direction::BgToDe => card.item.german.as_str(),
            Direction::DeToBg => card.item.bulgarian.as_str(),
        })
    }

    pub fn reveal(&mut self) {
        self.show_answer = true;
    }

    /// Grade preview for the current card, indexed by quality.
    pub fn preview_intervals(&self, now: Timestamp) -> Option<[u32; 6]> {
        let card = self.current_card()?;
        let current = self.store.get(&card.item.id);
        Some(
            self.scheduler
                .preview_intervals(&card.item.id, current.as_ref(), now),
        )
    }

    /// Grades the current card. Returns the new review state for the caller to persist.
    pub fn grade_current(&mut self, grade: Grade, now: Timestamp) -> Option<ReviewState> {
        match self.grade_current_with(grade, now, |_| Ok::<(), Infallible>(())) {
            Ok(new_state) => new_state,
            Err(never) => match never {},
        }
    }

    /// Grades the current card and hands the new state to `persist` before anything is
    /// recorded. If `persist` fails, neither the store nor the session changes and the card
    /// can be graded again.
    pub fn grade_current_with<F, E>(
        &mut self,
        grade: Grade,
        now: Timestamp,
        persist: F,
    ) -> Result<Option<ReviewState>, E>
    where
        F: FnOnce(&ReviewState) -> Result<(), E>,
    {
        let Some(&actual_idx) = self.current_round_cards.get(self.current_index) else {
            return Ok(None);
        };
        let Some(card) = self.all_cards.get_mut(actual_idx) else {
            return Ok(None);
        };

        let class = classify(self.store.get(&card.item.id).as_ref(), now);
        let new_state =
            self.store
                .try_grade_item(&self.scheduler, &card.item.id, grade, now, persist)?;

        card.record_grade(grade, now);
        self.stats.record(GradingEvent { grade, class });
        self.last_feedback = Some(review_feedback(grade, &new_state));

        Ok(Some(new_state))
    }

    pub fn next_card(&mut self) {
        if self.current_index + 1 < self.current_round_cards.len() {
            self.current_index += 1;
            self.show_answer = false;
        } else {
            self.start_next_round();
        }
        if self.is_completed() {
            self.stats.finish((self.wall_clock)());
        }
    }

    /// Starts a new round with cards that weren't passed. No cards left means done.
    fn start_next_round(&mut self) {
        let failed_indices: Vec<usize> = self
            .current_round_cards
            .iter()
            .copied()
            .filter(|&idx| {
                self.all_cards
                    .get(idx)
                    .map(|card| !card.is_learned)
                    .unwrap_or(false)
            })
            .collect();

        if !failed_indices.is_empty() {
            log::debug!(
                "Round {} finished, {} cards to retry",
                self.round_number,
                failed_indices.len()
            );
            self.current_round_cards = failed_indices;
            self.current_index = 0;
            self.show_answer = false;
            self.round_number += 1;
        }
    }

    pub fn learned_count(&self) -> usize {
        self.current_round_cards
            .iter()
            .filter(|&&idx| {
                self.all_cards
                    .get(idx)
                    .map(|card| card.is_learned)
                    .unwrap_or(false)
            })
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.current_round_cards.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.learned_count()
    }

    pub fn is_completed(&self) -> bool {
        self.current_round_cards.is_empty() || self.learned_count() == self.total_count()
    }

    /// Items that got at least one failing grade during the session.
    pub fn mistakes(&self) -> Vec<VocabularyItem> {
        self.all_cards
            .iter()
            .filter(|card| card.failed_once)
            .map(|card| card.item.clone())
            .collect()
    }

    pub fn phase_message(&self) -> String {
        if self.round_number == 1 {
            format!("Round {}: {} cards", self.round_number, self.total_count())
        } else {
            format!(
                "Round {} (Review): {} cards to retry",
                self.round_number,
                self.total_count()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CefrLevel, DAY_MS};
    use std::cell::Cell;

    thread_local! {
        static FAKE_WALL_CLOCK: Cell<Timestamp> = const { Cell::new(0) };
    }

    fn fake_wall_clock() -> Timestamp {
        FAKE_WALL_CLOCK.with(Cell::get)
    }

    const NOW: Timestamp = 1_700_000_000_000;

    fn vocabulary() -> VocabularySet {
        VocabularySet::new(vec![
            VocabularyItem::new("kniga", "книга", "Buch", "school", CefrLevel::A1),
            VocabularyItem::new("molif", "молив", "Bleistift", "school", CefrLevel::A1),
            VocabularyItem::new("uchitel", "учител", "Lehrer", "school", CefrLevel::A2),
            VocabularyItem::new("dask", "дъска", "Tafel", "school", CefrLevel::A2),
        ])
    }

    fn scheduled(item_id: &str, next_review: Timestamp) -> ReviewState {
        let mut state = ReviewState::new(item_id, 2.5, NOW - 10 * DAY_MS);
        state.review_count = 1;
        state.interval = 1;
        state.next_review = next_review;
        state
    }

    fn session_for(store: ReviewStateStore, limit: usize, new_limit: usize) -> LearningSession {
        let planned = plan_session(&vocabulary(), &store, NOW, limit, new_limit);
        LearningSession::new(
            "school".to_string(),
            planned,
            Direction::BgToDe,
            Arc::new(SharedReviewStateStore::new(store)),
            Scheduler::default(),
        )
    }

    #[test]
    fn test_plan_due_first_then_new() {
        let store = ReviewStateStore::from_states(vec![
            scheduled("uchitel", NOW - DAY_MS),
            scheduled("kniga", NOW - 3 * DAY_MS),
            scheduled("dask", NOW + DAY_MS),
        ]);

        let planned = plan_session(&vocabulary(), &store, NOW, 10, 10);
        let ids: Vec<_> = planned.iter().map(|(item, _)| item.id.as_str()).collect();
        assert_eq!(ids, vec!["kniga", "uchitel", "molif"]);
        assert_eq!(planned[0].1, ItemClass::Due);
        assert_eq!(planned[2].1, ItemClass::New);
    }

    #[test]
    fn test_plan_respects_limits() {
        let store = ReviewStateStore::from_states(vec![scheduled("kniga", NOW)]);

        assert_eq!(plan_session(&vocabulary(), &store, NOW, 2, 10).len(), 2);
        assert_eq!(plan_session(&vocabulary(), &store, NOW, 10, 1).len(), 2);
        assert_eq!(plan_session(&vocabulary(), &store, NOW, 0, 10).len(), 0);
    }

    #[test]
    fn test_plan_ignores_states_without_vocabulary() {
        let store = ReviewStateStore::from_states(vec![scheduled("deleted", NOW - DAY_MS)]);
        let planned = plan_session(&vocabulary(), &store, NOW, 10, 0);
        assert!(planned.is_empty());
    }

    #[test]
    fn test_front_and_back_follow_direction() {
        let mut session = session_for(ReviewStateStore::new(), 1, 1);
        assert_eq!(session.front_text(), Some("книга"));
        assert_eq!(session.back_text(), Some("Buch"));

        session.set_direction(session.direction().flipped());
        assert_eq!(session.front_text(), Some("Buch"));
    }

    #[test]
    fn test_direction_reaches_scheduler() {
        let mut state = scheduled("kniga", NOW - DAY_MS);
        state.repetitions = 2;
        state.interval = 10;
        state.ease_factor = 2.0;
        let store = ReviewStateStore::from_states(vec![state]);

        let mut session = session_for(store.clone(), 1, 0);
        let forward = session.grade_current(Grade::Good, NOW).unwrap();

        let mut session = session_for(store, 1, 0);
        session.set_direction(Direction::DeToBg);
        let backward = session.grade_current(Grade::Good, NOW).unwrap();

        assert_eq!(forward.interval, 22);
        assert_eq!(backward.interval, 24);
    }

    #[test]
    fn test_failed_persist_records_nothing() {
        let mut session = session_for(ReviewStateStore::new(), 1, 1);

        let result = session.grade_current_with(Grade::Good, NOW, |_| Err("locked"));
        assert_eq!(result, Err("locked"));
        assert_eq!(session.stats.reviewed, 0);
        assert!(session.last_feedback.is_none());
        assert!(session.preview_intervals(NOW).is_some());
        assert!(!session.is_completed());

        let saved = session
            .grade_current_with(Grade::Good, NOW, |_| Ok::<(), &str>(()))
            .unwrap()
            .unwrap();
        assert_eq!(saved.review_count, 1);
        assert_eq!(session.stats.reviewed, 1);
    }

    #[test]
    fn test_duration_uses_wall_clock() {
        FAKE_WALL_CLOCK.with(|clock| clock.set(1_000));
        let mut session = session_for(ReviewStateStore::new(), 1, 1).with_wall_clock(fake_wall_clock);

        // the practice clock stays at NOW the whole time
        session.grade_current(Grade::Good, NOW).unwrap();
        FAKE_WALL_CLOCK.with(|clock| clock.set(1_000 + 4 * 60_000));
        session.next_card();

        assert!(session.is_completed());
        assert_eq!(session.stats.start_time, Some(1_000));
        assert_eq!(session.stats.duration_minutes(), Some(4));
    }

    #[test]
    fn test_failed_cards_repeat_next_round() {
        let mut session = session_for(ReviewStateStore::new(), 2, 2);
        assert_eq!(session.total_count(), 2);

        let first = session.grade_current(Grade::Good, NOW).unwrap();
        assert_eq!(first.review_count, 1);
        session.next_card();

        session.grade_current(Grade::Blackout, NOW).unwrap();
        session.next_card();

        assert_eq!(session.round_number, 2);
        assert_eq!(session.total_count(), 1);
        assert!(!session.is_completed());
        assert_eq!(session.current_card().unwrap().item.id, "molif");

        let retried = session.grade_current(Grade::Hard, NOW + 60_000).unwrap();
        assert_eq!(retried.review_count, 2);
        session.next_card();

        assert!(session.is_completed());
        assert_eq!(session.stats.reviewed, 3);
        assert_eq!(session.stats.correct, 2);
        assert_eq!(session.stats.incorrect, 1);
        assert_eq!(session.stats.new_items, 2);
        assert_eq!(session.stats.review_items, 1);
        assert!(session.stats.end_time.is_some());

        let mistakes: Vec<_> = session.mistakes().into_iter().map(|i| i.id).collect();
        assert_eq!(mistakes, vec!["molif"]);
    }

    #[test]
    fn test_feedback_after_grading() {
        let mut session = session_for(ReviewStateStore::new(), 1, 1);
        session.grade_current(Grade::Good, NOW);
        assert_eq!(
            session.last_feedback.as_deref(),
            Some("Good - next review in 1 day")
        );
    }

    #[test]
    fn test_empty_session_is_completed() {
        let session = session_for(ReviewStateStore::new(), 0, 0);
        assert!(session.is_completed());
        assert!(session.current_card().is_none());
        assert!(session.preview_intervals(NOW).is_none());
    }

    #[test]
    fn test_phase_message() {
        let session = session_for(ReviewStateStore::new(), 3, 3);
        assert_eq!(session.phase_message(), "Round 1: 3 cards");
    }
}
