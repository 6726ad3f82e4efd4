//! In-memory mapping from item id to its review state.
//!
//! The store is handed a snapshot at startup (see `database::db::load_review_states`) and the
//! caller writes back whatever it changes. It never talks to storage itself.

use super::scheduler::Scheduler;
use super::{Grade, ReviewState, Timestamp};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Mutex, MutexGuard};

#[derive(Clone, Debug, Default)]
pub struct ReviewStateStore {
    states: HashMap<String, ReviewState>,
}

impl ReviewStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_states<I>(states: I) -> Self
    where
        I: IntoIterator<Item = ReviewState>,
    {
        let mut store = Self::new();
        for state in states {
            store.set(&state.item_id.clone(), state);
        }
        store
    }

    /// `None` for items that were never graded.
    pub fn get(&self, item_id: &str) -> Option<&ReviewState> {
        self.states.get(item_id)
    }

    /// Last writer wins.
    pub fn set(&mut self, item_id: &str, state: ReviewState) {
        self.states.insert(item_id.to_string(), state);
    }

    /// Iteration order is unspecified; sort when it matters.
    pub fn all_states(&self) -> impl Iterator<Item = &ReviewState> {
        self.states.values()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// A store that can be graded from more than one place. Every read-modify-write goes through
/// the one lock, so two gradings of the same item never overwrite each other.
#[derive(Debug, Default)]
pub struct SharedReviewStateStore {
    inner: Mutex<ReviewStateStore>,
}

impl SharedReviewStateStore {
    pub fn new(store: ReviewStateStore) -> Self {
        Self {
            inner: Mutex::new(store),
        }
    }

    /// The store holds plain values, so a poisoned lock is still consistent.
    pub fn lock(&self) -> MutexGuard<'_, ReviewStateStore> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, item_id: &str) -> Option<ReviewState> {
        self.lock().get(item_id).cloned()
    }

    pub fn set(&self, item_id: &str, state: ReviewState) {
        self.lock().set(item_id, state);
    }

    /// Stores `state` only if `persist` accepts it first.
    pub fn try_set<F, E>(&self, state: ReviewState, persist: F) -> Result<(), E>
    where
        F: FnOnce(&ReviewState) -> Result<(), E>,
    {
        let mut store = self.lock();
        persist(&state)?;
        store.set(&state.item_id.clone(), state);
        Ok(())
    }

    pub fn snapshot(&self) -> Vec<ReviewState> {
        self.lock().all_states().cloned().collect()
    }

    /// Grades `item_id` and stores the result, returning it for the caller to persist.
    pub fn grade_item(
        &self,
        scheduler: &Scheduler,
        item_id: &str,
        grade: Grade,
        now: Timestamp,
    ) -> ReviewState {
        match self.try_grade_item(scheduler, item_id, grade, now, |_| Ok::<(), Infallible>(())) {
            Ok(next) => next,
            Err(never) => match never {},
        }
    }

    /// Like [`grade_item`](Self::grade_item), but the new state is handed to `persist` under
    /// the lock and only stored once `persist` succeeds. On error the store is unchanged.
    pub fn try_grade_item<F, E>(
        &self,
        scheduler: &Scheduler,
        item_id: &str,
        grade: Grade,
        now: Timestamp,
        persist: F,
    ) -> Result<ReviewState, E>
    where
        F: FnOnce(&ReviewState) -> Result<(), E>,
    {
        let mut store = self.lock();
        let next = scheduler.process_grade(item_id, store.get(item_id), grade, now);
        persist(&next)?;
        store.set(item_id, next.clone());
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_get_missing_is_none() {
        let store = ReviewStateStore::new();
        assert!(store.get("nyama").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_overwrites() {
        let mut store = ReviewStateStore::new();
        store.set("nyama", ReviewState::new("nyama", 2.5, 0));
        let mut updated = ReviewState::new("nyama", 2.5, 0);
        updated.review_count = 3;
        store.set("nyama", updated);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("nyama").unwrap().review_count, 3);
    }

    #[test]
    fn test_from_states_and_all_states() {
        let store = ReviewStateStore::from_states(vec![
            ReviewState::new("a", 2.5, 0),
            ReviewState::new("b", 2.5, 0),
        ]);
        let mut ids: Vec<_> = store.all_states().map(|s| s.item_id.clone()).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_failed_persist_leaves_store_unchanged() {
        let shared = SharedReviewStateStore::default();
        let scheduler = Scheduler::default();
        let first = shared.grade_item(&scheduler, "voda", Grade::Good, 1_000);

        let result = shared.try_grade_item(&scheduler, "voda", Grade::Easy, 2_000, |_| {
            Err("disk full")
        });
        assert_eq!(result, Err("disk full"));
        assert_eq!(shared.get("voda"), Some(first));

        let saved = shared
            .try_grade_item(&scheduler, "voda", Grade::Easy, 2_000, |_| Ok::<(), &str>(()))
            .unwrap();
        assert_eq!(saved.review_count, 2);
        assert_eq!(shared.get("voda"), Some(saved));
    }

    #[test]
    fn test_try_set_only_stores_persisted_states() {
        let shared = SharedReviewStateStore::default();

        let rejected = shared.try_set(ReviewState::new("hlyab", 2.5, 0), |_| Err(()));
        assert!(rejected.is_err());
        assert!(shared.get("hlyab").is_none());

        shared
            .try_set(ReviewState::new("hlyab", 2.5, 0), |_| Ok::<(), ()>(()))
            .unwrap();
        assert!(shared.get("hlyab").is_some());
    }

    #[test]
    fn test_concurrent_grading_loses_no_updates() {
        let shared = Arc::new(SharedReviewStateStore::default());
        let scheduler = Arc::new(Scheduler::default());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = Arc::clone(&shared);
                let scheduler = Arc::clone(&scheduler);
                thread::spawn(move || {
                    for _ in 0..25 {
                        shared.grade_item(&scheduler, "slantse", Grade::Good, 1_000);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.get("slantse").unwrap().review_count, 200);
    }
}
