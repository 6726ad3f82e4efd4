//! JSON import/export of vocabulary lists and review progress.
//!
//! Vocabulary files are a plain JSON array of items. Progress files carry a schema version
//! and the export time next to the states, keyed by item id:
//!
//! ```json
//! { "version": 1, "exported": 1700000000000, "states": { "kniga": { ... } } }
//! ```

use crate::error::{AppError, Result};
use crate::models::{
    ReviewState, SharedReviewStateStore, Timestamp, VocabularyItem, VocabularySet,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs;
use std::path::Path;

pub const PROGRESS_SCHEMA_VERSION: u32 = 1;

/// Parses a vocabulary document, rejecting duplicate or empty ids.
pub fn parse_vocabulary(json: &str) -> Result<Vec<VocabularyItem>> {
    let items: Vec<VocabularyItem> = serde_json::from_str(json)?;

    let mut seen = std::collections::HashSet::new();
    for item in &items {
        if item.id.trim().is_empty() {
            return Err(AppError::InvalidExport("vocabulary item with empty id".to_string()));
        }
        if !seen.insert(item.id.as_str()) {
            return Err(AppError::InvalidExport(format!(
                "duplicate vocabulary id '{}'",
                item.id
            )));
        }
    }
    Ok(items)
}

/// Imports vocabulary items from a JSON file.
pub fn import_vocabulary(path: &Path) -> Result<Vec<VocabularyItem>> {
    let contents = fs::read_to_string(path)?;
    let items = parse_vocabulary(&contents)?;
    log::info!("Imported {} vocabulary items from {}", items.len(), path.display());
    Ok(items)
}

/// Exports the whole vocabulary set to a JSON file.
pub fn export_vocabulary_to_path(vocabulary: &VocabularySet, path: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(&vocabulary.items)?;
    fs::write(path, json_string)?;
    log::info!("Exported {} vocabulary items to {}", vocabulary.len(), path.display());
    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressExport {
    pub version: u32,
    pub exported: Timestamp,
    pub states: BTreeMap<String, ReviewState>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportResults {
    pub imported: usize,
    pub skipped: usize,
}

pub fn export_progress<'a, I>(states: I, now: Timestamp) -> ProgressExport
where
    I: IntoIterator<Item = &'a ReviewState>,
{
    ProgressExport {
        version: PROGRESS_SCHEMA_VERSION,
        exported: now,
        states: states
            .into_iter()
            .map(|state| (state.item_id.clone(), state.clone()))
            .collect(),
    }
}

pub fn export_progress_to_path<'a, I>(states: I, now: Timestamp, path: &Path) -> Result<()>
where
    I: IntoIterator<Item = &'a ReviewState>,
{
    let export = export_progress(states, now);
    fs::write(path, serde_json::to_string_pretty(&export)?)?;
    log::info!("Exported {} review states to {}", export.states.len(), path.display());
    Ok(())
}

fn is_importable(key: &str, state: &ReviewState, min_ease_factor: f64) -> bool {
    !state.item_id.trim().is_empty()
        && state.item_id == key
        && state.ease_factor.is_finite()
        && state.ease_factor >= min_ease_factor
        && state.last_review.is_none_or(|last| state.next_review >= last)
        && state.correct_count <= state.review_count
        && state.repetitions <= state.review_count
}

/// Parses a progress document. States that break the review-state invariants are skipped
/// and counted; a malformed document is an error.
pub fn import_progress(
    json: &str,
    min_ease_factor: f64,
) -> Result<(Vec<ReviewState>, ImportResults)> {
    let document: ProgressExport = serde_json::from_str(json)?;
    if document.version > PROGRESS_SCHEMA_VERSION {
        return Err(AppError::InvalidExport(format!(
            "unsupported progress version {}",
            document.version
        )));
    }

    let mut results = ImportResults::default();
    let mut states = Vec::with_capacity(document.states.len());
    for (key, state) in document.states {
        if is_importable(&key, &state, min_ease_factor) {
            results.imported += 1;
            states.push(state);
        } else {
            log::warn!("Skipping invalid review state '{}'", key);
            results.skipped += 1;
        }
    }
    Ok((states, results))
}

/// Moves imported states into `store`. Each state is handed to `persist` first and only enters
/// the store once it was saved. Returns the number of states that could not be saved.
pub fn apply_imported_states<F, E>(
    states: Vec<ReviewState>,
    store: &SharedReviewStateStore,
    mut persist: F,
) -> usize
where
    F: FnMut(&ReviewState) -> std::result::Result<(), E>,
    E: Display,
{
    let mut failed = 0;
    for state in states {
        let item_id = state.item_id.clone();
        if let Err(e) = store.try_set(state, &mut persist) {
            log::error!("Failed to save imported review state '{}': {}", item_id, e);
            failed += 1;
        }
    }
    failed
}

pub fn import_progress_from_path(
    path: &Path,
    min_ease_factor: f64,
) -> Result<(Vec<ReviewState>, ImportResults)> {
    let contents = fs::read_to_string(path)?;
    import_progress(&contents, min_ease_factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CefrLevel, DAY_MS};
    use tempfile::TempDir;

    fn create_test_vocabulary() -> VocabularySet {
        VocabularySet::new(vec![
            VocabularyItem::new("kotka", "котка", "Katze", "animals", CefrLevel::A1),
            VocabularyItem::new("kuche", "куче", "Hund", "animals", CefrLevel::A1),
        ])
    }

    fn graded(item_id: &str) -> ReviewState {
        let mut state = ReviewState::new(item_id, 2.5, 0);
        state.review_count = 1;
        state.interval = 1;
        state.last_review = Some(1_000);
        state.next_review = 1_000 + DAY_MS;
        state
    }

    #[test]
    fn test_vocabulary_export_and_import() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vocabulary.json");
        let vocabulary = create_test_vocabulary();

        export_vocabulary_to_path(&vocabulary, &path).unwrap();
        let imported = import_vocabulary(&path).unwrap();

        assert_eq!(imported, vocabulary.items);
    }

    #[test]
    fn test_parse_vocabulary() {
        let json = r#"[
  {
    "id": "zdravei",
    "bulgarian": "здравей",
    "german": "hallo",
    "category": "greetings",
    "level": "A1",
    "examples": [{ "bulgarian": "Здравей, Иване!", "german": "Hallo, Ivan!" }]
  }
]"#;
        let items = parse_vocabulary(json).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].german, "hallo");
        assert_eq!(items[0].examples.len(), 1);
    }

    #[test]
    fn test_parse_vocabulary_rejects_duplicates() {
        let json = r#"[
  {"id":"a","bulgarian":"а","german":"a","category":"c","level":"A1"},
  {"id":"a","bulgarian":"б","german":"b","category":"c","level":"A1"}
]"#;
        assert!(matches!(parse_vocabulary(json), Err(AppError::InvalidExport(_))));
    }

    #[test]
    fn test_import_nonexistent_file() {
        let result = import_vocabulary(Path::new("nonexistent_file_xyz123.json"));
        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[test]
    fn test_import_invalid_json() {
        assert!(matches!(
            parse_vocabulary("{ this is not valid json }"),
            Err(AppError::Json(_))
        ));
    }

    #[test]
    fn test_progress_roundtrip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.json");
        let states = vec![graded("kotka"), graded("kuche")];

        export_progress_to_path(&states, 42, &path).unwrap();
        let (imported, results) = import_progress_from_path(&path, 1.3).unwrap();

        assert_eq!(results, ImportResults { imported: 2, skipped: 0 });
        assert_eq!(imported, states);
    }

    #[test]
    fn test_progress_import_skips_invalid_states() {
        let mut low_ease = graded("kuche");
        low_ease.ease_factor = 0.9;
        let mut time_travel = graded("mishka");
        time_travel.next_review = 0;

        let mut export = export_progress(&[graded("kotka"), low_ease, time_travel], 42);
        let mut mismatched = graded("zaek");
        mismatched.item_id = "other".to_string();
        export.states.insert("zaek".to_string(), mismatched);

        let json = serde_json::to_string(&export).unwrap();
        let (imported, results) = import_progress(&json, 1.3).unwrap();

        assert_eq!(results, ImportResults { imported: 1, skipped: 3 });
        assert_eq!(imported[0].item_id, "kotka");
    }

    #[test]
    fn test_progress_import_skips_impossible_counters() {
        let mut overcounted = graded("kotka");
        overcounted.correct_count = 7;
        let mut overstreaked = graded("kuche");
        overstreaked.repetitions = 9;
        let mut both = graded("mishka");
        both.correct_count = 7;
        both.repetitions = 9;

        let json = serde_json::to_string(&export_progress(&[overcounted, overstreaked, both], 42))
            .unwrap();
        let (imported, results) = import_progress(&json, 1.3).unwrap();

        assert!(imported.is_empty());
        assert_eq!(results, ImportResults { imported: 0, skipped: 3 });
    }

    #[test]
    fn test_progress_import_keeps_consistent_counters() {
        let mut state = graded("kotka");
        state.review_count = 5;
        state.correct_count = 5;
        state.repetitions = 3;

        let json = serde_json::to_string(&export_progress(&[state], 42)).unwrap();
        let (imported, _) = import_progress(&json, 1.3).unwrap();
        assert_eq!(imported.len(), 1);
    }

    #[test]
    fn test_apply_imported_states_counts_save_failures() {
        let store = SharedReviewStateStore::default();
        let states = vec![graded("kotka"), graded("kuche"), graded("mishka")];

        let failed = apply_imported_states(states, &store, |state| {
            if state.item_id == "kuche" {
                Err("database is locked")
            } else {
                Ok(())
            }
        });

        assert_eq!(failed, 1);
        assert!(store.get("kotka").is_some());
        assert!(store.get("kuche").is_none());
        assert!(store.get("mishka").is_some());
    }

    #[test]
    fn test_progress_import_rejects_bad_documents() {
        assert!(import_progress("{}", 1.3).is_err());
        assert!(import_progress(r#"{"states": []}"#, 1.3).is_err());

        let future = r#"{"version": 99, "exported": 0, "states": {}}"#;
        assert!(matches!(import_progress(future, 1.3), Err(AppError::InvalidExport(_))));
    }
}
