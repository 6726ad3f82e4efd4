//! Database operations for the vocabulary trainer
//!
//! Handles SQLite database initialization, vocabulary storage, persistence of review states
//! and the practice clock. The scheduler never calls into this module: the app loads a
//! snapshot at startup and writes back every state the scheduler returns.

use crate::models::{
    CefrLevel, ReviewState, ReviewStateStore, Timestamp, UsageExample, VocabularyItem,
    VocabularySet, DAY_MS,
};
use rusqlite::{params, Connection, Result};
use std::path::Path;

/// Opens (or creates) the database file and makes sure the schema exists.
pub fn init_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    log::info!("Opened database at {}", path.display());
    Ok(conn)
}

/// Creates tables for vocabulary, review states and app state.
/// Sets the practice clock to the wall clock if not already initialized.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS vocabulary (
            id TEXT PRIMARY KEY,
            bulgarian TEXT NOT NULL,
            german TEXT NOT NULL,
            category TEXT NOT NULL,
            level TEXT NOT NULL,
            notes TEXT,
            examples TEXT NOT NULL DEFAULT '[]'
        )",
        (),
    )?;

    // One row per graded item; items never graded have no row
    conn.execute(
        "CREATE TABLE IF NOT EXISTS review_states (
            item_id TEXT PRIMARY KEY,
            next_review INTEGER NOT NULL,
            interval_days INTEGER NOT NULL DEFAULT 0,
            ease_factor REAL NOT NULL DEFAULT 2.5,
            review_count INTEGER NOT NULL DEFAULT 0,
            last_review INTEGER,
            repetitions INTEGER NOT NULL DEFAULT 0,
            correct_count INTEGER NOT NULL DEFAULT 0
        )",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        (),
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO app_state (key, value) VALUES ('current_time', ?1)",
        params![chrono::Utc::now().timestamp_millis().to_string()],
    )?;

    Ok(())
}

/// Retrieves the practice clock (epoch milliseconds)
pub fn get_current_time(conn: &Connection) -> Result<Timestamp> {
    let value: String = conn.query_row(
        "SELECT value FROM app_state WHERE key = 'current_time'",
        [],
        |row| row.get(0),
    )?;

    value.parse::<Timestamp>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Advances the practice clock by 24 hours (for trying out the schedule)
pub fn advance_day(conn: &Connection) -> Result<Timestamp> {
    let next_day = get_current_time(conn)? + DAY_MS;

    conn.execute(
        "UPDATE app_state SET value = ?1 WHERE key = 'current_time'",
        params![next_day.to_string()],
    )?;

    log::info!("Practice clock advanced to {}", next_day);
    Ok(next_day)
}

/// Inserts or replaces a vocabulary item
pub fn upsert_vocabulary_item(item: &VocabularyItem, conn: &Connection) -> Result<()> {
    let examples = serde_json::to_string(&item.examples)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    conn.execute(
        "INSERT INTO vocabulary (id, bulgarian, german, category, level, notes, examples)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
            bulgarian = excluded.bulgarian,
            german = excluded.german,
            category = excluded.category,
            level = excluded.level,
            notes = excluded.notes,
            examples = excluded.examples",
        params![
            item.id,
            item.bulgarian,
            item.german,
            item.category,
            item.level.as_str(),
            item.notes,
            examples
        ],
    )?;

    Ok(())
}

pub fn count_vocabulary(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM vocabulary", [], |row| row.get(0))?;
    Ok(count.max(0) as usize)
}

/// Loads all vocabulary items ordered by level, category and id
pub fn load_vocabulary(conn: &Connection) -> Result<VocabularySet> {
    let mut stmt = conn.prepare(
        "SELECT id, bulgarian, german, category, level, notes, examples
         FROM vocabulary
         ORDER BY level, category, id",
    )?;

    let items = stmt
        .query_map([], |row| {
            let level: String = row.get(4)?;
            let level = CefrLevel::parse(&level).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    4,
                    rusqlite::types::Type::Text,
                    format!("unknown CEFR level '{}'", level).into(),
                )
            })?;
            let examples: String = row.get(6)?;
            let examples: Vec<UsageExample> = serde_json::from_str(&examples).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
            })?;

            Ok(VocabularyItem {
                id: row.get(0)?,
                bulgarian: row.get(1)?,
                german: row.get(2)?,
                category: row.get(3)?,
                level,
                notes: row.get(5)?,
                examples,
            })
        })?
        .collect::<Result<Vec<_>>>()?;

    Ok(VocabularySet::new(items))
}

/// Loads every stored review state into a fresh store
pub fn load_review_states(conn: &Connection) -> Result<ReviewStateStore> {
    let mut stmt = conn.prepare(
        "SELECT item_id, next_review, interval_days, ease_factor, review_count, last_review,
                repetitions, correct_count
         FROM review_states",
    )?;

    let states = stmt
        .query_map([], review_state_from_row)?
        .collect::<Result<Vec<_>>>()?;

    Ok(ReviewStateStore::from_states(states))
}

fn review_state_from_row(row: &rusqlite::Row<'_>) -> Result<ReviewState> {
    Ok(ReviewState {
        item_id: row.get(0)?,
        next_review: row.get(1)?,
        interval: row.get(2)?,
        ease_factor: row.get(3)?,
        review_count: row.get(4)?,
        last_review: row.get(5)?,
        repetitions: row.get(6)?,
        correct_count: row.get(7)?,
    })
}

/// Writes back a review state returned by the scheduler
pub fn save_review_state(state: &ReviewState, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT INTO review_states
            (item_id, next_review, interval_days, ease_factor, review_count, last_review,
             repetitions, correct_count)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(item_id) DO UPDATE SET
            next_review = excluded.next_review,
            interval_days = excluded.interval_days,
            ease_factor = excluded.ease_factor,
            review_count = excluded.review_count,
            last_review = excluded.last_review,
            repetitions = excluded.repetitions,
            correct_count = excluded.correct_count",
        params![
            state.item_id,
            state.next_review,
            state.interval,
            state.ease_factor,
            state.review_count,
            state.last_review,
            state.repetitions,
            state.correct_count
        ],
    )?;

    Ok(())
}
