// src/storage/db.rs
// Manages the SQLite database for storing card progress.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, StudyError};
use crate::progress::{CardProgress, ProgressMeta, ProgressStore};

pub struct DatabaseManager {
    conn: Connection,
}

fn to_text(ts: Option<DateTime<Utc>>) -> Option<String> {
    ts.map(|t| t.to_rfc3339())
}

fn from_text(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

impl DatabaseManager {
    /// Opens (or creates) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let manager = DatabaseManager { conn };
        manager.init_schema()?;
        Ok(manager)
    }

    /// An in-memory database, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let manager = DatabaseManager { conn: Connection::open_in_memory()? };
        manager.init_schema()?;
        Ok(manager)
    }

    /// Creates the necessary tables if they don't already exist.
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS card_progress (
                id               TEXT PRIMARY KEY,
                repetitions      INTEGER NOT NULL,
                interval_days    INTEGER NOT NULL,
                ease             REAL NOT NULL,
                due_at           TEXT,
                last_reviewed_at TEXT,
                lapse_count      INTEGER NOT NULL,
                seen_count       INTEGER NOT NULL,
                correct_count    INTEGER NOT NULL,
                hard_count       INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS progress_meta (
                id   INTEGER PRIMARY KEY CHECK (id = 1),
                body TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Uses `INSERT OR REPLACE` to handle both new and existing cards.
    pub fn save_card(&self, card_id: &str, progress: &CardProgress) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO card_progress
                (id, repetitions, interval_days, ease, due_at, last_reviewed_at,
                 lapse_count, seen_count, correct_count, hard_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                card_id,
                progress.repetitions,
                progress.interval_days,
                progress.ease,
                to_text(progress.due_at),
                to_text(progress.last_reviewed_at),
                progress.lapse_count,
                progress.seen_count,
                progress.correct_count,
                progress.hard_count,
            ],
        )?;
        Ok(())
    }

    pub fn delete_card(&self, card_id: &str) -> Result<()> {
        self.conn.execute("DELETE FROM card_progress WHERE id = ?1", [card_id])?;
        Ok(())
    }

    pub fn save_meta(&self, meta: &ProgressMeta) -> Result<()> {
        let body = serde_json::to_string(meta)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO progress_meta (id, body) VALUES (1, ?1)",
            [body],
        )?;
        Ok(())
    }

    /// Writes the card's current state, or drops it if the store no longer
    /// has it (an undone first review), then the metadata.
    pub fn sync_card(&self, store: &ProgressStore, card_id: &str) -> Result<()> {
        match store.cards.get(card_id) {
            Some(progress) => self.save_card(card_id, progress)?,
            None => self.delete_card(card_id)?,
        }
        self.save_meta(&store.meta)
    }

    /// Replaces the database contents with `store`.
    pub fn save_store(&mut self, store: &ProgressStore) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM card_progress", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO card_progress
                    (id, repetitions, interval_days, ease, due_at, last_reviewed_at,
                     lapse_count, seen_count, correct_count, hard_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for (card_id, progress) in &store.cards {
                stmt.execute(params![
                    card_id,
                    progress.repetitions,
                    progress.interval_days,
                    progress.ease,
                    to_text(progress.due_at),
                    to_text(progress.last_reviewed_at),
                    progress.lapse_count,
                    progress.seen_count,
                    progress.correct_count,
                    progress.hard_count,
                ])?;
            }
        }
        tx.execute(
            "INSERT OR REPLACE INTO progress_meta (id, body) VALUES (1, ?1)",
            [serde_json::to_string(&store.meta)?],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn load_store(&self) -> Result<ProgressStore> {
        let mut store = ProgressStore::new();

        let mut stmt = self.conn.prepare(
            "SELECT id, repetitions, interval_days, ease, due_at, last_reviewed_at,
                    lapse_count, seen_count, correct_count, hard_count
             FROM card_progress",
        )?;
        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let progress = CardProgress {
                repetitions: row.get(1)?,
                interval_days: row.get(2)?,
                ease: row.get(3)?,
                due_at: from_text(row.get(4)?),
                last_reviewed_at: from_text(row.get(5)?),
                lapse_count: row.get(6)?,
                seen_count: row.get(7)?,
                correct_count: row.get(8)?,
                hard_count: row.get(9)?,
            };
            Ok((id, progress))
        })?;
        for row in rows {
            let (id, progress) = row?;
            store.cards.insert(id, progress);
        }

        let meta: Option<String> = self
            .conn
            .query_row("SELECT body FROM progress_meta WHERE id = 1", [], |row| row.get(0))
            .optional()?;
        if let Some(body) = meta {
            store.meta = serde_json::from_str(&body)
                .map_err(|e| StudyError::CorruptProgress(format!("progress_meta: {}", e)))?;
        }

        let fixed = store.clamp_ease();
        if fixed > 0 {
            log::warn!("Raised ease to the minimum on {} cards", fixed);
        }
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn sample_store() -> ProgressStore {
        let now = Utc.with_ymd_and_hms(2024, 9, 9, 9, 0, 0).unwrap();
        let mut store = ProgressStore::new();
        let mut a = CardProgress::new(now);
        a.repetitions = 2;
        a.interval_days = 3;
        a.ease = 2.35;
        a.hard_count = 1;
        a.last_reviewed_at = Some(now);
        store.insert("a", a);
        store.insert("b", CardProgress::new(now));
        store.meta.record_review(NaiveDate::from_ymd_opt(2024, 9, 9).unwrap());
        store
    }

    #[test]
    fn test_store_round_trip_in_memory() {
        let mut db = DatabaseManager::open_in_memory().unwrap();
        let store = sample_store();
        db.save_store(&store).unwrap();
        assert_eq!(db.load_store().unwrap(), store);
    }

    #[test]
    fn test_sync_card_deletes_forgotten_cards() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history").join("progress.db");

        let mut store = sample_store();
        {
            let mut db = DatabaseManager::open(&path).unwrap();
            db.save_store(&store).unwrap();
            store.restore("b", None);
            db.sync_card(&store, "b").unwrap();
        }

        let db = DatabaseManager::open(&path).unwrap();
        let loaded = db.load_store().unwrap();
        assert!(loaded.is_new("b"));
        assert_eq!(loaded.cards["a"].interval_days, 3);
        assert_eq!(loaded.meta.total_reviews, 1);
    }
}
