use chrono::{DateTime, Local};
use rusqlite::{params, Connection, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::reflection::{AnswerValue, ReflectionPayload};

/// A stored reflection, as read back from the journal.
#[derive(Debug, Clone)]
pub struct JournalEntry {
    pub kind: String,
    pub duration_secs: u32,
    pub elapsed_secs: u32,
    pub completed_at: DateTime<Local>,
    pub answers: BTreeMap<String, AnswerValue>,
}

/// Local SQLite journal of completed reflections
#[derive(Debug)]
pub struct JournalDb {
    conn: Connection,
}

impl JournalDb {
    /// Open (or create) the journal at the default location.
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("attune_journal.db"));
        Self::open_at(db_path)
    }

    /// Open a journal at an explicit path. Used by tests and `--export`.
    pub fn open_at<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        if let Some(parent) = db_path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        let conn = Connection::open(db_path)?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS reflections (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                duration_secs INTEGER NOT NULL,
                elapsed_secs INTEGER NOT NULL,
                completed_at TEXT NOT NULL,
                answers_json TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_reflections_kind ON reflections(kind)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_reflections_completed_at ON reflections(completed_at)",
            [],
        )?;

        Ok(JournalDb { conn })
    }

    pub fn record_reflection(&self, payload: &ReflectionPayload) -> Result<()> {
        let answers_json = serde_json::to_string(&payload.answers)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        self.conn.execute(
            r#"
            INSERT INTO reflections
            (kind, duration_secs, elapsed_secs, completed_at, answers_json)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                payload.kind,
                payload.duration_secs,
                payload.elapsed_secs,
                payload.completed_at,
                answers_json,
            ],
        )?;

        Ok(())
    }

    /// Most recent entries, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<JournalEntry>> {
        self.query_entries(
            "SELECT kind, duration_secs, elapsed_secs, completed_at, answers_json
             FROM reflections ORDER BY completed_at DESC LIMIT ?1",
            params![limit as i64],
        )
    }

    /// All entries, oldest first.
    pub fn all_entries(&self) -> Result<Vec<JournalEntry>> {
        self.query_entries(
            "SELECT kind, duration_secs, elapsed_secs, completed_at, answers_json
             FROM reflections ORDER BY completed_at ASC",
            [],
        )
    }

    /// Entries completed at or after `since`, oldest first.
    pub fn entries_since(&self, since: DateTime<Local>) -> Result<Vec<JournalEntry>> {
        self.query_entries(
            "SELECT kind, duration_secs, elapsed_secs, completed_at, answers_json
             FROM reflections WHERE completed_at >= ?1 ORDER BY completed_at ASC",
            params![since.to_rfc3339()],
        )
    }

    pub fn count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM reflections", [], |row| row.get(0))
    }

    pub fn count_for_kind(&self, kind: &str) -> Result<i64> {
        self.conn.query_row(
            "SELECT COUNT(*) FROM reflections WHERE kind = ?1",
            params![kind],
            |row| row.get(0),
        )
    }

    /// (kind, sessions) pairs, most practiced first.
    pub fn kind_counts(&self) -> Result<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT kind, COUNT(*) as n FROM reflections GROUP BY kind ORDER BY n DESC, kind ASC",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }

    /// Write the whole journal to a CSV file, oldest first.
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<usize> {
        let entries = self
            .all_entries()
            .map_err(|e| std::io::Error::other(e.to_string()))?;

        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record([
            "completed_at",
            "practice",
            "duration_secs",
            "elapsed_secs",
            "answers",
        ])?;
        for entry in &entries {
            let answers = entry
                .answers
                .iter()
                .filter_map(|(k, v)| v.selected().map(|sel| format!("{}={}", k, sel)))
                .collect::<Vec<_>>()
                .join("; ");
            writer.write_record([
                entry.completed_at.to_rfc3339(),
                entry.kind.clone(),
                entry.duration_secs.to_string(),
                entry.elapsed_secs.to_string(),
                answers,
            ])?;
        }
        writer.flush()?;
        Ok(entries.len())
    }

    fn query_entries<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<JournalEntry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            let completed_str: String = row.get(3)?;
            let completed_at = DateTime::parse_from_rfc3339(&completed_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        3,
                        "completed_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            let answers_json: String = row.get(4)?;
            let answers = serde_json::from_str(&answers_json).unwrap_or_default();

            Ok(JournalEntry {
                kind: row.get(0)?,
                duration_secs: row.get(1)?,
                elapsed_secs: row.get(2)?,
                completed_at,
                answers,
            })
        })?;

        let mut entries = Vec::new();
        for entry in rows {
            entries.push(entry?);
        }
        Ok(entries)
    }
}
