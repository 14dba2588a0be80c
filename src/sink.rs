use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::app_dirs::AppDirs;
use crate::journal::JournalDb;
use crate::reflection::ReflectionPayload;

/// The session's only outward boundary. `on_complete` fires exactly once,
/// on submission from the reflection screen; `on_close` fires when an
/// in-progress session is abandoned, and carries nothing.
pub trait SessionSink {
    fn on_close(&mut self);
    fn on_complete(&mut self, payload: &ReflectionPayload) -> io::Result<()>;
}

/// Production sink: journal the reflection and append a CSV log line.
pub struct JournalSink {
    db: Option<JournalDb>,
    log_path: Option<PathBuf>,
}

impl JournalSink {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            db: JournalDb::new().ok(),
            log_path: AppDirs::session_log_path(),
        }
    }

    /// Explicit wiring for tests and headless runs.
    pub fn with_parts(db: Option<JournalDb>, log_path: Option<PathBuf>) -> Self {
        Self { db, log_path }
    }

    pub fn journal(&self) -> Option<&JournalDb> {
        self.db.as_ref()
    }

    fn append_log(&self, payload: &ReflectionPayload) -> io::Result<()> {
        let Some(ref log_path) = self.log_path else {
            return Ok(());
        };

        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // If the log file doesn't exist, we need to emit a header
        let needs_header = !log_path.exists();

        let mut log_file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(log_path)?;

        if needs_header {
            writeln!(
                log_file,
                "date,practice,duration_secs,elapsed_secs,answered,skipped"
            )?;
        }

        let answered = payload
            .answers
            .values()
            .filter(|v| v.selected().is_some())
            .count();
        let skipped = payload.answers.len() - answered;

        writeln!(
            log_file,
            "{},{},{},{},{},{}",
            payload.completed_at,
            payload.kind,
            payload.duration_secs,
            payload.elapsed_secs,
            answered,
            skipped,
        )?;

        Ok(())
    }
}

impl SessionSink for JournalSink {
    fn on_close(&mut self) {
        // A discarded session leaves no trace; there is no partial save.
    }

    fn on_complete(&mut self, payload: &ReflectionPayload) -> io::Result<()> {
        if let Some(ref db) = self.db {
            db.record_reflection(payload)
                .map_err(|e| io::Error::other(e.to_string()))?;
        }
        self.append_log(payload)
    }
}

/// Test sink capturing every invocation.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub closes: usize,
    pub completions: Vec<ReflectionPayload>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionSink for RecordingSink {
    fn on_close(&mut self) {
        self.closes += 1;
    }

    fn on_complete(&mut self, payload: &ReflectionPayload) -> io::Result<()> {
        self.completions.push(payload.clone());
        Ok(())
    }
}
