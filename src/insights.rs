use chrono::{Duration, Local, NaiveDate};
use itertools::Itertools;
use thiserror::Error;

use crate::journal::JournalDb;

/// Why an insights fetch failed. Surfaced instead of being swallowed so the
/// UI can say "showing defaults" truthfully.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("journal unavailable")]
    Unavailable,
    #[error("journal query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

/// Aggregates over the reflection journal shown on the insights screen.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InsightsReport {
    pub total_sessions: i64,
    pub sessions_last_7_days: usize,
    pub minutes_practiced: u32,
    pub mean_session_secs: Option<f64>,
    pub std_dev_session_secs: Option<f64>,
    /// (kind, sessions), most practiced first.
    pub kind_counts: Vec<(String, i64)>,
    /// Consecutive days with at least one session, ending today or yesterday.
    pub streak_days: u32,
}

impl InsightsReport {
    pub fn most_practiced(&self) -> Option<&str> {
        self.kind_counts.first().map(|(kind, _)| kind.as_str())
    }
}

/// An insights result with the fallback made explicit, so both the UI and
/// the tests can tell a real report from the placeholder.
#[derive(Debug)]
pub struct InsightsView {
    pub report: InsightsReport,
    pub using_fallback: bool,
}

pub fn load(db: &JournalDb) -> Result<InsightsReport, FetchError> {
    let entries = db.all_entries()?;
    let week_ago = Local::now() - Duration::days(7);

    let lengths: Vec<f64> = entries.iter().map(|e| e.elapsed_secs as f64).collect();
    let total_elapsed: u64 = entries.iter().map(|e| e.elapsed_secs as u64).sum();

    let days_practiced: Vec<NaiveDate> = entries
        .iter()
        .map(|e| e.completed_at.date_naive())
        .unique()
        .sorted()
        .collect();

    Ok(InsightsReport {
        total_sessions: db.count()?,
        sessions_last_7_days: entries
            .iter()
            .filter(|e| e.completed_at >= week_ago)
            .count(),
        minutes_practiced: (total_elapsed / 60) as u32,
        mean_session_secs: mean(&lengths),
        std_dev_session_secs: std_dev(&lengths),
        kind_counts: db.kind_counts()?,
        streak_days: streak(&days_practiced, Local::now().date_naive()),
    })
}

/// Fetch insights, substituting an empty report when the journal is missing
/// or the query fails. The substitution is flagged, never silent.
pub fn load_or_fallback(db: Option<&JournalDb>) -> InsightsView {
    let result = match db {
        Some(db) => load(db),
        None => Err(FetchError::Unavailable),
    };
    match result {
        Ok(report) => InsightsView {
            report,
            using_fallback: false,
        },
        Err(_) => InsightsView {
            report: InsightsReport::default(),
            using_fallback: true,
        },
    }
}

/// Consecutive practiced days counting back from `today`. A streak that
/// hasn't been extended today still counts if yesterday was practiced.
fn streak(days: &[NaiveDate], today: NaiveDate) -> u32 {
    let mut cursor = if days.contains(&today) {
        today
    } else if let Some(yesterday) = today.pred_opt() {
        if days.contains(&yesterday) {
            yesterday
        } else {
            return 0;
        }
    } else {
        return 0;
    };

    let mut count = 0;
    while days.contains(&cursor) {
        count += 1;
        match cursor.pred_opt() {
            Some(prev) => cursor = prev,
            None => break,
        }
    }
    count
}

fn mean(data: &[f64]) -> Option<f64> {
    match data.len() {
        0 => None,
        count => Some(data.iter().sum::<f64>() / count as f64),
    }
}

fn std_dev(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let variance = data
        .iter()
        .map(|value| {
            let diff = data_mean - *value;
            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;
    Some(variance.sqrt())
}
