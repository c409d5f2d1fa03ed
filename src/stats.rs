use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use itertools::Itertools;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::Mutex;

use crate::error::{SinkError, StoreError};
use crate::language::Language;
use crate::sink::{ResultPayload, ResultSink};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS test_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    wpm INTEGER NOT NULL,
    raw_wpm INTEGER NOT NULL,
    accuracy INTEGER NOT NULL,
    duration INTEGER NOT NULL,
    chars INTEGER NOT NULL,
    correct_chars INTEGER NOT NULL,
    incorrect_chars INTEGER NOT NULL,
    extra_chars INTEGER NOT NULL,
    missed_chars INTEGER NOT NULL,
    language TEXT NOT NULL,
    caps_enabled BOOLEAN NOT NULL,
    accents_enabled BOOLEAN NOT NULL,
    punctuation_enabled BOOLEAN NOT NULL,
    hard_mode_enabled BOOLEAN NOT NULL,
    timezone TEXT NOT NULL,
    finished_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_test_results_finished_at ON test_results(finished_at);
"#;

/// A row of the local history
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResult {
    pub id: i64,
    pub wpm: u32,
    pub raw_wpm: u32,
    pub accuracy: u32,
    pub duration_secs: u32,
    pub language: Language,
    pub hard_mode_enabled: bool,
    pub finished_at: DateTime<Utc>,
}

impl StoredResult {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let language: String = row.get(5)?;
        let finished_at: String = row.get(7)?;
        let finished_at = DateTime::parse_from_rfc3339(&finished_at)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
            })?
            .with_timezone(&Utc);
        Ok(Self {
            id: row.get(0)?,
            wpm: row.get(1)?,
            raw_wpm: row.get(2)?,
            accuracy: row.get(3)?,
            duration_secs: row.get(4)?,
            language: Language::from_code(&language).unwrap_or_default(),
            hard_mode_enabled: row.get(6)?,
            finished_at,
        })
    }
}

/// Aggregate view over every stored result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistorySummary {
    pub total_tests: u64,
    pub average_wpm: f64,
    pub average_raw_wpm: f64,
    pub average_accuracy: f64,
    pub fastest_wpm: u32,
    pub fastest_raw_wpm: u32,
    pub best_accuracy: u32,
    pub total_chars: u64,
    pub correct_chars: u64,
    pub incorrect_chars: u64,
    pub extra_chars: u64,
    pub missed_chars: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Local result history in SQLite
#[derive(Debug)]
pub struct ResultStore {
    conn: Mutex<Connection>,
}

impl ResultStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn record(&self, payload: &ResultPayload) -> Result<i64, StoreError> {
        let s = &payload.summary;
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT INTO test_results
            (wpm, raw_wpm, accuracy, duration, chars, correct_chars, incorrect_chars,
             extra_chars, missed_chars, language, caps_enabled, accents_enabled,
             punctuation_enabled, hard_mode_enabled, timezone, finished_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
            params![
                s.wpm,
                s.raw_wpm,
                s.accuracy,
                s.duration_secs,
                s.chars as i64,
                s.correct_chars as i64,
                s.incorrect_chars as i64,
                s.extra_chars as i64,
                s.missed_chars as i64,
                s.language.code(),
                s.caps_enabled,
                s.accents_enabled,
                s.punctuation_enabled,
                s.hard_mode_enabled,
                payload.timezone,
                s.finished_at.to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent results first
    pub fn recent(&self, limit: usize) -> Result<Vec<StoredResult>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            r#"
            SELECT id, wpm, raw_wpm, accuracy, duration, language, hard_mode_enabled, finished_at
            FROM test_results
            ORDER BY finished_at DESC, id DESC
            LIMIT ?1
            "#,
        )?;
        let rows = stmt.query_map([limit as i64], StoredResult::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn summary(&self) -> Result<HistorySummary, StoreError> {
        self.summary_as_of(Utc::now().date_naive())
    }

    /// Summary with streaks computed relative to `today`
    pub fn summary_as_of(&self, today: NaiveDate) -> Result<HistorySummary, StoreError> {
        let conn = self.conn();
        let mut summary = conn.query_row(
            r#"
            SELECT COUNT(*),
                   COALESCE(AVG(wpm), 0), COALESCE(AVG(raw_wpm), 0), COALESCE(AVG(accuracy), 0),
                   COALESCE(MAX(wpm), 0), COALESCE(MAX(raw_wpm), 0), COALESCE(MAX(accuracy), 0),
                   COALESCE(SUM(chars), 0), COALESCE(SUM(correct_chars), 0),
                   COALESCE(SUM(incorrect_chars), 0), COALESCE(SUM(extra_chars), 0),
                   COALESCE(SUM(missed_chars), 0)
            FROM test_results
            "#,
            [],
            |row| {
                Ok(HistorySummary {
                    total_tests: row.get::<_, i64>(0)? as u64,
                    average_wpm: row.get(1)?,
                    average_raw_wpm: row.get(2)?,
                    average_accuracy: row.get(3)?,
                    fastest_wpm: row.get(4)?,
                    fastest_raw_wpm: row.get(5)?,
                    best_accuracy: row.get(6)?,
                    total_chars: row.get::<_, i64>(7)? as u64,
                    correct_chars: row.get::<_, i64>(8)? as u64,
                    incorrect_chars: row.get::<_, i64>(9)? as u64,
                    extra_chars: row.get::<_, i64>(10)? as u64,
                    missed_chars: row.get::<_, i64>(11)? as u64,
                    ..Default::default()
                })
            },
        )?;

        let mut stmt = conn.prepare("SELECT finished_at FROM test_results")?;
        let dates = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .filter_map(|ts| DateTime::parse_from_rfc3339(&ts).ok())
            .map(|ts| ts.with_timezone(&Utc).date_naive())
            .collect::<Vec<_>>();
        let (current, longest) = streaks(&dates, today);
        summary.current_streak = current;
        summary.longest_streak = longest;
        Ok(summary)
    }
}

impl ResultSink for ResultStore {
    fn submit(&self, payload: &ResultPayload) -> Result<(), SinkError> {
        self.record(payload)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "local history"
    }
}

/// Current and longest runs of consecutive days with at least one result.
/// The current run only counts when it reaches `today`.
pub fn streaks(dates: &[NaiveDate], today: NaiveDate) -> (u32, u32) {
    let days: Vec<NaiveDate> = dates.iter().copied().sorted().dedup().collect();
    if days.is_empty() {
        return (0, 0);
    }

    let runs: Vec<u32> = days
        .iter()
        .tuple_windows()
        .fold(vec![1u32], |mut runs, (prev, next)| {
            if *next - *prev == TimeDelta::days(1) {
                if let Some(last) = runs.last_mut() {
                    *last += 1;
                }
            } else {
                runs.push(1);
            }
            runs
        });

    let longest = runs.iter().copied().max().unwrap_or(0);
    let current = match days.last() {
        Some(last) if *last == today => runs.last().copied().unwrap_or(0),
        _ => 0,
    };
    (current, longest)
}
