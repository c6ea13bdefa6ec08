use crate::app_dirs::AppDirs;
use crate::error::Result;
use crate::training::Rating;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One completed practice session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub subject: String,
    pub category: String,
    pub elapsed_secs: u64,
    pub rating: Rating,
    pub practiced_at: DateTime<Utc>,
}

/// Most recent rating per subject, last write wins
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemRatings(HashMap<String, Rating>);

impl ItemRatings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay entries in timestamp order so the latest practice wins
    pub fn from_history(history: &[HistoryEntry]) -> Self {
        let mut ordered: Vec<&HistoryEntry> = history.iter().collect();
        // stable sort keeps insertion order for identical timestamps
        ordered.sort_by_key(|e| e.practiced_at);
        let mut ratings = Self::new();
        for entry in ordered {
            ratings.record(&entry.subject, entry.rating);
        }
        ratings
    }

    pub fn record(&mut self, subject: &str, rating: Rating) {
        self.0.insert(subject.to_string(), rating);
    }

    pub fn get(&self, subject: &str) -> Option<Rating> {
        self.0.get(subject).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Rating)> {
        self.0.iter().map(|(s, r)| (s.as_str(), *r))
    }
}

/// Aggregated practice record of a single subject
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectSummary {
    pub subject: String,
    pub category: String,
    pub attempts: i64,
    pub avg_elapsed_secs: f64,
    pub last_rating: Option<Rating>,
    pub last_practiced: DateTime<Utc>,
}

/// SQLite-backed practice history and item ratings
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open the database at the default location
    pub fn new() -> Result<Self> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("drawdrill_history.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!(path = %path.display(), "opening history database");
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                subject TEXT NOT NULL,
                category TEXT NOT NULL,
                elapsed_secs INTEGER NOT NULL,
                rating TEXT NOT NULL,
                practiced_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_history_subject ON history(subject)",
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS item_ratings (
                subject TEXT PRIMARY KEY,
                rating TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        Ok(HistoryDb { conn })
    }

    /// Append an entry and make its rating the subject's current one, unless
    /// a later practice of the same subject is already stored
    pub fn record_entry(&mut self, entry: &HistoryEntry) -> Result<()> {
        let tx = self.conn.transaction()?;
        let practiced_at = timestamp_text(entry.practiced_at);

        tx.execute(
            r#"
            INSERT INTO history (subject, category, elapsed_secs, rating, practiced_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                entry.subject,
                entry.category,
                entry.elapsed_secs as i64,
                entry.rating.to_string(),
                practiced_at,
            ],
        )?;

        tx.execute(
            r#"
            INSERT INTO item_ratings (subject, rating, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(subject) DO UPDATE
                SET rating = excluded.rating, updated_at = excluded.updated_at
                WHERE excluded.updated_at >= item_ratings.updated_at
            "#,
            params![entry.subject, entry.rating.to_string(), practiced_at],
        )?;

        tx.commit()?;
        info!(
            subject = %entry.subject,
            rating = %entry.rating,
            elapsed_secs = entry.elapsed_secs,
            "recorded practice session"
        );
        Ok(())
    }

    /// Full history in the order it was recorded
    pub fn entries(&self) -> Result<Vec<HistoryEntry>> {
        self.query_entries(
            "SELECT subject, category, elapsed_secs, rating, practiced_at FROM history ORDER BY id ASC",
            None,
        )
    }

    /// Latest `limit` entries, most recent first
    pub fn recent_entries(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        self.query_entries(
            "SELECT subject, category, elapsed_secs, rating, practiced_at FROM history ORDER BY id DESC LIMIT ?1",
            Some(limit as i64),
        )
    }

    fn query_entries(&self, sql: &str, limit: Option<i64>) -> Result<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<HistoryEntry> {
            Ok(HistoryEntry {
                subject: row.get(0)?,
                category: row.get(1)?,
                elapsed_secs: row.get::<_, i64>(2)?.max(0) as u64,
                rating: parse_rating_column(row, 3)?,
                practiced_at: parse_timestamp_column(row, 4)?,
            })
        };
        let rows = match limit {
            Some(limit) => stmt.query_map([limit], map_row)?,
            None => stmt.query_map([], map_row)?,
        };

        let mut entries = Vec::new();
        for entry in rows {
            entries.push(entry?);
        }
        Ok(entries)
    }

    pub fn item_ratings(&self) -> Result<ItemRatings> {
        let mut stmt = self.conn.prepare("SELECT subject, rating FROM item_ratings")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, parse_rating_column(row, 1)?))
        })?;

        let mut ratings = ItemRatings::new();
        for row in rows {
            let (subject, rating) = row?;
            ratings.record(&subject, rating);
        }
        Ok(ratings)
    }

    pub fn rating_for(&self, subject: &str) -> Result<Option<Rating>> {
        let rating = self
            .conn
            .query_row(
                "SELECT rating FROM item_ratings WHERE subject = ?1",
                [subject],
                |row| parse_rating_column(row, 0),
            )
            .optional()?;
        Ok(rating)
    }

    /// Per-subject attempts and timing, most recently practiced first
    pub fn subject_summaries(&self) -> Result<Vec<SubjectSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                h.subject,
                (SELECT category FROM history WHERE subject = h.subject ORDER BY id DESC LIMIT 1),
                COUNT(*) AS attempts,
                AVG(h.elapsed_secs) AS avg_elapsed,
                r.rating,
                MAX(h.practiced_at) AS last_practiced
            FROM history h
            LEFT JOIN item_ratings r ON r.subject = h.subject
            GROUP BY h.subject
            ORDER BY last_practiced DESC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let rating: Option<String> = row.get(4)?;
            Ok(SubjectSummary {
                subject: row.get(0)?,
                category: row.get(1)?,
                attempts: row.get(2)?,
                avg_elapsed_secs: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
                last_rating: rating.and_then(|r| r.parse().ok()),
                last_practiced: parse_timestamp_column(row, 5)?,
            })
        })?;

        let mut summaries = Vec::new();
        for summary in rows {
            summaries.push(summary?);
        }
        Ok(summaries)
    }

    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM history", [])?;
        self.conn.execute("DELETE FROM item_ratings", [])?;
        Ok(())
    }
}

fn parse_rating_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Rating> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|_| {
        rusqlite::Error::InvalidColumnType(idx, "rating".to_string(), rusqlite::types::Type::Text)
    })
}

/// Fixed-width UTC text so SQL string comparison follows time order
fn timestamp_text(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            rusqlite::Error::InvalidColumnType(
                idx,
                "practiced_at".to_string(),
                rusqlite::types::Type::Text,
            )
        })
}
