//! Session-scoped persistence of legacy URLs and their matches.
//!
//! Every read and write takes a [`SessionId`]; a session never sees or
//! touches another session's rows.

pub mod session;
pub mod stats;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

pub use session::SessionId;

/// One legacy URL and its current match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegacyUrlRecord {
    pub id: i64,
    pub session_id: String,
    pub old_url: String,
    pub new_url: Option<String>,
    pub score: u8,
    pub created_at: DateTime<Utc>,
}

impl LegacyUrlRecord {
    pub fn is_matched(&self) -> bool {
        self.new_url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// Storage contract used by the matcher and the CLI.
pub trait UrlStore {
    /// Insert URLs for a session. Blank lines and anything not starting
    /// with `http` are skipped. Returns how many were inserted.
    fn insert_legacy_urls(&self, session: &SessionId, urls: &[String]) -> Result<usize>;

    /// All records of a session, best score first, newest first on ties.
    fn all_for_session(&self, session: &SessionId) -> Result<Vec<LegacyUrlRecord>>;

    /// Record a match. Rows of other sessions are never touched.
    fn update_match(&self, session: &SessionId, id: i64, new_url: &str, score: u8) -> Result<()>;

    /// Records with a non-empty target, best score first.
    fn matched_for_session(&self, session: &SessionId) -> Result<Vec<LegacyUrlRecord>>;

    /// Delete every record of a session. Returns the number removed.
    fn clear(&self, session: &SessionId) -> Result<usize>;

    /// Delete records of any session older than `max_age`.
    fn purge_expired(&self, max_age: Duration) -> Result<usize>;
}

/// [`UrlStore`] backed by SQLite.
pub struct SqliteUrlStore {
    db: Connection,
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS legacy_urls (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT NOT NULL,
        old_url TEXT NOT NULL,
        new_url TEXT,
        score INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_legacy_urls_session ON legacy_urls(session_id);";

const COLUMNS: &str = "id, session_id, old_url, new_url, score, created_at";

impl SqliteUrlStore {
    /// Open or create the database at `path`, then purge records older than `retention`.
    pub fn open(path: &Path, retention: Duration) -> Result<Self> {
        let store = Self::connect(path)?;
        let purged = store.purge_expired(retention)?;
        if purged > 0 {
            info!(purged, "expired legacy urls removed");
        }
        Ok(store)
    }

    /// Open or create the database at `path` without purging.
    pub fn connect(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let db = Connection::open(path)
            .with_context(|| format!("failed to open url store: {}", path.display()))?;
        Self::init(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("failed to open in-memory url store")?;
        Self::init(db)
    }

    fn init(db: Connection) -> Result<Self> {
        db.execute_batch(SCHEMA).context("failed to create legacy_urls table")?;
        Ok(Self { db })
    }

    fn query(&self, sql: &str, session: &SessionId) -> Result<Vec<LegacyUrlRecord>> {
        let mut stmt = self.db.prepare(sql)?;
        let rows = stmt
            .query_map(rusqlite::params![session.as_str()], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Look up one record of a session.
    pub fn get(&self, session: &SessionId, id: i64) -> Result<Option<LegacyUrlRecord>> {
        let sql = format!("SELECT {COLUMNS} FROM legacy_urls WHERE session_id = ?1 AND id = ?2");
        let record = self
            .db
            .query_row(&sql, rusqlite::params![session.as_str(), id], row_to_record)
            .optional()?;
        Ok(record)
    }

    #[cfg(test)]
    fn backdate(&self, id: i64, created_at: DateTime<Utc>) -> Result<()> {
        self.db.execute(
            "UPDATE legacy_urls SET created_at = ?1 WHERE id = ?2",
            rusqlite::params![timestamp(created_at), id],
        )?;
        Ok(())
    }
}

/// Fixed-width UTC timestamps so text comparison follows time order.
fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<LegacyUrlRecord> {
    let created: String = row.get(5)?;
    let created_at = DateTime::parse_from_rfc3339(&created)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e)))?;
    let score: i64 = row.get(4)?;
    Ok(LegacyUrlRecord {
        id: row.get(0)?,
        session_id: row.get(1)?,
        old_url: row.get(2)?,
        new_url: row.get(3)?,
        score: score.clamp(0, 100) as u8,
        created_at,
    })
}

impl UrlStore for SqliteUrlStore {
    fn insert_legacy_urls(&self, session: &SessionId, urls: &[String]) -> Result<usize> {
        let now = timestamp(Utc::now());
        let tx = self.db.unchecked_transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO legacy_urls (session_id, old_url, new_url, score, created_at)
                 VALUES (?1, ?2, NULL, 0, ?3)",
            )?;
            for url in urls {
                let url = url.trim();
                if url.is_empty() || !url.starts_with("http") {
                    continue;
                }
                stmt.execute(rusqlite::params![session.as_str(), url, now])?;
                inserted += 1;
            }
        }
        tx.commit()?;
        debug!(session = %session, inserted, "legacy urls inserted");
        Ok(inserted)
    }

    fn all_for_session(&self, session: &SessionId) -> Result<Vec<LegacyUrlRecord>> {
        self.query(
            &format!("SELECT {COLUMNS} FROM legacy_urls WHERE session_id = ?1 ORDER BY score DESC, id DESC"),
            session,
        )
    }

    fn update_match(&self, session: &SessionId, id: i64, new_url: &str, score: u8) -> Result<()> {
        self.db
            .execute(
                "UPDATE legacy_urls SET new_url = ?1, score = ?2 WHERE id = ?3 AND session_id = ?4",
                rusqlite::params![new_url, score, id, session.as_str()],
            )
            .with_context(|| format!("failed to update legacy url {id}"))?;
        Ok(())
    }

    fn matched_for_session(&self, session: &SessionId) -> Result<Vec<LegacyUrlRecord>> {
        self.query(
            &format!(
                "SELECT {COLUMNS} FROM legacy_urls
                 WHERE session_id = ?1 AND new_url IS NOT NULL AND new_url != ''
                 ORDER BY score DESC, id DESC"
            ),
            session,
        )
    }

    fn clear(&self, session: &SessionId) -> Result<usize> {
        let rows = self.db.execute(
            "DELETE FROM legacy_urls WHERE session_id = ?1",
            rusqlite::params![session.as_str()],
        )?;
        Ok(rows)
    }

    fn purge_expired(&self, max_age: Duration) -> Result<usize> {
        let cutoff = timestamp(Utc::now() - max_age);
        let rows = self
            .db
            .execute("DELETE FROM legacy_urls WHERE created_at < ?1", rusqlite::params![cutoff])
            .context("failed to purge expired legacy urls")?;
        Ok(rows)
    }
}
