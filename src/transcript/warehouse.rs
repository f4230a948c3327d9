//! SQLite transcript warehouse source.
//!
//! Queries a local warehouse table of enriched long-form transcripts, the
//! local stand-in for the upstream data-warehouse query.

use super::{TranscriptRecord, TranscriptSource};
use crate::error::{PlaybookError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// Transcript source backed by a SQLite warehouse database.
pub struct SqliteWarehouse {
    conn: Mutex<Connection>,
    min_chars: usize,
}

impl SqliteWarehouse {
    /// Open the warehouse at the given path, creating the schema if needed.
    pub fn open(path: &Path, min_chars: usize) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        info!("Opened transcript warehouse at {:?}", path);
        Ok(Self {
            conn: Mutex::new(conn),
            min_chars,
        })
    }

    /// Open an in-memory warehouse (useful for testing).
    pub fn in_memory(min_chars: usize) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            min_chars,
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS transcripts (
                video_id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                source_url TEXT NOT NULL,
                transcript TEXT NOT NULL,
                summary TEXT,
                topics TEXT,
                published_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_transcripts_published_at
                ON transcripts(published_at);
            "#,
        )?;
        Ok(())
    }

    /// Insert or replace a transcript row (used by import tooling and tests).
    pub fn upsert(&self, record: &TranscriptRecord) -> Result<()> {
        let conn = self.lock()?;

        let topics_json = serde_json::to_string(&record.topics)?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO transcripts
            (video_id, title, source_url, transcript, summary, topics, published_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.id,
                record.title,
                record.source_url,
                record.raw_text,
                record.summary,
                topics_json,
                record.published_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| PlaybookError::TranscriptSource(format!("failed to acquire lock: {}", e)))
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<TranscriptRecord> {
        let topics_json: Option<String> = row.get(5)?;
        let published_str: Option<String> = row.get(6)?;

        Ok(TranscriptRecord {
            id: row.get(0)?,
            title: row.get(1)?,
            source_url: row.get(2)?,
            raw_text: row.get(3)?,
            summary: row.get(4)?,
            topics: topics_json
                .and_then(|t| serde_json::from_str(&t).ok())
                .unwrap_or_default(),
            published_at: published_str.and_then(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            }),
        })
    }
}

#[async_trait]
impl TranscriptSource for SqliteWarehouse {
    async fn fetch(&self, limit: usize) -> Result<Vec<TranscriptRecord>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT video_id, title, source_url, transcript, summary, topics, published_at
            FROM transcripts
            WHERE length(transcript) >= ?1
            ORDER BY published_at DESC
            LIMIT ?2
            "#,
        )?;

        let rows = stmt.query_map(params![self.min_chars as i64, limit as i64], |row| {
            Self::row_to_record(row)
        })?;

        let records: Vec<TranscriptRecord> = rows.filter_map(|r| r.ok()).collect();
        info!("Fetched {} long-form transcripts from warehouse", records.len());
        Ok(records)
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<TranscriptRecord>> {
        let conn = self.lock()?;

        let result = conn.query_row(
            r#"
            SELECT video_id, title, source_url, transcript, summary, topics, published_at
            FROM transcripts
            WHERE video_id = ?1
            "#,
            params![id],
            |row| Self::row_to_record(row),
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, text: &str) -> TranscriptRecord {
        TranscriptRecord {
            id: id.to_string(),
            raw_text: text.to_string(),
            title: format!("Video {}", id),
            source_url: format!("https://youtube.com/watch?v={}", id),
            published_at: Some(Utc::now()),
            summary: None,
            topics: vec!["scaling".to_string()],
        }
    }

    #[tokio::test]
    async fn fetch_skips_short_transcripts() {
        let warehouse = SqliteWarehouse::in_memory(20).unwrap();
        warehouse.upsert(&record("short", "too short")).unwrap();
        warehouse
            .upsert(&record("long", "a transcript comfortably over the minimum length"))
            .unwrap();

        let records = warehouse.fetch(10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "long");
    }

    #[tokio::test]
    async fn fetch_by_id_roundtrips_metadata() {
        let warehouse = SqliteWarehouse::in_memory(0).unwrap();
        warehouse.upsert(&record("v1", "some transcript text")).unwrap();

        let fetched = warehouse.fetch_by_id("v1").await.unwrap().unwrap();
        assert_eq!(fetched.title, "Video v1");
        assert_eq!(fetched.topics, vec!["scaling".to_string()]);
        assert!(fetched.published_at.is_some());
    }
}
