//! SQLite interaction log.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use lorehound_core::error::{LorehoundError, Result};

/// One logged question/answer interaction.
#[derive(Debug, Clone)]
pub struct InteractionRecord {
    pub id: i64,
    pub query: String,
    pub search_query: Option<String>,
    pub search_results_count: usize,
    pub model_used: String,
    pub answer: Option<String>,
    pub created_at: String,
}

/// Append-only log of assistant interactions.
pub struct InteractionLog {
    conn: Mutex<Connection>,
}

impl InteractionLog {
    /// Open (or create) the log database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| LorehoundError::Memory(e.to_string()))?;
        Self::init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// In-memory log for tests and `--no-log` runs.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| LorehoundError::Memory(e.to_string()))?;
        Self::init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS interactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                query TEXT NOT NULL,
                search_query TEXT,
                search_results_count INTEGER NOT NULL DEFAULT 0,
                model_used TEXT NOT NULL,
                answer TEXT,
                created_at TEXT DEFAULT (datetime('now'))
            );",
        )
        .map_err(|e| LorehoundError::Memory(e.to_string()))?;
        Ok(())
    }

    /// Record an interaction, returning its row id.
    pub fn log_interaction(
        &self,
        query: &str,
        search_query: Option<&str>,
        search_results_count: usize,
        model_used: &str,
        answer: Option<&str>,
    ) -> Result<i64> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LorehoundError::Memory(e.to_string()))?;
        conn.execute(
            "INSERT INTO interactions (query, search_query, search_results_count, model_used, answer)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                query,
                search_query,
                search_results_count as i64,
                model_used,
                answer
            ],
        )
        .map_err(|e| LorehoundError::Memory(e.to_string()))?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent interactions, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<InteractionRecord>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LorehoundError::Memory(e.to_string()))?;
        let mut stmt = conn
            .prepare(
                "SELECT id, query, search_query, search_results_count, model_used, answer, created_at
                 FROM interactions ORDER BY id DESC LIMIT ?1",
            )
            .map_err(|e| LorehoundError::Memory(e.to_string()))?;
        let rows = stmt
            .query_map([limit as i64], |row| {
                Ok(InteractionRecord {
                    id: row.get(0)?,
                    query: row.get(1)?,
                    search_query: row.get(2)?,
                    search_results_count: row.get::<_, i64>(3)? as usize,
                    model_used: row.get(4)?,
                    answer: row.get(5)?,
                    created_at: row.get(6)?,
                })
            })
            .map_err(|e| LorehoundError::Memory(e.to_string()))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| LorehoundError::Memory(e.to_string()))
    }

    /// Total interaction count.
    pub fn count(&self) -> usize {
        let conn = match self.conn.lock() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row("SELECT COUNT(*) FROM interactions", [], |r| {
            r.get::<_, i64>(0)
        })
        .unwrap_or(0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_and_recent() {
        let log = InteractionLog::in_memory().unwrap();
        let id = log
            .log_interaction(
                "what is the policy?",
                Some("policy"),
                3,
                "gpt-4o-mini",
                Some("The policy is..."),
            )
            .unwrap();
        assert!(id > 0);

        let records = log.recent(10).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].query, "what is the policy?");
        assert_eq!(records[0].search_results_count, 3);
        assert_eq!(records[0].answer.as_deref(), Some("The policy is..."));
    }

    #[test]
    fn test_recent_orders_newest_first() {
        let log = InteractionLog::in_memory().unwrap();
        log.log_interaction("first", None, 0, "m", None).unwrap();
        log.log_interaction("second", None, 0, "m", None).unwrap();

        let records = log.recent(10).unwrap();
        assert_eq!(records[0].query, "second");
        assert_eq!(records[1].query, "first");
    }

    #[test]
    fn test_count() {
        let log = InteractionLog::in_memory().unwrap();
        assert_eq!(log.count(), 0);
        log.log_interaction("q", None, 0, "m", None).unwrap();
        log.log_interaction("q2", None, 1, "m", None).unwrap();
        assert_eq!(log.count(), 2);
    }

    #[test]
    fn test_recent_respects_limit() {
        let log = InteractionLog::in_memory().unwrap();
        for i in 0..5 {
            log.log_interaction(&format!("q{i}"), None, 0, "m", None)
                .unwrap();
        }
        assert_eq!(log.recent(2).unwrap().len(), 2);
    }
}
