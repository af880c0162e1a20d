//! Database module for finbot
//!
//! Append-only log of conversation turns. Every call takes the connection,
//! commits, and releases it before returning.

mod schema;

pub use schema::*;

use crate::resolver::NudgePolicy;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Turn not found: {0}")]
    TurnNotFound(TurnId),
    #[error("Turn already has a response: {0}")]
    TurnAlreadyAnswered(TurnId),
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // Writes commit before the guard drops, so a poisoned lock is still usable
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.conn();
        // Writes must reach disk before the call returns
        conn.pragma_update(None, "synchronous", "FULL")?;
        conn.execute_batch(SCHEMA)?;

        // Tables written before turn states existed lack the column
        let has_state: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM pragma_table_info('conversation_logs') WHERE name = 'state')",
            [],
            |row| row.get(0),
        )?;
        if !has_state {
            let tx = conn.unchecked_transaction()?;
            tx.execute(MIGRATION_ADD_STATE, [])?;
            let backfilled = backfill_states(&tx, &NudgePolicy::default())?;
            tx.commit()?;
            tracing::info!(rows = backfilled, "Added state column to conversation_logs");
        }

        Ok(())
    }

    // ==================== Turn Operations ====================

    /// Append a turn with no response yet
    pub fn append_turn(&self, user_id: &str, prompt: &str) -> DbResult<TurnId> {
        let conn = self.conn();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO conversation_logs (user_id, user_prompt, bot_response, state, timestamp)
             VALUES (?1, ?2, NULL, ?3, ?4)",
            params![user_id, prompt, TurnState::Pending.as_str(), now.to_rfc3339()],
        )?;

        let id = conn.last_insert_rowid();
        tracing::debug!(turn_id = id, user_id = %user_id, "Appended pending turn");
        Ok(id)
    }

    /// Attach the response to a pending turn.
    ///
    /// Only a turn whose response is still absent can be updated, so an
    /// answered turn is never rewritten.
    pub fn attach_response(&self, id: TurnId, response: &str, state: TurnState) -> DbResult<()> {
        let conn = self.conn();

        let updated = conn.execute(
            "UPDATE conversation_logs SET bot_response = ?1, state = ?2
             WHERE id = ?3 AND bot_response IS NULL",
            params![response, state.as_str(), id],
        )?;

        if updated == 0 {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM conversation_logs WHERE id = ?1)",
                params![id],
                |row| row.get(0),
            )?;
            return Err(if exists {
                DbError::TurnAlreadyAnswered(id)
            } else {
                DbError::TurnNotFound(id)
            });
        }

        tracing::debug!(turn_id = id, state = %state, "Attached response");
        Ok(())
    }

    /// Append a turn whose prompt and response are both known up front
    pub fn record_exchange(
        &self,
        user_id: &str,
        prompt: &str,
        response: &str,
        state: TurnState,
    ) -> DbResult<Turn> {
        let conn = self.conn();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO conversation_logs (user_id, user_prompt, bot_response, state, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user_id, prompt, response, state.as_str(), now.to_rfc3339()],
        )?;

        Ok(Turn {
            id: conn.last_insert_rowid(),
            user_id: user_id.to_string(),
            prompt: prompt.to_string(),
            response: Some(response.to_string()),
            state,
            created_at: now,
        })
    }

    /// Most recent turn for a user, by id
    pub fn latest_turn(&self, user_id: &str) -> DbResult<Option<Turn>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, user_prompt, bot_response, state, timestamp
             FROM conversation_logs WHERE user_id = ?1 ORDER BY id DESC LIMIT 1",
        )?;

        stmt.query_row(params![user_id], parse_turn_row)
            .optional()
            .map_err(DbError::from)
    }

    /// Get a turn by id
    #[allow(dead_code)] // Used in tests
    pub fn get_turn(&self, id: TurnId) -> DbResult<Turn> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, user_prompt, bot_response, state, timestamp
             FROM conversation_logs WHERE id = ?1",
        )?;

        stmt.query_row(params![id], parse_turn_row)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => DbError::TurnNotFound(id),
                other => DbError::Sqlite(other),
            })
    }

    /// All turns for a user, oldest first
    #[allow(dead_code)] // Used in tests
    pub fn list_turns(&self, user_id: &str) -> DbResult<Vec<Turn>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, user_prompt, bot_response, state, timestamp
             FROM conversation_logs WHERE user_id = ?1 ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(params![user_id], parse_turn_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }
}

/// Derive the state of answered rows from their stored response text
fn backfill_states(conn: &Connection, policy: &NudgePolicy) -> DbResult<usize> {
    let answered: Vec<(TurnId, String)> = {
        let mut stmt = conn.prepare(
            "SELECT id, bot_response FROM conversation_logs WHERE bot_response IS NOT NULL",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, TurnId>(0)?, row.get::<_, String>(1)?))
        })?;
        rows.collect::<Result<_, _>>()?
    };

    let mut update = conn.prepare("UPDATE conversation_logs SET state = ?1 WHERE id = ?2")?;
    for (id, response) in &answered {
        update.execute(params![policy.classify(response).as_str(), id])?;
    }
    Ok(answered.len())
}

/// Parse a turn row from the database
fn parse_turn_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Turn> {
    let state = row.get::<_, String>(4)?.parse::<TurnState>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Turn {
        id: row.get(0)?,
        user_id: row.get(1)?,
        prompt: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        response: row.get(3)?,
        state,
        created_at: row
            .get::<_, Option<String>>(5)?
            .as_deref()
            .and_then(parse_datetime)
            .unwrap_or_default(),
    })
}

/// RFC 3339, or the naive UTC `YYYY-MM-DD HH:MM:SS[.ffffff]` of older rows
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .map(|dt| dt.and_utc())
        })
}
