//! Key/value repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist string entries inside the caller's shared transaction.
//! - Be constructible by field wiring from an owner's transaction.
//!
//! # Invariants
//! - Every statement runs on the wired `TransactionHandle`; the repository
//!   never commits or rolls back on its own.
//! - Keys are non-empty and contain no control characters.

use crate::db::{DbError, TransactionHandle};
use crate::wire::FromTransaction;
use rusqlite::{params, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for key/value operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Constructed without a transaction context.
    TransactionRequired,
    InvalidKey(String),
    /// A repository field was read before it was wired.
    Unwired(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::TransactionRequired => {
                write!(f, "key/value repository requires a transaction context")
            }
            Self::InvalidKey(key) => write!(f, "invalid key: {key:?}"),
            Self::Unwired(field) => write!(f, "repository field `{field}` is not wired"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::TransactionRequired | Self::InvalidKey(_) | Self::Unwired(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Repository interface for key/value entries.
pub trait KvRepository {
    /// Inserts or replaces the value stored under `key`.
    fn put(&self, key: &str, value: &str) -> RepoResult<()>;
    fn get(&self, key: &str) -> RepoResult<Option<String>>;
    /// Deletes `key`; returns whether an entry existed.
    fn delete(&self, key: &str) -> RepoResult<bool>;
    /// Returns all keys sorted ascending.
    fn keys(&self) -> RepoResult<Vec<String>>;
}

/// SQLite-backed key/value repository bound to one transaction.
#[derive(Debug, Clone)]
pub struct SqliteKvRepository {
    tx: TransactionHandle,
}

impl SqliteKvRepository {
    pub fn new(tx: TransactionHandle) -> Self {
        Self { tx }
    }

    pub fn transaction(&self) -> &TransactionHandle {
        &self.tx
    }
}

impl FromTransaction<TransactionHandle> for SqliteKvRepository {
    type Error = RepoError;

    fn from_transaction(tx: Option<TransactionHandle>) -> Result<Self, Self::Error> {
        tx.map(Self::new).ok_or(RepoError::TransactionRequired)
    }
}

impl KvRepository for SqliteKvRepository {
    fn put(&self, key: &str, value: &str) -> RepoResult<()> {
        validate_key(key)?;
        self.tx.with_conn(|conn| {
            conn.execute(
                "INSERT INTO kv_entries (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = (strftime('%s', 'now') * 1000);",
                params![key, value],
            )
        })?;
        Ok(())
    }

    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        validate_key(key)?;
        let value = self.tx.with_conn(|conn| {
            conn.query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
        })?;
        Ok(value)
    }

    fn delete(&self, key: &str) -> RepoResult<bool> {
        validate_key(key)?;
        let changed = self.tx.with_conn(|conn| {
            conn.execute("DELETE FROM kv_entries WHERE key = ?1;", params![key])
        })?;
        Ok(changed > 0)
    }

    fn keys(&self) -> RepoResult<Vec<String>> {
        let keys = self.tx.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT key FROM kv_entries ORDER BY key ASC;")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })?;
        Ok(keys)
    }
}

fn validate_key(key: &str) -> RepoResult<()> {
    if key.is_empty() || key.chars().any(char::is_control) {
        return Err(RepoError::InvalidKey(key.to_string()));
    }
    Ok(())
}
