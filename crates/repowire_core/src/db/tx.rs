//! Shared SQLite transaction handle.
//!
//! # Responsibility
//! - Own one connection with an open transaction.
//! - Let every repository wired into an owner run statements on it.
//!
//! # Invariants
//! - Clones share the same connection and the same transaction.
//! - After `commit` or `rollback`, every clone rejects further statements.
//! - Dropping the last clone while open rolls the transaction back (SQLite
//!   does this when the connection closes).

use super::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Identifier of one transaction, used in logs and errors.
pub type TxId = Uuid;

/// Cloneable handle to one open SQLite transaction.
#[derive(Clone)]
pub struct TransactionHandle {
    inner: Arc<TxShared>,
}

struct TxShared {
    id: TxId,
    state: Mutex<TxState>,
}

struct TxState {
    conn: Connection,
    open: bool,
}

impl TransactionHandle {
    /// Starts an immediate transaction on `conn` and takes ownership of it.
    pub fn begin(conn: Connection) -> DbResult<Self> {
        conn.execute_batch("BEGIN IMMEDIATE;")?;
        let id = Uuid::new_v4();
        debug!("event=tx_begin module=db status=ok tx_id={id}");
        Ok(Self {
            inner: Arc::new(TxShared {
                id,
                state: Mutex::new(TxState { conn, open: true }),
            }),
        })
    }

    pub fn id(&self) -> TxId {
        self.inner.id
    }

    /// Returns whether `other` is a clone of this handle.
    pub fn same_transaction(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_open(&self) -> DbResult<bool> {
        Ok(self.lock()?.open)
    }

    /// Runs `f` against the transaction's connection.
    ///
    /// # Errors
    /// - `TransactionClosed` after commit or rollback.
    /// - `Sqlite` when `f` fails.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> DbResult<T> {
        let state = self.lock_open()?;
        Ok(f(&state.conn)?)
    }

    /// Commits the transaction for every clone.
    pub fn commit(&self) -> DbResult<()> {
        self.finish("COMMIT;", "tx_commit")
    }

    /// Rolls the transaction back for every clone.
    pub fn rollback(&self) -> DbResult<()> {
        self.finish("ROLLBACK;", "tx_rollback")
    }

    fn finish(&self, sql: &str, event: &str) -> DbResult<()> {
        let mut state = self.lock_open()?;
        state.conn.execute_batch(sql)?;
        state.open = false;
        info!("event={event} module=db status=ok tx_id={}", self.inner.id);
        Ok(())
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, TxState>> {
        self.inner
            .state
            .lock()
            .map_err(|_| DbError::LockPoisoned(self.inner.id))
    }

    fn lock_open(&self) -> DbResult<MutexGuard<'_, TxState>> {
        let state = self.lock()?;
        if !state.open {
            return Err(DbError::TransactionClosed(self.inner.id));
        }
        Ok(state)
    }
}

impl PartialEq for TransactionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_transaction(other)
    }
}

impl Eq for TransactionHandle {}

impl Debug for TransactionHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionHandle")
            .field("id", &self.inner.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::TransactionHandle;
    use crate::db::{open_db_in_memory, DbError};

    #[test]
    fn clones_share_one_transaction() {
        let tx = TransactionHandle::begin(open_db_in_memory().unwrap()).unwrap();
        let clone = tx.clone();

        assert_eq!(tx, clone);
        assert_eq!(tx.id(), clone.id());

        tx.with_conn(|conn| {
            conn.execute(
                "INSERT INTO kv_entries (key, value) VALUES ('a', '1');",
                [],
            )
        })
        .unwrap();
        let seen: String = clone
            .with_conn(|conn| {
                conn.query_row("SELECT value FROM kv_entries WHERE key = 'a';", [], |row| {
                    row.get(0)
                })
            })
            .unwrap();
        assert_eq!(seen, "1");
    }

    #[test]
    fn closed_transaction_rejects_statements_on_every_clone() {
        let tx = TransactionHandle::begin(open_db_in_memory().unwrap()).unwrap();
        let clone = tx.clone();

        tx.commit().unwrap();

        assert!(!clone.is_open().unwrap());
        let err = clone.with_conn(|conn| conn.execute_batch("SELECT 1;")).unwrap_err();
        assert!(matches!(err, DbError::TransactionClosed(id) if id == tx.id()));
        assert!(matches!(clone.rollback(), Err(DbError::TransactionClosed(_))));
    }

    #[test]
    fn separate_transactions_are_not_equal() {
        let first = TransactionHandle::begin(open_db_in_memory().unwrap()).unwrap();
        let second = TransactionHandle::begin(open_db_in_memory().unwrap()).unwrap();
        assert_ne!(first, second);
    }
}
