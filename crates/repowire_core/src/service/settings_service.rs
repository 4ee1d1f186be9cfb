//! Settings use-case service.
//!
//! # Responsibility
//! - Own one transaction and the key/value repository wired from it.
//! - Expose settings reads/writes and the transaction outcome to callers.
//!
//! # Invariants
//! - `store` is wired once, during construction, before any read.
//! - Writes become durable only after `commit`.

use crate::db::{DbResult, TransactionHandle};
use crate::repo::kv_repo::{KvRepository, RepoError, RepoResult, SqliteKvRepository};
use crate::wire::{FieldRegistry, FieldSlot, Owner, WireResult, Wired};

const STORE_FIELD: &str = "store";

/// Settings service whose repository is wired from its own transaction.
#[derive(Debug)]
pub struct SettingsService {
    transaction: Option<TransactionHandle>,
    store: Wired<SqliteKvRepository>,
}

impl Owner for SettingsService {
    type Tx = TransactionHandle;

    fn transaction(&self) -> Option<TransactionHandle> {
        self.transaction.clone()
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut dyn FieldSlot> {
        match name {
            STORE_FIELD => Some(&mut self.store),
            _ => None,
        }
    }
}

impl SettingsService {
    /// Creates the service and wires its repository from `transaction`.
    ///
    /// # Errors
    /// - `WireError::Construction` wrapping `RepoError::TransactionRequired`
    ///   when `transaction` is `None`.
    pub fn new(transaction: Option<TransactionHandle>) -> WireResult<Self> {
        let mut service = Self {
            transaction,
            store: Wired::unwired(),
        };
        Self::wiring()?.wire_all(&mut service)?;
        Ok(service)
    }

    /// Field declarations for this owner type.
    pub fn wiring() -> WireResult<FieldRegistry<Self>> {
        FieldRegistry::<Self>::new().declare::<SqliteKvRepository>(STORE_FIELD)
    }

    pub fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        self.store()?.put(key, value)
    }

    pub fn get(&self, key: &str) -> RepoResult<Option<String>> {
        self.store()?.get(key)
    }

    /// Returns the stored value or `default` when the key is absent.
    pub fn get_or(&self, key: &str, default: &str) -> RepoResult<String> {
        Ok(self.get(key)?.unwrap_or_else(|| default.to_string()))
    }

    pub fn remove(&self, key: &str) -> RepoResult<bool> {
        self.store()?.delete(key)
    }

    pub fn keys(&self) -> RepoResult<Vec<String>> {
        self.store()?.keys()
    }

    pub fn commit(&self) -> DbResult<()> {
        match &self.transaction {
            Some(tx) => tx.commit(),
            None => Ok(()),
        }
    }

    pub fn rollback(&self) -> DbResult<()> {
        match &self.transaction {
            Some(tx) => tx.rollback(),
            None => Ok(()),
        }
    }

    fn store(&self) -> RepoResult<&SqliteKvRepository> {
        self.store.get().ok_or(RepoError::Unwired(STORE_FIELD))
    }
}
