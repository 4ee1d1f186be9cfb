//! Repository layer contracts and persistence implementations.
//!
//! # Responsibility
//! - Define data access contracts used by wired owners.
//! - Keep SQL details behind the shared transaction handle.
//!
//! # Invariants
//! - Repositories are constructed from a transaction context and never own
//!   the transaction's lifecycle.

pub mod kv_repo;
