// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded credential + ledger store backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `accounts`: account_id → serialized Account (JSON bytes)
//! - `identifiers`: normalized identifier → account_id (unique index)
//! - `ledger`: entry_id → serialized LedgerEntry (JSON bytes)
//! - `ledger_by_account`: composite key (account_id_be | !entry_id_be) → entry_id
//! - `meta`: key → u64 (monotonic id counters)
//!
//! redb serializes write transactions, so every multi-table mutation here
//! (uniqueness check + insert, ledger append + balance update) is atomic
//! and balance mutations on one account are linearizable.

mod accounts;
mod ledger;

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};
use unicode_normalization::UnicodeNormalization;

pub use accounts::Account;
pub use ledger::{AuditedEntry, LedgerEntry};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: account_id → serialized Account (JSON bytes).
const ACCOUNTS: TableDefinition<u64, &[u8]> = TableDefinition::new("accounts");

/// Unique index: normalized (NFKC, lowercased) identifier → account_id.
const IDENTIFIERS: TableDefinition<&str, u64> = TableDefinition::new("identifiers");

/// Primary table: entry_id → serialized LedgerEntry (JSON bytes).
const LEDGER: TableDefinition<u64, &[u8]> = TableDefinition::new("ledger");

/// Index: composite key → entry_id.
/// Key format: `account_id_be | !entry_id_be` for newest-first range scans.
const LEDGER_BY_ACCOUNT: TableDefinition<&[u8], u64> = TableDefinition::new("ledger_by_account");

/// Monotonic counters: "next_account_id", "next_ledger_id".
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("identifier already taken: {0}")]
    Conflict(String),

    #[error("insufficient funds: balance {balance_cents}, delta {delta_cents}")]
    InsufficientFunds { balance_cents: i64, delta_cents: i64 },

    #[error("balance arithmetic overflow")]
    Overflow,
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// CreditStore
// =============================================================================

/// Embedded ACID store for accounts and the credit ledger.
pub struct CreditStore {
    db: Database,
}

impl CreditStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ACCOUNTS)?;
            let _ = write_txn.open_table(IDENTIFIERS)?;
            let _ = write_txn.open_table(LEDGER)?;
            let _ = write_txn.open_table(LEDGER_BY_ACCOUNT)?;
            let _ = write_txn.open_table(META)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    pub(crate) fn db(&self) -> &Database {
        &self.db
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Canonical form of an identifier for uniqueness and lookup.
///
/// NFKC-normalized and lowercased, so "Alice", "alice", and visually
/// equivalent Unicode spellings all collide.
pub fn normalize_identifier(identifier: &str) -> String {
    identifier.trim().nfkc().collect::<String>().to_lowercase()
}

/// Allocate the next value of a monotonic counter inside a write
/// transaction. Safe because redb allows a single writer at a time.
fn next_id(txn: &WriteTransaction, counter: &str) -> StoreResult<u64> {
    let mut meta = txn.open_table(META)?;
    let next = meta.get(counter)?.map(|v| v.value()).unwrap_or(1);
    meta.insert(counter, next + 1)?;
    Ok(next)
}

#[cfg(test)]
pub(crate) fn temp_store() -> (CreditStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = CreditStore::open(&dir.path().join("test.redb")).unwrap();
    (store, dir)
}
