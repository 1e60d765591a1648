// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The credit ledger: atomic balance mutation with an audit entry per
//! mutation.
//!
//! Every balance change appends an immutable [`LedgerEntry`] and updates
//! the cached balance on the account in the same write transaction, so
//! the stored balance always equals the sum of the account's deltas. A
//! mutation that would drive the balance negative fails without writing
//! anything.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};

use super::{next_id, Account, CreditStore, StoreError, StoreResult, ACCOUNTS, LEDGER, LEDGER_BY_ACCOUNT};

/// One immutable balance-changing event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Monotonic id, auto-assigned.
    pub id: u64,
    /// Account whose balance changed.
    pub account_id: u64,
    /// Who performed the mutation (self for earn events, admin id for
    /// manual adjustments).
    pub actor_id: u64,
    /// Signed amount in cents.
    pub delta_cents: i64,
    /// Categorical tag or free text, e.g. "topup".
    pub reason: String,
    /// When the mutation was applied.
    pub created_at: DateTime<Utc>,
}

/// A ledger entry joined with subject and actor identifiers, for the
/// admin audit view.
#[derive(Debug, Clone)]
pub struct AuditedEntry {
    pub entry: LedgerEntry,
    pub account_identifier: String,
    pub actor_identifier: String,
}

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a composite key for the ledger_by_account index.
///
/// Format: `account_id_be | inverted_entry_id_be`
///
/// Entry ids are monotonic, so inverting them makes forward range scans
/// yield newest entries first.
fn make_index_key(account_id: u64, entry_id: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&account_id.to_be_bytes());
    key[8..].copy_from_slice(&(!entry_id).to_be_bytes());
    key
}

/// Inclusive range bounds covering all index keys of one account.
fn account_range(account_id: u64) -> ([u8; 16], [u8; 16]) {
    let mut start = [0u8; 16];
    start[..8].copy_from_slice(&account_id.to_be_bytes());
    let mut end = [0xFFu8; 16];
    end[..8].copy_from_slice(&account_id.to_be_bytes());
    (start, end)
}

// =============================================================================
// Ledger Operations
// =============================================================================

impl CreditStore {
    /// Apply a signed delta to an account's balance.
    ///
    /// Fails with [`StoreError::InsufficientFunds`] (writing nothing) if
    /// the result would be negative. Otherwise the ledger entry and the
    /// cached balance land in one transaction. A commit failure is
    /// retried once; callers see only the final outcome.
    pub fn apply_delta(
        &self,
        account_id: u64,
        delta_cents: i64,
        actor_id: u64,
        reason: &str,
    ) -> StoreResult<i64> {
        match self.apply_delta_once(account_id, delta_cents, actor_id, reason) {
            Err(StoreError::RedbCommit(e)) => {
                tracing::warn!(account_id, error = %e, "ledger commit failed, retrying once");
                self.apply_delta_once(account_id, delta_cents, actor_id, reason)
            }
            other => other,
        }
    }

    fn apply_delta_once(
        &self,
        account_id: u64,
        delta_cents: i64,
        actor_id: u64,
        reason: &str,
    ) -> StoreResult<i64> {
        let write_txn = self.db().begin_write()?;
        let new_balance = {
            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            let raw = {
                let existing = accounts
                    .get(account_id)?
                    .ok_or_else(|| StoreError::NotFound(format!("account {account_id}")))?;
                existing.value().to_vec()
            };
            let mut account: Account = serde_json::from_slice(&raw)?;

            let new_balance = account
                .balance_cents
                .checked_add(delta_cents)
                .ok_or(StoreError::Overflow)?;
            if new_balance < 0 {
                // Dropping the transaction aborts it: nothing was written.
                return Err(StoreError::InsufficientFunds {
                    balance_cents: account.balance_cents,
                    delta_cents,
                });
            }

            let entry_id = next_id(&write_txn, "next_ledger_id")?;
            let entry = LedgerEntry {
                id: entry_id,
                account_id,
                actor_id,
                delta_cents,
                reason: reason.to_string(),
                created_at: Utc::now(),
            };

            let mut ledger = write_txn.open_table(LEDGER)?;
            ledger.insert(entry_id, serde_json::to_vec(&entry)?.as_slice())?;

            let mut index = write_txn.open_table(LEDGER_BY_ACCOUNT)?;
            index.insert(make_index_key(account_id, entry_id).as_slice(), entry_id)?;

            account.balance_cents = new_balance;
            accounts.insert(account_id, serde_json::to_vec(&account)?.as_slice())?;
            new_balance
        };
        write_txn.commit()?;
        Ok(new_balance)
    }

    /// Current cached balance.
    pub fn balance(&self, account_id: u64) -> StoreResult<i64> {
        let account = self
            .find_by_id(account_id)?
            .ok_or_else(|| StoreError::NotFound(format!("account {account_id}")))?;
        Ok(account.balance_cents)
    }

    /// Ledger entries for one account, newest first, at most `limit`.
    pub fn history(&self, account_id: u64, limit: usize) -> StoreResult<Vec<LedgerEntry>> {
        let read_txn = self.db().begin_read()?;
        let index = read_txn.open_table(LEDGER_BY_ACCOUNT)?;
        let ledger = read_txn.open_table(LEDGER)?;

        let (start, end) = account_range(account_id);
        let mut entries = Vec::new();
        for item in index.range(start.as_slice()..=end.as_slice())?.take(limit) {
            let (_, entry_id) = item?;
            if let Some(raw) = ledger.get(entry_id.value())? {
                entries.push(serde_json::from_slice(raw.value())?);
            }
        }
        Ok(entries)
    }

    /// All ledger entries newest first, joined with subject and actor
    /// identifiers, at most `limit`.
    pub fn audit_log(&self, limit: usize) -> StoreResult<Vec<AuditedEntry>> {
        let read_txn = self.db().begin_read()?;
        let ledger = read_txn.open_table(LEDGER)?;
        let accounts = read_txn.open_table(ACCOUNTS)?;

        let mut identifier_cache: HashMap<u64, String> = HashMap::new();
        let mut lookup = |id: u64| -> StoreResult<String> {
            if let Some(identifier) = identifier_cache.get(&id) {
                return Ok(identifier.clone());
            }
            let identifier = match accounts.get(id)? {
                Some(raw) => {
                    let account: Account = serde_json::from_slice(raw.value())?;
                    account.identifier
                }
                // Accounts are never deleted, but don't let a stray id
                // poison the whole listing.
                None => format!("account {id}"),
            };
            identifier_cache.insert(id, identifier.clone());
            Ok(identifier)
        };

        let mut result = Vec::new();
        for item in ledger.iter()?.rev().take(limit) {
            let (_, raw) = item?;
            let entry: LedgerEntry = serde_json::from_slice(raw.value())?;
            let account_identifier = lookup(entry.account_id)?;
            let actor_identifier = lookup(entry.actor_id)?;
            result.push(AuditedEntry {
                entry,
                account_identifier,
                actor_identifier,
            });
        }
        Ok(result)
    }

    /// Recompute a balance from scratch as the sum of all deltas.
    ///
    /// Exists for consistency checks; the cached balance must always
    /// match it.
    pub fn reconstructed_balance(&self, account_id: u64) -> StoreResult<i64> {
        let read_txn = self.db().begin_read()?;
        let index = read_txn.open_table(LEDGER_BY_ACCOUNT)?;
        let ledger = read_txn.open_table(LEDGER)?;

        let (start, end) = account_range(account_id);
        let mut sum = 0i64;
        for item in index.range(start.as_slice()..=end.as_slice())? {
            let (_, entry_id) = item?;
            if let Some(raw) = ledger.get(entry_id.value())? {
                let entry: LedgerEntry = serde_json::from_slice(raw.value())?;
                sum += entry.delta_cents;
            }
        }
        Ok(sum)
    }
}

// =============================================================================
// Tests
// =============================================================================
