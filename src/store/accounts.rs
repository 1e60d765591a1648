// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account records: creation, lookup, ban flag, password updates.
//!
//! No business policy lives here; this is storage with uniqueness
//! enforcement. Accounts are never physically deleted — the ban flag is
//! the soft-delete mechanism.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};

use crate::auth::Role;

use super::{next_id, normalize_identifier, CreditStore, StoreError, StoreResult, ACCOUNTS, IDENTIFIERS};

/// A stored account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique id, assigned at creation, immutable.
    pub id: u64,
    /// Login name or email, original casing preserved for display.
    /// Uniqueness is enforced on the normalized form.
    pub identifier: String,
    /// Argon2id PHC hash; `None` for external-identity accounts.
    pub password_hash: Option<String>,
    /// Authorization role.
    pub role: Role,
    /// Soft-delete / lockout flag.
    pub banned: bool,
    /// Cached balance; always equals the sum of this account's ledger
    /// deltas.
    pub balance_cents: i64,
    /// Set once at creation.
    pub created_at: DateTime<Utc>,
}

impl CreditStore {
    /// Create an account.
    ///
    /// Fails with [`StoreError::Conflict`] if the normalized identifier
    /// is already taken. The uniqueness check and both inserts happen in
    /// one write transaction.
    pub fn create_account(
        &self,
        identifier: &str,
        password_hash: Option<String>,
        role: Role,
    ) -> StoreResult<Account> {
        let display = identifier.trim().to_string();
        let normalized = normalize_identifier(identifier);

        let write_txn = self.db().begin_write()?;
        let account = {
            let mut identifiers = write_txn.open_table(IDENTIFIERS)?;
            if identifiers.get(normalized.as_str())?.is_some() {
                return Err(StoreError::Conflict(display));
            }

            let id = next_id(&write_txn, "next_account_id")?;
            let account = Account {
                id,
                identifier: display,
                password_hash,
                role,
                banned: false,
                balance_cents: 0,
                created_at: Utc::now(),
            };

            identifiers.insert(normalized.as_str(), id)?;
            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            accounts.insert(id, serde_json::to_vec(&account)?.as_slice())?;
            account
        };
        write_txn.commit()?;
        Ok(account)
    }

    /// Find-or-create an account for a verified external identity.
    ///
    /// Created accounts have no local password and the `user` role.
    /// Atomic: a concurrent first login cannot create two accounts.
    pub fn upsert_external(&self, identifier: &str) -> StoreResult<Account> {
        let display = identifier.trim().to_string();
        let normalized = normalize_identifier(identifier);

        let write_txn = self.db().begin_write()?;
        let account = {
            let mut identifiers = write_txn.open_table(IDENTIFIERS)?;
            let mut accounts = write_txn.open_table(ACCOUNTS)?;

            let existing_id = identifiers.get(normalized.as_str())?.map(|v| v.value());
            match existing_id {
                Some(id) => {
                    let raw = accounts
                        .get(id)?
                        .ok_or_else(|| StoreError::NotFound(format!("account {id}")))?
                        .value()
                        .to_vec();
                    serde_json::from_slice(&raw)?
                }
                None => {
                    let id = next_id(&write_txn, "next_account_id")?;
                    let account = Account {
                        id,
                        identifier: display,
                        password_hash: None,
                        role: Role::User,
                        banned: false,
                        balance_cents: 0,
                        created_at: Utc::now(),
                    };
                    identifiers.insert(normalized.as_str(), id)?;
                    accounts.insert(id, serde_json::to_vec(&account)?.as_slice())?;
                    account
                }
            }
        };
        write_txn.commit()?;
        Ok(account)
    }

    /// Look up an account by identifier (case-insensitive).
    pub fn find_by_identifier(&self, identifier: &str) -> StoreResult<Option<Account>> {
        let normalized = normalize_identifier(identifier);
        let read_txn = self.db().begin_read()?;
        let identifiers = read_txn.open_table(IDENTIFIERS)?;

        let Some(id) = identifiers.get(normalized.as_str())?.map(|v| v.value()) else {
            return Ok(None);
        };

        let accounts = read_txn.open_table(ACCOUNTS)?;
        match accounts.get(id)? {
            Some(raw) => Ok(Some(serde_json::from_slice(raw.value())?)),
            None => Ok(None),
        }
    }

    /// Look up an account by id.
    pub fn find_by_id(&self, id: u64) -> StoreResult<Option<Account>> {
        let read_txn = self.db().begin_read()?;
        let accounts = read_txn.open_table(ACCOUNTS)?;
        match accounts.get(id)? {
            Some(raw) => Ok(Some(serde_json::from_slice(raw.value())?)),
            None => Ok(None),
        }
    }

    /// Set or clear the ban flag. Returns the updated account.
    pub fn set_banned(&self, id: u64, banned: bool) -> StoreResult<Account> {
        self.update_account(id, |account| account.banned = banned)
    }

    /// Change an account's role. Returns the updated account.
    pub fn set_role(&self, id: u64, role: Role) -> StoreResult<Account> {
        self.update_account(id, move |account| account.role = role)
    }

    /// Replace the stored password hash.
    pub fn set_password_hash(&self, id: u64, hash: &str) -> StoreResult<Account> {
        let hash = hash.to_string();
        self.update_account(id, move |account| account.password_hash = Some(hash))
    }

    /// All accounts, newest first.
    pub fn list_accounts(&self) -> StoreResult<Vec<Account>> {
        let read_txn = self.db().begin_read()?;
        let accounts = read_txn.open_table(ACCOUNTS)?;

        let mut result = Vec::new();
        for entry in accounts.iter()?.rev() {
            let (_, raw) = entry?;
            result.push(serde_json::from_slice(raw.value())?);
        }
        Ok(result)
    }

    /// Whether any admin account exists (bootstrap check).
    pub fn has_admin(&self) -> StoreResult<bool> {
        Ok(self
            .list_accounts()?
            .iter()
            .any(|account| account.role == Role::Admin))
    }

    fn update_account(
        &self,
        id: u64,
        mutate: impl FnOnce(&mut Account),
    ) -> StoreResult<Account> {
        let write_txn = self.db().begin_write()?;
        let account = {
            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            let raw = {
                let existing = accounts
                    .get(id)?
                    .ok_or_else(|| StoreError::NotFound(format!("account {id}")))?;
                existing.value().to_vec()
            };

            let mut account: Account = serde_json::from_slice(&raw)?;
            mutate(&mut account);
            accounts.insert(id, serde_json::to_vec(&account)?.as_slice())?;
            account
        };
        write_txn.commit()?;
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::temp_store;

    #[test]
    fn create_and_find_account() {
        let (store, _dir) = temp_store();
        let created = store
            .create_account("Alice", Some("$hash".to_string()), Role::User)
            .unwrap();

        assert_eq!(created.identifier, "Alice");
        assert_eq!(created.balance_cents, 0);
        assert!(!created.banned);

        let found = store.find_by_identifier("alice").unwrap().unwrap();
        assert_eq!(found.id, created.id);
        // Display casing is preserved
        assert_eq!(found.identifier, "Alice");
    }

    #[test]
    fn duplicate_identifier_conflicts_case_insensitively() {
        let (store, _dir) = temp_store();
        store
            .create_account("alice", None, Role::User)
            .unwrap();

        let err = store
            .create_account("ALICE", None, Role::User)
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // Failed create must leave no trace
        assert_eq!(store.list_accounts().unwrap().len(), 1);
    }

    #[test]
    fn find_missing_returns_none() {
        let (store, _dir) = temp_store();
        assert!(store.find_by_identifier("ghost").unwrap().is_none());
        assert!(store.find_by_id(999).unwrap().is_none());
    }

    #[test]
    fn set_banned_round_trip() {
        let (store, _dir) = temp_store();
        let account = store.create_account("bob", None, Role::User).unwrap();

        let banned = store.set_banned(account.id, true).unwrap();
        assert!(banned.banned);
        assert!(store.find_by_id(account.id).unwrap().unwrap().banned);

        let unbanned = store.set_banned(account.id, false).unwrap();
        assert!(!unbanned.banned);
    }

    #[test]
    fn set_banned_unknown_account_not_found() {
        let (store, _dir) = temp_store();
        let err = store.set_banned(42, true).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn set_role_round_trip() {
        let (store, _dir) = temp_store();
        let account = store.create_account("dave", None, Role::User).unwrap();

        let promoted = store.set_role(account.id, Role::Admin).unwrap();
        assert_eq!(promoted.role, Role::Admin);
        assert!(store.has_admin().unwrap());
    }

    #[test]
    fn set_password_hash_updates_record() {
        let (store, _dir) = temp_store();
        let account = store.create_account("carol", None, Role::User).unwrap();
        assert!(account.password_hash.is_none());

        store.set_password_hash(account.id, "$new-hash").unwrap();
        let updated = store.find_by_id(account.id).unwrap().unwrap();
        assert_eq!(updated.password_hash.as_deref(), Some("$new-hash"));
    }

    #[test]
    fn upsert_external_creates_then_reuses() {
        let (store, _dir) = temp_store();

        let first = store.upsert_external("tg:12345").unwrap();
        assert!(first.password_hash.is_none());
        assert_eq!(first.role, Role::User);

        let second = store.upsert_external("TG:12345").unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(store.list_accounts().unwrap().len(), 1);
    }

    #[test]
    fn list_accounts_newest_first() {
        let (store, _dir) = temp_store();
        store.create_account("first", None, Role::User).unwrap();
        store.create_account("second", None, Role::User).unwrap();

        let accounts = store.list_accounts().unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].identifier, "second");
        assert_eq!(accounts[1].identifier, "first");
    }

    #[test]
    fn has_admin_reflects_roles() {
        let (store, _dir) = temp_store();
        assert!(!store.has_admin().unwrap());

        store.create_account("root", None, Role::Admin).unwrap();
        assert!(store.has_admin().unwrap());
    }
}
