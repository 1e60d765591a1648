// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request and response bodies for the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::Role;
use crate::store::{Account, AuditedEntry, LedgerEntry};

// =============================================================================
// Auth
// =============================================================================

/// Body for `POST /v1/auth/signup`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupRequest {
    /// Login name or email.
    pub identifier: String,
    /// Plaintext password, at least 8 characters.
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignupResponse {
    pub id: u64,
}

/// Body for `POST /v1/auth/login`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

/// Body for `POST /v1/auth/external`. The caller is a trusted gateway
/// that has already verified the identity.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ExternalLoginRequest {
    pub identifier: String,
}

/// Successful login: a bearer token plus the account it belongs to.
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    pub account: AccountResponse,
}

// =============================================================================
// Accounts
// =============================================================================

/// Public view of an account. Never exposes the password hash.
#[derive(Debug, Serialize, ToSchema)]
pub struct AccountResponse {
    pub id: u64,
    pub identifier: String,
    pub role: Role,
    pub balance_cents: i64,
    pub banned: bool,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            identifier: account.identifier,
            role: account.role,
            balance_cents: account.balance_cents,
            banned: account.banned,
        }
    }
}

/// Admin listing row: the public view plus creation time.
#[derive(Debug, Serialize, ToSchema)]
pub struct AccountSummary {
    pub id: u64,
    pub identifier: String,
    pub role: Role,
    pub balance_cents: i64,
    pub banned: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountSummary {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            identifier: account.identifier,
            role: account.role,
            balance_cents: account.balance_cents,
            banned: account.banned,
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountListResponse {
    pub accounts: Vec<AccountSummary>,
    pub total: usize,
}

// =============================================================================
// Ledger
// =============================================================================

/// One history row as seen by the account owner.
#[derive(Debug, Serialize, ToSchema)]
pub struct LedgerEntryResponse {
    pub id: u64,
    pub delta_cents: i64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl From<LedgerEntry> for LedgerEntryResponse {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            id: entry.id,
            delta_cents: entry.delta_cents,
            reason: entry.reason,
            created_at: entry.created_at,
        }
    }
}

/// One audit row: the full entry with both parties resolved to
/// identifiers.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuditEntryResponse {
    pub id: u64,
    pub account_id: u64,
    pub account_identifier: String,
    pub actor_id: u64,
    pub actor_identifier: String,
    pub delta_cents: i64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl From<AuditedEntry> for AuditEntryResponse {
    fn from(audited: AuditedEntry) -> Self {
        Self {
            id: audited.entry.id,
            account_id: audited.entry.account_id,
            account_identifier: audited.account_identifier,
            actor_id: audited.entry.actor_id,
            actor_identifier: audited.actor_identifier,
            delta_cents: audited.entry.delta_cents,
            reason: audited.entry.reason,
            created_at: audited.entry.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuditListResponse {
    pub entries: Vec<AuditEntryResponse>,
    pub total: usize,
}

/// Body for `POST /v1/admin/credits`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustCreditsRequest {
    /// Target account identifier.
    pub identifier: String,
    /// Signed amount in cents; negative debits.
    pub delta_cents: i64,
    /// Audit tag, e.g. "topup" or "refund".
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub balance_cents: i64,
}

/// Body for `POST /v1/admin/ban`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BanRequest {
    pub identifier: String,
    pub banned: bool,
}

// =============================================================================
// Query Parameters
// =============================================================================

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Maximum entries to return (default 100, capped at 1000).
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AuditQuery {
    /// Maximum entries to return (default 100, capped at 1000).
    pub limit: Option<usize>,
}
