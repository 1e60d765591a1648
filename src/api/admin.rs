// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only endpoints: account overview, credit adjustment, bans, and
//! the audit log.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::AdminOnly,
    error::ApiError,
    models::{
        AccountListResponse, AdjustCreditsRequest, AuditListResponse, AuditQuery,
        BalanceResponse, BanRequest,
    },
    state::AppState,
};

const DEFAULT_AUDIT_LIMIT: usize = 100;
const MAX_AUDIT_LIMIT: usize = 1000;

/// List all accounts, newest first. Admin only.
#[utoipa::path(
    get,
    path = "/v1/admin/accounts",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All accounts", body = AccountListResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn list_accounts(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<AccountListResponse>, ApiError> {
    let accounts: Vec<_> = state
        .store
        .list_accounts()?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = accounts.len();

    Ok(Json(AccountListResponse { accounts, total }))
}

/// Adjust an account's credit balance. Admin only.
///
/// The delta is applied atomically together with an audit entry naming
/// the acting admin. A debit past zero fails with `insufficient_funds`
/// and changes nothing.
#[utoipa::path(
    post,
    path = "/v1/admin/credits",
    tag = "Admin",
    request_body = AdjustCreditsRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "New balance", body = BalanceResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Account not found"),
        (status = 422, description = "Balance would go negative"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn adjust_credits(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Json(request): Json<AdjustCreditsRequest>,
) -> Result<Json<BalanceResponse>, ApiError> {
    if request.reason.trim().is_empty() {
        return Err(ApiError::InvalidInput("reason must not be empty".to_string()));
    }

    let target = state
        .store
        .find_by_identifier(&request.identifier)?
        .ok_or_else(|| ApiError::NotFound(format!("account '{}'", request.identifier)))?;

    let balance_cents = state.store.apply_delta(
        target.id,
        request.delta_cents,
        admin.account.id,
        request.reason.trim(),
    )?;

    tracing::info!(
        account_id = target.id,
        actor_id = admin.account.id,
        delta_cents = request.delta_cents,
        "credits adjusted"
    );
    Ok(Json(BalanceResponse { balance_cents }))
}

/// Set or clear an account's ban flag. Admin only.
///
/// A ban locks the account out on its next request; existing tokens
/// stop working without being individually revoked.
#[utoipa::path(
    post,
    path = "/v1/admin/ban",
    tag = "Admin",
    request_body = BanRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Ban flag updated"),
        (status = 404, description = "Account not found"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn set_banned(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Json(request): Json<BanRequest>,
) -> Result<StatusCode, ApiError> {
    let target = state
        .store
        .find_by_identifier(&request.identifier)?
        .ok_or_else(|| ApiError::NotFound(format!("account '{}'", request.identifier)))?;

    state.store.set_banned(target.id, request.banned)?;

    tracing::info!(
        account_id = target.id,
        actor_id = admin.account.id,
        banned = request.banned,
        "ban flag updated"
    );
    Ok(StatusCode::OK)
}

/// Query the ledger audit log, newest first. Admin only.
#[utoipa::path(
    get,
    path = "/v1/admin/audit",
    tag = "Admin",
    params(AuditQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Audit entries", body = AuditListResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn audit_log(
    AdminOnly(_admin): AdminOnly,
    Query(query): Query<AuditQuery>,
    State(state): State<AppState>,
) -> Result<Json<AuditListResponse>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .min(MAX_AUDIT_LIMIT);

    let entries: Vec<_> = state
        .store
        .audit_log(limit)?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = entries.len();

    Ok(Json(AuditListResponse { entries, total }))
}
