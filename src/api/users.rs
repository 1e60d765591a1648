// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Self-service endpoints for the authenticated account.

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    auth::Auth,
    error::ApiError,
    models::{AccountResponse, HistoryQuery, LedgerEntryResponse},
    state::AppState,
};

const DEFAULT_HISTORY_LIMIT: usize = 100;
const MAX_HISTORY_LIMIT: usize = 1000;

/// Get the authenticated account.
#[utoipa::path(
    get,
    path = "/v1/me",
    tag = "Me",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The authenticated account", body = AccountResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Account is banned")
    )
)]
pub async fn me(Auth(context): Auth) -> Json<AccountResponse> {
    Json(context.account.into())
}

/// Get the authenticated account's ledger history, newest first.
#[utoipa::path(
    get,
    path = "/v1/me/history",
    tag = "Me",
    params(HistoryQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Ledger entries", body = [LedgerEntryResponse]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_history(
    Auth(context): Auth,
    Query(query): Query<HistoryQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<LedgerEntryResponse>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(MAX_HISTORY_LIMIT);

    let entries = state.store.history(context.account.id, limit)?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}
