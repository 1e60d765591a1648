// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential endpoints: signup, login, trusted-gateway login, logout.
//!
//! Login failures are deliberately uniform: unknown identifier, wrong
//! password, and passwordless (external-only) accounts all produce the
//! same `bad_credentials` response, so the endpoint cannot be used to
//! probe which identifiers exist.

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};

use crate::{
    auth::{
        password::{hash_password, validate_password_strength, verify_password},
        Auth, Role,
    },
    error::ApiError,
    models::{
        ExternalLoginRequest, LoginRequest, SignupRequest, SignupResponse, TokenResponse,
    },
    state::AppState,
};

/// Name of the shared-secret header the trusted gateway must send.
pub const GATEWAY_SECRET_HEADER: &str = "x-gateway-secret";

/// Register a new account.
///
/// The account starts with the `user` role and a zero balance.
#[utoipa::path(
    post,
    path = "/v1/auth/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = SignupResponse),
        (status = 400, description = "Invalid identifier or weak password"),
        (status = 409, description = "Identifier already taken")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    if request.identifier.trim().is_empty() {
        return Err(ApiError::InvalidInput("identifier must not be empty".to_string()));
    }
    validate_password_strength(&request.password)
        .map_err(|msg| ApiError::InvalidInput(msg.to_string()))?;

    let hash = hash_password(&request.password)
        .map_err(|e| ApiError::ServiceUnavailable(e.to_string()))?;

    let account = state
        .store
        .create_account(&request.identifier, Some(hash), Role::User)?;

    tracing::info!(account_id = account.id, "account created");
    Ok((StatusCode::CREATED, Json(SignupResponse { id: account.id })))
}

/// Exchange credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = TokenResponse),
        (status = 401, description = "Invalid identifier or password"),
        (status = 403, description = "Account is banned")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let account = state
        .store
        .find_by_identifier(&request.identifier)?
        .ok_or(ApiError::BadCredentials)?;

    // Accounts created via the gateway have no local password and can
    // never log in here.
    let hash = account.password_hash.as_deref().ok_or(ApiError::BadCredentials)?;
    verify_password(&request.password, hash).map_err(|_| ApiError::BadCredentials)?;

    // Only after the caller has proven the credential do we reveal the
    // ban state.
    if account.banned {
        return Err(ApiError::Forbidden("Account is banned".to_string()));
    }

    let token = state
        .sessions
        .issue(&account)
        .map_err(|e| ApiError::ServiceUnavailable(e.to_string()))?;

    tracing::info!(account_id = account.id, "login");
    Ok(Json(TokenResponse {
        token,
        account: account.into(),
    }))
}

/// Issue a token for an identity verified by a trusted gateway.
///
/// The gateway authenticates itself with the `X-Gateway-Secret` header.
/// First-time identities get an account created on the fly. Disabled
/// (404) unless `EXTERNAL_AUTH_SECRET` is configured.
#[utoipa::path(
    post,
    path = "/v1/auth/external",
    tag = "Auth",
    request_body = ExternalLoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = TokenResponse),
        (status = 403, description = "Bad gateway secret or banned account"),
        (status = 404, description = "External login is not enabled")
    )
)]
pub async fn login_external(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ExternalLoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let expected = state
        .external_auth_secret
        .as_deref()
        .ok_or_else(|| ApiError::NotFound("external login is not enabled".to_string()))?;

    let presented = headers
        .get(GATEWAY_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());
    if presented != Some(expected) {
        return Err(ApiError::Forbidden("Invalid gateway secret".to_string()));
    }

    if request.identifier.trim().is_empty() {
        return Err(ApiError::InvalidInput("identifier must not be empty".to_string()));
    }

    let account = state.store.upsert_external(&request.identifier)?;
    if account.banned {
        return Err(ApiError::Forbidden("Account is banned".to_string()));
    }

    let token = state
        .sessions
        .issue(&account)
        .map_err(|e| ApiError::ServiceUnavailable(e.to_string()))?;

    tracing::info!(account_id = account.id, "external login");
    Ok(Json(TokenResponse {
        token,
        account: account.into(),
    }))
}

/// Revoke the presented token.
///
/// The token stops working immediately; other tokens of the same
/// account are unaffected.
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Token revoked"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(Auth(context): Auth, State(state): State<AppState>) -> StatusCode {
    state.sessions.revoke(&context.token.jti, context.token.exp);
    tracing::info!(account_id = context.account.id, "logout");
    StatusCode::OK
}
