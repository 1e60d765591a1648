// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors that guard routes.
//!
//! [`Auth`] authenticates the bearer token and resolves the live account
//! record; [`AdminOnly`] additionally requires the admin role. Role and
//! ban state always come from the store, never from token claims, so a
//! ban or demotion takes effect on the very next request.

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};

use super::error::AuthError;
use super::roles::Role;
use super::session::SessionClaims;
use crate::state::AppState;
use crate::store::Account;

/// A verified session: the live account plus the token it rode in on.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub account: Account,
    pub token: SessionClaims,
}

/// Extractor for any authenticated, non-banned account.
#[derive(Debug)]
pub struct Auth(pub AuthContext);

/// Extractor for routes that require the admin role.
#[derive(Debug)]
pub struct AdminOnly(pub AuthContext);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?;

        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AuthError::InvalidAuthHeader)?;

        let claims = state.sessions.verify(token)?;
        let subject_id = claims.subject_id().ok_or(AuthError::MalformedToken)?;

        let account = state
            .store
            .find_by_id(subject_id)
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?
            .ok_or(AuthError::UnknownSubject)?;

        if account.banned {
            return Err(AuthError::AccountBanned);
        }

        Ok(Auth(AuthContext {
            account,
            token: claims,
        }))
    }
}

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Auth(context) = Auth::from_request_parts(parts, state).await?;

        // Live role, not the issuance-time snapshot in the claims.
        if context.account.role != Role::Admin {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(AdminOnly(context))
    }
}
