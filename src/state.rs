// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared application state threaded through every handler.

use std::sync::Arc;
use std::time::Instant;

use crate::auth::SessionIssuer;
use crate::store::CreditStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CreditStore>,
    pub sessions: Arc<SessionIssuer>,
    /// Shared secret for the trusted-gateway login endpoint. `None`
    /// disables the endpoint entirely.
    pub external_auth_secret: Option<String>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(store: CreditStore, sessions: SessionIssuer) -> Self {
        Self {
            store: Arc::new(store),
            sessions: Arc::new(sessions),
            external_auth_secret: None,
            started_at: Instant::now(),
        }
    }

    pub fn with_external_auth_secret(mut self, secret: Option<String>) -> Self {
        self.external_auth_secret = secret;
        self
    }
}
