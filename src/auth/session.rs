// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token issuance, verification, and revocation.
//!
//! Tokens are HS256 JWTs signed with a process-wide secret. Each token
//! carries a unique `jti` that acts as the revocation handle: logout adds
//! the `jti` to an in-memory revocation set, which only needs to retain
//! entries until the token's natural expiry.
//!
//! Token lifecycle: `Issued -> Active -> {Expired | Revoked}`. Both end
//! states are terminal.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::error::AuthError;
use super::roles::Role;
use crate::config::Config;
use crate::store::Account;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Claims carried by every session token.
///
/// `role` is a snapshot taken at issuance and is never used for
/// authorization decisions; the access guard re-reads the live account
/// record instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the account id, as a decimal string.
    pub sub: String,
    /// Role snapshot at issuance time (informational only).
    pub role: Role,
    /// Unique token id, the revocation handle.
    pub jti: String,
    /// Issued-at (Unix timestamp, seconds).
    pub iat: i64,
    /// Expiry (Unix timestamp, seconds).
    pub exp: i64,
}

impl SessionClaims {
    /// Parse the subject back into an account id.
    pub fn subject_id(&self) -> Option<u64> {
        self.sub.parse().ok()
    }
}

/// Issues, verifies, and revokes session tokens.
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: i64,
    /// jti -> exp of revoked-but-unexpired tokens. Pruned lazily on
    /// every insert and lookup; cleared entirely on restart.
    revoked: Mutex<HashMap<String, i64>>,
}

impl SessionIssuer {
    /// Create an issuer with an explicit secret.
    pub fn new(secret: &[u8], ttl_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl_seconds: ttl_hours.saturating_mul(3600),
            revoked: Mutex::new(HashMap::new()),
        }
    }

    /// Create an issuer from the runtime configuration.
    ///
    /// When `SESSION_SECRET` is unset a random 32-byte secret is
    /// generated for this process: all sessions are invalidated on
    /// restart, which is an accepted trade-off for dev deployments.
    pub fn from_config(config: &Config) -> Self {
        match &config.session_secret {
            Some(secret) => Self::new(secret.as_bytes(), config.session_ttl_hours),
            None => {
                let mut secret = [0u8; 32];
                rand::rngs::OsRng.fill_bytes(&mut secret);
                tracing::warn!(
                    "SESSION_SECRET is not set; using a random per-process secret \
                     (sessions will not survive a restart)"
                );
                Self::new(&secret, config.session_ttl_hours)
            }
        }
    }

    /// Mint a signed session token for an account.
    pub fn issue(&self, account: &Account) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        self.sign(SessionClaims {
            sub: account.id.to_string(),
            role: account.role,
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp: now.saturating_add(self.ttl_seconds),
        })
    }

    /// Verify a token: signature, shape, expiry, and revocation.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_aud = false;

        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })?;

        let claims = token_data.claims;
        if self.is_revoked(&claims.jti) {
            return Err(AuthError::TokenRevoked);
        }

        Ok(claims)
    }

    /// Revoke a token id until its natural expiry.
    ///
    /// Entries are retained for the clock-skew leeway past `exp`, since
    /// verification accepts tokens that far beyond their expiry.
    pub fn revoke(&self, jti: &str, expires_at: i64) {
        let now = Utc::now().timestamp();
        let cutoff = expires_at + CLOCK_SKEW_LEEWAY as i64;
        let mut revoked = self.revoked.lock().expect("revocation set poisoned");
        revoked.retain(|_, &mut exp| exp > now);
        // Tokens past their leeway window need no entry at all.
        if cutoff > now {
            revoked.insert(jti.to_string(), cutoff);
        }
    }

    /// Check whether a token id has been revoked.
    pub fn is_revoked(&self, jti: &str) -> bool {
        let now = Utc::now().timestamp();
        let mut revoked = self.revoked.lock().expect("revocation set poisoned");
        revoked.retain(|_, &mut exp| exp > now);
        revoked.contains_key(jti)
    }

    /// Number of live entries in the revocation set.
    pub fn revoked_len(&self) -> usize {
        self.revoked.lock().expect("revocation set poisoned").len()
    }

    fn sign(&self, claims: SessionClaims) -> Result<String, AuthError> {
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::StoreUnavailable(format!("token signing failed: {e}")))
    }

    /// Mint a token with an arbitrary expiry, for expiry-path tests.
    #[cfg(test)]
    pub fn issue_with_expiry(&self, account: &Account, expires_at: i64) -> String {
        self.sign(SessionClaims {
            sub: account.id.to_string(),
            role: account.role,
            jti: uuid::Uuid::new_v4().to_string(),
            iat: Utc::now().timestamp(),
            exp: expires_at,
        })
        .expect("signing test token")
    }
}
