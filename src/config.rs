// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for the embedded database | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `SESSION_SECRET` | HMAC secret for session tokens | Random per process |
//! | `SESSION_TTL_HOURS` | Session validity window in hours | `168` (7 days) |
//! | `EXTERNAL_AUTH_SECRET` | Shared secret for the external-identity gateway | Unset (endpoint disabled) |
//! | `ADMIN_USERNAME` | Bootstrap admin identifier (first startup only) | `admin` |
//! | `ADMIN_PASSWORD` | Bootstrap admin password (first startup only) | Random, logged once |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::path::PathBuf;

/// Environment variable name for the data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Default session validity window: 7 days.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 168;

/// Upper bound on the session validity window: one year.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the embedded database file.
    pub data_dir: PathBuf,
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Session signing secret. `None` means a random per-process secret
    /// is generated; sessions then do not survive a restart.
    pub session_secret: Option<String>,
    /// Session validity window in hours.
    pub session_ttl_hours: i64,
    /// Shared secret required on `/v1/auth/external`. `None` disables
    /// the endpoint entirely.
    pub external_auth_secret: Option<String>,
    /// Identifier for the bootstrap admin account.
    pub admin_username: String,
    /// Password for the bootstrap admin account. `None` means a random
    /// password is generated and logged once at first startup.
    pub admin_password: Option<String>,
    /// Logging format (`json` or `pretty`).
    pub log_format: String,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Unset variables fall back to the defaults documented in the
    /// module header; malformed values (e.g. a non-numeric `PORT`) fall
    /// back the same way rather than aborting startup.
    pub fn from_env() -> Self {
        Self {
            data_dir: env::var(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            session_secret: env::var("SESSION_SECRET").ok().filter(|s| !s.is_empty()),
            session_ttl_hours: env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(clamp_ttl_hours)
                .unwrap_or(DEFAULT_SESSION_TTL_HOURS),
            external_auth_secret: env::var("EXTERNAL_AUTH_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|s| !s.is_empty()),
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
        }
    }
}

/// Keep a configured TTL within (0, MAX_SESSION_TTL_HOURS]; anything
/// else falls back to the default.
fn clamp_ttl_hours(hours: i64) -> i64 {
    if hours <= 0 {
        DEFAULT_SESSION_TTL_HOURS
    } else {
        hours.min(MAX_SESSION_TTL_HOURS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var manipulation is process-global, so these tests only cover
    // the pure fallback paths.

    #[test]
    fn defaults_are_sensible() {
        let config = Config {
            data_dir: PathBuf::from("./data"),
            host: "0.0.0.0".to_string(),
            port: 8080,
            session_secret: None,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            external_auth_secret: None,
            admin_username: "admin".to_string(),
            admin_password: None,
            log_format: "pretty".to_string(),
        };
        assert_eq!(config.session_ttl_hours, 168);
        assert!(config.external_auth_secret.is_none());
    }

    #[test]
    fn ttl_is_clamped_to_sane_bounds() {
        assert_eq!(clamp_ttl_hours(24), 24);
        assert_eq!(clamp_ttl_hours(0), DEFAULT_SESSION_TTL_HOURS);
        assert_eq!(clamp_ttl_hours(-5), DEFAULT_SESSION_TTL_HOURS);
        assert_eq!(clamp_ttl_hours(i64::MAX), MAX_SESSION_TTL_HOURS);
    }
}
