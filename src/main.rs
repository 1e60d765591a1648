// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;

use rand::{distributions::Alphanumeric, Rng};
use tracing_subscriber::EnvFilter;

use sms_credits_server::{
    api::router,
    auth::{password::hash_password, Role, SessionIssuer},
    config::Config,
    state::AppState,
    store::CreditStore,
};

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    if config.log_format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let store = CreditStore::open(&config.data_dir.join("credits.redb"))
        .expect("Failed to open credit store");

    bootstrap_admin(&store, &config);

    let sessions = SessionIssuer::from_config(&config);
    let state = AppState::new(store, sessions)
        .with_external_auth_secret(config.external_auth_secret.clone());
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Failed to parse bind address");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");

    tracing::info!("listening on http://{addr} (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed");
}

/// Create the bootstrap admin account on first startup.
///
/// Runs only when no admin exists yet. Without `ADMIN_PASSWORD` a random
/// password is generated and logged exactly once; it cannot be recovered
/// later.
fn bootstrap_admin(store: &CreditStore, config: &Config) {
    let has_admin = store.has_admin().expect("Failed to query admin accounts");
    if has_admin {
        return;
    }

    let (password, generated) = match &config.admin_password {
        Some(password) => (password.clone(), false),
        None => {
            let password: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(24)
                .map(char::from)
                .collect();
            (password, true)
        }
    };

    let hash = hash_password(&password).expect("Failed to hash bootstrap admin password");
    let account = store
        .create_account(&config.admin_username, Some(hash), Role::Admin)
        .expect("Failed to create bootstrap admin account");

    if generated {
        tracing::warn!(
            identifier = %account.identifier,
            password = %password,
            "created bootstrap admin with a generated password; change it or set ADMIN_PASSWORD"
        );
    } else {
        tracing::info!(identifier = %account.identifier, "created bootstrap admin");
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("shutdown signal received");
}
