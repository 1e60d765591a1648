// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! SMS Credits - Credential, Session & Credit-Ledger Backend
//!
//! This crate provides the access layer for the SMS activation storefront:
//! password and external-identity login, signed bearer session tokens,
//! role-gated admin operations, and an atomic per-account credit ledger.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Sessions, passwords, and authorization guards
//! - `store` - Embedded account + ledger storage (redb)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod store;
