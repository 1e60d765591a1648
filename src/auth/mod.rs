// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Sessions, passwords, and authorization guards for the credits API.
//!
//! ## Auth Flow
//!
//! 1. Client logs in with identifier + password (or through the external
//!    identity gateway)
//! 2. Server mints a signed HS256 session token carrying the account id,
//!    a role snapshot, and a unique `jti`
//! 3. Client sends `Authorization: Bearer <token>` on every call
//! 4. The [`Auth`](extractor::Auth) guard verifies signature and expiry,
//!    rejects revoked `jti`s, then re-reads the live account record so a
//!    ban (or demotion, for [`AdminOnly`](extractor::AdminOnly)) takes
//!    effect on the very next request
//!
//! ## Security
//!
//! - The role claim inside a token is a snapshot for observability only;
//!   authorization decisions always use the live account record
//! - Clock skew tolerance is 60 seconds
//! - The revocation set lives in process memory and is cleared on
//!   restart; revoked-but-unexpired tokens become valid again then
//!   (documented trade-off)

pub mod error;
pub mod extractor;
pub mod password;
pub mod roles;
pub mod session;

pub use error::AuthError;
pub use extractor::{AdminOnly, Auth, AuthContext};
pub use roles::Role;
pub use session::{SessionClaims, SessionIssuer};
