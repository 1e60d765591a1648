// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account roles for authorization.
///
/// ## Role Hierarchy
///
/// - `Admin` - Full access, including credit adjustments, bans, and the
///   audit log
/// - `User` - Normal account, can only read its own profile and history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Normal account
    User,
}
