// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for navigation gating.

use serde::{Deserialize, Serialize};

/// User roles known to the CRM admin client.
///
/// ## No Hierarchy
///
/// Roles are not ordered by privilege. What a role may see is decided by the
/// server's visibility matrix, looked up by [`Role::key`]. The single
/// hardcoded rule is that only `SuperAdmin` may edit that matrix.
///
/// - `Guest` - Signed-out or unrecognised user (the conservative default)
/// - `Admin` - CRM administrator
/// - `SuperAdmin` - Administrator who may also edit page visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Role {
    /// Unauthenticated or unknown user
    Guest,
    /// CRM administrator
    Admin,
    /// Administrator allowed to manage the visibility matrix
    SuperAdmin,
}

impl Role {
    /// All roles, in the order the visibility editor lists them.
    pub const ALL: [Role; 3] = [Role::Guest, Role::Admin, Role::SuperAdmin];

    /// Parse role from string (case-insensitive, surrounding whitespace ignored).
    /// Used for both decoded-token and profile role claims, which do not agree
    /// on casing.
    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_lowercase().as_str() {
            "guest" => Some(Role::Guest),
            "admin" => Some(Role::Admin),
            "superadmin" => Some(Role::SuperAdmin),
            _ => None,
        }
    }

    /// Lowercase key under which this role appears in the visibility matrix.
    pub fn key(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::Admin => "admin",
            Role::SuperAdmin => "superadmin",
        }
    }

    /// Whether this role may edit the visibility matrix.
    ///
    /// UI gating only; the backend rejects writes from anyone else.
    pub fn can_edit_visibility(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }
}

impl Default for Role {
    /// Default role is Guest (hide everything that is not explicitly granted).
    fn default() -> Self {
        Role::Guest
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Role::parse(&value).ok_or_else(|| format!("unknown role {value:?}"))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
