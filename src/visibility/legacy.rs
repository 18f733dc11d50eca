// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Hardcoded visibility table for deployments without the matrix endpoint.
//!
//! Only reachable through [`VisibilityMode::Legacy`](super::VisibilityMode),
//! which bypasses the matrix store for the whole session. It is never
//! consulted when a matrix fetch fails or is still in flight.

use super::matrix::{pages, PageKey};
use crate::auth::Role;

/// Fixed role → page policy.
///
/// | Page | Guest | Admin | SuperAdmin |
/// |------|-------|-------|------------|
/// | `dashboard` | yes | yes | yes |
/// | `contacts`, `companies`, `deals`, `activities` | no | yes | yes |
/// | `admin_users` | no | yes | yes |
/// | `visibility` | no | no | yes |
/// | anything else | no | no | no |
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyPolicy;

impl LegacyPolicy {
    pub fn is_visible(&self, role: Role, page: &PageKey) -> bool {
        match page.as_str() {
            pages::DASHBOARD => true,
            pages::CONTACTS | pages::COMPANIES | pages::DEALS | pages::ACTIVITIES => {
                matches!(role, Role::Admin | Role::SuperAdmin)
            }
            pages::ADMIN_USERS => matches!(role, Role::Admin | Role::SuperAdmin),
            pages::VISIBILITY => role.can_edit_visibility(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashboard_always_visible() {
        for role in Role::ALL {
            assert!(LegacyPolicy.is_visible(role, &pages::DASHBOARD.into()));
        }
    }

    #[test]
    fn admin_pages_need_admin_roles() {
        let users = PageKey::from(pages::ADMIN_USERS);
        assert!(!LegacyPolicy.is_visible(Role::Guest, &users));
        assert!(LegacyPolicy.is_visible(Role::Admin, &users));
        assert!(LegacyPolicy.is_visible(Role::SuperAdmin, &users));

        let visibility = PageKey::from(pages::VISIBILITY);
        assert!(!LegacyPolicy.is_visible(Role::Admin, &visibility));
        assert!(LegacyPolicy.is_visible(Role::SuperAdmin, &visibility));
    }

    #[test]
    fn unknown_pages_hidden() {
        assert!(!LegacyPolicy.is_visible(Role::SuperAdmin, &"reports".into()));
    }
}
