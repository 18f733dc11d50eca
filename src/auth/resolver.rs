// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Effective role resolution.
//!
//! The authoritative profile may still be loading when the first navigation
//! render happens, so the token's self-reported role is accepted as an
//! optimistic fallback for read-only gating. Mutating actions only ever look
//! at the authoritative profile.

use super::claims::UnverifiedClaims;
use super::roles::Role;
use super::user::EffectiveUser;

/// Resolve the role used for navigation and page visibility.
///
/// Precedence: `user.role`, then `fallback.role`, then [`Role::Guest`].
pub fn resolve_role(user: Option<&EffectiveUser>, fallback: Option<&UnverifiedClaims>) -> Role {
    user.and_then(|u| u.role)
        .or_else(|| fallback.and_then(|c| c.role))
        .unwrap_or_default()
}

/// Resolve the role used to enable mutating actions.
///
/// Ignores the token entirely; without a loaded profile the answer is Guest.
pub fn resolve_mutating_role(user: Option<&EffectiveUser>) -> Role {
    user.and_then(|u| u.role).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Option<Role>) -> EffectiveUser {
        EffectiveUser {
            role,
            ..Default::default()
        }
    }

    fn claims(role: Option<Role>) -> UnverifiedClaims {
        UnverifiedClaims {
            subject_id: "u1".to_string(),
            email: "a@b.com".to_string(),
            role,
        }
    }

    #[test]
    fn authoritative_role_wins() {
        let u = user(Some(Role::Admin));
        let c = claims(Some(Role::SuperAdmin));
        assert_eq!(resolve_role(Some(&u), Some(&c)), Role::Admin);
    }

    #[test]
    fn falls_back_to_token_role() {
        let c = claims(Some(Role::Admin));
        assert_eq!(resolve_role(None, Some(&c)), Role::Admin);

        // A loaded profile without a role still defers to the token.
        let u = user(None);
        assert_eq!(resolve_role(Some(&u), Some(&c)), Role::Admin);
    }

    #[test]
    fn defaults_to_guest() {
        assert_eq!(resolve_role(None, None), Role::Guest);
        let c = claims(None);
        assert_eq!(resolve_role(None, Some(&c)), Role::Guest);
    }

    #[test]
    fn mutating_role_ignores_token() {
        assert_eq!(resolve_mutating_role(None), Role::Guest);
        let u = user(Some(Role::SuperAdmin));
        assert_eq!(resolve_mutating_role(Some(&u)), Role::SuperAdmin);
    }
}
