// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authoritative user representation built from the profile endpoint.

use serde::{Deserialize, Serialize};

use super::roles::Role;
use crate::api::models::ProfileResponse;

/// The signed-in user as reported by `GET /auth/profile`.
///
/// This is the primary type used to decide what the current user may see
/// once the profile has loaded. Until then the session falls back to
/// [`UnverifiedClaims`](super::UnverifiedClaims) for read-only gating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveUser {
    /// Backend user ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,

    /// User's role; `None` when the profile omits it or sends an unknown value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// Email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Avatar image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Profile fields carried by a `profileUpdated` signal.
///
/// Only the fields that changed are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl ProfilePatch {
    /// True if applying this patch can change what the user may see.
    pub fn changes_role(&self) -> bool {
        self.role.is_some()
    }
}

impl EffectiveUser {
    /// Build from the profile response.
    pub fn from_profile(profile: ProfileResponse) -> Self {
        let role = profile.role.as_deref().and_then(Role::parse);
        if role.is_none() {
            if let Some(raw) = profile.role.as_deref() {
                tracing::warn!(role = %raw, "Profile carries an unknown role, ignoring it");
            }
        }

        Self {
            subject_id: profile.id,
            role,
            email: profile.email,
            display_name: profile.name,
            avatar_url: profile.avatar_url,
        }
    }

    /// Merge the fields present in `patch` into this user.
    pub fn apply_patch(&mut self, patch: &ProfilePatch) {
        if let Some(role) = patch.role {
            self.role = Some(role);
        }
        if let Some(email) = &patch.email {
            self.email = Some(email.clone());
        }
        if let Some(name) = &patch.name {
            self.display_name = Some(name.clone());
        }
        if let Some(avatar_url) = &patch.avatar_url {
            self.avatar_url = Some(avatar_url.clone());
        }
    }
}
