// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wire types for the `/auth` endpoints.

use serde::{Deserialize, Serialize};

use crate::visibility::VisibilityMatrix;

/// Body of `GET /auth/profile`.
///
/// The document store includes many more fields; only these are read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    /// Document ID
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    /// Role as stored by the backend (casing not guaranteed)
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Body of `POST /auth/visibility`.
#[derive(Debug, Serialize)]
pub struct SaveVisibilityRequest<'a> {
    pub visibility: &'a VisibilityMatrix,
}
