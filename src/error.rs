// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client error type.
//!
//! Only explicit user actions on the visibility editor surface these to the
//! user. Navigation paths swallow them and fall back to hiding pages.

use crate::auth::Role;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport failure (connect, timeout, TLS)
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-2xx status
    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Body was not the expected JSON
    #[error("invalid response body: {0}")]
    Decode(String),

    /// Endpoint URL could not be built
    #[error("invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Operation needs a token and the session has none
    #[error("not signed in")]
    NotAuthenticated,

    /// Rejected client-side before reaching the backend
    #[error("role {role} may not {action}")]
    Forbidden { role: Role, action: &'static str },

    /// Missing or invalid configuration value
    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// HTTP status for `Status` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
