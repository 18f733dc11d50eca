// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Page Visibility Module
//!
//! Decides which navigation entries and pages a role may see.
//!
//! ## Components
//!
//! - `matrix` - The server's role → page → bool table and page keys
//! - `store` - Process-wide cache of the latest matrix snapshot
//! - `resolver` - Pure visibility lookups ("hide until known")
//! - `legacy` - Hardcoded table for deployments without the matrix endpoint
//! - `nav` - Sidebar catalogue

use serde::{Deserialize, Serialize};

pub mod legacy;
pub mod matrix;
pub mod nav;
pub mod resolver;
pub mod store;

pub use legacy::LegacyPolicy;
pub use matrix::{pages, PageKey, VisibilityMatrix};
pub use nav::{default_nav, NavItem};
pub use resolver::{is_visible, route_access, visible_nav, RouteAccess};
pub use store::{MatrixSnapshot, MatrixStatus, MatrixStore};

/// Which visibility policy a session uses. Fixed for the session's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityMode {
    /// Server-supplied matrix, hide until loaded
    #[default]
    Matrix,
    /// [`LegacyPolicy`] table, matrix store never consulted
    Legacy,
}

impl VisibilityMode {
    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<VisibilityMode> {
        match s.trim().to_lowercase().as_str() {
            "matrix" => Some(VisibilityMode::Matrix),
            "legacy" => Some(VisibilityMode::Legacy),
            _ => None,
        }
    }
}
