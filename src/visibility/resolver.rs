// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Matrix-driven page visibility.
//!
//! ## Policy
//!
//! - Matrix not loaded (or its fetch failed): every page is hidden
//! - Matrix loaded: the explicit cell decides; a missing role or page is hidden
//!
//! Nothing is ever defaulted to visible, so admin-only entries cannot flash
//! into the navigation before permissions are known.

use serde::Serialize;

use super::matrix::{PageKey, VisibilityMatrix};
use super::nav::NavItem;
use crate::auth::Role;

/// Whether `page` should be shown to `role`. Pure function of its inputs.
pub fn is_visible(role: Role, page: &PageKey, matrix: Option<&VisibilityMatrix>) -> bool {
    match matrix {
        None => false,
        Some(matrix) => matrix.lookup(role, page).unwrap_or(false),
    }
}

/// Filter a navigation catalogue down to the entries `role` may see.
pub fn visible_nav<'a>(
    role: Role,
    nav: &'a [NavItem],
    matrix: Option<&VisibilityMatrix>,
) -> Vec<&'a NavItem> {
    nav.iter()
        .filter(|item| is_visible(role, &item.page, matrix))
        .collect()
}

/// Outcome of a route guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteAccess {
    /// Page may be rendered
    Granted,
    /// Permissions not loaded yet; render a placeholder, do not redirect
    Pending,
    /// Page is hidden for this role
    Denied,
}

impl RouteAccess {
    pub fn is_granted(&self) -> bool {
        matches!(self, RouteAccess::Granted)
    }
}

/// Route guard decision. Agrees with [`is_visible`] on what may render:
/// only `Granted` renders the page.
pub fn route_access(role: Role, page: &PageKey, matrix: Option<&VisibilityMatrix>) -> RouteAccess {
    match matrix {
        None => RouteAccess::Pending,
        Some(_) if is_visible(role, page, matrix) => RouteAccess::Granted,
        Some(_) => RouteAccess::Denied,
    }
}
