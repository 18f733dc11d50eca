// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Navigation catalogue.

use serde::Serialize;

use super::matrix::{pages, PageKey};

/// A sidebar entry guarded by a page key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub page: PageKey,
    pub label: String,
    pub path: String,
}

impl NavItem {
    pub fn new(page: impl Into<PageKey>, label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            label: label.into(),
            path: path.into(),
        }
    }
}

/// The CRM admin sidebar, in display order.
pub fn default_nav() -> Vec<NavItem> {
    vec![
        NavItem::new(pages::DASHBOARD, "Dashboard", "/"),
        NavItem::new(pages::CONTACTS, "Contacts", "/contacts"),
        NavItem::new(pages::COMPANIES, "Companies", "/companies"),
        NavItem::new(pages::DEALS, "Deals", "/deals"),
        NavItem::new(pages::ACTIVITIES, "Activities", "/activities"),
        NavItem::new(pages::ADMIN_USERS, "Users", "/admin/users"),
        NavItem::new(pages::VISIBILITY, "Page Visibility", "/admin/visibility"),
    ]
}
