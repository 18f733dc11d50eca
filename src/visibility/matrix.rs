// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Visibility matrix and page key types.
//!
//! The matrix is the server's role → page → bool table. A cell that is not
//! present is *unknown*, which is different from an explicit `false`; see
//! [`VisibilityMatrix::lookup`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::Role;

/// Well-known page keys. The set is open: the matrix itself is the registry
/// at runtime, so pages added server-side work without touching this list.
pub mod pages {
    pub const DASHBOARD: &str = "dashboard";
    pub const CONTACTS: &str = "contacts";
    pub const COMPANIES: &str = "companies";
    pub const DEALS: &str = "deals";
    pub const ACTIVITIES: &str = "activities";
    pub const ADMIN_USERS: &str = "admin_users";
    pub const VISIBILITY: &str = "visibility";
}

/// Identifier of a page or feature, lowercase-normalised.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PageKey(String);

impl PageKey {
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(normalize_key(key.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PageKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for PageKey {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

impl From<PageKey> for String {
    fn from(key: PageKey) -> Self {
        key.0
    }
}

impl std::fmt::Display for PageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Wire form of the matrix: `{ "<role>": { "<page>": bool } }`.
type WireMatrix = BTreeMap<String, BTreeMap<String, bool>>;

/// Role → page → visibility table.
///
/// Role and page keys are lowercased on construction. When two source keys
/// collapse onto the same lowercase key their page entries are merged, with
/// the already-lowercase spelling applied last. Cells that are not booleans
/// on the wire are dropped (treated as unknown).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Value>", into = "WireMatrix")]
pub struct VisibilityMatrix {
    roles: BTreeMap<String, BTreeMap<PageKey, bool>>,
}

impl VisibilityMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit cell value, or `None` when the role or page is unknown.
    pub fn lookup(&self, role: Role, page: &PageKey) -> Option<bool> {
        self.lookup_key(role.key(), page)
    }

    /// Same as [`lookup`](Self::lookup) with a raw role key.
    pub fn lookup_key(&self, role: &str, page: &PageKey) -> Option<bool> {
        self.roles
            .get(&normalize_key(role))
            .and_then(|pages| pages.get(page))
            .copied()
    }

    /// Set a cell. Used to build a new matrix for saving; the store never
    /// patches the matrix it serves.
    pub fn set(&mut self, role: Role, page: impl Into<PageKey>, visible: bool) {
        self.roles
            .entry(role.key().to_string())
            .or_default()
            .insert(page.into(), visible);
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, role: Role, page: impl Into<PageKey>, visible: bool) -> Self {
        self.set(role, page, visible);
        self
    }

    /// Role keys present in the matrix (may include roles this client does
    /// not know).
    pub fn role_keys(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    /// Union of page keys across all roles.
    pub fn page_keys(&self) -> BTreeSet<PageKey> {
        self.roles
            .values()
            .flat_map(|pages| pages.keys().cloned())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.values().all(BTreeMap::is_empty)
    }
}

impl From<BTreeMap<String, Value>> for VisibilityMatrix {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        let mut roles: BTreeMap<String, BTreeMap<PageKey, bool>> = BTreeMap::new();

        // Already-lowercase spellings last so they win on collision.
        let (lower, mixed): (Vec<_>, Vec<_>) = raw
            .into_iter()
            .partition(|(role, _)| *role == normalize_key(role));

        for (role, pages) in mixed.into_iter().chain(lower) {
            let Value::Object(pages) = pages else {
                tracing::debug!(role = %role, "Dropping non-object role entry from visibility matrix");
                continue;
            };
            let entry = roles.entry(normalize_key(&role)).or_default();
            for (page, visible) in pages {
                match visible {
                    Value::Bool(visible) => {
                        entry.insert(PageKey::new(page), visible);
                    }
                    _ => {
                        tracing::debug!(role = %role, page = %page, "Dropping non-boolean visibility cell");
                    }
                }
            }
        }

        Self { roles }
    }
}

impl From<VisibilityMatrix> for WireMatrix {
    fn from(matrix: VisibilityMatrix) -> Self {
        matrix
            .roles
            .into_iter()
            .map(|(role, pages)| {
                let pages: BTreeMap<String, bool> =
                    pages.into_iter().map(|(k, v)| (k.0, v)).collect();
                (role, pages)
            })
            .collect()
    }
}
