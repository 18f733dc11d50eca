// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client side of the backend `/auth` contract.
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | `GET` | `/auth/visibility` | → `VisibilityMatrix` |
//! | `POST` | `/auth/visibility` | `{ "visibility": VisibilityMatrix }` |
//! | `GET` | `/auth/profile` | → `{ role, email, avatarUrl, ... }` |
//!
//! All calls send `Authorization: Bearer <token>`.

pub mod client;
pub mod models;

#[cfg(test)]
pub(crate) mod fake;

pub use client::{AuthBackend, HttpBackend};
pub use models::{ProfileResponse, SaveVisibilityRequest};
