// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Identity and Role Module
//!
//! Works out who the current user is and which role drives navigation.
//!
//! ## Role Flow
//!
//! 1. The UI holds an opaque bearer token after login
//! 2. The token payload is decoded (unverified) for an optimistic identity
//! 3. `GET /auth/profile` returns the authoritative user
//! 4. The effective role is:
//!    - the profile role if loaded
//!    - else the token's self-reported role
//!    - else `guest`
//!
//! ## Security
//!
//! - Nothing here is a security boundary; the backend enforces authorization
//! - Token signatures are never checked on the client
//! - Mutating actions are gated on the profile role only

pub mod claims;
pub mod resolver;
pub mod roles;
pub mod user;

pub use claims::{decode_unverified, UnverifiedClaims};
pub use resolver::{resolve_mutating_role, resolve_role};
pub use roles::Role;
pub use user::{EffectiveUser, ProfilePatch};
