// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! CRM Visibility - Role & Page-Visibility Resolution Engine
//!
//! Decides, on the client, which navigation entries and pages of the CRM
//! admin application the current user may see. Inputs are an opaque bearer
//! token and the server's role → page visibility matrix. The answer is
//! advisory UX; the backend remains the authority on every request.
//!
//! ## Modules
//!
//! - `auth` - Unverified token claims, profile user, effective role
//! - `visibility` - Matrix types, matrix store, visibility resolution
//! - `bus` - In-process change propagation (`profileUpdated`, `visibilityUpdated`, ...)
//! - `session` - Facade the UI chrome talks to
//! - `refresher` - Background task applying bus signals
//! - `api` - Backend `/auth` client
//! - `config` - Environment configuration
//!
//! ## Example
//!
//! ```rust,ignore
//! let config = ClientConfig::from_env()?;
//! let session = Arc::new(Session::new(HttpBackend::new(&config)?, config.mode));
//! let shutdown = CancellationToken::new();
//! Refresher::new(Arc::clone(&session)).spawn(shutdown.clone());
//!
//! session.login(token).await;
//! if session.is_visible(pages::ADMIN_USERS) {
//!     // render the Users entry
//! }
//! ```

pub mod api;
pub mod auth;
pub mod bus;
pub mod config;
pub mod error;
pub mod refresher;
pub mod session;
pub mod visibility;

pub use api::{AuthBackend, HttpBackend};
pub use auth::{decode_unverified, resolve_role, EffectiveUser, Role, UnverifiedClaims};
pub use bus::{ChangeBus, Signal, SignalKind, Subscription};
pub use config::ClientConfig;
pub use error::ClientError;
pub use refresher::Refresher;
pub use session::Session;
pub use visibility::{is_visible, pages, PageKey, VisibilityMatrix, VisibilityMode};
