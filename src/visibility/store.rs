// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Visibility matrix cache.
//!
//! Holds the most recent matrix fetched from `GET /auth/visibility`.
//!
//! ## Semantics
//!
//! - Readers take an `Arc` clone of the current snapshot and never wait on
//!   a fetch in progress
//! - A completed fetch replaces the whole snapshot in one assignment
//! - Every fetch takes a ticket; a response older than the last applied
//!   one is discarded, so the most recently *started* fetch wins
//! - [`MatrixStore::clear`] (logout) invalidates every outstanding ticket
//! - A failed refresh keeps the previous snapshot and marks it stale; with
//!   no previous snapshot the store stays unloaded and everything is hidden
//!
//! There is no retry or backoff. The next refresh happens on the next
//! login or `visibilityUpdated` signal.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::matrix::VisibilityMatrix;
use crate::api::AuthBackend;
use crate::error::ClientError;

/// One fetched matrix and when it arrived.
#[derive(Debug, Clone)]
pub struct MatrixSnapshot {
    pub matrix: Arc<VisibilityMatrix>,
    pub fetched_at: DateTime<Utc>,
    /// Ticket of the fetch that produced this snapshot
    pub generation: u64,
}

impl MatrixSnapshot {
    /// Time since the snapshot was fetched.
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.fetched_at
    }
}

/// Loading state of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatrixStatus {
    /// Never loaded (or cleared); everything is hidden
    Unloaded,
    /// Latest snapshot is current
    Fresh,
    /// Snapshot is usable but a refresh failed or is pending
    Stale,
}

/// Handle for one fetch, issued by [`MatrixStore::begin_fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

#[derive(Default)]
struct StoreState {
    snapshot: Option<MatrixSnapshot>,
    /// Highest ticket whose result was applied
    applied: u64,
    /// Tickets at or below this were issued before the last clear
    floor: u64,
    stale: bool,
    last_error: Option<String>,
}

impl StoreState {
    fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 > self.applied && ticket.0 > self.floor
    }
}

/// Process-wide cache of the visibility matrix.
#[derive(Default)]
pub struct MatrixStore {
    state: RwLock<StoreState>,
    next_ticket: AtomicU64,
}

impl MatrixStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current matrix, or `None` while unloaded.
    pub fn current(&self) -> Option<Arc<VisibilityMatrix>> {
        self.read(|state| state.snapshot.as_ref().map(|s| Arc::clone(&s.matrix)))
    }

    /// Current snapshot with its metadata.
    pub fn snapshot(&self) -> Option<MatrixSnapshot> {
        self.read(|state| state.snapshot.clone())
    }

    pub fn status(&self) -> MatrixStatus {
        self.read(|state| match (&state.snapshot, state.stale) {
            (None, _) => MatrixStatus::Unloaded,
            (Some(_), false) => MatrixStatus::Fresh,
            (Some(_), true) => MatrixStatus::Stale,
        })
    }

    /// Error text of the most recent failed fetch, cleared by the next success.
    pub fn last_error(&self) -> Option<String> {
        self.read(|state| state.last_error.clone())
    }

    /// Reserve a ticket for a fetch about to start.
    pub fn begin_fetch(&self) -> FetchTicket {
        FetchTicket(self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Record the outcome of the fetch holding `ticket`.
    ///
    /// Returns the matrix the store serves afterwards. A superseded success
    /// returns the newer matrix already in place; a result that arrives after
    /// [`clear`](Self::clear) returns [`ClientError::NotAuthenticated`].
    pub fn complete(
        &self,
        ticket: FetchTicket,
        result: Result<VisibilityMatrix, ClientError>,
    ) -> Result<Arc<VisibilityMatrix>, ClientError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        if ticket.0 <= state.floor {
            tracing::debug!(ticket = ticket.0, "Discarding visibility response from a cleared session");
            return result.and(Err(ClientError::NotAuthenticated));
        }

        match result {
            Ok(matrix) if state.is_current(ticket) => {
                let matrix = Arc::new(matrix);
                state.snapshot = Some(MatrixSnapshot {
                    matrix: Arc::clone(&matrix),
                    fetched_at: Utc::now(),
                    generation: ticket.0,
                });
                state.applied = ticket.0;
                state.stale = false;
                state.last_error = None;
                tracing::info!(generation = ticket.0, "Visibility matrix replaced");
                Ok(matrix)
            }
            Ok(_) => {
                tracing::debug!(
                    ticket = ticket.0,
                    applied = state.applied,
                    "Discarding superseded visibility response"
                );
                // ticket > floor and ticket <= applied, so a snapshot was
                // installed after the last clear; the error arm is unreachable.
                state
                    .snapshot
                    .as_ref()
                    .map(|s| Arc::clone(&s.matrix))
                    .ok_or(ClientError::NotAuthenticated)
            }
            Err(e) => {
                if state.is_current(ticket) {
                    state.stale = state.snapshot.is_some();
                    state.last_error = Some(e.to_string());
                }
                Err(e)
            }
        }
    }

    /// Fetch the matrix and install it. Errors are returned to the caller;
    /// used by screens that must show them (the visibility editor).
    pub async fn fetch<B: AuthBackend>(
        &self,
        backend: &B,
        token: &str,
    ) -> Result<Arc<VisibilityMatrix>, ClientError> {
        let ticket = self.begin_fetch();
        let result = backend.fetch_visibility(token).await;
        self.complete(ticket, result)
    }

    /// Fetch the matrix for navigation purposes. Failures are logged and
    /// swallowed; returns whether a new matrix was installed.
    pub async fn refresh<B: AuthBackend>(&self, backend: &B, token: &str) -> bool {
        match self.fetch(backend, token).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    status = ?self.status(),
                    "Visibility matrix refresh failed, keeping previous state"
                );
                false
            }
        }
    }

    /// Install a matrix directly, superseding any fetch already in flight.
    pub fn replace(&self, matrix: VisibilityMatrix) -> Arc<VisibilityMatrix> {
        let ticket = self.begin_fetch();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let matrix = Arc::new(matrix);
        state.snapshot = Some(MatrixSnapshot {
            matrix: Arc::clone(&matrix),
            fetched_at: Utc::now(),
            generation: ticket.0,
        });
        state.applied = ticket.0;
        state.stale = false;
        state.last_error = None;
        matrix
    }

    /// Flag the current snapshot as out of date (server says it changed).
    /// Readers keep using it until the refetch lands.
    pub fn mark_stale(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.stale = state.snapshot.is_some();
    }

    /// Drop the matrix and invalidate in-flight fetches (logout).
    pub fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let floor = self.next_ticket.load(Ordering::SeqCst);
        *state = StoreState {
            floor,
            applied: floor,
            ..StoreState::default()
        };
        tracing::debug!(floor, "Visibility matrix cleared");
    }

    fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> T {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }
}
