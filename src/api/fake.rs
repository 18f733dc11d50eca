// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory [`AuthBackend`] for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use super::client::AuthBackend;
use super::models::ProfileResponse;
use crate::error::ClientError;
use crate::visibility::VisibilityMatrix;

/// Backend whose responses are set by the test. `Err(status)` entries make
/// the corresponding call fail with [`ClientError::Status`].
#[derive(Default)]
pub(crate) struct FakeBackend {
    matrix: Mutex<Option<Result<VisibilityMatrix, u16>>>,
    profile: Mutex<Option<Result<ProfileResponse, u16>>>,
    pub(crate) saved: Mutex<Vec<VisibilityMatrix>>,
    pub(crate) visibility_calls: AtomicUsize,
    pub(crate) profile_calls: AtomicUsize,
    save_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_matrix(&self, matrix: VisibilityMatrix) {
        *self.matrix.lock().unwrap() = Some(Ok(matrix));
    }

    pub(crate) fn fail_matrix(&self, status: u16) {
        *self.matrix.lock().unwrap() = Some(Err(status));
    }

    pub(crate) fn set_profile(&self, json: &str) {
        *self.profile.lock().unwrap() = Some(Ok(serde_json::from_str(json).unwrap()));
    }

    pub(crate) fn fail_profile(&self, status: u16) {
        *self.profile.lock().unwrap() = Some(Err(status));
    }

    /// Park every later save until the returned gate is notified.
    pub(crate) fn hold_saves(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.save_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub(crate) fn visibility_calls(&self) -> usize {
        self.visibility_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }
}

fn status_error(status: u16) -> ClientError {
    ClientError::Status {
        status,
        body: "fake failure".to_string(),
    }
}

impl AuthBackend for FakeBackend {
    async fn fetch_visibility(&self, _token: &str) -> Result<VisibilityMatrix, ClientError> {
        self.visibility_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.matrix.lock().unwrap().clone();
        match current {
            Some(Ok(matrix)) => Ok(matrix),
            Some(Err(status)) => Err(status_error(status)),
            None => Err(status_error(404)),
        }
    }

    async fn save_visibility(&self, _token: &str, matrix: &VisibilityMatrix) -> Result<(), ClientError> {
        let gate = self.save_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.saved.lock().unwrap().push(matrix.clone());
        self.set_matrix(matrix.clone());
        Ok(())
    }

    async fn fetch_profile(&self, _token: &str) -> Result<ProfileResponse, ClientError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.profile.lock().unwrap().clone();
        match current {
            Some(Ok(profile)) => Ok(profile),
            Some(Err(status)) => Err(status_error(status)),
            None => Err(status_error(404)),
        }
    }
}
