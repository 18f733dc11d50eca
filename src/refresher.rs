// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Visibility Refresher
//!
//! Background task that turns bus signals into the asynchronous refetches
//! they call for:
//!
//! - `visibilityUpdated` → refetch the matrix
//! - `profileUpdated` → merge the patch, refetch the profile on role change
//!
//! Listeners are registered when the refresher is created, so signals
//! published between construction and the first poll of [`Refresher::run`]
//! are not lost. Several `visibilityUpdated` signals that arrive while a
//! refetch is running collapse into one follow-up refetch.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken`. Cancelling stops the loop and
//! drops the subscriptions; a refetch already in flight is allowed to finish.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::AuthBackend;
use crate::bus::{Signal, SignalKind, Subscription};
use crate::session::Session;

/// Background signal consumer for one [`Session`].
pub struct Refresher<B> {
    session: Arc<Session<B>>,
    visibility_rx: UnboundedReceiver<Signal>,
    profile_rx: UnboundedReceiver<Signal>,
    _subscriptions: [Subscription; 2],
}

impl<B: AuthBackend + 'static> Refresher<B> {
    /// Subscribe to the session's bus.
    pub fn new(session: Arc<Session<B>>) -> Self {
        let (visibility_sub, visibility_rx) =
            session.bus().subscribe_channel(SignalKind::VisibilityUpdated);
        let (profile_sub, profile_rx) = session.bus().subscribe_channel(SignalKind::ProfileUpdated);

        Self {
            session,
            visibility_rx,
            profile_rx,
            _subscriptions: [visibility_sub, profile_sub],
        }
    }

    /// Run on the current runtime until `shutdown` is cancelled.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Consume signals until the cancellation token is triggered.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Visibility refresher starting");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Visibility refresher shutting down");
                    return;
                }
                Some(signal) = self.visibility_rx.recv() => {
                    let coalesced = self.drain_visibility();
                    if coalesced > 0 {
                        tracing::debug!(coalesced, "Coalesced queued visibility signals");
                    }
                    self.session.handle_signal(&signal).await;
                }
                Some(signal) = self.profile_rx.recv() => {
                    self.session.handle_signal(&signal).await;
                }
            }
        }
    }

    fn drain_visibility(&mut self) -> usize {
        let mut drained = 0;
        while self.visibility_rx.try_recv().is_ok() {
            drained += 1;
        }
        drained
    }
}
