// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Change Propagation Bus
//!
//! In-process publish/subscribe used to make navigation and page guards
//! re-resolve when the matrix or the current user's profile changes.
//!
//! ## Delivery
//!
//! - Synchronous fan-out inside [`ChangeBus::publish`]
//! - Only listeners registered when `publish` is called receive the signal
//! - Listeners of one signal kind run in registration order; no ordering is
//!   promised across kinds
//! - Nothing is queued or persisted
//!
//! ## Lifecycle
//!
//! [`ChangeBus::subscribe`] returns a [`Subscription`]; dropping it (the
//! component unmounting) removes the listener. The subscription only holds a
//! weak reference to the bus, and the bus owns nothing beyond the listener
//! closure itself.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde::Serialize;
use tokio::sync::mpsc;

use crate::auth::ProfilePatch;

/// A change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// The current user's profile changed; carries the changed fields
    ProfileUpdated(ProfilePatch),
    /// The visibility matrix changed server-side; refetch it
    VisibilityUpdated,
    /// The notification list was cleared
    NotificationsCleared,
}

/// Signal discriminant used for subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SignalKind {
    ProfileUpdated,
    VisibilityUpdated,
    NotificationsCleared,
}

impl Signal {
    pub fn kind(&self) -> SignalKind {
        match self {
            Signal::ProfileUpdated(_) => SignalKind::ProfileUpdated,
            Signal::VisibilityUpdated => SignalKind::VisibilityUpdated,
            Signal::NotificationsCleared => SignalKind::NotificationsCleared,
        }
    }
}

impl SignalKind {
    /// Event name as used by the web client.
    pub fn name(&self) -> &'static str {
        match self {
            SignalKind::ProfileUpdated => "profileUpdated",
            SignalKind::VisibilityUpdated => "visibilityUpdated",
            SignalKind::NotificationsCleared => "notificationsCleared",
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

type Listener = Arc<dyn Fn(&Signal) + Send + Sync>;

struct Registration {
    id: u64,
    kind: SignalKind,
    listener: Listener,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    /// Kept in registration order
    entries: Vec<Registration>,
}

/// Shared handle to the bus. Clones refer to the same listener set.
#[derive(Clone, Default)]
pub struct ChangeBus {
    registry: Arc<Mutex<Registry>>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for signals of `kind`.
    pub fn subscribe<F>(&self, kind: SignalKind, listener: F) -> Subscription
    where
        F: Fn(&Signal) + Send + Sync + 'static,
    {
        let mut registry = self.lock();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.entries.push(Registration {
            id,
            kind,
            listener: Arc::new(listener),
        });
        tracing::trace!(signal = %kind, id, "Listener registered");

        Subscription {
            registry: Arc::downgrade(&self.registry),
            id,
        }
    }

    /// Register a listener that forwards signals of `kind` into a channel,
    /// for consumers that react asynchronously.
    pub fn subscribe_channel(&self, kind: SignalKind) -> (Subscription, mpsc::UnboundedReceiver<Signal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(kind, move |signal| {
            // Receiver gone means the consumer stopped; nothing to do.
            let _ = tx.send(signal.clone());
        });
        (subscription, rx)
    }

    /// Deliver `signal` to every listener of its kind registered right now.
    /// Returns the number of listeners called.
    pub fn publish(&self, signal: Signal) -> usize {
        let kind = signal.kind();
        // Snapshot under the lock, call outside it so listeners may
        // subscribe or unsubscribe while being notified.
        let listeners: Vec<Listener> = self
            .lock()
            .entries
            .iter()
            .filter(|entry| entry.kind == kind)
            .map(|entry| Arc::clone(&entry.listener))
            .collect();

        tracing::debug!(signal = %kind, listeners = listeners.len(), "Publishing signal");
        for listener in &listeners {
            listener(&signal);
        }
        listeners.len()
    }

    /// Number of listeners currently registered for `kind`.
    pub fn listener_count(&self, kind: SignalKind) -> usize {
        self.lock()
            .entries
            .iter()
            .filter(|entry| entry.kind == kind)
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registration handle; dropping it removes the listener.
#[must_use = "dropping a Subscription unregisters the listener immediately"]
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    id: u64,
}

impl Subscription {
    /// Remove the listener now. Same as dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        // Release the lock before the listener is dropped; its closure may
        // own further subscriptions.
        let removed = {
            let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
            registry
                .entries
                .iter()
                .position(|entry| entry.id == self.id)
                .map(|index| registry.entries.remove(index))
        };
        drop(removed);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
