// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `visibility-probe`: sign in with `CRM_TOKEN` against `CRM_API_BASE_URL`
//! and log what the navigation would show.
//!
//! With `--watch` the probe keeps running until Ctrl-C, publishing
//! `visibilityUpdated` every `WATCH_INTERVAL` so the refresher refetches the
//! matrix, and logging the navigation again on each tick.

use std::sync::Arc;

use crm_visibility::{
    config::{ClientConfig, LOG_FORMAT_ENV, TOKEN_ENV, WATCH_INTERVAL},
    visibility::MatrixStatus,
    HttpBackend, Refresher, Session, Signal,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.pretty().try_init()
    };
}

#[tokio::main]
async fn main() {
    init_tracing();

    let watch = std::env::args().skip(1).any(|arg| arg == "--watch");

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(2);
        }
    };
    let Ok(token) = std::env::var(TOKEN_ENV) else {
        error!("{TOKEN_ENV} is not set");
        std::process::exit(2);
    };

    let backend = match HttpBackend::new(&config) {
        Ok(backend) => backend,
        Err(e) => {
            error!(error = %e, "Failed to create HTTP client");
            std::process::exit(1);
        }
    };

    info!(
        base_url = %config.base_url,
        mode = ?config.mode,
        "Signing in"
    );

    let session = Arc::new(Session::new(backend, config.mode));
    let shutdown = CancellationToken::new();
    let refresher = Refresher::new(Arc::clone(&session)).spawn(shutdown.clone());

    session.login(token).await;
    report(&session);

    if watch {
        info!(interval_secs = WATCH_INTERVAL.as_secs(), "Watching for visibility changes (Ctrl-C to stop)");
        let mut ticker = tokio::time::interval(WATCH_INTERVAL);
        ticker.tick().await;
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                result = &mut ctrl_c => {
                    if let Err(e) = result {
                        warn!(error = %e, "Failed to listen for Ctrl-C");
                    }
                    break;
                }
                _ = ticker.tick() => {
                    report(&session);
                    session.bus().publish(Signal::VisibilityUpdated);
                }
            }
        }
    }

    shutdown.cancel();
    let _ = refresher.await;
}

fn report(session: &Session<HttpBackend>) {
    let store = session.matrix_store();
    if store.status() == MatrixStatus::Unloaded {
        warn!(
            last_error = ?store.last_error(),
            "Visibility matrix not loaded, navigation is hidden"
        );
    }

    info!(
        role = %session.effective_role(),
        email = ?session.display_email(),
        can_edit_visibility = session.can_edit_visibility(),
        "Resolved identity"
    );

    for item in session.visible_nav() {
        info!(page = %item.page, label = %item.label, path = %item.path, "Visible");
    }
}
