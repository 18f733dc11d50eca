// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the [`ClientConfig`] built from
//! them.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `CRM_API_BASE_URL` | Base URL of the CRM backend (`/auth/*` is joined to it) | Required |
//! | `CRM_HTTP_TIMEOUT_SECS` | Per-request timeout for backend calls | `10` |
//! | `CRM_VISIBILITY_MODE` | `matrix` (server table) or `legacy` (hardcoded table) | `matrix` |
//! | `CRM_TOKEN` | Bearer token used by the `visibility-probe` binary | Required for the probe |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::time::Duration;

use url::Url;

use crate::error::ClientError;
use crate::visibility::VisibilityMode;

/// Environment variable name for the backend base URL.
pub const API_BASE_URL_ENV: &str = "CRM_API_BASE_URL";

/// Environment variable name for the backend request timeout, in seconds.
pub const HTTP_TIMEOUT_ENV: &str = "CRM_HTTP_TIMEOUT_SECS";

/// Environment variable name selecting the visibility policy.
pub const VISIBILITY_MODE_ENV: &str = "CRM_VISIBILITY_MODE";

/// Environment variable name for the probe's bearer token.
pub const TOKEN_ENV: &str = "CRM_TOKEN";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default backend request timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// How often `visibility-probe --watch` asks for a matrix refetch.
pub const WATCH_INTERVAL: Duration = Duration::from_secs(30);

/// Settings for talking to the CRM backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL, always ending in `/` so endpoint paths join under it
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// Matrix-driven or legacy visibility
    pub mode: VisibilityMode,
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the base URL.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            timeout: DEFAULT_HTTP_TIMEOUT,
            mode: VisibilityMode::default(),
        })
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary variable lookup (tests inject a map here
    /// instead of touching the process environment).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let base_url = lookup(API_BASE_URL_ENV)
            .ok_or_else(|| ClientError::Config(format!("{API_BASE_URL_ENV} is not set")))?;
        let mut config = Self::new(&base_url)?;

        if let Some(raw) = lookup(HTTP_TIMEOUT_ENV) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ClientError::Config(format!("{HTTP_TIMEOUT_ENV} must be a whole number of seconds, got {raw:?}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup(VISIBILITY_MODE_ENV) {
            config.mode = VisibilityMode::parse(&raw).ok_or_else(|| {
                ClientError::Config(format!("{VISIBILITY_MODE_ENV} must be `matrix` or `legacy`, got {raw:?}"))
            })?;
        }

        Ok(config)
    }
}

fn normalize_base_url(raw: &str) -> Result<Url, ClientError> {
    let mut url = Url::parse(raw.trim())?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
