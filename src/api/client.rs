// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Backend client for the `/auth` endpoints.

use std::future::Future;

use serde::de::DeserializeOwned;
use url::Url;

use super::models::{ProfileResponse, SaveVisibilityRequest};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::visibility::VisibilityMatrix;

const VISIBILITY_PATH: &str = "auth/visibility";
const PROFILE_PATH: &str = "auth/profile";

/// Calls the visibility engine makes against the CRM backend.
///
/// Implemented over HTTP by [`HttpBackend`]; tests substitute an in-memory
/// implementation.
pub trait AuthBackend: Send + Sync {
    /// `GET /auth/visibility`
    fn fetch_visibility(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<VisibilityMatrix, ClientError>> + Send;

    /// `POST /auth/visibility`
    fn save_visibility(
        &self,
        token: &str,
        matrix: &VisibilityMatrix,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// `GET /auth/profile`
    fn fetch_profile(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<ProfileResponse, ClientError>> + Send;
}

/// reqwest-based [`AuthBackend`].
#[derive(Clone)]
pub struct HttpBackend {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Create a client for the configured backend.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            base_url: config.base_url.clone(),
            client,
        })
    }

    /// Get the backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T, ClientError> {
        let response = self
            .client
            .get(self.endpoint(path)?)
            .bearer_auth(token)
            .send()
            .await?;

        let response = check_status(response).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Map a non-2xx response to [`ClientError::Status`], keeping the body text.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

impl AuthBackend for HttpBackend {
    async fn fetch_visibility(&self, token: &str) -> Result<VisibilityMatrix, ClientError> {
        self.get_json(VISIBILITY_PATH, token).await
    }

    async fn save_visibility(&self, token: &str, matrix: &VisibilityMatrix) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.endpoint(VISIBILITY_PATH)?)
            .bearer_auth(token)
            .json(&SaveVisibilityRequest { visibility: matrix })
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    async fn fetch_profile(&self, token: &str) -> Result<ProfileResponse, ClientError> {
        self.get_json(PROFILE_PATH, token).await
    }
}
