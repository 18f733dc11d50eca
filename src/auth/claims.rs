// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Display-only claims read from a bearer token.
//!
//! ## Security
//!
//! The token signature is **not** verified here. The output is good for an
//! optimistic avatar/email and an optimistic read-only role while the
//! authoritative profile is still loading. It must never gate a mutating
//! action, and it deliberately carries no grant decision of its own.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::Serialize;
use serde_json::Value;

use super::roles::Role;

/// Standard alphabet, padding optional. Payload segments arrive unpadded and
/// url-safe; the url-safe characters are mapped back before decoding.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Identity claims decoded from a token payload without verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnverifiedClaims {
    /// `sub` claim
    pub subject_id: String,
    /// `email` claim
    pub email: String,
    /// Self-reported `role` claim, if present and recognised
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Decode the payload segment of a compact token.
///
/// Returns `None` for an absent token and for anything that is not a
/// dot-separated token whose middle segment is base64 JSON with string `sub`
/// and `email` fields. Never panics.
pub fn decode_unverified(token: Option<&str>) -> Option<UnverifiedClaims> {
    let token = token?;
    match parse_payload(token) {
        Ok(claims) => Some(claims),
        Err(reason) => {
            tracing::debug!(reason, "Ignoring undecodable bearer token");
            None
        }
    }
}

fn parse_payload(token: &str) -> Result<UnverifiedClaims, &'static str> {
    let segment = token.split('.').nth(1).ok_or("missing payload segment")?;

    let standard: String = segment
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    let bytes = PAYLOAD_ENGINE
        .decode(standard.as_bytes())
        .map_err(|_| "payload is not base64")?;

    let value: Value = serde_json::from_slice(&bytes).map_err(|_| "payload is not JSON")?;
    let object = value.as_object().ok_or("payload is not an object")?;

    let subject_id = object
        .get("sub")
        .and_then(Value::as_str)
        .ok_or("missing string sub")?
        .to_owned();
    let email = object
        .get("email")
        .and_then(Value::as_str)
        .ok_or("missing string email")?
        .to_owned();
    let role = object.get("role").and_then(Value::as_str).and_then(Role::parse);

    Ok(UnverifiedClaims {
        subject_id,
        email,
        role,
    })
}
