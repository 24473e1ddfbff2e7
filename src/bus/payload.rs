// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry field wire format
//!
//! The geometry field is a plain string. It either holds base64 geometry or a
//! correlation token asking the browser to render. Standard base64 never
//! contains `_` or `:`, so literal data can never look like a token.

use crate::request::CorrelationToken;
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Typed view of the geometry field
#[derive(Debug, Clone, PartialEq)]
pub enum WirePayload {
    /// Rendered geometry
    Literal(Vec<u8>),
    /// Render request for the browser engine
    Request(CorrelationToken),
}

impl WirePayload {
    pub fn encode(&self) -> String {
        match self {
            WirePayload::Literal(bytes) => STANDARD.encode(bytes),
            WirePayload::Request(token) => token.encode(),
        }
    }

    pub fn decode(wire: &str) -> Result<Self> {
        if let Some(token) = CorrelationToken::decode(wire) {
            return Ok(WirePayload::Request(token));
        }
        let bytes = STANDARD
            .decode(wire.trim())
            .context("Geometry field is neither a render request nor base64 data")?;
        Ok(WirePayload::Literal(bytes))
    }
}

/// Base64 text for a geometry payload
pub fn encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode base64 text coming back from the front end
pub fn decode_bytes(text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text.trim())
        .context("Invalid base64 geometry data")
}
