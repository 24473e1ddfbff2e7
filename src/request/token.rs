// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Correlation tokens for browser-side renders
//!
//! Wire form is `WASM_RENDER_REQUEST:<hash>`. Anything carrying the prefix is
//! a request to render, never rendered output.

use super::Fingerprint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved prefix marking a bus value as a render request
pub const TOKEN_PREFIX: &str = "WASM_RENDER_REQUEST:";

/// Opaque token linking a browser render back to its request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationToken {
    hash: String,
}

impl CorrelationToken {
    pub fn for_fingerprint(fingerprint: &Fingerprint) -> Self {
        Self {
            hash: fingerprint.as_str().to_string(),
        }
    }

    /// Decode a wire string, `None` unless it carries the reserved prefix
    pub fn decode(wire: &str) -> Option<Self> {
        wire.strip_prefix(TOKEN_PREFIX).map(|hash| Self {
            hash: hash.to_string(),
        })
    }

    /// True if the string is a token rather than literal output
    pub fn is_token(wire: &str) -> bool {
        wire.starts_with(TOKEN_PREFIX)
    }

    pub fn encode(&self) -> String {
        format!("{}{}", TOKEN_PREFIX, self.hash)
    }

    /// Raw hash text as it appeared on the wire
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// The fingerprint this token refers to, if the hash is one
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        Fingerprint::parse(&self.hash).ok()
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
