// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Content fingerprints
//!
//! SHA-256 over a length-prefixed serialization of the source text and the
//! options in key order. Values keep their type, so `1`, `1.0` and `"1"` hash
//! differently. `-0.0` hashes as `0.0` and every NaN hashes the same.

use super::{OptionValue, RenderRequest};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

const FORMAT_VERSION: &[u8] = b"scadview-fp-v1";

/// Hex-encoded SHA-256 content hash of a render request
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(request: &RenderRequest) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(FORMAT_VERSION);
        update_field(&mut hasher, request.source_text().as_bytes());

        hasher.update((request.options().len() as u64).to_le_bytes());
        for (key, value) in request.options() {
            update_field(&mut hasher, key.as_bytes());
            hasher.update([value.type_tag()]);
            match value {
                OptionValue::Bool(b) => hasher.update([*b as u8]),
                OptionValue::Int(i) => hasher.update(i.to_le_bytes()),
                OptionValue::Float(f) => hasher.update(canonical_float_bits(*f).to_le_bytes()),
                OptionValue::Text(s) => update_field(&mut hasher, s.as_bytes()),
            }
        }

        Self(format!("{:x}", hasher.finalize()))
    }

    /// Parse a previously rendered fingerprint (64 hex digits)
    pub fn parse(hex: &str) -> Result<Self> {
        if hex.len() != 64 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            bail!("Invalid fingerprint: {:?}", hex);
        }
        Ok(Self(hex.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for logs
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = anyhow::Error;

    fn try_from(hex: String) -> Result<Self> {
        Self::parse(&hex)
    }
}

impl From<Fingerprint> for String {
    fn from(fp: Fingerprint) -> Self {
        fp.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

fn canonical_float_bits(value: f64) -> u64 {
    if value.is_nan() {
        f64::NAN.to_bits()
    } else if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}
