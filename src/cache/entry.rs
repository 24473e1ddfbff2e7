// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cache entries

use crate::request::{Fingerprint, RenderResult};
use sha2::{Digest, Sha256};
use std::time::Instant;

/// A stored result plus bookkeeping
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub fingerprint: Fingerprint,
    pub result: RenderResult,
    checksum: Option<String>,
    pub created_at: Instant,
    pub last_used_at: Instant,
}

impl CacheEntry {
    pub fn new(fingerprint: Fingerprint, result: RenderResult) -> Self {
        let now = Instant::now();
        let checksum = result.bytes().map(checksum);
        Self {
            fingerprint,
            result,
            checksum,
            created_at: now,
            last_used_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_used_at = Instant::now();
    }

    /// Check stored geometry against the checksum taken when it was stored
    pub fn verify(&self) -> bool {
        match (self.result.bytes(), &self.checksum) {
            (Some(bytes), Some(expected)) => checksum(bytes) == *expected,
            (None, None) => true,
            _ => false,
        }
    }
}

/// Hex SHA-256 of a payload
pub(crate) fn checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineKind;
    use crate::request::RenderRequest;
    use std::time::Duration;

    #[test]
    fn test_new_entry_verifies() {
        let fp = RenderRequest::new("cube(1);").fingerprint();
        let entry = CacheEntry::new(
            fp,
            RenderResult::success(b"solid x".to_vec(), EngineKind::Local, Duration::ZERO),
        );
        assert!(entry.verify());
        assert_eq!(entry.created_at, entry.last_used_at);
    }

    #[test]
    fn test_tampered_checksum_fails() {
        let fp = RenderRequest::new("cube(1);").fingerprint();
        let mut entry = CacheEntry::new(
            fp,
            RenderResult::success(b"solid x".to_vec(), EngineKind::Local, Duration::ZERO),
        );
        entry.checksum = Some(checksum(b"something else"));
        assert!(!entry.verify());
    }
}
