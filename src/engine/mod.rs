// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Engine clients
//!
//! Each engine turns OpenSCAD source into output bytes, or into a pending
//! token when the work happens somewhere else. The selector only talks to
//! engines through the [`Engine`] trait.

mod browser;
mod local;
mod process;

pub use browser::BrowserEngine;
pub use local::{discover_openscad, LocalEngine};
pub use process::{run_with_timeout, ProcessOutcome};

use crate::error::RenderError;
use crate::request::{CorrelationToken, Fingerprint, RenderRequest};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::RwLock;
use std::time::Duration;

/// Which engine produced (or will produce) a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// OpenSCAD compiled to WebAssembly, running in the notebook's browser
    Browser,
    /// OpenSCAD executable on this machine
    Local,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Browser => "browser",
            EngineKind::Local => "local",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Availability of an engine as last probed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineStatus {
    #[default]
    Unknown,
    Available,
    Unavailable,
}

impl EngineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineStatus::Unknown => "unknown",
            EngineStatus::Available => "available",
            EngineStatus::Unavailable => "unavailable",
        }
    }

    /// Whether the selector may try this engine
    pub fn may_attempt(&self) -> bool {
        !matches!(self, EngineStatus::Unavailable)
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an engine hands back
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutput {
    Bytes(Vec<u8>),
    Pending(CorrelationToken),
}

/// Common contract for rendering engines
pub trait Engine: Send + Sync {
    fn kind(&self) -> EngineKind;

    /// Check whether the engine can currently be used
    fn probe(&self) -> EngineStatus;

    /// Render one request. Must not let raw I/O errors escape.
    fn render(
        &self,
        request: &RenderRequest,
        fingerprint: &Fingerprint,
        timeout: Duration,
    ) -> Result<EngineOutput, RenderError>;
}

/// Last probed status per engine
#[derive(Debug, Default)]
pub struct StatusBoard {
    statuses: RwLock<BTreeMap<EngineKind, EngineStatus>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: EngineKind) -> EngineStatus {
        self.statuses
            .read()
            .map(|s| s.get(&kind).copied().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Probe the engine and record what it reports
    pub fn probe(&self, engine: &dyn Engine) -> EngineStatus {
        let status = engine.probe();
        if let Ok(mut statuses) = self.statuses.write() {
            statuses.insert(engine.kind(), status);
        }
        tracing::debug!(engine = %engine.kind(), %status, "probed engine");
        status
    }

    pub fn snapshot(&self) -> BTreeMap<EngineKind, EngineStatus> {
        self.statuses.read().map(|s| s.clone()).unwrap_or_default()
    }
}
