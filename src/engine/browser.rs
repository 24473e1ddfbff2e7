// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Browser (WebAssembly) engine coordinator
//!
//! The WASM build of OpenSCAD only runs inside the notebook's browser, so this
//! engine never renders anything itself. It hands out a correlation token and
//! the widget front end answers later through the property bus.

use super::{Engine, EngineKind, EngineOutput, EngineStatus};
use crate::error::RenderError;
use crate::request::{CorrelationToken, Fingerprint, RenderRequest};
use std::sync::RwLock;
use std::time::Duration;

/// Dispatches renders to the browser by correlation token
#[derive(Debug, Default)]
pub struct BrowserEngine {
    capability: RwLock<EngineStatus>,
}

impl BrowserEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with a capability already known, e.g. from configuration
    pub fn with_capability(available: bool) -> Self {
        let engine = Self::new();
        engine.report_capability(available);
        engine
    }

    /// Record whether the front end reported WebAssembly support.
    /// Takes effect the next time the engine is probed.
    pub fn report_capability(&self, available: bool) {
        let status = if available {
            EngineStatus::Available
        } else {
            EngineStatus::Unavailable
        };
        if let Ok(mut capability) = self.capability.write() {
            *capability = status;
        }
    }
}

impl Engine for BrowserEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Browser
    }

    fn probe(&self) -> EngineStatus {
        self.capability.read().map(|c| *c).unwrap_or_default()
    }

    fn render(
        &self,
        _request: &RenderRequest,
        fingerprint: &Fingerprint,
        _timeout: Duration,
    ) -> Result<EngineOutput, RenderError> {
        let token = CorrelationToken::for_fingerprint(fingerprint);
        tracing::debug!(fingerprint = fingerprint.short(), "dispatching render to browser");
        Ok(EngineOutput::Pending(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_is_always_pending() {
        let engine = BrowserEngine::new();
        let request = RenderRequest::new("cube(1);");
        let fp = request.fingerprint();
        let output = engine.render(&request, &fp, Duration::ZERO).unwrap();
        assert_eq!(
            output,
            EngineOutput::Pending(CorrelationToken::for_fingerprint(&fp))
        );
    }

    #[test]
    fn test_capability_reporting() {
        let engine = BrowserEngine::new();
        assert_eq!(engine.probe(), EngineStatus::Unknown);
        engine.report_capability(false);
        assert_eq!(engine.probe(), EngineStatus::Unavailable);
        assert_eq!(BrowserEngine::with_capability(true).probe(), EngineStatus::Available);
    }
}
