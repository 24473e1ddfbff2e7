// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Render results

use super::CorrelationToken;
use crate::engine::EngineKind;
use crate::error::RenderError;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a render request
#[derive(Debug, Clone, PartialEq)]
pub enum RenderResult {
    /// Geometry bytes produced by an engine
    Success {
        bytes: Arc<[u8]>,
        engine: EngineKind,
        duration: Duration,
    },
    /// Handed to the browser, resolution arrives later
    Pending(CorrelationToken),
    /// Render failed
    Failure(RenderError),
}

impl RenderResult {
    pub fn success(bytes: impl Into<Arc<[u8]>>, engine: EngineKind, duration: Duration) -> Self {
        RenderResult::Success {
            bytes: bytes.into(),
            engine,
            duration,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RenderResult::Success { .. })
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, RenderResult::Pending(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, RenderResult::Failure(_))
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            RenderResult::Success { bytes, .. } => Some(bytes),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&RenderError> {
        match self {
            RenderResult::Failure(err) => Some(err),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<&CorrelationToken> {
        match self {
            RenderResult::Pending(token) => Some(token),
            _ => None,
        }
    }

    /// Short label for logs and status fields
    pub fn label(&self) -> &'static str {
        match self {
            RenderResult::Success { .. } => "success",
            RenderResult::Pending(_) => "pending",
            RenderResult::Failure(_) => "failure",
        }
    }
}
