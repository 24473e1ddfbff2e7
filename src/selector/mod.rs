// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Renderer selection and fallback
//!
//! The coordinator checks the cache, then walks the engines allowed by the
//! current [`RenderMode`] until one produces bytes or a pending token.

mod mode;

pub use mode::RenderMode;

use crate::cache::{CacheStats, Claim, RenderCache};
use crate::engine::{Engine, EngineKind, EngineOutput, EngineStatus, StatusBoard};
use crate::error::{EngineAttempt, RenderError};
use crate::request::{CorrelationToken, Fingerprint, RenderRequest, RenderResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Settings the coordinator is constructed with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RendererConfig {
    pub mode: RenderMode,
    /// Deadline for a single engine render
    #[serde(with = "crate::utils::duration::secs")]
    pub render_timeout: Duration,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::Auto,
            render_timeout: Duration::from_secs(30),
        }
    }
}

/// Chooses an engine per request and memoizes the outcome
pub struct RenderCoordinator {
    mode: RwLock<RenderMode>,
    render_timeout: Duration,
    cache: Arc<RenderCache>,
    engines: BTreeMap<EngineKind, Arc<dyn Engine>>,
    statuses: StatusBoard,
}

impl RenderCoordinator {
    pub fn new(config: RendererConfig, cache: Arc<RenderCache>) -> Self {
        Self {
            mode: RwLock::new(config.mode),
            render_timeout: config.render_timeout,
            cache,
            engines: BTreeMap::new(),
            statuses: StatusBoard::new(),
        }
    }

    /// Register an engine, replacing any engine of the same kind
    pub fn with_engine(mut self, engine: Arc<dyn Engine>) -> Self {
        self.register(engine);
        self
    }

    pub fn register(&mut self, engine: Arc<dyn Engine>) {
        self.engines.insert(engine.kind(), engine);
    }

    pub fn mode(&self) -> RenderMode {
        *self.mode.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switch modes. Cached results stay valid: they depend on content only.
    pub fn set_mode(&self, mode: RenderMode) {
        let mut current = self.mode.write().unwrap_or_else(PoisonError::into_inner);
        let previous = *current;
        if previous != mode {
            tracing::info!(from = %previous, to = %mode, "renderer mode changed");
            *current = mode;
        }
    }

    pub fn render_timeout(&self) -> Duration {
        self.render_timeout
    }

    pub fn cache(&self) -> &Arc<RenderCache> {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Return the cached result for `request` or render it.
    ///
    /// Identical requests issued concurrently share one engine invocation.
    pub fn select_and_render(&self, request: &RenderRequest) -> RenderResult {
        let fp = request.fingerprint();
        let mut retried = false;

        loop {
            match self.cache.claim(&fp) {
                Ok(Claim::Cached(result)) => {
                    tracing::debug!(fingerprint = fp.short(), outcome = result.label(), "cache hit");
                    return result;
                }
                Ok(Claim::Wait(flight)) => {
                    tracing::debug!(fingerprint = fp.short(), "waiting on render in flight");
                    if let Some(result) = flight.wait() {
                        return result;
                    }
                }
                Ok(Claim::Owner(guard)) => {
                    let result = self.dispatch(request, &fp);
                    return guard.complete(result);
                }
                Err(err @ RenderError::CacheCorruption { .. }) if !retried => {
                    tracing::warn!(fingerprint = fp.short(), error = %err, "invalidating corrupt cache entry");
                    self.cache.invalidate(&fp);
                    retried = true;
                }
                Err(err) => return RenderResult::Failure(err),
            }
        }
    }

    fn dispatch(&self, request: &RenderRequest, fp: &Fingerprint) -> RenderResult {
        let mode = self.mode();
        let mut attempts = Vec::new();

        for &kind in mode.candidates() {
            let Some(engine) = self.engines.get(&kind) else {
                attempts.push(EngineAttempt {
                    engine: kind,
                    error: RenderError::EngineUnavailable {
                        engine: kind,
                        reason: "engine not configured".to_string(),
                    },
                });
                continue;
            };

            let mut status = self.statuses.get(kind);
            if status == EngineStatus::Unknown {
                status = self.statuses.probe(engine.as_ref());
            }
            if !status.may_attempt() {
                tracing::debug!(engine = %kind, "skipping unavailable engine");
                attempts.push(EngineAttempt {
                    engine: kind,
                    error: RenderError::EngineUnavailable {
                        engine: kind,
                        reason: "probe reported engine unavailable".to_string(),
                    },
                });
                continue;
            }

            let start = Instant::now();
            match engine.render(request, fp, self.render_timeout) {
                Ok(EngineOutput::Bytes(bytes)) => {
                    let duration = start.elapsed();
                    tracing::info!(
                        engine = %kind,
                        fingerprint = fp.short(),
                        bytes = bytes.len(),
                        elapsed_ms = duration.as_millis() as u64,
                        "rendered"
                    );
                    return RenderResult::success(bytes, kind, duration);
                }
                Ok(EngineOutput::Pending(token)) => {
                    tracing::info!(engine = %kind, fingerprint = fp.short(), "render pending");
                    return RenderResult::Pending(token);
                }
                Err(error) => {
                    tracing::warn!(engine = %kind, fingerprint = fp.short(), %error, "engine failed, trying next");
                    attempts.push(EngineAttempt {
                        engine: kind,
                        error,
                    });
                }
            }
        }

        tracing::warn!(
            fingerprint = fp.short(),
            mode = %mode,
            attempted = attempts.len(),
            "all engines unavailable"
        );
        RenderResult::Failure(RenderError::AllEnginesUnavailable { attempts })
    }

    /// Feed in the browser's answer for a pending render.
    ///
    /// Returns the stored result, or `StaleCorrelation` if the token no
    /// longer matches a pending entry. Stale answers are dropped.
    pub fn resolve(
        &self,
        token: &CorrelationToken,
        outcome: Result<Vec<u8>, String>,
    ) -> Result<RenderResult, RenderError> {
        let stale = || RenderError::StaleCorrelation {
            token: token.encode(),
        };
        let Some(fp) = token.fingerprint() else {
            tracing::debug!(token = %token, "discarding resolution with malformed token");
            return Err(stale());
        };

        let elapsed = self.cache.age(&fp).unwrap_or_default();
        let result = match outcome {
            Ok(bytes) if !bytes.is_empty() => {
                RenderResult::success(bytes, EngineKind::Browser, elapsed)
            }
            Ok(_) => browser_failure("browser engine returned no geometry".to_string()),
            Err(message) => browser_failure(message),
        };

        match self.cache.resolve(&fp, token, result.clone()) {
            Ok(()) => {
                tracing::info!(fingerprint = fp.short(), outcome = result.label(), "browser render resolved");
                Ok(result)
            }
            Err(err) => {
                tracing::debug!(fingerprint = fp.short(), "discarding stale browser resolution");
                Err(err)
            }
        }
    }

    /// Forget the cached result for a request so the next render runs again
    pub fn invalidate(&self, request: &RenderRequest) -> bool {
        self.cache.invalidate(&request.fingerprint())
    }

    pub fn clear_cache(&self) {
        self.cache.clear_all();
    }

    /// Probe one engine again and record the answer
    pub fn refresh_engine(&self, kind: EngineKind) -> EngineStatus {
        match self.engines.get(&kind) {
            Some(engine) => self.statuses.probe(engine.as_ref()),
            None => EngineStatus::Unavailable,
        }
    }

    /// Probe every registered engine
    pub fn refresh_engines(&self) -> BTreeMap<EngineKind, EngineStatus> {
        for engine in self.engines.values() {
            self.statuses.probe(engine.as_ref());
        }
        self.engine_statuses()
    }

    /// Last known status of every registered engine
    pub fn engine_statuses(&self) -> BTreeMap<EngineKind, EngineStatus> {
        let probed = self.statuses.snapshot();
        self.engines
            .keys()
            .map(|kind| (*kind, probed.get(kind).copied().unwrap_or_default()))
            .collect()
    }
}

/// A failed browser render, reported the same way as an exhausted engine walk
fn browser_failure(message: String) -> RenderResult {
    RenderResult::Failure(RenderError::AllEnginesUnavailable {
        attempts: vec![EngineAttempt {
            engine: EngineKind::Browser,
            error: RenderError::EngineProcessError {
                engine: EngineKind::Browser,
                code: None,
                message,
            },
        }],
    })
}
