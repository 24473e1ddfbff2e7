// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Widget state machine on top of the coordinator

use super::payload::{decode_bytes, encode_bytes, WirePayload};
use super::{fields, PropertyBus};
use crate::engine::{BrowserEngine, EngineKind};
use crate::request::{CorrelationToken, Fingerprint, RenderOptions, RenderRequest, RenderResult};
use crate::selector::{RenderCoordinator, RenderMode};
use crate::source::ScadSource;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// Something that happened on the front end or in the notebook
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    SourceChanged(String),
    OptionsChanged(RenderOptions),
    ModeChanged(RenderMode),
    ForceRerender,
    /// Front end reported whether it can run WebAssembly
    BrowserCapability(bool),
    /// Front end finished a token render
    BrowserResult(BrowserReply),
}

/// Value the front end posts to the `browser_result` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserReply {
    /// Correlation token exactly as it was sent out
    pub token: String,
    /// Base64 geometry on success
    #[serde(default)]
    pub stl_data: Option<String>,
    /// Error text on failure
    #[serde(default)]
    pub error: Option<String>,
}

impl BrowserReply {
    fn outcome(&self) -> std::result::Result<Vec<u8>, String> {
        match (&self.stl_data, &self.error) {
            (_, Some(error)) => Err(error.clone()),
            (Some(data), None) => {
                decode_bytes(data).map_err(|e| format!("browser sent unreadable geometry: {}", e))
            }
            (None, None) => Err("browser sent neither geometry nor an error".to_string()),
        }
    }
}

/// Drives one widget instance: keeps the bus fields in step with renders
pub struct WidgetAdapter<B: PropertyBus> {
    coordinator: Arc<RenderCoordinator>,
    browser: Option<Arc<BrowserEngine>>,
    bus: B,
    source: String,
    options: RenderOptions,
    current: Option<Fingerprint>,
    last_good: Option<Arc<[u8]>>,
    show_diagnostics: bool,
}

impl<B: PropertyBus> WidgetAdapter<B> {
    pub fn new(coordinator: Arc<RenderCoordinator>, bus: B) -> Self {
        bus.set(fields::RENDERER_MODE, json!(coordinator.mode().as_str()));
        Self {
            coordinator,
            browser: None,
            bus,
            source: String::new(),
            options: RenderOptions::new(),
            current: None,
            last_good: None,
            show_diagnostics: false,
        }
    }

    /// Browser engine whose capability follows the `wasm_supported` field
    pub fn with_browser(mut self, browser: Arc<BrowserEngine>) -> Self {
        self.browser = Some(browser);
        self
    }

    /// Publish per-engine diagnostics alongside failures
    pub fn show_diagnostics(mut self, show: bool) -> Self {
        self.show_diagnostics = show;
        self
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Fingerprint of the request currently on display
    pub fn current_fingerprint(&self) -> Option<&Fingerprint> {
        self.current.as_ref()
    }

    pub fn handle(&mut self, event: UiEvent) -> Result<()> {
        match event {
            UiEvent::SourceChanged(source) => {
                self.bus.set(fields::SCAD_CODE, json!(source));
                self.source = source;
                self.render();
            }
            UiEvent::OptionsChanged(options) => {
                self.bus.set(
                    fields::RENDER_OPTIONS,
                    serde_json::to_value(&options).context("Failed to encode render options")?,
                );
                self.options = options;
                self.render();
            }
            UiEvent::ModeChanged(mode) => {
                self.coordinator.set_mode(mode);
                self.bus.set(fields::RENDERER_MODE, json!(mode.as_str()));
                if !mode.candidates().contains(&EngineKind::Browser) {
                    self.drop_pending();
                }
                self.render();
            }
            UiEvent::ForceRerender => {
                if let Some(request) = self.request() {
                    self.coordinator.invalidate(&request);
                }
                self.render();
            }
            UiEvent::BrowserCapability(supported) => {
                if let Some(browser) = &self.browser {
                    browser.report_capability(supported);
                }
                let status = self.coordinator.refresh_engine(EngineKind::Browser);
                tracing::info!(supported, %status, "browser capability reported");
                if !supported && self.drop_pending() {
                    self.render();
                }
            }
            UiEvent::BrowserResult(reply) => self.accept_browser_reply(&reply),
        }
        Ok(())
    }

    /// Translate a field change from the front end into an event
    pub fn on_bus_change(&mut self, key: &str, value: &Value) -> Result<()> {
        let event = match key {
            fields::SCAD_CODE => UiEvent::SourceChanged(
                value.as_str().context("scad_code must be a string")?.to_string(),
            ),
            fields::RENDER_OPTIONS => UiEvent::OptionsChanged(
                serde_json::from_value(value.clone()).context("Invalid render options")?,
            ),
            fields::RENDERER_MODE => UiEvent::ModeChanged(
                value
                    .as_str()
                    .context("renderer_mode must be a string")?
                    .parse()?,
            ),
            fields::WASM_SUPPORTED => UiEvent::BrowserCapability(
                value.as_bool().context("wasm_supported must be a boolean")?,
            ),
            fields::BROWSER_RESULT if value.is_null() => return Ok(()),
            fields::BROWSER_RESULT => UiEvent::BrowserResult(
                serde_json::from_value(value.clone()).context("Invalid browser result")?,
            ),
            fields::RERENDER => UiEvent::ForceRerender,
            _ => return Ok(()),
        };
        self.handle(event)
    }

    /// Show a new model with the current options
    pub fn update_model<S: ScadSource + ?Sized>(&mut self, model: &S) -> Result<()> {
        self.handle(UiEvent::SourceChanged(model.to_scad()))
    }

    /// Render the current source and publish the outcome.
    /// Returns `None` when there is nothing to render.
    pub fn render(&mut self) -> Option<RenderResult> {
        let Some(request) = self.request() else {
            self.current = None;
            self.bus.set(fields::STL_DATA, json!(""));
            self.bus.set(fields::IS_LOADING, json!(false));
            self.clear_error();
            return None;
        };

        self.current = Some(request.fingerprint());
        self.bus.set(fields::IS_LOADING, json!(true));
        let result = self.coordinator.select_and_render(&request);
        self.publish(&result);
        Some(result)
    }

    fn request(&self) -> Option<RenderRequest> {
        if self.source.trim().is_empty() {
            return None;
        }
        Some(RenderRequest::with_options(
            self.source.clone(),
            self.options.clone(),
        ))
    }

    /// Invalidate the current entry if it is still waiting on the browser
    fn drop_pending(&self) -> bool {
        let Some(fp) = &self.current else {
            return false;
        };
        match self.coordinator.cache().peek(fp) {
            Some(RenderResult::Pending(_)) => self.coordinator.cache().invalidate(fp),
            _ => false,
        }
    }

    fn accept_browser_reply(&mut self, reply: &BrowserReply) {
        let Some(token) = CorrelationToken::decode(&reply.token) else {
            tracing::debug!(token = %reply.token, "ignoring browser result without a render token");
            return;
        };
        match self.coordinator.resolve(&token, reply.outcome()) {
            Ok(result) => {
                if token.fingerprint().as_ref() == self.current.as_ref() {
                    self.publish(&result);
                } else {
                    tracing::debug!(token = %token, "browser result for a model no longer shown");
                }
            }
            Err(err) => tracing::debug!(error = %err, "browser result discarded"),
        }
    }

    fn publish(&mut self, result: &RenderResult) {
        match result {
            RenderResult::Success { bytes, .. } => {
                self.bus.set(fields::STL_DATA, json!(encode_bytes(bytes)));
                self.last_good = Some(bytes.clone());
                self.clear_error();
                self.bus.set(fields::IS_LOADING, json!(false));
            }
            RenderResult::Pending(token) => {
                self.bus.set(
                    fields::STL_DATA,
                    json!(WirePayload::Request(token.clone()).encode()),
                );
                self.clear_error();
                self.bus.set(fields::IS_LOADING, json!(true));
            }
            RenderResult::Failure(error) => {
                let previous = self
                    .last_good
                    .as_ref()
                    .map(|bytes| encode_bytes(bytes))
                    .unwrap_or_default();
                self.bus.set(fields::STL_DATA, json!(previous));
                self.bus.set(fields::ERROR_MESSAGE, json!(error.user_message()));
                self.bus.set(fields::ERROR_REMEDY, json!(error.remedy().as_str()));
                let details = if self.show_diagnostics {
                    json!(error.diagnostics())
                } else {
                    Value::Null
                };
                self.bus.set(fields::ERROR_DETAILS, details);
                self.bus.set(fields::IS_LOADING, json!(false));
            }
        }
        self.bus.set(fields::RENDERER_STATUS, self.status(result));
    }

    fn clear_error(&self) {
        self.bus.set(fields::ERROR_MESSAGE, json!(""));
        self.bus.set(fields::ERROR_REMEDY, Value::Null);
        self.bus.set(fields::ERROR_DETAILS, Value::Null);
    }

    fn status(&self, result: &RenderResult) -> Value {
        let engine = match result {
            RenderResult::Success { engine, .. } => Some(engine.as_str()),
            RenderResult::Pending(_) => Some(EngineKind::Browser.as_str()),
            RenderResult::Failure(_) => None,
        };
        let engines: serde_json::Map<String, Value> = self
            .coordinator
            .engine_statuses()
            .into_iter()
            .map(|(kind, status)| (kind.as_str().to_string(), json!(status.as_str())))
            .collect();
        json!({
            "mode": self.coordinator.mode().as_str(),
            "outcome": result.label(),
            "engine": engine,
            "engines": engines,
        })
    }
}
