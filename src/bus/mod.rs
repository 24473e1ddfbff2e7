// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Property bus adapter
//!
//! The notebook widget syncs a handful of named values between the kernel and
//! the browser. This module maps coordinator state onto those values and maps
//! changes coming back from the browser onto coordinator calls.

mod payload;
mod widget;

pub use payload::{decode_bytes, encode_bytes, WirePayload};
pub use widget::{BrowserReply, UiEvent, WidgetAdapter};

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError, RwLock};

/// Names of the synced fields
pub mod fields {
    /// OpenSCAD source text being displayed
    pub const SCAD_CODE: &str = "scad_code";
    /// Render options as a JSON object
    pub const RENDER_OPTIONS: &str = "render_options";
    /// Base64 geometry, or a correlation token for the browser
    pub const STL_DATA: &str = "stl_data";
    pub const ERROR_MESSAGE: &str = "error_message";
    pub const ERROR_REMEDY: &str = "error_remedy";
    pub const ERROR_DETAILS: &str = "error_details";
    pub const IS_LOADING: &str = "is_loading";
    pub const RENDERER_MODE: &str = "renderer_mode";
    pub const RENDERER_STATUS: &str = "renderer_status";
    /// Browser reports whether it can run WebAssembly
    pub const WASM_SUPPORTED: &str = "wasm_supported";
    /// Browser posts the outcome of a token render here
    pub const BROWSER_RESULT: &str = "browser_result";
    /// Bumped by the front end to force a re-render
    pub const RERENDER: &str = "rerender";
}

/// Key-value store shared with the front end
pub trait PropertyBus: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    /// Set a value; the front end is notified if it changed
    fn set(&self, key: &str, value: Value);
}

/// One recorded change notification
#[derive(Debug, Clone, PartialEq)]
pub struct BusChange {
    pub key: String,
    pub value: Value,
}

/// Bus kept in memory. Used by the CLI and tests, and as a reference for
/// real widget bindings.
#[derive(Debug, Default)]
pub struct InMemoryBus {
    values: RwLock<BTreeMap<String, Value>>,
    changes: Mutex<Vec<BusChange>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification sent so far, oldest first
    pub fn changes(&self) -> Vec<BusChange> {
        self.changes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Notifications for one key, oldest first
    pub fn changes_of(&self, key: &str) -> Vec<Value> {
        self.changes()
            .into_iter()
            .filter(|c| c.key == key)
            .map(|c| c.value)
            .collect()
    }

    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PropertyBus for InMemoryBus {
    fn get(&self, key: &str) -> Option<Value> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Value) {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        if values.get(key) == Some(&value) {
            return;
        }
        values.insert(key.to_string(), value.clone());
        drop(values);

        self.changes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(BusChange {
                key: key.to_string(),
                value,
            });
    }
}

impl<B: PropertyBus + ?Sized> PropertyBus for std::sync::Arc<B> {
    fn get(&self, key: &str) -> Option<Value> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) {
        (**self).set(key, value)
    }
}
