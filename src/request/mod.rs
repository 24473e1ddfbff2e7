// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Render requests and the values derived from them
//!
//! A [`RenderRequest`] is the content that gets rendered. Its [`Fingerprint`]
//! is the cache key, and a [`CorrelationToken`] carries that fingerprint across
//! the property bus when the browser engine is used.

mod fingerprint;
mod options;
mod result;
mod token;

pub use fingerprint::Fingerprint;
pub use options::{parse_defines, OptionValue, RenderOptions};
pub use result::RenderResult;
pub use token::{CorrelationToken, TOKEN_PREFIX};

use serde::{Deserialize, Serialize};

/// Source text plus render options. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    source_text: String,
    options: RenderOptions,
}

impl RenderRequest {
    pub fn new(source_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            options: RenderOptions::new(),
        }
    }

    pub fn with_options(source_text: impl Into<String>, options: RenderOptions) -> Self {
        Self {
            source_text: source_text.into(),
            options,
        }
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Content hash of this request
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(self)
    }

    /// Output format requested through the `format` option, `stl` by default
    pub fn output_format(&self) -> &str {
        match self.options.get("format") {
            Some(OptionValue::Text(format)) if !format.is_empty() => format,
            _ => "stl",
        }
    }
}
