// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Renderer selection modes

use crate::engine::EngineKind;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which engines the selector may use, and in what order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Browser first, then the local executable
    #[default]
    Auto,
    /// Only the browser engine
    #[serde(alias = "wasm")]
    Browser,
    /// Only the local executable
    Local,
}

impl RenderMode {
    /// Engines to try, in order
    pub fn candidates(&self) -> &'static [EngineKind] {
        match self {
            RenderMode::Auto => &[EngineKind::Browser, EngineKind::Local],
            RenderMode::Browser => &[EngineKind::Browser],
            RenderMode::Local => &[EngineKind::Local],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Auto => "auto",
            RenderMode::Browser => "browser",
            RenderMode::Local => "local",
        }
    }
}

impl FromStr for RenderMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(RenderMode::Auto),
            "browser" | "wasm" => Ok(RenderMode::Browser),
            "local" => Ok(RenderMode::Local),
            other => bail!("Unknown renderer mode: {} (expected auto, browser or local)", other),
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_order() {
        assert_eq!(
            RenderMode::Auto.candidates(),
            &[EngineKind::Browser, EngineKind::Local]
        );
        assert_eq!(RenderMode::Local.candidates(), &[EngineKind::Local]);
        assert_eq!(RenderMode::Browser.candidates(), &[EngineKind::Browser]);
    }

    #[test]
    fn test_parse() {
        assert_eq!("WASM".parse::<RenderMode>().unwrap(), RenderMode::Browser);
        assert_eq!(" local ".parse::<RenderMode>().unwrap(), RenderMode::Local);
        assert!("cloud".parse::<RenderMode>().is_err());
    }
}
