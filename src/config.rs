// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Configuration file and environment overrides

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CachePolicy, RenderCache};
use crate::engine::{BrowserEngine, LocalEngine};
use crate::selector::{RenderCoordinator, RenderMode, RendererConfig};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "scadview.toml";

/// Viewer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScadViewConfig {
    /// Renderer selection mode
    pub mode: RenderMode,
    /// OpenSCAD executable path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openscad_path: Option<PathBuf>,
    /// Deadline for one local render
    #[serde(with = "crate::utils::duration::secs")]
    pub local_timeout: Duration,
    /// Deadline for `openscad --version`
    #[serde(with = "crate::utils::duration::secs")]
    pub probe_timeout: Duration,
    /// Publish per-engine diagnostics with failures
    pub show_engine_diagnostics: bool,
    /// Verbose output
    pub verbose: bool,
    pub cache: CachePolicy,
}

impl Default for ScadViewConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::Auto,
            openscad_path: None, // Auto-detect
            local_timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(10),
            show_engine_diagnostics: false,
            verbose: false,
            cache: CachePolicy::default(),
        }
    }
}

impl ScadViewConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: ScadViewConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `scadview.toml` if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if Path::new(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `OPENSCAD_PATH` and `SCADVIEW_*` overrides from `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(openscad) = lookup("OPENSCAD_PATH") {
            self.openscad_path = Some(PathBuf::from(openscad));
        }

        if let Some(mode) = lookup("SCADVIEW_RENDERER") {
            self.mode = mode.parse().context("Invalid SCADVIEW_RENDERER")?;
        }

        if let Some(timeout) = lookup("SCADVIEW_TIMEOUT_SECS") {
            let secs: f64 = timeout
                .trim()
                .parse()
                .with_context(|| format!("Invalid SCADVIEW_TIMEOUT_SECS: {}", timeout))?;
            self.local_timeout = Duration::try_from_secs_f64(secs)
                .with_context(|| format!("Invalid SCADVIEW_TIMEOUT_SECS: {}", timeout))?;
        }

        if let Some(dir) = lookup("SCADVIEW_CACHE_DIR") {
            self.cache.dir = Some(PathBuf::from(dir));
        }

        if let Some(verbose) = lookup("SCADVIEW_VERBOSE") {
            self.verbose = parse_flag(&verbose)
                .with_context(|| format!("Invalid SCADVIEW_VERBOSE: {}", verbose))?;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn renderer_config(&self) -> RendererConfig {
        RendererConfig {
            mode: self.mode,
            render_timeout: self.local_timeout,
        }
    }

    /// Local engine from the configured or discovered executable
    pub fn local_engine(&self) -> LocalEngine {
        LocalEngine::discover(self.openscad_path.clone()).with_probe_timeout(self.probe_timeout)
    }

    /// Coordinator with the local engine registered, plus the browser
    /// engine when a front end is attached
    pub fn build_coordinator(&self, browser: Option<Arc<BrowserEngine>>) -> Result<RenderCoordinator> {
        let cache = RenderCache::open(self.cache.clone())?;
        let mut coordinator = RenderCoordinator::new(self.renderer_config(), Arc::new(cache))
            .with_engine(Arc::new(self.local_engine()));
        if let Some(browser) = browser {
            coordinator.register(browser);
        }
        Ok(coordinator)
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("expected a boolean, got {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_overrides() {
        let mut config = ScadViewConfig::default();
        config
            .apply_overrides(env(&[
                ("OPENSCAD_PATH", "/opt/openscad"),
                ("SCADVIEW_RENDERER", "wasm"),
                ("SCADVIEW_TIMEOUT_SECS", "2.5"),
                ("SCADVIEW_CACHE_DIR", "/tmp/scadview"),
                ("SCADVIEW_VERBOSE", "true"),
            ]))
            .unwrap();

        assert_eq!(config.openscad_path, Some(PathBuf::from("/opt/openscad")));
        assert_eq!(config.mode, RenderMode::Browser);
        assert_eq!(config.local_timeout, Duration::from_millis(2500));
        assert_eq!(config.cache.dir, Some(PathBuf::from("/tmp/scadview")));
        assert!(config.verbose);
        assert_eq!(config.renderer_config().render_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_invalid_overrides_rejected() {
        let mut config = ScadViewConfig::default();
        assert!(config
            .apply_overrides(env(&[("SCADVIEW_RENDERER", "gpu")]))
            .is_err());
        assert!(config
            .apply_overrides(env(&[("SCADVIEW_TIMEOUT_SECS", "-1")]))
            .is_err());
        assert_eq!(config, ScadViewConfig::default());
    }

    #[test]
    fn test_verbose_flag_spellings() {
        for (value, expected) in [("1", true), ("yes", true), ("TRUE", true), ("0", false), ("off", false)] {
            let mut config = ScadViewConfig::default();
            config
                .apply_overrides(env(&[("SCADVIEW_VERBOSE", value)]))
                .unwrap();
            assert_eq!(config.verbose, expected, "SCADVIEW_VERBOSE={}", value);
        }

        let mut config = ScadViewConfig::default();
        assert!(config
            .apply_overrides(env(&[("SCADVIEW_VERBOSE", "loud")]))
            .is_err());
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join(CONFIG_FILE);

        let mut config = ScadViewConfig::default();
        config.mode = RenderMode::Local;
        config.cache.max_entries = 16;
        config.cache.cache_failures = false;
        config.save(&path)?;

        assert_eq!(ScadViewConfig::from_file(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_partial_file_uses_defaults() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "mode = \"local\"\nlocal_timeout = 5\n\n[cache]\nmax_idle = 60\n")?;

        let config = ScadViewConfig::from_file(&path)?;
        assert_eq!(config.mode, RenderMode::Local);
        assert_eq!(config.local_timeout, Duration::from_secs(5));
        assert_eq!(config.cache.max_idle, Some(Duration::from_secs(60)));
        assert_eq!(config.cache.max_entries, 128);
        assert_eq!(config.probe_timeout, Duration::from_secs(10));
        Ok(())
    }
}
