// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Render error taxonomy
//!
//! Engine-level problems are converted into [`RenderError`] at the engine
//! boundary. Callers above the engines only ever see these variants, never
//! raw subprocess or transport errors.

use crate::engine::EngineKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// One failed engine attempt, kept for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineAttempt {
    pub engine: EngineKind,
    pub error: RenderError,
}

/// Errors produced while turning a render request into geometry
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderError {
    /// Engine is not installed or its probe failed
    #[error("{engine} engine unavailable: {reason}")]
    EngineUnavailable { engine: EngineKind, reason: String },

    /// Engine did not finish before the deadline
    #[error("{engine} engine timed out after {}ms", .timeout.as_millis())]
    EngineTimeout {
        engine: EngineKind,
        #[serde(with = "crate::utils::duration::secs")]
        timeout: Duration,
    },

    /// Engine ran but reported failure
    #[error("{engine} engine failed (exit code {}): {message}", display_code(.code))]
    EngineProcessError {
        engine: EngineKind,
        code: Option<i32>,
        message: String,
    },

    /// Every candidate engine was skipped or failed
    #[error("no rendering engine available ({} attempted)", .attempts.len())]
    AllEnginesUnavailable { attempts: Vec<EngineAttempt> },

    /// A stored cache entry could not be read back intact
    #[error("cache entry {fingerprint} is corrupt")]
    CacheCorruption { fingerprint: String },

    /// A browser resolution arrived for a request that is no longer pending
    #[error("stale correlation token {token}")]
    StaleCorrelation { token: String },
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none".to_string(),
    }
}

/// What the user can do about a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Remedy {
    CheckInstallation,
    SimplifyModel,
    FixModelSource,
    Retry,
}

impl Remedy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Remedy::CheckInstallation => "check_installation",
            Remedy::SimplifyModel => "simplify_model",
            Remedy::FixModelSource => "fix_model_source",
            Remedy::Retry => "retry",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            Remedy::CheckInstallation => "check that OpenSCAD is installed or that the browser supports WebAssembly",
            Remedy::SimplifyModel => "the model may be too complex; lower $fn or split it up",
            Remedy::FixModelSource => "check the model source for OpenSCAD errors",
            Remedy::Retry => "try rendering again",
        }
    }
}

impl fmt::Display for Remedy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RenderError {
    /// Stable machine-readable name of the error kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            RenderError::EngineUnavailable { .. } => "engine_unavailable",
            RenderError::EngineTimeout { .. } => "engine_timeout",
            RenderError::EngineProcessError { .. } => "engine_process_error",
            RenderError::AllEnginesUnavailable { .. } => "all_engines_unavailable",
            RenderError::CacheCorruption { .. } => "cache_corruption",
            RenderError::StaleCorrelation { .. } => "stale_correlation",
        }
    }

    pub fn remedy(&self) -> Remedy {
        match self {
            RenderError::EngineUnavailable { .. } => Remedy::CheckInstallation,
            RenderError::EngineTimeout { .. } => Remedy::SimplifyModel,
            RenderError::EngineProcessError { .. } => Remedy::FixModelSource,
            RenderError::AllEnginesUnavailable { attempts } => {
                // A timeout or a model error is more useful to report than "not installed".
                attempts
                    .iter()
                    .map(|a| a.error.remedy())
                    .find(|r| *r != Remedy::CheckInstallation)
                    .unwrap_or(Remedy::CheckInstallation)
            }
            RenderError::CacheCorruption { .. } | RenderError::StaleCorrelation { .. } => {
                Remedy::Retry
            }
        }
    }

    /// Single human-readable sentence for the UI
    pub fn user_message(&self) -> String {
        let headline = match self {
            RenderError::EngineUnavailable { .. } | RenderError::AllEnginesUnavailable { .. } => {
                match self.remedy() {
                    Remedy::SimplifyModel => "Render timed out",
                    Remedy::FixModelSource => "OpenSCAD could not render the model",
                    _ => "No rendering engine available",
                }
            }
            RenderError::EngineTimeout { .. } => "Render timed out",
            RenderError::EngineProcessError { .. } => "OpenSCAD could not render the model",
            RenderError::CacheCorruption { .. } => "Cached geometry was unreadable",
            RenderError::StaleCorrelation { .. } => "Render result arrived too late",
        };
        format!("{} - {}", headline, self.remedy().hint())
    }

    /// Per-engine diagnostics, one line each
    pub fn diagnostics(&self) -> Vec<String> {
        match self {
            RenderError::AllEnginesUnavailable { attempts } => {
                attempts.iter().map(|a| a.error.to_string()).collect()
            }
            other => vec![other.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinct() {
        let errors = [
            RenderError::EngineUnavailable {
                engine: EngineKind::Local,
                reason: "not found".into(),
            },
            RenderError::EngineTimeout {
                engine: EngineKind::Local,
                timeout: Duration::from_secs(1),
            },
            RenderError::EngineProcessError {
                engine: EngineKind::Local,
                code: Some(1),
                message: "syntax error".into(),
            },
            RenderError::AllEnginesUnavailable { attempts: vec![] },
            RenderError::CacheCorruption {
                fingerprint: "ab".into(),
            },
            RenderError::StaleCorrelation { token: "t".into() },
        ];
        let mut names: Vec<_> = errors.iter().map(|e| e.kind_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), errors.len());
    }

    #[test]
    fn test_all_unavailable_prefers_specific_remedy() {
        let err = RenderError::AllEnginesUnavailable {
            attempts: vec![
                EngineAttempt {
                    engine: EngineKind::Browser,
                    error: RenderError::EngineUnavailable {
                        engine: EngineKind::Browser,
                        reason: "no wasm".into(),
                    },
                },
                EngineAttempt {
                    engine: EngineKind::Local,
                    error: RenderError::EngineTimeout {
                        engine: EngineKind::Local,
                        timeout: Duration::from_secs(5),
                    },
                },
            ],
        };
        assert_eq!(err.remedy(), Remedy::SimplifyModel);
        assert!(err.user_message().starts_with("Render timed out"));
        assert_eq!(err.diagnostics().len(), 2);
    }

    #[test]
    fn test_nothing_attempted_means_installation() {
        let err = RenderError::AllEnginesUnavailable { attempts: vec![] };
        assert_eq!(err.remedy(), Remedy::CheckInstallation);
        assert!(err.user_message().starts_with("No rendering engine available"));
    }

    #[test]
    fn test_process_error_display() {
        let err = RenderError::EngineProcessError {
            engine: EngineKind::Local,
            code: None,
            message: "killed".into(),
        };
        assert_eq!(err.to_string(), "local engine failed (exit code none): killed");
    }
}
