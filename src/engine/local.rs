// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Local OpenSCAD executable engine

use super::process::{run_with_timeout, ProcessOutcome};
use super::{Engine, EngineKind, EngineOutput, EngineStatus};
use crate::error::RenderError;
use crate::request::{Fingerprint, RenderRequest};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;

/// Output formats OpenSCAD can write that the viewer accepts
const SUPPORTED_FORMATS: &[&str] = &["stl", "off", "amf", "3mf", "obj"];

/// Lines of stderr kept in error messages
const STDERR_TAIL_LINES: usize = 8;

/// Places OpenSCAD is commonly installed when it is not on PATH
const WELL_KNOWN_LOCATIONS: &[&str] = &[
    "/usr/bin/openscad",
    "/usr/local/bin/openscad",
    "/opt/homebrew/bin/openscad",
    "/snap/bin/openscad",
    "/Applications/OpenSCAD.app/Contents/MacOS/OpenSCAD",
    "C:\\Program Files\\OpenSCAD\\openscad.exe",
];

/// Find an OpenSCAD executable: `OPENSCAD_PATH`, then PATH, then well-known locations
pub fn discover_openscad() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var("OPENSCAD_PATH") {
        if !explicit.is_empty() {
            return Some(PathBuf::from(explicit));
        }
    }

    let names: &[&str] = if cfg!(windows) {
        &["openscad.exe", "openscad.com"]
    } else {
        &["openscad"]
    };
    if let Some(paths) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&paths) {
            for name in names {
                let candidate = dir.join(name);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
    }

    WELL_KNOWN_LOCATIONS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// Renders by running the OpenSCAD command line tool
#[derive(Debug, Clone)]
pub struct LocalEngine {
    executable: Option<PathBuf>,
    probe_timeout: Duration,
    scratch_dir: Option<PathBuf>,
}

impl LocalEngine {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: Some(executable.into()),
            probe_timeout: Duration::from_secs(10),
            scratch_dir: None,
        }
    }

    /// Use an explicit executable if given, otherwise search for one
    pub fn discover(explicit: Option<PathBuf>) -> Self {
        Self {
            executable: explicit.or_else(discover_openscad),
            probe_timeout: Duration::from_secs(10),
            scratch_dir: None,
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Create per-render working directories under `dir` instead of the
    /// system temp directory
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn executable(&self) -> Option<&Path> {
        self.executable.as_deref()
    }

    fn unavailable(&self, reason: impl Into<String>) -> RenderError {
        RenderError::EngineUnavailable {
            engine: EngineKind::Local,
            reason: reason.into(),
        }
    }

    fn build_command(&self, exe: &Path, request: &RenderRequest, input: &Path, output: &Path) -> Command {
        let mut command = Command::new(exe);
        command.arg("-o").arg(output);
        for (key, value) in request.options() {
            if key.starts_with('$') {
                command.arg("-D").arg(format!("{}={}", key, value.to_scad_literal()));
            }
        }
        command.arg(input);
        command
    }

    fn render_in(
        &self,
        exe: &Path,
        workdir: &TempDir,
        request: &RenderRequest,
        timeout: Duration,
    ) -> Result<Vec<u8>, RenderError> {
        let format = request.output_format();
        if !SUPPORTED_FORMATS.contains(&format) {
            return Err(RenderError::EngineProcessError {
                engine: EngineKind::Local,
                code: None,
                message: format!("unsupported output format '{}'", format),
            });
        }

        let input = workdir.path().join("input.scad");
        let output = workdir.path().join(format!("output.{}", format));
        let stderr_path = workdir.path().join("stderr.log");

        fs::write(&input, request.source_text())
            .map_err(|e| self.unavailable(format!("cannot write temp input: {}", e)))?;
        let stderr = File::create(&stderr_path)
            .map_err(|e| self.unavailable(format!("cannot create temp log: {}", e)))?;

        let mut command = self.build_command(exe, request, &input, &output);
        command
            .current_dir(workdir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr));

        let outcome = run_with_timeout(&mut command, timeout).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                self.unavailable(format!("cannot run {}: {}", exe.display(), e))
            }
            _ => RenderError::EngineProcessError {
                engine: EngineKind::Local,
                code: None,
                message: e.to_string(),
            },
        })?;

        match outcome {
            ProcessOutcome::TimedOut { .. } => Err(RenderError::EngineTimeout {
                engine: EngineKind::Local,
                timeout,
            }),
            ProcessOutcome::Exited { code, elapsed } => {
                if code != Some(0) {
                    return Err(RenderError::EngineProcessError {
                        engine: EngineKind::Local,
                        code,
                        message: stderr_tail(&stderr_path),
                    });
                }
                match fs::read(&output) {
                    Ok(bytes) if !bytes.is_empty() => {
                        tracing::debug!(
                            bytes = bytes.len(),
                            elapsed_ms = elapsed.as_millis() as u64,
                            "local engine produced output"
                        );
                        Ok(bytes)
                    }
                    Ok(_) => Err(RenderError::EngineProcessError {
                        engine: EngineKind::Local,
                        code,
                        message: "engine produced an empty output file".to_string(),
                    }),
                    Err(_) => {
                        let tail = stderr_tail(&stderr_path);
                        Err(RenderError::EngineProcessError {
                            engine: EngineKind::Local,
                            code,
                            message: if tail.is_empty() {
                                "engine produced no output file".to_string()
                            } else {
                                tail
                            },
                        })
                    }
                }
            }
        }
    }
}

impl Default for LocalEngine {
    fn default() -> Self {
        Self::discover(None)
    }
}

impl Engine for LocalEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Local
    }

    fn probe(&self) -> EngineStatus {
        let Some(exe) = self.executable.as_deref() else {
            return EngineStatus::Unavailable;
        };

        let mut command = Command::new(exe);
        command
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        match run_with_timeout(&mut command, self.probe_timeout) {
            Ok(outcome) if outcome.success() => EngineStatus::Available,
            Ok(outcome) => {
                tracing::debug!(executable = %exe.display(), ?outcome, "openscad probe failed");
                EngineStatus::Unavailable
            }
            Err(e) => {
                tracing::debug!(executable = %exe.display(), error = %e, "openscad probe could not start");
                EngineStatus::Unavailable
            }
        }
    }

    fn render(
        &self,
        request: &RenderRequest,
        fingerprint: &Fingerprint,
        timeout: Duration,
    ) -> Result<EngineOutput, RenderError> {
        let exe = self
            .executable
            .as_deref()
            .ok_or_else(|| self.unavailable("OpenSCAD executable not found"))?;

        // Dropping the TempDir removes input, output and log on every path
        let mut builder = tempfile::Builder::new();
        builder.prefix("scadview-");
        let workdir = match &self.scratch_dir {
            Some(dir) => builder.tempdir_in(dir),
            None => builder.tempdir(),
        }
        .map_err(|e| self.unavailable(format!("cannot create temp dir: {}", e)))?;

        tracing::debug!(fingerprint = fingerprint.short(), executable = %exe.display(), "running openscad");
        self.render_in(exe, &workdir, request, timeout)
            .map(EngineOutput::Bytes)
    }
}

fn stderr_tail(path: &Path) -> String {
    let Ok(raw) = fs::read(path) else {
        return String::new();
    };
    let text = String::from_utf8_lossy(&raw);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{OptionValue, RenderOptions};

    #[test]
    fn test_missing_executable_is_unavailable() {
        let engine = LocalEngine::new("/nonexistent/openscad");
        assert_eq!(engine.probe(), EngineStatus::Unavailable);

        let request = RenderRequest::new("cube(1);");
        let err = engine
            .render(&request, &request.fingerprint(), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, RenderError::EngineUnavailable { .. }));
    }

    #[test]
    fn test_no_executable_configured() {
        let engine = LocalEngine {
            executable: None,
            probe_timeout: Duration::from_secs(1),
            scratch_dir: None,
        };
        assert_eq!(engine.probe(), EngineStatus::Unavailable);
    }

    #[test]
    fn test_command_line_shape() {
        let engine = LocalEngine::new("openscad");
        let mut options = RenderOptions::new();
        options.insert("$fn".into(), OptionValue::Int(64));
        options.insert("format".into(), OptionValue::Text("stl".into()));
        let request = RenderRequest::with_options("sphere(1);", options);

        let command = engine.build_command(
            Path::new("openscad"),
            &request,
            Path::new("in.scad"),
            Path::new("out.stl"),
        );
        let args: Vec<_> = command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args, ["-o", "out.stl", "-D", "$fn=64", "in.scad"]);
    }

    #[test]
    fn test_unsupported_format_rejected() {
        let engine = LocalEngine::new("openscad");
        let mut options = RenderOptions::new();
        options.insert("format".into(), OptionValue::Text("png".into()));
        let request = RenderRequest::with_options("cube(1);", options);
        let dir = TempDir::new().unwrap();
        let err = engine
            .render_in(Path::new("openscad"), &dir, &request, Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, RenderError::EngineProcessError { code: None, .. }));
    }
}
