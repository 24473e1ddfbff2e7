// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Batch rendering of a directory tree

use crate::request::{RenderOptions, RenderRequest, RenderResult};
use crate::selector::RenderCoordinator;
use crate::source::read_scad_file;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// What happened to one input file
#[derive(Debug)]
pub struct BatchOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub result: Result<RenderResult>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(&self.result, Ok(r) if r.is_success())
    }

    pub fn failure_message(&self) -> String {
        match &self.result {
            Ok(RenderResult::Failure(error)) => error.user_message(),
            Ok(RenderResult::Pending(_)) => "waiting on a browser that is not attached".to_string(),
            Ok(RenderResult::Success { .. }) => String::new(),
            Err(e) => format!("{:#}", e),
        }
    }
}

/// Find `.scad` files under `path`, sorted
pub fn discover_scad_files(path: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    if path.is_file() && path.extension().is_some_and(|ext| ext == "scad") {
        files.push(path.to_path_buf());
    } else if path.is_dir() {
        for entry in WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let entry_path = entry.path();
            if entry_path.is_file() && entry_path.extension().is_some_and(|ext| ext == "scad") {
                files.push(entry_path.to_path_buf());
            }
        }
    }

    files.sort();
    files
}

/// Output location for `input`, mirroring its place under `root`
pub fn output_path(input: &Path, root: &Path, out_dir: &Path, format: &str) -> PathBuf {
    let relative = input
        .strip_prefix(root)
        .ok()
        .filter(|r| !r.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .or_else(|| input.file_name().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("model"));
    out_dir.join(relative).with_extension(format)
}

/// Render every input through one shared coordinator
pub fn run_batch(
    coordinator: &RenderCoordinator,
    inputs: &[PathBuf],
    root: &Path,
    out_dir: &Path,
    options: &RenderOptions,
    show_progress: bool,
) -> Vec<BatchOutcome> {
    let progress = if show_progress {
        let pb = ProgressBar::new(inputs.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    } else {
        None
    };

    let outcomes = inputs
        .par_iter()
        .map(|input| {
            if let Some(ref pb) = progress {
                pb.set_message(format!("Rendering {}", input.display()));
            }

            let request = read_scad_file(input)
                .map(|source| RenderRequest::with_options(source, options.clone()));
            let output = match &request {
                Ok(request) => output_path(input, root, out_dir, request.output_format()),
                Err(_) => output_path(input, root, out_dir, "stl"),
            };
            let result = request.and_then(|request| {
                let result = coordinator.select_and_render(&request);
                if let Some(bytes) = result.bytes() {
                    write_output(&output, bytes)?;
                }
                Ok(result)
            });

            if let Some(ref pb) = progress {
                pb.inc(1);
            }

            BatchOutcome {
                input: input.clone(),
                output,
                result,
            }
        })
        .collect();

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    outcomes
}

/// Write geometry, creating parent directories
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }
    fs::write(path, bytes).with_context(|| format!("Failed to write output file: {:?}", path))
}
