// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI subsystem for the scadview binary

pub mod batch;
pub mod reporter;

pub use batch::{discover_scad_files, output_path, run_batch, write_output, BatchOutcome};
pub use reporter::Reporter;
