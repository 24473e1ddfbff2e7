// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Logging setup for binaries
//!
//! The library only emits `tracing` events. Whoever embeds it decides where
//! they go; the `scadview` binary calls [`init_logging`].

use anyhow::{anyhow, Result};

/// Install a stderr subscriber filtered by `RUST_LOG`.
///
/// Defaults to `warn`, or `debug` for this crate when `verbose` is set.
pub fn init_logging(verbose: bool) -> Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let default_directive = if verbose { "scadview=debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .map_err(|e| anyhow!("Invalid log filter: {}", e))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_level(true)
        .with_thread_ids(verbose);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {}", e))
}
