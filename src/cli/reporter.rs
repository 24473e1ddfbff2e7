// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use super::batch::BatchOutcome;
use crate::cache::CacheStats;
use crate::engine::{EngineKind, EngineStatus};
use crate::error::RenderError;
use crate::request::{Fingerprint, RenderResult};
use colored::*;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Report a successful render
    pub fn report_render(
        file: &str,
        output: &Path,
        fingerprint: &Fingerprint,
        result: &RenderResult,
    ) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Rendered:".bold(), file.cyan());
        println!("{}", "━".repeat(80).bright_black());
        if let RenderResult::Success {
            bytes,
            engine,
            duration,
        } = result
        {
            println!("  {} {}", "Engine:".bright_black(), engine.to_string().cyan());
            println!("  {} {}", "Bytes:".bright_black(), bytes.len().to_string().cyan());
            println!(
                "  {} {}",
                "Time:".bright_black(),
                Self::format_duration(*duration).yellow()
            );
        }
        println!("  {} {}", "Fingerprint:".bright_black(), fingerprint.short());
        println!("  {} {}", "Output:".bright_black(), output.display());
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report a render failure with its remedy
    pub fn report_failure(file: &str, error: &RenderError, show_diagnostics: bool) {
        eprintln!("\n{} {}", "❌ Render failed:".red().bold(), file.cyan());
        eprintln!("  {}", error.user_message());
        if show_diagnostics {
            for line in error.diagnostics() {
                eprintln!("  {} {}", "•".bright_black(), line.bright_black());
            }
        }
    }

    /// Report engine availability
    pub fn report_probe(statuses: &BTreeMap<EngineKind, EngineStatus>, executable: Option<&Path>) {
        println!("\n{}", "Engines:".bold());
        for (kind, status) in statuses {
            let shown = match status {
                EngineStatus::Available => status.as_str().green(),
                EngineStatus::Unavailable => status.as_str().red(),
                EngineStatus::Unknown => status.as_str().yellow(),
            };
            println!("  {:<10} {}", format!("{}:", kind).bright_black(), shown);
        }
        match executable {
            Some(path) => println!("  {:<10} {}", "openscad:".bright_black(), path.display()),
            None => println!("  {:<10} {}", "openscad:".bright_black(), "not found".red()),
        }
    }

    /// Summarize a batch run
    pub fn report_batch(outcomes: &[BatchOutcome], stats: &CacheStats, elapsed: Duration) {
        let rendered = outcomes.iter().filter(|o| o.is_success()).count();
        let failed = outcomes.len() - rendered;

        println!("\n{}", "━".repeat(80).bright_black());
        for outcome in outcomes.iter().filter(|o| !o.is_success()) {
            println!(
                "  {} {} {}",
                "✗".red(),
                outcome.input.display(),
                outcome.failure_message().bright_black()
            );
        }
        println!(
            "  {} {}   {} {}   {} {}",
            "Rendered:".bright_black(),
            rendered.to_string().green(),
            "Failed:".bright_black(),
            if failed == 0 {
                failed.to_string().green()
            } else {
                failed.to_string().red()
            },
            "Time:".bright_black(),
            Self::format_duration(elapsed).yellow()
        );
        println!("  {} {}", "Cache:".bright_black(), Self::format_cache(stats));
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        eprintln!("{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    /// Report info
    pub fn report_info(message: &str) {
        println!("{} {}", "ℹ️".bright_blue(), message);
    }

    /// Hit and miss counters with the hit rate as a percentage
    pub fn format_cache(stats: &CacheStats) -> String {
        format!(
            "{} hits, {} misses ({:.0}%)",
            stats.hits,
            stats.misses,
            stats.hit_rate()
        )
    }

    /// Format duration for display
    pub fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }

    /// Print success message
    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }
}
