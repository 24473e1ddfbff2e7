// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! scadview CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scadview::cli::{discover_scad_files, run_batch, write_output, Reporter};
use scadview::engine::EngineKind;
use scadview::request::{parse_defines, RenderRequest, RenderResult};
use scadview::source::read_scad_file;
use scadview::{init_logging, RenderMode, ScadViewConfig};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "scadview")]
#[command(about = "Render OpenSCAD models with engine fallback and caching", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ./scadview.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone)]
struct EngineArgs {
    /// Renderer mode (auto, browser, local)
    #[arg(long)]
    mode: Option<RenderMode>,

    /// Timeout in seconds for one render
    #[arg(long)]
    timeout: Option<f64>,

    /// OpenSCAD executable
    #[arg(long, value_name = "PATH")]
    openscad: Option<PathBuf>,

    /// Render option, e.g. -D '$fn=64' or -D format=3mf
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    defines: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a SCAD file
    Render {
        /// Input SCAD file
        input: PathBuf,

        /// Output file (defaults to the input with the format's extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Render every SCAD file under a directory
    Batch {
        /// Input directory
        dir: PathBuf,

        /// Output directory
        #[arg(long, default_value = "scadview-out")]
        out_dir: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Show which engines are available
    Probe {
        /// OpenSCAD executable
        #[arg(long, value_name = "PATH")]
        openscad: Option<PathBuf>,
    },

    /// Print the cache key of a SCAD file
    Fingerprint {
        /// Input SCAD file
        input: PathBuf,

        /// Render option
        #[arg(short = 'D', value_name = "KEY=VALUE")]
        defines: Vec<String>,
    },

    /// Print the effective configuration
    Config {
        /// Also write it to this file
        #[arg(long, value_name = "FILE")]
        save: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            Reporter::report_error(&format!("{:#}", e));
            2
        }
    };
    std::process::exit(code);
}

fn run(cli: &Cli) -> Result<i32> {
    let mut config = load_config(cli.config.as_deref())?;
    config.verbose |= cli.verbose;
    init_logging(config.verbose)?;

    match &cli.command {
        Commands::Render {
            input,
            output,
            engine,
        } => render_command(&mut config, input, output.as_deref(), engine),
        Commands::Batch {
            dir,
            out_dir,
            engine,
        } => batch_command(&mut config, dir, out_dir, engine),
        Commands::Probe { openscad } => {
            if let Some(path) = openscad {
                config.openscad_path = Some(path.clone());
            }
            probe_command(&config)
        }
        Commands::Fingerprint { input, defines } => {
            let source = read_scad_file(input)?;
            let request = RenderRequest::with_options(source, parse_defines(defines)?);
            println!("{}", request.fingerprint());
            Ok(0)
        }
        Commands::Config { save } => {
            print!(
                "{}",
                toml::to_string_pretty(&config).context("Failed to serialize config")?
            );
            if let Some(path) = save {
                config.save(path)?;
                Reporter::success(&format!("Saved {}", path.display()));
            }
            Ok(0)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ScadViewConfig> {
    match path {
        Some(path) => {
            let mut config = ScadViewConfig::from_file(path)?;
            config.apply_overrides(|key| std::env::var(key).ok())?;
            Ok(config)
        }
        None => ScadViewConfig::load(),
    }
}

fn apply_engine_args(config: &mut ScadViewConfig, args: &EngineArgs) -> Result<()> {
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if let Some(secs) = args.timeout {
        config.local_timeout =
            Duration::try_from_secs_f64(secs).context("Timeout must be a positive number")?;
    }
    if let Some(path) = &args.openscad {
        config.openscad_path = Some(path.clone());
    }
    if !config.mode.candidates().contains(&EngineKind::Local) {
        Reporter::report_warning("no browser is attached to the CLI; only the local engine can render");
    }
    Ok(())
}

fn render_command(
    config: &mut ScadViewConfig,
    input: &Path,
    output: Option<&Path>,
    args: &EngineArgs,
) -> Result<i32> {
    apply_engine_args(config, args)?;
    let coordinator = config.build_coordinator(None)?;

    let source = read_scad_file(input)?;
    let request = RenderRequest::with_options(source, parse_defines(&args.defines)?);
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_extension(request.output_format()));

    let name = input.display().to_string();
    match coordinator.select_and_render(&request) {
        result @ RenderResult::Success { .. } => {
            if let Some(bytes) = result.bytes() {
                write_output(&output, bytes)?;
            }
            Reporter::report_render(&name, &output, &request.fingerprint(), &result);
            Ok(0)
        }
        RenderResult::Pending(token) => {
            Reporter::report_warning(&format!("render handed to a browser that is not attached ({})", token));
            Ok(1)
        }
        RenderResult::Failure(error) => {
            Reporter::report_failure(&name, &error, config.show_engine_diagnostics || config.verbose);
            Ok(1)
        }
    }
}

fn batch_command(
    config: &mut ScadViewConfig,
    dir: &Path,
    out_dir: &Path,
    args: &EngineArgs,
) -> Result<i32> {
    apply_engine_args(config, args)?;
    let coordinator = config.build_coordinator(None)?;
    let options = parse_defines(&args.defines)?;

    let inputs = discover_scad_files(dir);
    if inputs.is_empty() {
        Reporter::report_warning(&format!("no .scad files found in {}", dir.display()));
        return Ok(0);
    }
    Reporter::report_info(&format!("Rendering {} files", inputs.len()));

    let start = Instant::now();
    let outcomes = run_batch(&coordinator, &inputs, dir, out_dir, &options, !config.verbose);
    Reporter::report_batch(&outcomes, &coordinator.cache_stats(), start.elapsed());

    Ok(if outcomes.iter().all(|o| o.is_success()) { 0 } else { 1 })
}

fn probe_command(config: &ScadViewConfig) -> Result<i32> {
    let local = config.local_engine();
    let executable = local.executable().map(Path::to_path_buf);
    let coordinator = config.build_coordinator(None)?;
    let statuses = coordinator.refresh_engines();
    Reporter::report_probe(&statuses, executable.as_deref());
    Ok(0)
}
