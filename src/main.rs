use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::Parser;
use log::{error, info};

use grain_measure_lib::{run_batch, Config};

/// Command-line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about = "grain_measure - Grain detection, sizing and cropping")]
struct Args {
    /// Path to configuration file
    #[clap(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Path to output directory (overwrites config)
    #[clap(short, long)]
    output: Option<String>,

    /// Only process the named dataset entry; may be repeated
    #[clap(short, long)]
    entry: Vec<String>,

    /// Process entries one at a time
    #[clap(long)]
    sequential: bool,

    /// Also slice every crop region out of the input image
    #[clap(long)]
    samples: bool,

    /// Verbose logging
    #[clap(short, long)]
    debug: bool,

    /// Write the default configuration to the config path and exit
    #[clap(long)]
    init: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if args.init {
        if args.config.exists() {
            bail!("refusing to overwrite existing config {}", args.config.display());
        }
        Config::default()
            .save_to_file(&args.config)
            .with_context(|| format!("writing default config to {}", args.config.display()))?;
        info!("Wrote default configuration to {}", args.config.display());
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = Config::from_file(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;

    // Override config with command-line arguments
    if let Some(output) = args.output {
        config.output_dir = output;
    }
    if args.sequential {
        config.use_parallel = false;
    }
    if args.samples {
        config.write_samples = true;
    }

    config.validate().context("invalid configuration")?;

    let mut entries = config.entries();
    if !args.entry.is_empty() {
        for name in &args.entry {
            if !entries.iter().any(|(entry_name, _)| entry_name == name) {
                bail!("no dataset entry named '{}' in {}", name, args.config.display());
            }
        }
        entries.retain(|(entry_name, _)| args.entry.contains(entry_name));
    }

    info!("Processing {} dataset entries into {}", entries.len(), config.output_dir);
    let start_time = Instant::now();

    let report = run_batch(entries, &config);

    for entry in &report.succeeded {
        info!(
            "{}: {} grains accepted of {} boundaries -> {}",
            entry.name,
            entry.accepted,
            entry.boundaries,
            entry.output_dir.display()
        );
    }
    for (name, e) in &report.failed {
        error!("{} failed: {}", name, e);
    }

    info!(
        "Processing completed in {:.2} seconds ({} ok, {} failed)",
        start_time.elapsed().as_secs_f64(),
        report.succeeded.len(),
        report.failed.len()
    );

    Ok(if report.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
