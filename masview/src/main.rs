//! masview - timeline viewer for multi-agent creative runs
//!
//! Reconstructs the phase tree of a run report and builds the experiments
//! manifest consumed by the web viewer.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Logs: $XDG_STATE_HOME/masview/masview.log (~/.local/state/masview/masview.log)
//! - Config: $XDG_CONFIG_HOME/masview/config.toml (~/.config/masview/config.toml)

mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use masview_core::discovery::{build_manifest, write_manifest, DiscoveryOptions};
use masview_core::timeline::build_timeline;
use masview_core::{Config, MasReport, Source};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "masview")]
#[command(about = "Timeline viewer for multi-agent creative runs")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconstruct the phase tree of a run report
    Timeline {
        /// Path to mas_report.json
        report: PathBuf,

        /// Report source: qwen or chatgpt (default: inferred from the path)
        #[arg(short, long)]
        source: Option<String>,

        /// Output format: json (default) or text
        #[arg(short, long, default_value = "json")]
        format: String,
    },

    /// Discover run reports and write the experiments manifest
    Index {
        /// Web root containing output_qwen/ and output_chatgpt/ (default: from config)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Manifest output path (default: from config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = masview_core::logging::init(&config.logging).ok();

    match args.command {
        Command::Timeline {
            report,
            source,
            format,
        } => run_timeline(report, source.as_deref(), &format),
        Command::Index { root, output } => run_index(&config, root, output),
    }
}

fn run_timeline(report_path: PathBuf, source: Option<&str>, format: &str) -> Result<()> {
    let source = match source {
        Some(s) => s.parse::<Source>().map_err(anyhow::Error::msg)?,
        None => Source::infer_from_path(&report_path).with_context(|| {
            format!(
                "cannot infer source from {}; pass --source qwen|chatgpt",
                report_path.display()
            )
        })?,
    };

    let report = MasReport::load(&report_path)
        .with_context(|| format!("failed to load report {}", report_path.display()))?;
    let phases = build_timeline(&report, source);

    tracing::info!(
        report = %report_path.display(),
        source = %source,
        phases = phases.len(),
        "Built timeline"
    );

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&phases)?),
        "text" => print!("{}", render::outline(&phases)),
        other => anyhow::bail!("Unknown format: {}. Use 'json' or 'text'", other),
    }

    Ok(())
}

fn run_index(config: &Config, root: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let root = root.unwrap_or_else(|| config.discovery.root.clone());
    let output = output.unwrap_or_else(|| config.discovery.manifest_path.clone());
    let options = DiscoveryOptions::from(&config.discovery);

    let manifest = build_manifest(&root, &options)
        .with_context(|| format!("failed to scan {}", root.display()))?;
    write_manifest(&output, &manifest)
        .with_context(|| format!("failed to write manifest {}", output.display()))?;

    println!(
        "Generated index with {} experiments at {}",
        manifest.len(),
        output.display()
    );
    Ok(())
}
