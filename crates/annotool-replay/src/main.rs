//! Annotool Replay
//!
//! Headless driver for the annotation tools. Replays a JSON gesture script
//! against a scene and prints the result, or dilates a JSON mask.

use std::path::{Path, PathBuf};

use annotool_core::Mask;
use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod script;

#[derive(Debug, Parser)]
#[command(name = "annotool-replay", version, about)]
struct Cli {
    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay a gesture script and print the resulting scene.
    Replay {
        /// Path to the script JSON.
        script: PathBuf,
    },
    /// Dilate a mask given as `{ "width", "height", "data" }`.
    Dilate {
        mask: PathBuf,
        /// Grow the mask by a zero border first.
        #[arg(long)]
        border: bool,
        #[arg(long, default_value_t = 1)]
        iterations: usize,
    },
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to serialize output")?;
    println!("{out}");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Replay { script } => {
            let parsed = script::Script::from_json(&read(&script)?)
                .with_context(|| format!("Invalid script {}", script.display()))?;
            tracing::info!("Replaying {} steps from {}", parsed.steps.len(), script.display());
            let outcome = script::run(&parsed)?;
            print_json(&outcome, cli.pretty)
        }
        Command::Dilate {
            mask,
            border,
            iterations,
        } => {
            let mut grid: Mask = serde_json::from_str(&read(&mask)?)
                .with_context(|| format!("Invalid mask {}", mask.display()))?;
            if border {
                grid = grid.add_border();
            }
            for _ in 0..iterations {
                grid = grid.dilate();
            }
            tracing::info!("Dilated {}x{} mask {} times", grid.width(), grid.height(), iterations);
            print_json(&grid, cli.pretty)
        }
    }
}
