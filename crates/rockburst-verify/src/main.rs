use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use rockburst_core::{Seed, WorldSize};
use rockburst_verify::{record_session, validate_batch, ReplaySummary, Submission, ValidationError};

#[derive(Parser, Debug)]
#[command(author, version, about = "Validate Rockburst score submissions by replaying them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay submissions and print one JSON verdict per file
    Verify {
        /// Submission JSON files; several are validated in parallel
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Play an autopilot session and print it as a submission
    Record {
        /// Seed for the generator
        #[arg(long)]
        seed: u64,
        /// Upper bound on the number of ticks
        #[arg(long, default_value_t = 200_000)]
        frames: u32,
        /// World width
        #[arg(long, default_value_t = 960)]
        width: u32,
        /// World height
        #[arg(long, default_value_t = 720)]
        height: u32,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn verdict(path: &Path, result: &Result<ReplaySummary, ValidationError>) -> Value {
    match result {
        Ok(summary) => json!({
            "file": path.display().to_string(),
            "accepted": true,
            "summary": summary,
        }),
        Err(error) => json!({
            "file": path.display().to_string(),
            "accepted": false,
            "kind": error.kind(),
            "error": error.to_string(),
        }),
    }
}

fn verify(paths: &[PathBuf]) -> Result<ExitCode> {
    let submissions = paths
        .iter()
        .map(|path| {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str::<Submission>(&text)
                .with_context(|| format!("failed to parse submission {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let results = validate_batch(&submissions);
    let mut all_accepted = true;
    for (path, result) in paths.iter().zip(&results) {
        all_accepted &= result.is_ok();
        println!("{}", serde_json::to_string(&verdict(path, result))?);
    }

    Ok(if all_accepted {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn record(seed: u64, frames: u32, width: u32, height: u32) -> Result<ExitCode> {
    anyhow::ensure!(width > 0 && height > 0, "world size must be non-zero");
    let submission = record_session(&Seed::from_u64(seed), frames, WorldSize::new(width, height));
    let text = serde_json::to_string_pretty(&submission).context("failed to encode submission")?;
    println!("{text}");
    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Verify { paths } => verify(&paths),
        Command::Record {
            seed,
            frames,
            width,
            height,
        } => record(seed, frames, width, height),
    }
}
