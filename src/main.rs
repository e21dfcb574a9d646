use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{info, warn};

use terrapin_seq_demo::api::{RunRequest, handle_request};
use terrapin_seq_demo::pipeline::{self, RunReport};
use terrapin_seq_demo::report::{
    write_attack_snapshots, write_packet_table, write_sequence_diff,
};

const BASELINE_TITLE: &str = "Baseline handshake (no attack)";

#[derive(Parser, Debug)]
#[command(name = "terrapin-seq-demo")]
#[command(
    about = "Terrapin-style demo: drop handshake packets and watch implicit sequence numbers shift"
)]
#[command(version = "1.0.0")]
struct Args {
    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show sequence numbers for a clean handshake (no attack)
    Baseline {
        /// JSON packet trace (not a real PCAP file, despite the flag name)
        #[arg(long, alias = "trace")]
        pcap: PathBuf,
    },
    /// Run the configured packet-drop attack from a YAML config
    Attack {
        /// YAML configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Directory for the before/after JSON traces
        #[arg(long, default_value = "logs")]
        log_dir: PathBuf,
    },
    /// Randomly drop client-side packets
    Explore {
        /// JSON packet trace
        #[arg(long, alias = "trace")]
        pcap: PathBuf,

        /// Number of client packets to drop
        #[arg(long, default_value = "1", allow_negative_numbers = true)]
        random_drop: i64,

        /// Random seed for reproducible drops (0 = different every run, negatives allowed)
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        seed: i64,
    },
    /// Answer a web API request body with the JSON response
    Api {
        /// Request body, e.g. '{"mode": "explore", "random_drop": 2}'
        #[arg(short, long, default_value = "{}")]
        request: String,

        /// Trace used by baseline and explore requests
        #[arg(long, default_value = "data/sample_trace.json")]
        trace: PathBuf,

        /// Config used by attack requests
        #[arg(long, default_value = "data/demo_config.yaml")]
        config: PathBuf,
    },
}

fn print_tables(report: &RunReport, after_title: &str, diff_title: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_packet_table(&mut out, &report.baseline, Some(BASELINE_TITLE))?;
    write_packet_table(&mut out, &report.after, Some(after_title))?;
    write_sequence_diff(&mut out, &report.diff, Some(diff_title))?;
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    match args.command {
        Commands::Baseline { pcap } => {
            info!("Starting baseline handshake demo");
            let report = pipeline::run_baseline(&pcap)
                .with_context(|| format!("Failed to run baseline on {}", pcap.display()))?;

            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_packet_table(&mut out, &report.baseline, Some(BASELINE_TITLE))?;
        }
        Commands::Attack { config, log_dir } => {
            info!("Starting attack demo");
            info!("Config: {}", config.display());
            let report = pipeline::run_attack(&config)
                .with_context(|| format!("Attack demo failed for config {}", config.display()))?;

            print_tables(
                &report,
                "Post-attack visible handshake (after dropping packets)",
                "Sequence number diff (baseline vs post-attack)",
            )?;

            write_attack_snapshots(&log_dir, &report.baseline, &report.after)
                .with_context(|| format!("Failed to write traces to {}", log_dir.display()))?;
            info!("Demo complete");
        }
        Commands::Explore { pcap, random_drop, seed } => {
            info!("Starting explore mode");
            info!("Trace: {}", pcap.display());
            let report = pipeline::run_explore(&pcap, random_drop, seed)
                .with_context(|| format!("Explore failed on {}", pcap.display()))?;

            if let Some(note) = &report.note {
                warn!("{}", note);
                let stdout = io::stdout();
                let mut out = stdout.lock();
                write_packet_table(&mut out, &report.baseline, Some(BASELINE_TITLE))?;
            } else {
                print_tables(
                    &report,
                    "Post-attack visible handshake (explore mode)",
                    "Sequence number diff (baseline vs explore mode)",
                )?;
            }
        }
        Commands::Api { request, trace, config } => {
            let request = RunRequest::from_json(&request).context("Invalid request body")?;
            let response = handle_request(&request, &trace, &config)
                .with_context(|| format!("Request for mode '{}' failed", request.mode))?;

            let stdout = io::stdout();
            let mut out = stdout.lock();
            serde_json::to_writer_pretty(&mut out, &response)?;
            writeln!(out)?;
        }
    }

    Ok(())
}
