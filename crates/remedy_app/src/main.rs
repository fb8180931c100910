mod platform;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

/// Upload an incident report, wait for the remediation pipeline, and print the
/// generated script.
#[derive(Debug, Parser)]
#[command(name = "remedy", version, about)]
pub struct Args {
    /// Incident report (`.json`) to submit.
    #[arg(required_unless_present = "interactive")]
    pub file: Option<PathBuf>,

    /// Read `open <path>` / `start` / `quit` commands from stdin.
    #[arg(short, long)]
    pub interactive: bool,

    /// Optional RON file overriding endpoint, timeouts and poll settings.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory where fetched scripts are saved.
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Where log output goes.
    #[arg(long, value_enum, default_value_t = LogTarget::File)]
    pub log: LogTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

fn main() -> anyhow::Result<ExitCode> {
    platform::run_app(Args::parse())
}
