use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "heicwatch")]
#[command(author, version, about = "Convert HEIC photos in a watched folder to JPEG")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch the folder and convert on every interval
    Watch {
        /// Run the first cycle immediately instead of after one interval
        #[arg(long)]
        run_now: bool,
    },

    /// Run a single conversion cycle and exit
    Run {
        /// Show what would be done without executing
        #[arg(long)]
        dry_run: bool,
    },

    /// Check that the converter is available
    CheckTools,

    /// Validate configuration and print the effective settings
    Validate,
}
