//! Retrace - Recorded Trace Debugger
//!
//! Step through a program execution that was recorded ahead of time.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::Result;
use retrace_common::types::BreakpointSpec;
use retrace_engine::RetraceConfig;

mod cmd;
mod utils;

/// Command-line interface for retrace
#[derive(Debug, Parser)]
#[command(name = "retrace")]
#[command(about = "Recorded Trace Debugger - step through a recorded program execution")]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: ~/.retrace.toml)
    #[arg(long, env = "RETRACE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Also write logs to a daily rolling file in the temp directory
    #[arg(long, global = true)]
    pub log_file: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Debug a recorded trace in an interactive prompt
    Debug {
        /// Program source file
        source: PathBuf,
        /// Trace file: a JSON array of line numbers, or {"lines": [...], "depths": [...]}
        trace: PathBuf,
        /// Initial breakpoint (repeatable), e.g. `-b 12` or `-b @12`
        #[arg(short = 'b', long = "break")]
        breakpoints: Vec<BreakpointSpec>,
    },
    /// Drive a session with one JSON command per stdin line
    Json,
    /// Serve a session over JSON-RPC
    Serve {
        /// Program source file
        source: PathBuf,
        /// Trace file: a JSON array of line numbers, or {"lines": [...], "depths": [...]}
        trace: PathBuf,
        /// Initial breakpoint (repeatable)
        #[arg(short = 'b', long = "break")]
        breakpoints: Vec<BreakpointSpec>,
        /// Port to listen on (overrides the configuration file)
        #[arg(long, env = "RETRACE_RPC_PORT")]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    retrace_common::logging::init_logging("retrace", cli.log_file)?;

    let config = match &cli.config {
        Some(path) => RetraceConfig::load_from(path)?,
        None => RetraceConfig::load()?,
    };
    tracing::debug!("Using configuration: {:?}", config);

    match cli.command {
        Commands::Debug { source, trace, breakpoints } => {
            tracing::info!("Debugging {:?} with trace {:?}", source, trace);
            cmd::debug_trace(&source, &trace, &breakpoints, &config)
        }
        Commands::Json => {
            tracing::info!("Reading JSON commands from stdin");
            cmd::run_json_stdio(&config)
        }
        Commands::Serve { source, trace, breakpoints, port } => {
            tracing::info!("Serving {:?} with trace {:?}", source, trace);
            cmd::serve_trace(&source, &trace, &breakpoints, port, &config).await
        }
    }
}
