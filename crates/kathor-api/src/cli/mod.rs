//! CLI command definitions for the `kathor` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chat;
pub mod config;
pub mod speak;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Kathor, a travel-itinerary companion with a temper.
#[derive(Parser)]
#[command(name = "kathor", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON (and JSON log lines) instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log filter used when `RUST_LOG` is not set.
    pub fn log_directive(&self) -> &'static str {
        let serving = matches!(self.command, Commands::Serve { .. });
        match self.verbose {
            0 if self.quiet => "error",
            0 if serving => "info",
            0 => "warn",
            1 => "info,kathor_core=debug,kathor_infra=debug,kathor_api=debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server with the web chat.
    Serve {
        /// Port to listen on (overrides `[server].port`).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides `[server].host`).
        #[arg(long)]
        host: Option<String>,
    },

    /// Chat with Kathor in the terminal.
    Chat {
        /// Name Kathor knows you by.
        #[arg(long, default_value = "User")]
        name: String,
    },

    /// Synthesize speech to an MP3 file.
    Speak {
        /// Text to speak.
        text: String,

        /// Voice id (defaults to `[tts].voice_id`).
        #[arg(long)]
        voice: Option<String>,

        /// Output file.
        #[arg(short, long, default_value = "kathor.mp3")]
        out: PathBuf,
    },

    /// Inspect or create the configuration file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration (file plus environment).
    Show,
    /// Print the configuration file path.
    Path,
    /// Write a default configuration file if none exists.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}
