//! Command-line interface for shiritori.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Shiritori - word-chain game engine with an LLM referee
#[derive(Parser, Debug)]
#[command(name = "shiritori")]
#[command(about = "Multiplayer shiritori game server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Path to engine configuration (defaults are used if missing)
        #[arg(short, long, default_value = "shiritori.toml")]
        config: PathBuf,
    },

    /// Ask the referee whether a word is playable
    Judge {
        /// Word to judge
        word: String,

        /// Word it follows
        #[arg(long)]
        previous: Option<String>,

        /// Path to engine configuration
        #[arg(short, long, default_value = "shiritori.toml")]
        config: PathBuf,
    },

    /// Check the local chain rules for a pair of words (no referee)
    Check {
        /// Previous word
        previous: String,

        /// Candidate word
        candidate: String,

        /// Path to engine configuration
        #[arg(short, long, default_value = "shiritori.toml")]
        config: PathBuf,
    },
}
