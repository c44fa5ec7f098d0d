//! Command-line interface for strictly_words.

use crate::config::{ConfigError, ServerConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// Strictly Words - authoritative server for a two-player word game
#[derive(Parser, Debug)]
#[command(name = "strictly_words")]
#[command(about = "Rules engine and game server for a two-player word game", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP and WebSocket game server
    Serve {
        /// TOML config file. Defaults apply when absent.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Word list, one word per line
        #[arg(short, long)]
        dictionary: Option<PathBuf>,
    },

    /// Look up one word in the dictionary
    CheckWord {
        /// Word to check
        word: String,

        /// Word list, one word per line
        #[arg(short, long, default_value = "words.txt")]
        dictionary: PathBuf,
    },
}

/// Builds the server config from an optional file plus flag overrides.
pub fn resolve_config(
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    dictionary: Option<PathBuf>,
) -> Result<ServerConfig, ConfigError> {
    let mut resolved = match config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(host) = host {
        resolved = resolved.with_host(host);
    }
    if let Some(port) = port {
        resolved = resolved.with_port(port);
    }
    if let Some(dictionary) = dictionary {
        resolved = resolved.with_dictionary_path(dictionary);
    }
    debug!(?resolved, "Config resolved");
    Ok(resolved)
}
