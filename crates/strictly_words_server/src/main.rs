//! Strictly Words - command-line entry point.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use strictly_words::is_valid_word;
use strictly_words_server::{Cli, Command, GameService, ServerConfig, load_word_list, resolve_config, router};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,strictly_words=debug,strictly_words_server=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            dictionary,
        } => {
            let config = resolve_config(config, host, port, dictionary)?;
            run_server(config).await
        }
        Command::CheckWord { word, dictionary } => check_word(&word, dictionary).await,
    }
}

/// Loads the dictionary and serves until the process is stopped.
#[instrument(skip_all, fields(bind = %config.bind_address()))]
async fn run_server(config: ServerConfig) -> Result<()> {
    info!("Starting Strictly Words server");

    let words = load_word_list(config.dictionary_path())
        .with_context(|| format!("loading dictionary {}", config.dictionary_path().display()))?;
    let address = config.bind_address();
    let service = GameService::new(Arc::new(words), config);
    let app = router(service);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {}", address))?;
    info!(%address, "Server ready");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn check_word(word: &str, dictionary: std::path::PathBuf) -> Result<()> {
    let words = load_word_list(&dictionary)
        .with_context(|| format!("loading dictionary {}", dictionary.display()))?;
    let valid = is_valid_word(&words, word).await?;
    println!("{}: {}", word, if valid { "valid" } else { "not a word" });
    Ok(())
}
