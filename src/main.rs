//! Shiritori - game server CLI
//!
//! Serves the game over HTTP, or judges and checks words from the shell.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use shiritori::{
    ChainValidator, EngineConfig, GatewayVerdict, JudgmentRequest, LlmClient, LlmJudge,
    RetryPolicy, SemanticGateway, ShiritoriEngine,
};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,shiritori=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { host, port, config } => run_server(host, port, &config).await,
        Command::Judge {
            word,
            previous,
            config,
        } => run_judge(word, previous, &config).await,
        Command::Check {
            previous,
            candidate,
            config,
        } => run_check(&previous, &candidate, &config),
    }
}

/// Builds the LLM referee from configuration.
#[instrument(skip(config))]
fn build_judge(config: &EngineConfig) -> Result<Arc<LlmJudge>> {
    let llm_config = config
        .llm()
        .create_llm_config()
        .context("Failed to configure the LLM referee")?;
    Ok(Arc::new(LlmJudge::new(LlmClient::new(llm_config))))
}

/// Run the HTTP game server
#[instrument(skip(config_path), fields(config_path = %config_path.display()))]
async fn run_server(host: String, port: u16, config_path: &Path) -> Result<()> {
    info!("Starting shiritori server");

    let config = EngineConfig::load_or_default(config_path)?;
    let judge = build_judge(&config)?;
    let engine = ShiritoriEngine::new(config, judge);
    let app = shiritori::router(engine);

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(%addr, "Server ready");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Judge a single word through the gateway
#[instrument(skip(config_path))]
async fn run_judge(word: String, previous: Option<String>, config_path: &Path) -> Result<()> {
    let config = EngineConfig::load_or_default(config_path)?;
    let gateway = SemanticGateway::new(build_judge(&config)?, RetryPolicy::from_config(&config));

    let request = JudgmentRequest::new(word, previous, *config.mode());
    match gateway.judge(&request).await {
        GatewayVerdict::Approved { reason } => println!("OK: {}", reason),
        GatewayVerdict::Rejected { reason } => println!("NG: {}", reason),
        GatewayVerdict::Unavailable { attempts } => {
            println!("Referee unavailable after {} attempt(s)", attempts)
        }
    }
    Ok(())
}

/// Apply the local chain rules to a pair of words
#[instrument(skip(config_path))]
fn run_check(previous: &str, candidate: &str, config_path: &Path) -> Result<()> {
    let config = EngineConfig::load_or_default(config_path)?;
    let validator = ChainValidator::new(
        config.scripts().clone(),
        *config.min_word_len(),
        *config.max_word_len(),
        *config.linking(),
        config.terminal_units(),
        *config.mode(),
    );

    match validator.validate(previous, candidate) {
        Ok(accepted) if accepted.terminal => println!(
            "'{}' follows '{}' but ends in '{}' and loses",
            accepted.word, previous, accepted.trailing_unit
        ),
        Ok(accepted) => println!(
            "'{}' follows '{}'; next word starts with '{}'",
            accepted.word, previous, accepted.trailing_unit
        ),
        Err(e) => println!("Rejected: {}", e),
    }
    Ok(())
}
