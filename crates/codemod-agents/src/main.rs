use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use codemod_agents::{
    check_endpoint, synthesize, ChannelSink, CodemodConfig, LlmDraftGenerator, RigModelClient,
};
use codemod_oracles::Example;

#[derive(Parser, Debug)]
#[command(author, version, about = "Synthesize a codemod from one before/after example", long_about = None)]
struct Args {
    /// File holding the code before the transformation
    #[arg(long)]
    before: PathBuf,

    /// File holding the expected code after the transformation
    #[arg(long)]
    after: PathBuf,

    /// Correction rounds after the draft (overrides the config file)
    #[arg(long)]
    max_correction_attempts: Option<u32>,

    /// Model name (overrides CODEMOD_AI_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// OpenAI-compatible endpoint (overrides CODEMOD_AI_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Optional TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the final codemod here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => CodemodConfig::from_toml_file(path)?,
        None => CodemodConfig::from_env(),
    };
    if let Some(attempts) = args.max_correction_attempts {
        config.max_correction_attempts = attempts;
    }
    if let Some(model) = args.model {
        config.model.model = model;
    }
    if let Some(url) = args.base_url {
        config.model.base_url = url;
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    let before = std::fs::read_to_string(&args.before)
        .with_context(|| format!("failed to read {}", args.before.display()))?;
    let after = std::fs::read_to_string(&args.after)
        .with_context(|| format!("failed to read {}", args.after.display()))?;

    if !check_endpoint(&config.model.base_url).await {
        warn!(url = %config.model.base_url, "model endpoint not reachable, continuing anyway");
    }

    let client = RigModelClient::new(config.model.clone())?;
    let generator = Arc::new(LlmDraftGenerator::new(Arc::new(client)));

    let (sink, mut events) = ChannelSink::channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!("failed to encode progress event: {e}"),
            }
        }
    });

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling session");
            on_signal.cancel();
        }
    });

    info!(
        model = %config.model.model,
        engine = %config.engine,
        budget = config.max_correction_attempts,
        "codemod synthesis starting"
    );

    let report = synthesize(
        &config,
        Example::new(before, after),
        generator,
        Arc::new(sink),
        cancel,
    )
    .await?;

    // The sink was dropped with the session, so the printer drains and exits.
    printer.await.context("progress printer panicked")?;

    info!(
        session_id = %report.session_id,
        attempts = report.attempts_used,
        evaluations = report.evaluations,
        success = report.outcome.is_success(),
        "session finished"
    );

    let Some(codemod) = report.codemod() else {
        anyhow::bail!("no codemod produced: {:?}", report.outcome);
    };
    match &args.output {
        Some(path) => std::fs::write(path, codemod)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}
