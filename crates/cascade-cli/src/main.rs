//! cascade — run the fallback gateway or query the provider chain directly

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use cascade_core::{
    CascadeConfig, FallbackRouter, HttpInvoker, OrchestrationResult, Prompt, ProviderSpec,
};
use cascade_gateway::GatewayServer;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cascade", about = "Try AI providers in order until one answers")]
#[command(version, propagate_version = true)]
struct Cli {
    /// Config file (default: ~/.cascade/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP gateway until Ctrl-C
    Serve {
        /// Address to listen on, overriding the config file
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Send one prompt through the provider chain
    Ask {
        #[arg(required = true)]
        prompt: Vec<String>,
    },
    /// List the provider chain in priority order
    Providers,
    /// Write the default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let path = config_path(cli.config)?;
    match cli.command {
        Commands::Serve { bind } => serve(&path, bind).await,
        Commands::Ask { prompt } => ask(&path, &prompt).await,
        Commands::Providers => providers(&path),
        Commands::Init { force } => {
            write_default_config(&path, force)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}

fn config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => CascadeConfig::default_path().context("Could not determine home directory"),
    }
}

fn build_router(specs: Vec<ProviderSpec>) -> FallbackRouter {
    FallbackRouter::from_specs(specs, Arc::new(HttpInvoker::new()))
}

async fn serve(path: &Path, bind: Option<String>) -> Result<()> {
    let config = CascadeConfig::load(path)?;
    let router = build_router(config.resolve_from_env());

    let mut server = GatewayServer::new(router, &config.gateway);
    if let Some(bind) = bind {
        server = server.with_bind(bind);
    }

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            signal.cancel();
        }
    });

    server.run(shutdown).await
}

async fn ask(path: &Path, words: &[String]) -> Result<()> {
    let prompt = Prompt::new(words.join(" "))?;
    let config = CascadeConfig::load(path)?;
    let router = build_router(config.resolve_from_env());

    match router.route(&prompt).await {
        OrchestrationResult::Success { text, provider } => {
            println!("{text}");
            eprintln!("(answered by {provider})");
            Ok(())
        }
        OrchestrationResult::AllFailed => bail!("{}", config.gateway.failure_message),
    }
}

fn providers(path: &Path) -> Result<()> {
    let config = CascadeConfig::load(path)?;
    let specs = config.resolve_from_env();
    if specs.is_empty() {
        println!("No providers configured");
        return Ok(());
    }
    for line in describe_chain(&specs) {
        println!("{line}");
    }
    Ok(())
}

fn describe_chain(specs: &[ProviderSpec]) -> Vec<String> {
    specs
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let state = if spec.is_enabled() { "ready" } else { "no key" };
            format!(
                "{}. {:<12} {:<16} {:<40} {}",
                i + 1,
                spec.name,
                spec.kind.to_string(),
                spec.model,
                state
            )
        })
        .collect()
}

fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = CascadeConfig::default().to_toml()?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
