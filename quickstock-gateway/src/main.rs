use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use quickstock::context::{LiveContextSource, SyntheticContextSource};
use quickstock::gateway::{self, GatewayConfig};
use quickstock::intelligence::{build_backend, select_provider, IntelligenceResponder};
use quickstock::IntelligenceConfig;

#[derive(Parser)]
#[command(name = "quickstock-gateway")]
#[command(author = "QuickStock Team")]
#[command(version)]
#[command(about = "QuickStock AI demand intelligence gateway")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve(ServeArgs),
    /// Answer a single query and print the JSON result
    Ask(AskArgs),
}

#[derive(Args)]
struct ContextArgs {
    /// Random variation applied to synthetic context numbers (0.0 - 0.5)
    #[arg(long, env = "QUICKSTOCK_CONTEXT_JITTER", default_value = "0.0")]
    context_jitter: f64,
}

#[derive(Parser)]
struct ServeArgs {
    #[arg(long, env = "QUICKSTOCK_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Disable the permissive CORS layer
    #[arg(long)]
    no_cors: bool,

    #[command(flatten)]
    context: ContextArgs,
}

#[derive(Parser)]
struct AskArgs {
    query: String,

    #[command(flatten)]
    context: ContextArgs,
}

fn context_source(args: &ContextArgs) -> anyhow::Result<Arc<dyn LiveContextSource>> {
    let source = SyntheticContextSource::with_jitter(args.context_jitter)
        .context("invalid --context-jitter")?;
    Ok(Arc::new(source))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let config = IntelligenceConfig::from_env();
    tracing::info!(provider = select_provider(&config).tag(), "AI provider selected");

    let result = match cli.command {
        Commands::Serve(args) => serve_gateway(args, config).await,
        Commands::Ask(args) => ask(args, config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn serve_gateway(args: ServeArgs, config: IntelligenceConfig) -> anyhow::Result<()> {
    let gateway_config = GatewayConfig {
        bind_addr: format!("{}:{}", args.host, args.port),
        permissive_cors: !args.no_cors,
    };
    let source = context_source(&args.context)?;

    tokio::select! {
        result = gateway::start(gateway_config, &config, source) => {
            result.context("gateway stopped")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }
    Ok(())
}

async fn ask(args: AskArgs, config: IntelligenceConfig) -> anyhow::Result<()> {
    let backend = build_backend(&config)?;
    let responder = IntelligenceResponder::new(context_source(&args.context)?, backend);
    let answer = responder.answer_query(Some(args.query.as_str())).await?;
    println!("{}", serde_json::to_string_pretty(&answer)?);
    Ok(())
}
