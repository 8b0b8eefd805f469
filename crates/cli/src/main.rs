mod config;
mod error;
mod logging;

use std::path::PathBuf;

use clap::Parser;
use mcp::ServerConfig;
use runtime::{McpToolHost, OllamaBackend, Orchestrator, QueryClassifier, Session};
use tokio::io::BufReader;
use tracing::info;

use config::Config;
use error::Result;

const CONFIG_FILE: &str = "quotebot.toml";
const MODEL_ENV: &str = "QUOTEBOT_MODEL";

#[derive(Parser)]
#[command(name = "quotebot")]
#[command(about = "Ask a local model about stocks, backed by an MCP quote server", long_about = None)]
#[command(version)]
struct Cli {
    /// MCP server to launch (.py, .js, or an executable)
    server: PathBuf,

    /// Model to use (overrides QUOTEBOT_MODEL and the config file)
    #[arg(short, long)]
    model: Option<String>,

    /// Config file [default: ./quotebot.toml if present]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    // A pending blocking stdin read would otherwise hold the runtime open.
    std::process::exit(0);
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(CONFIG_FILE)?,
    };
    let model = config.resolve_model(cli.model.as_deref(), std::env::var(MODEL_ENV).ok());

    let backend = OllamaBackend::builder()
        .base_url(&config.backend.base_url)
        .timeout(config.backend.timeout())
        .build()
        .map_err(runtime::Error::from)?;

    let host = McpToolHost::connect(ServerConfig::for_script(&cli.server))
        .await
        .map_err(runtime::Error::from)?;
    let mut session = Session::new(host).with_discovery_ttl(config.discovery.ttl());

    let tools = match session.discover().await {
        Ok(tools) => tools,
        Err(e) => {
            session.close().await;
            return Err(runtime::Error::from(e).into());
        }
    };
    let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();

    println!("\nConnected to server with tools: {}", names.join(", "));
    println!("Model: {model} via {backend}");
    println!("Type your queries or 'quit' to exit.");

    let mut orchestrator = Orchestrator::new(backend, session, model)
        .with_classifier(QueryClassifier::new(config.routing));

    let stdin = BufReader::new(tokio::io::stdin());
    let outcome = tokio::select! {
        result = orchestrator.run(stdin, std::io::stdout()) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted");
            Ok(())
        }
    };

    orchestrator.into_session().close().await;
    println!("\nSession ended.");

    outcome?;
    Ok(())
}
