mod logging;

use clap::Parser;
use tokio::io::BufReader;

use quotes::{DEFAULT_BASE_URL, DEFAULT_COOKIE_URL, QuoteTools, Result, YahooQuoteSource};

#[derive(Parser)]
#[command(name = "quote-server")]
#[command(about = "MCP server exposing stock quote tools over stdio", long_about = None)]
#[command(version)]
struct Cli {
    /// Quote provider base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// URL that sets the provider's session cookie
    #[arg(long, default_value = DEFAULT_COOKIE_URL)]
    cookie_url: String,

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
}

async fn run(cli: Cli) -> Result<()> {
    let source = YahooQuoteSource::new(cli.base_url)?.with_cookie_url(cli.cookie_url);
    let tools = QuoteTools::new(source);

    let stdin = BufReader::new(tokio::io::stdin());
    mcp::serve(&tools, stdin, tokio::io::stdout()).await?;
    Ok(())
}
