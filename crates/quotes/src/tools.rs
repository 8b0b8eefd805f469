//! The two quote tools, served over MCP.

use mcp::{CallToolResult, ServerInfo, Tool, ToolService};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::format::{stock_report, summary_line};
use crate::source::QuoteSource;

pub const GET_STOCK_PRICE: &str = "get_stock_price";
pub const GET_MULTIPLE_STOCKS: &str = "get_multiple_stocks";

const SERVER_NAME: &str = "quote-server";

/// Quote lookups over any [`QuoteSource`].
pub struct QuoteTools<S> {
    source: S,
}

impl<S: QuoteSource> QuoteTools<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Full report for one symbol, or the fixed unavailable text.
    pub async fn stock_price(&self, symbol: &str) -> String {
        match self.source.fetch(symbol).await {
            Ok(quote) if !quote.is_empty() => stock_report(&quote),
            Ok(_) => {
                warn!(symbol, "empty quote record");
                format!("Unable to fetch data for {symbol}")
            }
            Err(e) => {
                warn!(symbol, "quote lookup failed: {e}");
                format!("Unable to fetch data for {symbol}")
            }
        }
    }

    /// One line per comma-separated symbol, fetched in order.
    pub async fn multiple_stocks(&self, symbols: &str) -> String {
        let mut lines = Vec::new();

        for symbol in symbols.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let quote = match self.source.fetch(symbol).await {
                Ok(quote) => Some(quote),
                Err(e) => {
                    warn!(symbol, "quote lookup failed: {e}");
                    None
                }
            };
            lines.push(summary_line(symbol, quote.as_ref()));
        }

        lines.join("\n")
    }
}

fn string_arg<'a>(arguments: &'a Value, name: &str) -> Option<&'a str> {
    arguments.get(name).and_then(Value::as_str)
}

fn missing_arg(name: &str) -> CallToolResult {
    CallToolResult::error(format!("missing or non-string argument: {name}"))
}

impl<S: QuoteSource> ToolService for QuoteTools<S> {
    fn info(&self) -> ServerInfo {
        ServerInfo {
            name: SERVER_NAME.to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    fn tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: GET_STOCK_PRICE.to_string(),
                description: Some("Get current stock price and basic information.".to_string()),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "symbol": {
                            "type": "string",
                            "description": "Stock ticker symbol (e.g., AAPL, MSFT)"
                        }
                    },
                    "required": ["symbol"]
                }),
            },
            Tool {
                name: GET_MULTIPLE_STOCKS.to_string(),
                description: Some("Get current prices for multiple stocks.".to_string()),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "symbols": {
                            "type": "string",
                            "description": "Comma-separated list of stock symbols (e.g., AAPL,MSFT,GOOGL)"
                        }
                    },
                    "required": ["symbols"]
                }),
            },
        ]
    }

    async fn call(&self, name: &str, arguments: Value) -> mcp::Result<CallToolResult> {
        info!(tool = name, "tool call");

        match name {
            GET_STOCK_PRICE => Ok(match string_arg(&arguments, "symbol") {
                Some(symbol) => CallToolResult::text(self.stock_price(symbol).await),
                None => missing_arg("symbol"),
            }),
            GET_MULTIPLE_STOCKS => Ok(match string_arg(&arguments, "symbols") {
                Some(symbols) => CallToolResult::text(self.multiple_stocks(symbols).await),
                None => missing_arg("symbols"),
            }),
            other => Err(mcp::Error::ToolNotFound(other.to_string())),
        }
    }
}
