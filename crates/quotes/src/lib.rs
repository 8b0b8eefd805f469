//! Stock quote tools for MCP.
//!
//! [`QuoteTools`] exposes `get_stock_price` and `get_multiple_stocks` as an
//! [`mcp::ToolService`]. Quotes come from a [`QuoteSource`];
//! [`YahooQuoteSource`] is the production one.

mod error;
mod format;
mod source;
mod tools;

pub use error::{Error, Result};
pub use format::{stock_report, summary_line};
pub use source::{DEFAULT_BASE_URL, DEFAULT_COOKIE_URL, QuoteRecord, QuoteSource, YahooQuoteSource};
pub use tools::{GET_MULTIPLE_STOCKS, GET_STOCK_PRICE, QuoteTools};
