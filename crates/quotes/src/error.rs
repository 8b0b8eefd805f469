use thiserror::Error;

/// Errors from fetching or serving quotes.
#[derive(Debug, Error)]
pub enum Error {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("quote service returned {0}")]
    Status(reqwest::StatusCode),

    #[error("quote service returned an empty crumb")]
    MissingCrumb,

    /// The provider answered but had nothing for this symbol.
    #[error("no data for {0}")]
    NoData(String),

    #[error(transparent)]
    Mcp(#[from] mcp::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
