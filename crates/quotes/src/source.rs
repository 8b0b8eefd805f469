//! Market-data providers.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Error, Result};

/// Yahoo Finance quote endpoint host.
pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo host that sets the session cookie the crumb is bound to.
pub const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One provider record, keyed the way the provider names its fields.
pub type QuoteRecord = Map<String, Value>;

/// Something that can look up a quote for one ticker.
pub trait QuoteSource: Send + Sync {
    fn fetch(&self, symbol: &str) -> impl Future<Output = Result<QuoteRecord>> + Send;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Vec<QuoteRecord>,
}

/// Quotes from Yahoo Finance's v7 quote API.
///
/// The v7 endpoint rejects requests without a session cookie and the
/// matching crumb. Both are fetched on first use and the crumb is refreshed
/// once whenever the quote endpoint answers 401.
pub struct YahooQuoteSource {
    client: reqwest::Client,
    base_url: String,
    cookie_url: String,
    crumb: Mutex<Option<String>>,
}

impl YahooQuoteSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cookie_url: DEFAULT_COOKIE_URL.to_string(),
            crumb: Mutex::new(None),
        })
    }

    /// Fetch the session cookie from `url` instead of Yahoo's cookie host.
    pub fn with_cookie_url(mut self, url: impl Into<String>) -> Self {
        self.cookie_url = url.into();
        self
    }

    async fn crumb(&self, refresh: bool) -> Result<String> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref().filter(|_| !refresh) {
            return Ok(crumb.clone());
        }

        // The cookie host answers with an error status but still sets the cookie.
        self.client.get(&self.cookie_url).send().await?;

        let response = self
            .client
            .get(format!("{}/v1/test/getcrumb", self.base_url))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::Status(response.status()));
        }

        let crumb = response.text().await?.trim().to_string();
        if crumb.is_empty() {
            return Err(Error::MissingCrumb);
        }
        debug!("fetched quote crumb");
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    async fn request_quote(&self, symbol: &str, refresh: bool) -> Result<reqwest::Response> {
        let crumb = self.crumb(refresh).await?;
        let response = self
            .client
            .get(format!("{}/v7/finance/quote", self.base_url))
            .query(&[("symbols", symbol), ("crumb", crumb.as_str())])
            .send()
            .await?;
        Ok(response)
    }
}

impl QuoteSource for YahooQuoteSource {
    async fn fetch(&self, symbol: &str) -> Result<QuoteRecord> {
        debug!(symbol, "fetching quote");

        let mut response = self.request_quote(symbol, false).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            debug!(symbol, "crumb rejected, refreshing");
            response = self.request_quote(symbol, true).await?;
        }

        if !response.status().is_success() {
            return Err(Error::Status(response.status()));
        }

        let envelope: QuoteEnvelope = response.json().await?;
        envelope
            .quote_response
            .result
            .into_iter()
            .next()
            .ok_or_else(|| Error::NoData(symbol.to_string()))
    }
}
