//! Tool discovery with optional TTL caching.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::tools::{ToolDescriptor, ToolError, ToolHost};

/// Fetches tool descriptors from a host.
///
/// With no TTL every call goes to the host. With a TTL the last fetch is
/// reused until it expires.
#[derive(Debug, Default)]
pub struct ToolDiscovery {
    ttl: Option<Duration>,
    cached: Option<(Instant, Vec<ToolDescriptor>)>,
}

impl ToolDiscovery {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl: ttl.filter(|ttl| !ttl.is_zero()),
            cached: None,
        }
    }

    pub async fn discover<H: ToolHost>(
        &mut self,
        host: &H,
    ) -> Result<Vec<ToolDescriptor>, ToolError> {
        if let (Some(ttl), Some((fetched_at, tools))) = (self.ttl, &self.cached) {
            if fetched_at.elapsed() < ttl {
                debug!(tools = tools.len(), "tool list served from cache");
                return Ok(tools.clone());
            }
        }

        let tools = host.list_tools().await?;
        debug!(tools = tools.len(), "tool list fetched from host");

        if self.ttl.is_some() {
            self.cached = Some((Instant::now(), tools.clone()));
        }
        Ok(tools)
    }

    /// Drop any cached tool list.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}
