//! Session management.

use std::time::Duration;

use tracing::{debug, info};

use crate::discovery::ToolDiscovery;
use crate::tools::{ToolCall, ToolDescriptor, ToolError, ToolHost, ToolResult};

/// The live connection to a tool host plus the tools it last advertised.
///
/// One per client process. [`Session::close`] releases the host; dropping the
/// session without closing still tears the host down through its own `Drop`.
pub struct Session<H: ToolHost> {
    host: H,
    discovery: ToolDiscovery,
    known: Vec<ToolDescriptor>,
}

impl<H: ToolHost> Session<H> {
    /// Wrap an already-connected host.
    pub fn new(host: H) -> Self {
        Self {
            host,
            discovery: ToolDiscovery::default(),
            known: Vec::new(),
        }
    }

    /// Cache discovered tools for `ttl` instead of refetching every time.
    pub fn with_discovery_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.discovery = ToolDiscovery::new(ttl);
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Fetch the host's tools and remember them for call validation.
    pub async fn discover(&mut self) -> Result<Vec<ToolDescriptor>, ToolError> {
        let tools = self.discovery.discover(&self.host).await?;
        self.known = tools.clone();
        Ok(tools)
    }

    /// Tools seen by the most recent discovery.
    pub fn known_tools(&self) -> &[ToolDescriptor] {
        &self.known
    }

    /// Validate a call against the known descriptors, then execute it.
    ///
    /// The input is forwarded as-is; nothing is dropped or renamed.
    pub async fn call(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let descriptor = self
            .known
            .iter()
            .find(|tool| tool.name == call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;

        if let Some(missing) = descriptor
            .required_fields()
            .into_iter()
            .find(|field| !call.input.contains_key(*field))
        {
            return Err(ToolError::InvalidInput(format!(
                "missing required argument `{missing}` for {}",
                call.name
            )));
        }

        debug!(tool = %call.name, "executing tool call");
        self.host.call_tool(call).await
    }

    /// End the session and release the host.
    pub async fn close(self) {
        self.host.shutdown().await;
        info!("session closed");
    }
}
