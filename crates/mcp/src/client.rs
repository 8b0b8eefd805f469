//! Client side: spawn a tool-host process and talk to it over stdio.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, RequestId, Tool,
};

/// Default timeout for MCP operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Maximum output size (1MB).
pub const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

/// How to launch an MCP server process.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    /// How long to wait for each response.
    pub timeout: Duration,
}

impl ServerConfig {
    /// Launch configuration for a server script or executable.
    ///
    /// `.py` scripts run under `python`, `.js` under `node`; anything else is
    /// executed directly.
    pub fn for_script(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let display = path.to_string_lossy().into_owned();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| display.clone());

        let (command, args) = match path.extension().and_then(|e| e.to_str()) {
            Some("py") => ("python".to_string(), vec![display]),
            Some("js") => ("node".to_string(), vec![display]),
            _ => (display, Vec::new()),
        };

        Self {
            name,
            command,
            args,
            env: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Line reader over the server's stdout.
///
/// Bytes of a half-read line stay in `pending`, so a read cancelled by the
/// response timeout resumes where it stopped. A line is never buffered past
/// `MAX_OUTPUT_SIZE + 1` bytes.
struct LineReader {
    inner: BufReader<ChildStdout>,
    pending: Vec<u8>,
    discarding: bool,
}

impl LineReader {
    fn new(stdout: ChildStdout) -> Self {
        Self {
            inner: BufReader::new(stdout),
            pending: Vec::new(),
            discarding: false,
        }
    }

    /// Next line, or `None` at EOF.
    async fn next_line(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            let budget = (MAX_OUTPUT_SIZE + 1 - self.pending.len()) as u64;
            let read = (&mut self.inner)
                .take(budget)
                .read_until(b'\n', &mut self.pending)
                .await?;
            if read == 0 {
                return Ok(None);
            }

            let complete = self.pending.last() == Some(&b'\n');

            // Tail of a line already rejected as too large
            if self.discarding {
                self.pending.clear();
                self.discarding = !complete;
                continue;
            }

            if !complete && self.pending.len() > MAX_OUTPUT_SIZE {
                let size = self.pending.len();
                self.pending.clear();
                self.discarding = true;
                return Err(Error::OutputTooLarge {
                    size,
                    max: MAX_OUTPUT_SIZE,
                });
            }

            return Ok(Some(std::mem::take(&mut self.pending)));
        }
    }
}

/// Handle to a running MCP server.
pub struct Client {
    config: ServerConfig,
    process: Mutex<Child>,
    stdin: Mutex<tokio::process::ChildStdin>,
    stdout: Mutex<LineReader>,
    next_id: AtomicI64,
    server_info: Mutex<Option<InitializeResult>>,
}

impl Client {
    /// Spawn a new MCP server process.
    ///
    /// The child is killed when the client is dropped.
    pub async fn spawn(config: ServerConfig) -> Result<Self> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut process = cmd.spawn().map_err(Error::Spawn)?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| Error::Spawn(std::io::Error::other("failed to capture stdin")))?;

        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| Error::Spawn(std::io::Error::other("failed to capture stdout")))?;

        debug!(server = %config.name, command = %config.command, "spawned MCP server");

        Ok(Self {
            config,
            process: Mutex::new(process),
            stdin: Mutex::new(stdin),
            stdout: Mutex::new(LineReader::new(stdout)),
            next_id: AtomicI64::new(1),
            server_info: Mutex::new(None),
        })
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Initialize the server (must be called before other operations).
    pub async fn initialize(&self) -> Result<InitializeResult> {
        let params = InitializeParams::default();
        let result: InitializeResult = self.request("initialize", Some(params)).await?;

        self.notify("notifications/initialized", None::<()>).await?;

        debug!(
            server = %result.server_info.name,
            protocol = %result.protocol_version,
            "MCP server initialized"
        );
        *self.server_info.lock().await = Some(result.clone());

        Ok(result)
    }

    /// Check if the server is initialized.
    pub async fn is_initialized(&self) -> bool {
        self.server_info.lock().await.is_some()
    }

    /// Fetch the server's current tool list.
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        self.ensure_initialized().await?;
        let result: ListToolsResult = self.request("tools/list", None::<()>).await?;
        Ok(result.tools)
    }

    /// Call a tool by name.
    pub async fn call_tool(&self, name: &str, arguments: Option<Value>) -> Result<CallToolResult> {
        self.ensure_initialized().await?;

        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };

        let result: CallToolResult = self.request("tools/call", Some(params)).await?;

        if result.is_error {
            return Err(Error::ToolCallFailed(result.joined_text()));
        }

        Ok(result)
    }

    /// Shut down the server.
    pub async fn shutdown(self) -> Result<()> {
        // Closing stdin lets a well-behaved server exit on EOF
        drop(self.stdin);

        let mut process = self.process.lock().await;
        let _ = process.kill().await;
        debug!(server = %self.config.name, "MCP server stopped");

        Ok(())
    }

    // --- Internal methods ---

    async fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized().await {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    fn next_request_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn request<P, R>(&self, method: &str, params: Option<P>) -> Result<R>
    where
        P: serde::Serialize,
        R: serde::de::DeserializeOwned,
    {
        let id = self.next_request_id();
        let mut request = JsonRpcRequest::new(id.clone(), method);
        if let Some(p) = params {
            request = request.with_params(p);
        }

        let request_json = serde_json::to_string(&request)?;
        trace!(%method, "-> {request_json}");
        self.write_line(&request_json).await?;

        let response = timeout(self.config.timeout, self.read_response(&id))
            .await
            .map_err(|_| Error::Timeout)??;

        let result_value = response.into_result()?;
        let result: R = serde_json::from_value(result_value)?;

        Ok(result)
    }

    async fn notify<P>(&self, method: &str, params: Option<P>) -> Result<()>
    where
        P: serde::Serialize,
    {
        let mut notification = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
        });
        if let Some(p) = params {
            notification["params"] = serde_json::to_value(p)?;
        }

        self.write_line(&serde_json::to_string(&notification)?)
            .await
    }

    async fn write_line(&self, line: &str) -> Result<()> {
        let mut stdin = self.stdin.lock().await;
        stdin.write_all(line.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Read lines until the response to `expected` arrives.
    ///
    /// Server notifications are skipped, as are late responses to earlier
    /// requests that timed out.
    async fn read_response(&self, expected: &RequestId) -> Result<JsonRpcResponse> {
        let mut stdout = self.stdout.lock().await;

        loop {
            let Some(line) = stdout.next_line().await? else {
                return Err(Error::ServerExited);
            };

            let line = String::from_utf8_lossy(&line);
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            trace!("<- {trimmed}");

            let value: Value = serde_json::from_str(trimmed)?;
            if value.get("id").is_none_or(Value::is_null) {
                continue;
            }

            let response: JsonRpcResponse = serde_json::from_value(value)?;
            if response.id.as_ref() == Some(expected) {
                return Ok(response);
            }

            match response.id {
                Some(id) if is_stale(&id, expected) => {
                    debug!(server = %self.config.name, ?id, "discarding late response");
                }
                other => {
                    return Err(Error::InvalidResponse(format!(
                        "response ID mismatch: expected {expected:?}, got {other:?}"
                    )));
                }
            }
        }
    }
}

/// Ids are handed out in increasing order, so a smaller one belongs to a
/// request whose caller already gave up.
fn is_stale(id: &RequestId, expected: &RequestId) -> bool {
    matches!((id, expected), (RequestId::Number(id), RequestId::Number(expected)) if id < expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_script_runs_under_python() {
        let config = ServerConfig::for_script("mcp-server/server.py");
        assert_eq!(config.command, "python");
        assert_eq!(config.args, vec!["mcp-server/server.py".to_string()]);
        assert_eq!(config.name, "server");
    }

    #[test]
    fn js_script_runs_under_node() {
        let config = ServerConfig::for_script("build/index.js");
        assert_eq!(config.command, "node");
        assert_eq!(config.args, vec!["build/index.js".to_string()]);
    }

    #[test]
    fn executables_run_directly() {
        let config = ServerConfig::for_script("target/release/quote-server");
        assert_eq!(config.command, "target/release/quote-server");
        assert!(config.args.is_empty());
        assert_eq!(config.name, "quote-server");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(
            config.with_timeout(Duration::from_secs(2)).timeout,
            Duration::from_secs(2)
        );
    }

    /// A shell MCP server; `list_hook` runs before each `tools/list` reply,
    /// with `$n` counting the lists seen so far.
    #[cfg(unix)]
    fn scripted_server(list_hook: &str, timeout: Duration) -> ServerConfig {
        let script = r##"
n=0
while IFS= read -r line; do
  id=$(printf '%s' "$line" | sed -n 's/.*"id":\([0-9][0-9]*\).*/\1/p')
  [ -z "$id" ] && continue
  case "$line" in
    *'"method":"initialize"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"protocolVersion":"2024-11-05","capabilities":{},"serverInfo":{"name":"scripted"}}}\n' "$id" ;;
    *'"method":"tools/list"'*)
      n=$((n+1))
      LIST_HOOK
      printf '{"jsonrpc":"2.0","id":%s,"result":{"tools":[{"name":"tool%s","inputSchema":{"type":"object"}}]}}\n' "$id" "$n" ;;
  esac
done
"##
        .replace("LIST_HOOK", list_hook);

        ServerConfig {
            name: "scripted".into(),
            command: "sh".into(),
            args: vec!["-c".into(), script],
            env: HashMap::new(),
            timeout,
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn late_response_is_skipped_after_timeout() {
        let config = scripted_server(
            r#"if [ "$n" -eq 1 ]; then sleep 2; fi"#,
            Duration::from_millis(1500),
        );
        let client = Client::spawn(config).await.unwrap();
        client.initialize().await.unwrap();

        let err = client.list_tools().await.unwrap_err();
        assert!(matches!(err, Error::Timeout), "{err:?}");

        // The reply to the timed-out request arrives first and is dropped
        for expected in ["tool2", "tool3"] {
            let tools = client.list_tools().await.unwrap();
            assert_eq!(tools[0].name, expected);
        }

        client.shutdown().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn oversized_line_is_rejected_and_skipped() {
        let config = scripted_server(
            r#"if [ "$n" -eq 1 ]; then head -c 1100000 /dev/zero | tr '\0' a; echo; fi"#,
            Duration::from_secs(5),
        );
        let client = Client::spawn(config).await.unwrap();
        client.initialize().await.unwrap();

        let err = client.list_tools().await.unwrap_err();
        assert!(
            matches!(err, Error::OutputTooLarge { size, max } if size == max + 1),
            "{err:?}"
        );

        let tools = client.list_tools().await.unwrap();
        assert_eq!(tools[0].name, "tool2");

        client.shutdown().await.unwrap();
    }

    #[test]
    fn only_smaller_numeric_ids_are_stale() {
        assert!(is_stale(&RequestId::Number(2), &RequestId::Number(3)));
        assert!(!is_stale(&RequestId::Number(4), &RequestId::Number(3)));
        assert!(!is_stale(&RequestId::from("2"), &RequestId::Number(3)));
    }

    #[tokio::test]
    async fn spawn_missing_binary_fails() {
        let config = ServerConfig::for_script("/nonexistent/quote-server-binary");
        let err = Client::spawn(config).await.err().expect("spawn should fail");
        assert!(matches!(err, Error::Spawn(_)));
        assert!(err.is_connection_failure());
    }
}
