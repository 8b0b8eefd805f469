//! Per-query control flow and the interactive loop.
//!
//! ```text
//! Idle -> Classifying -> PlainChat ----------------------------> Idle
//!                     \-> ToolRouting -> ToolExecuting -> Narrating -> Idle
//!                                     \-> PlainChat (declined) / diagnostic
//! ```
//!
//! One query runs the machine start to finish before the next is read.
//! At most two completions and one tool call happen per query.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::classifier::QueryClassifier;
use crate::model::{Backend, Message, ModelRequest};
use crate::parser::{Decision, parse};
use crate::prompt::PromptBuilder;
use crate::session::Session;
use crate::tools::{ToolCall, ToolError, ToolHost};
use crate::{Error, Result};

/// Shown when the routing completion is neither the sentinel nor a tool call.
pub const UNPARSEABLE_MESSAGE: &str = "Could not determine tool usage for your request. \
Ask about specific stock symbols (e.g. 'What's the price of AAPL?' or 'Show me AAPL, MSFT, and GOOGL').";

/// Which terminal state produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Classified as not needing a tool.
    Plain,
    /// Tool-eligible, but the host advertised no tools.
    NoTools,
    /// Tool-eligible, but the model answered with the sentinel.
    Declined,
    /// The routing completion could not be interpreted.
    Unparseable,
    /// The tool call was rejected or failed.
    ToolFailed,
    /// A tool ran and its result was narrated.
    Tool,
}

/// The final text for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub route: Route,
    pub text: String,
}

impl Answer {
    fn new(route: Route, text: impl Into<String>) -> Self {
        Self {
            route,
            text: text.into(),
        }
    }
}

/// Ties classifier, prompts, model, and tool host together.
pub struct Orchestrator<B: Backend, H: ToolHost> {
    backend: B,
    session: Session<H>,
    classifier: QueryClassifier,
    prompts: PromptBuilder,
    model: String,
}

impl<B: Backend, H: ToolHost> Orchestrator<B, H> {
    pub fn new(backend: B, session: Session<H>, model: impl Into<String>) -> Self {
        Self {
            backend,
            session,
            classifier: QueryClassifier::default(),
            prompts: PromptBuilder::default(),
            model: model.into(),
        }
    }

    pub fn with_classifier(mut self, classifier: QueryClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_prompts(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn session(&self) -> &Session<H> {
        &self.session
    }

    /// Give the session back for teardown.
    pub fn into_session(self) -> Session<H> {
        self.session
    }

    /// Run one query through the state machine.
    ///
    /// Tool failures and unparseable completions come back as `Ok` answers.
    /// `Err` means the model host or the tool-host connection failed.
    pub async fn process_query(&mut self, query: &str) -> Result<Answer> {
        let classification = self.classifier.classify(query);
        debug!(needs_tool = classification.needs_tool, "classified query");

        if !classification.needs_tool {
            return self.plain_chat(query, Route::Plain).await;
        }

        let tools = self.session.discover().await?;
        if tools.is_empty() {
            info!("tool host advertises no tools, answering without them");
            return self.plain_chat(query, Route::NoTools).await;
        }

        let completion = self.complete(&self.prompts.routing(&tools, query)).await?;

        match parse(&completion) {
            Decision::NoToolNeeded => {
                info!("tool-eligible query declined by model");
                self.plain_chat(query, Route::Declined).await
            }
            Decision::Unparseable { reason } => {
                warn!(%reason, "could not interpret routing completion");
                Ok(Answer::new(Route::Unparseable, UNPARSEABLE_MESSAGE))
            }
            Decision::ToolCall(call) => self.execute_and_narrate(call).await,
        }
    }

    async fn plain_chat(&self, query: &str, route: Route) -> Result<Answer> {
        let text = self.complete(&self.prompts.plain(query)).await?;
        Ok(Answer::new(route, text))
    }

    async fn execute_and_narrate(&self, call: ToolCall) -> Result<Answer> {
        info!(tool = %call.name, "model requested tool");

        let result = match self.session.call(&call).await {
            Ok(result) => result,
            Err(ToolError::Connection(reason)) => return Err(Error::Connection(reason)),
            Err(e) => {
                warn!(tool = %call.name, "tool call failed: {e}");
                return Ok(Answer::new(
                    Route::ToolFailed,
                    format!("Tool `{}` failed: {e}", call.name),
                ));
            }
        };

        let narration = self.complete(&self.prompts.narration(&result)).await?;

        Ok(Answer::new(
            Route::Tool,
            format!(
                "Raw Data:\n{}\n\nAnalysis:\n{narration}",
                result.content
            ),
        ))
    }

    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let response = self
            .backend
            .chat(ModelRequest {
                model: &self.model,
                messages,
            })
            .await?;
        Ok(response.content)
    }

    /// Read queries line by line until `quit` (any case) or EOF.
    ///
    /// Per-query failures are written as an `Error:` line and the loop
    /// carries on.
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();

        loop {
            write!(output, "\nQuery: ")?;
            output.flush()?;

            let Some(line) = lines.next_line().await? else {
                debug!("input closed");
                break;
            };

            let query = line.trim();
            if query.is_empty() {
                continue;
            }
            if query.eq_ignore_ascii_case("quit") {
                break;
            }

            match self.process_query(query).await {
                Ok(answer) => {
                    debug!(route = ?answer.route, "query answered");
                    writeln!(output, "\n{}", answer.text)?;
                }
                Err(e) => {
                    warn!("query failed: {e}");
                    writeln!(output, "\nError: {e}")?;
                }
            }
        }

        Ok(())
    }
}
