//! Message construction for the three prompting modes.
//!
//! The routing prompt is the contract with the model: it names the sentinel
//! [`GENERAL_QUERY`] and the `{"name", "input"}` shape that
//! [`parse`](crate::parser::parse) expects back.

use serde_json::{Value, json};

use crate::model::Message;
use crate::tools::{ToolDescriptor, ToolResult};

/// Token the model answers with when no tool applies.
pub const GENERAL_QUERY: &str = "GENERAL_QUERY";

const PLAIN_SYSTEM: &str =
    "You are a helpful AI assistant. Provide informative and friendly responses.";

const NARRATION_SYSTEM: &str = "You are a helpful financial advisor. Analyze this stock data and \
provide insights about the stock prices, market trends, and notable changes. Be concise but \
informative.";

const NARRATION_PREFIX: &str = "Please analyze this stock market data and provide insights:";

/// Which prompt to build.
#[derive(Debug, Clone, Copy)]
pub enum PromptMode<'a> {
    Plain,
    Routing(&'a [ToolDescriptor]),
    Narration(&'a ToolResult),
}

/// A one-shot invocation shown to the model for a given tool.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExample {
    pub label: String,
    pub tool: String,
    pub input: Value,
}

impl CallExample {
    pub fn new(label: impl Into<String>, tool: impl Into<String>, input: Value) -> Self {
        Self {
            label: label.into(),
            tool: tool.into(),
            input,
        }
    }

    fn render(&self) -> String {
        format!(
            "For {}: {{\"name\": \"{}\", \"input\": {}}}",
            self.label, self.tool, self.input
        )
    }
}

/// Builds message sequences; deterministic for equal inputs.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    examples: Vec<CallExample>,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(vec![
            CallExample::new(
                "single stock",
                "get_stock_price",
                json!({ "symbol": "AAPL" }),
            ),
            CallExample::new(
                "multiple stocks",
                "get_multiple_stocks",
                json!({ "symbols": "AAPL,MSFT,GOOGL" }),
            ),
        ])
    }
}

impl PromptBuilder {
    pub fn new(examples: Vec<CallExample>) -> Self {
        Self { examples }
    }

    /// Build `[system, user]` for the given mode.
    pub fn build(&self, mode: PromptMode<'_>, query: &str) -> Vec<Message> {
        match mode {
            PromptMode::Plain => self.plain(query),
            PromptMode::Routing(tools) => self.routing(tools, query),
            PromptMode::Narration(result) => self.narration(result),
        }
    }

    pub fn plain(&self, query: &str) -> Vec<Message> {
        vec![Message::system(PLAIN_SYSTEM), Message::user(query)]
    }

    pub fn routing(&self, tools: &[ToolDescriptor], query: &str) -> Vec<Message> {
        vec![
            Message::system(self.routing_system(tools)),
            Message::user(query),
        ]
    }

    pub fn narration(&self, result: &ToolResult) -> Vec<Message> {
        vec![
            Message::system(NARRATION_SYSTEM),
            Message::user(format!("{NARRATION_PREFIX}\n{}", result.content)),
        ]
    }

    fn routing_system(&self, tools: &[ToolDescriptor]) -> String {
        let catalogue = tools
            .iter()
            .map(|tool| {
                format!(
                    "Tool: {}\nDescription: {}\nSchema: {}",
                    tool.name, tool.description, tool.input_schema
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        // Only show call shapes the host actually offers
        let examples = self
            .examples
            .iter()
            .filter(|example| tools.iter().any(|tool| tool.name == example.tool))
            .map(CallExample::render)
            .collect::<Vec<_>>();

        let mut prompt = format!(
            "You are a helpful AI assistant with access to stock market tools. \
             Here are the available tools:\n\n{catalogue}\n\n\
             To use a tool, respond with a JSON object in this exact format: \
             {{\"name\": \"<tool name>\", \"input\": {{...}}}}\n"
        );
        for example in &examples {
            prompt.push_str(example);
            prompt.push('\n');
        }
        prompt.push_str(&format!(
            "\nIf the user's query is about stocks, respond with the appropriate JSON object \
             and nothing else.\n\
             If the query isn't specifically asking for stock data, respond with \
             \"{GENERAL_QUERY}\" instead.\n\
             Always use uppercase for stock symbols."
        ));
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;

    fn stock_tools() -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor {
                name: "get_stock_price".into(),
                description: "Get current stock price and basic information.".into(),
                input_schema: json!({
                    "type": "object",
                    "properties": {"symbol": {"type": "string"}},
                    "required": ["symbol"]
                }),
            },
            ToolDescriptor {
                name: "get_multiple_stocks".into(),
                description: "Get current prices for multiple stocks.".into(),
                input_schema: json!({
                    "type": "object",
                    "properties": {"symbols": {"type": "string"}},
                    "required": ["symbols"]
                }),
            },
        ]
    }

    #[test]
    fn plain_is_system_then_user() {
        let messages = PromptBuilder::default().build(PromptMode::Plain, "hello");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("helpful AI assistant"));
        assert_eq!(messages[1], Message::user("hello"));
    }

    #[test]
    fn routing_lists_catalogue_examples_and_sentinel() {
        let tools = stock_tools();
        let messages =
            PromptBuilder::default().build(PromptMode::Routing(&tools), "What's AAPL trading at?");
        let system = &messages[0].content;

        assert_eq!(messages[0].role, Role::System);
        assert!(system.contains("Tool: get_stock_price"));
        assert!(system.contains("Description: Get current prices for multiple stocks."));
        assert!(system.contains(r#""required":["symbol"]"#));
        assert!(system.contains(r#"For single stock: {"name": "get_stock_price", "input": {"symbol":"AAPL"}}"#));
        assert!(system.contains(r#"For multiple stocks: {"name": "get_multiple_stocks", "input": {"symbols":"AAPL,MSFT,GOOGL"}}"#));
        assert!(system.contains("\"GENERAL_QUERY\""));
        assert_eq!(messages[1], Message::user("What's AAPL trading at?"));
    }

    #[test]
    fn routing_skips_examples_for_missing_tools() {
        let tools = vec![stock_tools().remove(0)];
        let messages = PromptBuilder::default().routing(&tools, "AAPL?");
        assert!(messages[0].content.contains("For single stock"));
        assert!(!messages[0].content.contains("For multiple stocks"));
    }

    #[test]
    fn narration_embeds_raw_result() {
        let result = ToolResult::new("Symbol: AAPL\nCurrent Price: $190.00");
        let messages = PromptBuilder::default().build(PromptMode::Narration(&result), "ignored");
        assert!(messages[0].content.contains("financial advisor"));
        assert_eq!(
            messages[1].content,
            "Please analyze this stock market data and provide insights:\nSymbol: AAPL\nCurrent Price: $190.00"
        );
    }

    #[test]
    fn building_is_deterministic() {
        let tools = stock_tools();
        let builder = PromptBuilder::default();
        assert_eq!(builder.routing(&tools, "AAPL"), builder.routing(&tools, "AAPL"));
    }
}
