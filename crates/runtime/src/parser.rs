//! Interpretation of a routing-mode completion.

use serde_json::Value;

use crate::prompt::GENERAL_QUERY;
use crate::tools::ToolCall;

/// What the model asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The model answered with the sentinel.
    NoToolNeeded,
    /// The model emitted a well-formed tool invocation.
    ToolCall(ToolCall),
    /// Anything else. Expected from time to time; not an error.
    Unparseable { reason: String },
}

/// Parse a completion into a [`Decision`].
///
/// The sentinel check runs first, on trimmed text. A single surrounding
/// Markdown code fence is tolerated around the JSON object.
pub fn parse(completion: &str) -> Decision {
    let text = completion.trim();
    if text == GENERAL_QUERY {
        return Decision::NoToolNeeded;
    }

    let value: Value = match serde_json::from_str(strip_code_fence(text)) {
        Ok(value) => value,
        Err(e) => {
            return Decision::Unparseable {
                reason: format!("not JSON: {e}"),
            };
        }
    };

    let Value::Object(mut object) = value else {
        return Decision::Unparseable {
            reason: "expected a JSON object".into(),
        };
    };

    let name = match object.remove("name") {
        Some(Value::String(name)) if !name.is_empty() => name,
        _ => {
            return Decision::Unparseable {
                reason: "missing string field `name`".into(),
            };
        }
    };

    match object.remove("input") {
        Some(Value::Object(input)) => Decision::ToolCall(ToolCall { name, input }),
        _ => Decision::Unparseable {
            reason: "missing object field `input`".into(),
        },
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return text;
    };
    // Drop an info string such as `json` on the opening fence line
    match body.split_once('\n') {
        Some((info, code)) if !info.trim_start().starts_with('{') => code.trim(),
        _ => body.trim(),
    }
}
