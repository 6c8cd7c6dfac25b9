//! Classification of raw model replies.
//!
//! A reply is either a final answer or a single tool-call directive of the form
//! `CALL_TOOL: {"name": "...", "args": {...}}`.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::tools::ToolArgs;

/// Literal marker that opens a tool-call directive. Matched case-insensitively.
pub const TOOL_CALL_MARKER: &str = "CALL_TOOL:";

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallRequest {
    pub name: String,
    pub args: ToolArgs,
}

/// What a single model reply asks the agent to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStepOutcome {
    FinalAnswer(String),
    ToolInvocation(ToolCallRequest),
}

/// A reply carried the tool-call marker but its payload was unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Bad tool call format: {reason}")]
pub struct ParseError {
    reason: String,
}

impl ParseError {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// The user-visible message for this error.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Strip surrounding code fences and a leading fence language tag.
pub fn normalize_reply(raw: &str) -> String {
    let trimmed = raw.trim();
    let unfenced_start = trimmed.trim_start_matches('`');
    let fenced = unfenced_start.len() != trimmed.len();

    let mut body = unfenced_start;
    if fenced {
        if let Some((first_line, rest)) = body.split_once('\n') {
            if is_language_tag(first_line.trim()) {
                body = rest;
            }
        }
    }

    body.trim_end().trim_end_matches('`').trim().to_string()
}

fn is_language_tag(line: &str) -> bool {
    !line.is_empty()
        && line
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+' | '.'))
}

/// Normalize and classify a raw reply.
///
/// # Errors
///
/// Returns `ParseError` when the reply starts with [`TOOL_CALL_MARKER`] but
/// the payload is not a JSON object with a string `name`.
pub fn classify_reply(raw: &str) -> Result<AgentStepOutcome, ParseError> {
    let text = normalize_reply(raw);

    match strip_marker(&text) {
        Some(payload) => parse_tool_call(payload).map(AgentStepOutcome::ToolInvocation),
        None => Ok(AgentStepOutcome::FinalAnswer(text)),
    }
}

fn strip_marker(text: &str) -> Option<&str> {
    let head = text.get(..TOOL_CALL_MARKER.len())?;
    if head.eq_ignore_ascii_case(TOOL_CALL_MARKER) {
        Some(&text[TOOL_CALL_MARKER.len()..])
    } else {
        None
    }
}

fn parse_tool_call(payload: &str) -> Result<ToolCallRequest, ParseError> {
    // Only the first JSON value is read; anything after it, including further
    // directives, is ignored.
    let mut values = serde_json::Deserializer::from_str(payload.trim()).into_iter::<Value>();
    let value = match values.next() {
        Some(Ok(value)) => value,
        Some(Err(e)) => return Err(ParseError::new(e.to_string())),
        None => return Err(ParseError::new("Missing JSON payload after CALL_TOOL")),
    };

    let Value::Object(object) = value else {
        return Err(ParseError::new("Tool call payload must be a JSON object."));
    };

    let name = object
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| ParseError::new("Missing 'name' string property."))?
        .to_string();

    let args = match object.get("args") {
        Some(Value::Object(args)) => coerce_args(args),
        _ => ToolArgs::new(),
    };

    Ok(ToolCallRequest { name, args })
}

fn coerce_args(args: &Map<String, Value>) -> ToolArgs {
    args.iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool_call(raw: &str) -> ToolCallRequest {
        match classify_reply(raw).expect("classify") {
            AgentStepOutcome::ToolInvocation(call) => call,
            other => panic!("expected tool invocation, got {other:?}"),
        }
    }

    #[test]
    fn fenced_directive_is_a_tool_invocation() {
        let raw = "```json\nCALL_TOOL: {\"name\":\"create_work_order\",\"args\":{\"equipmentId\":\"PUMP-1\"}}\n```";
        let call = tool_call(raw);
        assert_eq!(call.name, "create_work_order");
        assert_eq!(call.args.len(), 1);
        assert_eq!(call.args.get("equipmentId").map(String::as_str), Some("PUMP-1"));
    }

    #[test]
    fn marker_is_case_insensitive() {
        let call = tool_call("call_tool: {\"name\":\"create_work_order\"}");
        assert_eq!(call.name, "create_work_order");
        assert!(call.args.is_empty());
    }

    #[test]
    fn plain_text_is_a_final_answer() {
        let outcome = classify_reply("  Check the seal first.  ").expect("classify");
        assert_eq!(
            outcome,
            AgentStepOutcome::FinalAnswer("Check the seal first.".to_string())
        );
    }

    #[test]
    fn marker_not_at_start_is_a_final_answer() {
        let outcome = classify_reply("I could CALL_TOOL: {\"name\":\"x\"}").expect("classify");
        assert!(matches!(outcome, AgentStepOutcome::FinalAnswer(_)));
    }

    #[test]
    fn fenced_final_answer_loses_only_the_fence() {
        assert_eq!(normalize_reply("```text\nReplace the bearing.\n```"), "Replace the bearing.");
        assert_eq!(normalize_reply("```\nReplace the bearing.```"), "Replace the bearing.");
        assert_eq!(normalize_reply("Step 1: isolate.\nStep 2: drain."), "Step 1: isolate.\nStep 2: drain.");
    }

    #[test]
    fn non_string_args_are_coerced() {
        let call = tool_call(
            "CALL_TOOL: {\"name\":\"t\",\"args\":{\"count\":3,\"urgent\":true,\"note\":null,\"tags\":[\"a\"]}}",
        );
        assert_eq!(call.args["count"], "3");
        assert_eq!(call.args["urgent"], "true");
        assert_eq!(call.args["note"], "");
        assert_eq!(call.args["tags"], "[\"a\"]");
    }

    #[test]
    fn malformed_args_yield_empty_mapping() {
        let call = tool_call("CALL_TOOL: {\"name\":\"t\",\"args\":\"equipmentId=PUMP-1\"}");
        assert!(call.args.is_empty());
    }

    #[test]
    fn only_first_directive_is_read() {
        let call = tool_call(
            "CALL_TOOL: {\"name\":\"first\"}\nCALL_TOOL: {\"name\":\"second\"}",
        );
        assert_eq!(call.name, "first");
    }

    #[test]
    fn bad_json_is_a_parse_error() {
        let err = classify_reply("CALL_TOOL: {\"name\": ").unwrap_err();
        assert!(err.message().starts_with("Bad tool call format: "));
    }

    #[test]
    fn missing_name_is_a_parse_error() {
        let err = classify_reply("CALL_TOOL: {\"args\":{}}").unwrap_err();
        assert_eq!(err.message(), "Bad tool call format: Missing 'name' string property.");

        let err = classify_reply("CALL_TOOL: {\"name\": 42}").unwrap_err();
        assert_eq!(err.message(), "Bad tool call format: Missing 'name' string property.");
    }

    #[test]
    fn empty_or_non_object_payload_is_a_parse_error() {
        assert!(classify_reply("CALL_TOOL:").is_err());
        assert!(classify_reply("CALL_TOOL:   ").is_err());
        assert!(classify_reply("CALL_TOOL: [1, 2]").is_err());
    }

    #[test]
    fn multibyte_text_shorter_than_marker_does_not_panic() {
        let outcome = classify_reply("aéééééé").expect("classify");
        assert_eq!(outcome, AgentStepOutcome::FinalAnswer("aéééééé".to_string()));
    }
}
