//! Prompt templates for the troubleshooting agent.

use crate::tools::ToolResult;

/// Instruction injected when the model asks for a second tool in one request.
pub const TOOL_ALREADY_EXECUTED: &str =
    "A tool was already executed. Provide the final answer without calling tools.";

/// Build the system prompt with the tool catalog.
pub fn build_system_prompt(tool_catalog: &str) -> String {
    format!(
        r#"You are a maintenance troubleshooting assistant for an industrial plant.
You must be accurate, concise, and safe-first. You have access to TOOLS.

TOOLS CATALOG:
{tool_catalog}

After a tool returns, produce the final answer. Do NOT call the same tool again for the same request.

When helpful, you may CALL_TOOL with a single JSON object like:
CALL_TOOL: {{"name":"create_work_order","args":{{"equipmentId":"PUMP-ALPHA","summary":"Seal leak","priority":"High"}}}}

If you can answer from CONTEXT and HISTORY, do so. If not, consider a tool.
If information is missing, ask a brief follow-up question.
Never fabricate."#
    )
}

/// Build the first prompt of a request.
pub fn build_rag_prompt(history: &str, context: &str, question: &str) -> String {
    format!(
        r#"HISTORY:
{history}

CONTEXT:
{context}

USER QUESTION:
{question}

If a tool is required, respond only with a single line starting with `CALL_TOOL:` and a compact JSON.
Otherwise, answer directly (concise)."#
    )
}

/// Build the prompt that feeds a tool result back to the model.
pub fn build_tool_result_prompt(
    history: &str,
    context: &str,
    tool_name: &str,
    result: &ToolResult,
    question: &str,
) -> String {
    format!(
        r#"HISTORY:
{history}

CONTEXT:
{context}

TOOL RESULT ({tool_name}):
{result}

USER QUESTION:
{question}

Using the TOOL RESULT above, provide the FINAL ANSWER now.
Do NOT call any tool again. Be concise and accurate."#
    )
}

/// Follow a tool-result prompt with the no-more-tools instruction.
pub fn build_corrective_prompt(tool_result_prompt: &str) -> String {
    format!("{tool_result_prompt}\n\n{TOOL_ALREADY_EXECUTED}")
}

/// Combine the system prompt and a step prompt into the text sent to the model.
pub fn compose(system_prompt: &str, prompt: &str) -> String {
    format!("{system_prompt}\n\n{prompt}")
}
