//! Agent module - the bounded question-answering loop.
//!
//! Each request follows the same shape:
//! 1. Record the question and retrieve grounding context
//! 2. Prompt the model with history, context, question and tool catalog
//! 3. Classify the reply as a final answer or a tool-call directive
//! 4. Run at most one tool, feed its result back, and repeat until an answer
//!    is produced or the step budget is spent

mod agent_loop;
mod prompt;
mod reply;

pub use agent_loop::{Agent, AgentError, DEFAULT_RETRIEVAL_AMOUNT, FALLBACK_ANSWER, MAX_STEPS};
pub use prompt::{build_system_prompt, TOOL_ALREADY_EXECUTED};
pub use reply::{classify_reply, normalize_reply, AgentStepOutcome, ParseError, ToolCallRequest, TOOL_CALL_MARKER};
