//! Core agent loop implementation.

use std::sync::Arc;

use futures::StreamExt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::llm::{retain_last_non_blank, LanguageModel, OpenAiClient};
use crate::memory::{ConversationId, ConversationStore};
use crate::retrieval::{join_snippets, Retriever};
use crate::tools::{DispatchError, ToolRegistry};

use super::prompt::{
    build_corrective_prompt, build_rag_prompt, build_system_prompt, build_tool_result_prompt,
    compose,
};
use super::reply::{classify_reply, AgentStepOutcome};

/// Hard limit on model invocations per request.
pub const MAX_STEPS: usize = 4;

/// Answer recorded when the step budget runs out.
pub const FALLBACK_ANSWER: &str = "I couldn't complete the request.";

/// Default number of context snippets retrieved per question.
pub const DEFAULT_RETRIEVAL_AMOUNT: usize = 5;

/// Infrastructure failures that abort a request.
///
/// Classification and dispatch problems never surface here; they become
/// user-visible answers instead.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Request cancelled")]
    Cancelled,

    #[error("Context retrieval failed: {0}")]
    Retrieval(#[source] anyhow::Error),

    #[error("Model invocation failed: {0}")]
    Model(#[source] anyhow::Error),

    #[error(transparent)]
    Tool(DispatchError),
}

/// The troubleshooting agent.
pub struct Agent {
    model: Arc<dyn LanguageModel>,
    retriever: Arc<dyn Retriever>,
    tools: ToolRegistry,
    memory: Arc<ConversationStore>,
    retrieval_amount: usize,
}

impl Agent {
    /// Create an agent from explicit collaborators.
    pub fn new(
        model: Arc<dyn LanguageModel>,
        retriever: Arc<dyn Retriever>,
        tools: ToolRegistry,
        memory: Arc<ConversationStore>,
    ) -> Self {
        Self {
            model,
            retriever,
            tools,
            memory,
            retrieval_amount: DEFAULT_RETRIEVAL_AMOUNT,
        }
    }

    /// Create an agent backed by the configured OpenAI-compatible model and the built-in tools.
    pub fn from_config(config: &Config, retriever: Arc<dyn Retriever>) -> Self {
        let model = Arc::new(OpenAiClient::new(
            config.api_key.clone(),
            config.base_url.clone(),
            config.default_model.clone(),
        ));
        let memory = Arc::new(ConversationStore::new(config.max_turns));

        Self::new(model, retriever, ToolRegistry::new(), memory)
            .with_retrieval_amount(config.retrieval_amount)
    }

    pub fn with_retrieval_amount(mut self, amount: usize) -> Self {
        self.retrieval_amount = amount;
        self
    }

    pub fn memory(&self) -> &Arc<ConversationStore> {
        &self.memory
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Answer a question within a conversation.
    ///
    /// Runs at most [`MAX_STEPS`] model invocations and at most one tool.
    /// The returned answer is also recorded as the conversation's latest
    /// assistant turn. On error no assistant turn is recorded.
    pub async fn ask(
        &self,
        conversation_id: ConversationId,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        tracing::info!(%conversation_id, "Handling question");
        self.memory.add_user(conversation_id, question);

        let context = self.retrieve_context(question, cancel).await?;
        let system_prompt = build_system_prompt(&self.tools.catalog());
        let mut prompt = build_rag_prompt(
            &self.memory.render_history(conversation_id),
            &context,
            question,
        );

        let mut tool_executed = false;
        let mut tool_result_prompt = String::new();

        for step in 0..MAX_STEPS {
            tracing::debug!(%conversation_id, step = step + 1, "Agent step");

            let reply = self
                .generate_reply(&compose(&system_prompt, &prompt), cancel)
                .await?;

            let call = match classify_reply(&reply) {
                Ok(AgentStepOutcome::FinalAnswer(answer)) if answer.is_empty() => {
                    tracing::warn!(%conversation_id, step = step + 1, "Model returned an empty reply");
                    continue;
                }
                Ok(AgentStepOutcome::FinalAnswer(answer)) => {
                    return Ok(self.complete(conversation_id, answer));
                }
                Ok(AgentStepOutcome::ToolInvocation(call)) => call,
                Err(e) => {
                    tracing::warn!(%conversation_id, error = %e, "Malformed tool call");
                    return Ok(self.complete(conversation_id, e.message()));
                }
            };

            if tool_executed {
                tracing::warn!(
                    %conversation_id,
                    tool = %call.name,
                    "Model requested a second tool call; asking for a final answer"
                );
                prompt = build_corrective_prompt(&tool_result_prompt);
                continue;
            }

            let result = match self.tools.dispatch(&call.name, &call.args, cancel).await {
                Ok(result) => result,
                Err(DispatchError::UnknownTool(name)) => {
                    tracing::warn!(%conversation_id, tool = %name, "Model requested an unknown tool");
                    return Ok(self.complete(conversation_id, format!("Unknown tool: {}", name)));
                }
                Err(_) if cancel.is_cancelled() => return Err(AgentError::Cancelled),
                Err(e) => return Err(AgentError::Tool(e)),
            };
            tool_executed = true;

            tool_result_prompt = build_tool_result_prompt(
                &self.memory.render_history(conversation_id),
                &context,
                &call.name,
                &result,
                question,
            );
            prompt = tool_result_prompt.clone();
        }

        tracing::warn!(%conversation_id, "Step budget exhausted without a final answer");
        Ok(self.complete(conversation_id, FALLBACK_ANSWER))
    }

    async fn retrieve_context(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        let snippets = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AgentError::Cancelled),
            snippets = self.retriever.retrieve_similar(question, self.retrieval_amount, cancel) => {
                snippets.map_err(AgentError::Retrieval)?
            }
        };
        tracing::debug!(snippets = snippets.len(), "Retrieved context");
        Ok(join_snippets(&snippets))
    }

    /// Invoke the model and keep the last non-blank chunk of its reply.
    async fn generate_reply(
        &self,
        full_prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        let mut stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AgentError::Cancelled),
            stream = self.model.generate(full_prompt, cancel) => stream.map_err(AgentError::Model)?,
        };

        let mut reply = None;
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AgentError::Cancelled),
                next = stream.next() => next,
            };
            match next {
                Some(chunk) => reply = retain_last_non_blank(reply, chunk.map_err(AgentError::Model)?),
                None => break,
            }
        }

        Ok(reply.map(|r| r.trim().to_string()).unwrap_or_default())
    }

    fn complete(&self, conversation_id: ConversationId, answer: impl Into<String>) -> String {
        let answer = answer.into();
        self.memory.add_assistant(conversation_id, answer.clone());
        answer
    }
}
