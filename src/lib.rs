//! # Maintenance Agent
//!
//! A retrieval-grounded troubleshooting assistant that may run one tool per question.
//!
//! This library provides:
//! - A bounded agent loop that answers directly or requests a single tool
//! - Per-conversation turn history shared safely across concurrent requests
//! - A classifier for `CALL_TOOL:` directives embedded in model replies
//! - An HTTP API for asking questions and ingesting reference documents
//!
//! ## Architecture
//!
//! Each question runs through a small state machine:
//! 1. Record the question and retrieve grounding context
//! 2. Prompt the model with history, context and the tool catalog
//! 3. Classify the reply; answer, or dispatch one tool and prompt again
//! 4. Stop after a fixed number of model invocations
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use maintenance_agent::{agent::Agent, config::Config, retrieval::InMemoryRetriever};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = Config::from_env()?;
//! let agent = Agent::from_config(&config, Arc::new(InMemoryRetriever::new()));
//! let answer = agent
//!     .ask(uuid::Uuid::new_v4(), "Pump P-101 is leaking at the seal", &CancellationToken::new())
//!     .await?;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod llm;
pub mod memory;
pub mod retrieval;
pub mod tools;

pub use config::Config;
