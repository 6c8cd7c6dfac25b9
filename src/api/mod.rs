//! HTTP API for asking questions and ingesting documents.
//!
//! ## Endpoints
//!
//! - `POST /:conversation_id/ask` - Answer a question within a conversation
//! - `POST /api/ask/ingest` - Replace the retrieval collection with a document
//! - `GET /api/tools` - List the tools the agent may call
//! - `GET /api/health` - Health check

mod routes;
pub mod types;

pub use routes::{router, serve, AppState};
