//! Orchestration of one query
//!
//! `Host` seeds a new conversation with a forced tool call, then alternates
//! model calls and concurrent tool dispatch until the model answers without
//! requesting tools. Output goes to the two channels in `QuerySinks`.

mod config;
mod engine;
mod prompts;
mod query;

pub use config::HostConfig;
pub use engine::{Host, HostError, HostResult};
pub use prompts::SYSTEM_PROMPT;
pub use query::{QueryOutcome, QueryRequest, QuerySinks, QueryStatus};
