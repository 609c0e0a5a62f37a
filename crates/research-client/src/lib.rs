//! Qualitative research clients: the remote research backend, the direct
//! LLM alternative, and the process-scoped response cache that sits in
//! front of either.

pub mod backend;
pub mod cache;
pub mod error;
pub mod llm;

pub use backend::{BackendResearcher, ResearchConfig};
pub use cache::ResearchCache;
pub use error::{ResearchError, ResearchResult};
pub use llm::{LlmConfig, LlmResearcher};

use async_trait::async_trait;
use valuation_core::{ResearchRequest, ResearchResponse};

/// A source of qualitative criterion ratings.
#[async_trait]
pub trait Researcher: Send + Sync {
    async fn research(&self, request: &ResearchRequest) -> ResearchResult<ResearchResponse>;
}
