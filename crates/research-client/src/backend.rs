//! Client for the remote research backend, which runs multi-step web
//! research plus a local language model per criterion. Calls take minutes,
//! hence the long timeout; everything else about the contract is a plain
//! JSON RPC.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use valuation_core::{CriterionRating, ResearchRequest, ResearchResponse};

use crate::error::{ResearchError, ResearchResult};
use crate::Researcher;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
/// Model the backend runs when it does not say otherwise.
const DEFAULT_MODEL: &str = "ollama-llama3.2";
/// Research performs several web searches and an LLM pass per criterion.
const RESEARCH_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, Clone)]
pub struct ResearchConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("RESEARCH_BACKEND_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            timeout: RESEARCH_TIMEOUT,
        }
    }
}

/// Wire shape with every field optional; the backend has been loose about
/// which it includes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    symbol: Option<String>,
    #[serde(default)]
    ratings: Vec<CriterionRating>,
    research_date: Option<DateTime<Utc>>,
    model_used: Option<String>,
}

#[derive(Clone)]
pub struct BackendResearcher {
    client: Client,
    base_url: String,
}

impl BackendResearcher {
    pub fn new(config: ResearchConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: config.base_url,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ResearchConfig::default())
    }

    /// Liveness probe for the backend.
    pub async fn health(&self) -> ResearchResult<bool> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(response.status().is_success())
    }
}

#[async_trait]
impl Researcher for BackendResearcher {
    async fn research(&self, request: &ResearchRequest) -> ResearchResult<ResearchResponse> {
        tracing::info!(
            symbol = %request.symbol,
            criteria = request.criteria_to_research.len(),
            base_url = %self.base_url,
            "requesting qualitative research"
        );

        let response = self
            .client
            .post(format!("{}/fisher-research", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    ResearchError::ServiceUnreachable(self.base_url.clone())
                } else {
                    ResearchError::RequestFailed(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResearchError::Backend(backend_detail(status.as_u16(), &body)));
        }

        let wire: WireResponse = response.json().await?;
        tracing::info!(
            symbol = %request.symbol,
            ratings = wire.ratings.len(),
            "research complete"
        );

        Ok(ResearchResponse {
            symbol: wire.symbol.unwrap_or_else(|| request.symbol.clone()),
            ratings: wire.ratings,
            research_date: wire.research_date.unwrap_or_else(Utc::now),
            model_used: wire.model_used.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

/// Pull the remote error detail out of a failure body, falling back to the
/// bare status code.
fn backend_detail(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("detail")
                .and_then(Value::as_str)
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| format!("HTTP {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_detail_prefers_detail_field() {
        assert_eq!(
            backend_detail(500, r#"{"detail": "Ollama is not running"}"#),
            "Ollama is not running"
        );
        assert_eq!(backend_detail(502, "<html>bad gateway</html>"), "HTTP 502");
        assert_eq!(backend_detail(500, r#"{"other": 1}"#), "HTTP 500");
    }

    #[test]
    fn wire_response_tolerates_missing_fields() {
        let wire: WireResponse = serde_json::from_str(r#"{"ratings": []}"#).unwrap();
        assert!(wire.symbol.is_none());
        assert!(wire.model_used.is_none());

        let wire: WireResponse = serde_json::from_str(
            r#"{
                "symbol": "AAPL",
                "ratings": [{
                    "criterionId": 2,
                    "rating": 4,
                    "justification": "ok",
                    "confidence": "high"
                }],
                "modelUsed": "llama3.2"
            }"#,
        )
        .unwrap();
        assert_eq!(wire.ratings.len(), 1);
        assert_eq!(wire.ratings[0].criterion_id, 2);
        assert!(wire.ratings[0].key_findings.is_empty());
    }
}
