//! Direct-LLM researcher: an OpenAI-compatible chat-completions call that
//! asks the model to rate the unresolved criteria and return strict JSON.
//! Works against local deployments (LM Studio, llama.cpp, vLLM) as well as
//! hosted endpoints; the timeout is sized for local models.
//!
//! Models wrap JSON in markdown fences and sometimes return junk; fences
//! are stripped before parsing, and a parse failure yields neutral 3/5
//! ratings at low confidence for every requested criterion rather than
//! failing the whole scorecard.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use valuation_core::{Confidence, CriterionRating, ResearchRequest, ResearchResponse};

use crate::error::{ResearchError, ResearchResult};
use crate::Researcher;

const DEFAULT_API_BASE: &str = "http://localhost:1234/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
/// Local models need generous time for a 13-criterion analysis.
const LLM_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_base: String,
    pub model: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: std::env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_else(|_| "not-needed".to_string()),
            timeout: LLM_TIMEOUT,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ParsedRatings {
    ratings: Vec<CriterionRating>,
}

#[derive(Clone)]
pub struct LlmResearcher {
    client: Client,
    config: LlmConfig,
}

impl LlmResearcher {
    pub fn new(config: LlmConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, config }
    }

    pub fn with_defaults() -> Self {
        Self::new(LlmConfig::default())
    }
}

#[async_trait]
impl Researcher for LlmResearcher {
    async fn research(&self, request: &ResearchRequest) -> ResearchResult<ResearchResponse> {
        let prompt = build_research_prompt(request);
        tracing::info!(
            symbol = %request.symbol,
            model = %self.config.model,
            "sending research prompt to LLM"
        );

        let body = json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0.2,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    ResearchError::ServiceUnreachable(self.config.api_base.clone())
                } else {
                    ResearchError::RequestFailed(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResearchError::Backend(format!("HTTP {status}: {body}")));
        }

        let completion: Value = response.json().await?;
        let text = completion["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                ResearchError::InvalidResponse("completion carried no message content".to_string())
            })?;

        Ok(ResearchResponse {
            symbol: request.symbol.clone(),
            ratings: parse_ratings(text, &request.criteria_to_research),
            research_date: Utc::now(),
            model_used: self.config.model.clone(),
        })
    }
}

/// Build the research prompt: every unresolved criterion with its question
/// and research directions, plus a strict-JSON output contract.
pub fn build_research_prompt(request: &ResearchRequest) -> String {
    let criteria_prompts: Vec<String> = request
        .criteria_to_research
        .iter()
        .filter_map(|id| fisher_scorecard::template_for(*id))
        .enumerate()
        .map(|(index, criterion)| {
            format!(
                "\n{}. **{}** (ID: {})\n   Question: {}\n\n   Research Requirements:\n   {}\n\n   Provide:\n   - Rating: 1-5 (1=Poor, 2=Below Average, 3=Average, 4=Good, 5=Excellent)\n   - Justification: 2-3 sentences explaining the rating\n   - Key Findings: 2-4 bullet points with specific data/facts\n   - Sources: List of information sources (URLs, reports, etc.)\n   - Confidence: high/medium/low based on data availability\n",
                index + 1,
                criterion.title,
                criterion.id,
                criterion.description,
                fisher_scorecard::research_guidance(criterion.id),
            )
        })
        .collect();

    format!(
        r#"You are a professional investment analyst researching {company} ({symbol}) using Philip Fisher's "Scuttlebutt" methodology.

Please research the following investment criteria and provide STRUCTURED, DATA-DRIVEN analysis:

{criteria}

IMPORTANT INSTRUCTIONS:
1. Use recent information (last 2-3 years preferred)
2. Compare against industry peers when possible
3. Be objective - acknowledge both strengths and weaknesses
4. Cite specific data points, numbers, and facts
5. If information is limited, state this clearly and lower confidence

OUTPUT FORMAT (JSON):
Return ONLY valid JSON in this exact structure:
{{
  "ratings": [
    {{
      "criterionId": 2,
      "rating": 4,
      "justification": "Management shows strong determination...",
      "keyFindings": ["CEO has 10+ years tenure", "Launched 3 new product lines in 2 years"],
      "sources": ["2024 Annual Report", "Q3 2024 Earnings Call"],
      "confidence": "high"
    }}
  ]
}}

Research {company} ({symbol}) NOW and return the JSON."#,
        company = request.company_name,
        symbol = request.symbol,
        criteria = criteria_prompts.join("\n---\n"),
    )
}

/// Drop markdown code-fence lines so the payload parses whether or not the
/// model wrapped it.
fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.contains("```") {
        return trimmed.to_string();
    }
    trimmed
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse the model's JSON; on any failure return neutral placeholder
/// ratings so the scorecard still completes.
fn parse_ratings(text: &str, requested: &[u8]) -> Vec<CriterionRating> {
    let cleaned = strip_code_fences(text);
    match serde_json::from_str::<ParsedRatings>(&cleaned) {
        Ok(parsed) => parsed.ratings,
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse LLM research response; using neutral ratings");
            neutral_ratings(requested)
        }
    }
}

fn neutral_ratings(requested: &[u8]) -> Vec<CriterionRating> {
    requested
        .iter()
        .map(|id| CriterionRating {
            criterion_id: *id,
            rating: 3,
            justification:
                "Unable to complete research. Please try again or research manually.".to_string(),
            key_findings: vec!["Research failed - data unavailable".to_string()],
            sources: Vec::new(),
            confidence: Confidence::Low,
        })
        .collect()
}
