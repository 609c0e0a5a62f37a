use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical fundamentals record built from the provider payloads.
///
/// `eps`, `eps_growth`, `sales_growth` and `current_price` are required for
/// valuation; the normalizer fails instead of defaulting them. Growth rates
/// and ROE are percentage-valued (15.0 = 15%).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockData {
    pub symbol: String,
    pub company_name: String,
    pub current_price: f64,
    pub eps: f64,
    pub eps_growth: f64,
    pub sales_growth: f64,
    #[serde(default)]
    pub book_value_growth: Option<f64>,
    #[serde(default)]
    pub roe: Option<f64>,
    #[serde(default)]
    pub debt_to_equity: Option<f64>,
    #[serde(default)]
    pub current_ratio: Option<f64>,
    #[serde(default)]
    pub pe_ratio: Option<f64>,
    pub last_updated: DateTime<Utc>,
}

/// Trade signal from comparing the current price against the valuation.
///
/// `Sell` is part of the wire contract but `determine_signal` never emits it;
/// overvalued stocks stay at `Wait` pending a product decision on a sell
/// threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Wait,
    Sell,
}

impl Signal {
    pub fn to_label(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Wait => "WAIT",
            Signal::Sell => "SELL",
        }
    }
}

/// Valuation output, recomputed on every growth-rate override.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedMetrics {
    pub sticker_price: f64,
    pub mos_price: f64,
    pub signal: Signal,
    /// The growth rate actually used, user override or conservative default.
    pub custom_growth_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriterionCategory {
    Quantitative,
    Qualitative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RatingSource {
    FormulaDerived,
    ExternallyResearched,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// One entry of the 15-point Fisher checklist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FisherCriterion {
    pub id: u8,
    pub title: String,
    pub description: String,
    pub category: CriterionCategory,
    pub rating: Option<u8>,
    pub justification: String,
    pub data_source: RatingSource,
    pub confidence: Option<Confidence>,
    #[serde(default)]
    pub sources: Vec<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Completed checklist: exactly one criterion per id, ordered 1..=15.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FisherScorecard {
    pub symbol: String,
    pub company_name: String,
    /// Mean of the present ratings, 0.0 when none were rated.
    pub overall_score: f64,
    pub criteria: Vec<FisherCriterion>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// Request body for the qualitative research backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchRequest {
    pub symbol: String,
    pub company_name: String,
    pub criteria_to_research: Vec<u8>,
}

/// One researched rating as returned by the backend or the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionRating {
    pub criterion_id: u8,
    pub rating: u8,
    pub justification: String,
    #[serde(default)]
    pub key_findings: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    pub confidence: Confidence,
}

/// Research result for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchResponse {
    pub symbol: String,
    pub ratings: Vec<CriterionRating>,
    pub research_date: DateTime<Utc>,
    pub model_used: String,
}

/// Raw fundamentals payloads as fetched, one record per upstream endpoint.
/// Each is the already-unwrapped record object; interpretation is the
/// normalizer's job.
#[derive(Debug, Clone, Default)]
pub struct RawFundamentals {
    pub profile: Option<serde_json::Value>,
    pub metrics: Option<serde_json::Value>,
    pub ratios: Option<serde_json::Value>,
    pub growth: Option<serde_json::Value>,
}
