//! Client for the secondary/legacy quote provider (StockData.org style:
//! token-authenticated REST). The provider has shipped several endpoint
//! layouts; candidate paths are probed in order until one returns a payload
//! without an error marker. Used as the quote fallback when the primary
//! provider fails.

use async_trait::async_trait;
use fundamentals_normalizer::shape::first_record;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use valuation_core::{QuoteProvider, ValuationError};

const BASE_URL: &str = "https://api.stockdata.org/v1";
const PROVIDER: &str = "StockData.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const RATE_LIMIT_GUIDANCE: &str =
    "The free tier allows 100 requests/day. Wait a few minutes or try again tomorrow.";

/// Candidate endpoints, in probe order. Parameter names have churned along
/// with the paths, so each candidate carries its own symbol/token keys.
const ENDPOINTS: &[Endpoint] = &[
    Endpoint { path: "/data/quote", symbol_param: "symbols", token_param: "api_token" },
    Endpoint { path: "/quote", symbol_param: "symbol", token_param: "api_token" },
    Endpoint { path: "/data/realtime", symbol_param: "symbols", token_param: "api_token" },
    Endpoint { path: "/data/quote", symbol_param: "symbol", token_param: "api_key" },
];

struct Endpoint {
    path: &'static str,
    symbol_param: &'static str,
    token_param: &'static str,
}

#[derive(Clone)]
pub struct StockDataClient {
    api_token: String,
    base_url: String,
    client: Client,
}

impl StockDataClient {
    pub fn new(api_token: String) -> Self {
        Self::with_base_url(api_token, BASE_URL.to_string())
    }

    pub fn with_base_url(api_token: String, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_token,
            base_url,
            client,
        }
    }
}

#[async_trait]
impl QuoteProvider for StockDataClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<Value, ValuationError> {
        let mut last_error: Option<ValuationError> = None;
        let mut last_body: Option<Value> = None;

        for endpoint in ENDPOINTS {
            let url = format!("{}{}", self.base_url, endpoint.path);
            let query = [
                (endpoint.symbol_param, symbol),
                (endpoint.token_param, self.api_token.as_str()),
            ];

            let response = match self
                .client
                .get(&url)
                .header("Accept", "application/json")
                .query(&query)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!(path = endpoint.path, error = %e, "endpoint failed, trying next");
                    last_error = Some(transport_error(e));
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                tracing::debug!(path = endpoint.path, %status, "endpoint rejected, trying next");
                last_error = Some(status_error(status.as_u16(), symbol));
                continue;
            }

            let body: Value = match response.json().await {
                Ok(b) => b,
                Err(e) => {
                    last_error = Some(ValuationError::Provider(format!(
                        "{PROVIDER} returned malformed JSON: {e}"
                    )));
                    continue;
                }
            };

            if let Some(message) = error_marker(&body) {
                tracing::debug!(path = endpoint.path, message, "error payload, trying next");
                last_body = Some(body);
                continue;
            }

            tracing::debug!(path = endpoint.path, "endpoint succeeded");
            return first_record(&body)
                .cloned()
                .ok_or_else(|| ValuationError::SymbolNotFound {
                    symbol: symbol.to_string(),
                    provider: PROVIDER,
                });
        }

        // Every candidate failed; classify whatever we saw last.
        if let Some(body) = last_body {
            let message = error_marker(&body).unwrap_or_default();
            if message.to_lowercase().contains("limit") {
                return Err(ValuationError::RateLimited {
                    provider: PROVIDER,
                    guidance: RATE_LIMIT_GUIDANCE.to_string(),
                });
            }
            return Err(ValuationError::Provider(format!(
                "{PROVIDER} API error: {message}"
            )));
        }
        Err(last_error.unwrap_or_else(|| {
            ValuationError::Network(format!(
                "Unable to connect to {PROVIDER}. Please check your API token and try again."
            ))
        }))
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

/// Extract the provider's in-band error message, if the payload carries one
/// (`error` field or `status: "error"`).
fn error_marker(body: &Value) -> Option<String> {
    let is_error = !body.get("error").map_or(true, Value::is_null)
        || body.get("status").and_then(Value::as_str) == Some("error");
    if !is_error {
        return None;
    }
    let message = ["message", "error"]
        .iter()
        .find_map(|k| body.get(*k).and_then(Value::as_str))
        .unwrap_or("Unknown error");
    Some(message.to_string())
}

fn transport_error(err: reqwest::Error) -> ValuationError {
    if err.is_timeout() {
        ValuationError::Network(format!("{PROVIDER} request timed out."))
    } else {
        ValuationError::Network(format!("{PROVIDER} request failed: {err}"))
    }
}

fn status_error(status: u16, symbol: &str) -> ValuationError {
    match status {
        401 | 403 => ValuationError::AuthFailure {
            provider: PROVIDER,
            detail: "invalid API token".to_string(),
        },
        404 => ValuationError::SymbolNotFound {
            symbol: symbol.to_string(),
            provider: PROVIDER,
        },
        429 => ValuationError::RateLimited {
            provider: PROVIDER,
            guidance: RATE_LIMIT_GUIDANCE.to_string(),
        },
        _ => ValuationError::Provider(format!("{PROVIDER} HTTP {status}")),
    }
}
