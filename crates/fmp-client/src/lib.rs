//! Client for the primary quote/fundamentals provider (Financial Modeling
//! Prep `/stable/` REST API, query-parameter authenticated).
//!
//! The quote endpoint fails loudly with the full error taxonomy. The
//! fundamentals endpoints degrade individually to `None` payloads — whether
//! the required fields can still be assembled is the normalizer's call. The
//! growth endpoint sits behind a paywall on some plans (HTTP 402), in which
//! case growth is recomputed from the two most recent annual income
//! statements.

use async_trait::async_trait;
use fundamentals_normalizer::fields::as_f64_lenient;
use fundamentals_normalizer::shape::first_record;
use reqwest::{Client, StatusCode};
use serde_json::{json, Map, Value};
use std::time::Duration;
use valuation_core::{FundamentalsProvider, QuoteProvider, RawFundamentals, ValuationError};

const BASE_URL: &str = "https://financialmodelingprep.com/stable";
const PROVIDER: &str = "FMP";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const RATE_LIMIT_GUIDANCE: &str =
    "The free tier allows 250 calls/day. Wait a few minutes or try again tomorrow.";

#[derive(Clone)]
pub struct FmpClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl FmpClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            base_url,
            client,
        }
    }

    async fn get_json(
        &self,
        path: &str,
        symbol: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, ValuationError> {
        let url = format!("{}{}", self.base_url, path);
        let mut query = vec![("symbol", symbol), ("apikey", self.api_key.as_str())];
        query.extend_from_slice(params);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(&query)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body, symbol));
        }

        response
            .json()
            .await
            .map_err(|e| ValuationError::Provider(format!("FMP returned malformed JSON: {e}")))
    }

    /// Fetch one endpoint and unwrap its record, logging and swallowing any
    /// failure. Used for the endpoints that are allowed to degrade.
    async fn try_record(&self, path: &str, symbol: &str, what: &str) -> Option<Value> {
        match self.get_json(path, symbol, &[]).await {
            Ok(body) => {
                let record = first_record(&body).cloned();
                if record.is_some() {
                    tracing::debug!(symbol, "FMP {what} data fetched");
                } else {
                    tracing::warn!(symbol, "FMP {what} endpoint returned no record");
                }
                record
            }
            Err(e) => {
                tracing::warn!(symbol, error = %e, "FMP {what} endpoint failed");
                None
            }
        }
    }

    async fn fetch_growth(&self, symbol: &str) -> Option<Value> {
        let growth = match self
            .get_json("/income-statement-growth", symbol, &[("limit", "10")])
            .await
        {
            Ok(body) => select_annual_growth(&body),
            Err(e) => {
                tracing::warn!(symbol, error = %e, "FMP income-statement-growth endpoint failed");
                None
            }
        };

        if !needs_growth_calculation(growth.as_ref()) {
            tracing::debug!(symbol, "FMP growth data available from growth endpoint");
            return growth;
        }

        tracing::info!(
            symbol,
            "FMP growth endpoint unavailable or incomplete; calculating from income statements"
        );
        match self
            .get_json("/income-statement", symbol, &[("limit", "5")])
            .await
        {
            Ok(body) => match body.as_array() {
                Some(statements) if statements.len() >= 2 => {
                    growth_from_statements(statements, growth)
                }
                _ => {
                    tracing::warn!(symbol, "not enough income statements to calculate growth");
                    growth
                }
            },
            Err(e) => {
                tracing::warn!(symbol, error = %e, "FMP income-statement endpoint failed");
                growth
            }
        }
    }
}

#[async_trait]
impl QuoteProvider for FmpClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<Value, ValuationError> {
        let body = self.get_json("/quote", symbol, &[]).await?;
        first_record(&body)
            .cloned()
            .ok_or_else(|| ValuationError::SymbolNotFound {
                symbol: symbol.to_string(),
                provider: PROVIDER,
            })
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

#[async_trait]
impl FundamentalsProvider for FmpClient {
    async fn fetch_fundamentals(&self, symbol: &str) -> Result<RawFundamentals, ValuationError> {
        let metrics = self.try_record("/key-metrics-ttm", symbol, "key metrics TTM").await;
        let ratios = self.try_record("/ratios-ttm", symbol, "ratios TTM").await;
        let growth = self.fetch_growth(symbol).await;

        // Profile is only worth a call when key-metrics came back unusable.
        let metrics_lacks_basics = metrics.as_ref().map_or(true, |m| {
            let absent = |key: &str| m.get(key).map_or(true, Value::is_null);
            absent("eps") && absent("peRatio")
        });
        let profile = if metrics_lacks_basics {
            self.try_record("/profile", symbol, "profile").await
        } else {
            None
        };

        Ok(RawFundamentals {
            profile,
            metrics,
            ratios,
            growth,
        })
    }
}

/// Pick the annual period out of the growth endpoint's response: first entry
/// whose date lands on a fiscal-year close, else the first entry.
fn select_annual_growth(body: &Value) -> Option<Value> {
    if let Some(periods) = body.as_array() {
        return periods
            .iter()
            .find(|p| is_annual_growth_period(p))
            .or_else(|| periods.first())
            .filter(|v| v.is_object())
            .cloned();
    }
    first_record(body).cloned()
}

fn is_annual_growth_period(period: &Value) -> bool {
    let date = period.get("date").and_then(Value::as_str).unwrap_or("");
    date.contains("12-31")
        || date.contains("01-31")
        || period.get("period").and_then(Value::as_str) == Some("FY")
}

fn needs_growth_calculation(growth: Option<&Value>) -> bool {
    let Some(growth) = growth else { return true };
    let missing = |key: &str| growth.get(key).map(Value::is_null).unwrap_or(true);
    missing("growthEPS") || missing("growthRevenue")
}

fn is_annual_statement(statement: &Value) -> bool {
    let date = statement.get("date").and_then(Value::as_str).unwrap_or("");
    statement.get("period").and_then(Value::as_str) == Some("FY")
        || date.contains("12-31")
        || date.contains("01-31")
        || date.contains("-12-")
        || date.contains("-01-")
}

fn statement_eps(statement: &Value) -> Option<f64> {
    for key in ["eps", "earningsPerShare", "netIncomePerShare"] {
        if let Some(v) = statement.get(key).and_then(as_f64_lenient) {
            return Some(v);
        }
    }
    let net_income = statement.get("netIncome").and_then(as_f64_lenient)?;
    let shares = statement.get("weightedAverageShsOut").and_then(as_f64_lenient)?;
    (net_income != 0.0 && shares != 0.0).then(|| net_income / shares)
}

fn statement_revenue(statement: &Value) -> Option<f64> {
    for key in ["revenue", "totalRevenue", "revenues"] {
        if let Some(v) = statement.get(key).and_then(as_f64_lenient) {
            return Some(v);
        }
    }
    None
}

fn year_over_year(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    match (current, previous) {
        (Some(c), Some(p)) if c != 0.0 && p != 0.0 => Some((c - p) / p.abs() * 100.0),
        _ => None,
    }
}

/// Derive growthEPS/growthRevenue from the two most recent annual income
/// statements, overlaying any fields the growth endpoint did deliver. The
/// computed values are percentages, which the normalizer's magnitude rule
/// passes through unchanged.
fn growth_from_statements(statements: &[Value], existing: Option<Value>) -> Option<Value> {
    let annual: Vec<&Value> = statements.iter().filter(|s| is_annual_statement(s)).collect();
    let selected: Vec<&Value> = if annual.len() >= 2 {
        annual
    } else {
        statements.iter().take(2).collect()
    };
    if selected.len() < 2 {
        return existing;
    }
    let (current, previous) = (selected[0], selected[1]);

    let mut record = match existing {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    match year_over_year(statement_eps(current), statement_eps(previous)) {
        Some(growth) => {
            tracing::debug!(growth, "calculated EPS growth from income statements");
            record.insert("growthEPS".to_string(), json!(growth));
        }
        None => tracing::warn!("could not calculate EPS growth from income statements"),
    }

    match year_over_year(statement_revenue(current), statement_revenue(previous)) {
        Some(growth) => {
            tracing::debug!(growth, "calculated revenue growth from income statements");
            record.insert("growthRevenue".to_string(), json!(growth));
        }
        None => tracing::warn!("could not calculate revenue growth from income statements"),
    }

    Some(Value::Object(record))
}

fn transport_error(err: reqwest::Error) -> ValuationError {
    if err.is_timeout() {
        ValuationError::Network(
            "FMP API request timed out. Please check your internet connection and try again."
                .to_string(),
        )
    } else {
        ValuationError::Network(format!("FMP request failed: {err}"))
    }
}

fn status_error(status: StatusCode, body: &str, symbol: &str) -> ValuationError {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["Error", "message"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(String::from))
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    match status.as_u16() {
        401 | 403 => ValuationError::AuthFailure {
            provider: PROVIDER,
            detail,
        },
        404 => ValuationError::SymbolNotFound {
            symbol: symbol.to_string(),
            provider: PROVIDER,
        },
        429 => ValuationError::RateLimited {
            provider: PROVIDER,
            guidance: RATE_LIMIT_GUIDANCE.to_string(),
        },
        _ => ValuationError::Provider(format!("FMP HTTP {status}: {detail}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_annual_growth_period_over_first() {
        let body = json!([
            {"date": "2024-06-30", "period": "Q4", "growthEPS": 0.02},
            {"date": "2024-12-31", "growthEPS": 0.39, "growthRevenue": 0.14},
        ]);
        let selected = select_annual_growth(&body).unwrap();
        assert_eq!(selected["growthEPS"], 0.39);
    }

    #[test]
    fn falls_back_to_first_growth_period() {
        let body = json!([{"date": "2024-06-30", "growthEPS": 0.02}]);
        let selected = select_annual_growth(&body).unwrap();
        assert_eq!(selected["growthEPS"], 0.02);
    }

    #[test]
    fn detects_incomplete_growth_data() {
        assert!(needs_growth_calculation(None));
        assert!(needs_growth_calculation(Some(&json!({"growthEPS": 0.1}))));
        assert!(needs_growth_calculation(Some(
            &json!({"growthEPS": null, "growthRevenue": 0.1})
        )));
        assert!(!needs_growth_calculation(Some(
            &json!({"growthEPS": 0.1, "growthRevenue": 0.05})
        )));
    }

    #[test]
    fn computes_growth_from_annual_statements() {
        let statements = vec![
            json!({"date": "2024-12-31", "eps": 6.6, "revenue": 391000.0}),
            json!({"date": "2024-03-31", "period": "Q1", "eps": 1.5, "revenue": 90000.0}),
            json!({"date": "2023-12-31", "eps": 6.0, "revenue": 383000.0}),
        ];
        let growth = growth_from_statements(&statements, None).unwrap();
        let eps_growth = growth["growthEPS"].as_f64().unwrap();
        let revenue_growth = growth["growthRevenue"].as_f64().unwrap();
        assert!((eps_growth - 10.0).abs() < 1e-9);
        assert!((revenue_growth - (8000.0 / 383000.0 * 100.0)).abs() < 1e-9);
    }

    #[test]
    fn growth_denominator_uses_absolute_value() {
        let statements = vec![
            json!({"date": "2024-12-31", "eps": 1.0, "revenue": 100.0}),
            json!({"date": "2023-12-31", "eps": -2.0, "revenue": 100.0}),
        ];
        let growth = growth_from_statements(&statements, None).unwrap();
        // (1 - (-2)) / |-2| * 100 = 150
        assert!((growth["growthEPS"].as_f64().unwrap() - 150.0).abs() < 1e-9);
    }

    #[test]
    fn keeps_existing_growth_fields_when_overlaying() {
        let statements = vec![
            json!({"date": "2024-12-31", "eps": 6.6, "revenue": 100.0}),
            json!({"date": "2023-12-31", "eps": 6.0, "revenue": 100.0}),
        ];
        let existing = json!({"growthBookValue": 0.12, "growthRevenue": null});
        let growth = growth_from_statements(&statements, Some(existing)).unwrap();
        assert_eq!(growth["growthBookValue"], 0.12);
        assert!(growth["growthEPS"].as_f64().is_some());
        assert!(growth["growthRevenue"].as_f64().is_some());
    }

    #[test]
    fn eps_falls_back_to_net_income_per_share() {
        let statement = json!({"netIncome": 1000.0, "weightedAverageShsOut": 250.0});
        assert_eq!(statement_eps(&statement), Some(4.0));
    }

    #[test]
    fn status_errors_map_to_taxonomy() {
        let err = status_error(StatusCode::FORBIDDEN, r#"{"Error": "bad key"}"#, "AAPL");
        assert!(matches!(err, ValuationError::AuthFailure { .. }));
        assert!(err.to_string().contains("bad key"));

        let err = status_error(StatusCode::NOT_FOUND, "", "ZZZZ");
        assert!(matches!(err, ValuationError::SymbolNotFound { .. }));
        assert!(err.to_string().contains("ZZZZ"));

        let err = status_error(StatusCode::TOO_MANY_REQUESTS, "", "AAPL");
        assert!(matches!(err, ValuationError::RateLimited { .. }));

        let err = status_error(StatusCode::PAYMENT_REQUIRED, "", "AAPL");
        assert!(matches!(err, ValuationError::Provider(_)));
    }
}
