//! Ties the pipeline together: concurrent quote + fundamentals fetch,
//! normalization into `StockData`, valuation metrics, and the Fisher
//! scorecard with cached qualitative research.
//!
//! A new search supersedes any in-flight one: each search takes a
//! generation number, and results whose generation is stale by the time
//! both fetches resolve are discarded instead of overwriting newer data.

use fisher_scorecard::{build_scorecard, formula_derived_criteria, qualitative_ids};
use fmp_client::FmpClient;
use fundamentals_normalizer::build_stock_data;
use research_client::{
    BackendResearcher, LlmResearcher, ResearchCache, Researcher,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use stockdata_client::StockDataClient;
use valuation_core::{
    CalculatedMetrics, FisherScorecard, FundamentalsProvider, QuoteProvider, ResearchRequest,
    StockData, ValuationError,
};

/// Which research path resolves the qualitative criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResearchMode {
    /// Remote research backend (web search + local model).
    Backend,
    /// Direct OpenAI-compatible LLM call.
    Llm,
}

/// One complete analysis, as handed to the presentation side.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAnalysis {
    pub stock_data: StockData,
    pub metrics: CalculatedMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scorecard: Option<FisherScorecard>,
}

pub struct ValuationOrchestrator {
    quote_provider: Arc<dyn QuoteProvider>,
    quote_fallback: Option<Arc<dyn QuoteProvider>>,
    fundamentals_provider: Arc<dyn FundamentalsProvider>,
    researcher: Arc<dyn Researcher>,
    research_cache: ResearchCache,
    generation: AtomicU64,
}

impl ValuationOrchestrator {
    pub fn new(
        quote_provider: Arc<dyn QuoteProvider>,
        quote_fallback: Option<Arc<dyn QuoteProvider>>,
        fundamentals_provider: Arc<dyn FundamentalsProvider>,
        researcher: Arc<dyn Researcher>,
    ) -> Self {
        Self {
            quote_provider,
            quote_fallback,
            fundamentals_provider,
            researcher,
            research_cache: ResearchCache::with_default_ttl(),
            generation: AtomicU64::new(0),
        }
    }

    /// Assemble the production wiring from environment variables. The FMP
    /// key is required; the secondary quote provider and the research
    /// backend degrade with a warning when unconfigured.
    pub fn from_env(mode: ResearchMode) -> Result<Self, ValuationError> {
        let api_key = std::env::var("FMP_API_KEY")
            .map_err(|_| ValuationError::Config {
                variable: "FMP_API_KEY",
            })?;
        let fmp = Arc::new(FmpClient::new(api_key));

        let quote_fallback: Option<Arc<dyn QuoteProvider>> =
            match std::env::var("STOCKDATA_API_TOKEN") {
                Ok(token) => Some(Arc::new(StockDataClient::new(token))),
                Err(_) => {
                    tracing::warn!(
                        "STOCKDATA_API_TOKEN not set; running without a secondary quote provider"
                    );
                    None
                }
            };

        let researcher: Arc<dyn Researcher> = match mode {
            ResearchMode::Backend => Arc::new(BackendResearcher::with_defaults()),
            ResearchMode::Llm => Arc::new(LlmResearcher::with_defaults()),
        };

        Ok(Self::new(fmp.clone(), quote_fallback, fmp, researcher))
    }

    async fn fetch_quote_with_fallback(&self, symbol: &str) -> Result<Value, ValuationError> {
        match self.quote_provider.fetch_quote(symbol).await {
            Ok(quote) => Ok(quote),
            Err(primary_error) => match &self.quote_fallback {
                Some(fallback) => {
                    tracing::warn!(
                        symbol,
                        primary = self.quote_provider.name(),
                        fallback = fallback.name(),
                        error = %primary_error,
                        "primary quote fetch failed; trying fallback provider"
                    );
                    fallback.fetch_quote(symbol).await
                }
                None => Err(primary_error),
            },
        }
    }

    /// Fetch and normalize one symbol. Quote and fundamentals are fetched
    /// concurrently; they populate disjoint fields, so no ordering is
    /// needed between them.
    pub async fn search(&self, symbol: &str) -> Result<StockData, ValuationError> {
        let symbol = symbol.trim().to_uppercase();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(%symbol, generation, "starting stock search");

        let (quote, fundamentals) = tokio::join!(
            self.fetch_quote_with_fallback(&symbol),
            self.fundamentals_provider.fetch_fundamentals(&symbol),
        );

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(%symbol, generation, "search superseded; discarding results");
            return Err(ValuationError::Superseded);
        }

        build_stock_data(&symbol, &quote?, &fundamentals?)
    }

    /// Valuation metrics for a stock; pure, safe to recompute on every
    /// growth-rate override.
    pub fn metrics(
        &self,
        stock: &StockData,
        custom_growth_rate: Option<f64>,
    ) -> Result<CalculatedMetrics, ValuationError> {
        valuation_engine::compute_metrics(stock, custom_growth_rate)
    }

    /// Build the 15-point scorecard, going through the research cache for
    /// the qualitative criteria.
    pub async fn scorecard(&self, stock: &StockData) -> Result<FisherScorecard, ValuationError> {
        let formula = formula_derived_criteria(stock);
        let ids = qualitative_ids();
        let request = ResearchRequest {
            symbol: stock.symbol.clone(),
            company_name: stock.company_name.clone(),
            criteria_to_research: ids.clone(),
        };

        let key = ResearchCache::key(&stock.symbol, &ids);
        let research = self
            .research_cache
            .get_or_fetch(&key, || async { self.researcher.research(&request).await })
            .await
            .map_err(|e| ValuationError::Research(e.to_string()))?;

        Ok(build_scorecard(stock, formula, &research))
    }

    /// Drop the cached research for a symbol so the next scorecard build
    /// re-runs it.
    pub fn invalidate_research(&self, symbol: &str) {
        let key = ResearchCache::key(&symbol.trim().to_uppercase(), &qualitative_ids());
        self.research_cache.invalidate(&key);
    }

    /// Full pipeline for one symbol: search, metrics, and (optionally) the
    /// scorecard.
    pub async fn analyze(
        &self,
        symbol: &str,
        custom_growth_rate: Option<f64>,
        include_scorecard: bool,
    ) -> Result<StockAnalysis, ValuationError> {
        let stock_data = self.search(symbol).await?;
        let metrics = self.metrics(&stock_data, custom_growth_rate)?;
        tracing::info!(
            symbol = %stock_data.symbol,
            sticker_price = metrics.sticker_price,
            mos_price = metrics.mos_price,
            signal = metrics.signal.to_label(),
            "valuation complete"
        );
        let scorecard = if include_scorecard {
            Some(self.scorecard(&stock_data).await?)
        } else {
            None
        };

        Ok(StockAnalysis {
            stock_data,
            metrics,
            scorecard,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use research_client::ResearchResult;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use tokio::sync::Notify;
    use valuation_core::{Confidence, CriterionRating, RawFundamentals, ResearchResponse, Signal};

    struct StubQuote {
        payload: Value,
        fail: bool,
    }

    #[async_trait]
    impl QuoteProvider for StubQuote {
        async fn fetch_quote(&self, symbol: &str) -> Result<Value, ValuationError> {
            if self.fail {
                return Err(ValuationError::Network("stub quote outage".to_string()));
            }
            let mut payload = self.payload.clone();
            payload["symbol"] = json!(symbol);
            Ok(payload)
        }

        fn name(&self) -> &'static str {
            "stub-quote"
        }
    }

    /// Quote stub that parks the first call until released, so a second
    /// search can overtake it.
    struct GatedQuote {
        started: Arc<Notify>,
        release: Arc<Notify>,
        first: AtomicBool,
    }

    #[async_trait]
    impl QuoteProvider for GatedQuote {
        async fn fetch_quote(&self, _symbol: &str) -> Result<Value, ValuationError> {
            if self.first.swap(false, Ordering::SeqCst) {
                self.started.notify_one();
                self.release.notified().await;
            }
            Ok(json!({"price": 100.0}))
        }

        fn name(&self) -> &'static str {
            "gated-quote"
        }
    }

    struct StubFundamentals;

    #[async_trait]
    impl FundamentalsProvider for StubFundamentals {
        async fn fetch_fundamentals(
            &self,
            _symbol: &str,
        ) -> Result<RawFundamentals, ValuationError> {
            Ok(RawFundamentals {
                profile: Some(json!({"companyName": "Stub Co"})),
                metrics: Some(json!({"returnOnEquityTTM": 0.18})),
                ratios: Some(json!({"netIncomePerShareTTM": 4.0})),
                growth: Some(json!({"growthEPS": 0.10, "growthRevenue": 0.07})),
            })
        }
    }

    struct StubResearcher {
        calls: AtomicUsize,
    }

    impl StubResearcher {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Researcher for StubResearcher {
        async fn research(&self, request: &ResearchRequest) -> ResearchResult<ResearchResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ResearchResponse {
                symbol: request.symbol.clone(),
                ratings: request
                    .criteria_to_research
                    .iter()
                    .map(|id| CriterionRating {
                        criterion_id: *id,
                        rating: 4,
                        justification: "stub research".to_string(),
                        key_findings: Vec::new(),
                        sources: Vec::new(),
                        confidence: Confidence::Medium,
                    })
                    .collect(),
                research_date: Utc::now(),
                model_used: "stub-model".to_string(),
            })
        }
    }

    fn orchestrator(
        quote: Arc<dyn QuoteProvider>,
        fallback: Option<Arc<dyn QuoteProvider>>,
        researcher: Arc<StubResearcher>,
    ) -> ValuationOrchestrator {
        ValuationOrchestrator::new(quote, fallback, Arc::new(StubFundamentals), researcher)
    }

    #[tokio::test]
    async fn search_normalizes_and_uppercases() {
        let orch = orchestrator(
            Arc::new(StubQuote {
                payload: json!({"price": 120.0}),
                fail: false,
            }),
            None,
            Arc::new(StubResearcher::new()),
        );

        let stock = orch.search(" aapl ").await.unwrap();
        assert_eq!(stock.symbol, "AAPL");
        assert_eq!(stock.company_name, "Stub Co");
        assert_eq!(stock.eps, 4.0);
        assert_eq!(stock.roe, Some(18.0));
    }

    #[tokio::test]
    async fn quote_falls_back_to_secondary_provider() {
        let orch = orchestrator(
            Arc::new(StubQuote {
                payload: json!({}),
                fail: true,
            }),
            Some(Arc::new(StubQuote {
                payload: json!({"price": 99.0}),
                fail: false,
            })),
            Arc::new(StubResearcher::new()),
        );

        let stock = orch.search("MSFT").await.unwrap();
        assert_eq!(stock.current_price, 99.0);
    }

    #[tokio::test]
    async fn quote_failure_without_fallback_surfaces() {
        let orch = orchestrator(
            Arc::new(StubQuote {
                payload: json!({}),
                fail: true,
            }),
            None,
            Arc::new(StubResearcher::new()),
        );

        assert!(matches!(
            orch.search("MSFT").await,
            Err(ValuationError::Network(_))
        ));
    }

    #[tokio::test]
    async fn superseded_search_is_discarded() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let gated = GatedQuote {
            started: started.clone(),
            release: release.clone(),
            first: AtomicBool::new(true),
        };
        let orch = Arc::new(orchestrator(
            Arc::new(gated),
            None,
            Arc::new(StubResearcher::new()),
        ));

        let first = tokio::spawn({
            let orch = orch.clone();
            async move { orch.search("AAPL").await }
        });

        // wait until the first search is in flight, then overtake it
        started.notified().await;
        let second = orch.search("AAPL").await;
        assert!(second.is_ok());

        release.notify_one();
        let first = first.await.unwrap();
        assert!(matches!(first, Err(ValuationError::Superseded)));
    }

    #[tokio::test]
    async fn scorecard_is_complete_and_research_is_cached() {
        let researcher = Arc::new(StubResearcher::new());
        let orch = orchestrator(
            Arc::new(StubQuote {
                payload: json!({"price": 120.0}),
                fail: false,
            }),
            None,
            researcher.clone(),
        );

        let stock = orch.search("AAPL").await.unwrap();
        let scorecard = orch.scorecard(&stock).await.unwrap();
        assert_eq!(scorecard.criteria.len(), 15);
        let ids: Vec<u8> = scorecard.criteria.iter().map(|c| c.id).collect();
        assert_eq!(ids, (1..=15).collect::<Vec<u8>>());

        // second build hits the cache
        orch.scorecard(&stock).await.unwrap();
        assert_eq!(researcher.calls.load(Ordering::SeqCst), 1);

        orch.invalidate_research("AAPL");
        orch.scorecard(&stock).await.unwrap();
        assert_eq!(researcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn analyze_returns_full_report() {
        let orch = orchestrator(
            Arc::new(StubQuote {
                payload: json!({"price": 1.0}),
                fail: false,
            }),
            None,
            Arc::new(StubResearcher::new()),
        );

        let analysis = orch.analyze("AAPL", None, true).await.unwrap();
        // growth default = min(10, 7) = 7; eps 4 at 7% growth is worth far
        // more than a $1 price, so the signal is Buy
        assert!((analysis.metrics.custom_growth_rate - 7.0).abs() < 1e-9);
        assert_eq!(analysis.metrics.signal, Signal::Buy);
        assert!(analysis.scorecard.is_some());

        let without = orch.analyze("AAPL", Some(12.0), false).await.unwrap();
        assert!(without.scorecard.is_none());
        assert_eq!(without.metrics.custom_growth_rate, 12.0);
    }
}
