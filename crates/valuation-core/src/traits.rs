use crate::{RawFundamentals, ValuationError};
use async_trait::async_trait;
use serde_json::Value;

/// Quote source: returns the raw quote record for a symbol. The record is
/// the already-unwrapped payload object; field extraction happens in the
/// normalizer.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<Value, ValuationError>;

    /// Provider name used in log lines and error messages.
    fn name(&self) -> &'static str;
}

/// Fundamentals source: returns one raw record per upstream endpoint.
/// Individual endpoint failures degrade to `None` payloads; whether the
/// required fields can still be produced is decided at merge time.
#[async_trait]
pub trait FundamentalsProvider: Send + Sync {
    async fn fetch_fundamentals(&self, symbol: &str) -> Result<RawFundamentals, ValuationError>;
}
