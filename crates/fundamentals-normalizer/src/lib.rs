//! Turns heterogeneous provider payloads into the canonical [`StockData`]
//! record. Shape adapters unwrap the record, the alias table picks fields,
//! unit rules fix percentage conventions, and the merge enforces the
//! required-field policy: eps, the two growth rates and the price are never
//! defaulted — their absence is a hard, named error.

pub mod fields;
pub mod shape;

use chrono::Utc;
use serde_json::Value;
use valuation_core::{RawFundamentals, StockData, ValuationError};

use fields::{FieldSpec, Source};

/// The unwrapped records a single search produced, by source.
#[derive(Debug, Clone, Copy, Default)]
pub struct Payloads<'a> {
    pub quote: Option<&'a Value>,
    pub profile: Option<&'a Value>,
    pub metrics: Option<&'a Value>,
    pub ratios: Option<&'a Value>,
    pub growth: Option<&'a Value>,
}

impl<'a> Payloads<'a> {
    pub fn new(quote: &'a Value, fundamentals: &'a RawFundamentals) -> Self {
        Self {
            quote: Some(quote),
            profile: fundamentals.profile.as_ref(),
            metrics: fundamentals.metrics.as_ref(),
            ratios: fundamentals.ratios.as_ref(),
            growth: fundamentals.growth.as_ref(),
        }
    }

    fn source(&self, source: Source) -> Option<&'a Value> {
        match source {
            Source::Quote => self.quote,
            Source::Profile => self.profile,
            Source::Metrics => self.metrics,
            Source::Ratios => self.ratios,
            Source::Growth => self.growth,
        }
    }
}

/// Resolve one canonical field: the first candidate alias that is present
/// and non-null wins, then gets unit-normalized. A selected-but-rejected
/// value (NaN, out-of-range EPS) yields `None` without trying later
/// aliases, matching the upstream selection order.
pub fn resolve(spec: &FieldSpec, payloads: &Payloads) -> Option<f64> {
    let candidate = spec.candidates.iter().find_map(|(source, alias)| {
        payloads
            .source(*source)?
            .get(*alias)
            .filter(|v| !v.is_null())
    })?;
    (spec.normalize)(candidate)
}

fn string_field<'a>(record: &'a Value, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Company-name priority chain across profile/metrics/quote, falling back
/// to the literal ticker symbol.
pub fn resolve_company_name(payloads: &Payloads, symbol: &str) -> String {
    fields::COMPANY_NAME_ALIASES
        .iter()
        .find_map(|(source, alias)| {
            payloads
                .source(*source)
                .and_then(|record| string_field(record, alias))
        })
        .unwrap_or(symbol)
        .to_string()
}

fn resolve_symbol(quote: &Value, requested: &str) -> String {
    string_field(quote, "ticker")
        .or_else(|| string_field(quote, "symbol"))
        .unwrap_or(requested)
        .to_string()
}

fn required(
    value: Option<f64>,
    field: &'static str,
    cause: &str,
) -> Result<f64, ValuationError> {
    value.ok_or_else(|| ValuationError::MissingField {
        field,
        cause: cause.to_string(),
    })
}

/// Merge one quote record plus the fundamentals payloads into [`StockData`].
///
/// Secondary fields (roe, debt/equity, current ratio, book-value growth, PE)
/// degrade to `None` silently; the four load-bearing fields fail loudly.
pub fn build_stock_data(
    symbol: &str,
    quote: &Value,
    fundamentals: &RawFundamentals,
) -> Result<StockData, ValuationError> {
    let payloads = Payloads::new(quote, fundamentals);

    let current_price = required(
        resolve(&fields::CURRENT_PRICE, &payloads).filter(|p| *p > 0.0),
        "stock price",
        "Please check the symbol and try again.",
    )?;

    let eps = required(
        resolve(&fields::EPS, &payloads),
        "Earnings Per Share (EPS)",
        "This is required for calculations. Check the fundamentals API key or try a different stock symbol.",
    )?;

    let eps_growth = required(
        resolve(&fields::EPS_GROWTH, &payloads),
        "EPS Growth Rate",
        "This is required for calculations. Check the fundamentals API key and ensure growth data is available.",
    )?;

    let sales_growth = required(
        resolve(&fields::SALES_GROWTH, &payloads),
        "Sales Growth Rate",
        "This is required for calculations. Check the fundamentals API key and ensure growth data is available.",
    )?;

    if sales_growth != 0.0 && sales_growth.abs() < 5.0 {
        tracing::warn!(
            sales_growth,
            "sales growth unusually low; upstream may have reported a quarterly figure"
        );
    }

    let stock = StockData {
        symbol: resolve_symbol(quote, symbol),
        company_name: resolve_company_name(&payloads, symbol),
        current_price,
        eps,
        eps_growth,
        sales_growth,
        book_value_growth: resolve(&fields::BOOK_VALUE_GROWTH, &payloads),
        roe: resolve(&fields::ROE, &payloads),
        debt_to_equity: resolve(&fields::DEBT_TO_EQUITY, &payloads),
        current_ratio: resolve(&fields::CURRENT_RATIO, &payloads),
        pe_ratio: resolve(&fields::PE_RATIO, &payloads),
        last_updated: Utc::now(),
    };

    tracing::debug!(
        symbol = %stock.symbol,
        eps = stock.eps,
        eps_growth = stock.eps_growth,
        sales_growth = stock.sales_growth,
        roe = ?stock.roe,
        "normalized fundamentals"
    );

    Ok(stock)
}
