//! Declarative field-alias table.
//!
//! Providers have renamed most of these fields at least once across API
//! versions. Each canonical field carries an ordered list of
//! (source payload, alias) candidates; the first present and non-null one is
//! selected, then unit-normalized. Quote-side aliases sit at the tail so the
//! fundamentals endpoints keep priority.

use serde_json::Value;

/// Which raw payload a candidate alias lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Quote,
    Profile,
    Metrics,
    Ratios,
    Growth,
}

pub struct FieldSpec {
    pub canonical: &'static str,
    pub candidates: &'static [(Source, &'static str)],
    pub normalize: fn(&Value) -> Option<f64>,
}

/// Tolerant float parse: accepts JSON numbers and numeric strings, rejects
/// everything non-finite. Providers have been observed sending both `1.23`
/// and `"1.23"` for the same field.
pub fn as_f64_lenient(value: &Value) -> Option<f64> {
    let num = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    num.is_finite().then_some(num)
}

/// Percentage-unit normalization for ROE, book-value growth and growth
/// rates: |v| > 1 means the provider already sent a percentage; anything in
/// (-1, 1) is a decimal fraction and is scaled by 100. The threshold is on
/// the magnitude, so negative decimals are scaled too (-0.2 -> -20.0) while
/// large negative percentages pass through (-2.0 stays -2.0).
pub fn normalize_percent(value: &Value) -> Option<f64> {
    let num = as_f64_lenient(value)?;
    Some(if num.abs() > 1.0 { num } else { num * 100.0 })
}

/// Growth normalization with a caller default for absent or unparseable
/// values. The default is a decimal fraction (0.08 = 8%) and goes through
/// the same x100 step as any other decimal. Only legacy single-provider
/// paths opt into this; the primary merge treats missing growth as an error.
pub fn normalize_growth_or(value: Option<&Value>, default_decimal: f64) -> f64 {
    value
        .and_then(normalize_percent)
        .unwrap_or(default_decimal * 100.0)
}

/// EPS normalization. Zero and negative values are legitimate (break-even
/// and loss-making companies); magnitudes over 1000 are unit-mismatched
/// garbage, not real per-share earnings, and are rejected rather than
/// defaulted.
pub fn normalize_eps(value: &Value) -> Option<f64> {
    let num = as_f64_lenient(value)?;
    (num.abs() <= 1000.0).then_some(num)
}

/// Plain ratio normalization: finite float or nothing, no rescaling.
pub fn normalize_ratio(value: &Value) -> Option<f64> {
    as_f64_lenient(value)
}

pub const CURRENT_PRICE: FieldSpec = FieldSpec {
    canonical: "currentPrice",
    candidates: &[
        (Source::Quote, "price"),
        (Source::Quote, "close"),
        (Source::Quote, "last_price"),
        (Source::Quote, "latest_price"),
        (Source::Quote, "market_price"),
    ],
    normalize: normalize_ratio,
};

pub const EPS: FieldSpec = FieldSpec {
    canonical: "eps",
    candidates: &[
        (Source::Ratios, "netIncomePerShareTTM"),
        (Source::Ratios, "netIncomePerShare"),
        (Source::Metrics, "eps"),
        (Source::Metrics, "earningsPerShare"),
        (Source::Metrics, "earningsPerShareTTM"),
        (Source::Metrics, "trailingEps"),
        (Source::Ratios, "earningsPerShare"),
        (Source::Ratios, "eps"),
        (Source::Quote, "eps"),
        (Source::Quote, "earnings_per_share"),
        (Source::Quote, "diluted_eps"),
    ],
    normalize: normalize_eps,
};

pub const PE_RATIO: FieldSpec = FieldSpec {
    canonical: "peRatio",
    candidates: &[
        (Source::Ratios, "priceToEarningsRatioTTM"),
        (Source::Ratios, "priceToEarningsRatio"),
        (Source::Metrics, "peRatio"),
        (Source::Metrics, "priceToEarningsRatio"),
        (Source::Metrics, "priceEarningsRatio"),
        (Source::Metrics, "pe"),
        (Source::Ratios, "peRatio"),
        (Source::Ratios, "priceEarningsRatio"),
        (Source::Quote, "pe_ratio"),
        (Source::Quote, "pe"),
        (Source::Quote, "price_to_earnings"),
    ],
    normalize: normalize_ratio,
};

pub const ROE: FieldSpec = FieldSpec {
    canonical: "roe",
    candidates: &[
        (Source::Metrics, "returnOnEquityTTM"),
        (Source::Ratios, "returnOnEquityTTM"),
        (Source::Metrics, "roe"),
        (Source::Metrics, "returnOnEquity"),
        (Source::Ratios, "roe"),
        (Source::Ratios, "returnOnEquity"),
    ],
    normalize: normalize_percent,
};

pub const DEBT_TO_EQUITY: FieldSpec = FieldSpec {
    canonical: "debtToEquity",
    candidates: &[
        (Source::Ratios, "debtToEquityRatioTTM"),
        (Source::Ratios, "debtToEquityRatio"),
        (Source::Metrics, "debtEquityRatio"),
        (Source::Metrics, "debtToEquity"),
        (Source::Metrics, "debtToEquityRatio"),
        (Source::Ratios, "debtEquityRatio"),
        (Source::Ratios, "debtToEquity"),
    ],
    normalize: normalize_ratio,
};

pub const CURRENT_RATIO: FieldSpec = FieldSpec {
    canonical: "currentRatio",
    candidates: &[
        (Source::Ratios, "currentRatioTTM"),
        (Source::Metrics, "currentRatioTTM"),
        (Source::Ratios, "currentRatio"),
        (Source::Metrics, "currentRatio"),
    ],
    normalize: normalize_ratio,
};

pub const EPS_GROWTH: FieldSpec = FieldSpec {
    canonical: "epsGrowth",
    candidates: &[
        (Source::Growth, "growthEPS"),
        (Source::Growth, "growthEPSDiluted"),
        (Source::Growth, "growthEps"),
        (Source::Growth, "growthEarningsPerShare"),
        (Source::Growth, "epsGrowth"),
        (Source::Growth, "earningsPerShareGrowth"),
    ],
    normalize: normalize_percent,
};

pub const SALES_GROWTH: FieldSpec = FieldSpec {
    canonical: "salesGrowth",
    candidates: &[
        (Source::Growth, "growthRevenue"),
        (Source::Growth, "growthSales"),
        (Source::Growth, "revenueGrowth"),
        (Source::Growth, "salesGrowth"),
        (Source::Growth, "revenueGrowthPercentage"),
        (Source::Growth, "revenueGrowthPercent"),
    ],
    normalize: normalize_percent,
};

pub const BOOK_VALUE_GROWTH: FieldSpec = FieldSpec {
    canonical: "bookValueGrowth",
    candidates: &[
        (Source::Growth, "growthBookValue"),
        (Source::Growth, "growthBVPS"),
        (Source::Growth, "bookValueGrowth"),
        (Source::Growth, "bookValuePerShareGrowth"),
    ],
    normalize: normalize_percent,
};

/// Company-name priority chain; entries must be non-empty strings.
pub const COMPANY_NAME_ALIASES: &[(Source, &str)] = &[
    (Source::Profile, "companyName"),
    (Source::Profile, "name"),
    (Source::Profile, "symbol"),
    (Source::Metrics, "companyName"),
    (Source::Metrics, "name"),
    (Source::Quote, "name"),
    (Source::Quote, "company_name"),
];
