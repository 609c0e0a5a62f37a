use thiserror::Error;

/// Error taxonomy for the analysis pipeline. Required-field and valuation
/// errors always surface to the caller; optional fundamentals degrade to
/// `None` without touching this enum. Nothing here is retried automatically.
#[derive(Error, Debug)]
pub enum ValuationError {
    #[error("Unable to retrieve {field}. {cause}")]
    MissingField { field: &'static str, cause: String },

    #[error("{provider} rate limit reached. {guidance}")]
    RateLimited {
        provider: &'static str,
        guidance: String,
    },

    #[error("{provider} authentication failed: {detail}. Check your API key configuration.")]
    AuthFailure {
        provider: &'static str,
        detail: String,
    },

    #[error("Stock symbol \"{symbol}\" not found on {provider}. Please verify the symbol is correct.")]
    SymbolNotFound {
        symbol: String,
        provider: &'static str,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("No valid growth rate data available. Growth rates are required for calculations.")]
    NoPositiveGrowth,

    #[error("Search superseded by a newer request")]
    Superseded,

    #[error("Research backend error: {0}")]
    Research(String),

    #[error("Missing configuration: {variable} is not set")]
    Config { variable: &'static str },

    #[error("Provider error: {0}")]
    Provider(String),
}
