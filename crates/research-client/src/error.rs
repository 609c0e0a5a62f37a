use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResearchError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Cannot connect to research service at {0}. Ensure the service is running and the URL is correct.")]
    ServiceUnreachable(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ResearchResult<T> = Result<T, ResearchError>;
