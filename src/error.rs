use thiserror::Error;

#[derive(Error, Debug)]
pub enum SurgeonError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    EmptyContent(String),

    #[error("Repository fetch failed: {0}")]
    UpstreamFetch(String),

    #[error("Gemini request failed: {0}")]
    UpstreamModel(String),

    #[error("Dust request failed: {0}")]
    UpstreamAgent(String),

    #[error("{0}")]
    MalformedModelOutput(String),

    #[error("{0}")]
    ExportDelivery(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SurgeonError>;
