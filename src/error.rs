use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("HTTP request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Could not decode {source_name} as text: {reason}")]
    Decode { source_name: String, reason: String },

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot write enriched records to {path}: {source}")]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// True for the batch-level failures that abort a whole source.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, PipelineError::Fetch(_) | PipelineError::HttpStatus { .. })
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
