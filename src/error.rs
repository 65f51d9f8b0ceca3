use thiserror::Error;

/// Raised when the export header lacks one of the columns needed to build a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Missing required columns: {}", .required.join(", "))]
pub struct MissingColumnsError {
    pub required: Vec<String>,
}

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    MissingColumns(#[from] MissingColumnsError),

    #[error("API error: {message}")]
    Api { message: String },

    #[error("Database unavailable - storage quota exceeded")]
    QuotaExceeded,

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),
}

pub type Result<T> = std::result::Result<T, CompareError>;
