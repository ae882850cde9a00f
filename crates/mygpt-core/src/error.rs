use std::path::PathBuf;
use thiserror::Error;

/// Failures while turning a picked file into text
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a readable PDF: {0}")]
    Parse(String),

    #[error("document contains no extractable text")]
    NoText,
}

/// Failures reported by a generation backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("server returned {0}. Make sure Ollama is running with: ollama serve")]
    Status(reqwest::StatusCode),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Server(String),
}
