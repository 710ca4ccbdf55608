use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read {path}: {source}")]
    Knowledge {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to extract text from {path}: {source}")]
    Pdf {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion endpoint error: {0}")]
    Completion(String),

    #[error("completion endpoint timed out after {0}s")]
    Timeout(u64),

    #[error("gave up after {0} tool rounds without a final answer")]
    ToolRoundsExceeded(usize),

    #[error("invalid arguments for tool '{tool}': {reason}")]
    ToolArguments { tool: String, reason: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChatError>;
