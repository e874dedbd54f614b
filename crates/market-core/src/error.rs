use thiserror::Error;

/// Failure to retrieve the asset list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to parse market data: {0}")]
    Parse(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failure to obtain a generated insight.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InsightFailure {
    #[error("Could not generate insight")]
    MissingText,

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Insight request failed: {0}")]
    Transport(String),
}

/// Builds the message for a non-success HTTP status. Server-provided text
/// wins; otherwise the canonical reason phrase, otherwise the bare code.
pub fn status_message(reason: Option<&str>, server_text: Option<String>) -> String {
    server_text
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| reason.map(str::to_string))
        .unwrap_or_else(|| "Unknown status".to_string())
}
