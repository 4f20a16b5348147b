//! Error taxonomy shared by every quote sync component.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the core and by adapters plugged into it.
#[derive(Debug, Error)]
pub enum Error {
    /// Remote unreachable or answered with a non-success status.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Malformed JSON, from the remote or from an import file.
    #[error("Parse failure: {0}")]
    Parse(String),

    /// A required field is missing or blank.
    #[error("Validation failure: {0}")]
    Validation(String),

    /// Durable or session storage rejected a read or write.
    #[error("Storage failure: {0}")]
    Storage(String),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Short machine-readable code, used for cycle status and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport_failure",
            Self::Parse(_) => "parse_failure",
            Self::Validation(_) => "validation_failure",
            Self::Storage(_) => "storage_failure",
            Self::Config(_) => "config_error",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_errors_become_parse_failures() {
        let err: Error = serde_json::from_str::<Vec<String>>("{not json")
            .unwrap_err()
            .into();
        assert_eq!(err.code(), "parse_failure");
    }

    #[test]
    fn display_includes_category_and_message() {
        let err = Error::validation("text is required");
        assert_eq!(err.to_string(), "Validation failure: text is required");
    }
}
