//! Domain error types.

/// Top-level error type for tickerscore.
#[derive(Debug, thiserror::Error)]
pub enum TickerScoreError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("ticker file {file}: {reason}")]
    TickerSource { file: String, reason: String },

    #[error("http request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    #[error("http status {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("unexpected response from {source_name}: {reason}")]
    Decode { source_name: String, reason: String },

    #[error("{operation} failed after {attempts} attempts: {reason}")]
    RetryExhausted {
        operation: String,
        attempts: u32,
        reason: String,
    },

    #[error("checkpoint error at {path}: {reason}")]
    Checkpoint { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TickerScoreError> for std::process::ExitCode {
    fn from(err: &TickerScoreError) -> Self {
        let code: u8 = match err {
            TickerScoreError::Io(_) | TickerScoreError::TickerSource { .. } => 1,
            TickerScoreError::ConfigParse { .. }
            | TickerScoreError::ConfigMissing { .. }
            | TickerScoreError::ConfigInvalid { .. } => 2,
            TickerScoreError::Database { .. } | TickerScoreError::DatabaseQuery { .. } => 3,
            TickerScoreError::Http { .. }
            | TickerScoreError::HttpStatus { .. }
            | TickerScoreError::Decode { .. }
            | TickerScoreError::RetryExhausted { .. } => 4,
            TickerScoreError::Checkpoint { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
