/// Configuration loading errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    #[error("failed to parse config {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("invalid config value for {field}: {message}")]
    ValidationFailed { field: String, message: String },
}
