use thiserror::Error;

/// Main error type for ks-rulecheck
///
/// Problems inside a rule are never errors at this level; they are reported
/// as diagnostics in a `RuleReport`. These variants cover the machinery
/// around the checker: configuration, input, threads.
#[derive(Error, Debug)]
pub enum RuleCheckError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Input error: {0}")]
    InputError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Thread error: {0}")]
    ThreadError(String),

    #[error("Channel send error")]
    ChannelSendError,

    #[error("Channel receive error")]
    ChannelRecvError,
}

/// Result type alias for ks-rulecheck operations
pub type Result<T> = std::result::Result<T, RuleCheckError>;

impl<T> From<crossbeam::channel::SendError<T>> for RuleCheckError {
    fn from(_: crossbeam::channel::SendError<T>) -> Self {
        RuleCheckError::ChannelSendError
    }
}

impl From<crossbeam::channel::RecvError> for RuleCheckError {
    fn from(_: crossbeam::channel::RecvError) -> Self {
        RuleCheckError::ChannelRecvError
    }
}
