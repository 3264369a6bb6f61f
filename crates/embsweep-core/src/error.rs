use thiserror::Error;

/// Errors that can occur while running an embedding comparison.
#[derive(Debug, Error)]
pub enum SweepError {
    /// The dev/train/test splits could not be loaded. Fatal: raised before
    /// any configuration is attempted.
    #[error("failed to load data: {0}")]
    DataLoad(String),

    /// A single train-and-evaluate attempt failed.
    #[error("train/eval attempt failed: {0}")]
    TrainEval(String),

    /// The reporting sink failed to render or save its artifact.
    #[error("reporting failed: {0}")]
    Reporting(String),

    /// An experiment plan, hyperparameter set or retry policy is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for embsweep operations.
pub type Result<T> = std::result::Result<T, SweepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = SweepError::DataLoad("dev.json missing".into());
        assert_eq!(err.to_string(), "failed to load data: dev.json missing");

        let err = SweepError::TrainEval("embedding download timed out".into());
        assert!(err.to_string().contains("embedding download timed out"));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: SweepError = io.into();
        assert!(matches!(err, SweepError::Io(_)));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SweepError>();
    }
}
