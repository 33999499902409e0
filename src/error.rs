use thiserror::Error;

/// Errors surfaced by the filtering, plotting and prediction core.
///
/// Every variant is terminal for the call that produced it; nothing is retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DaplotError {
    /// Unknown table identifier.
    #[error("Table '{0}' not found")]
    NotFound(String),

    /// A filter key or plot axis names a column the table does not have.
    #[error("Column '{0}' not found in data")]
    UnknownColumn(String),

    /// Malformed save payload or request.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Unsupported prediction method '{0}'")]
    UnsupportedMethod(String),

    /// Any failure inside a model while fitting or predicting.
    #[error("Model training failed: {0}")]
    ModelTrainingFailed(String),
}

pub type Result<T> = std::result::Result<T, DaplotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_message() {
        let err = DaplotError::InsufficientData {
            required: 3,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient data: need at least 3 points, got 2"
        );
    }

    #[test]
    fn training_failure_keeps_message() {
        let err = DaplotError::ModelTrainingFailed("singular system".into());
        assert!(err.to_string().contains("singular system"));
    }
}
