use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClusterError>;

/// Errors raised by the distance provider, the clustering engine and the
/// dataset helpers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClusterError {
    /// The point set or distance matrix is malformed, or a metric name is unknown.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A numeric parameter is outside its valid range.
    #[error("invalid parameter `{name}`: {message}")]
    InvalidParameter {
        name: &'static str,
        message: String,
    },

    /// An estimator accessor was used before `fit`.
    #[error("{0} not fitted. Call fit() first.")]
    NotFitted(&'static str),
}

impl ClusterError {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        ClusterError::InvalidInput(message.into())
    }

    pub(crate) fn invalid_parameter(name: &'static str, message: impl Into<String>) -> Self {
        ClusterError::InvalidParameter {
            name,
            message: message.into(),
        }
    }
}
