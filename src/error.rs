use thiserror::Error;

/// Error types for the visfit-rs library.
#[derive(Error, Debug)]
pub enum VisFitError {
    /// Malformed construction of a parameter, component or fitter.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An operation was called out of sequence (e.g. `run` before `prepare`).
    #[error("Not initialized: {0}")]
    NotInitialized(String),

    /// An option string was not recognized.
    #[error("Unknown option '{option}': expected one of {expected}")]
    UnknownOption { option: String, expected: String },

    /// Error indicating mismatched array lengths.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Parameter not found.
    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    /// Error for invalid parameter values or units.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error indicating the algorithm failed to converge.
    #[error("Algorithm failed to converge: {0}")]
    ConvergenceFailure(String),

    /// Error during computational operations.
    #[error("Computation error: {0}")]
    ComputationError(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Generic error for cases that don't fit the other categories.
    #[error("Error: {0}")]
    Other(String),
}

impl From<crate::parameters::bounds::BoundsError> for VisFitError {
    fn from(err: crate::parameters::bounds::BoundsError) -> Self {
        VisFitError::InvalidParameter(format!("{}", err))
    }
}

/// Result type alias for visfit-rs operations.
pub type Result<T> = std::result::Result<T, VisFitError>;

impl VisFitError {
    /// Build an [`VisFitError::UnknownOption`] from the offending value and the accepted ones.
    pub fn unknown_option(option: &str, expected: &[&str]) -> Self {
        VisFitError::UnknownOption {
            option: option.to_string(),
            expected: expected
                .iter()
                .map(|e| format!("'{}'", e))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl From<String> for VisFitError {
    fn from(s: String) -> Self {
        VisFitError::Other(s)
    }
}

impl From<&str> for VisFitError {
    fn from(s: &str) -> Self {
        VisFitError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VisFitError::Configuration("wl and value lengths differ".to_string());
        assert!(format!("{}", err).contains("wl and value lengths differ"));

        let err = VisFitError::NotInitialized("Fitter not initialized".to_string());
        assert!(format!("{}", err).contains("Fitter not initialized"));
    }

    #[test]
    fn test_unknown_option_lists_expected() {
        let err = VisFitError::unknown_option("mode", &["best", "mean", "median"]);
        let text = format!("{}", err);
        assert!(text.contains("'mode'"));
        assert!(text.contains("'best', 'mean', 'median'"));
    }

    #[test]
    fn test_error_conversion() {
        let str_err: VisFitError = "test error".into();
        match str_err {
            VisFitError::Other(s) => assert_eq!(s, "test error"),
            _ => panic!("Expected Other variant"),
        }

        let json_err = serde_json::from_str::<f64>("not json").unwrap_err();
        let err: VisFitError = json_err.into();
        assert!(matches!(err, VisFitError::JsonError(_)));
    }
}
