//! Error types for windmesh

use thiserror::Error;

/// Main error type for windmesh operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed input to a component (k < 1, cutoff ≤ 0, unknown field, ...).
    #[error("Invalid argument: {name} = {value} ({reason})")]
    InvalidArgument {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// A single variogram fit (or its cross-validation) failed.
    ///
    /// Recovered locally by the model selector, which discards the candidate.
    #[error("Variogram fit failed: {0}")]
    FitFailure(String),

    /// Singular kriging system or unmodelled residual structure.
    #[error("Computation error: {0}")]
    Computation(String),

    /// A sample resolved to zero or one point.
    #[error("Insufficient data for {what}: {count} point(s)")]
    InsufficientData { what: &'static str, count: usize },

    /// A fatal error tagged with the orchestrator stage that raised it.
    #[error("stage `{stage}` failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for [`Error::InvalidArgument`].
    pub fn invalid(name: &'static str, value: impl ToString, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Wrap this error with the name of the stage that produced it.
    pub fn in_stage(self, stage: &'static str) -> Self {
        match self {
            // keep the innermost stage
            Error::Stage { .. } => self,
            other => Error::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Name of the failing stage, if this error was raised by the orchestrator.
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            Error::Stage { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

/// Result type alias for windmesh operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_wrapping_keeps_innermost() {
        let err = Error::Computation("singular".into())
            .in_stage("predict")
            .in_stage("suite");
        assert_eq!(err.stage(), Some("predict"));
        let msg = err.to_string();
        assert!(msg.contains("predict") && msg.contains("singular"), "{msg}");
    }

    #[test]
    fn test_invalid_argument_message() {
        let err = Error::invalid("k", 0, "must be at least 1");
        assert_eq!(err.to_string(), "Invalid argument: k = 0 (must be at least 1)");
        assert!(err.stage().is_none());
    }
}
