//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::{DomainError, Failure};

/// Application errors wrap domain errors and add runner-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("cannot serialize result: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("cannot start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

impl From<ApplicationError> for Failure {
    fn from(err: ApplicationError) -> Self {
        Failure::native(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_domain_error_when_converted_to_failure_then_native_with_message() {
        let err = ApplicationError::from(DomainError::DefaultsNotObject("[]".to_string()));
        let failure = Failure::from(err);
        assert_eq!(
            failure.message(),
            Some("defaults must be a JSON object, got: []")
        );
    }
}
