//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent invalid argument shapes.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, PartialEq)]
pub enum DomainError {
    #[error("defaults must be a JSON object, got: {0}")]
    DefaultsNotObject(String),

    #[error("invalid positional index: {0}")]
    InvalidIndex(String),
}
