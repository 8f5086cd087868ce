//! Domain layer: argument model, failure classification, launch detection
//!
//! This layer is independent of external concerns (no I/O, no process state).

pub mod arguments;
pub mod error;
pub mod failure;
pub mod launch;

pub use arguments::{Arguments, ParsedArgs};
pub use error::DomainError;
pub use failure::{Failure, StructuredError};
pub use launch::{is_launch_target, is_loaded_as_library, normalize, strip_extension};
