//! Application layer: argument parsing and the run pipeline
//!
//! This layer orchestrates domain logic and depends on the process boundary trait.

pub mod error;
pub mod parser;
pub mod pipeline;

pub use error::{ApplicationError, ApplicationResult};
pub use parser::parse_args;
pub use pipeline::{Processify, RunState};
