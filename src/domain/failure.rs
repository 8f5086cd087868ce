//! Failure classification: every way a main function can fail, as one closed type

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Error carrying an explicit process exit code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct StructuredError {
    pub message: String,
    pub code: i32,
}

impl StructuredError {
    pub fn new(message: impl Into<String>, code: i32) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

/// Classified failure of a main function.
///
/// Built once at the boundary (`From` impls, [`Failure::native`],
/// [`Failure::from_panic`]) and matched exhaustively afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Bare message, e.g. a rejected future carrying a string.
    Message(String),
    /// Error value with a full textual trace (display, source chain, backtrace).
    Native { message: String, trace: String },
    /// Message plus the exit code to terminate with.
    Structured { message: String, code: i32 },
    /// Anything that could not be classified. Nothing is printed for it.
    Unknown,
}

impl Failure {
    /// Classify an error value as `Native`, rendering its source chain
    /// and, when `RUST_BACKTRACE` enables it, a backtrace.
    ///
    /// The backtrace is taken here, at classification, so it shows the
    /// conversion site (usually the pipeline boundary or a `?`), not the
    /// place the error was constructed.
    pub fn native(err: &(dyn StdError + 'static)) -> Self {
        let message = err.to_string();
        let mut trace = format!("Error: {message}");

        let mut source = err.source();
        while let Some(cause) = source {
            trace.push_str(&format!("\n  caused by: {cause}"));
            source = cause.source();
        }

        let backtrace = Backtrace::capture();
        if backtrace.status() == BacktraceStatus::Captured {
            trace.push_str(&format!("\n{backtrace}"));
        }

        Failure::Native { message, trace }
    }

    /// Classify a caught panic payload.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        Self::from_panic_at(payload, None)
    }

    /// Classify a caught panic payload raised at `location` (`file:line:col`).
    pub fn from_panic_at(payload: Box<dyn Any + Send>, location: Option<String>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Ok(s) = payload.downcast::<String>() {
            *s
        } else {
            return Failure::Unknown;
        };
        let trace = match location {
            Some(location) => format!("panicked at {location}: {message}"),
            None => format!("panicked: {message}"),
        };
        Failure::Native { message, trace }
    }

    /// Human-readable message, if the failure carries one.
    pub fn message(&self) -> Option<&str> {
        match self {
            Failure::Message(m) => Some(m),
            Failure::Native { message, .. } => Some(message),
            Failure::Structured { message, .. } => Some(message),
            Failure::Unknown => None,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Message(m) => write!(f, "{m}"),
            Failure::Native { message, .. } => write!(f, "Error: {message}"),
            Failure::Structured { message, code } => write!(f, "{message} (code {code})"),
            Failure::Unknown => write!(f, "unknown error"),
        }
    }
}

impl From<String> for Failure {
    fn from(message: String) -> Self {
        Failure::Message(message)
    }
}

impl From<&str> for Failure {
    fn from(message: &str) -> Self {
        Failure::Message(message.to_string())
    }
}

impl From<StructuredError> for Failure {
    fn from(err: StructuredError) -> Self {
        Failure::Structured {
            message: err.message,
            code: err.code,
        }
    }
}

impl From<std::io::Error> for Failure {
    fn from(err: std::io::Error) -> Self {
        Failure::native(&err)
    }
}

impl From<serde_json::Error> for Failure {
    fn from(err: serde_json::Error) -> Self {
        Failure::native(&err)
    }
}

impl From<Box<dyn StdError + Send + Sync>> for Failure {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        Failure::native(&*err)
    }
}

/// Duck-typed classification of a JSON error value.
///
/// - string: `Message`
/// - object with `message` and an integer `code`: `Structured`
/// - object with `message` and a non-integer `code`: `Message`
/// - anything else: `Unknown`
impl From<Value> for Failure {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Failure::Message(s),
            Value::Object(map) => {
                let (Some(message), Some(code)) = (map.get("message"), map.get("code")) else {
                    return Failure::Unknown;
                };
                let message = match message {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                match code.as_i64().and_then(|c| i32::try_from(c).ok()) {
                    Some(code) => Failure::Structured { message, code },
                    None => Failure::Message(message),
                }
            }
            _ => Failure::Unknown,
        }
    }
}
