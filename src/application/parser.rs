//! Command-line token parsing into positional and named values
//!
//! Supported forms:
//! - `value`                  positional (kept as string)
//! - `--name value`, `-name value`
//! - `--name=value`, `-name=value`
//! - `--name` with no value   `name = true`
//! - `--no-name`              `name = false` (if enabled)
//! - `--`                     everything after is positional

use serde_json::{Number, Value};
use tracing::{debug, instrument};

use crate::config::Settings;
use crate::domain::ParsedArgs;

/// Parse raw tokens (program name already removed).
#[instrument(level = "debug", skip(settings))]
pub fn parse_args(tokens: &[String], settings: &Settings) -> ParsedArgs {
    let mut parsed = ParsedArgs::default();
    let mut iter = tokens.iter().peekable();

    while let Some(token) = iter.next() {
        if token == "--" {
            parsed
                .positional
                .extend(iter.by_ref().map(|t| Value::String(t.clone())));
            break;
        }

        let Some(body) = flag_body(token) else {
            parsed.positional.push(Value::String(token.clone()));
            continue;
        };

        if let Some((name, value)) = body.split_once('=') {
            parsed
                .named
                .insert(name.to_string(), coerce(value, settings));
            continue;
        }

        if settings.negated_flags {
            if let Some(name) = body.strip_prefix("no-").filter(|n| !n.is_empty()) {
                parsed.named.insert(name.to_string(), Value::Bool(false));
                continue;
            }
        }

        let value = match iter.peek() {
            Some(next) if takes_value(next) => {
                let value = coerce(next, settings);
                iter.next();
                value
            }
            _ => Value::Bool(true),
        };
        parsed.named.insert(body.to_string(), value);
    }

    debug!(?parsed, "parsed arguments");
    parsed
}

/// Flag name (with any `=value` suffix) if `token` is a flag.
///
/// `-` alone, negative numbers and empty names are not flags.
fn flag_body(token: &str) -> Option<&str> {
    if token.len() < 2 || !token.starts_with('-') || parse_number(token).is_some() {
        return None;
    }
    let body = token
        .strip_prefix("--")
        .or_else(|| token.strip_prefix('-'))?;
    if body.is_empty() || body.starts_with('=') {
        return None;
    }
    Some(body)
}

fn takes_value(next: &str) -> bool {
    !next.starts_with('-') || next == "-" || parse_number(next).is_some()
}

fn coerce(raw: &str, settings: &Settings) -> Value {
    if settings.coerce_booleans {
        match raw {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            _ => {}
        }
    }
    if settings.coerce_numbers {
        if let Some(number) = parse_number(raw) {
            return Value::Number(number);
        }
    }
    Value::String(raw.to_string())
}

/// Finite decimal number. Rejects `inf`/`nan`, which `f64::from_str` accepts.
fn parse_number(raw: &str) -> Option<Number> {
    if !raw
        .trim_start_matches(['-', '+'])
        .starts_with(|c: char| c.is_ascii_digit() || c == '.')
    {
        return None;
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Some(Number::from(int));
    }
    raw.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
}
