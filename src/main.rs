use std::path::Path;
use std::time::Duration;

use colored::Colorize;
use processify::{
    current_exe_path, exitcode, Arguments, Failure, Processify, RunState, Settings, SystemProcess,
};
use serde_json::Value;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

#[derive(Error, Debug)]
enum DemoError {
    #[error("Params {0} is different from {1}.")]
    ParamMismatch(String, String),

    #[error("Please select a mode (sync or promise) as first argument.")]
    MissingMode,
}

impl From<DemoError> for Failure {
    fn from(err: DemoError) -> Self {
        Failure::native(&err)
    }
}

/// Returns `answer` when both params are equal.
fn processified_sync(param_a: &Value, param_b: &Value, answer: Value) -> Result<Value, DemoError> {
    if param_a != param_b {
        return Err(DemoError::ParamMismatch(plain(param_a), plain(param_b)));
    }
    Ok(answer)
}

/// Like [`processified_sync`], but resolves after 500ms and rejects with a bare message.
async fn processified_promise(
    param_a: &Value,
    param_b: &Value,
    answer: Value,
) -> Result<Value, String> {
    tokio::time::sleep(Duration::from_millis(500)).await;
    if param_a != param_b {
        return Err(format!(
            "Params {} is different from {}.",
            plain(param_a),
            plain(param_b)
        ));
    }
    Ok(answer)
}

/// Maps `mode` (first positional) to one of the processified functions.
/// `panic` is there to show a panicking main going through the error handler.
async fn demo_main(args: Arguments) -> Result<Value, Failure> {
    let null = Value::Null;
    let param_a = args.get_named("paramA").unwrap_or(&null);
    let param_b = args.get_named("paramB").unwrap_or(&null);
    let answer = args.get(1).cloned().unwrap_or(Value::Null);

    match args.str_at(0) {
        Some("promise") => Ok(processified_promise(param_a, param_b, answer).await?),
        Some("sync") => Ok(processified_sync(param_a, param_b, answer)?),
        Some("panic") => panic!("{} went wrong", plain(&answer)),
        _ => Err(DemoError::MissingMode.into()),
    }
}

fn defaults() -> Arguments {
    Arguments::new()
        .positional(0, "mode")
        .positional(1, "default answer")
        .named("paramA", 1)
        .named("paramB", 1)
}

/// Strings without quotes, everything else as JSON.
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn main() {
    let settings = match Settings::load(Some(Path::new("processify.toml"))) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(exitcode::CONFIG);
        }
    };

    setup_logging(settings.verbosity);

    let ctx = SystemProcess::from_env();
    let own_path = current_exe_path().unwrap_or_default();

    let state = Processify::new(defaults())
        .with_settings(settings)
        .on_success(|result: Value| {
            println!("Custom success handler : {}", plain(&result));
        })
        .on_error(|error| {
            eprintln!("{}", format!("Custom error handler : {error}").red());
            None
        })
        .run_blocking(&ctx, &own_path, demo_main);

    if state == RunState::Skipped {
        tracing::info!("launched under another name, nothing to do");
    }
}

fn setup_logging(verbosity: u8) {
    tracing::debug!("INIT: Attempting logger init from main.rs");

    let filter = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        3 => LevelFilter::TRACE,
        _ => {
            eprintln!("Don't be crazy, max verbosity is 3");
            LevelFilter::TRACE
        }
    };

    // Create a noisy module filter
    let noisy_modules = ["tokio", "runtime"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    // Create a subscriber with formatted output directed to stderr
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr) // Set writer first
        .with_target(true)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    // Apply filters to the layer
    let filtered_layer = fmt_layer.with_filter(filter).with_filter(module_filter);

    tracing_subscriber::registry().with(filtered_layer).init();

    match filter {
        LevelFilter::INFO => tracing::info!("Debug mode: info"),
        LevelFilter::DEBUG => tracing::debug!("Debug mode: debug"),
        LevelFilter::TRACE => tracing::debug!("Debug mode: trace"),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn given_equal_params_when_sync_then_returns_answer() {
        let result = processified_sync(&json!(1), &json!(1), json!("42")).unwrap();
        assert_eq!(result, json!("42"));
    }

    #[test]
    fn given_different_params_when_sync_then_mismatch_message() {
        let err = processified_sync(&json!(1), &json!(2), json!("42")).unwrap_err();
        assert_eq!(err.to_string(), "Params 1 is different from 2.");
    }

    #[tokio::test]
    async fn given_different_params_when_promise_then_rejects_with_message() {
        let err = processified_promise(&json!(5), &json!(6), json!("ok"))
            .await
            .unwrap_err();
        assert_eq!(err, "Params 5 is different from 6.");
    }

    #[tokio::test]
    async fn given_unknown_mode_when_dispatching_then_native_failure() {
        let failure = demo_main(defaults()).await.unwrap_err();
        assert_eq!(
            failure.message(),
            Some("Please select a mode (sync or promise) as first argument.")
        );
    }
}
