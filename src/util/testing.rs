use std::sync::{Mutex, Once};
use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::infrastructure::ProcessContext;

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    debug!("INIT: Attempting logger init from testing.rs");

    // Create a filter for noisy modules
    let noisy_modules = ["tokio", "runtime"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::ENTER)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Process double that records output and exit calls instead of performing them.
#[derive(Debug, Default)]
pub struct RecordingProcess {
    launch_path: Option<String>,
    args: Vec<String>,
    stdout: Mutex<Vec<String>>,
    stderr: Mutex<Vec<String>>,
    exits: Mutex<Vec<i32>>,
}

impl RecordingProcess {
    pub fn new(launch_path: Option<&str>, args: &[&str]) -> Self {
        Self {
            launch_path: launch_path.map(str::to_string),
            args: args.iter().map(|a| a.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Process launched with `launch_path`.
    pub fn launched(launch_path: &str, args: &[&str]) -> Self {
        Self::new(Some(launch_path), args)
    }

    pub fn stdout(&self) -> Vec<String> {
        lock(&self.stdout).clone()
    }

    pub fn stderr(&self) -> Vec<String> {
        lock(&self.stderr).clone()
    }

    pub fn exit_codes(&self) -> Vec<i32> {
        lock(&self.exits).clone()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ProcessContext for RecordingProcess {
    fn launch_path(&self) -> Option<&str> {
        self.launch_path.as_deref()
    }

    fn args(&self) -> &[String] {
        &self.args
    }

    fn write_stdout(&self, line: &str) {
        lock(&self.stdout).push(line.to_string());
    }

    fn write_stderr(&self, line: &str) {
        lock(&self.stderr).push(line.to_string());
    }

    fn exit(&self, code: i32) {
        lock(&self.exits).push(code);
    }
}
