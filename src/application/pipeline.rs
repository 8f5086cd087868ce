//! Run pipeline: gate, parse, merge, invoke, settle
//!
//! One run ends in exactly one [`ProcessContext::exit`] call when the gate
//! passes, and in none when it does not.
//!
//! ```text
//! Idle ─┬─ gate fails ──> Skipped
//!       └─ gate passes ─> Parsing ─> Invoking ─┬─> Succeeding ─> Exited(0)
//!                                              └─> Failing ────> Exited(handler | code | 1)
//! ```

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::pin;

use futures::future::poll_fn;
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::application::parser::parse_args;
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::{Arguments, Failure};
use crate::exitcode;
use crate::infrastructure::{panic_hook, ProcessContext};

/// Called with the success value. Its return is ignored.
pub type SuccessHandler<T> = Box<dyn FnOnce(T)>;

/// Called with the failure. `Some(code)` becomes the exit code, `None` means 1.
pub type ErrorHandler = Box<dyn FnOnce(&Failure) -> Option<i32>>;

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Not the launch target: nothing parsed, printed or exited.
    Skipped,
    /// Exit was requested with this code.
    Exited(i32),
}

/// Runs a main function as a command-line program.
///
/// # Example
/// ```ignore
/// Processify::new(Arguments::new().positional(0, "mode").named("paramA", 1))
///     .on_success(|answer: String| println!("{answer}"))
///     .run(&SystemProcess::from_env(), &own_path, |args| compute(args));
/// ```
pub struct Processify<T> {
    defaults: Arguments,
    settings: Settings,
    on_success: Option<SuccessHandler<T>>,
    on_error: Option<ErrorHandler>,
}

impl<T: Serialize> Processify<T> {
    pub fn new(defaults: Arguments) -> Self {
        Self {
            defaults,
            settings: Settings::default(),
            on_success: None,
            on_error: None,
        }
    }

    /// Defaults given as a JSON object (`{"0": "mode", "paramA": 1}`).
    pub fn from_json(defaults: Value) -> ApplicationResult<Self> {
        Ok(Self::new(Arguments::from_value(defaults)?))
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn on_success(mut self, handler: impl FnOnce(T) + 'static) -> Self {
        self.on_success = Some(Box::new(handler));
        self
    }

    pub fn on_error(mut self, handler: impl FnOnce(&Failure) -> Option<i32> + 'static) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Run a synchronous main function.
    ///
    /// Both `Err` returns and panics take the failure path.
    #[instrument(level = "debug", skip_all, fields(own_path = %own_path))]
    pub fn run<F, E>(self, ctx: &dyn ProcessContext, own_path: &str, main: F) -> RunState
    where
        F: FnOnce(Arguments) -> Result<T, E>,
        E: Into<Failure>,
    {
        let Some(args) = self.prepare(ctx, own_path) else {
            return RunState::Skipped;
        };

        let caught = panic_hook::quiet(|| panic::catch_unwind(AssertUnwindSafe(|| main(args))));
        let outcome = match caught {
            Ok(result) => result.map_err(Into::into),
            Err(payload) => Err(Failure::from_panic_at(payload, panic_hook::take_location())),
        };
        self.settle(ctx, outcome)
    }

    /// Run an asynchronous main function inside the caller's runtime.
    #[instrument(level = "debug", skip_all, fields(own_path = %own_path))]
    pub async fn run_async<F, Fut, E>(
        self,
        ctx: &dyn ProcessContext,
        own_path: &str,
        main: F,
    ) -> RunState
    where
        F: FnOnce(Arguments) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<Failure>,
    {
        let Some(args) = self.prepare(ctx, own_path) else {
            return RunState::Skipped;
        };
        let outcome = invoke_async(main, args).await;
        self.settle(ctx, outcome)
    }

    /// Run an asynchronous main function on a single-threaded runtime.
    ///
    /// The runtime is only built once the gate has passed.
    #[instrument(level = "debug", skip_all, fields(own_path = %own_path))]
    pub fn run_blocking<F, Fut, E>(self, ctx: &dyn ProcessContext, own_path: &str, main: F) -> RunState
    where
        F: FnOnce(Arguments) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<Failure>,
    {
        let Some(args) = self.prepare(ctx, own_path) else {
            return RunState::Skipped;
        };

        let outcome = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime.block_on(invoke_async(main, args)),
            Err(e) => Err(ApplicationError::Runtime(e).into()),
        };
        self.settle(ctx, outcome)
    }

    /// Gate, parse and merge. `None` when `own_path` is not the launch target.
    fn prepare(&self, ctx: &dyn ProcessContext, own_path: &str) -> Option<Arguments> {
        if !ctx.is_launch_target(own_path) {
            debug!(
                own_path,
                launch_path = ?ctx.launch_path(),
                "not the launch target, skipping"
            );
            return None;
        }

        let parsed = parse_args(ctx.args(), &self.settings);
        let args = self.defaults.merged(&parsed);
        info!(arguments = %args.to_value(), "invoking main");
        Some(args)
    }

    fn settle(self, ctx: &dyn ProcessContext, outcome: Result<T, Failure>) -> RunState {
        let Processify {
            on_success,
            on_error,
            ..
        } = self;

        let code = match outcome {
            Ok(value) => match succeed(on_success, ctx, value) {
                Ok(code) => code,
                Err(failure) => fail(on_error, ctx, failure),
            },
            Err(failure) => fail(on_error, ctx, failure),
        };

        debug!(code, "run settled");
        ctx.exit(code);
        RunState::Exited(code)
    }
}

async fn invoke_async<T, F, Fut, E>(main: F, args: Arguments) -> Result<T, Failure>
where
    F: FnOnce(Arguments) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<Failure>,
{
    // The call itself sits inside the async block so a panic before the
    // first await is caught as well.
    let mut caught = pin!(AssertUnwindSafe(async move { main(args).await }).catch_unwind());

    // Every poll runs quiet: the task may hop threads between polls.
    match poll_fn(|cx| panic_hook::quiet(|| caught.as_mut().poll(cx))).await {
        Ok(result) => result.map_err(Into::into),
        Err(payload) => Err(Failure::from_panic_at(payload, panic_hook::take_location())),
    }
}

fn succeed<T: Serialize>(
    on_success: Option<SuccessHandler<T>>,
    ctx: &dyn ProcessContext,
    value: T,
) -> Result<i32, Failure> {
    if let Some(handler) = on_success {
        handler(value);
        return Ok(exitcode::OK);
    }

    let json = serde_json::to_string(&value).map_err(ApplicationError::from)?;
    if json != "null" {
        ctx.write_stdout(&json);
    }
    Ok(exitcode::OK)
}

fn fail(on_error: Option<ErrorHandler>, ctx: &dyn ProcessContext, failure: Failure) -> i32 {
    debug!(?failure, "main failed");

    if let Some(handler) = on_error {
        return handler(&failure).unwrap_or(exitcode::FAILURE);
    }

    match failure {
        Failure::Message(message) => {
            ctx.write_stderr(&message);
            exitcode::FAILURE
        }
        Failure::Native { trace, .. } => {
            ctx.write_stderr(&trace);
            exitcode::FAILURE
        }
        Failure::Structured { message, code } => {
            ctx.write_stderr(&message);
            code
        }
        Failure::Unknown => exitcode::FAILURE,
    }
}
