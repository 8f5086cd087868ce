//! Process boundary trait for testability
//!
//! The pipeline never touches `std::env`, stdout, stderr or
//! `std::process::exit` directly. It goes through [`ProcessContext`], so
//! runs can be observed with a recording implementation.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::launch;

/// Process state and I/O surface used by one pipeline run.
pub trait ProcessContext: Send + Sync {
    /// Path the process was launched with. `None` if absent or not UTF-8.
    fn launch_path(&self) -> Option<&str>;

    /// Arguments after the program name.
    fn args(&self) -> &[String];

    /// Write one line to standard output.
    fn write_stdout(&self, line: &str);

    /// Write one line to standard error.
    fn write_stderr(&self, line: &str);

    /// Terminate with `code`.
    /// The real implementation never returns; test doubles record the code.
    fn exit(&self, code: i32);

    /// True iff `path` normalizes to the launch path.
    fn is_launch_target(&self, path: &str) -> bool {
        launch::is_launch_target(path, self.launch_path())
    }

    /// Negation of [`ProcessContext::is_launch_target`].
    fn is_loaded_as_library(&self, path: &str) -> bool {
        launch::is_loaded_as_library(path, self.launch_path())
    }
}

// ============================================================
// REAL IMPLEMENTATION
// ============================================================

/// The running process.
#[derive(Debug, Clone)]
pub struct SystemProcess {
    launch_path: Option<String>,
    args: Vec<String>,
}

impl SystemProcess {
    /// Capture `std::env::args_os()`.
    pub fn from_env() -> Self {
        Self::from_args_os(std::env::args_os())
    }

    /// Build from an explicit argv, program name first.
    pub fn from_args_os<I>(argv: I) -> Self
    where
        I: IntoIterator<Item = OsString>,
    {
        let mut argv = argv.into_iter();
        let launch_path = argv
            .next()
            .and_then(|arg0| arg0.into_string().ok())
            .map(|arg0| resolve_launch_path(&arg0));
        let args = argv
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        debug!(?launch_path, ?args, "captured process arguments");
        Self { launch_path, args }
    }
}

impl ProcessContext for SystemProcess {
    fn launch_path(&self) -> Option<&str> {
        self.launch_path.as_deref()
    }

    fn args(&self) -> &[String] {
        &self.args
    }

    fn write_stdout(&self, line: &str) {
        let mut out = io::stdout().lock();
        if let Err(e) = writeln!(out, "{line}").and_then(|_| out.flush()) {
            warn!("cannot write to stdout: {e}");
        }
    }

    fn write_stderr(&self, line: &str) {
        let mut err = io::stderr().lock();
        if let Err(e) = writeln!(err, "{line}").and_then(|_| err.flush()) {
            warn!("cannot write to stderr: {e}");
        }
    }

    fn exit(&self, code: i32) {
        debug!(code, "exiting");
        std::process::exit(code);
    }
}

/// Canonical path of the running executable, the usual "own path" of a binary.
pub fn current_exe_path() -> Option<String> {
    let exe = std::env::current_exe().ok()?;
    let exe = std::fs::canonicalize(&exe).unwrap_or(exe);
    exe.into_os_string().into_string().ok()
}

/// Turn argv[0] into a path comparable with [`current_exe_path`].
///
/// - bare name (found via `$PATH`): joined to the directory of the executable
/// - relative path: joined to the working directory, `.` components dropped
/// - result canonicalized when it exists
fn resolve_launch_path(arg0: &str) -> String {
    let path = Path::new(arg0);

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else if path.components().count() == 1 {
        match std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf)) {
            Some(dir) => dir.join(path),
            None => return arg0.to_string(),
        }
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd
                .join(path)
                .components()
                .filter(|c| !matches!(c, Component::CurDir))
                .collect::<PathBuf>(),
            Err(_) => return arg0.to_string(),
        }
    };

    let resolved = std::fs::canonicalize(&absolute).unwrap_or(absolute);
    resolved.to_string_lossy().into_owned()
}
