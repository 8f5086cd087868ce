//! Isomorphic entry points.
//!
//! Lets one program act both as a library and as a directly launched
//! command-line tool: detect whether it is the launch target, parse shell
//! arguments over defaults, call a main function and map its outcome to
//! stdout/stderr and an exit code.

pub mod application;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use application::{parse_args, ApplicationError, ApplicationResult, Processify, RunState};
pub use config::Settings;
pub use domain::{
    is_launch_target, is_loaded_as_library, Arguments, DomainError, Failure, ParsedArgs,
    StructuredError,
};
pub use infrastructure::{current_exe_path, ProcessContext, SystemProcess};
