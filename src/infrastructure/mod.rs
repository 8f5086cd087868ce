//! Infrastructure layer: the process boundary
//!
//! This layer implements the I/O boundary trait against the real process.

pub mod panic_hook;
pub mod traits;

pub use traits::{current_exe_path, ProcessContext, SystemProcess};
