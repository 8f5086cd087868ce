//! Standard exit codes (BSD sysexits.h compatible where applicable)

/// Successful termination
pub const OK: i32 = 0;

/// Default failure code when nothing more specific is known
pub const FAILURE: i32 = 1;

/// Configuration error
pub const CONFIG: i32 = 78;
