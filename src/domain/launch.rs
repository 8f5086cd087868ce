//! Launch-target detection by normalized path comparison
//!
//! A path is the launch target when it equals the process's launch path
//! after stripping the extension and lower-casing both sides. This tolerates
//! `demo` vs `demo.exe` and case-insensitive filesystems.

/// Remove everything from the last `.` onwards. Paths without a `.` are
/// returned unchanged.
pub fn strip_extension(path: &str) -> &str {
    match path.rfind('.') {
        Some(idx) => &path[..idx],
        None => path,
    }
}

/// Extension-stripped, lower-cased form used for comparison.
pub fn normalize(path: &str) -> String {
    strip_extension(path).to_lowercase()
}

/// True iff `path` names the program the process was launched with.
///
/// A missing launch path never counts as a match.
pub fn is_launch_target(path: &str, launch_path: Option<&str>) -> bool {
    match launch_path {
        Some(launch) => normalize(path) == normalize(launch),
        None => false,
    }
}

/// Negation of [`is_launch_target`]: `path` is being used as a library.
pub fn is_loaded_as_library(path: &str, launch_path: Option<&str>) -> bool {
    !is_launch_target(path, launch_path)
}
