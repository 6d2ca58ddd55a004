//! Shared path helpers.

use std::path::{Path, PathBuf};

/// Expand a leading `~` to the user's home directory.
///
/// Paths without a leading `~`, or when no home directory can be determined,
/// are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    expand_home_with(path, dirs::home_dir().as_deref())
}

fn expand_home_with(path: &str, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return PathBuf::from(path);
    };
    if path == "~" {
        return home.to_path_buf();
    }
    match path.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None => PathBuf::from(path),
    }
}
