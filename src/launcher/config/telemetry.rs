use std::{io, path::Path, path::PathBuf};

use tracing::{debug, info, warn};

use super::UiConfig;

pub fn log_skipped(path: &Path, err: &io::Error) {
    debug!(
        target: "nvim_ui::config",
        path = %path.display(),
        reason = %err,
        "Configuration candidate not readable; trying next"
    );
}

pub fn log_not_found(candidates: &[PathBuf]) {
    let tried: Vec<String> = candidates
        .iter()
        .map(|path| path.display().to_string())
        .collect();
    warn!(
        target: "nvim_ui::config",
        candidates = ?tried,
        "No configuration file found; using an empty configuration"
    );
}

pub fn log_loaded(config: &UiConfig) {
    info!(
        target: "nvim_ui::config",
        source = %config.source,
        keys = config.document.len(),
        "Configuration file loaded successfully"
    );
}
