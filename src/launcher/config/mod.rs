//! Load the UI configuration document.
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use serde_json::{Map, Value};
use tracing::{error, info};

use crate::lib::{errors::ConfigError, paths::expand_home};

pub mod frontend;
pub mod telemetry;

pub use frontend::{parse_frontend_section, FrontendSettings, DEFAULT_TITLE};

/// Candidate files tried in order when `--config` is absent.
pub const CONFIG_FILES: [&str; 3] = [
    ".pynvim.yaml",
    "~/.pynvim.yaml",
    "~/.config/pynvim/config.yaml",
];

/// Untyped configuration mapping handed to the front-end.
pub type Document = Map<String, Value>;

/// Where the configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    Discovered(PathBuf),
    NotFound,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Explicit(path) => write!(f, "explicit:{}", path.display()),
            ConfigSource::Discovered(path) => write!(f, "discovered:{}", path.display()),
            ConfigSource::NotFound => f.write_str("not_found"),
        }
    }
}

/// Parsed UI configuration plus its provenance.
#[derive(Debug, Clone)]
pub struct UiConfig {
    pub document: Document,
    pub source: ConfigSource,
}

impl UiConfig {
    /// Configuration used when no candidate file exists.
    pub fn not_found() -> Self {
        Self {
            document: Document::new(),
            source: ConfigSource::NotFound,
        }
    }

    /// Load `explicit` if given, otherwise search [`CONFIG_FILES`].
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load_from_path(path),
            None => Self::load_from_candidates(&default_candidates()),
        }
    }

    /// Load a specific file; any failure is fatal.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        info!(
            target: "nvim_ui::config",
            path = %path.display(),
            "Starting configuration load"
        );

        let bytes = fs::read(path).map_err(|err| {
            let error = ConfigError::from_read_error(path.to_path_buf(), err);
            error!(
                target: "nvim_ui::config",
                path = %path.display(),
                reason = %error,
                "Failed to read configuration file"
            );
            error
        })?;

        let config = Self {
            document: parse_document(path, &bytes)?,
            source: ConfigSource::Explicit(path.to_path_buf()),
        };
        telemetry::log_loaded(&config);
        Ok(config)
    }

    /// Try each candidate in order.
    ///
    /// Unreadable candidates are skipped. The first readable one is parsed and
    /// returned, and a parse failure there is an error rather than a skip.
    pub fn load_from_candidates(candidates: &[PathBuf]) -> Result<Self, ConfigError> {
        for path in candidates {
            let bytes = match fs::read(path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    telemetry::log_skipped(path, &err);
                    continue;
                }
            };

            let config = Self {
                document: parse_document(path, &bytes)?,
                source: ConfigSource::Discovered(path.clone()),
            };
            telemetry::log_loaded(&config);
            return Ok(config);
        }

        telemetry::log_not_found(candidates);
        Ok(Self::not_found())
    }

    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.document.get(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }
}

/// [`CONFIG_FILES`] with `~` expanded.
pub fn default_candidates() -> Vec<PathBuf> {
    CONFIG_FILES.iter().map(|path| expand_home(path)).collect()
}

fn parse_document(path: &Path, bytes: &[u8]) -> Result<Document, ConfigError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Document::new());
    }

    // Keys are kept exactly as written; a `null` document is an empty mapping.
    serde_yaml::from_slice::<Option<Document>>(bytes)
        .map(Option::unwrap_or_default)
        .map_err(|err| {
            let error = ConfigError::from_parse_error(path.to_path_buf(), err);
            error!(
                target: "nvim_ui::config",
                path = %path.display(),
                reason = %error,
                "Failed to parse configuration file"
            );
            error
        })
}
