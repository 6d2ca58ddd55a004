use std::{io, path::PathBuf, time::Duration};

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors that can occur while loading the UI configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to open or read the configuration file.
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The file was readable but is not a valid YAML mapping.
    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl ConfigError {
    /// Helper to wrap an I/O failure as a read failure.
    pub fn from_read_error(path: PathBuf, source: io::Error) -> Self {
        Self::Read { path, source }
    }

    /// Helper to wrap a YAML syntax or shape error as a parse failure.
    pub fn from_parse_error(path: PathBuf, source: serde_yaml::Error) -> Self {
        Self::Parse { path, source }
    }

    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

/// Failure to classify an address string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("address must not be empty")]
    Empty,
    #[error("invalid port in address `{address}`")]
    InvalidPort { address: String },
}

/// Failures while attaching to an editor instance.
#[derive(Debug, Error)]
pub enum AttachError {
    #[error("Failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("No command was given to spawn the editor")]
    EmptyCommand,
    #[error("Spawned process exited before {target} became connectable (status={status})")]
    ProcessExited { target: String, status: String },
    #[error("{target} did not become connectable after {attempts} attempts ({elapsed:?})")]
    TimedOut {
        target: String,
        attempts: u32,
        elapsed: Duration,
    },
    #[error("Attach to {target} was cancelled")]
    Cancelled { target: String },
    #[error("Unix domain sockets are not supported on this platform: {path}")]
    SocketUnsupported { path: PathBuf },
    #[error("Failed to check spawned process status: {source}")]
    Probe {
        #[source]
        source: io::Error,
    },
    #[error("Spawned process did not expose {stream}")]
    MissingPipe { stream: &'static str },
}

/// Failure that ends a readiness wait before the listener is up.
#[derive(Debug, Error)]
pub enum WaitError {
    /// The attach attempt failed with a non-transient error.
    #[error("Attach attempt failed: {source}")]
    Attach {
        #[source]
        source: io::Error,
    },
    /// The liveness check on the spawned process failed.
    #[error("Failed to check spawned process status: {source}")]
    Probe {
        #[source]
        source: io::Error,
    },
}

/// Failure reported by a front-end implementation.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct FrontendError {
    pub message: String,
}

impl FrontendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors raised while the bridge is running.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Session I/O failed: {source}")]
    SessionIo {
        #[source]
        source: io::Error,
    },
    #[error("Front-end `{frontend}` failed: {message}")]
    Frontend {
        frontend: &'static str,
        message: String,
    },
    #[error("Failed to write {sink} output: {source}")]
    Sink {
        sink: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Structured error metadata printed when the launcher exits with a failure.
#[derive(Debug, Clone)]
pub struct ErrorDescriptor {
    /// Error code.
    pub code: &'static str,
    /// User-facing message.
    pub message: &'static str,
    /// Recommended remediation.
    pub remediation: &'static str,
}

impl ErrorDescriptor {
    /// Simple constructor.
    pub const fn new(code: &'static str, message: &'static str, remediation: &'static str) -> Self {
        Self {
            code,
            message,
            remediation,
        }
    }

    /// Render the descriptor together with detail fields as a JSON object.
    pub fn to_payload(&self, details: Value) -> Value {
        let mut data = Map::new();
        data.insert("code".into(), Value::String(self.code.into()));
        data.insert("message".into(), Value::String(self.message.into()));
        data.insert(
            "remediation".into(),
            Value::String(self.remediation.into()),
        );
        if !details.is_null() {
            data.insert("details".into(), details);
        }
        Value::Object(data)
    }
}

pub const CONFIG_INVALID_ERROR: ErrorDescriptor = ErrorDescriptor::new(
    "config_invalid",
    "The UI configuration file could not be loaded",
    "Fix the YAML syntax or pass a different file with --config.",
);

pub const CONNECT_FAILED_ERROR: ErrorDescriptor = ErrorDescriptor::new(
    "connect_failed",
    "Could not attach to the editor instance",
    "Check that the editor is listening on the given address.",
);

pub const SPAWN_FAILED_ERROR: ErrorDescriptor = ErrorDescriptor::new(
    "spawn_failed",
    "The editor process could not be started",
    "Check the --prog command and that the editor is on PATH.",
);

pub const ATTACH_TIMEOUT_ERROR: ErrorDescriptor = ErrorDescriptor::new(
    "attach_timeout",
    "The spawned editor never became connectable",
    "Increase --wait-timeout or verify the editor honors NVIM_LISTEN_ADDRESS.",
);

pub const INVALID_LAUNCH_ERROR: ErrorDescriptor = ErrorDescriptor::new(
    "invalid_launch",
    "The launch options are invalid",
    "Run with --help to review the accepted options.",
);
