use std::process::ExitCode;

use anyhow::Error;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    bridge::{Bridge, BridgeExit, LogFrontend},
    cli::LaunchProfile,
    launcher::config::UiConfig,
    lib::{
        errors::{
            AttachError, ConfigError, ErrorDescriptor, ATTACH_TIMEOUT_ERROR, CONFIG_INVALID_ERROR,
            CONNECT_FAILED_ERROR, INVALID_LAUNCH_ERROR, SPAWN_FAILED_ERROR,
        },
        telemetry::{emit_launch_mode, LaunchTelemetry},
    },
    session::Establisher,
};

pub const EXIT_USAGE: u8 = 64;
pub const EXIT_UNAVAILABLE: u8 = 69;
pub const EXIT_OSERR: u8 = 71;
pub const EXIT_TEMPFAIL: u8 = 75;
pub const EXIT_CONFIG: u8 = 78;
pub const EXIT_INTERRUPTED: u8 = 130;

/// Bundles a runtime error message with an exit code and optional structured error data.
#[derive(Debug)]
pub struct RuntimeExit {
    message: String,
    exit_code: ExitCode,
    error_data: Option<Value>,
}

impl RuntimeExit {
    pub fn structured(
        descriptor: &ErrorDescriptor,
        message: impl Into<String>,
        details: Value,
        exit_code: u8,
    ) -> Self {
        Self {
            message: message.into(),
            exit_code: ExitCode::from(exit_code),
            error_data: Some(descriptor.to_payload(details)),
        }
    }

    pub fn from_error(err: impl Into<Error>) -> Self {
        let err = err.into();
        Self {
            message: format!("{err:?}"),
            exit_code: ExitCode::FAILURE,
            error_data: None,
        }
    }

    /// Invalid options detected after clap accepted them.
    pub fn usage(err: impl Into<Error>) -> Self {
        let err = err.into();
        Self::structured(
            &INVALID_LAUNCH_ERROR,
            format!("{err:#}"),
            json!({ "reason": format!("{err:#}") }),
            EXIT_USAGE,
        )
    }

    pub fn from_config_error(err: ConfigError) -> Self {
        let details = json!({
            "path": err.path().to_string_lossy(),
            "reason": err.to_string(),
        });
        Self::structured(&CONFIG_INVALID_ERROR, err.to_string(), details, EXIT_CONFIG)
    }

    pub fn from_attach_error(err: AttachError) -> Self {
        let message = err.to_string();
        let details = json!({ "reason": message });
        match err {
            AttachError::Spawn { .. }
            | AttachError::EmptyCommand
            | AttachError::MissingPipe { .. }
            | AttachError::Probe { .. } => {
                Self::structured(&SPAWN_FAILED_ERROR, message, details, EXIT_OSERR)
            }
            AttachError::TimedOut { .. } => {
                Self::structured(&ATTACH_TIMEOUT_ERROR, message, details, EXIT_TEMPFAIL)
            }
            AttachError::Cancelled { .. } => Self {
                message,
                exit_code: ExitCode::from(EXIT_INTERRUPTED),
                error_data: None,
            },
            _ => Self::structured(&CONNECT_FAILED_ERROR, message, details, EXIT_UNAVAILABLE),
        }
    }

    pub fn report(self) -> ExitCode {
        if let Some(data) = self.error_data {
            if let Ok(serialized) = serde_json::to_string(&data) {
                eprintln!("{serialized}");
            } else {
                eprintln!("{}", self.message);
            }
        } else {
            eprintln!("{}", self.message);
        }
        self.exit_code
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }

    pub fn error_data(&self) -> Option<&Value> {
        self.error_data.as_ref()
    }
}

/// Exit status for a bridge that ended without error.
pub fn exit_code_for(exit: BridgeExit) -> ExitCode {
    match exit {
        BridgeExit::Cancelled => ExitCode::from(EXIT_INTERRUPTED),
        _ => ExitCode::SUCCESS,
    }
}

/// Load configuration, attach to the editor, and run the UI bridge.
pub async fn run_launcher(profile: LaunchProfile) -> Result<BridgeExit, RuntimeExit> {
    let cancel = CancellationToken::new();
    let _shutdown = cancel.clone().drop_guard();
    watch_interrupt(cancel.clone());

    let config =
        UiConfig::load(profile.config_path.as_deref()).map_err(RuntimeExit::from_config_error)?;

    let target = profile.mode.target().map(|target| target.to_string());
    let config_source = config.source().to_string();
    emit_launch_mode(&LaunchTelemetry {
        mode: profile.mode.as_str(),
        target: target.as_deref(),
        argv: &profile.argv,
        config_source: &config_source,
        profile: profile.profile.map(|metric| metric.as_str()),
        notify: profile.notify,
        launch_args: &profile.launch_args,
    });

    let session = Establisher::new(profile.wait, cancel.clone())
        .establish(&profile.mode, &profile.argv)
        .await
        .map_err(RuntimeExit::from_attach_error)?;

    let ui = LogFrontend::new(&config);
    Bridge::new(cancel)
        .connect(session, ui, profile.profile, profile.notify)
        .await
        .map_err(RuntimeExit::from_error)
}

fn watch_interrupt(cancel: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => {
                    info!(target: "nvim_ui::runtime", "Interrupt received; shutting down");
                    cancel.cancel();
                }
                Err(err) => warn!(
                    target: "nvim_ui::runtime",
                    error = %err,
                    "Failed to listen for interrupts"
                ),
            },
            _ = cancel.cancelled() => {}
        }
    });
}
