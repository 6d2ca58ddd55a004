//! Telemetry initialization and attach span helpers.

use std::time::Instant;

use anyhow::Result;
use tracing::{info, info_span, Span};
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize `tracing` and format developer logs.
pub fn init_tracing() -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))
}

/// Span helper recording how long an attach took and how many attempts it needed.
pub struct AttachSpan {
    span: Span,
    started_at: Instant,
    attempts: u32,
}

impl AttachSpan {
    /// Start an attach span.
    pub fn start(mode: &'static str, target: &str) -> Self {
        let span = info_span!(
            target: "nvim_ui::session",
            "attach",
            mode,
            target = %target
        );
        Self {
            span,
            started_at: Instant::now(),
            attempts: 0,
        }
    }

    pub fn record_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    /// Close the span while recording status and attempt count.
    pub fn finish(self, status: &'static str) {
        let elapsed_ms = self.started_at.elapsed().as_millis();
        let _entered = self.span.enter();
        info!(
            target: "nvim_ui::session",
            status = status,
            attempts = self.attempts,
            elapsed_ms = elapsed_ms,
            "Finished attach"
        );
    }
}

/// Payload for logging the resolved launch mode as structured telemetry.
#[derive(Debug)]
pub struct LaunchTelemetry<'a> {
    pub mode: &'a str,
    pub target: Option<&'a str>,
    pub argv: &'a [String],
    pub config_source: &'a str,
    pub profile: Option<&'a str>,
    pub notify: bool,
    pub launch_args: &'a [String],
}

/// Emit launch mode to `tracing`.
pub fn emit_launch_mode(telemetry: &LaunchTelemetry<'_>) {
    info!(
        target: "nvim_ui::runtime",
        mode = telemetry.mode,
        target_address = telemetry.target.unwrap_or(""),
        argv = ?telemetry.argv,
        config_source = telemetry.config_source,
        profile = telemetry.profile.unwrap_or("disable"),
        notify = telemetry.notify,
        launch_args = ?telemetry.launch_args,
        "Starting UI bridge"
    );
}
