use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info};

use crate::{
    launcher::config::{parse_frontend_section, FrontendSettings, UiConfig},
    lib::errors::FrontendError,
};

/// What the bridge should do after a front-end handled output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontendControl {
    Continue,
    Quit,
}

/// Handle a front-end uses to push input bytes to the session.
///
/// Dropping every sender ends the bridge loop.
#[derive(Debug, Clone)]
pub struct InputSender {
    tx: mpsc::Sender<Vec<u8>>,
}

impl InputSender {
    pub(crate) fn new(tx: mpsc::Sender<Vec<u8>>) -> Self {
        Self { tx }
    }

    /// Queue input without blocking; fails when the queue is full or closed.
    pub fn try_send(&self, bytes: Vec<u8>) -> Result<(), FrontendError> {
        self.tx.try_send(bytes).map_err(|err| match err {
            TrySendError::Full(_) => FrontendError::new("input queue is full"),
            TrySendError::Closed(_) => FrontendError::new("session is closed"),
        })
    }
}

/// A UI that renders session output and produces input.
pub trait Frontend: Send {
    fn name(&self) -> &'static str;

    /// Called once before any output is delivered.
    fn start(&mut self, input: InputSender) -> Result<(), FrontendError>;

    fn handle_output(&mut self, chunk: &[u8]) -> Result<FrontendControl, FrontendError>;

    fn stop(&mut self) {}
}

/// Headless front-end that reports session output through `tracing`.
pub struct LogFrontend {
    settings: FrontendSettings,
    input: Option<InputSender>,
    chunks: u64,
    bytes: u64,
}

impl LogFrontend {
    pub fn new(config: &UiConfig) -> Self {
        Self::with_settings(parse_frontend_section(&config.document))
    }

    pub fn with_settings(settings: FrontendSettings) -> Self {
        Self {
            settings,
            input: None,
            chunks: 0,
            bytes: 0,
        }
    }

    pub fn settings(&self) -> &FrontendSettings {
        &self.settings
    }

    /// `(chunks, bytes)` received so far.
    pub fn received(&self) -> (u64, u64) {
        (self.chunks, self.bytes)
    }
}

impl Frontend for LogFrontend {
    fn name(&self) -> &'static str {
        "log"
    }

    fn start(&mut self, input: InputSender) -> Result<(), FrontendError> {
        // Held so the loop keeps running until the session closes.
        self.input = Some(input);
        info!(
            target: "nvim_ui::bridge",
            frontend = self.name(),
            title = %self.settings.title,
            "Front-end started"
        );
        Ok(())
    }

    fn handle_output(&mut self, chunk: &[u8]) -> Result<FrontendControl, FrontendError> {
        self.chunks += 1;
        self.bytes += chunk.len() as u64;
        if self.settings.log_chunks {
            info!(
                target: "nvim_ui::bridge",
                chunk = self.chunks,
                len = chunk.len(),
                "Session output"
            );
        } else {
            debug!(
                target: "nvim_ui::bridge",
                chunk = self.chunks,
                len = chunk.len(),
                "Session output"
            );
        }
        Ok(FrontendControl::Continue)
    }

    fn stop(&mut self) {
        self.input = None;
        info!(
            target: "nvim_ui::bridge",
            frontend = self.name(),
            chunks = self.chunks,
            bytes = self.bytes,
            "Front-end stopped"
        );
    }
}
