//! Pairs a session with a front-end and runs the combined event loop.
use std::{
    io::{self, Write},
    time::Instant,
};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{lib::errors::BridgeError, session::Session};

mod frontend;
mod profiler;

pub use frontend::{Frontend, FrontendControl, InputSender, LogFrontend};
pub use profiler::{CallStats, Profiler, SortMetric};

const READ_BUFFER_SIZE: usize = 64 * 1024;
const INPUT_QUEUE_CAPACITY: usize = 256;
/// Line written to the notify sink once the UI has applied its first output.
pub const ATTACHED_NOTICE: &[u8] = b"attached\n";

/// Why the bridge loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeExit {
    SessionClosed,
    FrontendQuit,
    FrontendClosed,
    Cancelled,
}

impl BridgeExit {
    pub const fn as_str(&self) -> &'static str {
        match self {
            BridgeExit::SessionClosed => "session_closed",
            BridgeExit::FrontendQuit => "frontend_quit",
            BridgeExit::FrontendClosed => "frontend_closed",
            BridgeExit::Cancelled => "cancelled",
        }
    }
}

struct LoopState {
    profiler: Option<Profiler>,
    pending_notify: bool,
}

/// Runs the session/front-end event loop until either side ends it.
pub struct Bridge {
    cancel: CancellationToken,
    notify_sink: Box<dyn Write + Send>,
    report_sink: Box<dyn Write + Send>,
}

impl Bridge {
    /// Notify lines go to stdout and profile reports to stderr.
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            notify_sink: Box::new(io::stdout()),
            report_sink: Box::new(io::stderr()),
        }
    }

    pub fn with_notify_sink(mut self, sink: Box<dyn Write + Send>) -> Self {
        self.notify_sink = sink;
        self
    }

    pub fn with_report_sink(mut self, sink: Box<dyn Write + Send>) -> Self {
        self.report_sink = sink;
        self
    }

    /// Take ownership of `session` and `ui` and run until one of them ends.
    ///
    /// With `profile` set, a timing report ordered by that metric is written
    /// to the report sink when the loop finishes, including on error.
    pub async fn connect<F: Frontend>(
        mut self,
        session: Session,
        mut ui: F,
        profile: Option<SortMetric>,
        notify: bool,
    ) -> Result<BridgeExit, BridgeError> {
        let kind = session.kind();
        let peer = session.peer().to_string();
        let (stream, _process) = session.into_parts();
        let (mut reader, mut writer) = tokio::io::split(stream);
        let (input_tx, mut input_rx) = mpsc::channel::<Vec<u8>>(INPUT_QUEUE_CAPACITY);

        let frontend = ui.name();
        ui.start(InputSender::new(input_tx))
            .map_err(|err| BridgeError::Frontend {
                frontend,
                message: err.message,
            })?;
        info!(
            target: "nvim_ui::bridge",
            session = kind.as_str(),
            peer = %peer,
            frontend,
            profile = profile.map(|metric| metric.as_str()).unwrap_or("disable"),
            notify,
            "Bridge connected"
        );

        let mut state = LoopState {
            profiler: profile.map(Profiler::new),
            pending_notify: notify,
        };
        let mut buf = vec![0u8; READ_BUFFER_SIZE];

        let result = loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break Ok(BridgeExit::Cancelled),
                read = reader.read(&mut buf) => match read {
                    Ok(0) => break Ok(BridgeExit::SessionClosed),
                    Ok(len) => match self.dispatch_output(&mut ui, &buf[..len], &mut state) {
                        Ok(FrontendControl::Continue) => {}
                        Ok(FrontendControl::Quit) => break Ok(BridgeExit::FrontendQuit),
                        Err(err) => break Err(err),
                    },
                    Err(source) => break Err(BridgeError::SessionIo { source }),
                },
                input = input_rx.recv() => match input {
                    Some(bytes) => {
                        let started_at = Instant::now();
                        let written = match writer.write_all(&bytes).await {
                            Ok(()) => writer.flush().await,
                            Err(err) => Err(err),
                        };
                        if let Some(profiler) = state.profiler.as_mut() {
                            profiler.record("session.write", started_at.elapsed());
                        }
                        if let Err(source) = written {
                            break Err(BridgeError::SessionIo { source });
                        }
                    }
                    None => break Ok(BridgeExit::FrontendClosed),
                },
            }
        };

        ui.stop();
        if let Err(err) = writer.shutdown().await {
            debug!(
                target: "nvim_ui::bridge",
                error = %err,
                "Session shutdown failed"
            );
        }
        if let Some(profiler) = state.profiler.as_ref() {
            if let Err(err) = profiler.write_report(self.report_sink.as_mut()) {
                warn!(
                    target: "nvim_ui::bridge",
                    error = %err,
                    "Failed to write profile report"
                );
            }
        }

        match &result {
            Ok(exit) => info!(
                target: "nvim_ui::bridge",
                exit = exit.as_str(),
                "Bridge finished"
            ),
            Err(err) => warn!(
                target: "nvim_ui::bridge",
                error = %err,
                "Bridge failed"
            ),
        }
        result
    }

    fn dispatch_output<F: Frontend>(
        &mut self,
        ui: &mut F,
        chunk: &[u8],
        state: &mut LoopState,
    ) -> Result<FrontendControl, BridgeError> {
        let notify_sink = &mut self.notify_sink;
        let pending_notify = &mut state.pending_notify;
        profiled(state.profiler.as_mut(), "bridge.dispatch", |profiler| {
            let frontend = ui.name();
            let control = profiled(profiler, "frontend.handle_output", |_| {
                ui.handle_output(chunk)
            })
            .map_err(|err| BridgeError::Frontend {
                frontend,
                message: err.message,
            })?;

            if *pending_notify {
                *pending_notify = false;
                notify_sink
                    .write_all(ATTACHED_NOTICE)
                    .and_then(|_| notify_sink.flush())
                    .map_err(|source| BridgeError::Sink {
                        sink: "notify",
                        source,
                    })?;
            }
            Ok(control)
        })
    }
}

fn profiled<T>(
    profiler: Option<&mut Profiler>,
    name: &'static str,
    f: impl FnOnce(Option<&mut Profiler>) -> T,
) -> T {
    match profiler {
        Some(profiler) => profiler.measure(name, |profiler| f(Some(profiler))),
        None => f(None),
    }
}
