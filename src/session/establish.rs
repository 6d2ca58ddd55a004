use std::io;

use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::lib::{
    command::{build_embed_command, build_listen_command},
    errors::{AttachError, WaitError},
    telemetry::AttachSpan,
};

use super::{
    readiness::{wait_until_ready, WaitOutcome, WaitPolicy},
    ChildIoBridge, ConnectionTarget, Session, SessionKind,
};

/// Default spawn command for listen mode.
pub const DEFAULT_LISTEN_PROG: &str = "nvim --headless";
/// Default spawn command for embed mode.
pub const DEFAULT_EMBED_PROG: &str = "nvim --embed";

/// How the launcher reaches the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Attach to an instance that is already listening.
    Connect(ConnectionTarget),
    /// Spawn a detached instance bound to the target, then attach.
    Listen(ConnectionTarget),
    /// Spawn a child and use its stdio as the channel.
    Embed,
}

impl ConnectionMode {
    /// `--connect` wins over `--listen`; neither means embed.
    pub fn resolve(
        connect: Option<ConnectionTarget>,
        listen: Option<ConnectionTarget>,
    ) -> ConnectionMode {
        match (connect, listen) {
            (Some(target), _) => ConnectionMode::Connect(target),
            (None, Some(target)) => ConnectionMode::Listen(target),
            (None, None) => ConnectionMode::Embed,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ConnectionMode::Connect(_) => "connect",
            ConnectionMode::Listen(_) => "listen",
            ConnectionMode::Embed => "embed",
        }
    }

    pub fn target(&self) -> Option<&ConnectionTarget> {
        match self {
            ConnectionMode::Connect(target) | ConnectionMode::Listen(target) => Some(target),
            ConnectionMode::Embed => None,
        }
    }

    /// Spawn command used when `--prog` is absent; `None` in connect mode.
    pub const fn default_prog(&self) -> Option<&'static str> {
        match self {
            ConnectionMode::Connect(_) => None,
            ConnectionMode::Listen(_) => Some(DEFAULT_LISTEN_PROG),
            ConnectionMode::Embed => Some(DEFAULT_EMBED_PROG),
        }
    }
}

/// Attach once to a listening editor.
pub async fn attach_target(target: &ConnectionTarget) -> io::Result<Session> {
    match target {
        ConnectionTarget::Tcp { host, port } => {
            let stream = TcpStream::connect((host.as_str(), *port)).await?;
            stream.set_nodelay(true)?;
            Ok(Session::from_stream(
                SessionKind::Tcp,
                target.to_string(),
                Box::new(stream),
            ))
        }
        ConnectionTarget::Socket(path) => attach_socket(path).await,
    }
}

#[cfg(unix)]
async fn attach_socket(path: &std::path::Path) -> io::Result<Session> {
    let stream = tokio::net::UnixStream::connect(path).await?;
    Ok(Session::from_stream(
        SessionKind::Socket,
        path.display().to_string(),
        Box::new(stream),
    ))
}

#[cfg(not(unix))]
async fn attach_socket(path: &std::path::Path) -> io::Result<Session> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("unix socket {} is unsupported", path.display()),
    ))
}

/// Produces a live [`Session`] for a connection mode.
#[derive(Debug, Clone)]
pub struct Establisher {
    policy: WaitPolicy,
    cancel: CancellationToken,
}

impl Establisher {
    pub fn new(policy: WaitPolicy, cancel: CancellationToken) -> Self {
        Self { policy, cancel }
    }

    /// Attach according to `mode`. `argv` is ignored in connect mode.
    pub async fn establish(
        &self,
        mode: &ConnectionMode,
        argv: &[String],
    ) -> Result<Session, AttachError> {
        match mode {
            ConnectionMode::Connect(target) => self.connect(target).await,
            ConnectionMode::Listen(target) => self.listen(target, argv).await,
            ConnectionMode::Embed => self.embed(argv),
        }
    }

    async fn connect(&self, target: &ConnectionTarget) -> Result<Session, AttachError> {
        let mut span = AttachSpan::start("connect", &target.to_string());
        span.record_attempt();
        match attach_target(target).await {
            Ok(session) => {
                span.finish("attached");
                Ok(session)
            }
            Err(source) => {
                span.finish("failed");
                Err(connect_error(target, source))
            }
        }
    }

    async fn listen(
        &self,
        target: &ConnectionTarget,
        argv: &[String],
    ) -> Result<Session, AttachError> {
        let (program, args) = split_argv(argv)?;
        let address = target.to_string();
        let mut child = build_listen_command(program, args, &address)
            .spawn()
            .map_err(|source| AttachError::Spawn {
                program: program.to_string(),
                source,
            })?;
        info!(
            target: "nvim_ui::session",
            program = %program,
            pid = child.id(),
            address = %address,
            "Spawned detached editor"
        );

        let mut span = AttachSpan::start("listen", &address);
        let outcome = wait_until_ready(self.policy, &self.cancel, &mut child, |_| {
            span.record_attempt();
            attach_target(target)
        })
        .await;

        let failure = match outcome {
            Ok(WaitOutcome::Ready(session)) => {
                span.finish("attached");
                return Ok(session.with_process(child));
            }
            Ok(WaitOutcome::ProcessExited { status }) => {
                span.finish("process_exited");
                return Err(AttachError::ProcessExited {
                    target: address,
                    status: status.to_string(),
                });
            }
            Ok(WaitOutcome::TimedOut { attempts, elapsed }) => {
                span.finish("timed_out");
                AttachError::TimedOut {
                    target: address,
                    attempts,
                    elapsed,
                }
            }
            Ok(WaitOutcome::Cancelled) => {
                span.finish("cancelled");
                AttachError::Cancelled { target: address }
            }
            Err(WaitError::Attach { source }) => {
                span.finish("failed");
                connect_error(target, source)
            }
            Err(WaitError::Probe { source }) => {
                span.finish("probe_failed");
                AttachError::Probe { source }
            }
        };

        if let Err(err) = child.start_kill() {
            warn!(
                target: "nvim_ui::session",
                error = %err,
                "Failed to stop editor after attach failure"
            );
        }
        Err(failure)
    }

    fn embed(&self, argv: &[String]) -> Result<Session, AttachError> {
        let (program, args) = split_argv(argv)?;
        let mut child =
            build_embed_command(program, args)
                .spawn()
                .map_err(|source| AttachError::Spawn {
                    program: program.to_string(),
                    source,
                })?;
        let stdout = child
            .stdout
            .take()
            .ok_or(AttachError::MissingPipe { stream: "stdout" })?;
        let stdin = child
            .stdin
            .take()
            .ok_or(AttachError::MissingPipe { stream: "stdin" })?;
        info!(
            target: "nvim_ui::session",
            program = %program,
            pid = child.id(),
            "Spawned embedded editor"
        );

        Ok(Session::from_stream(
            SessionKind::Child,
            program.to_string(),
            Box::new(ChildIoBridge::new(stdout, stdin)),
        )
        .with_process(child))
    }
}

fn split_argv(argv: &[String]) -> Result<(&str, &[String]), AttachError> {
    argv.split_first()
        .map(|(program, args)| (program.as_str(), args))
        .ok_or(AttachError::EmptyCommand)
}

fn connect_error(target: &ConnectionTarget, source: io::Error) -> AttachError {
    match target {
        ConnectionTarget::Socket(path) if source.kind() == io::ErrorKind::Unsupported => {
            AttachError::SocketUnsupported { path: path.clone() }
        }
        _ => AttachError::Connect {
            target: target.to_string(),
            source,
        },
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::{path::PathBuf, time::Duration};

    use tempfile::tempdir;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, UnixListener},
        time,
    };

    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|part| part.to_string()).collect()
    }

    fn establisher(timeout: Option<Duration>) -> Establisher {
        Establisher::new(
            WaitPolicy {
                interval: Duration::from_millis(50),
                timeout,
            },
            CancellationToken::new(),
        )
    }

    async fn free_tcp_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("can bind ephemeral port");
        listener
            .local_addr()
            .expect("listener has address")
            .port()
    }

    #[test]
    fn mode_resolution_defaults_to_embed() {
        assert_eq!(ConnectionMode::resolve(None, None), ConnectionMode::Embed);
        let target = ConnectionTarget::Socket(PathBuf::from("/tmp/a.sock"));
        assert_eq!(
            ConnectionMode::resolve(None, Some(target.clone())),
            ConnectionMode::Listen(target.clone())
        );
        assert_eq!(
            ConnectionMode::resolve(Some(target.clone()), None),
            ConnectionMode::Connect(target)
        );
        assert_eq!(ConnectionMode::Embed.default_prog(), Some("nvim --embed"));
    }

    #[tokio::test]
    async fn connect_to_missing_socket_fails_immediately() {
        let temp = tempdir().expect("can create temporary directory");
        let target = ConnectionTarget::Socket(temp.path().join("does-not-exist.sock"));

        let err = establisher(None)
            .establish(&ConnectionMode::Connect(target), &argv(&["should-not-run"]))
            .await
            .expect_err("missing socket must fail");

        match err {
            AttachError::Connect { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::NotFound)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn connect_to_unix_socket_attaches() {
        let temp = tempdir().expect("can create temporary directory");
        let path = temp.path().join("nvim.sock");
        let listener = UnixListener::bind(&path).expect("can bind unix socket");
        let accept = tokio::spawn(async move { listener.accept().await.map(|_| ()) });

        let session = establisher(None)
            .establish(&ConnectionMode::Connect(ConnectionTarget::Socket(path.clone())), &[])
            .await
            .expect("connect should succeed");

        assert_eq!(session.kind(), SessionKind::Socket);
        assert_eq!(session.peer(), path.display().to_string());
        assert_eq!(session.process_id(), None);
        accept
            .await
            .expect("accept task should finish")
            .expect("accept should succeed");
    }

    #[tokio::test]
    async fn connect_to_closed_tcp_port_is_connection_error() {
        let port = free_tcp_port().await;
        let target = ConnectionTarget::Tcp {
            host: "127.0.0.1".into(),
            port,
        };

        let err = establisher(None)
            .establish(&ConnectionMode::Connect(target), &[])
            .await
            .expect_err("closed port must fail");

        assert!(matches!(err, AttachError::Connect { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn embed_uses_child_stdio_as_channel() {
        let session = establisher(None)
            .establish(&ConnectionMode::Embed, &argv(&["cat"]))
            .await
            .expect("cat should spawn");
        assert_eq!(session.kind(), SessionKind::Child);
        assert!(session.process_id().is_some());

        let (mut stream, child) = session.into_parts();
        stream.write_all(b"ping").await.expect("can write to child");
        stream.flush().await.expect("can flush child stdin");
        let mut buf = [0u8; 4];
        stream.read_exact(&mut buf).await.expect("can read echo");
        assert_eq!(&buf, b"ping");

        drop(stream);
        if let Some(mut child) = child {
            let _ = child.kill().await;
        }
    }

    #[tokio::test]
    async fn embed_with_missing_program_is_spawn_error() {
        let err = establisher(None)
            .establish(
                &ConnectionMode::Embed,
                &argv(&["/nonexistent/editor-binary", "--embed"]),
            )
            .await
            .expect_err("missing binary must fail");

        match err {
            AttachError::Spawn { program, .. } => {
                assert_eq!(program, "/nonexistent/editor-binary")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let err = establisher(None)
            .establish(&ConnectionMode::Embed, &[])
            .await
            .expect_err("empty argv must fail");
        assert!(matches!(err, AttachError::EmptyCommand));
    }

    #[tokio::test]
    async fn listen_passes_address_to_child_and_retries_until_ready() {
        let temp = tempdir().expect("can create temporary directory");
        let marker = temp.path().join("address.txt");
        let port = free_tcp_port().await;
        let address = format!("127.0.0.1:{port}");
        let target = ConnectionTarget::parse(&address).expect("valid address");

        let script = format!(
            "printf %s \"$NVIM_LISTEN_ADDRESS\" > {}; sleep 5",
            marker.display()
        );
        let bind_address = address.clone();
        let server = tokio::spawn(async move {
            time::sleep(Duration::from_millis(200)).await;
            let listener = TcpListener::bind(&bind_address)
                .await
                .expect("can bind listen address");
            listener.accept().await.map(|_| ())
        });

        let session = establisher(Some(Duration::from_secs(10)))
            .establish(&ConnectionMode::Listen(target), &argv(&["sh", "-c", &script]))
            .await
            .expect("listen should eventually attach");

        assert_eq!(session.kind(), SessionKind::Tcp);
        assert_eq!(session.peer(), address);
        assert!(session.process_id().is_some());
        server
            .await
            .expect("server task should finish")
            .expect("accept should succeed");

        let mut written = String::new();
        for _ in 0..40 {
            written = std::fs::read_to_string(&marker).unwrap_or_default();
            if !written.is_empty() {
                break;
            }
            time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(written, address);
        assert_ne!(std::env::var("NVIM_LISTEN_ADDRESS").ok(), Some(address));

        let (_, child) = session.into_parts();
        if let Some(mut child) = child {
            let _ = child.kill().await;
        }
    }

    #[tokio::test]
    async fn listen_fails_fast_when_child_exits() {
        let temp = tempdir().expect("can create temporary directory");
        let target = ConnectionTarget::Socket(temp.path().join("never.sock"));

        let err = establisher(None)
            .establish(&ConnectionMode::Listen(target), &argv(&["sh", "-c", "exit 0"]))
            .await
            .expect_err("exited child must fail");

        assert!(matches!(err, AttachError::ProcessExited { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn listen_times_out_when_never_ready() {
        let temp = tempdir().expect("can create temporary directory");
        let target = ConnectionTarget::Socket(temp.path().join("never.sock"));

        let err = establisher(Some(Duration::from_millis(200)))
            .establish(&ConnectionMode::Listen(target), &argv(&["sleep", "5"]))
            .await
            .expect_err("wait must time out");

        match err {
            AttachError::TimedOut { attempts, .. } => assert!(attempts >= 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn listen_can_be_cancelled() {
        let temp = tempdir().expect("can create temporary directory");
        let target = ConnectionTarget::Socket(temp.path().join("never.sock"));
        let cancel = CancellationToken::new();
        let establisher = Establisher::new(
            WaitPolicy {
                interval: Duration::from_millis(20),
                timeout: None,
            },
            cancel.clone(),
        );
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        });

        let err = establisher
            .establish(&ConnectionMode::Listen(target), &argv(&["sleep", "5"]))
            .await
            .expect_err("wait must be cancelled");

        assert!(matches!(err, AttachError::Cancelled { .. }), "{err:?}");
    }
}
