use std::{
    fmt, io,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::{
    io::{AsyncRead, AsyncWrite, ReadBuf},
    process::{Child, ChildStdin, ChildStdout},
};

/// Any bidirectional byte stream that can carry the control channel.
pub trait SessionStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> SessionStream for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

/// How the session was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Tcp,
    Socket,
    Child,
}

impl SessionKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Tcp => "tcp",
            SessionKind::Socket => "socket",
            SessionKind::Child => "child",
        }
    }
}

/// Live control channel to an editor instance.
pub struct Session {
    kind: SessionKind,
    peer: String,
    stream: Box<dyn SessionStream>,
    process: Option<Child>,
}

impl Session {
    pub fn from_stream(
        kind: SessionKind,
        peer: impl Into<String>,
        stream: Box<dyn SessionStream>,
    ) -> Self {
        Self {
            kind,
            peer: peer.into(),
            stream,
            process: None,
        }
    }

    /// Keep the spawned editor handle alive alongside the channel.
    pub fn with_process(mut self, process: Child) -> Self {
        self.process = Some(process);
        self
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn process_id(&self) -> Option<u32> {
        self.process.as_ref().and_then(Child::id)
    }

    /// Split into the byte stream and the optional child handle.
    pub fn into_parts(self) -> (Box<dyn SessionStream>, Option<Child>) {
        (self.stream, self.process)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("kind", &self.kind)
            .field("peer", &self.peer)
            .field("process_id", &self.process_id())
            .finish()
    }
}

/// Joins a child's stdout and stdin into one duplex stream.
pub struct ChildIoBridge {
    stdout: ChildStdout,
    stdin: ChildStdin,
}

impl ChildIoBridge {
    pub fn new(stdout: ChildStdout, stdin: ChildStdin) -> Self {
        Self { stdout, stdin }
    }
}

impl AsyncRead for ChildIoBridge {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stdout).poll_read(cx, buf)
    }
}

impl AsyncWrite for ChildIoBridge {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.stdin).poll_write(cx, data)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stdin).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stdin).poll_shutdown(cx)
    }
}
