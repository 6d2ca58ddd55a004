//! Address classification for `--connect` / `--listen`.
use std::{fmt, path::PathBuf, sync::OnceLock};

use regex::Regex;

use crate::lib::errors::TargetError;

/// TCP port used when an IPv4 address carries no explicit port.
pub const DEFAULT_TCP_PORT: u16 = 7450;

const TCP_ADDRESS_PATTERN: &str = r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}(?::\d{1,5})?$";

fn tcp_address_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(TCP_ADDRESS_PATTERN).expect("tcp address pattern is valid"))
}

/// Where an editor instance can be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    Tcp { host: String, port: u16 },
    Socket(PathBuf),
}

impl ConnectionTarget {
    /// Classify an address: `a.b.c.d[:port]` is TCP, anything else a socket path.
    pub fn parse(address: &str) -> Result<Self, TargetError> {
        if address.is_empty() {
            return Err(TargetError::Empty);
        }

        if !tcp_address_regex().is_match(address) {
            return Ok(Self::Socket(PathBuf::from(address)));
        }

        match address.split_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| TargetError::InvalidPort {
                        address: address.to_string(),
                    })?;
                Ok(Self::Tcp {
                    host: host.to_string(),
                    port,
                })
            }
            None => Ok(Self::Tcp {
                host: address.to_string(),
                port: DEFAULT_TCP_PORT,
            }),
        }
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp { host, port } => write!(f, "{host}:{port}"),
            Self::Socket(path) => write!(f, "{}", path.display()),
        }
    }
}
