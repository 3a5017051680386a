use std::fmt::{Display, Formatter};
use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// A run error result.
pub type Result<T> = std::result::Result<T, Error>;

/// An error which aborts a run before any probe is sent.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid config: {0}")]
    InvalidConfiguration(String),
    #[error("failed to resolve {0}: {1}")]
    ResolutionFailure(String, #[source] pingit_dns::Error),
}

/// The classified failure of a single probe.
///
/// A probe failure is recorded against the probe and never aborts a run.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum ProbeError {
    /// No reply (or handshake) within the timeout.
    #[error("Connection timeout")]
    Timeout,
    /// The target explicitly rejected the probe.
    #[error("Connection refused")]
    Refused,
    /// The raw `ICMP` socket could not be opened.
    #[error("Permission denied. Please run as a privileged user.")]
    PermissionDenied,
    /// Any other failure, with the underlying diagnostic.
    #[error("{0}")]
    TransportError(String),
}

impl ProbeError {
    /// A short, stable label for the failure classification.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Refused => "refused",
            Self::PermissionDenied => "permission-denied",
            Self::TransportError(_) => "transport-error",
        }
    }
}

impl From<IoError> for ProbeError {
    fn from(err: IoError) -> Self {
        match (err.kind(), &err) {
            (ErrorKind::Std(io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock), _) => {
                Self::Timeout
            }
            (ErrorKind::Std(io::ErrorKind::ConnectionRefused), _) => Self::Refused,
            (
                ErrorKind::Std(io::ErrorKind::PermissionDenied),
                IoError::Other(_, IoOperation::NewSocket),
            ) => Self::PermissionDenied,
            _ => Self::TransportError(err.to_string()),
        }
    }
}

/// Custom IO error result.
pub type IoResult<T> = std::result::Result<T, IoError>;

/// Custom IO error.
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Connect error for {1}: {0}")]
    Connect(io::Error, SocketAddr),
    #[error("Sendto error for {1}: {0}")]
    SendTo(io::Error, SocketAddr),
    #[error("Failed to {1}: {0}")]
    Other(io::Error, IoOperation),
}

impl IoError {
    /// Get the custom error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connect(e, _) | Self::SendTo(e, _) | Self::Other(e, _) => ErrorKind::from(e),
        }
    }
}

/// Custom error kind.
///
/// This includes additional error kinds that are not part of the standard [`io::ErrorKind`].
#[derive(Debug, Eq, PartialEq)]
pub enum ErrorKind {
    InProgress,
    Std(io::ErrorKind),
}

/// Io operation.
#[derive(Debug)]
pub enum IoOperation {
    NewSocket,
    SetNonBlocking,
    Select,
    Send,
    RecvFrom,
    Shutdown,
    TakeError,
}

impl Display for IoOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NewSocket => write!(f, "create new socket"),
            Self::SetNonBlocking => write!(f, "set non-blocking"),
            Self::Select => write!(f, "select"),
            Self::Send => write!(f, "send"),
            Self::RecvFrom => write!(f, "recv from"),
            Self::Shutdown => write!(f, "shutdown"),
            Self::TakeError => write!(f, "take error"),
        }
    }
}
