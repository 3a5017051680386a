use crate::error::{ErrorKind, IoError, IoResult};

/// Utility methods to map errors.
pub struct ErrorMapper;

impl ErrorMapper {
    /// Convert [`ErrorKind::InProgress`] to [`Ok`].
    ///
    /// A non-blocking connect reports `EINPROGRESS` while the handshake is underway.
    pub fn in_progress(err: IoError) -> IoResult<()> {
        match err.kind() {
            ErrorKind::InProgress => Ok(()),
            _ => Err(err),
        }
    }
}
