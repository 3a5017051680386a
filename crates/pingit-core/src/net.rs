/// Error mapping helpers.
mod common;

/// Platform specific socket implementations.
mod platform;

/// The socket abstraction used by the probes.
pub mod socket;

pub use common::ErrorMapper;
pub use platform::SocketImpl;
