//! PingIt - multi-protocol reachability and latency probing.
//!
//! This crate provides the probing engine used by the standalone `pingit`
//! application: `ICMP` echo, `UDP` datagram, `TCP` handshake and `HTTP` `GET`
//! probes, a runner which issues a fixed number of probes at a fixed delay, and
//! a [`History`] of results with summary [`Statistics`].
//!
//! # Example
//!
//! The following example probes port 443 of a host three times, printing each
//! result as it completes:
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! use pingit_core::{Builder, History, Protocol};
//! use pingit_dns::{Config, DnsResolver};
//!
//! let resolver = DnsResolver::start(Config::default())?;
//! let mut history = History::new();
//! Builder::new("example.com")
//!     .protocol(Protocol::Tcp)
//!     .port(443)
//!     .count(3)
//!     .build()?
//!     .run_with(&resolver, &mut history, |result| println!("{result:?}"))?;
//! let stats = history.statistics();
//! println!("{:.2}% success, {:.2} ms mean", stats.success_rate, stats.mean_latency_ms);
//! # Ok(())
//! # }
//! ```
//!
//! # See Also
//!
//! - [`Builder`] - Build a [`Runner`].
//! - [`Runner::run_with`] - Run the probes with a custom result handler.
//! - [`History::save`] - Hand a session of results to a [`HistorySink`].
#![warn(clippy::all, clippy::pedantic, clippy::nursery, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::use_self,
    clippy::option_if_let_else,
    clippy::missing_const_for_fn,
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss
)]
#![deny(unsafe_code)]

mod config;
mod error;
mod history;
mod net;
mod probe;
mod result;
mod runner;
mod types;

pub use config::{defaults, PrivilegeMode, Protocol};
pub use error::{Error, ProbeError, Result};
pub use history::{History, HistorySink, Statistics};
pub use probe::{Endpoint, HttpProbe, IcmpProbe, Outcome, Probe, TcpProbe, UdpProbe};
pub use result::ProbeResult;
pub use runner::{Builder, Runner};
pub use types::{Identifier, Port, Sequence, SessionNumber};

/// The socket abstraction and its platform implementation.
pub mod socket {
    pub use crate::error::{ErrorKind, IoError, IoOperation, IoResult};
    pub use crate::net::socket::{Socket, SocketError};
    pub use crate::net::SocketImpl;
}
