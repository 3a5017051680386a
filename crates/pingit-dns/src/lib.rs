//! Blocking IPv4 hostname resolution.
//!
//! A target is resolved once, before any probe is sent, so a single blocking
//! lookup is all that is needed. Only `IPv4` addresses are returned.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! use pingit_dns::{Builder, DnsResolver, ResolveMethod, Resolver};
//! use std::time::Duration;
//!
//! let config = Builder::new()
//!     .resolve_method(ResolveMethod::Cloudflare)
//!     .timeout(Duration::from_secs(2))
//!     .build();
//! let resolver = DnsResolver::start(config)?;
//! let addrs = resolver.lookup("example.com")?;
//! println!("{}", addrs.first());
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

mod config;
mod dns_resolver;
mod resolver;

pub use config::{Builder, Config, ResolveMethod};
pub use dns_resolver::DnsResolver;
pub use resolver::{Error, ResolvedIpAddrs, Resolver, Result};
