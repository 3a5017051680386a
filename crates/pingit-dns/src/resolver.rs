use std::fmt::{Display, Formatter};
use std::net::Ipv4Addr;
use thiserror::Error;

/// A DNS resolver.
#[cfg_attr(test, mockall::automock)]
pub trait Resolver {
    /// Perform a blocking DNS hostname lookup and return the resolved `IPv4` addresses.
    ///
    /// Returns [`Error::NoIpv4Address`] if the name resolves only to `IPv6` addresses.
    fn lookup(&self, hostname: &str) -> Result<ResolvedIpAddrs>;
}

/// A DNS resolver error result.
pub type Result<T> = std::result::Result<T, Error>;

/// A DNS resolver error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("DNS lookup failed: {0}")]
    LookupFailed(Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("no IPv4 address found for {0}")]
    NoIpv4Address(String),
}

/// The non-empty output of a successful DNS lookup.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResolvedIpAddrs {
    first: Ipv4Addr,
    rest: Vec<Ipv4Addr>,
}

impl ResolvedIpAddrs {
    /// Create from a list of addresses, returning `None` if the list is empty.
    #[must_use]
    pub fn new(addrs: Vec<Ipv4Addr>) -> Option<Self> {
        let mut iter = addrs.into_iter();
        let first = iter.next()?;
        Some(Self {
            first,
            rest: iter.collect(),
        })
    }

    /// The address that is probed.
    #[must_use]
    pub const fn first(&self) -> Ipv4Addr {
        self.first
    }

    pub fn iter(&self) -> impl Iterator<Item = &'_ Ipv4Addr> {
        std::iter::once(&self.first).chain(self.rest.iter())
    }
}

impl Display for ResolvedIpAddrs {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use itertools::Itertools as _;
        write!(f, "{}", self.iter().format(", "))
    }
}
