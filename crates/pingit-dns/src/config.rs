use std::fmt::{Display, Formatter};
use std::time::Duration;

/// How DNS queries are resolved.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResolveMethod {
    /// Resolve using the OS resolver.
    System,
    /// Resolve using the `/etc/resolv.conf` DNS configuration.
    Resolv,
    /// Resolve using the Google `8.8.8.8` DNS service.
    Google,
    /// Resolve using the Cloudflare `1.1.1.1` DNS service.
    Cloudflare,
}

impl Display for ResolveMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::Resolv => write!(f, "resolv"),
            Self::Google => write!(f, "google"),
            Self::Cloudflare => write!(f, "cloudflare"),
        }
    }
}

/// A builder for DNS `Config`.
///
/// # Example
///
/// ```
/// use pingit_dns::{Builder, ResolveMethod};
///
/// let config = Builder::new().resolve_method(ResolveMethod::Google).build();
/// assert_eq!(ResolveMethod::Google, config.resolve_method);
/// ```
#[derive(Debug)]
pub struct Builder {
    resolve_method: ResolveMethod,
    timeout: Duration,
}

impl Builder {
    #[must_use]
    pub fn new() -> Self {
        let Config {
            resolve_method,
            timeout,
        } = Config::default();
        Self {
            resolve_method,
            timeout,
        }
    }

    /// Set the method to use for DNS resolution.
    #[must_use]
    pub const fn resolve_method(self, resolve_method: ResolveMethod) -> Self {
        Self {
            resolve_method,
            ..self
        }
    }

    /// Set the timeout for DNS resolution.
    ///
    /// Ignored by [`ResolveMethod::System`].
    #[must_use]
    pub const fn timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    #[must_use]
    pub const fn build(self) -> Config {
        Config {
            resolve_method: self.resolve_method,
            timeout: self.timeout,
        }
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the `DnsResolver`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Config {
    pub resolve_method: ResolveMethod,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolve_method: ResolveMethod::System,
            timeout: Duration::from_millis(5000),
        }
    }
}
