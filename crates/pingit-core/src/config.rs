use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Default values for configuration.
pub mod defaults {
    use crate::config::{PrivilegeMode, Protocol};
    use crate::types::Sequence;
    use std::time::Duration;

    /// The default value for `protocol`.
    pub const DEFAULT_PROTOCOL: Protocol = Protocol::Icmp;

    /// The default value for `privilege-mode`.
    pub const DEFAULT_PRIVILEGE_MODE: PrivilegeMode = PrivilegeMode::Privileged;

    /// The default number of probes per run.
    pub const DEFAULT_COUNT: usize = 4;

    /// The default delay between probes, in whole seconds.
    pub const DEFAULT_DELAY_SECS: i64 = 1;

    /// The default `ICMP` reply timeout.
    pub const DEFAULT_ICMP_TIMEOUT: Duration = Duration::from_secs(5);

    /// The default `UDP` reply timeout.
    pub const DEFAULT_UDP_TIMEOUT: Duration = Duration::from_secs(5);

    /// The default `TCP` connect timeout.
    pub const DEFAULT_TCP_TIMEOUT: Duration = Duration::from_secs(5);

    /// The default `HTTP` request timeout.
    pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

    /// The sequence number carried by every `ICMP` echo request.
    pub const DEFAULT_ICMP_SEQUENCE: Sequence = Sequence(1);
}

/// The probe protocol.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Protocol {
    /// `ICMP` echo request / reply.
    Icmp,
    /// Empty `UDP` datagram, any reply.
    Udp,
    /// `TCP` three-way handshake.
    Tcp,
    /// `HTTP` `GET`, any status.
    Http,
}

impl Protocol {
    /// Does the protocol probe a specific port?
    #[must_use]
    pub const fn requires_port(self) -> bool {
        matches!(self, Self::Udp | Self::Tcp)
    }

    /// The timeout used when none is configured.
    #[must_use]
    pub const fn default_timeout(self) -> Duration {
        match self {
            Self::Icmp => defaults::DEFAULT_ICMP_TIMEOUT,
            Self::Udp => defaults::DEFAULT_UDP_TIMEOUT,
            Self::Tcp => defaults::DEFAULT_TCP_TIMEOUT,
            Self::Http => defaults::DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl Display for Protocol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Icmp => write!(f, "ICMP"),
            Self::Udp => write!(f, "UDP"),
            Self::Tcp => write!(f, "TCP"),
            Self::Http => write!(f, "HTTP"),
        }
    }
}

/// How `ICMP` sockets are opened.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PrivilegeMode {
    /// A raw socket, requires `CAP_NET_RAW` or root.
    Privileged,
    /// An `IPPROTO_ICMP` datagram socket, where the platform allows it.
    Unprivileged,
}

impl PrivilegeMode {
    #[must_use]
    pub const fn is_unprivileged(self) -> bool {
        matches!(self, Self::Unprivileged)
    }
}

impl Display for PrivilegeMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Privileged => write!(f, "privileged"),
            Self::Unprivileged => write!(f, "unprivileged"),
        }
    }
}
