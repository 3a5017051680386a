//! Discover and manage the privilege required to open raw `ICMP` sockets.
//!
//! An `ICMP` probe crafts its own Echo Request header and so needs a raw
//! socket, which is a privileged operation on every supported platform.
//!
//! | operation                          | Linux                                      | other Unix           |
//! |------------------------------------|--------------------------------------------|----------------------|
//! | [`Privilege::acquire_privileges`]  | raise `CAP_NET_RAW` from permitted set     | no-op                |
//! | [`Privilege::has_privileges`]      | `CAP_NET_RAW` in effective set             | effective uid is 0   |
//! | [`Privilege::drop_privileges`]     | clear the effective set                    | no-op                |
//! | [`Privilege::supports_unprivileged`] | `IPPROTO_ICMP` datagram sockets (`ping_group_range`) | macOS only |
//!
//! # Examples
//!
//! ```rust
//! # fn main() -> anyhow::Result<()> {
//! # use pingit_privilege::Privilege;
//! let privilege = Privilege::acquire_privileges()?;
//! if !privilege.has_privileges() && !privilege.supports_unprivileged() {
//!     println!("ICMP probes will fail with a permission error");
//! }
//! Privilege::drop_privileges()?;
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

/// A privilege error result.
pub type Result<T> = std::result::Result<T, Error>;

/// A privilege error.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[cfg(target_os = "linux")]
    #[error("caps error: {0}")]
    CapsError(#[from] caps::errors::CapsError),
}

/// Run-time platform privilege information.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Privilege {
    has_privileges: bool,
    supports_unprivileged: bool,
}

impl Privilege {
    /// Discover the current platform privileges.
    pub fn discover() -> Result<Self> {
        let privilege = Self {
            has_privileges: Self::check_has_privileges()?,
            supports_unprivileged: Self::check_supports_unprivileged(),
        };
        tracing::debug!(?privilege, "discovered privileges");
        Ok(privilege)
    }

    #[must_use]
    pub const fn new(has_privileges: bool, supports_unprivileged: bool) -> Self {
        Self {
            has_privileges,
            supports_unprivileged,
        }
    }

    /// Can the process open raw sockets?
    #[must_use]
    pub const fn has_privileges(&self) -> bool {
        self.has_privileges
    }

    /// Does the platform offer unprivileged `IPPROTO_ICMP` datagram sockets?
    ///
    /// On Linux their use is further restricted by the
    /// `net.ipv4.ping_group_range` sysctl, which is only checked when the
    /// socket is opened.
    #[must_use]
    pub const fn supports_unprivileged(&self) -> bool {
        self.supports_unprivileged
    }

    #[cfg(target_os = "linux")]
    /// Raise `CAP_NET_RAW` to the effective set if it is permitted.
    pub fn acquire_privileges() -> Result<Self> {
        if caps::has_cap(None, caps::CapSet::Permitted, caps::Capability::CAP_NET_RAW)? {
            caps::raise(None, caps::CapSet::Effective, caps::Capability::CAP_NET_RAW)?;
        }
        Self::discover()
    }

    #[cfg(target_os = "linux")]
    fn check_has_privileges() -> Result<bool> {
        Ok(caps::has_cap(
            None,
            caps::CapSet::Effective,
            caps::Capability::CAP_NET_RAW,
        )?)
    }

    #[cfg(target_os = "linux")]
    /// Clear the effective capability set.
    pub fn drop_privileges() -> Result<()> {
        caps::clear(None, caps::CapSet::Effective)?;
        Ok(())
    }

    #[cfg(target_os = "linux")]
    const fn check_supports_unprivileged() -> bool {
        true
    }

    #[cfg(all(unix, not(target_os = "linux")))]
    /// This is a no-op on non-Linux unix systems.
    pub fn acquire_privileges() -> Result<Self> {
        Self::discover()
    }

    #[cfg(all(unix, not(target_os = "linux")))]
    #[expect(clippy::unnecessary_wraps)]
    fn check_has_privileges() -> Result<bool> {
        Ok(nix::unistd::Uid::effective().is_root())
    }

    #[cfg(all(unix, not(target_os = "linux")))]
    /// This is a no-op on non-Linux unix systems.
    pub const fn drop_privileges() -> Result<()> {
        Ok(())
    }

    #[cfg(all(unix, not(target_os = "linux")))]
    const fn check_supports_unprivileged() -> bool {
        cfg!(target_os = "macos")
    }
}
