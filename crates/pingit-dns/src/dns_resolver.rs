use crate::config::{Config, ResolveMethod};
use crate::resolver::{Error, ResolvedIpAddrs, Resolver, Result};
use hickory_resolver::config::{LookupIpStrategy, ResolverConfig, ResolverOpts};
use hickory_resolver::system_conf::read_system_conf;
use itertools::Itertools;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use tracing::instrument;

/// The backend used to perform lookups.
#[derive(Clone)]
enum DnsProvider {
    DnsLookup,
    Hickory(Arc<hickory_resolver::Resolver>),
}

/// A blocking DNS resolver.
#[derive(Clone)]
pub struct DnsResolver {
    config: Config,
    provider: DnsProvider,
}

impl DnsResolver {
    /// Create and start a new `DnsResolver`.
    ///
    /// Fails if the system resolver configuration cannot be read.
    pub fn start(config: Config) -> std::io::Result<Self> {
        let provider = match config.resolve_method {
            ResolveMethod::System => DnsProvider::DnsLookup,
            method => {
                let mut options = ResolverOpts::default();
                options.timeout = config.timeout;
                options.ip_strategy = LookupIpStrategy::Ipv4Only;
                let resolver = match method {
                    ResolveMethod::Resolv => {
                        let (resolver_cfg, mut options) = read_system_conf()?;
                        options.timeout = config.timeout;
                        options.ip_strategy = LookupIpStrategy::Ipv4Only;
                        hickory_resolver::Resolver::new(resolver_cfg, options)
                    }
                    ResolveMethod::Google => {
                        hickory_resolver::Resolver::new(ResolverConfig::google(), options)
                    }
                    ResolveMethod::Cloudflare | ResolveMethod::System => {
                        hickory_resolver::Resolver::new(ResolverConfig::cloudflare(), options)
                    }
                }?;
                DnsProvider::Hickory(Arc::new(resolver))
            }
        };
        Ok(Self { config, provider })
    }

    /// The resolver configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }
}

impl Resolver for DnsResolver {
    #[instrument(skip(self), level = "debug")]
    fn lookup(&self, hostname: &str) -> Result<ResolvedIpAddrs> {
        let all: Vec<IpAddr> = match &self.provider {
            DnsProvider::Hickory(resolver) => resolver
                .lookup_ip(hostname)
                .map_err(|err| Error::LookupFailed(Box::new(err)))?
                .iter()
                .collect(),
            DnsProvider::DnsLookup => dns_lookup::lookup_host(hostname)
                .map_err(|err| Error::LookupFailed(Box::new(err)))?,
        };
        let ipv4 = ipv4_only(all);
        tracing::debug!(?ipv4, "resolved");
        ResolvedIpAddrs::new(ipv4).ok_or_else(|| Error::NoIpv4Address(hostname.to_string()))
    }
}

/// Keep the `IPv4` addresses, in resolution order and without duplicates.
fn ipv4_only(all: Vec<IpAddr>) -> Vec<Ipv4Addr> {
    all.into_iter()
        .filter_map(|ip| match ip {
            IpAddr::V4(ipv4) => Some(ipv4),
            IpAddr::V6(_) => None,
        })
        .unique()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    #[test]
    fn test_ipv4_only() {
        let all = vec![
            IpAddr::V6(Ipv6Addr::LOCALHOST),
            IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)),
            IpAddr::V4(Ipv4Addr::new(192, 0, 2, 2)),
            IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)),
        ];
        assert_eq!(
            vec![Ipv4Addr::new(192, 0, 2, 1), Ipv4Addr::new(192, 0, 2, 2)],
            ipv4_only(all)
        );
    }

    #[test]
    fn test_ipv4_only_empty_when_ipv6_only() {
        assert!(ipv4_only(vec![IpAddr::V6(Ipv6Addr::LOCALHOST)]).is_empty());
    }

    #[test]
    fn test_system_lookup_numeric_host() -> anyhow::Result<()> {
        let resolver = DnsResolver::start(Config::default())?;
        let addrs = resolver.lookup("127.0.0.1")?;
        assert_eq!(Ipv4Addr::LOCALHOST, addrs.first());
        Ok(())
    }
}
