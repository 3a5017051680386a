use crate::config::{defaults, PrivilegeMode, Protocol};
use crate::error::{Error, Result};
use crate::history::History;
use crate::net::SocketImpl;
use crate::probe::{Endpoint, HttpProbe, IcmpProbe, Probe, TcpProbe, UdpProbe};
use crate::result::ProbeResult;
use crate::types::{Identifier, Port, Sequence};
use pingit_dns::Resolver;
use std::net::{IpAddr, Ipv4Addr, SocketAddrV4};
use std::thread;
use std::time::Duration;
use tracing::instrument;
use url::Url;

/// Build a probe runner.
///
/// # Examples
///
/// ```no_run
/// # fn main() -> anyhow::Result<()> {
/// use pingit_core::{Builder, History, Protocol};
/// use pingit_dns::{Config, DnsResolver};
///
/// let resolver = DnsResolver::start(Config::default())?;
/// let mut history = History::new();
/// Builder::new("example.com")
///     .protocol(Protocol::Tcp)
///     .port(443)
///     .count(3)
///     .build()?
///     .run(&resolver, &mut history)?;
/// println!("{:?}", history.statistics());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    target: String,
    protocol: Protocol,
    port: Option<u16>,
    count: usize,
    delay_secs: i64,
    timeout: Option<Duration>,
    privilege_mode: PrivilegeMode,
    identifier: Identifier,
}

impl Builder {
    /// Build a runner builder for a given target.
    ///
    /// The target is a hostname or literal `IPv4` address, or an absolute URL
    /// for [`Protocol::Http`].
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            protocol: defaults::DEFAULT_PROTOCOL,
            port: None,
            count: defaults::DEFAULT_COUNT,
            delay_secs: defaults::DEFAULT_DELAY_SECS,
            timeout: None,
            privilege_mode: defaults::DEFAULT_PRIVILEGE_MODE,
            identifier: Identifier::from_pid(std::process::id()),
        }
    }

    #[must_use]
    pub fn protocol(self, protocol: Protocol) -> Self {
        Self { protocol, ..self }
    }

    /// Set the port, required for [`Protocol::Tcp`] and [`Protocol::Udp`].
    #[must_use]
    pub fn port(self, port: u16) -> Self {
        Self {
            port: Some(port),
            ..self
        }
    }

    /// Set the number of probes to send.
    #[must_use]
    pub fn count(self, count: usize) -> Self {
        Self { count, ..self }
    }

    /// Set the delay after each probe, in whole seconds.
    #[must_use]
    pub fn delay_secs(self, delay_secs: i64) -> Self {
        Self { delay_secs, ..self }
    }

    /// Set the per probe timeout.
    ///
    /// If not set the [`Protocol::default_timeout`] is used.
    #[must_use]
    pub fn timeout(self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }

    #[must_use]
    pub fn privilege_mode(self, privilege_mode: PrivilegeMode) -> Self {
        Self {
            privilege_mode,
            ..self
        }
    }

    /// Set the `ICMP` echo identifier, defaults to the low 16 bits of the process id.
    #[must_use]
    pub fn identifier(self, identifier: Identifier) -> Self {
        Self { identifier, ..self }
    }

    /// Validate the configuration and build the [`Runner`].
    ///
    /// Nothing is sent and no name is resolved until [`Runner::run`] is called.
    pub fn build(self) -> Result<Runner> {
        let target = self.target.trim();
        if target.is_empty() {
            return Err(Error::InvalidConfiguration(String::from(
                "target may not be empty",
            )));
        }
        if self.count == 0 {
            return Err(Error::InvalidConfiguration(String::from(
                "count must be greater than zero",
            )));
        }
        let delay = u64::try_from(self.delay_secs)
            .ok()
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
            .ok_or_else(|| {
                Error::InvalidConfiguration(format!(
                    "delay must be a positive number of seconds, got {}",
                    self.delay_secs
                ))
            })?;
        let timeout = self
            .timeout
            .unwrap_or_else(|| self.protocol.default_timeout());
        if timeout.is_zero() {
            return Err(Error::InvalidConfiguration(String::from(
                "timeout must be greater than zero",
            )));
        }
        let port = match (self.protocol.requires_port(), self.port) {
            (true, None | Some(0)) => {
                return Err(Error::InvalidConfiguration(format!(
                    "a port between 1 and 65535 is required for {} protocol",
                    self.protocol
                )));
            }
            (true, Some(port)) => Some(Port(port)),
            (false, Some(port)) => {
                return Err(Error::InvalidConfiguration(format!(
                    "port {port} may not be set for {} protocol",
                    self.protocol
                )));
            }
            (false, None) => None,
        };
        let url = match self.protocol {
            Protocol::Http => Some(parse_url(target)?),
            _ => {
                if let Ok(IpAddr::V6(addr)) = target.parse::<IpAddr>() {
                    return Err(Error::InvalidConfiguration(format!(
                        "IPv6 target {addr} is not supported"
                    )));
                }
                None
            }
        };
        Ok(Runner {
            target: target.to_string(),
            protocol: self.protocol,
            port,
            url,
            count: self.count,
            delay,
            timeout,
            privilege_mode: self.privilege_mode,
            identifier: self.identifier,
        })
    }
}

fn parse_url(target: &str) -> Result<Url> {
    let url = Url::parse(target)
        .map_err(|err| Error::InvalidConfiguration(format!("invalid URL {target}: {err}")))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        "http" | "https" => Err(Error::InvalidConfiguration(format!(
            "URL {target} has no host"
        ))),
        scheme => Err(Error::InvalidConfiguration(format!(
            "unsupported URL scheme {scheme}, expected http or https"
        ))),
    }
}

/// Issue a fixed number of probes against a single target.
#[derive(Debug, Clone)]
pub struct Runner {
    target: String,
    protocol: Protocol,
    port: Option<Port>,
    url: Option<Url>,
    count: usize,
    delay: Duration,
    timeout: Duration,
    privilege_mode: PrivilegeMode,
    identifier: Identifier,
}

impl Runner {
    /// Run all probes, appending each result to the `history`.
    ///
    /// Blocks for `count` × (`delay` + probe time); the delay is also slept
    /// after the final probe.
    pub fn run<R: Resolver>(&self, resolver: &R, history: &mut History) -> Result<()> {
        self.run_with(resolver, history, |_| {})
    }

    /// Run all probes, calling `func` with each result before it is added to
    /// the `history`.
    ///
    /// The target is resolved once up front; a failure to resolve it (or an
    /// `IPv6` only target) aborts the run before any probe is sent. Failures of
    /// individual probes are recorded as results and never abort the run.
    #[instrument(skip_all, fields(target = %self.target, protocol = %self.protocol))]
    pub fn run_with<R: Resolver, F: FnMut(&ProbeResult)>(
        &self,
        resolver: &R,
        history: &mut History,
        func: F,
    ) -> Result<()> {
        let endpoint = self.endpoint(resolver)?;
        tracing::info!(
            %endpoint,
            count = self.count,
            delay = ?self.delay,
            timeout = ?self.timeout,
            "starting run"
        );
        match self.protocol {
            Protocol::Icmp => self.run_probes(
                IcmpProbe::<SocketImpl>::new(
                    self.timeout,
                    self.privilege_mode,
                    self.identifier,
                    defaults::DEFAULT_ICMP_SEQUENCE,
                ),
                &endpoint,
                history,
                func,
            ),
            Protocol::Udp => self.run_probes(
                UdpProbe::<SocketImpl>::new(self.timeout),
                &endpoint,
                history,
                func,
            ),
            Protocol::Tcp => self.run_probes(
                TcpProbe::<SocketImpl>::new(self.timeout),
                &endpoint,
                history,
                func,
            ),
            Protocol::Http => {
                self.run_probes(HttpProbe::new(self.timeout), &endpoint, history, func)
            }
        }
        Ok(())
    }

    pub(crate) fn run_probes<P: Probe, F: FnMut(&ProbeResult)>(
        &self,
        mut probe: P,
        endpoint: &Endpoint,
        history: &mut History,
        mut func: F,
    ) {
        for attempt in 1..=self.count {
            let outcome = probe.probe(endpoint);
            match &outcome {
                Ok(latency) => tracing::debug!(attempt, ?latency, "probe succeeded"),
                Err(err) => tracing::debug!(attempt, %err, "probe failed"),
            }
            let result = ProbeResult::new(self.target.clone(), self.protocol, self.port, outcome);
            func(&result);
            history.add(result);
            thread::sleep(self.delay);
        }
    }

    fn endpoint<R: Resolver>(&self, resolver: &R) -> Result<Endpoint> {
        if let Some(url) = &self.url {
            return Ok(Endpoint::Url(url.clone()));
        }
        let addr = self.resolve(resolver)?;
        Ok(match self.port {
            Some(port) => Endpoint::Socket(SocketAddrV4::new(addr, port.0)),
            None => Endpoint::Host(addr),
        })
    }

    fn resolve<R: Resolver>(&self, resolver: &R) -> Result<Ipv4Addr> {
        if let Ok(addr) = self.target.parse::<Ipv4Addr>() {
            return Ok(addr);
        }
        let addrs = resolver
            .lookup(&self.target)
            .map_err(|err| Error::ResolutionFailure(self.target.clone(), err))?;
        tracing::debug!(%addrs, "resolved target");
        Ok(addrs.first())
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        self.protocol
    }

    #[must_use]
    pub const fn port(&self) -> Option<Port> {
        self.port
    }

    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub const fn privilege_mode(&self) -> PrivilegeMode {
        self.privilege_mode
    }

    #[must_use]
    pub const fn identifier(&self) -> Identifier {
        self.identifier
    }

    /// The sequence number carried by `ICMP` echo requests.
    #[must_use]
    pub const fn sequence(&self) -> Sequence {
        defaults::DEFAULT_ICMP_SEQUENCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::probe::MockProbe;
    use mockall::Sequence as CallSequence;
    use pingit_dns::ResolvedIpAddrs;
    use std::cell::Cell;
    use test_case::test_case;

    /// A resolver which answers every lookup from a fixed table.
    struct FixedResolver(Option<Ipv4Addr>);

    impl Resolver for FixedResolver {
        fn lookup(&self, hostname: &str) -> pingit_dns::Result<ResolvedIpAddrs> {
            self.0
                .and_then(|addr| ResolvedIpAddrs::new(vec![addr]))
                .ok_or_else(|| pingit_dns::Error::NoIpv4Address(hostname.to_string()))
        }
    }

    /// Build a runner without the whole second delay, for exercising the loop.
    fn fast(runner: Runner) -> Runner {
        Runner {
            delay: Duration::ZERO,
            ..runner
        }
    }

    #[test]
    fn test_builder_defaults() {
        let runner = Builder::new("10.0.0.1").build().unwrap();
        assert_eq!("10.0.0.1", runner.target());
        assert_eq!(defaults::DEFAULT_PROTOCOL, runner.protocol());
        assert_eq!(defaults::DEFAULT_COUNT, runner.count());
        assert_eq!(Duration::from_secs(1), runner.delay());
        assert_eq!(Duration::from_secs(5), runner.timeout());
        assert_eq!(defaults::DEFAULT_PRIVILEGE_MODE, runner.privilege_mode());
        assert_eq!(Sequence(1), runner.sequence());
        assert_eq!(None, runner.port());
    }

    #[test]
    fn test_builder_http_default_timeout() {
        let runner = Builder::new("https://example.com/health")
            .protocol(Protocol::Http)
            .build()
            .unwrap();
        assert_eq!(Duration::from_secs(10), runner.timeout());
    }

    #[test_case(0; "zero")]
    #[test_case(-1; "negative")]
    fn test_non_positive_delay_is_invalid(delay_secs: i64) {
        let err = Builder::new("10.0.0.1")
            .delay_secs(delay_secs)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test_case(Builder::new("").protocol(Protocol::Icmp); "empty target")]
    #[test_case(Builder::new("   ").protocol(Protocol::Icmp); "blank target")]
    #[test_case(Builder::new("10.0.0.1").count(0); "zero count")]
    #[test_case(Builder::new("10.0.0.1").protocol(Protocol::Tcp); "tcp without port")]
    #[test_case(Builder::new("10.0.0.1").protocol(Protocol::Udp).port(0); "udp port zero")]
    #[test_case(Builder::new("10.0.0.1").protocol(Protocol::Icmp).port(80); "icmp with port")]
    #[test_case(Builder::new("http://example.com").protocol(Protocol::Http).port(80); "http with port")]
    #[test_case(Builder::new("example.com").protocol(Protocol::Http); "http without scheme")]
    #[test_case(Builder::new("ftp://example.com").protocol(Protocol::Http); "http bad scheme")]
    #[test_case(Builder::new("::1").protocol(Protocol::Icmp); "ipv6 target")]
    #[test_case(Builder::new("10.0.0.1").timeout(Duration::ZERO); "zero timeout")]
    fn test_invalid_configuration(builder: Builder) {
        assert!(matches!(
            builder.build(),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_invalid_delay_leaves_history_untouched() {
        let mut history = History::new();
        let result = Builder::new("127.0.0.1")
            .delay_secs(0)
            .build()
            .and_then(|runner| runner.run(&FixedResolver(None), &mut history));
        assert!(result.is_err());
        assert!(history.is_empty());
    }

    #[test]
    fn test_run_probes_records_every_attempt() {
        let runner = fast(
            Builder::new("example.com")
                .protocol(Protocol::Tcp)
                .port(443)
                .count(3)
                .build()
                .unwrap(),
        );
        let endpoint = Endpoint::Socket(SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 1), 443));
        let mut seq = CallSequence::new();
        let mut probe = MockProbe::new();
        probe
            .expect_probe()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Duration::from_millis(100)));
        probe
            .expect_probe()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(ProbeError::Refused));
        probe
            .expect_probe()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Duration::from_millis(200)));
        let mut history = History::new();
        let seen = Cell::new(0);
        runner.run_probes(probe, &endpoint, &mut history, |result| {
            assert_eq!("example.com", result.target());
            assert_eq!(Some(Port(443)), result.port());
            seen.set(seen.get() + 1);
        });
        assert_eq!(3, seen.get());
        assert_eq!(3, history.len());
        assert_eq!(Some(&ProbeError::Refused), history.results()[1].error());
        let stats = history.statistics();
        assert_eq!(2, stats.success_count);
        assert_eq!(150_f64, stats.mean_latency_ms);
    }

    #[test]
    fn test_resolve_literal_skips_resolver() {
        let runner = Builder::new("192.0.2.7").build().unwrap();
        let endpoint = runner.endpoint(&FixedResolver(None)).unwrap();
        assert_eq!(Endpoint::Host(Ipv4Addr::new(192, 0, 2, 7)), endpoint);
    }

    #[test]
    fn test_resolve_hostname() {
        let runner = Builder::new("example.com")
            .protocol(Protocol::Udp)
            .port(53)
            .build()
            .unwrap();
        let resolver = FixedResolver(Some(Ipv4Addr::new(93, 184, 215, 14)));
        let endpoint = runner.endpoint(&resolver).unwrap();
        assert_eq!(
            Endpoint::Socket(SocketAddrV4::new(Ipv4Addr::new(93, 184, 215, 14), 53)),
            endpoint
        );
    }

    #[test]
    fn test_resolution_failure_aborts_run() {
        let mut history = History::new();
        let err = Builder::new("no-such-host.invalid")
            .build()
            .unwrap()
            .run(&FixedResolver(None), &mut history)
            .unwrap_err();
        assert!(matches!(err, Error::ResolutionFailure(host, _) if host == "no-such-host.invalid"));
        assert!(history.is_empty());
    }

    #[test]
    fn test_http_endpoint_is_not_resolved() {
        let runner = Builder::new("http://example.com:8080/status")
            .protocol(Protocol::Http)
            .build()
            .unwrap();
        let endpoint = runner.endpoint(&FixedResolver(None)).unwrap();
        assert!(matches!(endpoint, Endpoint::Url(url) if url.port() == Some(8080)));
    }
}
