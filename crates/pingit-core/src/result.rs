use crate::config::Protocol;
use crate::error::ProbeError;
use crate::probe::Outcome;
use crate::types::Port;
use std::time::Duration;

/// The outcome of one probe attempt.
///
/// A result holds either a latency or a failure classification, never both.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    target: String,
    protocol: Protocol,
    port: Option<Port>,
    outcome: Outcome,
}

impl ProbeResult {
    #[must_use]
    pub const fn new(
        target: String,
        protocol: Protocol,
        port: Option<Port>,
        outcome: Outcome,
    ) -> Self {
        Self {
            target,
            protocol,
            port,
            outcome,
        }
    }

    #[must_use]
    pub const fn success(
        target: String,
        protocol: Protocol,
        port: Option<Port>,
        latency: Duration,
    ) -> Self {
        Self::new(target, protocol, port, Ok(latency))
    }

    #[must_use]
    pub const fn failure(
        target: String,
        protocol: Protocol,
        port: Option<Port>,
        error: ProbeError,
    ) -> Self {
        Self::new(target, protocol, port, Err(error))
    }

    /// The target as given by the caller, hostname, literal IP or URL.
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
    pub const fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    #[must_use]
    pub fn latency(&self) -> Option<Duration> {
        self.outcome.as_ref().ok().copied()
    }

    /// The latency in fractional milliseconds, present iff the probe succeeded.
    #[must_use]
    pub fn latency_ms(&self) -> Option<f64> {
        self.latency().map(|latency| latency.as_nanos() as f64 / 1_000_000_f64)
    }

    /// The failure classification, present iff the probe failed.
    #[must_use]
    pub fn error(&self) -> Option<&ProbeError> {
        self.outcome.as_ref().err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Ok(Duration::from_millis(12)); "success")]
    #[test_case(Err(ProbeError::Timeout); "timeout")]
    #[test_case(Err(ProbeError::Refused); "refused")]
    #[test_case(Err(ProbeError::PermissionDenied); "permission denied")]
    #[test_case(Err(ProbeError::TransportError(String::from("boom"))); "transport error")]
    fn test_latency_and_error_are_exclusive(outcome: Outcome) {
        let result = ProbeResult::new(
            String::from("example.com"),
            Protocol::Tcp,
            Some(Port(80)),
            outcome,
        );
        assert_ne!(result.latency_ms().is_some(), result.error().is_some());
        assert_eq!(result.is_success(), result.latency_ms().is_some());
    }

    #[test]
    fn test_latency_ms() {
        let result = ProbeResult::success(
            String::from("10.0.0.1"),
            Protocol::Icmp,
            None,
            Duration::from_micros(1500),
        );
        assert_eq!(Some(1.5), result.latency_ms());
        assert_eq!("10.0.0.1", result.target());
        assert_eq!(Protocol::Icmp, result.protocol());
        assert_eq!(None, result.port());
    }

    #[test]
    fn test_failure() {
        let result = ProbeResult::failure(
            String::from("10.0.0.1"),
            Protocol::Udp,
            Some(Port(53)),
            ProbeError::Timeout,
        );
        assert_eq!(Some(&ProbeError::Timeout), result.error());
        assert_eq!(None, result.latency());
        assert_eq!(Some(Port(53)), result.port());
    }
}
