use crate::error::ProbeError;
use crate::probe::{unsupported, Endpoint, Outcome, Probe};
use std::error::Error as _;
use std::io;
use std::time::{Duration, Instant};
use tracing::instrument;

const USER_AGENT: &str = concat!("pingit/", env!("CARGO_PKG_VERSION"));

/// Probe a URL with a single `HTTP` `GET`.
///
/// Any response counts as a success, whatever its status code. The latency is
/// measured up to the arrival of the response headers; the body is not read.
#[derive(Debug)]
pub struct HttpProbe {
    timeout: Duration,
}

impl HttpProbe {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// A fresh client per probe, so no connection is reused between attempts.
    fn client(&self) -> Result<reqwest::blocking::Client, ProbeError> {
        reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .pool_max_idle_per_host(0)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| classify(&err))
    }
}

impl Probe for HttpProbe {
    #[instrument(skip(self), level = "debug")]
    fn probe(&mut self, endpoint: &Endpoint) -> Outcome {
        let Endpoint::Url(url) = endpoint else {
            return Err(unsupported(endpoint));
        };
        let client = self.client()?;
        let start = Instant::now();
        let response = client
            .get(url.clone())
            .send()
            .map_err(|err| classify(&err))?;
        let latency = start.elapsed();
        tracing::debug!(status = %response.status(), version = ?response.version(), ?latency);
        Ok(latency)
    }
}

/// Classify a request failure.
///
/// Failures to build or send the request keep the client's own message; a
/// refused connection is reported as [`ProbeError::Refused`] and anything else
/// is prefixed with `Error: `.
fn classify(err: &reqwest::Error) -> ProbeError {
    if err.is_timeout() {
        ProbeError::Timeout
    } else if is_connection_refused(err) {
        ProbeError::Refused
    } else if err.is_builder() || err.is_connect() || err.is_request() {
        ProbeError::TransportError(err.to_string())
    } else {
        ProbeError::TransportError(format!("Error: {err}"))
    }
}

/// Walk the source chain looking for an `ECONNREFUSED`.
fn is_connection_refused(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(err) = source {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        source = err.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{Ipv4Addr, TcpListener};
    use std::thread;
    use url::Url;

    fn endpoint(url: &str) -> Endpoint {
        Endpoint::Url(Url::parse(url).unwrap())
    }

    /// Serve a single canned response on a loopback port.
    fn serve_once(response: &'static [u8]) -> anyhow::Result<(u16, thread::JoinHandle<()>)> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
        let port = listener.local_addr()?.port();
        let handle = thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0_u8; 1024];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response);
            }
        });
        Ok((port, handle))
    }

    #[test]
    fn test_any_status_is_success() -> anyhow::Result<()> {
        let (port, handle) =
            serve_once(b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\n\r\n")?;
        let mut probe = HttpProbe::new(Duration::from_secs(5));
        let latency = probe.probe(&endpoint(&format!("http://127.0.0.1:{port}/health")));
        handle.join().unwrap();
        assert!(latency.is_ok());
        Ok(())
    }

    #[test]
    fn test_closed_port_is_refused() -> anyhow::Result<()> {
        let port = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?.local_addr()?.port();
        let mut probe = HttpProbe::new(Duration::from_secs(5));
        let err = probe
            .probe(&endpoint(&format!("http://127.0.0.1:{port}/")))
            .unwrap_err();
        assert_eq!(ProbeError::Refused, err);
        Ok(())
    }

    #[test]
    fn test_silent_server_is_timeout() -> anyhow::Result<()> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
        let port = listener.local_addr()?.port();
        let mut probe = HttpProbe::new(Duration::from_millis(200));
        let err = probe
            .probe(&endpoint(&format!("http://127.0.0.1:{port}/")))
            .unwrap_err();
        drop(listener);
        assert_eq!(ProbeError::Timeout, err);
        Ok(())
    }
}
