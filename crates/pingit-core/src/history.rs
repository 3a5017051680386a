use crate::result::ProbeResult;
use crate::types::SessionNumber;
use std::time::Duration;

/// The ordered results of the current session.
///
/// Results are appended as probes complete and are only removed by a
/// successful [`History::save`], which also advances the session number.
#[derive(Debug, Clone, Default)]
pub struct History {
    results: Vec<ProbeResult>,
    session: SessionNumber,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result.
    pub fn add(&mut self, result: ProbeResult) {
        self.results.push(result);
    }

    /// The results of the current session, in the order they were added.
    #[must_use]
    pub fn results(&self) -> &[ProbeResult] {
        &self.results
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The number the next saved session will be written under.
    #[must_use]
    pub const fn session_number(&self) -> SessionNumber {
        self.session
    }

    /// Discard the results of the current session without saving them.
    pub fn clear(&mut self) {
        self.results.clear();
    }

    /// Compute summary statistics over the current session.
    #[must_use]
    pub fn statistics(&self) -> Statistics {
        Statistics::from_results(&self.results)
    }

    /// Hand the current session to a sink.
    ///
    /// Returns `Ok(false)` without touching the sink if there is nothing to
    /// save. On success the results are cleared and the session number is
    /// incremented; if the sink fails the history is left untouched.
    pub fn save<S: HistorySink>(&mut self, sink: &mut S) -> Result<bool, S::Error> {
        if self.results.is_empty() {
            return Ok(false);
        }
        sink.write_session(self.session, &self.results)?;
        tracing::debug!(session = %self.session, results = self.results.len(), "saved session");
        self.results.clear();
        self.session += SessionNumber(1);
        Ok(true)
    }
}

/// A destination for saved sessions.
#[cfg_attr(test, mockall::automock(type Error = std::io::Error;))]
pub trait HistorySink {
    type Error;

    /// Persist one session of results.
    fn write_session(
        &mut self,
        session: SessionNumber,
        results: &[ProbeResult],
    ) -> Result<(), Self::Error>;
}

/// Summary statistics for a sequence of results.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Statistics {
    pub total_count: usize,
    pub success_count: usize,
    pub failure_count: usize,
    /// The percentage of successful results, `0` when there are none.
    pub success_rate: f64,
    /// The mean latency of the successful results, `0` when there are none.
    pub mean_latency_ms: f64,
    pub best_latency_ms: Option<f64>,
    pub worst_latency_ms: Option<f64>,
}

impl Statistics {
    #[must_use]
    pub fn from_results(results: &[ProbeResult]) -> Self {
        let total_count = results.len();
        let mut success_count = 0;
        let mut total_time = Duration::ZERO;
        let mut best: Option<Duration> = None;
        let mut worst: Option<Duration> = None;
        for latency in results.iter().filter_map(ProbeResult::latency) {
            success_count += 1;
            total_time += latency;
            best = Some(best.map_or(latency, |best| best.min(latency)));
            worst = Some(worst.map_or(latency, |worst| worst.max(latency)));
        }
        let success_rate = if total_count > 0 {
            success_count as f64 / total_count as f64 * 100_f64
        } else {
            0_f64
        };
        let mean_latency_ms = if success_count > 0 {
            as_millis_f64(total_time) / success_count as f64
        } else {
            0_f64
        };
        Self {
            total_count,
            success_count,
            failure_count: total_count - success_count,
            success_rate,
            mean_latency_ms,
            best_latency_ms: best.map(as_millis_f64),
            worst_latency_ms: worst.map(as_millis_f64),
        }
    }
}

fn as_millis_f64(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000_f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Protocol;
    use crate::error::ProbeError;
    use crate::types::Port;
    use std::io;

    fn success(millis: u64) -> ProbeResult {
        ProbeResult::success(
            String::from("example.com"),
            Protocol::Tcp,
            Some(Port(443)),
            Duration::from_millis(millis),
        )
    }

    fn failure() -> ProbeResult {
        ProbeResult::failure(
            String::from("example.com"),
            Protocol::Tcp,
            Some(Port(443)),
            ProbeError::Timeout,
        )
    }

    #[test]
    fn test_empty_statistics() {
        let history = History::new();
        assert_eq!(Statistics::default(), history.statistics());
        assert_eq!(0_f64, history.statistics().success_rate);
        assert_eq!(0_f64, history.statistics().mean_latency_ms);
    }

    #[test]
    fn test_statistics() {
        let mut history = History::new();
        history.add(success(100));
        history.add(success(200));
        history.add(failure());
        let stats = history.statistics();
        assert_eq!(3, stats.total_count);
        assert_eq!(2, stats.success_count);
        assert_eq!(1, stats.failure_count);
        assert!((stats.success_rate - 66.67).abs() < 0.01);
        assert_eq!(150_f64, stats.mean_latency_ms);
        assert_eq!(Some(100_f64), stats.best_latency_ms);
        assert_eq!(Some(200_f64), stats.worst_latency_ms);
    }

    #[test]
    fn test_all_failures() {
        let mut history = History::new();
        history.add(failure());
        history.add(failure());
        let stats = history.statistics();
        assert_eq!(0_f64, stats.success_rate);
        assert_eq!(0_f64, stats.mean_latency_ms);
        assert_eq!(None, stats.best_latency_ms);
        assert_eq!(2, stats.failure_count);
    }

    #[test]
    fn test_results_keep_insertion_order() {
        let mut history = History::new();
        history.add(success(3));
        history.add(failure());
        history.add(success(1));
        let latencies = history
            .results()
            .iter()
            .map(ProbeResult::latency_ms)
            .collect::<Vec<_>>();
        assert_eq!(vec![Some(3_f64), None, Some(1_f64)], latencies);
    }

    #[test]
    fn test_save_empty_is_noop() {
        let mut sink = MockHistorySink::new();
        sink.expect_write_session().never();
        let mut history = History::new();
        assert!(!history.save(&mut sink).unwrap());
        assert_eq!(SessionNumber(1), history.session_number());
    }

    #[test]
    fn test_save_clears_and_advances_session() {
        let mut sink = MockHistorySink::new();
        sink.expect_write_session()
            .withf(|session, results| *session == SessionNumber(1) && results.len() == 2)
            .times(1)
            .returning(|_, _| Ok(()));
        sink.expect_write_session()
            .withf(|session, results| *session == SessionNumber(2) && results.len() == 1)
            .times(1)
            .returning(|_, _| Ok(()));
        let mut history = History::new();
        history.add(success(10));
        history.add(failure());
        assert!(history.save(&mut sink).unwrap());
        assert!(history.is_empty());
        assert_eq!(SessionNumber(2), history.session_number());
        history.add(success(20));
        assert!(history.save(&mut sink).unwrap());
        assert_eq!(SessionNumber(3), history.session_number());
    }

    #[test]
    fn test_failed_save_keeps_history() {
        let mut sink = MockHistorySink::new();
        sink.expect_write_session()
            .times(1)
            .returning(|_, _| Err(io::Error::from(io::ErrorKind::PermissionDenied)));
        let mut history = History::new();
        history.add(success(10));
        assert!(history.save(&mut sink).is_err());
        assert_eq!(1, history.len());
        assert_eq!(SessionNumber(1), history.session_number());
    }
}
