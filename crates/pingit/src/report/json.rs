use crate::report::types::{Info, Probe, Report, Summary};
use pingit_core::{History, Runner};
use pingit_dns::Resolver;
use tracing::instrument;

/// Generate a json report of all probe results.
#[instrument(skip_all, level = "trace")]
pub fn report<R: Resolver>(
    runner: &Runner,
    resolver: &R,
    history: &mut History,
) -> anyhow::Result<()> {
    let start_timestamp = chrono::Utc::now();
    runner.run(resolver, history)?;
    let end_timestamp = chrono::Utc::now();
    let report = make_report(runner, history, start_timestamp, end_timestamp);
    serde_json::to_writer_pretty(std::io::stdout(), &report)?;
    println!();
    Ok(())
}

fn make_report(
    runner: &Runner,
    history: &History,
    start_timestamp: chrono::DateTime<chrono::Utc>,
    end_timestamp: chrono::DateTime<chrono::Utc>,
) -> Report {
    let results = history
        .results()
        .iter()
        .enumerate()
        .map(|(i, result)| Probe::from((i + 1, result)))
        .collect();
    Report {
        info: Info::new(runner, start_timestamp, end_timestamp),
        results,
        statistics: Summary::from(history.statistics()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pingit_core::{Builder, ProbeError, ProbeResult, Protocol};
    use std::time::Duration;

    #[test]
    fn test_make_report() -> anyhow::Result<()> {
        let runner = Builder::new("example.com")
            .protocol(Protocol::Tcp)
            .port(80)
            .count(2)
            .build()?;
        let mut history = History::new();
        history.add(ProbeResult::success(
            String::from("example.com"),
            Protocol::Tcp,
            runner.port(),
            Duration::from_millis(20),
        ));
        history.add(ProbeResult::failure(
            String::from("example.com"),
            Protocol::Tcp,
            runner.port(),
            ProbeError::Refused,
        ));
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 2).unwrap();
        let json = serde_json::to_value(make_report(&runner, &history, start, end))?;
        let expected = serde_json::json!({
            "info": {
                "target": "example.com",
                "protocol": "TCP",
                "port": 80,
                "count": 2,
                "start_timestamp": "2024-01-01T00:00:00Z",
                "end_timestamp": "2024-01-01T00:00:02Z"
            },
            "results": [
                {"attempt": 1, "success": true, "latency_ms": "20.00", "error": null},
                {
                    "attempt": 2,
                    "success": false,
                    "latency_ms": null,
                    "error": {"kind": "refused", "message": "Connection refused"}
                }
            ],
            "statistics": {
                "total": 2,
                "success": 1,
                "failure": 1,
                "success_rate": "50.00",
                "mean_latency_ms": "20.00",
                "best_latency_ms": "20.00",
                "worst_latency_ms": "20.00"
            }
        });
        pretty_assertions::assert_eq!(expected, json);
        Ok(())
    }
}
