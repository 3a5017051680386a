use crate::report::types::{Probe, Summary};
use itertools::Itertools;
use pingit_core::{History, ProbeResult, Runner};
use pingit_dns::Resolver;
use tracing::instrument;

/// Display each probe result as it completes, followed by a summary.
#[instrument(skip_all, level = "trace")]
pub fn report<R: Resolver>(
    runner: &Runner,
    resolver: &R,
    history: &mut History,
) -> anyhow::Result<()> {
    println!("{}", header(runner));
    let mut attempt = 0;
    runner.run_with(resolver, history, |result| {
        attempt += 1;
        println!("{}", line(attempt, result));
    })?;
    println!("{}", summary(history));
    Ok(())
}

fn header(runner: &Runner) -> String {
    match runner.port() {
        Some(port) => format!(
            "Probing {}:{} with {} ({} probes)",
            runner.target(),
            port,
            runner.protocol(),
            runner.count()
        ),
        None => format!(
            "Probing {} with {} ({} probes)",
            runner.target(),
            runner.protocol(),
            runner.count()
        ),
    }
}

fn line(attempt: usize, result: &ProbeResult) -> String {
    let probe = Probe::from((attempt, result));
    match (probe.latency_ms, probe.error) {
        (Some(latency), _) => format!("attempt={attempt} status=ok latency={latency:.2}ms"),
        (None, Some(err)) => format!("attempt={attempt} status={} error=\"{err}\"", err.kind),
        (None, None) => format!("attempt={attempt} status=unknown"),
    }
}

fn summary(history: &History) -> String {
    let latencies = history
        .results()
        .iter()
        .filter_map(ProbeResult::latency_ms)
        .map(|latency| format!("{latency:.2}"))
        .join(", ");
    format!(
        "{} latencies=[{latencies}]",
        Summary::from(history.statistics())
    )
}
