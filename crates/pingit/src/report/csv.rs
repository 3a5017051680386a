use crate::report::types::fixed_width_opt;
use pingit_core::{History, ProbeResult, Runner};
use pingit_dns::Resolver;
use serde::Serialize;
use std::io::Write;
use tracing::instrument;

/// Generate a CSV report of all probe results.
#[instrument(skip_all, level = "trace")]
pub fn report<R: Resolver>(
    runner: &Runner,
    resolver: &R,
    history: &mut History,
) -> anyhow::Result<()> {
    runner.run(resolver, history)?;
    write_rows(std::io::stdout(), history)
}

fn write_rows<W: Write>(wtr: W, history: &History) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(wtr);
    for (i, result) in history.results().iter().enumerate() {
        writer.serialize(CsvRow::new(i + 1, result))?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
pub struct CsvRow {
    #[serde(rename = "Attempt")]
    pub attempt: usize,
    #[serde(rename = "Target")]
    pub target: String,
    #[serde(rename = "Protocol")]
    pub protocol: String,
    #[serde(rename = "Port")]
    pub port: Option<u16>,
    #[serde(rename = "Status")]
    pub status: &'static str,
    #[serde(rename = "Latency")]
    #[serde(serialize_with = "fixed_width_opt")]
    pub latency_ms: Option<f64>,
    #[serde(rename = "Error")]
    pub error: Option<String>,
}

impl CsvRow {
    fn new(attempt: usize, result: &ProbeResult) -> Self {
        Self {
            attempt,
            target: result.target().to_string(),
            protocol: result.protocol().to_string(),
            port: result.port().map(|port| port.0),
            status: result.error().map_or("ok", |err| err.label()),
            latency_ms: result.latency_ms(),
            error: result.error().map(ToString::to_string),
        }
    }
}
