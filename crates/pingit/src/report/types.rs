use chrono::Utc;
use pingit_core::{ProbeResult, Runner, Statistics};
use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};

#[derive(Serialize)]
pub struct Report {
    pub info: Info,
    pub results: Vec<Probe>,
    pub statistics: Summary,
}

#[derive(Serialize)]
pub struct Info {
    pub target: String,
    pub protocol: String,
    pub port: Option<u16>,
    pub count: usize,
    pub start_timestamp: chrono::DateTime<Utc>,
    pub end_timestamp: chrono::DateTime<Utc>,
}

impl Info {
    pub fn new(
        runner: &Runner,
        start_timestamp: chrono::DateTime<Utc>,
        end_timestamp: chrono::DateTime<Utc>,
    ) -> Self {
        Self {
            target: runner.target().to_string(),
            protocol: runner.protocol().to_string(),
            port: runner.port().map(|port| port.0),
            count: runner.count(),
            start_timestamp,
            end_timestamp,
        }
    }
}

#[derive(Serialize)]
pub struct Probe {
    pub attempt: usize,
    pub success: bool,
    #[serde(serialize_with = "fixed_width_opt")]
    pub latency_ms: Option<f64>,
    pub error: Option<Error>,
}

impl From<(usize, &ProbeResult)> for Probe {
    fn from((attempt, value): (usize, &ProbeResult)) -> Self {
        Self {
            attempt,
            success: value.is_success(),
            latency_ms: value.latency_ms(),
            error: value.error().map(|err| Error {
                kind: err.label(),
                message: err.to_string(),
            }),
        }
    }
}

#[derive(Serialize)]
pub struct Error {
    pub kind: &'static str,
    pub message: String,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[derive(Serialize)]
pub struct Summary {
    pub total: usize,
    pub success: usize,
    pub failure: usize,
    #[serde(serialize_with = "fixed_width")]
    pub success_rate: f64,
    #[serde(serialize_with = "fixed_width")]
    pub mean_latency_ms: f64,
    #[serde(serialize_with = "fixed_width_opt")]
    pub best_latency_ms: Option<f64>,
    #[serde(serialize_with = "fixed_width_opt")]
    pub worst_latency_ms: Option<f64>,
}

impl From<Statistics> for Summary {
    fn from(value: Statistics) -> Self {
        Self {
            total: value.total_count,
            success: value.success_count,
            failure: value.failure_count,
            success_rate: value.success_rate,
            mean_latency_ms: value.mean_latency_ms,
            best_latency_ms: value.best_latency_ms,
            worst_latency_ms: value.worst_latency_ms,
        }
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "total={} success={} failure={} success_rate={:.2} mean={:.2}",
            self.total, self.success, self.failure, self.success_rate, self.mean_latency_ms
        )?;
        if let (Some(best), Some(worst)) = (self.best_latency_ms, self.worst_latency_ms) {
            write!(f, " best={best:.2} worst={worst:.2}")?;
        }
        Ok(())
    }
}

pub fn fixed_width<S>(val: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format!("{val:.2}"))
}

#[allow(clippy::ref_option)]
pub fn fixed_width_opt<S>(val: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match val {
        Some(val) => fixed_width(val, serializer),
        None => serializer.serialize_none(),
    }
}
