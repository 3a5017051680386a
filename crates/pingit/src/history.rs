use pingit_core::{HistorySink, ProbeResult, SessionNumber};
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// A `HistorySink` which appends sessions to a text file.
#[derive(Debug, Clone)]
pub struct HistoryFile {
    path: PathBuf,
}

impl HistoryFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistorySink for HistoryFile {
    type Error = io::Error;

    fn write_session(
        &mut self,
        session: SessionNumber,
        results: &[ProbeResult],
    ) -> Result<(), Self::Error> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);
        write_session(&mut writer, session, results)?;
        writer.flush()
    }
}

/// Write a single session block.
pub fn write_session<W: Write>(
    writer: &mut W,
    session: SessionNumber,
    results: &[ProbeResult],
) -> io::Result<()> {
    writeln!(writer, "--- Ping Results Test #{session} ---")?;
    writeln!(writer)?;
    for (index, result) in results.iter().enumerate() {
        writeln!(writer, "--- Ping Result {} ---", index + 1)?;
        writeln!(writer, "Target: {}", result.target())?;
        writeln!(writer, "Protocol: {}", result.protocol())?;
        if let Some(port) = result.port() {
            writeln!(writer, "Port: {port}")?;
        }
        match (result.latency_ms(), result.error()) {
            (Some(latency), _) => writeln!(writer, "Response Time: {latency:.0} ms")?,
            (None, Some(err)) => writeln!(writer, "Error: {err}")?,
            (None, None) => {}
        }
        writeln!(writer)?;
    }
    Ok(())
}
