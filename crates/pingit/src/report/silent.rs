use pingit_core::{History, Runner};
use pingit_dns::Resolver;
use tracing::instrument;

/// Run all probes without generating any output.
#[instrument(skip_all, level = "trace")]
pub fn report<R: Resolver>(
    runner: &Runner,
    resolver: &R,
    history: &mut History,
) -> anyhow::Result<()> {
    runner.run(resolver, history)?;
    Ok(())
}
