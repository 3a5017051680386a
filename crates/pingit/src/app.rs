use crate::config::{LogFormat, LogSpanEvents, Mode, PingitConfig};
use crate::history::HistoryFile;
use crate::report;
use pingit_core::{Builder, History, PrivilegeMode, Protocol, Runner};
use pingit_dns::DnsResolver;
use pingit_privilege::Privilege;
use tracing_subscriber::fmt::format::FmtSpan;

/// Run the pingit application.
pub fn run_pingit(cfg: &PingitConfig, privilege: &Privilege) -> anyhow::Result<()> {
    configure_logging(cfg);
    warn_privilege(cfg, privilege);
    let resolver = start_dns_resolver(cfg)?;
    let runner = make_runner(cfg)?;
    let mut history = History::new();
    let result = match cfg.mode {
        Mode::Stream => report::stream::report(&runner, &resolver, &mut history),
        Mode::Json => report::json::report(&runner, &resolver, &mut history),
        Mode::Csv => report::csv::report(&runner, &resolver, &mut history),
        Mode::Silent => report::silent::report(&runner, &resolver, &mut history),
    };
    Privilege::drop_privileges()?;
    result?;
    if cfg.save_history {
        let mut sink = HistoryFile::new(&cfg.history_file);
        if history.save(&mut sink)? {
            eprintln!("Test results saved to {}", sink.path().display());
        } else {
            eprintln!("No test results available.");
        }
    }
    Ok(())
}

/// Build the probe runner.
fn make_runner(cfg: &PingitConfig) -> anyhow::Result<Runner> {
    let builder = Builder::new(cfg.target.clone())
        .protocol(cfg.protocol)
        .count(cfg.count)
        .delay_secs(cfg.delay)
        .timeout(cfg.timeout)
        .privilege_mode(cfg.privilege_mode);
    let builder = match cfg.port {
        Some(port) => builder.port(port),
        None => builder,
    };
    Ok(builder.build()?)
}

/// Start the DNS resolver.
fn start_dns_resolver(cfg: &PingitConfig) -> anyhow::Result<DnsResolver> {
    Ok(DnsResolver::start(
        pingit_dns::Builder::new()
            .resolve_method(cfg.dns_resolve_method)
            .timeout(cfg.dns_timeout)
            .build(),
    )?)
}

/// Warn if a raw `ICMP` socket is required but privileges are missing.
fn warn_privilege(cfg: &PingitConfig, privilege: &Privilege) {
    if cfg.protocol == Protocol::Icmp
        && cfg.privilege_mode == PrivilegeMode::Privileged
        && !privilege.has_privileges()
    {
        eprintln!(
            "Warning: ICMP in privileged mode requires elevated privileges, try sudo or --icmp-privilege-mode unprivileged"
        );
    }
}

fn configure_logging(cfg: &PingitConfig) {
    if cfg.verbose {
        let fmt_span = match cfg.log_span_events {
            LogSpanEvents::Off => FmtSpan::NONE,
            LogSpanEvents::Active => FmtSpan::ACTIVE,
            LogSpanEvents::Full => FmtSpan::FULL,
        };
        match cfg.log_format {
            LogFormat::Compact => {
                tracing_subscriber::fmt()
                    .with_span_events(fmt_span)
                    .with_env_filter(&cfg.log_filter)
                    .with_writer(std::io::stderr)
                    .compact()
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::fmt()
                    .with_span_events(fmt_span)
                    .with_env_filter(&cfg.log_filter)
                    .with_writer(std::io::stderr)
                    .pretty()
                    .init();
            }
            LogFormat::Json => {
                tracing_subscriber::fmt()
                    .with_span_events(fmt_span)
                    .with_env_filter(&cfg.log_filter)
                    .with_writer(std::io::stderr)
                    .json()
                    .init();
            }
        }
    }
}
