use crate::config::{
    DnsResolveMethodConfig, IcmpPrivilegeModeConfig, LogFormat, LogSpanEvents, Mode,
    ProtocolConfig,
};
use clap::builder::Styles;
use clap::Parser;
use clap_complete::Shell;
use std::time::Duration;

/// Probe a host with ICMP, UDP, TCP or HTTP and report latency
#[derive(Parser, Debug)]
#[command(name = "pingit", author, version, about, long_about = None, arg_required_else_help(true), styles=Styles::styled())]
pub struct Args {
    /// The hostname or IPv4 address to probe
    #[arg(required_unless_present_any(["url", "generate", "print_config_template"]))]
    pub target: Option<String>,

    /// The URL to probe (HTTP only)
    #[arg(short = 'U', long, conflicts_with = "target", value_hint = clap::ValueHint::Url)]
    pub url: Option<String>,

    /// Config file
    #[arg(short = 'c', long, value_hint = clap::ValueHint::FilePath)]
    pub config_file: Option<String>,

    /// Output mode [default: stream]
    #[arg(value_enum, short = 'm', long)]
    pub mode: Option<Mode>,

    /// Probe protocol [default: icmp, or http if --url is given]
    #[arg(value_enum, short = 'p', long)]
    pub protocol: Option<ProtocolConfig>,

    /// The target port (TCP & UDP only)
    #[arg(short = 'P', long)]
    pub port: Option<u16>,

    /// The number of probes to send [default: 4]
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// The delay after each probe in whole seconds [default: 1]
    #[arg(short = 'd', long, allow_negative_numbers = true)]
    pub delay: Option<i64>,

    /// The per probe timeout [default: 5s, or 10s for http]
    #[arg(short = 't', long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// How ICMP sockets are opened [default: privileged]
    #[arg(value_enum, short = 'u', long)]
    pub icmp_privilege_mode: Option<IcmpPrivilegeModeConfig>,

    /// How DNS queries are resolved [default: system]
    #[arg(value_enum, short = 'r', long)]
    pub dns_resolve_method: Option<DnsResolveMethodConfig>,

    /// The maximum time to wait to perform DNS queries [default: 5s]
    #[arg(long, value_parser = parse_duration)]
    pub dns_timeout: Option<Duration>,

    /// Append the results to the history file [default: false]
    #[arg(short = 's', long)]
    pub save_history: bool,

    /// The history file [default: ping_history.txt]
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub history_file: Option<String>,

    /// Generate shell completion
    #[arg(long)]
    pub generate: Option<Shell>,

    /// Print a template toml config file and exit
    #[arg(long)]
    pub print_config_template: bool,

    /// The debug log format [default: pretty]
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// The debug log filter [default: pingit=debug]
    #[arg(long)]
    pub log_filter: Option<String>,

    /// The debug log format [default: off]
    #[arg(long)]
    pub log_span_events: Option<LogSpanEvents>,

    /// Enable verbose debug logging
    #[arg(short = 'v', long, default_value_t = false)]
    pub verbose: bool,
}

fn parse_duration(value: &str) -> anyhow::Result<Duration> {
    Ok(humantime::parse_duration(value)?)
}
