use anyhow::anyhow;
use clap::ValueEnum;
use clap_complete::Shell;
use file::ConfigFile;
use pingit_core::{defaults, PrivilegeMode, Protocol};
use pingit_dns::ResolveMethod;
use pingit_privilege::Privilege;
use serde::Deserialize;
use std::time::Duration;

mod cmd;
mod constants;
mod file;

pub use cmd::Args;

/// The output mode.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Display each result as it completes followed by a summary.
    Stream,
    /// Generate a JSON report.
    Json,
    /// Generate a CSV report.
    Csv,
    /// Do not generate any output.
    Silent,
}

/// The probe protocol.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProtocolConfig {
    /// Internet Control Message Protocol
    Icmp,
    /// User Datagram Protocol
    Udp,
    /// Transmission Control Protocol
    Tcp,
    /// Hypertext Transfer Protocol
    Http,
}

impl From<Protocol> for ProtocolConfig {
    fn from(value: Protocol) -> Self {
        match value {
            Protocol::Icmp => Self::Icmp,
            Protocol::Udp => Self::Udp,
            Protocol::Tcp => Self::Tcp,
            Protocol::Http => Self::Http,
        }
    }
}

/// How `ICMP` sockets are opened.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IcmpPrivilegeModeConfig {
    /// Use a raw socket, requires elevated privileges.
    Privileged,
    /// Use an ICMP datagram socket, on supported platforms.
    Unprivileged,
}

impl From<PrivilegeMode> for IcmpPrivilegeModeConfig {
    fn from(value: PrivilegeMode) -> Self {
        match value {
            PrivilegeMode::Privileged => Self::Privileged,
            PrivilegeMode::Unprivileged => Self::Unprivileged,
        }
    }
}

/// How DNS queries will be resolved.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DnsResolveMethodConfig {
    /// Resolve using the OS resolver.
    System,
    /// Resolve using the `/etc/resolv.conf` DNS configuration.
    Resolv,
    /// Resolve using the Google `8.8.8.8` DNS service.
    Google,
    /// Resolve using the Cloudflare `1.1.1.1` DNS service.
    Cloudflare,
}

/// How to format log data.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    /// Display log data in a compact format.
    Compact,
    /// Display log data in a pretty format.
    Pretty,
    /// Display log data in a json format.
    Json,
}

/// How to log event spans.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogSpanEvents {
    /// Do not display event spans.
    Off,
    /// Display enter and exit event spans.
    Active,
    /// Display all event spans.
    Full,
}

/// The action to perform.
#[derive(Debug, Eq, PartialEq)]
pub enum PingitAction {
    /// Run the probes.
    Ping(PingitConfig),
    /// Print a template toml config file and exit.
    PrintConfigTemplate,
    /// Generate shell completion and exit.
    PrintShellCompletions(Shell),
}

impl PingitAction {
    pub fn from(args: Args, privilege: &Privilege) -> anyhow::Result<Self> {
        Ok(if args.print_config_template {
            Self::PrintConfigTemplate
        } else if let Some(shell) = args.generate {
            Self::PrintShellCompletions(shell)
        } else {
            Self::Ping(PingitConfig::from(args, privilege)?)
        })
    }
}

/// Fully parsed and validated configuration.
#[derive(Debug, Eq, PartialEq)]
pub struct PingitConfig {
    pub target: String,
    pub protocol: Protocol,
    pub port: Option<u16>,
    pub count: usize,
    pub delay: i64,
    pub timeout: Duration,
    pub privilege_mode: PrivilegeMode,
    pub dns_resolve_method: ResolveMethod,
    pub dns_timeout: Duration,
    pub mode: Mode,
    pub save_history: bool,
    pub history_file: String,
    pub verbose: bool,
    pub log_format: LogFormat,
    pub log_filter: String,
    pub log_span_events: LogSpanEvents,
}

impl PingitConfig {
    pub fn from(args: Args, privilege: &Privilege) -> anyhow::Result<Self> {
        let cfg_file = if let Some(cfg) = &args.config_file {
            file::read_config_file(cfg)?
        } else {
            file::read_default_config_file()?.unwrap_or_default()
        };
        Self::build_config(args, cfg_file, privilege)
    }

    fn build_config(
        args: Args,
        cfg_file: ConfigFile,
        privilege: &Privilege,
    ) -> anyhow::Result<Self> {
        let cfg_file_probe = cfg_file.probe.unwrap_or_default();
        let cfg_file_dns = cfg_file.dns.unwrap_or_default();
        let cfg_file_report = cfg_file.report.unwrap_or_default();
        let cfg_file_log = cfg_file.log.unwrap_or_default();
        let protocol = protocol(cfg_layer(
            args.protocol
                .or_else(|| args.url.as_ref().map(|_| ProtocolConfig::Http)),
            cfg_file_probe.protocol,
            ProtocolConfig::from(defaults::DEFAULT_PROTOCOL),
        ));
        let target = validate_target(protocol, args.target, args.url)?;
        let port = cfg_layer_opt(
            args.port,
            cfg_file_probe.port.filter(|_| protocol.requires_port()),
        );
        let count = cfg_layer(
            args.count,
            cfg_file_probe.count,
            defaults::DEFAULT_COUNT,
        );
        let delay = cfg_layer(
            args.delay,
            cfg_file_probe.delay,
            defaults::DEFAULT_DELAY_SECS,
        );
        let timeout = cfg_layer(
            args.timeout,
            cfg_file_probe.timeout,
            protocol.default_timeout(),
        );
        let privilege_mode = privilege_mode(cfg_layer(
            args.icmp_privilege_mode,
            cfg_file_probe.icmp_privilege_mode,
            IcmpPrivilegeModeConfig::from(defaults::DEFAULT_PRIVILEGE_MODE),
        ));
        let dns_resolve_method = dns_resolve_method(cfg_layer(
            args.dns_resolve_method,
            cfg_file_dns.dns_resolve_method,
            constants::DEFAULT_DNS_RESOLVE_METHOD,
        ));
        let dns_timeout = cfg_layer(
            args.dns_timeout,
            cfg_file_dns.dns_timeout,
            constants::DEFAULT_DNS_TIMEOUT,
        );
        let mode = cfg_layer(args.mode, cfg_file_report.mode, constants::DEFAULT_MODE);
        let save_history = cfg_layer_bool_flag(
            args.save_history,
            cfg_file_report.save_history,
            constants::DEFAULT_SAVE_HISTORY,
        );
        let history_file = cfg_layer(
            args.history_file,
            cfg_file_report.history_file,
            String::from(constants::DEFAULT_HISTORY_FILE),
        );
        let verbose = args.verbose;
        let log_format = cfg_layer(
            args.log_format,
            cfg_file_log.log_format,
            constants::DEFAULT_LOG_FORMAT,
        );
        let log_filter = cfg_layer(
            args.log_filter,
            cfg_file_log.log_filter,
            String::from(constants::DEFAULT_LOG_FILTER),
        );
        let log_span_events = cfg_layer(
            args.log_span_events,
            cfg_file_log.log_span_events,
            constants::DEFAULT_LOG_SPAN_EVENTS,
        );
        validate_privilege(protocol, privilege_mode, privilege)?;
        validate_history_file(save_history, &history_file)?;
        Ok(Self {
            target,
            protocol,
            port,
            count,
            delay,
            timeout,
            privilege_mode,
            dns_resolve_method,
            dns_timeout,
            mode,
            save_history,
            history_file,
            verbose,
            log_format,
            log_filter,
            log_span_events,
        })
    }
}

impl Default for PingitConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            protocol: defaults::DEFAULT_PROTOCOL,
            port: None,
            count: defaults::DEFAULT_COUNT,
            delay: defaults::DEFAULT_DELAY_SECS,
            timeout: defaults::DEFAULT_PROTOCOL.default_timeout(),
            privilege_mode: defaults::DEFAULT_PRIVILEGE_MODE,
            dns_resolve_method: dns_resolve_method(constants::DEFAULT_DNS_RESOLVE_METHOD),
            dns_timeout: constants::DEFAULT_DNS_TIMEOUT,
            mode: constants::DEFAULT_MODE,
            save_history: constants::DEFAULT_SAVE_HISTORY,
            history_file: String::from(constants::DEFAULT_HISTORY_FILE),
            verbose: false,
            log_format: constants::DEFAULT_LOG_FORMAT,
            log_filter: String::from(constants::DEFAULT_LOG_FILTER),
            log_span_events: constants::DEFAULT_LOG_SPAN_EVENTS,
        }
    }
}

const fn protocol(protocol: ProtocolConfig) -> Protocol {
    match protocol {
        ProtocolConfig::Icmp => Protocol::Icmp,
        ProtocolConfig::Udp => Protocol::Udp,
        ProtocolConfig::Tcp => Protocol::Tcp,
        ProtocolConfig::Http => Protocol::Http,
    }
}

const fn privilege_mode(privilege_mode: IcmpPrivilegeModeConfig) -> PrivilegeMode {
    match privilege_mode {
        IcmpPrivilegeModeConfig::Privileged => PrivilegeMode::Privileged,
        IcmpPrivilegeModeConfig::Unprivileged => PrivilegeMode::Unprivileged,
    }
}

const fn dns_resolve_method(dns_resolve_method: DnsResolveMethodConfig) -> ResolveMethod {
    match dns_resolve_method {
        DnsResolveMethodConfig::System => ResolveMethod::System,
        DnsResolveMethodConfig::Resolv => ResolveMethod::Resolv,
        DnsResolveMethodConfig::Google => ResolveMethod::Google,
        DnsResolveMethodConfig::Cloudflare => ResolveMethod::Cloudflare,
    }
}

fn cfg_layer<T>(fst: Option<T>, snd: Option<T>, def: T) -> T {
    match (fst, snd) {
        (Some(val), _) | (None, Some(val)) => val,
        (None, None) => def,
    }
}

fn cfg_layer_opt<T>(fst: Option<T>, snd: Option<T>) -> Option<T> {
    match (fst, snd) {
        (Some(val), _) | (None, Some(val)) => Some(val),
        (None, None) => None,
    }
}

const fn cfg_layer_bool_flag(fst: bool, snd: Option<bool>, default: bool) -> bool {
    match (fst, snd) {
        (true, _) => true,
        (false, Some(val)) => val,
        (false, None) => default,
    }
}

/// Select the target from the positional argument or `--url`.
fn validate_target(
    protocol: Protocol,
    target: Option<String>,
    url: Option<String>,
) -> anyhow::Result<String> {
    match (protocol, target, url) {
        (Protocol::Http, None, Some(url)) | (_, Some(url), None) => Ok(url),
        (_, _, Some(_)) => Err(anyhow!("url may only be used with the http protocol")),
        (_, None, None) => Err(anyhow!("missing target")),
    }
}

/// Validate privileges.
fn validate_privilege(
    protocol: Protocol,
    privilege_mode: PrivilegeMode,
    privilege: &Privilege,
) -> anyhow::Result<()> {
    match (protocol, privilege_mode, privilege.supports_unprivileged()) {
        (Protocol::Icmp, PrivilegeMode::Unprivileged, false) => Err(anyhow!(
            "unprivileged ICMP mode not supported on this platform"
        )),
        _ => Ok(()),
    }
}

/// Validate the history file.
fn validate_history_file(save_history: bool, history_file: &str) -> anyhow::Result<()> {
    if save_history && history_file.trim().is_empty() {
        Err(anyhow!("history-file may not be empty"))
    } else {
        Ok(())
    }
}
