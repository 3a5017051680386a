use crate::config::{
    DnsResolveMethodConfig, IcmpPrivilegeModeConfig, LogFormat, LogSpanEvents, Mode,
    ProtocolConfig,
};
use anyhow::Context;
use encoding_rs_io::DecodeReaderBytes;
use etcetera::BaseStrategy;
use pingit_core::defaults;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "pingit.toml";
const DEFAULT_HIDDEN_CONFIG_FILE: &str = ".pingit.toml";

/// Read the config from the default location of user config for the platform.
///
/// Returns the parsed `Some(ConfigFile)` if the config file exists, `None` otherwise.
///
/// PingIt will attempt to locate a `pingit.toml` or `.pingit.toml`
/// config file in one of the following locations:
///     - the current directory
///     - the user home directory
///     - the XDG config directory: `$XDG_CONFIG_HOME` or `~/.config`
///     - the XDG app config directory: `$XDG_CONFIG_HOME/pingit` or `~/.config/pingit`
///
/// Note that only the first config file found is used, no attempt is
/// made to merge the values from multiple files.
pub fn read_default_config_file() -> anyhow::Result<Option<ConfigFile>> {
    use etcetera::base_strategy as base;
    if let Some(file) = read_files("")? {
        Ok(Some(file))
    } else {
        let basedirs = base::choose_base_strategy()?;
        if let Some(file) = read_files(basedirs.home_dir())? {
            Ok(Some(file))
        } else if let Some(file) = read_files(basedirs.config_dir())? {
            Ok(Some(file))
        } else if let Some(file) = read_files(basedirs.config_dir().join("pingit"))? {
            Ok(Some(file))
        } else {
            Ok(None)
        }
    }
}

/// Read the config from the given path.
pub fn read_config_file<P: AsRef<Path>>(path: P) -> anyhow::Result<ConfigFile> {
    let file = File::open(path.as_ref())
        .with_context(|| format!("config file not found: {}", path.as_ref().display()))?;
    let mut decoder = DecodeReaderBytes::new(BufReader::new(file));
    let mut dest = String::new();
    decoder.read_to_string(&mut dest)?;
    toml::from_str(&dest)
        .with_context(|| format!("invalid config file: {}", path.as_ref().display()))
}

fn read_files<P: AsRef<Path>>(dir: P) -> anyhow::Result<Option<ConfigFile>> {
    if let Some(file) = read_file(dir.as_ref(), DEFAULT_CONFIG_FILE)? {
        Ok(Some(file))
    } else if let Some(file) = read_file(dir.as_ref(), DEFAULT_HIDDEN_CONFIG_FILE)? {
        Ok(Some(file))
    } else {
        Ok(None)
    }
}

fn read_file<P: AsRef<Path>>(dir: P, file: &str) -> anyhow::Result<Option<ConfigFile>> {
    let path = dir.as_ref().join(file);
    if path.exists() {
        Ok(Some(read_config_file(path)?))
    } else {
        Ok(None)
    }
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigFile {
    pub probe: Option<ConfigProbe>,
    pub dns: Option<ConfigDns>,
    pub report: Option<ConfigReport>,
    pub log: Option<ConfigLog>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            probe: Some(ConfigProbe::default()),
            dns: Some(ConfigDns::default()),
            report: Some(ConfigReport::default()),
            log: Some(ConfigLog::default()),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigProbe {
    pub protocol: Option<ProtocolConfig>,
    pub port: Option<u16>,
    pub count: Option<usize>,
    pub delay: Option<i64>,
    #[serde(default)]
    #[serde(deserialize_with = "humantime_deser")]
    pub timeout: Option<Duration>,
    pub icmp_privilege_mode: Option<IcmpPrivilegeModeConfig>,
}

impl Default for ConfigProbe {
    fn default() -> Self {
        Self {
            protocol: Some(ProtocolConfig::from(defaults::DEFAULT_PROTOCOL)),
            port: None,
            count: Some(defaults::DEFAULT_COUNT),
            delay: Some(defaults::DEFAULT_DELAY_SECS),
            timeout: None,
            icmp_privilege_mode: Some(IcmpPrivilegeModeConfig::from(
                defaults::DEFAULT_PRIVILEGE_MODE,
            )),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigDns {
    pub dns_resolve_method: Option<DnsResolveMethodConfig>,
    #[serde(default)]
    #[serde(deserialize_with = "humantime_deser")]
    pub dns_timeout: Option<Duration>,
}

impl Default for ConfigDns {
    fn default() -> Self {
        Self {
            dns_resolve_method: Some(super::constants::DEFAULT_DNS_RESOLVE_METHOD),
            dns_timeout: Some(super::constants::DEFAULT_DNS_TIMEOUT),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigReport {
    pub mode: Option<Mode>,
    pub save_history: Option<bool>,
    pub history_file: Option<String>,
}

impl Default for ConfigReport {
    fn default() -> Self {
        Self {
            mode: Some(super::constants::DEFAULT_MODE),
            save_history: Some(super::constants::DEFAULT_SAVE_HISTORY),
            history_file: Some(String::from(super::constants::DEFAULT_HISTORY_FILE)),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigLog {
    pub log_format: Option<LogFormat>,
    pub log_filter: Option<String>,
    pub log_span_events: Option<LogSpanEvents>,
}

impl Default for ConfigLog {
    fn default() -> Self {
        Self {
            log_format: Some(super::constants::DEFAULT_LOG_FORMAT),
            log_filter: Some(String::from(super::constants::DEFAULT_LOG_FILTER)),
            log_span_events: Some(super::constants::DEFAULT_LOG_SPAN_EVENTS),
        }
    }
}

fn humantime_deser<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    humantime::parse_duration(&String::deserialize(deserializer)?)
        .map_err(serde::de::Error::custom)
        .map(Some)
}
