// Qmemfeed -- forward cluster memory usage to Graphite
// Copyright (C) 2026  The qmemfeed authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use light_ini::{IniHandler, IniParser};
use log::{debug, info};
use smart_default::SmartDefault;
use std::{
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use strum::{Display as StrumDisplay, EnumString};

use crate::sample::MetricName;

const SECTION_SOURCE: &str = "source";
const SECTION_COLLECTOR: &str = "collector";
const SECTION_METRIC: &str = "metric";
const SECTION_SCHEDULER: &str = "scheduler";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{0}: unknown section")]
    UnknownSection(String),
    #[error("{0}: option outside of a section")]
    NoSection(String),
    #[error("{0}.{1}: unknown option")]
    UnknownOption(String, String),
    #[error("{0}: invalid value: {1}")]
    InvalidValue(String, String),
    #[error("{}: configuration file not found", .0.display())]
    NotFound(PathBuf),
    #[error("{}: {}", .0.display(), .1)]
    Syntax(PathBuf, String),
}

/// Transport to the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, SmartDefault, EnumString, StrumDisplay)]
pub enum Protocol {
    #[default]
    #[strum(serialize = "tcp")]
    Tcp,
    #[strum(serialize = "udp")]
    Udp,
}

#[derive(Debug, SmartDefault)]
pub struct SourceSettings {
    #[default = "qstat -F mem_used"]
    pub command: String,
}

#[derive(Debug, SmartDefault)]
pub struct CollectorSettings {
    #[default = "172.16.48.100"]
    pub host: String,
    #[default = 2003]
    pub port: u16,
    pub protocol: Protocol,
    /// Connect and write timeout.
    #[default(Duration::from_secs(1))]
    pub timeout: Duration,
}

#[derive(Debug, SmartDefault)]
pub struct MetricSettings {
    #[default = "cluster.monitoring"]
    pub prefix: String,
    #[default = "mem_used"]
    pub name: String,
}

impl MetricSettings {
    pub fn metric_name(&self) -> MetricName {
        MetricName::new(&self.prefix, &self.name)
    }
}

#[derive(Debug, SmartDefault)]
pub struct SchedulerSettings {
    /// Idle time between the end of a cycle and the start of the next one.
    #[default(Duration::from_secs(120))]
    pub every: Duration,
    /// Number of cycles, unlimited if None.
    pub count: Option<u64>,
    /// Stop on the first execution or parsing error.
    pub fail_fast: bool,
}

#[derive(Debug, Default)]
pub struct Settings {
    pub source: SourceSettings,
    pub collector: CollectorSettings,
    pub metric: MetricSettings,
    pub scheduler: SchedulerSettings,
}

fn invalid_value(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue(key.to_string(), value.to_string())
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse::<T>().map_err(|_| invalid_value(key, value))
}

/// Positive number of seconds, possibly with a fractional part.
fn parse_seconds(key: &str, value: &str) -> Result<Duration, ConfigError> {
    let secs = parse_value::<f64>(key, value)?;
    Duration::try_from_secs_f64(secs).map_err(|_| invalid_value(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid_value(key, value)),
    }
}

/// Metric components end up in a space separated line.
fn parse_metric_component(key: &str, value: &str) -> Result<String, ConfigError> {
    if value.chars().any(char::is_whitespace) {
        Err(invalid_value(key, value))
    } else {
        Ok(value.to_string())
    }
}

/// Parse `host:port` or `[ipv6]:port`.
pub fn parse_address(address: &str) -> Result<(String, u16), ConfigError> {
    let invalid = || invalid_value(SECTION_COLLECTOR, address);
    let (host, port) = address.rsplit_once(':').ok_or_else(invalid)?;
    let host = host
        .strip_prefix('[')
        .and_then(|host| host.strip_suffix(']'))
        .unwrap_or(host);
    if host.is_empty() {
        return Err(invalid());
    }
    let port = port.parse::<u16>().map_err(|_| invalid())?;
    Ok((host.to_string(), port))
}

impl Settings {
    /// Set an option in a section.
    pub fn set(&mut self, section: &str, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match (section, key) {
            (SECTION_SOURCE, "command") => {
                if value.is_empty() {
                    return Err(invalid_value(key, value));
                }
                self.source.command = value.to_string();
            }
            (SECTION_COLLECTOR, "host") => {
                if value.is_empty() {
                    return Err(invalid_value(key, value));
                }
                self.collector.host = value.to_string();
            }
            (SECTION_COLLECTOR, "port") => self.collector.port = parse_value(key, value)?,
            (SECTION_COLLECTOR, "protocol") => self.collector.protocol = parse_value(key, value)?,
            (SECTION_COLLECTOR, "timeout") => {
                let timeout = parse_seconds(key, value)?;
                if timeout.is_zero() {
                    return Err(invalid_value(key, value));
                }
                self.collector.timeout = timeout;
            }
            (SECTION_METRIC, "prefix") => self.metric.prefix = parse_metric_component(key, value)?,
            (SECTION_METRIC, "name") => {
                if value.is_empty() {
                    return Err(invalid_value(key, value));
                }
                self.metric.name = parse_metric_component(key, value)?;
            }
            (SECTION_SCHEDULER, "every") => self.scheduler.every = parse_seconds(key, value)?,
            (SECTION_SCHEDULER, "count") => self.scheduler.count = Some(parse_value(key, value)?),
            (SECTION_SCHEDULER, "fail-fast") => self.scheduler.fail_fast = parse_bool(key, value)?,
            _ => {
                return Err(ConfigError::UnknownOption(
                    section.to_string(),
                    key.to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Fill settings from the sections of an INI file.
struct SettingsHandler<'a> {
    settings: &'a mut Settings,
    section: Option<String>,
}

impl<'a> SettingsHandler<'a> {
    fn new(settings: &'a mut Settings) -> Self {
        Self {
            settings,
            section: None,
        }
    }
}

impl IniHandler for SettingsHandler<'_> {
    type Error = ConfigError;

    fn section(&mut self, name: &str) -> Result<(), Self::Error> {
        match name.trim() {
            name @ (SECTION_SOURCE | SECTION_COLLECTOR | SECTION_METRIC | SECTION_SCHEDULER) => {
                self.section = Some(name.to_string());
                Ok(())
            }
            name => Err(ConfigError::UnknownSection(name.to_string())),
        }
    }

    fn option(&mut self, key: &str, value: &str) -> Result<(), Self::Error> {
        let key = key.trim();
        match &self.section {
            Some(section) => self.settings.set(section, key, value),
            None => Err(ConfigError::NoSection(key.to_string())),
        }
    }
}

/// Configuration directories
pub struct Directories {
    xdg_dirs: xdg::BaseDirectories,
}

impl Directories {
    pub fn new(app_name: &str) -> Directories {
        Directories {
            xdg_dirs: xdg::BaseDirectories::with_prefix(app_name),
        }
    }

    /// First configuration file found in the XDG config home and dirs.
    pub fn config_file(&self, basename: &str) -> Option<PathBuf> {
        self.xdg_dirs.find_config_file(basename)
    }
}

/// Read an INI configuration file.
pub fn read_config_file(settings: &mut Settings, path: &Path) -> anyhow::Result<()> {
    let mut handler = SettingsHandler::new(settings);
    let mut parser = IniParser::new(&mut handler);
    parser
        .parse_file(path)
        .map_err(|err| ConfigError::Syntax(path.to_path_buf(), format!("{err:?}")))?;
    Ok(())
}

/// Read the given configuration file or the default one if it exists.
pub fn load(settings: &mut Settings, app_name: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            if !path.is_file() {
                return Err(ConfigError::NotFound(path.to_path_buf()).into());
            }
            info!("{}: reading configuration", path.display());
            read_config_file(settings, path)
        }
        None => match Directories::new(app_name).config_file(&format!("{app_name}.ini")) {
            Some(path) => {
                info!("{}: reading configuration", path.display());
                read_config_file(settings, &path)
            }
            None => {
                debug!("no configuration file");
                Ok(())
            }
        },
    }
}

#[cfg(test)]
mod tests {

    use light_ini::IniHandler;
    use rstest::rstest;
    use std::{fs, path::PathBuf, time::Duration};

    use super::{ConfigError, Protocol, Settings, SettingsHandler, load, parse_address};

    fn temp_config(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("qmemfeed-{}-{}.ini", name, std::process::id()));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn default_settings() {
        let settings = Settings::default();
        assert_eq!("qstat -F mem_used", settings.source.command);
        assert_eq!("172.16.48.100", settings.collector.host);
        assert_eq!(2003, settings.collector.port);
        assert_eq!(Protocol::Tcp, settings.collector.protocol);
        assert_eq!(Duration::from_secs(1), settings.collector.timeout);
        assert_eq!("cluster.monitoring", settings.metric.prefix);
        assert_eq!("mem_used", settings.metric.name);
        assert_eq!(Duration::from_secs(120), settings.scheduler.every);
        assert_eq!(None, settings.scheduler.count);
        assert!(!settings.scheduler.fail_fast);
    }

    #[test]
    fn set_options() -> Result<(), ConfigError> {
        let mut settings = Settings::default();
        settings.set("source", "command", " /opt/sge/bin/qstat -F mem_used ")?;
        settings.set("collector", "host", "graphite.local")?;
        settings.set("collector", "port", "2004")?;
        settings.set("collector", "protocol", "udp")?;
        settings.set("collector", "timeout", "0.5")?;
        settings.set("metric", "prefix", "hpc")?;
        settings.set("metric", "name", "rss")?;
        settings.set("scheduler", "every", "30")?;
        settings.set("scheduler", "count", "3")?;
        settings.set("scheduler", "fail-fast", "yes")?;
        assert_eq!("/opt/sge/bin/qstat -F mem_used", settings.source.command);
        assert_eq!("graphite.local", settings.collector.host);
        assert_eq!(2004, settings.collector.port);
        assert_eq!(Protocol::Udp, settings.collector.protocol);
        assert_eq!(Duration::from_millis(500), settings.collector.timeout);
        assert_eq!(
            "hpc.node01.rss",
            settings.metric.metric_name().path("node01")
        );
        assert_eq!(Duration::from_secs(30), settings.scheduler.every);
        assert_eq!(Some(3), settings.scheduler.count);
        assert!(settings.scheduler.fail_fast);
        Ok(())
    }

    #[rstest]
    #[case("collector", "port", "70000")]
    #[case("collector", "protocol", "http")]
    #[case("collector", "timeout", "0")]
    #[case("collector", "timeout", "-1")]
    #[case("metric", "name", "mem used")]
    #[case("metric", "name", "")]
    #[case("scheduler", "every", "soon")]
    #[case("scheduler", "fail-fast", "maybe")]
    #[case("source", "command", "  ")]
    fn invalid_values(#[case] section: &str, #[case] key: &str, #[case] value: &str) {
        let mut settings = Settings::default();
        assert!(matches!(
            settings.set(section, key, value),
            Err(ConfigError::InvalidValue(_, _))
        ));
    }

    #[test]
    fn unknown_option() {
        let mut settings = Settings::default();
        assert!(matches!(
            settings.set("collector", "password", "secret"),
            Err(ConfigError::UnknownOption(_, _))
        ));
    }

    #[test]
    fn handler_sections() -> Result<(), ConfigError> {
        let mut settings = Settings::default();
        {
            let mut handler = SettingsHandler::new(&mut settings);
            assert!(matches!(
                handler.option("port", "2004"),
                Err(ConfigError::NoSection(_))
            ));
            assert!(matches!(
                handler.section("graphite"),
                Err(ConfigError::UnknownSection(_))
            ));
            handler.section("collector")?;
            handler.option("port ", "2004")?;
            handler.section("scheduler")?;
            handler.option("every", "60")?;
        }
        assert_eq!(2004, settings.collector.port);
        assert_eq!(Duration::from_secs(60), settings.scheduler.every);
        Ok(())
    }

    #[rstest]
    #[case("graphite:2003", "graphite", 2003)]
    #[case("172.16.48.100:2003", "172.16.48.100", 2003)]
    #[case("[::1]:2004", "::1", 2004)]
    fn valid_address(#[case] address: &str, #[case] host: &str, #[case] port: u16) {
        assert_eq!((host.to_string(), port), parse_address(address).unwrap());
    }

    #[rstest]
    #[case("graphite")]
    #[case(":2003")]
    #[case("graphite:port")]
    fn invalid_address(#[case] address: &str) {
        assert!(parse_address(address).is_err());
    }

    #[test]
    fn read_file() -> anyhow::Result<()> {
        let path = temp_config(
            "read",
            "[collector]\nhost=10.1.2.3\nport=2103\n\n[scheduler]\nevery=5\n",
        );
        let mut settings = Settings::default();
        let res = load(&mut settings, "qmemfeed", Some(&path));
        fs::remove_file(&path)?;
        res?;
        assert_eq!("10.1.2.3", settings.collector.host);
        assert_eq!(2103, settings.collector.port);
        assert_eq!(Duration::from_secs(5), settings.scheduler.every);
        assert_eq!("mem_used", settings.metric.name);
        Ok(())
    }

    #[test]
    fn read_invalid_file() -> anyhow::Result<()> {
        let path = temp_config("invalid", "[collector]\nport=none\n");
        let mut settings = Settings::default();
        let res = load(&mut settings, "qmemfeed", Some(&path));
        fs::remove_file(&path)?;
        assert!(res.is_err());
        Ok(())
    }

    #[test]
    fn missing_file() {
        let mut settings = Settings::default();
        let path = PathBuf::from("/nonexistent/qmemfeed.ini");
        assert!(load(&mut settings, "qmemfeed", Some(&path)).is_err());
    }
}
