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

use regex_lite::Regex;
use std::{num::ParseFloatError, str::FromStr, sync::LazyLock};
use strum::{EnumIter, EnumString};

use crate::sample::Sample;

const KIBI: f64 = 1024.0;
const MEBI: f64 = KIBI * KIBI;
const GIBI: f64 = MEBI * KIBI;
const KILO: f64 = 1000.0;
const MEGA: f64 = KILO * KILO;
const GIGA: f64 = MEGA * KILO;

/// Host in a queue instance name such as `all.q@node07.cluster`.
static HOSTNAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@(?P<host>[a-z0-9]+)\.").expect("internal error: invalid host name pattern")
});

/// Resource value such as `hl:mem_used=2.5G`.
static MEMORY_USED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"mem_used=(?P<value>[0-9.]+)(?P<suffix>[GgMmKk]*)")
        .expect("internal error: invalid memory pattern")
});

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("no host name in status output")]
    MissingHostname,
    #[error("no memory used in status output")]
    MissingMemoryUsed,
    #[error("{0}: unknown memory unit")]
    UnknownUnit(String),
    #[error("{0}: invalid number")]
    InvalidNumber(String, #[source] ParseFloatError),
}

/// Unit suffix of a memory quantity.
///
/// Uppercase letters are binary multiples, lowercase letters are decimal
/// multiples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter)]
pub enum Unit {
    #[strum(serialize = "")]
    Byte,
    #[strum(serialize = "K")]
    Kibi,
    #[strum(serialize = "M")]
    Mebi,
    #[strum(serialize = "G")]
    Gibi,
    #[strum(serialize = "k")]
    Kilo,
    #[strum(serialize = "m")]
    Mega,
    #[strum(serialize = "g")]
    Giga,
}

impl Unit {
    /// Number of bytes in one unit.
    pub fn multiplier(self) -> f64 {
        match self {
            Unit::Byte => 1.0,
            Unit::Kibi => KIBI,
            Unit::Mebi => MEBI,
            Unit::Gibi => GIBI,
            Unit::Kilo => KILO,
            Unit::Mega => MEGA,
            Unit::Giga => GIGA,
        }
    }
}

/// Extract the host name from the first `@host.` in the status output.
pub fn extract_hostname(text: &str) -> Result<String, ParseError> {
    HOSTNAME_PATTERN
        .captures(text)
        .and_then(|caps| caps.name("host"))
        .map(|host| host.as_str().to_string())
        .ok_or(ParseError::MissingHostname)
}

/// Extract the first `mem_used=<value><suffix>` of the status output in bytes.
pub fn extract_memory_used(text: &str) -> Result<f64, ParseError> {
    let caps = MEMORY_USED_PATTERN
        .captures(text)
        .ok_or(ParseError::MissingMemoryUsed)?;
    let value = caps.name("value").map_or("", |m| m.as_str());
    let suffix = caps.name("suffix").map_or("", |m| m.as_str());
    let unit = Unit::from_str(suffix).map_err(|_| ParseError::UnknownUnit(suffix.to_string()))?;
    let value = value
        .parse::<f64>()
        .map_err(|err| ParseError::InvalidNumber(value.to_string(), err))?;
    Ok(value * unit.multiplier())
}

/// Build a sample from the status output taken at the given time.
pub fn parse_sample(text: &str, timestamp: i64) -> Result<Sample, ParseError> {
    let hostname = extract_hostname(text)?;
    let memory_bytes = extract_memory_used(text)?;
    Ok(Sample::new(hostname, memory_bytes, timestamp))
}
