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

use getset::{CopyGetters, Getters};
use std::fmt;

/// Memory used by a host at a given time.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct Sample {
    #[getset(get = "pub")]
    hostname: String,
    #[getset(get_copy = "pub")]
    memory_bytes: f64,
    #[getset(get_copy = "pub")]
    timestamp: i64,
}

impl Sample {
    pub fn new(hostname: String, memory_bytes: f64, timestamp: i64) -> Self {
        Self {
            hostname,
            memory_bytes,
            timestamp,
        }
    }
}

/// Metric path around the host name: `<prefix>.<hostname>.<name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricName {
    prefix: String,
    name: String,
}

impl MetricName {
    pub fn new(prefix: &str, name: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            name: name.to_string(),
        }
    }

    pub fn path(&self, hostname: &str) -> String {
        if self.prefix.is_empty() {
            format!("{}.{}", hostname, self.name)
        } else {
            format!("{}.{}.{}", self.prefix, hostname, self.name)
        }
    }

    /// Line of the plaintext protocol without the trailing newline.
    pub fn line<'a>(&'a self, sample: &'a Sample) -> MetricLine<'a> {
        MetricLine {
            metric: self,
            sample,
        }
    }
}

/// Plaintext protocol line: `<path> <value> <timestamp>`
pub struct MetricLine<'a> {
    metric: &'a MetricName,
    sample: &'a Sample,
}

impl fmt::Display for MetricLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.metric.path(self.sample.hostname()),
            format_value(self.sample.memory_bytes()),
            self.sample.timestamp()
        )
    }
}

/// Integral values keep a decimal part so that `2.5G` is sent as `2684354560.0`.
pub fn format_value(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
