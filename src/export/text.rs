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

use std::io::{self, Write};

use crate::sample::{MetricName, Sample};

use super::{Reporter, TransmissionError};

/// Write the lines that would be sent to the collector.
pub struct TextReporter<W: Write> {
    out: W,
    metric: MetricName,
}

impl TextReporter<io::Stdout> {
    pub fn stdout(metric: MetricName) -> Self {
        Self::new(io::stdout(), metric)
    }
}

impl<W: Write> TextReporter<W> {
    pub fn new(out: W, metric: MetricName) -> Self {
        Self { out, metric }
    }
}

impl<W: Write> Reporter for TextReporter<W> {
    fn send(&mut self, sample: &Sample) -> Result<(), TransmissionError> {
        let write_failed = |err| TransmissionError::WriteFailed("output".to_string(), err);
        writeln!(self.out, "{}", self.metric.line(sample)).map_err(write_failed)?;
        self.out.flush().map_err(write_failed)
    }
}
