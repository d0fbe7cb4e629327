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

use log::{debug, error, info, warn};
use std::time::Duration;

use crate::{
    cfg::{SchedulerSettings, Settings},
    clock::{Clock, Pause, PauseStatus, SystemClock},
    export::{GraphiteReporter, Reporter, TextReporter},
    parser::{self, ParseError},
    sample::Sample,
    sighdr::SignalHandler,
    source::{CommandSource, SourceError, StatusSource},
};

#[derive(thiserror::Error, Debug)]
pub enum CycleError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Run cycles of clock, status source, parser and reporter separated by pauses.
pub struct Scheduler<'a> {
    clock: &'a dyn Clock,
    source: &'a mut dyn StatusSource,
    reporter: &'a mut dyn Reporter,
    pause: &'a mut dyn Pause,
    every: Duration,
    count: Option<u64>,
    fail_fast: bool,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        clock: &'a dyn Clock,
        source: &'a mut dyn StatusSource,
        reporter: &'a mut dyn Reporter,
        pause: &'a mut dyn Pause,
        settings: &SchedulerSettings,
    ) -> Self {
        Self {
            clock,
            source,
            reporter,
            pause,
            every: settings.every,
            count: settings.count,
            fail_fast: settings.fail_fast,
        }
    }

    /// Take one sample and send it.
    ///
    /// A transmission failure drops the sample.
    pub fn cycle(&mut self) -> Result<Sample, CycleError> {
        let timestamp = self.clock.now();
        let output = self.source.invoke()?;
        let sample = parser::parse_sample(&output, timestamp)?;
        if let Err(err) = self.reporter.send(&sample) {
            warn!("{}: sample dropped: {}", sample.hostname(), err);
        }
        Ok(sample)
    }

    /// Loop until interrupted, after the requested number of cycles or on
    /// the first error if fail fast is set.
    pub fn run(&mut self) -> anyhow::Result<()> {
        let mut cycles = 0;
        loop {
            match self.cycle() {
                Ok(sample) => debug!("cycle {} done at {}", cycles, sample.timestamp()),
                Err(err) if self.fail_fast => return Err(err.into()),
                Err(err) => error!("{}", err),
            }
            cycles += 1;
            if self.count.is_some_and(|count| cycles >= count) {
                info!("{} cycles done", cycles);
                break;
            }
            if let PauseStatus::Interrupted = self.pause.pause(self.every) {
                break;
            }
        }
        Ok(())
    }
}

pub fn run(settings: &Settings, dry_run: bool) -> anyhow::Result<()> {
    let mut signals = SignalHandler::new()?;
    let clock = SystemClock::new();
    let mut source = CommandSource::new(&settings.source.command)?;
    debug!("status from {}", source.program());
    let metric = settings.metric.metric_name();
    let mut reporter: Box<dyn Reporter> = if dry_run {
        Box::new(TextReporter::stdout(metric))
    } else {
        info!(
            "sending to {}:{} over {}",
            settings.collector.host, settings.collector.port, settings.collector.protocol
        );
        Box::new(GraphiteReporter::new(&settings.collector, metric))
    };
    let mut scheduler = Scheduler::new(
        &clock,
        &mut source,
        reporter.as_mut(),
        &mut signals,
        &settings.scheduler,
    );
    scheduler.run()
}
