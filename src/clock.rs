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

use chrono::Utc;
use std::thread::sleep;
use std::time::{Duration, Instant};

/// Source of Unix timestamps in seconds.
pub trait Clock {
    fn now(&self) -> i64;
}

/// Wall clock of the system.
pub struct SystemClock {}

impl SystemClock {
    pub fn new() -> Self {
        Self {}
    }
}

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        round_to_seconds(Utc::now().timestamp_millis())
    }
}

/// Round milliseconds to the nearest second.
fn round_to_seconds(millis: i64) -> i64 {
    (millis + 500).div_euclid(1000)
}

/// Status of a pause between two cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseStatus {
    TimeOut,
    Interrupted,
}

/// Wait between two cycles.
pub trait Pause {
    fn pause(&mut self, delay: Duration) -> PauseStatus;
}

/// Timer that expires after a delay
///
/// The stop watch records the time when the timer was started.
pub struct Timer {
    delay: Duration,
    stop_watch: Instant,
}

impl Timer {
    /// Start a new timer now.
    pub fn start(delay: Duration) -> Timer {
        Timer {
            delay,
            stop_watch: Instant::now(),
        }
    }

    /// Return the remaining time or None if it has expired.
    pub fn remaining(&self) -> Option<Duration> {
        self.delay
            .checked_sub(self.stop_watch.elapsed())
            .filter(|remaining| !remaining.is_zero())
    }

    /// Sleep by slices until the timer expires or `stop` returns true.
    ///
    /// Return true if the timer expired.
    pub fn sleep_until<F>(&self, slice: Duration, stop: F) -> bool
    where
        F: Fn() -> bool,
    {
        loop {
            if stop() {
                return false;
            }
            match self.remaining() {
                Some(remaining) => sleep(remaining.min(slice)),
                None => return true,
            }
        }
    }
}
