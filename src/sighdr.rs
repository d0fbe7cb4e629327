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

use log::info;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use crate::clock::{Pause, PauseStatus, Timer};

/// Interval to check for signals while sleeping.
const POLL_SLICE: Duration = Duration::from_millis(250);

/// Catch SIGINT and SIGTERM.
pub struct SignalHandler {
    caught: Arc<AtomicBool>,
}

impl SignalHandler {
    pub fn new() -> Result<SignalHandler, ctrlc::Error> {
        let caught = Arc::new(AtomicBool::new(false));
        let moved_caught = caught.clone();
        ctrlc::set_handler(move || {
            moved_caught.store(true, Ordering::SeqCst);
        })?;
        Ok(SignalHandler { caught })
    }

    pub fn caught(&self) -> bool {
        self.caught.load(Ordering::SeqCst)
    }
}

impl Pause for SignalHandler {
    /// Sleep unless a signal is caught. A signal caught during a cycle
    /// interrupts the following pause.
    fn pause(&mut self, delay: Duration) -> PauseStatus {
        let timer = Timer::start(delay);
        if timer.sleep_until(POLL_SLICE, || self.caught()) {
            PauseStatus::TimeOut
        } else {
            info!("signal caught, stopping");
            PauseStatus::Interrupted
        }
    }
}

#[cfg(test)]
mod tests {

    use std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    };
    use std::thread;
    use std::time::{Duration, Instant};

    use super::{Pause, PauseStatus, SignalHandler};

    fn handler() -> (SignalHandler, Arc<AtomicBool>) {
        let caught = Arc::new(AtomicBool::new(false));
        (
            SignalHandler {
                caught: caught.clone(),
            },
            caught,
        )
    }

    #[test]
    fn pause_times_out() {
        let (mut handler, _) = handler();
        let status = handler.pause(Duration::from_millis(10));
        assert_eq!(PauseStatus::TimeOut, status);
    }

    #[test]
    fn pause_after_signal() {
        let (mut handler, caught) = handler();
        caught.store(true, Ordering::SeqCst);
        assert!(handler.caught());
        assert_eq!(
            PauseStatus::Interrupted,
            handler.pause(Duration::new(120, 0))
        );
    }

    #[test]
    fn signal_during_pause() {
        let (mut handler, caught) = handler();
        let start = Instant::now();
        let signaler = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            caught.store(true, Ordering::SeqCst);
        });
        let status = handler.pause(Duration::new(120, 0));
        signaler.join().unwrap();
        assert_eq!(PauseStatus::Interrupted, status);
        assert!(start.elapsed() < Duration::new(10, 0));
    }
}
