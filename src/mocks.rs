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

//! Fakes recording calls in a shared journal.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    io,
    rc::Rc,
    time::Duration,
};

use crate::{
    clock::{Clock, Pause, PauseStatus},
    export::{Reporter, TransmissionError},
    sample::Sample,
    source::{SourceError, StatusSource},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Now(i64),
    Invoke,
    Send(Sample),
    Pause(Duration),
}

pub type Journal = Rc<RefCell<Vec<Event>>>;

pub fn new_journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

/// Clock starting at a given time and advancing by a fixed step at each call.
pub struct FakeClock {
    next: Cell<i64>,
    step: i64,
    journal: Journal,
}

impl FakeClock {
    pub fn new(start: i64, step: i64, journal: &Journal) -> Self {
        Self {
            next: Cell::new(start),
            step,
            journal: journal.clone(),
        }
    }
}

impl Clock for FakeClock {
    fn now(&self) -> i64 {
        let now = self.next.get();
        self.next.set(now + self.step);
        self.journal.borrow_mut().push(Event::Now(now));
        now
    }
}

/// Source returning the given outputs in turn, the last one forever.
pub struct FakeSource {
    outputs: VecDeque<Option<String>>,
    journal: Journal,
}

impl FakeSource {
    /// A None output is an execution failure.
    pub fn new(outputs: &[Option<&str>], journal: &Journal) -> Self {
        Self {
            outputs: outputs.iter().map(|o| o.map(String::from)).collect(),
            journal: journal.clone(),
        }
    }
}

impl StatusSource for FakeSource {
    fn invoke(&mut self) -> Result<String, SourceError> {
        self.journal.borrow_mut().push(Event::Invoke);
        let output = if self.outputs.len() > 1 {
            self.outputs.pop_front().flatten()
        } else {
            self.outputs.front().cloned().flatten()
        };
        output.ok_or_else(|| {
            SourceError::CannotExecute(
                "qstat".to_string(),
                io::Error::new(io::ErrorKind::NotFound, "not found"),
            )
        })
    }
}

/// Reporter keeping the samples, failing if the collector is down.
pub struct FakeReporter {
    pub down: bool,
    pub sent: Vec<Sample>,
    journal: Journal,
}

impl FakeReporter {
    pub fn new(journal: &Journal) -> Self {
        Self {
            down: false,
            sent: Vec::new(),
            journal: journal.clone(),
        }
    }
}

impl Reporter for FakeReporter {
    fn send(&mut self, sample: &Sample) -> Result<(), TransmissionError> {
        self.journal.borrow_mut().push(Event::Send(sample.clone()));
        if self.down {
            Err(TransmissionError::CannotConnect(
                "127.0.0.1:2003".parse().unwrap(),
                io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
            ))
        } else {
            self.sent.push(sample.clone());
            Ok(())
        }
    }
}

/// Pause returning immediately, interrupted after a number of pauses.
pub struct FakePause {
    interrupt_after: Option<usize>,
    count: usize,
    journal: Journal,
}

impl FakePause {
    pub fn new(interrupt_after: Option<usize>, journal: &Journal) -> Self {
        Self {
            interrupt_after,
            count: 0,
            journal: journal.clone(),
        }
    }
}

impl Pause for FakePause {
    fn pause(&mut self, delay: Duration) -> PauseStatus {
        self.journal.borrow_mut().push(Event::Pause(delay));
        self.count += 1;
        match self.interrupt_after {
            Some(limit) if self.count >= limit => PauseStatus::Interrupted,
            _ => PauseStatus::TimeOut,
        }
    }
}
