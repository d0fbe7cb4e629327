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

use std::{io, net::SocketAddr};

use crate::sample::Sample;

mod graphite;
mod text;

#[derive(thiserror::Error, Debug)]
pub enum TransmissionError {
    #[error("{0}: cannot resolve address: {1}")]
    CannotResolve(String, #[source] io::Error),
    #[error("{0}: no address")]
    NoAddress(String),
    #[error("{0}: cannot connect: {1}")]
    CannotConnect(SocketAddr, #[source] io::Error),
    #[error("{0}: write failed: {1}")]
    WriteFailed(String, #[source] io::Error),
}

pub trait Reporter {
    /// Send one sample.
    fn send(&mut self, sample: &Sample) -> Result<(), TransmissionError>;
}

pub use crate::export::{graphite::GraphiteReporter, text::TextReporter};
