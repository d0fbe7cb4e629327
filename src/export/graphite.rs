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

use log::{debug, info};
use std::{
    io::Write,
    net::{SocketAddr, TcpStream, ToSocketAddrs, UdpSocket},
    time::Duration,
};

use crate::{
    cfg::{CollectorSettings, Protocol},
    sample::{MetricName, Sample},
};

use super::{Reporter, TransmissionError};

/// Send samples to a Graphite collector with the plaintext protocol.
///
/// One line per connection over TCP, one line per datagram over UDP.
pub struct GraphiteReporter {
    host: String,
    port: u16,
    protocol: Protocol,
    timeout: Duration,
    metric: MetricName,
}

impl GraphiteReporter {
    pub fn new(settings: &CollectorSettings, metric: MetricName) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            protocol: settings.protocol,
            timeout: settings.timeout,
            metric,
        }
    }

    fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolve the collector at each call to follow DNS changes.
    fn resolve(&self) -> Result<SocketAddr, TransmissionError> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|err| TransmissionError::CannotResolve(self.address(), err))?
            .next()
            .ok_or_else(|| TransmissionError::NoAddress(self.address()))
    }

    fn send_tcp(&self, addr: SocketAddr, line: &str) -> Result<(), TransmissionError> {
        let mut stream = TcpStream::connect_timeout(&addr, self.timeout)
            .map_err(|err| TransmissionError::CannotConnect(addr, err))?;
        let write_failed = |err| TransmissionError::WriteFailed(addr.to_string(), err);
        stream.set_write_timeout(Some(self.timeout)).map_err(write_failed)?;
        stream.write_all(line.as_bytes()).map_err(write_failed)
    }

    fn send_udp(&self, addr: SocketAddr, line: &str) -> Result<(), TransmissionError> {
        let write_failed = |err| TransmissionError::WriteFailed(addr.to_string(), err);
        let local = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local).map_err(write_failed)?;
        socket.send_to(line.as_bytes(), addr).map_err(write_failed)?;
        Ok(())
    }
}

impl Reporter for GraphiteReporter {
    fn send(&mut self, sample: &Sample) -> Result<(), TransmissionError> {
        let line = format!("{}\n", self.metric.line(sample));
        let addr = self.resolve()?;
        debug!("{} {}: {}", self.protocol, addr, line.trim_end());
        match self.protocol {
            Protocol::Tcp => self.send_tcp(addr, &line)?,
            Protocol::Udp => self.send_udp(addr, &line)?,
        }
        info!(
            "{}: {} bytes used",
            sample.hostname(),
            sample.memory_bytes()
        );
        Ok(())
    }
}
