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

use argh::FromArgs;
use log::{LevelFilter, error};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode, WriteLogger};
use std::{fs::File, path::PathBuf, time::Duration};

mod application;
mod cfg;
mod clock;
mod export;
#[cfg(test)]
mod mocks;
mod parser;
mod sample;
mod sighdr;
mod source;

use cfg::{Protocol, Settings};

const APP_NAME: &str = "qmemfeed";

/// Forward the memory used by a cluster host, as reported by qstat, to a
/// Graphite collector.
#[derive(FromArgs, Debug)]
struct Opt {
    /// verbose mode
    #[argh(switch, short = 'v')]
    verbose: bool,

    /// log level: off, error, warn, info, debug or trace
    #[argh(option)]
    log_level: Option<LevelFilter>,

    /// log into a file instead of the terminal
    #[argh(option)]
    log_file: Option<PathBuf>,

    /// configuration file
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// seconds to wait between two samples
    #[argh(option, short = 'e')]
    every: Option<f64>,

    /// number of samples to send before exiting
    #[argh(option, short = 'n')]
    count: Option<u64>,

    /// collector address as host:port
    #[argh(option)]
    collector: Option<String>,

    /// send over UDP instead of TCP
    #[argh(switch)]
    udp: bool,

    /// print the metrics instead of sending them
    #[argh(switch)]
    dry_run: bool,

    /// exit on the first error
    #[argh(switch)]
    fail_fast: bool,
}

impl Opt {
    fn level(&self) -> LevelFilter {
        match (self.log_level, self.verbose) {
            (Some(level), _) => level,
            (None, true) => LevelFilter::Info,
            (None, false) => LevelFilter::Warn,
        }
    }

    /// Override settings read from the configuration file.
    fn apply(&self, settings: &mut Settings) -> anyhow::Result<()> {
        if let Some(every) = self.every {
            settings.scheduler.every = Duration::try_from_secs_f64(every)
                .map_err(|_| cfg::ConfigError::InvalidValue("every".to_string(), every.to_string()))?;
        }
        if self.count.is_some() {
            settings.scheduler.count = self.count;
        }
        if let Some(ref collector) = self.collector {
            let (host, port) = cfg::parse_address(collector)?;
            settings.collector.host = host;
            settings.collector.port = port;
        }
        if self.udp {
            settings.collector.protocol = Protocol::Udp;
        }
        if self.fail_fast {
            settings.scheduler.fail_fast = true;
        }
        Ok(())
    }
}

fn init_logger(opt: &Opt) -> anyhow::Result<()> {
    let config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let level = opt.level();
    match opt.log_file {
        Some(ref path) => WriteLogger::init(level, config, File::create(path)?)?,
        None => TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto)?,
    }
    Ok(())
}

fn start(opt: &Opt) -> anyhow::Result<()> {
    let mut settings = Settings::default();
    cfg::load(&mut settings, APP_NAME, opt.config.as_deref())?;
    opt.apply(&mut settings)?;
    application::run(&settings, opt.dry_run)
}

fn main() {
    let opt: Opt = argh::from_env();
    if let Err(err) = init_logger(&opt) {
        eprintln!("{APP_NAME}: {err:#}");
        std::process::exit(1);
    }
    if let Err(err) = start(&opt) {
        error!("{:#}", err);
        std::process::exit(1);
    }
}
