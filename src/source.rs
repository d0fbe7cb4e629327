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

use log::debug;
use std::{
    io,
    process::{Command, ExitStatus, Stdio},
};

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("empty status command")]
    EmptyCommand,
    #[error("{0}: cannot execute: {1}")]
    CannotExecute(String, #[source] io::Error),
    #[error("{program}: {status}: {message}")]
    Failed {
        program: String,
        status: ExitStatus,
        message: String,
    },
}

/// Text output of the job-queue status.
pub trait StatusSource {
    fn invoke(&mut self) -> Result<String, SourceError>;
}

/// Run an external command such as `qstat` and return its standard output.
#[derive(Debug)]
pub struct CommandSource {
    program: String,
    args: Vec<String>,
}

impl CommandSource {
    /// Program followed by its arguments separated by white spaces.
    pub fn new(command_line: &str) -> Result<Self, SourceError> {
        let mut words = command_line.split_whitespace().map(String::from);
        let program = words.next().ok_or(SourceError::EmptyCommand)?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl StatusSource for CommandSource {
    fn invoke(&mut self) -> Result<String, SourceError> {
        debug!("running {} {}", self.program, self.args.join(" "));
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| SourceError::CannotExecute(self.program.clone(), err))?;
        if !output.status.success() {
            return Err(SourceError::Failed {
                program: self.program.clone(),
                status: output.status,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
