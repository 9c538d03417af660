use crate::config::SessionPaths;
use crate::error::{Error, Result};
use crate::sources::{Source, SourceStream};
use log::{debug, info};
use std::io::{self, BufReader};
use std::process::{Command, Stdio};

/// Runs `fd` (or a compatible program) and streams its stdout.
pub struct FdSource {
    program: String,
    paths: SessionPaths,
}

impl FdSource {
    pub fn new(program: impl Into<String>, paths: SessionPaths) -> Self {
        Self {
            program: program.into(),
            paths,
        }
    }

    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.arg("--base-directory").arg(&self.paths.base_dir);
        if let Some(ignore) = &self.paths.ignore_path {
            command.arg("--ignore-file").arg(ignore);
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        command
    }
}

impl Source for FdSource {
    fn open(&self) -> Result<SourceStream> {
        let mut command = self.command();
        debug!("FdSource: running {:?}", command);

        let mut child = command.spawn().map_err(|source| Error::SearchSpawn {
            program: self.program.clone(),
            source,
        })?;
        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::SearchSpawn {
                program: self.program.clone(),
                source: io::Error::other("stdout was not captured"),
            });
        };

        info!("FdSource: scanning {}", self.paths.base_dir);
        Ok(SourceStream {
            lines: Box::new(BufReader::new(stdout)),
            child: Some(child),
        })
    }
}
