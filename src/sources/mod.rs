use crate::error::Result;
use std::io::BufRead;
use std::process::Child;

/// Open stream of relative paths, one per line.
pub struct SourceStream {
    pub lines: Box<dyn BufRead + Send>,
    /// Producing process, if any. Killed on cancellation and reaped at end of stream.
    pub child: Option<Child>,
}

impl SourceStream {
    pub fn from_reader(reader: impl BufRead + Send + 'static) -> Self {
        Self {
            lines: Box::new(reader),
            child: None,
        }
    }
}

pub trait Source: Send {
    fn open(&self) -> Result<SourceStream>;
}

pub mod fd;
