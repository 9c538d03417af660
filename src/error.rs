use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to start search command `{program}`: {source}")]
    SearchSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to start the file loader thread: {0}")]
    LoaderThread(#[source] io::Error),

    #[error("no desktop entry named `{0}`")]
    DesktopEntryNotFound(String),

    #[error("desktop entry {0:?} has no usable Exec line")]
    DesktopEntryInvalid(PathBuf),

    #[error("`{0}` runs in a terminal and no terminal emulator was found")]
    NoTerminal(String),

    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` exited with status {status:?}")]
    LaunchExit { program: String, status: Option<i32> },

    #[error("failed to read config {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
