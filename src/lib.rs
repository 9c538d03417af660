//! File listing mode for a launcher: lists files under a base directory with
//! `fd`, resolves a themed icon per file, and opens the chosen one.

pub mod config;
pub mod desktop;
pub mod error;
pub mod executor;
pub mod icons;
pub mod model;
pub mod populator;
pub mod session;
pub mod sources;
pub mod store;

pub use error::{Error, Result};
pub use model::Entry;
pub use session::{MenuAction, ModeResult, Session};
pub use store::EntryStore;
