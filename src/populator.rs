use crate::config::SessionPaths;
use crate::error::{Error, Result};
use crate::icons::IconResolver;
use crate::model::Entry;
use crate::sources::Source;
use crate::store::EntryStore;
use log::{debug, info, warn};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::ffi::OsString;
use std::io::BufRead;
use std::os::unix::ffi::OsStringExt;
use std::process::Child;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Called after every append so the host can redraw.
pub type Notify = Arc<dyn Fn() + Send + Sync>;

/// Background worker filling an [`EntryStore`] from a [`Source`].
pub struct Populator {
    cancel: Arc<AtomicBool>,
    child: Arc<Mutex<Option<Child>>>,
    handle: Option<JoinHandle<()>>,
}

impl Populator {
    pub fn spawn(
        source: Box<dyn Source>,
        paths: SessionPaths,
        icons: Arc<dyn IconResolver>,
        store: Arc<EntryStore>,
        notify: Notify,
    ) -> Result<Self> {
        let cancel = Arc::new(AtomicBool::new(false));
        let child = Arc::new(Mutex::new(None));

        let worker = Worker {
            paths,
            icons,
            store,
            notify,
            cancel: Arc::clone(&cancel),
            child: Arc::clone(&child),
        };
        let handle = thread::Builder::new()
            .name("load_files".to_string())
            .spawn(move || worker.run(source))
            .map_err(Error::LoaderThread)?;

        Ok(Self {
            cancel,
            child,
            handle: Some(handle),
        })
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Stops reading, terminates the search process and joins the worker.
    pub fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        self.cancel.store(true, Ordering::SeqCst);
        if let Ok(guard) = self.child.lock() {
            if let Some(child) = guard.as_ref() {
                terminate(child);
            }
        }

        if handle.join().is_err() {
            warn!("Populator thread panicked");
        }
    }
}

impl Drop for Populator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn terminate(child: &Child) {
    let pid = Pid::from_raw(child.id() as i32);
    if let Err(err) = signal::kill(pid, Signal::SIGTERM) {
        debug!("Could not signal search process {}: {}", pid, err);
    }
}

struct Worker {
    paths: SessionPaths,
    icons: Arc<dyn IconResolver>,
    store: Arc<EntryStore>,
    notify: Notify,
    cancel: Arc<AtomicBool>,
    child: Arc<Mutex<Option<Child>>>,
}

impl Worker {
    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    fn run(self, source: Box<dyn Source>) {
        let stream = match source.open() {
            Ok(stream) => stream,
            Err(err) => {
                warn!("No files will be listed: {}", err);
                return;
            }
        };

        if let Some(child) = stream.child {
            if let Ok(mut slot) = self.child.lock() {
                // Shutdown may have run before the child existed.
                if self.cancelled() {
                    terminate(&child);
                }
                *slot = Some(child);
            }
        }

        let count = self.read_lines(stream.lines);
        self.reap();
        info!("Populator: loaded {} entries", count);
    }

    fn read_lines(&self, mut lines: Box<dyn BufRead + Send>) -> usize {
        let mut count = 0;

        while !self.cancelled() {
            let mut buf = Vec::new();
            match lines.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(err) => {
                    warn!("Search output ended early: {}", err);
                    break;
                }
            }

            let name = strip_newline(buf);
            let full_path = self.paths.full_path(&name);
            let icon = self.icons.resolve(&full_path);

            self.store.append(Entry::new(name, icon));
            count += 1;
            (self.notify)();
        }
        count
    }

    fn reap(&self) {
        let child = self.child.lock().ok().and_then(|mut slot| slot.take());
        if let Some(mut child) = child {
            if self.cancelled() {
                let _ = child.kill();
            }
            match child.wait() {
                Ok(status) => debug!("Search process exited with {}", status),
                Err(err) => warn!("Failed to wait for search process: {}", err),
            }
        }
    }
}

/// Drops the trailing `\n`; every other byte is part of the file name.
fn strip_newline(mut line: Vec<u8>) -> OsString {
    if line.last() == Some(&b'\n') {
        line.pop();
    }
    OsString::from_vec(line)
}
