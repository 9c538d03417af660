use crate::config::SessionPaths;
use crate::desktop::{self, DesktopEntry, find_desktop_entry};
use crate::error::{Error, Result};
use crate::store::EntryStore;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;

pub const DESKTOP_SUFFIX: &str = ".desktop";
pub const DEFAULT_OPENER: &str = "xdg-open";

/// Turns an editor preference into a desktop id, e.g. `code` -> `code.desktop`.
pub fn resolve_editor_id(preference: Option<&str>, fallback: &str) -> String {
    let app_name = match preference {
        Some(p) if !p.is_empty() => p,
        _ => fallback,
    };
    if app_name.ends_with(DESKTOP_SUFFIX) {
        app_name.to_string()
    } else {
        format!("{}{}", app_name, DESKTOP_SUFFIX)
    }
}

pub trait Launcher: Send + Sync {
    /// Opens `path` with the application named by `desktop_id`.
    fn open_with_app(&self, desktop_id: &str, path: &Path) -> Result<()>;

    /// Opens `path` with whatever the desktop registers for it.
    fn open_with_default(&self, path: &Path) -> Result<()>;
}

/// Terminal emulators tried when none is configured, with the flags that precede the command.
const TERMINAL_CANDIDATES: [(&str, &[&str]); 5] = [
    ("x-terminal-emulator", &["-e"]),
    ("foot", &[]),
    ("kitty", &[]),
    ("alacritty", &["-e"]),
    ("xterm", &["-e"]),
];

/// Launches through desktop entries and `xdg-open`.
pub struct SystemLauncher {
    terminal: Option<String>,
    env_terminal: Option<String>,
    search_path: Vec<PathBuf>,
    application_dirs: Vec<PathBuf>,
    opener: String,
}

impl SystemLauncher {
    pub fn new(terminal: Option<String>) -> Self {
        let search_path = env::var_os("PATH")
            .map(|path| env::split_paths(&path).collect())
            .unwrap_or_default();
        Self {
            terminal,
            env_terminal: env::var("TERMINAL").ok(),
            search_path,
            application_dirs: desktop::application_dirs(),
            opener: DEFAULT_OPENER.to_string(),
        }
    }

    pub fn with_application_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.application_dirs = dirs;
        self
    }

    pub fn with_opener(mut self, opener: impl Into<String>) -> Self {
        self.opener = opener.into();
        self
    }

    /// Replaces `$TERMINAL` and `$PATH` as used for terminal detection.
    pub fn with_terminal_lookup(mut self, env_terminal: Option<String>, search_path: Vec<PathBuf>) -> Self {
        self.env_terminal = env_terminal;
        self.search_path = search_path;
        self
    }

    /// Command that runs another command in a terminal window.
    fn terminal_prefix(&self) -> Option<Vec<OsString>> {
        if let Some(term_cmd) = &self.terminal {
            return Some(term_cmd.split_whitespace().map(OsString::from).collect());
        }
        if let Some(term) = self.env_terminal.as_deref().filter(|t| !t.is_empty()) {
            return Some(vec![OsString::from(term), OsString::from("-e")]);
        }

        TERMINAL_CANDIDATES.iter().find_map(|(name, flags)| {
            let program = self.search_path.iter().map(|dir| dir.join(name)).find(|p| p.is_file())?;
            let mut prefix = vec![program.into_os_string()];
            prefix.extend(flags.iter().map(|flag| OsString::from(*flag)));
            Some(prefix)
        })
    }

    fn launch_command(&self, desktop_id: &str, entry: &DesktopEntry, path: &Path) -> Result<Vec<OsString>> {
        let command = entry.command_for(path);
        if command.is_empty() {
            return Err(Error::DesktopEntryInvalid(entry.path.clone()));
        }
        if !entry.terminal {
            return Ok(command);
        }

        let mut cmd_parts = self
            .terminal_prefix()
            .ok_or_else(|| Error::NoTerminal(desktop_id.to_string()))?;
        cmd_parts.extend(command);
        Ok(cmd_parts)
    }
}

fn spawn_detached(cmd_parts: &[OsString]) -> Result<()> {
    let Some((program, args)) = cmd_parts.split_first() else {
        return Ok(());
    };

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| Error::Launch {
            program: program.to_string_lossy().into_owned(),
            source,
        })?;

    reap(child);
    Ok(())
}

fn reap(mut child: Child) {
    thread::spawn(move || {
        let _ = child.wait();
    });
}

impl Launcher for SystemLauncher {
    fn open_with_app(&self, desktop_id: &str, path: &Path) -> Result<()> {
        let entry = find_desktop_entry(desktop_id, &self.application_dirs)?;
        let cmd_parts = self.launch_command(desktop_id, &entry, path)?;

        let app = entry.name.as_deref().unwrap_or(desktop_id);
        log::info!("Launching {} as {:?}", app, cmd_parts);
        spawn_detached(&cmd_parts)
    }

    fn open_with_default(&self, path: &Path) -> Result<()> {
        let status = Command::new(&self.opener)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| Error::Launch { program: self.opener.clone(), source })?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::LaunchExit {
                program: self.opener.clone(),
                status: status.code(),
            })
        }
    }
}

/// Runs the chosen action for a selected row.
pub struct Dispatcher {
    launcher: Box<dyn Launcher>,
    default_editor: String,
}

impl Dispatcher {
    pub fn new(launcher: Box<dyn Launcher>, default_editor: impl Into<String>) -> Self {
        Self {
            launcher,
            default_editor: default_editor.into(),
        }
    }

    pub fn editor_id(&self) -> String {
        resolve_editor_id(env::var("EDITOR").ok().as_deref(), &self.default_editor)
    }

    /// Opens entry `index`; returns whether a launch succeeded.
    ///
    /// Missing entries and launch failures are not errors for the caller.
    pub fn activate(&self, store: &EntryStore, paths: &SessionPaths, index: usize, use_alternate: bool) -> bool {
        let Some(entry) = store.get(index) else {
            log::debug!("Ignoring selection {} of {}", index, store.len());
            return false;
        };
        let full_path = paths.full_path(&entry.name);

        let result = if use_alternate {
            let editor = self.editor_id();
            self.launcher.open_with_app(&editor, &full_path)
        } else {
            self.launcher.open_with_default(&full_path)
        };

        match result {
            Ok(()) => true,
            Err(err) => {
                log::error!("Failed to open {:?}: {}", full_path, err);
                false
            }
        }
    }
}
