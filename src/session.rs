use crate::config::{Config, SessionPaths};
use crate::error::Result;
use crate::executor::{Dispatcher, Launcher, SystemLauncher};
use crate::icons::{IconResolver, ThemeIconResolver};
use crate::populator::{Notify, Populator};
use crate::sources::Source;
use crate::sources::fd::FdSource;
use crate::store::EntryStore;
use std::sync::Arc;

/// What the host asked for after the user acted on the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Accept,
    CustomCommand,
    Delete,
    Next,
    Previous,
    QuickSwitch(u32),
    Cancel,
}

/// What the host should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeResult {
    Exit,
    NextDialog,
    PreviousDialog,
    ReloadDialog,
    Switch(u32),
}

/// One listing of files, from `init` to `shutdown`.
pub struct Session {
    paths: SessionPaths,
    store: Arc<EntryStore>,
    dispatcher: Dispatcher,
    populator: Option<Populator>,
}

impl Session {
    /// Starts a session with `fd`, themed icons and desktop launchers.
    pub fn init(config: &Config, paths: SessionPaths, notify: Notify) -> Result<Self> {
        let source = FdSource::new(config.search.program.clone(), paths.clone());
        let icons = ThemeIconResolver::new(config.icons.themes.clone());
        let launcher = SystemLauncher::new(config.general.terminal.clone());
        Self::with_parts(
            Box::new(source),
            Arc::new(icons),
            Box::new(launcher),
            &config.general.default_editor,
            paths,
            notify,
        )
    }

    pub fn with_parts(
        source: Box<dyn Source>,
        icons: Arc<dyn IconResolver>,
        launcher: Box<dyn Launcher>,
        default_editor: &str,
        paths: SessionPaths,
        notify: Notify,
    ) -> Result<Self> {
        let store = Arc::new(EntryStore::new());
        let populator = Populator::spawn(source, paths.clone(), icons, Arc::clone(&store), notify)?;
        log::debug!("Session started for {}", paths.base_dir);

        Ok(Self {
            paths,
            store,
            dispatcher: Dispatcher::new(launcher, default_editor),
            populator: Some(populator),
        })
    }

    pub fn paths(&self) -> &SessionPaths {
        &self.paths
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn num_entries(&self) -> usize {
        self.store.len()
    }

    pub fn display_value(&self, index: usize) -> String {
        self.store.display_value(index)
    }

    pub fn icon(&self, index: usize) -> Option<String> {
        self.store.icon(index)
    }

    pub fn is_loading(&self) -> bool {
        self.populator.as_ref().is_some_and(|p| !p.is_finished())
    }

    pub fn activate(&self, index: usize, use_alternate: bool) -> bool {
        self.dispatcher.activate(&self.store, &self.paths, index, use_alternate)
    }

    pub fn result(&self, action: MenuAction, selected: usize) -> ModeResult {
        match action {
            MenuAction::Next => ModeResult::NextDialog,
            MenuAction::Previous => ModeResult::PreviousDialog,
            MenuAction::QuickSwitch(mode) => ModeResult::Switch(mode),
            MenuAction::Accept => {
                self.activate(selected, false);
                ModeResult::Exit
            }
            MenuAction::CustomCommand => {
                self.activate(selected, true);
                ModeResult::Exit
            }
            MenuAction::Delete => ModeResult::ReloadDialog,
            MenuAction::Cancel => ModeResult::Exit,
        }
    }

    /// Stops the populator, then drops every entry.
    pub fn shutdown(&mut self) {
        if let Some(mut populator) = self.populator.take() {
            populator.shutdown();
            self.store.clear_and_release();
            log::debug!("Session for {} closed", self.paths.base_dir);
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}
