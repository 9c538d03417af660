use crate::model::Entry;
use std::sync::{Mutex, MutexGuard};

/// Placeholder shown for rows the host asks about before they exist.
pub const MISSING_DISPLAY_VALUE: &str = "n/a";

/// Append-only list of entries shared between the populator and the host.
///
/// Every operation goes through one mutex. An entry is pushed only after its
/// name and icon are final, so readers never see a half-built row. Nothing
/// slow happens while the lock is held.
#[derive(Debug, Default)]
pub struct EntryStore {
    entries: Mutex<Vec<Entry>>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Entry>> {
        // A panicking reader cannot leave the Vec half-modified, so poisoning is ignored.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn append(&self, entry: Entry) {
        self.lock().push(entry);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Entry> {
        self.lock().get(index).cloned()
    }

    pub fn display_value(&self, index: usize) -> String {
        self.lock()
            .get(index)
            .map(|e| e.display_name().into_owned())
            .unwrap_or_else(|| MISSING_DISPLAY_VALUE.to_string())
    }

    pub fn icon(&self, index: usize) -> Option<String> {
        self.lock().get(index).and_then(|e| e.icon.clone())
    }

    /// Copy of everything visible right now, for host-side filtering.
    pub fn snapshot(&self) -> Vec<Entry> {
        self.lock().clone()
    }

    pub fn clear_and_release(&self) {
        let mut entries = self.lock();
        entries.clear();
        entries.shrink_to_fit();
    }
}
