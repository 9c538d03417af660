use std::borrow::Cow;
use std::ffi::OsString;

/// One file reported by the search command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: OsString,       // Path relative to the base directory, raw bytes
    pub icon: Option<String>, // Themed icon name, if one resolved
}

impl Entry {
    pub fn new(name: impl Into<OsString>, icon: Option<String>) -> Self {
        Self { name: name.into(), icon }
    }

    /// Name for showing and matching; invalid UTF-8 is replaced.
    pub fn display_name(&self) -> Cow<'_, str> {
        self.name.to_string_lossy()
    }
}
