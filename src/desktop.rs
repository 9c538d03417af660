use crate::error::{Error, Result};
use directories::BaseDirs;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

/// The parts of a `.desktop` file needed to launch it on a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopEntry {
    pub path: PathBuf,
    pub name: Option<String>,
    pub exec: String,
    pub terminal: bool,
}

impl DesktopEntry {
    /// Command line for opening `target`, field codes expanded.
    pub fn command_for(&self, target: &Path) -> Vec<OsString> {
        let target = target.as_os_str();
        let mut argv = Vec::new();
        let mut used_target = false;

        for token in split_exec(&self.exec) {
            if matches!(token.as_str(), "%f" | "%F" | "%u" | "%U") {
                argv.push(target.to_os_string());
                used_target = true;
                continue;
            }
            let expanded = expand_field_codes(&token, target, &mut used_target);
            if !expanded.is_empty() {
                argv.push(expanded);
            }
        }

        // Entries without a file field code still get the file appended.
        if !used_target && !argv.is_empty() {
            argv.push(target.to_os_string());
        }
        argv
    }
}

pub fn application_dirs() -> Vec<PathBuf> {
    let mut data_dirs = Vec::new();
    if let Some(base_dirs) = BaseDirs::new() {
        data_dirs.push(base_dirs.data_dir().join("applications"));
        data_dirs.push(base_dirs.data_dir().join("flatpak/exports/share/applications"));
    }
    data_dirs.push(PathBuf::from("/var/lib/flatpak/exports/share/applications"));
    data_dirs.push(PathBuf::from("/usr/local/share/applications"));
    data_dirs.push(PathBuf::from("/usr/share/applications"));
    data_dirs
}

/// Finds `desktop_id` in the first directory that has it.
pub fn find_desktop_entry(desktop_id: &str, dirs: &[PathBuf]) -> Result<DesktopEntry> {
    for dir in dirs {
        let path = dir.join(desktop_id);
        if !path.is_file() { continue; }

        log::debug!("Using desktop entry {:?}", path);
        let entry = fs::read_to_string(&path)
            .ok()
            .and_then(|content| parse_desktop_file(&content, &path));
        return entry.ok_or(Error::DesktopEntryInvalid(path));
    }
    Err(Error::DesktopEntryNotFound(desktop_id.to_string()))
}

fn parse_desktop_file(content: &str, path: &Path) -> Option<DesktopEntry> {
    let mut name = None;
    let mut exec = None;
    let mut terminal = false;
    let mut is_desktop_entry = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue; }

        if line == "[Desktop Entry]" {
            is_desktop_entry = true;
            continue;
        }

        if line.starts_with('[') {
            is_desktop_entry = false;
            continue;
        }

        if !is_desktop_entry { continue; }

        if let Some(value) = line.strip_prefix("Name=") {
            name = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix("Exec=") {
            exec = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix("Terminal=") {
            terminal = value == "true";
        }
    }

    let exec = exec.filter(|e| !e.trim().is_empty())?;
    Some(DesktopEntry {
        path: path.to_path_buf(),
        name,
        exec,
        terminal,
    })
}

/// Splits an Exec value on whitespace, honouring double quotes and backslash escapes.
fn split_exec(exec: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;
    let mut chars = exec.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            '\\' if in_quotes => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        tokens.push(current);
    }
    tokens
}

fn expand_field_codes(token: &str, target: &OsStr, used_target: &mut bool) -> OsString {
    let mut out = OsString::new();
    let mut literal = String::new();
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => literal.push('%'),
            Some('f' | 'F' | 'u' | 'U') => {
                out.push(std::mem::take(&mut literal));
                out.push(target);
                *used_target = true;
            }
            // Deprecated and icon/name codes are dropped.
            _ => {}
        }
    }
    out.push(literal);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(exec: &str) -> DesktopEntry {
        DesktopEntry {
            path: PathBuf::from("/usr/share/applications/test.desktop"),
            name: None,
            exec: exec.to_string(),
            terminal: false,
        }
    }

    #[test]
    fn parses_desktop_entry_section_only() {
        let content = "\
[Desktop Entry]
Name=Neovim
Exec=nvim %F
Terminal=true

[Desktop Action new]
Exec=other
";
        let parsed = parse_desktop_file(content, Path::new("/a/nvim.desktop")).unwrap();
        assert_eq!(parsed.name.as_deref(), Some("Neovim"));
        assert_eq!(parsed.exec, "nvim %F");
        assert!(parsed.terminal);
    }

    #[test]
    fn entry_without_exec_is_rejected() {
        assert!(parse_desktop_file("[Desktop Entry]\nName=X\n", Path::new("/a/x.desktop")).is_none());
    }

    #[test]
    fn file_codes_receive_target() {
        let argv = entry("code --reuse-window %U").command_for(Path::new("/home/u/a b.txt"));
        assert_eq!(argv, vec!["code", "--reuse-window", "/home/u/a b.txt"]);
    }

    #[test]
    fn other_codes_are_dropped_and_target_appended() {
        let argv = entry("gedit %i %c").command_for(Path::new("/tmp/x"));
        assert_eq!(argv, vec!["gedit", "/tmp/x"]);
    }

    #[test]
    fn quoted_arguments_stay_together() {
        let argv = entry(r#""/opt/My App/bin" --name "a \"b\"" --file=%f"#).command_for(Path::new("/t"));
        assert_eq!(argv, vec!["/opt/My App/bin", "--name", "a \"b\"", "--file=/t"]);
    }

    #[test]
    fn target_bytes_pass_through_unchanged() {
        use std::os::unix::ffi::OsStrExt;

        let target = Path::new(OsStr::from_bytes(b"/home/u/caf\xe9.txt"));
        let argv = entry("vi --file=%f").command_for(target);
        assert_eq!(argv[1].as_bytes(), b"--file=/home/u/caf\xe9.txt");
    }

    #[test]
    fn finds_entry_in_first_matching_dir() {
        let root = std::env::temp_dir().join(format!("files-mode-desktop-{}", std::process::id()));
        let first = root.join("first");
        let second = root.join("second");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();
        fs::write(second.join("ed.desktop"), "[Desktop Entry]\nExec=ed %f\n").unwrap();

        let dirs = vec![first, second.clone()];
        let found = find_desktop_entry("ed.desktop", &dirs).unwrap();
        assert_eq!(found.path, second.join("ed.desktop"));
        assert!(matches!(
            find_desktop_entry("missing.desktop", &dirs),
            Err(Error::DesktopEntryNotFound(_))
        ));
        let _ = fs::remove_dir_all(&root);
    }
}
