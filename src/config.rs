use crate::error::{Error, Result};
use directories::{BaseDirs, ProjectDirs};
use serde::Deserialize;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub icons: IconConfig,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_editor")]
    pub default_editor: String,
    #[serde(default)]
    pub terminal: Option<String>,
}

fn default_editor() -> String { "nvim".to_string() }

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_editor: default_editor(),
            terminal: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default)]
    pub base_dir: Option<String>,
    #[serde(default)]
    pub ignore_file: Option<String>,
}

fn default_program() -> String { "fd".to_string() }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            base_dir: None,
            ignore_file: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct IconConfig {
    #[serde(default = "default_themes")]
    pub themes: Vec<String>,
}

fn default_themes() -> Vec<String> {
    vec!["hicolor".to_string(), "Adwaita".to_string()]
}

impl Default for IconConfig {
    fn default() -> Self {
        Self { themes: default_themes() }
    }
}

/// Values fixed for the lifetime of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPaths {
    /// Always ends with `/`.
    pub base_dir: String,
    pub ignore_path: Option<String>,
}

impl SessionPaths {
    pub fn new(base_dir: impl Into<String>, ignore_path: Option<String>) -> Self {
        Self {
            base_dir: ensure_trailing_slash(base_dir.into()),
            ignore_path,
        }
    }

    /// Base directory followed by `name`, byte for byte.
    pub fn full_path(&self, name: impl AsRef<OsStr>) -> PathBuf {
        let mut bytes = self.base_dir.as_bytes().to_vec();
        bytes.extend_from_slice(name.as_ref().as_bytes());
        PathBuf::from(OsString::from_vec(bytes))
    }
}

impl Config {
    /// Resolves base directory and ignore file, applying CLI overrides first.
    pub fn session_paths(&self, base_dir: Option<&str>, ignore_path: Option<&str>) -> SessionPaths {
        let home = home_dir();
        let base = base_dir
            .map(str::to_string)
            .or_else(|| self.search.base_dir.clone())
            .map(|b| expand_tilde(&b, home.as_deref()))
            .or_else(|| home.as_ref().map(|h| h.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "/".to_string());

        let ignore = ignore_path
            .map(str::to_string)
            .or_else(|| self.search.ignore_file.clone())
            .map(|i| expand_tilde(&i, home.as_deref()));

        SessionPaths::new(base, ignore)
    }
}

fn home_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

pub fn ensure_trailing_slash(mut dir: String) -> String {
    if !dir.ends_with('/') {
        dir.push('/');
    }
    dir
}

fn expand_tilde(path: &str, home: Option<&Path>) -> String {
    match (path.strip_prefix('~'), home) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            format!("{}{}", home.to_string_lossy(), rest)
        }
        _ => path.to_string(),
    }
}

pub fn default_config_path() -> PathBuf {
    let proj_dirs = ProjectDirs::from("org", "files-mode", "files-mode");
    if let Some(dirs) = &proj_dirs {
        dirs.config_dir().join("config.toml")
    } else {
        PathBuf::from("config.toml")
    }
}

pub fn load_config() -> Result<Config> {
    load_config_from(&default_config_path())
}

pub fn load_config_from(config_path: &Path) -> Result<Config> {
    if !config_path.exists() {
        log::debug!("No config at {:?}, using defaults", config_path);
        return Ok(Config::default());
    }

    let content = fs::read_to_string(config_path).map_err(|source| Error::ConfigRead {
        path: config_path.to_path_buf(),
        source,
    })?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_added_once() {
        assert_eq!(ensure_trailing_slash("/home/u".to_string()), "/home/u/");
        assert_eq!(ensure_trailing_slash("/home/u/".to_string()), "/home/u/");
    }

    #[test]
    fn overrides_win_over_file_values() {
        let mut config = Config::default();
        config.search.base_dir = Some("/srv/data".to_string());
        config.search.ignore_file = Some("/srv/.fdignore".to_string());

        let paths = config.session_paths(Some("/home/u"), None);
        assert_eq!(paths.base_dir, "/home/u/");
        assert_eq!(paths.ignore_path.as_deref(), Some("/srv/.fdignore"));

        let paths = config.session_paths(None, Some("/tmp/ignore"));
        assert_eq!(paths.base_dir, "/srv/data/");
        assert_eq!(paths.ignore_path.as_deref(), Some("/tmp/ignore"));
    }

    #[test]
    fn full_path_concatenates_base_and_name() {
        let paths = SessionPaths::new("/home/u", None);
        assert_eq!(paths.base_dir, "/home/u/");
        assert_eq!(paths.full_path("a.txt"), PathBuf::from("/home/u/a.txt"));
        assert_eq!(paths.full_path("sub/b.txt"), PathBuf::from("/home/u/sub/b.txt"));
    }

    #[test]
    fn full_path_keeps_non_utf8_bytes() {
        let paths = SessionPaths::new("/home/u/", None);
        let name = OsStr::from_bytes(b"caf\xe9.txt\r");
        assert_eq!(paths.full_path(name).as_os_str().as_bytes(), b"/home/u/caf\xe9.txt\r");
    }

    #[test]
    fn tilde_expands_against_home() {
        let home = Path::new("/home/u");
        assert_eq!(expand_tilde("~/code", Some(home)), "/home/u/code");
        assert_eq!(expand_tilde("~", Some(home)), "/home/u");
        assert_eq!(expand_tilde("~other/x", Some(home)), "~other/x");
        assert_eq!(expand_tilde("/abs", Some(home)), "/abs");
    }

    #[test]
    fn parses_partial_toml() {
        let config: Config = toml::from_str(
            "[general]\nterminal = \"foot -e\"\n[search]\nbase_dir = \"/data\"\n",
        )
        .unwrap();
        assert_eq!(config.general.default_editor, "nvim");
        assert_eq!(config.general.terminal.as_deref(), Some("foot -e"));
        assert_eq!(config.search.program, "fd");
        assert_eq!(config.search.base_dir.as_deref(), Some("/data"));
        assert_eq!(config.icons.themes, vec!["hicolor", "Adwaita"]);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("files-mode-config-missing/none.toml");
        let config = load_config_from(&path).unwrap();
        assert_eq!(config.search.program, "fd");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = std::env::temp_dir().join(format!("files-mode-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "[search\nprogram = ").unwrap();
        assert!(matches!(load_config_from(&path), Err(Error::ConfigParse(_))));
        let _ = fs::remove_dir_all(&dir);
    }
}
