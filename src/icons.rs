use directories::BaseDirs;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Maps a file on disk to a themed icon name.
pub trait IconResolver: Send + Sync {
    fn resolve(&self, path: &Path) -> Option<String>;
}

/// Never resolves anything.
pub struct NoIcons;

impl IconResolver for NoIcons {
    fn resolve(&self, _path: &Path) -> Option<String> {
        None
    }
}

/// Looks up freedesktop content-type icons in installed icon themes.
pub struct ThemeIconResolver {
    icon_theme_paths: Vec<PathBuf>,
    themes: Vec<String>,
    known: Mutex<HashMap<String, bool>>,
}

const ICON_CONTEXTS: [&str; 2] = ["mimetypes", "places"];
const ICON_SIZES: [&str; 6] = ["scalable", "48x48", "32x32", "24x24", "16x16", "symbolic"];
const ICON_EXTENSIONS: [&str; 3] = ["svg", "png", "xpm"];

impl ThemeIconResolver {
    pub fn new(themes: Vec<String>) -> Self {
        let mut paths = Vec::new();
        if let Some(home) = BaseDirs::new() {
            paths.push(home.data_dir().join("icons"));
            paths.push(home.home_dir().join(".icons"));
        }
        paths.push(PathBuf::from("/usr/local/share/icons"));
        paths.push(PathBuf::from("/usr/share/icons"));
        paths.push(PathBuf::from("/usr/share/pixmaps"));
        Self::with_paths(themes, paths)
    }

    pub fn with_paths(themes: Vec<String>, icon_theme_paths: Vec<PathBuf>) -> Self {
        Self {
            icon_theme_paths,
            themes,
            known: Mutex::new(HashMap::new()),
        }
    }

    fn theme_has_icon(&self, icon_name: &str) -> bool {
        let cached = self.known.lock().ok().and_then(|known| known.get(icon_name).copied());
        if let Some(hit) = cached {
            return hit;
        }
        let hit = self.search_themes(icon_name);
        if let Ok(mut known) = self.known.lock() {
            known.insert(icon_name.to_string(), hit);
        }
        hit
    }

    fn search_themes(&self, icon_name: &str) -> bool {
        for root in &self.icon_theme_paths {
            if !root.exists() { continue; }

            for theme in &self.themes {
                let theme_dir = root.join(theme);
                if !theme_dir.exists() { continue; }

                for size in ICON_SIZES {
                    for context in ICON_CONTEXTS {
                        // Both the `48x48/mimetypes` and `mimetypes/48x48` layouts are in use.
                        let dirs = [theme_dir.join(size).join(context), theme_dir.join(context).join(size)];
                        for dir in dirs {
                            if has_icon_file(&dir, icon_name) {
                                return true;
                            }
                        }
                    }
                }
            }

            if has_icon_file(root, icon_name) {
                return true;
            }
        }
        false
    }
}

impl IconResolver for ThemeIconResolver {
    fn resolve(&self, path: &Path) -> Option<String> {
        let metadata = fs::metadata(path).ok()?;
        let names = if metadata.is_dir() {
            vec!["folder".to_string(), "inode-directory".to_string()]
        } else {
            icon_names_for_content_type(&content_type(path))
        };

        let found = names.into_iter().find(|name| self.theme_has_icon(name));
        if found.is_none() {
            log::trace!("No themed icon for {:?}", path);
        }
        found
    }
}

fn has_icon_file(dir: &Path, icon_name: &str) -> bool {
    ICON_EXTENSIONS
        .iter()
        .any(|ext| dir.join(format!("{}.{}", icon_name, ext)).is_file())
}

/// Icon names for a content type, most specific first.
pub fn icon_names_for_content_type(content_type: &str) -> Vec<String> {
    let mut names = vec![content_type.replace('/', "-")];
    if let Some((major, _)) = content_type.split_once('/') {
        names.push(format!("{}-x-generic", major));
    }
    names
}

/// Guesses a content type from the file name.
pub fn content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(label: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!("files-mode-icons-{}-{}", label, std::process::id()));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(&root).unwrap();
        root
    }

    #[test]
    fn generic_fallback_follows_specific_name() {
        assert_eq!(
            icon_names_for_content_type("text/x-python"),
            vec!["text-x-python", "text-x-generic"]
        );
    }

    #[test]
    fn content_type_ignores_case() {
        assert_eq!(content_type(Path::new("/x/photo.JPG")), "image/jpeg");
        assert_eq!(content_type(Path::new("/x/README")), "application/octet-stream");
    }

    #[test]
    fn less_common_extensions_get_a_type() {
        for name in ["book.epub", "module.wasm", "tool.jar"] {
            let ty = content_type(Path::new(name));
            assert_ne!(ty, "application/octet-stream", "{name}");
            assert!(icon_names_for_content_type(&ty).len() == 2, "{name}");
        }
    }

    #[test]
    fn resolves_installed_theme_icon() {
        let root = scratch("theme");
        let icons = root.join("icons");
        let mimetypes = icons.join("hicolor/48x48/mimetypes");
        fs::create_dir_all(&mimetypes).unwrap();
        fs::write(mimetypes.join("text-x-generic.png"), b"png").unwrap();
        let places = icons.join("hicolor/scalable/places");
        fs::create_dir_all(&places).unwrap();
        fs::write(places.join("folder.svg"), b"<svg/>").unwrap();

        let file = root.join("notes.txt");
        fs::write(&file, "x").unwrap();

        let resolver = ThemeIconResolver::with_paths(vec!["hicolor".to_string()], vec![icons]);
        assert_eq!(resolver.resolve(&file).as_deref(), Some("text-x-generic"));
        assert_eq!(resolver.resolve(&root).as_deref(), Some("folder"));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_file_or_theme_gives_none() {
        let root = scratch("missing");
        let file = root.join("notes.txt");
        fs::write(&file, "x").unwrap();

        let themes = vec!["hicolor".to_string()];
        let resolver = ThemeIconResolver::with_paths(themes, vec![root.join("icons")]);
        assert!(resolver.resolve(&file).is_none());
        assert!(resolver.resolve(&root.join("gone.txt")).is_none());
        let _ = fs::remove_dir_all(&root);
    }
}
