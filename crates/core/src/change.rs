use serde::{Deserialize, Serialize};
use std::path::{is_separator, Path, PathBuf};

/// A filesystem object found during enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub base_dir: PathBuf,
    pub source: String,
    pub is_dir: bool,
}

impl Entry {
    pub fn new(base_dir: impl Into<PathBuf>, name: &str, is_dir: bool) -> Self {
        Self {
            base_dir: base_dir.into(),
            source: clean_relative(name),
            is_dir,
        }
    }

    pub fn source_path(&self) -> PathBuf {
        self.base_dir.join(&self.source)
    }
}

/// An entry together with the name it will have after renaming.
///
/// `source` and `target` are both relative to `base_dir`; the full paths are
/// only built when comparing against the filesystem or renaming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub base_dir: PathBuf,
    pub source: String,
    pub target: String,
    pub is_dir: bool,
}

impl Change {
    pub fn source_path(&self) -> PathBuf {
        self.base_dir.join(&self.source)
    }

    pub fn target_path(&self) -> PathBuf {
        self.base_dir.join(&self.target)
    }

    pub fn is_unchanged(&self) -> bool {
        clean_relative(&self.source) == clean_relative(&self.target)
    }

    pub fn file_name(&self) -> &str {
        file_name_of(&self.source)
    }

    /// The same change with source and target exchanged.
    pub fn reversed(self) -> Self {
        Self {
            base_dir: self.base_dir,
            source: self.target,
            target: self.source,
            is_dir: self.is_dir,
        }
    }
}

impl From<Entry> for Change {
    fn from(entry: Entry) -> Self {
        Self {
            target: entry.source.clone(),
            base_dir: entry.base_dir,
            source: entry.source,
            is_dir: entry.is_dir,
        }
    }
}

/// Lexically normalises a relative path: collapses repeated separators and
/// `.` segments, resolves `..` against earlier segments and yields `.` for an
/// empty result.
pub fn clean_relative(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split(is_separator) {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(last) if *last != ".." => {
                    parts.pop();
                }
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Last path segment of a relative name.
pub fn file_name_of(name: &str) -> &str {
    name.rsplit(is_separator).next().unwrap_or(name)
}

/// Splits a file name into stem and extension (extension keeps its dot).
///
/// A leading dot does not start an extension, so `.bashrc` has none.
pub fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(pos) if pos > 0 => file_name.split_at(pos),
        _ => (file_name, ""),
    }
}

pub fn is_hidden_name(file_name: &str) -> bool {
    file_name.starts_with('.')
}

/// Whether a relative target names nothing at all once cleaned.
pub fn is_empty_name(target: &str) -> bool {
    let cleaned = clean_relative(target);
    Path::new(&cleaned).file_name().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_relative_collapses_noise() {
        assert_eq!(clean_relative("a//./b/"), "a/b");
        assert_eq!(clean_relative("./a/../b.txt"), "b.txt");
        assert_eq!(clean_relative(""), ".");
        assert_eq!(clean_relative("./"), ".");
        assert_eq!(clean_relative("../x"), "../x");
    }

    #[test]
    fn split_extension_keeps_dot_and_ignores_dotfiles() {
        assert_eq!(split_extension("photo.jpg"), ("photo", ".jpg"));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_extension(".bashrc"), (".bashrc", ""));
        assert_eq!(split_extension("README"), ("README", ""));
    }

    #[test]
    fn empty_name_detection() {
        assert!(is_empty_name(""));
        assert!(is_empty_name("."));
        assert!(is_empty_name("a/.."));
        assert!(!is_empty_name("a.txt"));
        assert!(!is_empty_name("dir/a.txt"));
    }

    #[test]
    fn change_from_entry_starts_unchanged() {
        let change = Change::from(Entry::new("/tmp", "./a.txt", false));
        assert_eq!(change.source, "a.txt");
        assert_eq!(change.target, "a.txt");
        assert!(change.is_unchanged());
        assert_eq!(change.target_path(), PathBuf::from("/tmp/a.txt"));
    }

    #[test]
    fn reversed_swaps_names_only() {
        let change = Change {
            base_dir: PathBuf::from("/tmp"),
            source: "a.txt".to_string(),
            target: "b.txt".to_string(),
            is_dir: false,
        };
        let reversed = change.reversed();
        assert_eq!(reversed.source, "b.txt");
        assert_eq!(reversed.target, "a.txt");
        assert_eq!(reversed.base_dir, PathBuf::from("/tmp"));
    }
}
