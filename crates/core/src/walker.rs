use crate::change::{is_hidden_name, Entry};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::ffi::OsStr;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Lists the entries under each root, in root order and name order within a
/// directory. With no roots the current directory is used.
pub fn collect_entries(
    directories: &[PathBuf],
    recursive: bool,
    include_hidden: bool,
) -> Result<Vec<Entry>> {
    let default_root = [PathBuf::from(".")];
    let roots = if directories.is_empty() {
        &default_root[..]
    } else {
        directories
    };

    let mut out = Vec::new();
    for root in roots {
        if recursive {
            collect_recursive(root, include_hidden, &mut out)?;
        } else {
            collect_immediate(root, &mut out)?;
        }
    }

    debug!(count = out.len(), "collected entries");
    Ok(out)
}

fn collect_immediate(root: &Path, out: &mut Vec<Entry>) -> Result<()> {
    let mut entries = Vec::new();
    for entry in
        fs::read_dir(root).with_context(|| format!("failed to read directory: {}", root.display()))?
    {
        let entry = entry.with_context(|| format!("failed to read entry in: {}", root.display()))?;
        let file_type = entry
            .file_type()
            .with_context(|| format!("failed to stat: {}", entry.path().display()))?;
        let path = entry.path();
        let Some(name) = utf8_name(&path, &entry.file_name()) else {
            continue;
        };
        entries.push(Entry::new(root, &name, file_type.is_dir()));
    }
    entries.sort_by(|a, b| a.source.cmp(&b.source));
    out.extend(entries);
    Ok(())
}

fn collect_recursive(root: &Path, include_hidden: bool, out: &mut Vec<Entry>) -> Result<()> {
    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || include_hidden
                || !is_hidden_name(&entry.file_name().to_string_lossy())
        });

    for entry in walker {
        let entry = entry.with_context(|| format!("failed to walk directory: {}", root.display()))?;
        let Some(name) = utf8_name(entry.path(), entry.file_name()) else {
            continue;
        };
        let base_dir = entry.path().parent().unwrap_or(root);
        out.push(Entry::new(base_dir, &name, entry.file_type().is_dir()));
    }
    Ok(())
}

/// Names that are not valid UTF-8 cannot be matched or rebuilt from text, so
/// they are left out of the batch.
fn utf8_name(path: &Path, name: &OsStr) -> Option<String> {
    match name.to_str() {
        Some(name) => Some(name.to_string()),
        None => {
            warn!(path = %path.display(), "skipping entry with a non UTF-8 name");
            None
        }
    }
}
