use crate::change::{file_name_of, is_empty_name, split_extension, Change};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// The substitution left nothing of the file name.
    EmptyName,
    /// The target is already taken on disk by something outside the batch.
    TargetExists,
    /// Several changes in the batch end at the same target.
    FutureOverwrite,
}

impl ConflictKind {
    pub fn label(self) -> &'static str {
        match self {
            ConflictKind::EmptyName => "empty filename",
            ConflictKind::TargetExists => "target exists",
            ConflictKind::FutureOverwrite => "overwriting new path",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub sources: Vec<PathBuf>,
    pub target: PathBuf,
}

/// Changes after detection (rewritten when auto-fixing) and every conflict
/// that was found along the way.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub changes: Vec<Change>,
    pub conflicts: Vec<Conflict>,
}

impl Resolution {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Finds empty names, targets taken on disk and same-batch collisions, in
/// that order, so fixes from one pass are seen by the next.
///
/// A target occupied by another source of the batch only counts as free when
/// that source is renamed earlier in the order. With `auto_fix` the changes
/// are rewritten: empty names revert to the source, taken and colliding
/// targets get a ` (N)` suffix before the extension.
pub fn detect_conflicts(mut changes: Vec<Change>, auto_fix: bool) -> Resolution {
    let moving_sources: HashMap<PathBuf, usize> = changes
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.is_unchanged())
        .map(|(i, c)| (c.source_path(), i))
        .collect();

    let mut conflicts = Vec::new();
    let mut groups: Vec<(PathBuf, Vec<usize>)> = Vec::new();
    let mut group_index: HashMap<PathBuf, usize> = HashMap::new();

    for (i, change) in changes.iter_mut().enumerate() {
        if is_empty_name(&change.target) {
            conflicts.push(Conflict {
                kind: ConflictKind::EmptyName,
                sources: vec![change.source_path()],
                target: change.base_dir.clone(),
            });
            if !auto_fix {
                continue;
            }
            change.target = change.source.clone();
        }

        let mut target = change.target_path();
        let vacated_earlier = moving_sources.get(&target).is_some_and(|&j| j < i);
        if !change.is_unchanged() && !vacated_earlier && path_taken(&target) {
            conflicts.push(Conflict {
                kind: ConflictKind::TargetExists,
                sources: vec![change.source_path()],
                target: target.clone(),
            });
            if auto_fix {
                change.target = next_free_name(&change.base_dir, &change.target, |p| {
                    group_index.contains_key(p)
                });
                target = change.target_path();
            }
        }

        match group_index.get(&target) {
            Some(&g) => groups[g].1.push(i),
            None => {
                group_index.insert(target.clone(), groups.len());
                groups.push((target, vec![i]));
            }
        }
    }

    let mut reserved: HashSet<PathBuf> = group_index.into_keys().collect();
    for (target, members) in &groups {
        if members.len() < 2 {
            continue;
        }
        conflicts.push(Conflict {
            kind: ConflictKind::FutureOverwrite,
            sources: members.iter().map(|&i| changes[i].source_path()).collect(),
            target: target.clone(),
        });
        if !auto_fix {
            continue;
        }

        // An entry that stays where it is keeps the name; otherwise the first does.
        let keeper = members
            .iter()
            .copied()
            .find(|&i| changes[i].is_unchanged())
            .unwrap_or(members[0]);
        for &i in members.iter().filter(|&&i| i != keeper) {
            let change = &mut changes[i];
            let fresh = next_free_name(&change.base_dir, &change.target, |p| reserved.contains(p));
            reserved.insert(change.base_dir.join(&fresh));
            change.target = fresh;
        }
    }

    for conflict in &conflicts {
        warn!(
            kind = %conflict.kind,
            target = %conflict.target.display(),
            sources = conflict.sources.len(),
            "conflict detected"
        );
    }

    Resolution { changes, conflicts }
}

/// Anything that can be stat'ed, or that fails to stat for a reason other
/// than absence, counts as taken.
fn path_taken(path: &Path) -> bool {
    match fs::symlink_metadata(path) {
        Ok(_) => true,
        Err(err) => err.kind() != io::ErrorKind::NotFound,
    }
}

/// First `stem (N)ext` (N from 2) that is neither reserved nor on disk.
fn next_free_name(base_dir: &Path, target: &str, reserved: impl Fn(&Path) -> bool) -> String {
    let file_name = file_name_of(target);
    let dir = &target[..target.len() - file_name.len()];
    let (stem, ext) = split_extension(file_name);

    let mut n = 2usize;
    loop {
        let candidate = format!("{dir}{stem} ({n}){ext}");
        let full = base_dir.join(&candidate);
        if !reserved(&full) && !path_taken(&full) {
            return candidate;
        }
        n += 1;
    }
}
