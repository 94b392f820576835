use crate::change::Change;
use crate::config::RenameOptions;
use crate::conflict::{detect_conflicts, Conflict, Resolution};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{is_separator, Path, PathBuf};
use tracing::{debug, info};

/// Persisted record of an executed batch, in application order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoLog {
    pub date: DateTime<Local>,
    pub operations: Vec<Change>,
}

#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    pub execute: bool,
    pub auto_fix_conflicts: bool,
    pub log_path: Option<PathBuf>,
}

impl From<&RenameOptions> for ApplyOptions {
    fn from(options: &RenameOptions) -> Self {
        Self {
            execute: options.execute,
            auto_fix_conflicts: options.auto_fix_conflicts,
            log_path: options.output_log_path.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ApplyOutcome {
    /// Nothing matched; nothing to do.
    NoMatches,
    /// Conflicts were found and auto-fix was off. The filesystem is untouched.
    Refused { conflicts: Vec<Conflict> },
    /// Dry run: the final plan, with any conflicts that auto-fix rewrote.
    Reported {
        changes: Vec<Change>,
        conflicts: Vec<Conflict>,
    },
    Applied {
        applied: usize,
        unchanged: usize,
        conflicts: Vec<Conflict>,
        log_path: Option<PathBuf>,
    },
}

/// Checks the plan for conflicts, then reports it or performs the renames in
/// order. A failed rename aborts the batch; earlier renames stay applied.
pub fn apply_plan(changes: Vec<Change>, options: &ApplyOptions) -> Result<ApplyOutcome> {
    if changes.is_empty() {
        info!("no entries matched");
        return Ok(ApplyOutcome::NoMatches);
    }

    let resolution = detect_conflicts(changes, options.auto_fix_conflicts);
    if resolution.has_conflicts() && !options.auto_fix_conflicts {
        return Ok(ApplyOutcome::Refused {
            conflicts: resolution.conflicts,
        });
    }

    let Resolution { changes, conflicts } = resolution;
    if !options.execute {
        return Ok(ApplyOutcome::Reported { changes, conflicts });
    }

    let (applied, unchanged) = execute_renames(&changes)?;
    info!(applied, unchanged, "renames applied");

    let log_path = match &options.log_path {
        Some(path) => {
            persist_undo(path, &changes)?;
            Some(path.clone())
        }
        None => None,
    };

    Ok(ApplyOutcome::Applied {
        applied,
        unchanged,
        conflicts,
        log_path,
    })
}

fn execute_renames(changes: &[Change]) -> Result<(usize, usize)> {
    let mut applied = 0usize;
    let mut unchanged = 0usize;

    for change in changes {
        if change.is_unchanged() {
            unchanged += 1;
            continue;
        }

        let source = change.source_path();
        let target = change.target_path();
        if change.target.contains(is_separator) {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "failed to create directory '{}' while renaming '{}' to '{}'",
                        parent.display(),
                        source.display(),
                        target.display()
                    )
                })?;
            }
        }

        fs::rename(&source, &target).with_context(|| {
            format!(
                "failed to rename '{}' to '{}'",
                source.display(),
                target.display()
            )
        })?;
        debug!(source = %source.display(), target = %target.display(), "renamed");
        applied += 1;
    }

    Ok((applied, unchanged))
}

pub fn persist_undo(path: &Path, changes: &[Change]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| {
            format!("failed to create undo log directory: {}", parent.display())
        })?;
    }

    let log = UndoLog {
        date: Local::now(),
        operations: changes.to_vec(),
    };
    let body = serde_json::to_string_pretty(&log).context("failed to serialize undo log")?;
    fs::write(path, body)
        .with_context(|| format!("failed to write undo log: {}", path.display()))?;
    info!(path = %path.display(), "undo log written");
    Ok(())
}

pub fn load_undo_log(path: &Path) -> Result<UndoLog> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read undo log: {}", path.display()))?;
    serde_json::from_str::<UndoLog>(&raw)
        .with_context(|| format!("undo log is corrupt: {}", path.display()))
}

/// Turns an executed batch into the batch that reverses it: last rename
/// first, source and target swapped, then a stable sort by ascending base
/// directory so parents are restored before anything inside them.
pub fn reverse_for_undo(operations: Vec<Change>) -> Vec<Change> {
    let mut reversed: Vec<Change> = operations.into_iter().rev().map(Change::reversed).collect();
    reversed.sort_by(|a, b| a.base_dir.cmp(&b.base_dir));
    reversed
}

/// Replays the log at `log_path` backwards through [`apply_plan`]. Entries
/// that are already back at their original name are skipped. Once an
/// executed undo completes the log is removed, so it cannot be replayed.
pub fn undo(log_path: &Path, options: &ApplyOptions) -> Result<ApplyOutcome> {
    let log = load_undo_log(log_path)?;
    info!(
        path = %log_path.display(),
        recorded = %log.date.to_rfc3339(),
        operations = log.operations.len(),
        "undoing batch"
    );

    let pending: Vec<Change> = reverse_for_undo(log.operations)
        .into_iter()
        .filter(|change| change.is_unchanged() || !already_restored(change))
        .collect();
    let outcome = apply_plan(pending, options)?;

    let finished = matches!(
        outcome,
        ApplyOutcome::Applied { .. } | ApplyOutcome::NoMatches
    );
    let rewritten = options.log_path.as_deref() == Some(log_path);
    if options.execute && finished && !rewritten {
        fs::remove_file(log_path)
            .with_context(|| format!("failed to remove undo log: {}", log_path.display()))?;
        info!(path = %log_path.display(), "undo log consumed");
    }
    Ok(outcome)
}

fn already_restored(change: &Change) -> bool {
    !change.source_path().exists() && change.target_path().exists()
}
