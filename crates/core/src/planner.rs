use crate::change::{clean_relative, Change, Entry};
use crate::config::RenameOptions;
use crate::matcher::{find_matches, SearchPattern};
use crate::metadata::MetadataLookup;
use crate::template::{expand, ExpandContext, TemplateError};
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info};

static COUNTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%(\d*)d").expect("counter regex must compile"));

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RenameStats {
    pub scanned: usize,
    pub matched: usize,
    pub unchanged: usize,
}

/// Matches with their computed targets, in the order they will be applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenamePlan {
    pub changes: Vec<Change>,
    pub stats: RenameStats,
}

pub fn generate_plan(
    entries: &[Entry],
    pattern: &SearchPattern,
    options: &RenameOptions,
    ctx: &ExpandContext,
    lookup: &dyn MetadataLookup,
) -> Result<RenamePlan> {
    let matches = find_matches(entries, pattern, options);
    info!(scanned = entries.len(), matched = matches.len(), "matched entries");

    let ordered = if options.includes_directories() {
        sort_matches(matches)
    } else {
        matches
    };
    let changes = compute_targets(ordered, pattern, options, ctx, lookup)?;

    let stats = RenameStats {
        scanned: entries.len(),
        matched: changes.len(),
        unchanged: changes.iter().filter(|c| c.is_unchanged()).count(),
    };
    Ok(RenamePlan { changes, stats })
}

/// Computes each match's target: substitution, then template expansion,
/// then numbering with `start_number + position`.
pub fn compute_targets(
    matches: Vec<Change>,
    pattern: &SearchPattern,
    options: &RenameOptions,
    ctx: &ExpandContext,
    lookup: &dyn MetadataLookup,
) -> Result<Vec<Change>, TemplateError> {
    let mut out = Vec::with_capacity(matches.len());
    for (index, change) in matches.into_iter().enumerate() {
        let file_name = change.file_name();
        let dir = &change.source[..change.source.len() - file_name.len()];

        let substituted =
            pattern.substitute(file_name, &options.replacement, options.ignore_extension);
        let expanded = expand(&substituted, &change, ctx, lookup)?;
        let numbered = apply_numbering(&expanded, options.start_number + index as i64);
        let target = clean_relative(&format!("{dir}{numbered}"));

        debug!(source = %change.source_path().display(), target = %target, "computed target");
        out.push(Change { target, ..change });
    }
    Ok(out)
}

/// Replaces every `%d`, `%Nd` or `%0Nd` counter with `number`, padded with
/// spaces or zeros to width N.
pub fn apply_numbering(name: &str, number: i64) -> String {
    COUNTER_RE
        .replace_all(name, |caps: &Captures| {
            let width_text = &caps[1];
            let width = width_text.parse::<usize>().unwrap_or(0);
            if width_text.starts_with('0') {
                format!("{number:0width$}")
            } else {
                format!("{number:width$}")
            }
        })
        .into_owned()
}

/// Orders files before directories and deeper directories before their
/// ancestors. The sort is stable.
pub fn sort_matches(mut changes: Vec<Change>) -> Vec<Change> {
    changes.sort_by(|a, b| match (a.is_dir, b.is_dir) {
        (false, false) => Ordering::Equal,
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (true, true) => b.base_dir.cmp(&a.base_dir),
    });
    changes
}
