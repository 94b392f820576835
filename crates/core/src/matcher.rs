use crate::change::{file_name_of, is_hidden_name, split_extension, Change, Entry};
use crate::config::{MatchMode, RenameOptions};
use regex::{NoExpand, Regex};
use tracing::debug;

/// The compiled find string of an operation.
#[derive(Debug, Clone)]
pub struct SearchPattern {
    kind: PatternKind,
}

#[derive(Debug, Clone)]
enum PatternKind {
    Regex(Regex),
    Literal(String),
    LiteralIgnoreCase { needle: String, regex: Regex },
}

impl SearchPattern {
    /// An empty find string matches whole names in either mode.
    pub fn new(find: &str, mode: MatchMode, case_insensitive: bool) -> Result<Self, regex::Error> {
        let kind = match mode {
            _ if find.is_empty() => PatternKind::Regex(Regex::new(".*")?),
            MatchMode::Regex if case_insensitive => {
                PatternKind::Regex(Regex::new(&format!("(?i){find}"))?)
            }
            MatchMode::Regex => PatternKind::Regex(Regex::new(find)?),
            MatchMode::Literal if case_insensitive => PatternKind::LiteralIgnoreCase {
                needle: find.to_lowercase(),
                regex: Regex::new(&format!("(?i){}", regex::escape(find)))?,
            },
            MatchMode::Literal => PatternKind::Literal(find.to_string()),
        };
        Ok(Self { kind })
    }

    pub fn is_match(&self, name: &str) -> bool {
        match &self.kind {
            PatternKind::Regex(regex) => regex.is_match(name),
            PatternKind::Literal(needle) => name.contains(needle.as_str()),
            PatternKind::LiteralIgnoreCase { needle, .. } => {
                name.to_lowercase().contains(needle.as_str())
            }
        }
    }

    /// Replaces every occurrence in `name`. Only regex mode expands capture
    /// group references in `replacement`.
    pub fn replace_all(&self, name: &str, replacement: &str) -> String {
        match &self.kind {
            PatternKind::Regex(regex) => regex.replace_all(name, replacement).into_owned(),
            PatternKind::Literal(needle) => name.replace(needle.as_str(), replacement),
            PatternKind::LiteralIgnoreCase { regex, .. } => {
                regex.replace_all(name, NoExpand(replacement)).into_owned()
            }
        }
    }

    /// Substitutes on a file name, leaving the extension out of the match
    /// and re-appending it when `ignore_extension` is set.
    pub fn substitute(&self, file_name: &str, replacement: &str, ignore_extension: bool) -> String {
        if !ignore_extension {
            return self.replace_all(file_name, replacement);
        }
        let (stem, ext) = split_extension(file_name);
        let mut out = self.replace_all(stem, replacement);
        out.push_str(ext);
        out
    }
}

/// Filters enumerated entries down to the ones the pattern selects, keeping
/// enumeration order. Every match starts with its target equal to its source.
pub fn find_matches(entries: &[Entry], pattern: &SearchPattern, options: &RenameOptions) -> Vec<Change> {
    let mut out = Vec::new();
    for entry in entries {
        let name = file_name_of(&entry.source);

        if entry.is_dir && !options.includes_directories() {
            continue;
        }
        if options.only_directories && !entry.is_dir {
            continue;
        }
        if !options.include_hidden && is_hidden_name(name) {
            debug!(path = %entry.source_path().display(), "skipping hidden entry");
            continue;
        }

        let subject = if options.ignore_extension {
            split_extension(name).0
        } else {
            name
        };
        if pattern.is_match(subject) {
            out.push(Change::from(entry.clone()));
        }
    }
    out
}
