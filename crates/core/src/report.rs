//! Rows for the plan and conflict tables, and their text rendering.

use crate::change::Change;
use crate::conflict::{Conflict, ConflictKind};
use colored::Colorize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Ok,
    Conflict(ConflictKind),
}

impl RowStatus {
    fn label(self) -> String {
        match self {
            RowStatus::Ok => "ok".to_string(),
            RowStatus::Conflict(kind) => format!("❌ [{kind}]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub source: String,
    pub target: String,
    pub status: RowStatus,
}

pub fn change_rows(changes: &[Change]) -> Vec<ReportRow> {
    changes
        .iter()
        .map(|change| ReportRow {
            source: change.source_path().display().to_string(),
            target: change.target_path().display().to_string(),
            status: RowStatus::Ok,
        })
        .collect()
}

/// One row per implicated source. Empty-name rows leave the target blank.
pub fn conflict_rows(conflicts: &[Conflict]) -> Vec<ReportRow> {
    let mut rows = Vec::new();
    for conflict in conflicts {
        let target = match conflict.kind {
            ConflictKind::EmptyName => String::new(),
            _ => conflict.target.display().to_string(),
        };
        for source in &conflict.sources {
            rows.push(ReportRow {
                source: source.display().to_string(),
                target: target.clone(),
                status: RowStatus::Conflict(conflict.kind),
            });
        }
    }
    rows
}

pub fn render_table(rows: &[ReportRow]) -> String {
    const HEADERS: [&str; 3] = ["ORIGINAL", "RENAMED", "STATUS"];

    let source_width = column_width(HEADERS[0], rows.iter().map(|r| r.source.as_str()));
    let target_width = column_width(HEADERS[1], rows.iter().map(|r| r.target.as_str()));

    let mut out = format!(
        "{:<source_width$} | {:<target_width$} | {}\n",
        HEADERS[0].bold(),
        HEADERS[1].bold(),
        HEADERS[2].bold()
    );
    out.push_str(&format!(
        "{}-+-{}-+-{}\n",
        "-".repeat(source_width),
        "-".repeat(target_width),
        "-".repeat(HEADERS[2].len())
    ));

    for row in rows {
        let label = row.status.label();
        let status = match row.status {
            RowStatus::Ok => label.green(),
            RowStatus::Conflict(_) => label.red(),
        };
        out.push_str(&format!(
            "{:<source_width$} | {:<target_width$} | {}\n",
            row.source, row.target, status
        ));
    }
    out
}

fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values
        .map(|v| v.chars().count())
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn change_rows_join_base_dir() {
        let rows = change_rows(&[Change {
            base_dir: PathBuf::from("/d"),
            source: "a.txt".to_string(),
            target: "b.txt".to_string(),
            is_dir: false,
        }]);
        assert_eq!(rows[0].source, PathBuf::from("/d/a.txt").display().to_string());
        assert_eq!(rows[0].target, PathBuf::from("/d/b.txt").display().to_string());
        assert_eq!(rows[0].status, RowStatus::Ok);
    }

    #[test]
    fn conflict_rows_expand_sources_and_blank_empty_names() {
        let rows = conflict_rows(&[
            Conflict {
                kind: ConflictKind::EmptyName,
                sources: vec![PathBuf::from("/d/a.txt")],
                target: PathBuf::from("/d"),
            },
            Conflict {
                kind: ConflictKind::FutureOverwrite,
                sources: vec![PathBuf::from("/d/1.txt"), PathBuf::from("/d/2.txt")],
                target: PathBuf::from("/d/x.txt"),
            },
        ]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].target, "");
        assert_eq!(rows[1].status, RowStatus::Conflict(ConflictKind::FutureOverwrite));
        assert_eq!(rows[2].source, PathBuf::from("/d/2.txt").display().to_string());
    }

    #[test]
    fn table_lists_every_row_with_its_label() {
        colored::control::set_override(false);
        let rows = vec![
            ReportRow {
                source: "a".to_string(),
                target: "b".to_string(),
                status: RowStatus::Ok,
            },
            ReportRow {
                source: "long-source".to_string(),
                target: "c".to_string(),
                status: RowStatus::Conflict(ConflictKind::TargetExists),
            },
        ];
        let table = render_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ORIGINAL    | RENAMED | STATUS"));
        assert_eq!(lines[2], "a           | b       | ok");
        assert_eq!(lines[3], "long-source | c       | ❌ [target exists]");
    }
}
