use crate::apply::{apply_plan, undo, ApplyOptions, ApplyOutcome};
use crate::change::Entry;
use crate::config::RenameOptions;
use crate::matcher::SearchPattern;
use crate::metadata::{FsMetadata, MetadataLookup};
use crate::planner::{generate_plan, RenamePlan};
use crate::template::ExpandContext;
use crate::walker::collect_entries;
use anyhow::Result;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OperationError {
    #[error("one of find, replace or undo must be set to a non-empty value")]
    MissingArguments,
    #[error("malformed search pattern `{pattern}`: {source}")]
    MalformedPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("undo needs the path of a previously written undo log")]
    MissingUndoFile,
}

/// What a run produced: the plan (absent for undo) and how applying it ended.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub plan: Option<RenamePlan>,
    pub outcome: ApplyOutcome,
}

/// One rename invocation. The search pattern is compiled and the `{{now.*}}`
/// clock is read once, when the operation is built.
#[derive(Debug, Clone)]
pub struct Operation {
    options: RenameOptions,
    pattern: SearchPattern,
    ctx: ExpandContext,
}

impl Operation {
    pub fn new(options: RenameOptions) -> Result<Self, OperationError> {
        if options.find_pattern.is_empty()
            && options.replacement.is_empty()
            && options.undo_file_path.is_none()
        {
            return Err(OperationError::MissingArguments);
        }

        let pattern =
            SearchPattern::new(&options.find_pattern, options.mode, options.case_insensitive)
                .map_err(|source| OperationError::MalformedPattern {
                    pattern: options.find_pattern.clone(),
                    source,
                })?;
        let ctx = ExpandContext::new(options.working_directory.clone());

        Ok(Self {
            options,
            pattern,
            ctx,
        })
    }

    pub fn options(&self) -> &RenameOptions {
        &self.options
    }

    pub fn plan(&self, entries: &[Entry], lookup: &dyn MetadataLookup) -> Result<RenamePlan> {
        generate_plan(entries, &self.pattern, &self.options, &self.ctx, lookup)
    }

    pub fn apply(&self, plan: RenamePlan) -> Result<ApplyOutcome> {
        apply_plan(plan.changes, &ApplyOptions::from(&self.options))
    }

    pub fn undo(&self) -> Result<ApplyOutcome> {
        let log_path = self
            .options
            .undo_file_path
            .as_deref()
            .ok_or(OperationError::MissingUndoFile)?;
        undo(log_path, &ApplyOptions::from(&self.options))
    }

    /// Enumerates, plans and applies; or undoes when an undo log is set.
    pub fn run(&self) -> Result<RunReport> {
        if self.options.undo_file_path.is_some() {
            return Ok(RunReport {
                plan: None,
                outcome: self.undo()?,
            });
        }

        let entries = collect_entries(
            &self.options.directories,
            self.options.recursive,
            self.options.include_hidden,
        )?;
        let plan = self.plan(&entries, &FsMetadata)?;
        let outcome = self.apply(plan.clone())?;
        Ok(RunReport {
            plan: Some(plan),
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::ConflictKind;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn options_for(dir: &Path) -> RenameOptions {
        RenameOptions {
            directories: vec![dir.to_path_buf()],
            working_directory: dir.to_path_buf(),
            ..RenameOptions::default()
        }
    }

    #[test]
    fn rejects_missing_arguments() {
        let err = Operation::new(RenameOptions::default()).expect_err("must fail");
        assert!(matches!(err, OperationError::MissingArguments));
    }

    #[test]
    fn rejects_malformed_pattern_before_matching() {
        let err = Operation::new(RenameOptions {
            find_pattern: "([a-z]".to_string(),
            ..RenameOptions::default()
        })
        .expect_err("must fail");
        assert!(matches!(err, OperationError::MalformedPattern { .. }));
        assert!(err.to_string().contains("([a-z]"));
    }

    #[test]
    fn undo_without_log_path_is_a_configuration_error() {
        let op = Operation::new(RenameOptions {
            replacement: "x".to_string(),
            ..RenameOptions::default()
        })
        .expect("operation");
        let err = op.undo().expect_err("must fail");
        assert!(matches!(
            err.downcast_ref::<OperationError>(),
            Some(OperationError::MissingUndoFile)
        ));
    }

    #[test]
    fn dry_run_lists_plan_and_touches_nothing() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("IMG_1.jpg"), b"1").expect("write 1");
        fs::write(temp.path().join("IMG_2.jpg"), b"2").expect("write 2");

        let op = Operation::new(RenameOptions {
            find_pattern: "IMG_".to_string(),
            replacement: "{{p}}_".to_string(),
            ..options_for(temp.path())
        })
        .expect("operation");
        let report = op.run().expect("run");

        let dir_name = temp
            .path()
            .file_name()
            .expect("tempdir has a name")
            .to_string_lossy()
            .to_string();
        match report.outcome {
            ApplyOutcome::Reported { changes, .. } => {
                assert_eq!(changes[0].target, format!("{dir_name}_1.jpg"));
                assert_eq!(changes[1].target, format!("{dir_name}_2.jpg"));
            }
            other => panic!("expected report, got {other:?}"),
        }
        assert!(temp.path().join("IMG_1.jpg").exists());
    }

    #[test]
    fn empty_name_is_refused_then_left_alone_with_auto_fix() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("a.txt"), b"a").expect("write a");

        let refused = Operation::new(RenameOptions {
            find_pattern: ".*".to_string(),
            execute: true,
            ..options_for(temp.path())
        })
        .expect("operation")
        .run()
        .expect("run");
        match refused.outcome {
            ApplyOutcome::Refused { conflicts } => {
                assert_eq!(conflicts[0].kind, ConflictKind::EmptyName);
            }
            other => panic!("expected refusal, got {other:?}"),
        }

        let fixed = Operation::new(RenameOptions {
            find_pattern: ".*".to_string(),
            execute: true,
            auto_fix_conflicts: true,
            ..options_for(temp.path())
        })
        .expect("operation")
        .run()
        .expect("run");
        match fixed.outcome {
            ApplyOutcome::Applied {
                applied, unchanged, ..
            } => {
                assert_eq!(applied, 0);
                assert_eq!(unchanged, 1);
            }
            other => panic!("expected apply, got {other:?}"),
        }
        assert!(temp.path().join("a.txt").exists());
    }

    #[test]
    fn execute_then_undo_through_operations() {
        let temp = tempdir().expect("tempdir");
        let work = temp.path().join("work");
        fs::create_dir_all(&work).expect("create work");
        for name in ["b.txt", "a.txt", "c.txt"] {
            fs::write(work.join(name), name).expect("write file");
        }
        let log_path = temp.path().join("undo.json");

        let op = Operation::new(RenameOptions {
            replacement: "doc_%03d{{ext}}".to_string(),
            start_number: 5,
            execute: true,
            output_log_path: Some(log_path.clone()),
            ..options_for(&work)
        })
        .expect("operation");
        op.run().expect("run");

        assert_eq!(fs::read_to_string(work.join("doc_005.txt")).expect("read"), "a.txt");
        assert_eq!(fs::read_to_string(work.join("doc_006.txt")).expect("read"), "b.txt");
        assert_eq!(fs::read_to_string(work.join("doc_007.txt")).expect("read"), "c.txt");

        let undo_op = Operation::new(RenameOptions {
            undo_file_path: Some(log_path),
            execute: true,
            ..options_for(&work)
        })
        .expect("operation");
        let report = undo_op.run().expect("undo");
        assert!(report.plan.is_none());
        assert!(matches!(report.outcome, ApplyOutcome::Applied { applied: 3, .. }));
        assert_eq!(fs::read_to_string(work.join("a.txt")).expect("read"), "a.txt");
        assert!(!work.join("doc_005.txt").exists());
    }
}
