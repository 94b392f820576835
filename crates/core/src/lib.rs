mod apply;
mod change;
mod config;
mod conflict;
mod exif_reader;
mod matcher;
mod metadata;
mod operation;
mod planner;
mod report;
mod template;
mod walker;

pub use apply::{
    apply_plan, load_undo_log, persist_undo, reverse_for_undo, undo, ApplyOptions, ApplyOutcome,
    UndoLog,
};
pub use change::{Change, Entry};
pub use config::{
    app_paths, load_config, save_config, AppConfig, AppPaths, MatchMode, RenameOptions,
};
pub use conflict::{detect_conflicts, Conflict, ConflictKind, Resolution};
pub use matcher::{find_matches, SearchPattern};
pub use metadata::{FileTimes, FsMetadata, ImageMetadata, MetadataLookup, Ratio};
pub use operation::{Operation, OperationError, RunReport};
pub use planner::{
    apply_numbering, compute_targets, generate_plan, sort_matches, RenamePlan, RenameStats,
};
pub use report::{change_rows, conflict_rows, render_table, ReportRow, RowStatus};
pub use template::{expand, ExpandContext, TemplateError};
pub use walker::collect_entries;
