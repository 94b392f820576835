use anyhow::{bail, Result};
use bulk_renamer_core::{
    app_paths, change_rows, conflict_rows, load_config, render_table, save_config, AppConfig,
    ApplyOutcome, Conflict, MatchMode, Operation, RenameOptions, RunReport,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "bulk-renamer-cli")]
#[command(about = "Batch rename files and directories with find/replace, templates and numbering")]
struct Cli {
    /// Log every planning and rename decision to stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Rename(RenameArgs),
    Undo(UndoArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
    /// Write a config file with the default values, ready to edit.
    Init {
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[derive(Debug, Args)]
struct RenameArgs {
    /// Search pattern; empty matches whole names.
    #[arg(short, long, default_value = "")]
    find: String,
    /// Replacement text; may use capture groups, {{...}} tokens and %03d counters.
    #[arg(short, long, default_value = "")]
    replace: String,
    /// Treat the search pattern as plain text.
    #[arg(short, long, default_value_t = false)]
    string_mode: bool,
    #[arg(short, long, default_value_t = false)]
    ignore_case: bool,
    /// Leave the extension out of matching and replacing.
    #[arg(short = 'e', long, default_value_t = false)]
    ignore_ext: bool,
    #[arg(short = 'H', long, default_value_t = false)]
    hidden: bool,
    #[arg(short = 'd', long, default_value_t = false)]
    include_dir: bool,
    #[arg(short = 'D', long, default_value_t = false)]
    only_dir: bool,
    #[arg(short = 'R', long, default_value_t = false)]
    recursive: bool,
    #[arg(short = 'n', long)]
    start_num: Option<i64>,
    /// Apply the renames; without it the plan is only printed.
    #[arg(short = 'x', long, default_value_t = false)]
    exec: bool,
    #[arg(short = 'F', long, default_value_t = false)]
    fix_conflicts: bool,
    /// Where to write the undo log after a successful run.
    #[arg(short, long)]
    output_file: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    dirs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct UndoArgs {
    /// Undo log written by a previous run.
    log: PathBuf,
    #[arg(short = 'x', long, default_value_t = false)]
    exec: bool,
    #[arg(short = 'F', long, default_value_t = false)]
    fix_conflicts: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Rename(args) => cmd_rename(args),
        Commands::Undo(args) => cmd_undo(args),
        Commands::Config(config) => match config.action {
            ConfigAction::Show => cmd_config_show(),
            ConfigAction::Init { force } => cmd_config_init(force),
        },
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_rename(args: RenameArgs) -> Result<()> {
    let config = load_config()?;
    let output_log_path = match args.output_file {
        Some(path) => Some(path),
        None if args.exec && config.write_undo_log => Some(app_paths()?.undo_path),
        None => None,
    };

    let options = RenameOptions {
        find_pattern: args.find,
        replacement: args.replace,
        mode: if args.string_mode {
            MatchMode::Literal
        } else {
            MatchMode::Regex
        },
        case_insensitive: args.ignore_case || config.ignore_case,
        ignore_extension: args.ignore_ext || config.ignore_extension,
        include_hidden: args.hidden || config.include_hidden,
        include_directories: args.include_dir || config.include_directories,
        only_directories: args.only_dir,
        start_number: args.start_num.unwrap_or(config.start_number),
        execute: args.exec,
        auto_fix_conflicts: args.fix_conflicts || config.fix_conflicts,
        recursive: args.recursive || config.recursive,
        directories: args.dirs,
        undo_file_path: None,
        output_log_path,
        working_directory: std::env::current_dir()?,
    };
    debug!(?options, "rename options");

    let report = Operation::new(options)?.run()?;
    print_report(report, args.output)
}

fn cmd_undo(args: UndoArgs) -> Result<()> {
    let options = RenameOptions {
        execute: args.exec,
        auto_fix_conflicts: args.fix_conflicts,
        undo_file_path: Some(args.log),
        working_directory: std::env::current_dir()?,
        ..RenameOptions::default()
    };

    let report = Operation::new(options)?.run()?;
    print_report(report, args.output)
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let paths = app_paths()?;
    println!("config file: {}", paths.config_path.display());
    println!("default undo log: {}", paths.undo_path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_config_init(force: bool) -> Result<()> {
    let paths = app_paths()?;
    if paths.config_path.exists() && !force {
        bail!(
            "config file already exists: {} (pass --force to overwrite)",
            paths.config_path.display()
        );
    }
    save_config(&AppConfig::default())?;
    println!("wrote {}", paths.config_path.display());
    Ok(())
}

fn print_report(report: RunReport, format: OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    let table = matches!(format, OutputFormat::Table);

    match report.outcome {
        ApplyOutcome::NoMatches => {
            eprintln!("no files matched");
        }
        ApplyOutcome::Refused { conflicts } => {
            if table {
                print_conflicts(&conflicts);
            }
            bail!(
                "{} conflict(s) detected; resolve them or re-run with -F to fix them automatically",
                conflicts.len()
            );
        }
        ApplyOutcome::Reported { changes, conflicts } => {
            if table {
                print_conflicts(&conflicts);
                print!("{}", render_table(&change_rows(&changes)));
            }
            eprintln!("dry run: nothing was renamed. Append -x to apply the changes above.");
        }
        ApplyOutcome::Applied {
            applied,
            unchanged,
            conflicts,
            log_path,
        } => {
            if table {
                print_conflicts(&conflicts);
            }
            eprintln!("renamed {applied} (unchanged {unchanged})");
            if let Some(path) = log_path {
                eprintln!("undo log: {}", path.display());
            }
        }
    }
    Ok(())
}

fn print_conflicts(conflicts: &[Conflict]) {
    if conflicts.is_empty() {
        return;
    }
    println!("conflicts:");
    print!("{}", render_table(&conflict_rows(conflicts)));
    println!();
}
