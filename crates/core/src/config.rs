use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// How the find string is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Regex,
    Literal,
}

/// Configuration for one rename invocation.
#[derive(Debug, Clone)]
pub struct RenameOptions {
    pub find_pattern: String,
    pub replacement: String,
    pub mode: MatchMode,
    pub case_insensitive: bool,
    pub ignore_extension: bool,
    pub include_hidden: bool,
    pub include_directories: bool,
    pub only_directories: bool,
    pub start_number: i64,
    pub execute: bool,
    pub auto_fix_conflicts: bool,
    pub recursive: bool,
    pub directories: Vec<PathBuf>,
    pub undo_file_path: Option<PathBuf>,
    pub output_log_path: Option<PathBuf>,
    pub working_directory: PathBuf,
}

impl Default for RenameOptions {
    fn default() -> Self {
        Self {
            find_pattern: String::new(),
            replacement: String::new(),
            mode: MatchMode::Regex,
            case_insensitive: false,
            ignore_extension: false,
            include_hidden: false,
            include_directories: false,
            only_directories: false,
            start_number: 1,
            execute: false,
            auto_fix_conflicts: false,
            recursive: false,
            directories: Vec::new(),
            undo_file_path: None,
            output_log_path: None,
            working_directory: PathBuf::from("."),
        }
    }
}

impl RenameOptions {
    /// Directories take part when asked for, and always when only
    /// directories are wanted.
    pub fn includes_directories(&self) -> bool {
        self.include_directories || self.only_directories
    }
}

/// User defaults persisted in `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub start_number: i64,
    pub fix_conflicts: bool,
    pub include_hidden: bool,
    pub include_directories: bool,
    pub ignore_case: bool,
    pub ignore_extension: bool,
    pub recursive: bool,
    pub write_undo_log: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            start_number: 1,
            fix_conflicts: false,
            include_hidden: false,
            include_directories: false,
            ignore_case: false,
            ignore_extension: false,
            recursive: false,
            write_undo_log: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_path: PathBuf,
    pub undo_path: PathBuf,
}

pub fn app_paths() -> Result<AppPaths> {
    let proj = ProjectDirs::from("com", "bulk-renamer", "bulk-renamer")
        .context("could not resolve the OS configuration directory")?;
    let config_dir = proj.config_dir().to_path_buf();
    Ok(AppPaths {
        config_path: config_dir.join("config.toml"),
        undo_path: config_dir.join("undo-last.json"),
        config_dir,
    })
}

pub fn load_config() -> Result<AppConfig> {
    let paths = app_paths()?;
    load_config_from(&paths)
}

pub fn save_config(config: &AppConfig) -> Result<()> {
    let paths = app_paths()?;
    save_config_to(&paths, config)
}

fn load_config_from(paths: &AppPaths) -> Result<AppConfig> {
    if !paths.config_path.exists() {
        return Ok(AppConfig::default());
    }

    let raw = fs::read_to_string(&paths.config_path).with_context(|| {
        format!(
            "failed to read config file: {}",
            paths.config_path.display()
        )
    })?;

    let config = toml::from_str::<AppConfig>(&raw).context("failed to parse config file")?;
    Ok(config)
}

fn save_config_to(paths: &AppPaths, config: &AppConfig) -> Result<()> {
    fs::create_dir_all(&paths.config_dir).with_context(|| {
        format!(
            "failed to create config directory: {}",
            paths.config_dir.display()
        )
    })?;
    let body = toml::to_string_pretty(config).context("failed to serialize config")?;
    fs::write(&paths.config_path, body).with_context(|| {
        format!(
            "failed to write config file: {}",
            paths.config_path.display()
        )
    })?;
    Ok(())
}
