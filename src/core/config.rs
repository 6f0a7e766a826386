/*
 * Manages the persistent workbench settings: the suffix accepted for raw
 * instrument files, where durable outputs go, whether pipeline intermediates
 * are kept for inspection, the default converter, and the command line used
 * for each external processing stage.
 *
 * It uses a trait-based approach (`ConfigManagerOperations`) so the presenter
 * and tests can substitute storage. The concrete implementation
 * (`CoreConfigManager`) stores a JSON file in the per-user local configuration
 * directory, located through `path_utils`.
 */
use crate::core::models::{ConverterChoice, DEFAULT_OUTPUT_ROOT_DIR_NAME, OutputLayout};
use crate::core::path_utils;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "workbench_config.json";
pub const DEFAULT_REQUIRED_SUFFIX: &str = ".tx0";

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Serde(serde_json::Error),
    NoProjectDirectory,
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Serde(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Configuration I/O error: {e}"),
            ConfigError::Serde(e) => write!(f, "Configuration file format error: {e}"),
            ConfigError::NoProjectDirectory => {
                write!(f, "Could not determine project directory for configuration")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Serde(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/* One external program invocation. Arguments may contain `{placeholder}` names. */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl StageCommand {
    fn python_module(subcommand: &str, placeholders: &[&str]) -> Self {
        let mut args = vec![
            "-m".to_string(),
            "data_processor".to_string(),
            subcommand.to_string(),
        ];
        args.extend(placeholders.iter().map(|p| format!("{{{p}}}")));
        StageCommand {
            program: "python3".to_string(),
            args,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageCommands {
    pub convert: StageCommand,
    pub filter_by_date: StageCommand,
    pub calibrate: StageCommand,
}

impl Default for StageCommands {
    fn default() -> Self {
        StageCommands {
            convert: StageCommand::python_module(
                "convert",
                &["input_dir", "output_dir", "converter"],
            ),
            filter_by_date: StageCommand::python_module(
                "filter-temperature",
                &["reference_dir", "temperature_file", "output_file"],
            ),
            calibrate: StageCommand::python_module(
                "calibrate",
                &[
                    "reference_dir",
                    "detailed_dir",
                    "simplified_dir",
                    "filtered_temperature",
                ],
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbenchConfig {
    pub required_suffix: String,
    // `None` means "<current dir>/outputs".
    pub output_root: Option<PathBuf>,
    pub keep_intermediates: bool,
    pub default_converter: ConverterChoice,
    pub stages: StageCommands,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        WorkbenchConfig {
            required_suffix: DEFAULT_REQUIRED_SUFFIX.to_string(),
            output_root: None,
            keep_intermediates: false,
            default_converter: ConverterChoice::default(),
            stages: StageCommands::default(),
        }
    }
}

impl WorkbenchConfig {
    pub fn resolved_output_root(&self) -> PathBuf {
        match &self.output_root {
            Some(root) => root.clone(),
            None => std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(DEFAULT_OUTPUT_ROOT_DIR_NAME),
        }
    }

    pub fn output_layout(&self) -> OutputLayout {
        OutputLayout::under(&self.resolved_output_root())
    }
}

pub trait ConfigManagerOperations: Send + Sync {
    fn load_config(&self, app_name: &str) -> Result<WorkbenchConfig>;
    fn save_config(&self, app_name: &str, config: &WorkbenchConfig) -> Result<()>;
}

/*
 * Reads a configuration file. A missing file is not an error and yields the
 * defaults; an unreadable or malformed one is.
 */
pub fn load_config_from_path(file_path: &Path) -> Result<WorkbenchConfig> {
    if !file_path.exists() {
        log::debug!("Config: {file_path:?} does not exist, using defaults.");
        return Ok(WorkbenchConfig::default());
    }
    let reader = BufReader::new(File::open(file_path)?);
    let config: WorkbenchConfig = serde_json::from_reader(reader)?;
    log::debug!("Config: Loaded configuration from {file_path:?}.");
    Ok(config)
}

pub fn save_config_to_path(file_path: &Path, config: &WorkbenchConfig) -> Result<()> {
    let mut writer = BufWriter::new(File::create(file_path)?);
    serde_json::to_writer_pretty(&mut writer, config)?;
    writer.flush()?;
    log::debug!("Config: Saved configuration to {file_path:?}.");
    Ok(())
}

pub struct CoreConfigManager {}

impl CoreConfigManager {
    pub fn new() -> Self {
        CoreConfigManager {}
    }

    pub fn config_file_path(app_name: &str) -> Option<PathBuf> {
        path_utils::get_base_app_config_local_dir(app_name).map(|dir| dir.join(CONFIG_FILENAME))
    }
}

impl Default for CoreConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManagerOperations for CoreConfigManager {
    fn load_config(&self, app_name: &str) -> Result<WorkbenchConfig> {
        log::trace!("CoreConfigManager: Loading configuration for app '{app_name}'");
        let file_path = Self::config_file_path(app_name).ok_or(ConfigError::NoProjectDirectory)?;
        load_config_from_path(&file_path)
    }

    fn save_config(&self, app_name: &str, config: &WorkbenchConfig) -> Result<()> {
        log::trace!("CoreConfigManager: Saving configuration for app '{app_name}'");
        let file_path = Self::config_file_path(app_name).ok_or(ConfigError::NoProjectDirectory)?;
        save_config_to_path(&file_path, config)
    }
}
