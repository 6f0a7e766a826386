/*
 * This module consolidates the core, platform-agnostic logic of the workbench:
 * selection state and file staging, the three-stage pipeline and its external
 * processor seam, background execution with a single run slot, configuration,
 * and the cross-platform directory opener. Abstractions used for dependency
 * injection (`DataProcessorOperations`, `ConfigManagerOperations`,
 * `ProcessLauncherOperations`) are re-exported here.
 */
pub mod background;
pub mod config;
pub mod data_processor;
pub mod directory_opener;
pub mod models;
pub mod path_utils;
pub mod pipeline;
pub mod selection;
pub mod staging;

// Re-export key structures and enums
pub use models::{ConverterChoice, OutputLayout, PipelineStage, RunReport, RunRequest};

pub use selection::{PreconditionError, SelectionState};

pub use staging::{StagedInput, StagingError};

pub use data_processor::{CommandDataProcessor, DataProcessorOperations, ProcessorError};

pub use pipeline::{PipelineError, PipelineOptions, PipelineOrchestrator};

pub use background::{BackgroundError, BackgroundRunner, RunEvent, RunHandle};

pub use config::{ConfigError, ConfigManagerOperations, CoreConfigManager, WorkbenchConfig};

pub use directory_opener::{
    CoreProcessLauncher, HostPlatform, ProcessLauncherOperations, RevealOutcome,
};
