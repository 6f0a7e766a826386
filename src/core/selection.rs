/*
 * Holds what the user has chosen so far: the staged copy of the selected input
 * files and the path of the temperature log. The presenter owns exactly one
 * `SelectionState` and is the only writer; a run never reads it directly but
 * receives an immutable `RunRequest` snapshot instead.
 *
 * Input files are copied into a staging folder while the temperature log is
 * referenced in place. The asymmetry is kept as-is.
 */
use super::models::{ConverterChoice, OutputLayout, RunRequest};
use super::staging::{self, StagedInput};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionError {
    MissingInputSelection,
    MissingTemperatureFile,
}

impl std::fmt::Display for PreconditionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreconditionError::MissingInputSelection => {
                write!(f, "Please use the 'Browse' button to select tx0 files first.")
            }
            PreconditionError::MissingTemperatureFile => write!(
                f,
                "Please use the 'Browse' button to select the temperature file first."
            ),
        }
    }
}

impl std::error::Error for PreconditionError {}

#[derive(Debug, Default)]
pub struct SelectionState {
    staged_input: Option<Arc<StagedInput>>,
    temperature_file: Option<PathBuf>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /*
     * Stages `file_paths` into a brand-new temporary folder and makes it the
     * current input selection. An empty selection (dialog cancelled) leaves the
     * state untouched and returns `Ok(false)`. The previous staging folder, if
     * any, is deleted once neither the selection nor a run in flight holds it.
     */
    pub fn record_input_selection(
        &mut self,
        file_paths: &[PathBuf],
        required_suffix: &str,
    ) -> staging::Result<bool> {
        if file_paths.is_empty() {
            log::debug!("SelectionState: Empty input selection ignored.");
            return Ok(false);
        }
        let staged = StagedInput::create(file_paths, required_suffix)?;
        if staged.is_empty() {
            log::warn!(
                "SelectionState: None of the {} selected file(s) end with '{required_suffix}'; staged folder is empty.",
                file_paths.len()
            );
        }
        self.staged_input = Some(Arc::new(staged));
        Ok(true)
    }

    /* Stores the temperature log path. No copy is made. */
    pub fn record_temperature_selection(&mut self, path: Option<PathBuf>) -> bool {
        match path {
            Some(p) if !p.as_os_str().is_empty() => {
                log::debug!("SelectionState: Temperature file set to {p:?}.");
                self.temperature_file = Some(p);
                true
            }
            _ => {
                log::debug!("SelectionState: Empty temperature selection ignored.");
                false
            }
        }
    }

    pub fn staged_input(&self) -> Option<&StagedInput> {
        self.staged_input.as_deref()
    }

    pub fn staged_input_dir(&self) -> Option<&Path> {
        self.staged_input.as_deref().map(StagedInput::path)
    }

    pub fn temperature_file(&self) -> Option<&Path> {
        self.temperature_file.as_deref()
    }

    pub fn clear(&mut self) {
        self.staged_input = None;
        self.temperature_file = None;
    }

    /*
     * Checks both preconditions and, if they hold, captures an immutable
     * request for the pipeline. The input selection is checked first.
     */
    pub fn to_run_request(
        &self,
        converter: ConverterChoice,
        outputs: OutputLayout,
    ) -> Result<RunRequest, PreconditionError> {
        let staged_input_dir = self
            .staged_input_dir()
            .ok_or(PreconditionError::MissingInputSelection)?;
        let temperature_file = self
            .temperature_file()
            .ok_or(PreconditionError::MissingTemperatureFile)?;
        Ok(RunRequest {
            staged_input_dir: staged_input_dir.to_path_buf(),
            temperature_file: temperature_file.to_path_buf(),
            converter,
            outputs,
            staged_input: self.staged_input.clone(),
        })
    }
}
