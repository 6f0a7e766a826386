/*
 * Plain data types shared across the core: the converter choice threaded into
 * the conversion stage, the durable output layout, the immutable request handed
 * to a pipeline run, and the report a successful run produces.
 */
use super::staging::StagedInput;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const DETAILED_OUTPUT_DIR_NAME: &str = "corrected_resistivity_detailed";
pub const SIMPLIFIED_OUTPUT_DIR_NAME: &str = "corrected_resistivity_simplified";
pub const DEFAULT_OUTPUT_ROOT_DIR_NAME: &str = "outputs";
pub const FILTERED_TEMPERATURE_FILENAME: &str = "Newtem.txt";

/*
 * Selects between the two conversion behaviors of the first pipeline stage.
 * The collaborator only ever sees the rendered argument ("1" or "2"); the
 * meaning of each variant is owned by the converter itself.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConverterChoice {
    One,
    #[default]
    Two,
}

impl ConverterChoice {
    // The checkbox in the main window selects converter 1 when checked.
    pub fn from_checkbox(checked: bool) -> Self {
        if checked {
            ConverterChoice::One
        } else {
            ConverterChoice::Two
        }
    }

    pub fn as_arg(&self) -> &'static str {
        match self {
            ConverterChoice::One => "1",
            ConverterChoice::Two => "2",
        }
    }
}

impl fmt::Display for ConverterChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "converter {}", self.as_arg())
    }
}

/*
 * Durable deliverable locations. Unlike every intermediate artifact these are
 * not temporary: they persist across runs and are replaced by the newest run.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub detailed_dir: PathBuf,
    pub simplified_dir: PathBuf,
}

impl OutputLayout {
    pub fn under(output_root: &Path) -> Self {
        OutputLayout {
            detailed_dir: output_root.join(DETAILED_OUTPUT_DIR_NAME),
            simplified_dir: output_root.join(SIMPLIFIED_OUTPUT_DIR_NAME),
        }
    }

    pub fn dirs(&self) -> [&Path; 2] {
        [&self.detailed_dir, &self.simplified_dir]
    }
}

/*
 * Everything a pipeline run needs, captured at the moment the user pressed
 * start. Only `SelectionState::to_run_request` builds one, so holding a
 * `RunRequest` means both preconditions were satisfied.
 */
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub staged_input_dir: PathBuf,
    pub temperature_file: PathBuf,
    pub converter: ConverterChoice,
    pub outputs: OutputLayout,
    /* Shares ownership of the staged folder so it outlives a newer selection. */
    pub staged_input: Option<Arc<StagedInput>>,
}

/* The three processing stages, in execution order. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Conversion,
    TemperatureFiltering,
    Calibration,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 3] = [
        PipelineStage::Conversion,
        PipelineStage::TemperatureFiltering,
        PipelineStage::Calibration,
    ];

    pub fn completion_message(&self) -> &'static str {
        match self {
            PipelineStage::Conversion => "Conversion from tx0 to txt completed.",
            PipelineStage::TemperatureFiltering => "Temperature data filtering completed.",
            PipelineStage::Calibration => "Resistivity calibration completed.",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Conversion => "conversion",
            PipelineStage::TemperatureFiltering => "temperature filtering",
            PipelineStage::Calibration => "calibration",
        };
        f.write_str(name)
    }
}

/* Summary of a successful run. */
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: String,
    pub elapsed: Duration,
    pub outputs: OutputLayout,
    pub detailed_files: Vec<PathBuf>,
    pub simplified_files: Vec<PathBuf>,
    // Present only when intermediates were kept on disk.
    pub kept_intermediates: Option<PathBuf>,
}
