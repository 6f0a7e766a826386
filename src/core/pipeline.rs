/*
 * Runs the three processing stages for one `RunRequest`, strictly in order:
 * conversion into a fresh temporary text folder, temperature filtering into a
 * fresh temporary file, and calibration into the durable output folders. Each
 * stage starts only after the previous one returned successfully; the first
 * failure stops the run and is returned to the caller.
 *
 * Intermediates are owned by the run and deleted when it ends, unless the
 * configuration asks to keep them for inspection.
 */
use super::data_processor::{DataProcessorOperations, ProcessorError};
use super::models::{
    FILTERED_TEMPERATURE_FILENAME, OutputLayout, PipelineStage, RunReport, RunRequest,
};
use super::path_utils;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Debug)]
pub enum PipelineError {
    Stage {
        stage: PipelineStage,
        source: ProcessorError,
    },
    Io(io::Error),
    WorkerPanicked,
}

impl From<io::Error> for PipelineError {
    fn from(err: io::Error) -> Self {
        PipelineError::Io(err)
    }
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Stage { stage, source } => write!(f, "The {stage} stage failed: {source}"),
            PipelineError::Io(e) => write!(f, "Pipeline I/O error: {e}"),
            PipelineError::WorkerPanicked => {
                write!(f, "The processing worker stopped unexpectedly")
            }
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Stage { source, .. } => Some(source),
            PipelineError::Io(e) => Some(e),
            PipelineError::WorkerPanicked => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub keep_intermediates: bool,
}

/*
 * Temporary locations for one run. Dropping this deletes them, unless they
 * were persisted with `keep`.
 */
struct RunScratch {
    converted_dir: TempDir,
    filtered_dir: TempDir,
}

impl RunScratch {
    fn allocate() -> io::Result<Self> {
        Ok(RunScratch {
            converted_dir: tempfile::Builder::new().prefix("converted_txt_").tempdir()?,
            filtered_dir: tempfile::Builder::new().prefix("filtered_temp_").tempdir()?,
        })
    }

    fn filtered_temperature_file(&self) -> PathBuf {
        self.filtered_dir.path().join(FILTERED_TEMPERATURE_FILENAME)
    }

    // Persists both folders and returns the converted-text folder.
    fn keep(self) -> PathBuf {
        let converted = self.converted_dir.keep();
        let filtered = self.filtered_dir.keep();
        log::info!(
            "Pipeline: Keeping intermediates: converted text in {converted:?}, filtered temperature in {filtered:?}."
        );
        converted
    }
}

/*
 * Makes `dir` an empty directory, creating it if missing. Used so that the
 * newest run fully replaces the deliverables of the previous one.
 */
pub(crate) fn reset_output_dir(dir: &Path) -> io::Result<()> {
    if dir.exists() {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
        log::debug!("Pipeline: Cleared previous contents of {dir:?}.");
    } else {
        fs::create_dir_all(dir)?;
        log::debug!("Pipeline: Created output directory {dir:?}.");
    }
    Ok(())
}

pub struct PipelineOrchestrator {
    processor: Arc<dyn DataProcessorOperations>,
    options: PipelineOptions,
}

impl PipelineOrchestrator {
    pub fn new(processor: Arc<dyn DataProcessorOperations>, options: PipelineOptions) -> Self {
        PipelineOrchestrator { processor, options }
    }

    /*
     * Runs conversion, filtering and calibration in sequence. `on_stage_done`
     * is called once after each completed stage, before the next one begins.
     */
    pub fn run(
        &self,
        request: &RunRequest,
        on_stage_done: &mut dyn FnMut(PipelineStage),
    ) -> Result<RunReport> {
        let started_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| String::from("unknown"));
        let clock = Instant::now();
        log::info!(
            "Pipeline: Starting run on {:?} with temperature file {:?} ({}).",
            request.staged_input_dir,
            request.temperature_file,
            request.converter
        );

        let scratch = RunScratch::allocate()?;
        let converted_dir = scratch.converted_dir.path().to_path_buf();
        let filtered_file = scratch.filtered_temperature_file();

        self.processor
            .convert(&request.staged_input_dir, &converted_dir, request.converter)
            .map_err(|source| stage_error(PipelineStage::Conversion, source))?;
        report_stage(PipelineStage::Conversion, on_stage_done);

        self.processor
            .filter_by_date(&converted_dir, &request.temperature_file, &filtered_file)
            .map_err(|source| stage_error(PipelineStage::TemperatureFiltering, source))?;
        report_stage(PipelineStage::TemperatureFiltering, on_stage_done);

        let outputs = &request.outputs;
        for dir in outputs.dirs() {
            reset_output_dir(dir)?;
        }
        self.processor
            .calibrate(
                &converted_dir,
                &outputs.detailed_dir,
                &outputs.simplified_dir,
                &filtered_file,
            )
            .map_err(|source| stage_error(PipelineStage::Calibration, source))?;
        report_stage(PipelineStage::Calibration, on_stage_done);

        let kept_intermediates = if self.options.keep_intermediates {
            Some(scratch.keep())
        } else {
            None
        };

        let report = build_report(started_at, clock, outputs, kept_intermediates);
        log::info!(
            "Pipeline: Data processing completed in {:.2?}: {} detailed and {} simplified file(s).",
            report.elapsed,
            report.detailed_files.len(),
            report.simplified_files.len()
        );
        Ok(report)
    }
}

fn stage_error(stage: PipelineStage, source: ProcessorError) -> PipelineError {
    log::error!("Pipeline: The {stage} stage failed: {source}");
    PipelineError::Stage { stage, source }
}

fn report_stage(stage: PipelineStage, on_stage_done: &mut dyn FnMut(PipelineStage)) {
    log::info!("Pipeline: {}", stage.completion_message());
    on_stage_done(stage);
}

fn build_report(
    started_at: String,
    clock: Instant,
    outputs: &OutputLayout,
    kept_intermediates: Option<PathBuf>,
) -> RunReport {
    RunReport {
        started_at,
        elapsed: clock.elapsed(),
        outputs: outputs.clone(),
        detailed_files: path_utils::list_files_recursive(&outputs.detailed_dir),
        simplified_files: path_utils::list_files_recursive(&outputs.simplified_dir),
        kept_intermediates,
    }
}
