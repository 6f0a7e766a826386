/*
 * The seam between the workbench and the actual scientific processing. The
 * conversion, temperature filtering and calibration algorithms live outside
 * this crate; `DataProcessorOperations` is all the pipeline knows about them.
 *
 * `CommandDataProcessor` is the production implementation: each stage runs as
 * an external program whose command line comes from the configuration, with
 * `{placeholder}` arguments replaced by the concrete paths of the current run.
 */
use super::config::{StageCommand, StageCommands};
use super::models::ConverterChoice;
use std::io;
use std::path::Path;
use std::process::Command;

#[derive(Debug)]
pub enum ProcessorError {
    Io(io::Error),
    Spawn {
        program: String,
        source: io::Error,
    },
    StageFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    NotConfigured(&'static str),
}

impl From<io::Error> for ProcessorError {
    fn from(err: io::Error) -> Self {
        ProcessorError::Io(err)
    }
}

impl std::fmt::Display for ProcessorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessorError::Io(e) => write!(f, "I/O error: {e}"),
            ProcessorError::Spawn { program, source } => {
                write!(f, "Failed to start '{program}': {source}")
            }
            ProcessorError::StageFailed {
                program,
                code,
                stderr,
            } => {
                match code {
                    Some(c) => write!(f, "'{program}' exited with status {c}")?,
                    None => write!(f, "'{program}' was terminated by a signal")?,
                }
                let stderr = stderr.trim();
                if !stderr.is_empty() {
                    write!(f, ": {stderr}")?;
                }
                Ok(())
            }
            ProcessorError::NotConfigured(stage) => {
                write!(f, "No command configured for the {stage} stage")
            }
        }
    }
}

impl std::error::Error for ProcessorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProcessorError::Io(e) => Some(e),
            ProcessorError::Spawn { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProcessorError>;

/*
 * The three external stages. Each call blocks until the stage has finished
 * writing its outputs; returning `Ok` is the only completion signal.
 */
pub trait DataProcessorOperations: Send + Sync {
    fn convert(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        converter: ConverterChoice,
    ) -> Result<()>;

    fn filter_by_date(
        &self,
        reference_dir: &Path,
        temperature_file: &Path,
        output_file: &Path,
    ) -> Result<()>;

    fn calibrate(
        &self,
        reference_dir: &Path,
        detailed_dir: &Path,
        simplified_dir: &Path,
        filtered_temperature: &Path,
    ) -> Result<()>;
}

pub struct CommandDataProcessor {
    stages: StageCommands,
}

impl CommandDataProcessor {
    pub fn new(stages: StageCommands) -> Self {
        CommandDataProcessor { stages }
    }

    fn run_stage(
        &self,
        stage_name: &'static str,
        command: &StageCommand,
        substitutions: &[(&str, &str)],
    ) -> Result<()> {
        if command.program.trim().is_empty() {
            return Err(ProcessorError::NotConfigured(stage_name));
        }
        let args: Vec<String> = command
            .args
            .iter()
            .map(|arg| substitute_placeholders(arg, substitutions))
            .collect();
        log::debug!(
            "DataProcessor: Running {stage_name} stage: {} {:?}",
            command.program,
            args
        );

        let output = Command::new(&command.program)
            .args(&args)
            .output()
            .map_err(|source| ProcessorError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            log::info!("DataProcessor [{stage_name}]: {line}");
        }

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            log::error!(
                "DataProcessor: {stage_name} stage failed with {:?}: {}",
                output.status.code(),
                stderr.trim()
            );
            Err(ProcessorError::StageFailed {
                program: command.program.clone(),
                code: output.status.code(),
                stderr,
            })
        }
    }
}

/* Replaces every `{name}` in `template` with the matching value. Unknown placeholders are left as-is. */
pub(crate) fn substitute_placeholders(template: &str, substitutions: &[(&str, &str)]) -> String {
    substitutions
        .iter()
        .fold(template.to_string(), |acc, (name, value)| {
            acc.replace(&format!("{{{name}}}"), value)
        })
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl DataProcessorOperations for CommandDataProcessor {
    fn convert(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        converter: ConverterChoice,
    ) -> Result<()> {
        let input_dir = display(input_dir);
        let output_dir = display(output_dir);
        self.run_stage(
            "conversion",
            &self.stages.convert,
            &[
                ("input_dir", &input_dir),
                ("output_dir", &output_dir),
                ("converter", converter.as_arg()),
            ],
        )
    }

    fn filter_by_date(
        &self,
        reference_dir: &Path,
        temperature_file: &Path,
        output_file: &Path,
    ) -> Result<()> {
        let reference_dir = display(reference_dir);
        let temperature_file = display(temperature_file);
        let output_file = display(output_file);
        self.run_stage(
            "temperature filtering",
            &self.stages.filter_by_date,
            &[
                ("reference_dir", &reference_dir),
                ("temperature_file", &temperature_file),
                ("output_file", &output_file),
            ],
        )
    }

    fn calibrate(
        &self,
        reference_dir: &Path,
        detailed_dir: &Path,
        simplified_dir: &Path,
        filtered_temperature: &Path,
    ) -> Result<()> {
        let reference_dir = display(reference_dir);
        let detailed_dir = display(detailed_dir);
        let simplified_dir = display(simplified_dir);
        let filtered_temperature = display(filtered_temperature);
        self.run_stage(
            "calibration",
            &self.stages.calibrate,
            &[
                ("reference_dir", &reference_dir),
                ("detailed_dir", &detailed_dir),
                ("simplified_dir", &simplified_dir),
                ("filtered_temperature", &filtered_temperature),
            ],
        )
    }
}
