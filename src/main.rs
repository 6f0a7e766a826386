// src/main.rs

mod app_logic;
mod core;
mod platform_layer;

use crate::app_logic::WorkbenchLogic;
use crate::app_logic::handler::APP_NAME;
use crate::core::{
    CommandDataProcessor, ConfigManagerOperations, CoreConfigManager, CoreProcessLauncher,
    HostPlatform, WorkbenchConfig, config, path_utils,
};
use crate::platform_layer::{AppEvent, ConsolePlatform, RevealTarget};

use clap::{ArgAction, Parser, ValueEnum};
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Once};

static LOGGING_INIT: Once = Once::new();

/*
 * Installs the global logger: a terminal logger on stderr plus a file logger
 * in the application's local config folder when that folder is available.
 * Only the first call has any effect.
 */
pub fn initialize_logging_at(level: LevelFilter) {
    LOGGING_INIT.call_once(|| {
        let log_config = ConfigBuilder::new()
            .set_thread_level(LevelFilter::Debug)
            .build();
        let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
            level,
            log_config.clone(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        )];
        match path_utils::get_log_file_path(APP_NAME).map(File::create) {
            Some(Ok(file)) => loggers.push(WriteLogger::new(LevelFilter::Debug, log_config, file)),
            Some(Err(e)) => eprintln!("Could not create the log file: {e}"),
            None => eprintln!("No local config folder available; logging to the terminal only."),
        }
        if let Err(e) = CombinedLogger::init(loggers) {
            eprintln!("Failed to initialize logger: {e}");
        }
    });
}

#[cfg(test)]
pub fn initialize_logging() {
    initialize_logging_at(LevelFilter::Debug);
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RevealArg {
    Inputs,
    Temperature,
    Outputs,
}

impl From<RevealArg> for RevealTarget {
    fn from(arg: RevealArg) -> Self {
        match arg {
            RevealArg::Inputs => RevealTarget::StagedInputs,
            RevealArg::Temperature => RevealTarget::TemperatureFile,
            RevealArg::Outputs => RevealTarget::Outputs,
        }
    }
}

/// Stage tx0 measurement files and run the conversion, temperature filtering
/// and calibration stages in one go.
#[derive(Parser, Debug)]
#[command(name = "resistivity_workbench", version, about, long_about = None)]
struct Cli {
    /// Raw .tx0 measurement files to process
    tx0_files: Vec<PathBuf>,

    /// Temperature log used for filtering and calibration
    #[arg(short = 't', long = "temperature", value_name = "FILE")]
    temperature: Option<PathBuf>,

    /// Use converter 1 instead of the configured default
    #[arg(long)]
    xz: bool,

    /// Folder that receives the detailed and simplified outputs
    #[arg(long, value_name = "DIR")]
    output_root: Option<PathBuf>,

    /// Read the configuration from this file instead of the user config folder
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Keep the intermediate folders of the run instead of deleting them
    #[arg(long)]
    keep_intermediates: bool,

    /// Open a location in the file manager once processing is done
    #[arg(long, value_enum)]
    reveal: Option<RevealArg>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /* Translates the arguments into the events a user would have produced. */
    fn to_events(&self) -> Vec<AppEvent> {
        let mut events = vec![
            AppEvent::InputFilesChosen {
                paths: self.tx0_files.clone(),
            },
            AppEvent::TemperatureFileChosen {
                path: self.temperature.clone(),
            },
        ];
        if self.xz {
            events.push(AppEvent::ConverterToggled { checked: true });
        }
        events.push(AppEvent::StartRequested);
        if let Some(reveal) = self.reveal {
            events.push(AppEvent::RevealRequested {
                target: reveal.into(),
            });
        }
        events.push(AppEvent::QuitRequested);
        events
    }
}

/*
 * Loads the configuration from an explicit file, or from the user config
 * folder (writing the defaults there on first use). Any failure is logged and
 * the defaults are used instead.
 */
fn load_config(explicit: Option<&PathBuf>) -> WorkbenchConfig {
    if let Some(path) = explicit {
        return config::load_config_from_path(path).unwrap_or_else(|e| {
            log::error!("Main: Failed to load config from {path:?}: {e}. Using defaults.");
            WorkbenchConfig::default()
        });
    }

    let manager = CoreConfigManager::new();
    let first_use = CoreConfigManager::config_file_path(APP_NAME).is_some_and(|p| !p.exists());
    let loaded = manager.load_config(APP_NAME).unwrap_or_else(|e| {
        log::error!("Main: Failed to load config: {e}. Using defaults.");
        WorkbenchConfig::default()
    });
    if first_use {
        match manager.save_config(APP_NAME, &loaded) {
            Ok(()) => log::info!("Main: Wrote default configuration."),
            Err(e) => log::warn!("Main: Could not write default configuration: {e}"),
        }
    }
    loaded
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    initialize_logging_at(cli.log_level());
    log::info!("Main: Starting {APP_NAME}.");

    let mut workbench_config = load_config(cli.config.as_ref());
    if let Some(output_root) = &cli.output_root {
        workbench_config.output_root = Some(output_root.clone());
    }
    if cli.keep_intermediates {
        workbench_config.keep_intermediates = true;
    }

    let processor = Arc::new(CommandDataProcessor::new(workbench_config.stages.clone()));
    let mut logic = WorkbenchLogic::new(
        workbench_config,
        processor,
        Arc::new(CoreProcessLauncher::new()),
        HostPlatform::detect(),
    );
    logic.on_main_window_created();

    let mut platform = ConsolePlatform::stdout();
    match platform.run(&mut logic, cli.to_events()) {
        Ok(summary) if summary.should_fail_exit() => ExitCode::FAILURE,
        Ok(_) => {
            log::info!("Main: Finished.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Main: Console output failed: {e}");
            ExitCode::FAILURE
        }
    }
}
