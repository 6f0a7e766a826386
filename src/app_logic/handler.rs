use crate::app_logic::MainWindowUiState;
use crate::core::{
    BackgroundError, BackgroundRunner, DataProcessorOperations, HostPlatform, PipelineOptions,
    PipelineOrchestrator, ProcessLauncherOperations, RevealOutcome, RunEvent, RunHandle,
    RunReport, SelectionState, WorkbenchConfig, directory_opener,
};
use crate::platform_layer::{
    AppEvent, MessageSeverity, PlatformCommand, PlatformEventHandler, RevealTarget,
};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// Made pub(crate) for access from main.rs and handler_tests.rs
pub(crate) const APP_NAME: &str = "ResistivityWorkbench";

/*
 * The presenter of the workbench. It owns the selection state, reacts to
 * platform events, starts pipeline runs on the background runner, and turns
 * everything the user should see into queued `PlatformCommand`s. Collaborators
 * (the data processor and the process launcher) are injected as trait objects
 * so tests can substitute them.
 */
pub struct WorkbenchLogic {
    pub(crate) selection: SelectionState,
    pub(crate) ui_state: MainWindowUiState,
    pub(crate) config: WorkbenchConfig,
    pub(crate) last_report: Option<RunReport>,
    runner: BackgroundRunner,
    active_run: Option<RunHandle>,
    launcher: Arc<dyn ProcessLauncherOperations>,
    host_platform: HostPlatform,
    command_queue: VecDeque<PlatformCommand>,
}

impl WorkbenchLogic {
    pub fn new(
        config: WorkbenchConfig,
        processor: Arc<dyn DataProcessorOperations>,
        launcher: Arc<dyn ProcessLauncherOperations>,
        host_platform: HostPlatform,
    ) -> Self {
        let orchestrator = PipelineOrchestrator::new(
            processor,
            PipelineOptions {
                keep_intermediates: config.keep_intermediates,
            },
        );
        WorkbenchLogic {
            selection: SelectionState::new(),
            ui_state: MainWindowUiState::new(config.default_converter),
            config,
            last_report: None,
            runner: BackgroundRunner::new(Arc::new(orchestrator)),
            active_run: None,
            launcher,
            host_platform,
            command_queue: VecDeque::new(),
        }
    }

    fn enqueue(&mut self, command: PlatformCommand) {
        self.command_queue.push_back(command);
    }

    fn set_status(&mut self, text: impl Into<String>, severity: MessageSeverity) {
        let text = text.into();
        match severity {
            MessageSeverity::Information => log::info!("AppLogic: {text}"),
            MessageSeverity::Warning => log::warn!("AppLogic: {text}"),
            MessageSeverity::Error => log::error!("AppLogic: {text}"),
        }
        self.ui_state.last_status = Some((text.clone(), severity));
        self.enqueue(PlatformCommand::UpdateStatus { text, severity });
    }

    fn set_start_enabled(&mut self, enabled: bool) {
        self.ui_state.start_enabled = enabled;
        self.enqueue(PlatformCommand::SetStartEnabled { enabled });
    }

    fn refresh_title(&mut self) {
        let title = MainWindowUiState::compose_window_title(&self.selection);
        self.enqueue(PlatformCommand::SetWindowTitle { title });
    }

    /* Sends the initial UI state to the platform. */
    pub fn on_main_window_created(&mut self) {
        self.refresh_title();
        self.enqueue(PlatformCommand::SetConverterChecked {
            checked: self.ui_state.converter_checked,
        });
        self.set_start_enabled(true);
    }

    fn handle_input_files_chosen(&mut self, paths: Vec<PathBuf>) {
        let required_suffix = self.config.required_suffix.clone();
        match self
            .selection
            .record_input_selection(&paths, &required_suffix)
        {
            Ok(false) => {
                log::debug!("AppLogic: Input file dialog cancelled.");
            }
            Ok(true) => {
                let (selected, staged_count) = self
                    .selection
                    .staged_input()
                    .map_or((paths, 0), |s| {
                        (s.selected_files().to_vec(), s.staged_files().len())
                    });
                self.enqueue(PlatformCommand::ShowInputFileList { paths: selected });
                self.refresh_title();
                if staged_count == 0 {
                    self.set_status(
                        format!("None of the selected files end with '{required_suffix}'."),
                        MessageSeverity::Warning,
                    );
                } else {
                    self.set_status(
                        format!("Staged {staged_count} tx0 file(s)."),
                        MessageSeverity::Information,
                    );
                }
            }
            Err(e) => {
                self.set_status(
                    format!("Could not stage the selected files: {e}"),
                    MessageSeverity::Error,
                );
            }
        }
    }

    fn handle_temperature_file_chosen(&mut self, path: Option<PathBuf>) {
        if self.selection.record_temperature_selection(path) {
            if let Some(path) = self.selection.temperature_file().map(Path::to_path_buf) {
                self.enqueue(PlatformCommand::ShowTemperatureFile { path });
            }
            self.refresh_title();
        }
    }

    fn handle_start_requested(&mut self) {
        // Flush a finished run first so its outcome is not lost.
        self.poll_background();
        if self.active_run.is_some() || self.runner.is_running() {
            self.set_status(
                BackgroundError::AlreadyRunning.to_string(),
                MessageSeverity::Warning,
            );
            return;
        }

        let request = match self
            .selection
            .to_run_request(self.ui_state.converter(), self.config.output_layout())
        {
            Ok(request) => request,
            Err(precondition) => {
                self.set_status(precondition.to_string(), MessageSeverity::Warning);
                return;
            }
        };

        match self.runner.try_start(request) {
            Ok(handle) => {
                self.active_run = Some(handle);
                self.set_start_enabled(false);
                self.set_status("Data processing started.", MessageSeverity::Information);
            }
            Err(BackgroundError::AlreadyRunning) => {
                self.set_status(
                    BackgroundError::AlreadyRunning.to_string(),
                    MessageSeverity::Warning,
                );
            }
            Err(e) => {
                self.set_status(e.to_string(), MessageSeverity::Error);
            }
        }
    }

    /*
     * Drains every pending event from the active run without blocking. When
     * the final outcome arrives the run handle is released and the start
     * control re-enabled.
     */
    pub fn poll_background(&mut self) {
        let mut finished = None;
        if let Some(handle) = &self.active_run {
            while let Some(event) = handle.try_next_event() {
                match event {
                    RunEvent::Progress(stage) => {
                        self.ui_state.last_status = Some((
                            stage.completion_message().to_string(),
                            MessageSeverity::Information,
                        ));
                        self.command_queue.push_back(PlatformCommand::UpdateStatus {
                            text: stage.completion_message().to_string(),
                            severity: MessageSeverity::Information,
                        });
                    }
                    RunEvent::Finished(outcome) => {
                        finished = Some(outcome);
                        break;
                    }
                }
            }
        }

        let Some(outcome) = finished else {
            return;
        };
        if let Some(handle) = self.active_run.take() {
            handle.join();
        }
        self.set_start_enabled(true);
        match outcome {
            Ok(report) => {
                log::info!(
                    "AppLogic: Run started at {} finished in {:.2?}.",
                    report.started_at,
                    report.elapsed
                );
                if let Some(kept) = &report.kept_intermediates {
                    log::info!("AppLogic: Intermediates kept in {kept:?}.");
                }
                let detailed = report.detailed_files.len();
                let simplified = report.simplified_files.len();
                self.set_status(
                    format!(
                        "Data processing completed: {detailed} detailed and {simplified} simplified file(s)."
                    ),
                    MessageSeverity::Information,
                );
                self.last_report = Some(report);
            }
            Err(e) => {
                self.set_status(
                    format!("Data processing failed: {e}"),
                    MessageSeverity::Error,
                );
            }
        }
    }

    fn reveal_location(&self, target: RevealTarget) -> Option<PathBuf> {
        match target {
            RevealTarget::StagedInputs => self.selection.staged_input_dir().map(Path::to_path_buf),
            RevealTarget::TemperatureFile => self
                .selection
                .temperature_file()
                .and_then(Path::parent)
                .map(Path::to_path_buf),
            RevealTarget::Outputs => Some(self.config.resolved_output_root()),
        }
    }

    fn handle_reveal_requested(&mut self, target: RevealTarget) {
        let location = self.reveal_location(target);
        if target == RevealTarget::Outputs && location.as_deref().is_some_and(|p| !p.exists()) {
            self.set_status(
                "No outputs yet. Run the processing first.",
                MessageSeverity::Warning,
            );
            return;
        }
        match directory_opener::reveal(
            self.launcher.as_ref(),
            self.host_platform,
            location.as_deref(),
        ) {
            Ok(RevealOutcome::Opened) => {}
            Ok(RevealOutcome::NothingToOpen) => {
                self.set_status(
                    "Directory path is empty. Please select a valid directory.",
                    MessageSeverity::Warning,
                );
            }
            Err(e) => {
                self.set_status(
                    format!("Could not open the file manager: {e}"),
                    MessageSeverity::Error,
                );
            }
        }
    }
}

impl PlatformEventHandler for WorkbenchLogic {
    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::InputFilesChosen { paths } => self.handle_input_files_chosen(paths),
            AppEvent::TemperatureFileChosen { path } => self.handle_temperature_file_chosen(path),
            AppEvent::ConverterToggled { checked } => {
                self.ui_state.converter_checked = checked;
                log::debug!("AppLogic: Converter set to {}.", self.ui_state.converter());
            }
            AppEvent::StartRequested => self.handle_start_requested(),
            AppEvent::RevealRequested { target } => self.handle_reveal_requested(target),
            AppEvent::QuitRequested => {
                if self.active_run.is_some() {
                    log::warn!("AppLogic: Quit requested while a run is in progress.");
                }
                self.enqueue(PlatformCommand::QuitApplication);
            }
            AppEvent::Tick => self.poll_background(),
        }
    }

    fn on_quit(&mut self) {
        // Let an in-flight run finish writing its outputs.
        if let Some(handle) = self.active_run.take() {
            log::info!("AppLogic: Waiting for the active run before exit.");
            if let Err(e) = handle.wait_for_outcome() {
                log::error!("AppLogic: Run in flight at exit failed: {e}");
            }
            handle.join();
        }
        log::debug!("AppLogic: on_quit, releasing staged inputs.");
        self.selection.clear();
    }

    fn try_dequeue_command(&mut self) -> Option<PlatformCommand> {
        self.command_queue.pop_front()
    }

    fn is_busy(&self) -> bool {
        self.active_run.is_some()
    }
}
