use super::handler::*;

use crate::core::directory_opener::test_support::{Launch, RecordingLauncher};
use crate::core::pipeline::test_support::{ProcessorCall, RecordingProcessor};
use crate::core::{
    ConverterChoice, DataProcessorOperations, HostPlatform, PipelineStage,
    ProcessLauncherOperations, WorkbenchConfig, data_processor,
};
use crate::platform_layer::{
    AppEvent, MessageSeverity, PlatformCommand, PlatformEventHandler, RevealTarget,
};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::{TempDir, tempdir};

/*
 * This module contains unit tests for `WorkbenchLogic` from the
 * `super::handler` module. The data processor and process launcher are
 * replaced with recording doubles so tests observe exactly which stages ran
 * and which external programs would have been launched. Tests focus on event
 * handling, command generation (via dequeuing), and error paths.
 */

struct Fixture {
    logic: WorkbenchLogic,
    processor: Arc<RecordingProcessor>,
    launcher: Arc<RecordingLauncher>,
    output_root: TempDir,
    inputs: TempDir,
}

fn setup_logic_with_mocks(processor: RecordingProcessor, launcher: RecordingLauncher) -> Fixture {
    crate::initialize_logging();
    let output_root = tempdir().unwrap();
    let inputs = tempdir().unwrap();
    let processor = Arc::new(processor);
    let launcher = Arc::new(launcher);
    let config = WorkbenchConfig {
        output_root: Some(output_root.path().join("outputs")),
        ..WorkbenchConfig::default()
    };
    let logic = WorkbenchLogic::new(
        config,
        Arc::clone(&processor) as Arc<dyn DataProcessorOperations>,
        Arc::clone(&launcher) as Arc<dyn ProcessLauncherOperations>,
        HostPlatform::Other,
    );
    Fixture {
        logic,
        processor,
        launcher,
        output_root,
        inputs,
    }
}

fn default_fixture() -> Fixture {
    setup_logic_with_mocks(RecordingProcessor::new(), RecordingLauncher::default())
}

fn write_input(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("raw {name}")).unwrap();
    path
}

fn drain_commands(logic: &mut WorkbenchLogic) -> Vec<PlatformCommand> {
    let mut commands = Vec::new();
    while let Some(cmd) = logic.try_dequeue_command() {
        commands.push(cmd);
    }
    commands
}

fn statuses(commands: &[PlatformCommand]) -> Vec<(String, MessageSeverity)> {
    commands
        .iter()
        .filter_map(|cmd| match cmd {
            PlatformCommand::UpdateStatus { text, severity } => Some((text.clone(), *severity)),
            _ => None,
        })
        .collect()
}

// Ticks the logic until the active run has been fully drained.
fn tick_until_idle(logic: &mut WorkbenchLogic) -> Vec<PlatformCommand> {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut commands = Vec::new();
    while logic.is_busy() {
        assert!(Instant::now() < deadline, "Run did not finish in time");
        thread::sleep(Duration::from_millis(5));
        logic.handle_event(AppEvent::Tick);
        commands.extend(drain_commands(logic));
    }
    commands
}

fn select_everything(fixture: &mut Fixture) {
    let a = write_input(fixture.inputs.path(), "a.tx0");
    let temperature = write_input(fixture.inputs.path(), "temperature.txt");
    fixture
        .logic
        .handle_event(AppEvent::InputFilesChosen { paths: vec![a] });
    fixture.logic.handle_event(AppEvent::TemperatureFileChosen {
        path: Some(temperature),
    });
    drain_commands(&mut fixture.logic);
}

#[test]
fn test_on_main_window_created_sends_initial_state() {
    let mut fixture = default_fixture();

    fixture.logic.on_main_window_created();
    let commands = drain_commands(&mut fixture.logic);

    assert_eq!(
        commands,
        vec![
            PlatformCommand::SetWindowTitle {
                title: "Resistivity Workbench - [No tx0 Files] - [No Temperature File]"
                    .to_string()
            },
            PlatformCommand::SetConverterChecked { checked: false },
            PlatformCommand::SetStartEnabled { enabled: true },
        ]
    );
}

#[test]
fn test_input_files_chosen_stages_only_tx0_files() {
    let mut fixture = default_fixture();
    let a = write_input(fixture.inputs.path(), "a.tx0");
    let b = write_input(fixture.inputs.path(), "b.csv");

    fixture.logic.handle_event(AppEvent::InputFilesChosen {
        paths: vec![a.clone(), b.clone()],
    });
    let commands = drain_commands(&mut fixture.logic);

    assert!(commands.contains(&PlatformCommand::ShowInputFileList { paths: vec![a, b] }));
    assert_eq!(
        statuses(&commands),
        vec![(
            "Staged 1 tx0 file(s).".to_string(),
            MessageSeverity::Information
        )]
    );
    let staged_dir = fixture.logic.selection.staged_input_dir().unwrap();
    let names: Vec<String> = fs::read_dir(staged_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.tx0".to_string()]);
}

#[test]
fn test_input_files_without_tx0_warn() {
    let mut fixture = default_fixture();
    let b = write_input(fixture.inputs.path(), "b.csv");

    fixture
        .logic
        .handle_event(AppEvent::InputFilesChosen { paths: vec![b] });
    let commands = drain_commands(&mut fixture.logic);

    assert_eq!(
        statuses(&commands),
        vec![(
            "None of the selected files end with '.tx0'.".to_string(),
            MessageSeverity::Warning
        )]
    );
}

#[test]
fn test_cancelled_dialogs_change_nothing() {
    let mut fixture = default_fixture();

    fixture
        .logic
        .handle_event(AppEvent::InputFilesChosen { paths: vec![] });
    fixture
        .logic
        .handle_event(AppEvent::TemperatureFileChosen { path: None });

    assert!(drain_commands(&mut fixture.logic).is_empty());
    assert!(fixture.logic.selection.staged_input().is_none());
    assert!(fixture.logic.selection.temperature_file().is_none());
}

#[test]
fn test_start_without_inputs_warns_and_runs_nothing() {
    let mut fixture = default_fixture();
    let temperature = write_input(fixture.inputs.path(), "temperature.txt");
    fixture.logic.handle_event(AppEvent::TemperatureFileChosen {
        path: Some(temperature),
    });
    drain_commands(&mut fixture.logic);

    fixture.logic.handle_event(AppEvent::StartRequested);
    let commands = drain_commands(&mut fixture.logic);

    assert_eq!(
        statuses(&commands),
        vec![(
            "Please use the 'Browse' button to select tx0 files first.".to_string(),
            MessageSeverity::Warning
        )]
    );
    assert!(!fixture.logic.is_busy());
    assert!(fixture.processor.calls().is_empty());
    assert!(!fixture.output_root.path().join("outputs").exists());
}

#[test]
fn test_start_without_temperature_file_warns() {
    let mut fixture = default_fixture();
    let a = write_input(fixture.inputs.path(), "a.tx0");
    fixture
        .logic
        .handle_event(AppEvent::InputFilesChosen { paths: vec![a] });
    drain_commands(&mut fixture.logic);

    fixture.logic.handle_event(AppEvent::StartRequested);
    let commands = drain_commands(&mut fixture.logic);

    assert_eq!(
        statuses(&commands),
        vec![(
            "Please use the 'Browse' button to select the temperature file first.".to_string(),
            MessageSeverity::Warning
        )]
    );
    assert!(!fixture.logic.is_busy());
    assert!(fixture.processor.calls().is_empty());
    assert!(!fixture.output_root.path().join("outputs").exists());
}

#[test]
fn test_full_run_reports_each_stage_and_completion() {
    let mut fixture = default_fixture();
    select_everything(&mut fixture);
    fixture
        .logic
        .handle_event(AppEvent::ConverterToggled { checked: true });

    fixture.logic.handle_event(AppEvent::StartRequested);
    let mut commands = drain_commands(&mut fixture.logic);
    assert!(fixture.logic.is_busy());
    assert!(!fixture.logic.ui_state.start_enabled);
    commands.extend(tick_until_idle(&mut fixture.logic));

    let texts: Vec<String> = statuses(&commands).into_iter().map(|(t, _)| t).collect();
    assert_eq!(
        texts,
        vec![
            "Data processing started.".to_string(),
            PipelineStage::Conversion.completion_message().to_string(),
            PipelineStage::TemperatureFiltering
                .completion_message()
                .to_string(),
            PipelineStage::Calibration.completion_message().to_string(),
            "Data processing completed: 1 detailed and 1 simplified file(s).".to_string(),
        ]
    );
    assert_eq!(
        commands.first(),
        Some(&PlatformCommand::SetStartEnabled { enabled: false })
    );
    assert!(commands.contains(&PlatformCommand::SetStartEnabled { enabled: true }));
    assert!(fixture.logic.ui_state.start_enabled);

    let calls = fixture.processor.calls();
    assert!(matches!(
        calls[0],
        ProcessorCall::Convert {
            converter: ConverterChoice::One,
            ..
        }
    ));
    let report = fixture.logic.last_report.as_ref().unwrap();
    assert_eq!(
        report.outputs.detailed_dir,
        fixture
            .output_root
            .path()
            .join("outputs")
            .join("corrected_resistivity_detailed")
    );
    assert!(
        report
            .detailed_files
            .iter()
            .any(|p| p.file_name().is_some_and(|n| n == "a.txt"))
    );
}

#[test]
fn test_stage_failure_is_surfaced_as_error_status() {
    let mut fixture = setup_logic_with_mocks(
        RecordingProcessor::failing_at(PipelineStage::Calibration),
        RecordingLauncher::default(),
    );
    select_everything(&mut fixture);

    fixture.logic.handle_event(AppEvent::StartRequested);
    let mut commands = drain_commands(&mut fixture.logic);
    commands.extend(tick_until_idle(&mut fixture.logic));

    let (last_text, last_severity) = statuses(&commands).pop().unwrap();
    assert_eq!(last_severity, MessageSeverity::Error);
    assert!(
        last_text.starts_with("Data processing failed: The calibration stage failed"),
        "Unexpected status: {last_text}"
    );
    assert!(fixture.logic.last_report.is_none());
    assert!(fixture.logic.ui_state.start_enabled);
}

/* Holds the conversion stage until the test releases it. */
struct GatedProcessor {
    inner: RecordingProcessor,
    gate: Mutex<Option<mpsc::Receiver<()>>>,
    entered: Mutex<Option<mpsc::Sender<()>>>,
}

impl DataProcessorOperations for GatedProcessor {
    fn convert(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        converter: ConverterChoice,
    ) -> data_processor::Result<()> {
        if let Some(entered) = self.entered.lock().unwrap().take() {
            let _ = entered.send(());
        }
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.recv_timeout(Duration::from_secs(10));
        }
        self.inner.convert(input_dir, output_dir, converter)
    }

    fn filter_by_date(
        &self,
        reference_dir: &Path,
        temperature_file: &Path,
        output_file: &Path,
    ) -> data_processor::Result<()> {
        self.inner
            .filter_by_date(reference_dir, temperature_file, output_file)
    }

    fn calibrate(
        &self,
        reference_dir: &Path,
        detailed_dir: &Path,
        simplified_dir: &Path,
        filtered_temperature: &Path,
    ) -> data_processor::Result<()> {
        self.inner
            .calibrate(reference_dir, detailed_dir, simplified_dir, filtered_temperature)
    }
}

struct GatedRun {
    logic: WorkbenchLogic,
    processor: Arc<GatedProcessor>,
    release: mpsc::Sender<()>,
    output_root: TempDir,
    inputs: TempDir,
}

// Starts a run on `a.tx0` and returns once the worker is parked inside conversion.
fn start_gated_run() -> GatedRun {
    crate::initialize_logging();
    let (release, gate) = mpsc::channel();
    let (entered_tx, entered_rx) = mpsc::channel();
    let processor = Arc::new(GatedProcessor {
        inner: RecordingProcessor::new(),
        gate: Mutex::new(Some(gate)),
        entered: Mutex::new(Some(entered_tx)),
    });
    let output_root = tempdir().unwrap();
    let inputs = tempdir().unwrap();
    let mut logic = WorkbenchLogic::new(
        WorkbenchConfig {
            output_root: Some(output_root.path().to_path_buf()),
            ..WorkbenchConfig::default()
        },
        Arc::clone(&processor) as Arc<dyn DataProcessorOperations>,
        Arc::new(RecordingLauncher::default()) as Arc<dyn ProcessLauncherOperations>,
        HostPlatform::Other,
    );
    logic.handle_event(AppEvent::InputFilesChosen {
        paths: vec![write_input(inputs.path(), "a.tx0")],
    });
    logic.handle_event(AppEvent::TemperatureFileChosen {
        path: Some(write_input(inputs.path(), "t.txt")),
    });
    logic.handle_event(AppEvent::StartRequested);
    entered_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("worker should reach conversion");
    drain_commands(&mut logic);
    GatedRun {
        logic,
        processor,
        release,
        output_root,
        inputs,
    }
}

#[test]
fn test_second_start_while_running_is_rejected() {
    let mut run = start_gated_run();

    run.logic.handle_event(AppEvent::StartRequested);
    let commands = drain_commands(&mut run.logic);

    assert_eq!(
        statuses(&commands),
        vec![(
            "A processing run is already in progress".to_string(),
            MessageSeverity::Warning
        )]
    );

    run.release.send(()).unwrap();
    tick_until_idle(&mut run.logic);
    assert_eq!(run.processor.inner.calls().len(), 3);
    assert!(run.logic.last_report.is_some());
}

#[test]
fn test_reselecting_inputs_mid_run_keeps_the_running_inputs() {
    let mut run = start_gated_run();
    let running_dir = run.logic.selection.staged_input_dir().unwrap().to_path_buf();

    run.logic.handle_event(AppEvent::InputFilesChosen {
        paths: vec![write_input(run.inputs.path(), "b.tx0")],
    });
    drain_commands(&mut run.logic);
    let new_dir = run.logic.selection.staged_input_dir().unwrap().to_path_buf();

    assert_ne!(running_dir, new_dir);
    assert!(running_dir.join("a.tx0").exists());

    run.release.send(()).unwrap();
    let commands = tick_until_idle(&mut run.logic);

    let (last_text, last_severity) = statuses(&commands).pop().unwrap();
    assert_eq!(last_severity, MessageSeverity::Information);
    assert!(last_text.starts_with("Data processing completed"), "{last_text}");
    let report = run.logic.last_report.as_ref().unwrap();
    let detailed: Vec<String> = report
        .detailed_files
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();
    assert_eq!(detailed, vec!["a.txt".to_string()]);
    assert!(report.outputs.detailed_dir.starts_with(run.output_root.path()));
    // The run released its inputs; the newer selection is untouched.
    assert!(!running_dir.exists());
    assert!(new_dir.join("b.tx0").exists());
}

#[test]
fn test_reveal_with_nothing_selected_spawns_nothing() {
    let mut fixture = default_fixture();

    fixture.logic.handle_event(AppEvent::RevealRequested {
        target: RevealTarget::StagedInputs,
    });
    fixture.logic.handle_event(AppEvent::RevealRequested {
        target: RevealTarget::TemperatureFile,
    });
    let commands = drain_commands(&mut fixture.logic);

    assert_eq!(statuses(&commands).len(), 2);
    assert!(statuses(&commands).iter().all(|(text, severity)| {
        text == "Directory path is empty. Please select a valid directory."
            && *severity == MessageSeverity::Warning
    }));
    assert!(fixture.launcher.launches().is_empty());
}

#[test]
fn test_reveal_targets_map_to_locations() {
    let mut fixture = default_fixture();
    select_everything(&mut fixture);
    fs::create_dir_all(fixture.output_root.path().join("outputs")).unwrap();

    for target in [
        RevealTarget::StagedInputs,
        RevealTarget::TemperatureFile,
        RevealTarget::Outputs,
    ] {
        fixture
            .logic
            .handle_event(AppEvent::RevealRequested { target });
    }

    let staged = fixture.logic.selection.staged_input_dir().unwrap().to_path_buf();
    assert_eq!(
        fixture.launcher.launches(),
        vec![
            Launch::Spawn("xdg-open".to_string(), staged),
            Launch::Spawn("xdg-open".to_string(), fixture.inputs.path().to_path_buf()),
            Launch::Spawn(
                "xdg-open".to_string(),
                fixture.output_root.path().join("outputs")
            ),
        ]
    );
    assert!(statuses(&drain_commands(&mut fixture.logic)).is_empty());
}

#[test]
fn test_reveal_outputs_before_any_run_warns() {
    let mut fixture = default_fixture();

    fixture.logic.handle_event(AppEvent::RevealRequested {
        target: RevealTarget::Outputs,
    });

    let commands = drain_commands(&mut fixture.logic);
    assert_eq!(
        statuses(&commands),
        vec![(
            "No outputs yet. Run the processing first.".to_string(),
            MessageSeverity::Warning
        )]
    );
    assert!(fixture.launcher.launches().is_empty());
}

#[test]
fn test_reveal_launch_failure_is_an_error_status() {
    let mut fixture = setup_logic_with_mocks(
        RecordingProcessor::new(),
        RecordingLauncher {
            fail: true,
            ..RecordingLauncher::default()
        },
    );
    select_everything(&mut fixture);

    fixture.logic.handle_event(AppEvent::RevealRequested {
        target: RevealTarget::StagedInputs,
    });

    let commands = drain_commands(&mut fixture.logic);
    let (text, severity) = statuses(&commands).pop().unwrap();
    assert_eq!(severity, MessageSeverity::Error);
    assert!(text.starts_with("Could not open the file manager"));
}

#[test]
fn test_quit_requested_and_on_quit_release_selection() {
    let mut fixture = default_fixture();
    select_everything(&mut fixture);
    let staged = fixture.logic.selection.staged_input_dir().unwrap().to_path_buf();

    fixture.logic.handle_event(AppEvent::QuitRequested);
    assert_eq!(
        drain_commands(&mut fixture.logic),
        vec![PlatformCommand::QuitApplication]
    );

    fixture.logic.on_quit();
    assert!(!staged.exists());
}
