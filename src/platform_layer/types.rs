/*
 * This module defines the vocabulary exchanged between the application logic
 * and whichever platform front-end hosts it: platform-agnostic events
 * (`AppEvent`) flowing in, commands (`PlatformCommand`) flowing out, message
 * severities for status display, and the `PlatformEventHandler` trait the
 * application logic implements.
 */

use std::path::PathBuf;

// Which location a "reveal in file manager" request refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealTarget {
    StagedInputs,
    TemperatureFile,
    Outputs,
}

// --- Events from Platform to App Logic ---

/*
 * Represents platform-agnostic UI events. The platform layer translates native
 * interactions (dialog results, button clicks, checkbox toggles) into these
 * and hands them to the application logic.
 */
#[derive(Debug, Clone)]
pub enum AppEvent {
    // Result of the multi-select input file dialog. Empty when cancelled.
    InputFilesChosen { paths: Vec<PathBuf> },
    // Result of the temperature file dialog. `None` when cancelled.
    TemperatureFileChosen { path: Option<PathBuf> },
    ConverterToggled { checked: bool },
    StartRequested,
    RevealRequested { target: RevealTarget },
    QuitRequested,
    // Idle tick from the platform loop; used to drain background run events.
    Tick,
}

// Ordered from least to most severe for comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MessageSeverity {
    Information,
    Warning,
    Error,
}

/*
 * Commands from the application logic to the platform layer. The platform
 * decides how each is rendered (a text box, a status bar, a console line).
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCommand {
    SetWindowTitle { title: String },
    ShowInputFileList { paths: Vec<PathBuf> },
    ShowTemperatureFile { path: PathBuf },
    SetConverterChecked { checked: bool },
    SetStartEnabled { enabled: bool },
    UpdateStatus {
        text: String,
        severity: MessageSeverity,
    },
    QuitApplication,
}

// --- Trait for App Logic to Handle Events ---

pub trait PlatformEventHandler: Send + 'static {
    // Handles one event and enqueues any resulting `PlatformCommand`s.
    fn handle_event(&mut self, event: AppEvent);

    // Called when the platform loop is about to exit.
    fn on_quit(&mut self) {}

    // Dequeues a single pending command, if any.
    fn try_dequeue_command(&mut self) -> Option<PlatformCommand>;

    // True while a background run is still in flight.
    fn is_busy(&self) -> bool;
}
