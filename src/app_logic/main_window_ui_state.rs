/*
 * This module defines the MainWindowUiState struct.
 * MainWindowUiState holds state that exists only for presentation: the
 * converter checkbox, whether the start control is enabled, and the most recent
 * status line. The selection itself and the run bookkeeping live in
 * `WorkbenchLogic`.
 */
use crate::core::{ConverterChoice, SelectionState};
use crate::platform_layer::MessageSeverity;

pub const APP_TITLE: &str = "Resistivity Workbench";

#[derive(Debug)]
pub struct MainWindowUiState {
    /* Mirrors the converter checkbox; checked selects converter 1. */
    pub converter_checked: bool,
    /* False while a background run is in flight. */
    pub start_enabled: bool,
    /* The last status message shown to the user, with its severity. */
    pub last_status: Option<(String, MessageSeverity)>,
}

impl MainWindowUiState {
    pub fn new(default_converter: ConverterChoice) -> Self {
        log::debug!("MainWindowUiState::new called with default {default_converter}.");
        MainWindowUiState {
            converter_checked: default_converter == ConverterChoice::One,
            start_enabled: true,
            last_status: None,
        }
    }

    pub fn converter(&self) -> ConverterChoice {
        ConverterChoice::from_checkbox(self.converter_checked)
    }

    /*
     * Composes the window title from the current selection: how many input
     * files are staged and which temperature file is in use.
     */
    pub fn compose_window_title(selection: &SelectionState) -> String {
        let mut title = APP_TITLE.to_string();
        match selection.staged_input() {
            Some(staged) => {
                title = format!("{title} - [{} tx0 file(s)]", staged.staged_files().len())
            }
            None => title = format!("{title} - [No tx0 Files]"),
        }
        match selection.temperature_file().and_then(|p| p.file_name()) {
            Some(name) => title = format!("{title} - [{}]", name.to_string_lossy()),
            None => title = format!("{title} - [No Temperature File]"),
        }
        title
    }
}
