/*
 * This module provides the application logic layer, centered around
 * `WorkbenchLogic` which acts as the Presenter/Controller, and
 * `MainWindowUiState` for presentation-only state of the main window.
 * Unit tests for `WorkbenchLogic` are in `handler_tests.rs`.
 */
pub mod handler;
pub mod main_window_ui_state;

#[cfg(test)]
mod handler_tests;

pub use handler::WorkbenchLogic;
pub use main_window_ui_state::MainWindowUiState;
