//! Defines the central, mutable state of the application.

use crate::config::AppConfig;
use crate::core::SelectionTree;
use std::path::PathBuf;

/// Holds the complete, mutable state of the application.
///
/// This struct is wrapped in an `Arc<Mutex<...>>`; every command holds the
/// lock for its whole duration, so a toggle always sees the tree exclusively.
#[derive(Debug, Default)]
pub struct AppState {
    /// The application's configuration settings.
    pub config: AppConfig,
    /// The exclude pattern text as currently typed by the user.
    pub pattern_text: String,
    /// The directory the current selection tree was built from.
    pub selected_directory: Option<PathBuf>,
    /// The selection tree, rebuilt on every directory selection.
    pub tree: Option<SelectionTree>,
    /// State of the "Select All / Deselect All" toggle button.
    pub all_selected: bool,
    /// The last successfully generated digest.
    pub output: Option<String>,
    /// Summary block of the last digest (file count, token estimate).
    pub output_summary: Option<String>,
    /// Status line shown below the tree.
    pub status_message: String,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            pattern_text: config.exclude_patterns.clone(),
            config,
            status_message: "Ready.".to_string(),
            ..Default::default()
        }
    }

    /// Drops everything tied to the previously selected directory.
    pub fn reset_directory_state(&mut self) {
        self.selected_directory = None;
        self.tree = None;
        self.all_selected = false;
        self.output = None;
        self.output_summary = None;
    }
}
