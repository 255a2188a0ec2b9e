//! Defines the event and message structures for communication between the
//! controller and the presentation layer.

use serde::Deserialize;
use std::path::PathBuf;

use super::view_model::UiState;
use crate::core::{ErrorCategory, NodeId};

/// Events sent from the controller to the presentation layer.
#[derive(Debug)]
pub enum UserEvent {
    /// A complete state update to re-render the UI.
    StateUpdate(Box<UiState>),
    /// The final digest text after a successful "create ingest".
    ShowGeneratedContent(String),
    /// An error message to be displayed to the user.
    ShowError {
        category: ErrorCategory,
        message: String,
    },
    /// The digest was handed to the clipboard.
    Copied,
}

/// A command received from the presentation layer.
///
/// Serialized as `{ "command": "...", "payload": ... }`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "command", content = "payload", rename_all = "camelCase")]
pub enum IpcMessage {
    SelectDirectory(PathBuf),
    UpdatePatterns(String),
    #[serde(rename_all = "camelCase")]
    ToggleNode { node_id: NodeId, checked: bool },
    ToggleAll(bool),
    CreateIngest,
    CopyResult,
}
