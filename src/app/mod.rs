//! The controller layer: shared state, upstream commands and downstream events.

pub mod clipboard;
pub mod commands;
pub mod events;
pub mod helpers;
pub mod proxy;
pub mod state;
pub mod view_model;

use crate::core::{DigestGenerator, ErrorCategory};
use clipboard::ClipboardService;
use events::IpcMessage;
use proxy::EventProxy;
use state::AppState;
use std::sync::{Arc, Mutex};

/// Parses a raw JSON message from the presentation layer and dispatches it.
///
/// Malformed messages are reported as input errors and otherwise ignored.
pub fn handle_ipc_message<P, G, C>(
    message: String,
    generator: &G,
    clipboard: &C,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) where
    P: EventProxy,
    G: DigestGenerator + ?Sized,
    C: ClipboardService + ?Sized,
{
    match serde_json::from_str::<IpcMessage>(&message) {
        Ok(msg) => handle_command(msg, generator, clipboard, proxy, state),
        Err(e) => {
            tracing::error!("Failed to parse IPC message: {} ({})", message, e);
            helpers::show_error(
                &proxy,
                ErrorCategory::Input,
                format!("Unrecognized command: {e}"),
            );
        }
    }
}

/// Routes an already decoded command to its handler.
pub fn handle_command<P, G, C>(
    msg: IpcMessage,
    generator: &G,
    clipboard: &C,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) where
    P: EventProxy,
    G: DigestGenerator + ?Sized,
    C: ClipboardService + ?Sized,
{
    tracing::debug!("Handling command: {:?}", msg);
    match msg {
        IpcMessage::SelectDirectory(path) => commands::select_directory(path, proxy, state),
        IpcMessage::UpdatePatterns(text) => commands::update_patterns(text, proxy, state),
        IpcMessage::ToggleNode { node_id, checked } => {
            commands::toggle_node(node_id, checked, proxy, state)
        }
        IpcMessage::ToggleAll(checked) => commands::toggle_all(checked, proxy, state),
        IpcMessage::CreateIngest => commands::create_ingest_command(generator, proxy, state),
        IpcMessage::CopyResult => commands::copy_result(clipboard, proxy, state),
    }
}
