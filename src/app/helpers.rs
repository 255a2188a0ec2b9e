//! Contains helper functions to reduce boilerplate code in other `app` modules.

use std::sync::{Arc, Mutex, MutexGuard};

use super::events::UserEvent;
use super::proxy::EventProxy;
use super::state::AppState;
use super::view_model::generate_ui_state;
use crate::core::ErrorCategory;

pub fn lock_state(state: &Arc<Mutex<AppState>>) -> MutexGuard<'_, AppState> {
    state
        .lock()
        .expect("Mutex was poisoned. This should not happen.")
}

/// A helper function that locks the `AppState`, performs a mutation,
/// and then automatically sends a `StateUpdate` event to the UI.
pub fn with_state_and_notify<F, P: EventProxy>(
    state: &Arc<Mutex<AppState>>,
    proxy: &P,
    update_fn: F,
) where
    F: FnOnce(&mut AppState),
{
    let mut state_guard = lock_state(state);

    // Execute the specific mutation logic
    update_fn(&mut state_guard);

    notify(&state_guard, proxy);
}

/// Sends a `StateUpdate` for an already locked state.
pub fn notify<P: EventProxy>(state: &AppState, proxy: &P) {
    let ui_state = generate_ui_state(state);
    proxy.send_event(UserEvent::StateUpdate(Box::new(ui_state)));
}

pub fn show_error<P: EventProxy>(proxy: &P, category: ErrorCategory, message: impl Into<String>) {
    let message = message.into();
    tracing::warn!("{:?} error: {}", category, message);
    proxy.send_event(UserEvent::ShowError { category, message });
}
