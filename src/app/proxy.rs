//! Defines an abstraction over the event sending mechanism.

use super::events::UserEvent;
use std::sync::mpsc::Sender;

/// A trait that abstracts the sending of user events.
/// This is "fire-and-forget" and doesn't return a result, simplifying its use.
pub trait EventProxy: Send + Sync + Clone + 'static {
    fn send_event(&self, event: UserEvent);
}

/// Channel-backed proxy, used by the command-line driver.
impl EventProxy for Sender<UserEvent> {
    fn send_event(&self, event: UserEvent) {
        // A dropped receiver only means nobody is listening anymore.
        if let Err(e) = self.send(event) {
            tracing::warn!("Failed to deliver event: {}", e);
        }
    }
}
