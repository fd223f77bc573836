//! Single-slot user alert
//!
//! Holds at most one user-facing alert. Raising replaces the content and
//! shows it in one step; dismissing only hides it. The presentation layer
//! observes the slot through a `watch` receiver.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Content and visibility of the alert dialog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct AlertState {
    pub(crate) title: String,
    pub(crate) message: String,
    pub(crate) action_text: String,
    pub(crate) visible: bool,
}

/// Shared handle to the alert slot
///
/// Cloning yields another handle to the same slot.
#[derive(Debug, Clone)]
pub(crate) struct AlertChannel {
    slot: Arc<watch::Sender<AlertState>>,
}

impl AlertChannel {
    pub(crate) fn new() -> Self {
        let (slot, _) = watch::channel(AlertState::default());
        Self {
            slot: Arc::new(slot),
        }
    }

    /// Replace the alert content and make it visible.
    ///
    /// Any alert that is still showing is discarded.
    pub(crate) fn raise(&self, title: &str, message: &str, action_text: &str) {
        info!(title = %title, message = %message, "Raising user alert");
        self.slot.send_modify(|state| {
            state.title = title.to_string();
            state.message = message.to_string();
            state.action_text = action_text.to_string();
            state.visible = true;
        });
    }

    /// Hide the alert, keeping its content until the next `raise`.
    pub(crate) fn dismiss(&self) {
        self.slot.send_modify(|state| state.visible = false);
    }

    /// Current alert state
    pub(crate) fn current(&self) -> AlertState {
        self.slot.borrow().clone()
    }

    /// Subscribe to alert changes
    pub(crate) fn subscribe(&self) -> watch::Receiver<AlertState> {
        self.slot.subscribe()
    }
}

impl Default for AlertChannel {
    fn default() -> Self {
        Self::new()
    }
}
