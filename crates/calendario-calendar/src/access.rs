//! Calendar permission state.

use tokio::sync::watch;
use tracing::instrument;

use crate::error::CalendarError;
use crate::store::EventStore;

/// Whether the core may read calendar events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessState {
    #[default]
    Unknown,
    Granted,
    Denied,
}

impl AccessState {
    pub fn is_granted(self) -> bool {
        matches!(self, AccessState::Granted)
    }

    /// The error a blocked fetch reports for this state, `None` when granted.
    pub fn as_error(self) -> Option<CalendarError> {
        match self {
            AccessState::Granted => None,
            AccessState::Unknown => Some(CalendarError::AccessNotDetermined),
            AccessState::Denied => Some(CalendarError::AccessDenied),
        }
    }
}

/// Owns the current [`AccessState`] and publishes every change.
#[derive(Debug)]
pub struct AccessTracker {
    state: watch::Sender<AccessState>,
}

impl Default for AccessTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessTracker {
    pub fn new() -> Self {
        let (state, _) = watch::channel(AccessState::Unknown);
        Self { state }
    }

    pub fn current(&self) -> AccessState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AccessState> {
        self.state.subscribe()
    }

    /// Ask the store for access and record the answer.
    ///
    /// The state goes back to `Unknown` while the request is pending, so a
    /// re-request after the user changed system settings is observable.
    #[instrument(skip(self, store), level = "info")]
    pub async fn request(&self, store: &dyn EventStore) -> AccessState {
        self.state.send_replace(AccessState::Unknown);

        let resolved = match store.request_access().await {
            Ok(true) => AccessState::Granted,
            Ok(false) => {
                tracing::info!("Calendar access denied by user");
                AccessState::Denied
            }
            Err(e) => {
                tracing::warn!("Calendar access request failed: {}", e);
                AccessState::Denied
            }
        };

        self.state.send_replace(resolved);
        resolved
    }

    /// Record an answer the host obtained on its own.
    pub fn resolve(&self, granted: bool) -> AccessState {
        let state = if granted {
            AccessState::Granted
        } else {
            AccessState::Denied
        };
        self.state.send_replace(state);
        state
    }

    /// The store reported that access went away mid-flight.
    pub fn mark_revoked(&self) {
        let previous = self.state.send_replace(AccessState::Denied);
        if previous != AccessState::Denied {
            tracing::warn!("Calendar access revoked");
        }
    }
}
