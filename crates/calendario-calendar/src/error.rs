//! Calendar-specific error types.

use std::time::Duration;

use calendario_core::{AppError, FetchError, PermissionError, ResolutionError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Calendar access denied")]
    AccessDenied,

    #[error("Calendar access not determined")]
    AccessNotDetermined,

    #[error("Access request failed: {0}")]
    AccessRequestFailed(String),

    #[error("Event store error: {0}")]
    Store(String),

    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unresolvable date: {0}")]
    Unresolvable(String),

    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),
}

impl CalendarError {
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    pub fn unresolvable(message: impl Into<String>) -> Self {
        Self::Unresolvable(message.into())
    }

    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> String {
        match self {
            Self::AccessDenied => "No calendar access".to_string(),
            Self::AccessNotDetermined => "Waiting for calendar access".to_string(),
            Self::AccessRequestFailed(_) => "Couldn't request calendar access".to_string(),
            Self::Store(_) => "Couldn't load events".to_string(),
            Self::Timeout(d) => format!("Loading events timed out after {}s", d.as_secs()),
            Self::Unresolvable(_) => "This date can't be shown".to_string(),
            Self::UnknownTimeZone(name) => format!("Unknown time zone: {}", name),
        }
    }

    /// Whether this error means access is missing rather than a failed fetch.
    pub fn is_permission(&self) -> bool {
        matches!(
            self,
            Self::AccessDenied | Self::AccessNotDetermined | Self::AccessRequestFailed(_)
        )
    }

    /// Whether trying the same fetch again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Timeout(_))
    }
}

impl From<CalendarError> for AppError {
    fn from(e: CalendarError) -> Self {
        match e {
            CalendarError::AccessDenied => AppError::Permission(PermissionError::Denied),
            CalendarError::AccessNotDetermined => {
                AppError::Permission(PermissionError::NotDetermined)
            }
            CalendarError::AccessRequestFailed(s) => {
                AppError::Permission(PermissionError::RequestFailed(s))
            }
            CalendarError::Store(s) => AppError::Fetch(FetchError::Store(s)),
            CalendarError::Timeout(d) => AppError::Fetch(FetchError::Timeout(d.as_secs())),
            CalendarError::Unresolvable(s) => {
                AppError::Resolution(ResolutionError::Unresolvable(s))
            }
            CalendarError::UnknownTimeZone(s) => {
                AppError::Resolution(ResolutionError::UnknownTimeZone(s))
            }
        }
    }
}
