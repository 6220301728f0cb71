//! Centralized error types for Calendario.
//!
//! The hierarchy mirrors how failures surface in the menu-bar UI:
//! - Permission problems gate fetching and show a persistent banner
//! - Fetch problems keep stale data and show a transient indicator
//! - Resolution problems degrade to an empty result and are only logged

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a UI-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Permission error: {0}")]
    Permission(#[from] PermissionError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Calendar resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Permission(e) => e.user_message(),
            AppError::Fetch(e) => e.user_message(),
            AppError::Resolution(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }

    /// Whether the UI should keep showing this until access changes.
    pub fn is_persistent(&self) -> bool {
        matches!(self, AppError::Permission(_))
    }
}

/// Calendar access was not granted.
#[derive(Debug, Error)]
pub enum PermissionError {
    #[error("Calendar access denied")]
    Denied,

    #[error("Calendar access has not been determined yet")]
    NotDetermined,

    #[error("Calendar access request failed: {0}")]
    RequestFailed(String),
}

impl PermissionError {
    pub fn user_message(&self) -> &'static str {
        match self {
            PermissionError::Denied => "No calendar access. Grant access in System Settings.",
            PermissionError::NotDetermined => "Waiting for calendar access.",
            PermissionError::RequestFailed(_) => {
                "Could not request calendar access. Please try again."
            }
        }
    }
}

/// The event store failed to produce events.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Event store failure: {0}")]
    Store(String),

    #[error("Fetch timed out after {0} seconds")]
    Timeout(u64),
}

impl FetchError {
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::Store(_) => "Couldn't load events. Showing last known data.",
            FetchError::Timeout(_) => "Loading events is taking too long. Showing last known data.",
        }
    }
}

/// A date or interval could not be resolved in the local calendar.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("Unresolvable date: {0}")]
    Unresolvable(String),

    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),
}

impl ResolutionError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ResolutionError::Unresolvable(_) => "This date can't be shown.",
            ResolutionError::UnknownTimeZone(_) => "Unknown time zone. Check your settings.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "Configuration not found. Using defaults.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_non_empty() {
        let errors = vec![
            AppError::from(PermissionError::Denied),
            AppError::from(PermissionError::NotDetermined),
            AppError::from(FetchError::Store("boom".into())),
            AppError::from(FetchError::Timeout(10)),
            AppError::from(ResolutionError::Unresolvable("x".into())),
            AppError::from(ConfigError::Invalid("x".into())),
        ];

        for err in errors {
            assert!(!err.user_message().is_empty(), "empty message for {:?}", err);
        }
    }

    #[test]
    fn test_only_permission_errors_are_persistent() {
        assert!(AppError::from(PermissionError::Denied).is_persistent());
        assert!(!AppError::from(FetchError::Timeout(5)).is_persistent());
        assert!(!AppError::from(ResolutionError::UnknownTimeZone("Mars/Base".into())).is_persistent());
    }

    #[test]
    fn test_display_keeps_detail() {
        let err = AppError::from(FetchError::Store("adapter exploded".into()));
        assert!(err.to_string().contains("adapter exploded"));
    }
}
