//! Event store backed by a JSON file, for running without a platform calendar.
//!
//! The file is either a plain array of events or an object:
//!
//! ```json
//! { "access_granted": true, "events": [ ... ] }
//! ```
//!
//! It is re-read on every fetch, so edits show up on the next refresh.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use calendario_calendar::{CalendarError, CalendarEvent, EventStore};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default = "default_access_granted")]
    access_granted: bool,
    #[serde(default)]
    events: Vec<CalendarEvent>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            access_granted: default_access_granted(),
            events: Vec::new(),
        }
    }
}

fn default_access_granted() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FixtureFile {
    Events(Vec<CalendarEvent>),
    Full(Fixture),
}

impl From<FixtureFile> for Fixture {
    fn from(file: FixtureFile) -> Self {
        match file {
            FixtureFile::Events(events) => Fixture {
                events,
                ..Fixture::default()
            },
            FixtureFile::Full(fixture) => fixture,
        }
    }
}

fn parse(text: &str) -> Result<Fixture, CalendarError> {
    serde_json::from_str::<FixtureFile>(text)
        .map(Fixture::from)
        .map_err(|e| CalendarError::store(format!("invalid fixture: {}", e)))
}

/// [`EventStore`] serving events from a JSON file.
#[derive(Debug, Default)]
pub struct FixtureStore {
    path: Option<PathBuf>,
}

impl FixtureStore {
    /// A store with no events that grants access.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Open a fixture file, checking that it parses.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let store = Self { path: Some(path) };
        let fixture = store
            .load()
            .await
            .with_context(|| format!("Failed to load fixture {}", store.describe()))?;

        tracing::info!(
            "Loaded {} fixture events from {}",
            fixture.events.len(),
            store.describe()
        );
        Ok(store)
    }

    fn describe(&self) -> String {
        self.path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<empty>".to_string())
    }

    async fn load(&self) -> Result<Fixture, CalendarError> {
        let Some(path) = &self.path else {
            return Ok(Fixture::default());
        };
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CalendarError::store(format!("{}: {}", path.display(), e)))?;
        parse(&text)
    }
}

#[async_trait]
impl EventStore for FixtureStore {
    async fn request_access(&self) -> Result<bool, CalendarError> {
        Ok(self.load().await?.access_granted)
    }

    async fn fetch_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        let fixture = self.load().await?;
        if !fixture.access_granted {
            return Err(CalendarError::AccessDenied);
        }

        let events: Vec<CalendarEvent> = fixture
            .events
            .into_iter()
            .filter(|e| e.overlaps(start, end))
            .collect();
        tracing::debug!("Fixture returned {} events for {} - {}", events.len(), start, end);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    use std::io::Write;

    use tempfile::NamedTempFile;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn write_fixture(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    const EVENTS: &str = r#"[
        {"identifier": "a", "title": "Standup", "start": "2024-03-04T09:00:00Z", "end": "2024-03-04T09:15:00Z"},
        {"identifier": "b", "title": "Offsite", "start": "2024-04-20T09:00:00Z", "end": "2024-04-20T17:00:00Z"}
    ]"#;

    #[tokio::test]
    async fn test_plain_array_fixture() {
        let file = write_fixture(EVENTS);
        let store = FixtureStore::open(file.path()).await.unwrap();

        assert_eq!(store.request_access().await, Ok(true));
        let events = store
            .fetch_events(utc("2024-03-01T00:00:00Z"), utc("2024-04-01T00:00:00Z"))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].identifier, "a");
    }

    #[tokio::test]
    async fn test_denied_fixture() {
        let file = write_fixture(r#"{"access_granted": false, "events": []}"#);
        let store = FixtureStore::open(file.path()).await.unwrap();

        assert_eq!(store.request_access().await, Ok(false));
        let result = store
            .fetch_events(utc("2024-03-01T00:00:00Z"), utc("2024-04-01T00:00:00Z"))
            .await;
        assert_eq!(result, Err(CalendarError::AccessDenied));
    }

    #[tokio::test]
    async fn test_invalid_fixture_fails_to_open() {
        let file = write_fixture("{ not json");
        assert!(FixtureStore::open(file.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_a_store_error() {
        let store = FixtureStore {
            path: Some(PathBuf::from("/nonexistent/calendario/events.json")),
        };
        let result = store
            .fetch_events(utc("2024-03-01T00:00:00Z"), utc("2024-04-01T00:00:00Z"))
            .await;
        assert!(matches!(result, Err(CalendarError::Store(_))));
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = FixtureStore::empty();
        assert_eq!(store.request_access().await, Ok(true));
        assert!(store
            .fetch_events(utc("2024-03-01T00:00:00Z"), utc("2024-04-01T00:00:00Z"))
            .await
            .unwrap()
            .is_empty());
    }
}
