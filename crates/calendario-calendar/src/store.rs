//! The event store contract the core consumes.
//!
//! Hosts implement [`EventStore`] on top of their platform calendar API. The
//! core only ever reads through it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CalendarError;
use crate::types::CalendarEvent;

/// Host calendar API as seen by the core.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Ask the user or OS for read access to calendar events.
    ///
    /// # Errors
    /// Returns an error if the request itself could not be made.
    async fn request_access(&self) -> Result<bool, CalendarError>;

    /// All events overlapping the half-open range `[start, end)`, including
    /// all-day events and expanded recurrence instances.
    ///
    /// # Errors
    /// Returns `AccessDenied` if access was revoked, or a store error.
    async fn fetch_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, CalendarError>;
}

#[async_trait]
impl<S: EventStore + ?Sized> EventStore for Arc<S> {
    async fn request_access(&self) -> Result<bool, CalendarError> {
        (**self).request_access().await
    }

    async fn fetch_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        (**self).fetch_events(start, end).await
    }
}

/// Wraps a store so that slow fetches fail with [`CalendarError::Timeout`].
///
/// Access requests are not limited, since they usually wait on the user.
pub struct TimeoutStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S: EventStore> TimeoutStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S: EventStore> EventStore for TimeoutStore<S> {
    async fn request_access(&self) -> Result<bool, CalendarError> {
        self.inner.request_access().await
    }

    async fn fetch_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        match tokio::time::timeout(self.timeout, self.inner.fetch_events(start, end)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Event fetch exceeded {:?}", self.timeout);
                Err(CalendarError::Timeout(self.timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    struct SlowStore {
        delay: Duration,
    }

    #[async_trait]
    impl EventStore for SlowStore {
        async fn request_access(&self) -> Result<bool, CalendarError> {
            tokio::time::sleep(self.delay).await;
            Ok(true)
        }

        async fn fetch_events(
            &self,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Vec<CalendarEvent>, CalendarError> {
            tokio::time::sleep(self.delay).await;
            Ok(Vec::new())
        }
    }

    fn range() -> (DateTime<Utc>, DateTime<Utc>) {
        let start = DateTime::parse_from_rfc3339("2024-03-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        (start, start + chrono::Duration::days(31))
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_times_out() {
        let store = TimeoutStore::new(
            SlowStore { delay: Duration::from_secs(30) },
            Duration::from_secs(5),
        );
        let (start, end) = range();

        let result = store.fetch_events(start, end).await;

        assert_eq!(result, Err(CalendarError::Timeout(Duration::from_secs(5))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_fetch_passes_through() {
        let store = TimeoutStore::new(
            SlowStore { delay: Duration::from_millis(10) },
            Duration::from_secs(5),
        );
        let (start, end) = range();

        assert_eq!(store.fetch_events(start, end).await, Ok(Vec::new()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_access_request_is_not_limited() {
        let store = TimeoutStore::new(
            SlowStore { delay: Duration::from_secs(60) },
            Duration::from_secs(1),
        );

        assert_eq!(store.request_access().await, Ok(true));
    }

    #[tokio::test]
    async fn test_arc_store_delegates() {
        let store: Arc<dyn EventStore> = Arc::new(SlowStore { delay: Duration::ZERO });
        let (start, end) = range();

        assert_eq!(store.request_access().await, Ok(true));
        assert!(store.fetch_events(start, end).await.unwrap().is_empty());
    }
}
