//! In-memory cache of the displayed month's events.
//!
//! The cache holds exactly one fetched range, grouped by local day. A refresh
//! replaces it wholesale; a newer refresh cancels and supersedes an older one,
//! so results for a month the user already navigated away from are dropped.

use std::collections::HashMap;
use std::sync::Arc;

use calendario_core::CalendarConfig;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::access::{AccessState, AccessTracker};
use crate::error::CalendarError;
use crate::grid::LocalCalendar;
use crate::store::EventStore;
use crate::types::{CalendarEvent, DayKey, DisplayedMonth};

const DEFAULT_BUFFER_DAYS: u32 = 7;

/// Events of one fetched range, grouped by local day.
#[derive(Debug, Clone, Default)]
pub struct MonthCache {
    month: Option<DisplayedMonth>,
    range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    days: HashMap<DayKey, Vec<CalendarEvent>>,
}

impl MonthCache {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Group events by the local day they start on.
    ///
    /// Within a day events are ordered by start; events starting at the same
    /// instant keep the order the store returned them in.
    pub fn build(
        month: DisplayedMonth,
        range: (DateTime<Utc>, DateTime<Utc>),
        events: Vec<CalendarEvent>,
        calendar: &LocalCalendar,
    ) -> Self {
        let mut days: HashMap<DayKey, Vec<CalendarEvent>> = HashMap::new();
        for event in events {
            days.entry(calendar.day_key(event.start))
                .or_default()
                .push(event);
        }
        for day_events in days.values_mut() {
            day_events.sort_by_key(|e| e.start);
        }

        Self {
            month: Some(month),
            range: Some(range),
            days,
        }
    }

    /// Month this cache was fetched for, `None` before the first fetch.
    pub fn month(&self) -> Option<DisplayedMonth> {
        self.month
    }

    pub fn range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.range
    }

    pub fn events_on(&self, day: DayKey) -> &[CalendarEvent] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has_events(&self, day: DayKey) -> bool {
        !self.events_on(day).is_empty()
    }

    /// Days with at least one event, in calendar order.
    pub fn days_with_events(&self) -> Vec<DayKey> {
        let mut days: Vec<DayKey> = self.days.keys().copied().collect();
        days.sort();
        days
    }

    pub fn event_count(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Loading/error signal for presentation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStatus {
    /// A refresh for `requested` is in flight.
    pub loading: bool,
    /// Failure of the latest refresh, cleared by the next success.
    pub last_error: Option<CalendarError>,
    /// Month of the most recent refresh request.
    pub requested: Option<DisplayedMonth>,
    /// Month the cached events belong to.
    pub loaded: Option<DisplayedMonth>,
    /// Bumped every time the cache contents are replaced.
    pub revision: u64,
}

/// What a single refresh call ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Applied { month: DisplayedMonth, events: usize },
    /// Access was not granted; nothing was fetched.
    Skipped(AccessState),
    /// A newer refresh took over before this one finished.
    Superseded,
    /// The fetch failed; previous contents are kept.
    Failed(CalendarError),
}

struct CacheSlot {
    ticket: u64,
    cancel: CancellationToken,
    contents: Arc<MonthCache>,
}

impl CacheSlot {
    fn next_ticket(&mut self) -> u64 {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.ticket += 1;
        self.ticket
    }
}

/// Settles the loading flag if a refresh future is dropped mid-fetch.
struct PendingRefresh<'a> {
    cache: &'a EventCache,
    ticket: u64,
    month: DisplayedMonth,
    armed: bool,
}

impl PendingRefresh<'_> {
    fn resolved(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingRefresh<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.cache.abandon(self.ticket, self.month);
        }
    }
}

/// Month-keyed event cache shared between the host and presentation.
pub struct EventCache {
    store: Arc<dyn EventStore>,
    access: Arc<AccessTracker>,
    calendar: LocalCalendar,
    buffer_days: u32,
    slot: RwLock<CacheSlot>,
    status: watch::Sender<CacheStatus>,
}

impl EventCache {
    pub fn new(
        store: Arc<dyn EventStore>,
        access: Arc<AccessTracker>,
        calendar: LocalCalendar,
    ) -> Self {
        let (status, _) = watch::channel(CacheStatus::default());
        Self {
            store,
            access,
            calendar,
            buffer_days: DEFAULT_BUFFER_DAYS,
            slot: RwLock::new(CacheSlot {
                ticket: 0,
                cancel: CancellationToken::new(),
                contents: Arc::new(MonthCache::empty()),
            }),
            status,
        }
    }

    /// Build a cache using the calendar settings from the app config.
    ///
    /// # Errors
    /// Returns `UnknownTimeZone` if the configured zone does not exist.
    pub fn from_config(
        store: Arc<dyn EventStore>,
        access: Arc<AccessTracker>,
        config: &CalendarConfig,
    ) -> Result<Self, CalendarError> {
        let calendar = LocalCalendar::from_config(config)?;
        Ok(Self::new(store, access, calendar).with_buffer_days(config.fetch_buffer_days))
    }

    pub fn with_buffer_days(mut self, buffer_days: u32) -> Self {
        self.buffer_days = buffer_days;
        self
    }

    pub fn calendar(&self) -> &LocalCalendar {
        &self.calendar
    }

    pub fn access(&self) -> &Arc<AccessTracker> {
        &self.access
    }

    /// Fetch the month (plus buffer days) and replace the cache with it.
    ///
    /// Does nothing unless access is granted. Failures keep the previous
    /// contents and are reported through [`CacheStatus::last_error`]. Every
    /// call supersedes the refresh in flight, even one that fetches nothing.
    #[instrument(skip(self), level = "info")]
    pub async fn refresh(&self, month: DisplayedMonth) -> RefreshOutcome {
        let access = self.access.current();
        if !access.is_granted() {
            tracing::debug!(?access, "Skipping refresh without calendar access");
            self.supersede(month);
            return RefreshOutcome::Skipped(access);
        }

        let (start, end) = match self.calendar.fetch_range(month, self.buffer_days) {
            Ok(range) => range,
            Err(e) => {
                tracing::warn!("Cannot resolve fetch range for {}: {}", month, e);
                self.supersede(month);
                return RefreshOutcome::Failed(e);
            }
        };

        let (ticket, cancel) = self.begin(month);
        let pending = PendingRefresh {
            cache: self,
            ticket,
            month,
            armed: true,
        };

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.store.fetch_events(start, end) => Some(result),
        };
        pending.resolved();

        match fetched {
            None => {
                tracing::debug!("Refresh for {} superseded while fetching", month);
                RefreshOutcome::Superseded
            }
            Some(Ok(events)) => self.apply(ticket, month, (start, end), events),
            Some(Err(e)) => self.fail(ticket, month, e),
        }
    }

    /// Run [`refresh`](Self::refresh) on the tokio runtime.
    pub fn spawn_refresh(self: &Arc<Self>, month: DisplayedMonth) -> JoinHandle<RefreshOutcome> {
        let cache = Arc::clone(self);
        tokio::spawn(async move { cache.refresh(month).await })
    }

    /// Events on a local day, ordered by start. Never fetches.
    pub fn events_on(&self, day: DayKey) -> Vec<CalendarEvent> {
        self.slot.read().contents.events_on(day).to_vec()
    }

    /// Events on the local day containing `instant`.
    pub fn events_at(&self, instant: DateTime<Utc>) -> Vec<CalendarEvent> {
        self.events_on(self.calendar.day_key(instant))
    }

    pub fn has_events(&self, day: DayKey) -> bool {
        self.slot.read().contents.has_events(day)
    }

    /// Current contents; stays valid after later refreshes replace them.
    pub fn snapshot(&self) -> Arc<MonthCache> {
        Arc::clone(&self.slot.read().contents)
    }

    pub fn status(&self) -> CacheStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CacheStatus> {
        self.status.subscribe()
    }

    /// Take a new ticket, cancelling whatever refresh was in flight.
    fn begin(&self, month: DisplayedMonth) -> (u64, CancellationToken) {
        let mut slot = self.slot.write();
        let ticket = slot.next_ticket();

        self.status.send_modify(|status| {
            status.loading = true;
            status.requested = Some(month);
        });

        (ticket, slot.cancel.clone())
    }

    /// Retire the refresh in flight without fetching anything.
    ///
    /// Status is only touched when a refresh was loading.
    fn supersede(&self, month: DisplayedMonth) {
        let mut slot = self.slot.write();
        slot.next_ticket();

        self.status.send_if_modified(|status| {
            if !status.loading {
                return false;
            }
            status.loading = false;
            status.requested = Some(month);
            true
        });
    }

    /// A refresh was dropped before resolving, e.g. by a host-side timeout.
    fn abandon(&self, ticket: u64, month: DisplayedMonth) {
        let slot = self.slot.read();
        if slot.ticket != ticket {
            return;
        }

        tracing::warn!("Refresh for {} dropped before it finished", month);
        self.status.send_modify(|status| {
            status.loading = false;
            status.last_error = Some(CalendarError::store(format!(
                "refresh for {} was cancelled",
                month
            )));
        });
    }

    fn apply(
        &self,
        ticket: u64,
        month: DisplayedMonth,
        range: (DateTime<Utc>, DateTime<Utc>),
        events: Vec<CalendarEvent>,
    ) -> RefreshOutcome {
        let count = events.len();
        let contents = MonthCache::build(month, range, events, &self.calendar);

        let mut slot = self.slot.write();
        if slot.ticket != ticket {
            tracing::debug!("Dropping stale events for {}", month);
            return RefreshOutcome::Superseded;
        }
        slot.contents = Arc::new(contents);

        self.status.send_modify(|status| {
            status.loading = false;
            status.last_error = None;
            status.loaded = Some(month);
            status.revision += 1;
        });

        tracing::info!(
            "Cached {} events across {} days for {}",
            count,
            slot.contents.days.len(),
            month
        );
        RefreshOutcome::Applied {
            month,
            events: count,
        }
    }

    fn fail(&self, ticket: u64, month: DisplayedMonth, error: CalendarError) -> RefreshOutcome {
        if error == CalendarError::AccessDenied {
            self.access.mark_revoked();
        }

        let slot = self.slot.read();
        if slot.ticket != ticket {
            tracing::debug!("Ignoring failure of superseded refresh for {}: {}", month, error);
            return RefreshOutcome::Superseded;
        }

        tracing::warn!("Refresh for {} failed, keeping cached events: {}", month, error);
        self.status.send_modify(|status| {
            status.loading = false;
            status.last_error = Some(error.clone());
        });

        RefreshOutcome::Failed(error)
    }
}
