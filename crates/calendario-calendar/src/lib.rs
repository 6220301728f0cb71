//! Calendar core for Calendario.
//!
//! Builds the month grid, caches the displayed month's events and finds
//! meeting links. Platform calendars plug in through [`EventStore`].

pub mod access;
pub mod cache;
pub mod error;
pub mod grid;
pub mod meeting;
pub mod navigation;
pub mod store;
pub mod types;

pub use access::{AccessState, AccessTracker};
pub use cache::{CacheStatus, EventCache, MonthCache, RefreshOutcome};
pub use error::CalendarError;
pub use grid::{is_in_displayed_month, GridCell, LocalCalendar, Zone, GRID_DAYS};
pub use meeting::{MeetingLink, Provider};
pub use navigation::MonthNavigator;
pub use store::{EventStore, TimeoutStore};
pub use types::{CalendarEvent, DayKey, DisplayedMonth};
