//! Displayed month and selected day.

use crate::error::CalendarError;
use crate::types::{DayKey, DisplayedMonth};

/// Tracks which month is shown and which day is selected.
///
/// Operations return the new month when the displayed month changed, so the
/// host knows to refresh the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthNavigator {
    displayed: DisplayedMonth,
    selected: DayKey,
}

impl MonthNavigator {
    /// Start on today's month with today selected.
    pub fn new(today: DayKey) -> Self {
        Self {
            displayed: DisplayedMonth::from(today),
            selected: today,
        }
    }

    pub fn displayed(&self) -> DisplayedMonth {
        self.displayed
    }

    pub fn selected(&self) -> DayKey {
        self.selected
    }

    /// Select a grid day. Picking a leading or trailing cell moves to its month.
    pub fn select(&mut self, day: DayKey) -> Option<DisplayedMonth> {
        self.selected = day;
        if self.displayed.contains(day) {
            return None;
        }
        self.displayed = DisplayedMonth::from(day);
        Some(self.displayed)
    }

    pub fn next_month(&mut self, today: DayKey) -> Option<DisplayedMonth> {
        let next = self.displayed.next();
        self.move_to(next, today)
    }

    pub fn previous_month(&mut self, today: DayKey) -> Option<DisplayedMonth> {
        let previous = self.displayed.previous();
        self.move_to(previous, today)
    }

    /// Jump back to today, selecting it.
    pub fn go_to_today(&mut self, today: DayKey) -> Option<DisplayedMonth> {
        self.select(today)
    }

    fn move_to(
        &mut self,
        month: Result<DisplayedMonth, CalendarError>,
        today: DayKey,
    ) -> Option<DisplayedMonth> {
        let month = match month {
            Ok(month) => month,
            Err(e) => {
                tracing::warn!("Cannot move away from {}: {}", self.displayed, e);
                return None;
            }
        };

        self.displayed = month;
        self.selected = if month.contains(today) {
            today
        } else {
            month.first_day()
        };
        Some(month)
    }
}
