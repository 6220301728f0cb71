//! Calendar data types: events, day keys and displayed months.

use std::fmt;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CalendarError;
use crate::meeting::{self, MeetingLink};

/// Calendar event as handed over by the event store.
///
/// Read-only for the core: events are grouped and inspected, never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub identifier: String,
    #[serde(default)]
    pub title: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default)]
    pub calendar_color: String,
    #[serde(default)]
    pub calendar_name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub url: Option<Url>,
}

impl CalendarEvent {
    /// Title for display, "Untitled" when the store has none.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => "Untitled",
        }
    }

    /// Join link for this event, if any of its text fields carries one.
    pub fn meeting_link(&self) -> Option<MeetingLink> {
        meeting::meeting_link(
            self.url.as_ref(),
            self.notes.as_deref(),
            self.location.as_deref(),
        )
    }

    /// Whether the event intersects the half-open range `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && (self.end > start || (self.end == self.start && self.start >= start))
    }
}

/// A local calendar date used to group events and address grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Day of month, 1-based.
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    /// The following calendar day.
    pub fn next(&self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }

    /// `yyyy/MM/dd`, the form hosts use to deep-link into a calendar app.
    pub fn path_segment(&self) -> String {
        self.0.format("%Y/%m/%d").to_string()
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// The month shown in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DisplayedMonth {
    first: NaiveDate,
}

impl DisplayedMonth {
    /// Month by number (1 = January). `None` for an invalid month or year.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self { first })
    }

    /// The month a date belongs to.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first: date - Days::new(u64::from(date.day0())),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> DayKey {
        DayKey(self.first)
    }

    /// First day of the following month (the exclusive end of this one).
    pub fn first_day_of_next(&self) -> Result<DayKey, CalendarError> {
        self.next().map(|m| m.first_day())
    }

    pub fn last_day(&self) -> Result<DayKey, CalendarError> {
        let next = self.first_day_of_next()?;
        next.0
            .pred_opt()
            .map(DayKey)
            .ok_or_else(|| CalendarError::unresolvable(format!("last day of {}", self)))
    }

    pub fn next(&self) -> Result<Self, CalendarError> {
        self.first
            .checked_add_months(Months::new(1))
            .map(|first| Self { first })
            .ok_or_else(|| CalendarError::unresolvable(format!("month after {}", self)))
    }

    pub fn previous(&self) -> Result<Self, CalendarError> {
        self.first
            .checked_sub_months(Months::new(1))
            .map(|first| Self { first })
            .ok_or_else(|| CalendarError::unresolvable(format!("month before {}", self)))
    }

    pub fn contains(&self, day: DayKey) -> bool {
        day.0.year() == self.first.year() && day.0.month() == self.first.month()
    }
}

impl From<DayKey> for DisplayedMonth {
    fn from(day: DayKey) -> Self {
        Self::containing(day.0)
    }
}

impl fmt::Display for DisplayedMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first.format("%B %Y"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> DayKey {
        DayKey::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn test_event_from_json() {
        let json = r##"{
            "identifier": "evt-1",
            "title": "Standup",
            "start": "2024-03-04T09:00:00Z",
            "end": "2024-03-04T09:15:00Z",
            "calendar_color": "#1BADF8",
            "calendar_name": "Work",
            "url": "https://meet.google.com/abc-defg-hij"
        }"##;

        let event: CalendarEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.identifier, "evt-1");
        assert_eq!(event.calendar_color, "#1BADF8");
        assert_eq!(event.display_title(), "Standup");
        assert!(!event.is_all_day);
        assert!(event.notes.is_none());
        assert_eq!(event.url.as_ref().unwrap().host_str(), Some("meet.google.com"));
    }

    #[test]
    fn test_display_title_falls_back() {
        let json = r#"{
            "identifier": "evt-2",
            "start": "2024-03-04T09:00:00Z",
            "end": "2024-03-04T10:00:00Z"
        }"#;
        let mut event: CalendarEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.display_title(), "Untitled");

        event.title = Some("  ".to_string());
        assert_eq!(event.display_title(), "Untitled");
    }

    #[test]
    fn test_overlaps_half_open() {
        let json = r#"{
            "identifier": "evt-3",
            "start": "2024-03-04T09:00:00Z",
            "end": "2024-03-04T10:00:00Z"
        }"#;
        let event: CalendarEvent = serde_json::from_str(json).unwrap();
        let at = |s: &str| DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc);

        assert!(event.overlaps(at("2024-03-04T00:00:00Z"), at("2024-03-05T00:00:00Z")));
        assert!(!event.overlaps(at("2024-03-04T10:00:00Z"), at("2024-03-05T00:00:00Z")));
        assert!(!event.overlaps(at("2024-03-03T00:00:00Z"), at("2024-03-04T09:00:00Z")));
    }

    #[test]
    fn test_day_key_formats() {
        let d = day(2024, 3, 9);
        assert_eq!(d.to_string(), "2024-03-09");
        assert_eq!(d.path_segment(), "2024/03/09");
        assert_eq!(d.day(), 9);
        assert_eq!(d.weekday(), Weekday::Sat);
        assert_eq!(d.next(), Some(day(2024, 3, 10)));
    }

    #[test]
    fn test_displayed_month_bounds() {
        let feb = DisplayedMonth::new(2024, 2).unwrap();
        assert_eq!(feb.first_day(), day(2024, 2, 1));
        assert_eq!(feb.last_day().unwrap(), day(2024, 2, 29));
        assert_eq!(feb.first_day_of_next().unwrap(), day(2024, 3, 1));
        assert_eq!(feb.to_string(), "February 2024");

        assert!(DisplayedMonth::new(2024, 13).is_none());
        assert!(DisplayedMonth::new(2024, 0).is_none());
    }

    #[test]
    fn test_displayed_month_navigation_wraps_years() {
        let dec = DisplayedMonth::new(2023, 12).unwrap();
        let jan = dec.next().unwrap();
        assert_eq!((jan.year(), jan.month()), (2024, 1));
        assert_eq!(jan.previous().unwrap(), dec);
    }

    #[test]
    fn test_displayed_month_containing() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let month = DisplayedMonth::containing(date);
        assert_eq!(month, DisplayedMonth::new(2024, 3).unwrap());
        assert!(month.contains(day(2024, 3, 1)));
        assert!(month.contains(day(2024, 3, 31)));
        assert!(!month.contains(day(2024, 4, 1)));
        assert!(!month.contains(day(2023, 3, 15)));
    }

    #[test]
    fn test_month_at_calendar_edge_is_unresolvable() {
        let last = DisplayedMonth::containing(NaiveDate::MAX);
        assert!(matches!(last.next(), Err(CalendarError::Unresolvable(_))));
        assert!(last.first_day_of_next().is_err());
    }
}
