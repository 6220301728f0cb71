//! Month grid generation and local-day resolution.
//!
//! Every conversion between absolute instants and calendar days goes through
//! [`LocalCalendar`], so grid cells and grouped events always agree on which
//! day an instant belongs to.

use std::fmt::Display;

use calendario_core::CalendarConfig;
use chrono::{Datelike, DateTime, Days, Duration, Local, NaiveDate, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

use crate::error::CalendarError;
use crate::types::{CalendarEvent, DayKey, DisplayedMonth};

/// Six full weeks, so the grid is always rectangular.
pub const GRID_DAYS: usize = 42;

const WEEKDAY_SYMBOLS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Time zone used to resolve local days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// Whatever the host reports as local time.
    System,
    Named(Tz),
}

impl Zone {
    /// `None` or a blank name selects the system zone.
    pub fn from_name(name: Option<&str>) -> Result<Self, CalendarError> {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            None => Ok(Zone::System),
            Some(name) => name
                .parse::<Tz>()
                .map(Zone::Named)
                .map_err(|_| CalendarError::UnknownTimeZone(name.to_string())),
        }
    }
}

/// One cell of the month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub day: DayKey,
    pub in_displayed_month: bool,
    pub is_today: bool,
}

/// Calendar rules for the grid: which zone defines a day and which weekday starts a week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalCalendar {
    zone: Zone,
    week_start: Weekday,
}

impl Default for LocalCalendar {
    fn default() -> Self {
        Self::new(Zone::System, Weekday::Sun)
    }
}

impl LocalCalendar {
    pub fn new(zone: Zone, week_start: Weekday) -> Self {
        Self { zone, week_start }
    }

    pub fn from_config(config: &CalendarConfig) -> Result<Self, CalendarError> {
        let zone = Zone::from_name(config.time_zone_name())?;
        Ok(Self::new(zone, config.week_start.to_weekday()))
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    /// The local calendar day an instant falls on.
    pub fn day_key(&self, instant: DateTime<Utc>) -> DayKey {
        let date = match self.zone {
            Zone::System => instant.with_timezone(&Local).date_naive(),
            Zone::Named(tz) => instant.with_timezone(&tz).date_naive(),
        };
        DayKey::new(date)
    }

    pub fn today(&self) -> DayKey {
        self.day_key(Utc::now())
    }

    /// Month containing the current local day.
    pub fn current_month(&self) -> DisplayedMonth {
        DisplayedMonth::from(self.today())
    }

    pub fn is_today(&self, day: DayKey) -> bool {
        self.is_today_at(day, Utc::now())
    }

    pub fn is_today_at(&self, day: DayKey, now: DateTime<Utc>) -> bool {
        self.day_key(now) == day
    }

    /// First instant of a local day.
    ///
    /// When midnight does not exist (DST gap), the first valid local time after it is used.
    pub fn start_of_day(&self, day: DayKey) -> Result<DateTime<Utc>, CalendarError> {
        let instant = match self.zone {
            Zone::System => first_instant_of(&Local, day.date()),
            Zone::Named(tz) => first_instant_of(&tz, day.date()),
        };
        instant.ok_or_else(|| CalendarError::unresolvable(format!("start of {}", day)))
    }

    /// Half-open instant range covering the month plus `buffer_days` on each side.
    pub fn fetch_range(
        &self,
        month: DisplayedMonth,
        buffer_days: u32,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), CalendarError> {
        let buffer = Days::new(u64::from(buffer_days));
        let first = month
            .first_day()
            .date()
            .checked_sub_days(buffer)
            .ok_or_else(|| CalendarError::unresolvable(format!("fetch start for {}", month)))?;
        let end = month
            .first_day_of_next()?
            .date()
            .checked_add_days(buffer)
            .ok_or_else(|| CalendarError::unresolvable(format!("fetch end for {}", month)))?;

        Ok((
            self.start_of_day(DayKey::new(first))?,
            self.start_of_day(DayKey::new(end))?,
        ))
    }

    /// The 42 consecutive days shown for a month, starting on the first day of
    /// the week that contains the 1st.
    pub fn days_for_grid(&self, month: DisplayedMonth) -> Result<Vec<DayKey>, CalendarError> {
        let first = month.first_day().date();
        let lead = days_from_week_start(first.weekday(), self.week_start);
        let start = first
            .checked_sub_days(Days::new(lead))
            .ok_or_else(|| CalendarError::unresolvable(format!("grid start for {}", month)))?;

        let mut days = Vec::with_capacity(GRID_DAYS);
        let mut current = Some(start);
        while days.len() < GRID_DAYS {
            let day = current
                .ok_or_else(|| CalendarError::unresolvable(format!("grid for {}", month)))?;
            days.push(DayKey::new(day));
            current = day.succ_opt();
        }
        Ok(days)
    }

    /// Grid days annotated for rendering.
    pub fn grid_cells(
        &self,
        month: DisplayedMonth,
        today: DayKey,
    ) -> Result<Vec<GridCell>, CalendarError> {
        Ok(self
            .days_for_grid(month)?
            .into_iter()
            .map(|day| GridCell {
                day,
                in_displayed_month: is_in_displayed_month(day, month),
                is_today: day == today,
            })
            .collect())
    }

    /// Column headers, starting at the configured week start.
    pub fn weekday_symbols(&self) -> [&'static str; 7] {
        let offset = self.week_start.num_days_from_sunday() as usize;
        std::array::from_fn(|i| WEEKDAY_SYMBOLS[(i + offset) % 7])
    }

    /// "All day", or the local start and end times like "9:00 AM - 10:30 AM".
    pub fn time_range_label(&self, event: &CalendarEvent) -> String {
        if event.is_all_day {
            return "All day".to_string();
        }
        let (start, end) = match self.zone {
            Zone::System => (format_time(&Local, event.start), format_time(&Local, event.end)),
            Zone::Named(tz) => (format_time(&tz, event.start), format_time(&tz, event.end)),
        };
        format!("{} - {}", start, end)
    }
}

/// Whether a grid day belongs to the month being displayed.
pub fn is_in_displayed_month(day: DayKey, month: DisplayedMonth) -> bool {
    month.contains(day)
}

fn days_from_week_start(weekday: Weekday, week_start: Weekday) -> u64 {
    u64::from((7 + weekday.num_days_from_sunday() - week_start.num_days_from_sunday()) % 7)
}

fn first_instant_of<Z: TimeZone>(tz: &Z, date: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    // Gaps are at most a few hours; probe in half-hour steps.
    (0..=8).find_map(|step| {
        let local = midnight.checked_add_signed(Duration::minutes(30 * step))?;
        tz.from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

fn format_time<Z: TimeZone>(tz: &Z, instant: DateTime<Utc>) -> String
where
    Z::Offset: Display,
{
    instant.with_timezone(tz).format("%-I:%M %p").to_string()
}
