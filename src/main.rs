mod fixture_store;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use calendario_calendar::{
    AccessState, AccessTracker, DayKey, DisplayedMonth, EventCache, EventStore, MonthNavigator,
    RefreshOutcome, TimeoutStore,
};
use calendario_core::Config;
use chrono::NaiveDate;

use crate::fixture_store::FixtureStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    calendario_core::init()?;

    let (config, _validation) = Config::load_validated()?;

    let mut args = std::env::args().skip(1);
    let fixture = match args.next() {
        Some(path) => FixtureStore::open(&path).await?,
        None => FixtureStore::empty(),
    };
    let selected = args
        .next()
        .map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").map(DayKey::new))
        .transpose()
        .context("Selected day must look like 2024-03-14")?;

    let timeout = config.calendar.fetch_timeout_secs;
    let store: Arc<dyn EventStore> = if timeout > 0 {
        Arc::new(TimeoutStore::new(fixture, Duration::from_secs(timeout)))
    } else {
        Arc::new(fixture)
    };

    let access = Arc::new(AccessTracker::new());
    let cache = Arc::new(EventCache::from_config(
        Arc::clone(&store),
        Arc::clone(&access),
        &config.calendar,
    )?);

    let state = access.request(store.as_ref()).await;
    if state != AccessState::Granted && !config.ui.dismissed_access_warning {
        println!("Calendar access is not granted. Events cannot be shown.");
        println!("Grant access in your system settings, then restart Calendario.\n");
    }

    let today = cache.calendar().today();
    let mut navigator = MonthNavigator::new(today);
    if let Some(day) = selected {
        navigator.select(day);
    }

    let outcome = cache.refresh(navigator.displayed()).await;
    tracing::debug!(?outcome, "Initial refresh finished");
    if let RefreshOutcome::Failed(e) = &outcome {
        println!("{}\n", e.user_message());
    }

    print_grid(&cache, navigator.displayed(), navigator.selected(), today)?;
    print_day(&cache, navigator.selected(), &config.ui.calendar_url_scheme);

    Ok(())
}

/// Month grid with `*` on days that have events and `>` on the selected day.
fn print_grid(
    cache: &EventCache,
    month: DisplayedMonth,
    selected: DayKey,
    today: DayKey,
) -> Result<()> {
    let calendar = cache.calendar();
    let cells = calendar.grid_cells(month, today)?;

    println!("{:^28}", month.to_string());
    let header: String = calendar
        .weekday_symbols()
        .iter()
        .map(|symbol| format!(" {:<3}", symbol))
        .collect();
    println!("{}", header.trim_end());

    for week in cells.chunks(7) {
        let row: String = week
            .iter()
            .map(|cell| {
                let lead = if cell.day == selected { '>' } else { ' ' };
                let mark = if cache.has_events(cell.day) { '*' } else { ' ' };
                if cell.in_displayed_month {
                    format!("{}{:>2}{}", lead, cell.day.day(), mark)
                } else {
                    format!("{}{:>2}{}", lead, "..", mark)
                }
            })
            .collect();
        println!("{}", row.trim_end());
    }
    Ok(())
}

fn print_day(cache: &EventCache, day: DayKey, scheme: &str) {
    let calendar = cache.calendar();
    let heading = if calendar.is_today(day) {
        format!("Today, {}", day.date().format("%B %-d"))
    } else {
        day.date().format("%A, %B %-d").to_string()
    };
    println!("\n{}", heading);

    let events = cache.events_on(day);
    if events.is_empty() {
        println!("  No events");
    }
    for event in &events {
        println!(
            "  {:<22} {} ({})",
            calendar.time_range_label(event),
            event.display_title(),
            event.calendar_name
        );
        if let Some(link) = event.meeting_link() {
            println!("  {:<22} Join {}: {}", "", link.label(), link.url);
        }
    }

    if let Some(error) = cache.status().last_error {
        println!("  ({})", error.user_message());
    }
    println!("\nOpen in Calendar: {}://{}", scheme, day.path_segment());
}
