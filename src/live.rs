//! # Live Clock Display
//!
//! The always-running side of the application: hand-angle arithmetic for
//! the 24-hour dial, the 1-second refresh, and the cache-first flow that
//! puts today's prayer times on screen.
//!
//! The live refresh and the year simulation share one display surface.
//! Ownership is cooperative: while a simulation is active the refresh
//! keeps the hands moving but leaves the date text alone, so the two
//! timers never fight over what day is shown.

use chrono::{DateTime, Local, NaiveTime, Timelike, Utc};
use log::warn;
use tokio::sync::Mutex;

use crate::cache::{KeyValueStore, PrayerCache};
use crate::display::{long_date, ring_for, timings_summary, DisplaySink, Hand};
use crate::provider::PrayerDataProvider;
use crate::{Coordinates, DailyTimings, DateKey};

/// Rotation of the three hands at a given time of day.
///
/// The cascade matches a mechanical movement: seconds feed into the minute
/// hand, minutes feed into the hour hand, and the hour hand covers the
/// full dial once per 24 hours.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandAngles {
    pub hour_deg: f64,
    pub minute_deg: f64,
    pub second_deg: f64,
}

impl HandAngles {
    pub fn at(time: NaiveTime) -> Self {
        let seconds_ratio = time.second() as f64 / 60.0;
        let minutes_ratio = (seconds_ratio + time.minute() as f64) / 60.0;
        let hours_ratio = (minutes_ratio + time.hour() as f64) / 24.0;
        HandAngles {
            hour_deg: hours_ratio * 360.0,
            minute_deg: minutes_ratio * 360.0,
            second_deg: seconds_ratio * 360.0,
        }
    }
}

/// One tick of the 1-second live refresh. Skips the date text while a
/// simulation owns the displayed day.
pub fn live_tick<S: DisplaySink>(sink: &S, now: DateTime<Local>, simulation_active: bool) {
    if !simulation_active {
        sink.set_date_text(&long_date(now.date_naive()));
    }
    let hands = HandAngles::at(now.time());
    sink.set_hand_rotation(Hand::Second, hands.second_deg);
    sink.set_hand_rotation(Hand::Minute, hands.minute_deg);
    sink.set_hand_rotation(Hand::Hour, hands.hour_deg);
}

fn show_timings<S: DisplaySink>(
    sink: &S,
    date_key: DateKey,
    label: &str,
    timings: &DailyTimings,
    from_cache: bool,
) {
    sink.set_date_text(&long_date(date_key.0));
    let mut info = format!("Prayer times for {label}");
    if from_cache {
        info.push_str(" (from cache)");
    }
    info.push_str(": ");
    info.push_str(&timings_summary(timings));
    sink.set_prayer_info(&info);
    sink.set_ring(ring_for(timings));
}

/// Put today's prayer times on the display, cache first.
///
/// With `use_cache` false (the post-simulation refresh) both the cache
/// lookup and the save are skipped and the provider is asked directly.
/// Returns whether timings ended up on screen.
pub async fn show_today<P, S, K>(
    provider: &P,
    cache: &Mutex<PrayerCache<K>>,
    sink: &S,
    coords: Coordinates,
    location_label: &str,
    use_cache: bool,
) -> bool
where
    P: PrayerDataProvider,
    S: DisplaySink,
    K: KeyValueStore,
{
    let today = DateKey::today();
    let now_ms = Utc::now().timestamp_millis();

    if use_cache {
        if let Some(entry) = cache.lock().await.load_daily(today, now_ms) {
            show_timings(sink, today, &entry.location_label, &entry.timings, true);
            return true;
        }
    }

    sink.set_prayer_info(&format!("Fetching prayer times for {location_label}..."));
    match provider.timings(coords, &today).await {
        Some(timings) => {
            if use_cache {
                let save = cache
                    .lock()
                    .await
                    .save_daily(location_label, &timings, today, now_ms);
                if let Err(e) = save {
                    // Non-fatal: keep going with in-memory data.
                    warn!("daily cache write failed: {e}");
                    sink.set_status("Warning: could not save prayer times to cache.");
                }
            }
            show_timings(sink, today, location_label, &timings, false);
            true
        }
        None => {
            sink.set_ring(None);
            sink.set_prayer_info(&format!(
                "Could not retrieve prayer times for {location_label}."
            ));
            false
        }
    }
}
