//! # Display Surface Abstraction
//!
//! The core never renders directly. It talks to a [`DisplaySink`] — hand
//! rotations, four text surfaces, a toggle button, and a ring surface that
//! accepts vector wedge geometry. The binary plugs in a terminal sink;
//! tests plug in a recording sink; a GUI host would plug in its own.
//!
//! Ring geometry is emitted on a 200×200 canvas (center 100, radius 100)
//! as SVG-style wedge path data, one or two paths per segment. Marker
//! positions are emitted in percent coordinates at 48% radius so a sink of
//! any size can place them.

use std::sync::Mutex;

use log::warn;

use crate::angle::{markers_for, polar_point};
use crate::segments::{partition, PartitionError, Segment};
use crate::{ClockTime, DailyTimings, DayRecord, PrayerMarker, PrayerName};
use chrono::NaiveDate;

/// Side length of the square ring canvas.
pub const RING_CANVAS: f64 = 200.0;

/// Marker center radius, percent of the clock face.
pub const MARKER_RADIUS_PCT: f64 = 48.0;

/// Dial number radius, percent of the clock face.
pub const NUMBER_RADIUS_PCT: f64 = 40.0;

/// Hours labelled on the 24-hour dial.
pub const DIAL_HOURS: [u8; 8] = [0, 3, 6, 9, 12, 15, 18, 21];

/// The three clock hands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hand {
    Hour,
    Minute,
    Second,
}

/// One colored wedge of the prayer ring. A segment that crosses midnight
/// contributes two wedges with the same color index.
#[derive(Clone, Debug, PartialEq)]
pub struct Wedge {
    pub color_index: usize,
    pub path: String,
}

/// A prayer marker placed on the clock face, percent coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerPoint {
    pub name: PrayerName,
    pub time: ClockTime,
    pub x_pct: f64,
    pub y_pct: f64,
}

/// A dial hour label position, percent coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct DialNumber {
    pub hour: u8,
    pub x_pct: f64,
    pub y_pct: f64,
}

/// Everything a sink needs to draw the prayer ring for one day.
#[derive(Clone, Debug, PartialEq)]
pub struct RingGeometry {
    pub wedges: Vec<Wedge>,
    pub markers: Vec<MarkerPoint>,
}

/// The display surface the core renders through.
pub trait DisplaySink: Send + Sync {
    fn set_hand_rotation(&self, hand: Hand, degrees: f64);
    fn set_date_text(&self, text: &str);
    fn set_prayer_info(&self, text: &str);
    fn set_status(&self, text: &str);
    fn set_button(&self, label: &str, enabled: bool);
    /// `None` clears the ring (no data, or a skipped partition).
    fn set_ring(&self, ring: Option<RingGeometry>);
}

impl<T: DisplaySink> DisplaySink for std::sync::Arc<T> {
    fn set_hand_rotation(&self, hand: Hand, degrees: f64) {
        (**self).set_hand_rotation(hand, degrees);
    }
    fn set_date_text(&self, text: &str) {
        (**self).set_date_text(text);
    }
    fn set_prayer_info(&self, text: &str) {
        (**self).set_prayer_info(text);
    }
    fn set_status(&self, text: &str) {
        (**self).set_status(text);
    }
    fn set_button(&self, label: &str, enabled: bool) {
        (**self).set_button(label, enabled);
    }
    fn set_ring(&self, ring: Option<RingGeometry>) {
        (**self).set_ring(ring);
    }
}

/// Positions of the eight hour labels on the 24-hour dial.
pub fn dial_numbers() -> Vec<DialNumber> {
    DIAL_HOURS
        .iter()
        .map(|&hour| {
            let angle = hour as f64 / 24.0 * 360.0;
            let (x_pct, y_pct) = polar_point(50.0, 50.0, NUMBER_RADIUS_PCT, angle);
            DialNumber { hour, x_pct, y_pct }
        })
        .collect()
}

/// An unlabeled hour tick on the dial, drawn as a rotation about the
/// face center.
#[derive(Clone, Debug, PartialEq)]
pub struct TickMark {
    pub hour: u8,
    pub angle_deg: f64,
}

/// Ticks for the sixteen hours that carry no dial number.
pub fn tick_marks() -> Vec<TickMark> {
    (0..24)
        .filter(|hour| !DIAL_HOURS.contains(hour))
        .map(|hour| TickMark {
            hour,
            angle_deg: hour as f64 / 24.0 * 360.0,
        })
        .collect()
}

/// Build ring geometry from a marker set. Fails fast when a required
/// marker is missing; the caller skips the ring rather than draw corrupt
/// geometry.
pub fn build_ring(markers: &[PrayerMarker]) -> Result<RingGeometry, PartitionError> {
    let segments = partition(markers)?;
    let center = RING_CANVAS / 2.0;
    let radius = RING_CANVAS / 2.0;

    let wedges = segments
        .iter()
        .flat_map(|seg: &Segment| {
            seg.arcs.iter().map(move |arc| Wedge {
                color_index: seg.color_index,
                path: arc.wedge_path(center, radius),
            })
        })
        .collect();

    let marker_points = markers
        .iter()
        .map(|m| {
            let (x_pct, y_pct) = polar_point(50.0, 50.0, MARKER_RADIUS_PCT, m.angle);
            MarkerPoint {
                name: m.name,
                time: m.time,
                x_pct,
                y_pct,
            }
        })
        .collect();

    Ok(RingGeometry {
        wedges,
        markers: marker_points,
    })
}

/// Ring geometry for one day's timings, or `None` when the ring must be
/// skipped. Partition preconditions are the one fatal-to-the-operation
/// case: log and skip rather than render a broken wedge.
pub fn ring_for(timings: &DailyTimings) -> Option<RingGeometry> {
    let markers = markers_for(timings);
    match build_ring(&markers) {
        Ok(ring) => Some(ring),
        Err(e) => {
            warn!("skipping prayer ring: {e}");
            None
        }
    }
}

/// "Wednesday, June 3, 2025"
pub fn long_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// "Jun 3", used in playback progress labels.
pub fn short_date(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

/// "June 3", used in per-day prayer info lines.
pub fn month_day(date: NaiveDate) -> String {
    date.format("%B %-d").to_string()
}

/// "F: 05:00, D: 12:15, A: 15:45, M: 18:30, I: 20:00"
pub fn timings_summary(timings: &DailyTimings) -> String {
    format!(
        "F: {}, D: {}, A: {}, M: {}, I: {}",
        timings.fajr, timings.dhuhr, timings.asr, timings.maghrib, timings.isha
    )
}

/// Render one simulated day: date text, prayer info, and the ring (or the
/// "no data" display when the day's fetch failed).
pub fn render_day<S: DisplaySink>(sink: &S, record: &DayRecord) {
    sink.set_date_text(&long_date(record.date));
    match &record.timings {
        Some(timings) => {
            sink.set_prayer_info(&format!(
                "Prayer times for {}: {}",
                month_day(record.date),
                timings_summary(timings)
            ));
            sink.set_ring(ring_for(timings));
        }
        None => {
            sink.set_prayer_info(&format!("No prayer times for {}.", month_day(record.date)));
            sink.set_ring(None);
        }
    }
}

/// Line-oriented sink for the terminal binary. Repeated identical text is
/// deduplicated so the 1-second refresh doesn't spam the log.
pub struct TerminalDisplay {
    last: Mutex<TerminalState>,
}

#[derive(Default)]
struct TerminalState {
    date: String,
    info: String,
    status: String,
}

impl TerminalDisplay {
    pub fn new() -> Self {
        TerminalDisplay {
            last: Mutex::new(TerminalState::default()),
        }
    }
}

impl Default for TerminalDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySink for TerminalDisplay {
    fn set_hand_rotation(&self, _hand: Hand, _degrees: f64) {
        // Hand angles change every second; the terminal shows text only.
    }

    fn set_date_text(&self, text: &str) {
        let mut last = self.last.lock().expect("display state poisoned");
        if last.date != text {
            last.date = text.to_string();
            println!("{text}");
        }
    }

    fn set_prayer_info(&self, text: &str) {
        let mut last = self.last.lock().expect("display state poisoned");
        if last.info != text {
            last.info = text.to_string();
            println!("  {text}");
        }
    }

    fn set_status(&self, text: &str) {
        let mut last = self.last.lock().expect("display state poisoned");
        if last.status != text {
            last.status = text.to_string();
            println!("  [{text}]");
        }
    }

    fn set_button(&self, label: &str, enabled: bool) {
        log::debug!("button: {label} (enabled: {enabled})");
    }

    fn set_ring(&self, ring: Option<RingGeometry>) {
        match ring {
            Some(ring) => log::debug!(
                "ring: {} wedges, {} markers",
                ring.wedges.len(),
                ring.markers.len()
            ),
            None => log::debug!("ring: cleared"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        infos: Mutex<Vec<String>>,
        rings: Mutex<Vec<Option<RingGeometry>>>,
        dates: Mutex<Vec<String>>,
    }

    impl DisplaySink for RecordingSink {
        fn set_hand_rotation(&self, _: Hand, _: f64) {}
        fn set_date_text(&self, text: &str) {
            self.dates.lock().unwrap().push(text.to_string());
        }
        fn set_prayer_info(&self, text: &str) {
            self.infos.lock().unwrap().push(text.to_string());
        }
        fn set_status(&self, _: &str) {}
        fn set_button(&self, _: &str, _: bool) {}
        fn set_ring(&self, ring: Option<RingGeometry>) {
            self.rings.lock().unwrap().push(ring);
        }
    }

    fn timings() -> DailyTimings {
        DailyTimings::from_strings("05:00", "12:15", "15:45", "18:30", "20:00").unwrap()
    }

    fn day(timings: Option<DailyTimings>) -> DayRecord {
        DayRecord {
            date: NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
            timings,
        }
    }

    #[test]
    fn ring_has_six_wedges_when_night_wraps() {
        // Five segments, with Isha→Fajr split into two drawable wedges.
        let ring = ring_for(&timings()).unwrap();
        assert_eq!(ring.wedges.len(), 6);
        assert_eq!(ring.markers.len(), 5);
        // Both night wedges carry the same color slot.
        let night: Vec<_> = ring.wedges.iter().filter(|w| w.color_index == 0).collect();
        assert_eq!(night.len(), 2);
    }

    #[test]
    fn markers_sit_at_48_percent_radius() {
        let ring = ring_for(&timings()).unwrap();
        for marker in &ring.markers {
            let dx = marker.x_pct - 50.0;
            let dy = marker.y_pct - 50.0;
            let r = (dx * dx + dy * dy).sqrt();
            assert!((r - MARKER_RADIUS_PCT).abs() < 1e-9, "{}: r = {r}", marker.name);
        }
    }

    #[test]
    fn dial_numbers_cover_the_day() {
        let numbers = dial_numbers();
        assert_eq!(numbers.len(), 8);
        assert_eq!(numbers[0].hour, 0);
        // Midnight label sits straight up at 40% radius.
        assert!((numbers[0].x_pct - 50.0).abs() < 1e-9);
        assert!((numbers[0].y_pct - 10.0).abs() < 1e-9);
        // Noon label sits straight down.
        let noon = numbers.iter().find(|n| n.hour == 12).unwrap();
        assert!((noon.y_pct - 90.0).abs() < 1e-9);
    }

    #[test]
    fn tick_marks_fill_the_unlabeled_hours() {
        let ticks = tick_marks();
        assert_eq!(ticks.len(), 16);
        // Ticks and numbers together cover all 24 hours exactly once.
        for tick in &ticks {
            assert!(!DIAL_HOURS.contains(&tick.hour), "hour {} is labeled", tick.hour);
            assert!((tick.angle_deg - tick.hour as f64 * 15.0).abs() < 1e-9);
        }
        assert_eq!(ticks[0].hour, 1);
        assert_eq!(ticks.last().unwrap().hour, 23);
        assert!((ticks.last().unwrap().angle_deg - 345.0).abs() < 1e-9);
    }

    #[test]
    fn render_day_with_timings_sets_ring_and_info() {
        let sink = RecordingSink::default();
        render_day(&sink, &day(Some(timings())));

        assert_eq!(sink.dates.lock().unwrap()[0], "Tuesday, June 3, 2025");
        let info = &sink.infos.lock().unwrap()[0];
        assert!(info.contains("Prayer times for June 3"));
        assert!(info.contains("F: 05:00"));
        assert!(sink.rings.lock().unwrap()[0].is_some());
    }

    #[test]
    fn render_day_without_timings_clears_ring() {
        let sink = RecordingSink::default();
        render_day(&sink, &day(None));

        assert_eq!(
            sink.infos.lock().unwrap()[0],
            "No prayer times for June 3."
        );
        assert_eq!(sink.rings.lock().unwrap()[0], None);
    }

    #[test]
    fn too_few_markers_skip_the_whole_ring() {
        let markers = crate::angle::markers_for(&timings());
        assert!(build_ring(&markers[..3]).is_err());
    }
}
