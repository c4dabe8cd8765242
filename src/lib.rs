//! # Prayer Clock Core Library
//!
//! This library provides the data model and core logic for the prayer clock
//! application: a 24-hour analog dial overlaid with a ring of five Islamic
//! prayer-time markers, rendered as a five-color circular partition, plus an
//! animated "simulate a year" playback over 365 cached daily records.
//!
//! ## Design Philosophy
//!
//! ### Host-free core
//! The core never touches a rendering environment directly. Everything it
//! wants to show goes through the small [`display::DisplaySink`] trait
//! (hand rotations, text surfaces, ring geometry), so the same logic drives
//! the terminal binary and the test harness alike.
//!
//! ### Typed wall-clock times
//! Prayer times arrive from the provider as `"HH:MM"` strings. They are
//! parsed exactly once, at the provider boundary, into [`ClockTime`]; a day
//! whose payload cannot be parsed becomes an absent [`DayRecord`] rather
//! than a marker silently pinned to midnight.
//!
//! ### Data Flow
//! 1. **Daily**: cache → (on miss) locate + fetch today's timings → ring
//! 2. **Yearly**: cache → (on miss) 365 sequential provider requests →
//!    cache → compressed-time playback, forward then reversed
//!
//! ## Core Types
//!
//! - [`ClockTime`]: a wall-clock time of day (hour, minute)
//! - [`DailyTimings`]: the five named prayer times of one day
//! - [`PrayerMarker`]: a named prayer time projected onto the 24-hour dial
//! - [`DayRecord`]: one calendar day with optional timings
//! - [`YearDataset`]: 365 consecutive day records for the simulation

use std::fmt;

use chrono::{Local, NaiveDate};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

// Module declarations
pub mod angle;
pub mod cache;
pub mod config;
pub mod display;
pub mod live;
pub mod location;
pub mod provider;
pub mod segments;
pub mod simulation;

/// Number of days in one simulated year.
pub const DAYS_PER_YEAR: usize = 365;

/// The five daily prayers, in wall-clock order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrayerName {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl PrayerName {
    /// All five prayers in wall-clock order.
    pub const ALL: [PrayerName; 5] = [
        PrayerName::Fajr,
        PrayerName::Dhuhr,
        PrayerName::Asr,
        PrayerName::Maghrib,
        PrayerName::Isha,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PrayerName::Fajr => "Fajr",
            PrayerName::Dhuhr => "Dhuhr",
            PrayerName::Asr => "Asr",
            PrayerName::Maghrib => "Maghrib",
            PrayerName::Isha => "Isha",
        }
    }
}

impl fmt::Display for PrayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A wall-clock time of day.
///
/// Invariant: `hour < 24` and `minute < 60`, enforced by [`ClockTime::new`]
/// and [`ClockTime::parse`]. Serializes as the `"HH:MM"` string the provider
/// and the persisted cache layout use.
///
/// # Example
/// ```
/// use prayer_clock_lib::ClockTime;
///
/// let fajr = ClockTime::parse("05:00").unwrap();
/// assert_eq!(fajr.minutes_of_day(), 300);
/// assert_eq!(fajr.to_string(), "05:00");
///
/// // Provider payloads may carry a timezone suffix
/// assert_eq!(ClockTime::parse("20:00 (EET)"), ClockTime::new(20, 0));
/// assert_eq!(ClockTime::parse("25:99"), None);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    /// Build a time of day, rejecting out-of-range components.
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(ClockTime { hour, minute })
        } else {
            None
        }
    }

    /// Parse an `"HH:MM"` string, tolerating a trailing timezone suffix
    /// such as `"05:01 (EET)"`. Anything unparseable is `None`; missing
    /// data never becomes a valid midnight.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().split_whitespace().next()?;
        let (h, m) = s.split_once(':')?;
        let hour: u8 = h.parse().ok()?;
        let minute: u8 = m.parse().ok()?;
        Self::new(hour, minute)
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }

    /// Minutes elapsed since local midnight (0..1440).
    pub fn minutes_of_day(self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ClockTime::parse(&s).ok_or_else(|| de::Error::custom(format!("invalid clock time: {s:?}")))
    }
}

/// The five prayer times of a single day.
///
/// Within one day these are strictly increasing in wall-clock order; the
/// conceptual wrap of Isha past midnight into the next Fajr is handled by
/// the segment partitioner, not here.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DailyTimings {
    pub fajr: ClockTime,
    pub dhuhr: ClockTime,
    pub asr: ClockTime,
    pub maghrib: ClockTime,
    pub isha: ClockTime,
}

impl DailyTimings {
    /// Parse the five provider time strings. Any unparseable entry makes
    /// the whole day absent rather than producing a partial ring.
    pub fn from_strings(
        fajr: &str,
        dhuhr: &str,
        asr: &str,
        maghrib: &str,
        isha: &str,
    ) -> Option<Self> {
        Some(DailyTimings {
            fajr: ClockTime::parse(fajr)?,
            dhuhr: ClockTime::parse(dhuhr)?,
            asr: ClockTime::parse(asr)?,
            maghrib: ClockTime::parse(maghrib)?,
            isha: ClockTime::parse(isha)?,
        })
    }

    pub fn get(&self, name: PrayerName) -> ClockTime {
        match name {
            PrayerName::Fajr => self.fajr,
            PrayerName::Dhuhr => self.dhuhr,
            PrayerName::Asr => self.asr,
            PrayerName::Maghrib => self.maghrib,
            PrayerName::Isha => self.isha,
        }
    }

    /// The five (name, time) pairs in wall-clock order.
    pub fn entries(&self) -> [(PrayerName, ClockTime); 5] {
        PrayerName::ALL.map(|name| (name, self.get(name)))
    }
}

/// A named prayer time projected onto the 24-hour dial.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrayerMarker {
    pub name: PrayerName,
    pub time: ClockTime,
    /// Dial angle in `[0, 360)`, 0 at midnight, clockwise.
    pub angle: f64,
}

/// A calendar-day identifier used for cache keying, independent of
/// time-of-day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateKey(pub NaiveDate);

impl DateKey {
    /// Today's date on the host's local clock.
    pub fn today() -> Self {
        DateKey(Local::now().date_naive())
    }

    /// `DD-MM-YYYY`, the path format the AlAdhan API expects.
    pub fn api_format(&self) -> String {
        self.0.format("%d-%m-%Y").to_string()
    }

    /// ISO-8601 `YYYY-MM-DD`, used for persisted keys.
    pub fn iso(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.iso())
    }
}

/// One day of the simulation dataset.
///
/// Absent timings record a fetch failure for that day; the sequence stays
/// intact and the day renders as "no data".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub timings: Option<DailyTimings>,
}

/// 365 consecutive day records starting at the simulation start date
/// (today at local midnight). Immutable once fetched or loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YearDataset {
    pub start: NaiveDate,
    pub days: Vec<DayRecord>,
}

impl YearDataset {
    /// Days that actually carry timings.
    pub fn valid_days(&self) -> usize {
        self.days.iter().filter(|d| d.timings.is_some()).count()
    }
}

/// A geographic position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Fallback label when reverse geocoding yields nothing.
    pub fn label(&self) -> String {
        format!("Lat: {:.2}, Lon: {:.2}", self.lat, self.lon)
    }
}
