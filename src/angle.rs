//! Mapping wall-clock times onto the 24-hour dial.
//!
//! The dial puts midnight at the top (0°) and runs clockwise through the
//! full day, so noon sits at the bottom (180°). All angle arithmetic in the
//! crate goes through [`normalize_angle`] to stay in `[0, 360)`.

use crate::{ClockTime, DailyTimings, PrayerMarker};

/// Minutes in a full day.
const MINUTES_PER_DAY: f64 = 24.0 * 60.0;

/// Dial angle of a time of day, in degrees `[0, 360)`.
///
/// `angle_of(00:00) == 0`, `angle_of(12:00) == 180`, and the mapping is
/// monotonic over the day.
pub fn angle_of(time: ClockTime) -> f64 {
    time.minutes_of_day() as f64 / MINUTES_PER_DAY * 360.0
}

/// Normalize an angle into `[0, 360)`.
pub fn normalize_angle(angle: f64) -> f64 {
    angle.rem_euclid(360.0)
}

/// Project a dial angle onto a point at `radius` from `(center_x, center_y)`,
/// with 0° pointing straight up and angles increasing clockwise (screen
/// coordinates, y grows downward).
pub fn polar_point(center_x: f64, center_y: f64, radius: f64, angle_deg: f64) -> (f64, f64) {
    let rad = angle_deg.to_radians();
    (center_x + radius * rad.sin(), center_y - radius * rad.cos())
}

/// The five dial markers for one day's timings, in wall-clock order.
pub fn markers_for(timings: &DailyTimings) -> Vec<PrayerMarker> {
    timings
        .entries()
        .iter()
        .map(|&(name, time)| PrayerMarker {
            name,
            time,
            angle: angle_of(time),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PrayerName;

    const EPS: f64 = 1e-9;

    #[test]
    fn angle_of_anchor_points() {
        assert!((angle_of(ClockTime::new(0, 0).unwrap()) - 0.0).abs() < EPS);
        assert!((angle_of(ClockTime::new(12, 0).unwrap()) - 180.0).abs() < EPS);
        assert!((angle_of(ClockTime::new(6, 0).unwrap()) - 90.0).abs() < EPS);
        assert!((angle_of(ClockTime::new(18, 0).unwrap()) - 270.0).abs() < EPS);
    }

    #[test]
    fn angle_of_is_monotonic_over_the_day() {
        let mut prev = -1.0;
        for hour in 0..24 {
            for minute in 0..60 {
                let a = angle_of(ClockTime::new(hour, minute).unwrap());
                assert!(a > prev, "angle regressed at {hour:02}:{minute:02}");
                assert!((0.0..360.0).contains(&a));
                prev = a;
            }
        }
    }

    #[test]
    fn angle_of_worked_scenario() {
        // Fajr 05:00, Dhuhr 12:15, Asr 15:45, Maghrib 18:30, Isha 20:00
        let t = DailyTimings::from_strings("05:00", "12:15", "15:45", "18:30", "20:00").unwrap();
        let expected = [75.0, 183.75, 236.25, 277.5, 300.0];
        for (marker, want) in markers_for(&t).iter().zip(expected) {
            assert!(
                (marker.angle - want).abs() < EPS,
                "{}: got {}, want {want}",
                marker.name,
                marker.angle
            );
        }
    }

    #[test]
    fn normalize_angle_wraps_both_directions() {
        assert_eq!(normalize_angle(0.0), 0.0);
        assert_eq!(normalize_angle(360.0), 0.0);
        assert_eq!(normalize_angle(365.0), 5.0);
        assert_eq!(normalize_angle(-90.0), 270.0);
        assert_eq!(normalize_angle(720.0), 0.0);
    }

    #[test]
    fn polar_point_cardinal_directions() {
        let (x, y) = polar_point(50.0, 50.0, 10.0, 0.0);
        assert!((x - 50.0).abs() < EPS && (y - 40.0).abs() < EPS);
        let (x, y) = polar_point(50.0, 50.0, 10.0, 90.0);
        assert!((x - 60.0).abs() < EPS && (y - 50.0).abs() < EPS);
        let (x, y) = polar_point(50.0, 50.0, 10.0, 180.0);
        assert!((x - 50.0).abs() < EPS && (y - 60.0).abs() < EPS);
    }

    #[test]
    fn markers_keep_wall_clock_order() {
        let t = DailyTimings::from_strings("05:00", "12:15", "15:45", "18:30", "20:00").unwrap();
        let markers = markers_for(&t);
        assert_eq!(markers.len(), 5);
        assert_eq!(markers[0].name, PrayerName::Fajr);
        assert_eq!(markers[4].name, PrayerName::Isha);
    }
}
