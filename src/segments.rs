//! # Prayer Ring Partitioning
//!
//! This module turns the five prayer markers of one day into five contiguous
//! pie-slice segments that cover the 24-hour dial exactly once, and emits
//! the vector wedge geometry a display surface can draw.
//!
//! ## Canonical order
//!
//! Segments are built for the adjacent prayer pairs in canonical order:
//! Isha→Fajr, Fajr→Dhuhr, Dhuhr→Asr, Asr→Maghrib, Maghrib→Isha. The color
//! index of a segment is its position in that order, so Isha→Fajr (the
//! night segment) is always color 0 regardless of where it lands on the
//! dial.
//!
//! ## Wraparound
//!
//! Every arc runs clockwise (increasing angle) from its start marker to its
//! end marker. When the end angle is numerically below the start angle the
//! segment crosses the midnight boundary; it stays one logical segment with
//! one color but is split into two drawable arcs, `[start, 360)` and
//! `[0, end]`. Isha→Fajr is the usual case (Isha late evening, Fajr early
//! the next morning), but the split applies to any pair that wraps.
//!
//! ## Preconditions
//!
//! A marker set missing one of the five required prayer names is a
//! precondition violation and fails fast — lookup-by-name on absent data
//! must not silently produce a broken wedge. Fewer than five markers skips
//! the whole ring; there is no partial partition.

use thiserror::Error;

use crate::angle::{normalize_angle, polar_point};
use crate::{PrayerMarker, PrayerName};

/// Adjacent prayer pairs in canonical segment order.
pub const CANONICAL_ORDER: [(PrayerName, PrayerName); 5] = [
    (PrayerName::Isha, PrayerName::Fajr),
    (PrayerName::Fajr, PrayerName::Dhuhr),
    (PrayerName::Dhuhr, PrayerName::Asr),
    (PrayerName::Asr, PrayerName::Maghrib),
    (PrayerName::Maghrib, PrayerName::Isha),
];

/// Errors raised while partitioning a marker set into ring segments.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PartitionError {
    /// A required prayer name is absent from the marker set.
    #[error("missing required marker: {0}")]
    MissingMarker(PrayerName),

    /// Fewer than five markers were supplied; the ring is skipped entirely.
    #[error("expected 5 markers, got {0}")]
    TooFewMarkers(usize),
}

/// A non-wrapping drawable arc, `start_deg <= end_deg`, both in `[0, 360]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArcSpan {
    pub start_deg: f64,
    pub end_deg: f64,
}

impl ArcSpan {
    pub fn span(&self) -> f64 {
        self.end_deg - self.start_deg
    }

    /// SVG arc flag: take the longer way round when the span exceeds 180°.
    pub fn large_arc(&self) -> bool {
        self.span() > 180.0
    }

    /// Wedge path data for this arc: a triangle from the center out to the
    /// circle, closed by the arc itself.
    pub fn wedge_path(&self, center: f64, radius: f64) -> String {
        let (sx, sy) = polar_point(center, center, radius, self.start_deg);
        let (ex, ey) = polar_point(center, center, radius, self.end_deg);
        format!(
            "M {center:.3} {center:.3} L {sx:.3} {sy:.3} A {radius:.3} {radius:.3} 0 {} 1 {ex:.3} {ey:.3} Z",
            if self.large_arc() { 1 } else { 0 },
        )
    }
}

/// One logical ring segment between two adjacent prayers.
///
/// Covers the dial together with its four siblings exactly once. Holds one
/// drawable arc, or two when the segment crosses the midnight boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    /// Normalized start angle of the segment.
    pub start_deg: f64,
    /// Normalized end angle of the segment.
    pub end_deg: f64,
    /// Position in [`CANONICAL_ORDER`]; doubles as the color slot.
    pub color_index: usize,
    /// One or two non-wrapping drawable arcs.
    pub arcs: Vec<ArcSpan>,
}

impl Segment {
    /// Total angular span, summing both halves of a wrapped segment.
    pub fn span(&self) -> f64 {
        self.arcs.iter().map(ArcSpan::span).sum()
    }

    pub fn crosses_midnight(&self) -> bool {
        self.arcs.len() == 2
    }
}

/// Partition five named markers into five contiguous ring segments.
///
/// The returned segments are in canonical order and their spans sum to 360°
/// (modulo floating-point epsilon).
pub fn partition(markers: &[PrayerMarker]) -> Result<Vec<Segment>, PartitionError> {
    if markers.len() < 5 {
        return Err(PartitionError::TooFewMarkers(markers.len()));
    }

    let angle_of = |name: PrayerName| {
        markers
            .iter()
            .find(|m| m.name == name)
            .map(|m| normalize_angle(m.angle))
            .ok_or(PartitionError::MissingMarker(name))
    };

    let mut segments = Vec::with_capacity(CANONICAL_ORDER.len());
    for (color_index, &(start_name, end_name)) in CANONICAL_ORDER.iter().enumerate() {
        let start = angle_of(start_name)?;
        let end = angle_of(end_name)?;

        let arcs = if end == 0.0 && start > 0.0 {
            // An end marker at exactly midnight closes the segment at 360
            // rather than opening a zero-width second arc.
            vec![ArcSpan {
                start_deg: start,
                end_deg: 360.0,
            }]
        } else if end < start {
            vec![
                ArcSpan {
                    start_deg: start,
                    end_deg: 360.0,
                },
                ArcSpan {
                    start_deg: 0.0,
                    end_deg: end,
                },
            ]
        } else {
            vec![ArcSpan {
                start_deg: start,
                end_deg: end,
            }]
        };

        segments.push(Segment {
            start_deg: start,
            end_deg: end,
            color_index,
            arcs,
        });
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle::markers_for;
    use crate::DailyTimings;

    const EPS: f64 = 1e-9;

    fn scenario_markers() -> Vec<PrayerMarker> {
        let t = DailyTimings::from_strings("05:00", "12:15", "15:45", "18:30", "20:00").unwrap();
        markers_for(&t)
    }

    #[test]
    fn spans_sum_to_full_circle() {
        let segments = partition(&scenario_markers()).unwrap();
        let total: f64 = segments.iter().map(Segment::span).sum();
        assert!((total - 360.0).abs() < EPS, "total span {total}");
    }

    #[test]
    fn segments_are_contiguous_in_canonical_order() {
        let segments = partition(&scenario_markers()).unwrap();
        assert_eq!(segments.len(), 5);
        for (i, seg) in segments.iter().enumerate() {
            assert_eq!(seg.color_index, i);
            let next = &segments[(i + 1) % 5];
            assert!(
                (seg.end_deg - next.start_deg).abs() < EPS,
                "segment {i} ends at {} but segment {} starts at {}",
                seg.end_deg,
                (i + 1) % 5,
                next.start_deg
            );
        }
    }

    #[test]
    fn arcs_do_not_overlap() {
        let segments = partition(&scenario_markers()).unwrap();
        let mut arcs: Vec<ArcSpan> = segments.iter().flat_map(|s| s.arcs.clone()).collect();
        arcs.sort_by(|a, b| a.start_deg.total_cmp(&b.start_deg));
        for pair in arcs.windows(2) {
            assert!(
                pair[0].end_deg <= pair[1].start_deg + EPS,
                "arc [{}, {}] overlaps arc [{}, {}]",
                pair[0].start_deg,
                pair[0].end_deg,
                pair[1].start_deg,
                pair[1].end_deg
            );
        }
    }

    #[test]
    fn isha_to_fajr_wraps_into_two_arcs() {
        // Isha 20:00 (300°) to Fajr 05:00 (75°) crosses midnight.
        let segments = partition(&scenario_markers()).unwrap();
        let night = &segments[0];
        assert!(night.crosses_midnight());
        assert_eq!(night.arcs.len(), 2);
        assert!((night.arcs[0].start_deg - 300.0).abs() < EPS);
        assert!((night.arcs[0].end_deg - 360.0).abs() < EPS);
        assert!((night.arcs[1].start_deg - 0.0).abs() < EPS);
        assert!((night.arcs[1].end_deg - 75.0).abs() < EPS);
        assert!((night.span() - 135.0).abs() < EPS);

        // The remaining four segments are plain single arcs.
        for seg in &segments[1..] {
            assert_eq!(seg.arcs.len(), 1);
        }
    }

    #[test]
    fn missing_name_fails_fast() {
        let mut markers = scenario_markers();
        markers.retain(|m| m.name != PrayerName::Asr);
        // Still five entries so the count check passes.
        markers.push(markers[0]);
        assert_eq!(
            partition(&markers),
            Err(PartitionError::MissingMarker(PrayerName::Asr))
        );
    }

    #[test]
    fn too_few_markers_skip_the_ring() {
        let markers = &scenario_markers()[..4];
        assert_eq!(partition(markers), Err(PartitionError::TooFewMarkers(4)));
        assert_eq!(partition(&[]), Err(PartitionError::TooFewMarkers(0)));
    }

    #[test]
    fn midnight_end_marker_closes_at_360() {
        let mut markers = scenario_markers();
        // Push Fajr to exactly midnight; Isha→Fajr becomes [300, 360].
        markers[0].angle = 0.0;
        let segments = partition(&markers).unwrap();
        let night = &segments[0];
        assert_eq!(night.arcs.len(), 1);
        assert!((night.arcs[0].end_deg - 360.0).abs() < EPS);
        let total: f64 = segments.iter().map(Segment::span).sum();
        assert!((total - 360.0).abs() < EPS);
    }

    #[test]
    fn large_arc_flag_tracks_span() {
        let short = ArcSpan {
            start_deg: 75.0,
            end_deg: 183.75,
        };
        assert!(!short.large_arc());
        let long = ArcSpan {
            start_deg: 10.0,
            end_deg: 200.0,
        };
        assert!(long.large_arc());
        assert!(long.wedge_path(100.0, 100.0).contains(" 0 1 1 "));
        assert!(short.wedge_path(100.0, 100.0).contains(" 0 0 1 "));
    }

    #[test]
    fn wedge_path_starts_at_center() {
        let arc = ArcSpan {
            start_deg: 0.0,
            end_deg: 90.0,
        };
        let path = arc.wedge_path(100.0, 100.0);
        assert!(path.starts_with("M 100.000 100.000 L 100.000 0.000 A 100.000 100.000"));
        assert!(path.ends_with("Z"));
    }
}
