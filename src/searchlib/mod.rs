//! Bounded searches for event boundaries and extrema over time
//!
//! The event-composition layers (eclipses, meteor showers, above-horizon
//! windows) share these primitives: binary searches for the instant a
//! predicate flips, a ternary search for the maximizer of a unimodal
//! function, and a bidirectional probe for locating an event occurrence
//! somewhere in a range.
//!
//! Every search is bounded — by an iteration cap of 20 or by the range
//! itself — so no call can loop indefinitely. The supplied predicate or
//! producer may be arbitrarily expensive (a full eclipse-geometry
//! computation, say); no caching is added here, callers bear that cost.

use chrono::{DateTime, Duration, Utc};

/// The maximum number of refinement iterations for a search.
const MAX_ITERATIONS: usize = 20;

/// An inclusive range with `start <= end` expected by the searches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range<T> {
    pub start: T,
    pub end: T,
}

impl<T: PartialOrd + Clone> Range<T> {
    pub fn new(start: T, end: T) -> Self {
        Range { start, end }
    }

    pub fn contains(&self, value: &T) -> bool {
        *value >= self.start && *value <= self.end
    }

    /// The overlap of two ranges, or `None` when they are disjoint.
    pub fn intersection(&self, other: &Range<T>) -> Option<Range<T>> {
        let start = if self.start > other.start {
            self.start.clone()
        } else {
            other.start.clone()
        };
        let end = if self.end < other.end {
            self.end.clone()
        } else {
            other.end.clone()
        };
        if start > end {
            None
        } else {
            Some(Range::new(start, end))
        }
    }

    /// The value limited to this range.
    pub fn clamp(&self, value: T) -> T {
        if value < self.start {
            self.start.clone()
        } else if value > self.end {
            self.end.clone()
        } else {
            value
        }
    }
}

impl Range<DateTime<Utc>> {
    /// The midpoint of the range.
    pub fn middle(&self) -> DateTime<Utc> {
        self.start + (self.end - self.start) / 2
    }
}

/// Find the start of an event by binary search.
///
/// The predicate should be false near `range.start` and true near
/// `range.end`. Returns `None` when the left bound never moved, meaning no
/// transition was found before the first probe.
pub fn find_start(
    range: &Range<DateTime<Utc>>,
    precision: Duration,
    predicate: impl Fn(DateTime<Utc>) -> bool,
) -> Option<DateTime<Utc>> {
    let mut left = range.start;
    let mut right = range.end;
    let mut iterations = 0;

    while right - left > precision && iterations < MAX_ITERATIONS {
        let mid = left + (right - left) / 2;
        if predicate(mid) {
            right = mid;
        } else {
            left = mid + Duration::milliseconds(1);
        }
        iterations += 1;
    }

    if left != range.start {
        Some(left)
    } else {
        None
    }
}

/// Find the end of an event by binary search.
///
/// The predicate should be true near `range.start` and false near
/// `range.end`. Returns `None` when the right bound never moved.
pub fn find_end(
    range: &Range<DateTime<Utc>>,
    precision: Duration,
    predicate: impl Fn(DateTime<Utc>) -> bool,
) -> Option<DateTime<Utc>> {
    let mut left = range.start;
    let mut right = range.end;
    let mut iterations = 0;

    while right - left > precision && iterations < MAX_ITERATIONS {
        let mid = left + (right - left) / 2;
        if predicate(mid) {
            left = mid;
        } else {
            right = mid - Duration::milliseconds(1);
        }
        iterations += 1;
    }

    if right != range.end {
        Some(right)
    } else {
        None
    }
}

/// Find the maximizer of a unimodal function by ternary search.
///
/// Always returns an instant: after narrowing, whichever remaining
/// endpoint produces the larger value wins.
pub fn find_peak(
    range: &Range<DateTime<Utc>>,
    precision: Duration,
    producer: impl Fn(DateTime<Utc>) -> f64,
) -> DateTime<Utc> {
    let mut left = range.start;
    let mut right = range.end;
    let mut iterations = 0;

    while right - left > precision && iterations < MAX_ITERATIONS {
        let remaining = (right - left).num_milliseconds();
        let mid_left = left + Duration::milliseconds(remaining / 3);
        let mid_right = left + Duration::milliseconds(remaining * 2 / 3);
        if producer(mid_left) < producer(mid_right) {
            left = mid_left;
        } else {
            right = mid_right;
        }
        iterations += 1;
    }

    if producer(left) > producer(right) {
        left
    } else {
        right
    }
}

/// Probe outward from a starting instant for any time the predicate holds.
///
/// Steps both directions by `precision` until a hit or until both probes
/// leave the range. The returned instant is some time the event is
/// occurring, not necessarily its start, peak, or end. `start` defaults to
/// the middle of the range.
pub fn find_event(
    range: &Range<DateTime<Utc>>,
    precision: Duration,
    start: Option<DateTime<Utc>>,
    predicate: impl Fn(DateTime<Utc>) -> bool,
) -> Option<DateTime<Utc>> {
    let start = start.unwrap_or_else(|| range.middle());
    let mut left = start;
    let mut right = start;

    while left >= range.start || right <= range.end {
        if left >= range.start && predicate(left) {
            return Some(left);
        }
        if right <= range.end && right != left && predicate(right) {
            return Some(right);
        }
        left -= precision;
        right += precision;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).unwrap()
    }

    fn whole_range() -> Range<DateTime<Utc>> {
        Range::new(t(0), t(10_000))
    }

    #[test]
    fn test_find_start_converges_to_transition() {
        // Predicate flips at 60% of the range
        let transition = t(6_000);
        let found = find_start(&whole_range(), Duration::seconds(1), |x| x >= transition)
            .expect("transition should be found");
        let error = (found - transition).num_seconds().abs();
        assert!(error <= 1, "off by {error}s");
    }

    #[test]
    fn test_find_start_none_when_always_true() {
        // Event already in progress at range start: left never moves
        let result = find_start(&whole_range(), Duration::seconds(1), |_| true);
        assert_eq!(result, None);
    }

    #[test]
    fn test_find_end_converges_to_transition() {
        let transition = t(4_000);
        let found = find_end(&whole_range(), Duration::seconds(1), |x| x <= transition)
            .expect("transition should be found");
        let error = (found - transition).num_seconds().abs();
        assert!(error <= 1, "off by {error}s");
    }

    #[test]
    fn test_find_end_none_when_always_false() {
        let result = find_end(&whole_range(), Duration::seconds(1), |_| false);
        assert_eq!(result, None);
    }

    #[test]
    fn test_find_peak_of_parabola() {
        // Unimodal with maximum at 7000 s
        let producer = |x: DateTime<Utc>| {
            let s = (x - t(0)).num_milliseconds() as f64 / 1000.0;
            -(s - 7_000.0) * (s - 7_000.0)
        };
        let peak = find_peak(&whole_range(), Duration::seconds(1), producer);
        let error = (peak - t(7_000)).num_seconds().abs();
        assert!(error <= 30, "off by {error}s");
    }

    #[test]
    fn test_find_peak_always_returns_within_range() {
        let peak = find_peak(&whole_range(), Duration::seconds(1), |_| 1.0);
        assert!(whole_range().contains(&peak));
    }

    #[test]
    fn test_find_event_right_of_start() {
        let hit = find_event(&whole_range(), Duration::seconds(100), None, |x| {
            x >= t(8_000) && x <= t(8_300)
        });
        let hit = hit.expect("event should be found");
        assert!(hit >= t(8_000) && hit <= t(8_300), "hit {hit}");
    }

    #[test]
    fn test_find_event_left_of_start() {
        let hit = find_event(&whole_range(), Duration::seconds(100), None, |x| {
            x >= t(1_000) && x <= t(1_300)
        });
        assert!(hit.is_some());
    }

    #[test]
    fn test_find_event_exhausts_to_none() {
        let hit = find_event(&whole_range(), Duration::seconds(100), None, |_| false);
        assert_eq!(hit, None);
    }

    #[test]
    fn test_find_event_respects_explicit_start() {
        let hit = find_event(&whole_range(), Duration::seconds(10), Some(t(2_000)), |x| {
            x == t(2_000)
        });
        assert_eq!(hit, Some(t(2_000)));
    }

    #[test]
    fn test_iteration_cap_terminates() {
        // Millisecond precision over 10000 s would take more halvings than
        // the cap allows; the search must still terminate close to the
        // transition (the window after 20 halvings is ~10 ms)
        let transition = t(6_000);
        let found = find_start(&whole_range(), Duration::milliseconds(1), |x| x >= transition)
            .expect("transition should be found");
        let error = (found - transition).num_seconds().abs();
        assert!(error <= 1, "off by {error}s");
    }

    #[test]
    fn test_range_intersection() {
        let a = Range::new(t(0), t(100));
        let b = Range::new(t(50), t(200));
        let i = a.intersection(&b).unwrap();
        assert_eq!(i.start, t(50));
        assert_eq!(i.end, t(100));

        let disjoint = Range::new(t(300), t(400));
        assert!(a.intersection(&disjoint).is_none());
    }

    #[test]
    fn test_range_clamp() {
        let r = Range::new(t(100), t(200));
        assert_eq!(r.clamp(t(50)), t(100));
        assert_eq!(r.clamp(t(150)), t(150));
        assert_eq!(r.clamp(t(250)), t(200));
    }

    #[test]
    fn test_range_middle() {
        let r = Range::new(t(100), t(200));
        assert_eq!(r.middle(), t(150));
    }
}
