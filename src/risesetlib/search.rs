//! Rise/set/transit by altitude scanning
//!
//! Walks the local day in one-hour steps watching the body's altitude,
//! brackets each event (threshold crossings for rise and set, the
//! rising-to-falling flip for transit), then narrows each bracket to the
//! minute with the generic searches. Slower than the iterative solver but
//! indifferent to circumpolar geometry: a transit is found even when the
//! body never crosses the threshold altitude.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::locators::CelestialLocator;
use crate::searchlib::{find_end, find_peak, find_start, Range};
use crate::timelib::{from_zoned, start_of_day};
use crate::unitslib::Coordinate;

use super::{altitude_of, RiseSetTransitCalculator, RiseSetTransitTimes};

/// Rise/set/transit by hourly scan plus search refinement.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchCalculator;

impl RiseSetTransitCalculator for SearchCalculator {
    fn calculate<L: CelestialLocator + ?Sized, Tz: TimeZone>(
        &self,
        locator: &L,
        date: &DateTime<Tz>,
        location: &Coordinate,
        standard_altitude: f64,
        with_refraction: bool,
        with_parallax: bool,
    ) -> RiseSetTransitTimes<Tz> {
        let altitude = |time: &DateTime<Tz>| {
            altitude_of(
                locator,
                &from_zoned(time),
                location,
                with_refraction,
                with_parallax,
            )
        };

        let mut time = start_of_day(date);
        let current_date = date.date_naive();

        let altitude_before = altitude(&(time.clone() - Duration::hours(1)));
        let mut last_altitude = altitude(&time);
        let mut is_rising = last_altitude > altitude_before;

        let mut rise_bracket: Option<Range<DateTime<Tz>>> = None;
        let mut set_bracket: Option<Range<DateTime<Tz>>> = None;
        let mut transit_bracket: Option<Range<DateTime<Tz>>> = None;

        // Bracket each event to within an hour
        while time.date_naive() == current_date {
            let current_altitude = altitude(&time);

            if last_altitude >= standard_altitude && current_altitude < standard_altitude {
                set_bracket = Some(Range::new(time.clone() - Duration::hours(1), time.clone()));
            }

            if last_altitude <= standard_altitude && current_altitude > standard_altitude {
                rise_bracket = Some(Range::new(time.clone() - Duration::hours(1), time.clone()));
            }

            if transit_bracket.is_none() {
                let is_currently_rising =
                    current_altitude > altitude(&(time.clone() - Duration::minutes(1)));
                if is_rising && !is_currently_rising && current_altitude >= standard_altitude {
                    transit_bracket =
                        Some(Range::new(time.clone() - Duration::hours(1), time.clone()));
                }
                is_rising = is_currently_rising;
            }

            if rise_bracket.is_some() && set_bracket.is_some() && transit_bracket.is_some() {
                break;
            }

            last_altitude = current_altitude;
            time += Duration::hours(1);
        }

        // Narrow each bracket to the minute
        let precision = Duration::minutes(1);
        let zone = date.timezone();

        let altitude_utc = |time: DateTime<Utc>| {
            altitude_of(
                locator,
                &time.naive_utc(),
                location,
                with_refraction,
                with_parallax,
            )
        };

        let widened = |bracket: &Range<DateTime<Tz>>| {
            Range::new(
                bracket.start.with_timezone(&Utc) - precision,
                bracket.end.with_timezone(&Utc) + precision,
            )
        };

        let rise = rise_bracket.as_ref().and_then(|bracket| {
            find_start(&widened(bracket), precision, |t| {
                altitude_utc(t) >= standard_altitude
            })
            .map(|t| t.with_timezone(&zone))
        });

        let set = set_bracket.as_ref().and_then(|bracket| {
            find_end(&widened(bracket), precision, |t| {
                altitude_utc(t) >= standard_altitude
            })
            .map(|t| t.with_timezone(&zone))
        });

        let transit = transit_bracket.as_ref().and_then(|bracket| {
            let peak = find_peak(&widened(bracket), precision, altitude_utc);
            if altitude_utc(peak) >= standard_altitude {
                Some(peak.with_timezone(&zone))
            } else {
                None
            }
        });

        RiseSetTransitTimes::new(rise, transit, set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locators::Sun;
    use crate::risesetlib::NewtonsCalculator;
    use chrono::FixedOffset;

    fn nyc() -> Coordinate {
        Coordinate::new(40.7128, -74.0060).unwrap()
    }

    #[test]
    fn test_agrees_with_newtons_solver() {
        let zone = FixedOffset::west_opt(4 * 3600).unwrap();
        let date = zone.with_ymd_and_hms(2020, 9, 12, 12, 0, 0).unwrap();

        let scanned = SearchCalculator.calculate(&Sun, &date, &nyc(), -0.8333, false, false);
        let iterated = NewtonsCalculator.calculate(&Sun, &date, &nyc(), -0.8333, false, false);

        for (a, b) in [
            (&scanned.rise, &iterated.rise),
            (&scanned.transit, &iterated.transit),
            (&scanned.set, &iterated.set),
        ] {
            let a = a.as_ref().expect("search result");
            let b = b.as_ref().expect("newtons result");
            let diff = (a.clone() - b.clone()).num_minutes().abs();
            assert!(diff <= 2, "solvers disagree by {diff} minutes");
        }
    }

    #[test]
    fn test_midnight_sun_still_finds_transit() {
        // Danmarkshavn during the midnight sun: no rise or set, but the
        // scan still observes the rising-to-falling flip
        let greenland = Coordinate::new(76.7667, -18.6667).unwrap();
        let date = Utc.with_ymd_and_hms(2020, 6, 4, 12, 0, 0).unwrap();
        let times = SearchCalculator.calculate(&Sun, &date, &greenland, -0.8333, false, false);

        assert!(times.rise.is_none());
        assert!(times.set.is_none());
        assert!(times.transit.is_some());
    }

    #[test]
    fn test_polar_night_finds_nothing() {
        // The transit candidate is discarded because the peak altitude
        // stays below the threshold
        let greenland = Coordinate::new(76.7667, -18.6667).unwrap();
        let date = Utc.with_ymd_and_hms(2020, 11, 1, 12, 0, 0).unwrap();
        let times = SearchCalculator.calculate(&Sun, &date, &greenland, -0.8333, false, false);

        assert_eq!(times, RiseSetTransitTimes::none());
    }
}
