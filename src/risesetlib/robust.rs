//! Combined solver: iterative refinement with per-event search fallback

use chrono::{DateTime, TimeZone};

use crate::locators::CelestialLocator;
use crate::unitslib::Coordinate;

use super::{NewtonsCalculator, RiseSetTransitCalculator, RiseSetTransitTimes, SearchCalculator};

/// Tries the iterative solver first and falls back to the altitude scan
/// for any event the iteration could not place — most commonly the transit
/// of a circumpolar body.
#[derive(Debug, Clone, Copy, Default)]
pub struct RobustCalculator;

impl RiseSetTransitCalculator for RobustCalculator {
    fn calculate<L: CelestialLocator + ?Sized, Tz: TimeZone>(
        &self,
        locator: &L,
        date: &DateTime<Tz>,
        location: &Coordinate,
        standard_altitude: f64,
        with_refraction: bool,
        with_parallax: bool,
    ) -> RiseSetTransitTimes<Tz> {
        let newtons = NewtonsCalculator.calculate(
            locator,
            date,
            location,
            standard_altitude,
            with_refraction,
            with_parallax,
        );

        if newtons.is_complete() {
            return newtons;
        }

        let search = SearchCalculator.calculate(
            locator,
            date,
            location,
            standard_altitude,
            with_refraction,
            with_parallax,
        );

        RiseSetTransitTimes::new(
            newtons.rise.or(search.rise),
            newtons.transit.or(search.transit),
            newtons.set.or(search.set),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locators::Sun;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_complete_newtons_result_is_used_directly() {
        let nyc = Coordinate::new(40.7128, -74.0060).unwrap();
        let date = Utc.with_ymd_and_hms(2020, 9, 12, 12, 0, 0).unwrap();

        let robust = RobustCalculator.calculate(&Sun, &date, &nyc, -0.8333, false, false);
        let newtons = NewtonsCalculator.calculate(&Sun, &date, &nyc, -0.8333, false, false);
        assert_eq!(robust, newtons);
    }

    #[test]
    fn test_fallback_fills_circumpolar_transit() {
        let greenland = Coordinate::new(76.7667, -18.6667).unwrap();
        let date = Utc.with_ymd_and_hms(2020, 6, 4, 12, 0, 0).unwrap();

        let times = RobustCalculator.calculate(&Sun, &date, &greenland, -0.8333, false, false);
        assert!(times.rise.is_none());
        assert!(times.transit.is_some());
        assert!(times.set.is_none());
    }
}
