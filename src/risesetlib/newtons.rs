//! Iterative rise/set/transit refinement (Meeus chapter 15)
//!
//! Anchors the body's coordinates at three UT midnights (yesterday, today,
//! tomorrow) and refines three fractional-day variables — transit `m0`,
//! rise `m1`, set `m2` — by interpolating the coordinates at each estimate
//! and correcting from the hour angle and altitude errors. The iteration is
//! capped at 20 rounds with a 1e-4 day early exit.
//!
//! Because the anchor is the UT midnight of the queried date, the local
//! results can land on a neighboring calendar date (zone offsets, or events
//! near midnight). The calculator therefore repeats the computation with
//! anchors shifted a day each way — plus a local-noon anchor that sidesteps
//! artifacts around DST transitions — and picks, independently per event,
//! the result that lands on the queried local date.

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone};

use crate::constants::{DAY_S, SIDEREAL_DEGREES_PER_DAY};
use crate::interplib::{interpolate, normalize_right_ascensions};
use crate::locators::CelestialLocator;
use crate::mathlib::{cos_degrees, normalize_angle, sin_degrees, wrap};
use crate::timelib::{
    apparent_sidereal_time, delta_t, ut_0h_on_date, GreenwichSiderealTime, LocalSiderealTime,
    UniversalTime, UniversalTimeExt,
};
use crate::unitslib::{kilometer, Coordinate, EquatorialCoordinate, HorizonCoordinate, Length};

use super::{RiseSetTransitCalculator, RiseSetTransitTimes};

const ITERATIONS: usize = 20;
const DONE_THRESHOLD: f64 = 0.0001;

// Guard for the 1/sin(H) correction; at a true transit the dm0 formula
// governs, so a vanishing denominator is treated as already converged.
const MIN_CORRECTION_DENOMINATOR: f64 = 1e-12;

/// Rise/set/transit by iterative refinement.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewtonsCalculator;

impl RiseSetTransitCalculator for NewtonsCalculator {
    fn calculate<L: CelestialLocator + ?Sized, Tz: TimeZone>(
        &self,
        locator: &L,
        date: &DateTime<Tz>,
        location: &Coordinate,
        standard_altitude: f64,
        with_refraction: bool,
        with_parallax: bool,
    ) -> RiseSetTransitTimes<Tz> {
        let local_date = date.date_naive();

        let today = anchored_times(
            locator,
            date,
            location,
            standard_altitude,
            with_refraction,
            with_parallax,
        );
        let on_date =
            |t: &Option<DateTime<Tz>>| t.as_ref().map(|t| t.date_naive()) == Some(local_date);
        if on_date(&today.rise) && on_date(&today.transit) && on_date(&today.set) {
            return today;
        }

        // Anchoring at local noon instead of midnight avoids artifacts
        // around DST transitions when resolving the UT day start
        let noon = date
            .timezone()
            .from_local_datetime(&local_date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap()))
            .earliest()
            .unwrap_or_else(|| date.clone());
        let today_at_noon = anchored_times(
            locator,
            &noon,
            location,
            standard_altitude,
            with_refraction,
            with_parallax,
        );

        // The events may simply belong to a neighboring anchor day
        let yesterday = anchored_times(
            locator,
            &(date.clone() - Duration::days(1)),
            location,
            standard_altitude,
            with_refraction,
            with_parallax,
        );
        let tomorrow = anchored_times(
            locator,
            &(date.clone() + Duration::days(1)),
            location,
            standard_altitude,
            with_refraction,
            with_parallax,
        );

        let pick = |candidates: [&Option<DateTime<Tz>>; 4]| {
            candidates
                .into_iter()
                .flatten()
                .find(|t| t.date_naive() == local_date)
                .cloned()
        };

        let rise = pick([
            &today.rise,
            &today_at_noon.rise,
            &yesterday.rise,
            &tomorrow.rise,
        ]);
        let transit = pick([
            &today.transit,
            &today_at_noon.transit,
            &yesterday.transit,
            &tomorrow.transit,
        ]);
        let set = pick([&today.set, &today_at_noon.set, &yesterday.set, &tomorrow.set]);

        // Refraction can hold a grazing event's altitude permanently on one
        // side of the threshold; refill only the missing slots from the
        // uncorrected solution
        if with_refraction && (rise.is_none() || transit.is_none() || set.is_none()) {
            let uncorrected = self.calculate(
                locator,
                date,
                location,
                standard_altitude,
                false,
                with_parallax,
            );
            return RiseSetTransitTimes::new(
                rise.or(uncorrected.rise),
                transit.or(uncorrected.transit),
                set.or(uncorrected.set),
            );
        }

        RiseSetTransitTimes::new(rise, transit, set)
    }
}

/// One solver pass anchored on the UT day matching `date`'s local date.
fn anchored_times<L: CelestialLocator + ?Sized, Tz: TimeZone>(
    locator: &L,
    date: &DateTime<Tz>,
    location: &Coordinate,
    standard_altitude: f64,
    with_refraction: bool,
    with_parallax: bool,
) -> RiseSetTransitTimes<Tz> {
    let ut = ut_0h_on_date(date);
    let ut_yesterday = ut_0h_on_date(&(date.clone() - Duration::days(1)));
    let ut_tomorrow = ut_0h_on_date(&(date.clone() + Duration::days(1)));

    let coordinates = [
        locator.coordinates(&ut_yesterday),
        locator.coordinates(&ut),
        locator.coordinates(&ut_tomorrow),
    ];

    let distances = if with_parallax {
        match (
            locator.distance(&ut_yesterday),
            locator.distance(&ut),
            locator.distance(&ut_tomorrow),
        ) {
            (Some(yesterday), Some(today), Some(tomorrow)) => Some([yesterday, today, tomorrow]),
            _ => None,
        }
    } else {
        None
    };

    let hours = match rise_set_transit_hours(
        &ut,
        location,
        standard_altitude,
        with_refraction,
        &coordinates,
        distances,
    ) {
        Some(hours) => hours,
        None => return RiseSetTransitTimes::none(),
    };

    let zone = date.timezone();
    RiseSetTransitTimes::new(
        Some(ut.plus_hours(hours.0).to_zoned(&zone)),
        Some(ut.plus_hours(hours.1).to_zoned(&zone)),
        Some(ut.plus_hours(hours.2).to_zoned(&zone)),
    )
}

/// The refinement loop. Returns `(rise, transit, set)` as hours from the
/// anchor's UT midnight, or `None` when the body stays entirely above or
/// entirely below the threshold altitude.
fn rise_set_transit_hours(
    ut: &UniversalTime,
    location: &Coordinate,
    standard_altitude: f64,
    with_refraction: bool,
    coordinates: &[EquatorialCoordinate; 3],
    distances: Option<[Length; 3]>,
) -> Option<(f64, f64, f64)> {
    let apparent_sidereal = apparent_sidereal_time(ut);
    let delta_t = delta_t(ut.year());
    let middle = &coordinates[1];

    let cos_h = (sin_degrees(standard_altitude)
        - sin_degrees(location.latitude) * sin_degrees(middle.declination))
        / (cos_degrees(location.latitude) * cos_degrees(middle.declination));

    // Circumpolar either way: the threshold altitude is never crossed
    if cos_h >= 1.0 || cos_h <= -1.0 {
        return None;
    }

    let h = wrap(cos_h.acos().to_degrees(), 0.0, 180.0);

    let mut m0 = wrap(
        (middle.right_ascension - location.longitude - apparent_sidereal) / 360.0,
        0.0,
        1.0,
    );
    let mut m1 = wrap(m0 - h / 360.0, 0.0, 1.0);
    let mut m2 = wrap(m0 + h / 360.0, 0.0, 1.0);

    for _ in 0..ITERATIONS {
        let sidereal0 = sidereal_at(apparent_sidereal, m0).at_longitude(location.longitude);
        let sidereal1 = sidereal_at(apparent_sidereal, m1).at_longitude(location.longitude);
        let sidereal2 = sidereal_at(apparent_sidereal, m2).at_longitude(location.longitude);

        // Interpolation happens on the dynamical time scale
        let n0 = m0 + delta_t / DAY_S;
        let n1 = m1 + delta_t / DAY_S;
        let n2 = m2 + delta_t / DAY_S;

        let c0 = interpolate_coordinates(n0, coordinates);
        let c1 = interpolate_coordinates(n1, coordinates);
        let c2 = interpolate_coordinates(n2, coordinates);

        let d1 = distances.map(|d| interpolate_distance(n1, &d));
        let d2 = distances.map(|d| interpolate_distance(n2, &d));

        let hour_angle0 = c0.hour_angle(sidereal0) * 15.0;
        let hour_angle1 = c1.hour_angle(sidereal1) * 15.0;
        let hour_angle2 = c2.hour_angle(sidereal2) * 15.0;

        let altitude1 = altitude_at(&c1, sidereal1, location.latitude, with_refraction, d1);
        let altitude2 = altitude_at(&c2, sidereal2, location.latitude, with_refraction, d2);

        let dm0 = -hour_angle0 / 360.0;
        let dm1 = altitude_correction(altitude1, standard_altitude, &c1, location, hour_angle1);
        let dm2 = altitude_correction(altitude2, standard_altitude, &c2, location, hour_angle2);

        m0 = wrap(m0 + dm0, 0.0, 1.0);
        m1 = wrap(m1 + dm1, 0.0, 1.0);
        m2 = wrap(m2 + dm2, 0.0, 1.0);

        if dm0.abs() < DONE_THRESHOLD && dm1.abs() < DONE_THRESHOLD && dm2.abs() < DONE_THRESHOLD {
            break;
        }
    }

    Some((m1 * 24.0, m0 * 24.0, m2 * 24.0))
}

fn sidereal_at(apparent_sidereal: f64, m: f64) -> GreenwichSiderealTime {
    GreenwichSiderealTime::new(normalize_angle(apparent_sidereal + SIDEREAL_DEGREES_PER_DAY * m) / 15.0)
}

fn altitude_correction(
    altitude: f64,
    standard_altitude: f64,
    coordinates: &EquatorialCoordinate,
    location: &Coordinate,
    hour_angle: f64,
) -> f64 {
    let denominator = 360.0
        * cos_degrees(coordinates.declination)
        * cos_degrees(location.latitude)
        * sin_degrees(hour_angle);

    if denominator.abs() < MIN_CORRECTION_DENOMINATOR {
        return 0.0;
    }

    (altitude - standard_altitude) / denominator
}

fn altitude_at(
    coordinates: &EquatorialCoordinate,
    sidereal: LocalSiderealTime,
    latitude: f64,
    with_refraction: bool,
    distance: Option<Length>,
) -> f64 {
    let horizon = match distance {
        Some(distance) => HorizonCoordinate::from_equatorial_at_with_parallax(
            coordinates,
            sidereal,
            latitude,
            distance,
        ),
        None => HorizonCoordinate::from_equatorial_at(coordinates, sidereal, latitude),
    };

    if with_refraction {
        horizon.with_refraction().altitude
    } else {
        horizon.altitude
    }
}

fn interpolate_coordinates(n: f64, coordinates: &[EquatorialCoordinate; 3]) -> EquatorialCoordinate {
    let (ra1, ra2, ra3) = normalize_right_ascensions(
        coordinates[0].right_ascension,
        coordinates[1].right_ascension,
        coordinates[2].right_ascension,
    );

    let right_ascension = interpolate(n, ra1, ra2, ra3);
    let declination = interpolate(
        n,
        coordinates[0].declination,
        coordinates[1].declination,
        coordinates[2].declination,
    );

    EquatorialCoordinate::new(declination, right_ascension)
}

fn interpolate_distance(n: f64, distances: &[Length; 3]) -> Length {
    Length::new::<kilometer>(interpolate(
        n,
        distances[0].get::<kilometer>(),
        distances[1].get::<kilometer>(),
        distances[2].get::<kilometer>(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locators::Sun;
    use chrono::{FixedOffset, NaiveDate, Timelike, Utc};

    fn nyc() -> Coordinate {
        Coordinate::new(40.7128, -74.0060).unwrap()
    }

    fn eastern_daylight() -> FixedOffset {
        FixedOffset::west_opt(4 * 3600).unwrap()
    }

    #[test]
    fn test_sun_events_on_queried_date() {
        let date = eastern_daylight()
            .with_ymd_and_hms(2020, 9, 12, 12, 0, 0)
            .unwrap();
        let times = NewtonsCalculator.calculate(&Sun, &date, &nyc(), -0.8333, false, false);

        let expected = NaiveDate::from_ymd_opt(2020, 9, 12).unwrap();
        for event in [&times.rise, &times.transit, &times.set] {
            assert_eq!(event.as_ref().unwrap().date_naive(), expected);
        }
    }

    #[test]
    fn test_sun_events_nyc_2020_09_12() {
        // Known times for New York on 2020-09-12 (EDT): rise 06:34,
        // transit 12:52, set 19:09
        let date = eastern_daylight()
            .with_ymd_and_hms(2020, 9, 12, 12, 0, 0)
            .unwrap();
        let times = NewtonsCalculator.calculate(&Sun, &date, &nyc(), -0.8333, false, false);

        let minutes_of_day =
            |t: &DateTime<FixedOffset>| t.time().hour() as i64 * 60 + t.time().minute() as i64;

        let rise = minutes_of_day(times.rise.as_ref().unwrap());
        let transit = minutes_of_day(times.transit.as_ref().unwrap());
        let set = minutes_of_day(times.set.as_ref().unwrap());

        assert!((rise - (6 * 60 + 34)).abs() <= 1, "rise at {rise} minutes");
        assert!(
            (transit - (12 * 60 + 52)).abs() <= 1,
            "transit at {transit} minutes"
        );
        assert!((set - (19 * 60 + 9)).abs() <= 1, "set at {set} minutes");
    }

    #[test]
    fn test_idempotent() {
        let date = eastern_daylight()
            .with_ymd_and_hms(2020, 9, 12, 12, 0, 0)
            .unwrap();
        let first = NewtonsCalculator.calculate(&Sun, &date, &nyc(), -0.8333, true, false);
        let second = NewtonsCalculator.calculate(&Sun, &date, &nyc(), -0.8333, true, false);
        assert_eq!(first, second);
    }

    #[test]
    fn test_circumpolar_midnight_sun_returns_none() {
        // Danmarkshavn, Greenland in June: the sun never goes below the
        // horizon, so the iterative solver reports nothing
        let greenland = Coordinate::new(76.7667, -18.6667).unwrap();
        let date = Utc.with_ymd_and_hms(2020, 6, 4, 12, 0, 0).unwrap();
        let times = NewtonsCalculator.calculate(&Sun, &date, &greenland, -0.8333, false, false);

        assert_eq!(times, RiseSetTransitTimes::none());
    }

    #[test]
    fn test_circumpolar_polar_night_returns_none() {
        let greenland = Coordinate::new(76.7667, -18.6667).unwrap();
        let date = Utc.with_ymd_and_hms(2020, 11, 1, 12, 0, 0).unwrap();
        let times = NewtonsCalculator.calculate(&Sun, &date, &greenland, -0.8333, false, false);

        assert_eq!(times, RiseSetTransitTimes::none());
    }

    #[test]
    fn test_convergence_within_iteration_budget() {
        // The correction magnitudes must fall below the threshold well
        // before the cap for an ordinary mid-latitude geometry: verified
        // indirectly by agreement between a single anchored pass and the
        // published times (a non-converged pass would be minutes off)
        let date = eastern_daylight()
            .with_ymd_and_hms(2020, 6, 21, 12, 0, 0)
            .unwrap();
        let times = NewtonsCalculator.calculate(&Sun, &date, &nyc(), -0.8333, false, false);
        // Summer solstice 2020 in NYC: rise 05:25, set 20:31
        let rise = times.rise.unwrap();
        let set = times.set.unwrap();
        assert_eq!(rise.time().hour(), 5);
        assert!((rise.time().minute() as i64 - 25).abs() <= 2);
        assert_eq!(set.time().hour(), 20);
        assert!((set.time().minute() as i64 - 31).abs() <= 2);
    }

    #[test]
    fn test_southern_hemisphere() {
        // Sydney (AEST, UTC+10) on 2020-09-12: rise ~05:50, set ~17:52
        let sydney = Coordinate::new(-33.8688, 151.2093).unwrap();
        let zone = FixedOffset::east_opt(10 * 3600).unwrap();
        let date = zone.with_ymd_and_hms(2020, 9, 12, 12, 0, 0).unwrap();
        let times = NewtonsCalculator.calculate(&Sun, &date, &sydney, -0.8333, false, false);

        let rise = times.rise.unwrap();
        let set = times.set.unwrap();
        assert_eq!(rise.date_naive(), NaiveDate::from_ymd_opt(2020, 9, 12).unwrap());
        assert_eq!(rise.time().hour(), 5);
        assert!((rise.time().minute() as i64 - 50).abs() <= 3);
        assert_eq!(set.time().hour(), 17);
        assert!((set.time().minute() as i64 - 52).abs() <= 3);
    }
}
