//! Universal Time, Julian dates, and sidereal time
//!
//! The crate's canonical internal time representation is Universal Time,
//! modeled as a `chrono::NaiveDateTime` explicitly interpreted as UT. All
//! interpolation and sidereal-time math runs on the continuous Julian day
//! count derived from it, which avoids calendar arithmetic across day and
//! month boundaries. Zoned date-times appear only at the API boundary and
//! are converted here.
//!
//! Calendar conversions follow Meeus chapter 7; sidereal time follows the
//! hour-based method of Practical Astronomy (Duffett-Smith) for the general
//! API and the degree-based theta-zero expression from Meeus chapter 12 for
//! the rise/set/transit solver.

mod delta_t;

pub use delta_t::delta_t;

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc,
};

use crate::constants::{J2000, JULIAN_CENTURY_DAYS};
use crate::mathlib::{cos_degrees, polynomial, wrap};
use crate::nutationlib;

/// A date-time on the Universal Time scale.
///
/// Not to be confused with a local civil time: construct it from a zoned
/// date-time with [`from_zoned`] or interpret it in a zone with
/// [`UniversalTimeExt::to_zoned`].
pub type UniversalTime = NaiveDateTime;

/// Julian-day and sidereal-time operations on [`UniversalTime`].
pub trait UniversalTimeExt {
    /// Julian day including the time of day.
    fn julian_day(&self) -> f64;

    /// Julian day of the calendar date at 0h UT.
    fn julian_day_at_0h(&self) -> f64;

    /// Julian centuries since J2000.0.
    fn julian_centuries(&self) -> f64;

    /// Greenwich mean sidereal time.
    fn to_sidereal_time(&self) -> GreenwichSiderealTime;

    /// Greenwich apparent sidereal time (mean corrected by the equation of
    /// the equinoxes).
    fn to_apparent_sidereal_time(&self) -> GreenwichSiderealTime;

    /// The same calendar date at 0h UT.
    fn at_zero_hour(&self) -> UniversalTime;

    /// Offset by a fractional number of hours (millisecond resolution).
    fn plus_hours(&self, hours: f64) -> UniversalTime;

    /// Offset by a number of milliseconds.
    fn plus_millis(&self, millis: i64) -> UniversalTime;

    /// Interpret this UT instant in the given time zone.
    fn to_zoned<Tz: TimeZone>(&self, zone: &Tz) -> DateTime<Tz>;

    /// Interpret this UT instant as an absolute UTC instant.
    fn to_instant(&self) -> DateTime<Utc>;
}

impl UniversalTimeExt for UniversalTime {
    fn julian_day(&self) -> f64 {
        julian_day_for(self.year(), self.month(), self.day() as f64 + decimal_hours(&self.time()) / 24.0)
    }

    fn julian_day_at_0h(&self) -> f64 {
        julian_day_for(self.year(), self.month(), self.day() as f64)
    }

    fn julian_centuries(&self) -> f64 {
        (self.julian_day() - J2000) / JULIAN_CENTURY_DAYS
    }

    fn to_sidereal_time(&self) -> GreenwichSiderealTime {
        let jd = self.julian_day_at_0h();
        let jd0 = jd0_for_year(self.year());
        let days = jd - jd0;

        let t = (jd0 - 2_415_020.0) / JULIAN_CENTURY_DAYS;
        let r = polynomial(t, &[6.6460656, 2400.051262, 0.00002581]);
        let b = 24.0 - r + 24.0 * (self.year() as f64 - 1900.0);

        let t0 = 0.0657098 * days - b;
        let ut = decimal_hours(&self.time());

        GreenwichSiderealTime::new(t0 + 1.002738 * ut)
    }

    fn to_apparent_sidereal_time(&self) -> GreenwichSiderealTime {
        let mean = self.to_sidereal_time();
        let nutation = nutationlib::nutation_in_longitude(self);
        let obliquity = nutationlib::true_obliquity_of_ecliptic(self);
        GreenwichSiderealTime::new(mean.hours + (nutation * cos_degrees(obliquity)) / 15.0)
    }

    fn at_zero_hour(&self) -> UniversalTime {
        self.date().and_time(NaiveTime::MIN)
    }

    fn plus_hours(&self, hours: f64) -> UniversalTime {
        self.plus_millis((hours * 3_600_000.0) as i64)
    }

    fn plus_millis(&self, millis: i64) -> UniversalTime {
        *self + Duration::milliseconds(millis)
    }

    fn to_zoned<Tz: TimeZone>(&self, zone: &Tz) -> DateTime<Tz> {
        zone.from_utc_datetime(self)
    }

    fn to_instant(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(self)
    }
}

/// Mean sidereal time at Greenwich in degrees (Meeus 12.4).
///
/// This is the degree-valued expression the rise/set/transit solver
/// iterates on; the hour-valued [`UniversalTimeExt::to_sidereal_time`]
/// serves the general API.
pub fn mean_sidereal_time(ut: &UniversalTime) -> f64 {
    let t = ut.julian_centuries();
    let theta0 = 280.46061837 + 360.98564736629 * (ut.julian_day() - J2000) + 0.000387933 * t * t
        - t * t * t / 38_710_000.0;
    wrap(theta0, 0.0, 360.0)
}

/// Apparent sidereal time at Greenwich in degrees: mean sidereal time
/// corrected for nutation in longitude.
pub fn apparent_sidereal_time(ut: &UniversalTime) -> f64 {
    let nutation = nutationlib::nutation_in_longitude(ut);
    let obliquity = nutationlib::true_obliquity_of_ecliptic(ut);
    mean_sidereal_time(ut) + (nutation * cos_degrees(obliquity)) / 15.0
}

/// Convert a zoned date-time to Universal Time.
pub fn from_zoned<Tz: TimeZone>(date: &DateTime<Tz>) -> UniversalTime {
    date.naive_utc()
}

/// The UT midnight whose local calendar date matches the given zoned
/// date-time's calendar date.
///
/// Scans the surrounding days because the UT midnight of `date` itself may
/// land on the previous or next local date depending on the zone offset.
pub fn ut_0h_on_date<Tz: TimeZone>(date: &DateTime<Tz>) -> UniversalTime {
    let local_date = date.date_naive();

    for i in -1..=1 {
        let ut_0h = from_zoned(&(date.clone() + Duration::days(i))).at_zero_hour();
        let local_0h = ut_0h.to_zoned(&date.timezone());
        if local_0h.date_naive() == local_date {
            return ut_0h;
        }
    }

    from_zoned(date).at_zero_hour()
}

/// Convert a Julian day to Universal Time (Meeus chapter 7).
pub fn from_julian_day(jd: f64) -> UniversalTime {
    let f = (jd + 0.5).rem_euclid(1.0);
    let z = (jd + 0.5) - f;

    let a = if z < 2_299_161.0 {
        z
    } else {
        let alpha = ((z - 1_867_216.25) / 36_524.25).floor();
        z + 1.0 + alpha - (alpha / 4.0).floor()
    };

    let b = a + 1524.0;
    let c = ((b - 122.1) / 365.25).floor();
    let d = (365.25 * c).floor();
    let e = ((b - d) / 30.6001).floor();
    let day = b - d - (30.6001 * e).floor() + f;

    let day_of_month = day.floor();
    let hours = (day - day_of_month) * 24.0;
    let hour = hours.floor();
    let minutes = (hours - hour) * 60.0;
    let minute = minutes.floor();
    let second = ((minutes - minute) * 60.0).floor();

    let month = if e < 14.0 { e - 1.0 } else { e - 13.0 };
    let year = if month > 2.0 { c - 4716.0 } else { c - 4715.0 };

    NaiveDate::from_ymd_opt(year as i32, month as u32, day_of_month as u32)
        .and_then(|d| d.and_hms_opt(hour as u32, minute as u32, second as u32))
        .unwrap_or_default()
}

/// Decimal hours of a time of day.
pub fn decimal_hours(time: &NaiveTime) -> f64 {
    time.hour() as f64
        + time.minute() as f64 / 60.0
        + time.second() as f64 / 3600.0
        + time.nanosecond() as f64 / 3600.0 / 1_000_000_000.0
}

/// A duration from a fractional number of hours (millisecond resolution).
pub fn hours(hours: f64) -> Duration {
    Duration::milliseconds((hours * 3_600_000.0) as i64)
}

fn julian_day_for(year: i32, month: u32, day: f64) -> f64 {
    let mut y = year as f64;
    let mut m = month as f64;

    if m <= 2.0 {
        y -= 1.0;
        m += 12.0;
    }

    let a = (y / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();

    (365.25 * (y + 4716.0)).floor() + (30.6001 * (m + 1.0)).floor() + day + b - 1524.5
}

// Julian day of January 0.0 of the year, used by the hour-based sidereal
// time formulas.
fn jd0_for_year(year: i32) -> f64 {
    let y = (year - 1) as f64;
    let a = (y / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();
    (365.25 * (y + 4716.0)).floor() + b - 1094.5
}

/// Sidereal time at the Greenwich meridian, in decimal hours `[0, 24)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GreenwichSiderealTime {
    pub hours: f64,
}

impl GreenwichSiderealTime {
    pub fn new(hours: f64) -> Self {
        GreenwichSiderealTime {
            hours: wrap(hours, 0.0, 24.0),
        }
    }

    /// The local sidereal time at a longitude (degrees, east positive).
    pub fn at_longitude(&self, longitude: f64) -> LocalSiderealTime {
        LocalSiderealTime {
            hours: wrap(self.hours + longitude / 15.0, 0.0, 24.0),
            longitude,
        }
    }

    /// The Universal Time on a given date at which this sidereal time
    /// occurs (inverse of [`UniversalTimeExt::to_sidereal_time`]).
    pub fn to_universal_time(&self, date: NaiveDate) -> UniversalTime {
        let midnight = date.and_time(NaiveTime::MIN);
        let jd = midnight.julian_day_at_0h();
        let jd0 = jd0_for_year(date.year());
        let days = jd - jd0;

        let t = (jd0 - 2_415_020.0) / JULIAN_CENTURY_DAYS;
        let r = polynomial(t, &[6.6460656, 2400.051262, 0.00002581]);
        let b = 24.0 - r + 24.0 * (date.year() as f64 - 1900.0);

        let t0 = wrap(0.0657098 * days - b, 0.0, 24.0);
        let ut = wrap(self.hours - t0, 0.0, 24.0) * 0.9972695663;

        midnight.plus_hours(ut)
    }
}

/// Sidereal time at a specific longitude, in decimal hours `[0, 24)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalSiderealTime {
    pub hours: f64,
    pub longitude: f64,
}

impl LocalSiderealTime {
    /// The Greenwich sidereal time corresponding to this local one.
    pub fn to_greenwich(&self) -> GreenwichSiderealTime {
        GreenwichSiderealTime::new(self.hours - self.longitude / 15.0)
    }
}

/// The element of `times` closest to `current` that is strictly in the past.
pub fn closest_past_time<Tz: TimeZone>(
    current: &DateTime<Tz>,
    times: &[Option<DateTime<Tz>>],
) -> Option<DateTime<Tz>> {
    times
        .iter()
        .flatten()
        .filter(|t| *t < current)
        .min_by_key(|t| (current.clone() - (*t).clone()).abs())
        .cloned()
}

/// The element of `times` closest to `current` that is strictly in the
/// future.
pub fn closest_future_time<Tz: TimeZone>(
    current: &DateTime<Tz>,
    times: &[Option<DateTime<Tz>>],
) -> Option<DateTime<Tz>> {
    times
        .iter()
        .flatten()
        .filter(|t| *t > current)
        .min_by_key(|t| ((*t).clone() - current.clone()).abs())
        .cloned()
}

/// The element of `times` closest to `current` in either direction.
pub fn closest_time<Tz: TimeZone>(
    current: &DateTime<Tz>,
    times: &[Option<DateTime<Tz>>],
) -> Option<DateTime<Tz>> {
    times
        .iter()
        .flatten()
        .min_by_key(|t| ((*t).clone() - current.clone()).abs())
        .cloned()
}

/// The first instant of the zoned date-time's local calendar date.
pub fn start_of_day<Tz: TimeZone>(date: &DateTime<Tz>) -> DateTime<Tz> {
    date.timezone()
        .from_local_datetime(&date.date_naive().and_time(NaiveTime::MIN))
        .earliest()
        .unwrap_or_else(|| date.clone())
}

/// The last representable instant of the zoned date-time's local calendar
/// date.
pub fn end_of_day<Tz: TimeZone>(date: &DateTime<Tz>) -> DateTime<Tz> {
    let end = date
        .date_naive()
        .and_time(NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap());
    date.timezone()
        .from_local_datetime(&end)
        .latest()
        .unwrap_or_else(|| date.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::FixedOffset;
    use crate::mathlib::time_to_decimal;

    fn ut(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> UniversalTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_julian_day_meeus_examples() {
        // Meeus example 7.a: 1957 October 4.81
        let t = ut(1957, 10, 4, 0, 0, 0).plus_hours(0.81 * 24.0);
        assert_relative_eq!(t.julian_day(), 2_436_116.31, epsilon = 1e-4);

        // 2000 January 1.5 is J2000
        assert_relative_eq!(ut(2000, 1, 1, 12, 0, 0).julian_day(), J2000);

        // Sputnik-era date at 0h
        assert_relative_eq!(ut(1987, 4, 10, 0, 0, 0).julian_day(), 2_446_895.5);
    }

    #[test]
    fn test_julian_day_round_trip() {
        let t = ut(2020, 9, 12, 6, 30, 15);
        let back = from_julian_day(t.julian_day());
        let diff = (back - t).num_seconds().abs();
        assert!(diff <= 1, "round trip off by {diff}s");
    }

    #[test]
    fn test_from_julian_day_meeus_example_7c() {
        // JD 2436116.31 -> 1957 October 4.81
        let t = from_julian_day(2_436_116.31);
        assert_eq!(t.date(), NaiveDate::from_ymd_opt(1957, 10, 4).unwrap());
        assert_relative_eq!(decimal_hours(&t.time()), 0.81 * 24.0, epsilon = 0.001);
    }

    #[test]
    fn test_julian_centuries_at_j2000() {
        assert_relative_eq!(ut(2000, 1, 1, 12, 0, 0).julian_centuries(), 0.0);
    }

    #[test]
    fn test_mean_sidereal_time_meeus_example_12a() {
        // Meeus example 12.a: 1987 April 10 at 0h UT
        let gmst = mean_sidereal_time(&ut(1987, 4, 10, 0, 0, 0));
        assert_relative_eq!(gmst / 15.0, time_to_decimal(13.0, 10.0, 46.3668), epsilon = 1e-5);
    }

    #[test]
    fn test_mean_sidereal_time_meeus_example_12b() {
        // Meeus example 12.b: 1987 April 10 at 19h21m00s UT
        let gmst = mean_sidereal_time(&ut(1987, 4, 10, 19, 21, 0));
        assert_relative_eq!(gmst, 128.737_873_4, epsilon = 1e-4);
    }

    #[test]
    fn test_hour_based_sidereal_time_matches_degree_based() {
        let t = ut(1987, 4, 10, 0, 0, 0);
        let gst = t.to_sidereal_time();
        assert_relative_eq!(gst.hours, time_to_decimal(13.0, 10.0, 46.3668), epsilon = 1e-5);
    }

    #[test]
    fn test_apparent_sidereal_time_meeus_example_12a() {
        let gast = ut(1987, 4, 10, 0, 0, 0).to_apparent_sidereal_time();
        assert_relative_eq!(gast.hours, time_to_decimal(13.0, 10.0, 46.1351), epsilon = 1e-4);
    }

    #[test]
    fn test_sidereal_to_universal_time() {
        let gst = GreenwichSiderealTime::new(8.698056);
        let t = gst.to_universal_time(NaiveDate::from_ymd_opt(2010, 2, 7).unwrap());
        let expected = ut(2010, 2, 7, 23, 30, 0);
        assert!((t - expected).num_seconds().abs() < 2, "got {t}");
    }

    #[test]
    fn test_sidereal_round_trip() {
        let t = ut(2015, 6, 20, 4, 45, 0);
        let back = t.to_sidereal_time().to_universal_time(t.date());
        assert!((back - t).num_seconds().abs() < 2, "got {back}");
    }

    #[test]
    fn test_at_longitude() {
        let gst = GreenwichSiderealTime::new(2.061389);
        let lst = gst.at_longitude(-40.0);
        assert_relative_eq!(lst.hours, 23.394722, epsilon = 1e-6);
        assert_relative_eq!(lst.longitude, -40.0);
        assert_relative_eq!(lst.to_greenwich().hours, 2.061389, epsilon = 1e-9);
    }

    #[test]
    fn test_ut_0h_on_date_western_zone() {
        // At UTC-4 the UT midnights of the 11th and 12th render on the
        // previous local date; the one matching local 2020-09-12 is
        // 2020-09-13T00:00 UT (20:00 local on the 12th).
        let zone = FixedOffset::west_opt(4 * 3600).unwrap();
        let date = zone.with_ymd_and_hms(2020, 9, 12, 12, 0, 0).unwrap();
        let ut0 = ut_0h_on_date(&date);
        let local = ut0.to_zoned(&zone);
        assert_eq!(local.date_naive(), NaiveDate::from_ymd_opt(2020, 9, 12).unwrap());
        assert_eq!(ut0.time(), NaiveTime::MIN);
    }

    #[test]
    fn test_ut_0h_on_date_utc() {
        let date = Utc.with_ymd_and_hms(2020, 9, 12, 23, 30, 0).unwrap();
        let ut0 = ut_0h_on_date(&date);
        assert_eq!(ut0, ut(2020, 9, 12, 0, 0, 0));
    }

    #[test]
    fn test_plus_hours_fractional() {
        let t = ut(2020, 1, 1, 0, 0, 0).plus_hours(1.5);
        assert_eq!(t, ut(2020, 1, 1, 1, 30, 0));
    }

    #[test]
    fn test_closest_time_helpers() {
        let zone = Utc;
        let current = zone.with_ymd_and_hms(2020, 6, 1, 12, 0, 0).unwrap();
        let a = Some(zone.with_ymd_and_hms(2020, 6, 1, 10, 0, 0).unwrap());
        let b = Some(zone.with_ymd_and_hms(2020, 6, 1, 13, 0, 0).unwrap());
        let c = Some(zone.with_ymd_and_hms(2020, 6, 1, 18, 0, 0).unwrap());
        let times = vec![a.clone(), None, b.clone(), c];

        assert_eq!(closest_past_time(&current, &times), a);
        assert_eq!(closest_future_time(&current, &times), b.clone());
        assert_eq!(closest_time(&current, &times), b);
    }

    #[test]
    fn test_start_and_end_of_day() {
        let zone = FixedOffset::east_opt(3600).unwrap();
        let date = zone.with_ymd_and_hms(2020, 6, 1, 15, 30, 0).unwrap();
        assert_eq!(start_of_day(&date).time(), NaiveTime::MIN);
        assert_eq!(end_of_day(&date).date_naive(), date.date_naive());
        assert!(end_of_day(&date) > date);
    }
}
