//! Solar position from the low-accuracy theory of Meeus chapter 25
//!
//! Accurate to well under an arcminute over several centuries around
//! J2000, which is more than enough for rise/set work where the standard
//! altitude already absorbs half a degree of refraction.

use chrono::Datelike;

use crate::mathlib::{cos_degrees, normalize_angle, polynomial, sin_degrees};
use crate::timelib::{delta_t, UniversalTime, UniversalTimeExt};
use crate::unitslib::{kilometer, EquatorialCoordinate, Length};
use crate::nutationlib;

use super::CelestialLocator;

/// Semi-major axis of the Earth's orbit in kilometers
const SEMI_MAJOR_AXIS_KM: f64 = 1.495985e8;

/// The Sun.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sun;

impl CelestialLocator for Sun {
    fn coordinates(&self, ut: &UniversalTime) -> EquatorialCoordinate {
        // The solar series is expressed in dynamical time
        let delta = delta_t(ut.year());
        let tt = ut.plus_millis((delta * 1000.0) as i64);
        let t = tt.julian_centuries();

        let apparent_longitude = apparent_longitude(t);
        let corrected_obliquity = obliquity_correction(t);

        let right_ascension = normalize_angle(
            (cos_degrees(corrected_obliquity) * sin_degrees(apparent_longitude))
                .atan2(cos_degrees(apparent_longitude))
                .to_degrees(),
        );
        let declination = (sin_degrees(corrected_obliquity) * sin_degrees(apparent_longitude))
            .asin()
            .to_degrees();

        EquatorialCoordinate::apparent(declination, right_ascension)
    }

    fn distance(&self, ut: &UniversalTime) -> Option<Length> {
        Some(Length::new::<kilometer>(distance_km(ut.julian_centuries())))
    }
}

impl Sun {
    /// Apparent angular diameter in degrees.
    pub fn angular_diameter(&self, ut: &UniversalTime) -> f64 {
        let au = distance_km(ut.julian_centuries()) * 1000.0 / crate::constants::AU_M;
        2.0 * 959.63 / (3600.0 * au)
    }

    /// Mean anomaly in degrees.
    pub fn mean_anomaly(&self, ut: &UniversalTime) -> f64 {
        mean_anomaly(ut.julian_centuries())
    }
}

fn distance_km(t: f64) -> f64 {
    let true_anomaly = true_anomaly(t);
    let eccentricity = eccentricity(t);
    let f =
        (1.0 + eccentricity * cos_degrees(true_anomaly)) / (1.0 - eccentricity * eccentricity);
    SEMI_MAJOR_AXIS_KM / f
}

fn mean_anomaly(t: f64) -> f64 {
    normalize_angle(polynomial(
        t,
        &[357.5291092, 35999.0502909, -0.0001536, 1.0 / 24_490_000.0],
    ))
}

fn true_anomaly(t: f64) -> f64 {
    normalize_angle(mean_anomaly(t) + equation_of_center(t))
}

fn equation_of_center(t: f64) -> f64 {
    let m = mean_anomaly(t);
    polynomial(t, &[1.914602, -0.004817, -0.000014]) * sin_degrees(m)
        + polynomial(t, &[0.019993, -0.000101]) * sin_degrees(2.0 * m)
        + 0.000289 * sin_degrees(3.0 * m)
}

fn geometric_longitude(t: f64) -> f64 {
    normalize_angle(polynomial(t, &[280.46646, 36000.76983, 0.0003032]))
}

fn true_longitude(t: f64) -> f64 {
    geometric_longitude(t) + equation_of_center(t)
}

fn apparent_longitude(t: f64) -> f64 {
    let omega = polynomial(t, &[125.04, -1934.136]);
    true_longitude(t) - 0.00569 - 0.00478 * sin_degrees(omega)
}

fn eccentricity(t: f64) -> f64 {
    polynomial(t, &[0.01675104, -0.0000418, -0.000000126])
}

fn obliquity_correction(t: f64) -> f64 {
    let e = nutationlib::mean_obliquity_for_centuries(t);
    let omega = polynomial(t, &[125.04, -1934.136]);
    e + 0.00256 * cos_degrees(omega)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn ut(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> UniversalTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[test]
    fn test_meeus_example_25a() {
        // 1992 October 13 at 0h TD: apparent RA 198.38083, dec -7.78507.
        // Our input is UT, so back the delta-T correction out first.
        let tt = ut(1992, 10, 13, 0, 0);
        let time = tt.plus_millis(-(delta_t(tt.year()) * 1000.0) as i64);
        let coords = Sun.coordinates(&time);

        assert_relative_eq!(coords.right_ascension, 198.38083, epsilon = 0.01);
        assert_relative_eq!(coords.declination, -7.78507, epsilon = 0.01);
    }

    #[test]
    fn test_equinox_declination_near_zero() {
        // Around the 2020 March equinox (March 20, 03:50 UT)
        let coords = Sun.coordinates(&ut(2020, 3, 20, 3, 50));
        assert_relative_eq!(coords.declination, 0.0, epsilon = 0.05);
    }

    #[test]
    fn test_solstice_declination_extremes() {
        let summer = Sun.coordinates(&ut(2020, 6, 20, 21, 44));
        assert_relative_eq!(summer.declination, 23.43, epsilon = 0.05);

        let winter = Sun.coordinates(&ut(2020, 12, 21, 10, 2));
        assert_relative_eq!(winter.declination, -23.43, epsilon = 0.05);
    }

    #[test]
    fn test_distance_over_year() {
        // Perihelion in early January (~0.9833 AU), aphelion in early July
        // (~1.0167 AU)
        let january = Sun.distance(&ut(2020, 1, 4, 0, 0)).unwrap();
        let july = Sun.distance(&ut(2020, 7, 4, 0, 0)).unwrap();

        let au = crate::constants::AU_M / 1000.0;
        assert_relative_eq!(january.get::<kilometer>() / au, 0.9833, epsilon = 0.002);
        assert_relative_eq!(july.get::<kilometer>() / au, 1.0167, epsilon = 0.002);
    }

    #[test]
    fn test_angular_diameter_about_half_degree() {
        let d = Sun.angular_diameter(&ut(2020, 3, 1, 0, 0));
        assert!((0.52..=0.55).contains(&d), "{d}");
    }

    #[test]
    fn test_coordinates_are_apparent() {
        assert!(Sun.coordinates(&ut(2020, 1, 1, 0, 0)).is_apparent());
    }
}
