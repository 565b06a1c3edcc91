//! Lunar (umbral) eclipse prediction
//!
//! The parameter provider walks full moons using the Meeus chapter 54
//! series until it finds one close enough to a lunar node for an eclipse.
//! The total and partial calculators differ only in the umbral magnitude
//! they demand and in which shadow contact defines the semiduration.

use chrono::{DateTime, Datelike, Duration, Utc};
use nalgebra::Vector2;

use crate::locators::{Moon, MoonTruePhase};
use crate::mathlib::{cos_degrees, normalize_angle, polynomial, sin_degrees};
use crate::risesetlib::altitude_of;
use crate::searchlib::Range;
use crate::timelib::{delta_t, from_julian_day, UniversalTimeExt};
use crate::unitslib::Coordinate;

use super::{intersection_area, Circle, Eclipse, EclipseCalculator};

/// The Moon's diameter in Earth radii, as used by the umbral magnitude.
const MOON_DIAMETER_EARTH_RADII: f64 = 0.545;

/// Rows: coefficient (1e-4 days), whether the E factor applies, then
/// multiples of (M, M', F1, A1, omega) inside the sine.
#[rustfmt::skip]
const TIME_CORRECTION_TERMS: [(i32, bool, i32, i32, i32, i32, i32); 16] = [
    (-4065, false, 0, 1, 0, 0, 0),
    (1727, true, 1, 0, 0, 0, 0),
    (161, false, 0, 2, 0, 0, 0),
    (-97, false, 0, 0, 2, 0, 0),
    (73, true, -1, 1, 0, 0, 0),
    (-50, true, 1, 1, 0, 0, 0),
    (-23, false, 0, 1, -2, 0, 0),
    (21, true, 2, 0, 0, 0, 0),
    (12, false, 0, 1, 2, 0, 0),
    (6, true, 1, 2, 0, 0, 0),
    (-4, false, 0, 3, 0, 0, 0),
    (-3, true, 1, 0, 2, 0, 0),
    (3, false, 0, 0, 0, 1, 0),
    (-2, true, 1, 0, -2, 0, 0),
    (-2, true, -1, 2, 0, 0, 0),
    (-2, false, 0, 0, 0, 0, 1),
];

/// Rows: coefficient (1e-4), E factor flag, multiples of (M, M', F1)
/// inside the sine.
#[rustfmt::skip]
const P_TERMS: [(i32, bool, i32, i32, i32); 7] = [
    (2070, true, 1, 0, 0),
    (24, true, 2, 0, 0),
    (-392, false, 0, 1, 0),
    (116, false, 0, 2, 0),
    (-73, true, 1, 1, 0),
    (67, true, -1, 1, 0),
    (118, false, 0, 0, 2),
];

/// Rows: coefficient (1e-4), E factor flag, multiples of (M, M') inside
/// the cosine.
#[rustfmt::skip]
const Q_TERMS: [(i32, bool, i32, i32); 6] = [
    (52207, false, 0, 0),
    (-48, true, 1, 0),
    (20, true, 2, 0),
    (-3299, false, 0, 1),
    (-60, true, 1, 1),
    (41, true, -1, 1),
];

/// Shadow geometry of one full moon near a node.
#[derive(Debug, Clone, PartialEq)]
pub struct LunarEclipseParameters {
    /// Instant of greatest eclipse (UT)
    pub maximum: DateTime<Utc>,
    /// Least distance of the Moon's center from the shadow axis, in
    /// equatorial Earth radii (signed)
    pub min_distance_from_center: f64,
    /// Radius of the umbral cone in the fundamental plane, Earth radii
    pub umbral_cone_radius: f64,
    /// The Moon's hourly motion parameter used for contact durations
    pub n: f64,
}

/// Find the geometry of the first candidate lunar eclipse after an
/// instant.
pub(crate) fn next_lunar_eclipse_parameters(after: DateTime<Utc>) -> LunarEclipseParameters {
    let ut = after.naive_utc();
    let mut k = Moon.next_phase_k(&ut, MoonTruePhase::Full);

    let mut t;
    let mut f;
    loop {
        t = k / 1236.85;
        f = normalize_angle(
            160.7108 + 390.67050284 * k - 0.0016118 * t * t - 0.00000227 * t * t * t
                + 0.000000011 * t * t * t * t,
        );
        // Full moons more than ~21 degrees from a node cannot eclipse
        if sin_degrees(f).abs() > 0.36 {
            k += 1.0;
        } else {
            break;
        }
    }

    let mean = jde_of_mean_moon_phase(k);
    let m = normalize_angle(2.5534 + 29.1053567 * k - 0.0000014 * t * t - 0.00000011 * t * t * t);
    let m_prime = normalize_angle(
        201.5643 + 385.81693528 * k + 0.0107582 * t * t + 0.00001238 * t * t * t
            - 0.000000058 * t * t * t * t,
    );
    let omega =
        normalize_angle(124.7746 - 1.56375588 * k + 0.0020672 * t * t + 0.00000215 * t * t * t);
    let e = polynomial(t, &[1.0, -0.002516, -0.0000074]);

    let f1 = f - 0.02665 * sin_degrees(omega);
    let a1 = 299.77 + 0.107408 * k - 0.009173 * t * t;

    let mut correction = 0.0;
    for &(coefficient, uses_e, rm, rmp, rf, ra, ro) in &TIME_CORRECTION_TERMS {
        correction += (coefficient as f64 / 10_000.0)
            * if uses_e { e } else { 1.0 }
            * sin_degrees(
                rm as f64 * m
                    + rmp as f64 * m_prime
                    + rf as f64 * f1
                    + ra as f64 * a1
                    + ro as f64 * omega,
            );
    }

    let corrected_jd = mean + correction;

    let mut p = 0.0;
    for &(coefficient, uses_e, rm, rmp, rf) in &P_TERMS {
        p += (coefficient as f64 / 10_000.0)
            * if uses_e { e } else { 1.0 }
            * sin_degrees(rm as f64 * m + rmp as f64 * m_prime + rf as f64 * f1);
    }

    let mut q = 0.0;
    for &(coefficient, uses_e, rm, rmp) in &Q_TERMS {
        q += (coefficient as f64 / 10_000.0)
            * if uses_e { e } else { 1.0 }
            * cos_degrees(rm as f64 * m + rmp as f64 * m_prime);
    }

    let w = cos_degrees(f1).abs();
    let gamma = (p * cos_degrees(f1) + q * sin_degrees(f1)) * (1.0 - 0.0048 * w);
    let u = 0.0059 + 0.0046 * e * cos_degrees(m) - 0.0182 * cos_degrees(m_prime)
        + 0.0004 * cos_degrees(2.0 * m_prime)
        - 0.0005 * cos_degrees(m + m_prime);
    let n = 0.5458 + 0.04 * cos_degrees(m_prime);

    let datetime = from_julian_day(corrected_jd);
    let maximum = datetime.to_instant() - Duration::seconds(delta_t(datetime.year()) as i64);

    LunarEclipseParameters {
        maximum,
        min_distance_from_center: gamma,
        umbral_cone_radius: u,
        n,
    }
}

fn jde_of_mean_moon_phase(k: f64) -> f64 {
    let t = k / 1236.85;
    2_451_550.097_66 + 29.530588861 * k + 0.00015437 * t * t - 0.00000015 * t * t * t
        + 0.00000000074 * t * t * t * t
}

fn umbral_magnitude(parameters: &LunarEclipseParameters) -> f64 {
    (1.0128 - parameters.umbral_cone_radius - parameters.min_distance_from_center.abs())
        / MOON_DIAMETER_EARTH_RADII
}

/// Half the duration between shadow contacts with the given contact
/// radius (1.0128 for the partial umbral phase, 0.4678 for totality).
fn semi_duration(parameters: &LunarEclipseParameters, contact_radius: f64) -> Duration {
    let p = contact_radius - parameters.umbral_cone_radius;
    let gamma = parameters.min_distance_from_center;
    let minutes = 60.0 / parameters.n * (p * p - gamma * gamma).sqrt();
    Duration::seconds((minutes * 60.0) as i64)
}

fn next_umbral_eclipse(
    after: DateTime<Utc>,
    location: &Coordinate,
    magnitude_threshold: f64,
    contact_radius: f64,
) -> Option<Eclipse> {
    let at_least = after;
    let mut search_from = after - Duration::days(20);

    for _ in 0..100 {
        let parameters = next_lunar_eclipse_parameters(search_from);
        let advance = parameters.maximum + Duration::days(10);

        let magnitude = umbral_magnitude(&parameters);
        if magnitude < magnitude_threshold {
            search_from = advance;
            continue;
        }

        let semi = semi_duration(&parameters, contact_radius);
        let window = Range::new(parameters.maximum - semi, parameters.maximum + semi);

        if window.end <= at_least {
            search_from = advance;
            continue;
        }

        let moon_up = |time: DateTime<Utc>| {
            altitude_of(&Moon, &time.naive_utc(), location, false, false) > 0.0
        };

        if moon_up(window.start) || moon_up(window.end) {
            let moon_radius = MOON_DIAMETER_EARTH_RADII / 2.0;
            let umbra_radius = 0.7403 - parameters.umbral_cone_radius;

            let moon_disk = Circle::new(Vector2::new(0.0, 0.0), moon_radius);
            let umbra = Circle::new(
                Vector2::new(parameters.min_distance_from_center, 0.0),
                umbra_radius,
            );
            let obscuration = intersection_area(&umbra, &moon_disk) / moon_disk.area();

            return Some(Eclipse {
                start: window.start,
                end: window.end,
                magnitude,
                obscuration,
                maximum: parameters.maximum,
            });
        }

        search_from = advance;
    }

    None
}

/// Finds total lunar eclipses (the Moon fully inside the umbra).
#[derive(Debug, Clone, Copy, Default)]
pub struct TotalLunarEclipseCalculator;

impl EclipseCalculator for TotalLunarEclipseCalculator {
    fn next_eclipse(&self, after: DateTime<Utc>, location: &Coordinate) -> Option<Eclipse> {
        next_umbral_eclipse(after, location, 1.0, 0.4678)
    }
}

/// Finds partial (or better) umbral lunar eclipses.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialLunarEclipseCalculator;

impl EclipseCalculator for PartialLunarEclipseCalculator {
    fn next_eclipse(&self, after: DateTime<Utc>, location: &Coordinate) -> Option<Eclipse> {
        next_umbral_eclipse(after, location, 0.0, 1.0128)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parameters_fall_on_a_full_moon_near_a_node() {
        let after = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        let parameters = next_lunar_eclipse_parameters(after);

        // The full moon of 2022-05-16 produced a total lunar eclipse with
        // greatest eclipse near 04:11 UT
        assert_eq!(
            parameters.maximum.date_naive(),
            chrono::NaiveDate::from_ymd_opt(2022, 5, 16).unwrap()
        );
        assert!(parameters.min_distance_from_center.abs() < 0.6);
    }

    #[test]
    fn test_total_eclipse_2022_05_16_visible_from_new_york() {
        let nyc = Coordinate::new(40.7128, -74.0060).unwrap();
        let after = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();

        let eclipse = TotalLunarEclipseCalculator
            .next_eclipse(after, &nyc)
            .expect("total eclipse expected in 2022");

        assert_eq!(
            eclipse.maximum.date_naive(),
            chrono::NaiveDate::from_ymd_opt(2022, 5, 16).unwrap()
        );
        assert!(eclipse.magnitude >= 1.0, "magnitude {}", eclipse.magnitude);
        assert!(eclipse.start < eclipse.maximum && eclipse.maximum < eclipse.end);
        // Totality lasted roughly 85 minutes
        let duration = eclipse.duration().num_minutes();
        assert!((60..=110).contains(&duration), "duration {duration} min");
    }

    #[test]
    fn test_partial_threshold_admits_more_eclipses() {
        let nyc = Coordinate::new(40.7128, -74.0060).unwrap();
        let after = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();

        // 2023-10-28 had a partial (non-total) umbral eclipse; the partial
        // calculator should find an eclipse before the total one does
        let partial = PartialLunarEclipseCalculator.next_eclipse(after, &nyc);
        let total = TotalLunarEclipseCalculator.next_eclipse(after, &nyc);

        let partial = partial.expect("partial eclipse expected");
        if let Some(total) = total {
            assert!(partial.maximum <= total.maximum);
        }
    }

    #[test]
    fn test_eclipse_window_ends_after_query_instant() {
        let location = Coordinate::new(51.5, 0.0).unwrap();
        let after = Utc.with_ymd_and_hms(2022, 5, 16, 6, 0, 0).unwrap();

        // Asking after the May eclipse has ended must not return it
        if let Some(eclipse) = PartialLunarEclipseCalculator.next_eclipse(after, &location) {
            assert!(eclipse.end > after);
        }
    }
}
