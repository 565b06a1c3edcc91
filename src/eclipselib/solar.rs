//! Solar eclipse prediction
//!
//! A two-stage search: the parameter provider locates new moons near a
//! node (Meeus chapter 54) to get an approximate instant of greatest
//! eclipse, a bidirectional probe checks whether any of it is visible from
//! the observer's location, and the binary/ternary searches then pin the
//! local start, end, and peak of the disk overlap.

use chrono::{DateTime, Datelike, Duration, Utc};

use crate::locators::{CelestialLocator, Moon, MoonTruePhase, Sun};
use crate::mathlib::{cos_degrees, normalize_angle, polynomial, sin_degrees};
use crate::risesetlib::position_from_coordinates;
use crate::searchlib::{find_end, find_event, find_peak, find_start, Range};
use crate::timelib::{delta_t, from_julian_day, UniversalTime, UniversalTimeExt};
use crate::unitslib::{Coordinate, HorizonCoordinate};

use super::{Eclipse, EclipseCalculator};

/// Rows: coefficient (1e-4 days), whether the E factor applies, then
/// multiples of (M, M', F1, A1, omega) inside the sine.
#[rustfmt::skip]
const TIME_CORRECTION_TERMS: [(i32, bool, i32, i32, i32, i32, i32); 16] = [
    (-4075, false, 0, 1, 0, 0, 0),
    (1721, true, 1, 0, 0, 0, 0),
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

#[rustfmt::skip]
const Q_TERMS: [(i32, bool, i32, i32); 6] = [
    (52207, false, 0, 0),
    (-48, true, 1, 0),
    (20, true, 2, 0),
    (-3299, false, 0, 1),
    (-60, true, 1, 1),
    (41, true, -1, 1),
];

/// Geometry of one new moon near a node.
#[derive(Debug, Clone, PartialEq)]
pub struct SolarEclipseParameters {
    /// Instant of greatest eclipse (UT)
    pub maximum: DateTime<Utc>,
    /// Least distance of the Moon's shadow axis from the Earth's center,
    /// in equatorial Earth radii (signed)
    pub gamma: f64,
    /// Radius of the umbral cone in the fundamental plane, Earth radii
    pub umbral_cone_radius: f64,
}

pub(crate) fn next_solar_eclipse_parameters(after: DateTime<Utc>) -> SolarEclipseParameters {
    let ut = after.naive_utc();
    let mut k = Moon.next_phase_k(&ut, MoonTruePhase::New);

    let mut t;
    let mut f;
    loop {
        t = k / 1236.85;
        f = normalize_angle(
            160.7108 + 390.67050284 * k - 0.0016118 * t * t - 0.00000227 * t * t * t
                + 0.000000011 * t * t * t * t,
        );
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

    let datetime = from_julian_day(corrected_jd);
    let maximum = datetime.to_instant() - Duration::seconds(delta_t(datetime.year()) as i64);

    SolarEclipseParameters {
        maximum,
        gamma,
        umbral_cone_radius: u,
    }
}

fn jde_of_mean_moon_phase(k: f64) -> f64 {
    let t = k / 1236.85;
    2_451_550.097_66 + 29.530588861 * k + 0.00015437 * t * t - 0.00000015 * t * t * t
        + 0.00000000074 * t * t * t * t
}

/// Finds the next solar eclipse visible from a location.
#[derive(Debug, Clone)]
pub struct SolarEclipseCalculator {
    /// Step used when refining contact times
    precision: Duration,
    /// How far into the future to search before giving up
    max_duration: Duration,
    /// Windows shorter than this are discarded as artifacts
    min_eclipse_duration: Duration,
}

impl Default for SolarEclipseCalculator {
    fn default() -> Self {
        Self::new(Duration::minutes(1), None)
    }
}

impl SolarEclipseCalculator {
    pub fn new(precision: Duration, max_duration: Option<Duration>) -> Self {
        SolarEclipseCalculator {
            precision,
            max_duration: max_duration.unwrap_or_else(|| Duration::days(365 * 5)),
            min_eclipse_duration: Duration::minutes(1),
        }
    }

    /// Magnitude and obscuration of a solar eclipse in progress at an
    /// instant, or zeros when the disks do not overlap.
    pub fn magnitude_at(&self, time: &UniversalTime, location: &Coordinate) -> (f64, f64) {
        let sun = observed_position(&Sun, time, location);
        let moon = observed_position(&Moon, time, location);
        magnitude(time, location, &sun, &moon)
    }

    fn next_eclipse_time(
        &self,
        after: DateTime<Utc>,
        location: &Coordinate,
    ) -> Option<DateTime<Utc>> {
        let mut time_from_start = Duration::days(-10);

        // Missing a sub-15-minute partial is accepted in exchange for a
        // tractable scan
        let probe_step = Duration::minutes(15);

        while time_from_start < self.max_duration {
            let current = after + time_from_start;
            let parameters = next_solar_eclipse_parameters(current);

            let search_amount = Duration::hours(4);
            let minimum = (parameters.maximum - search_amount).max(after);
            let maximum = (parameters.maximum + search_amount).max(after);
            let start = parameters.maximum.max(after);

            let visible = find_event(
                &Range::new(minimum, maximum),
                probe_step,
                Some(start),
                |time| self.eclipse_in_progress(&time.naive_utc(), location),
            );

            if let Some(time) = visible {
                return Some(time);
            }

            time_from_start =
                time_from_start + (parameters.maximum - current) + Duration::days(10);
        }

        None
    }

    fn eclipse_in_progress(&self, ut: &UniversalTime, location: &Coordinate) -> bool {
        let sun = observed_position(&Sun, ut, location);
        if sun.altitude < 0.0 {
            return false;
        }

        let moon = observed_position(&Moon, ut, location);
        if moon.altitude < 0.0 {
            return false;
        }

        magnitude(ut, location, &sun, &moon).0 > 0.0
    }
}

impl EclipseCalculator for SolarEclipseCalculator {
    fn next_eclipse(&self, after: DateTime<Utc>, location: &Coordinate) -> Option<Eclipse> {
        let approximate = self.next_eclipse_time(after, location)?;

        // Pin the local contacts by searching outward from the known
        // in-progress instant
        let max_search = Duration::hours(12);
        let min_time = approximate - max_search;
        let max_time = approximate + max_search;

        let start = find_start(
            &Range::new(min_time, approximate),
            self.precision,
            |time| self.eclipse_in_progress(&time.naive_utc(), location),
        )?;

        let end = find_end(&Range::new(approximate, max_time), self.precision, |time| {
            self.eclipse_in_progress(&time.naive_utc(), location)
        })?;

        let peak = find_peak(&Range::new(start, end), self.precision, |time| {
            let ut = time.naive_utc();
            let sun = observed_position(&Sun, &ut, location);
            if sun.altitude < 0.0 {
                return 0.0;
            }
            let moon = observed_position(&Moon, &ut, location);
            if moon.altitude < 0.0 {
                return 0.0;
            }
            magnitude(&ut, location, &sun, &moon).0
        });

        let (max_magnitude, max_obscuration) = self.magnitude_at(&peak.naive_utc(), location);

        if end - start < self.min_eclipse_duration {
            return None;
        }

        Some(Eclipse {
            start,
            end,
            magnitude: max_magnitude,
            obscuration: max_obscuration,
            maximum: peak,
        })
    }
}

/// Topocentric position with refraction and parallax, as an observer
/// would line the disks up in the sky.
fn observed_position<L: CelestialLocator>(
    locator: &L,
    ut: &UniversalTime,
    location: &Coordinate,
) -> HorizonCoordinate {
    let coordinates = locator.coordinates(ut);
    position_from_coordinates(&coordinates, ut, location, true, locator.distance(ut))
}

/// Eclipse magnitude and obscuration from the disk geometry at an instant.
fn magnitude(
    ut: &UniversalTime,
    location: &Coordinate,
    sun: &HorizonCoordinate,
    moon: &HorizonCoordinate,
) -> (f64, f64) {
    let angular_distance = sun.angular_distance_to(moon);
    let moon_radius = Moon.angular_diameter(ut, location) / 2.0;
    let sun_radius = Sun.angular_diameter(ut) / 2.0;
    disk_overlap(angular_distance, moon_radius, sun_radius)
}

/// Magnitude (covered fraction of the Sun's diameter) and obscuration
/// (covered fraction of its area) for two disks at a given separation.
fn disk_overlap(angular_distance: f64, moon_radius: f64, sun_radius: f64) -> (f64, f64) {
    // No contact
    if angular_distance > moon_radius + sun_radius {
        return (0.0, 0.0);
    }

    // Total or annular: one disk entirely within the other
    if angular_distance <= (moon_radius - sun_radius).abs() {
        let diameter_ratio = moon_radius / sun_radius;
        return if sun_radius <= moon_radius {
            (diameter_ratio, 1.0)
        } else {
            let sun_area = std::f64::consts::PI * sun_radius * sun_radius;
            let moon_area = std::f64::consts::PI * moon_radius * moon_radius;
            (diameter_ratio, moon_area / sun_area)
        };
    }

    // Partial: sum the two circular segments on either side of the chord
    let distance2 = angular_distance * angular_distance;
    let moon_radius2 = moon_radius * moon_radius;
    let sun_radius2 = sun_radius * sun_radius;

    let s = (distance2 + sun_radius2 - moon_radius2) / (2.0 * angular_distance);
    let m = (distance2 + moon_radius2 - sun_radius2) / (2.0 * angular_distance);

    let h = (4.0 * distance2 * sun_radius2 - (distance2 + sun_radius2 - moon_radius2).powi(2))
        .sqrt()
        / (2.0 * angular_distance);

    let triangle_sun = h * s;
    let triangle_moon = h * m;

    let sector_sun = sun_radius2 * (s / sun_radius).acos();
    let sector_moon = moon_radius2 * (m / moon_radius).acos();

    let area = (sector_sun - triangle_sun) + (sector_moon - triangle_moon);
    let obscuration = area / (std::f64::consts::PI * sun_radius2);

    let overlap_length = (sun_radius + moon_radius) - (s + m).abs();
    let magnitude = overlap_length / (2.0 * sun_radius);

    (magnitude, obscuration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    #[test]
    fn test_disk_overlap_no_contact() {
        assert_eq!(disk_overlap(1.0, 0.25, 0.25), (0.0, 0.0));
    }

    #[test]
    fn test_disk_overlap_total() {
        let (magnitude, obscuration) = disk_overlap(0.0, 0.27, 0.25);
        assert_relative_eq!(magnitude, 0.27 / 0.25, epsilon = 1e-12);
        assert_relative_eq!(obscuration, 1.0);
    }

    #[test]
    fn test_disk_overlap_annular() {
        // Moon smaller than the Sun and fully inside its disk
        let (magnitude, obscuration) = disk_overlap(0.0, 0.24, 0.25);
        assert_relative_eq!(magnitude, 0.24 / 0.25, epsilon = 1e-12);
        assert_relative_eq!(obscuration, (0.24 * 0.24) / (0.25 * 0.25), epsilon = 1e-12);
    }

    #[test]
    fn test_disk_overlap_partial_half_cover() {
        // Equal disks with centers one radius apart cover about 39% of
        // each other's area
        let (magnitude, obscuration) = disk_overlap(0.25, 0.25, 0.25);
        assert_relative_eq!(magnitude, 0.5, epsilon = 1e-9);
        assert!(obscuration > 0.35 && obscuration < 0.45, "{obscuration}");
    }

    #[test]
    fn test_parameters_find_2024_04_08_eclipse() {
        let after = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let parameters = next_solar_eclipse_parameters(after);
        assert_eq!(
            parameters.maximum.date_naive(),
            chrono::NaiveDate::from_ymd_opt(2024, 4, 8).unwrap()
        );
        // A central (total) eclipse: shadow axis close to the Earth's
        // center
        assert!(parameters.gamma.abs() < 0.5, "gamma {}", parameters.gamma);
    }

    #[test]
    fn test_next_eclipse_2024_04_08_from_dallas() {
        // Dallas was in the path of totality
        let dallas = Coordinate::new(32.7767, -96.7970).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

        let eclipse = SolarEclipseCalculator::default()
            .next_eclipse(after, &dallas)
            .expect("eclipse expected in spring 2024");

        assert_eq!(
            eclipse.maximum.date_naive(),
            chrono::NaiveDate::from_ymd_opt(2024, 4, 8).unwrap()
        );
        assert!(eclipse.magnitude > 0.95, "magnitude {}", eclipse.magnitude);
        assert!(eclipse.start < eclipse.maximum && eclipse.maximum < eclipse.end);
        // The whole partial-to-partial window spans about 2.5 hours
        let hours = eclipse.duration().num_minutes() as f64 / 60.0;
        assert!((1.5..=3.5).contains(&hours), "duration {hours} h");
    }

    #[test]
    fn test_search_horizon_limits_result() {
        // No visible solar eclipse from London within a short window after
        // mid-2021's annular eclipse passed
        let london = Coordinate::new(51.5074, -0.1278).unwrap();
        let after = Utc.with_ymd_and_hms(2021, 7, 1, 0, 0, 0).unwrap();
        let calculator =
            SolarEclipseCalculator::new(Duration::minutes(1), Some(Duration::days(30)));
        assert!(calculator.next_eclipse(after, &london).is_none());
    }
}
