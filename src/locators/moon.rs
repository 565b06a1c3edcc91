//! Lunar position from the abridged ELP theory of Meeus chapter 47
//!
//! The periodic-term tables give the Moon's ecliptic longitude, latitude,
//! and distance to roughly 10 arcseconds and 40 km, which the horizon
//! transform then converts (with parallax, for which the distance matters a
//! great deal) into topocentric coordinates.

use chrono::{Datelike, Timelike};

use crate::mathlib::{cos_degrees, normalize_angle, polynomial, sin_degrees};
use crate::nutationlib;
use crate::timelib::{UniversalTime, UniversalTimeExt};
use crate::unitslib::{kilometer, Coordinate, EclipticCoordinate, EquatorialCoordinate, Length};

use super::{CelestialLocator, Sun};

/// Rows of Meeus table 47.A: multiples of (D, M, M', F), then the sine
/// coefficient for longitude (1e-6 degrees) and the cosine coefficient for
/// distance (1e-3 km).
#[rustfmt::skip]
const TABLE_47A: [(i32, i32, i32, i32, i64, i64); 60] = [
    (0, 0, 1, 0, 6_288_774, -20_905_355),
    (2, 0, -1, 0, 1_274_027, -3_699_111),
    (2, 0, 0, 0, 658_314, -2_955_968),
    (0, 0, 2, 0, 213_618, -569_925),
    (0, 1, 0, 0, -185_116, 48_888),
    (0, 0, 0, 2, -114_332, -3_149),
    (2, 0, -2, 0, 58_793, 246_158),
    (2, -1, -1, 0, 57_066, -152_138),
    (2, 0, 1, 0, 53_322, -170_733),
    (2, -1, 0, 0, 45_758, -204_586),
    (0, 1, -1, 0, -40_923, -129_620),
    (1, 0, 0, 0, -34_720, 108_743),
    (0, 1, 1, 0, -30_383, 104_755),
    (2, 0, 0, -2, 15_327, 10_321),
    (0, 0, 1, 2, -12_528, 0),
    (0, 0, 1, -2, 10_980, 79_661),
    (4, 0, -1, 0, 10_675, -34_782),
    (0, 0, 3, 0, 10_034, -23_210),
    (4, 0, -2, 0, 8_548, -21_636),
    (2, 1, -1, 0, -7_888, 24_208),
    (2, 1, 0, 0, -6_766, 30_824),
    (1, 0, -1, 0, -5_163, -8_379),
    (1, 1, 0, 0, 4_987, -16_675),
    (2, -1, 1, 0, 4_036, -12_831),
    (2, 0, 2, 0, 3_994, -10_445),
    (4, 0, 0, 0, 3_861, -11_650),
    (2, 0, -3, 0, 3_665, 14_403),
    (0, 1, -2, 0, -2_689, -7_003),
    (2, 0, -1, 2, -2_602, 0),
    (2, -1, -2, 0, 2_390, 10_056),
    (1, 0, 1, 0, -2_348, 6_322),
    (2, -2, 0, 0, 2_236, -9_884),
    (0, 1, 2, 0, -2_120, 5_751),
    (0, 2, 0, 0, -2_069, 0),
    (2, -2, -1, 0, 2_048, -4_950),
    (2, 0, 1, -2, -1_773, 4_130),
    (2, 0, 0, 2, -1_595, 0),
    (4, -1, -1, 0, 1_215, -3_958),
    (0, 0, 2, 2, -1_110, 0),
    (3, 0, -1, 0, -892, 3_258),
    (2, 1, 1, 0, -810, 2_616),
    (4, -1, -2, 0, 759, -1_897),
    (0, 2, -1, 0, -713, -2_117),
    (2, 2, -1, 0, -700, 2_354),
    (2, 1, -2, 0, 691, 0),
    (2, -1, 0, -2, 596, 0),
    (4, 0, 1, 0, 549, -1_423),
    (0, 0, 4, 0, 537, -1_117),
    (4, -1, 0, 0, 520, -1_571),
    (1, 0, -2, 0, -487, -1_739),
    (2, 1, 0, -2, -399, 0),
    (0, 0, 2, -2, -381, -4_421),
    (1, 1, 1, 0, 351, 0),
    (3, 0, -2, 0, -340, 0),
    (4, 0, -3, 0, 330, 0),
    (2, -1, 2, 0, 327, 0),
    (0, 2, 1, 0, -323, 1_165),
    (1, 1, -1, 0, 299, 0),
    (2, 0, 3, 0, 294, 0),
    (2, 0, -1, -2, 0, 8_752),
];

/// Rows of Meeus table 47.B: multiples of (D, M, M', F) and the sine
/// coefficient for ecliptic latitude (1e-6 degrees).
#[rustfmt::skip]
const TABLE_47B: [(i32, i32, i32, i32, i64); 60] = [
    (0, 0, 0, 1, 5_128_122),
    (0, 0, 1, 1, 280_602),
    (0, 0, 1, -1, 277_693),
    (2, 0, 0, -1, 173_237),
    (2, 0, -1, 1, 55_413),
    (2, 0, -1, -1, 46_271),
    (2, 0, 0, 1, 32_573),
    (0, 0, 2, 1, 17_198),
    (2, 0, 1, -1, 9_266),
    (0, 0, 2, -1, 8_822),
    (2, -1, 0, -1, 8_216),
    (2, 0, -2, -1, 4_324),
    (2, 0, 1, 1, 4_200),
    (2, 1, 0, -1, -3_359),
    (2, -1, -1, 1, 2_463),
    (2, -1, 0, 1, 2_211),
    (2, -1, -1, -1, 2_065),
    (0, 1, -1, -1, -1_870),
    (4, 0, -1, -1, 1_828),
    (0, 1, 0, 1, -1_794),
    (0, 0, 0, 3, -1_749),
    (0, 1, -1, 1, -1_565),
    (1, 0, 0, 1, -1_491),
    (0, 1, 1, 1, -1_475),
    (0, 1, 1, -1, -1_410),
    (0, 1, 0, -1, -1_344),
    (1, 0, 0, -1, -1_335),
    (0, 0, 3, 1, 1_107),
    (4, 0, 0, -1, 1_021),
    (4, 0, -1, 1, 833),
    (0, 0, 1, -3, 777),
    (4, 0, -2, 1, 671),
    (2, 0, 0, -3, 607),
    (2, 0, 2, -1, 596),
    (2, -1, 1, -1, 491),
    (2, 0, -2, 1, -451),
    (0, 0, 3, -1, 439),
    (2, 0, 2, 1, 422),
    (2, 0, -3, -1, 421),
    (2, 1, -1, 1, -366),
    (2, 1, 0, 1, -351),
    (4, 0, 0, 1, 331),
    (2, -1, 1, 1, 315),
    (2, -2, 0, -1, 302),
    (0, 0, 1, 3, -283),
    (2, 1, 1, -1, -229),
    (1, 1, 0, -1, 223),
    (1, 1, 0, 1, 223),
    (0, 1, -2, -1, -220),
    (2, 1, -1, -1, -220),
    (1, 0, 1, 1, -185),
    (2, -1, -2, -1, 181),
    (0, 1, 2, 1, -177),
    (4, 0, -2, -1, 176),
    (4, -1, -1, -1, 166),
    (1, 0, 1, -1, -164),
    (4, 0, 1, -1, 132),
    (1, 0, -1, -1, -119),
    (4, -1, 0, -1, 115),
    (2, -2, 0, 1, 107),
];

/// The Moon.
#[derive(Debug, Clone, Copy, Default)]
pub struct Moon;

impl CelestialLocator for Moon {
    fn coordinates(&self, ut: &UniversalTime) -> EquatorialCoordinate {
        let t = ut.julian_centuries();
        let l = normalize_angle(polynomial(
            t,
            &[
                218.3164477,
                481_267.88123421,
                -0.0015786,
                1.0 / 538_841.0,
                -1.0 / 65_194_000.0,
            ],
        ));

        let d = mean_elongation(t);
        let m = Sun.mean_anomaly(ut);
        let m_prime = mean_anomaly(t);
        let f = argument_of_latitude(t);

        let a1 = normalize_angle(119.75 + 131.849 * t);
        let a2 = normalize_angle(53.09 + 479_264.290 * t);
        let a3 = normalize_angle(313.45 + 481_266.484 * t);
        let e = eccentricity_factor(t);
        let e2 = e * e;

        let mut sum_l = 0.0;
        let mut sum_b = 0.0;

        for &(rd, rm, rmp, rf, coef, _) in &TABLE_47A {
            let e_term = match rm.abs() {
                1 => e,
                2 => e2,
                _ => 1.0,
            };
            sum_l += coef as f64
                * e_term
                * sin_degrees(rd as f64 * d + rm as f64 * m + rmp as f64 * m_prime + rf as f64 * f);
        }

        for &(rd, rm, rmp, rf, coef) in &TABLE_47B {
            let e_term = match rm.abs() {
                1 => e,
                2 => e2,
                _ => 1.0,
            };
            sum_b += coef as f64
                * e_term
                * sin_degrees(rd as f64 * d + rm as f64 * m + rmp as f64 * m_prime + rf as f64 * f);
        }

        sum_l += 3958.0 * sin_degrees(a1) + 1962.0 * sin_degrees(l - f) + 318.0 * sin_degrees(a2);
        sum_b += -2235.0 * sin_degrees(l)
            + 382.0 * sin_degrees(a3)
            + 175.0 * sin_degrees(a1 - f)
            + 175.0 * sin_degrees(a1 + f)
            + 127.0 * sin_degrees(l - m_prime)
            - 115.0 * sin_degrees(l + m_prime);

        let apparent_longitude =
            l + sum_l / 1_000_000.0 + nutationlib::nutation_in_longitude(ut);
        let ecliptic_latitude = sum_b / 1_000_000.0;
        let obliquity = nutationlib::true_obliquity_of_ecliptic(ut);

        EclipticCoordinate::new(ecliptic_latitude, apparent_longitude).to_equatorial(obliquity)
    }

    fn distance(&self, ut: &UniversalTime) -> Option<Length> {
        Some(Length::new::<kilometer>(self.distance_km(ut)))
    }
}

impl Moon {
    fn distance_km(&self, ut: &UniversalTime) -> f64 {
        let t = ut.julian_centuries();
        let d = mean_elongation(t);
        let f = argument_of_latitude(t);
        let m = Sun.mean_anomaly(ut);
        let m_prime = mean_anomaly(t);
        let e = eccentricity_factor(t);
        let e2 = e * e;

        let mut sum_r = 0.0;
        for &(rd, rm, rmp, rf, _, coef) in &TABLE_47A {
            let e_term = match rm.abs() {
                1 => e,
                2 => e2,
                _ => 1.0,
            };
            sum_r += coef as f64
                * e_term
                * cos_degrees(rd as f64 * d + rm as f64 * m + rmp as f64 * m_prime + rf as f64 * f);
        }

        385_000.56 + sum_r / 1000.0
    }

    /// Apparent angular diameter in degrees, including the topocentric
    /// enlargement for an observer who sees the Moon overhead.
    pub fn angular_diameter(&self, ut: &UniversalTime, location: &Coordinate) -> f64 {
        let distance = self.distance_km(ut);
        let s = 358_743_400.0 / distance;
        let sin_pi = crate::constants::EARTH_EQUATORIAL_RADIUS_KM / distance;
        let h = crate::risesetlib::altitude_of(&Moon, ut, location, true, false);
        (s * (1.0 + sin_degrees(h) * sin_pi)) * 0.000277778 * 2.0
    }

    /// Mean anomaly in degrees.
    pub fn mean_anomaly(&self, ut: &UniversalTime) -> f64 {
        mean_anomaly(ut.julian_centuries())
    }

    /// The Moon's phase and illuminated fraction at an instant.
    pub fn phase(&self, ut: &UniversalTime) -> MoonPhase {
        let phase_angle = self.phase_angle(ut);
        let illumination = illumination(phase_angle);

        for phase in MoonTruePhase::ALL {
            let (start, end) = phase.angles();
            if start <= phase_angle && end >= phase_angle {
                return MoonPhase {
                    phase,
                    illumination,
                };
            }

            // The new-moon window wraps around 360
            if start >= end && (start <= phase_angle || end >= phase_angle) {
                return MoonPhase {
                    phase,
                    illumination,
                };
            }
        }

        MoonPhase {
            phase: MoonTruePhase::New,
            illumination,
        }
    }

    /// Phase angle in degrees: 0 at new moon, 180 at full.
    pub fn phase_angle(&self, ut: &UniversalTime) -> f64 {
        let t = ut.julian_centuries();
        let d = mean_elongation(t);
        let m = Sun.mean_anomaly(ut);
        let mp = mean_anomaly(t);

        let i = 180.0 - d - 6.289 * sin_degrees(mp) + 2.100 * sin_degrees(m)
            - 1.274 * sin_degrees(2.0 * d - mp)
            - 0.658 * sin_degrees(2.0 * d)
            - 0.214 * sin_degrees(2.0 * mp)
            - 0.110 * sin_degrees(d);

        (i + 180.0).rem_euclid(360.0)
    }

    /// The lunation number `k` (Meeus chapter 49) of the next occurrence of
    /// a given true phase after an instant.
    pub fn next_phase_k(&self, ut: &UniversalTime, phase: MoonTruePhase) -> f64 {
        let year = ut.year() as f64
            + ut.ordinal() as f64 / 365.25
            + (ut.hour() as f64 / 24.0) / 365.25
            + ((ut.minute() as f64 / 60.0) / 24.0) / 365.25;
        let k = (year - 2000.0) * 12.3685;

        let ending = phase.k_fraction();
        let int_k = k.floor();
        let remainder = k.rem_euclid(1.0);

        if remainder > ending {
            int_k + 1.0 + ending
        } else {
            int_k + ending
        }
    }
}

fn illumination(phase_angle: f64) -> f64 {
    ((1.0 + cos_degrees(phase_angle - 180.0)) / 2.0) * 100.0
}

fn mean_anomaly(t: f64) -> f64 {
    normalize_angle(polynomial(
        t,
        &[
            134.9633964,
            477_198.8675055,
            0.0087414,
            1.0 / 69_699.0,
            -1.0 / 14_712_000.0,
        ],
    ))
}

fn mean_elongation(t: f64) -> f64 {
    normalize_angle(polynomial(
        t,
        &[
            297.8501921,
            445_267.1114034,
            -0.0018819,
            1.0 / 545_868.0,
            -1.0 / 113_065_000.0,
        ],
    ))
}

fn argument_of_latitude(t: f64) -> f64 {
    normalize_angle(polynomial(
        t,
        &[
            93.2720950,
            483_202.0175233,
            -0.0036539,
            -1.0 / 3_526_000.0,
            1.0 / 863_310_000.0,
        ],
    ))
}

fn eccentricity_factor(t: f64) -> f64 {
    polynomial(t, &[1.0, -0.002516, -0.0000075])
}

/// The eight named phases, each owning a 45-degree window of phase angle
/// (the quarter phases get the narrow windows centered on the exact
/// angles).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoonTruePhase {
    New,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    Full,
    WaningGibbous,
    ThirdQuarter,
    WaningCrescent,
}

impl MoonTruePhase {
    pub const ALL: [MoonTruePhase; 8] = [
        MoonTruePhase::New,
        MoonTruePhase::WaxingCrescent,
        MoonTruePhase::FirstQuarter,
        MoonTruePhase::WaxingGibbous,
        MoonTruePhase::Full,
        MoonTruePhase::WaningGibbous,
        MoonTruePhase::ThirdQuarter,
        MoonTruePhase::WaningCrescent,
    ];

    /// Start and end phase angles of this phase's window in degrees.
    pub fn angles(&self) -> (f64, f64) {
        match self {
            MoonTruePhase::New => (348.75, 11.25),
            MoonTruePhase::WaxingCrescent => (11.25, 78.75),
            MoonTruePhase::FirstQuarter => (78.75, 101.25),
            MoonTruePhase::WaxingGibbous => (101.25, 168.75),
            MoonTruePhase::Full => (168.75, 191.25),
            MoonTruePhase::WaningGibbous => (191.25, 258.75),
            MoonTruePhase::ThirdQuarter => (258.75, 281.25),
            MoonTruePhase::WaningCrescent => (281.25, 348.75),
        }
    }

    // Fraction of a lunation at which this phase occurs, measured the way
    // Meeus chapter 49 counts k (from new moon, with waning phases first)
    fn k_fraction(&self) -> f64 {
        match self {
            MoonTruePhase::New => 0.0,
            MoonTruePhase::WaningCrescent => 0.125,
            MoonTruePhase::ThirdQuarter => 0.25,
            MoonTruePhase::WaningGibbous => 0.375,
            MoonTruePhase::Full => 0.5,
            MoonTruePhase::WaxingGibbous => 0.625,
            MoonTruePhase::FirstQuarter => 0.75,
            MoonTruePhase::WaxingCrescent => 0.875,
        }
    }
}

/// A phase classification together with the illuminated disk percentage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoonPhase {
    pub phase: MoonTruePhase,
    /// Percent of the disk illuminated, 0 to 100
    pub illumination: f64,
}
