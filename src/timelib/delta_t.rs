//! Delta-T (TT - UT) computation
//!
//! Uses the Espenak-Meeus piecewise polynomial expressions fitted to the
//! historical record, with the long-term parabola for years outside it.
//! Each segment takes the calendar year and yields seconds.

use crate::mathlib::polynomial;

/// TT - UT in seconds for a calendar year.
///
/// The rise/set/transit solver shifts its interpolation argument by this
/// amount so ephemeris lookups happen on the uniform time scale the
/// coordinate series are expressed in.
pub fn delta_t(year: i32) -> f64 {
    let y = year as f64;

    if y < -500.0 {
        let u = (y - 1820.0) / 100.0;
        return -20.0 + 32.0 * u * u;
    }
    if y < 500.0 {
        let u = y / 100.0;
        return polynomial(
            u,
            &[
                10583.6,
                -1014.41,
                33.78311,
                -5.952053,
                -0.1798452,
                0.022174192,
                0.0090316521,
            ],
        );
    }
    if y < 1600.0 {
        let u = (y - 1000.0) / 100.0;
        return polynomial(
            u,
            &[
                1574.2,
                -556.01,
                71.23472,
                0.319781,
                -0.8503463,
                -0.005050998,
                0.0083572073,
            ],
        );
    }
    if y < 1700.0 {
        let t = y - 1600.0;
        return 120.0 - 0.9808 * t - 0.01532 * t * t + t * t * t / 7129.0;
    }
    if y < 1800.0 {
        let t = y - 1700.0;
        return polynomial(t, &[8.83, 0.1603, -0.0059285, 0.00013336])
            - t * t * t * t / 1_174_000.0;
    }
    if y < 1860.0 {
        let t = y - 1800.0;
        return polynomial(
            t,
            &[
                13.72,
                -0.332447,
                0.0068612,
                0.0041116,
                -0.00037436,
                0.0000121272,
                -0.0000001699,
                0.000000000875,
            ],
        );
    }
    if y < 1900.0 {
        let t = y - 1860.0;
        return polynomial(t, &[7.62, 0.5737, -0.251754, 0.01680668, -0.0004473624])
            + t * t * t * t * t / 233_174.0;
    }
    if y < 1920.0 {
        let t = y - 1900.0;
        return polynomial(t, &[-2.79, 1.494119, -0.0598939, 0.0061966, -0.000197]);
    }
    if y < 1941.0 {
        let t = y - 1920.0;
        return polynomial(t, &[21.20, 0.84493, -0.076100, 0.0020936]);
    }
    if y < 1961.0 {
        let t = y - 1950.0;
        return 29.07 + 0.407 * t - t * t / 233.0 + t * t * t / 2547.0;
    }
    if y < 1986.0 {
        let t = y - 1975.0;
        return 45.45 + 1.067 * t - t * t / 260.0 - t * t * t / 718.0;
    }
    if y < 2005.0 {
        let t = y - 2000.0;
        return polynomial(
            t,
            &[63.86, 0.3345, -0.060374, 0.0017275, 0.000651814, 0.00002373599],
        );
    }
    if y < 2050.0 {
        let t = y - 2000.0;
        return 62.92 + 0.32217 * t + 0.005589 * t * t;
    }
    if y < 2150.0 {
        let u = (y - 1820.0) / 100.0;
        return -20.0 + 32.0 * u * u - 0.5628 * (2150.0 - y);
    }

    let u = (y - 1820.0) / 100.0;
    -20.0 + 32.0 * u * u
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_delta_t_j2000() {
        assert_relative_eq!(delta_t(2000), 63.86, epsilon = 0.1);
    }

    #[test]
    fn test_delta_t_modern_era() {
        // Observed delta-T: ~66 s in 2010, ~69 s in 2020
        assert!((64.0..=70.0).contains(&delta_t(2010)), "{}", delta_t(2010));
        assert!((66.0..=74.0).contains(&delta_t(2020)), "{}", delta_t(2020));
    }

    #[test]
    fn test_delta_t_1900_near_zero() {
        assert!(delta_t(1900).abs() < 5.0, "{}", delta_t(1900));
    }

    #[test]
    fn test_delta_t_historical() {
        // Around 1650 delta-T was roughly 50 seconds
        assert!((20.0..=80.0).contains(&delta_t(1650)), "{}", delta_t(1650));
        // Ancient times: parabolic growth into the thousands
        assert!(delta_t(-1000) > 20_000.0, "{}", delta_t(-1000));
    }

    #[test]
    fn test_delta_t_far_future_grows() {
        assert!(delta_t(2500) > delta_t(2150));
    }

    #[test]
    fn test_delta_t_continuity_at_segment_joins() {
        // Neighboring-year values across each segment boundary should not
        // jump by more than a couple of seconds
        for boundary in [-500, 500, 1600, 1700, 1800, 1860, 1900, 1920, 1941, 1961, 1986, 2005, 2050] {
            let before = delta_t(boundary - 1);
            let after = delta_t(boundary);
            assert!(
                (before - after).abs() < 5.0,
                "jump of {} at {boundary}",
                (before - after).abs()
            );
        }
    }
}
