//! Star positions: catalog J2000 places precessed to date
//!
//! Applies proper motion and the rigorous precession rotation of Meeus
//! chapter 21 to a small built-in catalog of bright navigation stars.
//! Stars carry no distance, so parallax never applies to them.

use crate::mathlib::{cos_degrees, polynomial, sin_degrees};
use crate::timelib::{UniversalTime, UniversalTimeExt};
use crate::unitslib::EquatorialCoordinate;

use super::CelestialLocator;

/// Bright stars with built-in catalog data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Star {
    Sirius,
    Canopus,
    Arcturus,
    Vega,
    Capella,
    Rigel,
    Procyon,
    Betelgeuse,
    Altair,
    Deneb,
    Polaris,
}

impl Star {
    pub const ALL: [Star; 11] = [
        Star::Sirius,
        Star::Canopus,
        Star::Arcturus,
        Star::Vega,
        Star::Capella,
        Star::Rigel,
        Star::Procyon,
        Star::Betelgeuse,
        Star::Altair,
        Star::Deneb,
        Star::Polaris,
    ];

    /// J2000 equatorial coordinates in degrees.
    pub fn coordinate(&self) -> EquatorialCoordinate {
        let (dec, ra) = match self {
            Star::Sirius => (-16.716116, 101.287155),
            Star::Canopus => (-52.695661, 95.987958),
            Star::Arcturus => (19.182409, 213.915300),
            Star::Vega => (38.783689, 279.234735),
            Star::Capella => (45.997991, 79.172328),
            Star::Rigel => (-8.201638, 78.634467),
            Star::Procyon => (5.224993, 114.825493),
            Star::Betelgeuse => (7.407064, 88.792939),
            Star::Altair => (8.868321, 297.695827),
            Star::Deneb => (45.280339, 310.357980),
            Star::Polaris => (89.264109, 37.954561),
        };
        EquatorialCoordinate::new(dec, ra)
    }

    /// Proper motion in degrees per year: (right ascension, declination).
    pub fn motion(&self) -> (f64, f64) {
        let (ra_mas, dec_mas) = match self {
            Star::Sirius => (-546.01, -1223.07),
            Star::Canopus => (19.93, 23.24),
            Star::Arcturus => (-1093.39, -2000.06),
            Star::Vega => (200.94, 286.23),
            Star::Capella => (75.25, -426.89),
            Star::Rigel => (1.31, 0.50),
            Star::Procyon => (-714.59, -1036.80),
            Star::Betelgeuse => (26.42, 9.60),
            Star::Altair => (536.23, 385.29),
            Star::Deneb => (1.99, 1.95),
            Star::Polaris => (44.48, -11.85),
        };
        (ra_mas / 3_600_000.0, dec_mas / 3_600_000.0)
    }

    /// Apparent visual magnitude.
    pub fn magnitude(&self) -> f64 {
        match self {
            Star::Sirius => -1.46,
            Star::Canopus => -0.74,
            Star::Arcturus => -0.05,
            Star::Vega => 0.03,
            Star::Capella => 0.08,
            Star::Rigel => 0.13,
            Star::Procyon => 0.34,
            Star::Betelgeuse => 0.50,
            Star::Altair => 0.77,
            Star::Deneb => 1.25,
            Star::Polaris => 1.98,
        }
    }

    /// B-V color index.
    pub fn color_index_bv(&self) -> f64 {
        match self {
            Star::Sirius => 0.00,
            Star::Canopus => 0.15,
            Star::Arcturus => 1.23,
            Star::Vega => 0.00,
            Star::Capella => 0.80,
            Star::Rigel => -0.03,
            Star::Procyon => 0.42,
            Star::Betelgeuse => 1.85,
            Star::Altair => 0.22,
            Star::Deneb => 0.09,
            Star::Polaris => 0.60,
        }
    }
}

/// Locator that precesses a star's catalog place to the requested date.
#[derive(Debug, Clone, Copy)]
pub struct StarLocator {
    star: Star,
}

impl StarLocator {
    pub fn new(star: Star) -> Self {
        StarLocator { star }
    }
}

impl CelestialLocator for StarLocator {
    fn coordinates(&self, ut: &UniversalTime) -> EquatorialCoordinate {
        let t = ut.julian_centuries();

        let coords = self.star.coordinate();
        let (motion_ra, motion_dec) = self.star.motion();

        // Accumulated precession angles (zeta, z, theta), arcseconds to
        // degrees
        let zeta = polynomial(t, &[0.0, 2306.2181, 0.30188, 0.017998]) / 3600.0;
        let z = polynomial(t, &[0.0, 2306.2181, 1.09468, 0.018203]) / 3600.0;
        let theta = polynomial(t, &[0.0, 2004.3109, -0.42665, -0.041833]) / 3600.0;

        // Proper motion first (t is centuries, motion is per year)
        let declination = coords.declination + motion_dec * t * 100.0;
        let right_ascension = coords.right_ascension + motion_ra * t * 100.0;

        let a = cos_degrees(declination) * sin_degrees(right_ascension + zeta);
        let b = cos_degrees(theta) * cos_degrees(declination) * cos_degrees(right_ascension + zeta)
            - sin_degrees(theta) * sin_degrees(declination);
        let c = sin_degrees(theta) * cos_degrees(declination) * cos_degrees(right_ascension + zeta)
            + cos_degrees(theta) * sin_degrees(declination);

        let ra = a.atan2(b).to_degrees() + z;
        let dec = if declination.abs() > 89.0 {
            // Near the pole the asin form loses precision
            a.hypot(b).acos()
        } else {
            c.asin()
        }
        .to_degrees();

        EquatorialCoordinate::new(dec, ra)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn ut(y: i32, mo: u32, d: u32) -> UniversalTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_catalog_place_returned_at_j2000() {
        let coords = StarLocator::new(Star::Sirius).coordinates(&ut(2000, 1, 1));
        // Half a day from the epoch: precession is negligible
        assert_relative_eq!(coords.right_ascension, 101.287155, epsilon = 0.01);
        assert_relative_eq!(coords.declination, -16.716116, epsilon = 0.01);
    }

    #[test]
    fn test_precession_drifts_with_time() {
        let locator = StarLocator::new(Star::Vega);
        let early = locator.coordinates(&ut(2000, 1, 1));
        let late = locator.coordinates(&ut(2050, 1, 1));

        let drift = (late.right_ascension - early.right_ascension).abs();
        // General precession is ~50 arcsec/year along the ecliptic; over 50
        // years the RA shift should be a fraction of a degree, not zero and
        // not huge
        assert!(drift > 0.05 && drift < 1.5, "drift {drift}");
    }

    #[test]
    fn test_polaris_stays_near_pole() {
        let coords = StarLocator::new(Star::Polaris).coordinates(&ut(2030, 6, 1));
        assert!(coords.declination > 89.0, "{}", coords.declination);
    }

    #[test]
    fn test_stars_have_no_distance() {
        assert!(StarLocator::new(Star::Rigel).distance(&ut(2020, 1, 1)).is_none());
    }

    #[test]
    fn test_catalog_is_complete() {
        for star in Star::ALL {
            let c = star.coordinate();
            assert!((-90.0..=90.0).contains(&c.declination));
            assert!((0.0..360.0).contains(&c.right_ascension));
            assert!(star.magnitude() < 2.5);
        }
    }
}
