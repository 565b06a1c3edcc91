//! Ecliptic coordinates and conversions to the equatorial frame

use crate::mathlib::{cos_degrees, polynomial, sin_degrees, tan_degrees, wrap};
use crate::timelib::{UniversalTime, UniversalTimeExt};

use super::{wrap_declination, EquatorialCoordinate};

/// A position on the ecliptic: latitude in degrees `[-90, 90]`, longitude
/// in degrees `[0, 360)` measured from the vernal equinox.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EclipticCoordinate {
    pub ecliptic_latitude: f64,
    pub ecliptic_longitude: f64,
}

impl EclipticCoordinate {
    pub fn new(ecliptic_latitude: f64, ecliptic_longitude: f64) -> Self {
        EclipticCoordinate {
            ecliptic_latitude: wrap_declination(ecliptic_latitude),
            ecliptic_longitude: wrap(ecliptic_longitude, 0.0, 360.0),
        }
    }

    /// Obliquity of the ecliptic in degrees, from the short IAU polynomial.
    pub fn obliquity_of_the_ecliptic(ut: &UniversalTime) -> f64 {
        let e0 = 23.439292;
        let t = ut.julian_centuries();
        e0 - polynomial(t, &[0.0, 46.815, 0.0006, -0.00181]) / 3600.0
    }

    /// Convert to equatorial coordinates for a given obliquity in degrees.
    pub fn to_equatorial(&self, ecliptic_obliquity: f64) -> EquatorialCoordinate {
        let right_ascension = (sin_degrees(self.ecliptic_longitude)
            * cos_degrees(ecliptic_obliquity)
            - tan_degrees(self.ecliptic_latitude) * sin_degrees(ecliptic_obliquity))
        .atan2(cos_degrees(self.ecliptic_longitude))
        .to_degrees();

        let declination = (sin_degrees(self.ecliptic_latitude) * cos_degrees(ecliptic_obliquity)
            + cos_degrees(self.ecliptic_latitude)
                * sin_degrees(ecliptic_obliquity)
                * sin_degrees(self.ecliptic_longitude))
        .asin()
        .to_degrees();

        EquatorialCoordinate::new(declination, right_ascension)
    }

    /// Convert to equatorial coordinates at a UT instant.
    pub fn to_equatorial_for(&self, ut: &UniversalTime) -> EquatorialCoordinate {
        self.to_equatorial(Self::obliquity_of_the_ecliptic(ut))
    }

    /// Convert equatorial coordinates to the ecliptic frame.
    ///
    /// Apparent equatorial coordinates get the nutation/aberration shift in
    /// longitude removed so that the result is a mean ecliptic longitude.
    pub fn from_equatorial(equatorial: &EquatorialCoordinate, ut: &UniversalTime) -> Self {
        let e = Self::obliquity_of_the_ecliptic(ut);
        let alpha = equatorial.right_ascension;
        let delta = equatorial.declination;

        let t = sin_degrees(delta) * cos_degrees(e)
            - cos_degrees(delta) * sin_degrees(e) * sin_degrees(alpha);
        let latitude = t.asin().to_degrees();

        let y = sin_degrees(alpha) * cos_degrees(e) + tan_degrees(delta) * sin_degrees(e);
        let x = cos_degrees(alpha);

        let mut longitude = y.atan2(x).to_degrees();

        if equatorial.is_apparent() {
            let omega = polynomial(ut.julian_centuries(), &[125.04, -1934.136]);
            longitude += 0.00569 + 0.00478 * sin_degrees(omega);
        }

        EclipticCoordinate::new(latitude, longitude)
    }
}
