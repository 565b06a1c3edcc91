//! Horizon coordinates: altitude and azimuth for a specific observer
//!
//! Conversion from equatorial coordinates follows Meeus chapter 13 with
//! azimuth measured clockwise from north. Refraction uses the empirical
//! model from chapter 16 (three altitude regimes); parallax uses the
//! topocentric correction from chapter 40.

use crate::constants::EARTH_EQUATORIAL_RADIUS_KM;
use crate::mathlib::{cos_degrees, cube, polynomial, sin_degrees, tan_degrees, wrap};
use crate::timelib::{LocalSiderealTime, UniversalTime, UniversalTimeExt};

use super::{kilometer, Coordinate, EquatorialCoordinate, Length};

/// A body's position as seen from a specific place and time: altitude in
/// degrees `[-90, 90]` and azimuth in degrees `[0, 360)` clockwise from
/// north.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizonCoordinate {
    pub azimuth: f64,
    pub altitude: f64,
}

impl HorizonCoordinate {
    pub fn new(azimuth: f64, altitude: f64) -> Self {
        HorizonCoordinate {
            azimuth: wrap(azimuth, 0.0, 360.0),
            altitude: wrap(altitude, -90.0, 90.0),
        }
    }

    /// Angular distance from the zenith in degrees.
    pub fn zenith(&self) -> f64 {
        90.0 - self.altitude
    }

    /// Convert equatorial coordinates for an observer at a UT instant.
    pub fn from_equatorial(
        equatorial: &EquatorialCoordinate,
        ut: &UniversalTime,
        location: &Coordinate,
    ) -> Self {
        Self::from_equatorial_at(
            equatorial,
            ut.to_sidereal_time().at_longitude(location.longitude),
            location.latitude,
        )
    }

    /// Convert equatorial coordinates given a local sidereal time directly.
    pub fn from_equatorial_at(
        equatorial: &EquatorialCoordinate,
        sidereal: LocalSiderealTime,
        latitude: f64,
    ) -> Self {
        let sin_dec = sin_degrees(equatorial.declination);
        let sin_lat = sin_degrees(latitude);
        let cos_lat = cos_degrees(latitude);

        let hour_angle = equatorial.hour_angle(sidereal) * 15.0;

        let t0 = sin_dec * sin_lat
            + cos_degrees(equatorial.declination) * cos_lat * cos_degrees(hour_angle);
        let altitude = t0.asin().to_degrees();

        let t1 = sin_dec - sin_lat * sin_degrees(altitude);
        let mut azimuth = (t1 / (cos_lat * cos_degrees(altitude))).acos().to_degrees();

        if sin_degrees(hour_angle) > 0.0 {
            azimuth = 360.0 - azimuth;
        }

        HorizonCoordinate::new(azimuth, altitude)
    }

    /// Convert with the parallax correction for a body at a finite
    /// distance; lowers the apparent position toward the horizon.
    pub fn from_equatorial_with_parallax(
        equatorial: &EquatorialCoordinate,
        ut: &UniversalTime,
        location: &Coordinate,
        distance: Length,
    ) -> Self {
        Self::from_equatorial_at_with_parallax(
            equatorial,
            ut.to_sidereal_time().at_longitude(location.longitude),
            location.latitude,
            distance,
        )
    }

    /// Parallax-corrected conversion given a local sidereal time directly.
    pub fn from_equatorial_at_with_parallax(
        equatorial: &EquatorialCoordinate,
        sidereal: LocalSiderealTime,
        latitude: f64,
        distance: Length,
    ) -> Self {
        let sin_pi = EARTH_EQUATORIAL_RADIUS_KM / distance.get::<kilometer>();
        let hour_angle = equatorial.hour_angle(sidereal) * 15.0;

        // Observer displacement from the geocenter on the flattened Earth
        let u = (0.99664719 * tan_degrees(latitude)).atan();
        let x = u.cos();
        let y = 0.99664719 * u.sin();

        let delta_ascension = (-x * sin_pi * sin_degrees(hour_angle))
            .atan2(cos_degrees(equatorial.declination) - x * sin_pi * cos_degrees(hour_angle))
            .to_degrees();

        let true_declination = ((sin_degrees(equatorial.declination) - y * sin_pi)
            * cos_degrees(delta_ascension))
        .atan2(cos_degrees(equatorial.declination) - y * sin_pi * cos_degrees(hour_angle))
        .to_degrees();

        Self::from_equatorial_at(
            &EquatorialCoordinate::new(
                true_declination,
                equatorial.right_ascension + delta_ascension,
            ),
            sidereal,
            latitude,
        )
    }

    /// Convert back to equatorial coordinates.
    pub fn to_equatorial(
        &self,
        sidereal: LocalSiderealTime,
        latitude: f64,
    ) -> EquatorialCoordinate {
        let sin_alt = sin_degrees(self.altitude);
        let sin_lat = sin_degrees(latitude);
        let cos_lat = cos_degrees(latitude);

        let t0 = sin_alt * sin_lat + cos_degrees(self.altitude) * cos_lat * cos_degrees(self.azimuth);
        let declination = t0.asin().to_degrees();

        let t1 = sin_alt - sin_lat * sin_degrees(declination);
        let t2 = cos_lat * cos_degrees(declination);

        let mut hour_angle = (t1 / t2).acos().to_degrees();
        if sin_degrees(self.azimuth) > 0.0 {
            hour_angle = 360.0 - hour_angle;
        }

        EquatorialCoordinate::from_hour_angle(declination, hour_angle / 15.0, sidereal)
    }

    /// The same position with atmospheric refraction applied to the
    /// altitude: objects appear higher than their geometric place, by about
    /// half a degree at the horizon.
    pub fn with_refraction(&self) -> Self {
        let refraction = wrap(self.refraction(), -90.0, 90.0);
        HorizonCoordinate::new(self.azimuth, self.altitude + refraction)
    }

    // Meeus chapter 16 in three regimes; below -0.575 degrees the
    // polynomial breaks down and an asymptotic tangent form takes over.
    fn refraction(&self) -> f64 {
        if self.altitude > 85.0 {
            return 0.0;
        }

        let tan_elev = tan_degrees(self.altitude);

        if self.altitude > 5.0 {
            return (58.1 / tan_elev - 0.07 / cube(tan_elev)
                + 0.000086 / tan_elev.powi(5))
                / 3600.0;
        }

        if self.altitude > -0.575 {
            return polynomial(self.altitude, &[1735.0, -518.2, 103.4, -12.79, 0.711]) / 3600.0;
        }

        -20.774 / tan_elev / 3600.0
    }

    /// Great-circle separation from another horizon position in degrees.
    pub fn angular_distance_to(&self, other: &HorizonCoordinate) -> f64 {
        (cos_degrees(self.zenith()) * cos_degrees(other.zenith())
            + sin_degrees(self.zenith())
                * sin_degrees(other.zenith())
                * cos_degrees(self.azimuth - other.azimuth))
        .acos()
        .to_degrees()
    }
}
