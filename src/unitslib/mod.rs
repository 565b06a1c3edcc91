//! Observer locations and celestial coordinate systems
//!
//! Re-exports the `uom` length quantities used for body distances, and
//! provides the three coordinate frames the pipeline moves between:
//! equatorial (declination/right ascension), ecliptic
//! (latitude/longitude along the ecliptic), and horizon
//! (altitude/azimuth for a specific observer and instant).

mod ecliptic;
mod equatorial;
mod horizon;

pub use ecliptic::EclipticCoordinate;
pub use equatorial::EquatorialCoordinate;
pub use horizon::HorizonCoordinate;

// Length quantities for body distances
pub use uom::si::f64::Length;
pub use uom::si::length::{astronomical_unit, kilometer, meter};

use thiserror::Error;

use crate::mathlib::wrap;

/// Error raised when constructing an observer coordinate from out-of-range
/// components.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum CoordinateError {
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// An observer's geographic location in degrees: latitude positive north,
/// longitude positive east.
///
/// [`Coordinate::new`] validates ranges at the API boundary. The
/// computation pipeline itself never re-validates, so a coordinate built
/// directly from fields with non-finite components propagates NaN results
/// rather than raising errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }
        Ok(Coordinate {
            latitude,
            longitude,
        })
    }

    /// The origin (0, 0), useful as a geocentric-ish default.
    pub const fn zero() -> Self {
        Coordinate {
            latitude: 0.0,
            longitude: 0.0,
        }
    }

    pub fn is_northern_hemisphere(&self) -> bool {
        self.latitude > 0.0
    }
}

pub(crate) fn wrap_declination(declination: f64) -> f64 {
    wrap(declination, -90.0, 90.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(40.7128, -74.0060).is_ok());
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert_eq!(
            Coordinate::new(91.0, 0.0),
            Err(CoordinateError::LatitudeOutOfRange(91.0))
        );
        assert_eq!(
            Coordinate::new(0.0, -181.0),
            Err(CoordinateError::LongitudeOutOfRange(-181.0))
        );
    }

    #[test]
    fn test_hemisphere() {
        assert!(Coordinate::new(40.0, 0.0).unwrap().is_northern_hemisphere());
        assert!(!Coordinate::new(-33.0, 0.0).unwrap().is_northern_hemisphere());
        assert!(!Coordinate::zero().is_northern_hemisphere());
    }
}
