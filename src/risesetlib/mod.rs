//! Rise, transit, and set time solving
//!
//! Three calculators share one interface:
//!
//! - [`NewtonsCalculator`] — the iterative refinement from Meeus chapter 15,
//!   fast and precise but returns nothing for circumpolar geometries
//! - [`SearchCalculator`] — an hourly altitude scan refined by the generic
//!   searches, slower but finds transits even when a body never crosses the
//!   threshold altitude
//! - [`RobustCalculator`] — Newton's method first, with per-event fallback
//!   to the search
//!
//! All times in a result share the calendar date of the queried zoned
//! date-time; events that do not occur on that local date are `None`.

mod newtons;
mod robust;
mod search;

pub use newtons::NewtonsCalculator;
pub use robust::RobustCalculator;
pub use search::SearchCalculator;

use chrono::{DateTime, TimeZone};

use crate::locators::CelestialLocator;
use crate::timelib::UniversalTime;
use crate::unitslib::{Coordinate, EquatorialCoordinate, HorizonCoordinate, Length};

/// The local rise, transit, and set instants for one body on one calendar
/// date. Each is independently absent: a circumpolar body yields no rise
/// or set, and near the poles even the transit can fall on a neighboring
/// date.
#[derive(Debug, Clone, PartialEq)]
pub struct RiseSetTransitTimes<Tz: TimeZone> {
    pub rise: Option<DateTime<Tz>>,
    pub transit: Option<DateTime<Tz>>,
    pub set: Option<DateTime<Tz>>,
}

impl<Tz: TimeZone> RiseSetTransitTimes<Tz> {
    pub fn new(
        rise: Option<DateTime<Tz>>,
        transit: Option<DateTime<Tz>>,
        set: Option<DateTime<Tz>>,
    ) -> Self {
        RiseSetTransitTimes { rise, transit, set }
    }

    pub fn none() -> Self {
        RiseSetTransitTimes {
            rise: None,
            transit: None,
            set: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.rise.is_some() && self.transit.is_some() && self.set.is_some()
    }
}

/// A rise/set/transit solving strategy.
pub trait RiseSetTransitCalculator {
    /// Compute the rise, transit, and set times of `locator`'s body on the
    /// local calendar date of `date`, for an observer at `location`.
    ///
    /// `standard_altitude` is the altitude in degrees that defines the
    /// events (for example -0.8333 for sunrise). `with_refraction` and
    /// `with_parallax` apply the respective corrections when computing
    /// altitudes.
    fn calculate<L: CelestialLocator + ?Sized, Tz: TimeZone>(
        &self,
        locator: &L,
        date: &DateTime<Tz>,
        location: &Coordinate,
        standard_altitude: f64,
        with_refraction: bool,
        with_parallax: bool,
    ) -> RiseSetTransitTimes<Tz>;
}

/// Compute rise/set/transit with the robust strategy. This is the main
/// entry point for callers that do not need to pick a calculator.
pub fn calculate_rise_set_transit<L: CelestialLocator + ?Sized, Tz: TimeZone>(
    locator: &L,
    date: &DateTime<Tz>,
    location: &Coordinate,
    standard_altitude: f64,
    with_refraction: bool,
    with_parallax: bool,
) -> RiseSetTransitTimes<Tz> {
    RobustCalculator.calculate(
        locator,
        date,
        location,
        standard_altitude,
        with_refraction,
        with_parallax,
    )
}

/// The horizon position of a body at a UT instant, with optional
/// refraction and parallax corrections.
pub fn position_of<L: CelestialLocator + ?Sized>(
    locator: &L,
    ut: &UniversalTime,
    location: &Coordinate,
    with_refraction: bool,
    with_parallax: bool,
) -> HorizonCoordinate {
    let coordinates = locator.coordinates(ut);
    let distance = if with_parallax {
        locator.distance(ut)
    } else {
        None
    };
    position_from_coordinates(&coordinates, ut, location, with_refraction, distance)
}

/// The altitude in degrees of a body at a UT instant.
pub fn altitude_of<L: CelestialLocator + ?Sized>(
    locator: &L,
    ut: &UniversalTime,
    location: &Coordinate,
    with_refraction: bool,
    with_parallax: bool,
) -> f64 {
    position_of(locator, ut, location, with_refraction, with_parallax).altitude
}

/// The azimuth in degrees (clockwise from north) of a body at a UT instant.
pub fn azimuth_of<L: CelestialLocator + ?Sized>(
    locator: &L,
    ut: &UniversalTime,
    location: &Coordinate,
    with_parallax: bool,
) -> f64 {
    position_of(locator, ut, location, false, with_parallax).azimuth
}

pub(crate) fn position_from_coordinates(
    coordinates: &EquatorialCoordinate,
    ut: &UniversalTime,
    location: &Coordinate,
    with_refraction: bool,
    distance: Option<Length>,
) -> HorizonCoordinate {
    let horizon = match distance {
        Some(distance) => {
            HorizonCoordinate::from_equatorial_with_parallax(coordinates, ut, location, distance)
        }
        None => HorizonCoordinate::from_equatorial(coordinates, ut, location),
    };

    if with_refraction {
        horizon.with_refraction()
    } else {
        horizon
    }
}
