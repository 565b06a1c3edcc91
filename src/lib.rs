//! Astronomical position and event calculations for terrestrial observers
//!
//! Computes rise/set/transit times, twilight boundaries, eclipse windows,
//! and meteor shower timing for the Sun, Moon, stars, and meteor shower
//! radiants, using the algorithms from Jean Meeus' *Astronomical Algorithms*
//! (2nd edition).
//!
//! The crate is organized as a small pipeline:
//!
//! - [`mathlib`] / [`interplib`] — angle helpers and the three-point
//!   interpolation used to evaluate ephemerides at fractional times
//! - [`timelib`] — Universal Time, Julian dates, and sidereal time
//! - [`unitslib`] — equatorial, ecliptic, and horizon coordinates
//! - [`locators`] — ephemeris evaluators implementing [`locators::CelestialLocator`]
//! - [`risesetlib`] — the iterative rise/set/transit solver
//! - [`searchlib`] — bounded binary/ternary searches over time
//! - [`eclipselib`] / [`almanac`] — event composition built on the above
//!
//! All computation is synchronous and pure: every call derives its result
//! from scratch, so concurrent callers need no coordination.
//!
//! # Example
//!
//! ```
//! use chrono::{FixedOffset, TimeZone};
//! use skywatch::almanac::{self, SunTimesMode};
//! use skywatch::unitslib::Coordinate;
//!
//! let eastern = FixedOffset::west_opt(4 * 3600).unwrap();
//! let date = eastern.with_ymd_and_hms(2020, 9, 12, 12, 0, 0).unwrap();
//! let nyc = Coordinate::new(40.7128, -74.0060).unwrap();
//!
//! let times = almanac::sun_events(&date, &nyc, SunTimesMode::Actual, false, false);
//! assert!(times.rise.is_some() && times.set.is_some());
//! ```

pub mod almanac;
pub mod constants;
pub mod eclipselib;
pub mod interplib;
pub mod locators;
pub mod mathlib;
pub mod nutationlib;
pub mod risesetlib;
pub mod searchlib;
pub mod timelib;
pub mod unitslib;
