//! Meteor shower radiants
//!
//! The major annual showers with their radiant coordinates, peak solar
//! longitudes, and activity windows. A radiant is treated as a fixed point
//! on the celestial sphere; the almanac composes this with the rise/set
//! solver and the night window to produce viewing times.

use crate::mathlib::time_to_angle;
use crate::timelib::UniversalTime;
use crate::unitslib::EquatorialCoordinate;

use super::CelestialLocator;

/// The major annual meteor showers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeteorShower {
    Quadrantids,
    Lyrids,
    EtaAquariids,
    DeltaAquariids,
    Perseids,
    Orionids,
    Leonids,
    Geminids,
    Ursids,
}

impl MeteorShower {
    pub const ALL: [MeteorShower; 9] = [
        MeteorShower::Quadrantids,
        MeteorShower::Lyrids,
        MeteorShower::EtaAquariids,
        MeteorShower::DeltaAquariids,
        MeteorShower::Perseids,
        MeteorShower::Orionids,
        MeteorShower::Leonids,
        MeteorShower::Geminids,
        MeteorShower::Ursids,
    ];

    /// Solar longitude of the shower's peak in degrees.
    pub fn solar_longitude(&self) -> f64 {
        match self {
            MeteorShower::Quadrantids => 283.16,
            MeteorShower::Lyrids => 32.32,
            MeteorShower::EtaAquariids => 45.5,
            MeteorShower::DeltaAquariids => 126.9,
            MeteorShower::Perseids => 140.0,
            MeteorShower::Orionids => 207.5,
            MeteorShower::Leonids => 236.0,
            MeteorShower::Geminids => 262.2,
            MeteorShower::Ursids => 270.5,
        }
    }

    /// Length of the activity window in days.
    pub fn active_days(&self) -> i64 {
        match self {
            MeteorShower::Quadrantids => 10,
            MeteorShower::Lyrids => 10,
            MeteorShower::EtaAquariids => 24,
            MeteorShower::DeltaAquariids => 30,
            MeteorShower::Perseids => 38,
            MeteorShower::Orionids => 39,
            MeteorShower::Leonids => 19,
            MeteorShower::Geminids => 17,
            MeteorShower::Ursids => 9,
        }
    }

    /// Typical zenithal hourly rate at peak.
    pub fn rate(&self) -> i32 {
        match self {
            MeteorShower::Quadrantids => 120,
            MeteorShower::Lyrids => 18,
            MeteorShower::EtaAquariids => 60,
            MeteorShower::DeltaAquariids => 20,
            MeteorShower::Perseids => 100,
            MeteorShower::Orionids => 23,
            MeteorShower::Leonids => 15,
            MeteorShower::Geminids => 150,
            MeteorShower::Ursids => 10,
        }
    }
}

/// Locator for a shower's radiant point.
#[derive(Debug, Clone, Copy)]
pub struct MeteorShowerLocator {
    shower: MeteorShower,
}

impl MeteorShowerLocator {
    pub fn new(shower: MeteorShower) -> Self {
        MeteorShowerLocator { shower }
    }
}

impl CelestialLocator for MeteorShowerLocator {
    fn coordinates(&self, _ut: &UniversalTime) -> EquatorialCoordinate {
        match self.shower {
            MeteorShower::Quadrantids => {
                EquatorialCoordinate::new(49.7, time_to_angle(15.0, 20.0, 0.0))
            }
            MeteorShower::Lyrids => EquatorialCoordinate::new(33.3, time_to_angle(18.0, 10.0, 0.0)),
            MeteorShower::EtaAquariids => {
                EquatorialCoordinate::new(-1.0, time_to_angle(22.0, 30.0, 0.0))
            }
            MeteorShower::DeltaAquariids => {
                EquatorialCoordinate::new(-16.3, time_to_angle(22.0, 42.0, 0.0))
            }
            MeteorShower::Perseids => EquatorialCoordinate::new(58.0, time_to_angle(3.0, 13.0, 0.0)),
            MeteorShower::Orionids => EquatorialCoordinate::new(15.6, time_to_angle(6.0, 21.0, 0.0)),
            MeteorShower::Leonids => EquatorialCoordinate::new(21.6, time_to_angle(10.0, 17.0, 0.0)),
            MeteorShower::Geminids => EquatorialCoordinate::new(32.3, time_to_angle(7.0, 24.0, 0.0)),
            MeteorShower::Ursids => EquatorialCoordinate::new(75.3, time_to_angle(14.0, 36.0, 0.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_radiants_are_fixed_in_time() {
        let locator = MeteorShowerLocator::new(MeteorShower::Perseids);
        let t1 = NaiveDate::from_ymd_opt(2020, 8, 12)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let t2 = NaiveDate::from_ymd_opt(2021, 8, 12)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(locator.coordinates(&t1), locator.coordinates(&t2));
    }

    #[test]
    fn test_radiants_have_no_distance() {
        let t = NaiveDate::from_ymd_opt(2020, 8, 12)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(MeteorShowerLocator::new(MeteorShower::Geminids)
            .distance(&t)
            .is_none());
    }

    #[test]
    fn test_all_showers_have_valid_data() {
        let t = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        for shower in MeteorShower::ALL {
            let radiant = MeteorShowerLocator::new(shower).coordinates(&t);
            assert!((-90.0..=90.0).contains(&radiant.declination));
            assert!((0.0..360.0).contains(&shower.solar_longitude()));
            assert!(shower.active_days() > 0);
            assert!(shower.rate() > 0);
        }
    }
}
