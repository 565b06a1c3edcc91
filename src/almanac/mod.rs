//! High-level event queries: "when does X happen?"
//!
//! Composes the locators, the rise/set/transit solvers, and the generic
//! searches into the answers applications actually ask for — sunrise and
//! twilight times, moon phases, above-horizon windows, meteor shower
//! nights, and the next eclipse. Every function derives its answer from
//! scratch on each call; cache externally if needed.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::constants::{MOON_STANDARD_ALTITUDE, SUN_STANDARD_ALTITUDE};
use crate::eclipselib::{
    Eclipse, EclipseCalculator, PartialLunarEclipseCalculator, SolarEclipseCalculator,
    TotalLunarEclipseCalculator,
};
use crate::locators::{
    CelestialLocator, MeteorShower, MeteorShowerLocator, Moon, MoonPhase, Star, StarLocator, Sun,
};
use crate::mathlib::{delta_angle, sin_degrees, wrap};
use crate::risesetlib::{
    altitude_of, azimuth_of, calculate_rise_set_transit, NewtonsCalculator,
    RiseSetTransitCalculator, RiseSetTransitTimes,
};
use crate::searchlib::Range;
use crate::timelib::{
    closest_future_time, closest_past_time, closest_time, end_of_day, from_julian_day, from_zoned,
    start_of_day, UniversalTimeExt,
};
use crate::unitslib::{kilometer, Coordinate, EclipticCoordinate, Length};

/// The altitude threshold family used for sun event queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SunTimesMode {
    /// Top of the disk at the visible horizon (-0.8333 degrees)
    Actual,
    /// Civil twilight boundary (-6 degrees)
    Civil,
    /// Nautical twilight boundary (-12 degrees)
    Nautical,
    /// Astronomical twilight boundary (-18 degrees)
    Astronomical,
}

impl SunTimesMode {
    pub fn standard_altitude(&self) -> f64 {
        match self {
            SunTimesMode::Actual => SUN_STANDARD_ALTITUDE,
            SunTimesMode::Civil => -6.0,
            SunTimesMode::Nautical => -12.0,
            SunTimesMode::Astronomical => -18.0,
        }
    }
}

/// The astronomical seasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

/// The kinds of eclipse [`next_eclipse`] can search for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EclipseType {
    Solar,
    PartialLunar,
    TotalLunar,
}

/// A meteor shower's viewing window on a particular night.
#[derive(Debug, Clone, PartialEq)]
pub struct MeteorShowerPeak<Tz: TimeZone> {
    pub shower: MeteorShower,
    pub start: DateTime<Tz>,
    pub peak: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

// --- Sun ---

/// Rise, transit, and set of the sun on the local date, at the altitude
/// threshold of `mode`.
pub fn sun_events<Tz: TimeZone>(
    date: &DateTime<Tz>,
    location: &Coordinate,
    mode: SunTimesMode,
    with_refraction: bool,
    with_parallax: bool,
) -> RiseSetTransitTimes<Tz> {
    calculate_rise_set_transit(
        &Sun,
        date,
        location,
        mode.standard_altitude(),
        with_refraction,
        with_parallax,
    )
}

pub fn sun_altitude<Tz: TimeZone>(
    time: &DateTime<Tz>,
    location: &Coordinate,
    with_refraction: bool,
    with_parallax: bool,
) -> f64 {
    altitude_of(
        &Sun,
        &from_zoned(time),
        location,
        with_refraction,
        with_parallax,
    )
}

pub fn sun_azimuth<Tz: TimeZone>(
    time: &DateTime<Tz>,
    location: &Coordinate,
    with_parallax: bool,
) -> f64 {
    azimuth_of(&Sun, &from_zoned(time), location, with_parallax)
}

pub fn is_sun_up<Tz: TimeZone>(
    time: &DateTime<Tz>,
    location: &Coordinate,
    with_refraction: bool,
    with_parallax: bool,
) -> bool {
    sun_altitude(time, location, with_refraction, with_parallax) > 0.0
}

/// The next sunset strictly after `time`, looking at today's and
/// tomorrow's events.
pub fn next_sunset<Tz: TimeZone>(
    time: &DateTime<Tz>,
    location: &Coordinate,
    mode: SunTimesMode,
    with_refraction: bool,
    with_parallax: bool,
) -> Option<DateTime<Tz>> {
    next_event(time, |date| {
        sun_events(date, location, mode, with_refraction, with_parallax).set
    })
}

/// The next sunrise strictly after `time`.
pub fn next_sunrise<Tz: TimeZone>(
    time: &DateTime<Tz>,
    location: &Coordinate,
    mode: SunTimesMode,
    with_refraction: bool,
    with_parallax: bool,
) -> Option<DateTime<Tz>> {
    next_event(time, |date| {
        sun_events(date, location, mode, with_refraction, with_parallax).rise
    })
}

/// How long the sun is above the threshold on the local date, handling
/// the polar sub-cases (never rises, never sets, rises without setting).
pub fn daylight_length<Tz: TimeZone>(
    date: &DateTime<Tz>,
    location: &Coordinate,
    mode: SunTimesMode,
    with_refraction: bool,
    with_parallax: bool,
) -> Duration {
    let day_start = start_of_day(date);
    let sunrise = next_sunrise(&day_start, location, mode, with_refraction, with_parallax)
        .filter(|t| t.date_naive() == date.date_naive());
    let sunset = next_sunset(&day_start, location, mode, with_refraction, with_parallax)
        .filter(|t| t.date_naive() == date.date_naive());
    let day_end = day_start.clone() + Duration::days(1);

    match (sunrise, sunset) {
        // Rise in the morning, set at night
        (Some(rise), Some(set)) if set > rise => set - rise,
        // Set in the morning, rise at night
        (Some(rise), Some(set)) => (set - day_start) + (day_end - rise),
        // Sun does not rise or set today
        (None, None) => {
            if is_sun_up(&day_start, location, with_refraction, with_parallax) {
                day_end - day_start
            } else {
                Duration::zero()
            }
        }
        // Rises but never sets
        (Some(rise), None) => day_end - rise,
        // Sets but never rises
        (None, Some(set)) => set - day_start,
    }
}

pub fn sun_distance<Tz: TimeZone>(time: &DateTime<Tz>) -> Length {
    Sun.distance(&from_zoned(time))
        .unwrap_or_else(|| Length::new::<kilometer>(0.0))
}

/// The sun's ecliptic longitude in degrees at a zoned instant.
pub fn solar_longitude<Tz: TimeZone>(date: &DateTime<Tz>) -> f64 {
    let ut = from_zoned(date);
    let coordinates = Sun.coordinates(&ut);
    EclipticCoordinate::from_equatorial(&coordinates, &ut).ecliptic_longitude
}

/// The astronomical season at a location (hemisphere-aware).
pub fn season<Tz: TimeZone>(location: &Coordinate, date: &DateTime<Tz>) -> Season {
    let northern = location.is_northern_hemisphere();
    let longitude = wrap(solar_longitude(date), 0.0, 360.0);
    match longitude {
        l if l >= 270.0 => {
            if northern {
                Season::Winter
            } else {
                Season::Summer
            }
        }
        l if l >= 180.0 => {
            if northern {
                Season::Fall
            } else {
                Season::Spring
            }
        }
        l if l >= 90.0 => {
            if northern {
                Season::Summer
            } else {
                Season::Winter
            }
        }
        _ => {
            if northern {
                Season::Spring
            } else {
                Season::Fall
            }
        }
    }
}

/// The window around `time` during which the sun is above the horizon.
///
/// When the sun is up, the window runs from the last rise to the next
/// set. When it is down, the upcoming window is returned if the next rise
/// is within `next_rise_offset`, otherwise the window that just ended.
pub fn sun_above_horizon_times<Tz: TimeZone>(
    location: &Coordinate,
    time: &DateTime<Tz>,
    next_rise_offset: Duration,
    mode: SunTimesMode,
    with_refraction: bool,
    with_parallax: bool,
) -> Option<Range<DateTime<Tz>>> {
    above_horizon_times(
        location,
        time,
        next_rise_offset,
        |location, time| is_sun_up(time, location, with_refraction, with_parallax),
        |location, date| sun_events(date, location, mode, with_refraction, with_parallax),
    )
}

// --- Moon ---

/// Rise, transit, and set of the moon on the local date.
pub fn moon_events<Tz: TimeZone>(
    date: &DateTime<Tz>,
    location: &Coordinate,
    with_refraction: bool,
    with_parallax: bool,
) -> RiseSetTransitTimes<Tz> {
    calculate_rise_set_transit(
        &Moon,
        date,
        location,
        MOON_STANDARD_ALTITUDE,
        with_refraction,
        with_parallax,
    )
}

pub fn moon_altitude<Tz: TimeZone>(
    time: &DateTime<Tz>,
    location: &Coordinate,
    with_refraction: bool,
    with_parallax: bool,
) -> f64 {
    altitude_of(
        &Moon,
        &from_zoned(time),
        location,
        with_refraction,
        with_parallax,
    )
}

pub fn moon_azimuth<Tz: TimeZone>(
    time: &DateTime<Tz>,
    location: &Coordinate,
    with_parallax: bool,
) -> f64 {
    azimuth_of(&Moon, &from_zoned(time), location, with_parallax)
}

pub fn is_moon_up<Tz: TimeZone>(
    time: &DateTime<Tz>,
    location: &Coordinate,
    with_refraction: bool,
    with_parallax: bool,
) -> bool {
    moon_altitude(time, location, with_refraction, with_parallax) > 0.0
}

pub fn next_moonset<Tz: TimeZone>(
    time: &DateTime<Tz>,
    location: &Coordinate,
    with_refraction: bool,
    with_parallax: bool,
) -> Option<DateTime<Tz>> {
    next_event(time, |date| {
        moon_events(date, location, with_refraction, with_parallax).set
    })
}

pub fn next_moonrise<Tz: TimeZone>(
    time: &DateTime<Tz>,
    location: &Coordinate,
    with_refraction: bool,
    with_parallax: bool,
) -> Option<DateTime<Tz>> {
    next_event(time, |date| {
        moon_events(date, location, with_refraction, with_parallax).rise
    })
}

pub fn moon_phase<Tz: TimeZone>(date: &DateTime<Tz>) -> MoonPhase {
    Moon.phase(&from_zoned(date))
}

pub fn moon_distance<Tz: TimeZone>(time: &DateTime<Tz>) -> Length {
    Moon.distance(&from_zoned(time))
        .unwrap_or_else(|| Length::new::<kilometer>(0.0))
}

/// A full moon within 360,000 km of Earth.
pub fn is_super_moon<Tz: TimeZone>(time: &DateTime<Tz>) -> bool {
    use crate::locators::MoonTruePhase;

    let phase = moon_phase(time);
    if phase.phase != MoonTruePhase::Full {
        return false;
    }
    moon_distance(time).get::<kilometer>() <= 360_000.0
}

/// The window around `time` during which the moon is above the horizon.
pub fn moon_above_horizon_times<Tz: TimeZone>(
    location: &Coordinate,
    time: &DateTime<Tz>,
    next_rise_offset: Duration,
    with_refraction: bool,
    with_parallax: bool,
) -> Option<Range<DateTime<Tz>>> {
    above_horizon_times(
        location,
        time,
        next_rise_offset,
        |location, time| is_moon_up(time, location, with_refraction, with_parallax),
        |location, date| moon_events(date, location, with_refraction, with_parallax),
    )
}

// --- Stars ---

pub fn star_altitude<Tz: TimeZone>(
    star: Star,
    time: &DateTime<Tz>,
    location: &Coordinate,
    with_refraction: bool,
) -> f64 {
    altitude_of(
        &StarLocator::new(star),
        &from_zoned(time),
        location,
        with_refraction,
        false,
    )
}

pub fn star_azimuth<Tz: TimeZone>(star: Star, time: &DateTime<Tz>, location: &Coordinate) -> f64 {
    azimuth_of(&StarLocator::new(star), &from_zoned(time), location, false)
}

/// Color temperature of a star in kelvin, from its B-V index.
pub fn star_color_temperature(star: Star) -> f64 {
    let bv = star.color_index_bv();
    4600.0 * ((1.0 / (0.92 * bv + 1.7)) + (1.0 / (0.92 * bv + 0.62)))
}

// --- Eclipses ---

/// The next eclipse of the given kind visible from `location`, or `None`
/// within the search horizon.
pub fn next_eclipse<Tz: TimeZone>(
    time: &DateTime<Tz>,
    location: &Coordinate,
    eclipse_type: EclipseType,
    max_search: Option<Duration>,
) -> Option<Eclipse> {
    let after = time.with_timezone(&Utc);
    match eclipse_type {
        EclipseType::Solar => {
            SolarEclipseCalculator::new(Duration::minutes(1), max_search).next_eclipse(after, location)
        }
        EclipseType::PartialLunar => PartialLunarEclipseCalculator.next_eclipse(after, location),
        EclipseType::TotalLunar => TotalLunarEclipseCalculator.next_eclipse(after, location),
    }
}

// --- Meteor showers ---

pub fn meteor_shower_altitude<Tz: TimeZone>(
    shower: MeteorShower,
    location: &Coordinate,
    time: &DateTime<Tz>,
) -> f64 {
    altitude_of(
        &MeteorShowerLocator::new(shower),
        &from_zoned(time),
        location,
        false,
        false,
    )
}

pub fn meteor_shower_azimuth<Tz: TimeZone>(
    shower: MeteorShower,
    location: &Coordinate,
    time: &DateTime<Tz>,
) -> f64 {
    azimuth_of(
        &MeteorShowerLocator::new(shower),
        &from_zoned(time),
        location,
        false,
    )
}

/// The shower peaking on the local date, with its night viewing window,
/// or `None` when no shower peaks that night or the radiant stays out of
/// view.
pub fn meteor_shower<Tz: TimeZone>(
    location: &Coordinate,
    date: &DateTime<Tz>,
) -> Option<MeteorShowerPeak<Tz>> {
    let day_start = start_of_day(date);
    let longitude = solar_longitude(date);

    for shower in MeteorShower::ALL {
        if delta_angle(longitude, shower.solar_longitude()).abs() > 2.0 {
            continue;
        }

        let Some(times) = next_meteor_shower_peak(shower, location, &day_start) else {
            continue;
        };
        let Some(peak) = times.transit else {
            continue;
        };

        if peak.date_naive() == date.date_naive() {
            return Some(MeteorShowerPeak {
                shower,
                start: times.rise.unwrap_or_else(|| peak.clone()),
                peak: peak.clone(),
                end: times.set.unwrap_or_else(|| peak.clone()),
            });
        }
    }

    None
}

/// Showers whose activity window includes the queried date, regardless of
/// the time of night.
pub fn active_meteor_showers<Tz: TimeZone>(
    location: &Coordinate,
    date: &DateTime<Tz>,
) -> Vec<MeteorShowerPeak<Tz>> {
    let search_days = MeteorShower::ALL
        .iter()
        .map(|s| s.active_days())
        .max()
        .unwrap_or(0);

    let mut active: Vec<MeteorShowerPeak<Tz>> = Vec::new();
    let start = date.clone() - Duration::days(search_days);
    let end = date.clone() + Duration::days(search_days);

    let mut current = start;
    while current < end {
        if let Some(peak) = meteor_shower(location, &current) {
            let distance = (peak.peak.clone() - date.clone()).abs();
            let half_window = Duration::days(peak.shower.active_days() / 2);
            if distance <= half_window && !active.iter().any(|p| p.shower == peak.shower) {
                active.push(peak);
            }
        }
        current += Duration::days(1);
    }

    active
}

fn next_meteor_shower_peak<Tz: TimeZone>(
    shower: MeteorShower,
    location: &Coordinate,
    now: &DateTime<Tz>,
) -> Option<RiseSetTransitTimes<Tz>> {
    let time = next_time_at_solar_longitude(shower.solar_longitude(), now);
    let today = meteor_shower_times(shower, location, &time);
    let yesterday = meteor_shower_times(shower, location, &(time.clone() - Duration::days(1)));
    let tomorrow = meteor_shower_times(shower, location, &(time.clone() + Duration::days(1)));

    let transit = closest_time(
        &time,
        &[
            yesterday.transit.clone(),
            today.transit.clone(),
            tomorrow.transit.clone(),
        ],
    );

    let anchor = transit.clone().unwrap_or_else(|| time.clone());

    let rise = closest_past_time(
        &anchor,
        &[
            yesterday.rise.clone(),
            today.rise.clone(),
            tomorrow.rise.clone(),
        ],
    );
    let set = closest_future_time(
        &anchor,
        &[yesterday.set.clone(), today.set.clone(), tomorrow.set.clone()],
    );

    let night = closest_night(&anchor, location)?;

    let Some(transit) = transit else {
        // Circumpolar radiant: sample the night for its highest point
        let mut current = night.start.clone();
        let mut peak_altitude = -1.0;
        let mut peak_time = current.clone();
        while current < night.end {
            let altitude = meteor_shower_altitude(shower, location, &current);
            if altitude > peak_altitude {
                peak_altitude = altitude;
                peak_time = current.clone();
            }
            current += Duration::minutes(5);
        }

        if peak_altitude < 0.0 {
            return None;
        }

        return Some(RiseSetTransitTimes::new(
            Some(night.start),
            Some(peak_time),
            Some(night.end),
        ));
    };

    // Radiant rises and sets: restrict the window to the night
    let times = Range::new(
        rise.unwrap_or_else(|| night.start.clone()),
        set.unwrap_or_else(|| night.end.clone()),
    );
    let visible = times.intersection(&night)?;
    let clamped_transit = visible.clamp(transit);

    Some(RiseSetTransitTimes::new(
        Some(visible.start),
        Some(clamped_transit),
        Some(visible.end),
    ))
}

// Radiant times are expected to be partially missing, so this goes
// straight to the iterative solver without the search fallback
fn meteor_shower_times<Tz: TimeZone>(
    shower: MeteorShower,
    location: &Coordinate,
    date: &DateTime<Tz>,
) -> RiseSetTransitTimes<Tz> {
    NewtonsCalculator.calculate(
        &MeteorShowerLocator::new(shower),
        date,
        location,
        0.0,
        false,
        false,
    )
}

/// The night (astronomical dusk to dawn) nearest to `time`, or the whole
/// day during the polar night.
fn closest_night<Tz: TimeZone>(
    time: &DateTime<Tz>,
    location: &Coordinate,
) -> Option<Range<DateTime<Tz>>> {
    let mode = SunTimesMode::Astronomical;
    let yesterday = sun_events(&(time.clone() - Duration::days(1)), location, mode, false, false);
    let today = sun_events(time, location, mode, false, false);
    let tomorrow = sun_events(&(time.clone() + Duration::days(1)), location, mode, false, false);

    let (Some(last_set), Some(rise), Some(set), Some(next_rise)) = (
        yesterday.set,
        today.rise.clone(),
        today.set,
        tomorrow.rise,
    ) else {
        return if !is_sun_up(time, location, false, false) && today.rise.is_none() {
            // The sun stays down: the whole day is night
            Some(Range::new(start_of_day(time), end_of_day(time)))
        } else {
            None
        };
    };

    let last_night = Range::new(last_set, rise);
    let tonight = Range::new(set, next_rise);

    let until_last_night = (time.clone() - last_night.end.clone()).abs();
    let until_tonight = (time.clone() - tonight.start.clone()).abs();

    if until_last_night < until_tonight {
        Some(last_night)
    } else {
        Some(tonight)
    }
}

/// The next zoned instant at which the sun reaches the given ecliptic
/// longitude, found by a coarse day scan then the 58-day sine correction
/// iteration.
fn next_time_at_solar_longitude<Tz: TimeZone>(longitude: f64, today: &DateTime<Tz>) -> DateTime<Tz> {
    let threshold = 1.0;
    let mut candidate = today.clone();
    for i in 0..=365 {
        let date = today.clone() + Duration::days(i);
        let longitude_at = solar_longitude(&date);
        if delta_angle(longitude, longitude_at).abs() < threshold {
            candidate = date;
            break;
        }
    }

    let mut jd = from_zoned(&candidate).julian_day();
    loop {
        let ut = from_julian_day(jd);
        let coordinates = Sun.coordinates(&ut);
        let current_longitude =
            EclipticCoordinate::from_equatorial(&coordinates, &ut).ecliptic_longitude;
        let correction = 58.0 * sin_degrees(longitude - current_longitude);
        jd += correction;
        if correction <= 0.00001 {
            break;
        }
    }

    from_julian_day(jd).to_zoned(&today.timezone())
}

// --- Shared helpers ---

/// Today's event if it is still ahead, otherwise tomorrow's.
fn next_event<Tz: TimeZone>(
    time: &DateTime<Tz>,
    events_on: impl Fn(&DateTime<Tz>) -> Option<DateTime<Tz>>,
) -> Option<DateTime<Tz>> {
    if let Some(event) = events_on(time) {
        if event > *time {
            return Some(event);
        }
    }

    if let Some(event) = events_on(&(time.clone() + Duration::days(1))) {
        if event > *time {
            return Some(event);
        }
    }

    None
}

/// The above-horizon window selection shared by the sun and moon:
/// last-rise to next-set while up; otherwise the upcoming window when the
/// next rise is close, or the window that just ended.
fn above_horizon_times<Tz: TimeZone>(
    location: &Coordinate,
    time: &DateTime<Tz>,
    next_rise_offset: Duration,
    is_up: impl Fn(&Coordinate, &DateTime<Tz>) -> bool,
    events_on: impl Fn(&Coordinate, &DateTime<Tz>) -> RiseSetTransitTimes<Tz>,
) -> Option<Range<DateTime<Tz>>> {
    let up = is_up(location, time);

    let yesterday = events_on(location, &(time.clone() - Duration::days(1)));
    let today = events_on(location, time);
    let tomorrow = events_on(location, &(time.clone() + Duration::days(1)));

    let rises = [yesterday.rise, today.rise, tomorrow.rise];
    let sets = [yesterday.set, today.set, tomorrow.set];

    let last_rise = closest_past_time(time, &rises);
    let next_rise = closest_future_time(time, &rises);
    let last_set = closest_past_time(time, &sets);
    let next_set = closest_future_time(time, &sets);

    if up {
        return Some(Range::new(
            last_rise.unwrap_or_else(|| start_of_day(time)),
            next_set.unwrap_or_else(|| end_of_day(time)),
        ));
    }

    let next_rise_soon = next_rise
        .as_ref()
        .map(|rise| rise.clone() - time.clone() <= next_rise_offset)
        .unwrap_or(false);

    if !next_rise_soon {
        if last_rise.is_none() && last_set.is_none() {
            return None;
        }
        return Some(Range::new(
            last_rise.unwrap_or_else(|| start_of_day(time)),
            last_set.unwrap_or_else(|| end_of_day(time)),
        ));
    }

    Some(Range::new(
        next_rise.unwrap_or_else(|| start_of_day(time)),
        next_set.unwrap_or_else(|| end_of_day(time)),
    ))
}
