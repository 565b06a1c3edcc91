//! Eclipse prediction
//!
//! Built on the Meeus chapter 54 eclipse-season series: a parameter
//! provider locates the next new or full moon that can produce an eclipse
//! and yields its geometry (gamma, the shadow-axis distance, and u, the
//! umbral cone radius), and the calculators turn that into observer-local
//! event windows using the generic searches and the rise/set machinery.

mod lunar;
mod solar;

pub use lunar::{
    LunarEclipseParameters, PartialLunarEclipseCalculator, TotalLunarEclipseCalculator,
};
pub use solar::{SolarEclipseCalculator, SolarEclipseParameters};

use chrono::{DateTime, Utc};
use nalgebra::Vector2;

use crate::unitslib::Coordinate;

/// An observable eclipse window at a location.
#[derive(Debug, Clone, PartialEq)]
pub struct Eclipse {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Fraction of the eclipsed body's diameter covered at maximum
    pub magnitude: f64,
    /// Fraction of the eclipsed body's disk area covered at maximum
    pub obscuration: f64,
    /// Instant of greatest eclipse
    pub maximum: DateTime<Utc>,
}

impl Eclipse {
    /// Total duration of the window.
    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }
}

/// A strategy that finds the next eclipse of one kind visible from a
/// location.
pub trait EclipseCalculator {
    fn next_eclipse(&self, after: DateTime<Utc>, location: &Coordinate) -> Option<Eclipse>;
}

/// A circle in an abstract 2-D shadow plane, used for disk-overlap areas.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Circle {
    pub center: Vector2<f64>,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Vector2<f64>, radius: f64) -> Self {
        Circle { center, radius }
    }

    pub fn area(&self) -> f64 {
        std::f64::consts::PI * self.radius * self.radius
    }
}

/// Area of the intersection of two circles (lens area).
pub(crate) fn intersection_area(circle1: &Circle, circle2: &Circle) -> f64 {
    let d = (circle1.center - circle2.center).norm();

    if d >= circle1.radius + circle2.radius {
        return 0.0;
    }

    if d <= (circle1.radius - circle2.radius).abs() {
        let r = circle1.radius.min(circle2.radius);
        return std::f64::consts::PI * r * r;
    }

    let r1 = circle1.radius;
    let r2 = circle2.radius;

    let a1 = r1 * r1 * ((d * d + r1 * r1 - r2 * r2) / (2.0 * d * r1)).acos();
    let a2 = r2 * r2 * ((d * d + r2 * r2 - r1 * r1) / (2.0 * d * r2)).acos();
    let a3 = 0.5 * ((-d + r1 + r2) * (d + r1 - r2) * (d - r1 + r2) * (d + r1 + r2)).sqrt();

    a1 + a2 - a3
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_disjoint_circles_share_no_area() {
        let a = Circle::new(Vector2::new(0.0, 0.0), 1.0);
        let b = Circle::new(Vector2::new(3.0, 0.0), 1.0);
        assert_relative_eq!(intersection_area(&a, &b), 0.0);
    }

    #[test]
    fn test_contained_circle_contributes_its_own_area() {
        let big = Circle::new(Vector2::new(0.0, 0.0), 2.0);
        let small = Circle::new(Vector2::new(0.5, 0.0), 0.5);
        assert_relative_eq!(intersection_area(&big, &small), small.area(), epsilon = 1e-12);
    }

    #[test]
    fn test_identical_circles_overlap_fully() {
        let a = Circle::new(Vector2::new(1.0, 1.0), 1.5);
        assert_relative_eq!(intersection_area(&a, &a), a.area(), epsilon = 1e-12);
    }

    #[test]
    fn test_half_offset_overlap_is_symmetric_and_partial() {
        let a = Circle::new(Vector2::new(0.0, 0.0), 1.0);
        let b = Circle::new(Vector2::new(1.0, 0.0), 1.0);
        let lens = intersection_area(&a, &b);
        assert!(lens > 0.0 && lens < a.area());
        assert_relative_eq!(lens, intersection_area(&b, &a), epsilon = 1e-12);
        // Known closed form for unit circles at distance 1:
        // 2*acos(1/2) - sqrt(3)/2 per circle pair
        let expected = 2.0 * (0.5_f64).acos() - (3.0_f64).sqrt() / 2.0;
        assert_relative_eq!(lens, expected, epsilon = 1e-9);
    }
}
