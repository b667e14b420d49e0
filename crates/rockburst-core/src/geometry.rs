//! Geometry for hit testing and world wrap.
//!
//! Hit areas are either a convex polygon in local space or a circle. A
//! [`HitShape`] pairs a hit area with its world-space polygon, which is
//! re-derived only when the owner's position or rotation changed since the
//! last derivation.

use std::f64::consts::TAU;

use glam::DVec2;
use serde::{Deserialize, Serialize};

// =============================================================================
// World
// =============================================================================

/// Dimensions of the playfield in simulation units.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldSize {
    /// Width, always > 0 once validated
    pub width: u32,
    /// Height, always > 0 once validated
    pub height: u32,
}

impl WorldSize {
    /// Creates a world size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the center of the world.
    #[must_use]
    pub fn center(self) -> DVec2 {
        DVec2::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    /// Returns `true` if either dimension is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the dimensions as a vector.
    #[must_use]
    pub fn extent(self) -> DVec2 {
        DVec2::new(f64::from(self.width), f64::from(self.height))
    }
}

impl Default for WorldSize {
    fn default() -> Self {
        Self::new(960, 720)
    }
}

/// Wraps `value` into `[-margin, size + margin)` with period `size + 2 * margin`.
#[must_use]
pub fn wrap_coordinate(value: f64, size: f64, margin: f64) -> f64 {
    let period = size + 2.0 * margin;
    if period <= 0.0 || (-margin..size + margin).contains(&value) {
        return value;
    }
    (value + margin).rem_euclid(period) - margin
}

// =============================================================================
// Bounding Boxes
// =============================================================================

/// Axis-aligned bounding box.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: DVec2,
    /// Maximum corner
    pub max: DVec2,
}

impl Aabb {
    /// Box around a circle.
    #[must_use]
    pub fn around_circle(center: DVec2, radius: f64) -> Self {
        let r = DVec2::splat(radius);
        Self {
            min: center - r,
            max: center + r,
        }
    }

    /// Box around a set of points. Returns a degenerate box at the origin
    /// for an empty set.
    #[must_use]
    pub fn around_points(points: &[DVec2]) -> Self {
        let Some(first) = points.first() else {
            return Self {
                min: DVec2::ZERO,
                max: DVec2::ZERO,
            };
        };
        points.iter().skip(1).fold(
            Self {
                min: *first,
                max: *first,
            },
            |acc, p| Self {
                min: acc.min.min(*p),
                max: acc.max.max(*p),
            },
        )
    }

    /// Returns `true` if the boxes overlap or touch.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}

// =============================================================================
// Hit Areas
// =============================================================================

/// Local-space collision outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HitArea {
    /// Convex polygon, vertices relative to the entity center.
    Polygon(Vec<DVec2>),
    /// Circle of the given radius around the entity center.
    Circle(f64),
}

impl HitArea {
    /// Regular polygon with `sides` vertices on a circle of `radius`.
    #[must_use]
    pub fn regular(sides: u32, radius: f64) -> Self {
        let points = (0..sides)
            .map(|i| {
                let angle = TAU * f64::from(i) / f64::from(sides);
                DVec2::from_angle(angle) * radius
            })
            .collect();
        Self::Polygon(points)
    }

    /// Largest distance from the center to any point of the outline.
    #[must_use]
    pub fn bounding_radius(&self) -> f64 {
        match self {
            Self::Polygon(points) => points.iter().map(|p| p.length()).fold(0.0, f64::max),
            Self::Circle(radius) => *radius,
        }
    }
}

/// A hit area placed in the world, with a cached world-space outline.
#[derive(Debug, Clone, PartialEq)]
pub struct HitShape {
    area: HitArea,
    center: DVec2,
    world: Vec<DVec2>,
    aabb: Aabb,
    derived_for: Option<(DVec2, f64)>,
}

impl HitShape {
    /// Creates a shape and derives it at `position` / `rotation`.
    #[must_use]
    pub fn new(area: HitArea, position: DVec2, rotation: f64) -> Self {
        let mut shape = Self {
            area,
            center: position,
            world: Vec::new(),
            aabb: Aabb::around_circle(position, 0.0),
            derived_for: None,
        };
        shape.refresh(position, rotation);
        shape
    }

    /// Re-derives the world outline if `position` or `rotation` changed.
    ///
    /// Returns `true` when a derivation happened.
    pub fn refresh(&mut self, position: DVec2, rotation: f64) -> bool {
        if self.derived_for == Some((position, rotation)) {
            return false;
        }
        self.center = position;
        match &self.area {
            HitArea::Polygon(local) => {
                let turn = DVec2::from_angle(rotation);
                self.world.clear();
                self.world
                    .extend(local.iter().map(|p| position + turn.rotate(*p)));
                self.aabb = Aabb::around_points(&self.world);
            }
            HitArea::Circle(radius) => {
                self.aabb = Aabb::around_circle(position, *radius);
            }
        }
        self.derived_for = Some((position, rotation));
        true
    }

    /// Returns the local outline.
    #[must_use]
    pub const fn area(&self) -> &HitArea {
        &self.area
    }

    /// Returns the world-space polygon, empty for circles.
    #[must_use]
    pub fn world_points(&self) -> &[DVec2] {
        &self.world
    }

    /// Returns the world-space bounding box.
    #[must_use]
    pub const fn aabb(&self) -> Aabb {
        self.aabb
    }

    /// Returns the bounding radius of the outline.
    #[must_use]
    pub fn bounding_radius(&self) -> f64 {
        self.area.bounding_radius()
    }

    /// Tests whether two placed shapes overlap.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        if !self.aabb.intersects(&other.aabb) {
            return false;
        }
        match (&self.area, &other.area) {
            (HitArea::Polygon(_), HitArea::Polygon(_)) => {
                polygons_intersect(&self.world, &other.world)
            }
            (HitArea::Polygon(_), HitArea::Circle(r)) => {
                polygon_circle_intersect(&self.world, other.center, *r)
            }
            (HitArea::Circle(r), HitArea::Polygon(_)) => {
                polygon_circle_intersect(&other.world, self.center, *r)
            }
            (HitArea::Circle(a), HitArea::Circle(b)) => {
                self.center.distance(other.center) <= a + b
            }
        }
    }
}

// =============================================================================
// Primitive Tests
// =============================================================================

fn cross(a: DVec2, b: DVec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Returns `true` if segments `a0-a1` and `b0-b1` intersect, including
/// touching endpoints and collinear overlap.
#[must_use]
pub fn segments_intersect(a0: DVec2, a1: DVec2, b0: DVec2, b1: DVec2) -> bool {
    let d1 = cross(b1 - b0, a0 - b0);
    let d2 = cross(b1 - b0, a1 - b0);
    let d3 = cross(a1 - a0, b0 - a0);
    let d4 = cross(a1 - a0, b1 - a0);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    let on_segment = |p: DVec2, q0: DVec2, q1: DVec2| {
        p.x >= q0.x.min(q1.x) && p.x <= q0.x.max(q1.x) && p.y >= q0.y.min(q1.y) && p.y <= q0.y.max(q1.y)
    };
    (d1 == 0.0 && on_segment(a0, b0, b1))
        || (d2 == 0.0 && on_segment(a1, b0, b1))
        || (d3 == 0.0 && on_segment(b0, a0, a1))
        || (d4 == 0.0 && on_segment(b1, a0, a1))
}

/// Ray-casting point-in-polygon test.
#[must_use]
pub fn point_in_polygon(point: DVec2, polygon: &[DVec2]) -> bool {
    let mut inside = false;
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let pi = polygon[i];
        let pj = polygon[j];
        if (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Distance from `point` to the segment `a-b`.
#[must_use]
pub fn point_segment_distance(point: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}

fn edges(polygon: &[DVec2]) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
    polygon
        .iter()
        .zip(polygon.iter().cycle().skip(1))
        .map(|(a, b)| (*a, *b))
}

/// Polygon/polygon overlap: any edge pair crosses, or one polygon has a
/// vertex inside the other.
#[must_use]
pub fn polygons_intersect(a: &[DVec2], b: &[DVec2]) -> bool {
    for (a0, a1) in edges(a) {
        for (b0, b1) in edges(b) {
            if segments_intersect(a0, a1, b0, b1) {
                return true;
            }
        }
    }
    a.first().is_some_and(|p| point_in_polygon(*p, b))
        || b.first().is_some_and(|p| point_in_polygon(*p, a))
}

/// Polygon/circle overlap: the center lies inside the polygon, or within
/// `radius` of one of its edges.
#[must_use]
pub fn polygon_circle_intersect(polygon: &[DVec2], center: DVec2, radius: f64) -> bool {
    point_in_polygon(center, polygon)
        || edges(polygon).any(|(a, b)| point_segment_distance(center, a, b) <= radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(half: f64) -> Vec<DVec2> {
        vec![
            DVec2::new(-half, -half),
            DVec2::new(half, -half),
            DVec2::new(half, half),
            DVec2::new(-half, half),
        ]
    }

    mod wrap_tests {
        use super::*;

        #[test]
        fn inside_keeps_exact_bits() {
            let value = 123.456_789_012_345_6;
            assert_eq!(wrap_coordinate(value, 960.0, 42.0).to_bits(), value.to_bits());
        }

        #[test]
        fn zero_dimension_is_empty() {
            assert!(WorldSize::new(0, 720).is_empty());
            assert!(WorldSize::new(960, 0).is_empty());
            assert!(!WorldSize::new(1, 1).is_empty());
        }

        #[test]
        fn inside_is_unchanged() {
            assert!((wrap_coordinate(50.0, 100.0, 10.0) - 50.0).abs() < 1e-12);
            assert!((wrap_coordinate(-10.0, 100.0, 10.0) + 10.0).abs() < 1e-12);
        }

        #[test]
        fn leaving_right_reenters_left() {
            // Period is 120, so 110 maps to -10.
            assert!((wrap_coordinate(110.0, 100.0, 10.0) + 10.0).abs() < 1e-12);
            assert!((wrap_coordinate(115.0, 100.0, 10.0) + 5.0).abs() < 1e-12);
        }

        #[test]
        fn leaving_left_reenters_right() {
            assert!((wrap_coordinate(-11.0, 100.0, 10.0) - 109.0).abs() < 1e-12);
        }
    }

    mod primitive_tests {
        use super::*;

        #[test]
        fn crossing_segments() {
            assert!(segments_intersect(
                DVec2::new(0.0, 0.0),
                DVec2::new(2.0, 2.0),
                DVec2::new(0.0, 2.0),
                DVec2::new(2.0, 0.0)
            ));
            assert!(!segments_intersect(
                DVec2::new(0.0, 0.0),
                DVec2::new(1.0, 0.0),
                DVec2::new(0.0, 1.0),
                DVec2::new(1.0, 1.0)
            ));
        }

        #[test]
        fn touching_endpoints_count() {
            assert!(segments_intersect(
                DVec2::new(0.0, 0.0),
                DVec2::new(1.0, 0.0),
                DVec2::new(1.0, 0.0),
                DVec2::new(1.0, 1.0)
            ));
        }

        #[test]
        fn point_in_square() {
            let sq = square(1.0);
            assert!(point_in_polygon(DVec2::ZERO, &sq));
            assert!(!point_in_polygon(DVec2::new(2.0, 0.0), &sq));
        }

        #[test]
        fn segment_distance_clamps_to_ends() {
            let d = point_segment_distance(DVec2::new(3.0, 4.0), DVec2::ZERO, DVec2::new(-1.0, 0.0));
            assert!((d - 5.0).abs() < 1e-12);
        }
    }

    mod shape_tests {
        use super::*;

        #[test]
        fn polygon_contained_in_polygon() {
            let big = HitShape::new(HitArea::Polygon(square(10.0)), DVec2::ZERO, 0.0);
            let small = HitShape::new(HitArea::Polygon(square(1.0)), DVec2::ZERO, 0.0);
            assert!(big.intersects(&small));
            assert!(small.intersects(&big));
        }

        #[test]
        fn separated_polygons_miss() {
            let a = HitShape::new(HitArea::Polygon(square(1.0)), DVec2::ZERO, 0.0);
            let b = HitShape::new(HitArea::Polygon(square(1.0)), DVec2::new(5.0, 0.0), 0.0);
            assert!(!a.intersects(&b));
        }

        #[test]
        fn aabb_overlap_but_polygons_miss() {
            // Two diamonds whose boxes overlap at the corner.
            let diamond = HitArea::Polygon(vec![
                DVec2::new(1.0, 0.0),
                DVec2::new(0.0, 1.0),
                DVec2::new(-1.0, 0.0),
                DVec2::new(0.0, -1.0),
            ]);
            let a = HitShape::new(diamond.clone(), DVec2::ZERO, 0.0);
            let b = HitShape::new(diamond, DVec2::new(1.6, 1.6), 0.0);
            assert!(a.aabb().intersects(&b.aabb()));
            assert!(!a.intersects(&b));
        }

        #[test]
        fn circle_touching_polygon_edge() {
            let poly = HitShape::new(HitArea::Polygon(square(1.0)), DVec2::ZERO, 0.0);
            let near = HitShape::new(HitArea::Circle(0.5), DVec2::new(1.4, 0.0), 0.0);
            let far = HitShape::new(HitArea::Circle(0.5), DVec2::new(1.6, 0.0), 0.0);
            assert!(poly.intersects(&near));
            assert!(near.intersects(&poly));
            assert!(!poly.intersects(&far));
        }

        #[test]
        fn circles() {
            let a = HitShape::new(HitArea::Circle(1.0), DVec2::ZERO, 0.0);
            let b = HitShape::new(HitArea::Circle(1.0), DVec2::new(2.0, 0.0), 0.0);
            let c = HitShape::new(HitArea::Circle(1.0), DVec2::new(2.1, 0.0), 0.0);
            assert!(a.intersects(&b));
            assert!(!a.intersects(&c));
        }

        #[test]
        fn refresh_only_when_moved() {
            let mut shape = HitShape::new(HitArea::Polygon(square(1.0)), DVec2::ZERO, 0.0);
            assert!(!shape.refresh(DVec2::ZERO, 0.0));
            assert!(shape.refresh(DVec2::new(1.0, 0.0), 0.0));
            assert!(shape.refresh(DVec2::new(1.0, 0.0), 0.5));
            assert!(!shape.refresh(DVec2::new(1.0, 0.0), 0.5));
        }

        #[test]
        fn rotation_is_applied() {
            let tri = HitArea::Polygon(vec![DVec2::new(2.0, 0.0), DVec2::new(0.0, 1.0), DVec2::new(0.0, -1.0)]);
            let shape = HitShape::new(tri, DVec2::new(10.0, 10.0), std::f64::consts::FRAC_PI_2);
            let nose = shape.world_points()[0];
            assert!((nose - DVec2::new(10.0, 12.0)).length() < 1e-9);
        }

        #[test]
        fn regular_polygon_radius() {
            let hex = HitArea::regular(6, 3.0);
            assert!((hex.bounding_radius() - 3.0).abs() < 1e-9);
            assert!((HitArea::Circle(2.0).bounding_radius() - 2.0).abs() < f64::EPSILON);
        }
    }
}
