//! Geometric primitives for diagram editing.
//!
//! This module provides the geometric types used throughout cmap for
//! positioning shapes, routing links and anchoring link endpoints on shape
//! outlines.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in diagram space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - An axis-aligned rectangle defined by minimum and maximum coordinates
//! - [`RoundedRect`] - A rectangle with rounded corners, the outline of a shape
//!
//! # Coordinate System
//!
//! cmap uses the screen coordinate system of the surfaces it renders to:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! Angles are measured with `atan2(dy, dx)` in this system, so positive
//! angles turn clockwise on screen.

use std::f32::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

/// A 2D point representing a position in diagram coordinate space.
///
/// # Examples
///
/// ```
/// # use cmap_core::geometry::Point;
/// let source = Point::new(10.0, 20.0);
/// let target = Point::new(30.0, 20.0);
///
/// let mid = source.midpoint(target);
/// assert_eq!(mid.x(), 20.0);
/// assert_eq!(source.distance(target), 20.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Creates a new point with the specified x-coordinate
    pub fn with_x(mut self, x: f32) -> Self {
        self.x = x;
        self
    }

    /// Creates a new point with the specified y-coordinate
    pub fn with_y(mut self, y: f32) -> Self {
        self.y = y;
        self
    }

    /// Adds another point to this point, returning a new point.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Calculates the midpoint between this point and another point
    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Calculates the hypotenuse (Euclidean distance from origin)
    pub fn hypot(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance to another point
    pub fn distance(self, other: Point) -> f32 {
        other.sub_point(self).hypot()
    }

    /// Multiplies both coordinates by the given factor.
    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Angle of the vector from this point to `other`, in radians.
    ///
    /// Returns `0.0` when both points coincide.
    pub fn angle_to(self, other: Point) -> f32 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// Returns the point at `distance` from this one in the direction `angle`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cmap_core::geometry::Point;
    /// let p = Point::new(1.0, 1.0).polar_offset(0.0, 5.0);
    /// assert_eq!(p, Point::new(6.0, 1.0));
    /// ```
    pub fn polar_offset(self, angle: f32, distance: f32) -> Self {
        Self {
            x: distance.mul_add(angle.cos(), self.x),
            y: distance.mul_add(angle.sin(), self.y),
        }
    }

    /// Returns true if both coordinates are finite numbers
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Represents the dimensions of an element with width and height
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns the size as a point offset, for center calculations
    pub fn half(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Represents a rectangular bounding box with minimum and maximum coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates a new bounds from a center point and a size
    pub fn new_from_center(center: Point, size: Size) -> Self {
        let half = size.half();
        Self {
            min_x: center.x - half.x,
            min_y: center.y - half.y,
            max_x: center.x + half.x,
            max_y: center.y + half.y,
        }
    }

    /// Creates a new bounds from a top-left point and a size
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    /// Returns the minimum x-coordinate of the bounds
    pub fn min_x(self) -> f32 {
        self.min_x
    }

    /// Returns the minimum y-coordinate of the bounds
    pub fn min_y(self) -> f32 {
        self.min_y
    }

    /// Returns the maximum x-coordinate of the bounds
    pub fn max_x(self) -> f32 {
        self.max_x
    }

    /// Returns the maximum y-coordinate of the bounds
    pub fn max_y(self) -> f32 {
        self.max_y
    }

    /// Returns the width of the bounds
    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Returns the center point of the bounds
    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Returns the top-left corner as a Point
    pub fn min_point(self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    /// Converts bounds to a Size object
    pub fn to_size(self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// Returns true if the point lies inside the bounds or on their border
    pub fn contains(self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// Merges two bounds into the smallest bounds containing both.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Moves the bounds by the specified offset.
    pub fn translate(&self, offset: Point) -> Self {
        Self {
            min_x: self.min_x + offset.x,
            min_y: self.min_y + offset.y,
            max_x: self.max_x + offset.x,
            max_y: self.max_y + offset.y,
        }
    }

    /// Grows the bounds by `margin` on every side.
    pub fn expand(&self, margin: f32) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }
}

/// A rectangle with circular corners of a fixed radius.
///
/// This is the silhouette of a diagram shape. Links anchored to a shape end
/// on this outline rather than on the raw bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundedRect {
    bounds: Bounds,
    radius: f32,
}

impl RoundedRect {
    pub fn new(bounds: Bounds, radius: f32) -> Self {
        Self { bounds, radius }
    }

    pub fn bounds(self) -> Bounds {
        self.bounds
    }

    pub fn radius(self) -> f32 {
        self.radius
    }

    pub fn center(self) -> Point {
        self.bounds.center()
    }

    /// Returns the point of the outline hit by the ray from the center
    /// towards `external`.
    ///
    /// The ray is first clipped against the four straight edges; the edge is
    /// chosen by comparing the ray angle with the diagonal angle
    /// `atan2(height, width)`. A hit within `radius` of a corner on both axes
    /// is then projected onto that corner's rounding circle.
    ///
    /// When `external` coincides with the center the ray angle is taken as
    /// zero, which yields the middle of the right edge.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cmap_core::geometry::{Bounds, Point, RoundedRect, Size};
    /// let outline = RoundedRect::new(
    ///     Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(80.0, 40.0)),
    ///     4.0,
    /// );
    ///
    /// let hit = outline.boundary_point_toward(Point::new(200.0, 20.0));
    /// assert_eq!(hit, Point::new(80.0, 20.0));
    /// ```
    pub fn boundary_point_toward(self, external: Point) -> Point {
        let Bounds {
            min_x,
            min_y,
            max_x,
            max_y,
        } = self.bounds;
        let width = self.bounds.width();
        let height = self.bounds.height();
        let center = self.bounds.center();

        let alpha = center.angle_to(external);
        let beta = FRAC_PI_2 - alpha;
        let diagonal = height.atan2(width);

        let hit = if alpha < diagonal - PI || alpha > PI - diagonal {
            // left edge
            Point::new(min_x, center.y - width * alpha.tan() / 2.0)
        } else if alpha < -diagonal {
            // top edge
            Point::new(center.x - height * beta.tan() / 2.0, min_y)
        } else if alpha < diagonal {
            // right edge
            Point::new(max_x, center.y + width * alpha.tan() / 2.0)
        } else {
            // bottom edge
            Point::new(center.x + height * beta.tan() / 2.0, max_y)
        };

        match self.corner_center_for(hit) {
            Some(corner) => {
                let to_corner = corner.sub_point(hit);
                let length = to_corner.hypot();
                if length == 0.0 {
                    return hit;
                }
                corner.sub_point(to_corner.scale(self.radius / length))
            }
            None => hit,
        }
    }

    /// Returns the center of the rounding circle whose corner region holds
    /// `point`, if any.
    fn corner_center_for(self, point: Point) -> Option<Point> {
        let r = self.radius;
        let Bounds {
            min_x,
            min_y,
            max_x,
            max_y,
        } = self.bounds;

        let left = point.x < min_x + r;
        let right = point.x > max_x - r;
        let top = point.y < min_y + r;
        let bottom = point.y > max_y - r;

        if left && top {
            Some(Point::new(min_x + r, min_y + r))
        } else if right && top {
            Some(Point::new(max_x - r, min_y + r))
        } else if left && bottom {
            Some(Point::new(min_x + r, max_y - r))
        } else if right && bottom {
            Some(Point::new(max_x - r, max_y - r))
        } else {
            None
        }
    }

    /// Signed distance from `point` to the outline: negative inside, zero on
    /// the outline, positive outside.
    pub fn signed_distance(self, point: Point) -> f32 {
        let center = self.bounds.center();
        let half = self.bounds.to_size().half();
        let qx = (point.x - center.x).abs() - (half.x - self.radius);
        let qy = (point.y - center.y).abs() - (half.y - self.radius);

        let outside = qx.max(0.0).hypot(qy.max(0.0));
        let inside = qx.max(qy).min(0.0);
        outside + inside - self.radius
    }
}


#[cfg(test)]
mod proptest_tests {
    use std::f32::consts::TAU;

    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn point_strategy() -> impl Strategy<Value = Point> {
        (-1000.0f32..1000.0, -1000.0f32..1000.0).prop_map(|(x, y)| Point::new(x, y))
    }

    fn direction_strategy() -> impl Strategy<Value = (f32, f32)> {
        (0.0f32..TAU, 0.5f32..2000.0)
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Every boundary point of an 80x40 shape with radius 4 must lie on the
    /// rounded outline and inside the closed bounding rectangle.
    fn check_boundary_point_on_outline(angle: f32, distance: f32) -> Result<(), TestCaseError> {
        let rect = RoundedRect::new(
            Bounds::new_from_top_left(Point::new(100.0, 60.0), Size::new(80.0, 40.0)),
            4.0,
        );
        let external = rect.center().polar_offset(angle, distance);
        let hit = rect.boundary_point_toward(external);

        prop_assert!(hit.is_finite(), "non-finite hit {hit:?}");
        prop_assert!(
            rect.bounds().expand(0.001).contains(hit),
            "hit {hit:?} escapes bounds {:?}",
            rect.bounds()
        );
        let distance = rect.signed_distance(hit);
        prop_assert!(
            distance.abs() < 0.001,
            "hit {hit:?} is {distance} away from the outline"
        );
        Ok(())
    }

    /// Midpoint should always be between (or equal to) both points.
    fn check_midpoint_is_between_points(p1: Point, p2: Point) -> Result<(), TestCaseError> {
        let mid = p1.midpoint(p2);
        prop_assert!(mid.x() >= p1.x().min(p2.x()) && mid.x() <= p1.x().max(p2.x()));
        prop_assert!(mid.y() >= p1.y().min(p2.y()) && mid.y() <= p1.y().max(p2.y()));
        Ok(())
    }

    /// Moving along the angle towards a point by the distance to it lands on it.
    fn check_polar_offset_reaches_target(p1: Point, p2: Point) -> Result<(), TestCaseError> {
        let reached = p1.polar_offset(p1.angle_to(p2), p1.distance(p2));
        prop_assert!((reached.x() - p2.x()).abs() < 0.01);
        prop_assert!((reached.y() - p2.y()).abs() < 0.01);
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn boundary_point_on_outline((angle, distance) in direction_strategy()) {
            check_boundary_point_on_outline(angle, distance)?;
        }
    }

    proptest! {
        #[test]
        fn midpoint_is_between_points(p1 in point_strategy(), p2 in point_strategy()) {
            check_midpoint_is_between_points(p1, p2)?;
        }

        #[test]
        fn polar_offset_reaches_target(p1 in point_strategy(), p2 in point_strategy()) {
            check_polar_offset_reaches_target(p1, p2)?;
        }
    }
}
