//! Anchoring of link endpoints on shapes.

use std::mem;

use log::trace;

use cmap_core::geometry::{Point, RoundedRect};

use crate::{
    component::{Components, LinkGeometry},
    id::{ByEnd, ComponentId, End, LinkId, RelationId, ShapeId},
    scheduler::Scheduler,
};

/// Binds the endpoints of one link to up to two shapes.
///
/// Whenever an anchored shape moves, the link follows it:
///
/// - With both ends anchored the link is *rotated*: the midpoint keeps its
///   angle relative to the source→target baseline and its distance scales
///   with the baseline length.
/// - With one end anchored the link is *shifted* rigidly by the shape's
///   displacement.
///
/// Anchored endpoints always sit on the outline of their shape. The last
/// known center of each anchored shape is cached to compute displacements.
#[derive(Debug, Clone)]
pub struct Connection {
    id: RelationId,
    link: LinkId,
    anchors: ByEnd<Option<ShapeId>>,
    centers: ByEnd<Option<Point>>,
    skip_next_update: bool,
}

impl Connection {
    pub(crate) fn new(id: RelationId, link: LinkId) -> Self {
        Self {
            id,
            link,
            anchors: ByEnd::default(),
            centers: ByEnd::default(),
            skip_next_update: false,
        }
    }

    pub fn id(&self) -> RelationId {
        self.id
    }

    pub fn link(&self) -> LinkId {
        self.link
    }

    /// The shape anchoring `end`, if any.
    pub fn shape(&self, end: End) -> Option<ShapeId> {
        *self.anchors.get(end)
    }

    /// The end anchored by `shape`, if any.
    pub fn end_of(&self, shape: ShapeId) -> Option<End> {
        End::ALL
            .into_iter()
            .find(|end| self.shape(*end) == Some(shape))
    }

    /// Anchored ends with their shapes, source first.
    pub fn anchors(&self) -> impl Iterator<Item = (End, ShapeId)> + '_ {
        End::ALL
            .into_iter()
            .filter_map(|end| self.shape(end).map(|shape| (end, shape)))
    }

    /// Returns the only anchored end when exactly one end is anchored.
    pub fn single_anchor(&self) -> Option<(End, ShapeId)> {
        match (self.shape(End::Source), self.shape(End::Target)) {
            (Some(shape), None) => Some((End::Source, shape)),
            (None, Some(shape)) => Some((End::Target, shape)),
            _ => None,
        }
    }

    pub fn is_fully_anchored(&self) -> bool {
        self.shape(End::Source).is_some() && self.shape(End::Target).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.shape(End::Source).is_none() && self.shape(End::Target).is_none()
    }

    /// Cached center of the shape anchoring `end`.
    pub fn cached_center(&self, end: End) -> Option<Point> {
        *self.centers.get(end)
    }

    pub fn skips_next_update(&self) -> bool {
        self.skip_next_update
    }

    /// Anchors `end` on `shape`.
    ///
    /// Changing the anchors drops a pending suppression.
    pub(crate) fn attach(&mut self, end: End, shape: ShapeId, center: Point) {
        self.anchors.set(end, Some(shape));
        self.centers.set(end, Some(center));
        self.skip_next_update = false;
    }

    pub(crate) fn detach(&mut self, end: End) -> Option<ShapeId> {
        self.centers.set(end, None);
        self.skip_next_update = false;
        self.anchors.get_mut(end).take()
    }

    pub(crate) fn suppress_next_update(&mut self) {
        self.skip_next_update = true;
    }

    pub(crate) fn clear_suppression(&mut self) {
        self.skip_next_update = false;
    }

    /// Re-reads the centers of the anchored shapes into the cache.
    pub(crate) fn refresh_centers(&mut self, components: &Components) {
        for end in End::ALL {
            let center = self
                .shape(end)
                .and_then(|shape| components.shape(shape))
                .map(|shape| shape.center());
            self.centers.set(end, center);
        }
    }

    pub(crate) fn update(
        &mut self,
        changed: ComponentId,
        components: &mut Components,
        scheduler: &mut Scheduler,
    ) {
        if mem::take(&mut self.skip_next_update) {
            trace!(relation:% = self.id, changed:%; "Skipped suppressed update");
            return;
        }

        match changed {
            ComponentId::Shape(shape) if self.end_of(shape).is_some() => {
                self.update_node(shape, components, scheduler);
            }
            ComponentId::Link(link) if link == self.link => {
                self.update_link(components, scheduler);
            }
            _ => {}
        }
    }

    /// Follows a moved or resized anchored shape.
    fn update_node(
        &mut self,
        shape: ShapeId,
        components: &mut Components,
        scheduler: &mut Scheduler,
    ) {
        if self.is_fully_anchored() {
            self.rotate_link(components, scheduler);
        } else {
            self.shift_link(shape, components, scheduler);
        }
        self.refresh_centers(components);
    }

    /// Re-anchors the endpoints of the link after the link itself changed.
    pub(crate) fn update_link(
        &self,
        components: &mut Components,
        scheduler: &mut Scheduler,
    ) -> bool {
        let Some(geometry) = components.link(self.link).map(|link| link.geometry()) else {
            return false;
        };
        let anchored = anchored_geometry(geometry, self.outlines(components));
        self.write(anchored, components, scheduler)
    }

    /// Writes the anchored geometry now and skips the update it triggers.
    pub(crate) fn apply(&mut self, components: &mut Components, scheduler: &mut Scheduler) {
        if self.update_link(components, scheduler) {
            self.skip_next_update = true;
        }
    }

    fn rotate_link(&self, components: &mut Components, scheduler: &mut Scheduler) {
        let (Some(source), Some(target)) = (
            self.center(End::Source, components),
            self.center(End::Target, components),
        ) else {
            return;
        };
        let Some(geometry) = components.link(self.link).map(|link| link.geometry()) else {
            return;
        };

        let old_source = self.cached_center(End::Source).unwrap_or(source);
        let old_target = self.cached_center(End::Target).unwrap_or(target);
        let mid = rotated_midpoint(old_source, old_target, geometry.mid, source, target);

        trace!(relation:% = self.id, mid:?; "Rotating link");
        let anchored = anchored_geometry(geometry.with_mid(mid), self.outlines(components));
        self.write(anchored, components, scheduler);
    }

    fn shift_link(&self, shape: ShapeId, components: &mut Components, scheduler: &mut Scheduler) {
        let Some(end) = self.end_of(shape) else {
            return;
        };
        let Some(center) = self.center(end, components) else {
            return;
        };
        let Some(geometry) = components.link(self.link).map(|link| link.geometry()) else {
            return;
        };

        let delta = center.sub_point(self.cached_center(end).unwrap_or(center));
        let far = end.opposite();
        let shifted = geometry.with_endpoint(far, geometry.endpoint(far).add_point(delta));

        trace!(relation:% = self.id, delta:?; "Shifting link");
        let anchored = anchored_geometry(shifted, self.outlines(components));
        self.write(anchored, components, scheduler);
    }

    /// Points a one-sided link in direction `radians` from its anchored shape.
    ///
    /// The link keeps its length. Returns whether the link changed; a change
    /// suppresses the next update of this connection so the written geometry
    /// is not re-derived in the same pass.
    pub(crate) fn update_link_angle(
        &mut self,
        radians: f32,
        components: &mut Components,
        scheduler: &mut Scheduler,
    ) -> bool {
        let Some((end, shape)) = self.single_anchor() else {
            return false;
        };
        let Some(outline) = components.shape(shape).map(|shape| shape.outline()) else {
            return false;
        };
        let Some(geometry) = components.link(self.link).map(|link| link.geometry()) else {
            return false;
        };

        let length = geometry.length();
        let near = outline.boundary_point_toward(outline.center().polar_offset(radians, 1.0));
        let far = near.polar_offset(radians, length);
        let rotated = LinkGeometry::default()
            .with_endpoint(end, near)
            .with_endpoint(end.opposite(), far)
            .with_mid(near.midpoint(far));

        let changed = self.write(rotated, components, scheduler);
        if changed {
            self.skip_next_update = true;
        }
        changed
    }

    fn center(&self, end: End, components: &Components) -> Option<Point> {
        self.shape(end)
            .and_then(|shape| components.shape(shape))
            .map(|shape| shape.center())
    }

    fn outlines(&self, components: &Components) -> ByEnd<Option<RoundedRect>> {
        let outline = |end| {
            self.shape(end)
                .and_then(|shape| components.shape(shape))
                .map(|shape| shape.outline())
        };
        ByEnd::new(outline(End::Source), outline(End::Target))
    }

    fn write(
        &self,
        geometry: LinkGeometry,
        components: &mut Components,
        scheduler: &mut Scheduler,
    ) -> bool {
        components
            .link_mut(self.link)
            .is_some_and(|link| link.set_geometry(geometry, scheduler))
    }
}

/// Snaps anchored endpoints of `geometry` onto their shape outlines.
///
/// With both ends anchored each endpoint points at the midpoint. With one
/// end anchored it points at the opposite endpoint, and the midpoint is
/// recentered between the endpoints, as it is with no anchors at all.
pub fn anchored_geometry(
    geometry: LinkGeometry,
    outlines: ByEnd<Option<RoundedRect>>,
) -> LinkGeometry {
    match (*outlines.get(End::Source), *outlines.get(End::Target)) {
        (Some(source), Some(target)) => LinkGeometry {
            source: source.boundary_point_toward(geometry.mid),
            mid: geometry.mid,
            target: target.boundary_point_toward(geometry.mid),
        },
        (Some(source), None) => recentered(
            geometry.with_endpoint(End::Source, source.boundary_point_toward(geometry.target)),
        ),
        (None, Some(target)) => recentered(
            geometry.with_endpoint(End::Target, target.boundary_point_toward(geometry.source)),
        ),
        (None, None) => recentered(geometry),
    }
}

fn recentered(geometry: LinkGeometry) -> LinkGeometry {
    geometry.with_mid(geometry.source.midpoint(geometry.target))
}

/// Moves `mid` along with a baseline that went from `old_source → old_target`
/// to `source → target`.
///
/// The angle between the baseline and the source→mid vector is preserved and
/// the source→mid distance scales with the baseline length. A degenerate old
/// baseline keeps the distance unscaled; a degenerate new one puts the
/// midpoint on the common center.
///
/// ```
/// # use cmap::relation::rotated_midpoint;
/// # use cmap::geometry::Point;
/// let mid = rotated_midpoint(
///     Point::new(0.0, 0.0),
///     Point::new(100.0, 0.0),
///     Point::new(50.0, 20.0),
///     Point::new(0.0, 0.0),
///     Point::new(200.0, 0.0),
/// );
/// assert!((mid.x() - 100.0).abs() < 1e-3);
/// assert!((mid.y() - 40.0).abs() < 1e-3);
/// ```
pub fn rotated_midpoint(
    old_source: Point,
    old_target: Point,
    mid: Point,
    source: Point,
    target: Point,
) -> Point {
    if old_source == source && old_target == target {
        return mid;
    }

    let baseline_angle = old_source.angle_to(old_target);
    let baseline_length = old_source.distance(old_target);
    let mid_angle = old_source.angle_to(mid);
    let mid_distance = old_source.distance(mid);
    let offset_angle = baseline_angle - mid_angle;
    let rate = if baseline_length == 0.0 {
        1.0
    } else {
        mid_distance / baseline_length
    };

    let new_length = source.distance(target);
    if new_length == 0.0 {
        return source.midpoint(target);
    }
    let new_angle = source.angle_to(target) - offset_angle;
    source.polar_offset(new_angle, rate * new_length)
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use cmap_core::geometry::{Bounds, Size};

    use super::*;

    fn rect(center: Point) -> RoundedRect {
        RoundedRect::new(Bounds::new_from_center(center, Size::new(40.0, 20.0)), 4.0)
    }

    fn assert_point(actual: Point, x: f32, y: f32) {
        assert_approx_eq!(f32, actual.x(), x, epsilon = 0.001);
        assert_approx_eq!(f32, actual.y(), y, epsilon = 0.001);
    }

    #[test]
    fn test_rotated_midpoint_preserves_angle_and_scales_distance() {
        let mid = rotated_midpoint(
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(50.0, 20.0),
            Point::new(0.0, 0.0),
            Point::new(100.0, 100.0),
        );
        assert_point(mid, 30.0, 70.0);
    }

    #[test]
    fn test_rotated_midpoint_translation() {
        let mid = rotated_midpoint(
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(50.0, 20.0),
            Point::new(10.0, 5.0),
            Point::new(110.0, 5.0),
        );
        assert_point(mid, 60.0, 25.0);
    }

    #[test]
    fn test_rotated_midpoint_unchanged_centers() {
        let mid = Point::new(3.0, 4.0);
        let center = Point::new(1.0, 1.0);
        assert_eq!(rotated_midpoint(center, center, mid, center, center), mid);
    }

    #[test]
    fn test_rotated_midpoint_degenerate_baselines() {
        let mid = rotated_midpoint(
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(20.0, 0.0),
        );
        assert!(mid.is_finite());
        assert_approx_eq!(f32, mid.distance(Point::new(0.0, 0.0)), 20.0, epsilon = 0.001);

        let collapsed = rotated_midpoint(
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(50.0, 20.0),
            Point::new(30.0, 30.0),
            Point::new(30.0, 30.0),
        );
        assert_point(collapsed, 30.0, 30.0);
    }

    #[test]
    fn test_anchored_geometry_both_ends_point_at_mid() {
        let geometry =
            LinkGeometry::new(Point::default(), Point::new(50.0, -40.0), Point::default());
        let anchored = anchored_geometry(
            geometry,
            ByEnd::new(Some(rect(Point::new(0.0, 0.0))), Some(rect(Point::new(100.0, 0.0)))),
        );
        assert_eq!(anchored.mid, geometry.mid);
        assert_point(anchored.source, 12.5, -10.0);
        assert_point(anchored.target, 87.5, -10.0);
    }

    #[test]
    fn test_anchored_geometry_one_end_recenters_mid() {
        let geometry = LinkGeometry::new(
            Point::new(0.0, 0.0),
            Point::new(500.0, 500.0),
            Point::new(100.0, 0.0),
        );
        let anchored = anchored_geometry(
            geometry,
            ByEnd::new(Some(rect(Point::new(0.0, 0.0))), None),
        );
        assert_point(anchored.source, 20.0, 0.0);
        assert_point(anchored.mid, 60.0, 0.0);
        assert_eq!(anchored.target, geometry.target);
    }

    #[test]
    fn test_detach_clears_anchor_and_cache() {
        let mut connection = Connection::new(RelationId::new(1), LinkId::new(2));
        connection.attach(End::Target, ShapeId::new(3), Point::new(1.0, 2.0));

        assert_eq!(connection.single_anchor(), Some((End::Target, ShapeId::new(3))));
        assert_eq!(connection.end_of(ShapeId::new(3)), Some(End::Target));
        assert_eq!(connection.detach(End::Target), Some(ShapeId::new(3)));
        assert!(connection.is_empty());
        assert_eq!(connection.cached_center(End::Target), None);
    }

    #[test]
    fn test_anchor_changes_drop_pending_suppression() {
        let mut connection = Connection::new(RelationId::new(1), LinkId::new(2));
        connection.attach(End::Source, ShapeId::new(3), Point::new(0.0, 0.0));
        connection.attach(End::Target, ShapeId::new(4), Point::new(100.0, 0.0));

        connection.suppress_next_update();
        connection.detach(End::Target);
        assert!(!connection.skips_next_update());

        connection.suppress_next_update();
        connection.attach(End::Target, ShapeId::new(5), Point::new(0.0, 100.0));
        assert!(!connection.skips_next_update());
    }
}
