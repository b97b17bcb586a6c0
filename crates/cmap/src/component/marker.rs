//! Connector handles drawn on link endpoints.

use cmap_core::geometry::Point;

use crate::{
    cell::PropertyCell,
    id::{ComponentId, End, LinkId, MarkerId, RelationId},
    scheduler::Scheduler,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MarkerState {
    Connected,
    #[default]
    Unconnected,
}

impl MarkerState {
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

impl From<bool> for MarkerState {
    fn from(connected: bool) -> Self {
        if connected {
            Self::Connected
        } else {
            Self::Unconnected
        }
    }
}

/// A circular handle shown on one end of a link while it can be rewired.
///
/// The marker's position is owned by its
/// [`ConnectorRelation`](crate::relation::ConnectorRelation); the marker
/// itself never moves on its own.
#[derive(Debug, Clone)]
pub struct ConnectorMarker {
    id: MarkerId,
    link: LinkId,
    end: End,
    position: PropertyCell<Point>,
    state: PropertyCell<MarkerState>,
    radius: f32,
    pub(crate) relations: Vec<RelationId>,
}

impl ConnectorMarker {
    pub(crate) fn new(
        id: MarkerId,
        link: LinkId,
        end: End,
        position: Point,
        state: MarkerState,
        radius: f32,
    ) -> Self {
        Self {
            id,
            link,
            end,
            position: PropertyCell::new(position),
            state: PropertyCell::new(state),
            radius,
            relations: Vec::new(),
        }
    }

    pub fn id(&self) -> MarkerId {
        self.id
    }

    /// The link this marker belongs to.
    pub fn link(&self) -> LinkId {
        self.link
    }

    pub fn end(&self) -> End {
        self.end
    }

    pub fn position(&self) -> Point {
        *self.position.get()
    }

    pub fn state(&self) -> MarkerState {
        *self.state.get()
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn contains(&self, point: Point) -> bool {
        self.position().distance(point) <= self.radius
    }

    pub fn relations(&self) -> &[RelationId] {
        &self.relations
    }

    pub(crate) fn set_position(&mut self, position: Point, scheduler: &mut Scheduler) -> bool {
        let owner = ComponentId::from(self.id);
        self.position.set(position, owner, scheduler)
    }

    pub(crate) fn set_state(&mut self, state: MarkerState, scheduler: &mut Scheduler) -> bool {
        let owner = ComponentId::from(self.id);
        self.state.set(state, owner, scheduler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_uses_radius() {
        let marker = ConnectorMarker::new(
            MarkerId::new(3),
            LinkId::new(2),
            End::Source,
            Point::new(10.0, 10.0),
            MarkerState::Unconnected,
            16.0,
        );
        assert!(marker.contains(Point::new(26.0, 10.0)));
        assert!(!marker.contains(Point::new(27.0, 10.0)));
    }

    #[test]
    fn test_state_from_bool() {
        assert_eq!(MarkerState::from(true), MarkerState::Connected);
        assert!(!MarkerState::from(false).is_connected());
    }
}
