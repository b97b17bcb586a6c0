//! Connecting links to shapes and managing connector markers.

use log::debug;

use super::Diagram;
use crate::{
    component::{ConnectorMarker, MarkerState},
    error::CmapError,
    id::{ComponentId, End, LinkId, MarkerId, RelationId, ShapeId},
    relation::{Connection, ConnectorRelation, Relation},
};

impl Diagram {
    /// Anchors `end` of `link` on `shape`.
    ///
    /// When the other end is already anchored, the link midpoint is
    /// recentered between the two shapes. A shown connector marker on `end`
    /// switches to the connected state.
    ///
    /// # Errors
    ///
    /// - [`CmapError::InvalidNode`] if the shape does not exist.
    /// - [`CmapError::InvalidArgument`] if the link does not exist.
    /// - [`CmapError::AlreadyConnected`] if `end` is already anchored.
    /// - [`CmapError::ShapeOnOppositeEnd`] if `shape` anchors the other end.
    pub fn connect(&mut self, end: End, shape: ShapeId, link: LinkId) -> Result<(), CmapError> {
        let center = self.shape(shape)?.center();
        self.link(link)?;

        let existing = self.connection_id_of(link);
        if let Some(connection) = existing.and_then(|id| self.relations.connection(id)) {
            if connection.shape(end).is_some() {
                return Err(CmapError::AlreadyConnected { link, end });
            }
            if connection.shape(end.opposite()) == Some(shape) {
                return Err(CmapError::ShapeOnOppositeEnd { shape, link, end });
            }
        }

        let relation = match existing {
            Some(relation) => relation,
            None => {
                let relation = self.relations.next_id();
                self.relations
                    .insert(Relation::Connection(Connection::new(relation, link)));
                self.components.register(link.into(), relation);
                relation
            }
        };

        let mut other = None;
        if let Some(connection) = self.relations.connection_mut(relation) {
            connection.attach(end, shape, center);
            other = connection.shape(end.opposite());
        }
        self.components.register(shape.into(), relation);

        let other_center = other
            .and_then(|other| self.components.shape(other))
            .map(|other| other.center());
        if let Some(other_center) = other_center {
            if let Some(link) = self.components.link_mut(link) {
                link.set_mid(center.midpoint(other_center), &mut self.scheduler);
            }
        }

        self.set_marker_connected(link, end, true);
        self.scheduler.mark_dirty(link.into());
        debug!(shape:%, link:%, end:%; "Connected link end");
        Ok(())
    }

    /// Releases `end` of `link` from `shape`.
    ///
    /// The connection is dropped once neither end is anchored.
    ///
    /// # Errors
    ///
    /// - [`CmapError::InvalidNode`] if the shape does not exist.
    /// - [`CmapError::InvalidArgument`] if the link does not exist.
    /// - [`CmapError::NotConnected`] unless `shape` anchors `end` of `link`.
    pub fn disconnect(&mut self, end: End, shape: ShapeId, link: LinkId) -> Result<(), CmapError> {
        self.shape(shape)?;
        self.link(link)?;

        let not_connected = CmapError::NotConnected { shape, link, end };
        let relation = self
            .connection_id_of(link)
            .ok_or_else(|| not_connected.clone())?;
        let connection = self
            .relations
            .connection_mut(relation)
            .ok_or_else(|| not_connected.clone())?;
        if connection.shape(end) != Some(shape) {
            return Err(not_connected);
        }

        connection.detach(end);
        let empty = connection.is_empty();
        self.components.unregister(shape.into(), relation);
        if empty {
            self.relations.remove(relation);
            self.components.unregister(link.into(), relation);
            debug!(relation:%, link:%; "Dropped empty connection");
        }

        self.set_marker_connected(link, end, false);
        self.scheduler.mark_dirty(link.into());
        debug!(shape:%, link:%, end:%; "Disconnected link end");
        Ok(())
    }

    /// Severs every connection touching a shape or a link.
    ///
    /// # Errors
    ///
    /// Fails for unknown handles and for markers, which never hold
    /// connections.
    pub fn disconnect_component(&mut self, id: ComponentId) -> Result<(), CmapError> {
        let anchors: Vec<(End, ShapeId, LinkId)> = match id {
            ComponentId::Shape(shape) => {
                self.shape(shape)?;
                self.relations_of(id)
                    .iter()
                    .filter_map(|relation| self.relations.connection(*relation))
                    .filter_map(|connection| {
                        connection
                            .end_of(shape)
                            .map(|end| (end, shape, connection.link()))
                    })
                    .collect()
            }
            ComponentId::Link(link) => {
                self.link(link)?;
                self.connection_of(link)
                    .map(|connection| {
                        connection
                            .anchors()
                            .map(|(end, shape)| (end, shape, link))
                            .collect()
                    })
                    .unwrap_or_default()
            }
            ComponentId::Marker(marker) => {
                return Err(CmapError::InvalidArgument(format!(
                    "{marker} cannot hold connections"
                )));
            }
        };

        for (end, shape, link) in anchors {
            self.disconnect(end, shape, link)?;
        }
        Ok(())
    }

    /// Shows the connector marker on `end` of `link`.
    ///
    /// Returns the marker, or `None` if the connector of that end is
    /// disabled. Showing a shown connector returns the existing marker. The
    /// marker is placed in the render order right after its link.
    ///
    /// # Errors
    ///
    /// Returns [`CmapError::InvalidArgument`] if the link does not exist.
    pub fn show_connector(
        &mut self,
        end: End,
        link: LinkId,
    ) -> Result<Option<MarkerId>, CmapError> {
        let link_ref = self.link(link)?;
        if !link_ref.is_connector_enabled(end) {
            return Ok(None);
        }
        if let Some(marker) = self.connector(end, link) {
            return Ok(Some(marker));
        }

        let position = link_ref.endpoint(end);
        let state = MarkerState::from(self.connected_shape(end, link).is_some());
        let marker = MarkerId::new(self.components.next_raw_id());
        let radius = self.config.style().marker_radius();
        self.components.insert_marker(ConnectorMarker::new(
            marker, link, end, position, state, radius,
        ));

        let relation = self.relations.next_id();
        self.relations.insert(Relation::Connector(ConnectorRelation::new(
            relation, link, end, marker,
        )));
        self.components.register(link.into(), relation);
        self.components.register(marker.into(), relation);

        if let Some(index) = self.render_order.get_index_of(&ComponentId::Link(link)) {
            let mut index = index + 1;
            while let Some(ComponentId::Marker(existing)) = self.render_order.get_index(index) {
                if self.components.marker(*existing).map(ConnectorMarker::link) != Some(link) {
                    break;
                }
                index += 1;
            }
            self.render_order.shift_insert(index, marker.into());
            self.scheduler.mark_dirty(marker.into());
        }

        debug!(link:%, end:%, marker:%; "Showed connector");
        Ok(Some(marker))
    }

    /// Hides and destroys the connector marker on `end` of `link`.
    ///
    /// Hiding a hidden connector is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CmapError::InvalidArgument`] if the link does not exist.
    pub fn hide_connector(&mut self, end: End, link: LinkId) -> Result<(), CmapError> {
        self.link(link)?;
        let Some(relation) = self.connector_relation_id(end, link) else {
            return Ok(());
        };
        let Some(marker) = self
            .relations
            .get(relation)
            .and_then(Relation::as_connector)
            .map(ConnectorRelation::marker)
        else {
            return Ok(());
        };

        self.relations.remove(relation);
        self.components.unregister(link.into(), relation);
        self.detach(marker.into());
        self.components.remove(marker.into());
        debug!(link:%, end:%, marker:%; "Hid connector");
        Ok(())
    }

    /// Allows the connector of `end` to be shown.
    ///
    /// # Errors
    ///
    /// Returns [`CmapError::InvalidArgument`] if the link does not exist.
    pub fn enable_connector(&mut self, end: End, link: LinkId) -> Result<(), CmapError> {
        self.link_mut(link)?.set_connector_enabled(end, true);
        Ok(())
    }

    /// Hides the connector of `end` and keeps it from being shown again.
    ///
    /// # Errors
    ///
    /// Returns [`CmapError::InvalidArgument`] if the link does not exist.
    pub fn disable_connector(&mut self, end: End, link: LinkId) -> Result<(), CmapError> {
        self.hide_connector(end, link)?;
        self.link_mut(link)?.set_connector_enabled(end, false);
        Ok(())
    }

    /// The marker shown on `end` of `link`, if any.
    pub fn connector(&self, end: End, link: LinkId) -> Option<MarkerId> {
        self.connector_relation_id(end, link)
            .and_then(|relation| self.relations.get(relation))
            .and_then(Relation::as_connector)
            .map(ConnectorRelation::marker)
    }

    /// The shape anchoring `end` of `link`, if any.
    pub fn connected_shape(&self, end: End, link: LinkId) -> Option<ShapeId> {
        self.connection_of(link)
            .and_then(|connection| connection.shape(end))
    }

    /// The connection of `link`, if any end is anchored.
    pub fn connection_of(&self, link: LinkId) -> Option<&Connection> {
        self.connection_id_of(link)
            .and_then(|relation| self.relations.connection(relation))
    }

    /// Points a link anchored at exactly one end in direction `radians`,
    /// keeping its length.
    ///
    /// The new geometry is written immediately and the connection skips the
    /// update this write triggers. Returns whether the link changed.
    ///
    /// # Errors
    ///
    /// Returns [`CmapError::InvalidArgument`] if the link does not exist or
    /// is not anchored at exactly one end.
    pub fn update_link_angle(&mut self, link: LinkId, radians: f32) -> Result<bool, CmapError> {
        self.link(link)?;
        let relation = self
            .connection_id_of(link)
            .filter(|relation| {
                self.relations
                    .connection(*relation)
                    .is_some_and(|connection| connection.single_anchor().is_some())
            })
            .ok_or_else(|| {
                CmapError::InvalidArgument(format!("{link} is not anchored at exactly one end"))
            })?;

        let Some(connection) = self.relations.connection_mut(relation) else {
            return Ok(false);
        };
        Ok(connection.update_link_angle(radians, &mut self.components, &mut self.scheduler))
    }

    /// Writes the anchored geometry of `link` now, suppressing the update it
    /// triggers on its connection.
    pub(crate) fn apply_connection(&mut self, link: LinkId) {
        let Some(relation) = self.connection_id_of(link) else {
            return;
        };
        if let Some(connection) = self.relations.connection_mut(relation) {
            connection.apply(&mut self.components, &mut self.scheduler);
        }
    }

    /// Markers shown on `link`, source first.
    pub(crate) fn markers_of(&self, link: LinkId) -> Vec<MarkerId> {
        End::ALL
            .into_iter()
            .filter_map(|end| self.connector(end, link))
            .collect()
    }

    pub(crate) fn connection_id_of(&self, link: LinkId) -> Option<RelationId> {
        self.relations_of(link.into())
            .iter()
            .copied()
            .find(|relation| self.relations.connection(*relation).is_some())
    }

    fn connector_relation_id(&self, end: End, link: LinkId) -> Option<RelationId> {
        self.relations_of(link.into())
            .iter()
            .copied()
            .find(|relation| {
                self.relations
                    .get(*relation)
                    .and_then(Relation::as_connector)
                    .is_some_and(|connector| connector.end() == end)
            })
    }

    fn set_marker_connected(&mut self, link: LinkId, end: End, connected: bool) {
        let Some(relation) = self.connector_relation_id(end, link) else {
            return;
        };
        if let Some(connector) = self.relations.get(relation).and_then(Relation::as_connector) {
            connector.set_connected(connected, &mut self.components, &mut self.scheduler);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{LinkAttrs, ShapeAttrs};

    struct Fixture {
        diagram: Diagram,
        a: ShapeId,
        b: ShapeId,
        link: LinkId,
    }

    fn fixture() -> Fixture {
        let mut diagram = Diagram::default();
        let a = diagram.create_shape(ShapeAttrs::default().with_position(0.0, 0.0));
        let b = diagram.create_shape(ShapeAttrs::default().with_position(300.0, 0.0));
        let link = diagram.create_link(LinkAttrs::default());
        for id in [a.into(), b.into(), link.into()] {
            diagram.add(id).unwrap();
        }
        Fixture {
            diagram,
            a,
            b,
            link,
        }
    }

    #[test]
    fn test_connect_rejects_occupied_end() {
        let Fixture {
            mut diagram,
            a,
            b,
            link,
        } = fixture();
        diagram.connect(End::Source, a, link).unwrap();

        let err = diagram.connect(End::Source, b, link).unwrap_err();
        assert_eq!(err, CmapError::AlreadyConnected { link, end: End::Source });
        assert_eq!(diagram.connected_shape(End::Source, link), Some(a));
    }

    #[test]
    fn test_connect_rejects_self_loop() {
        let Fixture {
            mut diagram, a, link, ..
        } = fixture();
        diagram.connect(End::Source, a, link).unwrap();

        let err = diagram.connect(End::Target, a, link).unwrap_err();
        assert!(err.is_already_connected());
        assert!(matches!(err, CmapError::ShapeOnOppositeEnd { .. }));
        assert_eq!(diagram.connected_shape(End::Target, link), None);
    }

    #[test]
    fn test_connect_second_end_recenters_midpoint() {
        let Fixture {
            mut diagram,
            a,
            b,
            link,
        } = fixture();
        diagram.connect(End::Source, a, link).unwrap();
        diagram.connect(End::Target, b, link).unwrap();

        let center_a = diagram.shape(a).unwrap().center();
        let center_b = diagram.shape(b).unwrap().center();
        assert_eq!(diagram.link(link).unwrap().mid(), center_a.midpoint(center_b));
        assert!(diagram.connection_of(link).unwrap().is_fully_anchored());
    }

    #[test]
    fn test_disconnect_requires_matching_shape() {
        let Fixture {
            mut diagram,
            a,
            b,
            link,
        } = fixture();
        assert_eq!(
            diagram.disconnect(End::Source, a, link),
            Err(CmapError::NotConnected {
                shape: a,
                link,
                end: End::Source
            })
        );

        diagram.connect(End::Source, a, link).unwrap();
        assert!(diagram.disconnect(End::Source, b, link).is_err());
        assert!(diagram.disconnect(End::Target, a, link).is_err());
    }

    #[test]
    fn test_last_disconnect_drops_connection() {
        let Fixture {
            mut diagram, a, link, ..
        } = fixture();
        diagram.connect(End::Source, a, link).unwrap();
        let relation = diagram.connection_of(link).unwrap().id();

        diagram.disconnect(End::Source, a, link).unwrap();
        assert!(diagram.connection_of(link).is_none());
        assert!(diagram.relation(relation).is_none());
        assert!(diagram.relations_of(a.into()).is_empty());
        assert!(diagram.relations_of(link.into()).is_empty());
    }

    #[test]
    fn test_unknown_handles_are_reported() {
        let Fixture {
            mut diagram, a, link, ..
        } = fixture();
        diagram.remove(a.into()).unwrap();
        assert_eq!(
            diagram.connect(End::Source, a, link),
            Err(CmapError::InvalidNode(a))
        );

        diagram.remove(link.into()).unwrap();
        assert!(matches!(
            diagram.show_connector(End::Source, link),
            Err(CmapError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_show_connector_is_idempotent() {
        let Fixture {
            mut diagram, link, ..
        } = fixture();
        let first = diagram.show_connector(End::Source, link).unwrap();
        let second = diagram.show_connector(End::Source, link).unwrap();
        assert_eq!(first, second);
        assert_eq!(diagram.markers_of(link).len(), 1);

        diagram.hide_connector(End::Source, link).unwrap();
        diagram.hide_connector(End::Source, link).unwrap();
        assert_eq!(diagram.connector(End::Source, link), None);
        assert!(!diagram.contains(first.unwrap().into()));
    }

    #[test]
    fn test_markers_follow_their_link_in_render_order() {
        let Fixture {
            mut diagram, link, ..
        } = fixture();
        let source = diagram.show_connector(End::Source, link).unwrap().unwrap();
        let target = diagram.show_connector(End::Target, link).unwrap().unwrap();

        let order: Vec<_> = diagram.render_order().collect();
        let at = order
            .iter()
            .position(|id| *id == ComponentId::from(link))
            .unwrap();
        assert_eq!(order[at + 1], ComponentId::from(source));
        assert_eq!(order[at + 2], ComponentId::from(target));
    }

    #[test]
    fn test_disabled_connector_is_not_shown() {
        let Fixture {
            mut diagram, link, ..
        } = fixture();
        diagram.show_connector(End::Target, link).unwrap();
        diagram.disable_connector(End::Target, link).unwrap();

        assert_eq!(diagram.connector(End::Target, link), None);
        assert_eq!(diagram.show_connector(End::Target, link), Ok(None));

        diagram.enable_connector(End::Target, link).unwrap();
        assert!(diagram.show_connector(End::Target, link).unwrap().is_some());
    }

    #[test]
    fn test_marker_state_tracks_connection() {
        let Fixture {
            mut diagram, a, link, ..
        } = fixture();
        let marker = diagram.show_connector(End::Source, link).unwrap().unwrap();
        assert_eq!(diagram.marker(marker).unwrap().state(), MarkerState::Unconnected);

        diagram.connect(End::Source, a, link).unwrap();
        assert_eq!(diagram.marker(marker).unwrap().state(), MarkerState::Connected);

        diagram.disconnect(End::Source, a, link).unwrap();
        assert_eq!(diagram.marker(marker).unwrap().state(), MarkerState::Unconnected);
    }

    #[test]
    fn test_update_link_angle_requires_single_anchor() {
        let Fixture {
            mut diagram,
            a,
            b,
            link,
        } = fixture();
        assert!(diagram.update_link_angle(link, 0.0).is_err());

        diagram.connect(End::Source, a, link).unwrap();
        assert!(diagram.update_link_angle(link, 0.0).is_ok());
        let source = diagram.link(link).unwrap().source();
        let center = diagram.shape(a).unwrap().center();
        assert_eq!(source.y(), center.y());
        assert!(source.x() > center.x());

        diagram.connect(End::Target, b, link).unwrap();
        assert!(diagram.update_link_angle(link, 0.0).is_err());
    }
}
