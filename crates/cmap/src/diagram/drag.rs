//! Pointer-driven dragging of shapes, links and connector markers.
//!
//! Hosts translate their pointer events into diagram coordinates and call
//! [`Diagram::pointer_down`], [`Diagram::pointer_move`] and
//! [`Diagram::pointer_up`]. Pressing a link selects it and shows its
//! connector markers; dragging a marker rewires that end of the link to
//! whichever shape it is dropped on.

use log::{debug, trace};

use cmap_core::geometry::Point;

use super::Diagram;
use crate::{
    component::LinkGeometry,
    error::CmapError,
    id::{ComponentId, End, LinkId, ShapeId},
};

/// What the pointer is currently dragging.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Shape {
        shape: ShapeId,
        /// Shape position when the drag started.
        origin: Point,
        press: Point,
    },
    Link {
        link: LinkId,
        /// Link coordinates when the drag started.
        snapshot: LinkGeometry,
        press: Point,
    },
    Connector {
        link: LinkId,
        end: End,
    },
}

impl DragState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub(crate) fn involves(&self, id: ComponentId) -> bool {
        match *self {
            Self::Idle => false,
            Self::Shape { shape, .. } => id == shape.into(),
            Self::Link { link, .. } | Self::Connector { link, .. } => id == link.into(),
        }
    }
}

impl Diagram {
    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    /// The link whose connectors were shown by the last press on it.
    pub fn selected_link(&self) -> Option<LinkId> {
        self.selected_link
    }

    /// Starts a drag on the topmost component under `point`.
    ///
    /// Returns the pressed component. Pressing anything but the selected link
    /// or one of its markers hides the markers of the selected link.
    ///
    /// # Errors
    ///
    /// Propagates failures of the connector operations triggered by the press.
    pub fn pointer_down(&mut self, point: Point) -> Result<Option<ComponentId>, CmapError> {
        let hit = self.from_point(point);

        if let Some(selected) = self.selected_link {
            let keeps_selection = match hit {
                Some(ComponentId::Link(link)) => link == selected,
                Some(ComponentId::Marker(marker)) => {
                    self.components.marker(marker).map(|marker| marker.link()) == Some(selected)
                }
                _ => false,
            };
            if !keeps_selection {
                self.selected_link = None;
                if self.components.link(selected).is_some() {
                    for end in End::ALL {
                        self.hide_connector(end, selected)?;
                    }
                }
            }
        }

        self.drag = DragState::Idle;
        match hit {
            Some(ComponentId::Shape(shape)) => {
                let shape_ref = self.shape(shape)?;
                if shape_ref.is_draggable() {
                    let origin = shape_ref.position();
                    self.to_front(shape.into())?;
                    self.drag = DragState::Shape {
                        shape,
                        origin,
                        press: point,
                    };
                }
            }
            Some(ComponentId::Link(link)) => {
                let link_ref = self.link(link)?;
                if link_ref.is_draggable() {
                    let snapshot = link_ref.geometry();
                    for end in End::ALL {
                        self.show_connector(end, link)?;
                    }
                    self.to_front(link.into())?;
                    self.selected_link = Some(link);
                    self.drag = DragState::Link {
                        link,
                        snapshot,
                        press: point,
                    };
                }
            }
            Some(ComponentId::Marker(marker)) => {
                let marker = self.marker(marker)?;
                let (link, end) = (marker.link(), marker.end());
                self.drag = DragState::Connector { link, end };
            }
            None => {}
        }

        debug!(hit:?, drag:? = self.drag; "Pointer down");
        Ok(hit)
    }

    /// Continues the current drag at `point`.
    ///
    /// # Errors
    ///
    /// Propagates failures of the wiring operations performed while
    /// dragging a connector marker.
    pub fn pointer_move(&mut self, point: Point) -> Result<(), CmapError> {
        match self.drag {
            DragState::Idle => Ok(()),
            DragState::Shape {
                shape,
                origin,
                press,
            } => self.move_shape(shape, origin.add_point(point.sub_point(press))),
            DragState::Link {
                link,
                snapshot,
                press,
            } => self.drag_link(link, snapshot, press, point),
            DragState::Connector { link, end } => self.drag_connector(link, end, point),
        }
    }

    /// Ends the current drag. Connections made while dragging are kept.
    pub fn pointer_up(&mut self) {
        if !self.drag.is_idle() {
            trace!(drag:? = self.drag; "Pointer up");
        }
        self.drag = DragState::Idle;
    }

    /// Rotates a link about its only anchored shape, or translates it.
    fn drag_link(
        &mut self,
        link: LinkId,
        snapshot: LinkGeometry,
        press: Point,
        point: Point,
    ) -> Result<(), CmapError> {
        let anchor = self
            .connection_of(link)
            .and_then(|connection| connection.single_anchor());

        match anchor {
            Some((end, shape)) => {
                let center = self.shape(shape)?.center();
                let base = center.angle_to(snapshot.endpoint(end.opposite()));
                let radians = base + center.angle_to(point) - center.angle_to(press);
                self.update_link_angle(link, radians)?;
            }
            None => {
                let moved = snapshot.translate(point.sub_point(press));
                self.set_link_geometry(link, moved)?;
            }
        }
        Ok(())
    }

    /// Rewires `end` of `link` to the shape under `point`, or lets it float.
    fn drag_connector(&mut self, link: LinkId, end: End, point: Point) -> Result<(), CmapError> {
        let current = self.connected_shape(end, link);
        let found = self.shape_at(point, None);
        if found.is_some() && found == current {
            return Ok(());
        }

        if let Some(current) = current {
            self.disconnect(end, current, link)?;
        }

        let opposite = self.connected_shape(end.opposite(), link);
        match found {
            Some(shape) if Some(shape) != opposite => {
                self.connect(end, shape, link)?;
                self.apply_connection(link);
                debug!(link:%, end:%, shape:%; "Rewired connector");
            }
            _ => {
                let geometry = self.link(link)?.geometry().with_endpoint(end, point);
                let geometry = if opposite.is_none() {
                    geometry.with_mid(geometry.source.midpoint(geometry.target))
                } else {
                    geometry
                };
                self.set_link_geometry(link, geometry)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        component::{LinkAttrs, ShapeAttrs},
        render::RecordingSink,
    };

    #[test]
    fn test_shape_drag_moves_by_pointer_delta() {
        let mut diagram = Diagram::default();
        let shape = diagram.create_shape(ShapeAttrs::default().with_position(10.0, 10.0));
        diagram.add(shape.into()).unwrap();

        let hit = diagram.pointer_down(Point::new(20.0, 20.0)).unwrap();
        assert_eq!(hit, Some(shape.into()));
        diagram.pointer_move(Point::new(50.0, 25.0)).unwrap();
        diagram.pointer_up();

        assert_eq!(diagram.shape(shape).unwrap().position(), Point::new(40.0, 15.0));
        assert!(diagram.drag_state().is_idle());
    }

    #[test]
    fn test_undraggable_shape_stays() {
        let mut diagram = Diagram::default();
        let shape = diagram.create_shape(ShapeAttrs::default());
        diagram.add(shape.into()).unwrap();
        diagram.set_draggable(shape.into(), false).unwrap();

        diagram.pointer_down(Point::new(5.0, 5.0)).unwrap();
        diagram.pointer_move(Point::new(50.0, 50.0)).unwrap();
        assert_eq!(diagram.shape(shape).unwrap().position(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_pressing_link_selects_it_and_empty_space_clears() {
        let mut diagram = Diagram::default();
        let link = diagram.create_link(LinkAttrs::default());
        diagram.add(link.into()).unwrap();

        diagram.pointer_down(Point::new(100.0, 40.0)).unwrap();
        assert_eq!(diagram.selected_link(), Some(link));
        assert!(diagram.connector(End::Source, link).is_some());
        assert!(diagram.connector(End::Target, link).is_some());
        diagram.pointer_up();

        diagram.pointer_down(Point::new(500.0, 500.0)).unwrap();
        assert_eq!(diagram.selected_link(), None);
        assert!(diagram.connector(End::Source, link).is_none());
        assert!(diagram.connector(End::Target, link).is_none());
    }

    #[test]
    fn test_free_link_drag_translates_rigidly() {
        let mut diagram = Diagram::default();
        let link = diagram.create_link(LinkAttrs::default());
        diagram.add(link.into()).unwrap();
        let before = diagram.link(link).unwrap().geometry();

        diagram.pointer_down(Point::new(100.0, 40.0)).unwrap();
        diagram.pointer_move(Point::new(110.0, 60.0)).unwrap();
        diagram.settle(&mut RecordingSink::default());

        let after = diagram.link(link).unwrap().geometry();
        assert_eq!(after, before.translate(Point::new(10.0, 20.0)));
        let marker = diagram.connector(End::Target, link).unwrap();
        assert_eq!(diagram.marker(marker).unwrap().position(), after.target);
    }
}
