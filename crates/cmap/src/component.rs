//! Diagram components and the arena that owns them.
//!
//! # Overview
//!
//! - [`Shape`] - A positioned rectangle with rounded corners
//! - [`Link`] - An elbowed edge with a midpoint and two endpoints
//! - [`ConnectorMarker`] - A handle drawn on a link endpoint while it can be rewired
//! - [`ComponentView`] - A borrowed view of any component, handed to render sinks

use std::collections::HashMap;

use crate::id::{ComponentId, LinkId, MarkerId, RelationId, ShapeId};

mod link;
mod marker;
mod shape;

pub use link::{Link, LinkAttrs, LinkGeometry};
pub use marker::{ConnectorMarker, MarkerState};
pub use shape::{ContentType, Shape, ShapeAttrs};

/// A borrowed view of a component, tagged with its kind.
#[derive(Debug, Clone, Copy)]
pub enum ComponentView<'a> {
    Shape(&'a Shape),
    Link(&'a Link),
    Marker(&'a ConnectorMarker),
}

impl ComponentView<'_> {
    pub fn id(&self) -> ComponentId {
        match self {
            Self::Shape(shape) => shape.id().into(),
            Self::Link(link) => link.id().into(),
            Self::Marker(marker) => marker.id().into(),
        }
    }
}

/// Arena of all live components, keyed by their typed ids.
#[derive(Debug, Default)]
pub(crate) struct Components {
    shapes: HashMap<ShapeId, Shape>,
    links: HashMap<LinkId, Link>,
    markers: HashMap<MarkerId, ConnectorMarker>,
    next_id: u32,
}

impl Components {
    /// Allocates the next raw id. Ids are unique across component kinds.
    pub(crate) fn next_raw_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub(crate) fn insert_shape(&mut self, shape: Shape) {
        self.shapes.insert(shape.id(), shape);
    }

    pub(crate) fn insert_link(&mut self, link: Link) {
        self.links.insert(link.id(), link);
    }

    pub(crate) fn insert_marker(&mut self, marker: ConnectorMarker) {
        self.markers.insert(marker.id(), marker);
    }

    pub(crate) fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    pub(crate) fn shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(&id)
    }

    pub(crate) fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    pub(crate) fn link_mut(&mut self, id: LinkId) -> Option<&mut Link> {
        self.links.get_mut(&id)
    }

    pub(crate) fn marker(&self, id: MarkerId) -> Option<&ConnectorMarker> {
        self.markers.get(&id)
    }

    pub(crate) fn marker_mut(&mut self, id: MarkerId) -> Option<&mut ConnectorMarker> {
        self.markers.get_mut(&id)
    }

    pub(crate) fn contains(&self, id: ComponentId) -> bool {
        match id {
            ComponentId::Shape(id) => self.shapes.contains_key(&id),
            ComponentId::Link(id) => self.links.contains_key(&id),
            ComponentId::Marker(id) => self.markers.contains_key(&id),
        }
    }

    pub(crate) fn remove(&mut self, id: ComponentId) -> bool {
        match id {
            ComponentId::Shape(id) => self.shapes.remove(&id).is_some(),
            ComponentId::Link(id) => self.links.remove(&id).is_some(),
            ComponentId::Marker(id) => self.markers.remove(&id).is_some(),
        }
    }

    pub(crate) fn view(&self, id: ComponentId) -> Option<ComponentView<'_>> {
        match id {
            ComponentId::Shape(id) => self.shapes.get(&id).map(ComponentView::Shape),
            ComponentId::Link(id) => self.links.get(&id).map(ComponentView::Link),
            ComponentId::Marker(id) => self.markers.get(&id).map(ComponentView::Marker),
        }
    }

    /// Returns the relations registered on a component.
    pub(crate) fn relations(&self, id: ComponentId) -> Option<&[RelationId]> {
        match id {
            ComponentId::Shape(id) => self.shapes.get(&id).map(|shape| shape.relations()),
            ComponentId::Link(id) => self.links.get(&id).map(|link| link.relations()),
            ComponentId::Marker(id) => self.markers.get(&id).map(|marker| marker.relations()),
        }
    }

    fn relations_mut(&mut self, id: ComponentId) -> Option<&mut Vec<RelationId>> {
        match id {
            ComponentId::Shape(id) => self.shapes.get_mut(&id).map(|shape| &mut shape.relations),
            ComponentId::Link(id) => self.links.get_mut(&id).map(|link| &mut link.relations),
            ComponentId::Marker(id) => {
                self.markers.get_mut(&id).map(|marker| &mut marker.relations)
            }
        }
    }

    /// Registers `relation` on a component, ignoring duplicates.
    pub(crate) fn register(&mut self, id: ComponentId, relation: RelationId) {
        if let Some(relations) = self.relations_mut(id) {
            if !relations.contains(&relation) {
                relations.push(relation);
            }
        }
    }

    pub(crate) fn unregister(&mut self, id: ComponentId, relation: RelationId) {
        if let Some(relations) = self.relations_mut(id) {
            relations.retain(|registered| *registered != relation);
        }
    }
}
